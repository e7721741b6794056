use clap::Parser;

const DEFAULT_TOKEN_ADDRESS: &str = "0xBC4CA0EdA7647A8aB7C2061c2E118A18a936f13D";

#[derive(Parser, Debug, Clone)]
pub struct Args {
    #[arg(long, env = "RPC_URL", default_value = "https://eth.llamarpc.com")]
    pub rpc_url: String,

    /// Aggregator contract; the mainnet Multicall deployment when unset.
    #[arg(long, env = "MULTICALL_ADDRESS")]
    pub multicall_address: Option<String>,

    /// ERC721 collection queried by the demo batch.
    #[arg(long, env = "TOKEN_ADDRESS", default_value = DEFAULT_TOKEN_ADDRESS)]
    pub token: String,

    /// Holder passed to `balanceOf`.
    #[arg(long, env = "OWNER_ADDRESS", default_value = "0xf4893542E4ec7C33356579F91bF22E8FA7CD06dc")]
    pub owner: String,

    #[arg(long, default_value = "6834")]
    pub token_id: u64,
}

impl Args {
    pub fn from_env() -> Self {
        Self::parse()
    }
}
