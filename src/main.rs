use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    primitives::{Address, U256},
    providers::ProviderBuilder
};
use eyre::{Result, WrapErr};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use multicall_batch::multicall::{
    call::{Bits, Call, OutputType},
    decode,
    utils::MULTICALL_MAINNET_ADDRESS,
    Multicall
};
mod args;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy(),
        )
        .init();

    let args = args::Args::from_env();
    let token: Address = args.token.parse().wrap_err("invalid token address")?;
    let owner: Address = args.owner.parse().wrap_err("invalid owner address")?;

    // Set up the HTTP transport which is consumed by the RPC client.
    let rpc_url = args.rpc_url.parse().wrap_err("invalid rpc url")?;
    let provider = ProviderBuilder::new().on_http(rpc_url);
    let multicall = match &args.multicall_address {
        Some(address) => Multicall::configure(provider, address),
        None => Multicall::new(provider, MULTICALL_MAINNET_ADDRESS)
    };

    let mut calls = vec![
        Call::new(token, "ownerOf(uint256)", OutputType::Address)
            .with_args(vec![DynSolType::Uint(256)], vec![DynSolValue::Uint(U256::from(args.token_id), 256)]),
        Call::new(token, "name()", OutputType::String)
            .with_custom_decoder(decode::abi(DynSolType::String)),
        Call::new(token, "totalSupply()", OutputType::Uint(Bits::MAX)),
        Call::new(token, "balanceOf(address)", OutputType::Uint(Bits::MAX))
            .with_args(vec![DynSolType::Address], vec![DynSolValue::Address(owner)])
    ];

    let block_number = multicall.aggregate(&mut calls).await?;

    println!("Results for block #{block_number}:");
    for call in &calls {
        match &call.result {
            Some(result) => println!("{}: {}", call.signature, result),
            None => println!("{}: <failed>", call.signature)
        }
    }
    Ok(())
}
