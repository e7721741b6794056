use alloy::primitives::{address, Address};

/// Multicall deployment on Ethereum mainnet.
pub const MULTICALL_MAINNET_ADDRESS: Address = address!("5BA1e12693Dc8F9c48aAD8770482f4739bEeD696");
/// Multicall3 keeps `blockAndAggregate` and is deployed at the same address on most chains.
pub const MULTICALL3_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

pub const BLOCK_AND_AGGREGATE_SELECTOR: [u8; 4] = [0xc3, 0x07, 0x7f, 0xa9];
