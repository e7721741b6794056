pub mod multicall;
