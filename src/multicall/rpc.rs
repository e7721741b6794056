use alloy::{
    primitives::{Address, Bytes},
    providers::{Provider, RootProvider},
    rpc::types::eth::{TransactionInput, TransactionRequest},
    transports::{http::{Client, Http}, TransportResult}
};
use futures::{future::BoxFuture, FutureExt};

/// Read-only `eth_call` against the latest block.
pub trait CallContract {
    fn call_contract(&self, target: Address, data: Bytes) -> BoxFuture<'_, TransportResult<Bytes>>;
}

impl CallContract for RootProvider<Http<Client>> {
    fn call_contract(&self, target: Address, data: Bytes) -> BoxFuture<'_, TransportResult<Bytes>> {
        let tx = TransactionRequest::default()
            .to(target)
            .input(TransactionInput::new(data));

        async move { self.call(&tx).await }.boxed()
    }
}

impl<C: CallContract + ?Sized> CallContract for &C {
    fn call_contract(&self, target: Address, data: Bytes) -> BoxFuture<'_, TransportResult<Bytes>> {
        (**self).call_contract(target, data)
    }
}
