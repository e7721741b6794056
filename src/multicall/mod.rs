pub mod call;
pub mod decode;
pub mod errors;
pub mod pack;
pub mod rpc;
pub mod utils;

use alloy::{
    primitives::{Address, U256},
    sol,
    sol_types::SolCall
};
use std::str::FromStr;
use call::Call;
use errors::MulticallError;
use rpc::CallContract;

sol! {
    interface IMulticall {
        #[derive(Debug, PartialEq)]
        struct Call {
            // Target contract to call.
            address target;
            // Selector followed by the encoded arguments.
            bytes callData;
        }

        #[derive(Debug, PartialEq)]
        struct Result {
            // True if the call succeeded, false otherwise.
            bool success;
            // Return data if the call succeeded, or revert data if the call reverted.
            bytes returnData;
        }

        function blockAndAggregate(Call[] calls)
            external
            returns (uint256 blockNumber, bytes32 blockHash, Result[] returnData);
    }
}

/// Batches read-only calls through an aggregator contract in a single `eth_call`.
///
/// Built once and shared; a round only reads from it.
pub struct Multicall<C> {
    client: C,
    aggregator: Option<Address>
}

impl<C: CallContract> Multicall<C> {
    pub fn new(client: C, aggregator: Address) -> Self {
        Self { client, aggregator: Some(aggregator) }
    }

    /// Stores the client and parses `aggregator`. A bad address is not
    /// reported here; the first `aggregate` fails with `NotConfigured`.
    pub fn configure(client: C, aggregator: &str) -> Self {
        let aggregator = match Address::from_str(aggregator.trim()) {
            Ok(address) => Some(address),
            Err(err) => {
                tracing::warn!(aggregator, error = %err, "invalid aggregator address");
                None
            }
        };
        Self { client, aggregator }
    }

    pub fn aggregator(&self) -> Option<Address> {
        self.aggregator
    }

    /// Runs one round: pack, submit, decode the envelope, then write each
    /// successful result back onto `calls` by index.
    ///
    /// Returns the block number the batch executed at. On error no call is
    /// touched.
    pub async fn aggregate(&self, calls: &mut [Call]) -> Result<U256, MulticallError> {
        let aggregator = self.aggregator.ok_or(MulticallError::NotConfigured)?;

        tracing::debug!(calls = calls.len(), "packing");
        let packed = pack::pack_calls(calls)?;
        let data = IMulticall::blockAndAggregateCall { calls: packed }.abi_encode();

        tracing::debug!(%aggregator, len = data.len(), "submitting");
        let response = self.client.call_contract(aggregator, data.into()).await?;

        tracing::debug!(len = response.len(), "decoding");
        let IMulticall::blockAndAggregateReturn { blockNumber, blockHash, returnData } =
            decode::decode_aggregate(&response, calls.len())?;

        tracing::debug!(block = %blockNumber, hash = %blockHash, "dispatching");
        decode::dispatch_results(calls, returnData);

        tracing::info!(
            block = %blockNumber,
            calls = calls.len(),
            succeeded = calls.iter().filter(|call| call.result.is_some()).count(),
            "aggregate complete"
        );
        Ok(blockNumber)
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        dyn_abi::{DynSolType, DynSolValue},
        primitives::{address, Bytes, B256},
        transports::{TransportErrorKind, TransportResult}
    };
    use futures::{future::BoxFuture, FutureExt};
    use std::sync::Mutex;
    use super::{call::{Bits, Decoded, OutputType}, errors::EncodeError, utils::*, *};

    const TOKEN: Address = address!("BC4CA0EdA7647A8aB7C2061c2E118A18a936f13D");
    const OWNER: Address = address!("f4893542E4ec7C33356579F91bF22E8FA7CD06dc");

    /// Answers every request with a canned response and records what was sent.
    struct MockNode {
        response: TransportResult<Bytes>,
        requests: Mutex<Vec<(Address, Bytes)>>
    }

    impl MockNode {
        fn answering(block: u64, results: Vec<(bool, Vec<u8>)>) -> Self {
            let body = DynSolValue::Tuple(vec![
                DynSolValue::Uint(U256::from(block), 256),
                DynSolValue::FixedBytes(B256::with_last_byte(1), 32),
                DynSolValue::Array(
                    results
                    .into_iter()
                    .map(|(success, data)| DynSolValue::Tuple(vec![DynSolValue::Bool(success), DynSolValue::Bytes(data)]))
                    .collect()
                )
            ]).abi_encode_params();
            Self { response: Ok(body.into()), requests: Mutex::new(Vec::new()) }
        }

        fn failing(message: &str) -> Self {
            Self { response: Err(TransportErrorKind::custom_str(message)), requests: Mutex::new(Vec::new()) }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl CallContract for MockNode {
        fn call_contract(&self, target: Address, data: Bytes) -> BoxFuture<'_, TransportResult<Bytes>> {
            self.requests.lock().unwrap().push((target, data));
            let response = match &self.response {
                Ok(body) => Ok(body.clone()),
                Err(err) => Err(TransportErrorKind::custom_str(&err.to_string()))
            };
            async move { response }.boxed()
        }
    }

    fn uint_word(value: u64) -> Vec<u8> {
        U256::from(value).to_be_bytes::<32>().to_vec()
    }

    fn name_and_balance() -> Vec<Call> {
        vec![
            Call::new(TOKEN, "name()", OutputType::String),
            Call::new(TOKEN, "balanceOf(address)", OutputType::Uint(Bits::MAX))
                .with_args(vec![DynSolType::Address], vec![DynSolValue::Address(OWNER)])
        ]
    }

    #[tokio::test]
    async fn name_and_balance_round() {
        let node = MockNode::answering(100, vec![(true, b"Token".to_vec()), (true, vec![42])]);
        let multicall = Multicall::new(&node, MULTICALL_MAINNET_ADDRESS);

        let mut calls = name_and_balance();
        let block = multicall.aggregate(&mut calls).await.unwrap();

        assert_eq!(block, U256::from(100));
        assert_eq!(calls[0].result.as_ref().and_then(Decoded::as_text), Some("Token"));
        assert_eq!(calls[1].result.as_ref().and_then(Decoded::as_uint), Some(U256::from(42)));
    }

    #[tokio::test]
    async fn submits_block_and_aggregate_to_aggregator() {
        let node = MockNode::answering(1, vec![(true, vec![]), (true, vec![])]);
        let multicall = Multicall::new(&node, MULTICALL3_ADDRESS);

        let mut calls = name_and_balance();
        multicall.aggregate(&mut calls).await.unwrap();

        let requests = node.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (target, data) = &requests[0];
        assert_eq!(*target, MULTICALL3_ADDRESS);
        assert_eq!(&data[..4], &BLOCK_AND_AGGREGATE_SELECTOR);

        let submitted = IMulticall::blockAndAggregateCall::abi_decode(data, true).unwrap();
        assert_eq!(submitted.calls, pack::pack_calls(&calls).unwrap());
    }

    #[test]
    fn block_and_aggregate_selector() {
        assert_eq!(IMulticall::blockAndAggregateCall::SELECTOR, BLOCK_AND_AGGREGATE_SELECTOR);
    }

    #[tokio::test]
    async fn results_follow_call_order() {
        let values: Vec<u64> = (0..16).map(|i| i * 7 + 1).collect();
        let node = MockNode::answering(5, values.iter().map(|value| (true, uint_word(*value))).collect());
        let multicall = Multicall::new(&node, MULTICALL_MAINNET_ADDRESS);

        let mut calls: Vec<Call> = values
            .iter()
            .map(|_| Call::new(TOKEN, "totalSupply()", OutputType::Uint(Bits::try_from(64).unwrap())))
            .collect();
        multicall.aggregate(&mut calls).await.unwrap();

        for (call, value) in calls.iter().zip(values) {
            assert_eq!(call.result.as_ref().and_then(Decoded::as_uint), Some(U256::from(value)));
        }
    }

    #[tokio::test]
    async fn reverted_call_is_isolated() {
        let node = MockNode::answering(7, vec![(true, b"Token".to_vec()), (false, b"revert".to_vec())]);
        let multicall = Multicall::new(&node, MULTICALL_MAINNET_ADDRESS);

        let mut calls = name_and_balance();
        let block = multicall.aggregate(&mut calls).await.unwrap();

        assert_eq!(block, U256::from(7));
        assert_eq!(calls[0].result.as_ref().and_then(Decoded::as_text), Some("Token"));
        assert!(calls[1].result.is_none());
    }

    #[tokio::test]
    async fn custom_decoder_wins_over_default_table() {
        let node = MockNode::answering(1, vec![(true, uint_word(42))]);
        let multicall = Multicall::new(&node, MULTICALL_MAINNET_ADDRESS);

        let mut calls = vec![
            Call::new(TOKEN, "totalSupply()", OutputType::Uint(Bits::MAX))
                .with_decoder(|data| Box::new(data.len()))
        ];
        multicall.aggregate(&mut calls).await.unwrap();

        let result = calls[0].result.as_ref().unwrap();
        assert!(result.as_uint().is_none());
        assert_eq!(result.custom::<usize>(), Some(&32));
    }

    #[tokio::test]
    async fn abi_decoder_reads_encoded_name() {
        let encoded = DynSolValue::String("Token".to_string()).abi_encode();
        let node = MockNode::answering(3, vec![(true, encoded)]);
        let multicall = Multicall::new(&node, MULTICALL_MAINNET_ADDRESS);

        let mut calls = vec![
            Call::new(TOKEN, "name()", OutputType::String)
                .with_custom_decoder(decode::abi(DynSolType::String))
        ];
        multicall.aggregate(&mut calls).await.unwrap();

        let result = calls[0].result.as_ref().unwrap();
        assert!(result.as_text().is_none());
        assert_eq!(
            result.custom::<Option<DynSolValue>>(),
            Some(&Some(DynSolValue::String("Token".to_string())))
        );
    }

    #[tokio::test]
    async fn custom_decoder_is_skipped_for_reverted_call() {
        let node = MockNode::answering(1, vec![(false, vec![])]);
        let multicall = Multicall::new(&node, MULTICALL_MAINNET_ADDRESS);

        let mut calls = vec![
            Call::new(TOKEN, "totalSupply()", OutputType::Uint(Bits::MAX))
                .with_decoder(|_| Box::new(()))
        ];
        multicall.aggregate(&mut calls).await.unwrap();

        assert!(calls[0].result.is_none());
    }

    #[tokio::test]
    async fn encoding_error_aborts_before_submission() {
        let node = MockNode::answering(1, vec![(true, vec![]), (true, vec![])]);
        let multicall = Multicall::new(&node, MULTICALL_MAINNET_ADDRESS);

        let mut calls = vec![
            Call::new(TOKEN, "name()", OutputType::String),
            Call::new(TOKEN, "balanceOf(address)", OutputType::Uint(Bits::MAX))
                .with_args(vec![DynSolType::Address], vec![])
        ];

        match multicall.aggregate(&mut calls).await {
            Err(MulticallError::Encoding { index: 1, source: EncodeError::ArgumentCount { types: 1, values: 0 } }) => {}
            other => panic!("expected encoding error, got {other:?}")
        }
        assert_eq!(node.request_count(), 0);
        assert!(calls.iter().all(|call| call.result.is_none()));
    }

    #[tokio::test]
    async fn transport_failure_is_submission_error() {
        let node = MockNode::failing("connection refused");
        let multicall = Multicall::new(&node, MULTICALL_MAINNET_ADDRESS);

        let mut calls = name_and_balance();
        assert!(matches!(multicall.aggregate(&mut calls).await, Err(MulticallError::Submission(_))));
        assert!(calls.iter().all(|call| call.result.is_none()));
    }

    #[tokio::test]
    async fn short_envelope_leaves_calls_untouched() {
        let node = MockNode::answering(1, vec![(true, b"Token".to_vec())]);
        let multicall = Multicall::new(&node, MULTICALL_MAINNET_ADDRESS);

        let mut calls = name_and_balance();
        assert!(matches!(
            multicall.aggregate(&mut calls).await,
            Err(MulticallError::ReturnCount { expected: 2, actual: 1 })
        ));
        assert!(calls.iter().all(|call| call.result.is_none()));
    }

    #[tokio::test]
    async fn invalid_aggregator_fails_first_round() {
        let node = MockNode::answering(1, vec![]);
        let multicall = Multicall::configure(&node, "not an address");
        assert!(multicall.aggregator().is_none());

        let mut calls: Vec<Call> = Vec::new();
        assert!(matches!(multicall.aggregate(&mut calls).await, Err(MulticallError::NotConfigured)));
        assert_eq!(node.request_count(), 0);
    }

    #[test]
    fn configure_parses_address() {
        let node = MockNode::answering(1, vec![]);
        let multicall = Multicall::configure(&node, "0x5BA1e12693Dc8F9c48aAD8770482f4739bEeD696");
        assert_eq!(multicall.aggregator(), Some(MULTICALL_MAINNET_ADDRESS));
    }

    #[tokio::test]
    async fn empty_batch_round_trips() {
        let node = MockNode::answering(9, vec![]);
        let multicall = Multicall::new(&node, MULTICALL_MAINNET_ADDRESS);

        let mut calls: Vec<Call> = Vec::new();
        assert_eq!(multicall.aggregate(&mut calls).await.unwrap(), U256::from(9));
    }
}
