use alloy::transports::TransportError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{types} argument types declared but {values} values given")]
    ArgumentCount { types: usize, values: usize },

    #[error("argument {position} does not match declared type {expected}")]
    TypeMismatch { position: usize, expected: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported output type: {0}")]
pub struct OutputTypeError(pub String);

/// Round-level failures. Any of these aborts the round before a single
/// descriptor is written.
#[derive(Error, Debug)]
pub enum MulticallError {
    #[error("aggregator address is not configured")]
    NotConfigured,

    #[error("failed to encode call {index}: {source}")]
    Encoding {
        index: usize,
        #[source]
        source: EncodeError,
    },

    #[error("aggregate call failed: {0}")]
    Submission(#[from] TransportError),

    #[error("malformed aggregate response: {0}")]
    Decoding(#[from] alloy::sol_types::Error),

    #[error("aggregate response carries {actual} results for {expected} calls")]
    ReturnCount { expected: usize, actual: usize },
}
