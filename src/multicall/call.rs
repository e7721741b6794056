use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    primitives::{Address, Bytes, I256, U256}
};
use std::{any::Any, fmt, str::FromStr, sync::Arc};
use super::errors::OutputTypeError;

/// Replaces the default decode table for a single call.
pub type CustomDecoder = Arc<dyn Fn(&[u8]) -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// Integer width in bits: a multiple of 8 from 8 to 256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bits(usize);

impl Bits {
    pub const MAX: Bits = Bits(256);

    pub const fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<usize> for Bits {
    type Error = OutputTypeError;

    fn try_from(bits: usize) -> Result<Self, Self::Error> {
        if bits % 8 == 0 && (8..=256).contains(&bits) {
            Ok(Bits(bits))
        } else {
            Err(OutputTypeError(format!("{bits}-bit integer")))
        }
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Return types the default decode table understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Bool,
    Int(Bits),
    Uint(Bits),
    Address,
    String,
    Bytes
}

impl FromStr for OutputType {
    type Err = OutputTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits = |digits: &str| -> Result<Bits, OutputTypeError> {
            if digits.is_empty() {
                return Ok(Bits::MAX);
            }
            digits
                .parse::<usize>()
                .ok()
                .and_then(|bits| Bits::try_from(bits).ok())
                .ok_or_else(|| OutputTypeError(s.to_string()))
        };

        match s.trim() {
            "bool" => Ok(OutputType::Bool),
            "address" => Ok(OutputType::Address),
            "string" => Ok(OutputType::String),
            "bytes" => Ok(OutputType::Bytes),
            other => {
                if let Some(digits) = other.strip_prefix("uint") {
                    Ok(OutputType::Uint(bits(digits)?))
                } else if let Some(digits) = other.strip_prefix("int") {
                    Ok(OutputType::Int(bits(digits)?))
                } else {
                    Err(OutputTypeError(s.to_string()))
                }
            }
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputType::Bool => write!(f, "bool"),
            OutputType::Int(bits) => write!(f, "int{bits}"),
            OutputType::Uint(bits) => write!(f, "uint{bits}"),
            OutputType::Address => write!(f, "address"),
            OutputType::String => write!(f, "string"),
            OutputType::Bytes => write!(f, "bytes")
        }
    }
}

/// A typed value recovered from a successful call.
pub enum Decoded {
    Bool(bool),
    Int { value: I256, bits: Bits },
    Uint { value: U256, bits: Bits },
    Address(Address),
    Text(String),
    Bytes(Bytes),
    Custom(Box<dyn Any + Send + Sync>)
}

impl Decoded {
    pub fn as_uint(&self) -> Option<U256> {
        match self {
            Decoded::Uint { value, .. } => Some(*value),
            _ => None
        }
    }

    pub fn as_int(&self) -> Option<I256> {
        match self {
            Decoded::Int { value, .. } => Some(*value),
            _ => None
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            Decoded::Address(address) => Some(*address),
            _ => None
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Decoded::Text(text) => Some(text),
            _ => None
        }
    }

    pub fn custom<T: Any>(&self) -> Option<&T> {
        match self {
            Decoded::Custom(value) => value.downcast_ref::<T>(),
            _ => None
        }
    }
}

impl fmt::Debug for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decoded::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Decoded::Int { value, bits } => f.debug_struct("Int").field("value", value).field("bits", bits).finish(),
            Decoded::Uint { value, bits } => f.debug_struct("Uint").field("value", value).field("bits", bits).finish(),
            Decoded::Address(value) => f.debug_tuple("Address").field(value).finish(),
            Decoded::Text(value) => f.debug_tuple("Text").field(value).finish(),
            Decoded::Bytes(value) => f.debug_tuple("Bytes").field(value).finish(),
            Decoded::Custom(_) => f.write_str("Custom(..)")
        }
    }
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decoded::Bool(value) => write!(f, "{value}"),
            Decoded::Int { value, .. } => write!(f, "{value}"),
            Decoded::Uint { value, .. } => write!(f, "{value}"),
            Decoded::Address(value) => write!(f, "{value}"),
            Decoded::Text(value) => write!(f, "{value}"),
            Decoded::Bytes(value) => write!(f, "{value:?}"),
            Decoded::Custom(value) => match value.downcast_ref::<Option<DynSolValue>>() {
                Some(Some(value)) => write!(f, "{value:?}"),
                _ => f.write_str("<custom>")
            }
        }
    }
}

/// One contract call inside an aggregate round.
///
/// `result` stays `None` until a round decodes it, and remains `None` when the
/// call reverted on chain.
pub struct Call {
    pub target: Address,
    pub signature: String,
    pub argument_types: Vec<DynSolType>,
    pub argument_values: Vec<DynSolValue>,
    pub output: OutputType,
    pub decoder: Option<CustomDecoder>,
    pub result: Option<Decoded>
}

impl Call {
    pub fn new(target: Address, signature: impl Into<String>, output: OutputType) -> Self {
        Self {
            target,
            signature: signature.into(),
            argument_types: Vec::new(),
            argument_values: Vec::new(),
            output,
            decoder: None,
            result: None
        }
    }

    pub fn with_args(mut self, types: Vec<DynSolType>, values: Vec<DynSolValue>) -> Self {
        self.argument_types = types;
        self.argument_values = values;
        self
    }

    pub fn with_decoder<F>(mut self, decoder: F) -> Self
    where
        F: Fn(&[u8]) -> Box<dyn Any + Send + Sync> + Send + Sync + 'static
    {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    pub fn with_custom_decoder(mut self, decoder: CustomDecoder) -> Self {
        self.decoder = Some(decoder);
        self
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("target", &self.target)
            .field("signature", &self.signature)
            .field("argument_values", &self.argument_values)
            .field("output", &self.output)
            .field("custom_decoder", &self.decoder.is_some())
            .field("result", &self.result)
            .finish()
    }
}
