use alloy::{
    dyn_abi::DynSolType,
    primitives::{Address, Bytes, I256, U256},
    sol_types::SolCall
};
use super::{
    call::{Bits, Call, CustomDecoder, Decoded, OutputType},
    errors::MulticallError,
    IMulticall
};
use std::{any::Any, sync::Arc};

/// Decodes the `(uint256, bytes32, (bool, bytes)[])` envelope and checks it
/// answers every submitted call.
pub fn decode_aggregate(
    data: &[u8],
    expected: usize
) -> Result<IMulticall::blockAndAggregateReturn, MulticallError> {
    let decoded = IMulticall::blockAndAggregateCall::abi_decode_returns(data, true)?;
    if decoded.returnData.len() != expected {
        return Err(MulticallError::ReturnCount { expected, actual: decoded.returnData.len() });
    }
    Ok(decoded)
}

/// Writes each successful result onto the call at the same index. Reverted
/// calls and data that does not fit the declared type leave `result` unset.
pub fn dispatch_results(calls: &mut [Call], results: Vec<IMulticall::Result>) {
    for (index, (call, result)) in calls.iter_mut().zip(results).enumerate() {
        if !result.success {
            tracing::debug!(index, signature = %call.signature, "call reverted");
            continue;
        }

        if let Some(decoder) = &call.decoder {
            call.result = Some(Decoded::Custom(decoder(result.returnData.as_ref())));
            continue;
        }

        call.result = decode_output(call.output, &result.returnData);
        if call.result.is_none() {
            tracing::warn!(
                index,
                signature = %call.signature,
                output = %call.output,
                len = result.returnData.len(),
                "return data does not fit output type"
            );
        }
    }
}

/// Default decode table.
pub fn decode_output(output: OutputType, data: &[u8]) -> Option<Decoded> {
    match output {
        OutputType::Bool => decode_bool(data).map(Decoded::Bool),
        OutputType::Int(bits) => decode_int(data, bits).map(|value| Decoded::Int { value, bits }),
        OutputType::Uint(bits) => decode_uint(data, bits).map(|value| Decoded::Uint { value, bits }),
        OutputType::Address => Some(Decoded::Address(decode_address(data))),
        OutputType::String => String::from_utf8(data.to_vec()).ok().map(Decoded::Text),
        OutputType::Bytes => Some(Decoded::Bytes(Bytes::copy_from_slice(data)))
    }
}

fn decode_bool(data: &[u8]) -> Option<bool> {
    match data {
        b"true" => return Some(true),
        b"false" => return Some(false),
        _ => {}
    }
    match U256::try_from_be_slice(data)? {
        value if value.is_zero() && !data.is_empty() => Some(false),
        value if value == U256::from(1) => Some(true),
        _ => None
    }
}

fn decode_uint(data: &[u8], bits: Bits) -> Option<U256> {
    if data.is_empty() {
        return None;
    }
    let value = U256::try_from_be_slice(data)?;
    if value.bit_len() > bits.get() {
        return None;
    }
    Some(value)
}

/// Big-endian two's complement, sign-extended from the length of `data`.
fn decode_int(data: &[u8], bits: Bits) -> Option<I256> {
    if data.is_empty() || data.len() > 32 {
        return None;
    }
    let fill = if data[0] & 0x80 != 0 { 0xff } else { 0x00 };
    let mut word = [fill; 32];
    word[32 - data.len()..].copy_from_slice(data);
    let value = I256::from_be_bytes(word);

    // Anything outside the declared width shifts down to neither 0 nor -1.
    let high = value.asr(bits.get() - 1);
    if high != I256::ZERO && high != I256::MINUS_ONE {
        return None;
    }
    Some(value)
}

/// Last 20 bytes of `data`, left padded when shorter.
fn decode_address(data: &[u8]) -> Address {
    let mut word = [0u8; 20];
    let tail = &data[data.len().saturating_sub(20)..];
    word[20 - tail.len()..].copy_from_slice(tail);
    Address::from(word)
}

/// Custom decoder that ABI-decodes the return data as `ty`. The stored value
/// is an `Option<DynSolValue>`, `None` when the data does not decode.
pub fn abi(ty: DynSolType) -> CustomDecoder {
    Arc::new(move |data: &[u8]| -> Box<dyn Any + Send + Sync> { Box::new(ty.abi_decode(data).ok()) })
}
