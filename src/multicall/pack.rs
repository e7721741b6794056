use alloy::{
    dyn_abi::DynSolValue,
    primitives::{keccak256, Bytes, FixedBytes}
};
use super::{call::Call, errors::{EncodeError, MulticallError}, IMulticall};

/// Leading four bytes of keccak256 over the textual signature, e.g. `balanceOf(address)`.
pub fn selector(signature: &str) -> FixedBytes<4> {
    FixedBytes::from_slice(&keccak256(signature.as_bytes())[..4])
}

/// Builds `selector ++ abi_encode(arguments)`. Calls without arguments carry
/// the selector alone.
pub fn encode_call_data(call: &Call) -> Result<Bytes, EncodeError> {
    if call.argument_types.len() != call.argument_values.len() {
        return Err(EncodeError::ArgumentCount {
            types: call.argument_types.len(),
            values: call.argument_values.len()
        });
    }

    if let Some(position) = call.argument_types
        .iter()
        .zip(call.argument_values.iter())
        .position(|(ty, value)| !ty.matches(value))
    {
        return Err(EncodeError::TypeMismatch {
            position,
            expected: call.argument_types[position].sol_type_name().into_owned()
        });
    }

    let mut data = selector(&call.signature).to_vec();
    if !call.argument_values.is_empty() {
        data.extend(DynSolValue::Tuple(call.argument_values.clone()).abi_encode_params());
    }

    Ok(data.into())
}

/// Packs every call in order. The first call that fails to encode aborts the
/// whole batch.
pub fn pack_calls(calls: &[Call]) -> Result<Vec<IMulticall::Call>, MulticallError> {
    calls
    .iter()
    .enumerate()
    .map(|(index, call)| {
        let call_data = encode_call_data(call)
            .map_err(|source| MulticallError::Encoding { index, source })?;
        Ok(IMulticall::Call { target: call.target, callData: call_data })
    })
    .collect()
}
