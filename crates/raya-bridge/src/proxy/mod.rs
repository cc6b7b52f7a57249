//! Proxy bridge
//!
//! Exposes host values to scripts by reference. Records, slices, arrays,
//! and maps become opaque handles whose dispatch table forwards indexing,
//! assignment, length, and `tostring` to the bound host value and resolves
//! method names through the type's cached [`MethodSet`]. Host functions
//! become script functions that decode their arguments and wrap their
//! results.
//!
//! [`MethodSet`]: crate::methodset::MethodSet

mod handle;
mod ops;
mod thunk;

pub use handle::{HandleRef, ProxyOps};
pub use ops::{MAPPING_OPS, RECORD_OPS, SEQUENCE_OPS};
pub use thunk::Thunk;

pub(crate) use handle::decode_handle;
pub(crate) use thunk::method_thunk;

use crate::bridge::Bridge;
use crate::convert::{convert_scalar, scalar_to_script};
use crate::error::{BridgeError, BridgeResult};
use crate::script::{ScriptFunction, ScriptValue, TableRef};
use crate::types::{Type, TypeKind};
use crate::value::Value;

/// Expose a host value to the script engine by reference
pub(crate) fn wrap(bridge: &Bridge, value: &Value) -> BridgeResult<ScriptValue> {
    if let Some(script) = scalar_to_script(value)? {
        return Ok(script);
    }

    match value.kind() {
        TypeKind::Interface(_) | TypeKind::Pointer(_) => match value.elem() {
            Some(inner) => wrap(bridge, &inner),
            None => Ok(ScriptValue::Nil),
        },
        _ if value.is_nil() => Ok(ScriptValue::Nil),
        TypeKind::Record(_) => Ok(HandleRef::new(bridge, value.clone(), &RECORD_OPS).into()),
        TypeKind::Slice(_) | TypeKind::Array(_, _) => {
            Ok(HandleRef::new(bridge, value.clone(), &SEQUENCE_OPS).into())
        }
        TypeKind::Map(_, _) => Ok(HandleRef::new(bridge, value.clone(), &MAPPING_OPS).into()),
        TypeKind::Func(_) => Ok(thunk::function_thunk(bridge, value)?.into()),
        TypeKind::Bool
        | TypeKind::Int(_)
        | TypeKind::Uint(_)
        | TypeKind::Float(_)
        | TypeKind::String
        | TypeKind::Complex(_)
        | TypeKind::Chan(_) => Err(BridgeError::unsupported(value.ty())),
    }
}

/// Convert `value` to `ty`, then wrap it with `ty`'s dispatch table
pub(crate) fn wrap_as(bridge: &Bridge, value: &Value, ty: &Type) -> BridgeResult<ScriptValue> {
    let converted = value.convert(ty)?;
    wrap(bridge, &converted)
}

/// Resolve a script value against a destination type without deep decoding
pub(crate) fn unwrap(script: &ScriptValue, dest: &Type) -> BridgeResult<Value> {
    match script {
        ScriptValue::Handle(handle) => decode_handle(handle, dest),
        ScriptValue::Bool(_) | ScriptValue::Number(_) | ScriptValue::String(_) => {
            convert_scalar(script, dest)
        }
        ScriptValue::Nil => Value::nil(dest),
        ScriptValue::Table(_) | ScriptValue::Function(_) => {
            Err(BridgeError::shape(dest, script.type_name()))
        }
    }
}

/// Table of callables bound to `value`, one per method in its method set
pub(crate) fn method_table(bridge: &Bridge, value: &Value) -> TableRef {
    let methods = bridge.methods().get(value.ty());
    let table = TableRef::new();
    for entry in methods.iter() {
        let bridge = bridge.clone();
        let bound = value.clone();
        let method = entry.clone();
        let callable = ScriptFunction::new(
            entry.name.clone(),
            entry.sig.arity(),
            entry.sig.results.len(),
            move |args| method.call(&bridge, &bound, args),
        );
        table.set_str(&entry.name, callable.into());
    }
    table
}

/// Call a script function with host arguments and decode its results
pub(crate) fn call_script(
    bridge: &Bridge,
    func: &ScriptValue,
    args: &[Value],
    result_types: &[Type],
    tag: &str,
) -> BridgeResult<Vec<Value>> {
    let args = args
        .iter()
        .map(|arg| wrap(bridge, arg))
        .collect::<BridgeResult<Vec<_>>>()?;
    let results = func.call(&args)?;
    if results.len() != result_types.len() {
        return Err(BridgeError::ResultCount {
            name: func
                .as_function()
                .map(|f| f.name().to_string())
                .unwrap_or_else(|| func.type_name().to_string()),
            expected: result_types.len(),
            got: results.len(),
        });
    }
    results
        .iter()
        .zip(result_types)
        .map(|(result, ty)| bridge.script_to_native(result, ty, Some(tag)))
        .collect()
}
