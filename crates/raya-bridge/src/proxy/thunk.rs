//! Script-callable thunks over host functions and methods
//!
//! Every thunk follows the same calling convention: the argument count must
//! match the declared parameter count exactly (checked before anything is
//! decoded), each argument is decoded against its parameter type, the host
//! body runs, the result count is checked against the declaration, and each
//! result is wrapped in declared order.

use std::sync::Arc;

use crate::bridge::Bridge;
use crate::error::{BridgeError, BridgeResult};
use crate::script::{ScriptFunction, ScriptValue};
use crate::types::{FnSig, MethodDesc, Receiver};
use crate::value::Value;

/// Method thunk: `(bridge, bound value, script args) -> wrapped results`
pub type Thunk =
    Arc<dyn Fn(&Bridge, &Value, &[ScriptValue]) -> BridgeResult<Vec<ScriptValue>> + Send + Sync>;

/// Build the thunk for a declared method
pub(crate) fn method_thunk(method: &MethodDesc) -> Thunk {
    let method = method.clone();
    Arc::new(move |bridge, bound, args| {
        let decoded = decode_args(bridge, &method.name, &method.sig, args)?;
        let receiver = adjust_receiver(bound, method.receiver);
        let results = method.invoke(&receiver, &decoded)?;
        wrap_results(bridge, &method.name, &method.sig, results)
    })
}

/// Expose a host function value as a script function
pub(crate) fn function_thunk(bridge: &Bridge, func: &Value) -> BridgeResult<ScriptFunction> {
    let sig = func
        .ty()
        .as_func()
        .ok_or_else(|| BridgeError::shape("func", func.ty()))?
        .clone();
    let name = func.ty().to_string();
    let bridge = bridge.clone();
    let func = func.clone();
    Ok(ScriptFunction::new(
        name.clone(),
        sig.arity(),
        sig.results.len(),
        move |args| {
            let decoded = decode_args(&bridge, &name, &sig, args)?;
            let results = func.call(&decoded)?;
            wrap_results(&bridge, &name, &sig, results)
        },
    ))
}

fn decode_args(
    bridge: &Bridge,
    name: &str,
    sig: &FnSig,
    args: &[ScriptValue],
) -> BridgeResult<Vec<Value>> {
    if args.len() != sig.arity() {
        return Err(BridgeError::ArityMismatch {
            name: name.to_string(),
            expected: sig.arity(),
            got: args.len(),
        });
    }
    args.iter()
        .zip(&sig.params)
        .map(|(arg, ty)| bridge.script_to_native(arg, ty, None))
        .collect()
}

fn wrap_results(
    bridge: &Bridge,
    name: &str,
    sig: &FnSig,
    results: Vec<Value>,
) -> BridgeResult<Vec<ScriptValue>> {
    if results.len() != sig.results.len() {
        return Err(BridgeError::ResultCount {
            name: name.to_string(),
            expected: sig.results.len(),
            got: results.len(),
        });
    }
    results.iter().map(|result| bridge.wrap(result)).collect()
}

/// Receiver a method body sees for a bound value
///
/// Pointer receivers get the bound value's address (or the bound pointer
/// itself); value receivers get a copy of the value behind it.
fn adjust_receiver(bound: &Value, receiver: Receiver) -> Value {
    let is_pointer = bound.ty().as_pointer().is_some();
    match receiver {
        Receiver::Pointer if is_pointer => bound.clone(),
        Receiver::Pointer => bound
            .addr()
            .unwrap_or_else(|| Value::pointer_to(bound.clone())),
        Receiver::Value if is_pointer => bound
            .elem()
            .map(|inner| inner.assign_copy())
            .unwrap_or_else(|| bound.clone()),
        Receiver::Value => bound.assign_copy(),
    }
}
