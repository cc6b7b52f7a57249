//! Dispatch handlers for record, sequence, and mapping handles

use super::handle::{HandleRef, ProxyOps};
use crate::error::{BridgeError, BridgeResult};
use crate::script::ScriptValue;
use crate::types::{Type, TypeKind};

/// Handlers for record handles
pub static RECORD_OPS: ProxyOps = ProxyOps {
    family: "record",
    index: record_index,
    set_index: record_set_index,
    len: value_len,
    to_string: handle_to_string,
};

/// Handlers for slice and array handles
pub static SEQUENCE_OPS: ProxyOps = ProxyOps {
    family: "sequence",
    index: sequence_index,
    set_index: sequence_set_index,
    len: value_len,
    to_string: handle_to_string,
};

/// Handlers for map handles
pub static MAPPING_OPS: ProxyOps = ProxyOps {
    family: "mapping",
    index: mapping_index,
    set_index: mapping_set_index,
    len: value_len,
    to_string: handle_to_string,
};

/// Bound callable for `name` if the handle's type exposes that method
fn lookup_method(handle: &HandleRef, name: &str) -> Option<ScriptValue> {
    let methods = handle.methods();
    methods.get(name).map(|entry| handle.bind(entry).into())
}

// ============================================================================
// Records
// ============================================================================

fn exported_field(handle: &HandleRef, name: &str) -> BridgeResult<(usize, Type)> {
    let ty = handle.ty();
    ty.as_record()
        .and_then(|record| {
            record
                .fields
                .iter()
                .position(|f| f.name == name && f.exported)
                .map(|i| (i, record.fields[i].ty.clone()))
        })
        .ok_or_else(|| BridgeError::field_not_found(&ty, name))
}

fn record_index(handle: &HandleRef, key: &ScriptValue) -> BridgeResult<ScriptValue> {
    let name = match key {
        ScriptValue::String(name) => name,
        other => return Err(BridgeError::shape("string key", other.type_name())),
    };
    if let Some(method) = lookup_method(handle, name) {
        return Ok(method);
    }
    let (i, _) = exported_field(handle, name)?;
    let field = handle.value().field_at(i)?;
    handle.bridge().wrap(&field)
}

fn record_set_index(handle: &HandleRef, key: &ScriptValue, value: &ScriptValue) -> BridgeResult<()> {
    let name = match key {
        ScriptValue::String(name) => name,
        other => return Err(BridgeError::shape("string key", other.type_name())),
    };
    let (i, ty) = exported_field(handle, name)?;
    let decoded = handle.bridge().unwrap(value, &ty)?;
    handle.value().set_field_at(i, decoded)
}

// ============================================================================
// Sequences
// ============================================================================

/// Translate a 1-based script position into a 0-based host index
fn position(key: f64, len: usize) -> BridgeResult<usize> {
    let index = key as i64;
    if index < 1 || index as usize > len {
        return Err(BridgeError::IndexOutOfRange { index, len });
    }
    Ok(index as usize - 1)
}

fn sequence_index(handle: &HandleRef, key: &ScriptValue) -> BridgeResult<ScriptValue> {
    match key {
        ScriptValue::Number(n) => {
            let value = handle.value();
            let i = position(*n, value.len())?;
            handle.bridge().wrap(&value.index(i)?)
        }
        ScriptValue::String(name) => lookup_method(handle, name)
            .ok_or_else(|| BridgeError::field_not_found(handle.ty(), name.as_str())),
        other => Err(BridgeError::shape("number or string key", other.type_name())),
    }
}

fn sequence_set_index(
    handle: &HandleRef,
    key: &ScriptValue,
    value: &ScriptValue,
) -> BridgeResult<()> {
    let n = match key {
        ScriptValue::Number(n) => *n,
        other => return Err(BridgeError::shape("number key", other.type_name())),
    };
    let sequence = handle.value();
    let i = position(n, sequence.len())?;
    let elem = sequence
        .ty()
        .elem()
        .cloned()
        .ok_or_else(|| BridgeError::shape("slice or array", sequence.ty()))?;
    let decoded = handle.bridge().unwrap(value, &elem)?;
    sequence.set_index(i, decoded)?;
    handle.set_value(sequence);
    Ok(())
}

// ============================================================================
// Mappings
// ============================================================================

fn map_types(handle: &HandleRef) -> BridgeResult<(Type, Type)> {
    match handle.ty().kind() {
        TypeKind::Map(key, value) => Ok((key.clone(), value.clone())),
        _ => Err(BridgeError::shape("map", handle.ty())),
    }
}

fn mapping_index(handle: &HandleRef, key: &ScriptValue) -> BridgeResult<ScriptValue> {
    if let ScriptValue::String(name) = key {
        if let Some(method) = lookup_method(handle, name) {
            return Ok(method);
        }
    }
    let (key_ty, _) = map_types(handle)?;
    let bridge = handle.bridge();
    let key = bridge.unwrap(key, &key_ty)?;
    match handle.value().map_get(&key)? {
        Some(entry) => bridge.wrap(&entry),
        None => Ok(ScriptValue::Nil),
    }
}

fn mapping_set_index(
    handle: &HandleRef,
    key: &ScriptValue,
    value: &ScriptValue,
) -> BridgeResult<()> {
    let (key_ty, value_ty) = map_types(handle)?;
    let bridge = handle.bridge();
    let key = bridge.unwrap(key, &key_ty)?;
    let map = handle.value();
    if value.is_nil() {
        map.map_remove(&key)?;
        return Ok(());
    }
    let value = bridge.unwrap(value, &value_ty)?;
    map.map_insert(key, value)
}

// ============================================================================
// Shared
// ============================================================================

fn value_len(handle: &HandleRef) -> BridgeResult<usize> {
    Ok(handle.value().len())
}

/// The value's `String() string` method when it declares one, else
/// `typename(value)`
fn handle_to_string(handle: &HandleRef) -> BridgeResult<String> {
    let methods = handle.methods();
    let stringer = methods.get("String").filter(|entry| {
        entry.sig.params.is_empty()
            && entry.sig.results.len() == 1
            && matches!(entry.sig.results[0].kind(), TypeKind::String)
    });
    let value = handle.value();
    match stringer {
        Some(entry) => {
            let results = entry.call(&handle.bridge(), &value, &[])?;
            match results.first() {
                Some(ScriptValue::String(s)) => Ok(s.clone()),
                Some(other) => other.to_display_string(),
                None => Ok(String::new()),
            }
        }
        None => Ok(format!("{}({})", value.ty(), value)),
    }
}
