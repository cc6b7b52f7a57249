//! Deep conversion
//!
//! Copies host values out to plain script data and decodes script data back
//! into host values of a caller-supplied type. Nothing produced here aliases
//! its source, except opaque handles which decode to the host value they
//! are bound to.

use crate::bridge::Bridge;
use crate::config::ArrayLengthPolicy;
use crate::convert::{infer_destination, scalar_to_script};
use crate::error::{BridgeError, BridgeResult};
use crate::proxy::decode_handle;
use crate::script::{ScriptValue, TableRef};
use crate::types::{Type, TypeKind};
use crate::value::Value;

/// Copy a host value into a script value
pub(crate) fn native_to_script(bridge: &Bridge, value: &Value, tag: &str) -> BridgeResult<ScriptValue> {
    if let Some(script) = scalar_to_script(value)? {
        return Ok(script);
    }

    match value.kind() {
        TypeKind::Interface(_) | TypeKind::Pointer(_) => match value.elem() {
            Some(inner) => native_to_script(bridge, &inner, tag),
            None => Ok(ScriptValue::Nil),
        },
        TypeKind::Slice(_) | TypeKind::Array(_, _) => {
            let items = value
                .to_vec()
                .iter()
                .map(|item| native_to_script(bridge, item, tag))
                .collect::<BridgeResult<Vec<_>>>()?;
            Ok(TableRef::from_seq(items).into())
        }
        TypeKind::Map(_, _) => {
            let table = TableRef::new();
            for (key, entry) in value.map_entries() {
                let key = native_to_script(bridge, &key, tag)?;
                let entry = native_to_script(bridge, &entry, tag)?;
                table.set(key, entry)?;
            }
            Ok(table.into())
        }
        TypeKind::Record(_) => Ok(record_to_table(bridge, value, tag)?.into()),
        TypeKind::Bool
        | TypeKind::Int(_)
        | TypeKind::Uint(_)
        | TypeKind::Float(_)
        | TypeKind::String
        | TypeKind::Complex(_)
        | TypeKind::Func(_)
        | TypeKind::Chan(_) => Err(BridgeError::unsupported(value.ty())),
    }
}

/// Copy a record (or pointer to one) into a table keyed by field tags
pub(crate) fn record_to_table(bridge: &Bridge, value: &Value, tag: &str) -> BridgeResult<TableRef> {
    let codec = bridge.codecs().get(value.ty(), tag)?;
    let table = TableRef::new();
    for (key, field) in codec.struct_to_map(value)? {
        table.set_str(&key, native_to_script(bridge, &field, tag)?);
    }
    Ok(table)
}

/// Decode a script value into a fresh host value of type `dest`
pub(crate) fn script_to_native(
    bridge: &Bridge,
    script: &ScriptValue,
    dest: &Type,
    tag: &str,
) -> BridgeResult<Value> {
    let table = match script {
        ScriptValue::Handle(handle) => return decode_handle(handle, dest),
        ScriptValue::Nil => {
            return if dest.is_nilable() {
                Value::nil(dest)
            } else {
                Err(BridgeError::shape(dest, "nil"))
            }
        }
        ScriptValue::Table(table) => Some(table),
        _ => None,
    };

    match dest.kind() {
        TypeKind::Interface(_) => {
            let concrete = infer_destination(script, bridge.config().empty_table)
                .ok_or_else(|| BridgeError::shape(dest, script.type_name()))?;
            let inner = script_to_native(bridge, script, &concrete, tag)?;
            Value::interface(dest, inner)
        }
        TypeKind::String => match script {
            ScriptValue::String(s) => Value::from_string(dest, s.as_str()),
            other => Err(BridgeError::shape(dest, other.type_name())),
        },
        TypeKind::Int(_) | TypeKind::Uint(_) | TypeKind::Float(_) => match script {
            ScriptValue::Number(n) => Value::from_f64(dest, *n),
            other => Err(BridgeError::shape(dest, other.type_name())),
        },
        TypeKind::Bool => match script {
            ScriptValue::Bool(b) => Value::from_bool(dest, *b),
            other => Err(BridgeError::shape(dest, other.type_name())),
        },
        TypeKind::Slice(elem) => {
            let table = table.ok_or_else(|| BridgeError::shape(dest, script.type_name()))?;
            let items = decode_sequence(bridge, table, table.max_n(), elem, tag)?;
            Value::slice_of(dest, items)
        }
        TypeKind::Array(elem, len) => {
            let table = table.ok_or_else(|| BridgeError::shape(dest, script.type_name()))?;
            let n = table.max_n();
            if n != *len && bridge.config().array_length == ArrayLengthPolicy::Exact {
                return Err(BridgeError::SizeMismatch {
                    ty: dest.to_string(),
                    expected: *len,
                    found: n,
                });
            }
            let mut items = decode_sequence(bridge, table, n.min(*len), elem, tag)?;
            items.resize_with(*len, || Value::zero(elem));
            Value::array_of(dest, items)
        }
        TypeKind::Map(key_ty, value_ty) => {
            let table = table.ok_or_else(|| BridgeError::shape(dest, script.type_name()))?;
            let entries = table
                .pairs()
                .iter()
                .map(|(key, entry)| {
                    Ok((
                        script_to_native(bridge, key, key_ty, tag)?,
                        script_to_native(bridge, entry, value_ty, tag)?,
                    ))
                })
                .collect::<BridgeResult<Vec<_>>>()?;
            Value::map_of(dest, entries)
        }
        TypeKind::Record(_) => {
            let table = table.ok_or_else(|| BridgeError::shape(dest, script.type_name()))?;
            table_to_record(bridge, table, dest, tag)
        }
        TypeKind::Pointer(elem) => {
            let inner = script_to_native(bridge, script, elem, tag)?;
            Ok(Value::pointer_to(inner))
        }
        TypeKind::Complex(_) | TypeKind::Func(_) | TypeKind::Chan(_) => {
            Err(BridgeError::unsupported(dest))
        }
    }
}

/// Decode a string-keyed table into a record (or pointer to one)
pub(crate) fn table_to_record(
    bridge: &Bridge,
    table: &TableRef,
    dest: &Type,
    tag: &str,
) -> BridgeResult<Value> {
    let codec = bridge.codecs().get(dest, tag)?;

    // Every key must be a string before any field is resolved
    let pairs = table
        .pairs()
        .into_iter()
        .map(|(key, entry)| match key {
            ScriptValue::String(key) => Ok((key, entry)),
            other => Err(BridgeError::NonStringKey {
                record: codec.record_type().to_string(),
                found: other.type_name().to_string(),
            }),
        })
        .collect::<BridgeResult<Vec<_>>>()?;

    let mut entries = Vec::with_capacity(pairs.len());
    for (key, entry) in pairs {
        let field = codec.field_for_tag(&key)?;
        let value = script_to_native(bridge, &entry, &field.ty, tag)?;
        entries.push((key, value));
    }
    let record = codec.map_to_struct(entries)?;
    match dest.kind() {
        TypeKind::Pointer(_) => Ok(Value::pointer_to(record)),
        _ => Ok(record),
    }
}

fn decode_sequence(
    bridge: &Bridge,
    table: &TableRef,
    n: usize,
    elem: &Type,
    tag: &str,
) -> BridgeResult<Vec<Value>> {
    (1..=n)
        .map(|i| script_to_native(bridge, &table.get_int(i), elem, tag))
        .collect()
}
