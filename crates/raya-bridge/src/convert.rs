//! Shared conversion primitives
//!
//! Scalar conversions in both directions, table shape inspection, and the
//! destination inference used when decoding into an interface.

use once_cell::sync::Lazy;

use crate::config::EmptyTablePolicy;
use crate::error::{BridgeError, BridgeResult};
use crate::script::{ScriptValue, TableRef};
use crate::types::{Type, TypeKind};
use crate::value::{Data, Value};

static STRING: Lazy<Type> = Lazy::new(Type::string);
static FLOAT64: Lazy<Type> = Lazy::new(Type::float64);
static BOOL: Lazy<Type> = Lazy::new(Type::bool);
static GENERIC_SEQUENCE: Lazy<Type> = Lazy::new(|| Type::slice(Type::any()));
static GENERIC_MAPPING: Lazy<Type> = Lazy::new(|| Type::map(Type::string(), Type::any()));

/// `[]any`, the destination inferred for sequence-shaped tables
pub fn generic_sequence() -> &'static Type {
    &GENERIC_SEQUENCE
}

/// `map[string]any`, the destination inferred for mapping-shaped tables
pub fn generic_mapping() -> &'static Type {
    &GENERIC_MAPPING
}

/// Shape of a script table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableShape {
    /// Positions `1..=n` are populated (`n > 0`)
    Sequence(usize),
    /// No sequence part
    Mapping,
}

/// Classify a table by its maximum contiguous positive integer key
pub fn table_shape(table: &TableRef) -> TableShape {
    match table.max_n() {
        0 => TableShape::Mapping,
        n => TableShape::Sequence(n),
    }
}

/// Concrete destination to decode into when the requested destination is
/// an interface
///
/// Returns `None` for nil, functions, and handles, which have no inferred
/// host form.
pub fn infer_destination(script: &ScriptValue, empty: EmptyTablePolicy) -> Option<Type> {
    match script {
        ScriptValue::String(_) => Some(STRING.clone()),
        ScriptValue::Number(_) => Some(FLOAT64.clone()),
        ScriptValue::Bool(_) => Some(BOOL.clone()),
        ScriptValue::Table(t) => match (table_shape(t), empty) {
            (TableShape::Sequence(_), _) => Some(GENERIC_SEQUENCE.clone()),
            (TableShape::Mapping, EmptyTablePolicy::Sequence) if t.is_empty() => {
                Some(GENERIC_SEQUENCE.clone())
            }
            (TableShape::Mapping, _) => Some(GENERIC_MAPPING.clone()),
        },
        ScriptValue::Nil | ScriptValue::Function(_) | ScriptValue::Handle(_) => None,
    }
}

/// Render a number the way the script engine prints it
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n == f64::INFINITY {
        "inf".to_string()
    } else if n == f64::NEG_INFINITY {
        "-inf".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Script form of a bool, numeric, or string host value
///
/// Returns `Ok(None)` for every other kind so the caller can continue its
/// own dispatch. Integers beyond 2^53 lose precision.
pub fn scalar_to_script(value: &Value) -> BridgeResult<Option<ScriptValue>> {
    let script = match (&value.data, value.kind()) {
        (Data::Bool(b), _) => ScriptValue::Bool(*b),
        (Data::Int(i), _) => ScriptValue::Number(*i as f64),
        (Data::Uint(u), _) => ScriptValue::Number(*u as f64),
        (Data::Float(f), _) => ScriptValue::Number(*f),
        (Data::Str(s), _) => ScriptValue::String(s.clone()),
        (Data::Complex(_, _), _) | (_, TypeKind::Complex(_)) | (_, TypeKind::Chan(_)) => {
            return Err(BridgeError::unsupported(value.ty()))
        }
        _ => return Ok(None),
    };
    Ok(Some(script))
}

/// Decode a script number into a numeric destination
///
/// Narrowing casts apply without range checks.
pub fn number_to_native(n: f64, dest: &Type) -> Option<Value> {
    if dest.is_numeric() {
        Value::from_f64(dest, n).ok()
    } else {
        None
    }
}

/// Decode a script string into a string-kinded destination
pub fn string_to_native(s: &str, dest: &Type) -> Option<Value> {
    match dest.kind() {
        TypeKind::String => Value::from_string(dest, s).ok(),
        _ => None,
    }
}

/// Decode a script boolean into a bool-kinded destination
pub fn bool_to_native(b: bool, dest: &Type) -> Option<Value> {
    match dest.kind() {
        TypeKind::Bool => Value::from_bool(dest, b).ok(),
        _ => None,
    }
}

/// Primitive conversion of a boolean, number, or string to `dest`
///
/// Interface destinations receive the inferred concrete value boxed. Any
/// other mismatch is a [`BridgeError::Conversion`].
pub fn convert_scalar(script: &ScriptValue, dest: &Type) -> BridgeResult<Value> {
    if dest.is_interface() {
        let inner = match script {
            ScriptValue::String(s) => Value::from(s.as_str()),
            ScriptValue::Number(n) => Value::from(*n),
            ScriptValue::Bool(b) => Value::from(*b),
            other => return Err(BridgeError::conversion(other.type_name(), dest)),
        };
        return Value::interface(dest, inner);
    }
    let converted = match script {
        ScriptValue::String(s) => string_to_native(s, dest),
        ScriptValue::Number(n) => number_to_native(*n, dest),
        ScriptValue::Bool(b) => bool_to_native(*b, dest),
        _ => None,
    };
    converted.ok_or_else(|| BridgeError::conversion(script.type_name(), dest))
}
