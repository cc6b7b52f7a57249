//! Script engine values and the access protocol a VM performs on them

use std::fmt;

use super::function::ScriptFunction;
use super::table::TableRef;
use crate::convert::format_number;
use crate::error::{BridgeError, BridgeResult};
use crate::proxy::HandleRef;

/// A value living in the script engine
#[derive(Clone, Default)]
pub enum ScriptValue {
    /// Absence of a value
    #[default]
    Nil,
    /// Boolean
    Bool(bool),
    /// Double precision number
    Number(f64),
    /// String
    String(String),
    /// Shared hybrid table
    Table(TableRef),
    /// Callable function
    Function(ScriptFunction),
    /// Opaque handle to a host value
    Handle(HandleRef),
}

impl ScriptValue {
    /// Script-level type name
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Nil => "nil",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Table(_) => "table",
            ScriptValue::Function(_) => "function",
            ScriptValue::Handle(_) => "userdata",
        }
    }

    /// Whether this is nil
    pub fn is_nil(&self) -> bool {
        matches!(self, ScriptValue::Nil)
    }

    /// Script truthiness: everything except nil and false
    pub fn truthy(&self) -> bool {
        !matches!(self, ScriptValue::Nil | ScriptValue::Bool(false))
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScriptValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Number payload
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Table payload
    pub fn as_table(&self) -> Option<&TableRef> {
        match self {
            ScriptValue::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Function payload
    pub fn as_function(&self) -> Option<&ScriptFunction> {
        match self {
            ScriptValue::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Handle payload
    pub fn as_handle(&self) -> Option<&HandleRef> {
        match self {
            ScriptValue::Handle(h) => Some(h),
            _ => None,
        }
    }

    // ========================================================================
    // Engine access protocol
    // ========================================================================

    /// `self[key]`
    pub fn index(&self, key: &ScriptValue) -> BridgeResult<ScriptValue> {
        match self {
            ScriptValue::Table(t) => Ok(t.get(key)),
            ScriptValue::Handle(h) => h.index(key),
            other => Err(BridgeError::runtime(format!(
                "attempt to index a {} value",
                other.type_name()
            ))),
        }
    }

    /// `self[key] = value`
    pub fn set_index(&self, key: ScriptValue, value: ScriptValue) -> BridgeResult<()> {
        match self {
            ScriptValue::Table(t) => t.set(key, value),
            ScriptValue::Handle(h) => h.set_index(&key, &value),
            other => Err(BridgeError::runtime(format!(
                "attempt to index a {} value",
                other.type_name()
            ))),
        }
    }

    /// `#self`
    pub fn len(&self) -> BridgeResult<usize> {
        match self {
            ScriptValue::String(s) => Ok(s.len()),
            ScriptValue::Table(t) => Ok(t.max_n()),
            ScriptValue::Handle(h) => h.len(),
            other => Err(BridgeError::runtime(format!(
                "attempt to get length of a {} value",
                other.type_name()
            ))),
        }
    }

    /// `tostring(self)`
    pub fn to_display_string(&self) -> BridgeResult<String> {
        match self {
            ScriptValue::Nil => Ok("nil".to_string()),
            ScriptValue::Bool(b) => Ok(b.to_string()),
            ScriptValue::Number(n) => Ok(format_number(*n)),
            ScriptValue::String(s) => Ok(s.clone()),
            ScriptValue::Table(t) => Ok(format!("table: {:p}", t.0.as_ptr())),
            ScriptValue::Function(f) => Ok(format!("function: {:#x}", f.addr())),
            ScriptValue::Handle(h) => h.to_display_string(),
        }
    }

    /// `self(args...)`
    pub fn call(&self, args: &[ScriptValue]) -> BridgeResult<Vec<ScriptValue>> {
        match self {
            ScriptValue::Function(f) => f.call(args),
            other => Err(BridgeError::runtime(format!(
                "attempt to call a {} value",
                other.type_name()
            ))),
        }
    }

    /// Look up `name` on `self` and call the result
    ///
    /// Methods exposed by handles are already bound to their receiver, so
    /// `args` excludes it.
    pub fn call_method(&self, name: &str, args: &[ScriptValue]) -> BridgeResult<Vec<ScriptValue>> {
        let callee = self.index(&ScriptValue::from(name))?;
        match callee {
            ScriptValue::Function(f) => f.call(args),
            other => Err(BridgeError::runtime(format!(
                "attempt to call method '{}' (a {} value)",
                name,
                other.type_name()
            ))),
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        ScriptValue::Bool(b)
    }
}

impl From<f64> for ScriptValue {
    fn from(n: f64) -> Self {
        ScriptValue::Number(n)
    }
}

impl From<i32> for ScriptValue {
    fn from(n: i32) -> Self {
        ScriptValue::Number(n as f64)
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::String(s.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(s: String) -> Self {
        ScriptValue::String(s)
    }
}

impl From<TableRef> for ScriptValue {
    fn from(t: TableRef) -> Self {
        ScriptValue::Table(t)
    }
}

impl From<ScriptFunction> for ScriptValue {
    fn from(f: ScriptFunction) -> Self {
        ScriptValue::Function(f)
    }
}

impl From<HandleRef> for ScriptValue {
    fn from(h: HandleRef) -> Self {
        ScriptValue::Handle(h)
    }
}

/// Raw equality: scalars by value, tables, functions, and handles by
/// identity.
impl PartialEq for ScriptValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScriptValue::Nil, ScriptValue::Nil) => true,
            (ScriptValue::Bool(a), ScriptValue::Bool(b)) => a == b,
            (ScriptValue::Number(a), ScriptValue::Number(b)) => a == b,
            (ScriptValue::String(a), ScriptValue::String(b)) => a == b,
            (ScriptValue::Table(a), ScriptValue::Table(b)) => a.ptr_eq(b),
            (ScriptValue::Function(a), ScriptValue::Function(b)) => a.ptr_eq(b),
            (ScriptValue::Handle(a), ScriptValue::Handle(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Nil => f.write_str("nil"),
            ScriptValue::Bool(b) => write!(f, "{}", b),
            ScriptValue::Number(n) => f.write_str(&format_number(*n)),
            ScriptValue::String(s) => write!(f, "{:?}", s),
            ScriptValue::Table(t) => write!(f, "{:?}", t),
            ScriptValue::Function(func) => write!(f, "{:?}", func),
            ScriptValue::Handle(h) => write!(f, "{:?}", h),
        }
    }
}
