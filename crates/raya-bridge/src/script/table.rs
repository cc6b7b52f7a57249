//! Hybrid sequence/associative script tables

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::value::ScriptValue;
use crate::error::{BridgeError, BridgeResult};

/// Hashable identity of a table key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableKey {
    /// Boolean key
    Bool(bool),
    /// Number key, by bit pattern with `-0` folded into `0`
    Number(u64),
    /// String key
    String(String),
    /// Reference key (table, function, or handle), by address
    Ref(usize),
}

impl TableKey {
    /// Key identity for a script value
    ///
    /// Nil and NaN are not valid keys.
    pub fn from_value(value: &ScriptValue) -> BridgeResult<Self> {
        match value {
            ScriptValue::Nil => Err(BridgeError::runtime("table index is nil")),
            ScriptValue::Bool(b) => Ok(TableKey::Bool(*b)),
            ScriptValue::Number(n) if n.is_nan() => Err(BridgeError::runtime("table index is NaN")),
            ScriptValue::Number(n) => Ok(TableKey::Number(number_bits(*n))),
            ScriptValue::String(s) => Ok(TableKey::String(s.clone())),
            ScriptValue::Table(t) => Ok(TableKey::Ref(Rc::as_ptr(&t.0) as *const () as usize)),
            ScriptValue::Function(f) => Ok(TableKey::Ref(f.addr())),
            ScriptValue::Handle(h) => Ok(TableKey::Ref(h.addr())),
        }
    }
}

/// Table storage
#[derive(Default)]
pub struct Table {
    entries: FxHashMap<TableKey, (ScriptValue, ScriptValue)>,
}

/// Shared reference to a script table
#[derive(Clone, Default)]
pub struct TableRef(pub(crate) Rc<RefCell<Table>>);

impl TableRef {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table holding `items` at positions `1..=N`
    pub fn from_seq(items: Vec<ScriptValue>) -> Self {
        let table = Self::new();
        {
            let mut inner = table.0.borrow_mut();
            for (i, item) in items.into_iter().enumerate() {
                if item.is_nil() {
                    continue;
                }
                let key = ScriptValue::Number((i + 1) as f64);
                let hashed = TableKey::Number(key_bits(i + 1));
                inner.entries.insert(hashed, (key, item));
            }
        }
        table
    }

    /// Raw lookup; absent keys (and nil) yield nil
    pub fn get(&self, key: &ScriptValue) -> ScriptValue {
        match TableKey::from_value(key) {
            Ok(hashed) => self
                .0
                .borrow()
                .entries
                .get(&hashed)
                .map(|(_, v)| v.clone())
                .unwrap_or_default(),
            Err(_) => ScriptValue::Nil,
        }
    }

    /// Raw lookup of a string key
    pub fn get_str(&self, key: &str) -> ScriptValue {
        self.get(&ScriptValue::from(key))
    }

    /// Raw lookup of a 1-based position
    pub fn get_int(&self, n: usize) -> ScriptValue {
        self.0
            .borrow()
            .entries
            .get(&TableKey::Number(key_bits(n)))
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    /// Raw assignment; assigning nil removes the entry
    pub fn set(&self, key: ScriptValue, value: ScriptValue) -> BridgeResult<()> {
        let hashed = TableKey::from_value(&key)?;
        let mut inner = self.0.borrow_mut();
        if value.is_nil() {
            inner.entries.remove(&hashed);
        } else {
            inner.entries.insert(hashed, (key, value));
        }
        Ok(())
    }

    /// Raw assignment of a string key
    pub fn set_str(&self, key: &str, value: ScriptValue) {
        let mut inner = self.0.borrow_mut();
        let hashed = TableKey::String(key.to_string());
        if value.is_nil() {
            inner.entries.remove(&hashed);
        } else {
            inner.entries.insert(hashed, (ScriptValue::from(key), value));
        }
    }

    /// Raw assignment of a 1-based position
    pub fn set_int(&self, n: usize, value: ScriptValue) {
        let mut inner = self.0.borrow_mut();
        let hashed = TableKey::Number(key_bits(n));
        if value.is_nil() {
            inner.entries.remove(&hashed);
        } else {
            inner.entries.insert(hashed, (ScriptValue::Number(n as f64), value));
        }
    }

    /// Largest `n` such that every position `1..=n` holds a non-nil value
    pub fn max_n(&self) -> usize {
        let inner = self.0.borrow();
        let mut n = 0;
        while inner.entries.contains_key(&TableKey::Number(key_bits(n + 1))) {
            n += 1;
        }
        n
    }

    /// Number of present entries
    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.0.borrow().entries.is_empty()
    }

    /// Snapshot of all present `(key, value)` pairs, in unspecified order
    pub fn pairs(&self) -> Vec<(ScriptValue, ScriptValue)> {
        self.0.borrow().entries.values().cloned().collect()
    }

    /// Whether both references point at the same table
    pub fn ptr_eq(&self, other: &TableRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

fn number_bits(n: f64) -> u64 {
    if n == 0.0 {
        0.0f64.to_bits()
    } else {
        n.to_bits()
    }
}

fn key_bits(n: usize) -> u64 {
    number_bits(n as f64)
}

impl fmt::Debug for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        let mut map = f.debug_map();
        for (key, value) in inner.entries.values() {
            map.entry(key, value);
        }
        map.finish()
    }
}
