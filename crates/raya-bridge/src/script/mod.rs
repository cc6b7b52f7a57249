//! Script engine value surface
//!
//! The bridge treats the scripting engine as a black box and only needs its
//! value model: nil, booleans, numbers, strings, shared tables, fixed-arity
//! functions, and opaque handles to host values. This module provides that
//! surface together with the access protocol (`index`, `set_index`, `len`,
//! `tostring`, `call`) a VM performs on it, so handles can be driven exactly
//! as a script would drive them.

mod function;
mod table;
mod value;

pub use function::{NativeFn, ScriptFunction};
pub use table::{Table, TableKey, TableRef};
pub use value::ScriptValue;
