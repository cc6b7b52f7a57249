//! Opaque handles binding host values into the script engine

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::bridge::Bridge;
use crate::error::{BridgeError, BridgeResult};
use crate::methodset::{MethodEntry, MethodSet};
use crate::script::{ScriptFunction, ScriptValue};
use crate::types::Type;
use crate::value::Value;

/// Engine-level operations installed on a handle
///
/// One static table exists per composite family; the per-type part of
/// dispatch lives in the handle's [`MethodSet`].
pub struct ProxyOps {
    /// Family name, for diagnostics
    pub family: &'static str,
    /// `handle[key]`
    pub index: fn(&HandleRef, &ScriptValue) -> BridgeResult<ScriptValue>,
    /// `handle[key] = value`
    pub set_index: fn(&HandleRef, &ScriptValue, &ScriptValue) -> BridgeResult<()>,
    /// `#handle`
    pub len: fn(&HandleRef) -> BridgeResult<usize>,
    /// `tostring(handle)`
    pub to_string: fn(&HandleRef) -> BridgeResult<String>,
}

impl fmt::Debug for ProxyOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProxyOps({})", self.family)
    }
}

/// A host value bound into the script engine with its dispatch table
pub(crate) struct Handle {
    value: Value,
    ops: &'static ProxyOps,
    methods: Arc<MethodSet>,
    bridge: Bridge,
}

/// Shared reference to a bound host value
///
/// Every wrap creates a fresh handle; two handles over the same host value
/// are distinct script values that alias the same host storage.
#[derive(Clone)]
pub struct HandleRef(Rc<RefCell<Handle>>);

impl HandleRef {
    pub(crate) fn new(bridge: &Bridge, value: Value, ops: &'static ProxyOps) -> Self {
        let methods = bridge.methods().get(value.ty());
        log::trace!(
            "binding {} handle for {} ({} methods)",
            ops.family,
            value.ty(),
            methods.len()
        );
        Self(Rc::new(RefCell::new(Handle {
            value,
            ops,
            methods,
            bridge: bridge.clone(),
        })))
    }

    /// The bound host value (shares storage for composites)
    pub fn value(&self) -> Value {
        self.0.borrow().value.clone()
    }

    /// Replace the bound value
    pub(crate) fn set_value(&self, value: Value) {
        self.0.borrow_mut().value = value;
    }

    /// Type of the bound value
    pub fn ty(&self) -> Type {
        self.0.borrow().value.ty().clone()
    }

    /// The bound type's method set
    pub fn methods(&self) -> Arc<MethodSet> {
        self.0.borrow().methods.clone()
    }

    /// Composite family of the dispatch table
    pub fn family(&self) -> &'static str {
        self.0.borrow().ops.family
    }

    pub(crate) fn bridge(&self) -> Bridge {
        self.0.borrow().bridge.clone()
    }

    fn ops(&self) -> &'static ProxyOps {
        self.0.borrow().ops
    }

    /// `handle[key]`
    pub fn index(&self, key: &ScriptValue) -> BridgeResult<ScriptValue> {
        (self.ops().index)(self, key)
    }

    /// `handle[key] = value`
    pub fn set_index(&self, key: &ScriptValue, value: &ScriptValue) -> BridgeResult<()> {
        (self.ops().set_index)(self, key, value)
    }

    /// `#handle`
    pub fn len(&self) -> BridgeResult<usize> {
        (self.ops().len)(self)
    }

    /// `tostring(handle)`
    pub fn to_display_string(&self) -> BridgeResult<String> {
        (self.ops().to_string)(self)
    }

    /// Whether both references are the same handle
    pub fn ptr_eq(&self, other: &HandleRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Bound callable for a method of this handle
    ///
    /// The callable reads the handle's current value on every call, so it
    /// observes write-backs made through the handle.
    pub(crate) fn bind(&self, entry: &MethodEntry) -> ScriptFunction {
        let handle = self.clone();
        let entry = entry.clone();
        ScriptFunction::new(
            entry.name.clone(),
            entry.sig.arity(),
            entry.sig.results.len(),
            move |args| entry.call(&handle.bridge(), &handle.value(), args),
        )
    }
}

impl fmt::Debug for HandleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handle = self.0.borrow();
        write!(f, "userdata<{}: {:?}>", handle.ops.family, handle.value)
    }
}

/// Resolve a handle's bound value against a destination type
///
/// The bound value is returned as is when its type matches, converted when
/// convertible, or addressed when `dest` points to the bound type and the
/// value is addressable.
pub(crate) fn decode_handle(handle: &HandleRef, dest: &Type) -> BridgeResult<Value> {
    let bound = handle.value();
    log::trace!("decoding handle bound to {} as {}", bound.ty(), dest);

    if bound.ty() == dest {
        return Ok(bound);
    }
    if bound.ty().convertible_to(dest) {
        return bound.convert(dest);
    }
    if dest.as_pointer() == Some(bound.ty()) {
        if let Some(ptr) = bound.addr() {
            return Ok(ptr);
        }
    }
    Err(BridgeError::IncompatibleHandle {
        bound: bound.ty().to_string(),
        dest: dest.to_string(),
    })
}
