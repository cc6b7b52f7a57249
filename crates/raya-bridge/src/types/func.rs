//! Function signatures and declared methods

use std::fmt;
use std::sync::Arc;

use super::ty::Type;
use crate::error::BridgeResult;
use crate::value::Value;

/// Body of a host function value
pub type HostFnBody = dyn Fn(&[Value]) -> BridgeResult<Vec<Value>>;

/// Body of a declared method: `(receiver, args) -> results`
pub type MethodBody = dyn Fn(&Value, &[Value]) -> BridgeResult<Vec<Value>> + Send + Sync;

/// Function signature
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FnSig {
    /// Parameter types
    pub params: Vec<Type>,
    /// Result types
    pub results: Vec<Type>,
}

impl FnSig {
    /// Create a signature
    pub fn new(params: Vec<Type>, results: Vec<Type>) -> Self {
        Self { params, results }
    }

    /// Declared parameter count
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for FnSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |types: &[Type]| {
            types
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "({})", join(&self.params))?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " {}", single),
            results => write!(f, " ({})", join(results)),
        }
    }
}

/// Receiver kind of a declared method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Receiver {
    /// Method receives a copy of the value
    Value,
    /// Method receives a pointer to the value and may mutate it
    Pointer,
}

/// A method declared on a named type
#[derive(Clone)]
pub struct MethodDesc {
    /// Method name
    pub name: String,
    /// Receiver kind
    pub receiver: Receiver,
    /// Signature, excluding the receiver
    pub sig: FnSig,
    body: Arc<MethodBody>,
}

impl MethodDesc {
    /// Declare a method
    pub fn new<F>(
        name: impl Into<String>,
        receiver: Receiver,
        params: Vec<Type>,
        results: Vec<Type>,
        body: F,
    ) -> Self
    where
        F: Fn(&Value, &[Value]) -> BridgeResult<Vec<Value>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            receiver,
            sig: FnSig::new(params, results),
            body: Arc::new(body),
        }
    }

    /// Declare a value-receiver method
    pub fn value<F>(name: impl Into<String>, params: Vec<Type>, results: Vec<Type>, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> BridgeResult<Vec<Value>> + Send + Sync + 'static,
    {
        Self::new(name, Receiver::Value, params, results, body)
    }

    /// Declare a pointer-receiver method
    pub fn pointer<F>(name: impl Into<String>, params: Vec<Type>, results: Vec<Type>, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> BridgeResult<Vec<Value>> + Send + Sync + 'static,
    {
        Self::new(name, Receiver::Pointer, params, results, body)
    }

    /// Run the method body against an already-adjusted receiver
    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> BridgeResult<Vec<Value>> {
        (self.body)(receiver, args)
    }
}

impl fmt::Debug for MethodDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDesc")
            .field("name", &self.name)
            .field("receiver", &self.receiver)
            .field("sig", &self.sig)
            .finish()
    }
}
