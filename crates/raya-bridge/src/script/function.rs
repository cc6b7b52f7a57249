//! Native functions callable from script code

use std::fmt;
use std::rc::Rc;

use super::value::ScriptValue;
use crate::error::{BridgeError, BridgeResult};

/// Body of a script-callable function
pub type NativeFn = dyn Fn(&[ScriptValue]) -> BridgeResult<Vec<ScriptValue>>;

struct FunctionInner {
    name: String,
    arity: usize,
    returns: usize,
    body: Box<NativeFn>,
}

/// A fixed-arity function value
///
/// Calls are checked on both sides: the argument count must equal the
/// declared arity before the body runs, and the body must produce exactly
/// the declared number of results.
#[derive(Clone)]
pub struct ScriptFunction(Rc<FunctionInner>);

impl ScriptFunction {
    /// Create a function with a fixed argument and result count
    pub fn new<F>(name: impl Into<String>, arity: usize, returns: usize, body: F) -> Self
    where
        F: Fn(&[ScriptValue]) -> BridgeResult<Vec<ScriptValue>> + 'static,
    {
        Self(Rc::new(FunctionInner {
            name: name.into(),
            arity,
            returns,
            body: Box::new(body),
        }))
    }

    /// Function name, used in error messages
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Declared argument count
    pub fn arity(&self) -> usize {
        self.0.arity
    }

    /// Declared result count
    pub fn returns(&self) -> usize {
        self.0.returns
    }

    /// Invoke the function
    pub fn call(&self, args: &[ScriptValue]) -> BridgeResult<Vec<ScriptValue>> {
        if args.len() != self.0.arity {
            return Err(BridgeError::ArityMismatch {
                name: self.0.name.clone(),
                expected: self.0.arity,
                got: args.len(),
            });
        }
        let results = (self.0.body)(args)?;
        if results.len() != self.0.returns {
            return Err(BridgeError::ResultCount {
                name: self.0.name.clone(),
                expected: self.0.returns,
                got: results.len(),
            });
        }
        Ok(results)
    }

    /// Whether both values are the same function
    pub fn ptr_eq(&self, other: &ScriptFunction) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for ScriptFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function<{}/{}>", self.0.name, self.0.arity)
    }
}
