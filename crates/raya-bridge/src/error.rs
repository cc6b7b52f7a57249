//! Error types for host/script value conversion

use thiserror::Error;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised while converting, proxying, or calling across the
/// host/script boundary.
///
/// Every variant is recoverable by the caller. When raised from inside a
/// method thunk the error becomes the `Err` of the script call that invoked
/// it, aborting that call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BridgeError {
    /// The value's kind has no script representation (complex, channel, ...)
    #[error("Unsupported kind: cannot convert {ty}")]
    UnsupportedKind {
        /// Offending host type
        ty: String,
    },

    /// A table was expected where a scalar was found, or vice versa
    #[error("Shape mismatch: expected {expected}, got {found}")]
    ShapeMismatch {
        /// Expected shape or destination type
        expected: String,
        /// Script type that was found
        found: String,
    },

    /// Record decode saw a table key that is not a string
    #[error("Cannot decode a table with a non-string key ({found}) into {record}")]
    NonStringKey {
        /// Destination record type
        record: String,
        /// Script type of the offending key
        found: String,
    },

    /// Tag or field lookup miss
    #[error("Field '{field}' not found on {record}")]
    FieldNotFound {
        /// Record (or proxied) type
        record: String,
        /// Requested tag or field name
        field: String,
    },

    /// Fixed-size array length mismatch
    #[error("Size mismatch for {ty}: expected {expected} elements, got {found}")]
    SizeMismatch {
        /// Array type
        ty: String,
        /// Fixed length of the array
        expected: usize,
        /// Length found in the source
        found: usize,
    },

    /// An opaque handle's bound value cannot satisfy the destination type
    #[error("Incompatible handle: cannot convert handle bound to {bound} into {dest}")]
    IncompatibleHandle {
        /// Type of the bound host value
        bound: String,
        /// Requested destination type
        dest: String,
    },

    /// A function or method was called with the wrong number of arguments
    #[error("Arity mismatch calling {name}: expected {expected} args, got {got}")]
    ArityMismatch {
        /// Function or method name
        name: String,
        /// Declared parameter count
        expected: usize,
        /// Number of arguments supplied
        got: usize,
    },

    /// A function returned a different number of values than it declares
    #[error("Result count mismatch in {name}: expected {expected} return values, got {got}")]
    ResultCount {
        /// Function or method name
        name: String,
        /// Declared result count
        expected: usize,
        /// Number of values returned
        got: usize,
    },

    /// A primitive value is not convertible to the destination type
    #[error("Cannot convert {from} to {to}")]
    Conversion {
        /// Source type
        from: String,
        /// Destination type
        to: String,
    },

    /// Sequence proxy access beyond its length
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// 1-based index as seen by the script
        index: i64,
        /// Sequence length
        len: usize,
    },

    /// Runtime error raised by the script engine or a host callback
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Invalid bridge configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl BridgeError {
    /// Create an unsupported kind error
    pub fn unsupported(ty: impl ToString) -> Self {
        Self::UnsupportedKind { ty: ty.to_string() }
    }

    /// Create a shape mismatch error
    pub fn shape(expected: impl ToString, found: impl ToString) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Create a conversion error
    pub fn conversion(from: impl ToString, to: impl ToString) -> Self {
        Self::Conversion {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Create a field lookup error
    pub fn field_not_found(record: impl ToString, field: impl Into<String>) -> Self {
        Self::FieldNotFound {
            record: record.to_string(),
            field: field.into(),
        }
    }

    /// Create a runtime error
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_types() {
        let err = BridgeError::unsupported("complex128");
        assert_eq!(err.to_string(), "Unsupported kind: cannot convert complex128");

        let err = BridgeError::ArityMismatch {
            name: "SetName".to_string(),
            expected: 1,
            got: 3,
        };
        assert_eq!(
            err.to_string(),
            "Arity mismatch calling SetName: expected 1 args, got 3"
        );
    }

    #[test]
    fn test_helpers_build_matching_variants() {
        assert_eq!(
            BridgeError::shape("table", "number"),
            BridgeError::ShapeMismatch {
                expected: "table".to_string(),
                found: "number".to_string(),
            }
        );
        assert!(matches!(
            BridgeError::field_not_found("Blah", "colour"),
            BridgeError::FieldNotFound { ref field, .. } if field == "colour"
        ));
    }
}
