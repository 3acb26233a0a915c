//! Error handling for the evaluator
//!
//! Provides strongly-typed error variants for everything the walker can
//! raise, plus the conversion to a Lua value used by protected calls.

use crate::lua_value::LuaValue;
use std::fmt;

/// Runtime error raised by the evaluator or by a host function
#[derive(Debug, Clone, PartialEq)]
pub enum LuaError {
    /// Operation applied to a value type it does not support, with no
    /// metamethod to fall back on
    TypeError {
        expected: String,
        got: String,
        context: String,
    },
    /// Nil or NaN used as a table key
    InvalidKey {
        key_type: String,
    },
    /// Numeric coercion failure (e.g. a non-numeric string in `+`)
    ArithmeticError {
        message: String,
    },
    /// Attempt to call a non-callable without `__call`
    CallError {
        value_type: String,
    },
    /// Non-numeric start/limit/step in a numeric for
    LoopError {
        what: String,
        got: String,
    },
    /// Call recursion limit exceeded
    StackOverflow {
        limit: usize,
    },
    /// Raised by a script via error() or by a host function; carries an
    /// arbitrary value payload
    UserError {
        value: LuaValue,
        traceback: Option<String>,
    },
}

impl LuaError {
    /// Create a type error with the context it occurred in
    pub fn type_error(
        expected: impl Into<String>,
        got: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        LuaError::TypeError {
            expected: expected.into(),
            got: got.into(),
            context: context.into(),
        }
    }

    /// Create an invalid-key error for the given key type name
    pub fn invalid_key(key_type: impl Into<String>) -> Self {
        LuaError::InvalidKey {
            key_type: key_type.into(),
        }
    }

    /// Create an arithmetic coercion error
    pub fn arithmetic(message: impl Into<String>) -> Self {
        LuaError::ArithmeticError {
            message: message.into(),
        }
    }

    /// Create a call error for the given value type name
    pub fn call(value_type: impl Into<String>) -> Self {
        LuaError::CallError {
            value_type: value_type.into(),
        }
    }

    /// Create a numeric-for bound error; `what` names the offending slot
    /// (initial value, limit, step)
    pub fn loop_bound(what: impl Into<String>, got: impl Into<String>) -> Self {
        LuaError::LoopError {
            what: what.into(),
            got: got.into(),
        }
    }

    /// Create a stack-overflow error for the given depth limit
    pub fn stack_overflow(limit: usize) -> Self {
        LuaError::StackOverflow { limit }
    }

    /// Create a user error carrying an arbitrary value payload
    pub fn user(value: LuaValue) -> Self {
        LuaError::UserError {
            value,
            traceback: None,
        }
    }

    /// Create a user error from a plain message string
    pub fn user_message(message: impl Into<String>) -> Self {
        LuaError::UserError {
            value: LuaValue::String(message.into()),
            traceback: None,
        }
    }

    /// Get error category for matching
    pub fn category(&self) -> &str {
        match self {
            LuaError::TypeError { .. } => "type",
            LuaError::InvalidKey { .. } => "key",
            LuaError::ArithmeticError { .. } => "arithmetic",
            LuaError::CallError { .. } => "call",
            LuaError::LoopError { .. } => "loop",
            LuaError::StackOverflow { .. } => "overflow",
            LuaError::UserError { .. } => "user",
        }
    }

    /// Get the message string for error reporting
    pub fn message(&self) -> String {
        match self {
            LuaError::TypeError {
                expected,
                got,
                context,
            } => format!(
                "Type error in {}: expected {}, got {}",
                context, expected, got
            ),
            LuaError::InvalidKey { key_type } => format!("Table index is {}", key_type),
            LuaError::ArithmeticError { message } => format!("Arithmetic error: {}", message),
            LuaError::CallError { value_type } => {
                format!("Attempt to call {} (not a function)", value_type)
            }
            LuaError::LoopError { what, got } => {
                format!("'for' {} must be a number, got {}", what, got)
            }
            LuaError::StackOverflow { limit } => {
                format!("Maximum call depth {} exceeded", limit)
            }
            LuaError::UserError { value, .. } => value.to_string(),
        }
    }

    /// The value a protected call hands to the caller on failure: user
    /// errors keep their payload, everything else becomes its message
    pub fn to_lua_value(&self) -> LuaValue {
        match self {
            LuaError::UserError { value, .. } => value.clone(),
            other => LuaValue::String(other.message()),
        }
    }
}

impl fmt::Display for LuaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for LuaError {}

/// Convenience type alias for Result with LuaError
pub type LuaResult<T> = Result<T, LuaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_error_creation() {
        let err = LuaError::type_error("number", "table", "add");
        assert_eq!(err.category(), "type");
        assert!(err.message().contains("add"));
        assert!(err.message().contains("number"));
        assert!(err.message().contains("table"));
    }

    #[test]
    fn test_invalid_key_creation() {
        let err = LuaError::invalid_key("nil");
        assert_eq!(err.category(), "key");
        assert!(err.message().contains("nil"));
    }

    #[test]
    fn test_arithmetic_error_creation() {
        let err = LuaError::arithmetic("cannot convert string 'abc' to a number");
        assert_eq!(err.category(), "arithmetic");
        assert!(err.message().contains("abc"));
    }

    #[test]
    fn test_call_error_creation() {
        let err = LuaError::call("number");
        assert_eq!(err.category(), "call");
        assert!(err.message().contains("number"));
    }

    #[test]
    fn test_loop_error_creation() {
        let err = LuaError::loop_bound("initial value", "string");
        assert_eq!(err.category(), "loop");
        assert!(err.message().contains("initial value"));
    }

    #[test]
    fn test_stack_overflow_message() {
        let err = LuaError::stack_overflow(200);
        assert_eq!(err.category(), "overflow");
        assert!(err.message().contains("200"));
    }

    #[test]
    fn test_user_error_keeps_payload() {
        let err = LuaError::user(LuaValue::Number(7.0));
        match &err {
            LuaError::UserError { value, traceback } => {
                assert_eq!(*value, LuaValue::Number(7.0));
                assert!(traceback.is_none());
            }
            _ => panic!("Expected UserError"),
        }
        assert_eq!(err.to_lua_value(), LuaValue::Number(7.0));
    }

    #[test]
    fn test_non_user_error_payload_is_message() {
        let err = LuaError::call("nil");
        match err.to_lua_value() {
            LuaValue::String(s) => assert!(s.contains("call")),
            other => panic!("Expected string payload, got {:?}", other),
        }
    }

    #[test]
    fn test_display_impl() {
        let err = LuaError::user_message("something broke");
        let display_str = format!("{}", err);
        assert!(display_str.contains("something broke"));
    }
}
