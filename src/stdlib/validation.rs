//! Validation helpers for base-library functions
//!
//! Provides consistent argument validation and type checking so the
//! individual functions stay free of boilerplate.

use crate::error_types::{LuaError, LuaResult};
use crate::lua_value::{LuaArguments, LuaTable, LuaValue};
use std::cell::RefCell;
use std::rc::Rc;

/// Require at least `min` arguments; extra arguments are ignored, as Lua
/// does
pub fn require_args(name: &str, args: &LuaArguments, min: usize) -> LuaResult<()> {
    if args.len() < min {
        return Err(LuaError::user_message(format!(
            "bad argument #{} to '{}' (value expected)",
            args.len() + 1,
            name
        )));
    }
    Ok(())
}

/// Extract a number with type checking
pub fn get_number(name: &str, index: usize, args: &LuaArguments) -> LuaResult<f64> {
    let arg = args.get(index);
    match arg {
        LuaValue::Number(n) => Ok(n),
        other => Err(LuaError::type_error(
            "number",
            other.type_name(),
            argument_context(name, index),
        )),
    }
}

/// Extract a table reference with type checking
pub fn get_table(
    name: &str,
    index: usize,
    args: &LuaArguments,
) -> LuaResult<Rc<RefCell<LuaTable>>> {
    match args.get(index) {
        LuaValue::Table(table) => Ok(table),
        other => Err(LuaError::type_error(
            "table",
            other.type_name(),
            argument_context(name, index),
        )),
    }
}

/// Extract a function value with type checking
pub fn get_function(name: &str, index: usize, args: &LuaArguments) -> LuaResult<LuaValue> {
    match args.get(index) {
        function @ LuaValue::Function(_) => Ok(function),
        other => Err(LuaError::type_error(
            "function",
            other.type_name(),
            argument_context(name, index),
        )),
    }
}

fn argument_context(name: &str, index: usize) -> String {
    format!("{} (argument #{})", name, index + 1)
}
