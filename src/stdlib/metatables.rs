//! Metatable access and protected calls

use super::validation;
use crate::error_types::LuaError;
use crate::events;
use crate::lua_value::{HostFunction, LuaArguments, LuaValue};
use std::rc::Rc;

/// Create the setmetatable() function: installs, replaces or clears a
/// table's metatable and returns the table
pub fn create_setmetatable() -> HostFunction {
    Rc::new(|_interp, args| {
        validation::require_args("setmetatable", &args, 2)?;
        let table = validation::get_table("setmetatable", 0, &args)?;

        match args.get(1) {
            LuaValue::Table(metatable) => {
                table.borrow_mut().set_metatable(Some(metatable));
            }
            LuaValue::Nil => {
                table.borrow_mut().set_metatable(None);
            }
            other => {
                return Err(LuaError::type_error(
                    "nil or table",
                    other.type_name(),
                    "setmetatable (argument #2)",
                ))
            }
        }
        Ok(LuaArguments::single(args.get(0)))
    })
}

/// Create the getmetatable() function
pub fn create_getmetatable() -> HostFunction {
    Rc::new(|interp, args| {
        validation::require_args("getmetatable", &args, 1)?;
        let result = match events::metatable_of(interp, &args.get(0)) {
            Some(metatable) => LuaValue::Table(metatable),
            None => LuaValue::Nil,
        };
        Ok(LuaArguments::single(result))
    })
}

/// Create the error() function: raises a user error carrying an arbitrary
/// value payload
pub fn create_error() -> HostFunction {
    Rc::new(|_interp, args| Err(LuaError::user(args.first())))
}

/// Create the pcall() function: calls its first argument in protected
/// mode, converting any error into `(false, payload)`
pub fn create_pcall() -> HostFunction {
    Rc::new(|interp, args| {
        validation::require_args("pcall", &args, 1)?;
        let function = args.get(0);
        match interp.call(&function, args.skip(1)) {
            Ok(values) => {
                let mut out = LuaArguments::single(LuaValue::Boolean(true));
                out.extend(values);
                Ok(out)
            }
            Err(err) => Ok(LuaArguments::from_values(vec![
                LuaValue::Boolean(false),
                err.to_lua_value(),
            ])),
        }
    })
}

/// Create the xpcall() function: like pcall, but the error payload is
/// passed through a handler first
pub fn create_xpcall() -> HostFunction {
    Rc::new(|interp, args| {
        validation::require_args("xpcall", &args, 2)?;
        let function = args.get(0);
        let handler = validation::get_function("xpcall", 1, &args)?;
        match interp.call(&function, args.skip(2)) {
            Ok(values) => {
                let mut out = LuaArguments::single(LuaValue::Boolean(true));
                out.extend(values);
                Ok(out)
            }
            Err(err) => {
                let handled =
                    interp.call(&handler, LuaArguments::single(err.to_lua_value()))?;
                let mut out = LuaArguments::single(LuaValue::Boolean(false));
                out.extend(handled);
                Ok(out)
            }
        }
    })
}
