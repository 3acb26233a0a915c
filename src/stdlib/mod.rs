//! Base-library functions installed into the root scope
//!
//! These are the host callables every interpreter starts with: type
//! inspection and conversion, raw table access, the generic-for iterator
//! producers, metatable access and protected calls. The library module
//! tables (string, math, io, ...) are a host concern and not provided
//! here.

pub mod iterators;
pub mod metatables;
pub mod validation;

use crate::error_types::LuaError;
use crate::interpreter::Interpreter;
use crate::lua_value::{HostFunction, LuaArguments, LuaValue};
use std::rc::Rc;

/// Install the base library into the interpreter's root scope
pub fn install(interp: &Interpreter) {
    interp.bind_function("print", create_print());
    interp.bind_function("type", create_type());
    interp.bind_function("tostring", create_tostring());
    interp.bind_function("tonumber", create_tonumber());
    interp.bind_function("assert", create_assert());
    interp.bind_function("select", create_select());
    interp.bind_function("unpack", create_unpack());
    interp.bind_function("rawget", create_rawget());
    interp.bind_function("rawset", create_rawset());
    interp.bind_function("rawequal", create_rawequal());
    interp.bind_function("rawlen", create_rawlen());
    interp.bind_function("next", iterators::create_next());
    interp.bind_function("pairs", iterators::create_pairs());
    interp.bind_function("ipairs", iterators::create_ipairs());
    interp.bind_function("setmetatable", metatables::create_setmetatable());
    interp.bind_function("getmetatable", metatables::create_getmetatable());
    interp.bind_function("error", metatables::create_error());
    interp.bind_function("pcall", metatables::create_pcall());
    interp.bind_function("xpcall", metatables::create_xpcall());
}

/// Create the print function that writes its arguments to stdout,
/// tab-separated
pub fn create_print() -> HostFunction {
    Rc::new(|_interp, args| {
        let output = args
            .values()
            .iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join("\t");
        println!("{}", output);
        Ok(LuaArguments::new())
    })
}

/// Create the type() function that returns the type name of a value
pub fn create_type() -> HostFunction {
    Rc::new(|_interp, args| {
        validation::require_args("type", &args, 1)?;
        Ok(LuaArguments::single(LuaValue::String(
            args.first().type_name().to_string(),
        )))
    })
}

/// Create the tostring() function
pub fn create_tostring() -> HostFunction {
    Rc::new(|_interp, args| {
        validation::require_args("tostring", &args, 1)?;
        Ok(LuaArguments::single(LuaValue::String(
            args.first().to_string(),
        )))
    })
}

/// Create the tonumber() function; values with no numeric reading come
/// back as nil rather than an error
pub fn create_tonumber() -> HostFunction {
    Rc::new(|_interp, args| {
        let result = match args.first().as_number() {
            Some(n) => LuaValue::Number(n),
            None => LuaValue::Nil,
        };
        Ok(LuaArguments::single(result))
    })
}

/// Create the assert() function: passes every argument through when the
/// first is truthy, raises the second (or a default message) otherwise
pub fn create_assert() -> HostFunction {
    Rc::new(|_interp, args| {
        validation::require_args("assert", &args, 1)?;
        if args.first().is_truthy() {
            return Ok(args);
        }
        match args.get(1) {
            LuaValue::Nil => Err(LuaError::user_message("assertion failed!")),
            message => Err(LuaError::user(message)),
        }
    })
}

/// Create the select() function: `select('#', ...)` counts the varargs,
/// `select(n, ...)` drops the first n-1 of them
pub fn create_select() -> HostFunction {
    Rc::new(|_interp, args| {
        validation::require_args("select", &args, 1)?;
        let rest = args.skip(1);
        match args.first() {
            LuaValue::String(s) if s == "#" => Ok(LuaArguments::single(LuaValue::Number(
                rest.len() as f64,
            ))),
            LuaValue::Number(n) if n >= 1.0 => Ok(rest.skip(n as usize - 1)),
            LuaValue::Number(n) if n < 0.0 && rest.len() as f64 + n >= 0.0 => {
                Ok(rest.skip((rest.len() as f64 + n) as usize))
            }
            _ => Err(LuaError::user_message(
                "bad argument #1 to 'select' (index out of range)",
            )),
        }
    })
}

/// Create the unpack() function: spreads `t[i..j]` into a value list
pub fn create_unpack() -> HostFunction {
    Rc::new(|_interp, args| {
        let table = validation::get_table("unpack", 0, &args)?;
        let from = match args.get(1) {
            LuaValue::Nil => 1.0,
            LuaValue::Number(n) => n,
            other => {
                return Err(LuaError::type_error(
                    "number",
                    other.type_name(),
                    "unpack (argument #2)",
                ))
            }
        };
        let to = match args.get(2) {
            LuaValue::Nil => table.borrow().length(),
            LuaValue::Number(n) => n,
            other => {
                return Err(LuaError::type_error(
                    "number",
                    other.type_name(),
                    "unpack (argument #3)",
                ))
            }
        };

        let mut out = LuaArguments::new();
        let mut i = from;
        while i <= to {
            out.push(table.borrow().get(&LuaValue::Number(i)));
            i += 1.0;
        }
        Ok(out)
    })
}

/// Create the rawget() function: indexed read without `__index`
pub fn create_rawget() -> HostFunction {
    Rc::new(|_interp, args| {
        let table = validation::get_table("rawget", 0, &args)?;
        let value = table.borrow().get(&args.get(1));
        Ok(LuaArguments::single(value))
    })
}

/// Create the rawset() function: indexed write without `__newindex`;
/// returns the table
pub fn create_rawset() -> HostFunction {
    Rc::new(|_interp, args| {
        let table = validation::get_table("rawset", 0, &args)?;
        table.borrow_mut().set(args.get(1), args.get(2))?;
        Ok(LuaArguments::single(args.get(0)))
    })
}

/// Create the rawequal() function: primitive equality, no `__eq`
pub fn create_rawequal() -> HostFunction {
    Rc::new(|_interp, args| {
        validation::require_args("rawequal", &args, 2)?;
        Ok(LuaArguments::single(LuaValue::Boolean(
            args.get(0) == args.get(1),
        )))
    })
}

/// Create the rawlen() function: border length, no `__len`
pub fn create_rawlen() -> HostFunction {
    Rc::new(|_interp, args| {
        validation::require_args("rawlen", &args, 1)?;
        match args.first() {
            LuaValue::Table(table) => {
                let length = table.borrow().length();
                Ok(LuaArguments::single(LuaValue::Number(length)))
            }
            LuaValue::String(s) => Ok(LuaArguments::single(LuaValue::Number(s.len() as f64))),
            other => Err(LuaError::type_error(
                "table or string",
                other.type_name(),
                "rawlen (argument #1)",
            )),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lua_value::LuaTable;

    fn call(function: HostFunction, args: Vec<LuaValue>) -> LuaArguments {
        let mut interp = Interpreter::new();
        function(&mut interp, LuaArguments::from_values(args)).unwrap()
    }

    #[test]
    fn test_type_function() {
        let result = call(create_type(), vec![LuaValue::Number(1.0)]);
        assert_eq!(result.first(), LuaValue::String("number".to_string()));
    }

    #[test]
    fn test_tostring_formats_numbers() {
        let result = call(create_tostring(), vec![LuaValue::Number(3.0)]);
        assert_eq!(result.first(), LuaValue::String("3".to_string()));
        let result = call(create_tostring(), vec![LuaValue::Number(3.25)]);
        assert_eq!(result.first(), LuaValue::String("3.25".to_string()));
    }

    #[test]
    fn test_tonumber_nil_on_failure() {
        let result = call(create_tonumber(), vec![LuaValue::String("12".to_string())]);
        assert_eq!(result.first(), LuaValue::Number(12.0));
        let result = call(create_tonumber(), vec![LuaValue::String("nope".to_string())]);
        assert_eq!(result.first(), LuaValue::Nil);
        let result = call(create_tonumber(), vec![LuaValue::Boolean(true)]);
        assert_eq!(result.first(), LuaValue::Nil);
    }

    #[test]
    fn test_assert_passes_values_through() {
        let result = call(
            create_assert(),
            vec![LuaValue::Number(1.0), LuaValue::Number(2.0)],
        );
        assert_eq!(result.len(), 2);
        assert_eq!(result.get(1), LuaValue::Number(2.0));
    }

    #[test]
    fn test_assert_raises_on_falsy() {
        let mut interp = Interpreter::new();
        let err = create_assert()(
            &mut interp,
            LuaArguments::from_values(vec![LuaValue::Nil, LuaValue::Number(9.0)]),
        )
        .unwrap_err();
        assert_eq!(err.to_lua_value(), LuaValue::Number(9.0));
    }

    #[test]
    fn test_select_count_and_tail() {
        let args = vec![
            LuaValue::String("#".to_string()),
            LuaValue::Number(10.0),
            LuaValue::Number(20.0),
        ];
        assert_eq!(call(create_select(), args).first(), LuaValue::Number(2.0));

        let args = vec![
            LuaValue::Number(2.0),
            LuaValue::Number(10.0),
            LuaValue::Number(20.0),
            LuaValue::Number(30.0),
        ];
        let tail = call(create_select(), args);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.first(), LuaValue::Number(20.0));
    }

    #[test]
    fn test_unpack_spreads_array_part() {
        let table = LuaTable::new_shared();
        for i in 1..=3 {
            table
                .borrow_mut()
                .set(LuaValue::Number(i as f64), LuaValue::Number(i as f64 * 10.0))
                .unwrap();
        }
        let result = call(create_unpack(), vec![LuaValue::Table(table)]);
        assert_eq!(result.len(), 3);
        assert_eq!(result.get(2), LuaValue::Number(30.0));
    }

    #[test]
    fn test_rawequal_ignores_metamethods() {
        let a = LuaValue::Table(LuaTable::new_shared());
        let b = LuaValue::Table(LuaTable::new_shared());
        assert_eq!(
            call(create_rawequal(), vec![a.clone(), a.clone()]).first(),
            LuaValue::Boolean(true)
        );
        assert_eq!(
            call(create_rawequal(), vec![a, b]).first(),
            LuaValue::Boolean(false)
        );
    }
}
