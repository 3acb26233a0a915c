//! Generic-for iterator producers

use super::validation;
use crate::lua_value::{HostFunction, LuaArguments, LuaValue};
use std::rc::Rc;

/// Create the next() function: stateless traversal of a table. Nil steps
/// to the first entry; the order is the table's own and stays stable
/// while the table is not modified
pub fn create_next() -> HostFunction {
    Rc::new(|_interp, args| {
        validation::require_args("next", &args, 1)?;
        let table = validation::get_table("next", 0, &args)?;
        let key = args.get(1);

        let table = table.borrow();
        let mut entries = table.iter();
        if key.is_nil() {
            return Ok(match entries.next() {
                Some((k, v)) => LuaArguments::from_values(vec![k.clone(), v.clone()]),
                None => LuaArguments::single(LuaValue::Nil),
            });
        }
        for (k, _) in entries.by_ref() {
            if *k == key {
                break;
            }
        }
        Ok(match entries.next() {
            Some((k, v)) => LuaArguments::from_values(vec![k.clone(), v.clone()]),
            None => LuaArguments::single(LuaValue::Nil),
        })
    })
}

/// Create the pairs() function: returns `(next, t, nil)`
pub fn create_pairs() -> HostFunction {
    Rc::new(|_interp, args| {
        validation::require_args("pairs", &args, 1)?;
        validation::get_table("pairs", 0, &args)?;
        Ok(LuaArguments::from_values(vec![
            LuaValue::host_function(create_next()),
            args.get(0),
            LuaValue::Nil,
        ]))
    })
}

/// Create the ipairs() function: returns an array iterator over
/// `t[1], t[2], …` stopping at the first absent index
pub fn create_ipairs() -> HostFunction {
    Rc::new(|_interp, args| {
        validation::require_args("ipairs", &args, 1)?;
        validation::get_table("ipairs", 0, &args)?;

        let step: HostFunction = Rc::new(|_interp, args| {
            let table = validation::get_table("ipairs", 0, &args)?;
            let i = validation::get_number("ipairs", 1, &args)? + 1.0;
            let value = table.borrow().get(&LuaValue::Number(i));
            Ok(if value.is_nil() {
                LuaArguments::single(LuaValue::Nil)
            } else {
                LuaArguments::from_values(vec![LuaValue::Number(i), value])
            })
        });

        Ok(LuaArguments::from_values(vec![
            LuaValue::host_function(step),
            args.get(0),
            LuaValue::Number(0.0),
        ]))
    })
}
