//! Metatable-driven operator dispatch
//!
//! Every operator first tries the primitive implementation on matching
//! operand types and falls back to the operand metatables, searched left
//! then right. Metatables are read at the moment of dispatch; swapping a
//! metatable mid-operation does not affect an in-flight lookup.

use crate::error_types::{LuaError, LuaResult};
use crate::interpreter::Interpreter;
use crate::lua_value::{LuaArguments, LuaTable, LuaValue};
use std::cell::RefCell;
use std::rc::Rc;

/// Upper bound on `__index`/`__newindex` re-index hops before the chain is
/// declared cyclic
const MAX_META_CHAIN: usize = 100;

/// The well-known metatable keys the evaluator dispatches through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LuaEvent {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Unm,
    Concat,
    Len,
    Eq,
    Lt,
    Le,
    Index,
    NewIndex,
    Call,
}

impl LuaEvent {
    pub fn name(self) -> &'static str {
        match self {
            LuaEvent::Add => "__add",
            LuaEvent::Sub => "__sub",
            LuaEvent::Mul => "__mul",
            LuaEvent::Div => "__div",
            LuaEvent::Mod => "__mod",
            LuaEvent::Pow => "__pow",
            LuaEvent::Unm => "__unm",
            LuaEvent::Concat => "__concat",
            LuaEvent::Len => "__len",
            LuaEvent::Eq => "__eq",
            LuaEvent::Lt => "__lt",
            LuaEvent::Le => "__le",
            LuaEvent::Index => "__index",
            LuaEvent::NewIndex => "__newindex",
            LuaEvent::Call => "__call",
        }
    }
}

/// The metatable governing a value: a table's own link, or the per-type
/// metatable for strings
pub fn metatable_of(interp: &Interpreter, value: &LuaValue) -> Option<Rc<RefCell<LuaTable>>> {
    match value {
        LuaValue::Table(table) => table.borrow().metatable(),
        LuaValue::String(_) => interp.string_metatable(),
        _ => None,
    }
}

/// Look up the handler a value carries for an event; absent metatables and
/// Nil entries both come back as None
pub fn metamethod(interp: &Interpreter, value: &LuaValue, event: LuaEvent) -> Option<LuaValue> {
    let metatable = metatable_of(interp, value)?;
    let handler = metatable
        .borrow()
        .get(&LuaValue::String(event.name().to_string()));
    if handler.is_nil() {
        None
    } else {
        Some(handler)
    }
}

fn call_handler(
    interp: &mut Interpreter,
    handler: &LuaValue,
    args: Vec<LuaValue>,
) -> LuaResult<LuaValue> {
    let results = interp.call(handler, LuaArguments::from_values(args))?;
    Ok(results.first())
}

/// Binary arithmetic: both operands coerce to numbers, or the event is
/// searched on the left operand then the right
pub fn arith(
    interp: &mut Interpreter,
    event: LuaEvent,
    left: &LuaValue,
    right: &LuaValue,
) -> LuaResult<LuaValue> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return Ok(LuaValue::Number(apply_arith(event, a, b)));
    }
    if let Some(handler) =
        metamethod(interp, left, event).or_else(|| metamethod(interp, right, event))
    {
        return call_handler(interp, &handler, vec![left.clone(), right.clone()]);
    }
    Err(arith_error(event, left, right))
}

fn apply_arith(event: LuaEvent, a: f64, b: f64) -> f64 {
    match event {
        LuaEvent::Add => a + b,
        LuaEvent::Sub => a - b,
        LuaEvent::Mul => a * b,
        LuaEvent::Div => a / b,
        // Lua's % is floored modulo
        LuaEvent::Mod => a - (a / b).floor() * b,
        LuaEvent::Pow => a.powf(b),
        _ => unreachable!("not an arithmetic event: {}", event.name()),
    }
}

fn arith_error(event: LuaEvent, left: &LuaValue, right: &LuaValue) -> LuaError {
    let culprit = if left.as_number().is_none() {
        left
    } else {
        right
    };
    match culprit {
        LuaValue::String(s) => {
            LuaError::arithmetic(format!("cannot convert string '{}' to a number", s))
        }
        other => LuaError::type_error("number", other.type_name(), event.name()),
    }
}

/// Unary minus: numeric coercion, then `__unm`
pub fn unary_minus(interp: &mut Interpreter, value: &LuaValue) -> LuaResult<LuaValue> {
    if let Some(n) = value.as_number() {
        return Ok(LuaValue::Number(-n));
    }
    if let Some(handler) = metamethod(interp, value, LuaEvent::Unm) {
        return call_handler(interp, &handler, vec![value.clone()]);
    }
    match value {
        LuaValue::String(s) => Err(LuaError::arithmetic(format!(
            "cannot convert string '{}' to a number",
            s
        ))),
        other => Err(LuaError::type_error("number", other.type_name(), "__unm")),
    }
}

fn concat_coercible(value: &LuaValue) -> bool {
    matches!(value, LuaValue::String(_) | LuaValue::Number(_))
}

/// `..`: strings and numbers concatenate directly, anything else goes
/// through `__concat`
pub fn concat(interp: &mut Interpreter, left: &LuaValue, right: &LuaValue) -> LuaResult<LuaValue> {
    if concat_coercible(left) && concat_coercible(right) {
        return Ok(LuaValue::String(format!("{}{}", left, right)));
    }
    if let Some(handler) = metamethod(interp, left, LuaEvent::Concat)
        .or_else(|| metamethod(interp, right, LuaEvent::Concat))
    {
        return call_handler(interp, &handler, vec![left.clone(), right.clone()]);
    }
    let culprit = if concat_coercible(left) { right } else { left };
    Err(LuaError::type_error(
        "string or number",
        culprit.type_name(),
        "__concat",
    ))
}

/// `#`: byte length for strings, `__len` override or the array border for
/// tables
pub fn length(interp: &mut Interpreter, value: &LuaValue) -> LuaResult<LuaValue> {
    if let LuaValue::String(s) = value {
        return Ok(LuaValue::Number(s.len() as f64));
    }
    if let Some(handler) = metamethod(interp, value, LuaEvent::Len) {
        return call_handler(interp, &handler, vec![value.clone()]);
    }
    match value {
        LuaValue::Table(table) => Ok(LuaValue::Number(table.borrow().length())),
        other => Err(LuaError::type_error(
            "table or string",
            other.type_name(),
            "__len",
        )),
    }
}

/// `==`: primitive value/identity equality, then `__eq`, which fires only
/// when both operands are tables sharing the same handler
pub fn equals(interp: &mut Interpreter, left: &LuaValue, right: &LuaValue) -> LuaResult<bool> {
    if left == right {
        return Ok(true);
    }
    if let (LuaValue::Table(_), LuaValue::Table(_)) = (left, right) {
        let left_handler = metamethod(interp, left, LuaEvent::Eq);
        let right_handler = metamethod(interp, right, LuaEvent::Eq);
        if let (Some(handler), Some(other)) = (left_handler, right_handler) {
            if handler == other {
                let result = call_handler(interp, &handler, vec![left.clone(), right.clone()])?;
                return Ok(result.is_truthy());
            }
        }
    }
    Ok(false)
}

/// `<`: number order, string byte order, then `__lt`
pub fn less_than(interp: &mut Interpreter, left: &LuaValue, right: &LuaValue) -> LuaResult<bool> {
    match (left, right) {
        (LuaValue::Number(a), LuaValue::Number(b)) => Ok(a < b),
        (LuaValue::String(a), LuaValue::String(b)) => Ok(a < b),
        _ => {
            if let Some(handler) = metamethod(interp, left, LuaEvent::Lt)
                .or_else(|| metamethod(interp, right, LuaEvent::Lt))
            {
                let result = call_handler(interp, &handler, vec![left.clone(), right.clone()])?;
                return Ok(result.is_truthy());
            }
            Err(compare_error(left, right))
        }
    }
}

/// `<=`: number/string order, `__le`, or `not (right < left)` via `__lt`
pub fn less_or_equal(
    interp: &mut Interpreter,
    left: &LuaValue,
    right: &LuaValue,
) -> LuaResult<bool> {
    match (left, right) {
        (LuaValue::Number(a), LuaValue::Number(b)) => Ok(a <= b),
        (LuaValue::String(a), LuaValue::String(b)) => Ok(a <= b),
        _ => {
            if let Some(handler) = metamethod(interp, left, LuaEvent::Le)
                .or_else(|| metamethod(interp, right, LuaEvent::Le))
            {
                let result = call_handler(interp, &handler, vec![left.clone(), right.clone()])?;
                return Ok(result.is_truthy());
            }
            if let Some(handler) = metamethod(interp, left, LuaEvent::Lt)
                .or_else(|| metamethod(interp, right, LuaEvent::Lt))
            {
                let result = call_handler(interp, &handler, vec![right.clone(), left.clone()])?;
                return Ok(!result.is_truthy());
            }
            Err(compare_error(left, right))
        }
    }
}

fn compare_error(left: &LuaValue, right: &LuaValue) -> LuaError {
    LuaError::type_error(
        "two numbers or two strings",
        format!("{} and {}", left.type_name(), right.type_name()),
        "comparison",
    )
}

/// Indexed read `t[k]`: a present key reads directly, otherwise `__index`
/// is consulted; a function handler is called with `(t, k)`, a table
/// handler is re-indexed
pub fn index(interp: &mut Interpreter, subject: &LuaValue, key: &LuaValue) -> LuaResult<LuaValue> {
    let mut current = subject.clone();
    for _ in 0..MAX_META_CHAIN {
        if let LuaValue::Table(table) = &current {
            let found = table.borrow().get(key);
            if !found.is_nil() {
                return Ok(found);
            }
        }
        let handler = match metamethod(interp, &current, LuaEvent::Index) {
            Some(handler) => handler,
            None => {
                return match current {
                    LuaValue::Table(_) => Ok(LuaValue::Nil),
                    other => Err(LuaError::type_error(
                        "table",
                        other.type_name(),
                        "__index",
                    )),
                };
            }
        };
        if let LuaValue::Function(_) = handler {
            return call_handler(interp, &handler, vec![current, key.clone()]);
        }
        current = handler;
    }
    Err(LuaError::type_error(
        "a finite __index chain",
        "a cycle",
        "__index",
    ))
}

/// Indexed write `t[k] = v`: present keys overwrite directly, otherwise
/// `__newindex` intercepts; absent handlers insert raw
pub fn new_index(
    interp: &mut Interpreter,
    subject: &LuaValue,
    key: &LuaValue,
    value: LuaValue,
) -> LuaResult<()> {
    let mut current = subject.clone();
    for _ in 0..MAX_META_CHAIN {
        if let LuaValue::Table(table) = &current {
            let present = !table.borrow().get(key).is_nil();
            if present {
                return table.borrow_mut().set(key.clone(), value);
            }
        }
        let handler = match metamethod(interp, &current, LuaEvent::NewIndex) {
            Some(handler) => handler,
            None => {
                return match &current {
                    LuaValue::Table(table) => table.borrow_mut().set(key.clone(), value),
                    other => Err(LuaError::type_error(
                        "table",
                        other.type_name(),
                        "__newindex",
                    )),
                };
            }
        };
        if let LuaValue::Function(_) = handler {
            interp.call(
                &handler,
                LuaArguments::from_values(vec![current, key.clone(), value]),
            )?;
            return Ok(());
        }
        current = handler;
    }
    Err(LuaError::type_error(
        "a finite __newindex chain",
        "a cycle",
        "__newindex",
    ))
}
