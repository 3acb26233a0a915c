use crate::ast::FunctionBody;
use crate::error_types::{LuaError, LuaResult};
use crate::interpreter::Interpreter;
use crate::scope::SharedScope;
use ahash::AHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Largest f64 that still represents every smaller integer exactly (2^53);
/// integral numbers below it print through the integer path
const EXACT_INT_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Runtime value representation for Lua
#[derive(Clone)]
pub enum LuaValue {
    /// Nil/null value
    Nil,
    /// Boolean values
    Boolean(bool),
    /// Numeric values (Lua uses only f64)
    Number(f64),
    /// String values
    String(String),
    /// Table (shared, with optional metatable)
    Table(Rc<RefCell<LuaTable>>),
    /// Function (host callable or closure)
    Function(Rc<LuaFunction>),
}

/// A Lua table: a value-keyed map with an optional metatable link
pub struct LuaTable {
    data: AHashMap<LuaValue, LuaValue>,
    metatable: Option<Rc<RefCell<LuaTable>>>,
}

/// Signature shared by every host-provided function: receives the
/// interpreter (so it can re-enter the evaluator) and the argument list
pub type HostFunction = Rc<dyn Fn(&mut Interpreter, LuaArguments) -> LuaResult<LuaArguments>>;

/// A Lua function value
pub enum LuaFunction {
    /// Native callable provided by the host
    Host(HostFunction),
    /// AST body plus the scope captured where the function was defined
    Closure {
        body: Rc<FunctionBody>,
        scope: SharedScope,
    },
}

/// An ordered list of values used for call arguments, return sequences and
/// varargs; reads past the end yield Nil
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LuaArguments {
    values: Vec<LuaValue>,
}

impl LuaTable {
    pub fn new() -> Self {
        LuaTable {
            data: AHashMap::new(),
            metatable: None,
        }
    }

    pub fn new_shared() -> Rc<RefCell<LuaTable>> {
        Rc::new(RefCell::new(LuaTable::new()))
    }

    /// Raw read; absent keys read as Nil
    pub fn get(&self, key: &LuaValue) -> LuaValue {
        self.data.get(key).cloned().unwrap_or(LuaValue::Nil)
    }

    /// Raw write. Nil and NaN keys are rejected; writing Nil removes the
    /// key, so keys holding Nil are absent by definition
    pub fn set(&mut self, key: LuaValue, value: LuaValue) -> LuaResult<()> {
        match &key {
            LuaValue::Nil => return Err(LuaError::invalid_key("nil")),
            LuaValue::Number(n) if n.is_nan() => return Err(LuaError::invalid_key("NaN")),
            _ => {}
        }
        if matches!(value, LuaValue::Nil) {
            self.data.remove(&key);
        } else {
            self.data.insert(key, value);
        }
        Ok(())
    }

    pub fn metatable(&self) -> Option<Rc<RefCell<LuaTable>>> {
        self.metatable.clone()
    }

    pub fn set_metatable(&mut self, metatable: Option<Rc<RefCell<LuaTable>>>) {
        self.metatable = metatable;
    }

    /// The `#` border: the n such that `t[n]` is present and `t[n+1]` is
    /// not, counting up from 1
    pub fn length(&self) -> f64 {
        let mut n: u64 = 0;
        while self.data.contains_key(&LuaValue::Number((n + 1) as f64)) {
            n += 1;
        }
        n as f64
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LuaValue, &LuaValue)> {
        self.data.iter()
    }

    pub fn entry_count(&self) -> usize {
        self.data.len()
    }
}

impl Default for LuaTable {
    fn default() -> Self {
        Self::new()
    }
}

// Tables alias freely and may contain themselves; printing contents would
// recurse forever on a cycle
impl fmt::Debug for LuaTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<table: {} entries>", self.data.len())
    }
}

impl fmt::Debug for LuaFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LuaFunction::Host(_) => write!(f, "<host function>"),
            LuaFunction::Closure { body, .. } => {
                write!(f, "<closure: {} params>", body.params.len())
            }
        }
    }
}

impl fmt::Debug for LuaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LuaValue::Nil => write!(f, "nil"),
            LuaValue::Boolean(b) => write!(f, "{}", b),
            LuaValue::Number(n) => write_number(f, *n),
            LuaValue::String(s) => write!(f, "\"{}\"", s),
            LuaValue::Table(_) => write!(f, "<table>"),
            LuaValue::Function(_) => write!(f, "<function>"),
        }
    }
}

impl fmt::Display for LuaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LuaValue::Nil => write!(f, "nil"),
            LuaValue::Boolean(b) => write!(f, "{}", b),
            LuaValue::Number(n) => write_number(f, *n),
            LuaValue::String(s) => write!(f, "{}", s),
            LuaValue::Table(_) => write!(f, "table"),
            LuaValue::Function(_) => write!(f, "function"),
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < EXACT_INT_LIMIT {
        let mut buffer = itoa::Buffer::new();
        f.write_str(buffer.format(n as i64))
    } else {
        write!(f, "{}", n)
    }
}

impl PartialEq for LuaValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LuaValue::Nil, LuaValue::Nil) => true,
            (LuaValue::Boolean(a), LuaValue::Boolean(b)) => a == b,
            (LuaValue::Number(a), LuaValue::Number(b)) => a == b,
            (LuaValue::String(a), LuaValue::String(b)) => a == b,
            // Tables and functions compare by identity
            (LuaValue::Table(a), LuaValue::Table(b)) => Rc::ptr_eq(a, b),
            (LuaValue::Function(a), LuaValue::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for LuaValue {}

impl std::hash::Hash for LuaValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            LuaValue::Nil => 0.hash(state),
            LuaValue::Boolean(b) => {
                1.hash(state);
                b.hash(state);
            }
            LuaValue::Number(n) => {
                2.hash(state);
                // -0.0 == 0.0, so both must hash alike
                let normalized = if *n == 0.0 { 0.0 } else { *n };
                normalized.to_bits().hash(state);
            }
            LuaValue::String(s) => {
                3.hash(state);
                s.hash(state);
            }
            LuaValue::Table(t) => {
                4.hash(state);
                (Rc::as_ptr(t) as usize).hash(state);
            }
            LuaValue::Function(f) => {
                5.hash(state);
                (Rc::as_ptr(f) as *const () as usize).hash(state);
            }
        }
    }
}

impl LuaValue {
    /// Check if a value is truthy (false and nil are falsy, everything
    /// else is truthy)
    pub fn is_truthy(&self) -> bool {
        !matches!(self, LuaValue::Nil | LuaValue::Boolean(false))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, LuaValue::Nil)
    }

    /// Numeric coercion used in arithmetic contexts: numbers pass through,
    /// numeric strings parse, everything else refuses
    pub fn as_number(&self) -> Option<f64> {
        match self {
            LuaValue::Number(n) => Some(*n),
            LuaValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Get the type name of the value
    pub fn type_name(&self) -> &'static str {
        match self {
            LuaValue::Nil => "nil",
            LuaValue::Boolean(_) => "boolean",
            LuaValue::Number(_) => "number",
            LuaValue::String(_) => "string",
            LuaValue::Table(_) => "table",
            LuaValue::Function(_) => "function",
        }
    }

    /// Wrap a host callback as a function value
    pub fn host_function(function: HostFunction) -> LuaValue {
        LuaValue::Function(Rc::new(LuaFunction::Host(function)))
    }
}

impl LuaArguments {
    pub fn new() -> Self {
        LuaArguments { values: Vec::new() }
    }

    pub fn single(value: LuaValue) -> Self {
        LuaArguments {
            values: vec![value],
        }
    }

    pub fn from_values(values: Vec<LuaValue>) -> Self {
        LuaArguments { values }
    }

    /// Read by position; past-the-end reads yield Nil
    pub fn get(&self, index: usize) -> LuaValue {
        self.values.get(index).cloned().unwrap_or(LuaValue::Nil)
    }

    pub fn first(&self) -> LuaValue {
        self.get(0)
    }

    pub fn push(&mut self, value: LuaValue) {
        self.values.push(value);
    }

    pub fn extend(&mut self, other: LuaArguments) {
        self.values.extend(other.values);
    }

    /// The tail starting at `n`, as its own list
    pub fn skip(&self, n: usize) -> LuaArguments {
        LuaArguments {
            values: self.values.iter().skip(n).cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[LuaValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<LuaValue> {
        self.values
    }
}

impl From<Vec<LuaValue>> for LuaArguments {
    fn from(values: Vec<LuaValue>) -> Self {
        LuaArguments { values }
    }
}

impl FromIterator<LuaValue> for LuaArguments {
    fn from_iter<I: IntoIterator<Item = LuaValue>>(iter: I) -> Self {
        LuaArguments {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for LuaArguments {
    type Item = LuaValue;
    type IntoIter = std::vec::IntoIter<LuaValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
