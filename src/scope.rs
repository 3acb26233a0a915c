//! Lexical environment frames
//!
//! A scope is a heap object holding local bindings and a parent pointer.
//! Closures capture scope references, so a frame outlives its textual
//! region whenever a closure created inside it survives; shared ownership
//! keeps captured parent chains alive.

use crate::lua_value::{LuaArguments, LuaValue};
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::Rc;

pub type SharedScope = Rc<RefCell<Scope>>;

pub struct Scope {
    vars: AHashMap<String, LuaValue>,
    parent: Option<SharedScope>,
    /// Extra arguments of the enclosing closure invocation; None on plain
    /// block scopes, which read through to the nearest function frame
    varargs: Option<LuaArguments>,
}

impl Scope {
    /// Create a root scope (the global frame)
    pub fn root() -> SharedScope {
        Rc::new(RefCell::new(Scope {
            vars: AHashMap::new(),
            parent: None,
            varargs: Some(LuaArguments::new()),
        }))
    }

    /// Create a block scope chained to `parent`
    pub fn child(parent: &SharedScope) -> SharedScope {
        Rc::new(RefCell::new(Scope {
            vars: AHashMap::new(),
            parent: Some(Rc::clone(parent)),
            varargs: None,
        }))
    }

    /// Create a closure-invocation scope with its own varargs slot
    pub fn function_scope(parent: &SharedScope, varargs: LuaArguments) -> SharedScope {
        Rc::new(RefCell::new(Scope {
            vars: AHashMap::new(),
            parent: Some(Rc::clone(parent)),
            varargs: Some(varargs),
        }))
    }

    /// Look up a name, walking parent pointers; unbound names read as Nil
    pub fn get(&self, name: &str) -> LuaValue {
        if let Some(value) = self.vars.get(name) {
            return value.clone();
        }
        match &self.parent {
            Some(parent) => parent.borrow().get(name),
            None => LuaValue::Nil,
        }
    }

    /// Bind or rebind a name in this scope only
    pub fn set_local(&mut self, name: impl Into<String>, value: LuaValue) {
        self.vars.insert(name.into(), value);
    }

    /// Bind a name at the root scope
    pub fn set_global(&mut self, name: &str, value: LuaValue) {
        match &self.parent {
            Some(parent) => parent.borrow_mut().set_global(name, value),
            None => {
                self.vars.insert(name.to_string(), value);
            }
        }
    }

    /// Bare assignment: rebind the nearest enclosing declaration, creating
    /// a global at the root when the name is unbound everywhere
    pub fn set(&mut self, name: &str, value: LuaValue) {
        if self.vars.contains_key(name) {
            self.vars.insert(name.to_string(), value);
            return;
        }
        match &self.parent {
            Some(parent) => parent.borrow_mut().set(name, value),
            None => {
                self.vars.insert(name.to_string(), value);
            }
        }
    }

    /// True when this scope itself binds `name` (parents not consulted)
    pub fn is_bound_here(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// The varargs visible here: this frame's own slot, or the nearest
    /// enclosing function frame's
    pub fn varargs(&self) -> LuaArguments {
        if let Some(varargs) = &self.varargs {
            return varargs.clone();
        }
        match &self.parent {
            Some(parent) => parent.borrow().varargs(),
            None => LuaArguments::new(),
        }
    }
}
