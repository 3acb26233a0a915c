use crate::ast::Block;
use crate::error_types::{LuaError, LuaResult};
use crate::events::{self, LuaEvent};
use crate::executor::ControlFlow;
use crate::lua_value::{HostFunction, LuaArguments, LuaFunction, LuaTable, LuaValue};
use crate::scope::{Scope, SharedScope};
use crate::stdlib;
use std::cell::RefCell;
use std::rc::Rc;

/// Matches the C-call ceiling of the reference VM; each Lua-level call
/// nests several native frames, so the walker must stop well before the
/// native stack does
const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// The interpreter: root scope, per-type metatables and call accounting.
///
/// Hosts construct one, bind values into the root scope, and hand it AST
/// blocks to execute. All evaluation happens on the calling thread; a call
/// into the evaluator blocks until the script completes or errors.
pub struct Interpreter {
    root: SharedScope,
    string_metatable: Option<Rc<RefCell<LuaTable>>>,
    call_depth: usize,
    max_call_depth: usize,
}

impl Interpreter {
    /// Create an interpreter with the base library installed
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_CALL_DEPTH)
    }

    /// Create an interpreter with a custom call recursion limit
    pub fn with_max_depth(max_call_depth: usize) -> Self {
        let interpreter = Interpreter {
            root: Scope::root(),
            string_metatable: None,
            call_depth: 0,
            max_call_depth,
        };
        stdlib::install(&interpreter);
        interpreter
    }

    /// The global frame; bindings made here are visible to every chunk
    pub fn root_scope(&self) -> SharedScope {
        Rc::clone(&self.root)
    }

    /// Bind a value into the root scope
    pub fn bind(&self, name: &str, value: LuaValue) {
        self.root.borrow_mut().set_local(name, value);
    }

    /// Bind a host callable into the root scope
    pub fn bind_function(&self, name: &str, function: HostFunction) {
        self.bind(name, LuaValue::host_function(function));
    }

    /// The metatable consulted when indexing string values
    pub fn string_metatable(&self) -> Option<Rc<RefCell<LuaTable>>> {
        self.string_metatable.clone()
    }

    pub fn set_string_metatable(&mut self, metatable: Option<Rc<RefCell<LuaTable>>>) {
        self.string_metatable = metatable;
    }

    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    /// Execute a chunk in a fresh scope chained to the root. Top-level
    /// locals die with the chunk; globals persist across calls
    pub fn execute(&mut self, block: &Block) -> LuaResult<LuaArguments> {
        let scope = Scope::child(&self.root);
        self.execute_in_scope(block, &scope)
    }

    /// Execute a block in a caller-provided scope, absorbing a Return
    /// signal into the result list
    pub fn execute_in_scope(
        &mut self,
        block: &Block,
        scope: &SharedScope,
    ) -> LuaResult<LuaArguments> {
        match self.exec_block(block, scope)? {
            ControlFlow::Return(values) => Ok(values),
            _ => Ok(LuaArguments::new()),
        }
    }

    /// Invoke a callable value. Non-functions are redirected through their
    /// `__call` handler with the callee prepended to the arguments
    pub fn call(&mut self, callee: &LuaValue, args: LuaArguments) -> LuaResult<LuaArguments> {
        if self.call_depth >= self.max_call_depth {
            return Err(LuaError::stack_overflow(self.max_call_depth));
        }
        self.call_depth += 1;
        let result = self.dispatch_call(callee, args);
        self.call_depth -= 1;
        result
    }

    fn dispatch_call(&mut self, callee: &LuaValue, args: LuaArguments) -> LuaResult<LuaArguments> {
        match callee {
            LuaValue::Function(function) => match function.as_ref() {
                LuaFunction::Host(host) => {
                    let host = Rc::clone(host);
                    host(self, args)
                }
                LuaFunction::Closure { body, scope } => {
                    let body = Rc::clone(body);
                    let captured = Rc::clone(scope);
                    self.call_closure(&body, &captured, args)
                }
            },
            other => match events::metamethod(self, other, LuaEvent::Call) {
                Some(handler) => {
                    let mut full = LuaArguments::single(other.clone());
                    full.extend(args);
                    // Re-enter through call() so a handler chain of
                    // callable tables stays depth-bounded
                    self.call(&handler, full)
                }
                None => Err(LuaError::call(other.type_name())),
            },
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
