pub mod ast;
pub mod error_types;
pub mod events;
pub mod executor;
pub mod interpreter;
pub mod lua_value;
pub mod scope;
pub mod stdlib;

// Re-export the types a host needs to embed the evaluator
pub use error_types::{LuaError, LuaResult};
pub use executor::ControlFlow;
pub use interpreter::Interpreter;
pub use lua_value::{HostFunction, LuaArguments, LuaFunction, LuaTable, LuaValue};
pub use scope::{Scope, SharedScope};
