//! Shared AST-building helpers for the integration tests
//!
//! Programs reach the evaluator as trees, so the tests assemble them with
//! these shorthands instead of spelling out every node.
#![allow(dead_code)]

use luawalk::ast::*;
use luawalk::{Interpreter, LuaArguments, LuaResult, LuaValue};
use std::rc::Rc;

pub fn num(n: f64) -> Expression {
    Expression::Number(n)
}

pub fn text(s: &str) -> Expression {
    Expression::String(s.to_string())
}

pub fn boolean(b: bool) -> Expression {
    Expression::Boolean(b)
}

pub fn nil() -> Expression {
    Expression::Nil
}

pub fn varargs() -> Expression {
    Expression::Varargs
}

/// A bare variable reference
pub fn name(name: &str) -> Expression {
    Expression::Variable {
        prefix: None,
        name: name.to_string(),
    }
}

/// A `prefix.name` field read
pub fn prop(prefix: Expression, name: &str) -> Expression {
    Expression::Variable {
        prefix: Some(Box::new(prefix)),
        name: name.to_string(),
    }
}

/// An `expr[index]` read
pub fn idx(expr: Expression, index: Expression) -> Expression {
    Expression::TableAccess {
        expr: Box::new(expr),
        index: Box::new(index),
    }
}

pub fn call(function: Expression, args: Vec<Expression>) -> Expression {
    Expression::FunctionCall {
        function: Box::new(function),
        args,
    }
}

/// Call a global by name
pub fn call_name(function: &str, args: Vec<Expression>) -> Expression {
    call(name(function), args)
}

pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Expression {
    Expression::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn add(left: Expression, right: Expression) -> Expression {
    binary(BinaryOp::Addition, left, right)
}

pub fn unary(op: UnaryOp, expr: Expression) -> Expression {
    Expression::Unary {
        op,
        expr: Box::new(expr),
    }
}

pub fn function(params: &[&str], block: Block) -> Expression {
    Expression::Function(Rc::new(FunctionBody {
        params: params.iter().map(|p| p.to_string()).collect(),
        is_vararg: false,
        block,
    }))
}

pub fn vararg_function(params: &[&str], block: Block) -> Expression {
    Expression::Function(Rc::new(FunctionBody {
        params: params.iter().map(|p| p.to_string()).collect(),
        is_vararg: true,
        block,
    }))
}

pub fn table(fields: Vec<TableField>) -> Expression {
    Expression::TableConstructor { fields }
}

pub fn block(statements: Vec<Statement>) -> Block {
    Block::new(statements)
}

pub fn local(names: &[&str], values: Vec<Expression>) -> Statement {
    Statement::LocalAssignment {
        names: names.iter().map(|n| n.to_string()).collect(),
        values,
    }
}

/// Bare-name assignment
pub fn assign(target: &str, value: Expression) -> Statement {
    Statement::Assignment {
        targets: vec![Assignable::Variable {
            prefix: None,
            name: target.to_string(),
        }],
        values: vec![value],
    }
}

pub fn assign_many(targets: &[&str], values: Vec<Expression>) -> Statement {
    Statement::Assignment {
        targets: targets
            .iter()
            .map(|t| Assignable::Variable {
                prefix: None,
                name: t.to_string(),
            })
            .collect(),
        values,
    }
}

/// `expr[index] = value`
pub fn assign_index(expr: Expression, index: Expression, value: Expression) -> Statement {
    Statement::Assignment {
        targets: vec![Assignable::TableAccess {
            expr: Box::new(expr),
            index: Box::new(index),
        }],
        values: vec![value],
    }
}

pub fn call_stmt(expression: Expression) -> Statement {
    Statement::FunctionCall(expression)
}

pub fn ret(values: Vec<Expression>) -> Statement {
    Statement::Return(values)
}

/// Execute a chunk on a fresh interpreter
pub fn run(chunk: Block) -> LuaResult<LuaArguments> {
    Interpreter::new().execute(&chunk)
}

/// Execute a chunk and unwrap its return values
pub fn run_ok(chunk: Block) -> LuaArguments {
    run(chunk).expect("chunk failed")
}

pub fn n(value: f64) -> LuaValue {
    LuaValue::Number(value)
}

pub fn sv(value: &str) -> LuaValue {
    LuaValue::String(value.to_string())
}
