//! The recursive statement and expression walker
//!
//! Statements execute for effect and report how the block should proceed
//! through a [`ControlFlow`] signal; expressions evaluate to value lists
//! that most positions truncate to their first element. Break is absorbed
//! by the innermost loop, Return by the innermost function call.

use crate::ast::{
    Assignable, BinaryOp, Block, Expression, FunctionBody, Statement, TableField, UnaryOp,
};
use crate::error_types::{LuaError, LuaResult};
use crate::events::{self, LuaEvent};
use crate::interpreter::Interpreter;
use crate::lua_value::{LuaArguments, LuaFunction, LuaTable, LuaValue};
use crate::scope::{Scope, SharedScope};
use std::rc::Rc;

/// Out-of-band marker carried alongside statement results to unwind loops
/// and function bodies
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    /// Normal execution continues
    Normal,
    /// Break out of the innermost loop
    Break,
    /// Return from the innermost function with values
    Return(LuaArguments),
}

impl Interpreter {
    /// Execute the statements of a block in order, forwarding the first
    /// non-normal signal. The caller decides which scope the block runs in
    pub(crate) fn exec_block(
        &mut self,
        block: &Block,
        scope: &SharedScope,
    ) -> LuaResult<ControlFlow> {
        for statement in &block.statements {
            match self.exec_statement(statement, scope)? {
                ControlFlow::Normal => continue,
                signal => return Ok(signal),
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn exec_statement(
        &mut self,
        statement: &Statement,
        scope: &SharedScope,
    ) -> LuaResult<ControlFlow> {
        match statement {
            Statement::Assignment { targets, values } => {
                self.exec_assignment(targets, values, scope)?;
                Ok(ControlFlow::Normal)
            }

            Statement::LocalAssignment { names, values } => {
                // The right-hand side is evaluated before any name is
                // bound, so `local x = x` reads the outer x
                let values = self.eval_list(values, scope)?;
                let mut frame = scope.borrow_mut();
                for (i, name) in names.iter().enumerate() {
                    frame.set_local(name.clone(), values.get(i));
                }
                Ok(ControlFlow::Normal)
            }

            Statement::FunctionCall(expression) => {
                self.eval_multi(expression, scope)?;
                Ok(ControlFlow::Normal)
            }

            Statement::Return(expressions) => {
                let values = self.eval_list(expressions, scope)?;
                Ok(ControlFlow::Return(values))
            }

            Statement::Break => Ok(ControlFlow::Break),

            Statement::Do(block) => {
                let inner = Scope::child(scope);
                self.exec_block(block, &inner)
            }

            Statement::If {
                condition,
                block,
                elseifs,
                else_block,
            } => self.exec_if(condition, block, elseifs, else_block.as_ref(), scope),

            Statement::While { condition, block } => self.exec_while(condition, block, scope),

            Statement::Repeat { block, condition } => self.exec_repeat(block, condition, scope),

            Statement::NumericFor {
                var,
                start,
                limit,
                step,
                block,
            } => self.exec_numeric_for(var, start, limit, step.as_ref(), block, scope),

            Statement::GenericFor { vars, exprs, block } => {
                self.exec_generic_for(vars, exprs, block, scope)
            }
        }
    }

    /// Multi-assignment: the whole right-hand side is evaluated first, then
    /// targets are written left to right with Nil past the end
    fn exec_assignment(
        &mut self,
        targets: &[Assignable],
        values: &[Expression],
        scope: &SharedScope,
    ) -> LuaResult<()> {
        let values = self.eval_list(values, scope)?;
        for (i, target) in targets.iter().enumerate() {
            let value = values.get(i);
            match target {
                Assignable::Variable { prefix: None, name } => {
                    scope.borrow_mut().set(name, value);
                }
                Assignable::Variable {
                    prefix: Some(prefix),
                    name,
                } => {
                    let subject = self.eval_single(prefix, scope)?;
                    let key = LuaValue::String(name.clone());
                    events::new_index(self, &subject, &key, value)?;
                }
                Assignable::TableAccess { expr, index } => {
                    let subject = self.eval_single(expr, scope)?;
                    let key = self.eval_single(index, scope)?;
                    events::new_index(self, &subject, &key, value)?;
                }
            }
        }
        Ok(())
    }

    fn exec_if(
        &mut self,
        condition: &Expression,
        block: &Block,
        elseifs: &[(Expression, Block)],
        else_block: Option<&Block>,
        scope: &SharedScope,
    ) -> LuaResult<ControlFlow> {
        if self.eval_single(condition, scope)?.is_truthy() {
            let inner = Scope::child(scope);
            return self.exec_block(block, &inner);
        }
        for (elseif_condition, elseif_block) in elseifs {
            if self.eval_single(elseif_condition, scope)?.is_truthy() {
                let inner = Scope::child(scope);
                return self.exec_block(elseif_block, &inner);
            }
        }
        if let Some(else_block) = else_block {
            let inner = Scope::child(scope);
            return self.exec_block(else_block, &inner);
        }
        Ok(ControlFlow::Normal)
    }

    fn exec_while(
        &mut self,
        condition: &Expression,
        block: &Block,
        scope: &SharedScope,
    ) -> LuaResult<ControlFlow> {
        while self.eval_single(condition, scope)?.is_truthy() {
            let inner = Scope::child(scope);
            match self.exec_block(block, &inner)? {
                ControlFlow::Normal => {}
                ControlFlow::Break => break,
                signal @ ControlFlow::Return(_) => return Ok(signal),
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn exec_repeat(
        &mut self,
        block: &Block,
        condition: &Expression,
        scope: &SharedScope,
    ) -> LuaResult<ControlFlow> {
        loop {
            let inner = Scope::child(scope);
            match self.exec_block(block, &inner)? {
                ControlFlow::Normal => {}
                ControlFlow::Break => return Ok(ControlFlow::Normal),
                signal @ ControlFlow::Return(_) => return Ok(signal),
            }
            // The condition sees locals declared in the body
            if self.eval_single(condition, &inner)?.is_truthy() {
                return Ok(ControlFlow::Normal);
            }
        }
    }

    fn exec_numeric_for(
        &mut self,
        var: &str,
        start: &Expression,
        limit: &Expression,
        step: Option<&Expression>,
        block: &Block,
        scope: &SharedScope,
    ) -> LuaResult<ControlFlow> {
        let start = self.eval_for_bound(start, "initial value", scope)?;
        let limit = self.eval_for_bound(limit, "limit", scope)?;
        let step = match step {
            Some(expression) => self.eval_for_bound(expression, "step", scope)?,
            None => 1.0,
        };

        let mut i = start;
        while (step > 0.0 && i <= limit) || (step <= 0.0 && i >= limit) {
            // A fresh frame per iteration: closures made in the body
            // capture this iteration's control variable
            let inner = Scope::child(scope);
            inner.borrow_mut().set_local(var, LuaValue::Number(i));
            match self.exec_block(block, &inner)? {
                ControlFlow::Normal => {}
                ControlFlow::Break => break,
                signal @ ControlFlow::Return(_) => return Ok(signal),
            }
            i += step;
        }
        Ok(ControlFlow::Normal)
    }

    fn eval_for_bound(
        &mut self,
        expression: &Expression,
        what: &str,
        scope: &SharedScope,
    ) -> LuaResult<f64> {
        let value = self.eval_single(expression, scope)?;
        value
            .as_number()
            .ok_or_else(|| LuaError::loop_bound(what, value.type_name()))
    }

    fn exec_generic_for(
        &mut self,
        vars: &[String],
        exprs: &[Expression],
        block: &Block,
        scope: &SharedScope,
    ) -> LuaResult<ControlFlow> {
        let iterator = self.eval_list(exprs, scope)?;
        let function = iterator.get(0);
        let state = iterator.get(1);
        let mut control = iterator.get(2);

        loop {
            let results = self.call(
                &function,
                LuaArguments::from_values(vec![state.clone(), control.clone()]),
            )?;
            // Test before binding: a Nil control value ends the loop
            // without touching the loop variables
            let first = results.first();
            if first.is_nil() {
                return Ok(ControlFlow::Normal);
            }
            control = first;

            let inner = Scope::child(scope);
            {
                let mut frame = inner.borrow_mut();
                for (i, var) in vars.iter().enumerate() {
                    frame.set_local(var.clone(), results.get(i));
                }
            }
            match self.exec_block(block, &inner)? {
                ControlFlow::Normal => {}
                ControlFlow::Break => return Ok(ControlFlow::Normal),
                signal @ ControlFlow::Return(_) => return Ok(signal),
            }
        }
    }

    /// Evaluate an expression to a single value (first element of its
    /// list, Nil when empty)
    pub(crate) fn eval_single(
        &mut self,
        expression: &Expression,
        scope: &SharedScope,
    ) -> LuaResult<LuaValue> {
        match expression {
            Expression::Nil => Ok(LuaValue::Nil),
            Expression::Boolean(b) => Ok(LuaValue::Boolean(*b)),
            Expression::Number(n) => Ok(LuaValue::Number(*n)),
            Expression::String(s) => Ok(LuaValue::String(s.clone())),
            Expression::Varargs => Ok(scope.borrow().varargs().first()),
            Expression::Variable { prefix: None, name } => Ok(scope.borrow().get(name)),
            Expression::Variable {
                prefix: Some(prefix),
                name,
            } => {
                let subject = self.eval_single(prefix, scope)?;
                events::index(self, &subject, &LuaValue::String(name.clone()))
            }
            Expression::TableAccess { expr, index } => {
                let subject = self.eval_single(expr, scope)?;
                let key = self.eval_single(index, scope)?;
                events::index(self, &subject, &key)
            }
            Expression::FunctionCall { .. } => Ok(self.eval_multi(expression, scope)?.first()),
            Expression::Binary { op, left, right } => self.eval_binary(*op, left, right, scope),
            Expression::Unary { op, expr } => self.eval_unary(*op, expr, scope),
            Expression::Function(body) => Ok(LuaValue::Function(Rc::new(LuaFunction::Closure {
                body: Rc::clone(body),
                scope: Rc::clone(scope),
            }))),
            Expression::TableConstructor { fields } => self.eval_table_constructor(fields, scope),
        }
    }

    /// Evaluate an expression keeping every value it produces; only calls
    /// and `...` yield more than one
    pub(crate) fn eval_multi(
        &mut self,
        expression: &Expression,
        scope: &SharedScope,
    ) -> LuaResult<LuaArguments> {
        match expression {
            Expression::FunctionCall { function, args } => {
                let callee = self.eval_single(function, scope)?;
                let args = self.eval_list(args, scope)?;
                self.call(&callee, args)
            }
            Expression::Varargs => Ok(scope.borrow().varargs()),
            other => Ok(LuaArguments::single(self.eval_single(other, scope)?)),
        }
    }

    /// The expansion rule for expression lists: every position but the
    /// last contributes one value; the final call or `...` spreads
    pub(crate) fn eval_list(
        &mut self,
        expressions: &[Expression],
        scope: &SharedScope,
    ) -> LuaResult<LuaArguments> {
        let mut out = LuaArguments::new();
        if let Some((last, init)) = expressions.split_last() {
            for expression in init {
                out.push(self.eval_single(expression, scope)?);
            }
            out.extend(self.eval_multi(last, scope)?);
        }
        Ok(out)
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        scope: &SharedScope,
    ) -> LuaResult<LuaValue> {
        // and/or short-circuit on the left value and never dispatch
        match op {
            BinaryOp::And => {
                let left = self.eval_single(left, scope)?;
                if !left.is_truthy() {
                    return Ok(left);
                }
                return self.eval_single(right, scope);
            }
            BinaryOp::Or => {
                let left = self.eval_single(left, scope)?;
                if left.is_truthy() {
                    return Ok(left);
                }
                return self.eval_single(right, scope);
            }
            _ => {}
        }

        let left = self.eval_single(left, scope)?;
        let right = self.eval_single(right, scope)?;
        match op {
            BinaryOp::Addition => events::arith(self, LuaEvent::Add, &left, &right),
            BinaryOp::Subtraction => events::arith(self, LuaEvent::Sub, &left, &right),
            BinaryOp::Multiplication => events::arith(self, LuaEvent::Mul, &left, &right),
            BinaryOp::Division => events::arith(self, LuaEvent::Div, &left, &right),
            BinaryOp::Modulo => events::arith(self, LuaEvent::Mod, &left, &right),
            BinaryOp::Power => events::arith(self, LuaEvent::Pow, &left, &right),
            BinaryOp::Concat => events::concat(self, &left, &right),
            BinaryOp::Equal => Ok(LuaValue::Boolean(events::equals(self, &left, &right)?)),
            BinaryOp::Different => Ok(LuaValue::Boolean(!events::equals(self, &left, &right)?)),
            BinaryOp::LessThan => Ok(LuaValue::Boolean(events::less_than(self, &left, &right)?)),
            BinaryOp::LessOrEqual => Ok(LuaValue::Boolean(events::less_or_equal(
                self, &left, &right,
            )?)),
            // a > b and a >= b evaluate as b < a and b <= a
            BinaryOp::GreaterThan => Ok(LuaValue::Boolean(events::less_than(self, &right, &left)?)),
            BinaryOp::GreaterOrEqual => Ok(LuaValue::Boolean(events::less_or_equal(
                self, &right, &left,
            )?)),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    fn eval_unary(
        &mut self,
        op: UnaryOp,
        expression: &Expression,
        scope: &SharedScope,
    ) -> LuaResult<LuaValue> {
        let value = self.eval_single(expression, scope)?;
        match op {
            UnaryOp::Negate => Ok(LuaValue::Boolean(!value.is_truthy())),
            UnaryOp::Invert => events::unary_minus(self, &value),
            UnaryOp::Length => events::length(self, &value),
        }
    }

    /// Build a table from constructor fields. Positional fields number from
    /// 1 in source order; a final positional call or `...` spreads across
    /// successive indices
    fn eval_table_constructor(
        &mut self,
        fields: &[TableField],
        scope: &SharedScope,
    ) -> LuaResult<LuaValue> {
        let table = LuaTable::new_shared();
        let mut array_index = 1.0;
        for (position, field) in fields.iter().enumerate() {
            match &field.key {
                Some(key_expression) => {
                    let key = self.eval_single(key_expression, scope)?;
                    let value = self.eval_single(&field.value, scope)?;
                    table.borrow_mut().set(key, value)?;
                }
                None if position + 1 == fields.len() => {
                    for value in self.eval_multi(&field.value, scope)? {
                        table
                            .borrow_mut()
                            .set(LuaValue::Number(array_index), value)?;
                        array_index += 1.0;
                    }
                }
                None => {
                    let value = self.eval_single(&field.value, scope)?;
                    table
                        .borrow_mut()
                        .set(LuaValue::Number(array_index), value)?;
                    array_index += 1.0;
                }
            }
        }
        Ok(LuaValue::Table(table))
    }

    /// Invoke a closure: bind parameters in a fresh function frame chained
    /// to the captured scope, stash extra arguments as varargs, and absorb
    /// the body's Return signal
    pub(crate) fn call_closure(
        &mut self,
        body: &Rc<FunctionBody>,
        captured: &SharedScope,
        args: LuaArguments,
    ) -> LuaResult<LuaArguments> {
        let extra = if body.is_vararg && args.len() > body.params.len() {
            args.skip(body.params.len())
        } else {
            LuaArguments::new()
        };
        let frame = Scope::function_scope(captured, extra);
        {
            let mut frame = frame.borrow_mut();
            for (i, param) in body.params.iter().enumerate() {
                frame.set_local(param.clone(), args.get(i));
            }
        }
        match self.exec_block(&body.block, &frame)? {
            ControlFlow::Return(values) => Ok(values),
            _ => Ok(LuaArguments::new()),
        }
    }
}
