//! Tree-walking execution engine.
//!
//! Executes the desugared AST directly against the symbol table. `return`
//! unwinds as a [`Flow`] value threaded through `execute`, caught at the
//! nearest call boundary.

#[cfg(test)]
mod tests;

use crate::error::LumenError;
use crate::lexer::token::{Token, TokenKind};
use crate::parser::ast::{Expr, FunctionDecl, Stmt};
use crate::runtime::builtins::NATIVES;
use crate::runtime::operations;
use crate::runtime::value::{unescape, Value};
use crate::source::Position;
use crate::symbols::SymbolTable;
use num_bigint::BigInt;
use std::io::Write;
use std::rc::Rc;

/// Result of executing a statement: fall through to the next one, or unwind
/// toward the active call with a return value.
#[derive(Debug, Clone, PartialEq)]
enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter<'out> {
    symbols: SymbolTable,
    calls: usize,
    out: &'out mut dyn Write,
}

impl<'out> Interpreter<'out> {
    pub fn new(out: &'out mut dyn Write) -> Self {
        let mut symbols = SymbolTable::new();
        for native in NATIVES {
            // Native names are unique, so the fresh table cannot collide.
            let _ = symbols.define(
                native.name,
                false,
                Value::Native(native),
                Position::default(),
            );
        }
        Self {
            symbols,
            calls: 0,
            out,
        }
    }

    /// Execute a whole program. The program body shares the global scope
    /// rather than opening a child.
    pub fn run(&mut self, program: &[Stmt]) -> Result<(), LumenError> {
        for stmt in program {
            self.execute(stmt)?;
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow, LumenError> {
        match stmt {
            Stmt::Compound(statements) => self.execute_block(statements, true),
            Stmt::Expr(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Var { name, value } => {
                let value = self.evaluate(value)?;
                self.symbols.define(&name.text, true, value, name.position)?;
                Ok(Flow::Normal)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate_condition(condition)? {
                    self.execute(then_branch)
                } else {
                    self.execute(else_branch)
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate_condition(condition)? {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        returned => return Ok(returned),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Function(decl) => {
                self.symbols.define(
                    &decl.name,
                    false,
                    Value::Function(Rc::clone(decl)),
                    decl.position,
                )?;
                Ok(Flow::Normal)
            }
            Stmt::Return { keyword, value } => {
                if self.calls == 0 {
                    return Err(LumenError::runtime_at(
                        "return outside of a function",
                        keyword.position,
                    ));
                }
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Void,
                };
                Ok(Flow::Return(value))
            }
            Stmt::For { counter, .. } => Err(LumenError::runtime_at(
                "for statement survived desugaring",
                counter.position,
            )),
        }
    }

    fn execute_block(&mut self, statements: &[Stmt], own_scope: bool) -> Result<Flow, LumenError> {
        if own_scope {
            self.symbols.push_scope();
        }
        let mut flow = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    flow = other;
                    break;
                }
            }
        }
        if own_scope {
            self.symbols.pop_scope();
        }
        flow
    }

    fn evaluate_condition(&mut self, condition: &Expr) -> Result<bool, LumenError> {
        match self.evaluate(condition)? {
            Value::Bool(b) => Ok(b),
            other => Err(LumenError::type_error("bool", other.kind()).at(condition.position())),
        }
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, LumenError> {
        match expr {
            Expr::Int(token) => parse_integer(token),
            Expr::Bool(token) => Ok(Value::Bool(token.kind == TokenKind::True)),
            Expr::Str(token) => Ok(Value::string(unescape(&token.text))),
            Expr::Var(token) => match self.symbols.lookup(&token.text) {
                Some(symbol) => Ok(symbol.value.clone()),
                None => Err(LumenError::symbol_not_found(&token.text, token.position)),
            },
            Expr::Unary { op, operand } => {
                let value = self.evaluate(operand)?;
                let result = match op.kind {
                    TokenKind::Plus => operations::identity(&value),
                    TokenKind::Minus => operations::negate(&value),
                    TokenKind::Bang => operations::not(&value),
                    _ => Err(LumenError::runtime(format!(
                        "unknown unary operator '{}'",
                        op.text
                    ))),
                };
                result.map_err(|error| error.at(op.position))
            }
            Expr::Binary { op, left, right } => self.evaluate_binary(op, left, right),
            Expr::Call { callee, args } => self.evaluate_call(callee, args),
        }
    }

    fn evaluate_binary(
        &mut self,
        op: &Token,
        left: &Expr,
        right: &Expr,
    ) -> Result<Value, LumenError> {
        match op.kind {
            TokenKind::Equal => self.evaluate_assignment(op, left, right),
            TokenKind::AndAnd => {
                if !self.evaluate_condition(left)? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.evaluate_condition(right)?))
            }
            TokenKind::OrOr => {
                if self.evaluate_condition(left)? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.evaluate_condition(right)?))
            }
            _ => {
                let lhs = self.evaluate(left)?;
                let rhs = self.evaluate(right)?;
                let result = match op.kind {
                    TokenKind::Plus => operations::add(&lhs, &rhs),
                    TokenKind::Minus => operations::sub(&lhs, &rhs),
                    TokenKind::Star => operations::mul(&lhs, &rhs),
                    TokenKind::Slash => operations::div(&lhs, &rhs),
                    TokenKind::Percent => operations::modulo(&lhs, &rhs),
                    TokenKind::Less => operations::less(&lhs, &rhs),
                    TokenKind::LessEqual => operations::less_equal(&lhs, &rhs),
                    TokenKind::Greater => operations::greater(&lhs, &rhs),
                    TokenKind::GreaterEqual => operations::greater_equal(&lhs, &rhs),
                    TokenKind::EqualEqual => operations::eq(&lhs, &rhs),
                    TokenKind::NotEqual => operations::not_eq(&lhs, &rhs),
                    _ => Err(LumenError::runtime(format!(
                        "unknown operator '{}'",
                        op.text
                    ))),
                };
                result.map_err(|error| error.at(op.position))
            }
        }
    }

    /// `=` requires a plain variable on the left. The assignment produces the
    /// assigned value, so chains like `a = b = c` work.
    fn evaluate_assignment(
        &mut self,
        op: &Token,
        target: &Expr,
        value: &Expr,
    ) -> Result<Value, LumenError> {
        let Expr::Var(name) = target else {
            return Err(LumenError::runtime_at("bad assignment target", op.position));
        };
        match self.symbols.lookup(&name.text) {
            None => {
                return Err(LumenError::symbol_not_found(&name.text, name.position));
            }
            Some(symbol) if !symbol.mutable => {
                return Err(LumenError::runtime_at(
                    format!("can't assign to constant '{}'", name.text),
                    name.position,
                ));
            }
            Some(_) => {}
        }
        let value = self.evaluate(value)?;
        self.symbols.assign(&name.text, value.clone(), name.position)?;
        Ok(value)
    }

    fn evaluate_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<Value, LumenError> {
        let function = self.evaluate(callee)?;
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.evaluate(arg)?);
        }
        match function {
            Value::Function(decl) => self.call_function(&decl, values, callee.position()),
            Value::Native(native) => (native.call)(self.out, &values),
            other => Err(LumenError::runtime_at(
                format!("{} is not callable", other.kind()),
                callee.position(),
            )),
        }
    }

    fn call_function(
        &mut self,
        decl: &FunctionDecl,
        args: Vec<Value>,
        at: Position,
    ) -> Result<Value, LumenError> {
        if args.len() != decl.params.len() {
            return Err(LumenError::runtime_at(
                format!(
                    "'{}' expects {} arguments, got {}",
                    decl.name,
                    decl.params.len(),
                    args.len()
                ),
                at,
            ));
        }

        // Call scopes are children of the global scope: a function sees the
        // globals and its own parameters, never the caller's locals.
        let frame = self.symbols.enter_call();
        self.calls += 1;
        let result = self.run_function_body(decl, args);
        self.calls -= 1;
        self.symbols.exit_call(frame);
        result
    }

    fn run_function_body(
        &mut self,
        decl: &FunctionDecl,
        args: Vec<Value>,
    ) -> Result<Value, LumenError> {
        for (param, value) in decl.params.iter().zip(args) {
            self.symbols.define(param, true, value, decl.position)?;
        }
        let flow = match &decl.body {
            // The body block shares the call scope instead of opening its own.
            Stmt::Compound(statements) => self.execute_block(statements, false)?,
            other => self.execute(other)?,
        };
        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal => Value::Void,
        })
    }
}

fn parse_integer(token: &Token) -> Result<Value, LumenError> {
    token
        .text
        .parse::<BigInt>()
        .map(Value::Int)
        .map_err(|_| {
            LumenError::runtime_at(
                format!("invalid integer literal '{}'", token.text),
                token.position,
            )
        })
}
