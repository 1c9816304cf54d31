//! The bytecode compiler.
//!
//! Walks the desugared AST and emits [`Op`]s. Forward jump targets are
//! emitted as placeholders and back-patched once their address is known; the
//! globals allocation in the prologue is patched the same way with the final
//! symbol count.

use super::bytecode::{Bytecode, Op};
use crate::error::LumenError;
use crate::lexer::token::{Token, TokenKind};
use crate::parser::ast::{Expr, FunctionDecl, Stmt};
use crate::runtime::builtins::NATIVES;
use crate::runtime::value::{unescape, Value};
use crate::source::Position;
use crate::symbols::SymbolTable;
use log::debug;
use num_bigint::BigInt;

/// Compile a desugared program to bytecode.
pub fn compile(program: &[Stmt]) -> Result<Bytecode, LumenError> {
    Compiler::new().compile_program(program)
}

struct Compiler {
    code: Vec<Op>,
    constants: Vec<Value>,
    symbols: SymbolTable,
}

impl Compiler {
    fn new() -> Self {
        Self {
            code: Vec::new(),
            constants: Vec::new(),
            symbols: SymbolTable::new(),
        }
    }

    fn compile_program(mut self, program: &[Stmt]) -> Result<Bytecode, LumenError> {
        // Prologue: the globals allocation is patched once the final symbol
        // count is known, after the whole program has been compiled.
        let galloc = self.emit(Op::GlobalAlloc(0));
        for native in NATIVES {
            let register = self
                .symbols
                .define_register(native.name, false, Position::default())?;
            let constant = self.add_constant(Value::Native(native));
            self.emit(Op::PushNative(constant));
            self.emit(Op::GlobalStore(register));
        }

        // The program body defines its symbols directly in the global scope.
        self.compile_block(program, false)?;
        self.emit(Op::Return);
        self.patch(galloc, Op::GlobalAlloc(self.symbols.symbol_count()));

        debug!(
            "compiled {} instructions, {} constants",
            self.code.len(),
            self.constants.len()
        );
        Ok(Bytecode {
            code: self.code,
            constants: self.constants,
        })
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), LumenError> {
        match stmt {
            Stmt::Compound(statements) => self.compile_block(statements, true),
            Stmt::Expr(expr) => {
                self.compile_expr(expr)?;
                self.emit(Op::Pop);
                Ok(())
            }
            Stmt::Var { name, value } => {
                self.compile_expr(value)?;
                let register = self.symbols.define_register(&name.text, true, name.position)?;
                self.emit_store(register, !self.symbols.in_call());
                Ok(())
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.compile_expr(condition)?;
                let to_then = self.emit(Op::JumpIf(0));
                let to_else = self.emit(Op::Jump(0));
                let then_address = self.here();
                self.compile_stmt(then_branch)?;
                let to_end = self.emit(Op::Jump(0));
                let else_address = self.here();
                self.compile_stmt(else_branch)?;
                let end_address = self.here();
                self.patch(to_then, Op::JumpIf(then_address));
                self.patch(to_else, Op::Jump(else_address));
                self.patch(to_end, Op::Jump(end_address));
                Ok(())
            }
            Stmt::While { condition, body } => {
                // Condition sits after the body so each iteration costs a
                // single conditional branch.
                let to_condition = self.emit(Op::Jump(0));
                let body_address = self.here();
                self.compile_stmt(body)?;
                let condition_address = self.here();
                self.patch(to_condition, Op::Jump(condition_address));
                self.compile_expr(condition)?;
                self.emit(Op::JumpIf(body_address));
                Ok(())
            }
            Stmt::Function(decl) => self.compile_function(decl),
            Stmt::Return { keyword, value } => {
                if !self.symbols.in_call() {
                    return Err(LumenError::runtime_at(
                        "return outside of a function",
                        keyword.position,
                    ));
                }
                if let Some(expr) = value {
                    self.compile_expr(expr)?;
                }
                self.emit(Op::Return);
                Ok(())
            }
            Stmt::For { counter, .. } => Err(LumenError::runtime_at(
                "for statement survived desugaring",
                counter.position,
            )),
        }
    }

    fn compile_function(&mut self, decl: &FunctionDecl) -> Result<(), LumenError> {
        // The function's name is a symbol of the enclosing scope.
        let register = self
            .symbols
            .define_register(&decl.name, false, decl.position)?;
        let global = !self.symbols.in_call();

        let frame = self.symbols.enter_call();
        let to_after = self.emit(Op::Jump(0));
        let entry = self.here();
        let alloc = self.emit(Op::Alloc(0));
        // Arguments arrive in push order, so they pop in reverse.
        for param in decl.params.iter().rev() {
            let param_register = self.symbols.define_register(param, true, decl.position)?;
            self.emit(Op::Store(param_register));
        }
        match &decl.body {
            // The body block shares the callee's scope.
            Stmt::Compound(statements) => self.compile_block(statements, false)?,
            other => self.compile_stmt(other)?,
        }
        // Falling off the end returns void.
        self.emit(Op::Return);
        let after = self.here();
        self.patch(to_after, Op::Jump(after));
        self.patch(alloc, Op::Alloc(self.symbols.symbol_count()));
        self.symbols.exit_call(frame);

        self.emit(Op::PushFn {
            entry,
            arity: decl.params.len(),
        });
        self.emit_store(register, global);
        Ok(())
    }

    fn compile_block(&mut self, statements: &[Stmt], own_scope: bool) -> Result<(), LumenError> {
        if own_scope {
            self.symbols.push_scope();
        }
        for stmt in statements {
            self.compile_stmt(stmt)?;
        }
        if own_scope {
            self.symbols.pop_scope();
        }
        Ok(())
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<(), LumenError> {
        match expr {
            Expr::Int(token) => {
                let n: BigInt = token.text.parse().map_err(|_| {
                    LumenError::runtime_at(
                        format!("invalid integer literal '{}'", token.text),
                        token.position,
                    )
                })?;
                self.emit(Op::PushInt(n));
                Ok(())
            }
            Expr::Bool(token) => {
                self.emit(Op::PushBool(token.kind == TokenKind::True));
                Ok(())
            }
            Expr::Str(token) => {
                let constant = self.add_constant(Value::string(unescape(&token.text)));
                self.emit(Op::PushStr(constant));
                Ok(())
            }
            Expr::Var(token) => {
                let (register, global) = self.resolve(token)?;
                self.emit_load(register, global);
                Ok(())
            }
            Expr::Unary { op, operand } => {
                self.compile_expr(operand)?;
                match op.kind {
                    // Unary `+` is a no-op on the stack.
                    TokenKind::Plus => {}
                    TokenKind::Minus => {
                        self.emit(Op::Neg);
                    }
                    TokenKind::Bang => {
                        self.emit(Op::Not);
                    }
                    _ => {
                        return Err(LumenError::runtime_at(
                            format!("unknown unary operator '{}'", op.text),
                            op.position,
                        ))
                    }
                }
                Ok(())
            }
            Expr::Binary { op, left, right } => self.compile_binary(op, left, right),
            Expr::Call { callee, args } => {
                self.compile_expr(callee)?;
                for arg in args {
                    self.compile_expr(arg)?;
                }
                self.emit(Op::Call(args.len()));
                Ok(())
            }
        }
    }

    fn compile_binary(&mut self, op: &Token, left: &Expr, right: &Expr) -> Result<(), LumenError> {
        match op.kind {
            TokenKind::Equal => {
                let Expr::Var(name) = left else {
                    return Err(LumenError::runtime_at("bad assignment target", op.position));
                };
                self.compile_expr(right)?;
                let (register, global) = self.resolve_assignable(name)?;
                // Store, then load again so the value stays on the stack as
                // the expression's result.
                self.emit_store(register, global);
                self.emit_load(register, global);
                Ok(())
            }
            TokenKind::AndAnd => {
                // Skip the right operand entirely when the left is false.
                self.compile_expr(left)?;
                let to_right = self.emit(Op::JumpIf(0));
                self.emit(Op::PushBool(false));
                let to_end = self.emit(Op::Jump(0));
                let right_address = self.here();
                self.compile_expr(right)?;
                // A double `not` keeps the value but rejects non-bools.
                self.emit(Op::Not);
                self.emit(Op::Not);
                let end_address = self.here();
                self.patch(to_right, Op::JumpIf(right_address));
                self.patch(to_end, Op::Jump(end_address));
                Ok(())
            }
            TokenKind::OrOr => {
                self.compile_expr(left)?;
                let to_true = self.emit(Op::JumpIf(0));
                self.compile_expr(right)?;
                self.emit(Op::Not);
                self.emit(Op::Not);
                let to_end = self.emit(Op::Jump(0));
                let true_address = self.here();
                self.emit(Op::PushBool(true));
                let end_address = self.here();
                self.patch(to_true, Op::JumpIf(true_address));
                self.patch(to_end, Op::Jump(end_address));
                Ok(())
            }
            _ => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                match op.kind {
                    TokenKind::Plus => {
                        self.emit(Op::Add);
                    }
                    TokenKind::Minus => {
                        self.emit(Op::Sub);
                    }
                    TokenKind::Star => {
                        self.emit(Op::Mul);
                    }
                    TokenKind::Slash => {
                        self.emit(Op::Div);
                    }
                    TokenKind::Percent => {
                        self.emit(Op::Mod);
                    }
                    TokenKind::Less => {
                        self.emit(Op::Less);
                    }
                    TokenKind::Greater => {
                        self.emit(Op::Greater);
                    }
                    TokenKind::EqualEqual => {
                        self.emit(Op::Eq);
                    }
                    // The remaining comparisons are complements.
                    TokenKind::LessEqual => {
                        self.emit(Op::Greater);
                        self.emit(Op::Not);
                    }
                    TokenKind::GreaterEqual => {
                        self.emit(Op::Less);
                        self.emit(Op::Not);
                    }
                    TokenKind::NotEqual => {
                        self.emit(Op::Eq);
                        self.emit(Op::Not);
                    }
                    _ => {
                        return Err(LumenError::runtime_at(
                            format!("unknown operator '{}'", op.text),
                            op.position,
                        ))
                    }
                }
                Ok(())
            }
        }
    }

    fn resolve(&self, token: &Token) -> Result<(usize, bool), LumenError> {
        let Some(symbol) = self.symbols.lookup(&token.text) else {
            return Err(LumenError::symbol_not_found(&token.text, token.position));
        };
        match symbol.register {
            Some(register) => Ok((register, symbol.global)),
            None => Err(LumenError::runtime_at(
                format!("symbol '{}' has no register", token.text),
                token.position,
            )),
        }
    }

    fn resolve_assignable(&self, token: &Token) -> Result<(usize, bool), LumenError> {
        let Some(symbol) = self.symbols.lookup(&token.text) else {
            return Err(LumenError::symbol_not_found(&token.text, token.position));
        };
        if !symbol.mutable {
            return Err(LumenError::runtime_at(
                format!("can't assign to constant '{}'", token.text),
                token.position,
            ));
        }
        self.resolve(token)
    }

    fn emit(&mut self, op: Op) -> usize {
        let address = self.code.len();
        self.code.push(op);
        address
    }

    fn emit_store(&mut self, register: usize, global: bool) {
        if global {
            self.emit(Op::GlobalStore(register));
        } else {
            self.emit(Op::Store(register));
        }
    }

    fn emit_load(&mut self, register: usize, global: bool) {
        if global {
            self.emit(Op::GlobalLoad(register));
        } else {
            self.emit(Op::Load(register));
        }
    }

    fn here(&self) -> usize {
        self.code.len()
    }

    fn patch(&mut self, address: usize, op: Op) {
        self.code[address] = op;
    }

    fn add_constant(&mut self, value: Value) -> usize {
        let index = self.constants.len();
        self.constants.push(value);
        index
    }
}
