//! AST-to-AST rewriting.
//!
//! Two surface conveniences are eliminated before execution: compound
//! assignments (`x += y` becomes `x = x + y`) and `for` loops, which expand
//! into the core block/if/while forms. After this pass no `Stmt::For` node
//! and no compound-assignment operator remains.


use crate::lexer::token::{Token, TokenKind};
use crate::parser::ast::{Expr, FunctionDecl, Stmt};
use std::rc::Rc;

pub fn desugar(program: Vec<Stmt>) -> Vec<Stmt> {
    program.into_iter().map(desugar_stmt).collect()
}

fn desugar_stmt(stmt: Stmt) -> Stmt {
    match stmt {
        Stmt::Compound(statements) => {
            Stmt::Compound(statements.into_iter().map(desugar_stmt).collect())
        }
        Stmt::Expr(expr) => Stmt::Expr(desugar_expr(expr)),
        Stmt::Var { name, value } => Stmt::Var {
            name,
            value: desugar_expr(value),
        },
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => Stmt::If {
            condition: desugar_expr(condition),
            then_branch: Box::new(desugar_stmt(*then_branch)),
            else_branch: Box::new(desugar_stmt(*else_branch)),
        },
        Stmt::While { condition, body } => Stmt::While {
            condition: desugar_expr(condition),
            body: Box::new(desugar_stmt(*body)),
        },
        Stmt::Function(decl) => {
            let decl = Rc::try_unwrap(decl).unwrap_or_else(|shared| (*shared).clone());
            Stmt::Function(Rc::new(FunctionDecl {
                name: decl.name,
                params: decl.params,
                body: desugar_stmt(decl.body),
                position: decl.position,
            }))
        }
        Stmt::Return { keyword, value } => Stmt::Return {
            keyword,
            value: value.map(desugar_expr),
        },
        Stmt::For {
            counter,
            from,
            to,
            body,
        } => desugar_for(counter, from, to, *body),
    }
}

fn desugar_expr(expr: Expr) -> Expr {
    match expr {
        Expr::Int(_) | Expr::Bool(_) | Expr::Str(_) | Expr::Var(_) => expr,
        Expr::Unary { op, operand } => Expr::Unary {
            op,
            operand: Box::new(desugar_expr(*operand)),
        },
        Expr::Binary { op, left, right } => match split_compound(op.kind) {
            Some((kind, text)) => {
                // `x ⊛= y` rewrites to `x = x ⊛ y`. The left operand is
                // duplicated syntactically, which is safe because the engines
                // only accept plain variables as assignment targets.
                let left = desugar_expr(*left);
                let right = desugar_expr(*right);
                let operation = Expr::Binary {
                    op: Token::new(kind, text, op.position),
                    left: Box::new(left.clone()),
                    right: Box::new(right),
                };
                Expr::Binary {
                    op: Token::new(TokenKind::Equal, "=", op.position),
                    left: Box::new(left),
                    right: Box::new(operation),
                }
            }
            None => Expr::Binary {
                op,
                left: Box::new(desugar_expr(*left)),
                right: Box::new(desugar_expr(*right)),
            },
        },
        Expr::Call { callee, args } => Expr::Call {
            callee: Box::new(desugar_expr(*callee)),
            args: args.into_iter().map(desugar_expr).collect(),
        },
    }
}

fn split_compound(kind: TokenKind) -> Option<(TokenKind, &'static str)> {
    match kind {
        TokenKind::PlusEqual => Some((TokenKind::Plus, "+")),
        TokenKind::MinusEqual => Some((TokenKind::Minus, "-")),
        TokenKind::StarEqual => Some((TokenKind::Star, "*")),
        TokenKind::SlashEqual => Some((TokenKind::Slash, "/")),
        TokenKind::PercentEqual => Some((TokenKind::Percent, "%")),
        _ => None,
    }
}

/// Expand `for i a, b body` into:
///
/// ```text
/// {
///     var for.from = a;
///     var for.to   = b;
///     var i        = for.from;
///     if i <= for.to {
///         while i < for.to { body; i += 1; }
///     } else {
///         while i > for.to { body; i -= 1; }
///     }
/// }
/// ```
///
/// The auxiliary names contain a dot, which the lexer cannot produce, so
/// nothing in `body` can capture them. The expansion is desugared again so
/// the `+=`/`-=` steps split as well.
fn desugar_for(counter: Token, from: Expr, to: Expr, body: Stmt) -> Stmt {
    let at = counter.position;
    let from_name = Token::new(TokenKind::Identifier, "for.from", at);
    let to_name = Token::new(TokenKind::Identifier, "for.to", at);

    let counter_var = || Expr::Var(counter.clone());
    let to_var = || Expr::Var(to_name.clone());
    let one = || Expr::Int(Token::new(TokenKind::Integer, "1", at));
    let compare = |kind, text: &'static str| Expr::Binary {
        op: Token::new(kind, text, at),
        left: Box::new(counter_var()),
        right: Box::new(to_var()),
    };
    let step = |kind, text: &'static str| {
        Stmt::Expr(Expr::Binary {
            op: Token::new(kind, text, at),
            left: Box::new(counter_var()),
            right: Box::new(one()),
        })
    };

    let ascending = Stmt::While {
        condition: compare(TokenKind::Less, "<"),
        body: Box::new(Stmt::Compound(vec![
            body.clone(),
            step(TokenKind::PlusEqual, "+="),
        ])),
    };
    let descending = Stmt::While {
        condition: compare(TokenKind::Greater, ">"),
        body: Box::new(Stmt::Compound(vec![
            body,
            step(TokenKind::MinusEqual, "-="),
        ])),
    };
    let choose = Stmt::If {
        condition: compare(TokenKind::LessEqual, "<="),
        then_branch: Box::new(Stmt::Compound(vec![ascending])),
        else_branch: Box::new(Stmt::Compound(vec![descending])),
    };

    desugar_stmt(Stmt::Compound(vec![
        Stmt::Var {
            name: from_name.clone(),
            value: from,
        },
        Stmt::Var {
            name: to_name,
            value: to,
        },
        Stmt::Var {
            name: counter,
            value: Expr::Var(from_name),
        },
        choose,
    ]))
}
