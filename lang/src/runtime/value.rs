use crate::error::LumenError;
use crate::parser::ast::FunctionDecl;
use num_bigint::BigInt;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

/// A native function provided by the host. Output goes through the writer
/// the engine was constructed with, so callers (and tests) decide where it
/// lands.
pub struct NativeFn {
    pub name: &'static str,
    pub call: fn(&mut dyn Write, &[Value]) -> Result<Value, LumenError>,
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFn({})", self.name)
    }
}

impl PartialEq for NativeFn {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

/// Runtime values. Cheap to clone; payloads are immutable — mutation happens
/// only by rebinding a symbol's cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Produced only by functions that do not return a value.
    Void,
    Int(BigInt),
    Bool(bool),
    Str(Rc<str>),
    /// An interpreted function, sharing its definition node.
    Function(Rc<FunctionDecl>),
    /// A compiled function: entry address into the bytecode, plus the
    /// parameter count the VM checks at call time.
    Compiled { entry: usize, arity: usize },
    Native(&'static NativeFn),
}

impl Value {
    pub fn string(text: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(text.as_ref()))
    }

    /// The kind name used in type errors and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Int(_) => "integer",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Function(_) | Value::Compiled { .. } => "function",
            Value::Native(_) => "native function",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "<void>"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Function(_) | Value::Compiled { .. } => write!(f, "<function>"),
            Value::Native(_) => write!(f, "<native function>"),
        }
    }
}

/// Strip the quotes off a string literal's token text and process the escape
/// sequences `\'`, `\0`, `\t` and `\n`. Any other escaped character stands
/// for itself.
pub fn unescape(text: &str) -> String {
    let inner = text
        .strip_prefix('\'')
        .and_then(|stripped| stripped.strip_suffix('\''))
        .unwrap_or(text);
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('0') => result.push('\0'),
            Some('\'') => result.push('\''),
            Some(other) => result.push(other),
            None => {}
        }
    }
    result
}
