//! Host-provided native functions.
//!
//! Both engines register this table into the global scope at startup. All
//! output is written through the engine's writer so the host (or a test)
//! chooses where it goes.

use super::value::{NativeFn, Value};
use crate::error::LumenError;
use std::io::Write;

/// The native function table.
pub static NATIVES: &[NativeFn] = &[
    NativeFn {
        name: "print",
        call: native_print,
    },
    NativeFn {
        name: "println",
        call: native_println,
    },
    NativeFn {
        name: "space",
        call: native_space,
    },
    NativeFn {
        name: "plot_x",
        call: native_plot_x,
    },
];

/// `print(args...)`: write each argument, no separator, no newline.
fn native_print(out: &mut dyn Write, args: &[Value]) -> Result<Value, LumenError> {
    for value in args {
        write!(out, "{value}").map_err(output_error)?;
    }
    Ok(Value::Void)
}

/// `println(args...)`: as `print`, followed by a newline.
fn native_println(out: &mut dyn Write, args: &[Value]) -> Result<Value, LumenError> {
    native_print(out, args)?;
    writeln!(out).map_err(output_error)?;
    Ok(Value::Void)
}

/// `space()`: write a single space.
fn native_space(out: &mut dyn Write, _args: &[Value]) -> Result<Value, LumenError> {
    write!(out, " ").map_err(output_error)?;
    Ok(Value::Void)
}

/// `plot_x(bool)`: write `x` when true, a space when false.
fn native_plot_x(out: &mut dyn Write, args: &[Value]) -> Result<Value, LumenError> {
    let [arg] = args else {
        return Err(LumenError::runtime(format!(
            "'plot_x' expects 1 argument, got {}",
            args.len()
        )));
    };
    let Value::Bool(on) = arg else {
        return Err(LumenError::type_error("bool", arg.kind()));
    };
    write!(out, "{}", if *on { 'x' } else { ' ' }).map_err(output_error)?;
    Ok(Value::Void)
}

fn output_error(error: std::io::Error) -> LumenError {
    LumenError::runtime(format!("output error: {error}"))
}
