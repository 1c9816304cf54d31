//! Stack-based virtual machine.
//!
//! Executes [`Bytecode`] with a stack of call frames. Each frame owns its
//! register file, its computation stack and an instruction pointer; globals
//! live in a flat vector shared by all frames.


use crate::codegen::bytecode::{Bytecode, Op};
use crate::error::LumenError;
use crate::runtime::operations;
use crate::runtime::value::Value;
use std::io::Write;

/// One in-progress function activation.
struct Frame {
    registers: Vec<Value>,
    stack: Vec<Value>,
    ip: usize,
}

impl Frame {
    fn new(ip: usize) -> Self {
        Self {
            registers: Vec::new(),
            stack: Vec::new(),
            ip,
        }
    }
}

pub struct Vm<'out> {
    bytecode: Bytecode,
    globals: Vec<Value>,
    frames: Vec<Frame>,
    out: &'out mut dyn Write,
}

impl<'out> Vm<'out> {
    pub fn new(bytecode: Bytecode, out: &'out mut dyn Write) -> Self {
        Self {
            bytecode,
            globals: Vec::new(),
            frames: Vec::new(),
            out,
        }
    }

    /// Execute from address 0 until the outermost frame returns.
    pub fn run(&mut self) -> Result<(), LumenError> {
        self.frames.push(Frame::new(0));

        loop {
            let Some(frame) = self.frames.last_mut() else {
                break;
            };
            let ip = frame.ip;
            // The IP already points past the instruction while it executes;
            // `call` relies on this to resume the caller correctly.
            frame.ip = ip + 1;
            let Some(op) = self.bytecode.code.get(ip).cloned() else {
                return Err(LumenError::runtime("instruction pointer out of range"));
            };
            self.step(op)?;
        }
        Ok(())
    }

    fn step(&mut self, op: Op) -> Result<(), LumenError> {
        match op {
            Op::GlobalAlloc(count) => {
                self.globals = vec![Value::Void; count];
            }
            Op::GlobalStore(register) => {
                let value = self.pop()?;
                let Some(slot) = self.globals.get_mut(register) else {
                    return Err(LumenError::runtime("global register out of range"));
                };
                *slot = value;
            }
            Op::GlobalLoad(register) => {
                let Some(value) = self.globals.get(register).cloned() else {
                    return Err(LumenError::runtime("global register out of range"));
                };
                self.push(value)?;
            }
            Op::Alloc(count) => {
                self.frame_mut()?.registers = vec![Value::Void; count];
            }
            Op::Store(register) => {
                let value = self.pop()?;
                let frame = self.frame_mut()?;
                let Some(slot) = frame.registers.get_mut(register) else {
                    return Err(LumenError::runtime("frame register out of range"));
                };
                *slot = value;
            }
            Op::Load(register) => {
                let frame = self.frame_mut()?;
                let Some(value) = frame.registers.get(register).cloned() else {
                    return Err(LumenError::runtime("frame register out of range"));
                };
                self.push(value)?;
            }
            Op::PushInt(n) => self.push(Value::Int(n))?,
            Op::PushBool(b) => self.push(Value::Bool(b))?,
            Op::PushStr(constant) | Op::PushNative(constant) => {
                let Some(value) = self.bytecode.constants.get(constant).cloned() else {
                    return Err(LumenError::runtime("constant index out of range"));
                };
                self.push(value)?;
            }
            Op::PushFn { entry, arity } => self.push(Value::Compiled { entry, arity })?,
            Op::Pop => {
                self.pop()?;
            }
            Op::Jump(target) => {
                self.frame_mut()?.ip = target;
            }
            Op::JumpIf(target) => match self.pop()? {
                Value::Bool(true) => self.frame_mut()?.ip = target,
                Value::Bool(false) => {}
                other => return Err(LumenError::type_error("bool", other.kind())),
            },
            Op::Call(argc) => self.call(argc)?,
            Op::Return => self.ret()?,
            Op::Add => self.binary(operations::add)?,
            Op::Sub => self.binary(operations::sub)?,
            Op::Mul => self.binary(operations::mul)?,
            Op::Div => self.binary(operations::div)?,
            Op::Mod => self.binary(operations::modulo)?,
            Op::Less => self.binary(operations::less)?,
            Op::Greater => self.binary(operations::greater)?,
            Op::Eq => self.binary(operations::eq)?,
            Op::Not => self.unary(operations::not)?,
            Op::Neg => self.unary(operations::negate)?,
        }
        Ok(())
    }

    fn call(&mut self, argc: usize) -> Result<(), LumenError> {
        let mut args = Vec::with_capacity(argc);
        for _ in 0..argc {
            // First pop is the last argument.
            args.push(self.pop()?);
        }
        args.reverse();
        let callee = self.pop()?;

        match callee {
            Value::Compiled { entry, arity } => {
                if args.len() != arity {
                    return Err(LumenError::runtime(format!(
                        "function expects {arity} arguments, got {}",
                        args.len()
                    )));
                }
                let mut frame = Frame::new(entry);
                // Replay the arguments in order so the callee's parameter
                // stores pop them in reverse.
                frame.stack = args;
                self.frames.push(frame);
            }
            Value::Native(native) => {
                let result = (native.call)(self.out, &args)?;
                self.push(result)?;
            }
            other => {
                return Err(LumenError::runtime(format!(
                    "{} is not callable",
                    other.kind()
                )))
            }
        }
        Ok(())
    }

    fn ret(&mut self) -> Result<(), LumenError> {
        let Some(mut frame) = self.frames.pop() else {
            return Err(LumenError::runtime("return with no active frame"));
        };
        let result = frame.stack.pop().unwrap_or(Value::Void);
        if let Some(caller) = self.frames.last_mut() {
            // The caller's IP already points past its `call`.
            caller.stack.push(result);
        }
        Ok(())
    }

    fn binary(
        &mut self,
        operation: fn(&Value, &Value) -> Result<Value, LumenError>,
    ) -> Result<(), LumenError> {
        let right = self.pop()?;
        let left = self.pop()?;
        let value = operation(&left, &right)?;
        self.push(value)
    }

    fn unary(
        &mut self,
        operation: fn(&Value) -> Result<Value, LumenError>,
    ) -> Result<(), LumenError> {
        let value = self.pop()?;
        let result = operation(&value)?;
        self.push(result)
    }

    fn frame_mut(&mut self) -> Result<&mut Frame, LumenError> {
        self.frames
            .last_mut()
            .ok_or_else(|| LumenError::runtime("no active frame"))
    }

    fn push(&mut self, value: Value) -> Result<(), LumenError> {
        self.frame_mut()?.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, LumenError> {
        self.frame_mut()?
            .stack
            .pop()
            .ok_or_else(|| LumenError::runtime("computation stack underflow"))
    }
}
