//! Pipeline orchestration: source text → tokens → AST → core AST → one of
//! the two execution engines.


use crate::codegen;
use crate::desugar;
use crate::error::LumenError;
use crate::interpreter::Interpreter;
use crate::lexer::Lexer;
use crate::parser;
use crate::parser::ast::Stmt;
use crate::source::SourceText;
use crate::vm::Vm;
use log::debug;
use std::io::Write;

/// Which engine evaluates the program. Both produce the same observable
/// output for the same program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Engine {
    /// Walk the desugared AST directly.
    #[default]
    TreeWalk,
    /// Lower to bytecode and run it on the stack VM.
    Bytecode,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunnerConfig {
    pub engine: Engine,
}

pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Run a program, writing builtin output to `out`. Each run starts from
    /// a fresh engine: a failed run leaves no state behind for the next one.
    pub fn run(&self, source: &SourceText, out: &mut dyn Write) -> Result<(), LumenError> {
        let program = self.frontend(source)?;
        match self.config.engine {
            Engine::TreeWalk => Interpreter::new(out).run(&program),
            Engine::Bytecode => {
                let bytecode = codegen::compile(&program)?;
                Vm::new(bytecode, out).run()
            }
        }
    }

    /// Compile a program and return its disassembly without running it.
    pub fn dump_bytecode(&self, source: &SourceText) -> Result<String, LumenError> {
        let program = self.frontend(source)?;
        Ok(codegen::compile(&program)?.to_string())
    }

    fn frontend(&self, source: &SourceText) -> Result<Vec<Stmt>, LumenError> {
        let tokens = Lexer::new().tokenize(source)?;
        let program = parser::parse(tokens)?;
        debug!("running with {:?} engine", self.config.engine);
        Ok(desugar::desugar(program))
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}
