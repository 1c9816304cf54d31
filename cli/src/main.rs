//! Lumen CLI.
//!
//! Usage:
//!   lumen <SCRIPT>                  Run a script with the tree-walk interpreter
//!   lumen -c <SCRIPT>               Run through the bytecode compiler + VM
//!   lumen -e '<SOURCE>'             Evaluate source text from the argument
//!   lumen - < script.lm             Read the program from standard input
//!   lumen --dump-bytecode <SCRIPT>  Print the compiled bytecode and exit
//!   lumen -o json <SCRIPT>          Emit a JSON result envelope

mod output;

use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use lumen_lang::runner::{Engine, Runner, RunnerConfig};
use lumen_lang::source::SourceText;
use output::OutputMode;

#[derive(Parser, Debug)]
#[command(name = "lumen")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The script file to run ('-' reads from standard input)
    script: Option<PathBuf>,

    /// Evaluate source text given on the command line
    #[arg(short = 'e', long = "eval", value_name = "SOURCE", conflicts_with = "script")]
    eval: Option<String>,

    /// Execute through the bytecode compiler and stack VM
    #[arg(short = 'c', long = "compile")]
    compile: bool,

    /// Print the compiled bytecode instead of running
    #[arg(long = "dump-bytecode")]
    dump_bytecode: bool,

    /// Output mode
    #[arg(short = 'o', long = "output", value_enum, default_value = "text")]
    output: OutputMode,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let raw = match read_source(&args) {
        Ok(raw) => raw,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(1);
        }
    };
    let source = SourceText::new(&raw);

    let engine = if args.compile {
        Engine::Bytecode
    } else {
        Engine::TreeWalk
    };
    let runner = Runner::with_config(RunnerConfig { engine });

    if args.dump_bytecode {
        return match runner.dump_bytecode(&source) {
            Ok(listing) => {
                print!("{listing}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("{}", error.render(&source));
                ExitCode::from(2)
            }
        };
    }

    match args.output {
        OutputMode::Text => {
            let mut stdout = std::io::stdout();
            match runner.run(&source, &mut stdout) {
                Ok(()) => ExitCode::SUCCESS,
                Err(error) => {
                    eprintln!("{}", error.render(&source));
                    ExitCode::from(2)
                }
            }
        }
        OutputMode::Json => {
            let mut captured = Vec::new();
            let result = runner.run(&source, &mut captured);
            output::emit_json(&captured, result)
        }
    }
}

fn read_source(args: &Args) -> Result<String, String> {
    if let Some(source) = &args.eval {
        return Ok(source.clone());
    }
    match &args.script {
        Some(path) if path.as_os_str() == "-" => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|error| format!("Error reading stdin: {error}"))?;
            Ok(buffer)
        }
        Some(path) => std::fs::read_to_string(path)
            .map_err(|error| format!("Error reading file {}: {error}", path.display())),
        None => Err("No script given; pass a file path, '-' for stdin, or -e '<source>'".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_args_run_mode() {
        let args = Args::try_parse_from(["lumen", "prog.lm"]).unwrap();
        assert!(!args.compile);
        assert!(!args.dump_bytecode);
        assert_eq!(args.script, Some(PathBuf::from("prog.lm")));
    }

    #[test]
    fn parse_args_compile_mode() {
        let args = Args::try_parse_from(["lumen", "-c", "prog.lm"]).unwrap();
        assert!(args.compile);
    }

    #[test]
    fn parse_args_eval_mode() {
        let args = Args::try_parse_from(["lumen", "-e", "println(1);"]).unwrap();
        assert_eq!(args.eval.as_deref(), Some("println(1);"));
        assert_eq!(args.script, None);
    }

    #[test]
    fn parse_args_eval_conflicts_with_script() {
        assert!(Args::try_parse_from(["lumen", "-e", "1;", "prog.lm"]).is_err());
    }

    #[test]
    fn parse_args_json_output() {
        let args = Args::try_parse_from(["lumen", "-o", "json", "prog.lm"]).unwrap();
        assert_eq!(args.output, OutputMode::Json);
    }

    #[test]
    fn parse_args_dump_bytecode() {
        let args = Args::try_parse_from(["lumen", "--dump-bytecode", "prog.lm"]).unwrap();
        assert!(args.dump_bytecode);
    }
}
