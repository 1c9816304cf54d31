//! Machine-readable CLI output.
//!
//! JSON mode emits a single envelope after the run completes, with the
//! captured builtin output as console lines and, on failure, the error with
//! its 1-indexed source location.

use clap::ValueEnum;
use lumen_lang::error::LumenError;
use serde::Serialize;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-readable output (default)
    Text,
    /// A single JSON object on stdout
    Json,
}

#[derive(Debug, Serialize)]
struct JsonEnvelope {
    #[serde(rename = "type")]
    output_type: &'static str,
    status: &'static str,
    console: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
}

#[derive(Debug, Serialize)]
struct JsonError {
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<u32>,
}

pub fn emit_json(captured: &[u8], result: Result<(), LumenError>) -> ExitCode {
    let console: Vec<String> = String::from_utf8_lossy(captured)
        .lines()
        .map(str::to_owned)
        .collect();

    let (status, error, code) = match &result {
        Ok(()) => ("complete", None, ExitCode::SUCCESS),
        Err(error) => (
            "error",
            Some(JsonError {
                kind: error.kind(),
                message: error.to_string(),
                line: error.position().map(|position| position.line + 1),
                column: error.position().map(|position| position.character + 1),
            }),
            ExitCode::from(2),
        ),
    };

    let envelope = JsonEnvelope {
        output_type: "script",
        status,
        console,
        error,
    };
    match serde_json::to_string(&envelope) {
        Ok(json) => {
            println!("{json}");
            code
        }
        Err(error) => {
            eprintln!("Error serializing output: {error}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_mode_values() {
        assert_eq!(
            OutputMode::from_str("json", true).unwrap(),
            OutputMode::Json
        );
        assert_eq!(
            OutputMode::from_str("text", true).unwrap(),
            OutputMode::Text
        );
    }
}
