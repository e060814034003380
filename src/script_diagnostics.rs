//! Structured script diagnostics.
//!
//! Rhai provides rich error types (parse + runtime) with positions. These are
//! wrapped into a stable, JSON-serializable diagnostic that carries a clean
//! message for the fatal banner plus the raw engine text for bug reports.

use rhai::{EvalAltResult, ParseError};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptDiagnosticKind {
    /// Syntax/parse errors (compile time).
    ParseError,
    /// Runtime errors in user code, including `system.panic`.
    RuntimeError,
    /// Script used the host API incorrectly (wrong types, unknown names, etc).
    HostApiMisuse,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptPhase {
    Compile,
    Run,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScriptLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScriptDiagnostic {
    pub kind: ScriptDiagnosticKind,
    pub phase: ScriptPhase,
    pub message: String,
    pub location: Option<ScriptLocation>,
    /// Raw engine error string.
    #[serde(default)]
    pub raw: Option<String>,
}

fn classify(err: &EvalAltResult) -> ScriptDiagnosticKind {
    match err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => classify(inner),
        EvalAltResult::ErrorRuntime(..) => ScriptDiagnosticKind::RuntimeError,
        EvalAltResult::ErrorVariableNotFound(..)
        | EvalAltResult::ErrorFunctionNotFound(..)
        | EvalAltResult::ErrorPropertyNotFound(..)
        | EvalAltResult::ErrorIndexNotFound(..)
        | EvalAltResult::ErrorMismatchDataType(..)
        | EvalAltResult::ErrorMismatchOutputType(..)
        | EvalAltResult::ErrorArrayBounds(..)
        | EvalAltResult::ErrorStringBounds(..)
        | EvalAltResult::ErrorIndexingType(..)
        | EvalAltResult::ErrorDotExpr(..) => ScriptDiagnosticKind::HostApiMisuse,
        _ => ScriptDiagnosticKind::RuntimeError,
    }
}

/// The message a user should see: the thrown value for runtime errors, the
/// innermost failure for errors raised inside script functions.
fn clean_message(err: &EvalAltResult) -> String {
    match err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => clean_message(inner),
        EvalAltResult::ErrorRuntime(value, _) => match value.clone().into_string() {
            Ok(text) => text,
            Err(_) => value.to_string(),
        },
        other => {
            // Drop the " (line x, position y)" suffix; location is reported separately.
            let text = other.to_string();
            match text.rfind(" (line ") {
                Some(cut) => text[..cut].to_string(),
                None => text,
            }
        }
    }
}

fn location(pos: rhai::Position) -> Option<ScriptLocation> {
    let line = pos.line()? as u32;
    let column = pos.position().unwrap_or(0) as u32;
    Some(ScriptLocation {
        line,
        column: column.max(1),
    })
}

fn innermost_position(err: &EvalAltResult) -> rhai::Position {
    match err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, pos) => {
            let inner_pos = innermost_position(inner);
            if inner_pos.is_none() {
                *pos
            } else {
                inner_pos
            }
        }
        other => other.position(),
    }
}

pub fn from_parse_error(err: &ParseError) -> ScriptDiagnostic {
    let raw = err.to_string();
    ScriptDiagnostic {
        kind: ScriptDiagnosticKind::ParseError,
        phase: ScriptPhase::Compile,
        message: err.err_type().to_string(),
        location: location(err.position()),
        raw: Some(raw),
    }
}

pub fn from_eval_error(err: &EvalAltResult) -> ScriptDiagnostic {
    ScriptDiagnostic {
        kind: classify(err),
        phase: ScriptPhase::Run,
        message: clean_message(err),
        location: location(innermost_position(err)),
        raw: Some(err.to_string()),
    }
}

impl ScriptDiagnostic {
    /// `message` prefixed with `line:column` when known.
    pub fn summary(&self) -> String {
        match &self.location {
            Some(loc) => format!("{}:{}: {}", loc.line, loc.column, self.message),
            None => self.message.clone(),
        }
    }
}
