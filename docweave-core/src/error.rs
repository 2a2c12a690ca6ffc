use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Errors that can occur while loading documentation inputs.
///
/// Rendering never fails with an `Error`: unresolved links, missing assets and
/// malformed inline HTML degrade to fallback output instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid symbol graph '{name}': {source}")]
    SymbolGraph {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown page '{path}'")]
    UnknownPage { path: String },

    #[error("unclosed directive '@{name}' opened at line {line}")]
    UnclosedDirective { name: String, line: usize },

    #[error("invalid directive arguments on '@{name}': {message}")]
    InvalidArguments { name: String, message: String },
}

/// A diagnostic message produced while parsing or building the documentation.
///
/// Diagnostics are non-fatal: processing continues and produces a best-effort
/// result even when diagnostics are emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn warning(code: &str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            span,
            code: Some(code.to_string()),
        }
    }

    pub fn error(code: &str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
            code: Some(code.to_string()),
        }
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Source location of a block in the original document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// 1-based starting line number.
    pub start_line: usize,
    /// 1-based ending line number (inclusive).
    pub end_line: usize,
}

impl Span {
    pub fn lines(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }
}

impl From<Error> for Diagnostic {
    fn from(error: Error) -> Self {
        let span = match &error {
            Error::UnclosedDirective { line, .. } => Some(Span::lines(*line, *line)),
            _ => None,
        };
        let code = match &error {
            Error::Io { .. } => "E001",
            Error::SymbolGraph { .. } => "E002",
            Error::UnknownPage { .. } => "E003",
            Error::UnclosedDirective { .. } => "W001",
            Error::InvalidArguments { .. } => "W002",
        };
        let severity = if code.starts_with('W') {
            Severity::Warning
        } else {
            Severity::Error
        };
        Self {
            severity,
            message: error.to_string(),
            span,
            code: Some(code.to_string()),
        }
    }
}
