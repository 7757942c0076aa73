//! Error types for kw-analysis
//!
//! Two channels are kept apart:
//! - [`ParseError`] records describe problems in the analyzed input. They are
//!   collected in an [`ErrorListener`] and never abort the walk.
//! - [`AnalysisFault`] signals a broken invariant inside the analyzer or an
//!   input that earlier phases should have rejected. It aborts the current
//!   unit.

use kw_core::CoreError;
use kw_sql::Position;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Category of a user-facing analysis error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Reported by the parser layer, never by the analyzer
    Syntax,
    Type,
    UndeclaredVariable,
    VariableAlreadyDeclared,
    UnknownTable,
    UnknownColumn,
    AmbiguousColumn,
    TableAlreadyJoined,
    TableAlreadyExists,
    UnknownFunctionOrProcedure,
    FunctionSignature,
    ResultShape,
    UnnamedResultColumn,
    UnnamedJoin,
    Join,
    Aggregate,
    Break,
    Return,
    UnknownContextualVariable,
    Identifier,
    ActionNotFound,
    Ordering,
    Collation,
    AmbiguousConflictTable,
    InvalidExcludedTable,
    ViewMutatesState,
    CrossScopeDeclaration,
    Assignment,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Type => "type error",
            ErrorKind::UndeclaredVariable => "undeclared variable",
            ErrorKind::VariableAlreadyDeclared => "variable already declared",
            ErrorKind::UnknownTable => "unknown table reference",
            ErrorKind::UnknownColumn => "unknown column reference",
            ErrorKind::AmbiguousColumn => "ambiguous column reference",
            ErrorKind::TableAlreadyJoined => "table already joined",
            ErrorKind::TableAlreadyExists => "table already exists",
            ErrorKind::UnknownFunctionOrProcedure => "unknown function or procedure",
            ErrorKind::FunctionSignature => "function/procedure signature error",
            ErrorKind::ResultShape => "result shape error",
            ErrorKind::UnnamedResultColumn => "unnamed result column",
            ErrorKind::UnnamedJoin => "unnamed join",
            ErrorKind::Join => "join error",
            ErrorKind::Aggregate => "aggregate error",
            ErrorKind::Break => "break error",
            ErrorKind::Return => "return type error",
            ErrorKind::UnknownContextualVariable => "unknown contextual variable",
            ErrorKind::Identifier => "identifier error",
            ErrorKind::ActionNotFound => "action not found",
            ErrorKind::Ordering => "ordering error",
            ErrorKind::Collation => "collation error",
            ErrorKind::AmbiguousConflictTable => "ambiguous conflict table",
            ErrorKind::InvalidExcludedTable => "invalid excluded table usage",
            ErrorKind::ViewMutatesState => "view mutates state",
            ErrorKind::CrossScopeDeclaration => "cross-scope declaration",
            ErrorKind::Assignment => "assignment error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One user-facing error with its source position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    /// Which front end produced the error (`sql`, `procedure`, `action`)
    pub parser_name: String,
    pub kind: ErrorKind,
    pub message: String,
    pub position: Position,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}) {}: {} ({})",
            self.parser_name, self.kind, self.message, self.position
        )
    }
}

/// A rule violation detected away from any position; the caller attaches one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: ErrorKind,
    pub message: String,
}

impl Rejection {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Collects errors in the order they are found
#[derive(Debug, Clone)]
pub struct ErrorListener {
    parser_name: String,
    errors: Vec<ParseError>,
}

impl ErrorListener {
    pub fn new(parser_name: impl Into<String>) -> Self {
        Self {
            parser_name: parser_name.into(),
            errors: Vec::new(),
        }
    }

    pub fn add(&mut self, kind: ErrorKind, position: Position, message: impl Into<String>) {
        self.errors.push(ParseError {
            parser_name: self.parser_name.clone(),
            kind,
            message: message.into(),
            position,
        });
    }

    pub(crate) fn reject(&mut self, rejection: Rejection, position: Position) {
        self.add(rejection.kind, position, rejection.message);
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Prefix every message recorded from index `from` onwards
    pub fn prefix_messages(&mut self, from: usize, prefix: &str) {
        for err in self.errors.iter_mut().skip(from) {
            err.message = format!("{prefix}{}", err.message);
        }
    }

    /// All collected errors as one `std::error::Error`, or `None` on success
    pub fn err(&self) -> Option<ParseErrors> {
        if self.errors.is_empty() {
            None
        } else {
            Some(ParseErrors(self.errors.clone()))
        }
    }
}

/// A non-empty batch of analysis errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} analysis error(s):\n{}", .0.len(), render_errors(.0))]
pub struct ParseErrors(pub Vec<ParseError>);

fn render_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| format!("  {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Internal invariant violations
#[derive(Error, Debug)]
pub enum AnalysisFault {
    /// AF001: popScope without a matching scope
    #[error("[AF001] SQL scope stack underflow")]
    ScopeUnderflow,

    /// AF002: A SELECT statement with no cores
    #[error("[AF002] Malformed SELECT statement: {message}")]
    MalformedSelect { message: String },

    /// AF003: A parsed procedure body with no schema declaration
    #[error("[AF003] Procedure '{name}' is not declared in the schema")]
    UnknownProcedure { name: String },

    /// AF004: A parsed action body with no schema declaration
    #[error("[AF004] Action '{name}' is not declared in the schema")]
    UnknownAction { name: String },

    /// AF005: Schema invariant broken (for example a table without a primary key)
    #[error("[AF005] Schema error: {0}")]
    Core(#[from] CoreError),
}

/// Result type alias for AnalysisFault
pub type FaultResult<T> = Result<T, AnalysisFault>;

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
