//! Action statement nodes
//!
//! Actions are the legacy inline form: a sequence of SQL statements,
//! extension method calls and calls to other actions.

use crate::expr::{Expr, VariableExpr};
use crate::position::Position;
use crate::statement::SqlStatement;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAction {
    pub name: String,
    pub pos: Position,
    pub body: Vec<ActionStmt>,
}

impl ParsedAction {
    pub fn new(name: impl Into<String>, body: Vec<ActionStmt>) -> Self {
        Self {
            name: name.into(),
            pos: Position::UNKNOWN,
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionStmt {
    Sql(ActionSql),
    ExtensionCall(ExtensionCall),
    ActionCall(ActionCall),
}

impl ActionStmt {
    pub fn sql(statement: SqlStatement) -> Self {
        ActionStmt::Sql(ActionSql {
            pos: statement.pos,
            statement,
            mutative: false,
        })
    }

    pub fn pos(&self) -> Position {
        match self {
            ActionStmt::Sql(s) => s.pos,
            ActionStmt::ExtensionCall(s) => s.pos,
            ActionStmt::ActionCall(s) => s.pos,
        }
    }
}

/// A SQL statement inside an action. `mutative` is filled in by the analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSql {
    pub pos: Position,
    pub statement: SqlStatement,
    pub mutative: bool,
}

/// `$a, $b = alias.method(args);`
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionCall {
    pub pos: Position,
    pub receivers: Vec<VariableExpr>,
    pub extension: String,
    pub method: String,
    pub args: Vec<Expr>,
}

impl ExtensionCall {
    pub fn new(
        receivers: Vec<&str>,
        extension: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Expr>,
    ) -> Self {
        Self {
            pos: Position::UNKNOWN,
            receivers: receivers.into_iter().map(VariableExpr::new).collect(),
            extension: extension.into(),
            method: method.into(),
            args,
        }
    }
}

/// `other_action(args);`
#[derive(Debug, Clone, PartialEq)]
pub struct ActionCall {
    pub pos: Position,
    pub action: String,
    pub args: Vec<Expr>,
}

impl ActionCall {
    pub fn new(action: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            pos: Position::UNKNOWN,
            action: action.into(),
            args,
        }
    }
}
