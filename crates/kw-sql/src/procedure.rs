//! Procedural statement nodes

use crate::expr::{Call, Expr, VariableExpr};
use crate::position::Position;
use crate::statement::SqlStatement;
use kw_core::DataType;

/// A parsed procedure body, matched to its schema declaration by name
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedProcedure {
    pub name: String,
    pub pos: Position,
    pub body: Vec<ProcedureStmt>,
}

impl ParsedProcedure {
    pub fn new(name: impl Into<String>, body: Vec<ProcedureStmt>) -> Self {
        Self {
            name: name.into(),
            pos: Position::UNKNOWN,
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcedureStmt {
    Declaration(Declaration),
    Assign(Assign),
    Call(CallStmt),
    ForLoop(ForLoop),
    If(IfStmt),
    Sql(SqlStatement),
    Break(Position),
    Return(ReturnStmt),
    ReturnNext(ReturnNextStmt),
}

impl ProcedureStmt {
    pub fn pos(&self) -> Position {
        match self {
            ProcedureStmt::Declaration(s) => s.pos,
            ProcedureStmt::Assign(s) => s.pos,
            ProcedureStmt::Call(s) => s.pos,
            ProcedureStmt::ForLoop(s) => s.pos,
            ProcedureStmt::If(s) => s.pos,
            ProcedureStmt::Sql(s) => s.pos,
            ProcedureStmt::Break(pos) => *pos,
            ProcedureStmt::Return(s) => s.pos,
            ProcedureStmt::ReturnNext(s) => s.pos,
        }
    }

    pub fn declare(variable: &str, data_type: DataType) -> Self {
        ProcedureStmt::Declaration(Declaration {
            pos: Position::UNKNOWN,
            variable: VariableExpr::new(variable),
            data_type,
        })
    }

    /// `$variable := value`
    pub fn assign(variable: &str, value: Expr) -> Self {
        ProcedureStmt::Assign(Assign {
            pos: Position::UNKNOWN,
            variable: VariableExpr::new(variable),
            data_type: None,
            value,
        })
    }

    /// `$variable type := value`
    pub fn declare_assign(variable: &str, data_type: DataType, value: Expr) -> Self {
        ProcedureStmt::Assign(Assign {
            pos: Position::UNKNOWN,
            variable: VariableExpr::new(variable),
            data_type: Some(data_type),
            value,
        })
    }

    /// A call statement; `None` receivers are discarded with `_`
    pub fn call(receivers: Vec<Option<&str>>, call: Call) -> Self {
        ProcedureStmt::Call(CallStmt {
            pos: Position::UNKNOWN,
            receivers: receivers
                .into_iter()
                .map(|r| r.map(VariableExpr::new))
                .collect(),
            call,
        })
    }

    pub fn for_loop(receiver: &str, term: LoopTerm, body: Vec<ProcedureStmt>) -> Self {
        ProcedureStmt::ForLoop(ForLoop {
            pos: Position::UNKNOWN,
            receiver: VariableExpr::new(receiver),
            term,
            body,
        })
    }

    pub fn if_else(
        branches: Vec<(Expr, Vec<ProcedureStmt>)>,
        else_body: Option<Vec<ProcedureStmt>>,
    ) -> Self {
        ProcedureStmt::If(IfStmt {
            pos: Position::UNKNOWN,
            branches: branches
                .into_iter()
                .map(|(condition, body)| IfThen {
                    pos: Position::UNKNOWN,
                    condition,
                    body,
                })
                .collect(),
            else_body,
        })
    }

    pub fn return_values(values: Vec<Expr>) -> Self {
        ProcedureStmt::Return(ReturnStmt {
            pos: Position::UNKNOWN,
            values,
            sql: None,
        })
    }

    pub fn return_sql(sql: SqlStatement) -> Self {
        ProcedureStmt::Return(ReturnStmt {
            pos: Position::UNKNOWN,
            values: vec![],
            sql: Some(sql),
        })
    }

    pub fn return_next(values: Vec<Expr>) -> Self {
        ProcedureStmt::ReturnNext(ReturnNextStmt {
            pos: Position::UNKNOWN,
            values,
        })
    }
}

/// `$name type;`
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub pos: Position,
    pub variable: VariableExpr,
    pub data_type: DataType,
}

/// `$name [type] := value;`
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub pos: Position,
    pub variable: VariableExpr,
    pub data_type: Option<DataType>,
    pub value: Expr,
}

/// `[$a, _, $c :=] callee(args);`
#[derive(Debug, Clone, PartialEq)]
pub struct CallStmt {
    pub pos: Position,
    pub receivers: Vec<Option<VariableExpr>>,
    pub call: Call,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopTerm {
    /// `start..end`
    Range { pos: Position, start: Expr, end: Expr },
    /// One iteration per row
    Sql(SqlStatement),
    /// One iteration per element of an array variable
    Variable(VariableExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub pos: Position,
    pub receiver: VariableExpr,
    pub term: LoopTerm,
    pub body: Vec<ProcedureStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfThen {
    pub pos: Position,
    pub condition: Expr,
    pub body: Vec<ProcedureStmt>,
}

/// `if ... {} elseif ... {} else {}`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub pos: Position,
    pub branches: Vec<IfThen>,
    pub else_body: Option<Vec<ProcedureStmt>>,
}

/// `return a, b;` or `return SELECT ...;`
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub pos: Position,
    pub values: Vec<Expr>,
    pub sql: Option<SqlStatement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnNextStmt {
    pub pos: Position,
    pub values: Vec<Expr>,
}
