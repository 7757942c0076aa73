//! kw-sql: abstract syntax tree for Kuneiform SQL, procedures and actions
//!
//! The parser that produces these trees lives elsewhere; this crate only
//! defines the node types the analyzer consumes and mutates (the analyzer
//! appends ordering terms to SELECT statements and flags mutating action
//! statements). Identifiers are expected to be lowercased by the parser.

pub mod action;
pub mod expr;
pub mod position;
pub mod procedure;
pub mod statement;

pub use action::{ActionCall, ActionSql, ActionStmt, ExtensionCall, ParsedAction};
pub use expr::{
    ArithmeticExpr, ArithmeticOp, ArrayAccessExpr, ArrayIndex, BetweenExpr, Call, CaseExpr,
    CollateExpr, ColumnExpr, ComparisonExpr, ComparisonOp, Expr, FieldAccessExpr, ForeignCall,
    FunctionCall, InExpr, InTarget, IsExpr, LiteralExpr, LiteralValue, LogicalExpr, LogicalOp,
    MakeArrayExpr, ParenExpr, StringComparisonExpr, StringComparisonOp, SubqueryExpr, UnaryExpr,
    UnaryOp, VariableExpr, VariablePrefix,
};
pub use position::Position;
pub use procedure::{
    Assign, CallStmt, Declaration, ForLoop, IfStmt, IfThen, LoopTerm, ParsedProcedure,
    ProcedureStmt, ReturnNextStmt, ReturnStmt,
};
pub use statement::{
    CommonTableExpression, CompoundOperator, DeleteStatement, InsertStatement, Join, JoinType,
    NullOrder, OrderType, OrderingTerm, Relation, RelationFunctionCall, RelationSubquery,
    RelationTable, ResultColumn, SelectCore, SelectStatement, SqlCore, SqlStatement,
    UpdateSetClause, UpdateStatement, UpsertClause,
};
