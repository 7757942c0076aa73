//! Expression nodes
//!
//! Every node carries its source [`Position`]. Nodes that may be followed by
//! a `::type` cast carry a `type_cast`; the cast overrides the type the
//! analyzer reports for the node.

use crate::position::Position;
use crate::statement::SelectStatement;
use kw_core::DataType;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralExpr),
    FunctionCall(FunctionCall),
    ForeignCall(ForeignCall),
    Variable(VariableExpr),
    ArrayAccess(ArrayAccessExpr),
    MakeArray(MakeArrayExpr),
    FieldAccess(FieldAccessExpr),
    Paren(ParenExpr),
    Comparison(ComparisonExpr),
    Logical(LogicalExpr),
    Arithmetic(ArithmeticExpr),
    Unary(UnaryExpr),
    Column(ColumnExpr),
    Collate(CollateExpr),
    StringComparison(StringComparisonExpr),
    Is(IsExpr),
    In(InExpr),
    Between(BetweenExpr),
    Subquery(SubqueryExpr),
    Case(CaseExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Int(i64),
    Text(String),
    Bool(bool),
    Blob(Vec<u8>),
    /// Big unsigned integer, kept as its decimal digits
    Uint256(String),
    /// Fixed-point literal, kept as written, with its inferred precision and scale
    Decimal {
        digits: String,
        precision: u16,
        scale: u16,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    pub pos: Position,
    pub value: LiteralValue,
    pub type_cast: Option<DataType>,
}

impl LiteralExpr {
    /// The type tagged by the literal itself, ignoring any cast
    pub fn data_type(&self) -> DataType {
        match &self.value {
            LiteralValue::Null => DataType::NULL,
            LiteralValue::Int(_) => DataType::INT,
            LiteralValue::Text(_) => DataType::TEXT,
            LiteralValue::Bool(_) => DataType::BOOL,
            LiteralValue::Blob(_) => DataType::BLOB,
            LiteralValue::Uint256(_) => DataType::UINT256,
            LiteralValue::Decimal {
                precision, scale, ..
            } => DataType::decimal_unchecked(*precision, *scale),
        }
    }
}

/// A call to a built-in function or a procedure of the same schema
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub pos: Position,
    pub name: String,
    pub args: Vec<Expr>,
    pub distinct: bool,
    /// `count(*)`
    pub star: bool,
    pub type_cast: Option<DataType>,
}

/// `name[dbid_expr, procedure_expr](args...)`
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignCall {
    pub pos: Position,
    pub name: String,
    pub context_args: Vec<Expr>,
    pub args: Vec<Expr>,
    pub type_cast: Option<DataType>,
}

/// The callee of a call statement or a table-function relation
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Function(FunctionCall),
    Foreign(ForeignCall),
}

impl Call {
    pub fn name(&self) -> &str {
        match self {
            Call::Function(f) => &f.name,
            Call::Foreign(f) => &f.name,
        }
    }

    pub fn pos(&self) -> Position {
        match self {
            Call::Function(f) => f.pos,
            Call::Foreign(f) => f.pos,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariablePrefix {
    /// `$name`: parameters and declared variables
    Dollar,
    /// `@name`: contextual session values
    At,
}

/// A variable reference. `name` keeps its sigil (`$id`, `@caller`).
#[derive(Debug, Clone, PartialEq)]
pub struct VariableExpr {
    pub pos: Position,
    pub name: String,
    pub type_cast: Option<DataType>,
}

impl VariableExpr {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            pos: Position::UNKNOWN,
            name: name.into(),
            type_cast: None,
        }
    }

    pub fn prefix(&self) -> VariablePrefix {
        if self.name.starts_with('@') {
            VariablePrefix::At
        } else {
            VariablePrefix::Dollar
        }
    }

    pub fn with_pos(mut self, pos: Position) -> Self {
        self.pos = pos;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayIndex {
    Single(Box<Expr>),
    /// `[from:to]`, either bound optional
    Range {
        from: Option<Box<Expr>>,
        to: Option<Box<Expr>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayAccessExpr {
    pub pos: Position,
    pub array: Box<Expr>,
    pub index: ArrayIndex,
    pub type_cast: Option<DataType>,
}

/// `ARRAY[a, b, c]`
#[derive(Debug, Clone, PartialEq)]
pub struct MakeArrayExpr {
    pub pos: Position,
    pub values: Vec<Expr>,
    pub type_cast: Option<DataType>,
}

/// `$row.field`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAccessExpr {
    pub pos: Position,
    pub record: Box<Expr>,
    pub field: String,
    pub type_cast: Option<DataType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenExpr {
    pub pos: Position,
    pub inner: Box<Expr>,
    pub type_cast: Option<DataType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "<>",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanOrEqual => ">=",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonExpr {
    pub pos: Position,
    pub left: Box<Expr>,
    pub op: ComparisonOp,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpr {
    pub pos: Position,
    pub left: Box<Expr>,
    pub op: LogicalOp,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    /// `||`
    Concat,
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
            ArithmeticOp::Modulo => "%",
            ArithmeticOp::Concat => "||",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArithmeticExpr {
    pub pos: Position,
    pub left: Box<Expr>,
    pub op: ArithmeticOp,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Not => "NOT",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub pos: Position,
    pub op: UnaryOp,
    pub operand: Box<Expr>,
}

/// A column reference, optionally qualified by table or alias
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnExpr {
    pub pos: Position,
    pub table: Option<String>,
    pub column: String,
    pub type_cast: Option<DataType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollateExpr {
    pub pos: Position,
    pub expr: Box<Expr>,
    pub collation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringComparisonOp {
    Like,
    NotLike,
    ILike,
    NotILike,
}

impl fmt::Display for StringComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StringComparisonOp::Like => "LIKE",
            StringComparisonOp::NotLike => "NOT LIKE",
            StringComparisonOp::ILike => "ILIKE",
            StringComparisonOp::NotILike => "NOT ILIKE",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringComparisonExpr {
    pub pos: Position,
    pub left: Box<Expr>,
    pub op: StringComparisonOp,
    pub right: Box<Expr>,
}

/// `left IS [NOT] [DISTINCT FROM] right`
#[derive(Debug, Clone, PartialEq)]
pub struct IsExpr {
    pub pos: Position,
    pub left: Box<Expr>,
    pub not: bool,
    pub distinct: bool,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InTarget {
    List(Vec<Expr>),
    Subquery(Box<SelectStatement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InExpr {
    pub pos: Position,
    pub expr: Box<Expr>,
    pub not: bool,
    pub target: InTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BetweenExpr {
    pub pos: Position,
    pub expr: Box<Expr>,
    pub not: bool,
    pub lower: Box<Expr>,
    pub upper: Box<Expr>,
}

/// `(SELECT ...)`, `EXISTS (SELECT ...)` or `NOT EXISTS (SELECT ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct SubqueryExpr {
    pub pos: Position,
    pub query: Box<SelectStatement>,
    pub exists: bool,
    pub not: bool,
    pub type_cast: Option<DataType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    pub pos: Position,
    pub case: Option<Box<Expr>>,
    pub when_then: Vec<(Expr, Expr)>,
    pub else_expr: Option<Box<Expr>>,
}

impl Expr {
    pub fn pos(&self) -> Position {
        match self {
            Expr::Literal(e) => e.pos,
            Expr::FunctionCall(e) => e.pos,
            Expr::ForeignCall(e) => e.pos,
            Expr::Variable(e) => e.pos,
            Expr::ArrayAccess(e) => e.pos,
            Expr::MakeArray(e) => e.pos,
            Expr::FieldAccess(e) => e.pos,
            Expr::Paren(e) => e.pos,
            Expr::Comparison(e) => e.pos,
            Expr::Logical(e) => e.pos,
            Expr::Arithmetic(e) => e.pos,
            Expr::Unary(e) => e.pos,
            Expr::Column(e) => e.pos,
            Expr::Collate(e) => e.pos,
            Expr::StringComparison(e) => e.pos,
            Expr::Is(e) => e.pos,
            Expr::In(e) => e.pos,
            Expr::Between(e) => e.pos,
            Expr::Subquery(e) => e.pos,
            Expr::Case(e) => e.pos,
        }
    }

    /// Human readable node kind, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Literal(_) => "literal",
            Expr::FunctionCall(_) => "function call",
            Expr::ForeignCall(_) => "foreign call",
            Expr::Variable(_) => "variable",
            Expr::ArrayAccess(_) => "array access",
            Expr::MakeArray(_) => "array instantiation",
            Expr::FieldAccess(_) => "field access",
            Expr::Paren(_) => "parenthesized expression",
            Expr::Comparison(_) => "comparison",
            Expr::Logical(_) => "logical expression",
            Expr::Arithmetic(_) => "arithmetic expression",
            Expr::Unary(_) => "unary expression",
            Expr::Column(_) => "column reference",
            Expr::Collate(_) => "collate",
            Expr::StringComparison(_) => "string comparison",
            Expr::Is(_) => "IS expression",
            Expr::In(_) => "IN expression",
            Expr::Between(_) => "BETWEEN expression",
            Expr::Subquery(_) => "subquery",
            Expr::Case(_) => "CASE expression",
        }
    }

    /// The cast applied to this node, if the node kind accepts one
    pub fn type_cast(&self) -> Option<DataType> {
        match self {
            Expr::Literal(e) => e.type_cast,
            Expr::FunctionCall(e) => e.type_cast,
            Expr::ForeignCall(e) => e.type_cast,
            Expr::Variable(e) => e.type_cast,
            Expr::ArrayAccess(e) => e.type_cast,
            Expr::MakeArray(e) => e.type_cast,
            Expr::FieldAccess(e) => e.type_cast,
            Expr::Paren(e) => e.type_cast,
            Expr::Column(e) => e.type_cast,
            Expr::Subquery(e) => e.type_cast,
            _ => None,
        }
    }

    pub fn with_pos(mut self, pos: Position) -> Self {
        match &mut self {
            Expr::Literal(e) => e.pos = pos,
            Expr::FunctionCall(e) => e.pos = pos,
            Expr::ForeignCall(e) => e.pos = pos,
            Expr::Variable(e) => e.pos = pos,
            Expr::ArrayAccess(e) => e.pos = pos,
            Expr::MakeArray(e) => e.pos = pos,
            Expr::FieldAccess(e) => e.pos = pos,
            Expr::Paren(e) => e.pos = pos,
            Expr::Comparison(e) => e.pos = pos,
            Expr::Logical(e) => e.pos = pos,
            Expr::Arithmetic(e) => e.pos = pos,
            Expr::Unary(e) => e.pos = pos,
            Expr::Column(e) => e.pos = pos,
            Expr::Collate(e) => e.pos = pos,
            Expr::StringComparison(e) => e.pos = pos,
            Expr::Is(e) => e.pos = pos,
            Expr::In(e) => e.pos = pos,
            Expr::Between(e) => e.pos = pos,
            Expr::Subquery(e) => e.pos = pos,
            Expr::Case(e) => e.pos = pos,
        }
        self
    }

    /// Attach a `::type` cast. Node kinds that cannot be cast are returned unchanged.
    pub fn cast(mut self, data_type: DataType) -> Self {
        match &mut self {
            Expr::Literal(e) => e.type_cast = Some(data_type),
            Expr::FunctionCall(e) => e.type_cast = Some(data_type),
            Expr::ForeignCall(e) => e.type_cast = Some(data_type),
            Expr::Variable(e) => e.type_cast = Some(data_type),
            Expr::ArrayAccess(e) => e.type_cast = Some(data_type),
            Expr::MakeArray(e) => e.type_cast = Some(data_type),
            Expr::FieldAccess(e) => e.type_cast = Some(data_type),
            Expr::Paren(e) => e.type_cast = Some(data_type),
            Expr::Column(e) => e.type_cast = Some(data_type),
            Expr::Subquery(e) => e.type_cast = Some(data_type),
            _ => {}
        }
        self
    }

    // Constructors for building trees by hand. Positions default to unknown.

    pub fn literal(value: LiteralValue) -> Self {
        Expr::Literal(LiteralExpr {
            pos: Position::UNKNOWN,
            value,
            type_cast: None,
        })
    }

    pub fn null() -> Self {
        Self::literal(LiteralValue::Null)
    }

    pub fn int(v: i64) -> Self {
        Self::literal(LiteralValue::Int(v))
    }

    pub fn text(v: impl Into<String>) -> Self {
        Self::literal(LiteralValue::Text(v.into()))
    }

    pub fn boolean(v: bool) -> Self {
        Self::literal(LiteralValue::Bool(v))
    }

    /// Unqualified column reference
    pub fn col(column: impl Into<String>) -> Self {
        Expr::Column(ColumnExpr {
            pos: Position::UNKNOWN,
            table: None,
            column: column.into(),
            type_cast: None,
        })
    }

    /// Column reference qualified by a table name or alias
    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Expr::Column(ColumnExpr {
            pos: Position::UNKNOWN,
            table: Some(table.into()),
            column: column.into(),
            type_cast: None,
        })
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(VariableExpr::new(name))
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::FunctionCall(FunctionCall {
            pos: Position::UNKNOWN,
            name: name.into(),
            args,
            distinct: false,
            star: false,
            type_cast: None,
        })
    }

    /// `name(*)`
    pub fn call_star(name: impl Into<String>) -> Self {
        Expr::FunctionCall(FunctionCall {
            pos: Position::UNKNOWN,
            name: name.into(),
            args: vec![],
            distinct: false,
            star: true,
            type_cast: None,
        })
    }

    pub fn compare(left: Expr, op: ComparisonOp, right: Expr) -> Self {
        Expr::Comparison(ComparisonExpr {
            pos: Position::UNKNOWN,
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    pub fn equal(left: Expr, right: Expr) -> Self {
        Self::compare(left, ComparisonOp::Equal, right)
    }

    pub fn logical(left: Expr, op: LogicalOp, right: Expr) -> Self {
        Expr::Logical(LogicalExpr {
            pos: Position::UNKNOWN,
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    pub fn arithmetic(left: Expr, op: ArithmeticOp, right: Expr) -> Self {
        Expr::Arithmetic(ArithmeticExpr {
            pos: Position::UNKNOWN,
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary(UnaryExpr {
            pos: Position::UNKNOWN,
            op,
            operand: Box::new(operand),
        })
    }

    pub fn paren(inner: Expr) -> Self {
        Expr::Paren(ParenExpr {
            pos: Position::UNKNOWN,
            inner: Box::new(inner),
            type_cast: None,
        })
    }

    pub fn subquery(query: SelectStatement) -> Self {
        Expr::Subquery(SubqueryExpr {
            pos: Position::UNKNOWN,
            query: Box::new(query),
            exists: false,
            not: false,
            type_cast: None,
        })
    }

    pub fn exists(query: SelectStatement) -> Self {
        Expr::Subquery(SubqueryExpr {
            pos: Position::UNKNOWN,
            query: Box::new(query),
            exists: true,
            not: false,
            type_cast: None,
        })
    }

    pub fn make_array(values: Vec<Expr>) -> Self {
        Expr::MakeArray(MakeArrayExpr {
            pos: Position::UNKNOWN,
            values,
            type_cast: None,
        })
    }

    pub fn index(array: Expr, index: Expr) -> Self {
        Expr::ArrayAccess(ArrayAccessExpr {
            pos: Position::UNKNOWN,
            array: Box::new(array),
            index: ArrayIndex::Single(Box::new(index)),
            type_cast: None,
        })
    }

    pub fn field(record: Expr, field: impl Into<String>) -> Self {
        Expr::FieldAccess(FieldAccessExpr {
            pos: Position::UNKNOWN,
            record: Box::new(record),
            field: field.into(),
            type_cast: None,
        })
    }

    pub fn is(left: Expr, right: Expr) -> Self {
        Expr::Is(IsExpr {
            pos: Position::UNKNOWN,
            left: Box::new(left),
            not: false,
            distinct: false,
            right: Box::new(right),
        })
    }

    pub fn in_list(expr: Expr, list: Vec<Expr>) -> Self {
        Expr::In(InExpr {
            pos: Position::UNKNOWN,
            expr: Box::new(expr),
            not: false,
            target: InTarget::List(list),
        })
    }

    pub fn in_subquery(expr: Expr, query: SelectStatement) -> Self {
        Expr::In(InExpr {
            pos: Position::UNKNOWN,
            expr: Box::new(expr),
            not: false,
            target: InTarget::Subquery(Box::new(query)),
        })
    }

    pub fn between(expr: Expr, lower: Expr, upper: Expr) -> Self {
        Expr::Between(BetweenExpr {
            pos: Position::UNKNOWN,
            expr: Box::new(expr),
            not: false,
            lower: Box::new(lower),
            upper: Box::new(upper),
        })
    }

    pub fn like(left: Expr, right: Expr) -> Self {
        Expr::StringComparison(StringComparisonExpr {
            pos: Position::UNKNOWN,
            left: Box::new(left),
            op: StringComparisonOp::Like,
            right: Box::new(right),
        })
    }

    pub fn collate(expr: Expr, collation: impl Into<String>) -> Self {
        Expr::Collate(CollateExpr {
            pos: Position::UNKNOWN,
            expr: Box::new(expr),
            collation: collation.into(),
        })
    }
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            pos: Position::UNKNOWN,
            name: name.into(),
            args,
            distinct: false,
            star: false,
            type_cast: None,
        }
    }
}

impl ForeignCall {
    pub fn new(name: impl Into<String>, context_args: Vec<Expr>, args: Vec<Expr>) -> Self {
        Self {
            pos: Position::UNKNOWN,
            name: name.into(),
            context_args,
            args,
            type_cast: None,
        }
    }
}

#[cfg(test)]
#[path = "expr_test.rs"]
mod tests;
