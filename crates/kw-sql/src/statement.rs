//! SQL statement nodes

use crate::expr::{Call, Expr};
use crate::position::Position;
use std::fmt;

/// A full SQL statement with its optional `WITH` clause
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub pos: Position,
    pub ctes: Vec<CommonTableExpression>,
    pub core: SqlCore,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlCore {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
}

impl SqlStatement {
    pub fn new(core: SqlCore) -> Self {
        Self {
            pos: Position::UNKNOWN,
            ctes: vec![],
            core,
        }
    }

    pub fn select(select: SelectStatement) -> Self {
        Self::new(SqlCore::Select(select))
    }

    pub fn with_ctes(mut self, ctes: Vec<CommonTableExpression>) -> Self {
        self.ctes = ctes;
        self
    }

    /// The top-level SELECT, if this is a query
    pub fn as_select(&self) -> Option<&SelectStatement> {
        match &self.core {
            SqlCore::Select(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommonTableExpression {
    pub pos: Position,
    pub name: String,
    /// Optional column renames; when present the count must match the query
    pub columns: Vec<String>,
    pub query: SelectStatement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundOperator {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl fmt::Display for CompoundOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompoundOperator::Union => "UNION",
            CompoundOperator::UnionAll => "UNION ALL",
            CompoundOperator::Intersect => "INTERSECT",
            CompoundOperator::Except => "EXCEPT",
        })
    }
}

/// One or more select cores joined by compound operators, with the
/// trailing ORDER BY / LIMIT / OFFSET that applies to the whole result
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub pos: Position,
    pub cores: Vec<SelectCore>,
    /// `compound_operators[i]` joins `cores[i]` and `cores[i + 1]`
    pub compound_operators: Vec<CompoundOperator>,
    pub ordering: Vec<OrderingTerm>,
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
}

impl SelectStatement {
    pub fn new(core: SelectCore) -> Self {
        Self {
            pos: Position::UNKNOWN,
            cores: vec![core],
            compound_operators: vec![],
            ordering: vec![],
            limit: None,
            offset: None,
        }
    }

    /// Append another core with the operator that joins it to the previous one
    pub fn compound(mut self, op: CompoundOperator, core: SelectCore) -> Self {
        self.compound_operators.push(op);
        self.cores.push(core);
        self
    }

    pub fn order_by(mut self, term: OrderingTerm) -> Self {
        self.ordering.push(term);
        self
    }

    pub fn limit(mut self, limit: Expr) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: Expr) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn is_compound(&self) -> bool {
        self.cores.len() > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrder {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderingTerm {
    pub pos: Position,
    pub expr: Expr,
    pub order: Option<OrderType>,
    pub nulls: Option<NullOrder>,
}

impl OrderingTerm {
    pub fn new(expr: Expr) -> Self {
        Self {
            pos: Position::UNKNOWN,
            expr,
            order: None,
            nulls: None,
        }
    }

    pub fn desc(mut self) -> Self {
        self.order = Some(OrderType::Desc);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectCore {
    pub pos: Position,
    pub distinct: bool,
    pub columns: Vec<ResultColumn>,
    pub from: Option<Relation>,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
}

impl SelectCore {
    pub fn new(columns: Vec<ResultColumn>) -> Self {
        Self {
            pos: Position::UNKNOWN,
            distinct: false,
            columns,
            from: None,
            joins: vec![],
            where_clause: None,
            group_by: vec![],
            having: None,
        }
    }

    pub fn from(mut self, relation: Relation) -> Self {
        self.from = Some(relation);
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn filter(mut self, where_clause: Expr) -> Self {
        self.where_clause = Some(where_clause);
        self
    }

    pub fn group_by(mut self, terms: Vec<Expr>) -> Self {
        self.group_by = terms;
        self
    }

    pub fn having(mut self, having: Expr) -> Self {
        self.having = Some(having);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultColumn {
    Expression { expr: Expr, alias: Option<String> },
    /// `*` or `table.*`
    Wildcard { table: Option<String> },
}

impl ResultColumn {
    pub fn expr(expr: Expr) -> Self {
        ResultColumn::Expression { expr, alias: None }
    }

    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        ResultColumn::Expression {
            expr,
            alias: Some(alias.into()),
        }
    }

    pub fn star() -> Self {
        ResultColumn::Wildcard { table: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    Table(RelationTable),
    Subquery(RelationSubquery),
    FunctionCall(RelationFunctionCall),
}

impl Relation {
    pub fn table(name: impl Into<String>) -> Self {
        Relation::Table(RelationTable {
            pos: Position::UNKNOWN,
            table: name.into(),
            alias: None,
        })
    }

    pub fn aliased_table(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Relation::Table(RelationTable {
            pos: Position::UNKNOWN,
            table: name.into(),
            alias: Some(alias.into()),
        })
    }

    pub fn subquery(query: SelectStatement, alias: Option<String>) -> Self {
        Relation::Subquery(RelationSubquery {
            pos: Position::UNKNOWN,
            query: Box::new(query),
            alias,
        })
    }

    pub fn function(call: Call, alias: Option<String>) -> Self {
        Relation::FunctionCall(RelationFunctionCall {
            pos: Position::UNKNOWN,
            call,
            alias,
        })
    }

    pub fn pos(&self) -> Position {
        match self {
            Relation::Table(r) => r.pos,
            Relation::Subquery(r) => r.pos,
            Relation::FunctionCall(r) => r.pos,
        }
    }
}

/// A table or CTE referenced by name
#[derive(Debug, Clone, PartialEq)]
pub struct RelationTable {
    pub pos: Position,
    pub table: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationSubquery {
    pub pos: Position,
    pub query: Box<SelectStatement>,
    pub alias: Option<String>,
}

/// A procedure (or foreign procedure) returning a table, used as a relation
#[derive(Debug, Clone, PartialEq)]
pub struct RelationFunctionCall {
    pub pos: Position,
    pub call: Call,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub pos: Position,
    pub join_type: JoinType,
    pub relation: Relation,
    pub on: Expr,
}

impl Join {
    pub fn inner(relation: Relation, on: Expr) -> Self {
        Self {
            pos: Position::UNKNOWN,
            join_type: JoinType::Inner,
            relation,
            on,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSetClause {
    pub pos: Position,
    pub column: String,
    pub value: Expr,
}

impl UpdateSetClause {
    pub fn new(column: impl Into<String>, value: Expr) -> Self {
        Self {
            pos: Position::UNKNOWN,
            column: column.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub pos: Position,
    pub table: String,
    pub alias: Option<String>,
    pub set: Vec<UpdateSetClause>,
    pub from: Option<Relation>,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expr>,
}

impl UpdateStatement {
    pub fn new(table: impl Into<String>, set: Vec<UpdateSetClause>) -> Self {
        Self {
            pos: Position::UNKNOWN,
            table: table.into(),
            alias: None,
            set,
            from: None,
            joins: vec![],
            where_clause: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub pos: Position,
    pub table: String,
    pub alias: Option<String>,
    pub from: Option<Relation>,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expr>,
}

impl DeleteStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            pos: Position::UNKNOWN,
            table: table.into(),
            alias: None,
            from: None,
            joins: vec![],
            where_clause: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub pos: Position,
    pub table: String,
    pub alias: Option<String>,
    /// Target columns; empty means every column in table order
    pub columns: Vec<String>,
    pub values: Vec<Vec<Expr>>,
    pub upsert: Option<UpsertClause>,
}

impl InsertStatement {
    pub fn new(table: impl Into<String>, columns: Vec<String>, values: Vec<Vec<Expr>>) -> Self {
        Self {
            pos: Position::UNKNOWN,
            table: table.into(),
            alias: None,
            columns,
            values,
            upsert: None,
        }
    }
}

/// `ON CONFLICT (cols) [WHERE ...] DO NOTHING | DO UPDATE SET ... [WHERE ...]`
///
/// An empty `do_update` means `DO NOTHING`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertClause {
    pub pos: Position,
    pub conflict_columns: Vec<String>,
    pub conflict_where: Option<Expr>,
    pub do_update: Vec<UpdateSetClause>,
    pub update_where: Option<Expr>,
}
