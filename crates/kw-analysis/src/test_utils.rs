//! Shared test utilities for kw-analysis

use crate::error::{ErrorKind, ParseError};
use kw_core::{
    AnalyzerConfig, DataType, Modifier, NamedType, Procedure, ProcedureParameter, ProcedureReturn,
    Schema,
};
use kw_sql::{Expr, Relation, ResultColumn, SelectCore, SelectStatement, SqlStatement};

const SOCIAL_YAML: &str = r#"
name: social
extensions:
  - name: erc20
    alias: token
tables:
  - name: users
    columns:
      - name: id
        type: { name: int }
        attributes: [{ type: PRIMARY_KEY }]
      - name: name
        type: { name: text }
        attributes: [{ type: UNIQUE }]
      - name: age
        type: { name: int }
  - name: posts
    columns:
      - name: id
        type: { name: int }
        attributes: [{ type: PRIMARY_KEY }]
      - name: author_id
        type: { name: int }
      - name: title
        type: { name: text }
  - name: follows
    columns:
      - name: follower_id
        type: { name: int }
      - name: followed_id
        type: { name: int }
    indexes:
      - name: follows_pk
        columns: [follower_id, followed_id]
        type: PRIMARY
procedures:
  - name: get_user_name
    parameters:
      - name: $id
        type: { name: int }
    modifiers: [VIEW]
    return_types:
      fields:
        - name: name
          type: { name: text }
  - name: list_users
    modifiers: [VIEW]
    return_types:
      is_table: true
      fields:
        - name: id
          type: { name: int }
        - name: name
          type: { name: text }
  - name: user_stats
    parameters:
      - name: $id
        type: { name: int }
    modifiers: [VIEW]
    return_types:
      fields:
        - name: post_count
          type: { name: int }
        - name: age
          type: { name: int }
  - name: create_user
    parameters:
      - name: $id
        type: { name: int }
      - name: $name
        type: { name: text }
actions:
  - name: create_post
    parameters: [$id, $author, $title]
  - name: read_posts
    modifiers: [VIEW]
foreign_calls:
  - name: get_balance
    parameters:
      - { name: text }
    returns:
      fields:
        - type: { name: int }
"#;

/// Schema with `users(id pk, name unique, age)`, `posts(id pk, author_id,
/// title)`, `follows` (composite key) and a few procedures and actions
pub fn users_schema() -> Schema {
    Schema::from_yaml_str(SOCIAL_YAML).unwrap()
}

pub fn config() -> AnalyzerConfig {
    AnalyzerConfig::default()
}

/// Declare a procedure on `schema`; its body is supplied separately as an AST
pub fn add_procedure(
    schema: &mut Schema,
    name: &str,
    params: &[(&str, DataType)],
    returns: Option<ProcedureReturn>,
    view: bool,
) {
    schema.procedures.push(Procedure {
        name: name.to_string(),
        parameters: params
            .iter()
            .map(|(n, t)| ProcedureParameter {
                name: n.to_string(),
                data_type: *t,
            })
            .collect(),
        public: true,
        modifiers: if view { vec![Modifier::View] } else { vec![] },
        body: String::new(),
        returns,
    });
}

/// Scalar return of the given named fields
pub fn returns(fields: &[(&str, DataType)]) -> Option<ProcedureReturn> {
    Some(ProcedureReturn {
        is_table: false,
        fields: named(fields),
    })
}

/// Table return with the given columns
pub fn returns_table(fields: &[(&str, DataType)]) -> Option<ProcedureReturn> {
    Some(ProcedureReturn {
        is_table: true,
        fields: named(fields),
    })
}

fn named(fields: &[(&str, DataType)]) -> Vec<NamedType> {
    fields
        .iter()
        .map(|(n, t)| NamedType {
            name: n.to_string(),
            data_type: *t,
        })
        .collect()
}

/// `SELECT <columns> FROM <table>`
pub fn select_from(columns: Vec<ResultColumn>, table: &str) -> SelectStatement {
    SelectStatement::new(SelectCore::new(columns).from(Relation::table(table)))
}

/// `SELECT <column names> FROM <table>` as a full statement
pub fn select_columns(columns: &[&str], table: &str) -> SqlStatement {
    SqlStatement::select(select_from(
        columns
            .iter()
            .map(|c| ResultColumn::expr(Expr::col(*c)))
            .collect(),
        table,
    ))
}

pub fn kinds(errors: &[ParseError]) -> Vec<ErrorKind> {
    errors.iter().map(|e| e.kind).collect()
}
