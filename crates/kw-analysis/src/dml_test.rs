use super::*;
use crate::analyze_sql;
use crate::resolve::EXCLUDED_TABLE;
use crate::test_utils::{config, kinds, select_from, users_schema};
use kw_sql::{Join, Relation, ResultColumn, SqlCore, SqlStatement};

fn run(core: SqlCore) -> (bool, Vec<ErrorKind>) {
    let schema = users_schema();
    let mut stmt = SqlStatement::new(core);
    let analysis = analyze_sql(&mut stmt, &schema, &config()).unwrap();
    (analysis.mutative, kinds(&analysis.errors))
}

fn insert_user(values: Vec<Expr>) -> InsertStatement {
    InsertStatement::new(
        "users",
        vec!["id".into(), "name".into(), "age".into()],
        vec![values],
    )
}

fn upsert(do_update: Vec<UpdateSetClause>) -> UpsertClause {
    UpsertClause {
        pos: Position::UNKNOWN,
        conflict_columns: vec!["id".into()],
        conflict_where: None,
        do_update,
        update_where: None,
    }
}

#[test]
fn test_insert_is_mutative() {
    let (mutative, errs) = run(SqlCore::Insert(insert_user(vec![
        Expr::int(1),
        Expr::text("alice"),
        Expr::null(),
    ])));
    assert!(mutative);
    assert!(errs.is_empty(), "{errs:?}");
}

#[test]
fn test_insert_without_column_list_uses_table_order() {
    let insert = InsertStatement::new(
        "posts",
        vec![],
        vec![vec![Expr::int(1), Expr::int(2), Expr::text("hello")]],
    );
    let (_, errs) = run(SqlCore::Insert(insert));
    assert!(errs.is_empty(), "{errs:?}");

    let insert = InsertStatement::new(
        "posts",
        vec![],
        vec![vec![Expr::int(1), Expr::text("hello"), Expr::int(2)]],
    );
    let (_, errs) = run(SqlCore::Insert(insert));
    assert_eq!(errs, vec![ErrorKind::Type, ErrorKind::Type]);
}

#[test]
fn test_insert_value_count_and_types() {
    let (_, errs) = run(SqlCore::Insert(insert_user(vec![Expr::int(1), Expr::text("a")])));
    assert_eq!(errs, vec![ErrorKind::ResultShape]);

    let (_, errs) = run(SqlCore::Insert(insert_user(vec![
        Expr::text("1"),
        Expr::text("a"),
        Expr::int(3),
    ])));
    assert_eq!(errs, vec![ErrorKind::Type]);
}

#[test]
fn test_insert_unknown_table_and_column() {
    let (mutative, errs) = run(SqlCore::Insert(InsertStatement::new(
        "nope",
        vec![],
        vec![vec![Expr::int(1)]],
    )));
    assert!(mutative);
    assert_eq!(errs, vec![ErrorKind::UnknownTable]);

    let (_, errs) = run(SqlCore::Insert(InsertStatement::new(
        "users",
        vec!["id".into(), "email".into()],
        vec![vec![Expr::int(1), Expr::text("a@b")]],
    )));
    assert_eq!(errs, vec![ErrorKind::UnknownColumn]);
}

#[test]
fn test_upsert_with_excluded() {
    let mut insert = insert_user(vec![Expr::int(1), Expr::text("a"), Expr::int(30)]);
    insert.upsert = Some(upsert(vec![UpdateSetClause::new(
        "age",
        Expr::qualified(EXCLUDED_TABLE, "age"),
    )]));
    let (mutative, errs) = run(SqlCore::Insert(insert));
    assert!(mutative);
    assert!(errs.is_empty(), "{errs:?}");
}

#[test]
fn test_upsert_qualified_target_column() {
    let mut insert = insert_user(vec![Expr::int(1), Expr::text("a"), Expr::int(30)]);
    insert.upsert = Some(upsert(vec![UpdateSetClause::new(
        "age",
        Expr::arithmetic(
            Expr::qualified("users", "age"),
            kw_sql::ArithmeticOp::Add,
            Expr::qualified(EXCLUDED_TABLE, "age"),
        ),
    )]));
    let (_, errs) = run(SqlCore::Insert(insert));
    assert!(errs.is_empty(), "{errs:?}");
}

#[test]
fn test_upsert_unqualified_column_is_ambiguous() {
    let mut insert = insert_user(vec![Expr::int(1), Expr::text("a"), Expr::int(30)]);
    insert.upsert = Some(upsert(vec![UpdateSetClause::new("age", Expr::col("age"))]));
    let (_, errs) = run(SqlCore::Insert(insert));
    assert_eq!(errs, vec![ErrorKind::AmbiguousConflictTable]);
}

#[test]
fn test_upsert_unknown_columns() {
    let mut insert = insert_user(vec![Expr::int(1), Expr::text("a"), Expr::int(30)]);
    let mut clause = upsert(vec![UpdateSetClause::new(
        "age",
        Expr::qualified(EXCLUDED_TABLE, "height"),
    )]);
    clause.conflict_columns = vec!["email".into()];
    insert.upsert = Some(clause);
    let (_, errs) = run(SqlCore::Insert(insert));
    assert_eq!(errs, vec![ErrorKind::UnknownColumn, ErrorKind::UnknownColumn]);
}

#[test]
fn test_excluded_outside_conflict() {
    let mut update = UpdateStatement::new(
        "users",
        vec![UpdateSetClause::new("age", Expr::qualified(EXCLUDED_TABLE, "age"))],
    );
    update.where_clause = Some(Expr::equal(Expr::col("id"), Expr::int(1)));
    let (_, errs) = run(SqlCore::Update(update));
    assert_eq!(errs, vec![ErrorKind::InvalidExcludedTable]);
}

#[test]
fn test_update() {
    let mut update = UpdateStatement::new(
        "users",
        vec![UpdateSetClause::new(
            "age",
            Expr::arithmetic(Expr::col("age"), kw_sql::ArithmeticOp::Add, Expr::int(1)),
        )],
    );
    update.where_clause = Some(Expr::equal(Expr::col("id"), Expr::int(1)));
    let (mutative, errs) = run(SqlCore::Update(update));
    assert!(mutative);
    assert!(errs.is_empty(), "{errs:?}");
}

#[test]
fn test_update_set_errors() {
    let update = UpdateStatement::new(
        "users",
        vec![
            UpdateSetClause::new("age", Expr::text("old")),
            UpdateSetClause::new("email", Expr::text("x")),
        ],
    );
    let (_, errs) = run(SqlCore::Update(update));
    assert_eq!(errs, vec![ErrorKind::Type, ErrorKind::UnknownColumn]);
}

#[test]
fn test_update_with_join() {
    let mut update = UpdateStatement::new(
        "posts",
        vec![UpdateSetClause::new("title", Expr::qualified("u", "name"))],
    );
    update.from = Some(Relation::aliased_table("users", "u"));
    update.where_clause = Some(Expr::equal(
        Expr::qualified("posts", "author_id"),
        Expr::qualified("u", "id"),
    ));
    let (_, errs) = run(SqlCore::Update(update));
    assert!(errs.is_empty(), "{errs:?}");
}

#[test]
fn test_delete() {
    let mut delete = DeleteStatement::new("posts");
    delete.where_clause = Some(Expr::equal(Expr::col("author_id"), Expr::int(1)));
    let (mutative, errs) = run(SqlCore::Delete(delete));
    assert!(mutative);
    assert!(errs.is_empty());
}

#[test]
fn test_delete_with_unsafe_join() {
    let mut delete = DeleteStatement::new("posts");
    delete.joins.push(Join::inner(
        Relation::aliased_table("users", "u"),
        Expr::equal(Expr::qualified("u", "age"), Expr::qualified("posts", "author_id")),
    ));
    let (_, errs) = run(SqlCore::Delete(delete));
    assert_eq!(errs, vec![ErrorKind::Join]);
}

#[test]
fn test_where_conditions() {
    let mut delete = DeleteStatement::new("posts");
    delete.where_clause = Some(Expr::col("author_id"));
    let (_, errs) = run(SqlCore::Delete(delete));
    assert_eq!(errs, vec![ErrorKind::Type]);

    let mut delete = DeleteStatement::new("posts");
    delete.where_clause = Some(Expr::equal(
        Expr::call("max", vec![Expr::col("id")]),
        Expr::int(1),
    ));
    let (_, errs) = run(SqlCore::Delete(delete));
    assert_eq!(errs, vec![ErrorKind::Aggregate]);
}

#[test]
fn test_select_is_not_mutative() {
    let (mutative, errs) = run(SqlCore::Select(select_from(
        vec![ResultColumn::expr(Expr::col("title"))],
        "posts",
    )));
    assert!(!mutative);
    assert!(errs.is_empty());
}
