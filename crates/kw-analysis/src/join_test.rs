use super::*;
use crate::analyze_sql;
use crate::test_utils::{config, kinds, users_schema};
use kw_sql::{Relation, ResultColumn, SelectCore, SelectStatement, SqlStatement};

/// `SELECT u.name FROM users AS u JOIN <table> AS <alias> ON <on>`
fn join_errors(table: &str, alias: &str, on: Expr) -> Vec<ErrorKind> {
    let schema = users_schema();
    let mut stmt = SqlStatement::select(SelectStatement::new(
        SelectCore::new(vec![ResultColumn::expr(Expr::qualified("u", "name"))])
            .from(Relation::aliased_table("users", "u"))
            .join(Join::inner(Relation::aliased_table(table, alias), on)),
    ));
    let analysis = analyze_sql(&mut stmt, &schema, &config()).unwrap();
    kinds(&analysis.errors)
}

fn q(table: &str, column: &str) -> Expr {
    Expr::qualified(table, column)
}

#[test]
fn test_join_on_primary_key() {
    let errs = join_errors("posts", "p", Expr::equal(q("p", "author_id"), q("u", "id")));
    assert!(errs.is_empty(), "{errs:?}");
}

#[test]
fn test_join_on_unique_column() {
    let errs = join_errors("posts", "p", Expr::equal(q("p", "title"), q("u", "name")));
    assert!(errs.is_empty(), "{errs:?}");
}

#[test]
fn test_join_on_parenthesized_condition() {
    let on = Expr::paren(Expr::equal(q("u", "id"), Expr::paren(q("p", "author_id"))));
    assert!(join_errors("posts", "p", on).is_empty());
}

#[test]
fn test_join_without_unique_side_is_rejected() {
    let errs = join_errors("posts", "p", Expr::equal(q("p", "author_id"), q("u", "age")));
    assert_eq!(errs, vec![ErrorKind::Join]);
}

#[test]
fn test_composite_key_column_is_not_unique() {
    let errs = join_errors(
        "follows",
        "f",
        Expr::equal(q("f", "follower_id"), q("u", "age")),
    );
    assert_eq!(errs, vec![ErrorKind::Join]);

    let errs = join_errors(
        "follows",
        "f",
        Expr::equal(q("f", "follower_id"), q("u", "id")),
    );
    assert!(errs.is_empty());
}

#[test]
fn test_join_requires_equality() {
    let errs = join_errors(
        "posts",
        "p",
        Expr::compare(q("p", "author_id"), kw_sql::ComparisonOp::GreaterThan, q("u", "id")),
    );
    assert_eq!(errs, vec![ErrorKind::Join]);

    let both = Expr::logical(
        Expr::equal(q("p", "author_id"), q("u", "id")),
        kw_sql::LogicalOp::And,
        Expr::equal(q("p", "id"), Expr::int(1)),
    );
    assert_eq!(join_errors("posts", "p", both), vec![ErrorKind::Join]);
}

#[test]
fn test_join_requires_a_column() {
    let errs = join_errors("posts", "p", Expr::equal(Expr::int(1), Expr::int(1)));
    assert_eq!(errs, vec![ErrorKind::Join]);
}

#[test]
fn test_type_error_skips_safety_check() {
    let errs = join_errors("posts", "p", Expr::equal(q("u", "id"), q("p", "title")));
    assert_eq!(errs, vec![ErrorKind::Type]);
}

#[test]
fn test_join_on_unknown_table() {
    let errs = join_errors("nope", "n", Expr::equal(q("n", "id"), q("u", "id")));
    assert!(errs.contains(&ErrorKind::UnknownTable));
}

#[test]
fn test_join_same_alias_twice() {
    let errs = join_errors("posts", "u", Expr::equal(q("u", "id"), Expr::int(1)));
    assert!(errs.contains(&ErrorKind::TableAlreadyJoined));
}

#[test]
fn test_aggregate_in_join_condition() {
    let on = Expr::equal(q("u", "id"), Expr::call("max", vec![q("p", "author_id")]));
    let errs = join_errors("posts", "p", on);
    assert!(errs.contains(&ErrorKind::Aggregate));
}
