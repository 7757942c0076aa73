use crate::analyze_sql;
use crate::error::ErrorKind;
use crate::test_utils::{config, kinds, select_from, users_schema};
use kw_sql::{CompoundOperator, Expr, Relation, ResultColumn, SelectCore, SqlStatement};

fn cols(names: &[&str]) -> Vec<ResultColumn> {
    names
        .iter()
        .map(|n| ResultColumn::expr(Expr::col(*n)))
        .collect()
}

/// `SELECT <first> FROM users UNION SELECT <second> FROM posts`
fn union(first: &[&str], second: &[&str]) -> Vec<ErrorKind> {
    let schema = users_schema();
    let mut stmt = SqlStatement::select(select_from(cols(first), "users").compound(
        CompoundOperator::Union,
        SelectCore::new(cols(second)).from(Relation::table("posts")),
    ));
    let analysis = analyze_sql(&mut stmt, &schema, &config()).unwrap();
    kinds(&analysis.errors)
}

#[test]
fn test_compound_cores_with_matching_types() {
    let errs = union(&["id", "name"], &["author_id", "title"]);
    assert!(errs.is_empty(), "{errs:?}");
}

#[test]
fn test_compound_column_count_mismatch() {
    assert_eq!(union(&["id"], &["id", "title"]), vec![ErrorKind::ResultShape]);
}

#[test]
fn test_compound_column_type_mismatch() {
    assert_eq!(union(&["id"], &["title"]), vec![ErrorKind::ResultShape]);
}
