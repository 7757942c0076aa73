use super::*;
use crate::analyze_sql;
use crate::test_utils::{config, kinds, select_from, users_schema};
use kw_sql::{
    CompoundOperator, Join, Relation, ResultColumn, SelectCore, SqlCore, SqlStatement,
};

/// Analyze `stmt` and return the final ordering of its outermost query
fn ordering_of(stmt: SelectStatement) -> (Vec<OrderingTerm>, Vec<ErrorKind>) {
    let schema = users_schema();
    let mut stmt = SqlStatement::select(stmt);
    let analysis = analyze_sql(&mut stmt, &schema, &config()).unwrap();
    let SqlCore::Select(select) = stmt.core else {
        panic!("expected a select statement");
    };
    (select.ordering, kinds(&analysis.errors))
}

fn injected(expr: Expr) -> OrderingTerm {
    OrderingTerm {
        pos: Position::UNKNOWN,
        expr,
        order: Some(OrderType::Asc),
        nulls: Some(NullOrder::Last),
    }
}

fn cols(names: &[&str]) -> Vec<ResultColumn> {
    names
        .iter()
        .map(|n| ResultColumn::expr(Expr::col(*n)))
        .collect()
}

#[test]
fn test_orders_by_primary_key() {
    let (ordering, errs) = ordering_of(select_from(cols(&["name"]), "users"));
    assert!(errs.is_empty());
    assert_eq!(ordering, vec![injected(Expr::qualified("users", "id"))]);
}

#[test]
fn test_uses_alias_for_qualifier() {
    let stmt = SelectStatement::new(
        SelectCore::new(vec![ResultColumn::expr(Expr::qualified("u", "name"))])
            .from(Relation::aliased_table("users", "u")),
    );
    let (ordering, _) = ordering_of(stmt);
    assert_eq!(ordering, vec![injected(Expr::qualified("u", "id"))]);
}

#[test]
fn test_composite_primary_key_orders_every_column() {
    let (ordering, errs) = ordering_of(select_from(cols(&["follower_id"]), "follows"));
    assert!(errs.is_empty());
    assert_eq!(
        ordering,
        vec![
            injected(Expr::qualified("follows", "follower_id")),
            injected(Expr::qualified("follows", "followed_id")),
        ]
    );
}

#[test]
fn test_joined_tables_ordered_by_name() {
    let stmt = SelectStatement::new(
        SelectCore::new(vec![ResultColumn::expr(Expr::qualified("u", "name"))])
            .from(Relation::aliased_table("users", "u"))
            .join(Join::inner(
                Relation::aliased_table("posts", "p"),
                Expr::equal(Expr::qualified("p", "id"), Expr::qualified("u", "id")),
            )),
    );
    let (ordering, errs) = ordering_of(stmt);
    assert!(errs.is_empty(), "{errs:?}");
    assert_eq!(
        ordering,
        vec![
            injected(Expr::qualified("p", "id")),
            injected(Expr::qualified("u", "id")),
        ]
    );
}

#[test]
fn test_user_terms_come_first() {
    let stmt = select_from(cols(&["name"]), "users")
        .order_by(OrderingTerm::new(Expr::col("name")).desc());
    let (ordering, errs) = ordering_of(stmt);
    assert!(errs.is_empty());
    assert_eq!(ordering.len(), 2);
    assert_eq!(ordering[0].expr, Expr::col("name"));
    assert_eq!(ordering[0].order, Some(OrderType::Desc));
    assert_eq!(ordering[1], injected(Expr::qualified("users", "id")));
}

#[test]
fn test_distinct_orders_by_result_columns() {
    let stmt = SelectStatement::new(
        SelectCore::new(vec![
            ResultColumn::expr(Expr::col("name")),
            ResultColumn::expr(Expr::arithmetic(
                Expr::col("age"),
                kw_sql::ArithmeticOp::Add,
                Expr::int(1),
            )),
        ])
        .from(Relation::table("users"))
        .distinct(),
    );
    let (ordering, errs) = ordering_of(stmt);
    assert!(errs.is_empty());
    assert_eq!(
        ordering,
        vec![injected(Expr::col("name")), injected(Expr::int(2))]
    );
}

#[test]
fn test_distinct_with_group_by_is_rejected() {
    let stmt = SelectStatement::new(
        SelectCore::new(cols(&["age"]))
            .from(Relation::table("users"))
            .group_by(vec![Expr::col("age")])
            .distinct(),
    );
    let (_, errs) = ordering_of(stmt);
    assert_eq!(errs.first(), Some(&ErrorKind::Aggregate));
}

#[test]
fn test_group_by_orders_by_group_terms() {
    let stmt = SelectStatement::new(
        SelectCore::new(vec![
            ResultColumn::expr(Expr::col("age")),
            ResultColumn::aliased(Expr::call_star("count"), "n"),
        ])
        .from(Relation::table("users"))
        .group_by(vec![Expr::col("age")]),
    );
    let (ordering, errs) = ordering_of(stmt);
    assert!(errs.is_empty(), "{errs:?}");
    assert_eq!(ordering, vec![injected(Expr::col("age"))]);
    assert!(ordering[0].expr.pos().is_unknown());
}

#[test]
fn test_ungrouped_aggregate_has_no_ordering() {
    let stmt = SelectStatement::new(
        SelectCore::new(vec![ResultColumn::expr(Expr::call_star("count"))])
            .from(Relation::table("users")),
    );
    let (ordering, errs) = ordering_of(stmt);
    assert!(errs.is_empty());
    assert!(ordering.is_empty());
}

#[test]
fn test_compound_orders_by_result_columns() {
    let stmt = select_from(cols(&["id"]), "users").compound(
        CompoundOperator::Union,
        SelectCore::new(cols(&["id"])).from(Relation::table("posts")),
    );
    let (ordering, errs) = ordering_of(stmt);
    assert!(errs.is_empty(), "{errs:?}");
    assert_eq!(ordering, vec![injected(Expr::col("id"))]);
}

#[test]
fn test_compound_rejects_group_by() {
    let stmt = select_from(cols(&["id"]), "users").compound(
        CompoundOperator::UnionAll,
        SelectCore::new(cols(&["author_id"]))
            .from(Relation::table("posts"))
            .group_by(vec![Expr::col("author_id")]),
    );
    let (ordering, errs) = ordering_of(stmt);
    assert!(errs.contains(&ErrorKind::Aggregate));
    assert!(ordering.is_empty());
}

#[test]
fn test_subquery_in_from_is_ordered_in_its_own_scope() {
    let inner = select_from(cols(&["id", "name"]), "users");
    let stmt = SelectStatement::new(
        SelectCore::new(cols(&["name"])).from(Relation::subquery(inner, Some("s".into()))),
    );

    let schema = users_schema();
    let mut sql = SqlStatement::select(stmt);
    let analysis = analyze_sql(&mut sql, &schema, &config()).unwrap();
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);

    let SqlCore::Select(outer) = &sql.core else {
        panic!("expected a select statement");
    };
    // the outer query joins no physical table
    assert!(outer.ordering.is_empty());

    let Some(Relation::Subquery(sub)) = &outer.cores[0].from else {
        panic!("expected a subquery relation");
    };
    assert_eq!(
        sub.query.ordering,
        vec![injected(Expr::qualified("users", "id"))]
    );
}

#[test]
fn test_ordering_is_deterministic() {
    let stmt = select_from(cols(&["follower_id"]), "follows");
    let (first, _) = ordering_of(stmt.clone());
    let (second, _) = ordering_of(stmt);
    assert_eq!(first, second);
}
