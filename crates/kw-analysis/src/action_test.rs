use super::*;
use crate::test_utils::{config, kinds, select_columns, users_schema};
use crate::{analyze_action, analyze_actions, AnalysisFault};
use kw_sql::{InsertStatement, ParsedAction, SqlCore, SqlStatement};

fn insert_post(values: Vec<Expr>) -> ActionStmt {
    ActionStmt::sql(SqlStatement::new(SqlCore::Insert(InsertStatement::new(
        "posts",
        vec![],
        vec![values],
    ))))
}

fn ext(receivers: Vec<&str>, alias: &str, args: Vec<Expr>) -> ActionStmt {
    ActionStmt::ExtensionCall(ExtensionCall::new(receivers, alias, "balance", args))
}

fn call(action: &str, args: Vec<Expr>) -> ActionStmt {
    ActionStmt::ActionCall(ActionCall::new(action, args))
}

fn run(name: &str, body: Vec<ActionStmt>) -> (ParsedAction, bool, Vec<ErrorKind>) {
    let schema = users_schema();
    let mut parsed = ParsedAction::new(name, body);
    let analysis = analyze_action(&schema, &mut parsed, &config()).unwrap();
    let errs = kinds(&analysis.errors);
    (parsed, analysis.mutative, errs)
}

fn sql_flags(parsed: &ParsedAction) -> Vec<bool> {
    parsed
        .body
        .iter()
        .filter_map(|s| match s {
            ActionStmt::Sql(sql) => Some(sql.mutative),
            _ => None,
        })
        .collect()
}

#[test]
fn test_parameters_are_untyped() {
    let (parsed, mutative, errs) = run(
        "create_post",
        vec![insert_post(vec![
            Expr::var("$id"),
            Expr::var("$author"),
            Expr::var("$title"),
        ])],
    );
    assert!(errs.is_empty(), "{errs:?}");
    assert!(mutative);
    assert_eq!(sql_flags(&parsed), vec![true]);
}

#[test]
fn test_each_statement_gets_its_own_flag() {
    let (parsed, mutative, errs) = run(
        "create_post",
        vec![
            ActionStmt::sql(select_columns(&["id"], "users")),
            insert_post(vec![Expr::var("$id"), Expr::int(1), Expr::var("$title")]),
            ActionStmt::sql(select_columns(&["title"], "posts")),
        ],
    );
    assert!(errs.is_empty(), "{errs:?}");
    assert!(mutative);
    assert_eq!(sql_flags(&parsed), vec![false, true, false]);
}

#[test]
fn test_view_action_cannot_write() {
    let (_, mutative, errs) = run(
        "read_posts",
        vec![insert_post(vec![Expr::int(1), Expr::int(2), Expr::text("t")])],
    );
    assert!(mutative);
    assert_eq!(errs, vec![ErrorKind::ViewMutatesState]);

    let (_, mutative, errs) = run(
        "read_posts",
        vec![ActionStmt::sql(select_columns(&["title"], "posts"))],
    );
    assert!(!mutative);
    assert!(errs.is_empty());
}

#[test]
fn test_sql_errors_are_reported() {
    let (_, _, errs) = run(
        "read_posts",
        vec![ActionStmt::sql(select_columns(&["missing"], "posts"))],
    );
    assert_eq!(errs, vec![ErrorKind::UnknownColumn]);
}

#[test]
fn test_action_calls() {
    let (_, mutative, errs) = run(
        "create_post",
        vec![call("read_posts", vec![])],
    );
    assert!(errs.is_empty());
    assert!(!mutative);

    let (_, mutative, errs) = run(
        "read_posts",
        vec![call(
            "create_post",
            vec![Expr::int(1), Expr::int(2), Expr::text("t")],
        )],
    );
    assert!(mutative);
    assert_eq!(errs, vec![ErrorKind::ViewMutatesState]);
}

#[test]
fn test_action_call_errors() {
    let (_, _, errs) = run("create_post", vec![call("nope", vec![])]);
    assert_eq!(errs, vec![ErrorKind::ActionNotFound]);

    let (_, _, errs) = run("create_post", vec![call("create_post", vec![Expr::int(1)])]);
    assert_eq!(errs, vec![ErrorKind::FunctionSignature]);
}

#[test]
fn test_extension_calls() {
    let (_, mutative, errs) = run(
        "create_post",
        vec![
            ext(vec!["$balance"], "token", vec![Expr::var("@caller")]),
            insert_post(vec![
                Expr::var("$id"),
                Expr::var("$balance"),
                Expr::var("$title"),
            ]),
        ],
    );
    assert!(errs.is_empty(), "{errs:?}");
    assert!(mutative);

    let (_, mutative, errs) = run("read_posts", vec![ext(vec![], "token", vec![])]);
    assert!(errs.is_empty());
    assert!(!mutative);
}

#[test]
fn test_extension_call_errors() {
    let (_, _, errs) = run("create_post", vec![ext(vec![], "erc20", vec![])]);
    assert_eq!(errs, vec![ErrorKind::UnknownFunctionOrProcedure]);

    let (_, _, errs) = run("create_post", vec![ext(vec!["@caller"], "token", vec![])]);
    assert_eq!(errs, vec![ErrorKind::Assignment]);
}

#[test]
fn test_inline_arguments_are_restricted() {
    let (_, _, errs) = run(
        "create_post",
        vec![ext(
            vec![],
            "token",
            vec![
                Expr::call("abs", vec![Expr::int(-1)]),
                Expr::arithmetic(Expr::var("$id"), kw_sql::ArithmeticOp::Add, Expr::int(1)),
            ],
        )],
    );
    assert!(errs.is_empty(), "{errs:?}");

    let (_, _, errs) = run(
        "create_post",
        vec![ext(vec![], "token", vec![Expr::index(Expr::var("$id"), Expr::int(1))])],
    );
    assert_eq!(errs, vec![ErrorKind::Assignment]);

    let (_, _, errs) = run(
        "create_post",
        vec![call(
            "create_post",
            vec![
                Expr::call("get_user_name", vec![Expr::int(1)]),
                Expr::int(2),
                Expr::text("t"),
            ],
        )],
    );
    assert_eq!(errs, vec![ErrorKind::FunctionSignature]);
}

#[test]
fn test_inline_gate_does_not_leak_into_sql() {
    let (_, _, errs) = run(
        "create_post",
        vec![
            ext(vec![], "token", vec![Expr::int(1)]),
            ActionStmt::sql(SqlStatement::select(kw_sql::SelectStatement::new(
                kw_sql::SelectCore::new(vec![kw_sql::ResultColumn::expr(Expr::index(
                    Expr::make_array(vec![Expr::col("id")]),
                    Expr::int(1),
                ))])
                .from(kw_sql::Relation::table("users")),
            ))),
        ],
    );
    assert!(errs.is_empty(), "{errs:?}");
}

#[test]
fn test_unknown_action_is_a_fault() {
    let schema = users_schema();
    let mut parsed = ParsedAction::new("missing", vec![]);
    let err = analyze_action(&schema, &mut parsed, &config()).unwrap_err();
    assert!(matches!(err, AnalysisFault::UnknownAction { name } if name == "missing"));
}

#[test]
fn test_analyze_actions_merges_results() {
    let schema = users_schema();
    let mut parsed = vec![
        ParsedAction::new(
            "create_post",
            vec![insert_post(vec![Expr::int(1), Expr::int(2), Expr::text("t")])],
        ),
        ParsedAction::new("read_posts", vec![call("nope", vec![])]),
    ];
    let analysis = analyze_actions(&schema, &mut parsed, &config()).unwrap();
    assert_eq!(analysis.mutative.get("create_post"), Some(&true));
    assert_eq!(analysis.mutative.get("read_posts"), Some(&false));
    assert_eq!(kinds(&analysis.errors), vec![ErrorKind::ActionNotFound]);
}
