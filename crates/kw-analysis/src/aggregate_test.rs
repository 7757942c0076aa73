use super::*;

fn col(relation: &str, column: &str) -> ColumnRef {
    ColumnRef {
        relation: relation.to_string(),
        column: column.to_string(),
    }
}

fn scan_outside(cols: &[ColumnRef]) -> ClauseScan {
    ClauseScan {
        columns_outside_aggregate: cols.to_vec(),
        ..ClauseScan::new()
    }
}

#[test]
fn test_record_column_routes_by_aggregate_state() {
    let mut scan = ClauseScan::new();
    scan.record_column(col("users", "id"));
    let mark = scan.enter_aggregate().unwrap();
    scan.record_column(col("users", "age"));
    scan.leave_aggregate(mark).unwrap();

    assert!(scan.contains_aggregate);
    assert_eq!(scan.columns_outside_aggregate, vec![col("users", "id")]);
    assert_eq!(scan.columns_in_aggregate, vec![col("users", "age")]);
}

#[test]
fn test_aggregate_references_one_column() {
    let mut scan = ClauseScan::new();
    let mark = scan.enter_aggregate().unwrap();
    scan.record_column(col("users", "age"));
    scan.record_column(col("users", "age"));
    assert!(scan.leave_aggregate(mark).is_ok());

    let mark = scan.enter_aggregate().unwrap();
    scan.record_column(col("users", "id"));
    scan.record_column(col("users", "age"));
    let err = scan.leave_aggregate(mark).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Aggregate);
}

#[test]
fn test_nested_aggregate_rejected() {
    let mut scan = ClauseScan::new();
    scan.enter_aggregate().unwrap();
    assert!(scan.enter_aggregate().is_err());
}

#[test]
fn test_where_rejects_aggregates() {
    let mut scan = ClauseScan::new();
    assert!(check_where(&scan).is_ok());
    scan.contains_aggregate = true;
    assert_eq!(check_where(&scan).unwrap_err().kind, ErrorKind::Aggregate);
}

#[test]
fn test_group_by_term_rules() {
    let mut group_by = GroupBy::default();
    group_by.add_term(&scan_outside(&[col("t", "a")])).unwrap();

    let err = group_by.add_term(&scan_outside(&[col("t", "a")])).unwrap_err();
    assert!(err.message.contains("more than once"));

    let err = group_by
        .add_term(&scan_outside(&[col("t", "a"), col("t", "b")]))
        .unwrap_err();
    assert_eq!(err.message, "group by must reference exactly one column");

    let err = group_by.add_term(&scan_outside(&[])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Aggregate);
}

#[test]
fn test_result_columns_against_group_by() {
    let group_by = GroupBy {
        columns: vec![col("t", "a")],
    };
    assert!(group_by
        .check_result_column(&scan_outside(&[col("t", "a")]))
        .is_empty());
    assert_eq!(
        group_by
            .check_result_column(&scan_outside(&[col("t", "b")]))
            .len(),
        1
    );

    let aggregated = ClauseScan {
        contains_aggregate: true,
        columns_in_aggregate: vec![col("t", "a")],
        ..ClauseScan::new()
    };
    let errs = group_by.check_result_column(&aggregated);
    assert!(errs[0].message.contains("in aggregate function and in group by"));
}

#[test]
fn test_having_requires_grouped_columns() {
    let group_by = GroupBy {
        columns: vec![col("t", "a")],
    };
    assert!(group_by
        .check_having(&scan_outside(&[col("t", "a")]))
        .is_empty());
    assert_eq!(
        group_by.check_having(&scan_outside(&[col("t", "b")])).len(),
        1
    );
}
