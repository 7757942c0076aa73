use super::*;

#[test]
fn test_literal_types() {
    let Expr::Literal(lit) = Expr::int(1) else {
        panic!("expected literal");
    };
    assert_eq!(lit.data_type(), DataType::INT);

    let dec = LiteralExpr {
        pos: Position::UNKNOWN,
        value: LiteralValue::Decimal {
            digits: "1.50".to_string(),
            precision: 3,
            scale: 2,
        },
        type_cast: None,
    };
    assert_eq!(dec.data_type().precision_scale(), Some((3, 2)));
}

#[test]
fn test_variable_prefix() {
    assert_eq!(VariableExpr::new("@caller").prefix(), VariablePrefix::At);
    assert_eq!(VariableExpr::new("$id").prefix(), VariablePrefix::Dollar);
}

#[test]
fn test_cast_only_applies_to_castable_nodes() {
    let cast = Expr::col("id").cast(DataType::TEXT);
    assert_eq!(cast.type_cast(), Some(DataType::TEXT));

    let cmp = Expr::equal(Expr::int(1), Expr::int(2)).cast(DataType::TEXT);
    assert_eq!(cmp.type_cast(), None);
}

#[test]
fn test_with_pos() {
    let pos = Position::new(1, 2, 1, 8);
    let e = Expr::qualified("users", "id").with_pos(pos);
    assert_eq!(e.pos(), pos);
    assert_eq!(e.kind_name(), "column reference");
    assert_eq!(pos.to_string(), "1:2-1:8");
    assert!(Position::default().is_unknown());
}

#[test]
fn test_operator_display() {
    assert_eq!(ComparisonOp::NotEqual.to_string(), "<>");
    assert_eq!(ArithmeticOp::Concat.to_string(), "||");
    assert_eq!(StringComparisonOp::NotILike.to_string(), "NOT ILIKE");
}
