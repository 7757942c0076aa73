use super::*;

#[test]
fn test_parse_simple_types() {
    assert_eq!(parse_data_type("int").unwrap(), DataType::INT);
    assert_eq!(parse_data_type("TEXT").unwrap(), DataType::TEXT);
    assert_eq!(parse_data_type(" bool ").unwrap(), DataType::BOOL);
    assert_eq!(parse_data_type("uint256").unwrap(), DataType::UINT256);
}

#[test]
fn test_parse_array_type() {
    let t = parse_data_type("text[]").unwrap();
    assert!(t.is_array);
    assert_eq!(t.name, TypeName::Text);
    assert_eq!(t.element(), DataType::TEXT);
}

#[test]
fn test_parse_decimal_type() {
    let t = parse_data_type("decimal(10, 5)").unwrap();
    assert_eq!(t.precision_scale(), Some((10, 5)));
    assert_eq!(t.to_string(), "decimal(10,5)");

    let fixed = parse_data_type("fixed(16,6)[]").unwrap();
    assert_eq!(fixed.name, TypeName::Decimal);
    assert!(fixed.is_array);
    assert_eq!(fixed.to_string(), "decimal(16,6)[]");
}

#[test]
fn test_parse_rejects_bad_types() {
    assert!(matches!(
        parse_data_type("float"),
        Err(CoreError::UnknownType { .. })
    ));
    assert!(parse_data_type("decimal").is_err());
    assert!(parse_data_type("decimal(5,10)").is_err());
    assert!(parse_data_type("int(1,2)").is_err());
    assert!(parse_data_type("null[]").is_err());
    assert!(parse_data_type("decimal(10").is_err());
}

#[test]
fn test_decimal_bounds() {
    assert!(DataType::decimal(1000, 0).is_ok());
    assert!(DataType::decimal(1001, 0).is_err());
    assert!(DataType::decimal(0, 0).is_err());
}

#[test]
fn test_loose_equality_ignores_metadata_and_null() {
    let a = DataType::decimal(10, 2).unwrap();
    let b = DataType::decimal(20, 4).unwrap();
    assert!(a.equals(&b));
    assert!(!a.equals_strict(&b));

    assert!(DataType::NULL.equals(&DataType::INT));
    assert!(DataType::INT.equals(&DataType::NULL));
    assert!(!DataType::NULL.equals_strict(&DataType::INT));
}

#[test]
fn test_unknown_matches_everything() {
    assert!(DataType::UNKNOWN.equals(&DataType::TEXT));
    assert!(DataType::UNKNOWN.equals_strict(&DataType::TEXT.array_of()));
}

#[test]
fn test_array_flag_is_significant() {
    assert!(!DataType::INT.equals(&DataType::INT.array_of()));
    assert!(!DataType::INT.array_of().is_numeric());
}

#[test]
fn test_numeric_kinds() {
    assert!(DataType::INT.is_numeric());
    assert!(DataType::UINT256.is_numeric());
    assert!(DataType::decimal(5, 1).unwrap().is_numeric());
    assert!(DataType::UNKNOWN.is_numeric());
    assert!(!DataType::TEXT.is_numeric());
    assert!(!DataType::BOOL.is_numeric());
}

#[test]
fn test_serde_shape() {
    let json = r#"{"name":"fixed","metadata":[10,5]}"#;
    let t: DataType = serde_json::from_str(json).unwrap();
    assert_eq!(t, DataType::decimal(10, 5).unwrap());

    let out = serde_json::to_string(&DataType::TEXT.array_of()).unwrap();
    assert_eq!(out, r#"{"name":"text","is_array":true}"#);
}
