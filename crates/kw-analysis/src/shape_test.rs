use super::*;

#[test]
fn test_shapes_match_by_type_and_arity() {
    let a = vec![
        Attribute::new("id", DataType::INT),
        Attribute::new("name", DataType::TEXT),
    ];
    let b = vec![
        Attribute::new("x", DataType::INT),
        Attribute::new("y", DataType::NULL),
    ];
    assert!(shapes_match(&a, &b));
    assert!(!shapes_match(&a, &b[..1]));

    let c = vec![
        Attribute::new("x", DataType::TEXT),
        Attribute::new("y", DataType::TEXT),
    ];
    assert!(!shapes_match(&a, &c));
}

#[test]
fn test_flatten_rejects_collisions() {
    let users = Relation::new("users", vec![Attribute::new("id", DataType::INT)]);
    let posts = Relation::new(
        "posts",
        vec![
            Attribute::new("id", DataType::INT),
            Attribute::new("body", DataType::TEXT),
        ],
    );
    let err = flatten(&[users.clone(), posts.clone()]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::AmbiguousColumn);

    let flat = flatten(&[posts]).unwrap();
    assert_eq!(flat.len(), 2);
}

#[test]
fn test_relation_find_is_case_insensitive() {
    let users = Relation::new("users", vec![Attribute::new("id", DataType::INT)]);
    assert!(users.find("ID").is_some());
    assert!(users.find("name").is_none());
}
