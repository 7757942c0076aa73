use super::*;
use std::io::Write;

#[test]
fn test_parse_minimal_config() {
    let config = AnalyzerConfig::from_yaml_str("log_name_on_error: true").unwrap();
    assert!(config.log_name_on_error);
    assert_eq!(config.max_identifier_length, 32);
    assert_eq!(config.collations, vec!["nocase".to_string()]);
}

#[test]
fn test_empty_config_uses_defaults() {
    let config = AnalyzerConfig::from_yaml_str("").unwrap();
    assert_eq!(config, AnalyzerConfig::default());
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
log_name_on_error: false
max_identifier_length: 48
collations:
  - NoCase
  - C
"#;
    let config = AnalyzerConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.max_identifier_length, 48);
    assert_eq!(config.collations, vec!["nocase".to_string(), "c".to_string()]);
    assert!(config.is_collation_allowed("NOCASE"));
    assert!(!config.is_collation_allowed("binary"));
}

#[test]
fn test_unknown_field_rejected() {
    let err = AnalyzerConfig::from_yaml_str("log_names: true").unwrap_err();
    assert!(matches!(err, CoreError::YamlParse(_)));
}

#[test]
fn test_invalid_identifier_length() {
    let err = AnalyzerConfig::from_yaml_str("max_identifier_length: 0").unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));

    let err = AnalyzerConfig::from_yaml_str("max_identifier_length: 64").unwrap_err();
    assert!(err.to_string().contains("[E003]"));
}

#[test]
fn test_empty_collations_rejected() {
    let err = AnalyzerConfig::from_yaml_str("collations: []").unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_load_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analyzer.yml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "log_name_on_error: true").unwrap();

    let config = AnalyzerConfig::load(&path).unwrap();
    assert!(config.log_name_on_error);

    let missing = dir.path().join("missing.yml");
    assert!(matches!(
        AnalyzerConfig::load(&missing),
        Err(CoreError::ConfigNotFound { .. })
    ));
}
