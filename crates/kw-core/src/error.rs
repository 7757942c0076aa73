//! Error types for kw-core

use thiserror::Error;

/// Core error type for schema and configuration handling
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse a YAML document
    #[error("[E002] Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Failed to parse a JSON document
    #[error("[E004] Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// E005: Unknown scalar type name
    #[error("[E005] Unknown data type: {name}")]
    UnknownType { name: String },

    /// E006: Decimal precision or scale out of range
    #[error("[E006] Invalid decimal precision/scale ({precision},{scale}): {reason}")]
    InvalidDecimal {
        precision: u16,
        scale: u16,
        reason: String,
    },

    /// E007: Type metadata or array flag not allowed for this type
    #[error("[E007] Invalid data type '{name}': {reason}")]
    InvalidType { name: String, reason: String },

    // Schema error types (SCH001-SCH006)
    /// SCH001: Two schema objects share a name
    #[error("[SCH001] Duplicate name '{name}' in schema '{schema}'")]
    DuplicateName { schema: String, name: String },

    /// SCH002: Table has no primary key
    #[error("[SCH002] Table '{table}' has no primary key")]
    MissingPrimaryKey { table: String },

    /// SCH003: Table declares more than one primary key
    #[error("[SCH003] Table '{table}' declares more than one primary key")]
    MultiplePrimaryKeys { table: String },

    /// SCH004: Index or key references a column the table does not have
    #[error("[SCH004] Column '{column}' not found in table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// SCH005: Empty identifier
    #[error("[SCH005] Empty identifier in {context}")]
    EmptyIdentifier { context: String },

    /// SCH006: Schema file extension not recognized
    #[error("[SCH006] Unsupported schema file '{path}': expected .json, .yml or .yaml")]
    UnsupportedSchemaFile { path: String },

    /// E008: IO error with file path context
    #[error("[E008] IO error on {path}: {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
