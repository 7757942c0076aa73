//! kw-core - Core library for the Kuneiform analyzer
//!
//! This crate provides the scalar data type model, the schema model
//! (tables, actions, procedures, foreign procedures and extensions), and
//! the analyzer configuration shared by the AST and analysis crates.

pub mod config;
pub mod error;
pub mod schema;
pub mod types;

pub use config::AnalyzerConfig;
pub use error::{CoreError, CoreResult};
pub use schema::{
    Action, Attribute, AttributeType, Column, Extension, ExtensionConfig, ForeignProcedure, Index,
    IndexType, Modifier, NamedType, Procedure, ProcedureParameter, ProcedureReturn, Schema, Table,
};
pub use types::{parse_data_type, DataType, TypeName};
