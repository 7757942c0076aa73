//! Schema model: tables, actions, procedures, foreign procedures and extensions
//!
//! A schema is immutable while it is being analyzed. Identifiers are
//! case-insensitive; [`Schema::validate`] folds them to lowercase and all
//! lookups compare case-insensitively.

use crate::error::{CoreError, CoreResult};
use crate::types::DataType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Column constraint kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributeType {
    PrimaryKey,
    Unique,
    NotNull,
    Default,
    Min,
    Max,
    MinLength,
    MaxLength,
}

/// A column constraint with its optional argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub kind: AttributeType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Column {
    pub fn has_attribute(&self, kind: AttributeType) -> bool {
        self.attributes.iter().any(|a| a.kind == kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexType {
    Btree,
    UniqueBtree,
    Primary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(rename = "type")]
    pub kind: IndexType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub indexes: Vec<Index>,
}

impl Table {
    /// Case-insensitive column lookup
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Primary key columns, from an inline PRIMARY_KEY attribute or a primary index
    pub fn primary_key(&self) -> CoreResult<Vec<String>> {
        let inline: Vec<&Column> = self
            .columns
            .iter()
            .filter(|c| c.has_attribute(AttributeType::PrimaryKey))
            .collect();
        let indexes: Vec<&Index> = self
            .indexes
            .iter()
            .filter(|i| i.kind == IndexType::Primary)
            .collect();

        match (inline.as_slice(), indexes.as_slice()) {
            ([col], []) => Ok(vec![col.name.clone()]),
            ([], [idx]) => Ok(idx.columns.clone()),
            ([], []) => Err(CoreError::MissingPrimaryKey {
                table: self.name.clone(),
            }),
            _ => Err(CoreError::MultiplePrimaryKeys {
                table: self.name.clone(),
            }),
        }
    }

    /// Whether a column alone identifies a row.
    ///
    /// True for UNIQUE columns, a single-column primary key, or a
    /// single-column unique index. Composite keys never count.
    pub fn is_unique_column(&self, column: &str) -> bool {
        let Some(col) = self.find_column(column) else {
            return false;
        };
        if col.has_attribute(AttributeType::Unique) || col.has_attribute(AttributeType::PrimaryKey)
        {
            return true;
        }
        self.indexes.iter().any(|idx| {
            matches!(idx.kind, IndexType::Primary | IndexType::UniqueBtree)
                && idx.columns.len() == 1
                && idx.columns[0].eq_ignore_ascii_case(column)
        })
    }
}

/// Access modifiers for actions and procedures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modifier {
    /// Read-only: must never mutate state
    View,
    Authenticated,
    Owner,
}

/// A legacy inline-SQL action. Parameters are untyped `$names`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub body: String,
}

impl Action {
    pub fn is_view(&self) -> bool {
        self.modifiers.contains(&Modifier::View)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
}

/// A single named field of a procedure's return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedType {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
}

/// Declared return shape: a list of scalars, or a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureReturn {
    #[serde(default)]
    pub is_table: bool,
    pub fields: Vec<NamedType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ProcedureParameter>,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub body: String,
    #[serde(default, rename = "return_types")]
    pub returns: Option<ProcedureReturn>,
}

impl Procedure {
    pub fn is_view(&self) -> bool {
        self.modifiers.contains(&Modifier::View)
    }
}

/// A procedure in another schema, called dynamically by target and name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignProcedure {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<DataType>,
    #[serde(default)]
    pub returns: Option<ProcedureReturn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionConfig {
    #[serde(rename = "name")]
    pub key: String,
    pub value: String,
}

/// An extension instance, referenced in actions by its alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub name: String,
    #[serde(default)]
    pub initialization: Vec<ExtensionConfig>,
    pub alias: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<Extension>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub procedures: Vec<Procedure>,
    #[serde(default, rename = "foreign_calls")]
    pub foreign_procedures: Vec<ForeignProcedure>,
}

impl Schema {
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn find_procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn find_foreign_procedure(&self, name: &str) -> Option<&ForeignProcedure> {
        self.foreign_procedures
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn find_action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Look up an extension by the alias actions use to reference it
    pub fn find_extension(&self, alias: &str) -> Option<&Extension> {
        self.extensions
            .iter()
            .find(|e| e.alias.eq_ignore_ascii_case(alias))
    }

    /// Parse a schema from JSON and validate it
    pub fn from_json_str(s: &str) -> CoreResult<Self> {
        let mut schema: Schema = serde_json::from_str(s)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Parse a schema from YAML and validate it
    pub fn from_yaml_str(s: &str) -> CoreResult<Self> {
        let mut schema: Schema = serde_yaml::from_str(s)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Load a schema file; the extension selects JSON or YAML
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yml") | Some("yaml") => Self::from_yaml_str(&content),
            _ => Err(CoreError::UnsupportedSchemaFile {
                path: path.display().to_string(),
            }),
        }
    }

    /// Normalize identifiers and check structural well-formedness.
    ///
    /// Every table must have exactly one primary key, and names must be
    /// unique across tables, procedures, actions and foreign procedures.
    pub fn validate(&mut self) -> CoreResult<()> {
        self.name = clean_ident(&self.name, "schema name")?;

        let mut seen = HashSet::new();
        let mut check_name = |schema: &str, name: &str| -> CoreResult<()> {
            if !seen.insert(name.to_string()) {
                return Err(CoreError::DuplicateName {
                    schema: schema.to_string(),
                    name: name.to_string(),
                });
            }
            Ok(())
        };

        for table in &mut self.tables {
            table.name = clean_ident(&table.name, "table name")?;
            check_name(&self.name, &table.name)?;
            validate_table(table)?;
        }
        for proc in &mut self.procedures {
            proc.name = clean_ident(&proc.name, "procedure name")?;
            check_name(&self.name, &proc.name)?;
            for param in &mut proc.parameters {
                param.name = param.name.trim().to_lowercase();
                param.data_type.validate()?;
            }
            if let Some(ret) = &mut proc.returns {
                for field in &mut ret.fields {
                    field.name = field.name.trim().to_lowercase();
                    field.data_type.validate()?;
                }
            }
        }
        for action in &mut self.actions {
            action.name = clean_ident(&action.name, "action name")?;
            check_name(&self.name, &action.name)?;
            for param in &mut action.parameters {
                *param = param.trim().to_lowercase();
            }
        }
        for foreign in &mut self.foreign_procedures {
            foreign.name = clean_ident(&foreign.name, "foreign procedure name")?;
            check_name(&self.name, &foreign.name)?;
        }
        for ext in &mut self.extensions {
            ext.alias = clean_ident(&ext.alias, "extension alias")?;
        }

        log::debug!(
            "Validated schema '{}': {} tables, {} procedures, {} actions",
            self.name,
            self.tables.len(),
            self.procedures.len(),
            self.actions.len()
        );
        Ok(())
    }
}

fn validate_table(table: &mut Table) -> CoreResult<()> {
    for col in &mut table.columns {
        col.name = clean_ident(&col.name, "column name")?;
        col.data_type.validate()?;
    }
    for idx in &mut table.indexes {
        for col in &mut idx.columns {
            *col = col.trim().to_lowercase();
        }
    }
    for idx in &table.indexes {
        if let Some(missing) = idx.columns.iter().find(|c| table.find_column(c).is_none()) {
            return Err(CoreError::UnknownColumn {
                table: table.name.clone(),
                column: missing.clone(),
            });
        }
    }
    table.primary_key().map(|_| ())
}

fn clean_ident(ident: &str, context: &str) -> CoreResult<String> {
    let cleaned = ident.trim().to_lowercase();
    if cleaned.is_empty() {
        return Err(CoreError::EmptyIdentifier {
            context: context.to_string(),
        });
    }
    Ok(cleaned)
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
