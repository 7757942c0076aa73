//! Analyzer configuration

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Postgres truncates identifiers at 63 bytes
const POSTGRES_MAX_IDENTIFIER: usize = 63;

/// Options that tune semantic analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Prefix procedure errors with the procedure name and log the names
    /// of procedures that failed analysis
    #[serde(default)]
    pub log_name_on_error: bool,

    /// Longest accepted variable, receiver or alias name
    #[serde(default = "default_max_identifier_length")]
    pub max_identifier_length: usize,

    /// Collation names accepted by `COLLATE`
    #[serde(default = "default_collations")]
    pub collations: Vec<String>,
}

fn default_max_identifier_length() -> usize {
    32
}

fn default_collations() -> Vec<String> {
    vec!["nocase".to_string()]
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            log_name_on_error: false,
            max_identifier_length: default_max_identifier_length(),
            collations: default_collations(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml_str(s: &str) -> CoreResult<Self> {
        // an empty document means "all defaults"
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: AnalyzerConfig = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Whether `name` is an accepted collation (case-insensitive)
    pub fn is_collation_allowed(&self, name: &str) -> bool {
        self.collations.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    fn validate(&mut self) -> CoreResult<()> {
        if self.max_identifier_length == 0
            || self.max_identifier_length > POSTGRES_MAX_IDENTIFIER
        {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "max_identifier_length must be between 1 and {POSTGRES_MAX_IDENTIFIER}, got {}",
                    self.max_identifier_length
                ),
            });
        }

        if self.collations.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "At least one collation must be allowed".to_string(),
            });
        }

        for collation in &mut self.collations {
            *collation = collation.trim().to_lowercase();
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
