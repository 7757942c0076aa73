//! Scalar type system shared by the schema, AST, and analyzer

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest precision a decimal type may declare
pub const MAX_DECIMAL_PRECISION: u16 = 1000;

/// Scalar kinds understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeName {
    Int,
    Text,
    Bool,
    Blob,
    Uuid,
    Uint256,
    /// Fixed-point number; always carries `[precision, scale]` metadata
    #[serde(alias = "fixed", alias = "numeric")]
    Decimal,
    /// Type of the `NULL` literal, compatible with everything under loose equality
    Null,
    /// Placeholder used when a type cannot be known until runtime, or after an error
    Unknown,
}

impl TypeName {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeName::Int => "int",
            TypeName::Text => "text",
            TypeName::Bool => "bool",
            TypeName::Blob => "blob",
            TypeName::Uuid => "uuid",
            TypeName::Uint256 => "uint256",
            TypeName::Decimal => "decimal",
            TypeName::Null => "null",
            TypeName::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeName {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "int8" | "integer" => Ok(TypeName::Int),
            "text" => Ok(TypeName::Text),
            "bool" | "boolean" => Ok(TypeName::Bool),
            "blob" | "bytea" => Ok(TypeName::Blob),
            "uuid" => Ok(TypeName::Uuid),
            "uint256" => Ok(TypeName::Uint256),
            "decimal" | "fixed" | "numeric" => Ok(TypeName::Decimal),
            "null" => Ok(TypeName::Null),
            "unknown" => Ok(TypeName::Unknown),
            other => Err(CoreError::UnknownType {
                name: other.to_string(),
            }),
        }
    }
}

/// A scalar or array data type
///
/// `metadata` holds `[precision, scale]` and is only present on decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataType {
    pub name: TypeName,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<[u16; 2]>,
}

impl DataType {
    pub const INT: DataType = DataType::scalar(TypeName::Int);
    pub const TEXT: DataType = DataType::scalar(TypeName::Text);
    pub const BOOL: DataType = DataType::scalar(TypeName::Bool);
    pub const BLOB: DataType = DataType::scalar(TypeName::Blob);
    pub const UUID: DataType = DataType::scalar(TypeName::Uuid);
    pub const UINT256: DataType = DataType::scalar(TypeName::Uint256);
    pub const NULL: DataType = DataType::scalar(TypeName::Null);
    pub const UNKNOWN: DataType = DataType::scalar(TypeName::Unknown);

    /// A non-array type with no metadata
    pub const fn scalar(name: TypeName) -> Self {
        Self {
            name,
            is_array: false,
            metadata: None,
        }
    }

    /// A decimal type, validating precision and scale
    pub fn decimal(precision: u16, scale: u16) -> CoreResult<Self> {
        if precision == 0 || precision > MAX_DECIMAL_PRECISION {
            return Err(CoreError::InvalidDecimal {
                precision,
                scale,
                reason: format!("precision must be between 1 and {MAX_DECIMAL_PRECISION}"),
            });
        }
        if scale > precision {
            return Err(CoreError::InvalidDecimal {
                precision,
                scale,
                reason: "scale cannot exceed precision".to_string(),
            });
        }
        Ok(Self::decimal_unchecked(precision, scale))
    }

    /// A decimal type whose precision and scale are already known to be valid
    pub const fn decimal_unchecked(precision: u16, scale: u16) -> Self {
        Self {
            name: TypeName::Decimal,
            is_array: false,
            metadata: Some([precision, scale]),
        }
    }

    /// The array form of this type (metadata preserved)
    pub fn array_of(self) -> Self {
        Self {
            is_array: true,
            ..self
        }
    }

    /// The element type of an array (the type itself if it is not an array)
    pub fn element(self) -> Self {
        Self {
            is_array: false,
            ..self
        }
    }

    pub fn is_null(&self) -> bool {
        self.name == TypeName::Null
    }

    pub fn is_unknown(&self) -> bool {
        self.name == TypeName::Unknown
    }

    /// Int, decimal, uint256 and unknown scalars are numeric
    pub fn is_numeric(&self) -> bool {
        !self.is_array
            && matches!(
                self.name,
                TypeName::Int | TypeName::Decimal | TypeName::Uint256 | TypeName::Unknown
            )
    }

    pub fn precision_scale(&self) -> Option<(u16, u16)> {
        self.metadata.map(|[p, s]| (p, s))
    }

    /// Loose equality: `null` matches anything, `unknown` matches anything,
    /// and decimal precision/scale metadata is ignored.
    pub fn equals(&self, other: &DataType) -> bool {
        if self.is_null() || other.is_null() {
            return true;
        }
        if self.is_unknown() || other.is_unknown() {
            return true;
        }
        self.name == other.name && self.is_array == other.is_array
    }

    /// Strict equality: only `unknown` is a wildcard, and decimal metadata
    /// must match exactly.
    pub fn equals_strict(&self, other: &DataType) -> bool {
        if self.is_unknown() || other.is_unknown() {
            return true;
        }
        self.name == other.name && self.is_array == other.is_array && self.metadata == other.metadata
    }

    /// Validate that metadata and the array flag are legal for the type name
    pub fn validate(&self) -> CoreResult<()> {
        match self.name {
            TypeName::Decimal => match self.metadata {
                Some([p, s]) => Self::decimal(p, s).map(|_| ()),
                None => Err(CoreError::InvalidType {
                    name: self.to_string(),
                    reason: "decimal requires precision and scale".to_string(),
                }),
            },
            TypeName::Null | TypeName::Unknown if self.is_array => Err(CoreError::InvalidType {
                name: self.to_string(),
                reason: "type cannot be an array".to_string(),
            }),
            _ if self.metadata.is_some() => Err(CoreError::InvalidType {
                name: self.to_string(),
                reason: "type cannot have metadata".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some([p, s]) = self.metadata {
            write!(f, "({p},{s})")?;
        }
        if self.is_array {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

impl FromStr for DataType {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        parse_data_type(s)
    }
}

/// Parse a type string such as `int`, `text[]` or `decimal(10,5)`
pub fn parse_data_type(s: &str) -> CoreResult<DataType> {
    let trimmed = s.trim();
    let (body, is_array) = match trimmed.strip_suffix("[]") {
        Some(inner) => (inner.trim_end(), true),
        None => (trimmed, false),
    };

    let (name_part, metadata) = match body.find('(') {
        Some(open) => {
            let close = body.rfind(')').ok_or_else(|| CoreError::InvalidType {
                name: s.to_string(),
                reason: "unbalanced parenthesis".to_string(),
            })?;
            if close < open {
                return Err(CoreError::InvalidType {
                    name: s.to_string(),
                    reason: "unbalanced parenthesis".to_string(),
                });
            }
            let args: Vec<&str> = body[open + 1..close].split(',').map(str::trim).collect();
            let [p, sc] = args[..] else {
                return Err(CoreError::InvalidType {
                    name: s.to_string(),
                    reason: "expected (precision, scale)".to_string(),
                });
            };
            let parse_u16 = |v: &str| {
                v.parse::<u16>().map_err(|_| CoreError::InvalidType {
                    name: s.to_string(),
                    reason: format!("'{v}' is not a valid precision or scale"),
                })
            };
            (&body[..open], Some([parse_u16(p)?, parse_u16(sc)?]))
        }
        None => (body, None),
    };

    let data_type = DataType {
        name: name_part.parse()?,
        is_array,
        metadata,
    };
    data_type.validate()?;
    Ok(data_type)
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
