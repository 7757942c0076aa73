//! Result shapes produced by resolving expressions and relations

use crate::error::{ErrorKind, Rejection};
use kw_core::DataType;
use std::collections::{BTreeMap, HashSet};

/// A named, typed column of a relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub data_type: DataType,
}

impl Attribute {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A relation visible for column resolution: a table, CTE, subquery or
/// table-returning call, under the name it was joined as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl Relation {
    pub fn new(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    pub fn find(&self, column: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(column))
    }
}

/// What an expression evaluates to
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Scalar(DataType),
    /// Rows, from a table-returning procedure call
    Relation(Vec<Attribute>),
    /// Several scalar values, from a multi-value procedure return
    TypeList(Vec<DataType>),
    /// A record bound by a SQL loop receiver
    Composite(BTreeMap<String, DataType>),
    /// A call that returns nothing
    Unit,
}

impl Shape {
    pub fn scalar(&self) -> Option<DataType> {
        match self {
            Shape::Scalar(t) => Some(*t),
            _ => None,
        }
    }
}

/// Two relation shapes match when they have the same arity and pairwise
/// loosely-equal column types
pub fn shapes_match(a: &[Attribute], b: &[Attribute]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| x.data_type.equals(&y.data_type))
}

/// Merge relations into one attribute list. Column names must be unique
/// across all of them.
pub fn flatten(relations: &[Relation]) -> Result<Vec<Attribute>, Rejection> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for rel in relations {
        for attr in &rel.attributes {
            if !seen.insert(attr.name.clone()) {
                return Err(Rejection::new(
                    ErrorKind::AmbiguousColumn,
                    format!(
                        "column \"{}\" is returned by more than one relation",
                        attr.name
                    ),
                ));
            }
            out.push(attr.clone());
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "shape_test.rs"]
mod tests;
