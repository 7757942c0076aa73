//! Scoping structures for SQL statements and procedural blocks

use crate::error::{AnalysisFault, ErrorKind, FaultResult, Rejection};
use crate::shape::{Attribute, Relation};
use kw_core::{DataType, Procedure, Table};
use std::collections::BTreeMap;

/// Build the relation a physical table exposes under `name`
pub(crate) fn table_relation(name: &str, table: &Table) -> Relation {
    Relation::new(
        name,
        table
            .columns
            .iter()
            .map(|c| Attribute::new(c.name.clone(), c.data_type))
            .collect(),
    )
}

/// The table targeted by an INSERT, UPDATE or DELETE
#[derive(Debug, Clone)]
pub(crate) struct TargetTable<'s> {
    /// Alias, or the table name when there is none
    pub name: String,
    pub table: &'s Table,
}

/// Per-statement SQL scope
#[derive(Debug, Clone, Default)]
pub(crate) struct SqlContext<'s> {
    /// Relations visible for column resolution, in join order
    pub joined_relations: Vec<Relation>,
    /// Relations of enclosing queries
    pub outer_relations: Vec<Relation>,
    /// Physical tables joined in this scope, keyed by alias or name
    pub joined_tables: BTreeMap<String, &'s Table>,
    /// Visible in every nested scope
    pub ctes: Vec<Relation>,
    outer_scope: Option<Box<SqlContext<'s>>>,
    /// Resolving the DO UPDATE part of an upsert
    pub in_conflict: bool,
    pub target_table: Option<TargetTable<'s>>,
    /// An unaliased subquery or procedure is the FROM relation of this scope
    pub has_anonymous_table: bool,
    pub in_select: bool,
}

impl<'s> SqlContext<'s> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a physical table under `name`
    pub fn join(&mut self, name: &str, table: &'s Table) -> Result<(), Rejection> {
        if self.joined_tables.contains_key(name) {
            return Err(already_joined(name));
        }
        self.joined_tables.insert(name.to_string(), table);
        Ok(())
    }

    /// Register a relation for column resolution
    pub fn join_relation(&mut self, relation: Relation) -> Result<(), Rejection> {
        if self.joined_relations.iter().any(|r| r.name == relation.name) {
            return Err(already_joined(&relation.name));
        }
        self.joined_relations.push(relation);
        Ok(())
    }

    pub fn find_cte(&self, name: &str) -> Option<&Relation> {
        self.ctes.iter().find(|c| c.name == name)
    }

    fn visible_relations(&self) -> impl Iterator<Item = &Relation> {
        self.joined_relations.iter().chain(&self.outer_relations)
    }

    /// Resolve a column to the name of its relation and its attribute.
    ///
    /// Unqualified names are searched in the joined relations first and must
    /// match exactly once there. Outer relations are only consulted when no
    /// joined relation has the column, so inner columns shadow outer ones.
    pub fn find_attribute(
        &self,
        table: Option<&str>,
        column: &str,
    ) -> Result<(String, Attribute), Rejection> {
        if let Some(table) = table {
            let rel = self
                .visible_relations()
                .find(|r| r.name == table)
                .ok_or_else(|| {
                    Rejection::new(
                        ErrorKind::UnknownTable,
                        format!("table \"{table}\" is not joined in this scope"),
                    )
                })?;
            let attr = rel.find(column).ok_or_else(|| {
                Rejection::new(
                    ErrorKind::UnknownColumn,
                    format!("column \"{column}\" not found in table \"{table}\""),
                )
            })?;
            return Ok((rel.name.clone(), attr.clone()));
        }

        match unique_match(&self.joined_relations, column)? {
            Some(found) => Ok(found),
            None => unique_match(&self.outer_relations, column)?.ok_or_else(|| {
                Rejection::new(
                    ErrorKind::UnknownColumn,
                    format!("column \"{column}\" not found"),
                )
            }),
        }
    }

    /// Resolve a column against the physical tables joined in this scope
    pub fn find_column(&self, table: Option<&str>, column: &str) -> Option<&'s Table> {
        match table {
            Some(name) => self
                .joined_tables
                .get(name)
                .copied()
                .filter(|t| t.find_column(column).is_some()),
            None => {
                let mut matches = self
                    .joined_tables
                    .values()
                    .copied()
                    .filter(|t| t.find_column(column).is_some());
                let first = matches.next();
                match matches.next() {
                    Some(_) => None,
                    None => first,
                }
            }
        }
    }

    /// Whether the column identifies at most one row of its physical table
    pub fn col_is_unique(&self, table: Option<&str>, column: &str) -> bool {
        self.find_column(table, column)
            .is_some_and(|t| t.is_unique_column(column))
    }

    /// Enter a nested query: everything visible now becomes outer
    pub fn scope(&mut self) {
        let saved = SqlContext {
            joined_relations: self.joined_relations.clone(),
            outer_relations: self.outer_relations.clone(),
            joined_tables: self.joined_tables.clone(),
            ctes: Vec::new(),
            outer_scope: self.outer_scope.take(),
            in_conflict: self.in_conflict,
            target_table: self.target_table.clone(),
            has_anonymous_table: self.has_anonymous_table,
            in_select: self.in_select,
        };

        let joined = std::mem::take(&mut self.joined_relations);
        self.outer_relations.extend(joined);
        self.joined_tables.clear();
        self.has_anonymous_table = false;
        self.outer_scope = Some(Box::new(saved));
    }

    /// Leave a nested query, restoring the scope saved by [`Self::scope`]
    pub fn pop_scope(&mut self) -> FaultResult<()> {
        let saved = self.outer_scope.take().ok_or(AnalysisFault::ScopeUnderflow)?;
        let ctes = std::mem::take(&mut self.ctes);
        *self = *saved;
        self.ctes = ctes;
        Ok(())
    }
}

fn already_joined(name: &str) -> Rejection {
    Rejection::new(
        ErrorKind::TableAlreadyJoined,
        format!("table \"{name}\" is already joined in this scope"),
    )
}

/// Variables visible in a procedural block
#[derive(Debug, Clone, Default)]
pub(crate) struct BlockContext {
    /// Scalar `$` and `@` variables
    pub variables: BTreeMap<String, DataType>,
    /// Record-shaped variables bound by SQL loop receivers
    pub anonymous_variables: BTreeMap<String, BTreeMap<String, DataType>>,
}

impl BlockContext {
    pub fn is_declared(&self, name: &str) -> bool {
        self.variables.contains_key(name) || self.anonymous_variables.contains_key(name)
    }
}

/// A loop receiver seen anywhere in a procedure
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LoopReceiver {
    pub name: String,
    /// `None` for record receivers of SQL loops
    pub data_type: Option<DataType>,
}

/// State of the procedure being analyzed
#[derive(Debug, Clone)]
pub(crate) struct ProcedureContext<'s> {
    pub procedure: &'s Procedure,
    /// Receivers of the loops enclosing the current statement, innermost last
    pub active_loop_receivers: Vec<String>,
    /// Types of call results discarded with `_`, in order
    pub anonymous_receivers: Vec<DataType>,
    pub all_loop_receivers: Vec<LoopReceiver>,
    /// Every variable declared anywhere in the procedure
    pub all_variables: BTreeMap<String, DataType>,
}

impl<'s> ProcedureContext<'s> {
    pub fn new(procedure: &'s Procedure) -> Self {
        Self {
            procedure,
            active_loop_receivers: Vec::new(),
            anonymous_receivers: Vec::new(),
            all_loop_receivers: Vec::new(),
            all_variables: BTreeMap::new(),
        }
    }
}

/// The single relation in `relations` holding `column`, if any
fn unique_match(
    relations: &[Relation],
    column: &str,
) -> Result<Option<(String, Attribute)>, Rejection> {
    let mut found: Option<(String, Attribute)> = None;
    for rel in relations {
        if let Some(attr) = rel.find(column) {
            if found.is_some() {
                return Err(Rejection::new(
                    ErrorKind::AmbiguousColumn,
                    format!("column \"{column}\" is ambiguous"),
                ));
            }
            found = Some((rel.name.clone(), attr.clone()));
        }
    }
    Ok(found)
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
