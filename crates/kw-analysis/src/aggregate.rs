//! Aggregate usage rules
//!
//! Each clause of a select core (WHERE, each GROUP BY term, HAVING, each
//! result column, each ORDER BY term) is resolved with a fresh
//! [`ClauseScan`]. The resolver records into it which columns it met inside
//! and outside aggregate calls, and the rules below read it afterwards.

use crate::error::{ErrorKind, Rejection};
use crate::shape::Attribute;

/// A column resolved to the relation it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnRef {
    pub relation: String,
    pub column: String,
}

/// What the resolver saw while resolving one clause
#[derive(Debug, Clone, Default)]
pub(crate) struct ClauseScan {
    /// Resolving the arguments of an aggregate call
    pub in_aggregate: bool,
    pub contains_aggregate: bool,
    pub columns_in_aggregate: Vec<ColumnRef>,
    pub columns_outside_aggregate: Vec<ColumnRef>,
    /// Set for ORDER BY terms: the result columns, searched first for
    /// unqualified names
    pub ordering: Option<Vec<Attribute>>,
}

impl ClauseScan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ordering(result_columns: Vec<Attribute>) -> Self {
        Self {
            ordering: Some(result_columns),
            ..Self::default()
        }
    }

    pub fn in_ordering(&self) -> bool {
        self.ordering.is_some()
    }

    pub fn record_column(&mut self, column: ColumnRef) {
        if self.in_aggregate {
            self.columns_in_aggregate.push(column);
        } else {
            self.columns_outside_aggregate.push(column);
        }
    }

    /// Enter the arguments of an aggregate call. Returns the mark to pass
    /// to [`Self::leave_aggregate`].
    pub fn enter_aggregate(&mut self) -> Result<usize, Rejection> {
        self.contains_aggregate = true;
        if self.in_aggregate {
            return Err(Rejection::new(
                ErrorKind::Aggregate,
                "aggregate function calls cannot be nested",
            ));
        }
        self.in_aggregate = true;
        Ok(self.columns_in_aggregate.len())
    }

    /// Leave an aggregate call; its arguments may reference at most one column
    pub fn leave_aggregate(&mut self, mark: usize) -> Result<(), Rejection> {
        self.in_aggregate = false;
        let args = &self.columns_in_aggregate[mark..];
        match args.first() {
            Some(first) if args.iter().any(|c| c != first) => Err(Rejection::new(
                ErrorKind::Aggregate,
                "aggregate function can only reference one column",
            )),
            _ => Ok(()),
        }
    }
}

pub(crate) fn check_where(scan: &ClauseScan) -> Result<(), Rejection> {
    if scan.contains_aggregate {
        return Err(Rejection::new(
            ErrorKind::Aggregate,
            "cannot use aggregate function in WHERE",
        ));
    }
    Ok(())
}

/// The columns named by a core's GROUP BY clause
#[derive(Debug, Clone, Default)]
pub(crate) struct GroupBy {
    pub columns: Vec<ColumnRef>,
}

impl GroupBy {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn contains(&self, column: &ColumnRef) -> bool {
        self.columns.contains(column)
    }

    /// Validate one GROUP BY term and remember its column
    pub fn add_term(&mut self, scan: &ClauseScan) -> Result<(), Rejection> {
        if scan.contains_aggregate {
            return Err(Rejection::new(
                ErrorKind::Aggregate,
                "cannot use aggregate function in group by",
            ));
        }
        let [column] = scan.columns_outside_aggregate.as_slice() else {
            return Err(Rejection::new(
                ErrorKind::Aggregate,
                "group by must reference exactly one column",
            ));
        };
        if self.contains(column) {
            return Err(Rejection::new(
                ErrorKind::Aggregate,
                format!(
                    "cannot use column \"{}\" in group by more than once",
                    column.column
                ),
            ));
        }
        self.columns.push(column.clone());
        Ok(())
    }

    /// HAVING may only use grouped columns, inside or outside aggregates
    pub fn check_having(&self, scan: &ClauseScan) -> Vec<Rejection> {
        let mut errs = Vec::new();
        for col in &scan.columns_outside_aggregate {
            if !self.contains(col) {
                errs.push(Rejection::new(
                    ErrorKind::Aggregate,
                    format!(
                        "column \"{}\" used in having must be in group by, or must be in aggregate function",
                        col.column
                    ),
                ));
            }
        }
        for col in &scan.columns_in_aggregate {
            if !self.contains(col) {
                errs.push(Rejection::new(
                    ErrorKind::Aggregate,
                    format!(
                        "column \"{}\" used in aggregate function in having must be in group by",
                        col.column
                    ),
                ));
            }
        }
        errs
    }

    /// A result column of a grouped core: aggregated columns must not be
    /// grouped, bare columns must be
    pub fn check_result_column(&self, scan: &ClauseScan) -> Vec<Rejection> {
        let mut errs = Vec::new();
        for col in &scan.columns_in_aggregate {
            if self.contains(col) {
                errs.push(Rejection::new(
                    ErrorKind::Aggregate,
                    format!(
                        "cannot use column \"{}\" in aggregate function and in group by",
                        col.column
                    ),
                ));
            }
        }
        for col in &scan.columns_outside_aggregate {
            if !self.contains(col) {
                errs.push(Rejection::new(
                    ErrorKind::Aggregate,
                    format!(
                        "column \"{}\" used outside aggregate must be included in group by",
                        col.column
                    ),
                ));
            }
        }
        errs
    }
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
