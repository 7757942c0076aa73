//! Default ordering injection
//!
//! Every SELECT statement receives ORDER BY terms that make its row order
//! depend on the data alone. The injected terms go after the user's terms,
//! carry an unknown position and sort `ASC NULLS LAST`.

use crate::analyzer::Analyzer;
use crate::error::{ErrorKind, FaultResult};
use crate::select::CoreFacts;
use crate::shape::Attribute;
use kw_sql::{Expr, NullOrder, OrderType, OrderingTerm, Position, SelectStatement};

/// Reference each result column by name, or by ordinal when it has none
fn result_column_terms(result: &[Attribute]) -> Vec<Expr> {
    result
        .iter()
        .enumerate()
        .map(|(i, attr)| {
            if attr.name.is_empty() {
                Expr::int(i as i64 + 1)
            } else {
                Expr::col(attr.name.clone())
            }
        })
        .collect()
}

impl<'s> Analyzer<'s> {
    /// Compute the ordering to append to `stmt`. Must run in the scope that
    /// holds the first core's joined tables.
    pub(crate) fn default_ordering(
        &mut self,
        stmt: &SelectStatement,
        result: &[Attribute],
        facts: &CoreFacts,
        any_group_by: bool,
    ) -> FaultResult<Vec<OrderingTerm>> {
        let exprs = if stmt.is_compound() {
            if any_group_by {
                self.error(
                    ErrorKind::Aggregate,
                    stmt.pos,
                    "cannot use group by in compound select",
                );
                return Ok(Vec::new());
            }
            result_column_terms(result)
        } else if facts.grouped {
            stmt.cores[0]
                .group_by
                .iter()
                .map(|e| e.clone().with_pos(Position::UNKNOWN))
                .collect()
        } else if facts.has_aggregate {
            Vec::new()
        } else if facts.distinct {
            result_column_terms(result)
        } else {
            let mut exprs = Vec::new();
            for (name, table) in &self.sql.joined_tables {
                for column in table.primary_key()? {
                    exprs.push(Expr::qualified(name.clone(), column));
                }
            }
            exprs
        };

        log::debug!("injecting {} ordering term(s)", exprs.len());
        Ok(exprs
            .into_iter()
            .map(|expr| OrderingTerm {
                pos: Position::UNKNOWN,
                expr,
                order: Some(OrderType::Asc),
                nulls: Some(NullOrder::Last),
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "ordering_test.rs"]
mod tests;
