//! Join safety
//!
//! A join may not multiply rows: its condition must be one `=` comparison
//! with a column that is unique in its table on at least one side.

use crate::aggregate::{check_where, ClauseScan};
use crate::analyzer::Analyzer;
use crate::error::{ErrorKind, FaultResult, Rejection};
use kw_core::DataType;
use kw_sql::{ColumnExpr, ComparisonOp, Expr, Join};

fn strip_parens(mut e: &Expr) -> &Expr {
    while let Expr::Paren(p) = e {
        e = &p.inner;
    }
    e
}

fn as_column(e: &Expr) -> Option<&ColumnExpr> {
    match strip_parens(e) {
        Expr::Column(c) => Some(c),
        _ => None,
    }
}

impl<'s> Analyzer<'s> {
    pub(crate) fn join_clause(&mut self, join: &mut Join) -> FaultResult<()> {
        self.relation(&mut join.relation)?;

        let before = self.errs.len();
        let pos = join.on.pos();
        let mut scan = ClauseScan::new();
        let t = self.scalar(&mut join.on, &mut scan)?;
        if let Err(rej) = check_where(&scan) {
            self.reject(rej, pos);
        }
        self.expect_type(pos, &t, &DataType::BOOL);

        if self.errs.len() == before {
            if let Err(rej) = self.check_join_safety(&join.on) {
                self.reject(rej, pos);
            }
        }
        Ok(())
    }

    fn check_join_safety(&self, on: &Expr) -> Result<(), Rejection> {
        let Expr::Comparison(cmp) = strip_parens(on) else {
            return Err(Rejection::new(
                ErrorKind::Join,
                "join condition must be a single equality comparison",
            ));
        };
        if cmp.op != ComparisonOp::Equal {
            return Err(Rejection::new(
                ErrorKind::Join,
                format!("join condition must use \"=\", received \"{}\"", cmp.op),
            ));
        }

        let columns: Vec<&ColumnExpr> = [&*cmp.left, &*cmp.right]
            .into_iter()
            .filter_map(as_column)
            .collect();
        if columns.is_empty() {
            return Err(Rejection::new(
                ErrorKind::Join,
                "join condition must compare at least one column",
            ));
        }

        if columns
            .iter()
            .any(|c| self.sql.col_is_unique(c.table.as_deref(), &c.column))
        {
            Ok(())
        } else {
            Err(Rejection::new(
                ErrorKind::Join,
                "join condition must reference a unique or primary key column on at least one side",
            ))
        }
    }
}

#[cfg(test)]
#[path = "join_test.rs"]
mod tests;
