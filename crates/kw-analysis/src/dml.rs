//! INSERT, UPDATE and DELETE

use crate::aggregate::{check_where, ClauseScan};
use crate::analyzer::Analyzer;
use crate::context::{table_relation, TargetTable};
use crate::error::{ErrorKind, FaultResult};
use kw_core::{DataType, Table};
use kw_sql::{
    DeleteStatement, Expr, InsertStatement, Position, UpdateSetClause, UpdateStatement,
    UpsertClause,
};

impl<'s> Analyzer<'s> {
    /// A WHERE-like condition: bool, without aggregates
    pub(crate) fn condition(&mut self, cond: &mut Expr) -> FaultResult<()> {
        let pos = cond.pos();
        let mut scan = ClauseScan::new();
        let t = self.scalar(cond, &mut scan)?;
        if let Err(rej) = check_where(&scan) {
            self.reject(rej, pos);
        }
        self.expect_type(pos, &t, &DataType::BOOL);
        Ok(())
    }

    /// Look up the table a statement writes to and remember it as the target
    fn target(&mut self, table: &str, alias: Option<&str>, pos: Position) -> Option<(String, &'s Table)> {
        let schema = self.schema;
        let Some(found) = schema.find_table(table) else {
            self.error(
                ErrorKind::UnknownTable,
                pos,
                format!("unknown table \"{table}\""),
            );
            return None;
        };
        if let Some(alias) = alias {
            self.check_identifier(alias, pos);
        }

        let name = alias.unwrap_or(table).to_string();
        self.sql.target_table = Some(TargetTable {
            name: name.clone(),
            table: found,
        });
        Some((name, found))
    }

    fn join_target(&mut self, name: &str, table: &'s Table, pos: Position) {
        if let Err(rej) = self.sql.join(name, table) {
            self.reject(rej, pos);
            return;
        }
        if let Err(rej) = self.sql.join_relation(table_relation(name, table)) {
            self.reject(rej, pos);
        }
    }

    fn set_clauses(&mut self, set: &mut [UpdateSetClause], table: &Table) -> FaultResult<()> {
        for clause in set {
            let t = self.scalar(&mut clause.value, &mut ClauseScan::new())?;
            match table.find_column(&clause.column) {
                Some(column) => {
                    self.expect_equal(clause.pos, &t, &column.data_type);
                }
                None => self.error(
                    ErrorKind::UnknownColumn,
                    clause.pos,
                    format!(
                        "column \"{}\" not found in table \"{}\"",
                        clause.column, table.name
                    ),
                ),
            }
        }
        Ok(())
    }

    pub(crate) fn insert(&mut self, insert: &mut InsertStatement) -> FaultResult<()> {
        self.effect.mark();
        let Some((name, table)) = self.target(&insert.table, insert.alias.as_deref(), insert.pos)
        else {
            return Ok(());
        };

        let types: Vec<DataType> = if insert.columns.is_empty() {
            table.columns.iter().map(|c| c.data_type).collect()
        } else {
            let mut types = Vec::with_capacity(insert.columns.len());
            for column in &insert.columns {
                match table.find_column(column) {
                    Some(c) => types.push(c.data_type),
                    None => {
                        self.error(
                            ErrorKind::UnknownColumn,
                            insert.pos,
                            format!("column \"{column}\" not found in table \"{}\"", table.name),
                        );
                        types.push(DataType::UNKNOWN);
                    }
                }
            }
            types
        };

        for row in &mut insert.values {
            if row.len() != types.len() {
                self.error(
                    ErrorKind::ResultShape,
                    insert.pos,
                    format!("expected {} values, received {}", types.len(), row.len()),
                );
            }
            for (i, value) in row.iter_mut().enumerate() {
                let pos = value.pos();
                let t = self.scalar(value, &mut ClauseScan::new())?;
                if let Some(want) = types.get(i) {
                    self.expect_equal(pos, &t, want);
                }
            }
        }

        if let Some(upsert) = &mut insert.upsert {
            self.upsert(upsert, &name, table)?;
        }
        Ok(())
    }

    fn upsert(&mut self, upsert: &mut UpsertClause, name: &str, table: &'s Table) -> FaultResult<()> {
        self.join_target(name, table, upsert.pos);

        for column in &upsert.conflict_columns {
            if table.find_column(column).is_none() {
                self.error(
                    ErrorKind::UnknownColumn,
                    upsert.pos,
                    format!(
                        "conflict column \"{column}\" not found in table \"{}\"",
                        table.name
                    ),
                );
            }
        }
        if let Some(cond) = &mut upsert.conflict_where {
            self.condition(cond)?;
        }

        self.sql.in_conflict = true;
        self.set_clauses(&mut upsert.do_update, table)?;
        if let Some(cond) = &mut upsert.update_where {
            self.condition(cond)?;
        }
        self.sql.in_conflict = false;
        Ok(())
    }

    pub(crate) fn update(&mut self, update: &mut UpdateStatement) -> FaultResult<()> {
        self.effect.mark();
        let Some((name, table)) = self.target(&update.table, update.alias.as_deref(), update.pos)
        else {
            return Ok(());
        };
        self.join_target(&name, table, update.pos);

        if let Some(from) = &mut update.from {
            self.relation(from)?;
        }
        for join in &mut update.joins {
            self.join_clause(join)?;
        }
        self.set_clauses(&mut update.set, table)?;
        if let Some(cond) = &mut update.where_clause {
            self.condition(cond)?;
        }
        Ok(())
    }

    pub(crate) fn delete(&mut self, delete: &mut DeleteStatement) -> FaultResult<()> {
        self.effect.mark();
        let Some((name, table)) = self.target(&delete.table, delete.alias.as_deref(), delete.pos)
        else {
            return Ok(());
        };
        self.join_target(&name, table, delete.pos);

        if let Some(from) = &mut delete.from {
            self.relation(from)?;
        }
        for join in &mut delete.joins {
            self.join_clause(join)?;
        }
        if let Some(cond) = &mut delete.where_clause {
            self.condition(cond)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "dml_test.rs"]
mod tests;
