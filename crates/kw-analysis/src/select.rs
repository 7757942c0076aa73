//! SELECT statements, select cores and FROM relations

use crate::aggregate::{ClauseScan, GroupBy};
use crate::analyzer::Analyzer;
use crate::context::table_relation;
use crate::error::{AnalysisFault, ErrorKind, FaultResult};
use crate::shape::{flatten, shapes_match, Attribute, Relation, Shape};
use kw_core::DataType;
use kw_sql::{Call, Expr, Position, Relation as SqlRelation, ResultColumn, SelectCore, SelectStatement};
use std::collections::HashSet;

/// Facts about a select core needed after it has been analyzed
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CoreFacts {
    pub distinct: bool,
    pub grouped: bool,
    pub has_aggregate: bool,
}

impl<'s> Analyzer<'s> {
    /// Analyze a SELECT statement in its own scope, injecting the default
    /// ordering. Returns the result columns of the first core.
    pub(crate) fn select_statement(
        &mut self,
        stmt: &mut SelectStatement,
    ) -> FaultResult<Vec<Attribute>> {
        if stmt.cores.is_empty() {
            return Err(AnalysisFault::MalformedSelect {
                message: "select statement has no select cores".to_string(),
            });
        }
        if stmt.compound_operators.len() + 1 != stmt.cores.len() {
            return Err(AnalysisFault::MalformedSelect {
                message: format!(
                    "{} select cores joined by {} compound operators",
                    stmt.cores.len(),
                    stmt.compound_operators.len()
                ),
            });
        }

        self.sql.scope();
        let (result, facts) = self.select_core(&mut stmt.cores[0])?;
        let first_relations = std::mem::take(&mut self.sql.joined_relations);
        let first_tables = std::mem::take(&mut self.sql.joined_tables);
        self.sql.pop_scope()?;

        let mut any_group_by = facts.grouped;
        for core in stmt.cores.iter_mut().skip(1) {
            let pos = core.pos;
            self.sql.scope();
            let (attrs, other) = self.select_core(core)?;
            self.sql.pop_scope()?;

            any_group_by |= other.grouped;
            if !shapes_match(&result, &attrs) {
                self.error(
                    ErrorKind::ResultShape,
                    pos,
                    "expected shape to match previous select core",
                );
            }
        }

        self.sql.scope();
        if stmt.is_compound() {
            match flatten(&first_relations) {
                Ok(attrs) => {
                    if let Err(rej) = self.sql.join_relation(Relation::new("", attrs)) {
                        self.reject(rej, stmt.pos);
                    }
                }
                Err(rej) => self.reject(rej, stmt.pos),
            }
        } else {
            self.sql.joined_relations = first_relations;
            self.sql.joined_tables = first_tables;
        }

        let defaults = self.default_ordering(stmt, &result, &facts, any_group_by)?;

        if !stmt.is_compound() && facts.has_aggregate && !facts.grouped && !stmt.ordering.is_empty()
        {
            self.error(
                ErrorKind::Aggregate,
                stmt.pos,
                "cannot use order by with aggregate function without group by",
            );
        }
        for term in &mut stmt.ordering {
            let mut scan = ClauseScan::ordering(result.clone());
            self.scalar(&mut term.expr, &mut scan)?;
        }

        for bound in [&mut stmt.limit, &mut stmt.offset].into_iter().flatten() {
            let pos = bound.pos();
            let t = self.scalar(bound, &mut ClauseScan::new())?;
            self.expect_numeric(pos, &t);
        }

        stmt.ordering.extend(defaults);
        self.sql.pop_scope()?;
        Ok(result)
    }

    fn select_core(&mut self, core: &mut SelectCore) -> FaultResult<(Vec<Attribute>, CoreFacts)> {
        self.sql.in_select = true;

        if let Some(from) = &mut core.from {
            self.relation(from)?;
        }
        for join in &mut core.joins {
            self.join_clause(join)?;
        }

        if let Some(filter) = &mut core.where_clause {
            self.condition(filter)?;
        }

        let mut group_by = GroupBy::default();
        for term in &mut core.group_by {
            let pos = term.pos();
            let mut scan = ClauseScan::new();
            self.scalar(term, &mut scan)?;
            if let Err(rej) = group_by.add_term(&scan) {
                self.reject(rej, pos);
            }
        }

        if let Some(having) = &mut core.having {
            let pos = having.pos();
            let mut scan = ClauseScan::new();
            let t = self.scalar(having, &mut scan)?;
            for rej in group_by.check_having(&scan) {
                self.reject(rej, pos);
            }
            self.expect_type(pos, &t, &DataType::BOOL);
        }

        let grouped = !core.group_by.is_empty();
        if core.distinct && grouped {
            self.error(
                ErrorKind::Aggregate,
                core.pos,
                "cannot use DISTINCT with GROUP BY",
            );
        }

        let mut result = Vec::new();
        let mut has_aggregate = false;
        for column in &mut core.columns {
            match column {
                ResultColumn::Wildcard { table: Some(table) } => {
                    let rel = self
                        .sql
                        .joined_relations
                        .iter()
                        .find(|r| r.name == *table)
                        .cloned();
                    match rel {
                        Some(rel) => result.extend(rel.attributes),
                        None => self.error(
                            ErrorKind::UnknownTable,
                            core.pos,
                            format!("table \"{table}\" is not joined in this scope"),
                        ),
                    }
                }
                ResultColumn::Wildcard { table: None } => {
                    match flatten(&self.sql.joined_relations) {
                        Ok(attrs) => result.extend(attrs),
                        Err(rej) => self.reject(rej, core.pos),
                    }
                }
                ResultColumn::Expression { expr, alias } => {
                    let pos = expr.pos();
                    let mut scan = ClauseScan::new();
                    let t = self.scalar(expr, &mut scan)?;
                    has_aggregate |= scan.contains_aggregate;
                    if grouped {
                        for rej in group_by.check_result_column(&scan) {
                            self.reject(rej, pos);
                        }
                    }

                    let name = match (alias.as_ref(), &*expr) {
                        (Some(alias), _) => {
                            self.check_identifier(alias, pos);
                            alias.clone()
                        }
                        (None, Expr::Column(c)) => c.column.clone(),
                        (None, _) => String::new(),
                    };
                    result.push(Attribute::new(name, t));
                }
            }
        }

        if !grouped && has_aggregate && result.len() > 1 {
            self.error(
                ErrorKind::Aggregate,
                core.pos,
                "cannot return multiple values in SELECT that uses aggregate function and no group by",
            );
        }

        let mut seen = HashSet::new();
        for attr in &result {
            if !attr.name.is_empty() && !seen.insert(attr.name.as_str()) {
                self.error(
                    ErrorKind::AmbiguousColumn,
                    core.pos,
                    format!("column \"{}\" is returned more than once", attr.name),
                );
            }
        }

        let facts = CoreFacts {
            distinct: core.distinct,
            grouped,
            has_aggregate,
        };
        Ok((result, facts))
    }

    /// Make a FROM or JOIN relation visible in the current scope
    pub(crate) fn relation(&mut self, relation: &mut SqlRelation) -> FaultResult<()> {
        if self.sql.has_anonymous_table {
            self.error(
                ErrorKind::UnnamedJoin,
                relation.pos(),
                "statement uses an unnamed subquery or procedure join. to join another table, alias the subquery or procedure",
            );
            return Ok(());
        }

        match relation {
            SqlRelation::Table(t) => {
                let name = t.alias.clone().unwrap_or_else(|| t.table.clone());
                if let Some(alias) = &t.alias {
                    self.check_identifier(alias, t.pos);
                }

                let schema = self.schema;
                if let Some(table) = schema.find_table(&t.table) {
                    if let Err(rej) = self.sql.join(&name, table) {
                        self.reject(rej, t.pos);
                        return Ok(());
                    }
                    if let Err(rej) = self.sql.join_relation(table_relation(&name, table)) {
                        self.reject(rej, t.pos);
                    }
                } else if let Some(cte) = self.sql.find_cte(&t.table).cloned() {
                    if let Err(rej) = self.sql.join_relation(Relation::new(name, cte.attributes)) {
                        self.reject(rej, t.pos);
                    }
                } else {
                    self.error(
                        ErrorKind::UnknownTable,
                        t.pos,
                        format!("unknown table \"{}\"", t.table),
                    );
                }
            }
            SqlRelation::Subquery(s) => {
                let attrs = self.select_statement(&mut s.query)?;
                self.bind_relation(
                    s.alias.as_deref(),
                    attrs,
                    s.pos,
                    "joins against subqueries must be aliased",
                );
            }
            SqlRelation::FunctionCall(f) => {
                let mut scan = ClauseScan::new();
                let shape = match &mut f.call {
                    Call::Function(call) => self.function_call(call, &mut scan)?,
                    Call::Foreign(call) => self.foreign_call(call, &mut scan)?,
                };
                match shape {
                    Shape::Relation(attrs) => self.bind_relation(
                        f.alias.as_deref(),
                        attrs,
                        f.pos,
                        "joins against procedures must be aliased",
                    ),
                    // already reported while resolving the call
                    Shape::Scalar(t) if t.is_unknown() => {}
                    _ => self.error(
                        ErrorKind::Type,
                        f.pos,
                        "cannot join procedure that does not return type table",
                    ),
                }
            }
        }
        Ok(())
    }

    fn bind_relation(
        &mut self,
        alias: Option<&str>,
        attrs: Vec<Attribute>,
        pos: Position,
        unaliased: &str,
    ) {
        let rel = match alias {
            Some(alias) => {
                self.check_identifier(alias, pos);
                Relation::new(alias, attrs)
            }
            None if self.sql.in_select && self.sql.joined_relations.is_empty() => {
                self.sql.has_anonymous_table = true;
                Relation::new("", attrs)
            }
            None => {
                self.error(ErrorKind::UnnamedJoin, pos, unaliased);
                return;
            }
        };
        if let Err(rej) = self.sql.join_relation(rel) {
            self.reject(rej, pos);
        }
    }
}

#[cfg(test)]
#[path = "select_test.rs"]
mod tests;
