//! Procedure body analysis
//!
//! Walks the procedural statements of one procedure on top of the shared
//! [`Analyzer`]. Besides the usual errors it collects everything needed to
//! generate the procedure's variable declarations later.

use crate::aggregate::ClauseScan;
use crate::analyzer::Analyzer;
use crate::context::{LoopReceiver, ProcedureContext};
use crate::error::{ErrorKind, ErrorListener, FaultResult};
use crate::shape::{Attribute, Shape};
use kw_core::{AnalyzerConfig, DataType, Procedure, Schema};
use kw_sql::{
    Assign, Call, CallStmt, Declaration, ForLoop, IfStmt, LoopTerm, ParsedProcedure, Position,
    ProcedureStmt, ReturnNextStmt, ReturnStmt, SqlStatement, VariableExpr, VariablePrefix,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// What one analyzed procedure declares and does
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcedureResult {
    pub mutative: bool,
    /// Every variable declared anywhere in the body, loop receivers included
    pub variables: BTreeMap<String, DataType>,
    /// Loop receivers bound to SQL rows
    pub compound_variables: BTreeSet<String>,
    /// Types of call results discarded with `_`, in order
    pub anonymous_receivers: Vec<DataType>,
}

/// Control-flow facts of a statement or block
#[derive(Debug, Clone, Copy, Default)]
struct Flow {
    /// Every path through it returns
    returns: bool,
    /// It contains a `break` for the enclosing loop
    breaks: bool,
}

impl Flow {
    const RETURNS: Flow = Flow {
        returns: true,
        breaks: false,
    };
}

/// What a loop receiver is bound to
enum LoopBinding {
    Scalar(DataType),
    Record(BTreeMap<String, DataType>),
}

pub(crate) struct ProcedureAnalyzer<'s> {
    a: Analyzer<'s>,
    ctx: ProcedureContext<'s>,
}

impl<'s> ProcedureAnalyzer<'s> {
    pub fn new(schema: &'s Schema, config: &'s AnalyzerConfig, procedure: &'s Procedure) -> Self {
        let mut a = Analyzer::new(schema, config, "procedure", "procedure");
        a.in_view = procedure.is_view();
        a.declare_session_variables();

        let mut ctx = ProcedureContext::new(procedure);
        for param in &procedure.parameters {
            a.block.variables.insert(param.name.clone(), param.data_type);
            ctx.all_variables.insert(param.name.clone(), param.data_type);
        }
        Self { a, ctx }
    }

    pub fn analyze(
        mut self,
        parsed: &mut ParsedProcedure,
    ) -> FaultResult<(ProcedureResult, ErrorListener)> {
        let flow = self.block(&mut parsed.body)?;

        let needs_return = self
            .ctx
            .procedure
            .returns
            .as_ref()
            .is_some_and(|r| !r.is_table && !r.fields.is_empty());
        if needs_return && !flow.returns {
            self.a.error(
                ErrorKind::Return,
                parsed.pos,
                "procedure does not return a value",
            );
        }

        let compound_variables = self
            .ctx
            .all_loop_receivers
            .iter()
            .filter(|r| r.data_type.is_none())
            .map(|r| r.name.clone())
            .collect();
        let result = ProcedureResult {
            mutative: self.a.effect.is_mutative(),
            variables: self.ctx.all_variables,
            compound_variables,
            anonymous_receivers: self.ctx.anonymous_receivers,
        };
        Ok((result, self.a.errs))
    }

    fn block(&mut self, stmts: &mut [ProcedureStmt]) -> FaultResult<Flow> {
        let mut flow = Flow::default();
        for stmt in stmts {
            let f = self.statement(stmt)?;
            flow.returns |= f.returns;
            flow.breaks |= f.breaks;
        }
        Ok(flow)
    }

    /// Analyze a nested block; its declarations go out of scope afterwards
    fn scoped_block(&mut self, stmts: &mut [ProcedureStmt]) -> FaultResult<Flow> {
        let saved = self.a.block.clone();
        let flow = self.block(stmts);
        self.a.block = saved;
        flow
    }

    fn statement(&mut self, stmt: &mut ProcedureStmt) -> FaultResult<Flow> {
        match stmt {
            ProcedureStmt::Declaration(d) => self.declaration(d),
            ProcedureStmt::Assign(assign) => self.assign(assign)?,
            ProcedureStmt::Call(call) => return self.call(call),
            ProcedureStmt::ForLoop(f) => return self.for_loop(f),
            ProcedureStmt::If(s) => return self.if_stmt(s),
            ProcedureStmt::Sql(sql) => {
                self.sql(sql)?;
            }
            ProcedureStmt::Break(pos) => {
                if self.ctx.active_loop_receivers.is_empty() {
                    self.a
                        .error(ErrorKind::Break, *pos, "break statement outside of loop");
                }
                return Ok(Flow {
                    returns: false,
                    breaks: true,
                });
            }
            ProcedureStmt::Return(r) => return self.return_stmt(r),
            ProcedureStmt::ReturnNext(r) => self.return_next(r)?,
        }
        Ok(Flow::default())
    }

    /// Run one SQL statement, reporting writes in a view procedure
    fn sql(&mut self, stmt: &mut SqlStatement) -> FaultResult<Vec<Attribute>> {
        let attrs = self.a.sql_statement(stmt)?;
        if self.a.in_view && stmt.as_select().is_none() {
            self.a.error(
                ErrorKind::ViewMutatesState,
                stmt.pos,
                "SQL statement mutates state in view procedure",
            );
        }
        Ok(attrs)
    }

    /// Record a declaration in the current block and in the procedure-wide table
    fn mark_declared(&mut self, name: &str, t: DataType, pos: Position) {
        match self.ctx.all_variables.get(name) {
            Some(existing) if !existing.equals_strict(&t) => self.a.error(
                ErrorKind::CrossScopeDeclaration,
                pos,
                format!(
                    "variable {name} is declared in a different scope in this procedure as a different type"
                ),
            ),
            Some(_) => {}
            None => {
                self.ctx.all_variables.insert(name.to_string(), t);
            }
        }
        self.a.block.variables.insert(name.to_string(), t);
    }

    /// Contextual variables are read-only
    fn reject_contextual(&mut self, var: &VariableExpr, pos: Position) -> bool {
        if var.prefix() == VariablePrefix::At {
            self.a.error(
                ErrorKind::Assignment,
                pos,
                format!("cannot assign to contextual variable \"{}\"", var.name),
            );
            return true;
        }
        false
    }

    fn declaration(&mut self, d: &Declaration) {
        if self.reject_contextual(&d.variable, d.pos) {
            return;
        }
        self.a.check_identifier(&d.variable.name, d.pos);
        if self.a.block.is_declared(&d.variable.name) {
            self.a.error(
                ErrorKind::VariableAlreadyDeclared,
                d.pos,
                format!("variable \"{}\" is already declared", d.variable.name),
            );
            return;
        }
        self.mark_declared(&d.variable.name, d.data_type, d.pos);
    }

    fn assign(&mut self, assign: &mut Assign) -> FaultResult<()> {
        let t = self.a.scalar(&mut assign.value, &mut ClauseScan::new())?;
        if self.reject_contextual(&assign.variable, assign.pos) {
            return Ok(());
        }
        let name = assign.variable.name.as_str();

        if let Some(declared) = assign.data_type {
            self.a.check_identifier(name, assign.pos);
            if !t.equals(&declared) {
                self.a.error(
                    ErrorKind::Type,
                    assign.pos,
                    format!("declared type: {declared}, inferred type: {t}"),
                );
            }
            if self.a.block.is_declared(name) {
                self.a.error(
                    ErrorKind::VariableAlreadyDeclared,
                    assign.pos,
                    format!("variable \"{name}\" is already declared"),
                );
            } else {
                self.mark_declared(name, declared, assign.pos);
            }
            return Ok(());
        }

        match self.a.block.variables.get(name).copied() {
            Some(existing) => {
                self.a.expect_equal(assign.pos, &t, &existing);
            }
            None if self.a.block.anonymous_variables.contains_key(name) => self.a.error(
                ErrorKind::Assignment,
                assign.pos,
                format!("cannot assign to loop receiver \"{name}\""),
            ),
            None => self.a.error(
                ErrorKind::UndeclaredVariable,
                assign.pos,
                format!("variable \"{name}\" is not declared"),
            ),
        }
        Ok(())
    }

    fn call(&mut self, stmt: &mut CallStmt) -> FaultResult<Flow> {
        let name = stmt.call.name().to_string();
        let exits = matches!(&stmt.call, Call::Function(f) if f.name.eq_ignore_ascii_case("error"));

        let before = self.a.errs.len();
        let mut scan = ClauseScan::new();
        let shape = match &mut stmt.call {
            Call::Function(f) => self.a.function_call(f, &mut scan)?,
            Call::Foreign(f) => self.a.foreign_call(f, &mut scan)?,
        };
        let call_failed = self.a.errs.len() > before;

        let types = match shape {
            Shape::Scalar(t) => vec![t],
            Shape::TypeList(types) => types,
            Shape::Unit => Vec::new(),
            Shape::Composite(_) => vec![DataType::UNKNOWN],
            Shape::Relation(_) => {
                if !stmt.receivers.is_empty() {
                    self.a.error(
                        ErrorKind::ResultShape,
                        stmt.pos,
                        "procedure returns table, cannot assign to variable(s)",
                    );
                }
                return Ok(Flow::default());
            }
        };

        if !stmt.receivers.is_empty() && !call_failed && types.len() != stmt.receivers.len() {
            self.a.error(
                ErrorKind::ResultShape,
                stmt.pos,
                format!(
                    "function/procedure \"{name}\" returns {} value(s), statement expects {} value(s)",
                    types.len(),
                    stmt.receivers.len()
                ),
            );
        }

        for (i, receiver) in stmt.receivers.iter().enumerate() {
            let t = types.get(i).copied().unwrap_or(DataType::UNKNOWN);
            match receiver {
                None => self.ctx.anonymous_receivers.push(t),
                Some(var) => self.bind_receiver(var, t, stmt.pos),
            }
        }

        Ok(Flow {
            returns: exits,
            breaks: false,
        })
    }

    /// Assign a call result to a receiver, declaring it on first use
    fn bind_receiver(&mut self, var: &VariableExpr, t: DataType, pos: Position) {
        if self.reject_contextual(var, pos) {
            return;
        }
        if self.a.block.anonymous_variables.contains_key(&var.name) {
            self.a.error(
                ErrorKind::VariableAlreadyDeclared,
                pos,
                format!("variable \"{}\" is a loop receiver", var.name),
            );
            return;
        }

        match self.a.block.variables.get(&var.name).copied() {
            Some(existing) => {
                if !t.equals(&existing) {
                    self.a.error(
                        ErrorKind::Type,
                        pos,
                        format!(
                            "variable \"{}\" is declared as {existing}, received {t}",
                            var.name
                        ),
                    );
                }
            }
            None => {
                self.a.check_identifier(&var.name, pos);
                self.mark_declared(&var.name, t, pos);
            }
        }
    }

    fn for_loop(&mut self, f: &mut ForLoop) -> FaultResult<Flow> {
        let name = f.receiver.name.clone();
        self.a.check_identifier(&name, f.pos);
        let reused = self.ctx.all_loop_receivers.iter().any(|r| r.name == name);
        if reused || self.a.block.is_declared(&name) {
            self.a.error(
                ErrorKind::VariableAlreadyDeclared,
                f.pos,
                format!("loop receiver \"{name}\" is already declared"),
            );
        }

        let binding = match &mut f.term {
            LoopTerm::Range { start, end, .. } => {
                for bound in [start, end] {
                    let pos = bound.pos();
                    let t = self.a.scalar(bound, &mut ClauseScan::new())?;
                    self.a.expect_type(pos, &t, &DataType::INT);
                }
                LoopBinding::Scalar(DataType::INT)
            }
            LoopTerm::Sql(stmt) => {
                let pos = stmt.pos;
                let attrs = self.sql(stmt)?;
                if stmt.as_select().is_none() {
                    self.a.error(
                        ErrorKind::ResultShape,
                        pos,
                        "loops over SQL require a SELECT statement",
                    );
                }
                let mut fields = BTreeMap::new();
                for attr in attrs {
                    if attr.name.is_empty() {
                        self.a.error(
                            ErrorKind::UnnamedResultColumn,
                            pos,
                            "all columns returned by a loop query must be named",
                        );
                        continue;
                    }
                    fields.insert(attr.name, attr.data_type);
                }
                LoopBinding::Record(fields)
            }
            LoopTerm::Variable(var) => match self.a.variable(var) {
                Shape::Scalar(t) if t.is_array => LoopBinding::Scalar(t.element()),
                Shape::Scalar(t) if t.is_unknown() => LoopBinding::Scalar(DataType::UNKNOWN),
                Shape::Scalar(t) => {
                    self.a
                        .error(ErrorKind::Type, var.pos, format!("expected array, received {t}"));
                    LoopBinding::Scalar(DataType::UNKNOWN)
                }
                _ => {
                    self.a.error(
                        ErrorKind::Type,
                        var.pos,
                        "loop variable must be an array",
                    );
                    LoopBinding::Scalar(DataType::UNKNOWN)
                }
            },
        };

        let saved = self.a.block.clone();
        let receiver_type = match binding {
            LoopBinding::Scalar(t) => {
                self.mark_declared(&name, t, f.pos);
                Some(t)
            }
            LoopBinding::Record(fields) => {
                self.a.block.anonymous_variables.insert(name.clone(), fields);
                None
            }
        };
        self.ctx.all_loop_receivers.push(LoopReceiver {
            name: name.clone(),
            data_type: receiver_type,
        });

        self.ctx.active_loop_receivers.push(name);
        let body = self.block(&mut f.body);
        self.ctx.active_loop_receivers.pop();
        self.a.block = saved;
        let body = body?;

        Ok(Flow {
            returns: body.returns && !body.breaks,
            breaks: false,
        })
    }

    fn if_stmt(&mut self, s: &mut IfStmt) -> FaultResult<Flow> {
        let mut returns = true;
        let mut breaks = false;

        for branch in &mut s.branches {
            let pos = branch.condition.pos();
            let t = self
                .a
                .scalar(&mut branch.condition, &mut ClauseScan::new())?;
            self.a.expect_type(pos, &t, &DataType::BOOL);

            let flow = self.scoped_block(&mut branch.body)?;
            returns &= flow.returns;
            breaks |= flow.breaks;
        }

        match &mut s.else_body {
            Some(body) => {
                let flow = self.scoped_block(body)?;
                returns &= flow.returns;
                breaks |= flow.breaks;
            }
            None => returns = false,
        }

        Ok(Flow { returns, breaks })
    }

    fn return_stmt(&mut self, r: &mut ReturnStmt) -> FaultResult<Flow> {
        let procedure = self.ctx.procedure;
        let declared = procedure.returns.as_ref();

        if let Some(stmt) = &mut r.sql {
            let attrs = self.sql(stmt)?;
            match declared {
                Some(ret) if ret.is_table => {
                    if attrs.len() != ret.fields.len() {
                        self.a.error(
                            ErrorKind::ResultShape,
                            r.pos,
                            format!(
                                "expected {} columns, received {}",
                                ret.fields.len(),
                                attrs.len()
                            ),
                        );
                        return Ok(Flow::RETURNS);
                    }
                    for (attr, field) in attrs.iter().zip(&ret.fields) {
                        if attr.name.is_empty() {
                            self.a.error(
                                ErrorKind::UnnamedResultColumn,
                                r.pos,
                                format!("returned column for \"{}\" must be named", field.name),
                            );
                        } else if attr.name != field.name {
                            self.a.error(
                                ErrorKind::ResultShape,
                                r.pos,
                                format!(
                                    "expected column \"{}\", received \"{}\"",
                                    field.name, attr.name
                                ),
                            );
                        }
                        self.a.expect_equal(r.pos, &attr.data_type, &field.data_type);
                    }
                }
                _ => self.a.error(
                    ErrorKind::Return,
                    r.pos,
                    "procedure does not return a table, cannot return a SQL statement",
                ),
            }
            return Ok(Flow::RETURNS);
        }

        let mut types = Vec::with_capacity(r.values.len());
        for value in &mut r.values {
            types.push((value.pos(), self.a.scalar(value, &mut ClauseScan::new())?));
        }

        match declared {
            Some(ret) if ret.is_table => {
                if !types.is_empty() {
                    self.a.error(
                        ErrorKind::Return,
                        r.pos,
                        "procedure returns a table, use RETURN NEXT or return a SQL statement",
                    );
                }
            }
            Some(ret) => {
                if types.len() != ret.fields.len() {
                    self.a.error(
                        ErrorKind::Return,
                        r.pos,
                        format!(
                            "expected {} return values, received {}",
                            ret.fields.len(),
                            types.len()
                        ),
                    );
                }
                for ((pos, t), field) in types.iter().zip(&ret.fields) {
                    self.a.expect_equal(*pos, t, &field.data_type);
                }
            }
            None => {
                if !types.is_empty() {
                    self.a.error(
                        ErrorKind::Return,
                        r.pos,
                        "procedure does not return any value",
                    );
                }
            }
        }
        Ok(Flow::RETURNS)
    }

    fn return_next(&mut self, r: &mut ReturnNextStmt) -> FaultResult<()> {
        let procedure = self.ctx.procedure;

        let mut types = Vec::with_capacity(r.values.len());
        for value in &mut r.values {
            types.push((value.pos(), self.a.scalar(value, &mut ClauseScan::new())?));
        }

        match procedure.returns.as_ref() {
            Some(ret) if ret.is_table => {
                if types.len() != ret.fields.len() {
                    self.a.error(
                        ErrorKind::Return,
                        r.pos,
                        format!(
                            "expected {} return values, received {}",
                            ret.fields.len(),
                            types.len()
                        ),
                    );
                }
                for ((pos, t), field) in types.iter().zip(&ret.fields) {
                    self.a.expect_equal(*pos, t, &field.data_type);
                }
            }
            _ => self.a.error(
                ErrorKind::Return,
                r.pos,
                "RETURN NEXT can only be used in procedures that return a table",
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "procedure_test.rs"]
mod tests;
