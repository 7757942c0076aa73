//! Action body analysis

use crate::aggregate::ClauseScan;
use crate::analyzer::Analyzer;
use crate::error::{ErrorKind, ErrorListener, FaultResult};
use kw_core::{Action, AnalyzerConfig, DataType, Schema};
use kw_sql::{ActionCall, ActionSql, ActionStmt, Expr, ExtensionCall, VariablePrefix};

/// Analyze one action body. Returns whether it mutates state.
pub(crate) fn analyze_body(
    schema: &Schema,
    config: &AnalyzerConfig,
    action: &Action,
    body: &mut [ActionStmt],
) -> FaultResult<(bool, ErrorListener)> {
    let mut a = Analyzer::new(schema, config, "action", "action");
    a.in_view = action.is_view();
    a.declare_session_variables();
    for param in &action.parameters {
        a.block.variables.insert(param.clone(), DataType::UNKNOWN);
    }

    for stmt in body {
        match stmt {
            ActionStmt::Sql(sql) => a.action_sql(sql)?,
            ActionStmt::ExtensionCall(call) => a.extension_call(call)?,
            ActionStmt::ActionCall(call) => a.action_call(call)?,
        }
    }

    Ok((a.effect.is_mutative(), a.errs))
}

impl<'s> Analyzer<'s> {
    fn action_sql(&mut self, sql: &mut ActionSql) -> FaultResult<()> {
        let outer = self.effect.suspend();
        let result = self.sql_statement(&mut sql.statement);
        sql.mutative = self.effect.resume(outer);
        result?;

        if sql.mutative && self.in_view && sql.statement.as_select().is_none() {
            self.error(
                ErrorKind::ViewMutatesState,
                sql.pos,
                "SQL statement mutates state in view action",
            );
        }
        Ok(())
    }

    /// Resolve the arguments of an in-line statement
    fn inline_args(&mut self, args: &mut [Expr]) -> FaultResult<()> {
        self.inline_action = true;
        let mut result = Ok(());
        for arg in args {
            if let Err(fault) = self.scalar(arg, &mut ClauseScan::new()) {
                result = Err(fault);
                break;
            }
        }
        self.inline_action = false;
        result
    }

    fn extension_call(&mut self, call: &mut ExtensionCall) -> FaultResult<()> {
        let schema = self.schema;
        if schema.find_extension(&call.extension).is_none() {
            self.error(
                ErrorKind::UnknownFunctionOrProcedure,
                call.pos,
                format!("unknown extension \"{}\"", call.extension),
            );
        }
        self.inline_args(&mut call.args)?;

        for receiver in &call.receivers {
            if receiver.prefix() == VariablePrefix::At {
                self.error(
                    ErrorKind::Assignment,
                    call.pos,
                    format!("cannot assign to contextual variable \"{}\"", receiver.name),
                );
                continue;
            }
            self.check_identifier(&receiver.name, call.pos);
            self.block
                .variables
                .insert(receiver.name.clone(), DataType::UNKNOWN);
        }

        log::warn!(
            "extension call {}.{} is assumed not to mutate state",
            call.extension,
            call.method
        );
        Ok(())
    }

    fn action_call(&mut self, call: &mut ActionCall) -> FaultResult<()> {
        let schema = self.schema;
        match schema.find_action(&call.action) {
            None => self.error(
                ErrorKind::ActionNotFound,
                call.pos,
                format!("action \"{}\" not found", call.action),
            ),
            Some(callee) => {
                if call.args.len() != callee.parameters.len() {
                    self.error(
                        ErrorKind::FunctionSignature,
                        call.pos,
                        format!(
                            "expected {} arguments, received {}",
                            callee.parameters.len(),
                            call.args.len()
                        ),
                    );
                }
                if !callee.is_view() {
                    self.effect.mark();
                    if self.in_view {
                        self.error(
                            ErrorKind::ViewMutatesState,
                            call.pos,
                            format!("view action calls non-view action \"{}\"", callee.name),
                        );
                    }
                }
            }
        }
        self.inline_args(&mut call.args)
    }
}

#[cfg(test)]
#[path = "action_test.rs"]
mod tests;
