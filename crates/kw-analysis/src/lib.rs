//! kw-analysis: semantic analysis for Kuneiform SQL, procedures and actions
//!
//! The analyzer type-checks parsed statements against a schema, enforces
//! the rules that keep execution deterministic across replicas (ordered
//! results, safe joins, unambiguous aggregates), appends default ordering
//! terms to every SELECT, and reports whether each unit mutates state.
//!
//! User errors are collected as [`ParseError`]s and never abort a walk.
//! An [`AnalysisFault`] means the input broke an invariant that earlier
//! phases should have guaranteed; it aborts the unit being analyzed.

pub(crate) mod action;
pub(crate) mod aggregate;
pub(crate) mod analyzer;
pub mod builtins;
pub(crate) mod context;
pub(crate) mod dml;
pub mod error;
pub(crate) mod join;
pub(crate) mod mutation;
pub(crate) mod ordering;
pub(crate) mod procedure;
pub(crate) mod resolve;
pub(crate) mod select;
pub mod shape;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use builtins::{builtin_function, FunctionDefinition, SESSION_VARIABLES};
pub use error::{AnalysisFault, ErrorKind, ErrorListener, FaultResult, ParseError, ParseErrors, Rejection};
pub use procedure::ProcedureResult;
pub use shape::{Attribute, Relation, Shape};

use analyzer::Analyzer;
use kw_core::{AnalyzerConfig, Schema};
use kw_sql::{ParsedAction, ParsedProcedure, SqlStatement};
use procedure::ProcedureAnalyzer;
use std::collections::BTreeMap;

/// Outcome of analyzing one standalone SQL statement
#[derive(Debug, Clone, PartialEq)]
pub struct SqlAnalysis {
    pub mutative: bool,
    pub errors: Vec<ParseError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureAnalysis {
    pub result: ProcedureResult,
    pub errors: Vec<ParseError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProceduresAnalysis {
    pub results: BTreeMap<String, ProcedureResult>,
    pub errors: Vec<ParseError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionAnalysis {
    pub mutative: bool,
    pub errors: Vec<ParseError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionsAnalysis {
    pub mutative: BTreeMap<String, bool>,
    pub errors: Vec<ParseError>,
}

/// Analyze one SQL statement with no variables in scope.
///
/// SELECT statements in `stmt` receive their default ordering terms.
pub fn analyze_sql(
    stmt: &mut SqlStatement,
    schema: &Schema,
    config: &AnalyzerConfig,
) -> FaultResult<SqlAnalysis> {
    let mut a = Analyzer::new(schema, config, "sql", "statement");
    a.sql_statement(stmt)?;

    let mutative = a.effect.is_mutative();
    let errors = a.errs.into_errors();
    log::debug!(
        "analyzed SQL statement: mutative={mutative}, {} error(s)",
        errors.len()
    );
    Ok(SqlAnalysis { mutative, errors })
}

/// Analyze the body of one procedure declared in `schema`
pub fn analyze_procedure(
    schema: &Schema,
    parsed: &mut ParsedProcedure,
    config: &AnalyzerConfig,
) -> FaultResult<ProcedureAnalysis> {
    let procedure =
        schema
            .find_procedure(&parsed.name)
            .ok_or_else(|| AnalysisFault::UnknownProcedure {
                name: parsed.name.clone(),
            })?;

    log::debug!("analyzing procedure {}", procedure.name);
    let (result, mut errs) = ProcedureAnalyzer::new(schema, config, procedure).analyze(parsed)?;

    if !errs.is_empty() {
        log::debug!(
            "procedure {} produced {} error(s)",
            procedure.name,
            errs.len()
        );
        if config.log_name_on_error {
            log::warn!("procedure \"{}\" failed analysis", procedure.name);
            errs.prefix_messages(0, &format!("procedure \"{}\": ", procedure.name));
        }
    }

    Ok(ProcedureAnalysis {
        result,
        errors: errs.into_errors(),
    })
}

/// Analyze several procedure bodies, merging their errors in input order
pub fn analyze_procedures(
    schema: &Schema,
    parsed: &mut [ParsedProcedure],
    config: &AnalyzerConfig,
) -> FaultResult<ProceduresAnalysis> {
    let mut out = ProceduresAnalysis::default();
    for procedure in parsed {
        let analysis = analyze_procedure(schema, procedure, config)?;
        out.errors.extend(analysis.errors);
        out.results.insert(procedure.name.clone(), analysis.result);
    }
    Ok(out)
}

/// Analyze the body of one action declared in `schema`.
///
/// Each SQL statement of the body gets its own `mutative` flag.
pub fn analyze_action(
    schema: &Schema,
    parsed: &mut ParsedAction,
    config: &AnalyzerConfig,
) -> FaultResult<ActionAnalysis> {
    let declared = schema
        .find_action(&parsed.name)
        .ok_or_else(|| AnalysisFault::UnknownAction {
            name: parsed.name.clone(),
        })?;

    log::debug!("analyzing action {}", declared.name);
    let (mutative, errs) = action::analyze_body(schema, config, declared, &mut parsed.body)?;
    if !errs.is_empty() {
        log::debug!("action {} produced {} error(s)", declared.name, errs.len());
    }

    Ok(ActionAnalysis {
        mutative,
        errors: errs.into_errors(),
    })
}

/// Analyze several action bodies, merging their errors in input order
pub fn analyze_actions(
    schema: &Schema,
    parsed: &mut [ParsedAction],
    config: &AnalyzerConfig,
) -> FaultResult<ActionsAnalysis> {
    let mut out = ActionsAnalysis::default();
    for action in parsed {
        let analysis = analyze_action(schema, action, config)?;
        out.errors.extend(analysis.errors);
        out.mutative.insert(action.name.clone(), analysis.mutative);
    }
    Ok(out)
}
