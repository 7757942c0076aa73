//! Shared analyzer state and the SQL statement entry

use crate::builtins::SESSION_VARIABLES;
use crate::context::{BlockContext, SqlContext};
use crate::error::{ErrorKind, ErrorListener, FaultResult, Rejection};
use crate::mutation::MutationTracker;
use crate::shape::{Attribute, Relation};
use kw_core::{AnalyzerConfig, DataType, Schema};
use kw_sql::{Position, SqlCore, SqlStatement};

/// State threaded through one analysis unit (a statement, action or procedure)
pub(crate) struct Analyzer<'s> {
    pub schema: &'s Schema,
    pub config: &'s AnalyzerConfig,
    pub sql: SqlContext<'s>,
    pub block: BlockContext,
    pub errs: ErrorListener,
    pub effect: MutationTracker,
    /// Only the expression kinds accepted by in-line action statements are allowed
    pub inline_action: bool,
    /// The unit is declared `view`
    pub in_view: bool,
    /// "procedure", "action" or "statement", used in messages
    pub unit_kind: &'static str,
}

impl<'s> Analyzer<'s> {
    pub fn new(
        schema: &'s Schema,
        config: &'s AnalyzerConfig,
        parser_name: &'static str,
        unit_kind: &'static str,
    ) -> Self {
        Self {
            schema,
            config,
            sql: SqlContext::new(),
            block: BlockContext::default(),
            errs: ErrorListener::new(parser_name),
            effect: MutationTracker::default(),
            inline_action: false,
            in_view: false,
            unit_kind,
        }
    }

    /// Make the contextual `@` variables visible
    pub fn declare_session_variables(&mut self) {
        for (name, data_type) in SESSION_VARIABLES {
            self.block.variables.insert((*name).to_string(), *data_type);
        }
    }

    pub fn error(&mut self, kind: ErrorKind, pos: Position, message: impl Into<String>) {
        self.errs.add(kind, pos, message);
    }

    pub fn reject(&mut self, rejection: Rejection, pos: Position) {
        self.errs.reject(rejection, pos);
    }

    /// Report `got != want` unless the types are loosely equal
    pub fn expect_equal(&mut self, pos: Position, got: &DataType, want: &DataType) -> bool {
        if got.equals(want) {
            return true;
        }
        self.error(ErrorKind::Type, pos, format!("{got} != {want}"));
        false
    }

    /// Like [`Self::expect_equal`], phrased for a required type
    pub fn expect_type(&mut self, pos: Position, got: &DataType, want: &DataType) -> bool {
        if got.equals(want) {
            return true;
        }
        self.error(
            ErrorKind::Type,
            pos,
            format!("expected {want}, received {got}"),
        );
        false
    }

    pub fn expect_numeric(&mut self, pos: Position, got: &DataType) -> bool {
        if got.is_numeric() {
            return true;
        }
        self.error(
            ErrorKind::Type,
            pos,
            format!("expected numeric type, received {got}"),
        );
        false
    }

    /// Enforce the configured identifier length on a variable, receiver or alias
    pub fn check_identifier(&mut self, name: &str, pos: Position) {
        let bare = name.trim_start_matches(['$', '@']);
        if bare.len() > self.config.max_identifier_length {
            self.error(
                ErrorKind::Identifier,
                pos,
                format!(
                    "maximum identifier length is {}",
                    self.config.max_identifier_length
                ),
            );
        }
    }

    /// Analyze one SQL statement in a fresh SQL scope. Variables of the
    /// enclosing block stay visible. Returns the result columns of a query,
    /// or nothing for INSERT/UPDATE/DELETE.
    pub fn sql_statement(&mut self, stmt: &mut SqlStatement) -> FaultResult<Vec<Attribute>> {
        self.sql = SqlContext::new();

        for cte in &mut stmt.ctes {
            if self.schema.find_table(&cte.name).is_some() || self.sql.find_cte(&cte.name).is_some()
            {
                self.error(
                    ErrorKind::TableAlreadyExists,
                    cte.pos,
                    format!("table \"{}\" already exists", cte.name),
                );
                continue;
            }

            let mut attrs = self.select_statement(&mut cte.query)?;
            if !cte.columns.is_empty() {
                if cte.columns.len() != attrs.len() {
                    self.error(
                        ErrorKind::ResultShape,
                        cte.pos,
                        format!(
                            "expected {} columns, received {}",
                            cte.columns.len(),
                            attrs.len()
                        ),
                    );
                } else {
                    for (attr, name) in attrs.iter_mut().zip(&cte.columns) {
                        attr.name = name.clone();
                    }
                }
            }
            self.sql.ctes.push(Relation::new(cte.name.clone(), attrs));
        }

        let result = match &mut stmt.core {
            SqlCore::Select(select) => self.select_statement(select)?,
            SqlCore::Insert(insert) => {
                self.insert(insert)?;
                Vec::new()
            }
            SqlCore::Update(update) => {
                self.update(update)?;
                Vec::new()
            }
            SqlCore::Delete(delete) => {
                self.delete(delete)?;
                Vec::new()
            }
        };

        self.sql = SqlContext::new();
        Ok(result)
    }
}
