//! Expression type resolution
//!
//! Every expression resolves to a [`Shape`]. Errors are recorded and the
//! offending node degrades to `unknown`, which is compatible with every
//! type, so the walk keeps going and later errors are still reported.

use crate::aggregate::{ClauseScan, ColumnRef};
use crate::analyzer::Analyzer;
use crate::builtins::{builtin_function, FunctionDefinition};
use crate::error::{ErrorKind, FaultResult};
use crate::shape::{Attribute, Shape};
use kw_core::{DataType, ProcedureReturn, TypeName};
use kw_sql::{
    ArithmeticExpr, ArithmeticOp, ArrayAccessExpr, ArrayIndex, BetweenExpr, CaseExpr, CollateExpr,
    ColumnExpr, ComparisonExpr, Expr, FieldAccessExpr, ForeignCall, FunctionCall, InExpr,
    InTarget, IsExpr, LiteralValue, LogicalExpr, MakeArrayExpr, Position, StringComparisonExpr,
    SubqueryExpr, UnaryExpr, UnaryOp, VariableExpr, VariablePrefix,
};

/// Pseudo-table holding the proposed row inside ON CONFLICT DO UPDATE
pub(crate) const EXCLUDED_TABLE: &str = "excluded";

/// Expression kinds accepted as arguments of in-line action statements
fn inline_supported(e: &Expr) -> bool {
    matches!(
        e,
        Expr::Literal(_)
            | Expr::FunctionCall(_)
            | Expr::ForeignCall(_)
            | Expr::Variable(_)
            | Expr::Paren(_)
            | Expr::Comparison(_)
            | Expr::Arithmetic(_)
            | Expr::Unary(_)
    )
}

fn describe(e: &Expr) -> String {
    match e {
        Expr::FunctionCall(c) => format!("procedure \"{}\"", c.name),
        Expr::ForeignCall(c) => format!("foreign procedure \"{}\"", c.name),
        other => other.kind_name().to_string(),
    }
}

impl<'s> Analyzer<'s> {
    /// Resolve an expression that must produce exactly one scalar value
    pub(crate) fn scalar(&mut self, e: &mut Expr, scan: &mut ClauseScan) -> FaultResult<DataType> {
        let pos = e.pos();
        let desc = describe(e);
        let shape = self.expr(e, scan)?;
        Ok(self.shape_to_scalar(shape, &desc, pos))
    }

    pub(crate) fn shape_to_scalar(&mut self, shape: Shape, desc: &str, pos: Position) -> DataType {
        match shape {
            Shape::Scalar(t) => t,
            Shape::Composite(_) => {
                self.error(
                    ErrorKind::Type,
                    pos,
                    "invalid usage of compound type. you must reference a field using $compound.field notation",
                );
                DataType::UNKNOWN
            }
            Shape::Relation(_) => {
                self.error(
                    ErrorKind::ResultShape,
                    pos,
                    format!("{desc} returns table, not scalar values"),
                );
                DataType::UNKNOWN
            }
            Shape::TypeList(types) => {
                self.error(
                    ErrorKind::ResultShape,
                    pos,
                    format!(
                        "expected {desc} to return a single value, returns {} values",
                        types.len()
                    ),
                );
                DataType::UNKNOWN
            }
            Shape::Unit => {
                self.error(
                    ErrorKind::ResultShape,
                    pos,
                    format!("{desc} does not return any value"),
                );
                DataType::UNKNOWN
            }
        }
    }

    /// Resolve an expression to whatever shape it produces
    pub(crate) fn expr(&mut self, e: &mut Expr, scan: &mut ClauseScan) -> FaultResult<Shape> {
        if self.inline_action && !inline_supported(e) {
            self.error(
                ErrorKind::Assignment,
                e.pos(),
                format!(
                    "{} is not supported in in-line action statements",
                    e.kind_name()
                ),
            );
            return Ok(Shape::Scalar(DataType::UNKNOWN));
        }

        let t = match e {
            Expr::Literal(lit) => lit.type_cast.unwrap_or_else(|| lit.data_type()),
            Expr::FunctionCall(call) => return self.function_call(call, scan),
            Expr::ForeignCall(call) => return self.foreign_call(call, scan),
            Expr::Variable(var) => return Ok(self.variable(var)),
            Expr::FieldAccess(f) => self.field_access(f, scan)?,
            Expr::ArrayAccess(a) => self.array_access(a, scan)?,
            Expr::MakeArray(m) => self.make_array(m, scan)?,
            Expr::Paren(p) => {
                let inner = self.scalar(&mut p.inner, scan)?;
                p.type_cast.unwrap_or(inner)
            }
            Expr::Comparison(c) => self.comparison(c, scan)?,
            Expr::Logical(l) => self.logical(l, scan)?,
            Expr::Arithmetic(a) => self.arithmetic(a, scan)?,
            Expr::Unary(u) => self.unary(u, scan)?,
            Expr::Column(c) => self.column(c, scan),
            Expr::Collate(c) => self.collate(c, scan)?,
            Expr::StringComparison(s) => self.string_comparison(s, scan)?,
            Expr::Is(i) => self.is(i, scan)?,
            Expr::In(i) => self.in_expr(i, scan)?,
            Expr::Between(b) => self.between(b, scan)?,
            Expr::Subquery(s) => self.subquery(s)?,
            Expr::Case(c) => self.case(c, scan)?,
        };
        Ok(Shape::Scalar(t))
    }

    pub(crate) fn function_call(
        &mut self,
        call: &mut FunctionCall,
        scan: &mut ClauseScan,
    ) -> FaultResult<Shape> {
        if let Some(def) = builtin_function(&call.name) {
            return Ok(Shape::Scalar(self.builtin_call(def, call, scan)?));
        }

        if self.inline_action {
            self.error(
                ErrorKind::FunctionSignature,
                call.pos,
                "procedure calls are not supported in in-line action statements",
            );
            return Ok(Shape::Scalar(DataType::UNKNOWN));
        }

        let schema = self.schema;
        let Some(proc) = schema.find_procedure(&call.name) else {
            self.error(
                ErrorKind::UnknownFunctionOrProcedure,
                call.pos,
                format!("unknown function or procedure \"{}\"", call.name),
            );
            for arg in &mut call.args {
                self.scalar(arg, scan)?;
            }
            return Ok(Shape::Scalar(call.type_cast.unwrap_or(DataType::UNKNOWN)));
        };

        if !proc.is_view() {
            self.effect.mark();
            if self.in_view {
                self.error(
                    ErrorKind::ViewMutatesState,
                    call.pos,
                    format!(
                        "view {} calls non-view procedure \"{}\"",
                        self.unit_kind, proc.name
                    ),
                );
            }
        }

        if call.distinct || call.star {
            self.error(
                ErrorKind::FunctionSignature,
                call.pos,
                "cannot use DISTINCT or * when calling a procedure",
            );
        }

        if call.args.len() != proc.parameters.len() {
            self.error(
                ErrorKind::FunctionSignature,
                call.pos,
                format!(
                    "expected {} arguments, received {}",
                    proc.parameters.len(),
                    call.args.len()
                ),
            );
        }
        for (i, arg) in call.args.iter_mut().enumerate() {
            let pos = arg.pos();
            let t = self.scalar(arg, scan)?;
            if let Some(param) = proc.parameters.get(i) {
                self.expect_equal(pos, &t, &param.data_type);
            }
        }

        Ok(self.procedure_return(proc.returns.as_ref(), call.type_cast, &proc.name, call.pos))
    }

    fn builtin_call(
        &mut self,
        def: &FunctionDefinition,
        call: &mut FunctionCall,
        scan: &mut ClauseScan,
    ) -> FaultResult<DataType> {
        if def.is_aggregate && scan.in_ordering() {
            self.error(
                ErrorKind::Ordering,
                call.pos,
                format!("cannot use aggregate function \"{}\" in ORDER BY", def.name),
            );
        }
        if call.distinct && !def.is_aggregate {
            self.error(
                ErrorKind::FunctionSignature,
                call.pos,
                "DISTINCT can only be used with aggregate functions",
            );
        }

        let mark = if def.is_aggregate {
            match scan.enter_aggregate() {
                Ok(mark) => Some(mark),
                Err(rej) => {
                    self.reject(rej, call.pos);
                    None
                }
            }
        } else {
            None
        };

        let result = if call.star {
            match def.star_return {
                Some(t) if call.args.is_empty() => t,
                Some(_) => {
                    self.error(
                        ErrorKind::FunctionSignature,
                        call.pos,
                        "cannot use * together with arguments",
                    );
                    DataType::UNKNOWN
                }
                None => {
                    self.error(
                        ErrorKind::FunctionSignature,
                        call.pos,
                        format!("function \"{}\" does not support *", def.name),
                    );
                    DataType::UNKNOWN
                }
            }
        } else {
            let mut types = Vec::with_capacity(call.args.len());
            for arg in &mut call.args {
                types.push(self.scalar(arg, scan)?);
            }
            match (def.validate_args)(&types) {
                Ok(t) => t,
                Err(rej) => {
                    self.error(
                        rej.kind,
                        call.pos,
                        format!("function \"{}\": {}", def.name, rej.message),
                    );
                    DataType::UNKNOWN
                }
            }
        };

        if let Some(mark) = mark {
            if let Err(rej) = scan.leave_aggregate(mark) {
                self.reject(rej, call.pos);
            }
        }
        Ok(call.type_cast.unwrap_or(result))
    }

    /// The shape produced by calling a procedure with the given declared return
    fn procedure_return(
        &mut self,
        returns: Option<&ProcedureReturn>,
        cast: Option<DataType>,
        name: &str,
        pos: Position,
    ) -> Shape {
        let Some(ret) = returns else {
            if cast.is_some() {
                self.error(
                    ErrorKind::Type,
                    pos,
                    format!("cannot typecast procedure \"{name}\" because it does not return a value"),
                );
            }
            return Shape::Unit;
        };

        if ret.is_table {
            if cast.is_some() {
                self.error(
                    ErrorKind::Type,
                    pos,
                    format!("cannot typecast procedure \"{name}\" because it returns a table"),
                );
            }
            return Shape::Relation(
                ret.fields
                    .iter()
                    .map(|f| Attribute::new(f.name.clone(), f.data_type))
                    .collect(),
            );
        }

        match ret.fields.as_slice() {
            [] => {
                self.error(
                    ErrorKind::FunctionSignature,
                    pos,
                    format!("procedure \"{name}\" does not return a value"),
                );
                Shape::Unit
            }
            [field] => Shape::Scalar(cast.unwrap_or(field.data_type)),
            fields => {
                if cast.is_some() {
                    self.error(
                        ErrorKind::Type,
                        pos,
                        "cannot type cast multiple return values",
                    );
                }
                Shape::TypeList(fields.iter().map(|f| f.data_type).collect())
            }
        }
    }

    pub(crate) fn foreign_call(
        &mut self,
        call: &mut ForeignCall,
        scan: &mut ClauseScan,
    ) -> FaultResult<Shape> {
        if self.inline_action {
            self.error(
                ErrorKind::FunctionSignature,
                call.pos,
                "foreign calls are not supported in in-line action statements",
            );
            return Ok(Shape::Scalar(DataType::UNKNOWN));
        }

        let schema = self.schema;
        let Some(foreign) = schema.find_foreign_procedure(&call.name) else {
            self.error(
                ErrorKind::UnknownFunctionOrProcedure,
                call.pos,
                format!("unknown foreign procedure \"{}\"", call.name),
            );
            return Ok(Shape::Scalar(call.type_cast.unwrap_or(DataType::UNKNOWN)));
        };

        if call.context_args.len() != 2 {
            self.error(
                ErrorKind::FunctionSignature,
                call.pos,
                format!(
                    "expected 2 contextual arguments, received {}",
                    call.context_args.len()
                ),
            );
        }
        for arg in &mut call.context_args {
            let pos = arg.pos();
            let t = self.scalar(arg, scan)?;
            self.expect_type(pos, &t, &DataType::TEXT);
        }

        if call.args.len() != foreign.parameters.len() {
            self.error(
                ErrorKind::FunctionSignature,
                call.pos,
                format!(
                    "expected {} arguments, received {}",
                    foreign.parameters.len(),
                    call.args.len()
                ),
            );
        }
        for (i, arg) in call.args.iter_mut().enumerate() {
            let pos = arg.pos();
            let t = self.scalar(arg, scan)?;
            if let Some(param) = foreign.parameters.get(i) {
                self.expect_equal(pos, &t, param);
            }
        }

        Ok(self.procedure_return(
            foreign.returns.as_ref(),
            call.type_cast,
            &foreign.name,
            call.pos,
        ))
    }

    pub(crate) fn variable(&mut self, var: &VariableExpr) -> Shape {
        if let Some(t) = self.block.variables.get(&var.name) {
            return Shape::Scalar(var.type_cast.unwrap_or(*t));
        }
        if let Some(fields) = self.block.anonymous_variables.get(&var.name).cloned() {
            if var.type_cast.is_some() {
                self.error(ErrorKind::Type, var.pos, "cannot type cast compound variable");
            }
            return Shape::Composite(fields);
        }

        match var.prefix() {
            VariablePrefix::At => self.error(
                ErrorKind::UnknownContextualVariable,
                var.pos,
                format!("unknown contextual variable \"{}\"", var.name),
            ),
            VariablePrefix::Dollar => self.error(
                ErrorKind::UndeclaredVariable,
                var.pos,
                format!("variable \"{}\" is not declared", var.name),
            ),
        }
        Shape::Scalar(var.type_cast.unwrap_or(DataType::UNKNOWN))
    }

    fn field_access(
        &mut self,
        f: &mut FieldAccessExpr,
        scan: &mut ClauseScan,
    ) -> FaultResult<DataType> {
        let result = match self.expr(&mut f.record, scan)? {
            Shape::Composite(fields) => match fields.get(&f.field) {
                Some(t) => *t,
                None => {
                    self.error(
                        ErrorKind::UnknownColumn,
                        f.pos,
                        format!("record has no field \"{}\"", f.field),
                    );
                    DataType::UNKNOWN
                }
            },
            Shape::Scalar(t) if t.is_unknown() => DataType::UNKNOWN,
            _ => {
                self.error(
                    ErrorKind::Type,
                    f.pos,
                    "cannot access field on non-compound type",
                );
                DataType::UNKNOWN
            }
        };
        Ok(f.type_cast.unwrap_or(result))
    }

    fn array_access(
        &mut self,
        a: &mut ArrayAccessExpr,
        scan: &mut ClauseScan,
    ) -> FaultResult<DataType> {
        let pos = a.array.pos();
        let t = self.scalar(&mut a.array, scan)?;
        if !t.is_array && !t.is_unknown() {
            self.error(ErrorKind::Type, pos, format!("expected array, received {t}"));
        }

        let result = match &mut a.index {
            ArrayIndex::Single(index) => {
                let pos = index.pos();
                let it = self.scalar(index, scan)?;
                self.expect_type(pos, &it, &DataType::INT);
                t.element()
            }
            ArrayIndex::Range { from, to } => {
                for bound in [from, to].into_iter().flatten() {
                    let pos = bound.pos();
                    let bt = self.scalar(bound, scan)?;
                    self.expect_type(pos, &bt, &DataType::INT);
                }
                t
            }
        };

        let result = if t.is_array { result } else { DataType::UNKNOWN };
        Ok(a.type_cast.unwrap_or(result))
    }

    fn make_array(&mut self, m: &mut MakeArrayExpr, scan: &mut ClauseScan) -> FaultResult<DataType> {
        if m.values.is_empty() {
            self.error(
                ErrorKind::Assignment,
                m.pos,
                "array instantiation must have at least one element",
            );
            return Ok(m.type_cast.unwrap_or(DataType::UNKNOWN));
        }

        let mut element: Option<DataType> = None;
        for value in &mut m.values {
            let pos = value.pos();
            let t = self.scalar(value, scan)?;
            if t.is_array {
                self.error(
                    ErrorKind::Type,
                    pos,
                    format!("array elements cannot be arrays, received {t}"),
                );
                continue;
            }
            match element {
                Some(e) => {
                    self.expect_equal(pos, &t, &e);
                }
                None if !t.is_null() => element = Some(t),
                None => {}
            }
        }

        let result = match element {
            Some(e) if !e.is_unknown() => e.array_of(),
            _ => DataType::UNKNOWN,
        };
        Ok(m.type_cast.unwrap_or(result))
    }

    fn comparison(&mut self, c: &mut ComparisonExpr, scan: &mut ClauseScan) -> FaultResult<DataType> {
        let left = self.scalar(&mut c.left, scan)?;
        let right = self.scalar(&mut c.right, scan)?;
        Ok(if self.expect_equal(c.pos, &left, &right) {
            DataType::BOOL
        } else {
            DataType::UNKNOWN
        })
    }

    fn logical(&mut self, l: &mut LogicalExpr, scan: &mut ClauseScan) -> FaultResult<DataType> {
        let left_pos = l.left.pos();
        let right_pos = l.right.pos();
        let left = self.scalar(&mut l.left, scan)?;
        let right = self.scalar(&mut l.right, scan)?;
        let ok = self.expect_type(left_pos, &left, &DataType::BOOL)
            & self.expect_type(right_pos, &right, &DataType::BOOL);
        Ok(if ok { DataType::BOOL } else { DataType::UNKNOWN })
    }

    fn arithmetic(&mut self, a: &mut ArithmeticExpr, scan: &mut ClauseScan) -> FaultResult<DataType> {
        let left = self.scalar(&mut a.left, scan)?;
        let right = self.scalar(&mut a.right, scan)?;

        if a.op == ArithmeticOp::Concat {
            if !left.equals(&DataType::TEXT) || !right.equals(&DataType::TEXT) {
                self.error(
                    ErrorKind::Type,
                    a.pos,
                    format!(
                        "concatenation only allowed on text types. received {left} and {right}"
                    ),
                );
                return Ok(DataType::UNKNOWN);
            }
            return Ok(DataType::TEXT);
        }

        if !self.expect_numeric(a.pos, &left) || !self.expect_equal(a.pos, &left, &right) {
            return Ok(DataType::UNKNOWN);
        }
        Ok(if left.is_unknown() { right } else { left })
    }

    fn unary(&mut self, u: &mut UnaryExpr, scan: &mut ClauseScan) -> FaultResult<DataType> {
        let t = self.scalar(&mut u.operand, scan)?;
        let ok = match u.op {
            UnaryOp::Neg => {
                if t.name == TypeName::Uint256 && !t.is_array {
                    self.error(ErrorKind::Type, u.pos, "cannot negate uint256");
                    false
                } else {
                    self.expect_numeric(u.pos, &t)
                }
            }
            UnaryOp::Pos => self.expect_numeric(u.pos, &t),
            UnaryOp::Not => self.expect_type(u.pos, &t, &DataType::BOOL),
        };
        Ok(if ok { t } else { DataType::UNKNOWN })
    }

    fn column(&mut self, c: &mut ColumnExpr, scan: &mut ClauseScan) -> DataType {
        if c.table.is_none() {
            if let Some(result) = scan
                .ordering
                .as_ref()
                .and_then(|cols| cols.iter().find(|a| a.name == c.column))
            {
                return c.type_cast.unwrap_or(result.data_type);
            }
        }

        if c.table.as_deref() == Some(EXCLUDED_TABLE) {
            return self.excluded_column(c);
        }

        if self.sql.in_conflict && c.table.is_none() {
            let on_target = self
                .sql
                .target_table
                .as_ref()
                .is_some_and(|t| t.table.find_column(&c.column).is_some());
            if on_target {
                self.error(
                    ErrorKind::AmbiguousConflictTable,
                    c.pos,
                    format!(
                        "column \"{}\" is ambiguous in ON CONFLICT DO UPDATE. qualify it with the target table or \"{EXCLUDED_TABLE}\"",
                        c.column
                    ),
                );
                return DataType::UNKNOWN;
            }
        }

        match self.sql.find_attribute(c.table.as_deref(), &c.column) {
            Ok((relation, attr)) => {
                scan.record_column(ColumnRef {
                    relation,
                    column: attr.name,
                });
                c.type_cast.unwrap_or(attr.data_type)
            }
            Err(rej) => {
                self.reject(rej, c.pos);
                DataType::UNKNOWN
            }
        }
    }

    fn excluded_column(&mut self, c: &ColumnExpr) -> DataType {
        let target = self.sql.target_table.as_ref().map(|t| t.table);
        match target {
            Some(table) if self.sql.in_conflict => match table.find_column(&c.column) {
                Some(col) => c.type_cast.unwrap_or(col.data_type),
                None => {
                    self.error(
                        ErrorKind::UnknownColumn,
                        c.pos,
                        format!(
                            "column \"{}\" not found in table \"{EXCLUDED_TABLE}\"",
                            c.column
                        ),
                    );
                    DataType::UNKNOWN
                }
            },
            _ => {
                self.error(
                    ErrorKind::InvalidExcludedTable,
                    c.pos,
                    format!("the \"{EXCLUDED_TABLE}\" table can only be referenced in ON CONFLICT DO UPDATE"),
                );
                DataType::UNKNOWN
            }
        }
    }

    fn collate(&mut self, c: &mut CollateExpr, scan: &mut ClauseScan) -> FaultResult<DataType> {
        let pos = c.expr.pos();
        let t = self.scalar(&mut c.expr, scan)?;
        self.expect_type(pos, &t, &DataType::TEXT);
        if !self.config.is_collation_allowed(&c.collation) {
            self.error(
                ErrorKind::Collation,
                c.pos,
                format!("unsupported collation \"{}\"", c.collation),
            );
        }
        Ok(DataType::TEXT)
    }

    fn string_comparison(
        &mut self,
        s: &mut StringComparisonExpr,
        scan: &mut ClauseScan,
    ) -> FaultResult<DataType> {
        let left_pos = s.left.pos();
        let right_pos = s.right.pos();
        let left = self.scalar(&mut s.left, scan)?;
        let right = self.scalar(&mut s.right, scan)?;
        let ok = self.expect_type(left_pos, &left, &DataType::TEXT)
            & self.expect_type(right_pos, &right, &DataType::TEXT);
        Ok(if ok { DataType::BOOL } else { DataType::UNKNOWN })
    }

    fn is(&mut self, i: &mut IsExpr, scan: &mut ClauseScan) -> FaultResult<DataType> {
        let left = self.scalar(&mut i.left, scan)?;
        let right = self.scalar(&mut i.right, scan)?;

        if i.distinct {
            self.expect_equal(i.pos, &left, &right);
            return Ok(DataType::BOOL);
        }

        match i.right.as_ref() {
            Expr::Literal(lit) if lit.value == LiteralValue::Null => {}
            Expr::Literal(lit) if matches!(lit.value, LiteralValue::Bool(_)) => {
                self.expect_type(i.left.pos(), &left, &DataType::BOOL);
            }
            _ => {
                self.error(
                    ErrorKind::Type,
                    i.right.pos(),
                    format!("IS requires NULL, TRUE or FALSE on its right side, received {right}"),
                );
            }
        }
        Ok(DataType::BOOL)
    }

    fn in_expr(&mut self, i: &mut InExpr, scan: &mut ClauseScan) -> FaultResult<DataType> {
        let t = self.scalar(&mut i.expr, scan)?;
        match &mut i.target {
            InTarget::List(items) => {
                for item in items {
                    let pos = item.pos();
                    let it = self.scalar(item, scan)?;
                    self.expect_equal(pos, &it, &t);
                }
            }
            InTarget::Subquery(query) => {
                let pos = query.pos;
                let attrs = self.select_statement(query)?;
                match attrs.as_slice() {
                    [attr] => {
                        self.expect_equal(pos, &attr.data_type, &t);
                    }
                    _ => self.error(
                        ErrorKind::ResultShape,
                        pos,
                        format!(
                            "subquery expressions must return exactly 1 column, received {}",
                            attrs.len()
                        ),
                    ),
                }
            }
        }
        Ok(DataType::BOOL)
    }

    fn between(&mut self, b: &mut BetweenExpr, scan: &mut ClauseScan) -> FaultResult<DataType> {
        let t = self.scalar(&mut b.expr, scan)?;
        let lower_pos = b.lower.pos();
        let upper_pos = b.upper.pos();
        let lower = self.scalar(&mut b.lower, scan)?;
        let upper = self.scalar(&mut b.upper, scan)?;
        self.expect_numeric(b.pos, &t);
        self.expect_equal(lower_pos, &lower, &t);
        self.expect_equal(upper_pos, &upper, &t);
        Ok(DataType::BOOL)
    }

    fn subquery(&mut self, s: &mut SubqueryExpr) -> FaultResult<DataType> {
        let attrs = self.select_statement(&mut s.query)?;
        if s.exists {
            if s.type_cast.is_some() {
                self.error(ErrorKind::Type, s.pos, "cannot type cast EXISTS subquery");
            }
            return Ok(DataType::BOOL);
        }
        match attrs.as_slice() {
            [attr] => Ok(s.type_cast.unwrap_or(attr.data_type)),
            _ => {
                self.error(
                    ErrorKind::ResultShape,
                    s.pos,
                    format!(
                        "subquery expressions must return exactly 1 column, received {}",
                        attrs.len()
                    ),
                );
                Ok(s.type_cast.unwrap_or(DataType::UNKNOWN))
            }
        }
    }

    fn case(&mut self, c: &mut CaseExpr, scan: &mut ClauseScan) -> FaultResult<DataType> {
        let case_type = match &mut c.case {
            Some(expr) => Some(self.scalar(expr, scan)?),
            None => None,
        };

        let mut result: Option<DataType> = None;
        for (when, then) in &mut c.when_then {
            let when_pos = when.pos();
            let wt = self.scalar(when, scan)?;
            match case_type {
                Some(ct) => {
                    self.expect_equal(when_pos, &wt, &ct);
                }
                None => {
                    self.expect_type(when_pos, &wt, &DataType::BOOL);
                }
            }

            let then_pos = then.pos();
            let tt = self.scalar(then, scan)?;
            self.merge_branch(&mut result, tt, then_pos);
        }

        if let Some(else_expr) = &mut c.else_expr {
            let pos = else_expr.pos();
            let et = self.scalar(else_expr, scan)?;
            self.merge_branch(&mut result, et, pos);
        }

        Ok(result.unwrap_or(DataType::NULL))
    }

    /// The first non-null branch fixes the type of a CASE; the rest must agree
    fn merge_branch(&mut self, result: &mut Option<DataType>, t: DataType, pos: Position) {
        match result {
            Some(r) => {
                self.expect_equal(pos, &t, r);
            }
            None if !t.is_null() => *result = Some(t),
            None => {}
        }
    }
}

#[cfg(test)]
#[path = "resolve_test.rs"]
mod tests;
