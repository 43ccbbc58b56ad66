use crate::catalog::TableColumn;
use crate::error::{not_supported, parse_error};
use mysqlx_core::error::XError;
use mysqlx_core::types::DataValue;
use sqlparser::ast::{
    BinaryOperator, ColumnDef, ColumnOption, Expr, ObjectName, OrderByExpr, SchemaName,
    SelectItem, SetExpr, ShowStatementFilter, Statement, TableConstraint, TableFactor,
    UnaryOperator, Value,
};

#[derive(Debug, Clone)]
pub enum Plan {
    CreateDatabase { name: String, if_not_exists: bool },
    CreateTable(CreateTablePlan),
    DropTable { tables: Vec<TableRef>, if_exists: bool },
    Use { db: String },
    ShowTables { db: Option<String>, pattern: Option<String> },
    Insert(InsertPlan),
    Select(SelectPlan),
    /// Session settings the engine accepts and ignores (`SET NAMES ...`).
    Noop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn is_information_schema(&self) -> bool {
        self.schema
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("information_schema"))
    }
}

#[derive(Debug, Clone)]
pub struct CreateTablePlan {
    pub table: TableRef,
    pub columns: Vec<TableColumn>,
    pub if_not_exists: bool,
}

#[derive(Debug, Clone)]
pub struct InsertPlan {
    pub table: TableRef,
    pub columns: Vec<String>,
    pub values: Vec<Vec<DataValue>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFunction {
    Database,
    ConnectionId,
    Version,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarExpr {
    Literal(DataValue),
    Column(String),
    Function(SessionFunction),
}

#[derive(Debug, Clone)]
pub enum ProjectionItem {
    Expr { expr: ScalarExpr, label: String },
    AllColumns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
}

#[derive(Debug, Clone)]
pub struct WherePredicate {
    pub left: ScalarExpr,
    pub op: CompareOp,
    pub right: ScalarExpr,
}

/// WHERE condition: simple predicate, null test, or AND/OR of conditions.
#[derive(Debug, Clone)]
pub enum WhereCond {
    Predicate(WherePredicate),
    IsNull { expr: ScalarExpr, negated: bool },
    And(Box<WhereCond>, Box<WhereCond>),
    Or(Box<WhereCond>, Box<WhereCond>),
}

/// Ordering specification: column/alias name or 1-based position.
#[derive(Debug, Clone)]
pub struct OrderBySpec {
    pub spec: OrderBySpecKind,
    pub asc: bool,
}

#[derive(Debug, Clone)]
pub enum OrderBySpecKind {
    ColumnOrAlias(String),
    Position(usize),
}

#[derive(Debug, Clone)]
pub struct SourceRef {
    pub table: TableRef,
    pub alias: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SelectPlan {
    /// `None` for `SELECT` without `FROM`.
    pub source: Option<SourceRef>,
    pub projection: Vec<ProjectionItem>,
    pub where_clause: Option<WhereCond>,
    pub order_by: Vec<OrderBySpec>,
    pub limit: Option<u64>,
}

pub fn plan_statement(stmt: &Statement) -> Result<Plan, XError> {
    match stmt {
        Statement::CreateDatabase {
            db_name,
            if_not_exists,
            ..
        } => Ok(Plan::CreateDatabase {
            name: single_name(db_name)?,
            if_not_exists: *if_not_exists,
        }),
        Statement::CreateSchema {
            schema_name: SchemaName::Simple(name),
            if_not_exists,
            ..
        } => Ok(Plan::CreateDatabase {
            name: single_name(name)?,
            if_not_exists: *if_not_exists,
        }),
        Statement::CreateTable {
            name,
            columns,
            constraints,
            if_not_exists,
            ..
        } => {
            let mut cols: Vec<TableColumn> = columns.iter().map(plan_column).collect();
            for constraint in constraints {
                for key in primary_key_columns(constraint) {
                    if let Some(col) = cols.iter_mut().find(|c| c.name.eq_ignore_ascii_case(&key)) {
                        col.primary = true;
                        col.nullable = false;
                    }
                }
            }
            Ok(Plan::CreateTable(CreateTablePlan {
                table: table_ref(name)?,
                columns: cols,
                if_not_exists: *if_not_exists,
            }))
        }
        Statement::Drop {
            object_type: sqlparser::ast::ObjectType::Table,
            if_exists,
            names,
            ..
        } => Ok(Plan::DropTable {
            tables: names.iter().map(table_ref).collect::<Result<_, _>>()?,
            if_exists: *if_exists,
        }),
        Statement::Use { db_name } => Ok(Plan::Use {
            db: db_name.value.clone(),
        }),
        Statement::ShowTables {
            db_name, filter, ..
        } => {
            let pattern = match filter {
                None => None,
                Some(ShowStatementFilter::Like(p)) => Some(p.clone()),
                Some(_) => return Err(not_supported("SHOW TABLES ... WHERE")),
            };
            Ok(Plan::ShowTables {
                db: db_name.as_ref().map(|ident| ident.value.clone()),
                pattern,
            })
        }
        Statement::Insert {
            table_name,
            columns,
            source,
            ..
        } => {
            let table = table_ref(table_name)?;
            let cols = columns.iter().map(|c| c.value.clone()).collect();
            let mut values = Vec::new();
            let source = source
                .as_ref()
                .ok_or_else(|| not_supported("INSERT without VALUES"))?;
            match &*source.body {
                SetExpr::Values(v) => {
                    for row in &v.rows {
                        values.push(row.iter().map(expr_to_value).collect::<Result<_, _>>()?);
                    }
                }
                _ => return Err(not_supported("INSERT ... SELECT")),
            }
            Ok(Plan::Insert(InsertPlan {
                table,
                columns: cols,
                values,
            }))
        }
        Statement::Query(query) => {
            let select = match &*query.body {
                SetExpr::Select(select) => select,
                _ => return Err(not_supported("set operations")),
            };
            if select.from.len() > 1 || select.from.iter().any(|rel| !rel.joins.is_empty()) {
                return Err(not_supported("joins"));
            }
            let source = match select.from.first() {
                None => None,
                Some(rel) => match &rel.relation {
                    TableFactor::Table { name, alias, .. } => Some(SourceRef {
                        table: table_ref(name)?,
                        alias: alias.as_ref().map(|a| a.name.value.clone()),
                    }),
                    _ => return Err(not_supported("derived tables")),
                },
            };
            Ok(Plan::Select(SelectPlan {
                source,
                projection: plan_projection(&select.projection)?,
                where_clause: select.selection.as_ref().map(parse_where_expr).transpose()?,
                order_by: plan_order_by(&query.order_by)?,
                limit: plan_limit(query.limit.as_ref())?,
            }))
        }
        Statement::SetVariable { .. }
        | Statement::SetNames { .. }
        | Statement::SetNamesDefault { .. } => Ok(Plan::Noop),
        other => {
            let text = other.to_string();
            let head = text.split_whitespace().take(2).collect::<Vec<_>>().join(" ");
            Err(not_supported(&head))
        }
    }
}

fn plan_column(def: &ColumnDef) -> TableColumn {
    let mut col = TableColumn::new(def.name.value.clone(), &def.data_type.to_string());
    for opt in &def.options {
        match &opt.option {
            ColumnOption::NotNull => col.nullable = false,
            ColumnOption::Unique {
                is_primary: true, ..
            } => {
                col.primary = true;
                col.nullable = false;
            }
            ColumnOption::Generated {
                generation_expr: Some(expr),
                ..
            } => col.generation_expression = Some(expr.to_string()),
            other if other.to_string().eq_ignore_ascii_case("AUTO_INCREMENT") => {
                col.auto_increment = true;
            }
            _ => {}
        }
    }
    col
}

fn primary_key_columns(constraint: &TableConstraint) -> Vec<String> {
    let text = constraint.to_string();
    let Some(pos) = text.to_ascii_uppercase().find("PRIMARY KEY") else {
        return Vec::new();
    };
    let Some((_, rest)) = text[pos..].split_once('(') else {
        return Vec::new();
    };
    rest.split(')')
        .next()
        .unwrap_or_default()
        .split(',')
        .map(|c| c.trim().trim_matches('`').to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn single_name(name: &ObjectName) -> Result<String, XError> {
    match name.0.as_slice() {
        [ident] => Ok(ident.value.clone()),
        _ => Err(parse_error(&format!("invalid database name '{name}'"))),
    }
}

fn table_ref(name: &ObjectName) -> Result<TableRef, XError> {
    match name.0.as_slice() {
        [table] => Ok(TableRef {
            schema: None,
            name: table.value.clone(),
        }),
        [schema, table] => Ok(TableRef {
            schema: Some(schema.value.clone()),
            name: table.value.clone(),
        }),
        _ => Err(parse_error(&format!("invalid table name '{name}'"))),
    }
}

fn plan_projection(items: &[SelectItem]) -> Result<Vec<ProjectionItem>, XError> {
    let mut out = Vec::new();
    for item in items {
        let proj = match item {
            SelectItem::UnnamedExpr(expr) => ProjectionItem::Expr {
                expr: plan_scalar(expr)?,
                label: match expr {
                    Expr::Identifier(ident) => ident.value.clone(),
                    Expr::CompoundIdentifier(parts) => parts
                        .last()
                        .map(|p| p.value.clone())
                        .unwrap_or_default(),
                    _ => expr.to_string(),
                },
            },
            SelectItem::ExprWithAlias { expr, alias } => ProjectionItem::Expr {
                expr: plan_scalar(expr)?,
                label: alias.value.clone(),
            },
            SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(_, _) => {
                ProjectionItem::AllColumns
            }
        };
        out.push(proj);
    }
    Ok(out)
}

fn plan_scalar(expr: &Expr) -> Result<ScalarExpr, XError> {
    match expr {
        Expr::Identifier(ident) => Ok(ScalarExpr::Column(ident.value.clone())),
        Expr::CompoundIdentifier(parts) => Ok(ScalarExpr::Column(
            parts.last().map(|p| p.value.clone()).unwrap_or_default(),
        )),
        Expr::Nested(inner) => plan_scalar(inner),
        Expr::Function(func) => {
            let name = func.name.to_string().to_ascii_uppercase();
            match name.as_str() {
                "DATABASE" | "SCHEMA" => Ok(ScalarExpr::Function(SessionFunction::Database)),
                "CONNECTION_ID" => Ok(ScalarExpr::Function(SessionFunction::ConnectionId)),
                "VERSION" => Ok(ScalarExpr::Function(SessionFunction::Version)),
                _ => Err(not_supported(&format!("function {name}"))),
            }
        }
        _ => Ok(ScalarExpr::Literal(expr_to_value(expr)?)),
    }
}

fn parse_where_expr(expr: &Expr) -> Result<WhereCond, XError> {
    match expr {
        Expr::Nested(inner) => parse_where_expr(inner),
        Expr::IsNull(inner) => Ok(WhereCond::IsNull {
            expr: plan_scalar(inner)?,
            negated: false,
        }),
        Expr::IsNotNull(inner) => Ok(WhereCond::IsNull {
            expr: plan_scalar(inner)?,
            negated: true,
        }),
        Expr::Like {
            negated,
            expr,
            pattern,
            ..
        } => Ok(WhereCond::Predicate(WherePredicate {
            left: plan_scalar(expr)?,
            op: if *negated {
                CompareOp::NotLike
            } else {
                CompareOp::Like
            },
            right: plan_scalar(pattern)?,
        })),
        Expr::BinaryOp { left, op, right } => {
            match op {
                BinaryOperator::And => {
                    return Ok(WhereCond::And(
                        Box::new(parse_where_expr(left)?),
                        Box::new(parse_where_expr(right)?),
                    ))
                }
                BinaryOperator::Or => {
                    return Ok(WhereCond::Or(
                        Box::new(parse_where_expr(left)?),
                        Box::new(parse_where_expr(right)?),
                    ))
                }
                _ => {}
            }
            let op = match op {
                BinaryOperator::Eq => CompareOp::Eq,
                BinaryOperator::NotEq => CompareOp::NotEq,
                BinaryOperator::Gt => CompareOp::Gt,
                BinaryOperator::GtEq => CompareOp::Gte,
                BinaryOperator::Lt => CompareOp::Lt,
                BinaryOperator::LtEq => CompareOp::Lte,
                other => return Err(not_supported(&format!("operator {other}"))),
            };
            Ok(WhereCond::Predicate(WherePredicate {
                left: plan_scalar(left)?,
                op,
                right: plan_scalar(right)?,
            }))
        }
        other => Err(not_supported(&format!("condition {other}"))),
    }
}

fn plan_order_by(order_by: &[OrderByExpr]) -> Result<Vec<OrderBySpec>, XError> {
    let mut out = Vec::new();
    for oe in order_by {
        let spec = match &oe.expr {
            Expr::Identifier(ident) => OrderBySpecKind::ColumnOrAlias(ident.value.clone()),
            Expr::CompoundIdentifier(parts) => OrderBySpecKind::ColumnOrAlias(
                parts.last().map(|p| p.value.clone()).unwrap_or_default(),
            ),
            Expr::Value(Value::Number(n, _)) => match n.parse::<usize>() {
                Ok(v) if v >= 1 => OrderBySpecKind::Position(v),
                _ => return Err(parse_error(&format!("invalid ORDER BY position {n}"))),
            },
            other => return Err(not_supported(&format!("ORDER BY {other}"))),
        };
        out.push(OrderBySpec {
            spec,
            asc: oe.asc.unwrap_or(true),
        });
    }
    Ok(out)
}

fn plan_limit(limit: Option<&Expr>) -> Result<Option<u64>, XError> {
    match limit {
        None => Ok(None),
        Some(Expr::Value(Value::Number(n, _))) => n
            .parse()
            .map(Some)
            .map_err(|_| parse_error(&format!("invalid LIMIT {n}"))),
        Some(other) => Err(not_supported(&format!("LIMIT {other}"))),
    }
}

fn number_value(n: &str, negative: bool) -> DataValue {
    let signed = if negative { format!("-{n}") } else { n.to_string() };
    if n.contains(['e', 'E']) {
        return DataValue::Float64(signed.parse().unwrap_or(0.0));
    }
    if n.contains('.') {
        return DataValue::Decimal(signed);
    }
    if let Ok(v) = signed.parse::<i64>() {
        return DataValue::Int64(v);
    }
    match signed.parse::<u64>() {
        Ok(v) => DataValue::UInt64(v),
        Err(_) => DataValue::Decimal(signed),
    }
}

pub fn expr_to_value(expr: &Expr) -> Result<DataValue, XError> {
    match expr {
        Expr::Value(Value::Number(n, _)) => Ok(number_value(n, false)),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => match &**expr {
            Expr::Value(Value::Number(n, _)) => Ok(number_value(n, true)),
            other => Err(not_supported(&format!("expression -{other}"))),
        },
        Expr::Value(Value::SingleQuotedString(s)) | Expr::Value(Value::DoubleQuotedString(s)) => {
            Ok(DataValue::String(s.clone()))
        }
        Expr::Value(Value::Boolean(b)) => Ok(DataValue::Int64(i64::from(*b))),
        Expr::Value(Value::Null) => Ok(DataValue::Null),
        Expr::Nested(inner) => expr_to_value(inner),
        other => Err(not_supported(&format!("expression {other}"))),
    }
}
