use crate::catalog::{Catalog, SharedCatalog, TableColumn, TableSchema};
use crate::error::{
    column_cannot_be_null, lock_poisoned, no_database, no_such_table, table_exists,
    unknown_column, unknown_database, value_count_mismatch,
};
use crate::parser::parse_sql;
use crate::planner::{
    plan_statement, CompareOp, CreateTablePlan, InsertPlan, OrderBySpecKind, Plan,
    ProjectionItem, ScalarExpr, SelectPlan, SessionFunction, TableRef, WhereCond,
};
use crate::users::CredentialStore;
use async_trait::async_trait;
use mysqlx_core::backend::{
    Driver, QueryContext, ResultSet, SqlWarning, UserIdentity, VecResultSet, WarningLevel,
};
use mysqlx_core::error::{codes, XError};
use mysqlx_core::types::{
    flags, ColumnInfo, ColumnType, DataRow, DataValue, COLLATION_BINARY,
    COLLATION_UTF8MB4_GENERAL_CI,
};
use sqlparser::ast::Statement;
use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

pub const SERVER_VERSION: &str = "8.0.36-mysqlx-memory";

const INFORMATION_SCHEMA: &str = "information_schema";

/// Shared state behind every session of the in-memory engine.
#[derive(Debug)]
pub struct MemoryEngine {
    catalog: SharedCatalog,
    credentials: CredentialStore,
}

impl MemoryEngine {
    pub fn new(credentials: CredentialStore) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(Catalog::new())),
            credentials,
        }
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    fn lock(&self) -> Result<MutexGuard<'_, Catalog>, XError> {
        self.catalog.lock().map_err(|_| lock_poisoned())
    }
}

#[derive(Debug, Clone)]
pub struct MemoryDriver {
    engine: Arc<MemoryEngine>,
}

impl MemoryDriver {
    pub fn new(engine: Arc<MemoryEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<MemoryEngine> {
        &self.engine
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn open(
        &self,
        connection_id: u32,
        _capability: u32,
        _collation: u8,
        db: Option<&str>,
    ) -> Result<Box<dyn QueryContext>, XError> {
        if let Some(db) = db {
            if !self.engine.lock()?.has_database(db) {
                return Err(unknown_database(db));
            }
        }
        debug!(connection_id, "opened memory session");
        Ok(Box::new(MemoryContext::new(
            self.engine.clone(),
            connection_id,
            db.map(str::to_string),
        )))
    }
}

struct Relation {
    columns: Vec<ColumnInfo>,
    rows: Vec<DataRow>,
}

impl Relation {
    /// Single empty row, the source of `SELECT` without `FROM`.
    fn dual() -> Self {
        Self {
            columns: Vec::new(),
            rows: vec![DataRow { values: Vec::new() }],
        }
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| {
            c.name.eq_ignore_ascii_case(name) || c.org_name.eq_ignore_ascii_case(name)
        })
    }
}

pub struct MemoryContext {
    engine: Arc<MemoryEngine>,
    connection_id: u32,
    current_db: Option<String>,
    last_insert_id: u64,
    affected_rows: u64,
    warnings: Vec<SqlWarning>,
}

impl MemoryContext {
    pub fn new(engine: Arc<MemoryEngine>, connection_id: u32, current_db: Option<String>) -> Self {
        Self {
            engine,
            connection_id,
            current_db,
            last_insert_id: 0,
            affected_rows: 0,
            warnings: Vec::new(),
        }
    }

    pub fn execute_statement(&mut self, stmt: &Statement) -> Result<Option<VecResultSet>, XError> {
        match plan_statement(stmt)? {
            Plan::CreateDatabase {
                name,
                if_not_exists,
            } => {
                if self.engine.lock()?.create_database(&name, if_not_exists)? {
                    self.affected_rows += 1;
                } else {
                    self.note(
                        codes::ER_DB_CREATE_EXISTS,
                        format!("Can't create database '{name}'; database exists"),
                    );
                }
                Ok(None)
            }
            Plan::CreateTable(plan) => self.exec_create_table(plan).map(|_| None),
            Plan::DropTable { tables, if_exists } => {
                for table in tables {
                    let db = self.resolve_db(&table)?;
                    if !self.engine.lock()?.drop_table(&db, &table.name, if_exists)? {
                        self.note(
                            codes::ER_BAD_TABLE,
                            format!("Unknown table '{db}.{}'", table.name),
                        );
                    }
                }
                Ok(None)
            }
            Plan::Use { db } => {
                if !self.engine.lock()?.has_database(&db) {
                    return Err(unknown_database(&db));
                }
                self.current_db = Some(db);
                Ok(None)
            }
            Plan::ShowTables { db, pattern } => {
                let db = db.or_else(|| self.current_db.clone()).ok_or_else(no_database)?;
                let catalog = self.engine.lock()?;
                let rows = catalog
                    .database(&db)?
                    .tables
                    .keys()
                    .filter(|name| pattern.as_deref().map_or(true, |p| like_match(name, p)))
                    .map(|name| DataRow {
                        values: vec![DataValue::String(name.clone())],
                    })
                    .collect();
                let column = ColumnInfo::computed(format!("Tables_in_{db}"), ColumnType::VarString);
                Ok(Some(VecResultSet::new(vec![column], rows)))
            }
            Plan::Insert(plan) => self.exec_insert(plan).map(|_| None),
            Plan::Select(plan) => self.exec_select(plan).map(Some),
            Plan::Noop => Ok(None),
        }
    }

    fn note(&mut self, code: u16, message: String) {
        self.warnings.push(SqlWarning {
            level: WarningLevel::Note,
            code,
            message,
        });
    }

    fn resolve_db(&self, table: &TableRef) -> Result<String, XError> {
        table
            .schema
            .clone()
            .or_else(|| self.current_db.clone())
            .ok_or_else(no_database)
    }

    fn exec_create_table(&mut self, plan: CreateTablePlan) -> Result<(), XError> {
        let db = self.resolve_db(&plan.table)?;
        let name = plan.table.name.clone();
        let schema = TableSchema::new(name.clone(), plan.columns);
        if !self
            .engine
            .lock()?
            .create_table(&db, schema, plan.if_not_exists)?
        {
            self.note(codes::ER_TABLE_EXISTS, table_exists(&name).to_string());
        }
        Ok(())
    }

    fn exec_insert(&mut self, plan: InsertPlan) -> Result<(), XError> {
        let db = self.resolve_db(&plan.table)?;
        let mut catalog = self.engine.lock()?;
        let table = catalog.table_mut(&db, &plan.table.name)?;
        if let Some(missing) = plan.columns.iter().find(|c| table.column_index(c).is_none()) {
            return Err(unknown_column(missing, "field list"));
        }
        let expected = if plan.columns.is_empty() {
            table.columns.len()
        } else {
            plan.columns.len()
        };

        let mut pending = Vec::with_capacity(plan.values.len());
        let mut next_auto = table.auto_increment;
        let mut first_generated = None;
        for (row_idx, row) in plan.values.into_iter().enumerate() {
            if row.len() != expected {
                return Err(value_count_mismatch(row_idx + 1));
            }
            let mut values = align_columns(&table.columns, &plan.columns, row);
            for (idx, col) in table.columns.iter().enumerate() {
                if col.generation_expression.is_some() {
                    values[idx] = DataValue::Null;
                    continue;
                }
                let value = coerce(col, std::mem::replace(&mut values[idx], DataValue::Null));
                values[idx] = value;
                if col.auto_increment {
                    match value_as_u64(&values[idx]) {
                        None | Some(0) => {
                            let id = next_auto;
                            next_auto += 1;
                            values[idx] = if col.unsigned {
                                DataValue::UInt64(id)
                            } else {
                                DataValue::Int64(id as i64)
                            };
                            first_generated.get_or_insert(id);
                        }
                        Some(explicit) => next_auto = next_auto.max(explicit.saturating_add(1)),
                    }
                } else if !col.nullable && values[idx].is_null() {
                    return Err(column_cannot_be_null(&col.name));
                }
            }
            pending.push(DataRow { values });
        }

        let inserted = pending.len() as u64;
        table.auto_increment = next_auto;
        table.rows.extend(pending);
        drop(catalog);
        self.affected_rows += inserted;
        if let Some(id) = first_generated {
            self.last_insert_id = id;
        }
        Ok(())
    }

    fn exec_select(&mut self, plan: SelectPlan) -> Result<VecResultSet, XError> {
        let relation = match &plan.source {
            None => Relation::dual(),
            Some(source) => self.load_relation(&source.table, source.alias.as_deref())?,
        };

        let mut projected: Vec<(ScalarExpr, ColumnInfo)> = Vec::new();
        for item in &plan.projection {
            match item {
                ProjectionItem::AllColumns => {
                    for col in &relation.columns {
                        projected.push((ScalarExpr::Column(col.org_name.clone()), col.clone()));
                    }
                }
                ProjectionItem::Expr { expr, label } => {
                    let info = self.expr_column(expr, label, &relation)?;
                    projected.push((expr.clone(), info));
                }
            }
        }

        let mut sort_keys = Vec::with_capacity(plan.order_by.len());
        for spec in &plan.order_by {
            let expr = match &spec.spec {
                OrderBySpecKind::Position(pos) => projected
                    .get(pos - 1)
                    .map(|(expr, _)| expr.clone())
                    .ok_or_else(|| unknown_column(&pos.to_string(), "order clause"))?,
                OrderBySpecKind::ColumnOrAlias(name) => {
                    match projected.iter().find(|(_, info)| info.name.eq_ignore_ascii_case(name)) {
                        Some((expr, _)) => expr.clone(),
                        None if relation.column_index(name).is_some() => {
                            ScalarExpr::Column(name.clone())
                        }
                        None => return Err(unknown_column(name, "order clause")),
                    }
                }
            };
            sort_keys.push((expr, spec.asc));
        }

        let mut matched = Vec::new();
        for row in &relation.rows {
            let keep = match &plan.where_clause {
                None => true,
                Some(cond) => self.eval_cond(cond, &relation, row)?,
            };
            if keep {
                let keys = sort_keys
                    .iter()
                    .map(|(expr, _)| self.eval(expr, &relation, row, "order clause"))
                    .collect::<Result<Vec<_>, _>>()?;
                matched.push((keys, row));
            }
        }

        if !sort_keys.is_empty() {
            matched.sort_by(|(a, _), (b, _)| {
                for (idx, (_, asc)) in sort_keys.iter().enumerate() {
                    let ord = sort_order(&a[idx], &b[idx]);
                    let ord = if *asc { ord } else { ord.reverse() };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }
        if let Some(limit) = plan.limit {
            matched.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        let mut rows = Vec::with_capacity(matched.len());
        for (_, row) in matched {
            let values = projected
                .iter()
                .map(|(expr, _)| self.eval(expr, &relation, row, "field list"))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(DataRow { values });
        }
        let columns = projected.into_iter().map(|(_, info)| info).collect();
        Ok(VecResultSet::new(columns, rows))
    }

    fn expr_column(
        &self,
        expr: &ScalarExpr,
        label: &str,
        relation: &Relation,
    ) -> Result<ColumnInfo, XError> {
        let info = match expr {
            ScalarExpr::Column(name) => {
                let idx = relation
                    .column_index(name)
                    .ok_or_else(|| unknown_column(name, "field list"))?;
                let mut info = relation.columns[idx].clone();
                info.name = label.to_string();
                info
            }
            ScalarExpr::Literal(value) => literal_column(label, value),
            ScalarExpr::Function(SessionFunction::ConnectionId) => {
                let mut info = ColumnInfo::computed(label, ColumnType::LongLong);
                info.flags |= flags::UNSIGNED | flags::NOT_NULL;
                info.column_length = 21;
                info
            }
            ScalarExpr::Function(SessionFunction::Database | SessionFunction::Version) => {
                let mut info = ColumnInfo::computed(label, ColumnType::VarString);
                info.column_length = 256;
                info
            }
        };
        Ok(info)
    }

    fn eval(
        &self,
        expr: &ScalarExpr,
        relation: &Relation,
        row: &DataRow,
        clause: &str,
    ) -> Result<DataValue, XError> {
        match expr {
            ScalarExpr::Literal(value) => Ok(value.clone()),
            ScalarExpr::Column(name) => relation
                .column_index(name)
                .and_then(|idx| row.values.get(idx).cloned())
                .ok_or_else(|| unknown_column(name, clause)),
            ScalarExpr::Function(SessionFunction::Database) => Ok(self
                .current_db
                .clone()
                .map_or(DataValue::Null, DataValue::String)),
            ScalarExpr::Function(SessionFunction::ConnectionId) => {
                Ok(DataValue::UInt64(u64::from(self.connection_id)))
            }
            ScalarExpr::Function(SessionFunction::Version) => {
                Ok(DataValue::String(SERVER_VERSION.to_string()))
            }
        }
    }

    fn eval_cond(&self, cond: &WhereCond, relation: &Relation, row: &DataRow) -> Result<bool, XError> {
        match cond {
            WhereCond::And(left, right) => {
                Ok(self.eval_cond(left, relation, row)? && self.eval_cond(right, relation, row)?)
            }
            WhereCond::Or(left, right) => {
                Ok(self.eval_cond(left, relation, row)? || self.eval_cond(right, relation, row)?)
            }
            WhereCond::IsNull { expr, negated } => {
                let value = self.eval(expr, relation, row, "where clause")?;
                Ok(value.is_null() != *negated)
            }
            WhereCond::Predicate(pred) => {
                let left = self.eval(&pred.left, relation, row, "where clause")?;
                let right = self.eval(&pred.right, relation, row, "where clause")?;
                if pred.op == CompareOp::Like || pred.op == CompareOp::NotLike {
                    let (Some(text), Some(pattern)) = (left.to_text(), right.to_text()) else {
                        return Ok(false);
                    };
                    return Ok(like_match(&text, &pattern) == (pred.op == CompareOp::Like));
                }
                let Some(ord) = compare_values(&left, &right) else {
                    return Ok(false);
                };
                Ok(match pred.op {
                    CompareOp::Eq => ord == Ordering::Equal,
                    CompareOp::NotEq => ord != Ordering::Equal,
                    CompareOp::Gt => ord == Ordering::Greater,
                    CompareOp::Gte => ord != Ordering::Less,
                    CompareOp::Lt => ord == Ordering::Less,
                    CompareOp::Lte => ord != Ordering::Greater,
                    CompareOp::Like | CompareOp::NotLike => false,
                })
            }
        }
    }

    fn load_relation(&self, table: &TableRef, alias: Option<&str>) -> Result<Relation, XError> {
        if table.is_information_schema() {
            return self.information_schema(&table.name);
        }
        let db = self.resolve_db(table)?;
        let catalog = self.engine.lock()?;
        let schema = catalog.table(&db, &table.name)?;
        let columns = schema
            .columns
            .iter()
            .map(|col| {
                let mut info = col.column_info(&db, &schema.name, None);
                if let Some(alias) = alias {
                    info.table = alias.to_string();
                }
                info
            })
            .collect();
        Ok(Relation {
            columns,
            rows: schema.rows.clone(),
        })
    }

    fn information_schema(&self, table: &str) -> Result<Relation, XError> {
        let catalog = self.engine.lock()?;
        let view = table.to_ascii_uppercase();
        let text = |name: &str| schema_column(&view, name, ColumnType::VarString);
        let number = |name: &str| schema_column(&view, name, ColumnType::LongLong);
        let s = |value: &str| DataValue::String(value.to_string());

        match view.as_str() {
            "SCHEMATA" => Ok(Relation {
                columns: vec![
                    text("CATALOG_NAME"),
                    text("SCHEMA_NAME"),
                    text("DEFAULT_CHARACTER_SET_NAME"),
                    text("DEFAULT_COLLATION_NAME"),
                ],
                rows: catalog
                    .databases()
                    .map(|db| DataRow {
                        values: vec![
                            s("def"),
                            s(&db.name),
                            s("utf8mb4"),
                            s("utf8mb4_general_ci"),
                        ],
                    })
                    .collect(),
            }),
            "TABLES" => Ok(Relation {
                columns: vec![
                    text("TABLE_CATALOG"),
                    text("TABLE_SCHEMA"),
                    text("TABLE_NAME"),
                    text("TABLE_TYPE"),
                    text("ENGINE"),
                    number("TABLE_ROWS"),
                ],
                rows: catalog
                    .databases()
                    .flat_map(|db| {
                        db.tables.values().map(move |t| DataRow {
                            values: vec![
                                s("def"),
                                s(&db.name),
                                s(&t.name),
                                s("BASE TABLE"),
                                s("InnoDB"),
                                DataValue::UInt64(t.rows.len() as u64),
                            ],
                        })
                    })
                    .collect(),
            }),
            "COLUMNS" => Ok(Relation {
                columns: vec![
                    text("TABLE_CATALOG"),
                    text("TABLE_SCHEMA"),
                    text("TABLE_NAME"),
                    text("COLUMN_NAME"),
                    number("ORDINAL_POSITION"),
                    text("IS_NULLABLE"),
                    text("DATA_TYPE"),
                    text("COLUMN_TYPE"),
                    text("COLUMN_KEY"),
                    text("EXTRA"),
                    text("GENERATION_EXPRESSION"),
                ],
                rows: catalog
                    .databases()
                    .flat_map(|db| {
                        db.tables.values().flat_map(move |t| {
                            t.columns.iter().enumerate().map(move |(idx, col)| DataRow {
                                values: vec![
                                    s("def"),
                                    s(&db.name),
                                    s(&t.name),
                                    s(&col.name),
                                    DataValue::UInt64(idx as u64 + 1),
                                    s(if col.nullable { "YES" } else { "NO" }),
                                    s(&col.data_type()),
                                    s(&col.sql_type),
                                    s(if col.primary { "PRI" } else { "" }),
                                    s(column_extra(col)),
                                    s(col.generation_expression.as_deref().unwrap_or_default()),
                                ],
                            })
                        })
                    })
                    .collect(),
            }),
            _ => Err(no_such_table(&format!("{INFORMATION_SCHEMA}.{table}"))),
        }
    }
}

#[async_trait]
impl QueryContext for MemoryContext {
    async fn execute(&mut self, sql: &str) -> Result<Vec<Box<dyn ResultSet>>, XError> {
        debug!(connection_id = self.connection_id, sql, "memory execute");
        self.affected_rows = 0;
        self.last_insert_id = 0;
        let statements = parse_sql(sql)?;
        let mut results: Vec<Box<dyn ResultSet>> = Vec::new();
        for stmt in &statements {
            if let Some(rs) = self.execute_statement(stmt)? {
                results.push(Box::new(rs));
            }
        }
        Ok(results)
    }

    fn last_insert_id(&self) -> u64 {
        self.last_insert_id
    }

    fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    fn take_warnings(&mut self) -> Vec<SqlWarning> {
        std::mem::take(&mut self.warnings)
    }

    fn current_db(&self) -> Option<String> {
        self.current_db.clone()
    }

    async fn auth(&mut self, identity: &UserIdentity, proof: &[u8], salt: &[u8]) -> bool {
        self.engine.credentials().verify(identity, proof, salt)
    }

    async fn close(&mut self) -> Result<(), XError> {
        debug!(connection_id = self.connection_id, "closed memory session");
        self.warnings.clear();
        Ok(())
    }
}

fn schema_column(view: &str, name: &str, column_type: ColumnType) -> ColumnInfo {
    let text = column_type == ColumnType::VarString;
    ColumnInfo {
        schema: INFORMATION_SCHEMA.to_string(),
        table: view.to_string(),
        org_table: view.to_string(),
        name: name.to_string(),
        org_name: name.to_string(),
        column_length: if text { 256 } else { 21 },
        charset: if text {
            COLLATION_UTF8MB4_GENERAL_CI
        } else {
            COLLATION_BINARY
        },
        flags: if text { 0 } else { flags::UNSIGNED },
        decimals: 0,
        column_type,
    }
}

fn column_extra(col: &TableColumn) -> &'static str {
    if col.auto_increment {
        "auto_increment"
    } else if col.generation_expression.is_some() {
        "STORED GENERATED"
    } else {
        ""
    }
}

fn literal_column(label: &str, value: &DataValue) -> ColumnInfo {
    let column_type = match value {
        DataValue::Null => ColumnType::Null,
        DataValue::Int64(_) | DataValue::UInt64(_) => ColumnType::LongLong,
        DataValue::Float32(_) | DataValue::Float64(_) => ColumnType::Double,
        DataValue::Decimal(_) => ColumnType::NewDecimal,
        DataValue::String(_) => ColumnType::VarString,
        DataValue::Bytes(_) => ColumnType::Blob,
        DataValue::Date(_) => ColumnType::Date,
        DataValue::DateTime(_) => ColumnType::Datetime,
        DataValue::Time(_) => ColumnType::Duration,
    };
    let mut info = ColumnInfo::computed(label, column_type);
    if matches!(value, DataValue::UInt64(_)) {
        info.flags |= flags::UNSIGNED;
    }
    if !value.is_null() {
        info.flags |= flags::NOT_NULL;
    }
    if let DataValue::Decimal(text) = value {
        info.decimals = text
            .split_once('.')
            .map_or(0, |(_, frac)| frac.len().min(30) as u8);
    }
    info
}

fn align_columns(
    schema: &[TableColumn],
    insert_cols: &[String],
    values: Vec<DataValue>,
) -> Vec<DataValue> {
    if insert_cols.is_empty() {
        return values;
    }
    let mut aligned = vec![DataValue::Null; schema.len()];
    for (col, value) in insert_cols.iter().zip(values) {
        if let Some(schema_idx) = schema.iter().position(|c| c.name.eq_ignore_ascii_case(col)) {
            aligned[schema_idx] = value;
        }
    }
    aligned
}

fn value_as_u64(value: &DataValue) -> Option<u64> {
    match value {
        DataValue::Int64(v) => Some((*v).max(0) as u64),
        DataValue::UInt64(v) => Some(*v),
        _ => None,
    }
}

/// Converts an inserted literal to the representation of its column.
fn coerce(column: &TableColumn, value: DataValue) -> DataValue {
    let ty = column.column_type;
    match value {
        DataValue::Null => DataValue::Null,
        value if ty.is_integer() => match value {
            DataValue::Int64(v) if column.unsigned && v >= 0 => DataValue::UInt64(v as u64),
            DataValue::Float32(v) => round_integer(column, f64::from(v)),
            DataValue::Float64(v) => round_integer(column, v),
            DataValue::Decimal(s) | DataValue::String(s) => match s.trim().parse::<f64>() {
                Ok(v) => round_integer(column, v),
                Err(_) => DataValue::String(s),
            },
            other => other,
        },
        value => match ty {
            ColumnType::Double | ColumnType::Float => match value
                .to_text()
                .and_then(|t| t.trim().parse::<f64>().ok())
            {
                Some(v) if ty == ColumnType::Float => DataValue::Float32(v as f32),
                Some(v) => DataValue::Float64(v),
                None => value,
            },
            ColumnType::NewDecimal | ColumnType::Decimal => match value {
                DataValue::String(s) => DataValue::Decimal(s.trim().to_string()),
                DataValue::Int64(_) | DataValue::UInt64(_) | DataValue::Float64(_) => {
                    value.to_text().map_or(DataValue::Null, DataValue::Decimal)
                }
                other => other,
            },
            ColumnType::VarString
            | ColumnType::Varchar
            | ColumnType::String
            | ColumnType::Json
            | ColumnType::Enum
            | ColumnType::Set
            | ColumnType::TinyBlob
            | ColumnType::Blob
            | ColumnType::MediumBlob
            | ColumnType::LongBlob => match value {
                DataValue::String(_) | DataValue::Bytes(_) => value,
                other => other.to_text().map_or(DataValue::Null, DataValue::String),
            },
            _ => value,
        },
    }
}

fn round_integer(column: &TableColumn, value: f64) -> DataValue {
    if column.unsigned && value >= 0.0 {
        DataValue::UInt64(value.round() as u64)
    } else {
        DataValue::Int64(value.round() as i64)
    }
}

fn numeric(value: &DataValue) -> Option<f64> {
    match value {
        DataValue::Int64(v) => Some(*v as f64),
        DataValue::UInt64(v) => Some(*v as f64),
        DataValue::Float32(v) => Some(f64::from(*v)),
        DataValue::Float64(v) => Some(*v),
        DataValue::Decimal(s) => s.parse().ok(),
        _ => None,
    }
}

/// Comparison with NULL yields `None`; strings compare case-insensitively.
pub fn compare_values(left: &DataValue, right: &DataValue) -> Option<Ordering> {
    if left.is_null() || right.is_null() {
        return None;
    }
    let as_number = |v: &DataValue| v.to_text().and_then(|t| t.trim().parse::<f64>().ok());
    match (numeric(left), numeric(right)) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        (Some(a), None) => as_number(right).and_then(|b| a.partial_cmp(&b)),
        (None, Some(b)) => as_number(left).and_then(|a| a.partial_cmp(&b)),
        (None, None) => {
            let a = left.to_text()?.to_lowercase();
            let b = right.to_text()?.to_lowercase();
            Some(a.cmp(&b))
        }
    }
}

fn sort_order(left: &DataValue, right: &DataValue) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => compare_values(left, right).unwrap_or(Ordering::Equal),
    }
}

enum LikeToken {
    Any,
    One,
    Char(char),
}

/// Case-insensitive SQL `LIKE` with `%`, `_` and backslash escapes.
pub fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let mut tokens = Vec::new();
    let mut chars = pattern.to_lowercase().chars().collect::<Vec<_>>().into_iter();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => LikeToken::Any,
            '_' => LikeToken::One,
            '\\' => LikeToken::Char(chars.next().unwrap_or('\\')),
            c => LikeToken::Char(c),
        });
    }

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        match tokens.get(p) {
            Some(LikeToken::Any) => {
                backtrack = Some((p, t));
                p += 1;
                continue;
            }
            Some(LikeToken::One) => {
                t += 1;
                p += 1;
                continue;
            }
            Some(LikeToken::Char(c)) if *c == text[t] => {
                t += 1;
                p += 1;
                continue;
            }
            _ => {}
        }
        match backtrack {
            Some((star, matched)) => {
                p = star + 1;
                t = matched + 1;
                backtrack = Some((star, matched + 1));
            }
            None => return false,
        }
    }
    tokens[p..].iter().all(|tok| matches!(tok, LikeToken::Any))
}
