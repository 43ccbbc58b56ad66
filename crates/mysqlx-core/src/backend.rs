use crate::error::XError;
use crate::types::{ColumnInfo, DataRow};
use async_trait::async_trait;
use std::collections::VecDeque;

/// Account presented during authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub username: String,
    pub hostname: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningLevel {
    Note,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlWarning {
    pub level: WarningLevel,
    pub code: u16,
    pub message: String,
}

/// Single-pass row stream produced by one statement.
#[async_trait]
pub trait ResultSet: Send {
    fn columns(&self) -> &[ColumnInfo];
    async fn next(&mut self) -> Result<Option<DataRow>, XError>;
    async fn close(&mut self) -> Result<(), XError>;
}

/// Per-connection handle into the SQL engine.
#[async_trait]
pub trait QueryContext: Send {
    async fn execute(&mut self, sql: &str) -> Result<Vec<Box<dyn ResultSet>>, XError>;

    fn last_insert_id(&self) -> u64;

    fn affected_rows(&self) -> u64 {
        0
    }

    fn take_warnings(&mut self) -> Vec<SqlWarning> {
        Vec::new()
    }

    fn current_db(&self) -> Option<String>;

    /// Verifies a native-password `proof` computed against `salt`.
    async fn auth(&mut self, identity: &UserIdentity, proof: &[u8], salt: &[u8]) -> bool;

    async fn close(&mut self) -> Result<(), XError>;
}

#[async_trait]
pub trait Driver: Send + Sync {
    async fn open(
        &self,
        connection_id: u32,
        capability: u32,
        collation: u8,
        db: Option<&str>,
    ) -> Result<Box<dyn QueryContext>, XError>;
}

/// Materialized result set.
#[derive(Debug, Clone)]
pub struct VecResultSet {
    columns: Vec<ColumnInfo>,
    rows: VecDeque<DataRow>,
}

impl VecResultSet {
    pub fn new(columns: Vec<ColumnInfo>, rows: Vec<DataRow>) -> Self {
        Self {
            columns,
            rows: rows.into(),
        }
    }
}

#[async_trait]
impl ResultSet for VecResultSet {
    fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    async fn next(&mut self) -> Result<Option<DataRow>, XError> {
        Ok(self.rows.pop_front())
    }

    async fn close(&mut self) -> Result<(), XError> {
        self.rows.clear();
        Ok(())
    }
}

/// Drains every result set, returning all rows of each.
pub async fn collect_rows(
    results: Vec<Box<dyn ResultSet>>,
) -> Result<Vec<Vec<DataRow>>, XError> {
    let mut out = Vec::with_capacity(results.len());
    for mut rs in results {
        let mut rows = Vec::new();
        let drained = loop {
            match rs.next().await {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        rs.close().await?;
        drained?;
        out.push(rows);
    }
    Ok(out)
}
