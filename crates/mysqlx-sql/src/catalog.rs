use crate::error::{
    database_exists, no_such_table, table_exists, unknown_database, unknown_table,
};
use mysqlx_core::catalog::CatalogColumn;
use mysqlx_core::error::XError;
use mysqlx_core::types::{
    flags, ColumnInfo, ColumnType, DataRow, COLLATION_BINARY, COLLATION_UTF8MB4_GENERAL_CI,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub type SharedCatalog = Arc<Mutex<Catalog>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableColumn {
    pub name: String,
    /// Declared type, lower-cased, e.g. `varchar(32)` or `bigint unsigned`.
    pub sql_type: String,
    pub column_type: ColumnType,
    pub unsigned: bool,
    pub nullable: bool,
    pub primary: bool,
    pub auto_increment: bool,
    pub generation_expression: Option<String>,
}

impl TableColumn {
    pub fn new(name: impl Into<String>, sql_type: &str) -> Self {
        let sql_type = sql_type.to_ascii_lowercase();
        Self {
            name: name.into(),
            column_type: ColumnType::from_sql_name(&sql_type),
            unsigned: sql_type.contains("unsigned"),
            sql_type,
            nullable: true,
            primary: false,
            auto_increment: false,
            generation_expression: None,
        }
    }

    /// Type name without length or modifiers, as `information_schema` reports it.
    pub fn data_type(&self) -> String {
        self.sql_type
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .to_string()
    }

    fn is_text(&self) -> bool {
        matches!(
            self.column_type,
            ColumnType::VarString
                | ColumnType::Varchar
                | ColumnType::String
                | ColumnType::TinyBlob
                | ColumnType::Blob
                | ColumnType::MediumBlob
                | ColumnType::LongBlob
                | ColumnType::Json
                | ColumnType::Enum
                | ColumnType::Set
        ) && !self.sql_type.contains("blob")
            && !self.sql_type.contains("binary")
    }

    pub fn column_length(&self) -> u32 {
        let declared = self
            .sql_type
            .split_once('(')
            .and_then(|(_, rest)| rest.split([',', ')']).next())
            .and_then(|n| n.trim().parse::<u32>().ok());
        match (declared, self.column_type) {
            (Some(n), _) if self.is_text() => n.saturating_mul(4),
            (Some(n), _) => n,
            (None, ColumnType::Tiny) => 4,
            (None, ColumnType::Short) => 6,
            (None, ColumnType::Int24) => 9,
            (None, ColumnType::Long) => 11,
            (None, ColumnType::LongLong) => 20,
            (None, ColumnType::Double) => 22,
            (None, ColumnType::Float) => 12,
            (None, ColumnType::Json) | (None, ColumnType::LongBlob) => u32::MAX,
            (None, ColumnType::Blob) => 65_535,
            (None, ColumnType::Datetime) | (None, ColumnType::Timestamp) => 19,
            (None, ColumnType::Date) => 10,
            (None, ColumnType::Duration) => 10,
            (None, _) => 255,
        }
    }

    pub fn flags(&self) -> u16 {
        let mut out = 0;
        if !self.nullable {
            out |= flags::NOT_NULL;
        }
        if self.primary {
            out |= flags::PRI_KEY;
        }
        if self.unsigned {
            out |= flags::UNSIGNED;
        }
        if self.auto_increment {
            out |= flags::AUTO_INCREMENT;
        }
        if !self.is_text() {
            out |= flags::BINARY;
        }
        out
    }

    pub fn column_info(&self, schema: &str, table: &str, label: Option<&str>) -> ColumnInfo {
        ColumnInfo {
            schema: schema.to_string(),
            table: table.to_string(),
            org_table: table.to_string(),
            name: label.unwrap_or(&self.name).to_string(),
            org_name: self.name.clone(),
            column_length: self.column_length(),
            charset: if self.is_text() {
                COLLATION_UTF8MB4_GENERAL_CI
            } else {
                COLLATION_BINARY
            },
            flags: self.flags(),
            decimals: 0,
            column_type: self.column_type,
        }
    }

    pub fn catalog_column(&self) -> CatalogColumn {
        CatalogColumn {
            name: self.name.clone(),
            data_type: self.data_type(),
            generation_expression: self.generation_expression.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<TableColumn>,
    pub rows: Vec<DataRow>,
    pub auto_increment: u64,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<TableColumn>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
            auto_increment: 1,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Default, Clone)]
pub struct Database {
    pub name: String,
    pub tables: BTreeMap<String, TableSchema>,
}

#[derive(Debug, Default)]
pub struct Catalog {
    databases: BTreeMap<String, Database>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            databases: BTreeMap::new(),
        }
    }

    /// Returns `false` when the database already existed and `if_not_exists` was set.
    pub fn create_database(&mut self, name: &str, if_not_exists: bool) -> Result<bool, XError> {
        if self.databases.contains_key(name) {
            return if if_not_exists {
                Ok(false)
            } else {
                Err(database_exists(name))
            };
        }
        self.databases.insert(
            name.to_string(),
            Database {
                name: name.to_string(),
                tables: BTreeMap::new(),
            },
        );
        Ok(true)
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.databases.contains_key(name)
    }

    pub fn database(&self, name: &str) -> Result<&Database, XError> {
        self.databases
            .get(name)
            .ok_or_else(|| unknown_database(name))
    }

    pub fn databases(&self) -> impl Iterator<Item = &Database> {
        self.databases.values()
    }

    pub fn create_table(
        &mut self,
        db: &str,
        schema: TableSchema,
        if_not_exists: bool,
    ) -> Result<bool, XError> {
        let database = self
            .databases
            .get_mut(db)
            .ok_or_else(|| unknown_database(db))?;
        if database.tables.contains_key(&schema.name) {
            return if if_not_exists {
                Ok(false)
            } else {
                Err(table_exists(&schema.name))
            };
        }
        database.tables.insert(schema.name.clone(), schema);
        Ok(true)
    }

    pub fn drop_table(&mut self, db: &str, name: &str, if_exists: bool) -> Result<bool, XError> {
        let removed = self
            .databases
            .get_mut(db)
            .and_then(|database| database.tables.remove(name));
        match removed {
            Some(_) => Ok(true),
            None if if_exists => Ok(false),
            None => Err(unknown_table(&format!("{db}.{name}"))),
        }
    }

    pub fn table(&self, db: &str, name: &str) -> Result<&TableSchema, XError> {
        self.database(db)?
            .tables
            .get(name)
            .ok_or_else(|| no_such_table(&format!("{db}.{name}")))
    }

    pub fn table_mut(&mut self, db: &str, name: &str) -> Result<&mut TableSchema, XError> {
        self.databases
            .get_mut(db)
            .ok_or_else(|| unknown_database(db))?
            .tables
            .get_mut(name)
            .ok_or_else(|| no_such_table(&format!("{db}.{name}")))
    }
}
