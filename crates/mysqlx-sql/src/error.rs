use mysqlx_core::error::{codes, XError};

const ER_BAD_NULL: u16 = 1048;
const ER_WRONG_VALUE_COUNT_ON_ROW: u16 = 1136;

pub fn parse_error(detail: &str) -> XError {
    XError::sql(
        codes::ER_PARSE,
        "42000",
        format!("You have an error in your SQL syntax; {detail}"),
    )
}

pub fn no_database() -> XError {
    XError::sql(codes::ER_NO_DB, "3D000", "No database selected")
}

pub fn unknown_database(db: &str) -> XError {
    XError::sql(codes::ER_BAD_DB, "42000", format!("Unknown database '{db}'"))
}

pub fn database_exists(db: &str) -> XError {
    XError::sql(
        codes::ER_DB_CREATE_EXISTS,
        "HY000",
        format!("Can't create database '{db}'; database exists"),
    )
}

pub fn table_exists(table: &str) -> XError {
    XError::TableExists(table.to_string())
}

pub fn unknown_table(qualified: &str) -> XError {
    XError::sql(
        codes::ER_BAD_TABLE,
        "42S02",
        format!("Unknown table '{qualified}'"),
    )
}

pub fn no_such_table(qualified: &str) -> XError {
    XError::sql(
        codes::ER_NO_SUCH_TABLE,
        "42S02",
        format!("Table '{qualified}' doesn't exist"),
    )
}

pub fn unknown_column(column: &str, clause: &str) -> XError {
    XError::sql(
        codes::ER_BAD_FIELD,
        "42S22",
        format!("Unknown column '{column}' in '{clause}'"),
    )
}

pub fn column_cannot_be_null(column: &str) -> XError {
    XError::sql(
        ER_BAD_NULL,
        "23000",
        format!("Column '{column}' cannot be null"),
    )
}

pub fn value_count_mismatch(row: usize) -> XError {
    XError::sql(
        ER_WRONG_VALUE_COUNT_ON_ROW,
        "21S01",
        format!("Column count doesn't match value count at row {row}"),
    )
}

pub fn not_supported(what: &str) -> XError {
    XError::sql(
        codes::ER_NOT_SUPPORTED_YET,
        "42000",
        format!("This version of MySQL doesn't yet support '{what}'"),
    )
}

pub fn lock_poisoned() -> XError {
    XError::Critical("catalog lock poisoned".into())
}
