use crate::error::parse_error;
use mysqlx_core::error::XError;
use sqlparser::ast::Statement;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

pub fn parse_sql(sql: &str) -> Result<Vec<Statement>, XError> {
    let dialect = MySqlDialect {};
    Parser::parse_sql(&dialect, sql).map_err(|e| parse_error(&e.to_string()))
}
