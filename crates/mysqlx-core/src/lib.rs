pub mod auth;
pub mod backend;
pub mod catalog;
pub mod error;
pub mod types;

pub use backend::{Driver, QueryContext, ResultSet, UserIdentity, VecResultSet};
pub use catalog::{classify_table, CatalogColumn, ObjectKind};
pub use error::{SqlError, XError};
pub use types::{ColumnInfo, ColumnType, DataRow, DataValue};
