use crate::messages::BackendMessage;
use crate::packet::PacketIo;
use crate::proto::resultset::column_meta_data::FieldType;
use crate::proto::resultset::ColumnMetaData;
use crate::row::encode_row;
use mysqlx_core::backend::ResultSet;
use mysqlx_core::error::XError;
use mysqlx_core::types::{ColumnInfo, ColumnType};
use tokio::io::AsyncWrite;

const FLUSH_THRESHOLD: usize = 64 * 1024;

const CONTENT_TYPE_GEOMETRY: u32 = 1;
const CONTENT_TYPE_JSON: u32 = 2;

/// X Protocol field type for a column. The unsigned flag only matters for
/// integer types.
pub fn field_type(column: &ColumnInfo) -> FieldType {
    let ty = column.column_type;
    if ty.is_integer() {
        return if column.is_unsigned() {
            FieldType::Uint
        } else {
            FieldType::Sint
        };
    }
    match ty {
        ColumnType::Double => FieldType::Double,
        ColumnType::Float => FieldType::Float,
        ColumnType::Decimal | ColumnType::NewDecimal => FieldType::Decimal,
        ColumnType::Duration => FieldType::Time,
        ColumnType::Date | ColumnType::NewDate | ColumnType::Datetime | ColumnType::Timestamp => {
            FieldType::Datetime
        }
        ColumnType::Set => FieldType::Set,
        ColumnType::Enum => FieldType::Enum,
        ColumnType::Bit => FieldType::Bit,
        _ => FieldType::Bytes,
    }
}

pub fn column_meta(column: &ColumnInfo) -> ColumnMetaData {
    let content_type = match column.column_type {
        ColumnType::Json => Some(CONTENT_TYPE_JSON),
        ColumnType::Geometry => Some(CONTENT_TYPE_GEOMETRY),
        _ => None,
    };
    ColumnMetaData {
        r#type: field_type(column) as i32,
        name: Some(column.name.clone().into_bytes()),
        original_name: Some(column.org_name.clone().into_bytes()),
        table: Some(column.table.clone().into_bytes()),
        original_table: Some(column.org_table.clone().into_bytes()),
        schema: Some(column.schema.clone().into_bytes()),
        catalog: Some(b"def".to_vec()),
        collation: Some(u64::from(column.charset)),
        fractional_digits: Some(u32::from(column.decimals)),
        length: Some(column.column_length),
        flags: Some(u32::from(column.flags)),
        content_type,
    }
}

/// Streams one result set as column metadata, rows and a fetch-done frame.
///
/// The first row is fetched before any metadata goes out. The result set is
/// closed on every path.
pub async fn write_result_set<S: AsyncWrite + Unpin>(
    io: &mut PacketIo<S>,
    rs: &mut dyn ResultSet,
) -> Result<(), XError> {
    let written = write_rows(io, rs).await;
    let closed = rs.close().await;
    written?;
    closed
}

async fn write_rows<S: AsyncWrite + Unpin>(
    io: &mut PacketIo<S>,
    rs: &mut dyn ResultSet,
) -> Result<(), XError> {
    let mut next = rs.next().await?;
    let columns = rs.columns();
    let types: Vec<FieldType> = columns.iter().map(field_type).collect();
    for column in columns {
        io.write_message(BackendMessage::ColumnMetaData(column_meta(column)));
    }
    while let Some(row) = next {
        let fields = encode_row(&types, &row)?;
        io.write_message(BackendMessage::Row { fields });
        if io.pending_write() >= FLUSH_THRESHOLD {
            io.flush().await?;
        }
        next = rs.next().await?;
    }
    io.write_message(BackendMessage::FetchDone);
    Ok(())
}
