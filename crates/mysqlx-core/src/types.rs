use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DateTimeValue {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TimeValue {
    pub negative: bool,
    pub hours: u32,
    pub minutes: u8,
    pub seconds: u8,
    pub microseconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DataValue {
    Null,
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    /// Exact decimal kept in its textual form, e.g. `-12.34`.
    Decimal(String),
    String(String),
    Bytes(Vec<u8>),
    Date(DateTimeValue),
    DateTime(DateTimeValue),
    Time(TimeValue),
}

impl DataValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(s) | DataValue::Decimal(s) => Some(s),
            _ => None,
        }
    }

    /// Text rendering used for string comparison and text-typed columns.
    pub fn to_text(&self) -> Option<String> {
        match self {
            DataValue::Null => None,
            DataValue::Int64(v) => Some(v.to_string()),
            DataValue::UInt64(v) => Some(v.to_string()),
            DataValue::Float32(v) => Some(v.to_string()),
            DataValue::Float64(v) => Some(v.to_string()),
            DataValue::Decimal(v) | DataValue::String(v) => Some(v.clone()),
            DataValue::Bytes(v) => Some(String::from_utf8_lossy(v).into_owned()),
            DataValue::Date(d) => Some(format!("{:04}-{:02}-{:02}", d.year, d.month, d.day)),
            DataValue::DateTime(d) => Some(format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                d.year, d.month, d.day, d.hour, d.minute, d.second
            )),
            DataValue::Time(t) => Some(format!(
                "{}{:02}:{:02}:{:02}",
                if t.negative { "-" } else { "" },
                t.hours,
                t.minutes,
                t.seconds
            )),
        }
    }
}

/// MySQL column type codes as reported in result metadata.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColumnType {
    Decimal = 0,
    Tiny = 1,
    Short = 2,
    Long = 3,
    Float = 4,
    Double = 5,
    Null = 6,
    Timestamp = 7,
    LongLong = 8,
    Int24 = 9,
    Date = 10,
    Duration = 11,
    Datetime = 12,
    Year = 13,
    NewDate = 14,
    Varchar = 15,
    Bit = 16,
    Json = 245,
    NewDecimal = 246,
    Enum = 247,
    Set = 248,
    TinyBlob = 249,
    MediumBlob = 250,
    LongBlob = 251,
    Blob = 252,
    VarString = 253,
    String = 254,
    Geometry = 255,
}

impl ColumnType {
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ColumnType::Tiny
                | ColumnType::Short
                | ColumnType::Int24
                | ColumnType::Long
                | ColumnType::LongLong
                | ColumnType::Year
        )
    }

    /// Maps a declared SQL type name (`int`, `varchar(32)`, `json`, ...) to a column type.
    pub fn from_sql_name(data_type: &str) -> Self {
        let lower = data_type.to_ascii_lowercase();
        let base = lower
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or("");
        match base {
            "tinyint" | "bool" | "boolean" => ColumnType::Tiny,
            "smallint" => ColumnType::Short,
            "mediumint" => ColumnType::Int24,
            "int" | "integer" => ColumnType::Long,
            "bigint" => ColumnType::LongLong,
            "year" => ColumnType::Year,
            "float" | "real" => ColumnType::Float,
            "double" => ColumnType::Double,
            "decimal" | "numeric" | "dec" => ColumnType::NewDecimal,
            "date" => ColumnType::Date,
            "datetime" => ColumnType::Datetime,
            "timestamp" => ColumnType::Timestamp,
            "time" => ColumnType::Duration,
            "bit" => ColumnType::Bit,
            "json" => ColumnType::Json,
            "enum" => ColumnType::Enum,
            "set" => ColumnType::Set,
            "char" | "binary" => ColumnType::String,
            "tinyblob" | "tinytext" => ColumnType::TinyBlob,
            "mediumblob" | "mediumtext" => ColumnType::MediumBlob,
            "longblob" | "longtext" => ColumnType::LongBlob,
            "blob" | "text" => ColumnType::Blob,
            "geometry" => ColumnType::Geometry,
            _ => ColumnType::VarString,
        }
    }
}

pub mod flags {
    pub const NOT_NULL: u16 = 1;
    pub const PRI_KEY: u16 = 2;
    pub const UNIQUE_KEY: u16 = 4;
    pub const MULTIPLE_KEY: u16 = 8;
    pub const BLOB: u16 = 16;
    pub const UNSIGNED: u16 = 32;
    pub const ZEROFILL: u16 = 64;
    pub const BINARY: u16 = 128;
    pub const AUTO_INCREMENT: u16 = 512;
}

pub const COLLATION_UTF8MB4_GENERAL_CI: u16 = 45;
pub const COLLATION_BINARY: u16 = 63;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnInfo {
    pub schema: String,
    pub table: String,
    pub org_table: String,
    pub name: String,
    pub org_name: String,
    pub column_length: u32,
    pub charset: u16,
    pub flags: u16,
    pub decimals: u8,
    pub column_type: ColumnType,
}

impl ColumnInfo {
    /// A computed column with no backing table, e.g. `SELECT 1`.
    pub fn computed(name: impl Into<String>, column_type: ColumnType) -> Self {
        let charset = match column_type {
            ColumnType::VarString | ColumnType::String | ColumnType::Json => {
                COLLATION_UTF8MB4_GENERAL_CI
            }
            _ => COLLATION_BINARY,
        };
        let name = name.into();
        Self {
            schema: String::new(),
            table: String::new(),
            org_table: String::new(),
            org_name: name.clone(),
            name,
            column_length: 0,
            charset,
            flags: 0,
            decimals: 0,
            column_type,
        }
    }

    pub fn is_unsigned(&self) -> bool {
        self.flags & flags::UNSIGNED != 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataRow {
    pub values: Vec<DataValue>,
}

#[cfg(test)]
mod tests {
    use super::{ColumnType, DataValue};

    #[test]
    fn sql_type_names_map_to_column_types() {
        assert_eq!(ColumnType::from_sql_name("INT"), ColumnType::Long);
        assert_eq!(ColumnType::from_sql_name("varchar(32)"), ColumnType::VarString);
        assert_eq!(ColumnType::from_sql_name("JSON"), ColumnType::Json);
        assert_eq!(ColumnType::from_sql_name("bigint unsigned"), ColumnType::LongLong);
        assert_eq!(ColumnType::from_sql_name("DECIMAL(10,2)"), ColumnType::NewDecimal);
        assert!(ColumnType::Year.is_integer());
        assert!(!ColumnType::Double.is_integer());
    }

    #[test]
    fn text_rendering() {
        assert_eq!(DataValue::Int64(-3).to_text().as_deref(), Some("-3"));
        assert_eq!(DataValue::Null.to_text(), None);
    }
}
