use crate::proto::resultset::column_meta_data::FieldType;
use mysqlx_core::error::XError;
use mysqlx_core::types::{DataRow, DataValue, DateTimeValue, TimeValue};
use prost::encoding::encode_varint;

pub fn encode_uint(value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(10);
    encode_varint(value, &mut buf);
    buf
}

pub fn encode_sint(value: i64) -> Vec<u8> {
    encode_uint(((value << 1) ^ (value >> 63)) as u64)
}

pub fn encode_double(value: f64) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

pub fn encode_float(value: f32) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

/// Octets followed by the NUL terminator that tells them apart from NULL.
pub fn encode_bytes(value: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(value.len() + 1);
    buf.extend_from_slice(value);
    buf.push(0);
    buf
}

/// Scale byte, packed BCD digits, then the sign nibble (`0xc` / `0xd`).
pub fn encode_decimal(value: &str) -> Result<Vec<u8>, XError> {
    let invalid = || XError::BadMessage(format!("invalid decimal value '{value}'"));
    if value.is_empty() {
        return Ok(Vec::new());
    }
    let (sign, unsigned) = match value.as_bytes()[0] {
        b'-' => (0xd_u8, &value[1..]),
        b'+' => (0xc_u8, &value[1..]),
        _ => (0xc_u8, value),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };
    let digits: Vec<u8> = int_part.bytes().chain(frac_part.bytes()).collect();
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }
    let scale = u8::try_from(frac_part.len()).map_err(|_| invalid())?;

    let mut buf = Vec::with_capacity(digits.len() / 2 + 2);
    buf.push(scale);
    let mut pairs = digits.chunks_exact(2);
    for pair in &mut pairs {
        buf.push(((pair[0] - b'0') << 4) | (pair[1] - b'0'));
    }
    match pairs.remainder() {
        [last] => buf.push(((last - b'0') << 4) | sign),
        _ => buf.push(sign << 4),
    }
    Ok(buf)
}

fn push_trimmed(buf: &mut Vec<u8>, parts: &[u64]) {
    let used = parts.iter().rposition(|p| *p != 0).map_or(0, |i| i + 1);
    for part in &parts[..used] {
        encode_varint(*part, buf);
    }
}

/// `year month day [hour minute second [microsecond]]`, trailing zero parts omitted.
pub fn encode_datetime(value: &DateTimeValue, with_time: bool) -> Vec<u8> {
    let mut buf = Vec::with_capacity(12);
    encode_varint(u64::from(value.year), &mut buf);
    encode_varint(u64::from(value.month), &mut buf);
    encode_varint(u64::from(value.day), &mut buf);
    if with_time {
        push_trimmed(
            &mut buf,
            &[
                u64::from(value.hour),
                u64::from(value.minute),
                u64::from(value.second),
                u64::from(value.microsecond),
            ],
        );
    }
    buf
}

pub fn encode_time(value: &TimeValue) -> Vec<u8> {
    let mut buf = vec![u8::from(value.negative)];
    push_trimmed(
        &mut buf,
        &[
            u64::from(value.hours),
            u64::from(value.minutes),
            u64::from(value.seconds),
            u64::from(value.microseconds),
        ],
    );
    buf
}

/// Length-prefixed members; the empty set is the single byte `0x01`.
pub fn encode_set(value: &str) -> Vec<u8> {
    if value.is_empty() {
        return vec![0x01];
    }
    let mut buf = Vec::with_capacity(value.len() + 4);
    for member in value.split(',') {
        encode_varint(member.len() as u64, &mut buf);
        buf.extend_from_slice(member.as_bytes());
    }
    buf
}

pub fn parse_datetime(text: &str) -> Option<DateTimeValue> {
    let (date, time) = match text.trim().split_once([' ', 'T']) {
        Some((d, t)) => (d, Some(t)),
        None => (text.trim(), None),
    };
    let mut ymd = date.splitn(3, '-');
    let mut value = DateTimeValue {
        year: ymd.next()?.parse().ok()?,
        month: ymd.next()?.parse().ok()?,
        day: ymd.next()?.parse().ok()?,
        ..Default::default()
    };
    if let Some(time) = time {
        let t = parse_time(time)?;
        value.hour = u8::try_from(t.hours).ok()?;
        value.minute = t.minutes;
        value.second = t.seconds;
        value.microsecond = t.microseconds;
    }
    Some(value)
}

pub fn parse_time(text: &str) -> Option<TimeValue> {
    let text = text.trim();
    let (negative, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (hms, frac) = match text.split_once('.') {
        Some((hms, frac)) => (hms, frac),
        None => (text, ""),
    };
    let mut parts = hms.splitn(3, ':');
    let hours = parts.next()?.parse().ok()?;
    let minutes = parts.next().map_or(Some(0), |m| m.parse().ok())?;
    let seconds = parts.next().map_or(Some(0), |s| s.parse().ok())?;
    let microseconds = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<6}");
        padded.get(..6)?.parse().ok()?
    };
    Some(TimeValue {
        negative,
        hours,
        minutes,
        seconds,
        microseconds,
    })
}

fn mismatch(field_type: FieldType, value: &DataValue) -> XError {
    XError::BadMessage(format!(
        "cannot encode {value:?} as a {field_type:?} column"
    ))
}

fn text_of(value: &DataValue) -> Vec<u8> {
    match value {
        DataValue::Bytes(b) => b.clone(),
        DataValue::String(s) => s.clone().into_bytes(),
        other => other.to_text().unwrap_or_default().into_bytes(),
    }
}

/// Encodes one cell. NULL is an empty field for every type.
pub fn encode_field(field_type: FieldType, value: &DataValue) -> Result<Vec<u8>, XError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let encoded = match field_type {
        FieldType::Sint => match value {
            DataValue::Int64(v) => encode_sint(*v),
            DataValue::UInt64(v) => {
                encode_sint(i64::try_from(*v).map_err(|_| mismatch(field_type, value))?)
            }
            DataValue::String(s) => {
                encode_sint(s.trim().parse().map_err(|_| mismatch(field_type, value))?)
            }
            _ => return Err(mismatch(field_type, value)),
        },
        FieldType::Uint | FieldType::Bit => match value {
            DataValue::UInt64(v) => encode_uint(*v),
            DataValue::Int64(v) => {
                encode_uint(u64::try_from(*v).map_err(|_| mismatch(field_type, value))?)
            }
            DataValue::String(s) => {
                encode_uint(s.trim().parse().map_err(|_| mismatch(field_type, value))?)
            }
            _ => return Err(mismatch(field_type, value)),
        },
        FieldType::Double => match value {
            DataValue::Float64(v) => encode_double(*v),
            DataValue::Float32(v) => encode_double(f64::from(*v)),
            DataValue::Int64(v) => encode_double(*v as f64),
            DataValue::UInt64(v) => encode_double(*v as f64),
            _ => return Err(mismatch(field_type, value)),
        },
        FieldType::Float => match value {
            DataValue::Float32(v) => encode_float(*v),
            DataValue::Float64(v) => encode_float(*v as f32),
            DataValue::Int64(v) => encode_float(*v as f32),
            _ => return Err(mismatch(field_type, value)),
        },
        FieldType::Bytes | FieldType::Enum => encode_bytes(&text_of(value)),
        FieldType::Decimal => {
            let text = value.to_text().unwrap_or_default();
            encode_decimal(&text)?
        }
        FieldType::Datetime => match value {
            DataValue::Date(d) => encode_datetime(d, false),
            DataValue::DateTime(d) => encode_datetime(d, true),
            DataValue::String(s) => {
                let d = parse_datetime(s).ok_or_else(|| mismatch(field_type, value))?;
                encode_datetime(&d, s.trim().contains([' ', 'T']))
            }
            _ => return Err(mismatch(field_type, value)),
        },
        FieldType::Time => match value {
            DataValue::Time(t) => encode_time(t),
            DataValue::String(s) => {
                encode_time(&parse_time(s).ok_or_else(|| mismatch(field_type, value))?)
            }
            _ => return Err(mismatch(field_type, value)),
        },
        FieldType::Set => encode_set(&String::from_utf8_lossy(&text_of(value))),
    };
    Ok(encoded)
}

/// Encodes one row; the value count must match the column count.
pub fn encode_row(field_types: &[FieldType], row: &DataRow) -> Result<Vec<Vec<u8>>, XError> {
    if row.values.len() != field_types.len() {
        return Err(XError::BadMessage(format!(
            "row has {} values for {} columns",
            row.values.len(),
            field_types.len()
        )));
    }
    field_types
        .iter()
        .zip(row.values.iter())
        .map(|(field_type, value)| encode_field(*field_type, value))
        .collect()
}
