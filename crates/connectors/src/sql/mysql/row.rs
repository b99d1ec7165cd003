use crate::sql::base::error::DbError;
use chrono::NaiveDate;
use model::core::value::Value;
use mysql_async::{Column, Row as MySqlRow, Value as MySqlValue, consts::ColumnType};

/// `binary` collation id; columns with it carry raw bytes, not text.
const BINARY_CHARSET: u16 = 63;

pub fn column_names(columns: &[Column]) -> Vec<String> {
    columns
        .iter()
        .map(|col| col.name_str().into_owned())
        .collect()
}

/// Reads every column of a row into model values.
pub fn row_values(row: &MySqlRow) -> Result<Vec<Value>, DbError> {
    let columns = row.columns_ref();
    (0..row.len())
        .map(|i| {
            let raw = row
                .as_ref(i)
                .ok_or_else(|| DbError::Scan(format!("column {i} is not available")))?;
            Ok(match columns.get(i) {
                Some(column) => convert(raw, column.column_type(), column.character_set()),
                None => convert(raw, ColumnType::MYSQL_TYPE_VAR_STRING, 0),
            })
        })
        .collect()
}

pub(crate) fn convert(value: &MySqlValue, column_type: ColumnType, charset: u16) -> Value {
    match value {
        MySqlValue::NULL => Value::Null,
        MySqlValue::Int(i) => Value::Int(*i),
        MySqlValue::UInt(u) => Value::Uint(*u),
        MySqlValue::Float(f) => Value::Float32(*f),
        MySqlValue::Double(d) => Value::Float(*d),
        MySqlValue::Bytes(bytes) => convert_bytes(bytes, column_type, charset),
        MySqlValue::Date(y, m, d, h, mi, s, us) => {
            let date = NaiveDate::from_ymd_opt(i32::from(*y), u32::from(*m), u32::from(*d));
            match date {
                Some(date) if is_date_only(column_type) => Value::Date(date),
                Some(date) => date
                    .and_hms_micro_opt(u32::from(*h), u32::from(*mi), u32::from(*s), *us)
                    .map(Value::Timestamp)
                    .unwrap_or_else(|| Value::String(zero_date(column_type))),
                // zero dates such as 0000-00-00 have no calendar equivalent
                None => Value::String(zero_date(column_type)),
            }
        }
        MySqlValue::Time(negative, days, h, m, s, us) => {
            let hours = u64::from(*days) * 24 + u64::from(*h);
            let sign = if *negative { "-" } else { "" };
            let mut text = format!("{sign}{hours:02}:{m:02}:{s:02}");
            if *us > 0 {
                text.push_str(&format!(".{us:06}"));
            }
            Value::String(text)
        }
    }
}

/// The text protocol sends every value as bytes, so numeric columns are
/// parsed back using the column type.
fn convert_bytes(bytes: &[u8], column_type: ColumnType, charset: u16) -> Value {
    use ColumnType::*;

    let text = std::str::from_utf8(bytes).ok();
    match (column_type, text) {
        (MYSQL_TYPE_TINY | MYSQL_TYPE_SHORT | MYSQL_TYPE_INT24 | MYSQL_TYPE_LONG
        | MYSQL_TYPE_LONGLONG | MYSQL_TYPE_YEAR, Some(t)) => {
            if let Ok(i) = t.parse::<i64>() {
                return Value::Int(i);
            }
            if let Ok(u) = t.parse::<u64>() {
                return Value::Uint(u);
            }
            Value::String(t.to_string())
        }
        (MYSQL_TYPE_FLOAT | MYSQL_TYPE_DOUBLE, Some(t)) => t
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::String(t.to_string())),
        (_, Some(t)) if charset != BINARY_CHARSET => Value::String(t.to_string()),
        _ => Value::Bytes(bytes.to_vec()),
    }
}

fn is_date_only(column_type: ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE
    )
}

fn zero_date(column_type: ColumnType) -> String {
    if is_date_only(column_type) {
        "0000-00-00".to_string()
    } else {
        "0000-00-00 00:00:00".to_string()
    }
}
