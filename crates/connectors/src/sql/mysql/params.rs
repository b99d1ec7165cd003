use chrono::{Datelike, Timelike};
use model::core::value::Value;
use mysql_async::Value as MySqlValue;
use mysql_common::params::Params;

pub struct MySqlParam(MySqlValue);

impl MySqlParam {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Int(i) => MySqlParam(MySqlValue::Int(*i)),
            Value::Uint(u) => MySqlParam(MySqlValue::UInt(*u)),
            Value::Float32(f) if !f.is_finite() => MySqlParam(MySqlValue::NULL),
            Value::Float(f) if !f.is_finite() => MySqlParam(MySqlValue::NULL),
            Value::Float32(f) => MySqlParam(MySqlValue::Float(*f)),
            Value::Float(f) => MySqlParam(MySqlValue::Double(*f)),
            Value::String(s) => MySqlParam(MySqlValue::Bytes(s.clone().into_bytes())),
            Value::Bytes(b) => MySqlParam(MySqlValue::Bytes(b.clone())),
            Value::Date(d) => MySqlParam(MySqlValue::Date(
                d.year() as u16,
                d.month() as u8,
                d.day() as u8,
                0,
                0,
                0,
                0,
            )),
            Value::Timestamp(ts) => MySqlParam(MySqlValue::Date(
                ts.year() as u16,
                ts.month() as u8,
                ts.day() as u8,
                ts.hour() as u8,
                ts.minute() as u8,
                ts.second() as u8,
                ts.nanosecond() / 1_000,
            )),
            Value::Null => MySqlParam(MySqlValue::NULL),
        }
    }
}

pub struct MySqlParamStore {
    pub params: Vec<MySqlParam>,
}

impl MySqlParamStore {
    pub fn from_values(values: &[Value]) -> Self {
        let params = values.iter().map(MySqlParam::from_value).collect();
        MySqlParamStore { params }
    }

    pub fn params(&self) -> Params {
        if self.params.is_empty() {
            return Params::Empty;
        }
        let mysql_values: Vec<MySqlValue> = self.params.iter().map(|p| p.0.clone()).collect();
        Params::Positional(mysql_values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_param_mapping() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_micro_opt(7, 8, 9, 10)
            .unwrap();
        let store = MySqlParamStore::from_values(&[
            Value::Int(-1),
            Value::String("a".into()),
            Value::Null,
            Value::Timestamp(ts),
        ]);

        match store.params() {
            Params::Positional(values) => assert_eq!(
                values,
                vec![
                    MySqlValue::Int(-1),
                    MySqlValue::Bytes(b"a".to_vec()),
                    MySqlValue::NULL,
                    MySqlValue::Date(2024, 5, 6, 7, 8, 9, 10),
                ]
            ),
            other => panic!("unexpected params: {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_floats_bind_as_null() {
        let store = MySqlParamStore::from_values(&[
            Value::Float(f64::NAN),
            Value::Float32(f32::INFINITY),
            Value::Float(1.5),
        ]);
        match store.params() {
            Params::Positional(values) => assert_eq!(
                values,
                vec![MySqlValue::NULL, MySqlValue::NULL, MySqlValue::Double(1.5)]
            ),
            other => panic!("unexpected params: {other:?}"),
        }
    }

    #[test]
    fn test_no_values_is_empty_params() {
        assert!(matches!(MySqlParamStore::from_values(&[]).params(), Params::Empty));
    }
}
