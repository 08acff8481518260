//! MySQL values → record values.
//!
//! Values from the binary protocol arrive typed (`Int`, `Date`, ...); strings,
//! decimals and anything read over the text protocol arrive as `Bytes` and are
//! interpreted by column type. Conversion never fails: a value that cannot be
//! interpreted (e.g. a zero date) is kept as its textual form.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use emulator_types::{Record, Value};
use mysql_async::consts::{ColumnFlags, ColumnType};
use mysql_async::Row;

/// Convert a fetched row into a record, keeping column order.
pub fn row_to_record(row: &Row) -> Record {
    row.columns_ref()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let value = row
                .as_ref(i)
                .map(|v| convert_value(v, column.column_type(), column.flags()))
                .unwrap_or(Value::Null);
            (column.name_str().into_owned(), value)
        })
        .collect()
}

/// Convert one MySQL value given its column metadata.
pub fn convert_value(
    value: &mysql_async::Value,
    column_type: ColumnType,
    flags: ColumnFlags,
) -> Value {
    use mysql_async::Value as My;

    match value {
        My::NULL => Value::Null,
        My::Int(i) => Value::Int(*i),
        My::UInt(u) => Value::UInt(*u),
        // Widen through the shortest decimal form so FLOAT 1.1 stays 1.1.
        My::Float(f) => Value::Float(f.to_string().parse().unwrap_or(*f as f64)),
        My::Double(d) => Value::Float(*d),
        My::Date(year, month, day, hour, min, sec, micro) => {
            let date = NaiveDate::from_ymd_opt(*year as i32, *month as u32, *day as u32);
            let time =
                NaiveTime::from_hms_micro_opt(*hour as u32, *min as u32, *sec as u32, *micro);
            match (column_type, date, time) {
                (ColumnType::MYSQL_TYPE_DATE, Some(d), _) => Value::Date(d),
                (_, Some(d), Some(t)) => Value::DateTime(NaiveDateTime::new(d, t)),
                _ => Value::String(format!(
                    "{year:04}-{month:02}-{day:02} {hour:02}:{min:02}:{sec:02}"
                )),
            }
        }
        My::Time(negative, days, hour, min, sec, micro) => {
            if !*negative && *days == 0 {
                if let Some(t) =
                    NaiveTime::from_hms_micro_opt(*hour as u32, *min as u32, *sec as u32, *micro)
                {
                    return Value::Time(t);
                }
            }
            let hours = *days as u64 * 24 + *hour as u64;
            let sign = if *negative { "-" } else { "" };
            let mut text = format!("{sign}{hours:02}:{min:02}:{sec:02}");
            if *micro != 0 {
                text.push_str(&format!(".{micro:06}"));
            }
            Value::Duration(text)
        }
        My::Bytes(bytes) => convert_bytes(bytes, column_type, flags),
    }
}

fn convert_bytes(bytes: &[u8], column_type: ColumnType, flags: ColumnFlags) -> Value {
    use ColumnType::*;

    if is_binary(column_type, flags) {
        return Value::Bytes(bytes.to_vec());
    }

    if column_type == MYSQL_TYPE_BIT {
        return match bytes {
            [b] if *b <= 1 => Value::Bool(*b == 1),
            _ => Value::Bytes(bytes.to_vec()),
        };
    }

    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s,
        Err(_) => return Value::Bytes(bytes.to_vec()),
    };

    match column_type {
        MYSQL_TYPE_TINY | MYSQL_TYPE_SHORT | MYSQL_TYPE_INT24 | MYSQL_TYPE_LONG
        | MYSQL_TYPE_LONGLONG | MYSQL_TYPE_YEAR => {
            if flags.contains(ColumnFlags::UNSIGNED_FLAG) {
                text.parse().map(Value::UInt).unwrap_or_else(|_| text.into())
            } else {
                text.parse().map(Value::Int).unwrap_or_else(|_| text.into())
            }
        }
        MYSQL_TYPE_FLOAT | MYSQL_TYPE_DOUBLE => {
            text.parse().map(Value::Float).unwrap_or_else(|_| text.into())
        }
        MYSQL_TYPE_DECIMAL | MYSQL_TYPE_NEWDECIMAL => Value::Decimal(text.to_string()),
        MYSQL_TYPE_DATE => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Value::Date)
            .unwrap_or_else(|_| text.into()),
        MYSQL_TYPE_DATETIME | MYSQL_TYPE_DATETIME2 | MYSQL_TYPE_TIMESTAMP
        | MYSQL_TYPE_TIMESTAMP2 => NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
            .map(Value::DateTime)
            .unwrap_or_else(|_| text.into()),
        MYSQL_TYPE_TIME | MYSQL_TYPE_TIME2 => NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
            .map(Value::Time)
            .unwrap_or_else(|_| Value::Duration(text.to_string())),
        _ => text.into(),
    }
}

// BLOB columns carry the binary flag; TEXT columns share the type but not the flag.
fn is_binary(column_type: ColumnType, flags: ColumnFlags) -> bool {
    use ColumnType::*;
    match column_type {
        MYSQL_TYPE_GEOMETRY => true,
        MYSQL_TYPE_TINY_BLOB | MYSQL_TYPE_MEDIUM_BLOB | MYSQL_TYPE_BLOB | MYSQL_TYPE_LONG_BLOB => {
            flags.contains(ColumnFlags::BINARY_FLAG)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mysql_async::Value as My;

    fn convert(value: My, column_type: ColumnType) -> Value {
        convert_value(&value, column_type, ColumnFlags::empty())
    }

    #[test]
    fn test_typed_integers() {
        assert_eq!(convert(My::Int(42), ColumnType::MYSQL_TYPE_LONG), Value::Int(42));
        assert_eq!(
            convert(My::UInt(7), ColumnType::MYSQL_TYPE_LONGLONG),
            Value::UInt(7)
        );
        assert_eq!(convert(My::NULL, ColumnType::MYSQL_TYPE_LONG), Value::Null);
    }

    #[test]
    fn test_float_column_keeps_stored_decimal() {
        let value = convert(My::Float(1.1), ColumnType::MYSQL_TYPE_FLOAT);
        assert_eq!(value, Value::Float(1.1));
        assert_eq!(
            emulator_types::encode_value(&value).unwrap().to_string(),
            "1.1"
        );

        let value = convert(My::Float(-45.123), ColumnType::MYSQL_TYPE_FLOAT);
        assert_eq!(value, Value::Float(-45.123));
    }

    #[test]
    fn test_binary_protocol_datetime() {
        let value = convert(
            My::Date(2024, 1, 5, 10, 30, 0, 0),
            ColumnType::MYSQL_TYPE_DATETIME,
        );
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(value, Value::DateTime(expected));
    }

    #[test]
    fn test_binary_protocol_date_column() {
        let value = convert(My::Date(2019, 3, 2, 0, 0, 0, 0), ColumnType::MYSQL_TYPE_DATE);
        assert_eq!(
            value,
            Value::Date(NaiveDate::from_ymd_opt(2019, 3, 2).unwrap())
        );
    }

    #[test]
    fn test_zero_date_kept_as_text() {
        let value = convert(
            My::Date(0, 0, 0, 0, 0, 0, 0),
            ColumnType::MYSQL_TYPE_DATETIME,
        );
        assert_eq!(value, Value::String("0000-00-00 00:00:00".to_string()));
    }

    #[test]
    fn test_time_out_of_day_range() {
        let value = convert(My::Time(true, 1, 2, 3, 4, 0), ColumnType::MYSQL_TYPE_TIME);
        assert_eq!(value, Value::Duration("-26:03:04".to_string()));

        let value = convert(My::Time(false, 0, 9, 15, 0, 0), ColumnType::MYSQL_TYPE_TIME);
        assert_eq!(
            value,
            Value::Time(NaiveTime::from_hms_opt(9, 15, 0).unwrap())
        );
    }

    #[test]
    fn test_text_protocol_by_column_type() {
        let bytes = |s: &str| My::Bytes(s.as_bytes().to_vec());
        assert_eq!(
            convert(bytes("29"), ColumnType::MYSQL_TYPE_LONG),
            Value::Int(29)
        );
        assert_eq!(
            convert(bytes("12.50"), ColumnType::MYSQL_TYPE_NEWDECIMAL),
            Value::Decimal("12.50".to_string())
        );
        assert_eq!(
            convert(bytes("-45.1"), ColumnType::MYSQL_TYPE_DOUBLE),
            Value::Float(-45.1)
        );
        assert_eq!(
            convert(bytes("art"), ColumnType::MYSQL_TYPE_VAR_STRING),
            Value::String("art".to_string())
        );
        let expected = NaiveDate::from_ymd_opt(2018, 6, 26)
            .unwrap()
            .and_hms_opt(2, 17, 2)
            .unwrap();
        assert_eq!(
            convert(bytes("2018-06-26 02:17:02"), ColumnType::MYSQL_TYPE_TIMESTAMP),
            Value::DateTime(expected)
        );
    }

    #[test]
    fn test_unsigned_text_integer() {
        let value = convert_value(
            &My::Bytes(b"18446744073709551615".to_vec()),
            ColumnType::MYSQL_TYPE_LONGLONG,
            ColumnFlags::UNSIGNED_FLAG,
        );
        assert_eq!(value, Value::UInt(u64::MAX));
    }

    #[test]
    fn test_blob_vs_text() {
        let blob = convert_value(
            &My::Bytes(vec![0xde, 0xad]),
            ColumnType::MYSQL_TYPE_BLOB,
            ColumnFlags::BINARY_FLAG,
        );
        assert_eq!(blob, Value::Bytes(vec![0xde, 0xad]));

        let text = convert(My::Bytes(b"a long description".to_vec()), ColumnType::MYSQL_TYPE_BLOB);
        assert_eq!(text, Value::String("a long description".to_string()));
    }

    #[test]
    fn test_bit_one_is_bool() {
        assert_eq!(
            convert(My::Bytes(vec![1]), ColumnType::MYSQL_TYPE_BIT),
            Value::Bool(true)
        );
        assert_eq!(
            convert(My::Bytes(vec![0]), ColumnType::MYSQL_TYPE_BIT),
            Value::Bool(false)
        );
    }
}
