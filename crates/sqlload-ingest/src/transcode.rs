//! Row transcoding: raw text fields to typed values

use crate::error::{LoadError, Result};
use crate::schema::{ColumnSpec, ColumnType};

/// A single typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

/// One transcoded record; always as long as the column list.
pub type TypedRow = Vec<Value>;

/// Convert one raw record into a [`TypedRow`].
///
/// `line` is the record's line in the input and only feeds error messages.
pub fn transcode_record(
    columns: &[ColumnSpec],
    fields: &[&str],
    null_sentinel: &str,
    line: u64,
) -> Result<TypedRow> {
    if fields.len() != columns.len() {
        return Err(LoadError::Schema {
            line,
            expected: columns.len(),
            found: fields.len(),
        });
    }

    columns
        .iter()
        .zip(fields)
        .map(|(column, raw)| {
            if column.nullable && *raw == null_sentinel {
                return Ok(Value::Null);
            }
            parse_value(column.column_type, raw).ok_or_else(|| LoadError::Parse {
                line,
                column: column.name.clone(),
                position: column.position,
                expected: column.column_type,
                value: raw.to_string(),
            })
        })
        .collect()
}

/// Parse a raw value according to its column type.
///
/// Returns `None` when the value does not fit the type.
pub fn parse_value(column_type: ColumnType, raw: &str) -> Option<Value> {
    match column_type {
        ColumnType::Int => raw.parse::<i64>().ok().map(Value::Int),
        ColumnType::Float => parse_float(raw).map(Value::Float),
        ColumnType::Bool => parse_bool(raw).map(Value::Bool),
        ColumnType::String => Some(Value::Text(raw.to_string())),
    }
}

/// Float parsing that rejects magnitudes beyond `f64`.
///
/// `1e400` would otherwise round to infinity. Spelled-out `inf` and
/// `infinity` (any case, optionally signed) are still accepted.
pub fn parse_float(raw: &str) -> Option<f64> {
    let value = raw.parse::<f64>().ok()?;
    if value.is_infinite() {
        let unsigned = raw.trim_start_matches(['+', '-']);
        let spelled = unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity");
        if !spelled {
            return None;
        }
    }
    Some(value)
}

/// Boolean parsing with a fixed precedence.
///
/// Anything starting with `t` or `y` (any case) is true, so `"totally"`
/// counts. Otherwise the value must be an integer and is true when
/// positive. `"f"` and `"no"` are not accepted.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('t') | Some('y') => Some(true),
        _ => raw.parse::<i64>().ok().map(|n| n > 0),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn column(name: &str, column_type: ColumnType, nullable: bool, position: usize) -> ColumnSpec {
        ColumnSpec {
            name: name.to_string(),
            column_type,
            nullable,
            position,
        }
    }

    fn people() -> Vec<ColumnSpec> {
        vec![
            column("id", ColumnType::Int, false, 0),
            column("name", ColumnType::String, true, 1),
            column("height", ColumnType::Float, true, 2),
            column("member", ColumnType::Bool, false, 3),
        ]
    }

    #[test]
    fn test_transcode_typed_row() {
        let row = transcode_record(&people(), &["42", "Ada", "1.68", "yes"], "NA", 2).unwrap();
        assert_eq!(
            row,
            vec![
                Value::Int(42),
                Value::Text("Ada".to_string()),
                Value::Float(1.68),
                Value::Bool(true),
            ]
        );
    }

    #[test]
    fn test_null_sentinel_in_nullable_columns() {
        let row = transcode_record(&people(), &["1", "NA", "NA", "0"], "NA", 2).unwrap();
        assert_eq!(row[1], Value::Null);
        assert_eq!(row[2], Value::Null);
        assert_eq!(row[3], Value::Bool(false));
    }

    #[test]
    fn test_null_sentinel_is_literal_in_non_nullable_columns() {
        let columns = vec![
            column("tag", ColumnType::String, false, 0),
            column("count", ColumnType::Int, false, 1),
        ];

        let row = transcode_record(&columns, &["", "3"], "", 2).unwrap();
        assert_eq!(row[0], Value::Text(String::new()));

        // the empty sentinel is not a number, so a non-nullable int fails
        let err = transcode_record(&columns, &["x", ""], "", 3).unwrap_err();
        assert!(matches!(err, LoadError::Parse { position: 1, .. }));
    }

    #[test]
    fn test_sentinel_must_match_exactly() {
        let row = transcode_record(&people(), &["1", " NA", "2.5", "t"], "NA", 2).unwrap();
        assert_eq!(row[1], Value::Text(" NA".to_string()));
    }

    #[test]
    fn test_field_count_mismatch_is_schema_error() {
        let err = transcode_record(&people(), &["1", "Ada"], "NA", 9).unwrap_err();
        match err {
            LoadError::Schema {
                line,
                expected,
                found,
            } => {
                assert_eq!(line, 9);
                assert_eq!(expected, 4);
                assert_eq!(found, 2);
            },
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_int_is_parse_error() {
        let err = transcode_record(&people(), &["abc", "Ada", "1.0", "t"], "NA", 5).unwrap_err();
        match err {
            LoadError::Parse {
                line,
                column,
                expected,
                value,
                ..
            } => {
                assert_eq!(line, 5);
                assert_eq!(column, "id");
                assert_eq!(expected, ColumnType::Int);
                assert_eq!(value, "abc");
            },
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_value(ColumnType::Int, "-17"), Some(Value::Int(-17)));
        assert_eq!(parse_value(ColumnType::Int, "1.5"), None);
        assert_eq!(parse_value(ColumnType::Int, "9223372036854775808"), None);
        assert_eq!(parse_value(ColumnType::Float, "2.5e3"), Some(Value::Float(2500.0)));
        assert_eq!(parse_value(ColumnType::Float, "twelve"), None);
    }

    #[test]
    fn test_out_of_range_float_is_rejected() {
        assert_eq!(parse_float("1e400"), None);
        assert_eq!(parse_float("-1e400"), None);
        assert_eq!(parse_float("inf"), Some(f64::INFINITY));
        assert_eq!(parse_float("-Infinity"), Some(f64::NEG_INFINITY));
        assert!(parse_float("NaN").unwrap().is_nan());
        assert_eq!(parse_float("1e-400"), Some(0.0));

        let columns = vec![column("score", ColumnType::Float, false, 0)];
        let err = transcode_record(&columns, &["1e400"], "", 3).unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 3, expected: ColumnType::Float, .. }));
    }

    #[test]
    fn test_parse_bool_precedence() {
        assert_eq!(parse_bool("T"), Some(true));
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("Y"), Some(true));
        assert_eq!(parse_bool("totally"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("12"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("-3"), Some(false));
        assert_eq!(parse_bool("f"), None);
        assert_eq!(parse_bool("no"), None);
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_non_boolean_is_parse_error() {
        let columns = vec![column("ok", ColumnType::Bool, false, 0)];
        let err = transcode_record(&columns, &["maybe"], "", 2).unwrap_err();
        assert!(matches!(err, LoadError::Parse { expected: ColumnType::Bool, .. }));
    }
}
