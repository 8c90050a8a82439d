//! COPY text-format encoding of typed rows.

use std::io::Write;

use pg_escape::quote_identifier;

use crate::schema::ColumnSpec;
use crate::transcode::{TypedRow, Value};

/// Render the COPY statement for `table` bound to the given columns.
///
/// The table name is used verbatim so callers can pass `schema.table`.
/// Column names are quoted whenever they are not plain lowercase
/// identifiers, so a header `Name` only matches a column created as
/// `"Name"`, never one created unquoted as `name`.
pub fn copy_statement(table: &str, columns: &[ColumnSpec]) -> String {
    let col_list = columns
        .iter()
        .map(|c| quote_identifier(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!("COPY {} ({}) FROM STDIN WITH (FORMAT text)", table, col_list)
}

/// Append one row in COPY text format:
/// - fields separated by tab, row terminated by newline
/// - NULL: `\N`
/// - Strings: backslash-escape `\`, tab, newline, carriage return; strip null bytes
/// - Booleans: `t` / `f`
/// - Floats: NaN and infinities as literals
pub fn encode_row(buf: &mut Vec<u8>, row: &TypedRow) {
    for (pos, value) in row.iter().enumerate() {
        if pos > 0 {
            buf.push(b'\t');
        }
        encode_value(buf, value);
    }
    buf.push(b'\n');
}

fn encode_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => buf.extend_from_slice(b"\\N"),
        Value::Int(v) => {
            let _ = write!(buf, "{}", v);
        },
        Value::Float(v) => {
            if v.is_nan() {
                buf.extend_from_slice(b"NaN");
            } else if v.is_infinite() {
                if *v > 0.0 {
                    buf.extend_from_slice(b"Infinity");
                } else {
                    buf.extend_from_slice(b"-Infinity");
                }
            } else {
                let _ = write!(buf, "{}", v);
            }
        },
        Value::Bool(v) => buf.push(if *v { b't' } else { b'f' }),
        Value::Text(s) => {
            for byte in s.bytes() {
                match byte {
                    b'\\' => buf.extend_from_slice(b"\\\\"),
                    b'\t' => buf.extend_from_slice(b"\\t"),
                    b'\n' => buf.extend_from_slice(b"\\n"),
                    b'\r' => buf.extend_from_slice(b"\\r"),
                    0 => {},
                    _ => buf.push(byte),
                }
            }
        },
    }
}
