//! Schema-driven cell coercion.
//!
//! Converts the raw string cells of a [`Table`] into typed [`Value`]s
//! according to each column's [`LogicalType`]. Only raw `String` cells are
//! touched, so running the coercer over an already coerced table changes
//! nothing.
//!
//! A single bad cell never fails the batch: structured literals that do not
//! parse are logged and left as their raw text, unparsable numbers and
//! dates become [`Value::Missing`] (or stay as text under
//! [`NumberStyle::Exact`]). Blank cells become missing in every column.

use log::{debug, warn};

use crate::{
    data::{Value, parse_date_or_datetime},
    inventory::Table,
    literal::parse_literal,
    schema::{LogicalType, Schema},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoercionReport {
    /// Cells replaced by a typed value.
    pub converted: usize,
    /// Cells blanked to missing, including failed number/date conversions.
    pub missing: usize,
    /// Cells left as raw text after a parse failure.
    pub warnings: usize,
}

/// How cells of a number column are typed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NumberStyle {
    /// Every number becomes a float; text that does not parse becomes missing.
    #[default]
    Float,
    /// Text containing a `.` becomes a float, other text an integer. Text
    /// that does not parse is kept with a warning.
    Exact,
}

#[derive(Debug, PartialEq)]
enum Coerced {
    Keep,
    Replace(Value),
    Blank,
    Unparsable,
    Reject(String),
}

pub fn coerce_table(table: &mut Table, schema: &Schema) -> CoercionReport {
    coerce_table_with(table, schema, NumberStyle::Float)
}

pub fn coerce_table_with(
    table: &mut Table,
    schema: &Schema,
    numbers: NumberStyle,
) -> CoercionReport {
    let plan = table
        .columns
        .iter()
        .map(|name| schema.logical_type(name).unwrap_or(LogicalType::String))
        .collect::<Vec<_>>();
    let mut report = CoercionReport::default();

    for row in 0..table.records.len() {
        for (col, logical_type) in plan.iter().enumerate() {
            match coerce_value(table.records[row].get(col), *logical_type, numbers) {
                Coerced::Keep => {}
                Coerced::Replace(value) => {
                    table.records[row].set(col, value);
                    report.converted += 1;
                }
                Coerced::Blank => {
                    table.records[row].set(col, Value::Missing);
                    report.missing += 1;
                }
                Coerced::Unparsable => {
                    debug!(
                        "Field '{}' in {} is not a valid {logical_type}; treating as missing",
                        table.columns[col],
                        table.row_label(row)
                    );
                    table.records[row].set(col, Value::Missing);
                    report.missing += 1;
                }
                Coerced::Reject(reason) => {
                    warn!(
                        "Failed to parse field '{}' in {}: {reason}",
                        table.columns[col],
                        table.row_label(row)
                    );
                    report.warnings += 1;
                }
            }
        }
    }
    report
}

fn coerce_value(value: &Value, logical_type: LogicalType, numbers: NumberStyle) -> Coerced {
    let Value::String(raw) = value else {
        return Coerced::Keep;
    };
    if raw.is_empty() {
        return Coerced::Blank;
    }
    match logical_type {
        LogicalType::String => Coerced::Keep,
        LogicalType::Number => match numbers {
            NumberStyle::Float => match raw.trim().parse::<f64>() {
                Ok(number) if !number.is_nan() => Coerced::Replace(Value::Number(number)),
                _ => Coerced::Unparsable,
            },
            NumberStyle::Exact => exact_number(raw.trim())
                .map(Coerced::Replace)
                .unwrap_or_else(|| Coerced::Reject(format!("'{raw}' is not a number"))),
        },
        LogicalType::Date => match parse_date_or_datetime(raw) {
            Ok(parsed) => Coerced::Replace(Value::Date(parsed)),
            Err(_) => Coerced::Unparsable,
        },
        LogicalType::List | LogicalType::Mapping => match parse_literal(raw) {
            Ok(parsed @ Value::List(_)) if logical_type == LogicalType::List => {
                Coerced::Replace(parsed)
            }
            Ok(parsed @ Value::Mapping(_)) if logical_type == LogicalType::Mapping => {
                Coerced::Replace(parsed)
            }
            Ok(other) => Coerced::Reject(format!(
                "expected a {logical_type} literal, found {}",
                other.kind()
            )),
            Err(err) => Coerced::Reject(err.to_string()),
        },
    }
}

fn exact_number(text: &str) -> Option<Value> {
    if text.contains('.') {
        text.parse::<f64>()
            .ok()
            .filter(|number| !number.is_nan())
            .map(Value::Number)
    } else {
        text.parse::<i64>().ok().map(Value::Integer)
    }
}
