use std::{cmp::Ordering, fmt};

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};
use serde_yaml::Value as YamlValue;

use crate::literal;

/// A typed cell value.
///
/// Inventory cells start out as `String` and are converted once per field
/// according to the schema's logical type. `Boolean` and `Integer` only show
/// up inside structured literals, rule values and the stamped `owned` column.
#[derive(Debug, Clone)]
pub enum Value {
    Missing,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Date(NaiveDateTime),
    List(Vec<Value>),
    /// Keys keep their source order.
    Mapping(IndexMap<String, Value>),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Missing => "missing",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::List(_) => "list",
            Value::Mapping(_) => "mapping",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Cell text as written to CSV output. Missing values render empty.
    pub fn as_display(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::String(s) => s.clone(),
            Value::Date(dt) => format_datetime(dt),
            other => other.to_literal(),
        }
    }

    /// Text used by substring predicates; `None` for missing cells.
    pub fn textual_form(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            other => Some(other.as_display()),
        }
    }

    /// Literal syntax accepted back by [`literal::parse_literal`].
    pub fn to_literal(&self) -> String {
        let mut out = String::new();
        literal::write_literal(&mut out, self);
        out
    }

    /// Total order used when listing distinct values: missing first, then
    /// booleans, numbers, dates, strings, lists and mappings.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => {
                for (left, right) in a.iter().zip(b.iter()) {
                    let ord = left.total_cmp(right);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Value::Mapping(a), Value::Mapping(b)) => {
                let left = a.iter().sorted_by(|x, y| x.0.cmp(y.0));
                let right = b.iter().sorted_by(|x, y| x.0.cmp(y.0));
                for ((left_key, left_value), (right_key, right_value)) in left.zip(right) {
                    let ord = left_key
                        .cmp(right_key)
                        .then_with(|| left_value.total_cmp(right_value));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Missing => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) | Value::Number(_) => 2,
            Value::Date(_) => 3,
            Value::String(_) => 4,
            Value::List(_) => 5,
            Value::Mapping(_) => 6,
        }
    }

    /// Converts a decoded YAML node (rule field values) into a `Value`.
    pub fn from_yaml(node: &YamlValue) -> Result<Value> {
        let value = match node {
            YamlValue::Null => Value::Missing,
            YamlValue::Bool(b) => Value::Boolean(*b),
            YamlValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    let f = n
                        .as_f64()
                        .ok_or_else(|| anyhow!("Number {n} is out of range"))?;
                    Value::Number(f)
                }
            }
            YamlValue::String(s) => Value::String(s.clone()),
            YamlValue::Sequence(items) => Value::List(
                items
                    .iter()
                    .map(Value::from_yaml)
                    .collect::<Result<Vec<_>>>()?,
            ),
            YamlValue::Mapping(mapping) => {
                let mut entries = IndexMap::new();
                for (key, val) in mapping {
                    let Some(key) = key.as_str() else {
                        bail!("Mapping keys must be strings");
                    };
                    entries.insert(key.to_string(), Value::from_yaml(val)?);
                }
                Value::Mapping(entries)
            }
            YamlValue::Tagged(tagged) => bail!("Tagged value '{}' is not supported", tagged.tag),
        };
        Ok(value)
    }
}

/// Numbers compare across `Integer` and `Number`; everything else compares
/// structurally within its own variant.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Missing, Value::Missing) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Mapping(a), Value::Mapping(b)) => a == b,
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Missing => serializer.serialize_none(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(dt) => serializer.serialize_str(&format_datetime(dt)),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, val) in entries {
                    map.serialize_entry(key, val)?;
                }
                map.end()
            }
        }
    }
}

/// Renders floats the way the inventory exporter writes them: integral values
/// keep a trailing `.0`.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value:?}")
    }
}

pub fn format_datetime(value: &NaiveDateTime) -> String {
    if value.time() == NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.naive_utc());
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Accepts either a calendar date (midnight) or a full date-time.
pub fn parse_date_or_datetime(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    parse_naive_datetime(trimmed)
        .or_else(|_| parse_naive_date(trimmed).map(|date| date.and_time(NaiveTime::MIN)))
        .map_err(|_| anyhow!("Failed to parse '{value}' as date"))
}
