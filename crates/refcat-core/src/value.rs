//! Runtime values and catalog rows.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::catalog::ScalarType;
use crate::error::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";
const STORED_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A scalar value read from or written to a catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time without timezone.
    DateTime(NaiveDateTime),
}

impl Value {
    /// Get the value as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Decode a stored value according to the column's scalar type.
    pub fn from_sql(scalar: ScalarType, raw: ValueRef<'_>) -> Result<Self, Error> {
        let value = match (scalar, raw) {
            (_, ValueRef::Null) => Value::Null,
            (ScalarType::Boolean, ValueRef::Integer(i)) => Value::Bool(i != 0),
            (ScalarType::Integer | ScalarType::BigInteger, ValueRef::Integer(i)) => Value::Int(i),
            (ScalarType::Float, ValueRef::Real(f)) => Value::Float(f),
            (ScalarType::Float, ValueRef::Integer(i)) => Value::Float(i as f64),
            (ScalarType::String | ScalarType::Text, ValueRef::Text(bytes)) => {
                Value::Text(utf8(bytes)?.to_string())
            }
            (ScalarType::Date, ValueRef::Text(bytes)) => {
                let text = utf8(bytes)?;
                let date = NaiveDate::parse_from_str(text, DATE_FORMAT)
                    .map_err(|e| Error::InvalidData(format!("bad date {:?}: {}", text, e)))?;
                Value::Date(date)
            }
            (ScalarType::DateTime, ValueRef::Text(bytes)) => {
                let text = utf8(bytes)?;
                let ts = parse_datetime(text)
                    .ok_or_else(|| Error::InvalidData(format!("bad datetime {:?}", text)))?;
                Value::DateTime(ts)
            }
            (scalar, raw) => {
                return Err(Error::InvalidData(format!(
                    "stored {:?} value does not match column type {}",
                    raw.data_type(),
                    scalar
                )))
            }
        };
        Ok(value)
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, Error> {
    std::str::from_utf8(bytes).map_err(|e| Error::InvalidData(e.to_string()))
}

/// Parse a datetime in RFC 3339 or `YYYY-MM-DD[T ]HH:MM:SS[.f]` form.
///
/// Offsets are normalized to UTC.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.naive_utc());
    }
    NaiveDateTime::parse_from_str(text, STORED_DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let out = match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::Int(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Date(d) => ToSqlOutput::Owned(SqlValue::Text(d.format(DATE_FORMAT).to_string())),
            Value::DateTime(ts) => {
                ToSqlOutput::Owned(SqlValue::Text(ts.format(STORED_DATETIME_FORMAT).to_string()))
            }
        };
        Ok(out)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Date(d) => serializer.collect_str(&d.format(DATE_FORMAT)),
            Value::DateTime(ts) => serializer.collect_str(&ts.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

/// A row projected for transport: column name to value, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogRow {
    fields: Vec<(String, Value)>,
}

impl CatalogRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an existing value of the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Get a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Value)> for CatalogRow {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut row = CatalogRow::new();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}

impl Serialize for CatalogRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
