//! Payload validation against a derived schema.

use serde_json::{Map, Value as Json};
use tracing::debug;

use crate::catalog::ScalarType;
use crate::error::{FieldIssue, ValidationError};
use crate::value::{parse_date, parse_datetime, Value};

use super::{SchemaField, ValidationSchema};

/// Records that passed validation, ready for a batch insert.
///
/// Every row holds one value per column, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBatch {
    /// Column names.
    pub columns: Vec<String>,
    /// Row values aligned with `columns`.
    pub rows: Vec<Vec<Value>>,
}

impl ValidatedBatch {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the batch has no records.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a value of a record by column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }
}

impl ValidationSchema {
    /// Validate a payload holding one record (an object) or many (an array
    /// of objects).
    ///
    /// The whole payload is checked before anything is returned; issues from
    /// every record are collected into a single error.
    pub fn validate_payload(&self, payload: &Json) -> Result<ValidatedBatch, ValidationError> {
        let mut issues = Vec::new();
        let mut rows = Vec::new();

        match payload {
            Json::Object(record) => match self.check_record(record, None) {
                Ok(row) => rows.push(row),
                Err(mut found) => issues.append(&mut found),
            },
            Json::Array(records) if records.is_empty() => {
                issues.push(record_issue(None, "payload contains no records"));
            }
            Json::Array(records) => {
                for (i, record) in records.iter().enumerate() {
                    let Json::Object(record) = record else {
                        issues.push(record_issue(Some(i), "record must be a JSON object"));
                        continue;
                    };
                    match self.check_record(record, Some(i)) {
                        Ok(row) => rows.push(row),
                        Err(mut found) => issues.append(&mut found),
                    }
                }
            }
            _ => issues.push(record_issue(None, "payload must be an object or an array of objects")),
        }

        if !issues.is_empty() {
            return Err(ValidationError {
                schema: self.name.clone(),
                issues,
            });
        }

        Ok(ValidatedBatch {
            columns: self.fields.iter().map(|f| f.name.clone()).collect(),
            rows,
        })
    }

    /// Validate a single record.
    pub fn validate_record(&self, record: &Map<String, Json>) -> Result<Vec<Value>, ValidationError> {
        self.check_record(record, None).map_err(|issues| ValidationError {
            schema: self.name.clone(),
            issues,
        })
    }

    fn check_record(
        &self,
        record: &Map<String, Json>,
        index: Option<usize>,
    ) -> Result<Vec<Value>, Vec<FieldIssue>> {
        let mut issues = Vec::new();
        let mut values = Vec::with_capacity(self.fields.len());

        for field in &self.fields {
            match check_field(field, record.get(&field.name)) {
                Ok(value) => values.push(value),
                Err(message) => issues.push(FieldIssue {
                    record: index,
                    field: field.name.clone(),
                    message,
                }),
            }
        }

        for key in record.keys().filter(|k| self.field(k).is_none()) {
            debug!(schema = %self.name, field = %key, "ignoring unknown field");
        }

        if issues.is_empty() {
            Ok(values)
        } else {
            Err(issues)
        }
    }
}

fn record_issue(index: Option<usize>, message: &str) -> FieldIssue {
    FieldIssue {
        record: index,
        field: String::new(),
        message: message.to_string(),
    }
}

fn check_field(field: &SchemaField, raw: Option<&Json>) -> Result<Value, String> {
    match raw {
        None if field.required => Err("field required".to_string()),
        None => Ok(field.default.clone().unwrap_or(Value::Null)),
        Some(Json::Null) if field.required => Err("field may not be null".to_string()),
        Some(Json::Null) => Ok(Value::Null),
        Some(json) => coerce(field.scalar, json),
    }
}

fn coerce(scalar: ScalarType, json: &Json) -> Result<Value, String> {
    let mismatch = || format!("expected {}, got {}", scalar.describe(), json_kind(json));

    match scalar {
        ScalarType::Boolean => json.as_bool().map(Value::Bool).ok_or_else(mismatch),
        ScalarType::Integer | ScalarType::BigInteger => {
            // Both widths are stored as 64-bit SQLite integers.
            json.as_i64()
                .or_else(|| json.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15).map(|f| f as i64))
                .map(Value::Int)
                .ok_or_else(mismatch)
        }
        ScalarType::Float => json.as_f64().map(Value::Float).ok_or_else(mismatch),
        ScalarType::String | ScalarType::Text => json
            .as_str()
            .map(|s| Value::Text(s.to_string()))
            .ok_or_else(mismatch),
        ScalarType::Date => json
            .as_str()
            .and_then(parse_date)
            .map(Value::Date)
            .ok_or_else(mismatch),
        ScalarType::DateTime => json
            .as_str()
            .and_then(parse_datetime)
            .map(Value::DateTime)
            .ok_or_else(mismatch),
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(n) if n.is_f64() => "number",
        Json::Number(_) => "integer",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
