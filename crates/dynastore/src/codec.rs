//! DynamoDB attribute conversion.
//!
//! Pure functions for converting between native [`Value`]s and DynamoDB
//! `AttributeValue`s. These are testable in isolation without DynamoDB
//! access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use serde_json::Number;

use dynastore_core::config::{FieldConfig, FieldType};
use dynastore_core::{Record, Value};

/// Field metadata driving the date post-pass; `None` means no declared
/// fields for the entity kind.
pub type FieldMap = HashMap<String, FieldConfig>;

/// Converts a native value to its wire form.
///
/// Date/time values always become RFC 3339 strings; nesting is preserved
/// to arbitrary depth.
pub fn encode_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::DateTime(dt) => AttributeValue::S(dt.to_rfc3339()),
        Value::List(items) => AttributeValue::L(items.iter().map(encode_value).collect()),
        Value::Map(entries) => AttributeValue::M(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), encode_value(v)))
                .collect(),
        ),
    }
}

/// Converts a wire attribute back to a native value.
///
/// No validation happens here: string sets and number sets degrade to
/// plain lists, and anything the native representation cannot express
/// (binary payloads) degrades to null.
pub fn decode_value(attribute: &AttributeValue) -> Value {
    match attribute {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::N(n) => parse_number(n),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::L(items) => Value::List(items.iter().map(decode_value).collect()),
        AttributeValue::M(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), decode_value(v)))
                .collect(),
        ),
        AttributeValue::Ss(items) => {
            Value::List(items.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(items) => Value::List(items.iter().map(|n| parse_number(n)).collect()),
        _ => Value::Null,
    }
}

fn parse_number(text: &str) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::Number(Number::from(i));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Value::Number(Number::from(u));
    }
    match text.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(n) => Value::Number(n),
        // Unparseable numeric payloads pass through as text.
        None => Value::String(text.to_string()),
    }
}

/// Encodes a record into a wire item. Absent attributes are simply not
/// present; explicit nulls are preserved.
pub fn encode_record(record: &Record) -> HashMap<String, AttributeValue> {
    record
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect()
}

/// Decodes a wire item into a record, then runs the date post-pass:
/// every field declared with semantic type `date` has string values
/// converted back to date/time values. Strings that fail to parse pass
/// through unchanged.
pub fn decode_record(
    item: &HashMap<String, AttributeValue>,
    fields: Option<&FieldMap>,
) -> Record {
    let mut record: Record = item
        .iter()
        .map(|(name, attribute)| (name.clone(), decode_value(attribute)))
        .collect();

    if let Some(fields) = fields {
        for (name, field) in fields {
            if field.field_type != Some(FieldType::Date) {
                continue;
            }
            let Some(Value::String(text)) = record.get(name) else {
                continue;
            };
            if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                let utc: DateTime<Utc> = parsed.with_timezone(&Utc);
                record.insert(name.clone(), Value::DateTime(utc));
            }
        }
    }

    record
}
