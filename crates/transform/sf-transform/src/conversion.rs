//! Generic value <-> Rhai `Dynamic` conversion.
//!
//! This is the only place Rhai values are inspected. Everything leaving this
//! module is a typed [`Value`].

use rhai::{Array, Dynamic, Map};
use sf_error::{Result, TransformError};
use sf_types::{GenericRecord, Value};

/// Converts a generic record into a Rhai object map.
pub fn record_to_dynamic(record: GenericRecord) -> Dynamic {
    let mut map = Map::new();
    for (name, value) in record {
        map.insert(name.into(), value_to_dynamic(value));
    }
    map.into()
}

/// Converts a generic value into a Rhai value.
pub fn value_to_dynamic(value: Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Str(s) => Dynamic::from(s),
        Value::Int(i) => Dynamic::from(i),
        Value::Float(f) => Dynamic::from(f),
        Value::Bool(b) => Dynamic::from(b),
        Value::Array(items) => {
            let array: Array = items.into_iter().map(value_to_dynamic).collect();
            array.into()
        }
        Value::Map(record) => record_to_dynamic(record),
    }
}

/// Converts a script result into a generic record.
///
/// # Errors
///
/// Returns [`TransformError::UserCode`] if the script returned nothing, a
/// non-map value, or a map holding a value with no generic form.
pub fn dynamic_to_record(result: Dynamic) -> Result<GenericRecord> {
    if result.is_unit() {
        return Err(TransformError::UserCode(
            "transform returned nothing; the script must evaluate to the record map".to_string(),
        )
        .into());
    }

    let type_name = result.type_name();
    let map = result.try_cast::<Map>().ok_or_else(|| {
        TransformError::UserCode(format!("transform returned {type_name}, expected a map"))
    })?;

    map_to_record(map, "")
}

fn map_to_record(map: Map, path: &str) -> Result<GenericRecord> {
    let mut record = GenericRecord::with_capacity(map.len());
    for (key, value) in map {
        let field = if path.is_empty() {
            key.to_string()
        } else {
            format!("{path}.{key}")
        };
        let value = dynamic_to_value(value, &field)?;
        record.insert(key.to_string(), value);
    }
    Ok(record)
}

/// Converts one Rhai value. `field` names the value in error messages.
pub fn dynamic_to_value(value: Dynamic, field: &str) -> Result<Value> {
    if value.is_unit() {
        return Ok(Value::Null);
    }
    if let Ok(b) = value.as_bool() {
        return Ok(Value::Bool(b));
    }
    if let Ok(i) = value.as_int() {
        return Ok(Value::Int(i));
    }
    if let Ok(f) = value.as_float() {
        return Ok(Value::Float(f));
    }
    if let Ok(c) = value.as_char() {
        return Ok(Value::Str(c.to_string()));
    }
    if value.is_string() {
        let s = value.into_string().map_err(|t| unsupported(field, t))?;
        return Ok(Value::Str(s));
    }
    if value.is_array() {
        let items = value.into_array().map_err(|t| unsupported(field, t))?;
        return items
            .into_iter()
            .enumerate()
            .map(|(i, item)| dynamic_to_value(item, &format!("{field}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array);
    }
    if value.is_map() {
        let type_name = value.type_name();
        let map = value
            .try_cast::<Map>()
            .ok_or_else(|| unsupported(field, type_name))?;
        return map_to_record(map, field).map(Value::Map);
    }

    Err(unsupported(field, value.type_name()))
}

fn unsupported(field: &str, type_name: &str) -> sf_error::SfError {
    TransformError::UserCode(format!(
        "field '{field}' holds a value of unsupported script type '{type_name}'"
    ))
    .into()
}
