use serde_json_bytes::Value;

use super::IdentityField;
use super::NodeDefinition;
use crate::error::ConfigurationError;

/// Stable identifier of a fetched record: the leaf values of its identity selection, nested
/// objects flattened depth-first, joined by `:`.
pub fn remote_node_id(record: &Value, definition: &NodeDefinition) -> Result<String, ConfigurationError> {
    let mut values = Vec::new();
    collect_leaf_values(
        record,
        &definition.identity_fields,
        &definition.remote_type_name,
        &mut values,
    )?;
    Ok(values.join(":"))
}

fn collect_leaf_values(
    record: &Value,
    fields: &[IdentityField],
    type_name: &str,
    values: &mut Vec<String>,
) -> Result<(), ConfigurationError> {
    for field in fields {
        let value = record
            .get(field.response_key.as_str())
            .filter(|value| !value.is_null())
            .ok_or_else(|| ConfigurationError::MissingIdentityValue {
                field: field.response_key.to_string(),
                type_name: type_name.to_string(),
            })?;
        if field.selections.is_empty() {
            values.push(leaf_to_string(value));
        } else {
            collect_leaf_values(value, &field.selections, type_name, values)?;
        }
    }
    Ok(())
}

fn leaf_to_string(value: &Value) -> String {
    match value {
        Value::String(string) => string.as_str().to_string(),
        other => other.to_string(),
    }
}
