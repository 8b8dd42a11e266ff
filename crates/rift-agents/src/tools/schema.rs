//! Tool input schemas, derived from the typed input structs the tools parse.

use rift_common::{Error, Result};
use schemars::JsonSchema;
use schemars::generate::SchemaSettings;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// JSON schema of `T` as offered to the model.
///
/// Subschemas are inlined so enums show up next to their field, and the
/// `$schema`/`title` keys the generator adds are dropped.
pub fn schema_for<T: JsonSchema>() -> Value {
    let schema = SchemaSettings::draft07()
        .with(|settings| settings.inline_subschemas = true)
        .into_generator()
        .into_root_schema_for::<T>();
    let mut value = serde_json::to_value(&schema).unwrap_or(Value::Null);

    if let Value::Object(ref mut obj) = value {
        obj.remove("$schema");
        obj.remove("title");
        if obj.get("type").and_then(Value::as_str) == Some("object") {
            obj.entry("properties".to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            obj.entry("required".to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
        }
    }

    value
}

/// Parse tool input into `T`.
///
/// Input structs deny unknown fields, so this enforces the schema `schema_for::<T>()`
/// declares: object shape, required keys, primitive types, enum members and no
/// undeclared keys.
pub fn parse_input<T: DeserializeOwned>(input: Value) -> Result<T> {
    if !input.is_object() {
        return Err(Error::Validation(format!(
            "expected an object input, got {}",
            type_name(&input)
        )));
    }
    serde_json::from_value(input).map_err(|e| Error::Validation(e.to_string()))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[serde(rename_all = "snake_case")]
    enum Side {
        MyTeam,
        All,
    }

    /// Sample input.
    #[derive(Debug, Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    struct SampleInput {
        /// Which side to show.
        filter: Side,
        #[serde(default)]
        index: Option<i64>,
        #[serde(default)]
        show: Option<bool>,
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    struct EmptyInput {}

    #[test]
    fn schema_lists_fields_and_inlines_enums() {
        let schema = schema_for::<SampleInput>();
        assert_eq!(schema["type"], json!("object"));
        assert_eq!(schema["required"], json!(["filter"]));
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(schema["properties"]["filter"]["enum"], json!(["my_team", "all"]));
        assert_eq!(
            schema["properties"]["filter"]["description"],
            json!("Which side to show.")
        );
        assert!(schema.get("$schema").is_none());
        assert!(schema.get("definitions").is_none());
    }

    #[test]
    fn empty_input_still_declares_properties() {
        let schema = schema_for::<EmptyInput>();
        assert_eq!(schema["properties"], json!({}));
        assert_eq!(schema["required"], json!([]));
    }

    #[test]
    fn accepts_valid_input_and_null_optionals() {
        let input: SampleInput =
            parse_input(json!({"filter": "all", "index": 2, "show": null})).unwrap();
        assert!(matches!(input.filter, Side::All));
        assert_eq!(input.index, Some(2));
        assert_eq!(input.show, None);
    }

    #[test]
    fn rejects_missing_required() {
        let err = parse_input::<SampleInput>(json!({"show": true})).unwrap_err();
        assert!(err.to_string().contains("missing field `filter`"));
    }

    #[test]
    fn rejects_wrong_types_and_enums() {
        assert!(parse_input::<SampleInput>(json!({"filter": 3})).is_err());
        assert!(parse_input::<SampleInput>(json!({"filter": "enemy"})).is_err());
        assert!(parse_input::<SampleInput>(json!({"filter": "all", "index": 1.5})).is_err());
        assert!(parse_input::<SampleInput>(json!({"filter": "all", "show": "yes"})).is_err());
    }

    #[test]
    fn rejects_undeclared_keys_and_non_objects() {
        let err = parse_input::<SampleInput>(json!({"filter": "all", "extra": 1})).unwrap_err();
        assert!(err.to_string().contains("unknown field `extra`"));
        let err = parse_input::<SampleInput>(json!("all")).unwrap_err();
        assert!(err.to_string().contains("expected an object input, got string"));
    }
}
