//! Pipeline definition: steps and payload decoding.
//!
//! Two payload forms are accepted:
//!
//! ```text
//! [{"type": "filter_rows", "config": {...}}, ...]            flat form
//! {"steps": [{"name": "filter_rows", "params": {...}}, ...]}  legacy form
//! ```
//!
//! The legacy form is translated key-for-key (`name` → `type`,
//! `params` → `config`) and then validated exactly like the flat form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::validation::validate_pipeline_schema;

/// Free-form configuration of a step, interpreted by its transformation.
pub type StepConfig = Map<String, Value>;

/// Maximum number of steps in one pipeline.
pub const MAX_STEPS: usize = 10;

/// One named transformation application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Registered transformation name
    #[serde(rename = "type")]
    pub step_type: String,

    /// Settings passed to the transformation
    #[serde(default)]
    pub config: StepConfig,
}

impl Step {
    pub fn new(step_type: impl Into<String>, config: StepConfig) -> Self {
        Self {
            step_type: step_type.into(),
            config,
        }
    }
}

/// A validated, ordered list of steps (1 to [`MAX_STEPS`])
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    /// Parse and validate a pipeline from JSON text.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let payload: Value = serde_json::from_str(text).map_err(ValidationError::InvalidJson)?;
        Self::from_json(payload)
    }

    /// Validate an already-decoded payload in either accepted form.
    pub fn from_json(payload: Value) -> Result<Self, ValidationError> {
        let payload = normalize_payload(payload)?;
        validate_pipeline_schema(&payload)?;

        let steps: Vec<Step> = serde_json::from_value(payload).map_err(|e| ValidationError::Schema {
            errors: vec![e.to_string()],
        })?;

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// Turn the legacy `{"steps": [...]}` form into the flat array form.
///
/// Arrays pass through untouched. Anything else is rejected.
pub fn normalize_payload(payload: Value) -> Result<Value, ValidationError> {
    match payload {
        Value::Array(_) => Ok(payload),
        Value::Object(mut wrapper) => {
            let steps = wrapper.remove("steps");
            if !wrapper.is_empty() {
                let keys: Vec<&str> = wrapper.keys().map(String::as_str).collect();
                return Err(schema_error(format!(
                    "unexpected key(s) next to 'steps': {}",
                    keys.join(", ")
                )));
            }
            match steps {
                Some(Value::Array(items)) => Ok(Value::Array(items.into_iter().map(translate_legacy_step).collect())),
                Some(_) => Err(schema_error("'steps' must be an array")),
                None => Err(schema_error("pipeline object must contain a 'steps' array")),
            }
        }
        _ => Err(schema_error("pipeline must be an array of steps")),
    }
}

fn translate_legacy_step(step: Value) -> Value {
    let Value::Object(fields) = step else {
        return step;
    };

    let mut translated = Map::with_capacity(fields.len());
    for (key, value) in fields.iter() {
        let target = match key.as_str() {
            "name" if !fields.contains_key("type") => "type",
            "params" if !fields.contains_key("config") => "config",
            other => other,
        };
        translated.insert(target.to_string(), value.clone());
    }
    Value::Object(translated)
}

fn schema_error(message: impl Into<String>) -> ValidationError {
    ValidationError::Schema {
        errors: vec![message.into()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_form() {
        let pipeline = Pipeline::from_json(json!([
            {"type": "filter_rows", "config": {"column": "age", "operator": ">", "value": 25}}
        ]))
        .unwrap();

        assert_eq!(pipeline.steps().len(), 1);
        assert_eq!(pipeline.steps()[0].step_type, "filter_rows");
        assert_eq!(pipeline.steps()[0].config["value"], 25);
    }

    #[test]
    fn test_legacy_form_translated() {
        let pipeline = Pipeline::from_json(json!({
            "steps": [
                {"name": "map_column", "params": {"old_name": "name", "new_name": "full_name"}},
                {"name": "uppercase_column", "params": {"column": "full_name"}}
            ]
        }))
        .unwrap();

        let names: Vec<&str> = pipeline.steps().iter().map(|s| s.step_type.as_str()).collect();
        assert_eq!(names, vec!["map_column", "uppercase_column"]);
        assert_eq!(pipeline.steps()[1].config["column"], "full_name");
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = Pipeline::parse("invalid json").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidJson(_)));
        assert_eq!(err.to_string(), "Invalid JSON in pipeline configuration");
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        assert!(Pipeline::from_json(json!([])).is_err());
        assert!(Pipeline::from_json(json!({"steps": []})).is_err());
    }

    #[test]
    fn test_too_many_steps_rejected() {
        let step = json!({"type": "uppercase_column", "config": {"column": "a"}});
        let steps: Vec<Value> = std::iter::repeat(step).take(MAX_STEPS + 1).collect();
        assert!(Pipeline::from_json(Value::Array(steps.clone())).is_err());
        assert!(Pipeline::from_json(Value::Array(steps[..MAX_STEPS].to_vec())).is_ok());
    }

    #[test]
    fn test_extra_step_keys_rejected() {
        let err = Pipeline::from_json(json!([
            {"type": "filter_rows", "config": {}, "comment": "nope"}
        ]))
        .unwrap_err();
        assert!(matches!(err, ValidationError::Schema { .. }));
    }

    #[test]
    fn test_missing_config_rejected() {
        assert!(Pipeline::from_json(json!([{"type": "filter_rows"}])).is_err());
        assert!(Pipeline::from_json(json!({"steps": [{"name": "filter_rows"}]})).is_err());
    }

    #[test]
    fn test_mistyped_fields_rejected() {
        assert!(Pipeline::from_json(json!([{"type": 3, "config": {}}])).is_err());
        assert!(Pipeline::from_json(json!([{"type": "a", "config": []}])).is_err());
        assert!(Pipeline::from_json(json!(["filter_rows"])).is_err());
    }

    #[test]
    fn test_legacy_wrapper_with_extra_keys_rejected() {
        let err = normalize_payload(json!({"steps": [], "version": 2})).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_scalar_payload_rejected() {
        assert!(normalize_payload(json!("filter_rows")).is_err());
        assert!(normalize_payload(json!({"pipeline": []})).is_err());
    }

    #[test]
    fn test_legacy_translation_does_not_clobber_type() {
        let translated = translate_legacy_step(json!({"type": "a", "name": "b", "config": {}}));
        assert_eq!(translated["type"], "a");
        assert_eq!(translated["name"], "b");
    }
}
