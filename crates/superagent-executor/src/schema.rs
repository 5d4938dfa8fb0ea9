use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ExecutorError;

/// Declared shape of one tool parameter (spec §4.4: "validate and coerce
/// parameters against the tool's declared parameter schema (type check +
/// enum check + required check with defaults substituted)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    fn matches(self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSchema {
    pub name: String,
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub enum_values: Option<Vec<Value>>,
}

impl ParamSchema {
    pub fn required(name: impl Into<String>, param_type: ParamType) -> Self {
        Self { name: name.into(), param_type, required: true, default: None, enum_values: None }
    }

    pub fn optional(name: impl Into<String>, param_type: ParamType, default: Value) -> Self {
        Self { name: name.into(), param_type, required: false, default: Some(default), enum_values: None }
    }

    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    fn check(&self, value: &Value) -> Result<(), ExecutorError> {
        if !self.param_type.matches(value) {
            return Err(ExecutorError::ToolValidation(format!(
                "parameter '{}' expected {:?}, got {value}",
                self.name, self.param_type
            )));
        }
        if let Some(allowed) = &self.enum_values {
            if !allowed.contains(value) {
                return Err(ExecutorError::ToolValidation(format!(
                    "parameter '{}' value {value} is not one of the declared enum values",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Declared parameter shape for one tool. Shared between tool registration
/// and the executor's Phase 1 validation step (spec §4.4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolSchema {
    pub params: Vec<ParamSchema>,
}

impl ToolSchema {
    pub fn new(params: Vec<ParamSchema>) -> Self {
        Self { params }
    }

    /// Validates `input` against the declared params, substituting defaults
    /// for missing optional parameters, and returns the coerced object.
    pub fn validate_and_coerce(&self, input: &Value) -> Result<Value, ExecutorError> {
        let provided = input.as_object().cloned().unwrap_or_default();
        let mut out = Map::new();
        for param in &self.params {
            match provided.get(&param.name) {
                Some(value) => {
                    param.check(value)?;
                    out.insert(param.name.clone(), value.clone());
                }
                None => match &param.default {
                    Some(default) => {
                        out.insert(param.name.clone(), default.clone());
                    }
                    None if param.required => {
                        return Err(ExecutorError::ToolValidation(format!(
                            "missing required parameter '{}'",
                            param.name
                        )));
                    }
                    None => {}
                },
            }
        }
        Ok(Value::Object(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn substitutes_defaults_for_missing_optional_params() {
        let schema = ToolSchema::new(vec![ParamSchema::optional("recursive", ParamType::Boolean, json!(false))]);
        let coerced = schema.validate_and_coerce(&json!({})).unwrap();
        assert_eq!(coerced["recursive"], json!(false));
    }

    #[test]
    fn rejects_missing_required_param() {
        let schema = ToolSchema::new(vec![ParamSchema::required("path", ParamType::String)]);
        let err = schema.validate_and_coerce(&json!({})).unwrap_err();
        assert!(matches!(err, ExecutorError::ToolValidation(_)));
    }

    #[test]
    fn rejects_wrong_type() {
        let schema = ToolSchema::new(vec![ParamSchema::required("count", ParamType::Integer)]);
        let err = schema.validate_and_coerce(&json!({"count": "nope"})).unwrap_err();
        assert!(matches!(err, ExecutorError::ToolValidation(_)));
    }

    #[test]
    fn rejects_value_outside_enum() {
        let schema = ToolSchema::new(vec![
            ParamSchema::required("mode", ParamType::String).with_enum(vec![json!("read"), json!("write")]),
        ]);
        let err = schema.validate_and_coerce(&json!({"mode": "delete"})).unwrap_err();
        assert!(matches!(err, ExecutorError::ToolValidation(_)));
    }

    #[test]
    fn accepts_valid_enum_value() {
        let schema = ToolSchema::new(vec![
            ParamSchema::required("mode", ParamType::String).with_enum(vec![json!("read"), json!("write")]),
        ]);
        assert!(schema.validate_and_coerce(&json!({"mode": "read"})).is_ok());
    }
}
