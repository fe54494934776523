use jsonschema::JSONSchema;
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde_json::Value;

use crate::errors::{ModelError, ValidationIssue, ValidationReport};
use crate::model::ModelSpec;

/// Emit the JSON Schema for model documents.
pub fn model_json_schema() -> RootSchema {
    schema_for!(ModelSpec)
}

/// Validate a raw model document against the model JSON Schema.
pub fn validate_model_json(
    model_json: &Value,
    model_schema: &Value,
) -> Result<ValidationReport, ModelError> {
    let compiled =
        JSONSchema::compile(model_schema).map_err(|err| ModelError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(model_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::error(
                "schema_violation",
                path,
                error.to_string(),
            ));
        }
    }

    Ok(report)
}

fn normalized_json_pointer(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn schema_value() -> Value {
        serde_json::to_value(model_json_schema()).expect("serialize schema")
    }

    #[test]
    fn accepts_well_formed_document() {
        let doc = json!({
            "seed": 3,
            "nodes": [
                {"name": "x", "distribution": {"family": "bernoulli"}},
                {"name": "y", "parents": ["x"], "distribution": {"family": "normal", "scale": 2.0}}
            ],
            "coefficients": {"y~x": 0.5}
        });
        let report = validate_model_json(&doc, &schema_value()).expect("compile schema");
        assert!(report.is_ok(), "{:?}", report.errors);
    }

    #[test]
    fn rejects_missing_nodes() {
        let doc = json!({"seed": 3});
        let report = validate_model_json(&doc, &schema_value()).expect("compile schema");
        assert!(!report.is_ok());
        assert_eq!(report.errors[0].code, "schema_violation");
        assert_eq!(report.errors[0].path, "/");
    }

    #[test]
    fn rejects_wrong_coefficient_type() {
        let doc = json!({"nodes": [], "coefficients": {"y~x": "big"}});
        let report = validate_model_json(&doc, &schema_value()).expect("compile schema");
        assert!(
            report
                .errors
                .iter()
                .any(|issue| issue.path.starts_with("/coefficients/"))
        );
    }
}
