use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::model::ModelSpec;

/// On-disk encodings accepted for model documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Toml,
    Json,
}

impl ModelFormat {
    /// `.toml` files are TOML; everything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ModelFormat::Toml,
            _ => ModelFormat::Json,
        }
    }
}

/// Parse a model document from a string.
pub fn parse_model_str(content: &str, format: ModelFormat) -> Result<ModelSpec> {
    let model = match format {
        ModelFormat::Toml => toml::from_str(content)?,
        ModelFormat::Json => serde_json::from_str(content)?,
    };
    Ok(model)
}

/// Read a model document as an untyped JSON value, for schema validation.
pub fn load_model_value(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let value = match ModelFormat::from_path(path) {
        ModelFormat::Toml => toml::from_str(&content)?,
        ModelFormat::Json => serde_json::from_str(&content)?,
    };
    Ok(value)
}

/// Read and parse a model document from disk.
pub fn load_model(path: &Path) -> Result<ModelSpec> {
    let format = ModelFormat::from_path(path);
    debug!(path = %path.display(), ?format, "loading model");
    let content = std::fs::read_to_string(path)?;
    parse_model_str(&content, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FamilySpec;

    #[test]
    fn format_follows_extension() {
        assert_eq!(ModelFormat::from_path(Path::new("m.toml")), ModelFormat::Toml);
        assert_eq!(ModelFormat::from_path(Path::new("m.TOML")), ModelFormat::Toml);
        assert_eq!(ModelFormat::from_path(Path::new("m.json")), ModelFormat::Json);
        assert_eq!(ModelFormat::from_path(Path::new("model")), ModelFormat::Json);
    }

    #[test]
    fn toml_documents_fill_family_defaults() {
        let content = r#"
            [[nodes]]
            name = "x"
            distribution = { family = "discrete", seed = 4 }

            [[nodes]]
            name = "y"
            parents = ["x"]
            distribution = { family = "normal" }
        "#;
        let model = parse_model_str(content, ModelFormat::Toml).expect("parse toml");
        let x = model.node("x").and_then(|node| node.distribution.clone()).unwrap();
        assert_eq!(x.seed, Some(4));
        assert_eq!(
            x.family,
            FamilySpec::Discrete {
                values: vec![0.0, 1.0],
                probabilities: vec![0.5, 0.5]
            }
        );
        let y = model.node("y").and_then(|node| node.distribution.clone()).unwrap();
        assert_eq!(y.family, FamilySpec::Normal { scale: 1.0 });
    }

    #[test]
    fn integer_scales_are_accepted() {
        let content = r#"{"nodes": [{"name": "x", "distribution": {"family": "normal", "scale": 2}}]}"#;
        let model = parse_model_str(content, ModelFormat::Json).expect("parse json");
        let x = model.nodes[0].distribution.clone().unwrap();
        assert_eq!(x.family, FamilySpec::Normal { scale: 2.0 });
    }

    #[test]
    fn unknown_family_is_rejected() {
        let content = r#"{"nodes": [{"name": "x", "distribution": {"family": "gamma"}}]}"#;
        assert!(parse_model_str(content, ModelFormat::Json).is_err());
    }
}
