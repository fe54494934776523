//! Declarative model documents for dagsim.
//!
//! A model document names the nodes of a causal graph, their parents, their
//! distributions and the edge coefficients, and builds a ready-to-simulate
//! [`Model`].

pub mod build;
pub mod errors;
pub mod load;
pub mod model;
pub mod schema;
pub mod validate;

pub use build::Model;
pub use errors::{IssueSeverity, ModelError, Result, ValidationIssue, ValidationReport};
pub use load::{ModelFormat, load_model, load_model_value, parse_model_str};
pub use model::{DistributionSpec, FamilySpec, ModelSpec, NodeSpec};
pub use schema::{model_json_schema, validate_model_json};
pub use validate::validate_model;
