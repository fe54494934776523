use std::collections::BTreeMap;

use dagsim_core::{DEFAULT_SCALE, Distribution, Family, node_seed};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Top-level model document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelSpec {
    /// Optional human-readable model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Seed for every stream without an explicit seed of its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Default number of rows to simulate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    /// Variables in column order.
    pub nodes: Vec<NodeSpec>,
    /// Edge weights keyed as `"child~parent"`; missing edges weigh 1.0.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub coefficients: BTreeMap<String, f64>,
}

/// A variable and the parents it regresses on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    /// Omitted distributions fall back to Normal with scale 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<DistributionSpec>,
}

/// Distribution family plus an optional stream seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DistributionSpec {
    #[serde(flatten)]
    pub family: FamilySpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Supported families, tagged by `family`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum FamilySpec {
    Normal {
        /// Standard deviation.
        #[serde(default = "default_scale")]
        scale: f64,
    },
    Bernoulli,
    Poisson,
    Discrete {
        #[serde(default = "default_values")]
        values: Vec<f64>,
        #[serde(default = "default_probabilities", alias = "p")]
        probabilities: Vec<f64>,
    },
}

fn default_scale() -> f64 {
    DEFAULT_SCALE
}

fn default_values() -> Vec<f64> {
    vec![0.0, 1.0]
}

fn default_probabilities() -> Vec<f64> {
    vec![0.5, 0.5]
}

impl FamilySpec {
    pub fn to_family(&self) -> Family {
        match self {
            FamilySpec::Normal { scale } => Family::Normal { scale: *scale },
            FamilySpec::Bernoulli => Family::Bernoulli,
            FamilySpec::Poisson => Family::Poisson,
            FamilySpec::Discrete {
                values,
                probabilities,
            } => Family::Discrete {
                values: values.clone(),
                probabilities: probabilities.clone(),
            },
        }
    }
}

impl DistributionSpec {
    /// Build the distribution for `node`.
    ///
    /// An explicit seed wins; otherwise the stream is derived from the model
    /// seed and the node name, and left unseeded when neither is set.
    pub fn to_distribution(&self, model_seed: Option<u64>, node: &str) -> Distribution {
        let seed = self
            .seed
            .or_else(|| model_seed.map(|seed| node_seed(seed, node)));
        Distribution::new(self.family.to_family(), seed)
    }
}

impl ModelSpec {
    pub fn node(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|node| node.name == name)
    }
}
