use std::collections::{HashMap, HashSet};

use dagsim_core::{DependencyGraph, parse_key};

use crate::errors::{ValidationIssue, ValidationReport};
use crate::model::{FamilySpec, ModelSpec, NodeSpec};

const PROBABILITY_TOLERANCE: f64 = 1e-8;

/// Validate a parsed model document.
///
/// Errors block building the model. Warnings describe documents that build
/// fine but lean on a silent default or will fail once sampled.
pub fn validate_model(model: &ModelSpec) -> ValidationReport {
    let mut report = ValidationReport::default();

    let declared = validate_nodes(&model.nodes, &mut report);
    validate_implicit_parents(&model.nodes, &declared, &mut report);
    validate_coefficients(model, &mut report);
    validate_acyclic(&model.nodes, &mut report);

    for (idx, node) in model.nodes.iter().enumerate() {
        validate_family(idx, node, &mut report);
    }

    report
}

fn validate_nodes(nodes: &[NodeSpec], report: &mut ValidationReport) -> HashSet<String> {
    let mut declared = HashSet::new();

    if nodes.is_empty() {
        report.push_warning(ValidationIssue::warning(
            "empty_model",
            "/nodes",
            "model declares no nodes",
        ));
    }

    for (idx, node) in nodes.iter().enumerate() {
        let path = format!("/nodes/{idx}/name");
        if node.name.trim().is_empty() {
            report.push_error(ValidationIssue::error(
                "empty_name",
                path,
                "node name must not be empty",
            ));
            continue;
        }
        if node.name.contains(dagsim_core::coefficients::KEY_SEPARATOR) {
            report.push_error(
                ValidationIssue::error(
                    "invalid_name",
                    path.clone(),
                    format!("node name '{}' contains '~'", node.name),
                )
                .with_hint("'~' separates child and parent in coefficient keys"),
            );
        }
        if !declared.insert(node.name.clone()) {
            report.push_error(
                ValidationIssue::error(
                    "duplicate_node",
                    path,
                    format!("node '{}' is declared more than once", node.name),
                )
                .with_hint("merge the parents into a single declaration"),
            );
        }

        let mut seen = HashSet::new();
        for (pidx, parent) in node.parents.iter().enumerate() {
            if !seen.insert(parent.as_str()) {
                report.push_warning(ValidationIssue::warning(
                    "duplicate_parent",
                    format!("/nodes/{idx}/parents/{pidx}"),
                    format!("parent '{parent}' is listed twice for '{}'", node.name),
                ));
            }
        }
    }

    declared
}

fn validate_implicit_parents(
    nodes: &[NodeSpec],
    declared: &HashSet<String>,
    report: &mut ValidationReport,
) {
    let mut reported = HashSet::new();
    for (idx, node) in nodes.iter().enumerate() {
        for (pidx, parent) in node.parents.iter().enumerate() {
            if !declared.contains(parent) && reported.insert(parent.clone()) {
                report.push_warning(
                    ValidationIssue::warning(
                        "implicit_default",
                        format!("/nodes/{idx}/parents/{pidx}"),
                        format!("parent '{parent}' is not declared as a node"),
                    )
                    .with_hint("it will be simulated from the default Normal(scale=1)"),
                );
            }
        }
    }
}

fn validate_coefficients(model: &ModelSpec, report: &mut ValidationReport) {
    let parents: HashMap<&str, &[String]> = model
        .nodes
        .iter()
        .map(|node| (node.name.as_str(), node.parents.as_slice()))
        .collect();

    for key in model.coefficients.keys() {
        let path = format!("/coefficients/{key}");
        let Some((child, parent)) = parse_key(key) else {
            report.push_error(ValidationIssue::error(
                "invalid_coefficient_key",
                path,
                format!("coefficient key '{key}' is not of the form 'child~parent'"),
            ));
            continue;
        };

        let is_edge = parents
            .get(child)
            .is_some_and(|list| list.iter().any(|p| p == parent));
        if !is_edge {
            report.push_warning(ValidationIssue::warning(
                "unused_coefficient",
                path,
                format!("no edge {parent} -> {child}; coefficient is ignored"),
            ));
        }
    }
}

fn validate_acyclic(nodes: &[NodeSpec], report: &mut ValidationReport) {
    let mut graph = DependencyGraph::new();
    for node in nodes {
        graph.ensure_node(&node.name);
    }
    for node in nodes {
        let child = graph.ensure_node(&node.name);
        for parent in &node.parents {
            let parent = graph.ensure_node(parent);
            graph.add_edge(parent, child);
        }
    }

    if let Some(cycle) = graph.report().cycle {
        report.push_error(
            ValidationIssue::error(
                "cycle",
                "/nodes",
                format!("dependency cycle through: {}", cycle.join(", ")),
            )
            .with_hint("the variable graph must be acyclic"),
        );
    }
}

fn validate_family(idx: usize, node: &NodeSpec, report: &mut ValidationReport) {
    let Some(distribution) = &node.distribution else {
        return;
    };
    let path = format!("/nodes/{idx}/distribution");
    let mut invalid = |message: String| {
        report.push_warning(
            ValidationIssue::warning("invalid_family_params", path.clone(), message)
                .with_hint("sampling this node will fail"),
        );
    };

    match &distribution.family {
        FamilySpec::Normal { scale } => {
            if !scale.is_finite() || *scale < 0.0 {
                invalid(format!("scale {scale} must be finite and >= 0"));
            }
        }
        FamilySpec::Bernoulli | FamilySpec::Poisson => {}
        FamilySpec::Discrete {
            values,
            probabilities,
        } => {
            if values.len() != probabilities.len() {
                invalid(format!(
                    "{} values but {} probabilities",
                    values.len(),
                    probabilities.len()
                ));
            } else if values.is_empty() {
                invalid("value set is empty".to_string());
            } else if probabilities.iter().any(|p| !p.is_finite() || *p < 0.0) {
                invalid("probabilities must be finite and >= 0".to_string());
            } else {
                let total: f64 = probabilities.iter().sum();
                if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
                    invalid(format!("probabilities sum to {total}, expected 1"));
                }
            }
        }
    }

    if matches!(distribution.family, FamilySpec::Discrete { .. }) && !node.parents.is_empty() {
        report.push_warning(ValidationIssue::warning(
            "inert_parents",
            format!("/nodes/{idx}/parents"),
            format!("discrete node '{}' ignores its parents' values", node.name),
        ));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::DistributionSpec;

    fn node(name: &str, parents: &[&str], family: Option<FamilySpec>) -> NodeSpec {
        NodeSpec {
            name: name.to_string(),
            parents: parents.iter().map(|p| p.to_string()).collect(),
            distribution: family.map(|family| DistributionSpec { family, seed: None }),
        }
    }

    fn model(nodes: Vec<NodeSpec>, coefficients: &[(&str, f64)]) -> ModelSpec {
        ModelSpec {
            name: None,
            seed: None,
            rows: None,
            nodes,
            coefficients: coefficients
                .iter()
                .map(|(key, value)| (key.to_string(), *value))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn clean_model_has_no_issues() {
        let report = validate_model(&model(
            vec![
                node("x", &[], Some(FamilySpec::Bernoulli)),
                node("y", &["x"], Some(FamilySpec::Normal { scale: 2.0 })),
            ],
            &[("y~x", 0.5)],
        ));
        assert!(report.is_ok());
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn duplicate_nodes_are_errors() {
        let report = validate_model(&model(vec![node("x", &[], None), node("x", &[], None)], &[]));
        assert!(!report.is_ok());
        assert!(report.has_code("duplicate_node"));
    }

    #[test]
    fn cycles_are_errors() {
        let report = validate_model(&model(
            vec![node("a", &["b"], None), node("b", &["a"], None)],
            &[],
        ));
        assert!(report.has_code("cycle"));
        assert_eq!(report.errors[0].path, "/nodes");
    }

    #[test]
    fn undeclared_parents_warn_once() {
        let report = validate_model(&model(
            vec![node("y", &["x"], None), node("z", &["x"], None)],
            &[],
        ));
        assert!(report.is_ok());
        let implicit: Vec<_> = report
            .warnings
            .iter()
            .filter(|issue| issue.code == "implicit_default")
            .collect();
        assert_eq!(implicit.len(), 1);
    }

    #[test]
    fn coefficient_keys_are_checked() {
        let report = validate_model(&model(
            vec![node("x", &[], None), node("y", &["x"], None)],
            &[("y", 1.0), ("x~y", 2.0)],
        ));
        assert!(report.has_code("invalid_coefficient_key"));
        assert!(report.has_code("unused_coefficient"));
    }

    #[test]
    fn bad_family_params_warn() {
        let report = validate_model(&model(
            vec![
                node("a", &[], Some(FamilySpec::Normal { scale: -1.0 })),
                node(
                    "b",
                    &[],
                    Some(FamilySpec::Discrete {
                        values: vec![0.0, 1.0],
                        probabilities: vec![0.2, 0.2],
                    }),
                ),
            ],
            &[],
        ));
        assert!(report.is_ok());
        let count = report
            .warnings
            .iter()
            .filter(|issue| issue.code == "invalid_family_params")
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn discrete_children_are_flagged_inert() {
        let report = validate_model(&model(
            vec![
                node("x", &[], None),
                node(
                    "y",
                    &["x"],
                    Some(FamilySpec::Discrete {
                        values: vec![0.0, 1.0],
                        probabilities: vec![0.5, 0.5],
                    }),
                ),
            ],
            &[],
        ));
        assert!(report.has_code("inert_parents"));
    }
}
