use std::fmt;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::coefficients::Coefficients;
use crate::distribution::Distribution;
use crate::error::{Error, Result};
use crate::graph::{DependencyGraph, GraphReport};
use crate::table::{SimulationTable, TableColumn};

/// Causal graph of named variables, each simulated from its parents.
#[derive(Debug, Clone, Default)]
pub struct Dag {
    graph: DependencyGraph,
    distributions: Vec<Option<Distribution>>,
    seed: Option<u64>,
}

impl Dag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the default distributions the graph creates on its own.
    ///
    /// Each default stream is derived from `seed` and the node name, so
    /// reproducibility does not depend on declaration order.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Declare `child ~ parents`.
    ///
    /// Parents are created without a distribution when unknown; the child
    /// receives the default Normal unless it already has one. Re-adding an
    /// existing edge is a no-op.
    pub fn regression<I, S>(&mut self, child: &str, parents: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let child_idx = self.ensure_node(child);
        for parent in parents {
            let parent_idx = self.ensure_node(parent.as_ref());
            self.graph.add_edge(parent_idx, child_idx);
        }
        if self.distributions[child_idx].is_none() {
            self.distributions[child_idx] = Some(default_distribution(self.seed, child));
        }
        self
    }

    /// Bind `generator` to `node`, replacing any previous binding.
    pub fn distribution(&mut self, node: &str, generator: Distribution) -> &mut Self {
        let idx = self.ensure_node(node);
        self.distributions[idx] = Some(generator);
        self
    }

    /// Simulate `n` rows, one column per node in insertion order.
    ///
    /// Nodes still lacking a distribution get the default one, which stays
    /// bound afterwards. Every distribution's stream advances, so calling
    /// this twice on the same graph yields different draws.
    pub fn simulate(&mut self, n: usize, coefficients: &Coefficients) -> Result<SimulationTable> {
        let start = Instant::now();
        let order = self.graph.toposort().map_err(|blocked| Error::Cycle {
            nodes: blocked
                .into_iter()
                .map(|idx| self.graph.name(idx).to_string())
                .collect(),
        })?;

        info!(
            nodes = self.graph.len(),
            edges = self.graph.edge_count(),
            rows = n,
            "simulation started"
        );

        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); self.graph.len()];

        for idx in order {
            let name = self.graph.name(idx);
            let parents = self.graph.parents_of(idx);

            let mut linear_predictor = vec![0.0; n];
            for parent in parents {
                let weight = coefficients.get(name, self.graph.name(*parent));
                for (acc, value) in linear_predictor.iter_mut().zip(&columns[*parent]) {
                    *acc += weight * value;
                }
            }

            let seed = self.seed;
            let distribution = self.distributions[idx].get_or_insert_with(|| {
                warn!(
                    event = "default_distribution",
                    node = %name,
                    "node has no distribution, using default"
                );
                default_distribution(seed, name)
            });

            debug!(node = %name, parents = parents.len(), distribution = %distribution, "simulating node");

            columns[idx] = distribution
                .simulate(&linear_predictor)
                .map_err(|source| {
                    warn!(node = %name, error = %source, "sampling failed");
                    Error::Sampling {
                        node: name.to_string(),
                        source,
                    }
                })?;
        }

        let columns = self
            .graph
            .names()
            .iter()
            .zip(columns)
            .map(|(name, values)| TableColumn {
                name: name.clone(),
                values,
            })
            .collect();

        info!(
            rows = n,
            duration_ms = start.elapsed().as_millis() as u64,
            "simulation completed"
        );

        Ok(SimulationTable::new(n, columns))
    }

    /// Node names in insertion order.
    pub fn nodes(&self) -> &[String] {
        self.graph.names()
    }

    pub fn contains(&self, node: &str) -> bool {
        self.graph.index_of(node).is_some()
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn parents(&self, node: &str) -> Result<Vec<&str>> {
        let idx = self.index(node)?;
        Ok(self.names_of(self.graph.parents_of(idx)))
    }

    pub fn children(&self, node: &str) -> Result<Vec<&str>> {
        let idx = self.index(node)?;
        Ok(self.names_of(self.graph.children_of(idx)))
    }

    /// The distribution bound to `node`, if any.
    pub fn distribution_of(&self, node: &str) -> Result<Option<&Distribution>> {
        let idx = self.index(node)?;
        Ok(self.distributions[idx].as_ref())
    }

    /// Order in which `simulate` processes nodes.
    pub fn topological_order(&self) -> Result<Vec<&str>> {
        match self.graph.toposort() {
            Ok(order) => Ok(self.names_of(&order)),
            Err(blocked) => Err(Error::Cycle {
                nodes: self
                    .names_of(&blocked)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            }),
        }
    }

    pub fn report(&self) -> GraphReport {
        self.graph.report()
    }

    /// Graphviz DOT rendering of nodes and edges.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph dag {\n");
        for name in self.graph.names() {
            out.push_str(&format!("  \"{}\";\n", dot_escape(name)));
        }
        for (idx, name) in self.graph.names().iter().enumerate() {
            for parent in self.graph.parents_of(idx) {
                out.push_str(&format!(
                    "  \"{}\" -> \"{}\";\n",
                    dot_escape(self.graph.name(*parent)),
                    dot_escape(name)
                ));
            }
        }
        out.push_str("}\n");
        out
    }

    fn ensure_node(&mut self, name: &str) -> usize {
        let idx = self.graph.ensure_node(name);
        if idx == self.distributions.len() {
            self.distributions.push(None);
        }
        idx
    }

    fn index(&self, node: &str) -> Result<usize> {
        self.graph
            .index_of(node)
            .ok_or_else(|| Error::UnknownNode(node.to_string()))
    }

    fn names_of(&self, indices: &[usize]) -> Vec<&str> {
        indices.iter().map(|idx| self.graph.name(*idx)).collect()
    }
}

impl fmt::Display for Dag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, name) in self.graph.names().iter().enumerate() {
            let parents = self.names_of(self.graph.parents_of(idx));
            if parents.is_empty() {
                writeln!(f, "{name} ~ 1")?;
            } else {
                writeln!(f, "{name} ~ {}", parents.join(" + "))?;
            }
        }
        writeln!(f)?;
        for (name, distribution) in self.graph.names().iter().zip(&self.distributions) {
            if let Some(distribution) = distribution {
                writeln!(f, "{name}: {distribution}")?;
            }
        }
        Ok(())
    }
}

fn default_distribution(seed: Option<u64>, node: &str) -> Distribution {
    match seed {
        Some(seed) => Distribution::default().with_seed(node_seed(seed, node)),
        None => Distribution::default(),
    }
}

/// Derive a per-node stream seed from a graph-level seed.
pub fn node_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn dot_escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Family;

    fn mediation() -> Dag {
        let mut dag = Dag::new();
        dag.regression("y", ["x", "z"]);
        dag.regression("z", ["x"]);
        dag.distribution("y", Distribution::normal(2.0));
        dag.distribution("z", Distribution::poisson());
        dag.distribution("x", Distribution::bernoulli());
        dag
    }

    #[test]
    fn regression_creates_parents_without_distribution() {
        let mut dag = Dag::new();
        dag.regression("y", ["x"]);
        assert_eq!(dag.nodes(), &["y".to_string(), "x".to_string()]);
        assert!(dag.distribution_of("x").unwrap().is_none());
        let y = dag.distribution_of("y").unwrap().expect("default for child");
        assert_eq!(y.family(), &Family::Normal { scale: 1.0 });
    }

    #[test]
    fn regression_is_idempotent_for_edges() {
        let mut dag = Dag::new();
        dag.regression("y", ["x"]).regression("y", ["x"]);
        assert_eq!(dag.edge_count(), 1);
        assert_eq!(dag.parents("y").unwrap(), vec!["x"]);
        assert_eq!(dag.children("x").unwrap(), vec!["y"]);
    }

    #[test]
    fn regression_keeps_explicit_distribution() {
        let mut dag = Dag::new();
        dag.distribution("y", Distribution::poisson());
        dag.regression("y", ["x"]);
        let y = dag.distribution_of("y").unwrap().unwrap();
        assert_eq!(y.family(), &Family::Poisson);
    }

    #[test]
    fn distribution_overwrites_binding() {
        let mut dag = Dag::new();
        dag.distribution("x", Distribution::poisson());
        dag.distribution("x", Distribution::bernoulli());
        assert_eq!(dag.len(), 1);
        let x = dag.distribution_of("x").unwrap().unwrap();
        assert_eq!(x.family(), &Family::Bernoulli);
    }

    #[test]
    fn simulate_binds_defaults_for_bare_parents() {
        let mut dag = Dag::new().with_seed(9);
        dag.regression("y", ["x"]);
        let table = dag.simulate(10, &Coefficients::new()).unwrap();
        assert_eq!(table.n_columns(), 2);
        assert!(dag.distribution_of("x").unwrap().is_some());
    }

    #[test]
    fn unknown_node_lookups_fail() {
        let dag = mediation();
        assert!(matches!(dag.parents("w"), Err(Error::UnknownNode(name)) if name == "w"));
        assert!(!dag.contains("w"));
    }

    #[test]
    fn cycle_is_reported_before_sampling() {
        let mut dag = Dag::new();
        dag.regression("a", ["b"]);
        dag.regression("b", ["a"]);
        dag.regression("c", ["a"]);
        dag.regression("root", Vec::<String>::new());

        let err = dag.simulate(5, &Coefficients::new()).unwrap_err();
        match err {
            Error::Cycle { nodes } => {
                assert!(nodes.contains(&"a".to_string()));
                assert!(nodes.contains(&"b".to_string()));
                assert!(!nodes.contains(&"c".to_string()));
                assert!(!nodes.contains(&"root".to_string()));
                assert_eq!(
                    Error::Cycle { nodes }.to_string(),
                    "graph contains a cycle through: a, b"
                );
            }
            other => panic!("expected cycle, got {other}"),
        }
        assert!(dag.topological_order().is_err());
    }

    #[test]
    fn sampling_errors_name_the_node() {
        let mut dag = Dag::new();
        dag.distribution("x", Distribution::normal(-2.0).with_seed(1));
        let err = dag.simulate(3, &Coefficients::new()).unwrap_err();
        assert!(matches!(err, Error::Sampling { ref node, .. } if node == "x"));
    }

    #[test]
    fn topological_order_respects_edges() {
        let dag = mediation();
        assert_eq!(dag.topological_order().unwrap(), vec!["x", "z", "y"]);
    }

    #[test]
    fn display_lists_formulas_then_distributions() {
        let dag = mediation();
        let expected = "y ~ x + z\n\
                        x ~ 1\n\
                        z ~ x\n\
                        \n\
                        y: Normal distribution {scale: 2}\n\
                        x: Binomial distribution {}\n\
                        z: Poisson distribution {}\n";
        assert_eq!(dag.to_string(), expected);
    }

    #[test]
    fn root_formula_renders_intercept_only() {
        let mut dag = Dag::new();
        dag.regression("x", Vec::<&str>::new());
        dag.distribution("w", Distribution::poisson());
        let text = dag.to_string();
        assert!(text.starts_with("x ~ 1\nw ~ 1\n\n"), "{text}");
        assert!(!text.lines().any(|line| line.trim_end().ends_with('~')));
    }

    #[test]
    fn dot_lists_nodes_and_edges() {
        let dag = mediation();
        let dot = dag.to_dot();
        assert!(dot.starts_with("digraph dag {\n"));
        assert!(dot.contains("  \"x\" -> \"y\";\n"));
        assert!(dot.contains("  \"z\" -> \"y\";\n"));
        assert!(dot.contains("  \"x\" -> \"z\";\n"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn node_seed_depends_on_key() {
        assert_ne!(node_seed(1, "x"), node_seed(1, "y"));
        assert_eq!(node_seed(1, "x"), node_seed(1, "x"));
    }
}
