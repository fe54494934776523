//! Core simulation engine for dagsim.
//!
//! This crate defines the distribution families, the causal graph that
//! drives them, and the table produced by a simulation run.

pub mod coefficients;
pub mod dag;
pub mod distribution;
pub mod error;
pub mod graph;
pub mod link;
pub mod table;

pub use coefficients::{Coefficients, DEFAULT_WEIGHT, parse_key};
pub use dag::{Dag, node_seed};
pub use distribution::{DEFAULT_SCALE, Distribution, Family};
pub use error::{DistributionError, Error, Result};
pub use graph::{DependencyGraph, GraphReport, GraphSummary};
pub use link::{Link, expit};
pub use table::{ColumnSummary, SimulationTable, TableColumn};
