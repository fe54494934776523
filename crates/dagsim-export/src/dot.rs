use std::path::Path;

use dagsim_core::Dag;
use tracing::info;

use crate::atomic::write_bytes_atomic;
use crate::errors::Result;

/// Write the graph as a Graphviz DOT file; returns the bytes written.
pub fn write_dot(path: &Path, dag: &Dag) -> Result<u64> {
    let bytes = write_bytes_atomic(path, dag.to_dot().as_bytes())?;
    info!(path = %path.display(), nodes = dag.len(), edges = dag.edge_count(), "graph written");
    Ok(bytes)
}
