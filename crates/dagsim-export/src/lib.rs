//! Table sinks for simulated data.
//!
//! Writes a [`dagsim_core::SimulationTable`] to a named location as CSV or
//! as a columnar JSON document, and renders graphs to DOT files.

pub mod atomic;
pub mod counting;
pub mod csv;
pub mod dot;
pub mod errors;
pub mod json;
pub mod sink;

pub use errors::{ExportError, Result};
pub use sink::{LocalSink, TableFormat, TableSink, WriteReceipt};
