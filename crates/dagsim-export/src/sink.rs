use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use dagsim_core::SimulationTable;
use serde::Serialize;
use tracing::info;

use crate::atomic::write_atomic;
use crate::csv::write_table_csv;
use crate::errors::{ExportError, Result};
use crate::json::write_table_json;

/// Encodings a sink can write a table in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableFormat {
    /// Row-oriented text with a header line.
    Csv,
    /// One JSON document holding each column as an array.
    JsonColumns,
}

impl TableFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::JsonColumns => "json",
        }
    }

    /// Encode `table` into `writer`, returning the bytes written.
    pub fn encode<W: std::io::Write>(self, writer: W, table: &SimulationTable) -> Result<u64> {
        match self {
            TableFormat::Csv => write_table_csv(writer, table),
            TableFormat::JsonColumns => write_table_json(writer, table),
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TableFormat {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "csv" => Ok(TableFormat::Csv),
            "json" | "json_columns" => Ok(TableFormat::JsonColumns),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Outcome of a successful write.
#[derive(Debug, Clone, Serialize)]
pub struct WriteReceipt {
    pub location: PathBuf,
    pub format: TableFormat,
    pub rows: usize,
    pub columns: usize,
    pub bytes_written: u64,
}

/// Destination that stores a table under a name.
pub trait TableSink {
    fn write_table(
        &self,
        name: &str,
        table: &SimulationTable,
        format: TableFormat,
    ) -> Result<WriteReceipt>;
}

/// Sink rooted at a local directory; names are relative paths beneath it.
#[derive(Debug, Clone)]
pub struct LocalSink {
    root: PathBuf,
}

impl LocalSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `name` under the root, rejecting names that would escape it.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
        if name.is_empty() || escapes || relative.file_name().is_none() {
            return Err(ExportError::InvalidLocation(name.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl TableSink for LocalSink {
    fn write_table(
        &self,
        name: &str,
        table: &SimulationTable,
        format: TableFormat,
    ) -> Result<WriteReceipt> {
        let location = self.resolve(name)?;

        let bytes_written = write_atomic(&location, |writer| format.encode(writer, table))?;

        info!(
            location = %location.display(),
            %format,
            rows = table.n_rows(),
            columns = table.n_columns(),
            bytes_written,
            "table written"
        );

        Ok(WriteReceipt {
            location,
            format,
            rows: table.n_rows(),
            columns: table.n_columns(),
            bytes_written,
        })
    }
}
