use std::io::Write;

use dagsim_core::SimulationTable;

use crate::counting::CountingWriter;
use crate::errors::Result;

/// Write a table as one JSON document laid out by column:
/// `{"rows": n, "columns": [{"name": .., "values": [..]}, ..]}`.
pub fn write_table_json<W: Write>(writer: W, table: &SimulationTable) -> Result<u64> {
    let mut counting = CountingWriter::new(writer);
    serde_json::to_writer(&mut counting, table)?;
    counting.write_all(b"\n")?;
    counting.flush()?;
    Ok(counting.bytes_written())
}
