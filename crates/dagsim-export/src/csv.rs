use std::io::Write;

use dagsim_core::SimulationTable;

use crate::counting::CountingWriter;
use crate::errors::Result;

/// Write a table as CSV: a header of column names, then one record per row.
///
/// Returns the number of bytes written.
pub fn write_table_csv<W: Write>(writer: W, table: &SimulationTable) -> Result<u64> {
    let counting = CountingWriter::new(writer);
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    writer.write_record(table.names())?;

    let mut record: Vec<String> = Vec::with_capacity(table.n_columns());
    for row in 0..table.n_rows() {
        record.clear();
        record.extend(table.columns.iter().map(|col| col.values[row].to_string()));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    let counting = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(counting.bytes_written())
}
