//! CSV and JSON writers for result tables.

use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{
    cli::OutputFormat,
    inventory::{Record, Table},
    io_utils,
};

/// `--format` wins; otherwise a `.json` extension selects JSON.
pub fn resolve_format(path: &Path, provided: Option<OutputFormat>) -> OutputFormat {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
        _ => OutputFormat::Csv,
    })
}

pub fn write_csv(table: &Table, path: &Path, delimiter: u8) -> Result<()> {
    let writer = io_utils::open_output(path)?;
    write_csv_to(table, writer, delimiter).with_context(|| format!("Writing CSV output {path:?}"))
}

pub fn write_csv_to<W: Write>(table: &Table, writer: W, delimiter: u8) -> Result<()> {
    let mut writer = io_utils::csv_writer(writer, delimiter);
    writer
        .write_record(&table.columns)
        .context("Writing output headers")?;
    for row in table.display_rows() {
        writer.write_record(&row).context("Writing output row")?;
    }
    writer.flush().context("Flushing output")?;
    Ok(())
}

pub fn write_json(table: &Table, path: &Path) -> Result<()> {
    let writer = io_utils::open_output(path)?;
    write_json_to(table, writer).with_context(|| format!("Writing JSON output {path:?}"))
}

pub fn write_json_to<W: Write>(table: &Table, mut writer: W) -> Result<()> {
    let rows = table
        .records
        .iter()
        .map(|record| RecordView {
            columns: &table.columns,
            record,
        })
        .collect::<Vec<_>>();
    serde_json::to_writer_pretty(&mut writer, &rows).context("Serializing records")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Serializes a record as an object whose keys follow column order.
struct RecordView<'a> {
    columns: &'a [String],
    record: &'a Record,
}

impl Serialize for RecordView<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (idx, column) in self.columns.iter().enumerate() {
            map.serialize_entry(column, self.record.get(idx))?;
        }
        map.end()
    }
}
