//! In-memory inventory table.
//!
//! The whole CSV is read once per run into a [`Table`]: a column list plus
//! positionally aligned [`Record`]s. Every cell starts as a raw
//! [`Value::String`] and is converted in place by [`crate::coerce`].

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::debug;

use crate::{data::Value, io_utils};

pub const NAME_COLUMN: &str = "name";
pub const ID_COLUMN: &str = "id";

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub cells: Vec<Value>,
}

impl Record {
    pub fn new(cells: Vec<Value>) -> Self {
        Self { cells }
    }

    pub fn get(&self, index: usize) -> &Value {
        self.cells.get(index).unwrap_or(&Value::Missing)
    }

    pub fn set(&mut self, index: usize, value: Value) {
        if index >= self.cells.len() {
            self.cells.resize(index + 1, Value::Missing);
        }
        self.cells[index] = value;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    /// Builds a table of raw string cells, e.g. from decoded CSV rows.
    pub fn from_raw_rows<I>(columns: Vec<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let records = rows
            .into_iter()
            .map(|row| Record::new(row.into_iter().map(Value::String).collect()))
            .collect();
        Self { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Index of `name`, appending an all-missing column when absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        let idx = self.columns.len() - 1;
        for record in &mut self.records {
            record.set(idx, Value::Missing);
        }
        idx
    }

    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.records.iter().map(move |record| record.get(index))
    }

    /// Identifies a row in diagnostics: its `id` cell when present, otherwise
    /// the 1-based data row number.
    pub fn row_label(&self, row: usize) -> String {
        self.column_index(ID_COLUMN)
            .and_then(|idx| self.records.get(row).map(|record| record.get(idx)))
            .and_then(Value::textual_form)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("row {}", row + 1))
    }

    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.records
            .iter()
            .map(|record| {
                (0..self.columns.len())
                    .map(|idx| record.get(idx).as_display())
                    .collect()
            })
            .collect()
    }
}

/// Reads a CSV inventory into a table of raw string cells.
pub fn read_table(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Table> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)
        .with_context(|| format!("Reading headers from {path:?}"))?;
    let mut rows = Vec::new();
    for (ordinal, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", ordinal + 2))?;
        rows.push(
            io_utils::decode_record(&record, encoding)
                .with_context(|| format!("Decoding row {}", ordinal + 2))?,
        );
    }
    debug!(
        "Read {} row(s) across {} column(s) from {:?}",
        rows.len(),
        headers.len(),
        path
    );
    Ok(Table::from_raw_rows(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_raw_rows(
            vec!["id".into(), "name".into()],
            vec![
                vec!["base1-58".into(), "Pikachu".into()],
                vec!["".into(), "Raichu".into()],
            ],
        )
    }

    #[test]
    fn ensure_column_appends_missing_cells() {
        let mut table = sample();
        let idx = table.ensure_column("owned");
        assert_eq!(idx, 2);
        assert_eq!(table.ensure_column("owned"), 2);
        assert!(table.column_values(idx).all(Value::is_missing));
        assert_eq!(table.ensure_column("name"), 1);
    }

    #[test]
    fn row_label_prefers_id_cell() {
        let table = sample();
        assert_eq!(table.row_label(0), "base1-58");
        assert_eq!(table.row_label(1), "row 2");
    }

    #[test]
    fn record_get_out_of_range_is_missing() {
        let mut record = Record::new(vec![Value::String("a".into())]);
        assert!(record.get(3).is_missing());
        record.set(2, Value::Integer(1));
        assert_eq!(record.cells.len(), 3);
        assert!(record.get(1).is_missing());
    }
}
