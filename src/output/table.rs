//! Buffered JSON table output.
//!
//! Rows are kept in memory and written once on finish as
//! `{ "columns": [...], "rows": [[...], ...] }`.

use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::RecordSink;
use crate::error::Result;
use crate::telemetry::{RecordLayout, TelemetryRecord};

#[derive(Debug, Serialize)]
struct Table<'a> {
    columns: &'a [&'a str],
    rows: &'a [Vec<Value>],
}

#[derive(Debug)]
pub struct TableSink {
    path: PathBuf,
    layout: RecordLayout,
    rows: Vec<Vec<Value>>,
}

impl TableSink {
    pub fn new(path: &Path, layout: RecordLayout) -> Self {
        Self {
            path: path.to_path_buf(),
            layout,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RecordSink for TableSink {
    fn write(&mut self, record: &TelemetryRecord) -> Result<()> {
        self.rows.push(record.json_cells(self.layout)?);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let table = Table {
            columns: self.layout.columns(),
            rows: &self.rows,
        };
        let json = serde_json::to_string_pretty(&table)?;
        let mut file = File::create(&self.path)?;
        file.write_all(json.as_bytes())?;
        log::info!("{} rows written to {}", self.rows.len(), self.path.display());
        Ok(())
    }
}
