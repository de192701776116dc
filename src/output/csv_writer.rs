//! Streaming CSV output.
//!
//! Rows are appended and flushed as they arrive, so an interrupted run keeps
//! every record written so far.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::RecordSink;
use crate::error::Result;
use crate::telemetry::{RecordLayout, TelemetryRecord};

pub struct CsvSink {
    path: PathBuf,
    layout: RecordLayout,
    writer: BufWriter<File>,
    rows: usize,
}

impl CsvSink {
    /// Opens `path` for appending, writing the header row if the file is new
    /// or empty.
    pub fn create(path: &Path, layout: RecordLayout) -> Result<Self> {
        let has_content = path.exists() && {
            let reader = BufReader::new(File::open(path)?);
            reader.lines().next().is_some()
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        if !has_content {
            writeln!(writer, "{}", layout.columns().join(","))?;
            writer.flush()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            layout,
            writer,
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written by this sink (excluding the header).
    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl RecordSink for CsvSink {
    fn write(&mut self, record: &TelemetryRecord) -> Result<()> {
        let line = record
            .cells(self.layout)
            .iter()
            .map(|cell| escape_cell(cell))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        log::info!("{} rows written to {}", self.rows, self.path.display());
        Ok(())
    }
}

/// Quotes a cell containing a separator, quote or line break.
fn escape_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
