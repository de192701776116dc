//! Record sinks.
//!
//! The orchestrator hands every record to each sink in frame order, then
//! calls [`RecordSink::finish`] exactly once when the run ends.

pub mod csv_writer;
pub mod table;

pub use csv_writer::CsvSink;
pub use table::TableSink;

use crate::error::Result;
use crate::telemetry::TelemetryRecord;

pub trait RecordSink {
    fn write(&mut self, record: &TelemetryRecord) -> Result<()>;

    /// Flushes anything buffered. Called once after the last record.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<TelemetryRecord>,
    pub finished: bool,
}

impl RecordSink for MemorySink {
    fn write(&mut self, record: &TelemetryRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn write(&mut self, record: &TelemetryRecord) -> Result<()> {
        (**self).write(record)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn write(&mut self, record: &TelemetryRecord) -> Result<()> {
        (**self).write(record)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}
