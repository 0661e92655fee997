use crate::error::Error;
use crate::record::{OutputRecord, EDEP_PREFIX};
use crate::volumes::VolumeFilterSet;
use std::io::Write;

/// A destination for flattened event records.
///
/// Records are appended in event order, once each.
pub trait RecordSink {
    /// Called once before the first record with the volumes that get an
    /// energy deposit column.
    #[allow(unused_variables)]
    fn declare(&mut self, volumes: &VolumeFilterSet) -> Result<(), Error> {
        Ok(())
    }
    fn write_record(&mut self, record: &OutputRecord) -> Result<(), Error>;
    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }
    /// Number of records appended so far.
    fn count_written(&self) -> usize;
}

impl RecordSink for Vec<OutputRecord> {
    fn write_record(&mut self, record: &OutputRecord) -> Result<(), Error> {
        self.push(record.clone());
        Ok(())
    }

    fn count_written(&self) -> usize {
        self.len()
    }
}

/// Writes one JSON object per record, one record per line.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    /// JSON Lines has no header: every record carries its own keys, so there
    /// is nothing to write up front. The per-volume columns are only logged.
    fn declare(&mut self, volumes: &VolumeFilterSet) -> Result<(), Error> {
        for volume in volumes.iter() {
            let column = format!("{EDEP_PREFIX}{volume}");
            tracing::debug!(%column, "declared output column");
        }
        Ok(())
    }

    fn write_record(&mut self, record: &OutputRecord) -> Result<(), Error> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;

        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }

    fn count_written(&self) -> usize {
        self.written
    }
}
