//! Output collaborators for the final record list.
//!
//! A sink is handed the complete, ascending record list exactly once, and
//! only when no sequence is missing. Failed sessions never reach a sink.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::protocol::Record;

/// Receives the final ordered records.
pub trait RecordSink {
    /// Take the final records, ascending by sequence.
    fn deliver(&mut self, records: &[Record]) -> Result<()>;
}

/// Writes records as a pretty-printed JSON array.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Sink writing to `path`; the file is created on delivery.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonFileSink {
    fn deliver(&mut self, records: &[Record]) -> Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        tracing::info!(path = %self.path.display(), records = records.len(), "JSON file generated");
        Ok(())
    }
}

/// Keeps the records in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    /// Records from the last delivery.
    pub records: Vec<Record>,
    /// Number of deliveries seen.
    pub deliveries: usize,
}

impl RecordSink for VecSink {
    fn deliver(&mut self, records: &[Record]) -> Result<()> {
        self.records = records.to_vec();
        self.deliveries += 1;
        Ok(())
    }
}
