//! Document sinks: where mined records go.

use std::io::Write;

use crate::error::Result;
use crate::models::TimingDocument;

/// A document store accepting one document at a time.
///
/// Implementations report a refused document as
/// [`MineError::BadRequest`](crate::MineError::BadRequest); callers log the
/// failure and continue with the next document. Any other error means the
/// store is unusable and ends the batch.
pub trait DocumentSink {
    fn index(&mut self, document: &TimingDocument) -> Result<()>;
}

/// Keeps every document in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub documents: Vec<TimingDocument>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentSink for MemorySink {
    fn index(&mut self, document: &TimingDocument) -> Result<()> {
        self.documents.push(document.clone());
        Ok(())
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DocumentSink for JsonLinesSink<W> {
    fn index(&mut self, document: &TimingDocument) -> Result<()> {
        serde_json::to_writer(&mut self.writer, document)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}
