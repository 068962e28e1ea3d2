//! The graph emitter.
//!
//! Serializes finalized module records to an output boundary one at a time,
//! flushing per record so a downstream consumer can start work before
//! resolution finishes. Peak memory stays at roughly one record, not one
//! graph.

use std::io::Write;

use crate::record::ModuleRecord;
use crate::resolver::{RecordStream, ResolveError};
use crate::stats::ResolveStats;

/// Errors while serializing or writing records.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("failed to write record: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output framing for the record stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmitFormat {
    /// One JSON value per line.
    #[default]
    JsonLines,
    /// A single streamed JSON array, written element by element.
    Array,
}

impl std::str::FromStr for EmitFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" | "ndjson" | "json-lines" => Ok(Self::JsonLines),
            "array" | "json" => Ok(Self::Array),
            other => Err(format!("invalid output format: {other}")),
        }
    }
}

/// Writes records incrementally in the chosen format.
///
/// Call [`finish`](Self::finish) once the stream ends; the array format
/// needs it to close the bracket. Each record is flushed as soon as it is
/// written.
#[derive(Debug)]
pub struct RecordWriter<W: Write> {
    writer: W,
    format: EmitFormat,
    emitted: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W, format: EmitFormat) -> Self {
        Self {
            writer,
            format,
            emitted: 0,
        }
    }

    /// Serialize and flush one record.
    pub fn emit(&mut self, record: &ModuleRecord) -> Result<(), EmitError> {
        match self.format {
            EmitFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, record)?;
                self.writer.write_all(b"\n")?;
            }
            EmitFormat::Array => {
                if self.emitted == 0 {
                    self.writer.write_all(b"[\n")?;
                } else {
                    self.writer.write_all(b",\n")?;
                }
                serde_json::to_writer(&mut self.writer, record)?;
            }
        }
        self.emitted += 1;
        self.writer.flush()?;
        Ok(())
    }

    /// Close the stream. Records emitted so far stay valid output even if
    /// the run aborted after them.
    pub fn finish(&mut self) -> Result<(), EmitError> {
        if self.format == EmitFormat::Array {
            if self.emitted == 0 {
                self.writer.write_all(b"[]\n")?;
            } else {
                self.writer.write_all(b"\n]\n")?;
            }
            self.writer.flush()?;
        }
        Ok(())
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Errors from pumping a stream into a writer: either the run failed or the
/// output boundary did.
#[derive(Debug, thiserror::Error)]
pub enum WriteStreamError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// Drive a [`RecordStream`] to completion through a [`RecordWriter`].
///
/// On resolution failure the stream is terminated without emitting the
/// failing module; everything already written remains on the boundary and
/// the error is returned for out-of-band reporting.
pub async fn write_stream<W: Write>(
    mut stream: RecordStream,
    writer: &mut RecordWriter<W>,
) -> Result<ResolveStats, WriteStreamError> {
    while let Some(item) = stream.next().await {
        let record = item?;
        writer.emit(&record)?;
    }
    writer.finish()?;
    Ok(stream.stats().unwrap_or_default())
}
