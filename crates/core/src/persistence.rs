//! What gets handed to the persistence collaborator once an image is done.

use crate::error::Result;
use crate::mapper::{PixelPoint, PixelRect};
use crate::selection::GroupId;
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub group: GroupId,
    /// Free-form type label for the group, e.g. `"title"`.
    pub tag: String,
    pub text: String,
    /// Footprint corners in source pixels, sorted by x then y.
    pub footprint: Vec<PixelPoint>,
    pub rect: Option<PixelRect>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Final rotation in radians.
    pub rotation_angle: f64,
    pub elapsed_ms: u64,
    pub groups: Vec<GroupRecord>,
}

/// Receives one record per finished image.
pub trait RecordSink {
    fn submit(&mut self, record: &ImageRecord) -> Result<()>;
}

/// Writes each record as one line of JSON.
pub struct JsonRecordWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonRecordWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonRecordWriter<W> {
    fn submit(&mut self, record: &ImageRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
