//! Assembles buffered capture segments into one deliverable payload.

/// Extension used when the encoding identifier matches nothing specific.
pub const DEFAULT_EXTENSION: &str = "webm";

/// The concatenated recording, ready for submission. Built once at
/// finalize time and consumed immediately by the submission client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPayload {
    pub content: Vec<u8>,
    pub encoding: String,
    pub extension: &'static str,
}

impl AssembledPayload {
    pub fn file_name(&self) -> String {
        format!("recording.{}", self.extension)
    }
}

/// Concatenate `segments` in arrival order into one payload tagged with
/// `encoding`. An empty buffer yields an empty payload, not an error.
pub fn assemble(segments: Vec<Vec<u8>>, encoding: &str) -> AssembledPayload {
    let mut content = Vec::with_capacity(segments.iter().map(Vec::len).sum());
    for segment in &segments {
        content.extend_from_slice(segment);
    }

    AssembledPayload {
        content,
        encoding: encoding.to_string(),
        extension: extension_for(encoding),
    }
}

/// Fixed extension lookup on the encoding identifier. "mp4" also covers
/// "mp4a" codec strings.
pub fn extension_for(encoding: &str) -> &'static str {
    if encoding.contains("mp4") {
        "mp4"
    } else if encoding.contains("ogg") {
        "ogg"
    } else {
        DEFAULT_EXTENSION
    }
}
