use bytes::Bytes;

/// Content type used when neither the input nor a resolved blob names one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A binary attachment, ready to become a file part of a multipart body.
///
/// An attachment always carries a file name and a content type. Its bytes
/// live in one of two places:
///
/// ```text
/// ┌──────────┬───────────────────────────────────────────────────────┐
/// │ Source   │ Meaning                                               │
/// ├──────────┼───────────────────────────────────────────────────────┤
/// │ Local    │ Opaque platform handle. Bytes are read by a           │
/// │          │ `LocalFiles` implementation when the body is rendered │
/// │ Inline   │ Bytes already in memory (a resolved blob, or a native │
/// │          │ attachment handed in by the caller)                   │
/// └──────────┴───────────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub source: AttachmentSource,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttachmentSource {
    Local { uri: String },
    Inline(Bytes),
}

impl Attachment {
    /// An attachment backed by a local URI.
    pub fn local(
        uri: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            source: AttachmentSource::Local { uri: uri.into() },
        }
    }

    /// An attachment whose bytes are already in memory.
    pub fn inline(
        bytes: impl Into<Bytes>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            source: AttachmentSource::Inline(bytes.into()),
        }
    }

    /// The local URI, if this attachment is not inline.
    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        match &self.source {
            AttachmentSource::Local { uri } => Some(uri),
            AttachmentSource::Inline(_) => None,
        }
    }

    /// Byte length for inline attachments; `None` for local handles whose
    /// size is only known once the platform reads them.
    #[must_use]
    pub fn inline_len(&self) -> Option<usize> {
        match &self.source {
            AttachmentSource::Local { .. } => None,
            AttachmentSource::Inline(bytes) => Some(bytes.len()),
        }
    }
}
