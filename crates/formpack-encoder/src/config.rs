use formpack_types::DEFAULT_CONTENT_TYPE;

/// Configuration for the form encoder.
///
/// ```text
/// ┌──────────────────────┬─────────────────────────────────────────────────┐
/// │ Field                │ Purpose                                         │
/// ├──────────────────────┼─────────────────────────────────────────────────┤
/// │ max_depth            │ Nesting limit; deeper input is rejected         │
/// │ file_name_prefix     │ Default file name is `<prefix><last segment>`   │
/// │ default_content_type │ Content type when neither input nor blob has one│
/// │ resolution           │ Sequential or concurrent blob fetches (async)   │
/// └──────────────────────┴─────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Maximum container nesting. The root mapping or sequence is level 1.
    pub max_depth: usize,

    /// Prefix of generated file names. A file reference without a name at
    /// `photos[2]` becomes `file_2` with the default prefix.
    pub file_name_prefix: String,

    /// Content type for attachments with no type of their own.
    pub default_content_type: String,

    /// How `encode_async` dereferences blob references.
    pub resolution: Resolution,
}

impl Default for EncoderConfig {
    /// Depth 64, `file_` prefix, `application/octet-stream`, sequential.
    fn default() -> Self {
        Self {
            max_depth: 64,
            file_name_prefix: "file_".to_string(),
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
            resolution: Resolution::default(),
        }
    }
}

impl EncoderConfig {
    /// Default file name for a reference sitting at path segment `segment`.
    #[must_use]
    pub fn default_file_name(&self, segment: &str) -> String {
        format!("{}{segment}", self.file_name_prefix)
    }
}

/// Scheduling of blob dereferences in the async path.
///
/// Either way the output keeps traversal order; `Concurrent` only
/// overlaps the fetches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Resolution {
    /// Await each fetch before starting the next.
    #[default]
    Sequential,
    /// Start every fetch at once and wait for all of them.
    Concurrent,
}
