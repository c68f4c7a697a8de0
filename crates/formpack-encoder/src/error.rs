use formpack_wire::WireError;

/// Errors that can occur while encoding a form.
///
/// Only structurally fatal problems surface here. Per-attachment blob
/// failures are never errors: the encoder logs them and appends the raw
/// descriptor instead, so one bad file cannot block the rest of a form.
///
/// Error hierarchy:
///
/// ```text
///   EncodeError
///   ├── InvalidRoot           ← root value is not a mapping or sequence
///   ├── DepthLimitExceeded    ← nesting deeper than EncoderConfig::max_depth
///   ├── LocalFileUnavailable  ← rendering could not read a local attachment
///   └── Wire(WireError)       ← from formpack-wire framing
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("form root must be a mapping or sequence, got {kind}")]
    InvalidRoot { kind: &'static str },

    #[error("form nesting exceeds {limit} levels at `{path}`")]
    DepthLimitExceeded { path: String, limit: usize },

    #[error("cannot read local attachment {uri} for field `{key}`")]
    LocalFileUnavailable {
        key: String,
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Wire(#[from] WireError),
}
