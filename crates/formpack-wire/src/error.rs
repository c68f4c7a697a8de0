/// Errors from multipart framing.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Boundary string violates RFC 2046 (length or character set).
    #[error("invalid boundary: {reason}")]
    InvalidBoundary { reason: &'static str },

    /// Input ended before a delimiter, header block, or body terminator.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// Expected `--<boundary>` at this offset but found something else.
    #[error("expected boundary delimiter at offset {offset}")]
    MissingDelimiter { offset: usize },

    /// A header line was not `Name: value`, or was not valid UTF-8.
    #[error("malformed part header at offset {offset}")]
    MalformedHeader { offset: usize },

    /// A part had no `Content-Disposition: form-data; name="..."` header.
    #[error("part at offset {offset} has no form-data name")]
    MissingName { offset: usize },

    /// A part body contains `CRLF --<boundary>` and would be cut short.
    #[error("body of part {name:?} contains the boundary delimiter at offset {offset}")]
    BodyContainsDelimiter { name: String, offset: usize },

    /// I/O error while writing parts.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
