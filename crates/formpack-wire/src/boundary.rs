use crate::error::WireError;

/// Longest boundary RFC 2046 allows.
pub const MAX_BOUNDARY_LEN: usize = 70;

/// Prefix of generated boundaries.
const GENERATED_PREFIX: &str = "formpack-";

/// A validated multipart boundary.
///
/// RFC 2046 §5.1.1 grammar:
///
/// ```text
/// boundary := 0*69<bchars> bcharsnospace
/// bchars   := bcharsnospace / " "
/// bcharsnospace := DIGIT / ALPHA / "'" / "(" / ")" / "+" / "_"
///                  / "," / "-" / "." / "/" / ":" / "=" / "?"
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Boundary(String);

impl Boundary {
    /// Validate and wrap a caller-chosen boundary.
    ///
    /// # Errors
    ///
    /// [`WireError::InvalidBoundary`] when the string is empty, longer
    /// than [`MAX_BOUNDARY_LEN`], ends in a space, or contains a
    /// character outside `bchars`.
    pub fn new(boundary: impl Into<String>) -> Result<Self, WireError> {
        let boundary = boundary.into();
        if boundary.is_empty() {
            return Err(WireError::InvalidBoundary { reason: "empty" });
        }
        if boundary.len() > MAX_BOUNDARY_LEN {
            return Err(WireError::InvalidBoundary {
                reason: "longer than 70 characters",
            });
        }
        if boundary.ends_with(' ') {
            return Err(WireError::InvalidBoundary {
                reason: "ends with a space",
            });
        }
        if !boundary.bytes().all(is_bchar) {
            return Err(WireError::InvalidBoundary {
                reason: "contains a character outside the RFC 2046 set",
            });
        }
        Ok(Self(boundary))
    }

    /// A fresh random boundary: `formpack-` followed by a v4 UUID in
    /// simple (32 hex digit) form.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{GENERATED_PREFIX}{}", uuid::Uuid::new_v4().simple()))
    }

    /// Recover the boundary from a body's first delimiter line.
    ///
    /// # Errors
    ///
    /// - [`WireError::MissingDelimiter`] if the body does not start with `--`.
    /// - [`WireError::UnexpectedEof`] if there is no CRLF after it.
    /// - [`WireError::InvalidBoundary`] if the line is not a valid boundary.
    pub fn detect(body: &[u8]) -> Result<Self, WireError> {
        if !body.starts_with(b"--") {
            return Err(WireError::MissingDelimiter { offset: 0 });
        }
        let line_end = find(body, b"\r\n", 2).ok_or(WireError::UnexpectedEof { offset: body.len() })?;
        let line = std::str::from_utf8(&body[2..line_end]).map_err(|_| WireError::InvalidBoundary {
            reason: "not UTF-8",
        })?;
        // The closing delimiter of an empty body carries a trailing `--`.
        let line = line.strip_suffix("--").unwrap_or(line);
        Self::new(line)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the request's `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.0)
    }

    /// The delimiter line (without CRLF): `--<boundary>`.
    pub(crate) fn delimiter(&self) -> Vec<u8> {
        let mut d = Vec::with_capacity(self.0.len() + 2);
        d.extend_from_slice(b"--");
        d.extend_from_slice(self.0.as_bytes());
        d
    }
}

impl std::fmt::Display for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_bchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"'()+_,-./:=? ".contains(&b)
}

/// Position of the first occurrence of `needle` in `haystack` at or after `from`.
pub(crate) fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}
