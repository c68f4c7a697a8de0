use percent_encoding::{AsciiSet, utf8_percent_encode};

use crate::boundary::{Boundary, find};
use crate::error::WireError;

const CRLF: &[u8] = b"\r\n";

/// Characters escaped inside quoted `name` / `filename` parameters.
const PARAM_ENCODE_SET: &AsciiSet = &AsciiSet::EMPTY.add(b'"').add(b'\r').add(b'\n').add(b'%');

/// Headers of one form-data part.
///
/// `file_name` is present exactly for file parts; text parts carry only
/// a name. `content_type` is written when set, which the encoder does
/// for every file part.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartHeader {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl PartHeader {
    /// Header for a text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Header for a file field.
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
        }
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.file_name.is_some()
    }
}

/// One part of a multipart/form-data body.
///
/// ```text
/// ┌──────────────────────────────────────────────────────────────────┐
/// │ --<boundary> CRLF                                                │
/// │ Content-Disposition: form-data; name="k"[; filename="f"] CRLF    │
/// │ [Content-Type: <type> CRLF]                                      │
/// │ CRLF                                                             │
/// │ body bytes CRLF                                                  │
/// └──────────────────────────────────────────────────────────────────┘
/// ```
///
/// Parameter values are quoted; `"`, CR and LF inside them are written
/// as `%22`, `%0D` and `%0A`, which is how browsers escape form field
/// names and file names. A literal `%` is written as `%25` so that names
/// read back unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub header: PartHeader,
    pub body: Vec<u8>,
}

impl Part {
    /// Write this part, including its leading delimiter line.
    ///
    /// # Returns
    ///
    /// Total number of bytes written.
    ///
    /// # Errors
    ///
    /// - [`WireError::BodyContainsDelimiter`] if the body holds
    ///   `CRLF --<boundary>`, which would end the part early. Nothing is
    ///   written in that case.
    /// - [`WireError::Io`] if the writer fails.
    pub fn write_to(&self, w: &mut impl std::io::Write, boundary: &Boundary) -> Result<usize, WireError> {
        let mut terminator = CRLF.to_vec();
        terminator.extend_from_slice(&boundary.delimiter());
        if let Some(offset) = find(&self.body, &terminator, 0) {
            return Err(WireError::BodyContainsDelimiter {
                name: self.header.name.clone(),
                offset,
            });
        }

        let mut head = boundary.delimiter();
        head.extend_from_slice(CRLF);

        head.extend_from_slice(b"Content-Disposition: form-data; name=\"");
        head.extend_from_slice(escape_quoted(&self.header.name).as_bytes());
        head.push(b'"');
        if let Some(file_name) = &self.header.file_name {
            head.extend_from_slice(b"; filename=\"");
            head.extend_from_slice(escape_quoted(file_name).as_bytes());
            head.push(b'"');
        }
        head.extend_from_slice(CRLF);

        if let Some(content_type) = &self.header.content_type {
            head.extend_from_slice(b"Content-Type: ");
            // A header value cannot span lines.
            let clean: String = content_type.chars().filter(|c| *c != '\r' && *c != '\n').collect();
            head.extend_from_slice(clean.as_bytes());
            head.extend_from_slice(CRLF);
        }
        head.extend_from_slice(CRLF);

        w.write_all(&head)?;
        w.write_all(&self.body)?;
        w.write_all(CRLF)?;

        Ok(head.len() + self.body.len() + CRLF.len())
    }

    /// Read one part from the start of `buf`.
    ///
    /// # Returns
    ///
    /// `Some((part, bytes_consumed))` for a part, where `bytes_consumed`
    /// stops right at the next delimiter line, or `None` when `buf`
    /// starts with the closing delimiter `--<boundary>--`.
    ///
    /// # Errors
    ///
    /// - [`WireError::MissingDelimiter`] if `buf` does not start with the delimiter.
    /// - [`WireError::UnexpectedEof`] if the header block or body is unterminated.
    /// - [`WireError::MalformedHeader`] for a header line without `:`.
    /// - [`WireError::MissingName`] if no form-data name was found.
    pub fn read_from(buf: &[u8], boundary: &Boundary) -> Result<Option<(Self, usize)>, WireError> {
        let delimiter = boundary.delimiter();
        if !buf.starts_with(&delimiter) {
            return Err(WireError::MissingDelimiter { offset: 0 });
        }
        let mut cursor = delimiter.len();

        // Closing delimiter: the stream is done.
        if buf[cursor..].starts_with(b"--") {
            return Ok(None);
        }
        if !buf[cursor..].starts_with(CRLF) {
            return Err(if buf.len() < cursor + CRLF.len() {
                WireError::UnexpectedEof { offset: buf.len() }
            } else {
                WireError::MissingDelimiter { offset: 0 }
            });
        }
        cursor += CRLF.len();

        // Header lines up to the empty line.
        let mut header = PartHeader::default();
        let mut has_name = false;
        loop {
            let line_end = find(buf, CRLF, cursor).ok_or(WireError::UnexpectedEof { offset: buf.len() })?;
            let line = &buf[cursor..line_end];
            if line.is_empty() {
                cursor = line_end + CRLF.len();
                break;
            }
            let line = std::str::from_utf8(line).map_err(|_| WireError::MalformedHeader { offset: cursor })?;
            let (field, value) = line
                .split_once(':')
                .ok_or(WireError::MalformedHeader { offset: cursor })?;
            let value = value.trim();
            if field.trim().eq_ignore_ascii_case("content-disposition") {
                for (param, param_value) in disposition_params(value) {
                    match param.to_ascii_lowercase().as_str() {
                        "name" => {
                            header.name = param_value;
                            has_name = true;
                        }
                        "filename" => header.file_name = Some(param_value),
                        _ => {}
                    }
                }
            } else if field.trim().eq_ignore_ascii_case("content-type") {
                header.content_type = Some(value.to_string());
            }
            cursor = line_end + CRLF.len();
        }
        if !has_name {
            return Err(WireError::MissingName { offset: 0 });
        }

        // Body runs until CRLF followed by the next delimiter.
        let mut terminator = CRLF.to_vec();
        terminator.extend_from_slice(&delimiter);
        let body_end = find(buf, &terminator, cursor).ok_or(WireError::UnexpectedEof { offset: buf.len() })?;
        let body = buf[cursor..body_end].to_vec();

        Ok(Some((Self { header, body }, body_end + CRLF.len())))
    }
}

fn escape_quoted(value: &str) -> String {
    utf8_percent_encode(value, PARAM_ENCODE_SET).to_string()
}

/// Undo [`escape_quoted`].
///
/// Only `%22`, `%0D`, `%0A` and `%25` are decoded (hex digits in either
/// case). Any other `%` sequence is kept as written, since other writers
/// leave `%` unescaped.
fn unescape_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(i) = rest.find('%') {
        out.push_str(&rest[..i]);
        let decoded = match rest.get(i + 1..i + 3).map(str::to_ascii_uppercase).as_deref() {
            Some("22") => Some('"'),
            Some("0D") => Some('\r'),
            Some("0A") => Some('\n'),
            Some("25") => Some('%'),
            _ => None,
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[i + 3..];
            }
            None => {
                out.push('%');
                rest = &rest[i + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Split `form-data; name="a"; filename="b"` into its parameters.
///
/// Quoted values may contain `;`. Backslash escapes inside quotes are
/// honored for bodies produced by other writers.
fn disposition_params(value: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut rest = match value.split_once(';') {
        Some((_, rest)) => rest,
        None => return params,
    };

    loop {
        rest = rest.trim_start_matches([' ', '\t', ';']);
        let Some((name, after)) = rest.split_once('=') else {
            break;
        };
        let name = name.trim().to_string();

        let (param_value, remaining) = if let Some(quoted) = after.strip_prefix('"') {
            let mut out = String::new();
            let mut chars = quoted.char_indices();
            let mut end = quoted.len();
            while let Some((i, c)) = chars.next() {
                match c {
                    '\\' => {
                        if let Some((_, escaped)) = chars.next() {
                            out.push(escaped);
                        }
                    }
                    '"' => {
                        end = i + 1;
                        break;
                    }
                    other => out.push(other),
                }
            }
            (unescape_quoted(&out), &quoted[end.min(quoted.len())..])
        } else {
            match after.split_once(';') {
                Some((token, remaining)) => (token.trim().to_string(), remaining),
                None => (after.trim().to_string(), ""),
            }
        };

        params.push((name, param_value));
        rest = remaining;
        if rest.is_empty() {
            break;
        }
    }
    params
}
