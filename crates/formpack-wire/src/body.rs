use crate::boundary::Boundary;
use crate::error::WireError;
use crate::part::Part;

/// Write the closing delimiter `--<boundary>--` CRLF.
///
/// # Returns
///
/// Number of bytes written.
pub fn write_closing(w: &mut impl std::io::Write, boundary: &Boundary) -> Result<usize, WireError> {
    let mut line = boundary.delimiter();
    line.extend_from_slice(b"--\r\n");
    w.write_all(&line)?;
    Ok(line.len())
}

/// Read every part of a complete multipart body.
///
/// Stops at the closing delimiter; anything after it (the epilogue) is
/// ignored, as RFC 2046 requires.
///
/// # Errors
///
/// Any [`WireError`] from [`Part::read_from`]. A body that runs out
/// before its closing delimiter is [`WireError::UnexpectedEof`].
pub fn read_parts(buf: &[u8], boundary: &Boundary) -> Result<Vec<Part>, WireError> {
    let mut parts = Vec::new();
    let mut cursor = 0;
    loop {
        if cursor >= buf.len() {
            return Err(WireError::UnexpectedEof { offset: cursor });
        }
        match Part::read_from(&buf[cursor..], boundary).map_err(|e| offset_by(e, cursor))? {
            Some((part, consumed)) => {
                parts.push(part);
                cursor += consumed;
            }
            None => return Ok(parts),
        }
    }
}

/// Rebase a part-relative error offset onto the whole body.
fn offset_by(err: WireError, base: usize) -> WireError {
    match err {
        WireError::UnexpectedEof { offset } => WireError::UnexpectedEof { offset: base + offset },
        WireError::MissingDelimiter { offset } => WireError::MissingDelimiter { offset: base + offset },
        WireError::MalformedHeader { offset } => WireError::MalformedHeader { offset: base + offset },
        WireError::MissingName { offset } => WireError::MissingName { offset: base + offset },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::PartHeader;

    #[test]
    fn empty_body_is_just_the_closing_line() {
        let boundary = Boundary::new("b").unwrap();
        let mut buf = Vec::new();
        let n = write_closing(&mut buf, &boundary).unwrap();
        assert_eq!(buf, b"--b--\r\n");
        assert_eq!(n, buf.len());
        assert!(read_parts(&buf, &boundary).unwrap().is_empty());
    }

    #[test]
    fn reads_all_parts_in_order() {
        let boundary = Boundary::new("b").unwrap();
        let parts = vec![
            Part {
                header: PartHeader::text("a"),
                body: b"1".to_vec(),
            },
            Part {
                header: PartHeader::text("b[c]"),
                body: b"2".to_vec(),
            },
            Part {
                header: PartHeader::file("photo", "x.jpg", "image/jpeg"),
                body: vec![1, 2, 3],
            },
        ];
        let mut buf = Vec::new();
        for part in &parts {
            part.write_to(&mut buf, &boundary).unwrap();
        }
        write_closing(&mut buf, &boundary).unwrap();
        buf.extend_from_slice(b"epilogue is ignored");

        assert_eq!(read_parts(&buf, &boundary).unwrap(), parts);
    }

    #[test]
    fn missing_closing_delimiter_is_eof() {
        let boundary = Boundary::new("b").unwrap();
        let mut buf = Vec::new();
        Part {
            header: PartHeader::text("a"),
            body: b"1".to_vec(),
        }
        .write_to(&mut buf, &boundary)
        .unwrap();
        assert!(matches!(
            read_parts(&buf, &boundary),
            Err(WireError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn error_offsets_are_body_relative() {
        let boundary = Boundary::new("b").unwrap();
        let mut buf = Vec::new();
        Part {
            header: PartHeader::text("a"),
            body: b"1".to_vec(),
        }
        .write_to(&mut buf, &boundary)
        .unwrap();
        let second_start = buf.len();
        buf.extend_from_slice(b"--b\r\nno colon here\r\n\r\nx\r\n--b--\r\n");
        match read_parts(&buf, &boundary) {
            Err(WireError::MalformedHeader { offset }) => assert!(offset > second_start),
            other => panic!("expected MalformedHeader, got {other:?}"),
        }
    }
}
