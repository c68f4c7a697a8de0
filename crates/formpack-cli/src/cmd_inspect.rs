/// Implementation of `formpack inspect`.
///
/// Reads a multipart/form-data body, splits it into parts and prints a
/// one-line summary per part. The boundary is taken from `--boundary` or
/// detected from the body's first delimiter line.
///
/// # Output format
///
/// ```text
/// Boundary: formpack-3f9c..., 3 parts
/// Part 0: TEXT name="title" (6 bytes)
/// Part 1: FILE name="scan" filename="scan.pdf" type="application/pdf" (4 bytes)
///         Body:    %PDF
/// Part 2: TEXT name="tags[0]" (2 bytes)
/// ---
/// 412 bytes total
/// ```
use std::fs;

use anyhow::{Context, Result};
use formpack_wire::{Boundary, Part, read_parts};

use crate::InspectArgs;

/// Run the `formpack inspect` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the boundary is invalid
/// or cannot be detected, or the body is not well-formed multipart.
pub fn run(args: &InspectArgs) -> Result<()> {
    let bytes = fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;

    let boundary = match &args.boundary {
        Some(b) => Boundary::new(b.clone()).context("invalid --boundary")?,
        None => Boundary::detect(&bytes)
            .with_context(|| format!("cannot detect boundary of {}", args.file.display()))?,
    };
    let parts = read_parts(&bytes, &boundary)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;

    println!(
        "Boundary: {}, {} part{}",
        boundary.as_str(),
        parts.len(),
        if parts.len() == 1 { "" } else { "s" }
    );
    for (idx, part) in parts.iter().enumerate() {
        println!("Part {idx}: {} ({} bytes)", describe(part), part.body.len());
        if args.show_body {
            let body = String::from_utf8_lossy(&part.body);
            let truncated: String = body.chars().take(80).collect();
            let ellipsis = if body.chars().count() > 80 { "…" } else { "" };
            println!("        Body:    {truncated}{ellipsis}");
        }
    }
    println!("---");
    println!("{} bytes total", bytes.len());
    Ok(())
}

/// `TEXT name=".."` or `FILE name=".." filename=".." type=".."`.
fn describe(part: &Part) -> String {
    let header = &part.header;
    match &header.file_name {
        None => format!("TEXT name={:?}", header.name),
        Some(file_name) => {
            let content_type = header.content_type.as_deref().unwrap_or("-");
            format!(
                "FILE name={:?} filename={file_name:?} type={content_type:?}",
                header.name
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use formpack_wire::PartHeader;

    use super::*;

    #[test]
    fn describes_text_and_file_parts() {
        let text = Part {
            header: PartHeader::text("tags[0]"),
            body: b"q3".to_vec(),
        };
        let file = Part {
            header: PartHeader::file("scan", "scan.pdf", "application/pdf"),
            body: Vec::new(),
        };
        assert_eq!(describe(&text), r#"TEXT name="tags[0]""#);
        assert_eq!(
            describe(&file),
            r#"FILE name="scan" filename="scan.pdf" type="application/pdf""#
        );
    }
}
