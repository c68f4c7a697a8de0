/// Implementation of `formpack encode`.
///
/// Reads a JSON form value, encodes it with [`FormEncoder`], renders the
/// collected fields into a multipart/form-data body and writes it to the
/// output file. Files named with `--blob` are registered in a
/// [`MemoryBlobStore`] first, so `blob:` references in the input resolve
/// to their bytes.
///
/// # Output
///
/// ```text
/// Mode: async (2 blob references)
/// Wrote 1234 bytes (5 parts) to out.bin
/// Content-Type: multipart/form-data; boundary=formpack-3f9c...
/// ```
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use formpack_encoder::{
    EncodingMode, FormCollector, FormEncoder, FsLocalFiles, MemoryBlobStore, Resolution,
    ephemeral_paths, select_encoder,
};
use formpack_types::{Blob, FormValue};
use formpack_wire::Boundary;

use crate::{EncodeArgs, Mode};

/// Run the `formpack encode` command.
///
/// # Errors
///
/// Returns an error if the input cannot be read or parsed, a `--blob`
/// mapping is invalid or its file unreadable, the encoder rejects the
/// input, a local attachment cannot be read, or the output cannot be
/// written.
pub async fn run(args: &EncodeArgs) -> Result<()> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let json: serde_json::Value = serde_json::from_str(&source)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;
    let form = FormValue::from(json);

    let store = Arc::new(MemoryBlobStore::new());
    for (uri, path) in &args.blobs {
        let bytes = fs::read(path).with_context(|| format!("cannot read blob file {}", path.display()))?;
        store
            .insert(uri.clone(), Blob::new(bytes))
            .with_context(|| format!("invalid --blob mapping for {uri}"))?;
    }

    let mut encoder = FormEncoder::new();
    encoder.set_resolver(store);
    if args.concurrent {
        encoder.set_resolution(Resolution::Concurrent);
    }

    let blob_count = ephemeral_paths(&form).len();
    let mode = match args.mode {
        Mode::Auto => select_encoder(&form),
        Mode::Sync => EncodingMode::Sync,
        Mode::Async => EncodingMode::Async,
    };
    println!("Mode: {mode} ({blob_count} blob reference{})", plural(blob_count));

    let collector = encode(&encoder, &form, mode).await?;

    let boundary = match &args.boundary {
        Some(b) => Boundary::new(b.clone()).context("invalid --boundary")?,
        None => Boundary::generate(),
    };
    let files = match &args.base_dir {
        Some(dir) => FsLocalFiles::with_base_dir(dir),
        None => FsLocalFiles::with_base_dir(args.input.parent().unwrap_or_else(|| Path::new("."))),
    };
    let body = collector
        .to_multipart(&boundary, &files)
        .context("failed to render multipart body")?;

    fs::write(&args.output, &body).with_context(|| format!("cannot write {}", args.output.display()))?;

    println!(
        "Wrote {} bytes ({} part{}) to {}",
        body.len(),
        collector.len(),
        plural(collector.len()),
        args.output.display()
    );
    println!("Content-Type: {}", boundary.content_type());
    Ok(())
}

async fn encode(encoder: &FormEncoder, form: &FormValue, mode: EncodingMode) -> Result<FormCollector> {
    match mode {
        EncodingMode::Sync => {
            let collector = encoder.encode_sync(form).context("encoding failed")?;
            // Blob attachments from the best-effort path arrive after the
            // synchronous fields; wait so the written body includes them.
            collector.settle().await;
            Ok(collector)
        }
        EncodingMode::Async => encoder.encode_async(form).await.context("encoding failed"),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use formpack_wire::read_parts;

    use super::*;

    fn args(dir: &Path, mode: Mode) -> EncodeArgs {
        EncodeArgs {
            input: dir.join("form.json"),
            output: dir.join("out.bin"),
            boundary: Some("test-boundary".to_string()),
            blobs: vec![("blob:app/1".to_string(), dir.join("scan.pdf"))],
            mode,
            concurrent: false,
            base_dir: None,
        }
    }

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("form.json"),
            r#"{ "title": "t", "scan": { "uri": "blob:app/1", "name": "scan.pdf" }, "note": { "uri": "note.txt" } }"#,
        )
        .unwrap();
        fs::write(dir.path().join("scan.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("note.txt"), b"hello").unwrap();
        dir
    }

    fn part_names(path: &Path) -> Vec<String> {
        let body = fs::read(path).unwrap();
        let boundary = Boundary::new("test-boundary").unwrap();
        read_parts(&body, &boundary)
            .unwrap()
            .into_iter()
            .map(|p| p.header.name)
            .collect()
    }

    #[tokio::test]
    async fn auto_mode_writes_ordered_body() {
        let dir = setup();
        let args = args(dir.path(), Mode::Auto);
        run(&args).await.unwrap();
        assert_eq!(part_names(&args.output), ["title", "scan", "note"]);
    }

    #[tokio::test]
    async fn sync_mode_appends_blobs_last() {
        let dir = setup();
        let args = args(dir.path(), Mode::Sync);
        run(&args).await.unwrap();
        assert_eq!(part_names(&args.output), ["title", "note", "scan"]);
    }

    #[tokio::test]
    async fn scalar_root_is_an_error() {
        let dir = setup();
        fs::write(dir.path().join("form.json"), "42").unwrap();
        let err = run(&args(dir.path(), Mode::Auto)).await.unwrap_err();
        assert!(format!("{err:#}").contains("mapping or sequence"));
    }
}
