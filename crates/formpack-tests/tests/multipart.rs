//! Rendering collected forms into multipart/form-data and reading them back.
//!
//! The encoder's output is only useful once a transport has turned it into
//! a request body. These tests render real encodes through
//! [`FormCollector::to_multipart`] and parse the bytes again with
//! `formpack-wire`, so both directions of the framing are exercised.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use formpack_encoder::{EncodeError, FormEncoder, FsLocalFiles, MemoryBlobStore};
use formpack_tests::golden_input;
use formpack_types::{Blob, FormValue, LocalFiles};
use formpack_wire::{Boundary, Part, WireError, read_parts};
use insta::assert_snapshot;
use serde_json::json;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// In-memory local file table keyed by URI.
struct StaticFiles(HashMap<&'static str, &'static [u8]>);

impl LocalFiles for StaticFiles {
    fn read(&self, uri: &str) -> io::Result<Bytes> {
        self.0
            .get(uri)
            .map(|b| Bytes::from_static(*b))
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, uri.to_string()))
    }
}

fn summary(parts: &[Part]) -> String {
    parts
        .iter()
        .map(|p| {
            let body = String::from_utf8_lossy(&p.body);
            match &p.header.file_name {
                None => format!("TEXT name={:?} body={body:?}", p.header.name),
                Some(f) => format!(
                    "FILE name={:?} filename={f:?} type={:?} body={body:?}",
                    p.header.name,
                    p.header.content_type.as_deref().unwrap_or("-")
                ),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn exact_bytes_for_small_form() {
    let form = FormValue::from(json!({
        "a": "1",
        "f": { "uri": "file:///f.txt", "name": "f.txt", "type": "text/plain" }
    }));
    let files = StaticFiles(HashMap::from([("file:///f.txt", &b"hi"[..])]));
    let boundary = Boundary::new("b").unwrap();

    let body = FormEncoder::new()
        .encode_sync(&form)
        .unwrap()
        .to_multipart(&boundary, &files)
        .unwrap();

    let expected = concat!(
        "--b\r\n",
        "Content-Disposition: form-data; name=\"a\"\r\n",
        "\r\n",
        "1\r\n",
        "--b\r\n",
        "Content-Disposition: form-data; name=\"f\"; filename=\"f.txt\"\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "hi\r\n",
        "--b--\r\n",
    );
    assert_eq!(String::from_utf8(body).unwrap(), expected);
}

#[test]
fn scenario_reads_back() {
    let files = StaticFiles(HashMap::from([("file:///x.jpg", &b"JPEG"[..])]));
    let boundary = Boundary::generate();
    let body = FormEncoder::new()
        .encode_sync(&golden_input("scenario"))
        .unwrap()
        .to_multipart(&boundary, &files)
        .unwrap();

    assert_eq!(Boundary::detect(&body).unwrap(), boundary);
    let parts = read_parts(&body, &boundary).unwrap();
    assert_snapshot!(summary(&parts), @r#"
    TEXT name="name" body="Widget"
    TEXT name="is_active" body="0"
    TEXT name="company_id[0]" body="1"
    TEXT name="tags[0]" body="a"
    TEXT name="tags[1]" body="b"
    FILE name="photo" filename="x.jpg" type="image/jpeg" body="JPEG"
    "#);
}

#[tokio::test]
async fn resolved_blobs_and_fallbacks_render() {
    let store = MemoryBlobStore::new();
    store
        .insert("blob:app/report", Blob::new(&b"%PDF-1.7"[..]).with_content_type("application/pdf"))
        .unwrap();
    store.insert("blob:app/signature", Blob::new(&b"SIG"[..])).unwrap();

    let mut encoder = FormEncoder::new();
    encoder.set_resolver(Arc::new(store));
    let collector = encoder.encode_async(&golden_input("mixed_files")).await.unwrap();

    let files = StaticFiles(HashMap::from([
        ("file:///data/site.jpg", &b"JPG"[..]),
        ("content://media/external/42", &b"MEDIA"[..]),
    ]));
    let boundary = Boundary::new("----formpack-test").unwrap();
    let body = collector.to_multipart(&boundary, &files).unwrap();
    let parts = read_parts(&body, &boundary).unwrap();

    assert_snapshot!(summary(&parts), @r#"
    TEXT name="title" body="Inspection"
    TEXT name="attachments[0]" body="cover letter"
    FILE name="attachments[1]" filename="file_1" type="image/jpeg" body="JPG"
    FILE name="attachments[2]" filename="report.pdf" type="application/pdf" body="%PDF-1.7"
    FILE name="attachments[3]" filename="file_3" type="application/octet-stream" body="MEDIA"
    FILE name="attachments[4]" filename="file_4" type="image/png" body=""
    FILE name="signature" filename="file_signature" type="application/octet-stream" body="SIG"
    TEXT name="approved" body="1"
    "#);
}

#[test]
fn quotes_and_newlines_in_names_are_escaped() {
    let form = FormValue::from(json!({ "say \"hi\"": { "line\nbreak": "x" } }));
    let boundary = Boundary::new("b").unwrap();
    let body = FormEncoder::new()
        .encode_sync(&form)
        .unwrap()
        .to_multipart(&boundary, &FsLocalFiles::new())
        .unwrap();

    let text = String::from_utf8(body.clone()).unwrap();
    assert!(text.contains("name=\"say %22hi%22[line%0Abreak]\""), "{text}");
    let parts = read_parts(&body, &boundary).unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].body, b"x");
}

#[test]
fn missing_local_file_fails_rendering_with_its_key() {
    let form = FormValue::from(json!({ "docs": [{ "uri": "file:///nowhere/at/all.pdf" }] }));
    let collector = FormEncoder::new().encode_sync(&form).unwrap();
    let err = collector
        .to_multipart(&Boundary::generate(), &FsLocalFiles::new())
        .unwrap_err();
    match err {
        EncodeError::LocalFileUnavailable { key, uri, source } => {
            assert_eq!(key, "docs[0]");
            assert_eq!(uri, "file:///nowhere/at/all.pdf");
            assert_eq!(source.kind(), io::ErrorKind::NotFound);
        }
        other => panic!("expected LocalFileUnavailable, got {other:?}"),
    }
}

#[test]
fn value_containing_the_delimiter_fails_rendering() {
    let form = FormValue::from(json!({
        "a": "hello\r\n--xyz--\r\n",
        "b": { "uri": "file:///b.txt" }
    }));
    let files = StaticFiles(HashMap::from([("file:///b.txt", &b"B"[..])]));
    let collector = FormEncoder::new().encode_sync(&form).unwrap();

    let err = collector
        .to_multipart(&Boundary::new("xyz").unwrap(), &files)
        .unwrap_err();
    assert!(
        matches!(&err, EncodeError::Wire(WireError::BodyContainsDelimiter { name, .. }) if name == "a"),
        "{err:?}"
    );

    let boundary = Boundary::generate();
    let body = collector.to_multipart(&boundary, &files).unwrap();
    let names: Vec<_> = read_parts(&body, &boundary)
        .unwrap()
        .into_iter()
        .map(|p| p.header.name)
        .collect();
    assert_eq!(names, ["a", "b"]);
}

#[test]
fn literal_percent_names_read_back_unchanged() {
    let form = FormValue::from(json!({ "a%22b": "1", "c": { "uri": "file:///f", "name": "100%.txt" } }));
    let files = StaticFiles(HashMap::from([("file:///f", &b"F"[..])]));
    let boundary = Boundary::new("b").unwrap();
    let body = FormEncoder::new()
        .encode_sync(&form)
        .unwrap()
        .to_multipart(&boundary, &files)
        .unwrap();

    let parts = read_parts(&body, &boundary).unwrap();
    assert_eq!(parts[0].header.name, "a%22b");
    assert_eq!(parts[1].header.file_name.as_deref(), Some("100%.txt"));
}
