//! Edge cases of the encoder that callers are likely to hit in practice.
//!
//! - **Rejected roots**: only mappings and sequences can be forms.
//! - **Deep nesting**: bounded by `EncoderConfig::max_depth`.
//! - **Empty input**: empty containers vanish without error.
//! - **Resolution modes**: sequential and concurrent produce the same form.
//! - **Registered blobs**: the full register, encode, revoke cycle.

use std::sync::Arc;

use formpack_encoder::{
    EncodeError, EncoderConfig, EncodingMode, FieldValue, FormEncoder, MemoryBlobStore, Resolution,
    select_encoder,
};
use formpack_tests::{GatedResolver, golden_input, listing};
use formpack_types::{Attachment, FileRef, FormValue};
use serde_json::{Value, json};

fn nested(depth: usize) -> Value {
    let mut value = json!("leaf");
    for _ in 0..depth {
        value = json!({ "n": value });
    }
    value
}

// ── Rejected roots ────────────────────────────────────────────────────────────

#[tokio::test]
async fn non_container_roots_are_rejected_by_every_path() {
    let roots = [
        FormValue::from(json!(null)),
        FormValue::from(json!("text")),
        FormValue::from(json!(1.5)),
        FormValue::from(json!({ "uri": "file:///x" })),
        FormValue::from(json!({ "uri": "blob:app/1" })),
    ];
    let encoder = FormEncoder::new();
    for root in &roots {
        assert!(matches!(encoder.encode_sync(root), Err(EncodeError::InvalidRoot { .. })));
        assert!(matches!(
            encoder.encode_async(root).await,
            Err(EncodeError::InvalidRoot { .. })
        ));
        assert!(matches!(encoder.encode(root).await, Err(EncodeError::InvalidRoot { .. })));
    }
}

// ── Deep nesting ──────────────────────────────────────────────────────────────

#[test]
fn default_depth_limit_allows_64_levels() {
    let ok = FormValue::from(nested(64));
    let collector = FormEncoder::new().encode_sync(&ok).unwrap();
    assert_eq!(collector.len(), 1);
    assert!(collector.keys()[0].starts_with("n[n][n]"));

    let too_deep = FormValue::from(nested(65));
    match FormEncoder::new().encode_sync(&too_deep) {
        Err(EncodeError::DepthLimitExceeded { limit, path }) => {
            assert_eq!(limit, 64);
            assert_eq!(path.matches('[').count(), 63);
        }
        other => panic!("expected DepthLimitExceeded, got {other:?}"),
    }
}

#[test]
fn custom_depth_and_prefix() {
    let mut encoder = FormEncoder::new();
    encoder.set_config(EncoderConfig {
        max_depth: 2,
        file_name_prefix: "upload-".to_string(),
        ..EncoderConfig::default()
    });
    let form = FormValue::from(json!({ "files": [{ "uri": "file:///a" }] }));
    let collector = encoder.encode_sync(&form).unwrap();
    assert_eq!(
        collector.get("files[0]"),
        Some(FieldValue::File(Attachment::local(
            "file:///a",
            "upload-0",
            "application/octet-stream"
        )))
    );
    assert!(encoder.encode_sync(&FormValue::from(nested(3))).is_err());
}

// ── Empty input ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_containers_produce_empty_forms() {
    for input in [json!({}), json!([]), json!({ "a": [], "b": { "c": {} } })] {
        let form = FormValue::from(input);
        assert_eq!(select_encoder(&form), EncodingMode::Sync);
        assert!(FormEncoder::new().encode(&form).await.unwrap().is_empty());
    }
}

#[test]
fn empty_uri_is_an_ordinary_mapping() {
    let form = FormValue::from(json!({ "avatar": { "uri": "", "name": "me.png" } }));
    let collector = FormEncoder::new().encode_sync(&form).unwrap();
    assert_eq!(collector.keys(), ["avatar[uri]", "avatar[name]"]);
    assert_eq!(collector.get("avatar[uri]"), Some(FieldValue::Text(String::new())));
}

// ── Resolution modes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn sequential_and_concurrent_agree() {
    let input = golden_input("mixed_files");

    let mut sequential = FormEncoder::new();
    sequential.set_resolver(Arc::new(GatedResolver::open_with_type("image/webp")));
    let mut concurrent = sequential.clone();
    concurrent.set_resolution(Resolution::Concurrent);

    let a = sequential.encode_async(&input).await.unwrap();
    let b = concurrent.encode_async(&input).await.unwrap();
    assert_eq!(listing(&a.fields()), listing(&b.fields()));
    assert_eq!(a.fields(), b.fields());
}

#[tokio::test]
async fn missing_resolver_falls_back_everywhere() {
    let input = golden_input("mixed_files");
    let collector = FormEncoder::new().encode(&input).await.unwrap();
    let descriptors = collector
        .fields()
        .into_iter()
        .filter(|f| matches!(f.value, FieldValue::Descriptor(_)))
        .count();
    assert_eq!(descriptors, 3);
    assert_eq!(
        collector.get("attachments[2]"),
        Some(FieldValue::Descriptor(
            FileRef::new("blob:app/report")
                .with_name("report.pdf")
                .with_content_type("application/octet-stream")
        ))
    );
}

// ── Registered blobs ──────────────────────────────────────────────────────────

#[tokio::test]
async fn register_encode_revoke() {
    let store = Arc::new(MemoryBlobStore::new());
    let uri = store.register(&b"GIF89a"[..], Some("image/gif"));

    let mut encoder = FormEncoder::new();
    encoder.set_resolver(store.clone());
    let form = FormValue::from(json!({ "avatar": { "uri": uri.clone() } }));
    assert_eq!(select_encoder(&form), EncodingMode::Async);

    let collector = encoder.encode(&form).await.unwrap();
    assert_eq!(
        collector.get("avatar"),
        Some(FieldValue::File(Attachment::inline(&b"GIF89a"[..], "file_avatar", "image/gif")))
    );

    assert!(store.revoke(&uri));
    let collector = encoder.encode(&form).await.unwrap();
    assert!(matches!(collector.get("avatar"), Some(FieldValue::Descriptor(_))));
}
