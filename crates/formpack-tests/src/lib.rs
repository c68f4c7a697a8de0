//! Shared fixtures for the formpack integration tests and benches.
//!
//! - [`golden_input`] loads a JSON form value from `tests/golden/`.
//! - [`listing`] renders collected fields one per line, for snapshots.
//! - [`GatedResolver`] holds every fetch until the test opens its gate.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use formpack_encoder::{FieldValue, FormField};
use formpack_types::{AttachmentSource, Blob, BlobResolver, FormValue, ResolveError};
use tokio::sync::watch;

/// Read `tests/golden/<name>.json` as a form value.
///
/// # Panics
///
/// If the fixture is missing or not valid JSON.
#[must_use]
pub fn golden_input(name: &str) -> FormValue {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let path = manifest_dir.join("tests/golden").join(format!("{name}.json"));
    let source = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read golden fixture {}: {e}", path.display()));
    let json: serde_json::Value = serde_json::from_str(&source)
        .unwrap_or_else(|e| panic!("invalid JSON in {}: {e}", path.display()));
    FormValue::from(json)
}

/// One line per field:
///
/// ```text
/// name = "Widget"
/// company_id[0] = 1
/// note = null
/// photo = <file x.jpg image/jpeg local file:///x.jpg>
/// scan = <file file_scan application/pdf inline 4 bytes>
/// gone = <descriptor blob:app/9 file_gone application/octet-stream>
/// ```
#[must_use]
pub fn listing(fields: &[FormField]) -> String {
    let mut out = String::new();
    for field in fields {
        let value = match &field.value {
            FieldValue::Text(s) => format!("{s:?}"),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Null => "null".to_string(),
            FieldValue::File(a) => {
                let source = match &a.source {
                    AttachmentSource::Local { uri } => format!("local {uri}"),
                    AttachmentSource::Inline(bytes) => format!("inline {} bytes", bytes.len()),
                };
                format!("<file {} {} {source}>", a.file_name, a.content_type)
            }
            FieldValue::Descriptor(d) => format!(
                "<descriptor {} {} {}>",
                d.uri,
                d.name.as_deref().unwrap_or("-"),
                d.content_type.as_deref().unwrap_or("-")
            ),
        };
        let _ = writeln!(out, "{} = {value}", field.key);
    }
    out
}

/// Resolver that blocks every fetch until [`open`](Self::open) is called.
///
/// Fetched blobs carry the URI as their bytes. URIs containing `missing`
/// fail with [`ResolveError::NotFound`].
pub struct GatedResolver {
    gate: watch::Sender<bool>,
    content_type: Option<String>,
    started: AtomicUsize,
    finished: AtomicUsize,
}

impl GatedResolver {
    #[must_use]
    pub fn closed() -> Self {
        Self {
            gate: watch::Sender::new(false),
            content_type: None,
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        }
    }

    /// A resolver whose gate is already open.
    #[must_use]
    pub fn open_with_type(content_type: &str) -> Self {
        let resolver = Self {
            content_type: Some(content_type.to_string()),
            ..Self::closed()
        };
        resolver.open();
        resolver
    }

    /// Let every waiting and future fetch complete.
    pub fn open(&self) {
        self.gate.send_replace(true);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobResolver for GatedResolver {
    async fn fetch(&self, uri: &str) -> Result<Blob, ResolveError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        self.finished.fetch_add(1, Ordering::SeqCst);

        if uri.contains("missing") {
            return Err(ResolveError::NotFound { uri: uri.to_string() });
        }
        let mut blob = Blob::new(uri.as_bytes().to_vec());
        if let Some(ct) = &self.content_type {
            blob = blob.with_content_type(ct.clone());
        }
        Ok(blob)
    }
}
