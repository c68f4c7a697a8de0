use std::sync::{Arc, Mutex};

use formpack_types::{Attachment, FileRef, LocalFiles, Scalar};
use formpack_wire::Boundary;
use serde_json::Number;
use tokio::task::JoinHandle;

use crate::error::EncodeError;

/// Value of one flattened form field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// Kept as a JSON number until the body is rendered.
    Number(Number),
    Null,
    File(Attachment),
    /// Fallback for a blob reference that could not be resolved: the raw
    /// `{ uri, name, type }` descriptor with defaults filled in.
    Descriptor(FileRef),
}

impl FieldValue {
    /// Normalize a leaf scalar. Booleans become `"1"` / `"0"`.
    #[must_use]
    pub fn from_scalar(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Null => Self::Null,
            Scalar::Bool(true) => Self::Text("1".to_string()),
            Scalar::Bool(false) => Self::Text("0".to_string()),
            Scalar::Number(n) => Self::Number(n.clone()),
            Scalar::Text(s) => Self::Text(s.clone()),
        }
    }

    /// The text a transport sends for a non-file field.
    ///
    /// `None` for attachments and descriptors.
    #[must_use]
    pub fn text_value(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Null => Some(String::new()),
            Self::File(_) | Self::Descriptor(_) => None,
        }
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_) | Self::Descriptor(_))
    }
}

/// One `(key, value)` pair of the flattened form.
#[derive(Clone, Debug, PartialEq)]
pub struct FormField {
    pub key: String,
    pub value: FieldValue,
}

/// Ordered, append-only collection of form fields.
///
/// Cloning a collector yields another handle to the same fields. That is
/// what lets the background blob resolutions started by
/// [`FormEncoder::encode_sync`](crate::FormEncoder::encode_sync) append
/// after the collector has been handed back to the caller.
///
/// # Concurrency
///
/// Appends take a mutex, since background tasks may run on other runtime
/// worker threads. [`fields`](Self::fields) returns a snapshot; a later
/// call can see more fields if resolutions are still in flight.
#[derive(Clone, Default)]
pub struct FormCollector {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    fields: Mutex<Vec<FormField>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl FormCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one field at the end.
    pub fn append(&self, key: impl Into<String>, value: FieldValue) {
        self.inner
            .fields
            .lock()
            .expect("form collector lock poisoned")
            .push(FormField {
                key: key.into(),
                value,
            });
    }

    pub(crate) fn extend(&self, fields: impl IntoIterator<Item = FormField>) {
        self.inner
            .fields
            .lock()
            .expect("form collector lock poisoned")
            .extend(fields);
    }

    /// Snapshot of the fields appended so far, in append order.
    #[must_use]
    pub fn fields(&self) -> Vec<FormField> {
        self.inner
            .fields
            .lock()
            .expect("form collector lock poisoned")
            .clone()
    }

    /// Snapshot of the keys appended so far.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .fields
            .lock()
            .expect("form collector lock poisoned")
            .iter()
            .map(|f| f.key.clone())
            .collect()
    }

    /// First value appended under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<FieldValue> {
        self.inner
            .fields
            .lock()
            .expect("form collector lock poisoned")
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .fields
            .lock()
            .expect("form collector lock poisoned")
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of background resolutions that have not finished yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner
            .pending
            .lock()
            .expect("form collector lock poisoned")
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    pub(crate) fn track(&self, handle: JoinHandle<()>) {
        self.inner
            .pending
            .lock()
            .expect("form collector lock poisoned")
            .push(handle);
    }

    /// Wait for every background resolution started so far.
    ///
    /// Resolved attachments land at the end of the collector in
    /// completion order, not at their structural position. Callers that
    /// need ordered, guaranteed output should use
    /// [`FormEncoder::encode_async`](crate::FormEncoder::encode_async).
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(
                &mut *self
                    .inner
                    .pending
                    .lock()
                    .expect("form collector lock poisoned"),
            );
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "background blob resolution did not complete");
                }
            }
        }
    }

    /// Render the fields appended so far into a multipart/form-data body.
    ///
    /// # Errors
    ///
    /// See [`render_multipart`](crate::multipart::render_multipart).
    pub fn to_multipart(&self, boundary: &Boundary, files: &dyn LocalFiles) -> Result<Vec<u8>, EncodeError> {
        crate::multipart::render_multipart(&self.fields(), boundary, files)
    }
}

impl std::fmt::Debug for FormCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormCollector")
            .field("fields", &self.fields())
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_normalize_to_digits() {
        assert_eq!(FieldValue::from_scalar(&Scalar::Bool(true)), FieldValue::Text("1".into()));
        assert_eq!(FieldValue::from_scalar(&Scalar::Bool(false)), FieldValue::Text("0".into()));
    }

    #[test]
    fn numbers_are_not_stringified() {
        let value = FieldValue::from_scalar(&Scalar::Number(42.into()));
        assert_eq!(value, FieldValue::Number(42.into()));
        assert_eq!(value.text_value().as_deref(), Some("42"));
    }

    #[test]
    fn null_renders_empty() {
        assert_eq!(FieldValue::Null.text_value().as_deref(), Some(""));
    }

    #[test]
    fn files_have_no_text_value() {
        let file = FieldValue::File(Attachment::local("file:///x", "x", "image/png"));
        assert!(file.text_value().is_none());
        assert!(file.is_file());
    }

    #[test]
    fn clones_share_fields() {
        let collector = FormCollector::new();
        let handle = collector.clone();
        handle.append("a", FieldValue::Text("1".into()));
        assert_eq!(collector.len(), 1);
        assert_eq!(collector.keys(), ["a"]);
        assert_eq!(collector.get("a"), Some(FieldValue::Text("1".into())));
        assert_eq!(collector.get("b"), None);
    }

    #[tokio::test]
    async fn settle_waits_for_tracked_tasks() {
        let collector = FormCollector::new();
        let background = collector.clone();
        collector.track(tokio::spawn(async move {
            tokio::task::yield_now().await;
            background.append("late", FieldValue::Null);
        }));
        collector.settle().await;
        assert_eq!(collector.pending(), 0);
        assert_eq!(collector.keys(), ["late"]);
    }

    #[tokio::test]
    async fn settle_without_tasks_returns() {
        let collector = FormCollector::new();
        collector.settle().await;
        assert!(collector.is_empty());
    }
}
