//! The one traversal shared by every encoding mode.
//!
//! The walker flattens a [`FormValue`] depth-first into bracket-keyed
//! fields. It never does I/O: when it reaches a `blob:` reference it
//! hands a [`PendingBlob`] to its [`EntrySink`], and the sink decides
//! how that blob gets resolved. The synchronous encoder's sink spawns a
//! background task; the asynchronous encoder's sink records a placeholder
//! that is awaited after the walk.

use formpack_types::{Attachment, BlobResolver, FileRef, FormValue, UriKind};

use crate::collector::{FieldValue, FormField};
use crate::config::EncoderConfig;
use crate::error::EncodeError;

/// A `blob:` reference found during the walk, waiting to be resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PendingBlob {
    pub key: String,
    pub file: FileRef,
    /// `<prefix><segment>`, used when the reference has no name.
    pub default_name: String,
}

impl PendingBlob {
    /// The raw descriptor appended when resolution is impossible or fails.
    pub fn descriptor(&self, default_content_type: &str) -> FieldValue {
        FieldValue::Descriptor(FileRef {
            uri: self.file.uri.clone(),
            name: Some(self.file.name.clone().unwrap_or_else(|| self.default_name.clone())),
            content_type: Some(
                self.file
                    .content_type
                    .clone()
                    .unwrap_or_else(|| default_content_type.to_string()),
            ),
        })
    }

    /// Log why the blob cannot be resolved and return its descriptor.
    pub fn fallback(&self, reason: &dyn std::fmt::Display, default_content_type: &str) -> FieldValue {
        tracing::warn!(
            key = %self.key,
            uri = %self.file.uri,
            reason = %reason,
            "blob reference not resolved, appending raw descriptor"
        );
        self.descriptor(default_content_type)
    }
}

/// Receives the walker's output.
pub(crate) trait EntrySink {
    /// A finished field: scalar, local attachment, or native binary.
    fn field(&mut self, field: FormField);

    /// A `blob:` reference that still needs dereferencing.
    fn blob(&mut self, pending: PendingBlob);
}

/// Flatten `root` into `sink`.
///
/// # Errors
///
/// - [`EncodeError::InvalidRoot`] if `root` is not a mapping or sequence.
/// - [`EncodeError::DepthLimitExceeded`] if containers nest deeper than
///   `config.max_depth`.
pub(crate) fn walk(root: &FormValue, config: &EncoderConfig, sink: &mut impl EntrySink) -> Result<(), EncodeError> {
    if !root.is_container() {
        return Err(EncodeError::InvalidRoot {
            kind: root.kind_name(),
        });
    }
    Walker { config, sink }.visit(root, "", "", 0)
}

/// Key paths of every `blob:` reference in `root`, in traversal order.
///
/// Pure inspection: no resolution, no logging. Nesting depth is not
/// limited here, so a reference below any configured `max_depth` is still
/// found. A non-container root yields no paths.
#[must_use]
pub fn ephemeral_paths(root: &FormValue) -> Vec<String> {
    struct Paths(Vec<String>);

    impl EntrySink for Paths {
        fn field(&mut self, _field: FormField) {}

        fn blob(&mut self, pending: PendingBlob) {
            self.0.push(pending.key);
        }
    }

    let config = EncoderConfig {
        max_depth: usize::MAX,
        ..EncoderConfig::default()
    };
    let mut paths = Paths(Vec::new());
    // Only InvalidRoot can fail an unbounded walk; encoding reports it.
    if walk(root, &config, &mut paths).is_err() {
        return Vec::new();
    }
    paths.0
}

/// Key of a child: bare at the root, `parent[segment]` below it.
pub(crate) fn child_key(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}[{segment}]")
    }
}

/// Dereference one blob, falling back to its descriptor on failure.
pub(crate) async fn resolve(resolver: &dyn BlobResolver, pending: &PendingBlob, default_content_type: &str) -> FieldValue {
    match resolver.fetch(&pending.file.uri).await {
        Ok(blob) => {
            let file_name = pending
                .file
                .name
                .clone()
                .unwrap_or_else(|| pending.default_name.clone());
            let content_type = pending
                .file
                .content_type
                .clone()
                .or(blob.content_type)
                .unwrap_or_else(|| default_content_type.to_string());
            tracing::debug!(
                key = %pending.key,
                uri = %pending.file.uri,
                file_name = %file_name,
                content_type = %content_type,
                bytes = blob.bytes.len(),
                "appending resolved blob attachment"
            );
            FieldValue::File(Attachment::inline(blob.bytes, file_name, content_type))
        }
        Err(e) => pending.fallback(&e, default_content_type),
    }
}

struct Walker<'a, S> {
    config: &'a EncoderConfig,
    sink: &'a mut S,
}

impl<S: EntrySink> Walker<'_, S> {
    fn visit(&mut self, value: &FormValue, key: &str, segment: &str, depth: usize) -> Result<(), EncodeError> {
        match value {
            FormValue::Mapping(entries) => {
                let depth = self.enter(key, depth)?;
                for (child, child_value) in entries {
                    self.visit(child_value, &child_key(key, child), child, depth)?;
                }
            }
            FormValue::Sequence(items) => {
                let depth = self.enter(key, depth)?;
                for (index, item) in items.iter().enumerate() {
                    let segment = index.to_string();
                    self.visit(item, &child_key(key, &segment), &segment, depth)?;
                }
            }
            FormValue::Scalar(scalar) => self.sink.field(FormField {
                key: key.to_string(),
                value: FieldValue::from_scalar(scalar),
            }),
            FormValue::Binary(attachment) => {
                self.append_attachment(key, attachment.clone());
            }
            FormValue::File(file) => match file.kind() {
                UriKind::Local => {
                    let attachment = Attachment::local(
                        file.uri.clone(),
                        file.name.clone().unwrap_or_else(|| self.config.default_file_name(segment)),
                        file.content_type
                            .clone()
                            .unwrap_or_else(|| self.config.default_content_type.clone()),
                    );
                    self.append_attachment(key, attachment);
                }
                UriKind::Ephemeral => self.sink.blob(PendingBlob {
                    key: key.to_string(),
                    file: file.clone(),
                    default_name: self.config.default_file_name(segment),
                }),
            },
        }
        Ok(())
    }

    fn append_attachment(&mut self, key: &str, attachment: Attachment) {
        tracing::debug!(
            key = %key,
            file_name = %attachment.file_name,
            content_type = %attachment.content_type,
            "appending attachment"
        );
        self.sink.field(FormField {
            key: key.to_string(),
            value: FieldValue::File(attachment),
        });
    }

    /// Step into a container, enforcing the depth limit.
    fn enter(&self, key: &str, depth: usize) -> Result<usize, EncodeError> {
        let depth = depth + 1;
        if depth > self.config.max_depth {
            return Err(EncodeError::DepthLimitExceeded {
                path: if key.is_empty() { "<root>".to_string() } else { key.to_string() },
                limit: self.config.max_depth,
            });
        }
        Ok(depth)
    }
}
