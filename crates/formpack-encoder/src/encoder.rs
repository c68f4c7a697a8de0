use std::sync::Arc;

use formpack_types::{BlobResolver, FormValue, ResolveError};
use futures_util::future::join_all;
use tokio::runtime::Handle;

use crate::collector::{FormCollector, FormField};
use crate::config::{EncoderConfig, Resolution};
use crate::error::EncodeError;
use crate::traverse::{self, EntrySink, PendingBlob};

/// Which encoding path an input needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodingMode {
    /// No `blob:` references; the synchronous path produces complete output.
    Sync,
    /// At least one `blob:` reference must be dereferenced first.
    Async,
}

impl std::fmt::Display for EncodingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync => f.write_str("sync"),
            Self::Async => f.write_str("async"),
        }
    }
}

/// Pick the encoding path for `input`.
///
/// `Async` exactly when the input holds at least one ephemeral file
/// reference. Pure inspection; nothing is resolved.
#[must_use]
pub fn select_encoder(input: &FormValue) -> EncodingMode {
    if traverse::ephemeral_paths(input).is_empty() {
        EncodingMode::Sync
    } else {
        EncodingMode::Async
    }
}

/// Nested value → flat multipart form encoder.
///
/// Both paths walk the input the same way; they differ only in what
/// happens at a `blob:` reference:
///
/// ```text
/// ┌──────────────┬───────────────────────────────────────────────────┐
/// │ Path         │ At a blob: reference                              │
/// ├──────────────┼───────────────────────────────────────────────────┤
/// │ encode_sync  │ Spawn a background fetch on the current tokio     │
/// │              │ runtime. The result is appended whenever it lands │
/// │              │ (best effort, completion order).                  │
/// │ encode_async │ Record a placeholder. After the walk every blob   │
/// │              │ is fetched and spliced back at its position.      │
/// └──────────────┴───────────────────────────────────────────────────┘
/// ```
///
/// A fetch that fails, or cannot be started, never fails the encode:
/// a warning is logged and the raw descriptor is appended instead.
///
/// # Usage
///
/// ```rust
/// use formpack_encoder::FormEncoder;
/// use formpack_types::FormValue;
/// use serde_json::json;
///
/// let form = FormValue::from(json!({ "name": "Ada", "tags": ["x", "y"] }));
/// let collector = FormEncoder::new().encode_sync(&form).unwrap();
/// assert_eq!(collector.keys(), ["name", "tags[0]", "tags[1]"]);
/// ```
#[derive(Clone, Default)]
pub struct FormEncoder {
    config: EncoderConfig,
    resolver: Option<Arc<dyn BlobResolver>>,
}

impl FormEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn set_config(&mut self, config: EncoderConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Set how `encode_async` schedules blob fetches.
    pub fn set_resolution(&mut self, resolution: Resolution) -> &mut Self {
        self.config.resolution = resolution;
        self
    }

    /// Set the resolver used for `blob:` references.
    ///
    /// Without one, every blob reference falls back to its descriptor.
    pub fn set_resolver(&mut self, resolver: Arc<dyn BlobResolver>) -> &mut Self {
        self.resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Synchronous, best-effort encode.
    ///
    /// Scalars, local files and native attachments are appended before
    /// this returns, in traversal order. Blob references are handed to
    /// background tasks on the ambient tokio runtime; their attachments
    /// are appended to the returned collector later, after every
    /// synchronously produced field, in completion order. Use
    /// [`FormCollector::settle`] to wait for them, or
    /// [`encode_async`](Self::encode_async) for ordered, complete output.
    ///
    /// Outside a runtime there is nothing to spawn on, so blob references
    /// fall back to their descriptors immediately.
    ///
    /// # Errors
    ///
    /// [`EncodeError::InvalidRoot`] or [`EncodeError::DepthLimitExceeded`].
    /// Nothing is spawned when the input is rejected.
    pub fn encode_sync(&self, input: &FormValue) -> Result<FormCollector, EncodeError> {
        let mut plan = Plan::default();
        traverse::walk(input, &self.config, &mut plan)?;

        let collector = FormCollector::new();
        let runtime = Handle::try_current().ok();
        let mut deferred = Vec::new();
        for entry in plan.entries {
            match entry {
                Planned::Ready(field) => collector.extend([field]),
                Planned::Blob(pending) => deferred.push(pending),
            }
        }
        for pending in deferred {
            self.spawn_resolution(&collector, runtime.as_ref(), pending);
        }
        Ok(collector)
    }

    /// Asynchronous, complete encode.
    ///
    /// Every blob reference is resolved before this returns, and its
    /// attachment (or descriptor, on failure) sits exactly where the
    /// reference was in traversal order. Fetches run one after another
    /// or all at once depending on [`EncoderConfig::resolution`].
    ///
    /// # Errors
    ///
    /// [`EncodeError::InvalidRoot`] or [`EncodeError::DepthLimitExceeded`].
    pub async fn encode_async(&self, input: &FormValue) -> Result<FormCollector, EncodeError> {
        let mut plan = Plan::default();
        traverse::walk(input, &self.config, &mut plan)?;

        let collector = FormCollector::new();
        match self.config.resolution {
            Resolution::Sequential => {
                for entry in plan.entries {
                    let field = match entry {
                        Planned::Ready(field) => field,
                        Planned::Blob(pending) => self.resolve_field(pending).await,
                    };
                    collector.extend([field]);
                }
            }
            Resolution::Concurrent => {
                let fields = join_all(plan.entries.into_iter().map(|entry| async move {
                    match entry {
                        Planned::Ready(field) => field,
                        Planned::Blob(pending) => self.resolve_field(pending).await,
                    }
                }))
                .await;
                collector.extend(fields);
            }
        }
        Ok(collector)
    }

    /// Encode with whichever path [`select_encoder`] picks.
    ///
    /// Input without blob references takes the synchronous path, which is
    /// already complete for such input; anything else goes through
    /// [`encode_async`](Self::encode_async). Blob discovery ignores
    /// `max_depth`, so the result never has fetches outstanding.
    ///
    /// # Errors
    ///
    /// As for the chosen path.
    pub async fn encode(&self, input: &FormValue) -> Result<FormCollector, EncodeError> {
        let mode = select_encoder(input);
        tracing::debug!(%mode, "selected encoding path");
        match mode {
            EncodingMode::Sync => self.encode_sync(input),
            EncodingMode::Async => self.encode_async(input).await,
        }
    }

    fn spawn_resolution(&self, collector: &FormCollector, runtime: Option<&Handle>, pending: PendingBlob) {
        let default_content_type = self.config.default_content_type.clone();
        let Some(resolver) = self.resolver.clone() else {
            let value = pending.fallback(&"no blob resolver configured", &default_content_type);
            collector.append(pending.key, value);
            return;
        };
        let Some(runtime) = runtime else {
            let reason = ResolveError::NoRuntime {
                uri: pending.file.uri.clone(),
            };
            let value = pending.fallback(&reason, &default_content_type);
            collector.append(pending.key, value);
            return;
        };

        tracing::debug!(key = %pending.key, uri = %pending.file.uri, "resolving blob in background");
        let background = collector.clone();
        let handle = runtime.spawn(async move {
            let value = traverse::resolve(resolver.as_ref(), &pending, &default_content_type).await;
            background.append(pending.key, value);
        });
        collector.track(handle);
    }

    async fn resolve_field(&self, pending: PendingBlob) -> FormField {
        let default_content_type = &self.config.default_content_type;
        let value = match &self.resolver {
            Some(resolver) => traverse::resolve(resolver.as_ref(), &pending, default_content_type).await,
            None => pending.fallback(&"no blob resolver configured", default_content_type),
        };
        FormField {
            key: pending.key,
            value,
        }
    }
}

impl std::fmt::Debug for FormEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormEncoder")
            .field("config", &self.config)
            .field("has_resolver", &self.resolver.is_some())
            .finish()
    }
}

/// Walker output in traversal order, blobs still unresolved.
#[derive(Default)]
struct Plan {
    entries: Vec<Planned>,
}

enum Planned {
    Ready(FormField),
    Blob(PendingBlob),
}

impl EntrySink for Plan {
    fn field(&mut self, field: FormField) {
        self.entries.push(Planned::Ready(field));
    }

    fn blob(&mut self, pending: PendingBlob) {
        self.entries.push(Planned::Blob(pending));
    }
}
