use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use formpack_types::{Blob, BlobResolver, ResolveError, UriKind};

/// Origin segment of URIs minted by [`MemoryBlobStore::register`].
pub const BLOB_ORIGIN: &str = "formpack";

/// In-memory object-URL table.
///
/// Plays the part a browser's `URL.createObjectURL` table plays for
/// in-page blobs: bytes are registered under a `blob:` URI and stay
/// fetchable until revoked. Not persisted across runs.
///
/// # Concurrency
///
/// Lookups (`fetch`, `contains`) take a read lock; `register`, `insert`
/// and `revoke` take a write lock. Background resolutions from
/// `encode_sync` may read from several runtime threads at once.
///
/// # Example
///
/// ```rust
/// use formpack_encoder::MemoryBlobStore;
///
/// let store = MemoryBlobStore::new();
/// let uri = store.register(&b"%PDF-1.7"[..], Some("application/pdf"));
/// assert!(uri.starts_with("blob:formpack/"));
/// assert!(store.contains(&uri));
/// assert!(store.revoke(&uri));
/// assert!(store.is_empty());
/// ```
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Blob>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Register `bytes` and return the URI they can be fetched under.
    ///
    /// The URI is `blob:formpack/<id>`, where `<id>` is the first 16 bytes
    /// of the BLAKE3 hash of the content type and the bytes, hex encoded.
    /// Registering identical content twice yields the same URI; a missing
    /// content type and an empty one are distinct.
    pub fn register(&self, bytes: impl Into<Bytes>, content_type: Option<&str>) -> String {
        let bytes = bytes.into();
        let mut hasher = blake3::Hasher::new();
        match content_type {
            None => {
                hasher.update(&[0]);
            }
            Some(ct) => {
                hasher.update(&[1]);
                hasher.update(&(ct.len() as u64).to_le_bytes());
                hasher.update(ct.as_bytes());
            }
        }
        hasher.update(&bytes);
        let hash = hasher.finalize();
        let uri = format!("blob:{BLOB_ORIGIN}/{}", hex::encode(&hash.as_bytes()[..16]));

        let blob = Blob {
            bytes,
            content_type: content_type.map(str::to_string),
        };
        self.blobs
            .write()
            .expect("blob store lock poisoned")
            .entry(uri.clone())
            .or_insert(blob);
        uri
    }

    /// Store `blob` under a caller-chosen URI, replacing any previous one.
    ///
    /// # Errors
    ///
    /// [`ResolveError::UnsupportedScheme`] unless `uri` starts with `blob:`.
    pub fn insert(&self, uri: impl Into<String>, blob: Blob) -> Result<(), ResolveError> {
        let uri = uri.into();
        if UriKind::of(&uri) != UriKind::Ephemeral {
            return Err(ResolveError::UnsupportedScheme { uri });
        }
        self.blobs
            .write()
            .expect("blob store lock poisoned")
            .insert(uri, blob);
        Ok(())
    }

    /// Forget `uri`. Returns whether it was registered.
    pub fn revoke(&self, uri: &str) -> bool {
        self.blobs
            .write()
            .expect("blob store lock poisoned")
            .remove(uri)
            .is_some()
    }

    #[must_use]
    pub fn contains(&self, uri: &str) -> bool {
        self.blobs
            .read()
            .expect("blob store lock poisoned")
            .contains_key(uri)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().expect("blob store lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total content bytes held, not counting URIs.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.blobs
            .read()
            .expect("blob store lock poisoned")
            .values()
            .map(|b| b.bytes.len())
            .sum()
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobResolver for MemoryBlobStore {
    async fn fetch(&self, uri: &str) -> Result<Blob, ResolveError> {
        if UriKind::of(uri) != UriKind::Ephemeral {
            return Err(ResolveError::UnsupportedScheme { uri: uri.to_string() });
        }
        self.blobs
            .read()
            .expect("blob store lock poisoned")
            .get(uri)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound { uri: uri.to_string() })
    }
}
