use bytes::Bytes;

use crate::error::ResolveError;

/// The materialized contents of an ephemeral resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Bytes,
    /// Content type recorded when the blob was created, if any.
    pub content_type: Option<String>,
}

impl Blob {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: None,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Dereferences same-process `blob:` URIs into their bytes.
///
/// This is the asynchronous fetch-and-materialize step of the encoder.
/// Implementations can be an in-memory object-URL table (see
/// `MemoryBlobStore` in `formpack-encoder`), a bridge into a host
/// runtime, or anything else that maps a URI to bytes.
///
/// # Thread Safety
///
/// The synchronous encoder spawns resolutions as independent tasks on a
/// possibly multi-threaded runtime, so implementations must be
/// `Send + Sync` and are shared behind an `Arc`.
///
/// ```text
/// encode_sync:   walk ──▶ spawn(fetch) ──▶ return collector ... task appends later
/// encode_async:  walk ──▶ fetch.await  ──▶ append ──▶ return complete collector
/// ```
#[async_trait::async_trait]
pub trait BlobResolver: Send + Sync {
    /// Fetch the blob named by `uri`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] when the URI is unknown, revoked, uses
    /// a scheme the resolver cannot handle, or the read fails.
    async fn fetch(&self, uri: &str) -> Result<Blob, ResolveError>;
}

/// Reads locally addressable resources (`file://` and friends).
///
/// Local attachments are opaque handles during encoding. Only when a
/// collector is rendered into a multipart body does something have to
/// produce their bytes; that something is a `LocalFiles` implementation
/// supplied by the embedding application.
pub trait LocalFiles: Send + Sync {
    /// Read the complete contents behind `uri`.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying platform layer, including
    /// [`std::io::ErrorKind::Unsupported`] for URI schemes the
    /// implementation does not handle.
    fn read(&self, uri: &str) -> std::io::Result<Bytes>;
}
