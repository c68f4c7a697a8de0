#![warn(clippy::pedantic)]

pub mod attachment;
pub mod error;
pub mod file_ref;
pub mod resolver;
pub mod value;

pub use attachment::{Attachment, AttachmentSource, DEFAULT_CONTENT_TYPE};
pub use error::ResolveError;
pub use file_ref::{BLOB_SCHEME, FileRef, UriKind};
pub use resolver::{Blob, BlobResolver, LocalFiles};
pub use value::{FormValue, Scalar};
