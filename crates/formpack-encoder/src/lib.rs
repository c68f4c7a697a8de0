#![warn(clippy::pedantic)]

pub mod blob_store;
pub mod collector;
pub mod config;
pub mod encoder;
pub mod error;
pub mod local_files;
pub mod multipart;

mod traverse;

pub use blob_store::{BLOB_ORIGIN, MemoryBlobStore};
pub use collector::{FieldValue, FormCollector, FormField};
pub use config::{EncoderConfig, Resolution};
pub use encoder::{EncodingMode, FormEncoder, select_encoder};
pub use error::EncodeError;
pub use local_files::FsLocalFiles;
pub use multipart::{MultipartWriter, render_multipart};
pub use traverse::ephemeral_paths;
