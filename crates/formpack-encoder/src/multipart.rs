use formpack_types::{AttachmentSource, LocalFiles};
use formpack_wire::{Boundary, Part, PartHeader, write_closing};

use crate::collector::{FieldValue, FormField};
use crate::error::EncodeError;

/// Serializer for multipart/form-data bodies.
///
/// `MultipartWriter` turns [`FormField`]s into wire [`Part`]s and
/// accumulates them into one buffer, handing it off with
/// [`finish`](Self::finish) once the closing delimiter is written.
///
/// Field rendering:
///
/// ```text
/// ┌─────────────┬──────────────────────────────┬─────────────────────────┐
/// │ FieldValue  │ Part headers                 │ Part body               │
/// ├─────────────┼──────────────────────────────┼─────────────────────────┤
/// │ Text        │ name                         │ UTF-8 text              │
/// │ Number      │ name                         │ JSON number text        │
/// │ Null        │ name                         │ empty                   │
/// │ File        │ name, filename, Content-Type │ inline bytes, or bytes  │
/// │             │                              │ read via LocalFiles     │
/// │ Descriptor  │ name, filename, Content-Type │ empty (blob unresolved) │
/// └─────────────┴──────────────────────────────┴─────────────────────────┘
/// ```
pub struct MultipartWriter<'a> {
    buf: Vec<u8>,
    boundary: &'a Boundary,
    files: &'a dyn LocalFiles,
}

impl<'a> MultipartWriter<'a> {
    pub fn new(boundary: &'a Boundary, files: &'a dyn LocalFiles) -> Self {
        Self::with_capacity(0, boundary, files)
    }

    /// Pre-allocate `capacity` bytes of output.
    pub fn with_capacity(capacity: usize, boundary: &'a Boundary, files: &'a dyn LocalFiles) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            boundary,
            files,
        }
    }

    /// Append one field as a part.
    ///
    /// # Errors
    ///
    /// [`EncodeError::LocalFileUnavailable`] if a local attachment cannot
    /// be read; [`EncodeError::Wire`] on framing failure.
    pub fn write_field(&mut self, field: &FormField) -> Result<&mut Self, EncodeError> {
        let part = match &field.value {
            FieldValue::File(attachment) => {
                let body = match &attachment.source {
                    AttachmentSource::Inline(bytes) => bytes.to_vec(),
                    AttachmentSource::Local { uri } => self
                        .files
                        .read(uri)
                        .map_err(|source| EncodeError::LocalFileUnavailable {
                            key: field.key.clone(),
                            uri: uri.clone(),
                            source,
                        })?
                        .to_vec(),
                };
                Part {
                    header: PartHeader::file(&field.key, &attachment.file_name, &attachment.content_type),
                    body,
                }
            }
            FieldValue::Descriptor(descriptor) => {
                tracing::warn!(
                    key = %field.key,
                    uri = %descriptor.uri,
                    "rendering unresolved blob reference as an empty file part"
                );
                Part {
                    header: PartHeader::file(
                        &field.key,
                        descriptor.name.clone().unwrap_or_default(),
                        descriptor.content_type.clone().unwrap_or_default(),
                    ),
                    body: Vec::new(),
                }
            }
            other => Part {
                header: PartHeader::text(&field.key),
                body: other.text_value().unwrap_or_default().into_bytes(),
            },
        };
        part.write_to(&mut self.buf, self.boundary)?;
        Ok(self)
    }

    /// Bytes written so far, without the closing delimiter.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Write the closing delimiter and return the body.
    ///
    /// # Errors
    ///
    /// [`EncodeError::Wire`] if the closing line cannot be written.
    pub fn finish(mut self) -> Result<Vec<u8>, EncodeError> {
        write_closing(&mut self.buf, self.boundary)?;
        Ok(self.buf)
    }
}

/// Render `fields`, in order, into a complete multipart/form-data body.
///
/// # Errors
///
/// See [`MultipartWriter::write_field`].
pub fn render_multipart(fields: &[FormField], boundary: &Boundary, files: &dyn LocalFiles) -> Result<Vec<u8>, EncodeError> {
    let mut writer = MultipartWriter::with_capacity(fields.len() * 96, boundary, files);
    for field in fields {
        writer.write_field(field)?;
    }
    writer.finish()
}
