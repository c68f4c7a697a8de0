use serde::{Deserialize, Serialize};

/// URI scheme prefix of a same-process object URL.
///
/// Any file reference whose URI starts with this prefix names an
/// in-memory resource that only exists for the lifetime of the process
/// that minted it. It must be dereferenced through a
/// [`BlobResolver`](crate::BlobResolver) before it can be attached.
pub const BLOB_SCHEME: &str = "blob:";

/// How a file reference's URI has to be turned into bytes.
///
/// ```text
/// ┌───────────┬──────────────────────────┬───────────────────────────────┐
/// │ Kind      │ Example URI              │ Resolution                    │
/// ├───────────┼──────────────────────────┼───────────────────────────────┤
/// │ Local     │ file:///data/x.jpg       │ none; read by the platform    │
/// │           │ content://media/42       │ file layer at render time     │
/// │ Ephemeral │ blob:https://app/3f9c..  │ async fetch via BlobResolver  │
/// └───────────┴──────────────────────────┴───────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UriKind {
    Local,
    Ephemeral,
}

impl UriKind {
    /// Classify a URI string.
    ///
    /// Only the `blob:` scheme is ephemeral. Everything else, including
    /// URIs with unknown schemes and bare paths, is treated as a local
    /// handle the platform already knows how to read.
    #[must_use]
    pub fn of(uri: &str) -> Self {
        let is_blob = uri
            .get(..BLOB_SCHEME.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(BLOB_SCHEME));
        if is_blob { Self::Ephemeral } else { Self::Local }
    }
}

/// A file reference: the `{ uri, name, type }` descriptor a form library
/// produces for a picked file.
///
/// `name` and `content_type` are optional on input. The encoder fills in
/// defaults (see `EncoderConfig` in `formpack-encoder`) when it turns the
/// reference into an attachment or a fallback descriptor.
///
/// Serialized field names follow the descriptor convention, so the
/// content type is spelled `type` on the JSON side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl FileRef {
    /// Create a reference with no name or content type.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: None,
            content_type: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> UriKind {
        UriKind::of(&self.uri)
    }

    /// Duck-typed recognition of a file reference inside untyped JSON.
    ///
    /// An object is a file reference when it has a `uri` member holding a
    /// non-empty string. `name` and `type` are picked up when they are
    /// strings and ignored otherwise. Returns `None` for every other object, which the
    /// caller then treats as an ordinary nested mapping.
    #[must_use]
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Option<Self> {
        let uri = object.get("uri")?.as_str().filter(|uri| !uri.is_empty())?;
        let text = |field: &str| object.get(field).and_then(|v| v.as_str()).map(str::to_string);
        Some(Self {
            uri: uri.to_string(),
            name: text("name"),
            content_type: text("type"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blob_scheme_is_ephemeral() {
        assert_eq!(UriKind::of("blob:http://localhost/1234"), UriKind::Ephemeral);
        assert_eq!(UriKind::of("BLOB:http://localhost/1234"), UriKind::Ephemeral);
    }

    #[test]
    fn other_schemes_are_local() {
        for uri in ["file:///tmp/x.jpg", "content://media/1", "ph://ABC", "/tmp/x.jpg", "blo"] {
            assert_eq!(UriKind::of(uri), UriKind::Local, "{uri}");
        }
    }

    #[test]
    fn recognizes_object_with_string_uri() {
        let value = json!({ "uri": "file:///x.jpg", "name": "x.jpg", "type": "image/jpeg" });
        let file = FileRef::from_json_object(value.as_object().unwrap()).unwrap();
        assert_eq!(file.uri, "file:///x.jpg");
        assert_eq!(file.name.as_deref(), Some("x.jpg"));
        assert_eq!(file.content_type.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn non_string_uri_is_not_a_file() {
        let value = json!({ "uri": 42, "name": "x" });
        assert!(FileRef::from_json_object(value.as_object().unwrap()).is_none());
        let value = json!({ "name": "x" });
        assert!(FileRef::from_json_object(value.as_object().unwrap()).is_none());
    }

    #[test]
    fn empty_uri_is_not_a_file() {
        let value = json!({ "uri": "", "name": "x" });
        assert!(FileRef::from_json_object(value.as_object().unwrap()).is_none());
    }

    #[test]
    fn non_string_metadata_is_dropped() {
        let value = json!({ "uri": "file:///x", "name": 7, "type": null });
        let file = FileRef::from_json_object(value.as_object().unwrap()).unwrap();
        assert_eq!(file.name, None);
        assert_eq!(file.content_type, None);
    }

    #[test]
    fn serializes_content_type_as_type() {
        let file = FileRef::new("blob:x/1").with_name("a.png").with_content_type("image/png");
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json, json!({ "uri": "blob:x/1", "name": "a.png", "type": "image/png" }));
    }
}
