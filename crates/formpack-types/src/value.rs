use serde_json::{Number, Value};

use crate::attachment::Attachment;
use crate::file_ref::FileRef;

/// A leaf value of a form.
///
/// Numbers keep their JSON representation; they are never stringified
/// ahead of time because the multipart writer renders them at the very
/// end, exactly as a transport would.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
}

/// An arbitrarily nested form value.
///
/// This is the tagged union the encoder walks:
///
/// ```text
/// FormValue
/// ├── Scalar(Scalar)                 ← leaf: null / bool / number / text
/// ├── Sequence(Vec<FormValue>)       ← keys get `[index]`
/// ├── Mapping(Vec<(String, _)>)      ← keys get `[child]`, insertion order
/// ├── File(FileRef)                  ← `{ uri, name?, type? }` descriptor
/// └── Binary(Attachment)             ← already-materialized attachment
/// ```
///
/// Mappings are an ordered list of pairs rather than a map so that
/// insertion order survives; duplicate keys are kept and emitted twice,
/// which multipart allows.
///
/// Untyped callers go through [`FormValue::from`] on a
/// [`serde_json::Value`], which applies the duck-typed file check
/// ([`FileRef::from_json_object`]).
#[derive(Clone, Debug, PartialEq)]
pub enum FormValue {
    Scalar(Scalar),
    Sequence(Vec<FormValue>),
    Mapping(Vec<(String, FormValue)>),
    File(FileRef),
    Binary(Attachment),
}

impl FormValue {
    /// Build a mapping from `(key, value)` pairs, preserving their order.
    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FormValue>,
    {
        Self::Mapping(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Build a sequence from any iterator of values.
    pub fn sequence<V, I>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FormValue>,
    {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn null() -> Self {
        Self::Scalar(Scalar::Null)
    }

    /// Short, stable name of the variant, for diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(Scalar::Null) => "null",
            Self::Scalar(Scalar::Bool(_)) => "bool",
            Self::Scalar(Scalar::Number(_)) => "number",
            Self::Scalar(Scalar::Text(_)) => "text",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
            Self::File(_) => "file",
            Self::Binary(_) => "binary",
        }
    }

    /// `true` for sequences and mappings, the only values that can sit at
    /// the root of a form.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Sequence(_) | Self::Mapping(_))
    }
}

impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Scalar(Scalar::Null),
            Value::Bool(b) => Self::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Self::Scalar(Scalar::Number(n)),
            Value::String(s) => Self::Scalar(Scalar::Text(s)),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            Value::Object(object) => match FileRef::from_json_object(&object) {
                Some(file) => Self::File(file),
                None => Self::Mapping(
                    object
                        .into_iter()
                        .map(|(k, v)| (k, Self::from(v)))
                        .collect(),
                ),
            },
        }
    }
}

impl From<&Value> for FormValue {
    fn from(value: &Value) -> Self {
        Self::from(value.clone())
    }
}

impl From<Scalar> for FormValue {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

impl From<bool> for FormValue {
    fn from(b: bool) -> Self {
        Self::Scalar(Scalar::Bool(b))
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        Self::Scalar(Scalar::Text(s.to_string()))
    }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self {
        Self::Scalar(Scalar::Text(s))
    }
}

impl From<i64> for FormValue {
    fn from(n: i64) -> Self {
        Self::Scalar(Scalar::Number(n.into()))
    }
}

impl From<u64> for FormValue {
    fn from(n: u64) -> Self {
        Self::Scalar(Scalar::Number(n.into()))
    }
}

impl From<FileRef> for FormValue {
    fn from(file: FileRef) -> Self {
        Self::File(file)
    }
}

impl From<Attachment> for FormValue {
    fn from(attachment: Attachment) -> Self {
        Self::Binary(attachment)
    }
}
