//! Multipart form builder

use rand::random;
use serde_json::Value;

use crate::error::Error;
use crate::qs::json_type_name;

/// Multipart form data
///
/// Parts are encoded in insertion order. A boundary is generated every time
/// the form is encoded, so the same form can be sent more than once.
///
/// ```
/// use isoreq::FormData;
///
/// let form = FormData::new()
///     .append("foo", "baz")
///     .append_file("upload", "hello.txt", Some("text/plain"), b"hello".to_vec());
/// assert_eq!(form.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    parts: Vec<FormPart>,
}

/// One named part of a [`FormData`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    name: String,
    data: Vec<u8>,
    file_name: Option<String>,
    content_type: Option<String>,
}

impl FormPart {
    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw part content
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// File name, for file parts
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Declared content type, for file parts
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn mentions(&self, needle: &[u8]) -> bool {
        contains(self.name.as_bytes(), needle)
            || contains(&self.data, needle)
            || self
                .file_name
                .as_deref()
                .is_some_and(|f| contains(f.as_bytes(), needle))
    }
}

impl FormData {
    /// Empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plain field
    #[must_use]
    pub fn append(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.push(name, value);
        self
    }

    /// Append a plain field in place
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.parts.push(FormPart {
            name: name.into(),
            data: value.into(),
            file_name: None,
            content_type: None,
        });
    }

    /// Append a file part
    #[must_use]
    pub fn append_file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<&str>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            data: data.into(),
            file_name: Some(file_name.into()),
            content_type: content_type.map(str::to_string),
        });
        self
    }

    /// Parts in insertion order
    pub fn parts(&self) -> impl Iterator<Item = &FormPart> {
        self.parts.iter()
    }

    /// Number of parts
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// True when no part was appended
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Encode the form, returning the boundary used and the body bytes
    pub(crate) fn encode(&self) -> (String, Vec<u8>) {
        let boundary = self.fresh_boundary();
        let body = self.encode_with_boundary(&boundary);
        (boundary, body)
    }

    fn fresh_boundary(&self) -> String {
        loop {
            let candidate = format!("isoreq-{:016x}{:016x}", random::<u64>(), random::<u64>());
            if !self.parts.iter().any(|p| p.mentions(candidate.as_bytes())) {
                return candidate;
            }
        }
    }

    fn encode_with_boundary(&self, boundary: &str) -> Vec<u8> {
        let mut body = Vec::new();
        for part in &self.parts {
            body.extend_from_slice(b"--");
            body.extend_from_slice(boundary.as_bytes());
            body.extend_from_slice(b"\r\nContent-Disposition: form-data; name=\"");
            body.extend_from_slice(escape_quoted(&part.name).as_bytes());
            body.push(b'"');
            if let Some(file_name) = &part.file_name {
                body.extend_from_slice(b"; filename=\"");
                body.extend_from_slice(escape_quoted(file_name).as_bytes());
                body.push(b'"');
            }
            body.extend_from_slice(b"\r\n");
            if let Some(content_type) = &part.content_type {
                body.extend_from_slice(b"Content-Type: ");
                body.extend_from_slice(content_type.as_bytes());
                body.extend_from_slice(b"\r\n");
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(&part.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(b"--");
        body.extend_from_slice(boundary.as_bytes());
        body.extend_from_slice(b"--\r\n");
        body
    }
}

impl TryFrom<&Value> for FormData {
    type Error = Error;

    /// Build a form from a JSON object; arrays append the field once per element
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(Error::invalid_argument(format!(
                    "form must be an object, got {}",
                    json_type_name(other)
                )))
            }
        };

        let mut form = FormData::new();
        for (name, field) in map {
            match field {
                Value::Array(items) => {
                    for item in items {
                        form.push(name.clone(), field_text(item));
                    }
                }
                other => form.push(name.clone(), field_text(other)),
            }
        }
        Ok(form)
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Quote escaping used by browsers for `Content-Disposition` parameters
fn escape_quoted(input: &str) -> String {
    input
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty()
        && haystack.len() >= needle.len()
        && haystack.windows(needle.len()).any(|w| w == needle)
}
