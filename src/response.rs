//! Tolerant access to API response JSON.
//!
//! Different API response shapes spell the same logical field different
//! ways (`preview_image_url` here, `previewImageUrl` there), and `data`
//! may be a single object or an array. Rather than assuming a canonical
//! spelling, the [`Fields`] accessor tries each plausible key in order,
//! and [`ApiResponse`] normalizes the envelope.

use serde_json::Value;

/// Converts a snake_case field name to its camelCase spelling.
fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Duck-typed field access over [`serde_json::Value`] objects.
///
/// Each getter tries the given name and then its camelCase spelling,
/// returning the first present value of the expected shape.
pub trait Fields {
    /// The first value found under `name` or its camelCase spelling.
    fn field(&self, name: &str) -> Option<&Value>;

    /// A string-typed field.
    fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// An unsigned-integer-typed field.
    fn u64_field(&self, name: &str) -> Option<u64> {
        self.field(name).and_then(Value::as_u64)
    }

    /// An array-typed field.
    fn array_field(&self, name: &str) -> Option<&Vec<Value>> {
        self.field(name).and_then(Value::as_array)
    }

    /// An object-typed field, returned as a [`Value`] for further
    /// [`Fields`] access.
    fn object_field(&self, name: &str) -> Option<&Value> {
        self.field(name).filter(|v| v.is_object())
    }
}

impl Fields for Value {
    fn field(&self, name: &str) -> Option<&Value> {
        let object = self.as_object()?;
        if let Some(value) = object.get(name) {
            return Some(value);
        }
        object.get(&camelize(name))
    }
}

/// A normalized API response envelope.
///
/// `data` is always exposed as a slice (a single-object response becomes
/// a one-element slice); `includes`, `errors`, and `meta` are optional.
#[derive(Debug)]
pub struct ApiResponse {
    root: Value,
    data: Vec<Value>,
}

impl ApiResponse {
    /// Normalizes a parsed response body.
    pub fn from_value(root: Value) -> Self {
        let data = match root.field("data") {
            Some(Value::Array(items)) => items.clone(),
            Some(item) => vec![item.clone()],
            None => vec![],
        };
        ApiResponse { root, data }
    }

    /// The normalized `data` array.
    pub fn data(&self) -> &[Value] {
        &self.data
    }

    /// A related-object array from `includes`, such as `media` or `users`.
    pub fn includes(&self, key: &str) -> Vec<&Value> {
        self.root
            .object_field("includes")
            .and_then(|includes| includes.array_field(key))
            .map(|items| items.iter().collect())
            .unwrap_or_default()
    }

    /// Structured error details attached to the response, if any.
    pub fn errors(&self) -> Vec<&Value> {
        self.root
            .array_field("errors")
            .map(|items| items.iter().collect())
            .unwrap_or_default()
    }

    /// The `meta.result_count` value, if present.
    pub fn result_count(&self) -> Option<u64> {
        self.root
            .object_field("meta")
            .and_then(|meta| meta.u64_field("result_count"))
    }

    /// The `meta.next_token` value, if present.
    pub fn next_token(&self) -> Option<&str> {
        self.root
            .object_field("meta")
            .and_then(|meta| meta.str_field("next_token"))
    }

    /// The raw response body.
    pub fn json(&self) -> &Value {
        &self.root
    }
}
