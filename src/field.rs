use serde_json::Value;

/// A single key/value pair attached to a log record.
///
/// Values are JSON values so the access log can carry numbers; fields
/// built from contexts and call sites are always strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: Value,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Shorthand for a string-valued field.
    pub fn str(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Value::String(value.into()))
    }

    /// Build fields from a flat, alternating `key, value, key, value`
    /// sequence.
    ///
    /// An odd-length sequence yields no fields at all rather than a
    /// misaligned list.
    ///
    /// ```
    /// use fieldlog::field::Field;
    ///
    /// assert!(Field::pairs(&["a"]).is_empty());
    /// assert_eq!(Field::pairs(&["a", "1"]), vec![Field::str("a", "1")]);
    /// ```
    pub fn pairs<S: AsRef<str>>(flat: &[S]) -> Vec<Field> {
        if flat.len() % 2 != 0 {
            return Vec::new();
        }
        flat.chunks_exact(2)
            .map(|pair| Field::str(pair[0].as_ref(), pair[1].as_ref()))
            .collect()
    }

    /// Value as it appears in a tag map: strings verbatim, anything else
    /// in its JSON form.
    pub fn tag_value(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for Field {
    fn from((key, value): (K, V)) -> Self {
        Field::str(key, value)
    }
}
