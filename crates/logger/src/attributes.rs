use serde_json::{Map, Value};

/// Key-value context merged into a log record.
pub type LogAttributes = Map<String, Value>;

/// Conversion into [`LogAttributes`] for the attribute-taking logger calls.
///
/// A JSON object is used as-is, `null` is empty, and any other JSON value is
/// kept under the `extra` key.
pub trait IntoLogAttributes {
    fn into_log_attributes(self) -> LogAttributes;
}

impl IntoLogAttributes for LogAttributes {
    fn into_log_attributes(self) -> LogAttributes {
        self
    }
}

impl IntoLogAttributes for Value {
    fn into_log_attributes(self) -> LogAttributes {
        match self {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("extra".to_string(), other);
                map
            }
        }
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> IntoLogAttributes for [(K, V); N] {
    fn into_log_attributes(self) -> LogAttributes {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl<K: Into<String>, V: Into<Value>> IntoLogAttributes for Vec<(K, V)> {
    fn into_log_attributes(self) -> LogAttributes {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}
