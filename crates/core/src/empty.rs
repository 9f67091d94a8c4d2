use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;

/// Capability check for "this succeeded but carries no data".
///
/// The runners treat a structurally empty success as a failure so a no-op
/// upstream response is never persisted as valid data. Implement this for any
/// type that flows through `query`/`query_multi`.
pub trait IsEmpty {
    fn is_empty_value(&self) -> bool;
}

impl<T> IsEmpty for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl IsEmpty for String {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> IsEmpty for HashMap<K, V> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> IsEmpty for BTreeMap<K, V> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> IsEmpty for IndexMap<K, V> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: IsEmpty> IsEmpty for Option<T> {
    fn is_empty_value(&self) -> bool {
        match self {
            Some(value) => value.is_empty_value(),
            None => true,
        }
    }
}

impl IsEmpty for serde_json::Value {
    fn is_empty_value(&self) -> bool {
        match self {
            serde_json::Value::Null => true,
            serde_json::Value::Array(items) => items.is_empty(),
            serde_json::Value::Object(fields) => fields.is_empty(),
            serde_json::Value::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collections() {
        assert!(Vec::<u32>::new().is_empty_value());
        assert!(!vec![1].is_empty_value());
        assert!(String::new().is_empty_value());
        assert!(HashMap::<String, u32>::new().is_empty_value());
    }

    #[test]
    fn options_delegate() {
        assert!(Option::<Vec<u32>>::None.is_empty_value());
        assert!(Some(Vec::<u32>::new()).is_empty_value());
        assert!(!Some(vec![1]).is_empty_value());
    }

    #[test]
    fn json_values() {
        assert!(json!(null).is_empty_value());
        assert!(json!([]).is_empty_value());
        assert!(json!({}).is_empty_value());
        assert!(!json!({"a": 1}).is_empty_value());
        assert!(!json!(0).is_empty_value());
        assert!(!json!(false).is_empty_value());
    }
}
