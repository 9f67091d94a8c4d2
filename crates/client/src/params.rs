use indexmap::IndexMap;

/// Query-parameter map: scalar or array-valued, insertion-ordered.
///
/// Array values repeat the key in the serialized query string
/// (`pmids=1&pmids=2`), matching what the upstream services expect.
#[derive(Debug, Clone, Default)]
pub struct Params {
    entries: IndexMap<String, Vec<String>>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar parameter, replacing any previous values for the key.
    pub fn set(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.entries.insert(key.into(), vec![value.to_string()]);
        self
    }

    /// Set an array-valued parameter; the key repeats once per value.
    pub fn set_all<V: ToString>(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.entries.insert(
            key.into(),
            values.into_iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattened `(key, value)` pairs in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |v| (key.as_str(), v.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_and_array_values() {
        let params = Params::new()
            .set("limit", 500)
            .set_all("pmids", [1, 2, 3])
            .set("offset", 0);

        let pairs: Vec<_> = params.pairs().collect();
        assert_eq!(
            pairs,
            vec![
                ("limit", "500"),
                ("pmids", "1"),
                ("pmids", "2"),
                ("pmids", "3"),
                ("offset", "0"),
            ]
        );
    }

    #[test]
    fn set_replaces_previous_values() {
        let params = Params::new().set("q", "a").set("q", "b");
        let pairs: Vec<_> = params.pairs().collect();
        assert_eq!(pairs, vec![("q", "b")]);
    }
}
