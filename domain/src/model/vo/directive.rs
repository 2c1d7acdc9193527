use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Batch directives in insertion order. Setting an existing key replaces its
/// value but keeps its position. An empty value is rendered as a bare key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directives(IndexMap<String, String>);

impl Directives {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Directives
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Everything a batch system handler needs to format the directive block of
/// one job file.
#[derive(Debug, Clone, Copy)]
pub struct JobConf<'a> {
    pub task_id: &'a str,
    pub run_name: &'a str,
    /// The job file as the submit command will reference it.
    pub job_file_path: &'a Path,
    pub stdout_path: &'a Path,
    pub stderr_path: &'a Path,
    pub execution_time_limit: Option<Duration>,
    pub directives: &'a Directives,
}

#[cfg(test)]
mod tests {
    use super::Directives;

    #[test]
    fn overwrite_keeps_position() {
        let mut directives = Directives::new();
        directives.insert("--nodes", "1");
        directives.insert("--account", "QXZ5W2");
        directives.insert("--nodes", "5");

        let items: Vec<_> = directives.iter().collect();
        assert_eq!(vec![("--nodes", "5"), ("--account", "QXZ5W2")], items);
    }

    #[test]
    fn deserialize_keeps_order() {
        let directives: Directives =
            serde_json::from_str(r#"{"b": "1", "a": "", "c": "3"}"#).unwrap();
        let keys: Vec<_> = directives.iter().map(|(k, _)| k).collect();
        assert_eq!(vec!["b", "a", "c"], keys);
        assert_eq!(Some(""), directives.get("a"));
    }
}
