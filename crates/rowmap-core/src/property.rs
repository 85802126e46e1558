use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::{collections::HashMap, fmt, sync::Arc};

/// Parsed paths, shared by every engine in the process. Paths are immutable
/// once parsed, so entries are never invalidated.
static PATHS: Lazy<RwLock<HashMap<String, Arc<PropertyPath>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// A dotted property path such as `author.name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    /// Parses `path`, returning the memoized result when the same text was
    /// parsed before.
    pub fn parse(path: &str) -> Arc<PropertyPath> {
        if let Some(parsed) = PATHS.read().get(path) {
            return parsed.clone();
        }

        PATHS
            .write()
            .entry(path.to_string())
            .or_insert_with(|| {
                Arc::new(PropertyPath {
                    segments: path
                        .split('.')
                        .map(str::trim)
                        .filter(|segment| !segment.is_empty())
                        .map(String::from)
                        .collect(),
                })
            })
            .clone()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment, the property on the root object.
    pub fn head(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or("")
    }

    /// Last segment, the property that receives the value.
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// Segments leading up to the leaf.
    pub fn parents(&self) -> &[String] {
        match self.segments.split_last() {
            Some((_, parents)) => parents,
            None => &[],
        }
    }

    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Folds `name` into the form used for case-insensitive property lookup,
/// optionally dropping underscores so `first_name` finds `firstName`.
pub fn normalize(name: &str, underscore_to_camel_case: bool) -> String {
    name.chars()
        .filter(|c| !underscore_to_camel_case || *c != '_')
        .flat_map(char::to_uppercase)
        .collect()
}
