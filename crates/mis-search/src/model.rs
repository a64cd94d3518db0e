//! Core data types shared by every stage of the search.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Width and height of an item as it is offered to the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// A rectangular item to be packed, identified by a unique key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub key: String,
    pub dimensions: Dimensions,
}

impl Item {
    pub fn new(key: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            key: key.into(),
            dimensions: Dimensions::new(width, height),
        }
    }
}

/// Identifier of a container ("machine") inside one instance.
///
/// Instance files use integer ids, but any scalar is accepted and kept in
/// its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawContainerId", into = "String")]
pub struct ContainerId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawContainerId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<RawContainerId> for ContainerId {
    fn from(raw: RawContainerId) -> Self {
        match raw {
            RawContainerId::Int(n) => ContainerId(n.to_string()),
            RawContainerId::Float(f) => ContainerId(f.to_string()),
            RawContainerId::Text(s) => ContainerId(s),
        }
    }
}

impl From<ContainerId> for String {
    fn from(id: ContainerId) -> Self {
        id.0
    }
}

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        ContainerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A rectangular container of length `L` and width `W`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub length: f64,
    pub width: f64,
}

impl Container {
    pub fn new(id: impl Into<String>, length: f64, width: f64) -> Self {
        Self {
            id: ContainerId::new(id),
            length,
            width,
        }
    }

    /// `"{L}x{W}"`, used to name run log artifacts.
    pub fn size_label(&self) -> String {
        format!("{}x{}", self.length, self.width)
    }
}

/// Lower-left corner of a placed item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A subset of item keys with at least two members.
///
/// The keys keep the order in which the enumerator produced them (used for
/// reporting), while equality and hashing only look at the set of keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Combination {
    keys: Vec<String>,
}

impl Combination {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// True if every key of `self` is also a key of `other`.
    pub fn is_subset_of(&self, other: &Combination) -> bool {
        self.keys.len() <= other.keys.len() && self.keys.iter().all(|k| other.contains(k))
    }

    /// Keys sorted and deduplicated; the set identity of the combination.
    pub fn canonical(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.keys.iter().map(String::as_str).collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    /// Stable textual form of the set identity, used as the cache key.
    pub fn canonical_key(&self) -> String {
        // A JSON array keeps keys containing separators unambiguous.
        serde_json::to_string(&self.canonical()).unwrap_or_default()
    }
}

impl PartialEq for Combination {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for Combination {}

impl Hash for Combination {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.keys.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_combination_equality_ignores_order() {
        let a = Combination::new(["x", "y", "z"]);
        let b = Combination::new(["z", "x", "y"]);
        assert_eq!(a, b);
        assert_eq!(a.canonical_key(), b.canonical_key());

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_combination_subset() {
        let small = Combination::new(["a", "c"]);
        let big = Combination::new(["a", "b", "c"]);
        assert!(small.is_subset_of(&big));
        assert!(!big.is_subset_of(&small));
        assert!(small.is_subset_of(&small));
    }

    #[test]
    fn test_canonical_key_format() {
        let combo = Combination::new(["2-1", "1-1"]);
        assert_eq!(combo.canonical_key(), r#"["1-1","2-1"]"#);
    }

    #[test]
    fn test_container_id_from_number_or_text() {
        let id: ContainerId = serde_json::from_str("3").unwrap();
        assert_eq!(id.as_str(), "3");
        let id: ContainerId = serde_json::from_str("\"m-1\"").unwrap();
        assert_eq!(id.as_str(), "m-1");
    }

    #[test]
    fn test_size_label() {
        let c = Container::new("1", 10.0, 12.5);
        assert_eq!(c.size_label(), "10x12.5");
    }
}
