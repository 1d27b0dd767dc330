use core::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Direction;

/// Errors raised when building an [`IndexSpec`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexSpecError {
    #[error("index must have at least one key")]
    Empty,
    #[error("index field name must not be empty")]
    EmptyField,
    #[error("duplicate index field: {0}")]
    DuplicateField(String),
    #[error("index direction must be 1 or -1, got {0}")]
    InvalidDirection(i64),
}

/// A recommended (compound) index: an ordered mapping from field name to direction.
///
/// Key order matters, it is the order of the compound index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexSpec {
    keys: Vec<(String, Direction)>,
}

impl IndexSpec {
    /// Builds an index spec from ordered `(field, direction)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no keys, a field name is empty, or a field repeats.
    pub fn new<I, S>(keys: I) -> Result<Self, IndexSpecError>
    where
        I: IntoIterator<Item = (S, Direction)>,
        S: Into<String>,
    {
        let mut collected: Vec<(String, Direction)> = Vec::new();

        for (field, direction) in keys {
            let field = field.into();
            if field.is_empty() {
                return Err(IndexSpecError::EmptyField);
            }
            if collected.iter().any(|(existing, _)| *existing == field) {
                return Err(IndexSpecError::DuplicateField(field));
            }
            collected.push((field, direction));
        }

        if collected.is_empty() {
            return Err(IndexSpecError::Empty);
        }

        Ok(Self { keys: collected })
    }

    /// Iterates over the `(field, direction)` pairs in index order.
    pub fn keys(&self) -> impl Iterator<Item = (&str, Direction)> {
        self.keys.iter().map(|(field, direction)| (field.as_str(), *direction))
    }

    /// Iterates over the field names in index order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|(field, _)| field.as_str())
    }

    /// Converts to owned field/direction pairs with numeric directions.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, i32)> {
        self.keys
            .iter()
            .map(|(field, direction)| (field.clone(), direction.as_i32()))
            .collect()
    }

    /// Number of keys in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false, an index spec has at least one key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (field, direction)) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{field}': {direction}")?;
        }
        f.write_str("}")
    }
}

impl Serialize for IndexSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.keys.len()))?;
        for (field, direction) in &self.keys {
            map.serialize_entry(field, direction)?;
        }
        map.end()
    }
}

struct IndexSpecVisitor;

impl<'de> Visitor<'de> for IndexSpecVisitor {
    type Value = IndexSpec;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of field names to 1 or -1")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut keys: Vec<(String, Direction)> = Vec::new();
        while let Some((field, direction)) = access.next_entry::<String, Direction>()? {
            keys.push((field, direction));
        }
        IndexSpec::new(keys).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for IndexSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(IndexSpecVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compound() -> IndexSpec {
        IndexSpec::new([
            ("appeared", Direction::Ascending),
            ("general.size", Direction::Descending),
        ])
        .unwrap()
    }

    #[test]
    fn test_to_pairs_preserves_order() {
        assert_eq!(
            compound().to_pairs(),
            vec![
                ("appeared".to_string(), 1),
                ("general.size".to_string(), -1)
            ]
        );
    }

    #[test]
    fn test_rejects_invalid_specs() {
        assert_eq!(
            IndexSpec::new(Vec::<(String, Direction)>::new()),
            Err(IndexSpecError::Empty)
        );
        assert_eq!(
            IndexSpec::new([("", Direction::Ascending)]),
            Err(IndexSpecError::EmptyField)
        );
        assert_eq!(
            IndexSpec::new([("a", Direction::Ascending), ("a", Direction::Descending)]),
            Err(IndexSpecError::DuplicateField("a".to_string()))
        );
    }

    #[test]
    fn test_display_matches_literal_form() {
        assert_eq!(compound().to_string(), "{'appeared': 1, 'general.size': -1}");
    }

    #[test]
    fn test_json_keeps_key_order() {
        let spec = IndexSpec::new([("z", Direction::Ascending), ("a", Direction::Descending)])
            .unwrap();
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(json, r#"{"z":1,"a":-1}"#);

        let parsed: IndexSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, spec);
    }

    #[test]
    fn test_json_rejects_bad_direction() {
        assert!(serde_json::from_str::<IndexSpec>(r#"{"a": 2}"#).is_err());
        assert!(serde_json::from_str::<IndexSpec>("{}").is_err());
    }
}
