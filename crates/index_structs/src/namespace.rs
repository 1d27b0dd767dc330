use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors raised when building a [`Namespace`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamespaceError {
    #[error("database name must not be empty")]
    EmptyDatabase,
    #[error("collection name must not be empty")]
    EmptyCollection,
}

/// A database/collection pair, displayed as `db.collection`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    db: String,
    collection: String,
}

impl Namespace {
    /// Creates a namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if either name is empty.
    pub fn new(db: impl Into<String>, collection: impl Into<String>) -> Result<Self, NamespaceError> {
        let db = db.into();
        let collection = collection.into();

        if db.is_empty() {
            return Err(NamespaceError::EmptyDatabase);
        }
        if collection.is_empty() {
            return Err(NamespaceError::EmptyCollection);
        }

        Ok(Self { db, collection })
    }

    #[must_use]
    pub fn db(&self) -> &str {
        &self.db
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.db, self.collection)
    }
}
