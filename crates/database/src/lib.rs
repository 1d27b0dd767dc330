//! MongoDB access for the benchmark: connection, query profiling and index management.

use index_structs::Namespace;
use mongodb::bson::Document;
use mongodb::{Client, Collection, Database};

mod indexes;
mod profiling;

pub use indexes::{create_indexes, drop_indexes, index_keys, list_indexes};
pub use profiling::{
    PROFILE_COLLECTION, disable_profiling, enable_profiling, enable_profiling_command,
    profile_filter, profile_to_json, read_profile,
};

/// Errors raised by database operations.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Collection '{collection}' does not exist in database '{db}'.")]
    CollectionNotFound { db: String, collection: String },

    #[error("Failed to create index {index}: {source}")]
    CreateIndex {
        index: String,
        #[source]
        source: mongodb::error::Error,
    },

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
}

pub type Result<T> = core::result::Result<T, DatabaseError>;

/// Creates a client for the MongoDB deployment at `uri`.
///
/// The driver connects lazily, so this only fails on an invalid URI or
/// failed SRV resolution.
///
/// # Errors
///
/// Returns an error if the URI cannot be parsed.
pub async fn connect(uri: &str) -> Result<Client> {
    Ok(Client::with_uri_str(uri).await?)
}

/// Returns the database for a namespace.
#[must_use]
pub fn database_for(client: &Client, namespace: &Namespace) -> Database {
    client.database(namespace.db())
}

/// Returns the collection for a namespace.
#[must_use]
pub fn collection_for(client: &Client, namespace: &Namespace) -> Collection<Document> {
    database_for(client, namespace).collection(namespace.collection())
}

/// Checks whether the namespace's collection exists.
///
/// # Errors
///
/// Returns an error if listing collections fails.
pub async fn collection_exists(client: &Client, namespace: &Namespace) -> Result<bool> {
    let names = database_for(client, namespace)
        .list_collection_names(None)
        .await?;

    Ok(names.iter().any(|name| name == namespace.collection()))
}
