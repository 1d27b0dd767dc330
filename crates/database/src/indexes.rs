//! Index management on the workload collection.

use index_structs::{IndexSpec, Namespace};
use mongodb::bson::Document;
use mongodb::{Client, IndexModel};
use tracing::info;

use crate::{DatabaseError, Result, collection_for};

/// Builds the key document for an index spec, preserving key order.
#[must_use]
pub fn index_keys(spec: &IndexSpec) -> Document {
    let mut keys = Document::new();
    for (field, direction) in spec.keys() {
        keys.insert(field, direction.as_i32());
    }
    keys
}

/// Drops every index on the namespace's collection except `_id`.
///
/// # Errors
///
/// Returns an error if the command fails.
pub async fn drop_indexes(client: &Client, namespace: &Namespace) -> Result<()> {
    collection_for(client, namespace).drop_indexes(None).await?;

    info!(%namespace, "Dropped all indexes");

    Ok(())
}

/// Creates the given indexes in order and returns their server-side names.
///
/// Stops at the first failure.
///
/// # Errors
///
/// Returns [`DatabaseError::CreateIndex`] naming the index that failed.
pub async fn create_indexes(
    client: &Client,
    namespace: &Namespace,
    indexes: &[IndexSpec],
) -> Result<Vec<String>> {
    let collection = collection_for(client, namespace);
    let mut names = Vec::with_capacity(indexes.len());

    for index in indexes {
        info!(%namespace, %index, "Creating index");

        let model = IndexModel::builder().keys(index_keys(index)).build();
        let created = collection
            .create_index(model, None)
            .await
            .map_err(|source| DatabaseError::CreateIndex {
                index: index.to_string(),
                source,
            })?;

        names.push(created.index_name);
    }

    Ok(names)
}

/// Lists the index names on the namespace's collection.
///
/// # Errors
///
/// Returns an error if the command fails.
pub async fn list_indexes(client: &Client, namespace: &Namespace) -> Result<Vec<String>> {
    Ok(collection_for(client, namespace).list_index_names().await?)
}

#[cfg(test)]
mod tests {
    use index_structs::Direction;
    use mongodb::bson::doc;

    use super::*;

    #[test]
    fn test_index_keys_preserve_order() {
        let spec = IndexSpec::new([
            ("general.has_signature", Direction::Ascending),
            ("appeared", Direction::Descending),
        ])
        .unwrap();

        let keys = index_keys(&spec);
        assert_eq!(keys, doc! { "general.has_signature": 1, "appeared": -1 });
        assert_eq!(
            keys.keys().collect::<Vec<_>>(),
            ["general.has_signature", "appeared"]
        );
    }
}
