//! Server-side query profiling for a single namespace.

use futures::TryStreamExt;
use index_structs::Namespace;
use mongodb::Client;
use mongodb::bson::{Bson, Document, doc};
use tracing::{debug, info};

use crate::{DatabaseError, Result, collection_exists, database_for};

/// Collection the server writes profile entries to.
pub const PROFILE_COLLECTION: &str = "system.profile";

/// Builds the `profile` command that captures queries slower than `slowms` on `namespace`.
#[must_use]
pub fn enable_profiling_command(namespace: &Namespace, slowms: u32) -> Document {
    doc! {
        "profile": 1,
        "slowms": i64::from(slowms),
        "filter": profile_filter(namespace)
    }
}

/// Filter matching the query entries of `namespace` in `system.profile`.
#[must_use]
pub fn profile_filter(namespace: &Namespace) -> Document {
    doc! {
        "ns": namespace.to_string(),
        "op": "query"
    }
}

/// Resets profiling and starts capturing queries on `namespace`.
///
/// Profiling is switched off first, the namespace's collection must exist,
/// and any previous `system.profile` contents are dropped so the capture only
/// holds this run.
///
/// # Errors
///
/// Returns [`DatabaseError::CollectionNotFound`] if the collection is missing,
/// or the driver error if a command fails.
pub async fn enable_profiling(client: &Client, namespace: &Namespace, slowms: u32) -> Result<()> {
    let db = database_for(client, namespace);

    db.run_command(doc! { "profile": 0 }, None).await?;

    if !collection_exists(client, namespace).await? {
        return Err(DatabaseError::CollectionNotFound {
            db: namespace.db().to_string(),
            collection: namespace.collection().to_string(),
        });
    }

    let names = db.list_collection_names(None).await?;
    if names.iter().any(|name| name == PROFILE_COLLECTION) {
        debug!(%namespace, "Dropping previous profile data");
        db.collection::<Document>(PROFILE_COLLECTION)
            .drop(None)
            .await?;
    }

    db.run_command(enable_profiling_command(namespace, slowms), None)
        .await?;

    info!(%namespace, slowms, "MongoDB profiling enabled");

    Ok(())
}

/// Stops profiling on `namespace` and returns the number of captured query entries.
///
/// # Errors
///
/// Returns an error if a command fails.
pub async fn disable_profiling(client: &Client, namespace: &Namespace) -> Result<u64> {
    let db = database_for(client, namespace);

    db.run_command(
        doc! { "profile": 0, "filter": { "ns": namespace.to_string() } },
        None,
    )
    .await?;

    let profile_count = db
        .collection::<Document>(PROFILE_COLLECTION)
        .count_documents(profile_filter(namespace), None)
        .await?;

    info!(%namespace, profile_count, "Profiling disabled");

    Ok(profile_count)
}

/// Reads all captured query entries for `namespace`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn read_profile(client: &Client, namespace: &Namespace) -> Result<Vec<Document>> {
    let cursor = database_for(client, namespace)
        .collection::<Document>(PROFILE_COLLECTION)
        .find(profile_filter(namespace), None)
        .await?;

    Ok(cursor.try_collect().await?)
}

/// Converts profile entries to relaxed extended JSON for storage.
#[must_use]
pub fn profile_to_json(entries: Vec<Document>) -> serde_json::Value {
    serde_json::Value::Array(
        entries
            .into_iter()
            .map(|entry| Bson::Document(entry).into_relaxed_extjson())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use mongodb::bson::DateTime;

    use super::*;

    fn namespace() -> Namespace {
        Namespace::new("ember2018", "ember_test").unwrap()
    }

    #[test]
    fn test_enable_profiling_command() {
        assert_eq!(
            enable_profiling_command(&namespace(), 100),
            doc! {
                "profile": 1,
                "slowms": 100_i64,
                "filter": { "ns": "ember2018.ember_test", "op": "query" }
            }
        );
    }

    #[test]
    fn test_profile_to_json_is_plain_json() {
        let entry = doc! {
            "op": "query",
            "ns": "ember2018.ember_test",
            "millis": 12,
            "ts": DateTime::from_millis(0),
            "command": { "find": "ember_test", "comment": "Q1" }
        };

        let json = profile_to_json(vec![entry]);
        assert_eq!(json[0]["millis"], serde_json::json!(12));
        assert_eq!(json[0]["command"]["comment"], serde_json::json!("Q1"));
        assert!(json[0]["ts"].get("$date").is_some());
    }
}
