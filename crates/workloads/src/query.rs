//! Named read queries and their execution.

use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::Document;
use mongodb::options::FindOptions;
use tracing::info;

/// A read query tagged with a comment so its profile entries can be traced back.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// Short name, sent to the server as the query comment (e.g. `Q1`).
    pub name: String,
    pub filter: Document,
    pub projection: Option<Document>,
    pub sort: Option<Document>,
    pub limit: Option<i64>,
}

impl QuerySpec {
    #[must_use]
    pub fn new(name: impl Into<String>, filter: Document) -> Self {
        Self {
            name: name.into(),
            filter,
            projection: None,
            sort: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn with_projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Driver options carrying projection, sort, limit and comment.
    #[must_use]
    pub fn find_options(&self) -> FindOptions {
        let mut options = FindOptions::default();
        options.projection.clone_from(&self.projection);
        options.sort.clone_from(&self.sort);
        options.limit = self.limit;
        options.comment = Some(self.name.clone());
        options
    }
}

/// Runs the queries in order, draining every cursor, and returns the result counts.
///
/// # Errors
///
/// Returns the first driver error.
pub async fn run_queries(
    collection: &Collection<Document>,
    queries: &[QuerySpec],
) -> mongodb::error::Result<Vec<u64>> {
    let mut counts = Vec::with_capacity(queries.len());

    for query in queries {
        let mut cursor = collection
            .find(query.filter.clone(), query.find_options())
            .await?;

        let mut returned = 0u64;
        while cursor.try_next().await?.is_some() {
            returned += 1;
        }

        info!(
            query = %query.name,
            filter = %query.filter,
            projection = ?query.projection,
            sort = ?query.sort,
            returned,
            "Query executed"
        );

        counts.push(returned);
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;

    use super::*;

    #[test]
    fn test_find_options() {
        let query = QuerySpec::new("Q1", doc! { "a": { "$gt": 1 } })
            .with_sort(doc! { "a": -1 })
            .with_limit(10);

        let options = query.find_options();
        assert_eq!(options.sort, Some(doc! { "a": -1 }));
        assert_eq!(options.limit, Some(10));
        assert_eq!(options.projection, None);
        assert_eq!(options.comment.as_deref(), Some("Q1"));
    }
}
