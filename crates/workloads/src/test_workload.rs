//! Small workload with two example queries over the EMBER test split.

use async_trait::async_trait;
use database::collection_for;
use index_structs::Namespace;
use mongodb::Client;
use mongodb::bson::doc;

use crate::{QuerySpec, Workload, WorkloadName, run_queries};

/// Test workload with example queries.
#[derive(Debug, Clone)]
pub struct TestWorkload {
    namespace: Namespace,
}

impl TestWorkload {
    #[must_use]
    pub const fn new(namespace: Namespace) -> Self {
        Self { namespace }
    }

    /// The queries run by [`Workload::execute`].
    #[must_use]
    pub fn queries() -> Vec<QuerySpec> {
        vec![
            // High-entropy sections, most entropic first
            QuerySpec::new("Q1", doc! { "section.sections.entropy": { "$gt": 7.99 } })
                .with_sort(doc! { "section.sections.entropy": -1 }),
            // Large signed samples that appeared from October 2018 on
            QuerySpec::new(
                "Q2",
                doc! {
                    "appeared": { "$gte": "2018-10" },
                    "general.size": { "$gt": 2_000_000 },
                    "general.has_signature": 1
                },
            )
            .with_projection(doc! {
                "appeared": 1,
                "general.size": 1,
                "general.has_signature": 1,
                "header.coff.timestamp": 1
            }),
        ]
    }
}

#[async_trait]
impl Workload for TestWorkload {
    fn name(&self) -> WorkloadName {
        WorkloadName::Test
    }

    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    async fn execute(&self, client: &Client) -> anyhow::Result<()> {
        let collection = collection_for(client, &self.namespace);
        run_queries(&collection, &Self::queries()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queries_are_tagged() {
        let queries = TestWorkload::queries();
        let names: Vec<_> = queries.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, ["Q1", "Q2"]);
        assert!(queries[0].projection.is_none());
        assert_eq!(
            queries[1].filter.get_document("general.size").unwrap(),
            &doc! { "$gt": 2_000_000 }
        );
    }
}
