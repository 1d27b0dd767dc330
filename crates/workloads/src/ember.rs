//! Workload over the EMBER 2018 training split.

use async_trait::async_trait;
use database::collection_for;
use index_structs::Namespace;
use mongodb::Client;
use mongodb::bson::doc;

use crate::{QuerySpec, Workload, WorkloadName, run_queries};

/// Workload for the EMBER dataset.
#[derive(Debug, Clone)]
pub struct EmberWorkload {
    namespace: Namespace,
}

impl EmberWorkload {
    #[must_use]
    pub const fn new(namespace: Namespace) -> Self {
        Self { namespace }
    }

    /// The queries run by [`Workload::execute`].
    #[must_use]
    pub fn queries() -> Vec<QuerySpec> {
        vec![
            QuerySpec::new(
                "E1",
                doc! {
                    "header.optional.subsystem": "WINDOWS_GUI",
                    "section.sections.entropy": { "$gt": 6.0 }
                },
            )
            .with_sort(doc! { "appeared": -1 })
            .with_limit(1000),
            QuerySpec::new("E2", doc! { "label": 1, "general.has_signature": 0 })
                .with_projection(doc! { "sha256": 1, "appeared": 1, "general.size": 1 }),
            QuerySpec::new(
                "E3",
                doc! {
                    "appeared": { "$gte": "2018-01", "$lt": "2018-07" },
                    "label": 0
                },
            )
            .with_sort(doc! { "general.size": -1 })
            .with_limit(100),
        ]
    }
}

#[async_trait]
impl Workload for EmberWorkload {
    fn name(&self) -> WorkloadName {
        WorkloadName::Ember
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
