//! LinkBench-style reads against the link table.

use async_trait::async_trait;
use database::collection_for;
use index_structs::Namespace;
use mongodb::Client;
use mongodb::bson::doc;

use crate::{QuerySpec, Workload, WorkloadName, run_queries};

/// LinkBench's default link type.
const DEFAULT_LINK_TYPE: i64 = 123_456_789;

/// Visible links only.
const VISIBILITY_DEFAULT: i32 = 1;

/// Upper bound on links returned by a single link-list read.
const LINK_LIST_LIMIT: i64 = 10_000;

/// Source node ids the workload reads from.
const SOURCE_IDS: [i64; 4] = [1, 1_000, 50_000, 1_000_000];

/// Workload for the LinkBench dataset.
#[derive(Debug, Clone)]
pub struct LinkbenchWorkload {
    namespace: Namespace,
}

impl LinkbenchWorkload {
    #[must_use]
    pub const fn new(namespace: Namespace) -> Self {
        Self { namespace }
    }

    /// The queries run by [`Workload::execute`]: a link-list read and a
    /// multiget per source id.
    #[must_use]
    pub fn queries() -> Vec<QuerySpec> {
        SOURCE_IDS
            .iter()
            .flat_map(|&id1| {
                [
                    QuerySpec::new(
                        format!("get_link_list_{id1}"),
                        doc! {
                            "id1": id1,
                            "link_type": DEFAULT_LINK_TYPE,
                            "visibility": VISIBILITY_DEFAULT
                        },
                    )
                    .with_sort(doc! { "time": -1 })
                    .with_limit(LINK_LIST_LIMIT),
                    QuerySpec::new(
                        format!("multiget_link_{id1}"),
                        doc! {
                            "id1": id1,
                            "link_type": DEFAULT_LINK_TYPE,
                            "id2": { "$in": [id1 + 1, id1 + 2, id1 + 3] }
                        },
                    ),
                ]
            })
            .collect()
    }
}

#[async_trait]
impl Workload for LinkbenchWorkload {
    fn name(&self) -> WorkloadName {
        WorkloadName::Linkbench
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
