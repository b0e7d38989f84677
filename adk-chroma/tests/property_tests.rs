//! Property tests for id ordering, result alignment and filter folding.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use adk_chroma::{
    ChromaVectorStore, MetadataFilter, MetadataFilters, Node, QueryResponse, VectorStore,
    VectorStoreQuery,
};
use common::MockClient;
use proptest::prelude::*;
use serde_json::Value;

fn arb_node() -> impl Strategy<Value = Node> {
    ("[a-z0-9]{4,12}", "[a-z ]{0,30}", proptest::collection::vec(-1.0f32..1.0f32, 4)).prop_map(
        |(id, text, embedding)| Node::with_id(id, text).with_embedding(embedding),
    )
}

/// A single-query response with `n` aligned results.
fn arb_response() -> impl Strategy<Value = QueryResponse> {
    proptest::collection::vec(("[a-z]{3,8}", 0.0f32..2.0f32, "[a-z ]{0,20}"), 0..15).prop_map(
        |rows| {
            let ids: Vec<String> = rows.iter().map(|(id, _, _)| id.clone()).collect();
            QueryResponse {
                distances: Some(vec![rows.iter().map(|(_, d, _)| *d).collect()]),
                metadatas: Some(vec![vec![None; rows.len()]]),
                documents: Some(vec![rows.iter().map(|(_, _, doc)| Some(doc.clone())).collect()]),
                embeddings: Some(vec![vec![Some(vec![0.5, 0.5]); rows.len()]]),
                ids: vec![ids],
            }
        },
    )
}

mod prop_add_preserves_ids {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn add_returns_input_ids_in_order(nodes in proptest::collection::vec(arb_node(), 0..20)) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let client = MockClient::new();
            let ids = rt.block_on(async {
                let store = ChromaVectorStore::new(Arc::new(client.clone()), "docs");
                store.add(&nodes).await.unwrap()
            });

            let expected: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
            prop_assert_eq!(&ids, &expected);

            let adds = client.adds();
            if nodes.is_empty() {
                prop_assert!(adds.is_empty());
                prop_assert_eq!(client.creates(), 0);
            } else {
                prop_assert_eq!(adds.len(), 1);
                prop_assert_eq!(&adds[0].ids, &expected);
                prop_assert_eq!(adds[0].embeddings.len(), nodes.len());
                prop_assert_eq!(adds[0].metadatas.len(), nodes.len());
                prop_assert_eq!(adds[0].documents.len(), nodes.len());
            }
        }
    }
}

mod prop_query_alignment {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn results_are_aligned_and_scored_from_distance(response in arb_response()) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let client = MockClient::new();
            client.respond_with(response.clone());
            let result = rt.block_on(async {
                let store = ChromaVectorStore::new(Arc::new(client.clone()), "docs");
                store.query(&VectorStoreQuery::from_embedding(vec![0.5, 0.5]), None).await.unwrap()
            });

            let distances = &response.distances.as_ref().unwrap()[0];
            prop_assert_eq!(result.nodes.len(), result.similarities.len());
            prop_assert_eq!(result.nodes.len(), result.ids.len());
            prop_assert_eq!(&result.ids, &response.ids[0]);
            for (i, node) in result.nodes.iter().enumerate() {
                prop_assert_eq!(&node.id, &result.ids[i]);
                prop_assert!((result.similarities[i] - (1.0 - distances[i])).abs() < 1e-6);
            }
        }
    }
}

mod prop_filter_folding {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn last_constraint_per_key_wins(pairs in proptest::collection::vec(("[a-c]", 0i64..5), 0..10)) {
            let filters = MetadataFilters::new(
                pairs.iter().map(|(k, v)| MetadataFilter::new(k.clone(), *v)).collect(),
            );

            let mut model: HashMap<String, i64> = HashMap::new();
            for (k, v) in &pairs {
                model.insert(k.clone(), *v);
            }

            match filters.to_where() {
                None => prop_assert!(pairs.is_empty()),
                Some(map) => {
                    prop_assert_eq!(map.len(), model.len());
                    for (k, v) in &model {
                        prop_assert_eq!(map.get(k), Some(&Value::from(*v)));
                    }
                }
            }
        }
    }
}
