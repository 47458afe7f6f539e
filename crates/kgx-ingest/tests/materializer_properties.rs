// Property tests for grouping and materialization

use kgx_common::EdgeProperties;
use kgx_ingest::config::LoaderConfig;
use kgx_ingest::group_key::{GroupKey, GroupKeyAssigner};
use kgx_ingest::materializer::{sanitize_name, GraphMaterializer};
use kgx_ingest::model::{EdgeFields, EntityFields, FlatRecord};
use proptest::prelude::*;

fn curie() -> impl Strategy<Value = String> {
    proptest::string::string_regex("(HGNC|MONDO|CHEBI):[0-9]{1,6}").unwrap()
}

fn pair(key: &str, subject_id: &str, object_id: &str) -> Vec<FlatRecord> {
    let key = GroupKey::from_raw(key);
    vec![
        FlatRecord::subject(key.clone(), EntityFields::new(subject_id, Some("subject".to_string()))),
        FlatRecord::object(
            key,
            2,
            EntityFields::new(object_id, Some("object".to_string())),
            EdgeFields {
                predicate: None,
                relation: "GAMMA:interacts_with".to_string(),
                edge_label: None,
                properties: EdgeProperties::default(),
                provenance: None,
            },
        ),
    ]
}

proptest! {
    #[test]
    fn sanitized_names_keep_length_and_are_ascii(name in any::<String>()) {
        let clean = sanitize_name(&name);
        prop_assert_eq!(clean.chars().count(), name.chars().count());
        prop_assert!(clean.chars().all(|c| (c as u32) < 128));
    }

    #[test]
    fn ascii_names_are_unchanged(name in "[ -~]{0,40}") {
        prop_assert_eq!(sanitize_name(&name), name);
    }

    #[test]
    fn group_keys_depend_only_on_fields(s in curie(), o in curie(), r in "[a-z_]{1,12}") {
        let mut first = GroupKeyAssigner::new("dataset");
        let mut second = GroupKeyAssigner::new("dataset");
        prop_assert_eq!(first.assign(&s, &r, &o), second.assign(&s, &r, &o));
    }

    #[test]
    fn every_pair_yields_two_nodes_and_one_edge(
        ids in proptest::collection::vec((curie(), curie()), 1..20)
    ) {
        let materializer = GraphMaterializer::new(&LoaderConfig::default()).unwrap();
        let records: Vec<FlatRecord> = ids
            .iter()
            .enumerate()
            .flat_map(|(i, (s, o))| pair(&format!("g{}", i), s, o))
            .collect();

        let graph = materializer.materialize(records);
        prop_assert_eq!(graph.edges.len(), ids.len());
        prop_assert_eq!(graph.nodes.len(), ids.len() * 2);
        for edge in &graph.edges {
            prop_assert!(graph.nodes.iter().any(|n| n.id == edge.subject_id));
            prop_assert!(graph.nodes.iter().any(|n| n.id == edge.object_id));
        }
    }

    #[test]
    fn oversized_groups_emit_nothing(extra in 1usize..5) {
        let materializer = GraphMaterializer::new(&LoaderConfig::default()).unwrap();
        let mut records = pair("g", "HGNC:1", "MONDO:1");
        for i in 0..extra {
            records.extend(pair("g", "HGNC:1", &format!("MONDO:{}", i + 2)).into_iter().skip(1));
        }

        let graph = materializer.materialize(records);
        prop_assert!(graph.edges.is_empty());
        prop_assert_eq!(graph.stats.groups_skipped_cardinality, 1);
    }

    #[test]
    fn parallel_and_sequential_agree(
        ids in proptest::collection::vec((curie(), curie()), 0..30)
    ) {
        let records: Vec<FlatRecord> = ids
            .iter()
            .enumerate()
            .flat_map(|(i, (s, o))| pair(&format!("g{}", i % 7), s, o))
            .collect();

        let sequential = GraphMaterializer::new(&LoaderConfig::default()).unwrap();
        let parallel = GraphMaterializer::new(&LoaderConfig::default().with_parallel(true)).unwrap();

        prop_assert_eq!(sequential.materialize(records.clone()), parallel.materialize(records));
    }
}
