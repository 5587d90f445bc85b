//! Property-based tests for session id disambiguation

use std::collections::HashSet;

use proptest::prelude::*;
use termdock_core::models::{Protocol, SessionDescriptor, SessionId};
use termdock_core::registry::{CONNECT_BAR_NAMESPACE, SessionRegistry, TREE_NAMESPACE};

// ========== Strategies ==========

/// Strategy for non-blank session labels
fn arb_label() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9 _.-]{0,12}"
}

/// Strategy for label lists drawn from a small pool so collisions are common
fn arb_colliding_labels() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(vec!["web", "db", "web-1", "cache"]), 1..30)
        .prop_map(|labels| labels.into_iter().map(String::from).collect())
}

fn arb_namespace() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![TREE_NAMESPACE, CONNECT_BAR_NAMESPACE])
}

fn descriptor(label: &str) -> SessionDescriptor {
    SessionDescriptor::new(label, "host.example.com", Protocol::Ssh)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn unique_labels_get_distinct_ids(labels in prop::collection::hash_set(arb_label(), 1..20)) {
        let mut registry = SessionRegistry::new();
        let mut ids = HashSet::new();
        for label in &labels {
            let id = registry.register(TREE_NAMESPACE, label, descriptor(label)).unwrap();
            prop_assert!(ids.insert(id));
        }
        prop_assert_eq!(registry.len(), labels.len());
    }

    #[test]
    fn colliding_labels_still_get_distinct_ids(
        entries in prop::collection::vec((arb_namespace(), arb_colliding_labels()), 1..4)
    ) {
        let mut registry = SessionRegistry::new();
        let mut ids = HashSet::new();
        let mut total = 0;
        for (namespace, labels) in &entries {
            for label in labels {
                let id = registry.register(namespace, label, descriptor(label)).unwrap();
                prop_assert!(id.as_str().starts_with(namespace));
                prop_assert!(ids.insert(id));
                total += 1;
            }
        }
        prop_assert_eq!(registry.len(), total);
    }

    #[test]
    fn registered_descriptor_carries_its_id(label in arb_label()) {
        let mut registry = SessionRegistry::new();
        let id = registry.register(TREE_NAMESPACE, &label, descriptor(&label)).unwrap();
        let resolved = registry.resolve(&id).unwrap();
        prop_assert_eq!(&resolved.id, &id);
        prop_assert_eq!(&resolved.name, &label);
    }

    #[test]
    fn removed_ids_are_never_reissued(label in arb_label(), rounds in 1usize..6) {
        let mut registry = SessionRegistry::new();
        let mut seen: HashSet<SessionId> = HashSet::new();
        for _ in 0..rounds {
            let id = registry.register(TREE_NAMESPACE, &label, descriptor(&label)).unwrap();
            prop_assert!(seen.insert(id.clone()));
            registry.remove(&id);
        }
        prop_assert!(registry.is_empty());
    }
}
