//! Property-based tests for layout persist tokens and layout files

use std::collections::HashSet;
use std::path::Path;

use proptest::prelude::*;
use termdock_core::layout::{RestoreStep, XmlLayoutStore, resolve_layout};
use termdock_core::models::{
    DockArea, DockPlacement, LayoutDescriptor, PanelKind, PanelPlacement, Protocol,
    SessionDescriptor, SessionId,
};
use termdock_core::registry::{SessionRegistry, TREE_NAMESPACE};

// ========== Strategies ==========

fn arb_session_id() -> impl Strategy<Value = SessionId> {
    "[a-z][a-z0-9_-]{0,10}".prop_map(|label| SessionId::combine(TREE_NAMESPACE, &label))
}

fn arb_panel_kind() -> impl Strategy<Value = PanelKind> {
    prop_oneof![
        Just(PanelKind::SessionTree),
        Just(PanelKind::LayoutList),
        Just(PanelKind::LogViewer),
        arb_session_id().prop_map(|session_id| PanelKind::Terminal { session_id }),
    ]
}

fn arb_area() -> impl Strategy<Value = DockArea> {
    prop::sample::select(vec![
        DockArea::Document,
        DockArea::Left,
        DockArea::Right,
        DockArea::Top,
        DockArea::Bottom,
    ])
}

fn arb_placement() -> impl Strategy<Value = DockPlacement> {
    (arb_area(), prop::option::of(0.1f64..0.9)).prop_map(|(area, ratio)| match ratio {
        Some(ratio) => DockPlacement::below(area, ratio),
        None => DockPlacement::edge(area),
    })
}

fn arb_layout() -> impl Strategy<Value = LayoutDescriptor> {
    prop::collection::vec((arb_panel_kind(), arb_placement()), 0..12).prop_map(|panels| {
        let mut layout = LayoutDescriptor::for_path(Path::new("/tmp/layouts/prop.xml"));
        layout.panels = panels
            .iter()
            .map(|(kind, placement)| PanelPlacement::new(kind, *placement))
            .collect();
        layout
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn persist_token_resolves_to_same_kind(kind in arb_panel_kind()) {
        let token = kind.persist_token();
        prop_assert_eq!(PanelKind::from_persist_token(&token), Some(kind));
    }

    #[test]
    fn foreign_tokens_do_not_resolve(token in "[A-Za-z]{1,12}\\.[A-Za-z]{1,12}") {
        prop_assume!(!token.starts_with("termdock."));
        prop_assert_eq!(PanelKind::from_persist_token(&token), None);
    }

    #[test]
    fn layout_file_keeps_panels_in_order(layout in arb_layout()) {
        let xml = XmlLayoutStore::to_xml(&layout).unwrap();
        let loaded = XmlLayoutStore::from_xml(&xml, &layout.path).unwrap();
        prop_assert_eq!(loaded.name, "prop");
        prop_assert_eq!(loaded.panels, layout.panels);
    }

    #[test]
    fn resolver_warns_once_per_missing_session(
        layout in arb_layout(),
        registered in prop::collection::hash_set(arb_session_id(), 0..6),
    ) {
        let mut registry = SessionRegistry::new();
        for id in &registered {
            let label = id.as_str().trim_start_matches(&format!("{TREE_NAMESPACE}/")).to_string();
            registry
                .register(TREE_NAMESPACE, &label, SessionDescriptor::new(&label, "h", Protocol::Ssh))
                .unwrap();
        }

        let (steps, warnings) = resolve_layout(&layout, &registry);

        let kinds: Vec<PanelKind> = layout.panels.iter().filter_map(PanelPlacement::kind).collect();
        let distinct: HashSet<&PanelKind> = kinds.iter().collect();
        let missing = distinct
            .iter()
            .filter(|k| k.session_id().is_some_and(|id| !registry.contains(id)))
            .count();
        prop_assert_eq!(warnings.len(), missing);
        prop_assert_eq!(steps.len() + missing, distinct.len());

        for step in &steps {
            if let RestoreStep::Terminal { descriptor, .. } = step {
                prop_assert!(registry.contains(&descriptor.id));
            }
        }
    }
}
