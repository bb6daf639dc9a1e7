//! Graph Mutation Invariant Tests
//!
//! Integration tests exercising the mutation surface of `GraphService` and
//! verifying the structural guarantees it maintains:
//!
//! - Parent/child link symmetry: `node.parent_id == Some(p)` iff `p.children`
//!   contains the node, after any sequence of operations
//! - Edge/relation bijection: exactly one relation edge per parent/child pair
//! - Delete removes exactly the target node and its incident edges, promoting
//!   orphaned children to the grandparent
//! - Reparenting onto a descendant is rejected atomically

mod graph_invariant_tests {
    use cardflow_core::models::level_color;
    use cardflow_core::services::{CreateNodeParams, GraphError, GraphService};
    use cardflow_core::NodePatch;

    /// Create a node with just level, title, and order set.
    fn create(service: &mut GraphService, level: u8, title: &str, order: f64) -> String {
        service
            .create_node(CreateNodeParams {
                level,
                title: title.to_string(),
                order,
                ..Default::default()
            })
            .unwrap()
    }

    /// Assert link symmetry for every node in the store.
    fn assert_links_consistent(service: &GraphService) {
        for node in service.store().list() {
            if let Some(parent_id) = &node.parent_id {
                let parent = service
                    .store()
                    .get(parent_id)
                    .unwrap_or_else(|| panic!("dangling parent_id on {}", node.id));
                assert!(
                    parent.children.contains(&node.id),
                    "node {} claims parent {} but is not in its children list",
                    node.id,
                    parent_id
                );
            }
            for child_id in &node.children {
                let child = service
                    .store()
                    .get(child_id)
                    .unwrap_or_else(|| panic!("dangling child id {} on {}", child_id, node.id));
                assert_eq!(
                    child.parent_id.as_deref(),
                    Some(node.id.as_str()),
                    "node {} lists child {} that does not point back",
                    node.id,
                    child_id
                );
            }
        }
    }

    #[test]
    fn test_set_parent_creates_link_and_single_edge() {
        let mut service = GraphService::new();
        let a = create(&mut service, 1, "Topic A", 0.0);
        let b = create(&mut service, 2, "Topic B", 0.0);

        service.set_parent(&b, Some(&a)).unwrap();

        let parent = service.store().get(&a).unwrap();
        let child = service.store().get(&b).unwrap();
        assert_eq!(parent.children, vec![b.clone()]);
        assert_eq!(child.parent_id.as_deref(), Some(a.as_str()));

        assert_eq!(service.edges().len(), 1);
        let edge = service.edges().edge_between(&a, &b).unwrap();
        assert_eq!(edge.color, level_color(2));
        assert_links_consistent(&service);
    }

    #[test]
    fn test_set_parent_same_parent_is_noop() {
        let mut service = GraphService::new();
        let a = create(&mut service, 1, "Topic A", 0.0);
        let b = create(&mut service, 2, "Topic B", 0.0);
        service.set_parent(&b, Some(&a)).unwrap();

        let before = service.store().get(&a).unwrap().modified_at;
        service.set_parent(&b, Some(&a)).unwrap();

        assert_eq!(service.store().get(&a).unwrap().modified_at, before);
        assert_eq!(service.edges().len(), 1);
        assert_links_consistent(&service);
    }

    #[test]
    fn test_reparenting_moves_edge_between_parents() {
        let mut service = GraphService::new();
        let a = create(&mut service, 1, "Topic A", 0.0);
        let b = create(&mut service, 1, "Topic B", 1.0);
        let c = create(&mut service, 2, "Topic C", 0.0);

        service.set_parent(&c, Some(&a)).unwrap();
        service.set_parent(&c, Some(&b)).unwrap();

        assert!(service.store().get(&a).unwrap().children.is_empty());
        assert_eq!(service.store().get(&b).unwrap().children, vec![c.clone()]);
        assert!(service.edges().edge_between(&a, &c).is_none());
        assert!(service.edges().edge_between(&b, &c).is_some());
        assert_eq!(service.edges().len(), 1);
        assert_links_consistent(&service);
    }

    #[test]
    fn test_cycle_rejected_and_tree_untouched() {
        let mut service = GraphService::new();
        let p = create(&mut service, 1, "Parent", 0.0);
        let c = create(&mut service, 2, "Child", 0.0);
        let g = create(&mut service, 3, "Grandchild", 0.0);
        service.set_parent(&c, Some(&p)).unwrap();
        service.set_parent(&g, Some(&c)).unwrap();

        // Direct cycle and transitive cycle must both fail.
        let err = service.set_parent(&p, Some(&c)).unwrap_err();
        assert!(matches!(err, GraphError::Cycle { .. }));
        let err = service.set_parent(&p, Some(&g)).unwrap_err();
        assert!(matches!(err, GraphError::Cycle { .. }));

        // Self-parenting is a cycle of length one.
        let err = service.set_parent(&p, Some(&p)).unwrap_err();
        assert!(matches!(err, GraphError::Cycle { .. }));

        // Nothing moved.
        assert_eq!(service.store().get(&c).unwrap().parent_id.as_deref(), Some(p.as_str()));
        assert_eq!(service.store().get(&g).unwrap().parent_id.as_deref(), Some(c.as_str()));
        assert!(service.store().get(&p).unwrap().parent_id.is_none());
        assert_eq!(service.edges().len(), 2);
        assert_links_consistent(&service);
    }

    #[test]
    fn test_set_parent_unknown_ids() {
        let mut service = GraphService::new();
        let a = create(&mut service, 1, "Topic A", 0.0);

        assert!(matches!(
            service.set_parent("missing", Some(&a)),
            Err(GraphError::NodeNotFound { .. })
        ));
        assert!(matches!(
            service.set_parent(&a, Some("missing")),
            Err(GraphError::NodeNotFound { .. })
        ));
    }

    #[test]
    fn test_delete_leaf_removes_node_and_edge_only() {
        let mut service = GraphService::new();
        let a = create(&mut service, 1, "Topic A", 0.0);
        let b = create(&mut service, 2, "Topic B", 0.0);
        let c = create(&mut service, 2, "Topic C", 1.0);
        service.set_parent(&b, Some(&a)).unwrap();
        service.set_parent(&c, Some(&a)).unwrap();

        service.delete_node(&b).unwrap();

        assert!(!service.store().contains(&b));
        assert!(service.store().contains(&a));
        assert!(service.store().contains(&c));
        assert_eq!(service.store().get(&a).unwrap().children, vec![c.clone()]);
        assert!(service.edges().edge_between(&a, &b).is_none());
        assert!(service.edges().edge_between(&a, &c).is_some());
        assert_links_consistent(&service);
    }

    #[test]
    fn test_delete_inner_node_promotes_children_to_grandparent() {
        let mut service = GraphService::new();
        let root = create(&mut service, 1, "Root", 0.0);
        let mid = create(&mut service, 2, "Middle", 0.0);
        let x = create(&mut service, 3, "X", 0.0);
        let y = create(&mut service, 3, "Y", 1.0);
        service.set_parent(&mid, Some(&root)).unwrap();
        service.set_parent(&x, Some(&mid)).unwrap();
        service.set_parent(&y, Some(&mid)).unwrap();

        service.delete_node(&mid).unwrap();

        assert!(!service.store().contains(&mid));
        let root_node = service.store().get(&root).unwrap();
        assert_eq!(root_node.children, vec![x.clone(), y.clone()]);
        assert_eq!(service.store().get(&x).unwrap().parent_id.as_deref(), Some(root.as_str()));
        assert_eq!(service.store().get(&y).unwrap().parent_id.as_deref(), Some(root.as_str()));
        // One relation edge per surviving link, none touching the deleted id.
        assert_eq!(service.edges().len(), 2);
        assert!(service.edges().edge_between(&root, &x).is_some());
        assert!(service.edges().edge_between(&root, &y).is_some());
        assert_links_consistent(&service);
    }

    #[test]
    fn test_delete_root_promotes_children_to_roots() {
        let mut service = GraphService::new();
        let root = create(&mut service, 1, "Root", 0.0);
        let a = create(&mut service, 2, "A", 0.0);
        let b = create(&mut service, 2, "B", 1.0);
        service.set_parent(&a, Some(&root)).unwrap();
        service.set_parent(&b, Some(&root)).unwrap();

        service.delete_node(&root).unwrap();

        assert!(service.store().get(&a).unwrap().parent_id.is_none());
        assert!(service.store().get(&b).unwrap().parent_id.is_none());
        assert_eq!(service.edges().len(), 0);
        assert_links_consistent(&service);
    }

    #[test]
    fn test_delete_unknown_node() {
        let mut service = GraphService::new();
        assert!(matches!(
            service.delete_node("missing"),
            Err(GraphError::NodeNotFound { .. })
        ));
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let mut service = GraphService::new();
        let err = service
            .create_node(CreateNodeParams {
                level: 1,
                title: "   ".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, GraphError::ValidationFailed(_)));
        assert!(service.store().is_empty());
    }

    #[test]
    fn test_update_level_recolors_relation_edge() {
        let mut service = GraphService::new();
        let a = create(&mut service, 1, "Topic A", 0.0);
        let b = create(&mut service, 2, "Topic B", 0.0);
        service.set_parent(&b, Some(&a)).unwrap();

        service
            .update_node(
                &b,
                NodePatch {
                    level: Some(3),
                    ..Default::default()
                },
            )
            .unwrap();

        let edge = service.edges().edge_between(&a, &b).unwrap();
        assert_eq!(edge.color, level_color(3));
    }

    #[test]
    fn test_remove_child_requires_existing_link() {
        let mut service = GraphService::new();
        let a = create(&mut service, 1, "Topic A", 0.0);
        let b = create(&mut service, 2, "Topic B", 0.0);

        assert!(matches!(
            service.remove_child(&a, &b),
            Err(GraphError::EdgeNotFound { .. })
        ));

        service.add_child(&a, &b).unwrap();
        service.remove_child(&a, &b).unwrap();
        assert!(service.store().get(&b).unwrap().parent_id.is_none());
        assert_eq!(service.edges().len(), 0);
        assert_links_consistent(&service);
    }

    #[test]
    fn test_plain_connection_does_not_touch_relations() {
        let mut service = GraphService::new();
        let a = create(&mut service, 1, "Topic A", 0.0);
        let b = create(&mut service, 1, "Topic B", 1.0);

        service.connect(&a, &b, None, None).unwrap();

        assert!(service.store().get(&b).unwrap().parent_id.is_none());
        assert!(service.store().get(&a).unwrap().children.is_empty());
        assert_eq!(service.edges().len(), 1);

        service.disconnect(&a, &b).unwrap();
        assert_eq!(service.edges().len(), 0);
    }

    #[test]
    fn test_disconnect_relation_detaches_child() {
        let mut service = GraphService::new();
        let a = create(&mut service, 1, "Topic A", 0.0);
        let b = create(&mut service, 2, "Topic B", 0.0);
        service.set_parent(&b, Some(&a)).unwrap();

        service.disconnect(&a, &b).unwrap();

        assert!(service.store().get(&b).unwrap().parent_id.is_none());
        assert!(service.store().get(&a).unwrap().children.is_empty());
        assert_eq!(service.edges().len(), 0);
        assert_links_consistent(&service);
    }

    #[test]
    fn test_mixed_operation_sequence_keeps_links_consistent() {
        let mut service = GraphService::new();
        let r1 = create(&mut service, 1, "Root 1", 0.0);
        let r2 = create(&mut service, 1, "Root 2", 1.0);
        let mut children = Vec::new();
        for i in 0..4 {
            let id = create(&mut service, 2, &format!("Child {}", i), i as f64);
            service.set_parent(&id, Some(&r1)).unwrap();
            children.push(id);
        }
        assert_links_consistent(&service);

        service.set_parent(&children[0], Some(&r2)).unwrap();
        service.delete_node(&children[1]).unwrap();
        service.set_parent(&children[2], None).unwrap();
        assert_links_consistent(&service);

        let grand = create(&mut service, 3, "Grandchild", 0.0);
        service.set_parent(&grand, Some(&children[3])).unwrap();
        service.delete_node(&children[3]).unwrap();
        // Promoted to r1.
        assert_eq!(
            service.store().get(&grand).unwrap().parent_id.as_deref(),
            Some(r1.as_str())
        );
        assert_links_consistent(&service);
    }
}
