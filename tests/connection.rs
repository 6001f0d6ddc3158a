//! Tests for the connection rules and the two-click connection protocol.
mod common;
use common::*;
use diagrammer::diagram::SelectionOutcome;
use diagrammer::prelude::*;

/// A document with two Source nodes and one Target node.
fn three_node_document() -> (ArchitectureDocument, String, String, String) {
    let config = EditorConfig {
        phase_policy: PhasePolicy::AutoMigrate,
        ..EditorConfig::default()
    };
    let mut editor = seeded_editor(config);
    let a = add_node(&mut editor, ComponentType::OnPremServer, Phase::Source, true);
    let b = add_node(&mut editor, ComponentType::OnPremDatabase, Phase::Source, true);
    let c = add_node(&mut editor, ComponentType::CloudCompute, Phase::Target, true);
    (editor.document().clone(), a, b, c)
}

fn rejection(result: std::result::Result<Connection, DiagramError>) -> Option<ConnectionRejection> {
    match result {
        Err(DiagramError::Rejected(kind)) => Some(kind),
        _ => None,
    }
}

#[cfg(test)]
mod rule_tests {
    use super::*;

    #[test]
    fn test_connect_same_phase() {
        let (mut doc, a, b, _) = three_node_document();
        let connection = doc.connect(&a, &b).expect("should connect");
        assert_eq!(connection.phase, Phase::Source);
        assert_eq!(doc.connections.len(), 1);
    }

    #[test]
    fn test_connect_outcome_ignores_argument_order() {
        let (doc, a, b, c) = three_node_document();

        let mut forward = doc.clone();
        let mut backward = doc.clone();
        assert!(forward.connect(&a, &b).is_ok());
        assert!(backward.connect(&b, &a).is_ok());

        let mut forward = doc.clone();
        let mut backward = doc;
        assert_eq!(
            rejection(forward.connect(&a, &c)),
            rejection(backward.connect(&c, &a))
        );
    }

    #[test]
    fn test_duplicate_rejected_in_either_direction() {
        let (mut doc, a, b, _) = three_node_document();
        doc.connect(&a, &b).expect("should connect");

        assert_eq!(
            rejection(doc.connect(&a, &b)),
            Some(ConnectionRejection::DuplicateRejected)
        );
        assert_eq!(
            rejection(doc.connect(&b, &a)),
            Some(ConnectionRejection::DuplicateRejected)
        );
        assert_eq!(doc.connections.len(), 1);
    }

    #[test]
    fn test_cross_phase_rejected() {
        let (mut doc, a, _, c) = three_node_document();
        assert_eq!(
            rejection(doc.connect(&a, &c)),
            Some(ConnectionRejection::CrossPhaseRejected)
        );
        assert!(doc.connections.is_empty());
    }

    #[test]
    fn test_self_loop_rejected() {
        let (mut doc, a, _, _) = three_node_document();
        assert_eq!(
            rejection(doc.connect(&a, &a)),
            Some(ConnectionRejection::SelfLoopRejected)
        );
    }

    #[test]
    fn test_unknown_node_is_an_internal_error() {
        let (mut doc, a, _, _) = three_node_document();
        assert_eq!(
            doc.connect(&a, "node-404"),
            Err(DiagramError::NodeNotFound("node-404".to_string()))
        );
    }

    #[test]
    fn test_connection_ids_are_unique() {
        let (mut doc, a, b, _) = three_node_document();
        let mut extra = doc.nodes[0].clone();
        extra.id = "node-extra".to_string();
        doc.nodes.push(extra);

        let first = doc.connect(&a, &b).expect("should connect");
        let second = doc.connect(&b, "node-extra").expect("should connect");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_connection_ids_skip_existing_after_stale_counter() {
        let mut editor = seeded_editor(EditorConfig::default());
        let a = add_node(&mut editor, ComponentType::OnPremServer, Phase::Source, true);
        let b = add_node(&mut editor, ComponentType::OnPremDatabase, Phase::Source, true);
        let c = add_node(&mut editor, ComponentType::LoadBalancer, Phase::Source, true);
        wire(&mut editor, &a, &b);

        let mut value = serde_json::to_value(editor.document()).expect("serializes");
        value
            .as_object_mut()
            .expect("document is an object")
            .remove("nextConnectionId");
        let received: ArchitectureDocument = serde_json::from_value(value).expect("decodes");
        assert_eq!(received.next_connection_id, 0);
        editor.replace_document(received);

        wire(&mut editor, &b, &c);
        let ids: Vec<&str> = editor
            .document()
            .connections
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }
}

#[cfg(test)]
mod protocol_tests {
    use super::*;

    #[test]
    fn test_two_clicks_connect() {
        let mut editor = seeded_editor(EditorConfig::default());
        let a = add_node(&mut editor, ComponentType::OnPremServer, Phase::Source, true);
        let b = add_node(&mut editor, ComponentType::OnPremDatabase, Phase::Source, true);

        assert_eq!(editor.click_node(&a), Ok(SelectionOutcome::Armed(a.clone())));
        assert_eq!(editor.armed(), Some(a.as_str()));

        let outcome = editor.click_node(&b).expect("should connect");
        assert!(matches!(outcome, SelectionOutcome::Connected(ref c) if c.joins(&a, &b)));
        assert_eq!(editor.armed(), None);
    }

    #[test]
    fn test_clicking_armed_node_disarms() {
        let mut editor = seeded_editor(EditorConfig::default());
        let a = add_node(&mut editor, ComponentType::OnPremServer, Phase::Source, true);

        editor.click_node(&a).expect("should arm");
        assert_eq!(editor.click_node(&a), Ok(SelectionOutcome::Disarmed));
        assert_eq!(editor.armed(), None);
        assert!(editor.document().connections.is_empty());
    }

    #[test]
    fn test_rejected_second_click_disarms_and_notifies() {
        let mut editor = seeded_editor(EditorConfig::default());
        let a = add_node(&mut editor, ComponentType::OnPremServer, Phase::Source, true);
        let b = add_node(&mut editor, ComponentType::OnPremDatabase, Phase::Source, true);
        wire(&mut editor, &a, &b);
        editor.take_notices();

        editor.click_node(&b).expect("should arm");
        let result = editor.click_node(&a);
        assert_eq!(
            result,
            Err(DiagramError::Rejected(ConnectionRejection::DuplicateRejected))
        );
        assert_eq!(editor.armed(), None);

        let notices = editor.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert_eq!(notices[0].message, "These components are already connected");
    }
}
