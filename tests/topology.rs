//! Tests for per-canvas topology validation and source confirmation.
mod common;
use common::*;
use diagrammer::prelude::*;
use diagrammer::validation::validate;

fn empty_report() -> TopologyReport {
    let nodes: Vec<Node> = Vec::new();
    let connections: Vec<Connection> = Vec::new();
    validate(&nodes, &connections)
}

#[cfg(test)]
mod validate_tests {
    use super::*;

    #[test]
    fn test_empty_canvas_is_complete() {
        let report = empty_report();
        assert_eq!(report, TopologyReport {
            warnings: 0,
            errors: 0,
            isolated_node_ids: vec![],
            is_complete: true,
        });
    }

    #[test]
    fn test_single_node_is_never_isolated() {
        let mut editor = seeded_editor(EditorConfig::default());
        add_node(&mut editor, ComponentType::OnPremServer, Phase::Source, true);

        let report = editor.validate(Phase::Source);
        assert_eq!(report.errors, 0);
        assert!(report.isolated_node_ids.is_empty());
        assert!(report.is_complete);
    }

    #[test]
    fn test_two_unconnected_nodes_count_as_one_error() {
        let mut editor = seeded_editor(EditorConfig::default());
        let a = add_node(&mut editor, ComponentType::OnPremServer, Phase::Source, true);
        let b = add_node(&mut editor, ComponentType::OnPremDatabase, Phase::Source, true);

        let report = editor.validate(Phase::Source);
        assert_eq!(report.errors, 1);
        assert_eq!(report.warnings, 0);
        assert_eq!(report.isolated_node_ids, vec![a, b]);
        assert!(!report.is_complete);
    }

    #[test]
    fn test_incomplete_checklists_count_as_one_warning() {
        let mut editor = seeded_editor(EditorConfig::default());
        let a = add_node(&mut editor, ComponentType::OnPremServer, Phase::Source, false);
        let b = add_node(&mut editor, ComponentType::OnPremDatabase, Phase::Source, false);
        wire(&mut editor, &a, &b);

        let report = editor.validate(Phase::Source);
        assert_eq!(report.warnings, 1);
        assert_eq!(report.errors, 0);
        assert!(!report.is_complete);
    }

    #[test]
    fn test_canvases_are_validated_independently() {
        let config = EditorConfig {
            phase_policy: PhasePolicy::AutoMigrate,
            ..EditorConfig::default()
        };
        let mut editor = seeded_editor(config);
        add_node(&mut editor, ComponentType::OnPremServer, Phase::Source, true);
        add_node(&mut editor, ComponentType::OnPremDatabase, Phase::Source, true);
        add_node(&mut editor, ComponentType::CloudCompute, Phase::Target, true);

        assert_eq!(editor.validate(Phase::Source).errors, 1);
        let target = editor.validate(Phase::Target);
        assert_eq!(target.errors, 0);
        assert!(target.is_complete);
    }

    #[test]
    fn test_report_serializes_in_camel_case() {
        let report = empty_report();
        let value = serde_json::to_value(&report).expect("serializes");
        assert!(value.get("isolatedNodeIds").is_some());
        assert!(value.get("isComplete").is_some());
    }
}

#[cfg(test)]
mod confirm_tests {
    use super::*;

    #[test]
    fn test_confirm_rejects_incomplete_source() {
        let mut editor = seeded_editor(EditorConfig::default());
        add_node(&mut editor, ComponentType::OnPremServer, Phase::Source, false);

        let result = editor.confirm_source();
        assert_eq!(
            result,
            Err(DiagramError::SourceIncomplete {
                warnings: 1,
                errors: 0
            })
        );
        assert!(!editor.document().source_confirmed);
        assert_eq!(editor.take_notices().len(), 1);
    }

    #[test]
    fn test_confirm_unlocks_target_canvas() {
        let mut editor = seeded_editor(EditorConfig::default());
        add_node(&mut editor, ComponentType::OnPremServer, Phase::Source, true);

        let report = editor.confirm_source().expect("source should confirm");
        assert!(report.is_complete);
        assert!(editor.document().source_confirmed);
        assert!(editor
            .drop_new(ComponentType::CloudCompute, Phase::Target, &canvas(), point(10.0, 10.0))
            .is_ok());
    }
}
