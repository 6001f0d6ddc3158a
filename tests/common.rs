//! Common test utilities for building diagrams, editors and detail sets.
use diagrammer::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;

/// An 800x600 canvas anchored at the page origin.
#[allow(dead_code)]
pub fn canvas() -> CanvasRect {
    CanvasRect {
        left: 0.0,
        top: 0.0,
        width: 800.0,
        height: 600.0,
    }
}

#[allow(dead_code)]
pub fn point(x: f64, y: f64) -> DropPoint {
    DropPoint { x, y }
}

/// A detail set that satisfies every required attribute of `component_type`.
#[allow(dead_code)]
pub fn complete_details(component_type: ComponentType) -> Details {
    component_type
        .required_attributes()
        .iter()
        .map(|attr| {
            let value = match attr.kind {
                AttributeKind::Text => json!("example"),
                AttributeKind::Number => json!(8),
                AttributeKind::Boolean => json!(false),
            };
            (attr.name.to_string(), value)
        })
        .collect()
}

/// Builds a detail set from literal pairs.
#[allow(dead_code)]
pub fn details(pairs: &[(&str, serde_json::Value)]) -> Details {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A config whose cutover draw never fails (`0.0`) or always fails (`1.0`).
#[allow(dead_code)]
pub fn config_with_failure_rate(rate: f64) -> EditorConfig {
    EditorConfig {
        cutover_failure_rate: rate,
        ..EditorConfig::default()
    }
}

/// A ready editor with a seeded orchestrator.
#[allow(dead_code)]
pub fn seeded_editor(config: EditorConfig) -> Editor {
    let orchestrator = Orchestrator::with_rng(&config, StdRng::seed_from_u64(7));
    let mut editor = Editor::with_orchestrator(config, orchestrator);
    editor.mark_ready();
    editor
}

/// Places a node of `component_type` and optionally completes its checklist.
#[allow(dead_code)]
pub fn add_node(
    editor: &mut Editor,
    component_type: ComponentType,
    phase: Phase,
    detailed: bool,
) -> String {
    let placed = editor
        .drop_new(component_type, phase, &canvas(), point(100.0, 100.0))
        .expect("drop should succeed");
    if detailed {
        editor
            .save_details(&placed.node.id, complete_details(component_type))
            .expect("details should save");
    }
    placed.node.id
}

/// Connects two nodes through the two-click protocol.
#[allow(dead_code)]
pub fn wire(editor: &mut Editor, a: &str, b: &str) {
    editor.click_node(a).expect("first click should arm");
    editor.click_node(b).expect("second click should connect");
}

/// Fills `editor` with a confirmed Source canvas of `source_count` detailed, wired
/// servers and a Target canvas with one detailed compute instance and one network,
/// wired together.
#[allow(dead_code)]
pub fn prepare_for_kickoff(editor: &mut Editor, source_count: usize) {
    let ids: Vec<String> = (0..source_count)
        .map(|_| add_node(editor, ComponentType::OnPremServer, Phase::Source, true))
        .collect();
    for pair in ids.windows(2) {
        wire(editor, &pair[0], &pair[1]);
    }
    editor.confirm_source().expect("source should confirm");

    let compute = add_node(editor, ComponentType::CloudCompute, Phase::Target, true);
    let network = add_node(editor, ComponentType::VirtualNetwork, Phase::Target, true);
    wire(editor, &compute, &network);
}

/// A seeded editor prepared with [`prepare_for_kickoff`].
#[allow(dead_code)]
pub fn editor_ready_for_kickoff(config: EditorConfig, source_count: usize) -> Editor {
    let mut editor = seeded_editor(config);
    prepare_for_kickoff(&mut editor, source_count);
    editor
}
