use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// What moving a node from Source to Target means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhasePolicy {
    /// Crossing Source -> Target starts a migration job for that node immediately.
    AutoMigrate,
    /// The Target canvas is locked until the Source canvas has been confirmed, and
    /// migration only starts through an explicit kickoff.
    #[default]
    ConfirmThenKickoff,
}

/// Runtime settings for an editor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub phase_policy: PhasePolicy,
    /// Interval between two advancement ticks of the migration simulation.
    pub tick_interval_ms: u64,
    /// Probability that a job in `CutoverPending` ends up `Failed`.
    pub cutover_failure_rate: f64,
    /// Node width/height in pixels, used to keep dropped nodes inside the canvas.
    pub node_footprint_px: f64,
    pub clamp_to_canvas: bool,
    /// Namespace of the remote store.
    pub app_id: String,
    pub document_id: String,
    /// Destination label used when no detailed compute node exists on the Target canvas.
    pub placeholder_target_label: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            phase_policy: PhasePolicy::default(),
            tick_interval_ms: 2000,
            cutover_failure_rate: 0.1,
            node_footprint_px: 96.0,
            clamp_to_canvas: true,
            app_id: "default-app-id".to_string(),
            document_id: "current_diagram".to_string(),
            placeholder_target_label: "Unmapped Cloud Target".to_string(),
        }
    }
}

impl EditorConfig {
    /// Load a config from a JSON file. Missing fields fall back to their defaults.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// The failure rate as a valid probability.
    pub fn failure_probability(&self) -> f64 {
        if self.cutover_failure_rate.is_nan() {
            0.0
        } else {
            self.cutover_failure_rate.clamp(0.0, 1.0)
        }
    }
}
