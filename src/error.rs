use crate::diagram::Phase;
use thiserror::Error;

/// Reasons a connection attempt between two nodes is refused.
///
/// Variants are listed in the order they are checked.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionRejection {
    #[error("Components on different canvases cannot be connected")]
    CrossPhaseRejected,

    #[error("These components are already connected")]
    DuplicateRejected,

    #[error("A component cannot be connected to itself")]
    SelfLoopRejected,
}

/// Errors raised by operations on the diagram document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagramError {
    /// An operation referenced a node id that does not exist. Not reachable through
    /// well-formed input; callers should treat it as an internal fault.
    #[error("Node '{0}' does not exist in this diagram")]
    NodeNotFound(String),

    #[error("Unknown component type '{0}'")]
    UnknownComponentType(String),

    #[error("Still connecting; try again in a moment")]
    NotReady,

    #[error("The {0} canvas is locked until the source architecture is confirmed")]
    TargetPhaseLocked(Phase),

    #[error("{0}")]
    Rejected(#[from] ConnectionRejection),

    #[error(
        "The source architecture cannot be confirmed yet ({warnings} warning(s), {errors} error(s))"
    )]
    SourceIncomplete { warnings: u32, errors: u32 },
}

/// Reasons a migration kickoff is refused. No jobs are created when any of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KickoffRejection {
    #[error("Confirm the source architecture before starting the migration")]
    SourceNotConfirmed,

    #[error(
        "The source architecture is incomplete ({warnings} warning(s), {errors} error(s))"
    )]
    SourceIncomplete { warnings: u32, errors: u32 },

    #[error(
        "The target architecture is incomplete ({warnings} warning(s), {errors} error(s))"
    )]
    TargetIncomplete { warnings: u32, errors: u32 },

    #[error("No source component has a completed checklist")]
    NoDetailedSourceNodes,
}

/// Failures talking to the identity provider or the remote stores.
#[derive(Error, Debug, Clone)]
pub enum PersistenceError {
    #[error("Identity bootstrap failed: {0}")]
    Identity(String),

    #[error("Failed to save changes: {0}")]
    Write(String),

    #[error("Failed to subscribe to remote changes: {0}")]
    Subscribe(String),

    #[error("Failed to encode or decode a stored document: {0}")]
    Serialization(String),

    #[error("Changes not saved: running in local-only mode")]
    LocalOnly,
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

/// Errors raised while loading an `EditorConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
