//! Prelude module for convenient imports
//!
//! Re-exports the types most callers need to build a diagram, validate it and run a
//! migration, so a single `use diagrammer::prelude::*;` is enough.
//!
//! # Example
//!
//! ```rust,no_run
//! use diagrammer::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let config = EditorConfig::from_file("path/to/config.json")?;
//! let json = std::fs::read_to_string("path/to/diagram.json")?;
//! let document: ArchitectureDocument = serde_json::from_str(&json)?;
//!
//! for phase in [Phase::Source, Phase::Target] {
//!     let report = document.validate_phase(phase);
//!     println!("{}: {} warning(s), {} error(s)", phase, report.warnings, report.errors);
//! }
//! # let _ = config;
//! # Ok(())
//! # }
//! ```

// Catalog and document model
pub use crate::catalog::{AttributeKind, ComponentType, RequiredAttribute};
pub use crate::diagram::{
    ArchitectureDocument, CanvasRect, Connection, Details, DropPoint, Node, Phase, Position,
};

// Editing and validation
pub use crate::config::{EditorConfig, PhasePolicy};
pub use crate::editor::{Editor, Notice, NoticeLevel};
pub use crate::validation::TopologyReport;

// Migration simulation
pub use crate::migration::{AdvancementLoop, JobStatus, MigrationJob, Orchestrator};

// Persistence
pub use crate::sync::{DocumentStore, IdentityProvider, JobStore, SyncSession};
pub use crate::workspace::Workspace;

// Error types
pub use crate::error::{ConnectionRejection, DiagramError, KickoffRejection, PersistenceError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
