//! # Diagrammer - Migration Diagram Engine
//!
//! **Diagrammer** models a "before" and "after" infrastructure sketch on two canvases,
//! checks each component against a fixed checklist of migration attributes, validates
//! the topology of each canvas, and drives a simulated migration whose jobs advance
//! through a fixed lifecycle on a timer.
//!
//! ## Core Workflow
//!
//! 1.  **Place components**: drop catalog types onto the Source canvas through the
//!     [`Editor`](editor::Editor), then fill in each node's checklist.
//! 2.  **Connect**: click two nodes of the same canvas to wire them together.
//! 3.  **Confirm and design**: confirm the Source canvas, which unlocks the Target
//!     canvas, and sketch the destination architecture there.
//! 4.  **Kick off**: freeze every detailed Source node into a migration job, then let an
//!     [`AdvancementLoop`](migration::AdvancementLoop) tick the jobs to completion.
//!
//! Persistence is optional. A [`Workspace`](workspace::Workspace) binds an editor to an
//! identity provider, a document store and a job store; when any of them is
//! unavailable the workspace keeps working locally.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use diagrammer::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run_example() -> Result<()> {
//! let mut editor = Editor::new(EditorConfig::default());
//! editor.mark_ready();
//!
//! let canvas = CanvasRect { left: 0.0, top: 0.0, width: 800.0, height: 600.0 };
//! let server = editor.drop_new(
//!     ComponentType::OnPremServer,
//!     Phase::Source,
//!     &canvas,
//!     DropPoint { x: 120.0, y: 80.0 },
//! )?;
//!
//! let mut details = Details::new();
//! details.insert("hostname".into(), "app01.corp.local".into());
//! details.insert("operatingSystem".into(), "Ubuntu 22.04".into());
//! details.insert("cpuCores".into(), 4.into());
//! details.insert("memoryGb".into(), 16.into());
//! details.insert("isProduction".into(), true.into());
//! editor.save_details(&server.node.id, details)?;
//!
//! editor.confirm_source()?;
//! let jobs = editor.kickoff()?;
//! println!("Started {} job(s)", jobs.len());
//!
//! let editor = Arc::new(tokio::sync::Mutex::new(editor));
//! let _ticker = AdvancementLoop::spawn(editor.clone(), Duration::from_secs(2));
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod diagram;
pub mod editor;
pub mod error;
pub mod migration;
pub mod prelude;
pub mod sync;
pub mod validation;
pub mod workspace;
