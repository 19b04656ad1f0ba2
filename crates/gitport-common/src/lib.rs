//! Gitport Common Library
//!
//! Shared types and logging setup for the gitport workspace.
//!
//! # Overview
//!
//! This crate provides the pieces every gitport component needs:
//!
//! - **Types**: project references, collection names, entity kinds and
//!   import phases shared across the scheduling engine and its callers
//! - **Logging**: centralized tracing initialization with env-based
//!   configuration
//!
//! # Example
//!
//! ```no_run
//! use gitport_common::logging::{LogConfig, init_logging};
//! use gitport_common::types::Project;
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     let project = Project::new(42, "octo-org/octo-repo");
//!     tracing::info!(project = %project, "import starting");
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod types;

// Re-export commonly used types
pub use types::{Collection, EntityKind, ImportPhase, Project};
