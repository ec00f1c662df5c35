//! Embeddable core library for pbxpatch.
//!
//! Provides a clap-free, I/O-abstracted entry point that takes a descriptor through
//! lock, snapshot, rules, integrity check and persist, restoring it on any failure.
//!
//! # Port traits
//!
//! All descriptor I/O goes through [`DescriptorStore`](ports::DescriptorStore). The
//! [`adapters`] module provides the filesystem implementation and an in-memory one.
//!
//! # Entry points
//!
//! - [`Orchestrator::apply`](pipeline::Orchestrator::apply) - patch one descriptor + report
//! - [`SnapshotManager::cleanup`](snapshot::SnapshotManager::cleanup) - remove a kept backup
//! - [`preflight`] - descriptor discovery and source checks

pub mod adapters;
pub mod error;
pub mod lock;
pub mod pipeline;
pub mod ports;
pub mod preflight;
pub mod settings;
pub mod snapshot;

pub use error::{
    EXIT_PATCH_FAILED, EXIT_SUCCESS, EXIT_UNRECOVERABLE, EXIT_VALIDATION, PatchError,
    RollbackError,
};
pub use pipeline::{Orchestrator, RunFailure};
pub use settings::PatchSettings;
pub use snapshot::{DEFAULT_BACKUP_SUFFIX, Snapshot, SnapshotManager};

// Re-export the domain entry points so embedders don't need pbxpatch-domain directly.
pub use pbxpatch_domain::{ExtensionProfile, Rule, builtin_rules};
