#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Concurrent package installation for pinstall
//!
//! Every package is fetched, extracted and relocated by its own task into
//! a scratch workspace beside the target directory. Once all tasks have
//! finished the workspace is renamed over the target in one step and the
//! installed manifest is written into it.

#[macro_use]
mod macros;
pub mod archive;
mod config;
mod context;
mod installer;
mod limits;
pub mod manifest;
mod task;
mod workspace;

pub use archive::{ArchiveFormat, ArchiveInfo};
pub use config::{FailurePolicy, InstallConfig};
pub use context::InstallContext;
pub use installer::Installer;
pub use manifest::{render_manifest, write_manifest};
pub use workspace::{ScratchWorkspace, SCRATCH_PREFIX};

// Re-export EventSender for use by macros and contexts
pub use pinstall_events::EventSender;
