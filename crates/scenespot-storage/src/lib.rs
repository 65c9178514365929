//! Local artifact storage.
//!
//! This crate provides:
//! - The artifact store (one JSON index per identifier, on disk)
//! - Scratch paths for in-flight uploads and their cleanup

pub mod artifact;
pub mod error;
pub mod scratch;

pub use artifact::ArtifactStore;
pub use error::{StorageError, StorageResult};
pub use scratch::{remove_scratch_file, scratch_upload_path};
