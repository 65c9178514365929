//! Scratch files for in-flight uploads.
//!
//! An upload is written to disk only for as long as the analysis service
//! needs to read it. The indexer owns the file and removes it on every exit
//! path via [`remove_scratch_file`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use scenespot_models::Identifier;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Allocate a unique scratch path for an upload.
///
/// Format: `<dir>/temp_<unix-seconds>_<nonce>_<identifier>`. The nonce keeps
/// two uploads of the same name within one second apart.
pub fn scratch_upload_path(dir: &Path, id: &Identifier) -> PathBuf {
    let nonce = Uuid::new_v4().simple().to_string();
    dir.join(format!("temp_{}_{}_{}", Utc::now().timestamp(), &nonce[..8], id))
}

/// Remove a scratch file, logging instead of failing.
///
/// Returns `true` when nothing is left at `path`. A file that was never
/// created counts as removed.
pub fn remove_scratch_file(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "Deleted temp video");
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Temp video already gone");
            true
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to delete temp video");
            false
        }
    }
}
