use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use super::schema::migrate;
use super::session::AppState;
use crate::error::Result;

/// Keeps the application state in a single JSON file
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable state file is moved, e.g. `state.json.bad`
    pub fn rejected_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".bad");
        self.path.with_file_name(name)
    }

    /// Loads the stored state.
    ///
    /// A missing file gives an empty state. A file that cannot be read as a
    /// state document is moved to [`rejected_path`](Self::rejected_path)
    /// so the next save does not overwrite it, and an empty state is used.
    pub fn load(&self) -> AppState {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no stored state, starting empty");
            return AppState::default();
        }
        match self.try_load() {
            Ok(state) => state,
            Err(e) => {
                let rejected = self.rejected_path();
                match fs::rename(&self.path, &rejected) {
                    Ok(()) => warn!(
                        path = %self.path.display(),
                        moved_to = %rejected.display(),
                        error = %e,
                        "failed to load state, starting fresh"
                    ),
                    Err(move_err) => warn!(
                        path = %self.path.display(),
                        error = %e,
                        move_error = %move_err,
                        "failed to load state and could not move it aside, starting fresh"
                    ),
                }
                AppState::default()
            }
        }
    }

    /// Loads the stored state, reporting any problem with the file
    pub fn try_load(&self) -> Result<AppState> {
        let raw = fs::read_to_string(&self.path)?;
        let document: Value = serde_json::from_str(&raw)?;
        let stored = migrate(&document, &mut rand::thread_rng())?;
        Ok(AppState::from(stored))
    }

    /// Writes the state next to the target and renames it into place
    pub fn save(&self, state: &AppState) -> Result<()> {
        let json = serde_json::to_string_pretty(&state.to_persisted())?;
        let tmp = self.path.with_extension("json.tmp");
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }

    /// Saves, logging instead of failing. The in-memory state stays
    /// authoritative when the write does not go through.
    pub fn save_or_warn(&self, state: &AppState) {
        if let Err(e) = self.save(state) {
            warn!(path = %self.path.display(), error = %e, "failed to persist state");
        }
    }
}
