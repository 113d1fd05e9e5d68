//! Flat key/value persistence for the door state and overrun setting.
//!
//! No transactional guarantees: callers save after every mutation so a crash
//! loses at most the change in flight. Missing or unreadable values fall back
//! to defaults at the call site (`Unknown` state, zero overrun).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::door::DoorState;

/// Storage boundary for the two persisted fields.
pub trait DoorStore: Send {
    /// Last saved door state, if any.
    fn load_door_state(&mut self) -> Option<DoorState>;
    fn save_door_state(&mut self, state: DoorState) -> Result<()>;

    /// Last saved overrun duration, if any.
    fn load_overrun(&mut self) -> Option<Duration>;
    fn save_overrun(&mut self, overrun: Duration) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredFields {
    door_state: Option<String>,
    overrun_ms: Option<u64>,
}

/// TOML-file-backed store.
pub struct FileStore {
    path: PathBuf,
    fields: StoredFields,
}

impl FileStore {
    /// Open the store, reading existing fields if the file is present. A
    /// corrupt file is treated as empty rather than refusing to start.
    pub fn open(path: &Path) -> Result<Self> {
        let fields = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read state file {}", path.display()))?;
            match toml::from_str(&raw) {
                Ok(fields) => fields,
                Err(e) => {
                    log_pipe!();
                    log_warning!("State file {} is unreadable: {e}", path.display());
                    log_indented!("Starting from defaults; the file will be rewritten on save");
                    StoredFields::default()
                }
            }
        } else {
            StoredFields::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            fields,
        })
    }

    fn write(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let raw = toml::to_string(&self.fields).context("failed to serialize state")?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write state file {}", self.path.display()))
    }
}

impl DoorStore for FileStore {
    fn load_door_state(&mut self) -> Option<DoorState> {
        self.fields
            .door_state
            .as_deref()
            .and_then(DoorState::from_stored)
    }

    fn save_door_state(&mut self, state: DoorState) -> Result<()> {
        self.fields.door_state = Some(state.as_str().to_string());
        self.write()
    }

    fn load_overrun(&mut self) -> Option<Duration> {
        self.fields.overrun_ms.map(Duration::from_millis)
    }

    fn save_overrun(&mut self, overrun: Duration) -> Result<()> {
        self.fields.overrun_ms = Some(overrun.as_millis() as u64);
        self.write()
    }
}

/// In-memory store for tests and for running without a writable filesystem.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub door_state: Option<DoorState>,
    pub overrun: Option<Duration>,
    pub door_state_saves: usize,
}

impl DoorStore for MemoryStore {
    fn load_door_state(&mut self) -> Option<DoorState> {
        self.door_state
    }

    fn save_door_state(&mut self, state: DoorState) -> Result<()> {
        self.door_state = Some(state);
        self.door_state_saves += 1;
        Ok(())
    }

    fn load_overrun(&mut self) -> Option<Duration> {
        self.overrun
    }

    fn save_overrun(&mut self, overrun: Duration) -> Result<()> {
        self.overrun = Some(overrun);
        Ok(())
    }
}
