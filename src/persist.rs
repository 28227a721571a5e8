//! Durable storage for the default layer
//!
//! The default layer is the only state that survives a restart. Everything
//! else (overlay layers, held keys) starts empty.

use crate::config::LayerId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the persisted default layer lives
pub trait DefaultLayerStore: Send {
    /// Stored default layer, `None` if nothing was ever saved
    fn load(&self) -> Result<Option<LayerId>, PersistError>;

    fn save(&mut self, layer: LayerId) -> Result<(), PersistError>;
}

/// On-disk state file contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub default_layer: LayerId,
}

/// JSON state file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `~/.config/ergomux/state.json`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ergomux").join("state.json"))
    }
}

impl DefaultLayerStore for JsonFileStore {
    fn load(&self) -> Result<Option<LayerId>, PersistError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&self.path)?;
        let state: PersistedState = serde_json::from_str(&json)?;
        Ok(Some(state.default_layer))
    }

    fn save(&mut self, layer: LayerId) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&PersistedState {
            default_layer: layer,
        })?;
        std::fs::write(&self.path, json)?;
        tracing::debug!("Saved default layer {} to {}", layer, self.path.display());
        Ok(())
    }
}

const EMPTY_SLOT: u16 = u16::MAX;

/// In-memory store; clones share the same slot, so it outlives a processor
#[derive(Debug, Clone)]
pub struct MemoryStore {
    slot: Arc<AtomicU16>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Arc::new(AtomicU16::new(EMPTY_SLOT)),
        }
    }

    #[must_use]
    pub fn with_layer(layer: LayerId) -> Self {
        Self {
            slot: Arc::new(AtomicU16::new(u16::from(layer.0))),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultLayerStore for MemoryStore {
    fn load(&self) -> Result<Option<LayerId>, PersistError> {
        let value = self.slot.load(Ordering::SeqCst);
        Ok(u8::try_from(value).ok().map(LayerId))
    }

    fn save(&mut self, layer: LayerId) -> Result<(), PersistError> {
        self.slot.store(u16::from(layer.0), Ordering::SeqCst);
        Ok(())
    }
}
