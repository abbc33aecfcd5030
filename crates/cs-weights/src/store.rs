//! Card-id → weight map, flushed to disk on every mutation.
//!
//! The backing file is a plain JSON object and is safe to delete: a
//! missing or corrupt file loads as an empty map.

use cs_core::{CardError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct WeightStore {
    path: PathBuf,
    weights: HashMap<String, f64>,
}

impl WeightStore {
    /// Open a store backed by `path`, loading whatever is there.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let weights = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "weight file corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, weights }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current weight for a card; unknown ids are 0.0, not an error.
    pub fn weight(&self, card_id: &str) -> f64 {
        self.weights.get(card_id).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Add `delta` to a card's weight and persist.
    pub fn update(&mut self, card_id: &str, delta: f64) -> Result<()> {
        *self.weights.entry(card_id.to_string()).or_insert(0.0) += delta;
        self.save()
    }

    /// Zero one card's weight and persist. Unknown ids are a no-op.
    pub fn reset(&mut self, card_id: &str) -> Result<()> {
        match self.weights.get_mut(card_id) {
            Some(weight) => {
                *weight = 0.0;
                self.save()
            }
            None => Ok(()),
        }
    }

    /// Drop every weight and persist. Equivalent to deleting the file.
    pub fn reset_all(&mut self) -> Result<()> {
        self.weights.clear();
        self.save()
    }

    /// Multiply every weight by `factor` and persist. Invoked by an
    /// external scheduler for time-based decay, never from inside the
    /// engine.
    pub fn decay(&mut self, factor: f64) -> Result<()> {
        for weight in self.weights.values_mut() {
            *weight *= factor;
        }
        self.save()
    }

    /// Write the whole map. The in-memory state is already updated when
    /// this runs, so a failure here is recoverable: retrying the next
    /// mutation persists everything.
    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| store_error(parent, &e))?;
            }
        }
        let json = serde_json::to_string_pretty(&self.weights)?;
        // temp-file-then-rename so a failed write cannot truncate the
        // previous snapshot
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| store_error(&tmp, &e))?;
        fs::rename(&tmp, &self.path).map_err(|e| store_error(&self.path, &e))?;
        debug!(path = %self.path.display(), entries = self.weights.len(), "weights persisted");
        Ok(())
    }
}

fn store_error(path: &Path, e: &std::io::Error) -> CardError {
    CardError::WeightStore(format!("{}: {e}", path.display()))
}
