use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, warn};

use super::{default_configuration, validate, ConfigError, Configuration};

/// Persisted layer of the effective configuration.
pub trait ConfigPersistence: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<Configuration>, ConfigError>;
    fn save(&self, configuration: &Configuration) -> Result<(), ConfigError>;
}

/// Pretty-printed JSON file, replaced atomically on save.
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPersistence for JsonFilePersistence {
    fn load(&self) -> Result<Option<Configuration>, ConfigError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let c: Configuration =
            serde_json::from_slice(&bytes).map_err(|e| ConfigError::Parse(e.to_string()))?;
        validate(&c)?;
        Ok(Some(c))
    }

    /// Atomic write: write to .tmp then rename.
    fn save(&self, configuration: &Configuration) -> Result<(), ConfigError> {
        let bytes = serde_json::to_vec_pretty(configuration)
            .map_err(|e| ConfigError::Persist(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory persistence for hosts without a writable container.
#[derive(Default)]
pub struct MemoryPersistence {
    saved: Mutex<Option<Configuration>>,
}

impl MemoryPersistence {
    pub fn new(initial: Option<Configuration>) -> Self {
        Self {
            saved: Mutex::new(initial),
        }
    }

    pub fn saved(&self) -> Option<Configuration> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ConfigPersistence for MemoryPersistence {
    fn load(&self) -> Result<Option<Configuration>, ConfigError> {
        Ok(self.saved())
    }

    fn save(&self, configuration: &Configuration) -> Result<(), ConfigError> {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(configuration.clone());
        Ok(())
    }
}

/// Owner of the effective configuration.
///
/// Reads are lock-free clones of an `Arc`. Writes are serialized, saved to
/// the persisted layer first, and only then published; a failed save leaves
/// both the cache and the persisted layer unchanged.
pub struct ConfigStore {
    defaults: Arc<Configuration>,
    effective: RwLock<Arc<Configuration>>,
    persistence: Box<dyn ConfigPersistence>,
    write_lock: Mutex<()>,
}

impl ConfigStore {
    /// Layer the persisted configuration over the embedded default. A corrupt
    /// persisted layer is skipped.
    pub fn open(persistence: Box<dyn ConfigPersistence>) -> Result<Self, ConfigError> {
        let defaults = default_configuration()?;
        let effective = match persistence.load() {
            Ok(Some(persisted)) => defaults.clone().merged(&persisted),
            Ok(None) => {
                debug!("no persisted configuration, starting from defaults");
                defaults.clone()
            }
            Err(e) => {
                warn!(error = %e, "ignoring unreadable persisted configuration");
                defaults.clone()
            }
        };
        Ok(Self {
            defaults: Arc::new(defaults),
            effective: RwLock::new(Arc::new(effective)),
            persistence,
            write_lock: Mutex::new(()),
        })
    }

    pub fn defaults(&self) -> Arc<Configuration> {
        Arc::clone(&self.defaults)
    }

    pub fn effective(&self) -> Arc<Configuration> {
        Arc::clone(&self.effective.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Apply discovered layers: `base` over the embedded default replaces the
    /// running configuration, then `patch` is merged over the result.
    pub fn apply_layers(
        &self,
        base: Option<Configuration>,
        patch: Option<&Configuration>,
    ) -> Result<Arc<Configuration>, ConfigError> {
        let _write = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = match base {
            Some(base) => (*self.defaults).clone().merged(&base),
            None => (*self.effective()).clone(),
        };
        if let Some(patch) = patch {
            next.merge(patch);
        }
        self.publish(next)
    }

    /// Merge a patch over the effective configuration.
    pub fn update(&self, patch: &Configuration) -> Result<Arc<Configuration>, ConfigError> {
        self.apply_layers(None, Some(patch))
    }

    pub fn replace(&self, configuration: Configuration) -> Result<Arc<Configuration>, ConfigError> {
        self.apply_layers(Some(configuration), None)
    }

    pub fn reset_to_defaults(&self) -> Result<Arc<Configuration>, ConfigError> {
        self.replace((*self.defaults).clone())
    }

    fn publish(&self, next: Configuration) -> Result<Arc<Configuration>, ConfigError> {
        validate(&next)?;
        self.persistence
            .save(&next)
            .map_err(|e| ConfigError::Persist(e.to_string()))?;
        let next = Arc::new(next);
        *self.effective.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);
        Ok(next)
    }
}
