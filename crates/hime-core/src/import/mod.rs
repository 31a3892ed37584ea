//! Archive import: unzip → merge → engine redeploy, as one serialized task.
//!
//! The archive is extracted over a staging copy of user data. Live data, the
//! persisted configuration, and the engine are only touched once staging has
//! succeeded, and every later failure restores the previous state.

mod document;
#[cfg(test)]
mod tests;

pub use document::{DocumentSource, FsDocumentSource};

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, info_span, warn};

use crate::config::{ConfigError, ConfigStore, Configuration};
use crate::engine::{CandidateEngine, EngineError};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("another import is already running")]
    InProgress,
    #[error("archive error: {0}")]
    Archive(String),
    #[error("engine redeploy failed: {0}")]
    Deploy(#[source] EngineError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub struct ImportPipeline {
    user_data_dir: PathBuf,
    documents: Arc<dyn DocumentSource>,
    in_flight: AtomicBool,
}

impl ImportPipeline {
    pub fn new(user_data_dir: impl Into<PathBuf>, documents: Arc<dyn DocumentSource>) -> Self {
        Self {
            user_data_dir: user_data_dir.into(),
            documents,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_fs_documents(user_data_dir: impl Into<PathBuf>) -> Self {
        Self::new(user_data_dir, Arc::new(FsDocumentSource))
    }

    pub fn user_data_dir(&self) -> &Path {
        &self.user_data_dir
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Import `archive` into user data and redeploy `engine` with the merged
    /// configuration. Returns the new effective configuration.
    pub fn import_archive(
        &self,
        archive: &Path,
        store: &ConfigStore,
        engine: &dyn CandidateEngine,
    ) -> Result<Arc<Configuration>, ImportError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(ImportError::InProgress)?;
        let _span = info_span!("import", archive = %archive.display()).entered();

        let staging = sibling(&self.user_data_dir, "staging");
        let backup = sibling(&self.user_data_dir, "backup");

        if let Err(e) = self.stage(archive, &staging) {
            warn!(error = %e, "staging failed, user data untouched");
            if let Err(e) = remove_if_exists(&staging) {
                warn!(error = %e, "failed to remove staging directory");
            }
            return Err(match e {
                ImportError::Archive(_) => e,
                other => ImportError::Archive(other.to_string()),
            });
        }
        info!("archive staged");

        let previous = store.effective();
        let next = self.merge_documents(&staging, &store.defaults(), &previous);

        let had_live = self.user_data_dir.exists();
        remove_if_exists(&backup)?;
        if had_live {
            fs::rename(&self.user_data_dir, &backup)?;
        }
        if let Err(e) = fs::rename(&staging, &self.user_data_dir) {
            self.restore(&backup, had_live);
            return Err(e.into());
        }

        if let Err(e) = engine.redeploy(&next) {
            warn!(error = %e, "redeploy failed, restoring previous user data");
            self.rollback(&backup, had_live, &previous, engine);
            return Err(ImportError::Deploy(e));
        }
        info!("engine redeployed");

        let effective = match store.replace(next) {
            Ok(effective) => effective,
            Err(e) => {
                warn!(error = %e, "persisting imported configuration failed");
                self.rollback(&backup, had_live, &previous, engine);
                return Err(e.into());
            }
        };

        if let Err(e) = remove_if_exists(&backup) {
            warn!(error = %e, "failed to remove user data backup");
        }
        info!("import complete");
        Ok(effective)
    }

    fn stage(&self, archive: &Path, staging: &Path) -> Result<(), ImportError> {
        remove_if_exists(staging)?;
        if self.user_data_dir.exists() {
            copy_dir_all(&self.user_data_dir, staging)?;
        } else {
            fs::create_dir_all(staging)?;
        }
        self.documents.unzip(archive, staging)?;
        Ok(())
    }

    /// A full document layered over `defaults` replaces `current`; a patch
    /// merges over the result. Malformed documents are skipped.
    fn merge_documents(
        &self,
        dir: &Path,
        defaults: &Configuration,
        current: &Configuration,
    ) -> Configuration {
        let mut next = match self.documents.load_full_document(dir) {
            Ok(Some(base)) => defaults.clone().merged(&base),
            Ok(None) => current.clone(),
            Err(e) => {
                warn!(error = %e, "skipping malformed configuration document");
                current.clone()
            }
        };
        match self.documents.load_patch_document(dir) {
            Ok(Some(doc)) => {
                if let Some(patch) = doc.patch {
                    next.merge(&patch);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "skipping malformed patch document"),
        }
        next
    }

    fn rollback(
        &self,
        backup: &Path,
        had_live: bool,
        previous: &Configuration,
        engine: &dyn CandidateEngine,
    ) {
        self.restore(backup, had_live);
        if let Err(e) = engine.redeploy(previous) {
            warn!(error = %e, "redeploy of previous configuration failed");
        }
    }

    fn restore(&self, backup: &Path, had_live: bool) {
        if let Err(e) = remove_if_exists(&self.user_data_dir) {
            warn!(error = %e, "failed to remove imported user data");
        }
        if had_live {
            if let Err(e) = fs::rename(backup, &self.user_data_dir) {
                warn!(error = %e, "failed to restore user data backup");
            }
        }
    }
}

/// Releases the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// `<dir>.<suffix>` next to `dir`.
fn sibling(dir: &Path, suffix: &str) -> PathBuf {
    let mut name = dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("userdata"));
    name.push(".");
    name.push(suffix);
    dir.with_file_name(name)
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn copy_dir_all(src: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
