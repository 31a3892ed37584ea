use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use super::ImportError;
use crate::config::{
    parse_configuration_toml, parse_patch_toml, ConfigError, Configuration, ConfigurationPatch,
    BASE_DOCUMENT_NAME, PATCH_DOCUMENT_NAME,
};

/// Access to the configuration documents and archives inside user data.
pub trait DocumentSource: Send + Sync {
    /// Full document in `dir`, `Ok(None)` when there is none.
    fn load_full_document(&self, dir: &Path) -> Result<Option<Configuration>, ConfigError>;

    /// Patch document in `dir`, `Ok(None)` when there is none.
    fn load_patch_document(&self, dir: &Path) -> Result<Option<ConfigurationPatch>, ConfigError>;

    /// Extract `archive` over `dest`. Returns the number of files written.
    fn unzip(&self, archive: &Path, dest: &Path) -> Result<usize, ImportError>;
}

/// TOML documents on the local filesystem and zip archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDocumentSource;

impl DocumentSource for FsDocumentSource {
    fn load_full_document(&self, dir: &Path) -> Result<Option<Configuration>, ConfigError> {
        read_optional(&dir.join(BASE_DOCUMENT_NAME))?
            .map(|s| parse_configuration_toml(&s))
            .transpose()
    }

    fn load_patch_document(&self, dir: &Path) -> Result<Option<ConfigurationPatch>, ConfigError> {
        read_optional(&dir.join(PATCH_DOCUMENT_NAME))?
            .map(|s| parse_patch_toml(&s))
            .transpose()
    }

    /// Entries keep their relative paths. Names escaping `dest` reject the
    /// whole archive.
    fn unzip(&self, archive: &Path, dest: &Path) -> Result<usize, ImportError> {
        let file = fs::File::open(archive)?;
        let mut archive = zip::ZipArchive::new(file).map_err(archive_err)?;
        let mut count = 0;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(archive_err)?;
            let Some(relative) = entry.enclosed_name() else {
                return Err(ImportError::Archive(format!(
                    "unsafe entry name: {}",
                    entry.name()
                )));
            };
            let out_path = dest.join(relative);
            if entry.is_dir() {
                fs::create_dir_all(&out_path)?;
                continue;
            }
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = fs::File::create(&out_path)?;
            io::copy(&mut entry, &mut out)?;
            count += 1;
        }
        debug!(files = count, "archive extracted");
        Ok(count)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn archive_err(e: impl std::fmt::Display) -> ImportError {
    ImportError::Archive(e.to_string())
}
