use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use zip::write::SimpleFileOptions;

use super::*;
use crate::config::{JsonFilePersistence, BASE_DOCUMENT_NAME, PATCH_DOCUMENT_NAME};
use crate::engine::CandidateSuggestion;

#[derive(Default)]
struct FakeEngine {
    fail_deploy: AtomicBool,
    deployed: Mutex<Vec<Configuration>>,
}

impl FakeEngine {
    fn failing() -> Self {
        Self {
            fail_deploy: AtomicBool::new(true),
            ..Default::default()
        }
    }

    fn deployed(&self) -> Vec<Configuration> {
        self.deployed.lock().unwrap().clone()
    }
}

impl CandidateEngine for FakeEngine {
    fn query_candidates(&self, _: &str) -> Result<Vec<CandidateSuggestion>, EngineError> {
        Ok(Vec::new())
    }

    fn commit_candidate(&self, _: usize) -> Option<String> {
        None
    }

    fn redeploy(&self, configuration: &Configuration) -> Result<(), EngineError> {
        self.deployed.lock().unwrap().push(configuration.clone());
        if self.fail_deploy.swap(false, Ordering::SeqCst) {
            return Err(EngineError::Failed("schema compile error".to_string()));
        }
        Ok(())
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    user_data: PathBuf,
    config_path: PathBuf,
    archive_path: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let user_data = dir.path().join("Rime");
        fs::create_dir_all(&user_data).unwrap();
        fs::write(user_data.join("default.custom.toml"), "old").unwrap();
        Self {
            config_path: dir.path().join("configuration.json"),
            archive_path: dir.path().join("import.zip"),
            user_data,
            _dir: dir,
        }
    }

    fn store(&self) -> ConfigStore {
        ConfigStore::open(Box::new(JsonFilePersistence::new(&self.config_path))).unwrap()
    }

    fn write_archive(&self, entries: &[(&str, &str)]) {
        let file = fs::File::create(&self.archive_path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
}

const BASE_DOC: &str = r#"
[toolbar]
height_of_toolbar = 40

[rime]
maximum_number_of_candidate_words = 50
selected_schemas = ["rime_ice", "double_pinyin"]
"#;

const PATCH_DOC: &str = r#"
[patch.toolbar]
height_of_toolbar = 60
"#;

fn toolbar_height(c: &Configuration) -> Option<u32> {
    c.toolbar.as_ref().and_then(|t| t.height_of_toolbar)
}

#[test]
fn import_merges_base_and_patch_and_redeploys() {
    let fx = Fixture::new();
    fx.write_archive(&[
        (BASE_DOCUMENT_NAME, BASE_DOC),
        (PATCH_DOCUMENT_NAME, PATCH_DOC),
        ("rime_ice.schema.yaml", "schema"),
    ]);
    let store = fx.store();
    let engine = FakeEngine::default();
    let pipeline = ImportPipeline::with_fs_documents(&fx.user_data);

    let effective = pipeline
        .import_archive(&fx.archive_path, &store, &engine)
        .unwrap();

    assert_eq!(toolbar_height(&effective), Some(60));
    assert_eq!(effective.maximum_number_of_candidate_words(), Some(50));
    assert_eq!(*store.effective(), *effective);
    assert_eq!(engine.deployed(), vec![(*effective).clone()]);

    // Existing files survive, archive files are added.
    assert!(fx.user_data.join("default.custom.toml").exists());
    assert!(fx.user_data.join("rime_ice.schema.yaml").exists());
    assert!(!sibling(&fx.user_data, "staging").exists());
    assert!(!sibling(&fx.user_data, "backup").exists());

    // Persisted layer reflects the import.
    let reopened = fx.store();
    assert_eq!(toolbar_height(&reopened.effective()), Some(60));
}

#[test]
fn base_only_import_layers_over_defaults_and_survives_reopen() {
    let fx = Fixture::new();
    fx.write_archive(&[(BASE_DOCUMENT_NAME, "[toolbar]\nheight_of_toolbar = 40\n")]);
    let store = fx.store();
    let engine = FakeEngine::default();
    let pipeline = ImportPipeline::with_fs_documents(&fx.user_data);

    let effective = pipeline
        .import_archive(&fx.archive_path, &store, &engine)
        .unwrap();

    assert_eq!(toolbar_height(&effective), Some(40));
    let defaults = store.defaults();
    assert_eq!(effective.selected_schemas(), defaults.selected_schemas());
    assert_eq!(
        effective.maximum_number_of_candidate_words(),
        defaults.maximum_number_of_candidate_words()
    );
    assert_eq!(
        effective.swipe.as_ref().map(|s| &s.up_and_down_slide_symbols),
        defaults.swipe.as_ref().map(|s| &s.up_and_down_slide_symbols)
    );
    assert_eq!(engine.deployed(), vec![(*effective).clone()]);

    let reopened = fx.store();
    assert_eq!(*reopened.effective(), *effective);
}

#[test]
fn malformed_archive_leaves_everything_unchanged() {
    let fx = Fixture::new();
    let store = fx.store();
    let patch =
        crate::config::parse_configuration_toml("[toolbar]\nheight_of_toolbar = 33\n").unwrap();
    store.update(&patch).unwrap();
    let persisted_before = fs::read(&fx.config_path).unwrap();
    fs::write(&fx.archive_path, b"this is not a zip file").unwrap();

    let engine = FakeEngine::default();
    let pipeline = ImportPipeline::with_fs_documents(&fx.user_data);
    let err = pipeline
        .import_archive(&fx.archive_path, &store, &engine)
        .unwrap_err();

    assert!(matches!(err, ImportError::Archive(_)));
    assert_eq!(fs::read(&fx.config_path).unwrap(), persisted_before);
    assert_eq!(toolbar_height(&store.effective()), Some(33));
    assert!(engine.deployed().is_empty());
    assert_eq!(
        fs::read_to_string(fx.user_data.join("default.custom.toml")).unwrap(),
        "old"
    );
    assert!(!sibling(&fx.user_data, "staging").exists());
    assert!(!pipeline.is_running());
}

#[test]
fn failed_redeploy_restores_user_data_and_configuration() {
    let fx = Fixture::new();
    fx.write_archive(&[
        (BASE_DOCUMENT_NAME, BASE_DOC),
        ("default.custom.toml", "new"),
    ]);
    let store = fx.store();
    let before = store.effective();
    let engine = FakeEngine::failing();
    let pipeline = ImportPipeline::with_fs_documents(&fx.user_data);

    let err = pipeline
        .import_archive(&fx.archive_path, &store, &engine)
        .unwrap_err();

    assert!(matches!(err, ImportError::Deploy(_)));
    assert_eq!(store.effective(), before);
    assert!(!fx.config_path.exists());
    assert_eq!(
        fs::read_to_string(fx.user_data.join("default.custom.toml")).unwrap(),
        "old"
    );
    assert!(!sibling(&fx.user_data, "backup").exists());
    // Second redeploy is the best-effort restore of the previous configuration.
    let deployed = engine.deployed();
    assert_eq!(deployed.len(), 2);
    assert_eq!(deployed[1], *before);
}

#[test]
fn malformed_patch_is_skipped() {
    let fx = Fixture::new();
    fx.write_archive(&[
        (BASE_DOCUMENT_NAME, BASE_DOC),
        (PATCH_DOCUMENT_NAME, "[patch.keyboard]\nhaptic_feedback_intensity = 9\n"),
    ]);
    let store = fx.store();
    let engine = FakeEngine::default();
    let pipeline = ImportPipeline::with_fs_documents(&fx.user_data);

    let effective = pipeline
        .import_archive(&fx.archive_path, &store, &engine)
        .unwrap();
    assert_eq!(toolbar_height(&effective), Some(40));
}

#[test]
fn archive_without_documents_keeps_configuration() {
    let fx = Fixture::new();
    fx.write_archive(&[("custom_phrase.txt", "hamster\t仓鼠")]);
    let store = fx.store();
    let before = store.effective();
    let engine = FakeEngine::default();
    let pipeline = ImportPipeline::with_fs_documents(&fx.user_data);

    let effective = pipeline
        .import_archive(&fx.archive_path, &store, &engine)
        .unwrap();
    assert_eq!(*effective, *before);
    assert!(fx.user_data.join("custom_phrase.txt").exists());
}

#[test]
fn unsafe_entry_name_rejects_archive() {
    let fx = Fixture::new();
    fx.write_archive(&[("../escape.txt", "x")]);
    let store = fx.store();
    let pipeline = ImportPipeline::with_fs_documents(&fx.user_data);

    let err = pipeline
        .import_archive(&fx.archive_path, &store, &FakeEngine::default())
        .unwrap_err();
    assert!(matches!(err, ImportError::Archive(_)));
    assert!(!fx.user_data.parent().unwrap().join("escape.txt").exists());
}

/// Blocks inside `unzip` until released, so a second import can race it.
struct BlockingDocuments {
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl DocumentSource for BlockingDocuments {
    fn load_full_document(&self, dir: &Path) -> Result<Option<Configuration>, ConfigError> {
        FsDocumentSource.load_full_document(dir)
    }

    fn load_patch_document(
        &self,
        dir: &Path,
    ) -> Result<Option<crate::config::ConfigurationPatch>, ConfigError> {
        FsDocumentSource.load_patch_document(dir)
    }

    fn unzip(&self, _: &Path, _: &Path) -> Result<usize, ImportError> {
        self.entered.lock().unwrap().send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        Ok(0)
    }
}

#[test]
fn concurrent_import_is_rejected() {
    let fx = Fixture::new();
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let documents = Arc::new(BlockingDocuments {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    });
    let pipeline = Arc::new(ImportPipeline::new(&fx.user_data, documents));
    let store = Arc::new(fx.store());
    let engine = Arc::new(FakeEngine::default());

    let first = {
        let (pipeline, store, engine) = (pipeline.clone(), store.clone(), engine.clone());
        let archive = fx.archive_path.clone();
        thread::spawn(move || pipeline.import_archive(&archive, &store, engine.as_ref()))
    };
    entered_rx.recv().unwrap();
    assert!(pipeline.is_running());

    let second = pipeline.import_archive(&fx.archive_path, &store, engine.as_ref());
    assert!(matches!(second, Err(ImportError::InProgress)));

    release_tx.send(()).unwrap();
    assert!(first.join().unwrap().is_ok());
    assert!(!pipeline.is_running());
}
