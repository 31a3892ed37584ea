use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{info, warn};

use hime_core::config::{
    parse_patch_toml, ConfigPersistence, ConfigStore, Configuration, JsonFilePersistence,
    MemoryPersistence,
};
use hime_core::engine::CandidateEngine;
use hime_core::import::ImportPipeline;
use hime_core::schema::SchemaSelection;
use hime_core::slide::{GestureResolver, SlideFunction, SlideTarget};
use hime_session::SessionConfig;

use super::engine::{ForeignEngine, HimeRimeEngine};
use super::types::{HimeEvent, HimeKeyAction, HimeResponse};
use super::{HimeError, HimeSession};

/// Keyboard-wide state: configuration, slide gestures, schema selection,
/// and archive import. Sessions are created from it.
#[derive(uniffi::Object)]
pub struct HimeKeyboard {
    engine: Arc<dyn CandidateEngine>,
    store: ConfigStore,
    resolver: RwLock<GestureResolver>,
    schemas: Mutex<SchemaSelection>,
    import: ImportPipeline,
}

#[uniffi::export]
impl HimeKeyboard {
    /// `state_path` is the JSON file holding the persisted configuration;
    /// without it the configuration lives in memory only.
    #[uniffi::constructor]
    pub fn new(
        engine: Arc<dyn HimeRimeEngine>,
        user_data_dir: String,
        state_path: Option<String>,
    ) -> Result<Arc<Self>, HimeError> {
        let persistence: Box<dyn ConfigPersistence> = match state_path {
            Some(path) => Box::new(JsonFilePersistence::new(path)),
            None => Box::new(MemoryPersistence::default()),
        };
        Self::with_engine(
            Arc::new(ForeignEngine::new(engine)),
            Path::new(&user_data_dir),
            persistence,
        )
    }

    pub fn create_session(&self) -> Result<Arc<HimeSession>, HimeError> {
        let config = SessionConfig::from_configuration(&self.store.effective());
        HimeSession::new(Arc::clone(&self.engine), config)
    }

    pub fn configuration_json(&self) -> Result<String, HimeError> {
        serde_json::to_string_pretty(&*self.store.effective())
            .map_err(|e| HimeError::Internal { msg: e.to_string() })
    }

    /// Merge a patch document (`[patch.*]` tables) over the effective
    /// configuration.
    pub fn apply_patch_toml(&self, toml: String) -> Result<Vec<HimeEvent>, HimeError> {
        let Some(patch) = parse_patch_toml(&toml)?.patch else {
            return Ok(Vec::new());
        };
        let effective = self.store.update(&patch)?;
        Ok(self.refresh(&effective))
    }

    pub fn reset_configuration(&self) -> Result<Vec<HimeEvent>, HimeError> {
        let effective = self.store.reset_to_defaults()?;
        Ok(self.refresh(&effective))
    }

    /// Vertical slide of `offset` points on a key. Up is positive.
    pub fn resolve_slide(&self, action: HimeKeyAction, offset: i32) -> HimeResponse {
        let mut target = EventTarget::default();
        let handled = self
            .resolver()
            .dispatch(&action.into(), offset, &mut target);
        target.into_response(handled)
    }

    /// Horizontal drag of `dx` positions on the space key.
    pub fn resolve_space_drag(&self, dx: i32) -> HimeResponse {
        let mut target = EventTarget::default();
        let handled = self.resolver().dispatch_space_drag(dx, &mut target);
        target.into_response(handled)
    }

    pub fn slide_hint(&self, character: String) -> String {
        self.resolver().hint_for(&character)
    }

    pub fn slide_hints(&self) -> HashMap<String, String> {
        self.resolver().table().display_hints().into_iter().collect()
    }

    pub fn selected_schemas(&self) -> Vec<String> {
        self.schemas().to_vec()
    }

    /// Add or remove `schema`. Removing the last one is rejected.
    pub fn toggle_schema(&self, schema: String) -> Result<Vec<HimeEvent>, HimeError> {
        let mut schemas = self.schemas();
        let mut next = schemas.clone();
        next.toggle(&schema)?;
        self.store.update(&next.to_patch())?;
        *schemas = next;
        Ok(vec![HimeEvent::SchemasChanged {
            schemas: schemas.to_vec(),
        }])
    }

    /// Import a zipped user-data bundle and redeploy the engine.
    pub fn import_archive(&self, archive_path: String) -> Result<Vec<HimeEvent>, HimeError> {
        let archive = Path::new(&archive_path);
        let effective = self
            .import
            .import_archive(archive, &self.store, self.engine.as_ref())?;
        info!(archive = %archive_path, "archive imported");
        Ok(self.refresh(&effective))
    }
}

impl HimeKeyboard {
    pub(crate) fn with_engine(
        engine: Arc<dyn CandidateEngine>,
        user_data_dir: &Path,
        persistence: Box<dyn ConfigPersistence>,
    ) -> Result<Arc<Self>, HimeError> {
        let store = ConfigStore::open(persistence)?;
        let effective = store.effective();
        let schemas = schemas_or_defaults(&effective, &store)?;
        Ok(Arc::new(Self {
            engine,
            resolver: RwLock::new(GestureResolver::from_configuration(&effective)),
            schemas: Mutex::new(schemas),
            import: ImportPipeline::with_fs_documents(user_data_dir),
            store,
        }))
    }

    fn resolver(&self) -> std::sync::RwLockReadGuard<'_, GestureResolver> {
        self.resolver.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn schemas(&self) -> std::sync::MutexGuard<'_, SchemaSelection> {
        self.schemas.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rebuild derived state after the effective configuration changed.
    fn refresh(&self, effective: &Configuration) -> Vec<HimeEvent> {
        *self.resolver.write().unwrap_or_else(PoisonError::into_inner) =
            GestureResolver::from_configuration(effective);

        let mut events = vec![HimeEvent::ConfigurationChanged];
        match SchemaSelection::from_configuration(effective) {
            Ok(selection) => {
                let mut schemas = self.schemas();
                if *schemas != selection {
                    *schemas = selection;
                    events.push(HimeEvent::SchemasChanged {
                        schemas: schemas.to_vec(),
                    });
                }
            }
            Err(e) => warn!(error = %e, "keeping previous schema selection"),
        }
        events
    }
}

fn schemas_or_defaults(
    effective: &Configuration,
    store: &ConfigStore,
) -> Result<SchemaSelection, HimeError> {
    SchemaSelection::from_configuration(effective)
        .or_else(|e| {
            warn!(error = %e, "no schema selected, using default selection");
            SchemaSelection::from_configuration(&store.defaults())
        })
        .map_err(|e| HimeError::Internal { msg: e.to_string() })
}

/// Collects slide side effects as host events.
#[derive(Default)]
struct EventTarget {
    events: Vec<HimeEvent>,
}

impl EventTarget {
    fn into_response(self, handled: bool) -> HimeResponse {
        HimeResponse {
            handled,
            events: self.events,
        }
    }
}

impl SlideTarget for EventTarget {
    fn insert_text(&mut self, text: &str) {
        self.events.push(HimeEvent::InsertText {
            text: text.to_string(),
        });
    }

    fn move_cursor(&mut self, offset: i32) {
        self.events.push(HimeEvent::MoveCursor { offset });
    }

    fn perform(&mut self, function: SlideFunction) {
        self.events.push(HimeEvent::PerformFunction {
            function: function.into(),
        });
    }
}
