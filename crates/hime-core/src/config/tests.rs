use std::collections::BTreeMap;
use std::fs;

use proptest::prelude::*;

use super::*;

fn flat(a: Option<u32>, b: Option<u32>) -> Configuration {
    Configuration {
        toolbar: Some(ToolbarConfiguration {
            height_of_toolbar: a,
            height_of_coding_area: b,
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn schema_colors(back: Option<&str>, front: Option<&str>) -> KeyboardColorSchema {
    KeyboardColorSchema {
        back_color: back.map(str::to_string),
        button_front_color: front.map(str::to_string),
        ..Default::default()
    }
}

// --- Defaults ---

#[test]
fn parse_default_toml() {
    let c = default_configuration().unwrap();
    let keyboard = c.keyboard.as_ref().unwrap();
    assert_eq!(keyboard.haptic_feedback_intensity, Some(2));
    assert_eq!(keyboard.use_color_schema.as_deref(), Some("solarized_light"));
    assert!(keyboard
        .color_schemas
        .as_ref()
        .unwrap()
        .contains_key("solarized_light"));
    assert_eq!(c.maximum_number_of_candidate_words(), Some(100));
    assert_eq!(c.selected_schemas(), Some(&["rime_ice".to_string()][..]));
    let symbols = c
        .swipe
        .as_ref()
        .and_then(|s| s.up_and_down_slide_symbols.as_ref())
        .unwrap();
    assert_eq!(symbols["q↑"], "1");
    assert_eq!(symbols["a↓"], "#行首");
    assert!(!c.expand_candidates_on_open());
}

#[test]
fn empty_document_is_all_absent() {
    let c = parse_configuration_toml("").unwrap();
    assert_eq!(c, Configuration::default());
}

// --- Merge precedence ---

#[test]
fn patch_field_overrides_and_absent_inherits() {
    // base {a: 1, b: 2} + patch {b: 3} → {a: 1, b: 3}
    let base = flat(Some(1), Some(2));
    let patch = flat(None, Some(3));
    assert_eq!(base.merged(&patch), flat(Some(1), Some(3)));
}

#[test]
fn nested_records_merge_field_by_field() {
    // base {nested: {x: 1, y: 2}} + patch {nested: {y: 9}} → {nested: {x: 1, y: 9}}
    let mut base_schemas = BTreeMap::new();
    base_schemas.insert("dark".to_string(), schema_colors(Some("x1"), Some("y2")));
    let mut patch_schemas = BTreeMap::new();
    patch_schemas.insert("dark".to_string(), schema_colors(None, Some("y9")));

    let wrap = |schemas| Configuration {
        keyboard: Some(KeyboardConfiguration {
            color_schemas: Some(schemas),
            ..Default::default()
        }),
        ..Default::default()
    };
    let merged = wrap(base_schemas).merged(&wrap(patch_schemas));
    let dark = &merged.keyboard.unwrap().color_schemas.unwrap()["dark"];
    assert_eq!(dark, &schema_colors(Some("x1"), Some("y9")));
}

#[test]
fn absent_section_in_base_takes_patch_section() {
    let base = Configuration::default();
    let patch = flat(Some(40), None);
    assert_eq!(base.merged(&patch), flat(Some(40), None));
}

#[test]
fn lists_replace_wholesale() {
    let with_pairs = |pairs: &[&str]| Configuration {
        keyboard: Some(KeyboardConfiguration {
            pairs_of_symbols: Some(pairs.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let merged = with_pairs(&["()", "[]"]).merged(&with_pairs(&["[]"]));
    assert_eq!(
        merged.keyboard.unwrap().pairs_of_symbols.unwrap(),
        vec!["[]".to_string()]
    );
}

#[test]
fn slide_symbol_maps_merge_per_key() {
    let base = parse_configuration_toml(
        r#"
[swipe.up_and_down_slide_symbols]
"q↑" = "1"
"w↑" = "2"
"#,
    )
    .unwrap();
    let patch = parse_configuration_toml(
        r##"
[swipe.up_and_down_slide_symbols]
"w↑" = "@"
"e↓" = "#行尾"
"##,
    )
    .unwrap();
    let merged = base.merged(&patch);
    let symbols = merged.swipe.unwrap().up_and_down_slide_symbols.unwrap();
    assert_eq!(symbols.len(), 3);
    assert_eq!(symbols["q↑"], "1");
    assert_eq!(symbols["w↑"], "@");
    assert_eq!(symbols["e↓"], "#行尾");
}

#[test]
fn merge_patch_twice_is_idempotent_on_defaults() {
    let base = default_configuration().unwrap();
    let patch = parse_patch_toml(
        r#"
[patch.keyboard]
enable_key_sounds = true
pairs_of_symbols = ["<>"]

[patch.keyboard.color_schemas.solarized_light]
back_color = "0x000000"

[patch.rime]
selected_schemas = ["double_pinyin"]
"#,
    )
    .unwrap()
    .patch
    .unwrap();
    let once = base.clone().merged(&patch);
    let twice = once.clone().merged(&patch);
    assert_eq!(once, twice);
    assert_ne!(once, base);
}

// --- Parsing and validation ---

#[test]
fn patch_document_without_patch_table_is_empty() {
    let p = parse_patch_toml("").unwrap();
    assert!(p.patch.is_none());
}

#[test]
fn error_intensity_out_of_range() {
    let err = parse_configuration_toml("[keyboard]\nhaptic_feedback_intensity = 5\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
    assert!(err.to_string().contains("keyboard.haptic_feedback_intensity"));
}

#[test]
fn error_zero_candidate_words() {
    let err =
        parse_configuration_toml("[rime]\nmaximum_number_of_candidate_words = 0\n").unwrap_err();
    assert!(err.to_string().contains("rime.maximum_number_of_candidate_words"));
}

#[test]
fn error_empty_schema_selection_in_patch() {
    let err = parse_patch_toml("[patch.rime]\nselected_schemas = []\n").unwrap_err();
    assert!(err.to_string().contains("rime.selected_schemas"));
}

#[test]
fn error_type_mismatch_rejects_whole_document() {
    let err = parse_configuration_toml(
        r#"
[toolbar]
height_of_toolbar = 40

[keyboard]
enable_key_sounds = "yes"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn error_invalid_toml() {
    let err = parse_configuration_toml("not valid toml {{{").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

// --- Store ---

struct FailingPersistence;

impl ConfigPersistence for FailingPersistence {
    fn load(&self) -> Result<Option<Configuration>, ConfigError> {
        Ok(None)
    }

    fn save(&self, _: &Configuration) -> Result<(), ConfigError> {
        Err(ConfigError::Persist("read-only".to_string()))
    }
}

#[test]
fn store_layers_persisted_over_defaults() {
    let persisted = flat(Some(70), None);
    let store = ConfigStore::open(Box::new(MemoryPersistence::new(Some(persisted)))).unwrap();
    let effective = store.effective();
    let toolbar = effective.toolbar.as_ref().unwrap();
    assert_eq!(toolbar.height_of_toolbar, Some(70));
    // Inherited from defaults.
    assert_eq!(toolbar.height_of_coding_area, Some(15));
}

#[test]
fn store_base_replaces_then_patch_merges_and_saves() {
    let persistence = std::sync::Arc::new(MemoryPersistence::default());
    let store = ConfigStore::open(Box::new(SharedPersistence(persistence.clone()))).unwrap();
    store.update(&flat(Some(9), Some(9))).unwrap();

    let base = flat(Some(1), Some(2));
    let patch = flat(None, Some(3));
    let effective = store.apply_layers(Some(base), Some(&patch)).unwrap();
    let expected = (*store.defaults()).clone().merged(&flat(Some(1), Some(3)));
    assert_eq!(*effective, expected);
    assert_eq!(persistence.saved(), Some(expected));
}

#[test]
fn store_base_keeps_defaults_and_survives_reopen() {
    let persistence = std::sync::Arc::new(MemoryPersistence::default());
    let store = ConfigStore::open(Box::new(SharedPersistence(persistence.clone()))).unwrap();

    let effective = store.apply_layers(Some(flat(Some(40), None)), None).unwrap();
    assert_eq!(effective.toolbar.as_ref().unwrap().height_of_toolbar, Some(40));
    assert_eq!(
        effective.selected_schemas(),
        store.defaults().selected_schemas()
    );

    let reopened = ConfigStore::open(Box::new(SharedPersistence(persistence))).unwrap();
    assert_eq!(reopened.effective(), effective);
}

#[test]
fn store_failed_save_leaves_cache_unchanged() {
    let store = ConfigStore::open(Box::new(FailingPersistence)).unwrap();
    let before = store.effective();
    let err = store.update(&flat(Some(99), None)).unwrap_err();
    assert!(matches!(err, ConfigError::Persist(_)));
    assert_eq!(store.effective(), before);
}

#[test]
fn store_reset_to_defaults() {
    let store = ConfigStore::open(Box::new(MemoryPersistence::new(Some(flat(Some(7), None)))))
        .unwrap();
    store.reset_to_defaults().unwrap();
    assert_eq!(*store.effective(), *store.defaults());
}

#[test]
fn json_persistence_round_trip_and_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("configuration.json");
    let persistence = JsonFilePersistence::new(&path);
    assert!(persistence.load().unwrap().is_none());

    let c = default_configuration().unwrap();
    persistence.save(&c).unwrap();
    assert_eq!(persistence.load().unwrap(), Some(c));
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn corrupt_persisted_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("configuration.json");
    fs::write(&path, b"{ not json").unwrap();
    let store = ConfigStore::open(Box::new(JsonFilePersistence::new(&path))).unwrap();
    assert_eq!(*store.effective(), *store.defaults());
    // Opening never rewrites the persisted layer.
    assert_eq!(fs::read(&path).unwrap(), b"{ not json");
}

struct SharedPersistence(std::sync::Arc<MemoryPersistence>);

impl ConfigPersistence for SharedPersistence {
    fn load(&self) -> Result<Option<Configuration>, ConfigError> {
        self.0.load()
    }

    fn save(&self, configuration: &Configuration) -> Result<(), ConfigError> {
        self.0.save(configuration)
    }
}

// --- Properties ---

fn arb_toolbar() -> impl Strategy<Value = Option<ToolbarConfiguration>> {
    proptest::option::of(
        (
            proptest::option::of(0u32..200),
            proptest::option::of(0u32..200),
            proptest::option::of(any::<bool>()),
        )
            .prop_map(|(h, c, e)| ToolbarConfiguration {
                height_of_toolbar: h,
                height_of_coding_area: c,
                enable_toolbar: e,
                ..Default::default()
            }),
    )
}

fn arb_swipe() -> impl Strategy<Value = Option<SwipeConfiguration>> {
    proptest::option::of(
        (
            proptest::option::of(any::<bool>()),
            proptest::option::of(proptest::collection::btree_map(
                "[a-z][↑↓]",
                "[a-z#]{1,3}",
                0..5,
            )),
        )
            .prop_map(|(enable, symbols)| SwipeConfiguration {
                enable_keyboard_up_and_down_slide_symbol: enable,
                up_and_down_slide_symbols: symbols,
                ..Default::default()
            }),
    )
}

fn arb_configuration() -> impl Strategy<Value = Configuration> {
    (arb_toolbar(), arb_swipe()).prop_map(|(toolbar, swipe)| Configuration {
        toolbar,
        swipe,
        ..Default::default()
    })
}

proptest! {
    #[test]
    fn merge_is_idempotent(base in arb_configuration(), patch in arb_configuration()) {
        let once = base.merged(&patch);
        let twice = once.clone().merged(&patch);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merging_empty_patch_is_identity(base in arb_configuration()) {
        prop_assert_eq!(base.clone().merged(&Configuration::default()), base);
    }
}
