use std::fs;
use tempfile::TempDir;

use vibe_core::config::{resolve_with_base, Config, EmbedBackend, IndexBackend, Settings};
use vibe_core::constants::{BOOST_STRENGTH, OVERFETCH_FACTOR};
use vibe_core::error::Error;
use vibe_core::types::ModalitySpec;

#[test]
fn missing_files_fall_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let settings = Config::load_in(tmp.path()).expect("load").settings().expect("settings");

    assert_eq!(settings.index.backend, IndexBackend::Memory);
    assert_eq!(settings.index.primary_modality, "visual");
    assert_eq!(settings.modality_names(), vec!["visual".to_string(), "audio".to_string()]);
    assert_eq!(settings.search.overfetch_factor, OVERFETCH_FACTOR);
    assert!((settings.search.boost_strength - BOOST_STRENGTH).abs() < f32::EPSILON);
}

#[test]
fn toml_overrides_nested_keys() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        r#"
[index]
backend = "lance"
table = "creatives"
primary_modality = "audio"
modalities = [{ name = "audio", dim = 8 }]

[search]
default_limit = 4

[embedding.backends]
audio = "hash"
"#,
    )
    .unwrap();

    let config = Config::load_in(tmp.path()).expect("load");
    let settings = config.settings().expect("settings");
    assert_eq!(settings.index.backend, IndexBackend::Lance);
    assert_eq!(settings.index.modalities, vec![ModalitySpec::new("audio", 8)]);
    assert_eq!(settings.search.default_limit, 4);
    assert_eq!(settings.embedding.backend_for("audio"), EmbedBackend::Hash);

    let table: String = config.get("index.table").expect("get");
    assert_eq!(table, "creatives");
}

#[test]
fn primary_modality_must_be_configured() {
    let mut s = Settings::default();
    s.index.primary_modality = "smell".into();
    assert!(matches!(s.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn clip_backend_is_visual_only() {
    let mut s = Settings::default();
    s.embedding.backends.insert("audio".into(), EmbedBackend::Clip);
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.embedding.backends.insert("visual".into(), EmbedBackend::Clip);
    assert!(s.validate().is_ok());
}

#[test]
fn duplicate_or_empty_modalities_are_rejected() {
    let mut s = Settings::default();
    s.index.modalities.push(ModalitySpec::new("visual", 512));
    assert!(s.validate().is_err());

    s.index.modalities.clear();
    assert!(s.validate().is_err());
}

#[test]
fn relative_paths_resolve_against_base() {
    let base = std::path::Path::new("/srv/vibe");
    assert_eq!(resolve_with_base(base, "data/lancedb"), base.join("data/lancedb"));
    assert_eq!(resolve_with_base(base, "/abs/db"), std::path::PathBuf::from("/abs/db"));
}
