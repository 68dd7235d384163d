use std::io::Write;

use nexus_viewer::catalog::Catalog;
use nexus_viewer::config::{AppSettings, PreviewBackend, SettingsError};

#[test]
fn test_load_explicit_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[window]
title = "Nexus Dev"

[preview]
backend = "software"
slow_frame_ms = 33

[logging]
level = "debug"
"#
    )
    .unwrap();

    let settings = AppSettings::load(Some(file.path())).unwrap();
    assert_eq!(settings.window.title, "Nexus Dev");
    assert_eq!(settings.preview.backend, PreviewBackend::Software);
    assert_eq!(settings.preview.slow_frame_ms, 33);
    assert_eq!(settings.logging.level, "debug");
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppSettings::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, SettingsError::Config(_)));
}

#[test]
fn test_catalog_from_file_and_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.toml");
    std::fs::write(
        &path,
        r#"
[[experiences]]
id = "1"
title = "Only One"
creator = "Solo"
creator_avatar_url = ""
thumbnail_url = ""
player_count = 3
genre = "Racing"
description = ""
"#,
    )
    .unwrap();

    let custom = Catalog::load_or_builtin(Some(&path)).unwrap();
    assert_eq!(custom.experiences().len(), 1);

    let builtin = Catalog::load_or_builtin(None).unwrap();
    assert_eq!(builtin.experiences().len(), 24);
}
