/// Integration tests for loading configuration from disk
use backdrop::Config;
use backdrop::overlay::EasingFunction;
use std::fs;
use std::time::Duration;

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[general]
log_level = "debug"

[autoplay]
max_duration_secs = 8.0
settle_delay_ms = 250

[overlay]
fade_out_ms = 450
easing = "ease-out"
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.general.log_level, "debug");

    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(config.general.log_filter())
        .try_init();
    assert_eq!(config.general.log_filter(), log::LevelFilter::Debug);

    let playback = config.playback();
    assert_eq!(playback.max_autoplay_duration, Duration::from_secs(8));
    assert_eq!(playback.settle_delay, Duration::from_millis(250));
    assert_eq!(playback.progress_interval, Duration::from_millis(100));

    let overlay = config.overlay();
    assert_eq!(overlay.timing.fade_out, Duration::from_millis(450));
    assert_eq!(overlay.easing, EasingFunction::EaseOut);
    assert_eq!(overlay.cancel_button_size, 32.0);
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from_path(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.playback().max_autoplay_duration, Duration::from_secs(6));
}

#[test]
fn test_invalid_file_names_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[overlay]\neasing = \"bounce\"\n").unwrap();

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("config.toml"));
    assert!(format!("{:#}", err).contains("bounce"));
}

#[test]
fn test_malformed_toml_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[autoplay\nmax_duration_secs = ").unwrap();

    assert!(Config::load_from_path(&path).is_err());
}

#[test]
fn test_default_path_ends_in_backdrop() {
    if let Ok(path) = Config::default_config_path() {
        assert!(path.ends_with("backdrop/config.toml"));
    }
}
