use std::{
    collections::HashMap,
    env,
    sync::atomic::{AtomicUsize, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use super::*;

fn no_env(_: &str) -> Option<String> {
    None
}

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

fn temp_settings_file(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let n = NEXT_DIR.fetch_add(1, Ordering::Relaxed);
    let dir = env::temp_dir().join(format!("album_browser_settings_test_{suffix}_{n}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(SETTINGS_FILE);
    fs::write(&path, contents).expect("write settings");
    path
}

#[test]
fn missing_file_yields_defaults() {
    let settings =
        load_settings_from(Path::new("/definitely/not/here/album_browser.toml"), no_env)
            .expect("defaults");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.batch_limit, 30);
    assert_eq!(settings.fetch_mode(), FetchMode::Sequential);
}

#[test]
fn file_values_override_defaults() {
    let path = temp_settings_file(
        r#"
catalog_url = "http://127.0.0.1:9000/photos"
batch_limit = 12
fetch_mode = "concurrent"
max_in_flight = 4
"#,
    );

    let settings = load_settings_from(&path, no_env).expect("settings");

    assert_eq!(settings.catalog_url.as_str(), "http://127.0.0.1:9000/photos");
    assert_eq!(settings.batch_limit, 12);
    assert_eq!(
        settings.fetch_mode(),
        FetchMode::bounded(NonZeroUsize::new(4).expect("non-zero"))
    );

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn environment_overrides_file() {
    let path = temp_settings_file("fetch_mode = \"concurrent\"\nbatch_limit = 12\n");
    let vars: HashMap<&str, &str> = HashMap::from([
        ("APP__FETCH_MODE", "sequential"),
        ("APP__REQUEST_TIMEOUT_MS", "2500"),
    ]);

    let settings =
        load_settings_from(&path, |key| vars.get(key).map(|v| v.to_string())).expect("settings");

    assert_eq!(settings.fetch_mode(), FetchMode::Sequential);
    assert_eq!(settings.batch_limit, 12);
    assert_eq!(settings.request_timeout, Duration::from_millis(2500));

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn zero_max_in_flight_means_unbounded() {
    let mut settings = Settings::default();
    settings.apply("fetch_mode", "Concurrent");
    settings.apply("max_in_flight", "0");
    assert_eq!(settings.fetch_mode(), FetchMode::unbounded());
}

#[test]
fn invalid_values_are_ignored() {
    let mut settings = Settings::default();
    settings.apply("batch_limit", "thirty");
    settings.apply("fetch_mode", "parallel-ish");
    settings.apply("catalog_url", "not a url");
    settings.apply("colour", "blue");
    assert_eq!(settings, Settings::default());
}

#[test]
fn malformed_file_is_an_error() {
    let path = temp_settings_file("batch_limit = = 3");

    let err = load_settings_from(&path, no_env).expect_err("parse failure");
    assert!(err.to_string().contains("failed to parse settings file"));

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}
