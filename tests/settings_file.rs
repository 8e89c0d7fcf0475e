use fanvue_agency_hub_lib::settings::{self, DEFAULT_API_VERSION};
use std::collections::HashMap;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn file_then_env_then_bounds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("hub.toml");
    std::fs::write(
        &path,
        r#"
listen_addr = "0.0.0.0:8080"
api_key = "from-file"
dashboard_url = "https://hub.example.com"
fanout_batch_size = 500
page_delay_ms = 250
"#,
    )
    .expect("write settings");

    let mut loaded = settings::read_file(&path).expect("read settings");
    assert_eq!(loaded.listen_addr, "0.0.0.0:8080");
    assert_eq!(loaded.api_key.as_deref(), Some("from-file"));
    assert_eq!(loaded.api_version, DEFAULT_API_VERSION);

    settings::apply_env_overrides(
        &mut loaded,
        lookup(&[("FANVUE_API_KEY", " from-env "), ("HUB_LOG_DIR", "")]),
    );
    assert_eq!(loaded.api_key.as_deref(), Some("from-env"));
    assert!(loaded.log_dir.is_none());

    assert!(settings::sanitize(&mut loaded));
    assert_eq!(loaded.fanout_batch_size, 20);
    assert_eq!(loaded.page_delay_ms, 250);
}

#[test]
fn malformed_file_is_an_input_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "listen_addr = [").expect("write settings");

    let err = settings::read_file(&path).expect_err("invalid toml");
    assert_eq!(err.code(), "SEC_INVALID_INPUT");
}

#[test]
fn missing_file_is_a_system_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = settings::read_file(&dir.path().join("absent.toml")).expect_err("missing");
    assert_eq!(err.code(), "SYSTEM_ERROR");
}
