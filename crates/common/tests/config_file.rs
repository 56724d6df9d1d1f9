use std::io::Write;

use common::config::Config;

#[test]
fn loads_config_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[general]
log_level = "debug"
service_name = "history-staging"

[imitation]
enabled = true
lookup_distance = 4
prefix_length = 3
suffix_length = 4
"#
    )
    .unwrap();

    let config = Config::load_from(file.path()).unwrap();
    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.general.service_name, "history-staging");
    assert_eq!(config.imitation.lookup_distance, 4);
    assert_eq!(config.history.max_concurrent_enrichments, 10);
}

#[test]
fn missing_file_reports_path() {
    let err = Config::load_from("/nonexistent/history.toml").unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/history.toml"));
}
