//! Integration tests for configuration loading

use park_admission::domain::types::{AttractionId, VisitorId};
use park_admission::infra::Config;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_config_from_file() {
    let temp_file = write_config(
        r#"
[site]
id = "test-park"

[metrics]
interval_secs = 15
prometheus_port = 9091

[ranking]
default_limit = 5

[[attractions]]
id = 10
name = "Coaster"
max_capacity = 24

[[attractions]]
id = 11
name = "Carousel"
max_capacity = 40

[[visitors]]
id = 7
name = "Ada"
surname = "Lovelace"
email = "ada@example.com"
"#,
    );

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.site_id(), "test-park");
    assert_eq!(config.metrics_interval_secs(), 15);
    assert_eq!(config.prometheus_port(), 9091);
    assert_eq!(config.ranking_default_limit(), Some(5));
    assert_eq!(config.attractions().len(), 2);
    assert_eq!(config.attractions()[1].id, AttractionId(11));
    assert_eq!(config.attractions()[1].max_capacity, 40);
    assert_eq!(config.visitors()[0].id, VisitorId(7));
    assert_eq!(config.visitors()[0].surname, "Lovelace");
}

#[test]
fn test_zero_capacity_rejected() {
    let temp_file = write_config(
        r#"
[[attractions]]
id = 1
name = "Closed Forever"
max_capacity = 0
"#,
    );

    let err = Config::from_file(temp_file.path()).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("max_capacity"), "{message}");
    assert!(message.contains("attraction_id 1"), "{message}");
}

#[test]
fn test_negative_capacity_is_parse_error() {
    let temp_file = write_config(
        r#"
[[attractions]]
id = 1
name = "Broken"
max_capacity = -3
"#,
    );

    assert!(Config::from_file(temp_file.path()).is_err());
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.site_id(), "park");
    assert_eq!(config.prometheus_port(), 9100);
    assert!(config.attractions().is_empty());
}

#[test]
fn test_bundled_config_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/park.toml");
    let config = Config::from_file(path).unwrap();
    assert_eq!(config.attractions().len(), 3);
    assert_eq!(config.visitors().len(), 3);
}
