use gshhs_binned::{Config, CorruptBinPolicy};
use std::path::PathBuf;

#[test]
fn test_config_from_toml() {
    let toml_str = r#"
fetch_threads = 4
corrupt_bins = "abort"
data_dir = "/opt/gshhs"
max_level = 2
"#;

    let config = Config::from_toml(toml_str).unwrap();
    assert_eq!(config.fetch_threads, 4);
    assert_eq!(config.corrupt_bins, CorruptBinPolicy::Abort);
    assert_eq!(config.data_dir, Some(PathBuf::from("/opt/gshhs")));
    assert_eq!((config.min_level, config.max_level), (0, 2));
}

#[test]
fn test_config_toml_defaults() {
    let config = Config::from_toml("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_toml_roundtrip() {
    let config = Config::default()
        .with_fetch_threads(16)
        .with_data_dir("/data")
        .with_level_range(1, 3);

    let toml_str = config.to_toml().unwrap();
    let loaded = Config::from_toml(&toml_str).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_toml_rejects_zero_threads() {
    assert!(Config::from_toml("fetch_threads = 0").is_err());
}
