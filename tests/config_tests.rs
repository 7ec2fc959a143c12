// SPDX-License-Identifier: MPL-2.0

//! Integration tests for worker configuration

use cardscan_worker::{WorkerConfig, WorkerError};
use std::path::PathBuf;

fn temp_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "cardscan-{}-{}.json",
        name,
        std::process::id()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_config_default() {
    let config = WorkerConfig::default();
    assert!(!config.print_timing, "Timing logs should be off by default");
    assert_eq!(config.min_image_edge, 600);
    assert_eq!(config.warm_up_image_size, 480);
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_from_file() {
    let path = temp_config("load", r#"{ "print_timing": true, "min_image_edge": 720 }"#);
    let config = WorkerConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert!(config.print_timing);
    assert_eq!(config.min_image_edge, 720);
    assert_eq!(config.callback_thread_name, "ml-callbacks");
}

#[test]
fn test_load_rejects_invalid_file() {
    let path = temp_config("invalid", r#"{ "warm_up_image_size": 0 }"#);
    let result = WorkerConfig::load(&path);
    std::fs::remove_file(&path).ok();

    assert!(matches!(result, Err(WorkerError::Config(_))));
}

#[test]
fn test_missing_file_is_an_error() {
    let path = std::env::temp_dir().join("cardscan-does-not-exist.json");
    assert!(WorkerConfig::load(&path).is_err());
}

#[test]
fn test_default_path_is_under_config_dir() {
    if let Some(path) = WorkerConfig::default_path() {
        assert!(path.ends_with("cardscan/worker.json"));
    }
}
