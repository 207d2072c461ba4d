use std::fs;

use repowalk::config::ConfigLoader;
use repowalk::tooling::cli::CliContext;
use repowalk::{ConfigError, WalkError};
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("repowalk.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn explicit_file_feeds_the_walker() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        [throttle]
        permits_per_second = 20.0

        [client]
        endpoint = "https://ghe.example.com/api/v3"
        timeout_secs = 5
        "#,
    );

    let config = ConfigLoader::load_with_file(&path).unwrap();
    assert_eq!(config.throttle.permits_per_second, 20.0);
    assert_eq!(config.client.timeout_secs, 5);

    let context = CliContext::new(
        "walker://octo/hello?access_token=secret&concurrent=1&max_in_flight=4",
        config,
    )
    .unwrap();
    assert!(context.walker().options().concurrent);
    assert_eq!(context.walker().options().max_in_flight, Some(4));
    assert_eq!(context.config().client.endpoint, "https://ghe.example.com/api/v3");
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(matches!(
        ConfigLoader::load_with_file(&missing),
        Err(ConfigError::Settings(_))
    ));
}

#[test]
fn non_positive_rate_is_rejected_before_walking() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[throttle]\npermits_per_second = 0.0\n");
    let config = ConfigLoader::load_with_file(&path).unwrap();

    let result = CliContext::new("walker://octo/hello?access_token=secret", config);
    assert!(matches!(result, Err(WalkError::Config(_))));
}

#[test]
fn uri_errors_surface_as_config_errors() {
    let cases = [
        ("walker://octo/hello", "missing token"),
        ("walker://octo/a/b?access_token=t", "nested repository"),
        ("walker://octo/?access_token=t", "empty repository"),
        ("walker://octo/hello?access_token=t&concurrent=maybe", "bad boolean"),
        ("walker://octo/hello?access_token=t&wait-on-reset=yes", "bad boolean"),
        ("not a uri", "unparsable"),
    ];
    for (uri, label) in cases {
        let result = CliContext::new(uri, ConfigLoader::default());
        assert!(
            matches!(result, Err(WalkError::Config(_))),
            "expected config error for {}",
            label
        );
    }
}

#[test]
fn token_is_not_echoed_in_errors() {
    let err = match CliContext::new(
        "walker://octo/hello?access_token=s3cr3t&concurrent=maybe",
        ConfigLoader::default(),
    ) {
        Err(err) => err,
        Ok(_) => panic!("expected an invalid boolean"),
    };
    assert!(!err.to_string().contains("s3cr3t"));
}
