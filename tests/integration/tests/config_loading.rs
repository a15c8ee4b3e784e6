//! Config file loading through to a wired service graph.

use shoplens_cli::commands::serve::build_state;
use shoplens_core::config::DatabaseBackend;
use shoplens_core::{Config, ConfigError};
use shoplens_secrets::MasterKey;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_file_config_builds_working_state() {
    let key = MasterKey::generate().to_hex();
    let file = write_config(&format!(
        r#"{{
            // operator settings
            server: {{ port: 9100, allowed_origins: ["https://shop.example"] }},
            crypto: {{ encryption_key: "{key}" }},
            trial: {{ period_days: 14 }},
        }}"#
    ));

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.trial.period_days, 14);
    assert!(config.validate().is_ok());

    let state = build_state(&config).await.unwrap();
    assert_eq!(state.db.backend_name(), "memory");
    assert_eq!(state.settings.trial_gate().period_days(), 14);
}

#[test]
fn test_supabase_without_credentials_reports_every_problem() {
    let file = write_config(
        r#"{
            database: { backend: "supabase", supabase_url: "ftp://nope" },
            trial: { period_days: 0 },
        }"#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.database.backend, DatabaseBackend::Supabase);

    match config.validate() {
        Err(ConfigError::Validation(message)) => {
            assert!(message.contains("supabase_url"));
            assert!(message.contains("service_role_key"));
            assert!(message.contains("encryption key"));
            assert!(message.contains("Trial period"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::load(&dir.path().join("absent.json5"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[tokio::test]
async fn test_dev_mode_file_config_needs_no_key() {
    let file = write_config("{ crypto: { dev_mode: true } }");
    let config = Config::load(file.path()).unwrap();
    assert!(config.validate().is_ok());
    assert!(build_state(&config).await.is_ok());
}
