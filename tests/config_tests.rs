use std::collections::HashMap;
use std::time::Duration;

use clinic_audit::config::{Config, ConnectionMode, SslMode};

fn load(vars: &[(&str, &str)]) -> Result<Config, String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned())
}

const REQUIRED: [(&str, &str); 2] = [("DB_USER", "clinica"), ("DB_NAME", "clinica")];

#[test]
fn defaults_apply_when_only_required_values_are_set() {
    let config = load(&REQUIRED).unwrap();

    assert_eq!(config.port, 3000);
    assert_eq!(config.log_level, "info");
    assert_eq!(config.database.host, "localhost");
    assert_eq!(config.database.port, 3306);
    assert_eq!(config.database.password, "");
    assert_eq!(config.database.connection_limit, 10);
    assert_eq!(config.database.queue_limit, 0);
    assert_eq!(config.database.acquire_timeout, Duration::from_secs(10));
    assert_eq!(config.database.query_timeout, Duration::from_secs(60));
    assert_eq!(config.database.charset, "utf8mb4");
    assert_eq!(config.database.timezone, "+00:00");
    assert_eq!(config.database.tls.mode, SslMode::Preferred);
    assert_eq!(config.database.mode, ConnectionMode::Direct);
    assert_eq!(config.audit.table, "auditoria");
    assert_eq!(config.audit.max_attempts, 2);
    assert_eq!(config.audit.retry_delay, Duration::from_secs(1));
}

#[test]
fn missing_database_user_is_reported() {
    let err = load(&[("DB_NAME", "clinica")]).unwrap_err();
    assert_eq!(err, "Missing required environment variable: DB_USER");
}

#[test]
fn overrides_are_parsed() {
    let mut vars = REQUIRED.to_vec();
    vars.extend([
        ("DB_CONNECTION_MODE", "pooled"),
        ("DB_CONNECTION_LIMIT", "4"),
        ("DB_QUEUE_LIMIT", "8"),
        ("DB_SSL_MODE", "verify_ca"),
        ("DB_SSL_CA", "/etc/ssl/ca.pem"),
        ("AUDIT_TABLE", "audit_log"),
        ("AUDIT_MAX_ATTEMPTS", "3"),
        ("AUDIT_RETRY_DELAY_MS", "250"),
    ]);

    let config = load(&vars).unwrap();

    assert_eq!(config.database.mode, ConnectionMode::Pooled);
    assert_eq!(config.database.connection_limit, 4);
    assert_eq!(config.database.queue_limit, 8);
    assert_eq!(config.database.tls.mode, SslMode::VerifyCa);
    assert_eq!(
        config.database.tls.ca.as_deref(),
        Some(std::path::Path::new("/etc/ssl/ca.pem"))
    );
    assert_eq!(config.audit.table, "audit_log");
    assert_eq!(config.audit.max_attempts, 3);
    assert_eq!(config.audit.retry_delay, Duration::from_millis(250));
}

#[test]
fn invalid_values_name_the_variable() {
    let mut vars = REQUIRED.to_vec();
    vars.push(("DB_PORT", "not-a-port"));
    assert!(load(&vars).unwrap_err().starts_with("Invalid DB_PORT"));

    let mut vars = REQUIRED.to_vec();
    vars.push(("DB_CONNECTION_MODE", "cluster"));
    assert!(load(&vars).unwrap_err().starts_with("Invalid DB_CONNECTION_MODE"));

    let mut vars = REQUIRED.to_vec();
    vars.push(("DB_CONNECTION_LIMIT", "0"));
    assert!(load(&vars).unwrap_err().starts_with("Invalid DB_CONNECTION_LIMIT"));
}

#[test]
fn invalid_table_is_rejected_when_wiring_the_writer() {
    let mut vars = REQUIRED.to_vec();
    vars.push(("AUDIT_TABLE", "audit log"));
    let config = load(&vars).unwrap();

    let provider = std::sync::Arc::new(clinic_audit::db::mysql::DirectConnector::new(
        &config.database,
    ));
    assert!(clinic_audit::build_writer(provider, &config.audit).is_err());
}
