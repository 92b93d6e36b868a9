use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub audit: AuditConfig,
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub connection_limit: u32,
    pub queue_limit: usize,
    pub acquire_timeout: Duration,
    pub query_timeout: Duration,
    pub idle_timeout: Duration,
    pub charset: String,
    pub timezone: String,
    pub tls: TlsConfig,
    pub mode: ConnectionMode,
}

#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    pub mode: SslMode,
    pub ca: Option<PathBuf>,
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum SslMode {
    Disabled,
    #[default]
    Preferred,
    Required,
    VerifyCa,
    VerifyIdentity,
}

/// How the gateway obtains connections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectionMode {
    /// A brand new connection per attempt, closed afterwards.
    Direct,
    /// Connections borrowed from a bounded pool and handed back afterwards.
    Pooled,
}

#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub table: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let host: IpAddr = env
            .or("CLINIC_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid CLINIC_HOST: {e}"))?;

        let port: u16 = env.parsed("CLINIC_PORT", "3000")?;
        let log_level = env.or("CLINIC_LOG_LEVEL", "info");

        let tls = TlsConfig {
            mode: match env.or("DB_SSL_MODE", "preferred").as_str() {
                "disabled" => SslMode::Disabled,
                "preferred" => SslMode::Preferred,
                "required" => SslMode::Required,
                "verify_ca" => SslMode::VerifyCa,
                "verify_identity" => SslMode::VerifyIdentity,
                other => return Err(format!("Invalid DB_SSL_MODE: unknown mode '{other}'")),
            },
            ca: env.optional("DB_SSL_CA").map(PathBuf::from),
            cert: env.optional("DB_SSL_CERT").map(PathBuf::from),
            key: env.optional("DB_SSL_KEY").map(PathBuf::from),
        };

        let mode = match env.or("DB_CONNECTION_MODE", "direct").as_str() {
            "direct" => ConnectionMode::Direct,
            "pooled" => ConnectionMode::Pooled,
            other => {
                return Err(format!(
                    "Invalid DB_CONNECTION_MODE: expected 'direct' or 'pooled', got '{other}'"
                ));
            }
        };

        let connection_limit: u32 = env.parsed("DB_CONNECTION_LIMIT", "10")?;
        if connection_limit == 0 {
            return Err("Invalid DB_CONNECTION_LIMIT: must be at least 1".to_string());
        }

        let database = DatabaseConfig {
            host: env.or("DB_HOST", "localhost"),
            port: env.parsed("DB_PORT", "3306")?,
            user: env.required("DB_USER")?,
            password: env.or("DB_PASSWORD", ""),
            database: env.required("DB_NAME")?,
            connection_limit,
            queue_limit: env.parsed("DB_QUEUE_LIMIT", "0")?,
            acquire_timeout: env.millis("DB_ACQUIRE_TIMEOUT_MS", "10000")?,
            query_timeout: env.millis("DB_QUERY_TIMEOUT_MS", "60000")?,
            idle_timeout: env.millis("DB_IDLE_TIMEOUT_MS", "60000")?,
            charset: env.or("DB_CHARSET", "utf8mb4"),
            timezone: env.or("DB_TIMEZONE", "+00:00"),
            tls,
            mode,
        };

        let audit = AuditConfig {
            table: env.or("AUDIT_TABLE", "auditoria"),
            max_attempts: env.parsed("AUDIT_MAX_ATTEMPTS", "2")?,
            retry_delay: env.millis("AUDIT_RETRY_DELAY_MS", "1000")?,
        };

        Ok(Config {
            database,
            audit,
            host,
            port,
            log_level,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, String> {
        self.optional(key)
            .ok_or_else(|| format!("Missing required environment variable: {key}"))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, String>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or(key, default)
            .trim()
            .parse()
            .map_err(|e| format!("Invalid {key}: {e}"))
    }

    fn millis(&self, key: &str, default: &str) -> Result<Duration, String> {
        self.parsed::<u64>(key, default).map(Duration::from_millis)
    }
}
