use anyhow::Context;
use dotenvy::dotenv;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_AUTH_SERVICE_URL: &str = "http://auth-service:3001";

/// How the intake pipeline treats the authorization step.
///
/// Parsed once at startup and handed to the orchestrator; every non-`Required`
/// admission is written to the `audit` log target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationMode {
    /// Every payment must be approved; an unreachable authority aborts the request.
    #[default]
    Required,
    /// Denials abort, but an unreachable authority admits the payment as `pending`.
    SoftFail,
    /// The authorization call is skipped entirely. Refused in production.
    Bypass,
}

impl AuthorizationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationMode::Required => "required",
            AuthorizationMode::SoftFail => "soft_fail",
            AuthorizationMode::Bypass => "bypass",
        }
    }
}

impl fmt::Display for AuthorizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthorizationMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "required" => Ok(AuthorizationMode::Required),
            "soft_fail" | "soft-fail" => Ok(AuthorizationMode::SoftFail),
            "bypass" => Ok(AuthorizationMode::Bypass),
            other => anyhow::bail!(
                "AUTHORIZATION_MODE must be one of required, soft_fail, bypass (got '{}')",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" | "test" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => anyhow::bail!("APP_ENV must be development or production (got '{}')", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub environment: Environment,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub database_acquire_timeout_secs: u64,
    pub auth_service_url: String,
    pub auth_timeout_secs: u64,
    pub auth_circuit_failure_threshold: u32,
    pub auth_circuit_reset_secs: u64,
    pub authorization_mode: AuthorizationMode,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds and validates a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config {
            server_port: parse_or(&lookup, "SERVER_PORT", 3000)?,
            environment: parse_or(&lookup, "APP_ENV", Environment::Development)?,
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            database_acquire_timeout_secs: parse_or(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?,
            auth_service_url: lookup("AUTH_SERVICE_URL")
                .unwrap_or_else(|| DEFAULT_AUTH_SERVICE_URL.to_string()),
            auth_timeout_secs: parse_or(&lookup, "AUTH_TIMEOUT_SECS", 10)?,
            auth_circuit_failure_threshold: parse_or(&lookup, "AUTH_CIRCUIT_FAILURE_THRESHOLD", 3)?,
            auth_circuit_reset_secs: parse_or(&lookup, "AUTH_CIRCUIT_RESET_SECS", 60)?,
            authorization_mode: parse_or(&lookup, "AUTHORIZATION_MODE", AuthorizationMode::Required)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.environment == Environment::Production {
            if self.authorization_mode == AuthorizationMode::Bypass {
                anyhow::bail!("AUTHORIZATION_MODE=bypass is not allowed when APP_ENV=production");
            }
            if self.database_url.is_none() {
                anyhow::bail!("DATABASE_URL is required when APP_ENV=production");
            }
        }

        reqwest::Url::parse(&self.auth_service_url)
            .with_context(|| format!("AUTH_SERVICE_URL is not a valid URL: {}", self.auth_service_url))?;

        if self.auth_circuit_failure_threshold == 0 {
            anyhow::bail!("AUTH_CIRCUIT_FAILURE_THRESHOLD must be at least 1");
        }

        if self.auth_circuit_reset_secs == 0 {
            anyhow::bail!("AUTH_CIRCUIT_RESET_SECS must be at least 1");
        }

        Ok(())
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }

    pub fn database_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.database_acquire_timeout_secs)
    }

    /// Database URL with any password replaced, for logs and the `config` command.
    pub fn redacted_database_url(&self) -> Option<String> {
        self.database_url.as_deref().map(redact_url_password)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value for {}: {}", key, e)),
        _ => Ok(default),
    }
}

fn redact_url_password(raw: &str) -> String {
    match reqwest::Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("****"));
            url.to_string()
        }
        Ok(url) => url.to_string(),
        Err(_) => "****".to_string(),
    }
}
