//! Runtime configuration, loaded from the environment (and `.env`) at startup.

use std::time::Duration;

/// SMTP relay settings. Absent when `SMTP_SERVER` is not set, in which case
/// outgoing mail is written to the log instead.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// Postgres connection string, required.
    pub database_url: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Number of background jobs allowed to run at the same time.
    pub worker_count: usize,

    /// Period of the `notify_for_updates` sweep.
    pub notify_interval: Duration,

    /// Sender address for every outgoing email.
    pub mail_from: String,

    pub smtp: Option<SmtpConfig>,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults
    /// for everything except `DATABASE_URL`.
    pub fn from_env() -> anyhow::Result<Self> {
        // a missing .env file is fine, the variables may come from the process
        let _ = dotenvy::dotenv();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let smtp = match std::env::var("SMTP_SERVER") {
            Ok(server) => Some(SmtpConfig {
                server,
                port: parse_env("SMTP_PORT", 587),
                username: env_or("SMTP_USERNAME", ""),
                password: env_or("SMTP_PASSWORD", ""),
            }),
            Err(_) => None,
        };

        Ok(Self {
            bind_address: env_or("COURSELETS_BIND", "0.0.0.0:3000"),
            database_url,
            log_level: env_or("COURSELETS_LOG", "info"),
            log_json: std::env::var("COURSELETS_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            worker_count: parse_env("COURSELETS_WORKERS", 4).max(1),
            notify_interval: Duration::from_secs(parse_env(
                "COURSELETS_NOTIFY_INTERVAL_SECS",
                3600,
            )),
            mail_from: env_or("SMTP_FROM", "Courselets <noreply@courselets.org>"),
            smtp,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
