use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub mail: MailConfig,
    pub port: u16,
    pub rust_log: String,
}

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub use_tls: bool,
    pub username: String,
    pub password: Option<String>,
    /// Address placed in the `From` header. Defaults to `username`.
    pub default_sender: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let username = require("MAIL_USERNAME")?;
        let mail = MailConfig {
            server: get("MAIL_SERVER").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            port: get("MAIL_PORT")
                .unwrap_or_else(|| "587".to_string())
                .parse::<u16>()
                .context("MAIL_PORT must be a valid port number")?,
            use_tls: match get("MAIL_USE_TLS") {
                Some(raw) => parse_flag(&raw).context("MAIL_USE_TLS must be a boolean")?,
                None => true,
            },
            password: get("MAIL_PASSWORD"),
            default_sender: get("MAIL_DEFAULT_SENDER").unwrap_or_else(|| username.clone()),
            username,
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            mail,
            port: get("PORT")
                .unwrap_or_else(|| "5000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => bail!("unrecognised flag value '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/hiring"),
            ("MAIL_USERNAME", "recruiting@example.com"),
        ]))
        .unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.mail.server, "smtp.gmail.com");
        assert_eq!(config.mail.port, 587);
        assert!(config.mail.use_tls);
        assert!(config.mail.password.is_none());
        assert_eq!(config.mail.default_sender, "recruiting@example.com");
    }

    #[test]
    fn test_missing_database_url_is_error() {
        let err = Config::from_lookup(lookup(&[("MAIL_USERNAME", "r@example.com")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/hiring"),
            ("MAIL_USERNAME", "  "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("MAIL_USERNAME"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/hiring"),
            ("MAIL_USERNAME", "bot@example.com"),
            ("MAIL_PASSWORD", "hunter2"),
            ("MAIL_SERVER", "mail.example.com"),
            ("MAIL_PORT", "2525"),
            ("MAIL_USE_TLS", "False"),
            ("MAIL_DEFAULT_SENDER", "Hiring <hiring@example.com>"),
            ("PORT", "9000"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.mail.server, "mail.example.com");
        assert_eq!(config.mail.port, 2525);
        assert!(!config.mail.use_tls);
        assert_eq!(config.mail.password.as_deref(), Some("hunter2"));
        assert_eq!(config.mail.default_sender, "Hiring <hiring@example.com>");
    }

    #[test]
    fn test_invalid_port_is_error() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/hiring"),
            ("MAIL_USERNAME", "bot@example.com"),
            ("MAIL_PORT", "smtp"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("MAIL_PORT"));
    }

    #[test]
    fn test_parse_flag_variants() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(parse_flag("1").unwrap());
        assert!(!parse_flag("no").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
