use base64::{engine::general_purpose, Engine as _};
use chrono::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} missing")]
    Missing(&'static str),
    #[error("{0} must be base64")]
    Encoding(&'static str),
    #[error("{0} must decode to at least 32 bytes")]
    KeyLength(&'static str),
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// How the role picked at login turns into session privileges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RolePolicy {
    /// Admin sessions only for accounts stored with the Admin role.
    Verified,
    /// The claimed role is granted unchecked. Known authorization gap, kept
    /// for parity with the legacy mobile client.
    Claimed,
}

impl RolePolicy {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "verified" => Ok(RolePolicy::Verified),
            "claimed" => Ok(RolePolicy::Claimed),
            other => Err(ConfigError::Invalid("ROLE_POLICY", other.to_string())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub session_key: Vec<u8>,
    pub bind_addr: String,
    pub role_policy: RolePolicy,
    pub session_ttl: Duration,
    pub reset_code_ttl: Duration,
    pub login_rate_limit: usize,
    pub login_rate_window_secs: u64,
    pub secure_cookies: bool,
    pub admin_seed: Option<AdminSeed>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());

        let key_b64 = lookup("SESSION_KEY").ok_or(ConfigError::Missing("SESSION_KEY"))?;
        let session_key = general_purpose::STANDARD
            .decode(key_b64.trim())
            .map_err(|_| ConfigError::Encoding("SESSION_KEY"))?;
        if session_key.len() < 32 {
            return Err(ConfigError::KeyLength("SESSION_KEY"));
        }

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| {
            let port = lookup("PORT").unwrap_or_else(|| "3000".to_string());
            format!("0.0.0.0:{}", port)
        });

        let role_policy = match lookup("ROLE_POLICY") {
            Some(raw) => RolePolicy::parse(&raw)?,
            None => RolePolicy::Verified,
        };

        let session_ttl_hours: i64 = parse_or(&lookup, "SESSION_TTL_HOURS", 24)?;
        let reset_ttl_minutes: i64 = parse_or(&lookup, "RESET_CODE_TTL_MINUTES", 15)?;
        let login_rate_limit: usize = parse_or(&lookup, "LOGIN_RATE_LIMIT", 5)?;
        let login_rate_window_secs: u64 = parse_or(&lookup, "LOGIN_RATE_WINDOW_SECS", 60)?;
        let secure_cookies: bool = parse_or(&lookup, "COOKIE_SECURE", false)?;

        let admin_seed = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                email,
                password,
                name: lookup("ADMIN_NAME").unwrap_or_else(|| "Admin".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            session_key,
            bind_addr,
            role_policy,
            session_ttl: Duration::hours(session_ttl_hours),
            reset_code_ttl: Duration::minutes(reset_ttl_minutes),
            login_rate_limit,
            login_rate_window_secs,
            secure_cookies,
            admin_seed,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn key_b64() -> String {
        general_purpose::STANDARD.encode([7u8; 32])
    }

    #[test]
    fn test_defaults() {
        let key = key_b64();
        let cfg = AppConfig::from_lookup(lookup_from(&[("SESSION_KEY", key.as_str())])).unwrap();
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000");
        assert_eq!(cfg.role_policy, RolePolicy::Verified);
        assert_eq!(cfg.session_ttl, Duration::hours(24));
        assert_eq!(cfg.login_rate_limit, 5);
        assert!(cfg.admin_seed.is_none());
    }

    #[test]
    fn test_session_key_required_and_long_enough() {
        assert!(matches!(
            AppConfig::from_lookup(lookup_from(&[])),
            Err(ConfigError::Missing("SESSION_KEY"))
        ));
        let short = general_purpose::STANDARD.encode([1u8; 8]);
        assert!(matches!(
            AppConfig::from_lookup(lookup_from(&[("SESSION_KEY", short.as_str())])),
            Err(ConfigError::KeyLength(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let key = key_b64();
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("SESSION_KEY", key.as_str()),
            ("PORT", "8080"),
            ("ROLE_POLICY", "claimed"),
            ("ADMIN_EMAIL", "boss@berc.org"),
            ("ADMIN_PASSWORD", "hunter22"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.role_policy, RolePolicy::Claimed);
        let seed = cfg.admin_seed.unwrap();
        assert_eq!(seed.name, "Admin");
    }

    #[test]
    fn test_bad_role_policy() {
        let key = key_b64();
        let res = AppConfig::from_lookup(lookup_from(&[
            ("SESSION_KEY", key.as_str()),
            ("ROLE_POLICY", "trust-me"),
        ]));
        assert!(matches!(res, Err(ConfigError::Invalid("ROLE_POLICY", _))));
    }
}
