//! Process settings read from the environment (after `.env` is loaded by the binary).

use crate::config::validator::RESERVED_PATHS;
use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size bounds for paginated lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationSettings {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        PaginationSettings {
            default_size: DEFAULT_PAGE_SIZE,
            max_size: MAX_PAGE_SIZE,
        }
    }
}

/// HTTP surface settings used when composing the application router.
#[derive(Clone, Debug)]
pub struct HttpSettings {
    pub bind_addr: SocketAddr,
    /// Prefix every entity router is nested under, e.g. "/api/v1". Empty mounts at the root.
    pub api_prefix: String,
    pub cors_allowed_origins: Vec<String>,
    pub body_limit_bytes: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            api_prefix: String::new(),
            cors_allowed_origins: vec!["http://localhost:8000".to_string()],
            body_limit_bytes: 1024 * 1024,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    pub entities_path: PathBuf,
    pub pagination: PaginationSettings,
    pub http: HttpSettings,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;
        let defaults = HttpSettings::default();
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5u32)?;
        let bind_addr = parse_or(&lookup, "BIND_ADDR", defaults.bind_addr)?;
        let entities_path = lookup("ENTITIES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("entities.json"));
        let api_prefix = normalize_prefix(lookup("API_PREFIX").unwrap_or_default())?;
        let pagination = PaginationSettings {
            default_size: parse_or(&lookup, "PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            max_size: parse_or(&lookup, "MAX_PAGE_SIZE", MAX_PAGE_SIZE)?,
        };
        if pagination.max_size == 0 {
            return Err(ConfigError::InvalidEnv {
                key: "MAX_PAGE_SIZE",
                message: "must be at least 1".into(),
            });
        }
        if pagination.default_size == 0 || pagination.default_size > pagination.max_size {
            return Err(ConfigError::InvalidEnv {
                key: "PAGE_SIZE",
                message: format!("must be between 1 and {}", pagination.max_size),
            });
        }
        let cors_allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => defaults.cors_allowed_origins,
        };
        let body_limit_bytes = parse_or(&lookup, "BODY_LIMIT_BYTES", defaults.body_limit_bytes)?;

        Ok(Settings {
            database_url,
            max_connections,
            entities_path,
            pagination,
            http: HttpSettings {
                bind_addr,
                api_prefix,
                cors_allowed_origins,
                body_limit_bytes,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnv {
            key,
            message: e.to_string(),
        }),
    }
}

/// Leading slash added, trailing slash dropped. Each segment must be a literal route
/// segment, and the prefix must not shadow a common route.
fn normalize_prefix(raw: String) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    let invalid = |message: String| ConfigError::InvalidEnv {
        key: "API_PREFIX",
        message,
    };
    for segment in trimmed.split('/') {
        if segment.is_empty() {
            return Err(invalid("empty path segment".into()));
        }
        let literal = segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'));
        if !literal {
            return Err(invalid(format!("segment '{}' must be letters, digits, '-', '_', '.' or '~'", segment)));
        }
    }
    if RESERVED_PATHS.contains(&trimmed) {
        return Err(invalid(format!("'/{}' is a common route", trimmed)));
    }
    Ok(format!("/{}", trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_apply() {
        let s = settings(&[("DATABASE_URL", "postgres://localhost/app")]).unwrap();
        assert_eq!(s.max_connections, 5);
        assert_eq!(s.pagination, PaginationSettings::default());
        assert_eq!(s.http.cors_allowed_origins, vec!["http://localhost:8000".to_string()]);
        assert_eq!(s.http.api_prefix, "");
        assert_eq!(s.http.bind_addr.port(), 3000);
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(settings(&[]), Err(ConfigError::MissingEnv("DATABASE_URL"))));
    }

    #[test]
    fn page_size_must_fit_maximum() {
        let err = settings(&[("DATABASE_URL", "x"), ("PAGE_SIZE", "50"), ("MAX_PAGE_SIZE", "20")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: "PAGE_SIZE", .. }));
    }

    #[test]
    fn invalid_number_names_key() {
        let err = settings(&[("DATABASE_URL", "x"), ("MAX_PAGE_SIZE", "lots")]).unwrap_err();
        assert!(err.to_string().contains("MAX_PAGE_SIZE"));
    }

    #[test]
    fn prefix_and_origins_are_normalized() {
        let s = settings(&[
            ("DATABASE_URL", "x"),
            ("API_PREFIX", "api/v1/"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
        ])
        .unwrap();
        assert_eq!(s.http.api_prefix, "/api/v1");
        assert_eq!(s.http.cors_allowed_origins.len(), 2);
    }

    #[test]
    fn prefix_must_be_literal_segments() {
        for raw in ["/api/:version", "/api/*rest", "/api//v1", "/{id}", "/a b"] {
            let err = settings(&[("DATABASE_URL", "x"), ("API_PREFIX", raw)]).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEnv { key: "API_PREFIX", .. }), "{raw}");
        }
    }

    #[test]
    fn prefix_cannot_shadow_common_routes() {
        for raw in ["/health", "ready/", "/openapi.json"] {
            let err = settings(&[("DATABASE_URL", "x"), ("API_PREFIX", raw)]).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEnv { key: "API_PREFIX", .. }), "{raw}");
        }
        let s = settings(&[("DATABASE_URL", "x"), ("API_PREFIX", "/health-api")]).unwrap();
        assert_eq!(s.http.api_prefix, "/health-api");
        let s = settings(&[("DATABASE_URL", "x"), ("API_PREFIX", "/")]).unwrap();
        assert_eq!(s.http.api_prefix, "");
    }
}
