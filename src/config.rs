/*
 * Responsibility
 * - Load settings from the environment (.env supported): DATABASE_URL, CORS, auth authority
 * - Validate values (startup fails when something required is missing)
 * - Derive issuer / JWKS URL from AUTH_DOMAIN
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub auth_issuer: String,
    pub auth_enforce_issuer: bool,
    pub api_audience: String,
    pub algorithms: Vec<Algorithm>,
    pub access_token_leeway_seconds: u64,

    pub jwks_url: Url,
    pub jwks_cache_ttl_seconds: u64,
    pub jwks_min_refresh_seconds: u64,
    pub jwks_fetch_timeout_seconds: u64,
    pub jwks_fetch_retries: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let number = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(key) {
                Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
                None => Ok(default),
            }
        };

        let port = number("PORT", 3000)?;
        let port = u16::try_from(port).map_err(|_| ConfigError::Invalid("PORT"))?;
        let addr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url = required("DATABASE_URL")?;
        let database_max_connections = u32::try_from(number("DATABASE_MAX_CONNECTIONS", 5)?)
            .map_err(|_| ConfigError::Invalid("DATABASE_MAX_CONNECTIONS"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let auth_domain = required("AUTH_DOMAIN")?;
        let authority = authority_base_url(&auth_domain)?;

        let auth_issuer = match lookup("AUTH_ISSUER").filter(|v| !v.trim().is_empty()) {
            Some(issuer) => issuer.trim().to_string(),
            None => authority.to_string(),
        };

        let auth_enforce_issuer = match lookup("AUTH_ENFORCE_ISSUER") {
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid("AUTH_ENFORCE_ISSUER"))?,
            None => true,
        };

        let api_audience = required("API_AUDIENCE")?;

        let algorithms = parse_algorithms(lookup("ALGORITHMS").as_deref().unwrap_or("RS256"))?;

        let access_token_leeway_seconds = number("ACCESS_TOKEN_LEEWAY_SECONDS", 0)?;

        let jwks_url = match lookup("JWKS_URL").filter(|v| !v.trim().is_empty()) {
            Some(raw) => Url::parse(raw.trim()).map_err(|_| ConfigError::Invalid("JWKS_URL"))?,
            None => authority
                .join(".well-known/jwks.json")
                .map_err(|_| ConfigError::Invalid("AUTH_DOMAIN"))?,
        };

        let jwks_cache_ttl_seconds = number("JWKS_CACHE_TTL_SECONDS", 600)?;
        let jwks_min_refresh_seconds = number("JWKS_MIN_REFRESH_SECONDS", 30)?;
        let jwks_fetch_timeout_seconds = number("JWKS_FETCH_TIMEOUT_SECONDS", 5)?;
        if jwks_fetch_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("JWKS_FETCH_TIMEOUT_SECONDS"));
        }
        let jwks_fetch_retries = u32::try_from(number("JWKS_FETCH_RETRIES", 1)?)
            .map_err(|_| ConfigError::Invalid("JWKS_FETCH_RETRIES"))?;

        Ok(Self {
            addr,
            database_url,
            database_max_connections,
            app_env,
            cors_allowed_origins,
            auth_issuer,
            auth_enforce_issuer,
            api_audience,
            algorithms,
            access_token_leeway_seconds,
            jwks_url,
            jwks_cache_ttl_seconds,
            jwks_min_refresh_seconds,
            jwks_fetch_timeout_seconds,
            jwks_fetch_retries,
        })
    }
}

// `tenant.auth0.com` -> `https://tenant.auth0.com/`; explicit schemes are kept.
fn authority_base_url(domain: &str) -> Result<Url, ConfigError> {
    let raw = if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    };

    let mut url = Url::parse(&raw).map_err(|_| ConfigError::Invalid("AUTH_DOMAIN"))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_algorithms(raw: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let algorithms = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Algorithm::from_str(s).map_err(|_| ConfigError::Invalid("ALGORITHMS")))
        .collect::<Result<Vec<_>, _>>()?;

    if algorithms.is_empty() {
        return Err(ConfigError::Invalid("ALGORITHMS"));
    }
    Ok(algorithms)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
