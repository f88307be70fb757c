//! Server configuration, read once from the environment at startup.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use auth::{AuthConfig, AuthError};
use thiserror::Error;

const MIB: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid BIND_ADDR {0:?}")]
    BindAddr(String),

    #[error("invalid SESSION_TTL_SECS or INVITE_TTL_SECS: {0}")]
    Lifetime(#[from] AuthError),
}

/// Requests allowed per client address per window, by route class.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub window: Duration,
    /// Login, registration and invite endpoints. Successful responses are
    /// not counted.
    pub auth: u32,
    pub upload: u32,
    pub api: u32,
    /// Public tour viewing.
    pub public: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: Duration::from_secs(60),
            auth: 5,
            upload: 10,
            api: 100,
            public: 200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Snapshot file; the store is memory-only when unset.
    pub data_file: Option<PathBuf>,
    pub upload_dir: PathBuf,
    /// Base URL of the admin client, used to build invite links.
    pub base_url: String,
    /// Allowed CORS origin; any origin when unset.
    pub cors_origin: Option<String>,
    pub cookie_secure: bool,
    pub auth: AuthConfig,
    /// Interval of the expired-session sweep; no sweep when unset.
    pub session_sweep: Option<Duration>,
    pub max_json_bytes: usize,
    pub rate_limits: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3001),
            data_file: None,
            upload_dir: PathBuf::from("uploads"),
            base_url: "http://localhost:5173".to_string(),
            cors_origin: None,
            cookie_secure: false,
            auth: AuthConfig::default(),
            session_sweep: None,
            max_json_bytes: 10 * MIB,
            rate_limits: RateLimitConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let defaults_auth = AuthConfig::default();
        let defaults_limits = RateLimitConfig::default();

        let bind = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());
        let ip: IpAddr = bind.parse().map_err(|_| ConfigError::BindAddr(bind.clone()))?;
        let port = env_var_u16("PORT", defaults.addr.port());

        let auth = AuthConfig {
            session_lifetime_secs: env_var_u64(
                "SESSION_TTL_SECS",
                defaults_auth.session_lifetime_secs,
            ),
            invite_lifetime_secs: env_var_u64(
                "INVITE_TTL_SECS",
                defaults_auth.invite_lifetime_secs,
            ),
        };
        auth.validate()?;

        Ok(Self {
            addr: SocketAddr::new(ip, port),
            data_file: env::var("DATA_FILE").ok().map(PathBuf::from),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            base_url: env::var("BASE_URL").unwrap_or(defaults.base_url),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty()),
            cookie_secure: env_var_bool("COOKIE_SECURE", defaults.cookie_secure),
            auth,
            session_sweep: env::var("SESSION_SWEEP_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            max_json_bytes: env_var_usize("MAX_JSON_BYTES", defaults.max_json_bytes),
            rate_limits: RateLimitConfig {
                enabled: env_var_bool("RATE_LIMIT_ENABLED", defaults_limits.enabled),
                window: Duration::from_secs(env_var_u64(
                    "RATE_LIMIT_WINDOW_SECS",
                    defaults_limits.window.as_secs(),
                )),
                auth: env_var_u32("RATE_LIMIT_AUTH", defaults_limits.auth),
                upload: env_var_u32("RATE_LIMIT_UPLOAD", defaults_limits.upload),
                api: env_var_u32("RATE_LIMIT_API", defaults_limits.api),
                public: env_var_u32("RATE_LIMIT_PUBLIC", defaults_limits.public),
            },
        })
    }
}

fn env_var_u16(key: &str, default: u16) -> u16 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_bool(key: &str, default: bool) -> bool {
    match env::var(key).ok().as_deref().map(str::trim) {
        Some("1") | Some("true") | Some("yes") | Some("on") => true,
        Some("0") | Some("false") | Some("no") | Some("off") => false,
        _ => default,
    }
}
