//! Process-wide settings read once from the environment.
//!
//! [`Settings::from_env`] never fails. A missing variable takes its default;
//! a malformed numeric or boolean value is logged and replaced by its
//! default. The value is immutable and shared explicitly (`Arc<Settings>` or
//! `web::Data<Settings>`).

use std::path::PathBuf;
use std::str::FromStr;

use mockable::Env;
use tracing::warn;

mod cors;
mod database_url;

pub use cors::{allowed_hosts, parse_cors_origins};
pub use database_url::normalise_database_url;

/// JWT secret shipped as a placeholder; running with it is insecure.
pub const INSECURE_JWT_SECRET: &str = "your-super-secret-jwt-key-change-this-in-production";

const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|on|off|y|n";

/// Immutable runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_v1_str: String,
    pub project_name: String,
    pub project_version: String,
    pub debug: bool,
    pub railway_environment: Option<String>,
    pub port: u16,

    pub database_url: Option<String>,
    pub database_host: String,
    pub database_port: u16,
    pub database_name: String,
    pub database_user: String,
    pub database_password: String,

    pub jwt_secret_key: String,
    pub jwt_algorithm: String,
    pub jwt_access_token_expire_minutes: u32,
    pub jwt_refresh_token_expire_days: u32,

    pub backend_cors_origins: String,
    pub redis_url: String,
    pub max_file_size_mb: u32,
    pub upload_dir: PathBuf,
    pub log_level: String,
    pub log_format: String,
    pub rate_limit_per_minute: u32,
    /// Seconds between WebSocket heartbeats.
    pub websocket_heartbeat_interval: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_v1_str: "/api/v1".into(),
            project_name: "PentryPal API".into(),
            project_version: "1.0.0".into(),
            debug: false,
            railway_environment: None,
            port: 8000,
            database_url: None,
            database_host: "localhost".into(),
            database_port: 5432,
            database_name: "pentrypal_db".into(),
            database_user: "postgres".into(),
            database_password: "password".into(),
            jwt_secret_key: INSECURE_JWT_SECRET.into(),
            jwt_algorithm: "HS256".into(),
            jwt_access_token_expire_minutes: 30,
            jwt_refresh_token_expire_days: 7,
            backend_cors_origins: "*".into(),
            redis_url: "redis://localhost:6379/0".into(),
            max_file_size_mb: 10,
            upload_dir: PathBuf::from("uploads/"),
            log_level: "INFO".into(),
            log_format: "json".into(),
            rate_limit_per_minute: 60,
            websocket_heartbeat_interval: 30,
        }
    }
}

impl Settings {
    /// Read every setting from `env`, falling back to defaults.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mockable::MockEnv;
    /// use pantry_backend::settings::Settings;
    ///
    /// let mut env = MockEnv::new();
    /// env.expect_string().returning(|name| match name {
    ///     "PORT" => Some("9000".to_string()),
    ///     _ => None,
    /// });
    /// let settings = Settings::from_env(&env);
    /// assert_eq!(settings.port, 9000);
    /// assert_eq!(settings.api_v1_str, "/api/v1");
    /// ```
    pub fn from_env<E: Env>(env: &E) -> Self {
        let defaults = Self::default();
        let reader = EnvReader { env };
        let settings = Self {
            api_v1_str: reader.text("API_V1_STR", defaults.api_v1_str),
            project_name: reader.text("PROJECT_NAME", defaults.project_name),
            project_version: reader.text("PROJECT_VERSION", defaults.project_version),
            debug: reader.flag("DEBUG", defaults.debug),
            railway_environment: reader.optional("RAILWAY_ENVIRONMENT"),
            port: reader.number("PORT", defaults.port),
            database_url: reader.optional("DATABASE_URL"),
            database_host: reader.text("DATABASE_HOST", defaults.database_host),
            database_port: reader.number("DATABASE_PORT", defaults.database_port),
            database_name: reader.text("DATABASE_NAME", defaults.database_name),
            database_user: reader.text("DATABASE_USER", defaults.database_user),
            database_password: reader.text("DATABASE_PASSWORD", defaults.database_password),
            jwt_secret_key: reader.text("JWT_SECRET_KEY", defaults.jwt_secret_key),
            jwt_algorithm: reader.text("JWT_ALGORITHM", defaults.jwt_algorithm),
            jwt_access_token_expire_minutes: reader.number(
                "JWT_ACCESS_TOKEN_EXPIRE_MINUTES",
                defaults.jwt_access_token_expire_minutes,
            ),
            jwt_refresh_token_expire_days: reader.number(
                "JWT_REFRESH_TOKEN_EXPIRE_DAYS",
                defaults.jwt_refresh_token_expire_days,
            ),
            backend_cors_origins: reader
                .text("BACKEND_CORS_ORIGINS", defaults.backend_cors_origins),
            redis_url: reader.text("REDIS_URL", defaults.redis_url),
            max_file_size_mb: reader.number("MAX_FILE_SIZE_MB", defaults.max_file_size_mb),
            upload_dir: reader
                .optional("UPLOAD_DIR")
                .map_or(defaults.upload_dir, PathBuf::from),
            log_level: reader.text("LOG_LEVEL", defaults.log_level),
            log_format: reader.text("LOG_FORMAT", defaults.log_format),
            rate_limit_per_minute: reader
                .number("RATE_LIMIT_PER_MINUTE", defaults.rate_limit_per_minute),
            websocket_heartbeat_interval: reader.number(
                "WEBSOCKET_HEARTBEAT_INTERVAL",
                defaults.websocket_heartbeat_interval,
            ),
        };

        if settings.uses_insecure_jwt_secret() {
            warn!("JWT_SECRET_KEY is the shipped placeholder; run generate-jwt-secret");
        }
        settings
    }

    /// Connection string for PostgreSQL.
    ///
    /// An explicit `DATABASE_URL` wins, with a leading `postgres://`
    /// rewritten to `postgresql://`. Otherwise the URL is assembled from the
    /// individual `DATABASE_*` parts.
    pub fn database_url(&self) -> String {
        match self.database_url.as_deref() {
            Some(url) if !url.is_empty() => normalise_database_url(url),
            _ => format!(
                "postgresql://{}:{}@{}:{}/{}",
                self.database_user,
                self.database_password,
                self.database_host,
                self.database_port,
                self.database_name
            ),
        }
    }

    /// Origins accepted by the CORS layer; `["*"]` means any origin.
    pub fn cors_origins(&self) -> Vec<String> {
        parse_cors_origins(&self.backend_cors_origins)
    }

    /// True on Railway or whenever debug mode is off.
    pub fn is_production(&self) -> bool {
        self.railway_environment.is_some() || !self.debug
    }

    /// Hosts accepted by the trusted-host filter; `["*"]` accepts any host.
    pub fn allowed_hosts(&self) -> Vec<String> {
        allowed_hosts(self.debug, self.is_production())
    }

    pub fn uses_insecure_jwt_secret(&self) -> bool {
        self.jwt_secret_key == INSECURE_JWT_SECRET
    }

    /// Upload size limit in bytes.
    pub fn max_file_size_bytes(&self) -> usize {
        usize::try_from(self.max_file_size_mb)
            .unwrap_or(usize::MAX)
            .saturating_mul(1024 * 1024)
    }

    /// OpenAPI UI location, `{API_V1_STR}/docs`.
    pub fn docs_path(&self) -> String {
        format!("{}/docs", self.api_v1_str.trim_end_matches('/'))
    }

    /// Path of the ReDoc page, next to the Swagger UI.
    pub fn redoc_path(&self) -> String {
        format!("{}/redoc", self.api_v1_str.trim_end_matches('/'))
    }
}

struct EnvReader<'a, E> {
    env: &'a E,
}

impl<E: Env> EnvReader<'_, E> {
    fn optional(&self, name: &'static str) -> Option<String> {
        self.env.string(name)
    }

    fn text(&self, name: &'static str, default: String) -> String {
        self.optional(name).unwrap_or(default)
    }

    fn number<T>(&self, name: &'static str, default: T) -> T
    where
        T: FromStr + std::fmt::Display + Copy,
    {
        let Some(raw) = self.optional(name) else {
            return default;
        };
        raw.trim().parse().unwrap_or_else(|_| {
            warn!(value = %raw, %default, "invalid {name}; using default");
            default
        })
    }

    fn flag(&self, name: &'static str, default: bool) -> bool {
        let Some(raw) = self.optional(name) else {
            return default;
        };
        parse_bool(&raw).unwrap_or_else(|| {
            warn!(value = %raw, expected = BOOL_EXPECTED, %default, "invalid {name}; using default");
            default
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "y" | "t" => Some(true),
        "0" | "false" | "no" | "off" | "n" | "f" => Some(false),
        _ => None,
    }
}
