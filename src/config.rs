use std::env;

/// Fallback signing secret for local runs only.
pub const LOCAL_AUTH_SECRET: &str = "tremonte-local-dev-secret";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

/// AppConfig
///
/// Immutable configuration loaded once at startup and shared through the
/// application state via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Runtime environment marker. Controls the local `x-user-id` bypass,
    /// log format and cookie security.
    pub env: Env,
    /// Postgres connection string. `None` is only accepted locally and selects
    /// the in-memory store.
    pub db_url: Option<String>,
    /// HMAC secret used to sign and verify session tokens.
    pub jwt_secret: String,
    pub bind_addr: String,
    pub session_ttl_hours: i64,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking configuration for tests and scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            jwt_secret: LOCAL_AUTH_SECRET.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// | Env Var             | Production | Local default               |
    /// |---------------------|------------|-----------------------------|
    /// | `APP_ENV`           | `production` | `local`                   |
    /// | `AUTH_SECRET`       | **required** | built-in development secret |
    /// | `DATABASE_URL`      | **required** | unset = in-memory store     |
    /// | `BIND_ADDR`         | optional   | `0.0.0.0:3000`              |
    /// | `SESSION_TTL_HOURS` | optional   | `12`                        |
    ///
    /// # Panics
    /// Panics when a production secret is missing or a numeric variable does not
    /// parse, so the server never starts half-configured.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").unwrap_or_default().as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => {
                let secret =
                    env::var("AUTH_SECRET").expect("FATAL: AUTH_SECRET must be set in production.");
                assert!(!secret.is_empty(), "FATAL: AUTH_SECRET must not be empty.");
                secret
            }
            Env::Local => env::var("AUTH_SECRET").unwrap_or_else(|_| LOCAL_AUTH_SECRET.to_string()),
        };

        let db_url = match env {
            Env::Production => Some(
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in production"),
            ),
            Env::Local => env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .map(|v| {
                v.parse::<i64>()
                    .expect("FATAL: SESSION_TTL_HOURS must be a whole number of hours")
            })
            .unwrap_or(DEFAULT_SESSION_TTL_HOURS);

        Self {
            env,
            db_url,
            jwt_secret,
            bind_addr,
            session_ttl_hours,
        }
    }

    /// Session cookies are marked `Secure` outside local development.
    pub fn secure_cookies(&self) -> bool {
        self.env == Env::Production
    }
}
