//! Server configuration, loaded from environment variables at startup.

/// Runtime configuration for flock-server.
///
/// Every field has a sensible default so a node works out-of-the-box as its
/// own registry; point `FLOCK_REGISTRY_URL` at another node to join an
/// existing swarm.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// URL under which other peers can reach this node.  The peer id is
    /// derived from this value, so it should stay stable across restarts.
    pub public_url: String,

    /// Registry endpoint this node registers with and routes through.
    /// Defaults to `public_url`, so every node is its own registry.
    pub registry_url: String,

    /// OpenAI-compatible local inference runtime the relay endpoints
    /// forward to (e.g. a llama.cpp server).
    pub engine_url: String,

    /// Registration heartbeat interval in milliseconds.
    pub heartbeat_ms: u64,

    /// Serve-claim TTL in milliseconds; renewal runs at half this.
    pub lease_ttl_ms: u64,

    /// A peer whose last registration is older than this vanishes from the
    /// aggregated view.
    pub staleness_ms: u64,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Serve the Swagger UI at `/swagger-ui` (disable in production).
    pub enable_swagger: bool,

    /// Comma-separated CORS origin allowlist; unset means wildcard.
    pub cors_allowed_origins: Option<String>,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let public_url = env_or("FLOCK_PUBLIC_URL", "http://127.0.0.1:3000");
        Self {
            bind_address: env_or("FLOCK_BIND", "0.0.0.0:3000"),
            registry_url: std::env::var("FLOCK_REGISTRY_URL")
                .unwrap_or_else(|_| public_url.clone()),
            engine_url: env_or("FLOCK_ENGINE_URL", "http://127.0.0.1:8080"),
            heartbeat_ms: parse_env("FLOCK_HEARTBEAT_MS", 30_000),
            lease_ttl_ms: parse_env("FLOCK_LEASE_TTL_MS", 60_000),
            staleness_ms: parse_env("FLOCK_STALENESS_MS", 90_000),
            log_level: env_or("FLOCK_LOG", "info"),
            log_json: std::env::var("FLOCK_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            enable_swagger: std::env::var("FLOCK_ENABLE_SWAGGER")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            cors_allowed_origins: std::env::var("FLOCK_CORS_ORIGINS").ok(),
            public_url,
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
