//! Layered configuration loading for the query server and CLI: default <
//! env < file < programmatic < explicit override (spec §6).

use std::path::{Path, PathBuf};

use astdb_domain::error::{Error, Result};
use figment::providers::{Format, Json, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// `MCP_SERVER_TRANSPORT_TYPE` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    /// Newline-delimited JSON over stdin/stdout.
    Stdio,
    /// Newline-delimited JSON over a websocket.
    Websocket,
    /// Request/response over HTTP.
    Http,
}

impl Default for TransportType {
    fn default() -> Self {
        Self::Stdio
    }
}

/// `NODE_ENV` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeEnv {
    /// Verbose logging, relaxed validation.
    Development,
    /// Minimal logging, strict validation.
    Production,
    /// Deterministic clocks/ids for test harnesses.
    Test,
}

impl Default for NodeEnv {
    fn default() -> Self {
        Self::Development
    }
}

/// Query server runtime configuration, one field per `MCP_*` env var.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryServerConfig {
    /// `MCP_SERVER_TRANSPORT_TYPE`.
    pub transport: TransportType,
    /// `MCP_SERVER_PORT`; ignored for stdio transport.
    pub port: u16,
    /// `MCP_SERVER_HOST`.
    pub host: String,
    /// `MCP_SERVER_MAX_CONNECTIONS`.
    pub max_connections: usize,
    /// `MCP_REQUEST_TIMEOUT`, in milliseconds.
    pub request_timeout_ms: u64,
    /// `MCP_MAX_QUERY_RESULTS`.
    pub max_query_results: usize,
    /// `MCP_SERVER_CACHE_SIZE`.
    pub cache_size: usize,
    /// `MCP_SERVER_LOG_LEVEL`.
    pub log_level: String,
    /// `MCP_ENABLE_AUTH`.
    pub enable_auth: bool,
    /// `MCP_ENABLE_RATE_LIMIT`.
    pub enable_rate_limit: bool,
    /// `MCP_SERVER_DATABASE_PATH`; defaults to the workspace's `vectors.db`.
    pub database_path: Option<String>,
    /// Maximum in-flight requests serviced concurrently (spec
    /// `maxConcurrentRequests`). Not among spec §6's named env vars; settable
    /// only via file/programmatic config layers, defaulting to
    /// `max_connections`.
    pub max_concurrent_requests: usize,
    /// Depth of the queue excess requests wait in before being rejected
    /// `overloaded` (spec `requestQueueSize`).
    pub request_queue_size: usize,
    /// Requests allowed per client per [`Self::rate_limit_window_secs`] when
    /// [`Self::enable_rate_limit`] is set.
    pub rate_limit_requests: u32,
    /// Rate-limit window length, in seconds.
    pub rate_limit_window_secs: u64,
    /// Expected bearer token when [`Self::enable_auth`] is set. `None` means
    /// auth is effectively impossible to satisfy, so every request is
    /// rejected rather than silently accepted.
    pub auth_token: Option<String>,
    /// Maximum accepted request body/line size, in bytes.
    pub max_message_size_bytes: usize,
}

impl Default for QueryServerConfig {
    fn default() -> Self {
        Self {
            transport: TransportType::default(),
            port: 0,
            host: "127.0.0.1".to_string(),
            max_connections: 100,
            request_timeout_ms: 30_000,
            max_query_results: 50,
            cache_size: 1_000,
            log_level: "info".to_string(),
            enable_auth: false,
            enable_rate_limit: false,
            database_path: None,
            max_concurrent_requests: 100,
            request_queue_size: 256,
            rate_limit_requests: 100,
            rate_limit_window_secs: 60,
            auth_token: None,
            max_message_size_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Top-level configuration surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AstdbConfig {
    /// `NODE_ENV`.
    pub node_env: NodeEnv,
    /// Query server settings.
    pub query_server: QueryServerConfig,
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Build a JSON overlay from the exact `MCP_*`/`NODE_ENV` variables named in
/// spec §6; absent variables leave their key out of the overlay entirely so
/// layering underneath is preserved.
fn env_overrides_json() -> serde_json::Value {
    let mut query_server = serde_json::Map::new();
    let env = std::env::var;

    if let Ok(v) = env("MCP_SERVER_TRANSPORT_TYPE") {
        query_server.insert("transport".into(), v.to_ascii_lowercase().into());
    }
    if let Some(n) = env("MCP_SERVER_PORT").ok().and_then(|v| v.parse::<u16>().ok()) {
        query_server.insert("port".into(), n.into());
    }
    if let Ok(v) = env("MCP_SERVER_HOST") {
        query_server.insert("host".into(), v.into());
    }
    if let Some(n) = env("MCP_SERVER_MAX_CONNECTIONS").ok().and_then(|v| v.parse::<usize>().ok()) {
        query_server.insert("max_connections".into(), n.into());
    }
    if let Some(n) = env("MCP_REQUEST_TIMEOUT").ok().and_then(|v| v.parse::<u64>().ok()) {
        query_server.insert("request_timeout_ms".into(), n.into());
    }
    if let Some(n) = env("MCP_MAX_QUERY_RESULTS").ok().and_then(|v| v.parse::<usize>().ok()) {
        query_server.insert("max_query_results".into(), n.into());
    }
    if let Some(n) = env("MCP_SERVER_CACHE_SIZE").ok().and_then(|v| v.parse::<usize>().ok()) {
        query_server.insert("cache_size".into(), n.into());
    }
    if let Ok(v) = env("MCP_SERVER_LOG_LEVEL") {
        query_server.insert("log_level".into(), v.into());
    }
    if let Ok(v) = env("MCP_ENABLE_AUTH") {
        query_server.insert("enable_auth".into(), parse_bool(&v).into());
    }
    if let Ok(v) = env("MCP_ENABLE_RATE_LIMIT") {
        query_server.insert("enable_rate_limit".into(), parse_bool(&v).into());
    }
    if let Ok(v) = env("MCP_SERVER_DATABASE_PATH") {
        query_server.insert("database_path".into(), v.into());
    }

    let mut root = serde_json::Map::new();
    if !query_server.is_empty() {
        root.insert("query_server".into(), serde_json::Value::Object(query_server));
    }
    if let Ok(v) = env("NODE_ENV") {
        root.insert("node_env".into(), v.to_ascii_lowercase().into());
    }

    serde_json::Value::Object(root)
}

/// Search order for the file layer: explicit `--config`, then the four
/// well-known names under the workspace root.
fn resolve_config_file(workspace_root: &Path, config_flag: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = config_flag {
        return Some(path.to_path_buf());
    }

    let candidates = [
        workspace_root.join("mcp-server.config.json"),
        workspace_root.join(".astdb").join("config.json"),
        workspace_root.join(".astdb").join("mcp-server.config.json"),
        workspace_root.join("config").join("mcp-server.json"),
    ];
    candidates.into_iter().find(|p| p.exists())
}

fn merge_file(figment: Figment, path: &Path) -> Figment {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => figment.merge(Toml::file(path)),
        _ => figment.merge(Json::file(path)),
    }
}

/// Load configuration layered `default < env < file < programmatic <
/// explicit`. `programmatic` is a partial default built up by calling code
/// (e.g. CLI defaults); `explicit_overrides` is raw JSON from `--flag`
/// values the caller wants to win over everything else.
pub fn load_config(
    workspace_root: &Path,
    config_flag: Option<&Path>,
    programmatic: Option<AstdbConfig>,
    explicit_overrides: Option<serde_json::Value>,
) -> Result<AstdbConfig> {
    let mut figment = Figment::new().merge(Serialized::defaults(AstdbConfig::default()));

    let overrides = env_overrides_json();
    if overrides.as_object().is_some_and(|o| !o.is_empty()) {
        figment = figment.merge(Json::string(&overrides.to_string()));
    }

    if let Some(path) = resolve_config_file(workspace_root, config_flag) {
        figment = merge_file(figment, &path);
    }

    if let Some(programmatic) = programmatic {
        figment = figment.merge(Serialized::defaults(programmatic));
    }

    if let Some(explicit) = explicit_overrides {
        figment = figment.merge(Json::string(&explicit.to_string()));
    }

    figment
        .extract()
        .map_err(|e| Error::configuration(format!("failed to load configuration: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_load_with_no_overrides_present() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path(), None, None, None).unwrap();
        assert_eq!(config.query_server.transport, TransportType::Stdio);
        assert_eq!(config.query_server.max_connections, 100);
    }

    #[test]
    #[serial]
    #[allow(unsafe_code)]
    fn env_var_overrides_default_port() {
        let dir = tempfile::tempdir().unwrap();
        // SAFETY: test runs serially; no concurrent env access.
        unsafe {
            std::env::set_var("MCP_SERVER_PORT", "9411");
        }
        let config = load_config(dir.path(), None, None, None).unwrap();
        unsafe {
            std::env::remove_var("MCP_SERVER_PORT");
        }
        assert_eq!(config.query_server.port, 9411);
    }

    #[test]
    #[serial]
    fn file_layer_overrides_env_and_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("mcp-server.config.json"),
            r#"{"query_server": {"max_query_results": 25}}"#,
        )
        .unwrap();

        let config = load_config(dir.path(), None, None, None).unwrap();
        assert_eq!(config.query_server.max_query_results, 25);
    }

    #[test]
    #[serial]
    fn explicit_override_wins_over_everything() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("mcp-server.config.json"),
            r#"{"query_server": {"max_query_results": 25}}"#,
        )
        .unwrap();

        let explicit = serde_json::json!({ "query_server": { "max_query_results": 7 } });
        let config = load_config(dir.path(), None, None, Some(explicit)).unwrap();
        assert_eq!(config.query_server.max_query_results, 7);
    }
}
