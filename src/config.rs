//! Loader configuration
//!
//! The configuration is an open JSON object: the loader itself only reads
//! `paths.vs` and `cspNonce`, everything else (for example
//! `vs/nls.availableLanguages`) is handed through to the library's module
//! loader untouched.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where the library's assets live when nothing else is configured.
pub const DEFAULT_VS_PATH: &str = "https://cdn.jsdelivr.net/npm/monaco-editor@0.52.2/min/vs";

/// File name of the library's AMD loader, relative to `paths.vs`.
pub const LOADER_SCRIPT: &str = "loader.js";

/// Logged once per `configure` call that still uses `urls.monacoBase`.
pub const DEPRECATION_MESSAGE: &str = "Deprecation warning!
    You are using deprecated way of configuration.

    Instead of using
      configure({ urls: { monacoBase: '...' } })
    use
      configure({ paths: { vs: '...' } })
";

static DEFAULT_CONFIG: Lazy<LoaderConfig> = Lazy::new(|| {
    let mut paths = Map::new();
    paths.insert("vs".to_string(), Value::from(DEFAULT_VS_PATH));

    let mut config = Map::new();
    config.insert("paths".to_string(), Value::Object(paths));
    LoaderConfig(config)
});

/// Merged loader configuration.
///
/// Serializes as the bare JSON object so it can be passed verbatim to the
/// library's `require.config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoaderConfig(Map<String, Value>);

impl Default for LoaderConfig {
    fn default() -> Self {
        DEFAULT_CONFIG.clone()
    }
}

impl LoaderConfig {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Base path of the library's assets (`paths.vs`).
    pub fn paths_vs(&self) -> Option<&str> {
        self.0.get("paths")?.get("vs")?.as_str()
    }

    /// URL of the loader script: `paths.vs + "/loader.js"`.
    pub fn loader_script_url(&self) -> Option<String> {
        self.paths_vs().map(|base| format!("{}/{}", base, LOADER_SCRIPT))
    }

    /// Nonce for the injected script element, if CSP is in use.
    pub fn csp_nonce(&self) -> Option<&str> {
        self.0.get("cspNonce")?.as_str()
    }

    /// The `vs/nls.availableLanguages` table passed to the i18n bootstrap.
    pub fn available_languages(&self) -> Option<&Map<String, Value>> {
        self.0.get("vs/nls")?.get("availableLanguages")?.as_object()
    }

    /// Deep-merge an already validated partial config into this one.
    pub fn merge(&mut self, partial: Map<String, Value>) {
        deep_merge(&mut self.0, partial);
    }

    /// Validate `options` and merge them in. On error nothing changes.
    pub fn apply(&mut self, options: Option<Value>) -> Result<(), ConfigError> {
        let partial = validate(options)?;
        self.merge(partial);
        Ok(())
    }
}

/// Check that `options` is a JSON object and rewrite the legacy `urls` key.
///
/// A set `urls` value replaces the whole input: the result is only
/// `{ paths: { vs: urls.monacoBase } }`, every other key is discarded. An unset
/// `urls` (`null`, `false`, `0` or `""`) is passed through like any other key.
pub fn validate(options: Option<Value>) -> Result<Map<String, Value>, ConfigError> {
    let options = match options {
        None | Some(Value::Null) => return Err(ConfigError::Required),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(ConfigError::Type {
                found: json_type_name(&other),
            })
        }
    };

    match options.get("urls") {
        Some(urls) if is_set(urls) => {
            tracing::warn!("{}", DEPRECATION_MESSAGE);
            Ok(legacy_paths(urls))
        }
        _ => Ok(options),
    }
}

fn legacy_paths(urls: &Value) -> Map<String, Value> {
    let mut rewritten = Map::new();
    if let Some(base) = urls.get("monacoBase") {
        let mut paths = Map::new();
        paths.insert("vs".to_string(), base.clone());
        rewritten.insert("paths".to_string(), Value::Object(paths));
    }
    rewritten
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Merge `source` into `target`.
///
/// Objects present on both sides are merged key by key; any other value
/// (arrays included) replaces what was there.
pub fn deep_merge(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, incoming) in source {
        match target.get_mut(&key) {
            Some(Value::Object(existing)) if incoming.is_object() => {
                if let Value::Object(incoming) = incoming {
                    deep_merge(existing, incoming);
                }
            }
            _ => {
                target.insert(key, incoming);
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Configuration error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `configure` was called without a configuration object.
    Required,
    /// `configure` was called with something other than a JSON object.
    Type { found: &'static str },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Required => write!(f, "the configuration object is required"),
            ConfigError::Type { .. } => write!(f, "the configuration object should be an object"),
        }
    }
}

impl std::error::Error for ConfigError {}
