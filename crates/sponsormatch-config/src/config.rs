// crates/sponsormatch-config/src/config.rs
// ============================================================================
// Module: Configuration Model
// Description: The `SponsorMatchConfig` struct tree, its TOML load path, and
//   its validation rules.
// Purpose: Fail closed on a malformed or out-of-range configuration before
//   any adapter is constructed.
// Dependencies: sponsormatch-core, serde, thiserror, toml
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use sponsormatch_core::match_service::MAX_TOP_K;
use sponsormatch_core::match_service::MIN_TOP_K;

/// Default configuration filename when no path is given explicitly.
const DEFAULT_CONFIG_NAME: &str = "sponsormatch.toml";
/// Environment variable overriding the config path.
pub const CONFIG_ENV_VAR: &str = "SPONSORMATCH_CONFIG";
/// Maximum accepted configuration file size, in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum total length of a resolved config path.
const MAX_PATH_LENGTH: usize = 4096;

fn default_request_timeout_ms() -> u64 {
    2_000
}

fn default_max_top_k() -> u32 {
    MAX_TOP_K
}

fn default_true() -> bool {
    true
}

fn default_embedding_dimension() -> usize {
    sponsormatch_core_default_embedding_dimension()
}

// `sponsormatch-config` does not depend on `sponsormatch-providers`, so it
// cannot reference `DEFAULT_EMBEDDING_DIMENSION` directly; the value is
// duplicated here and asserted equal to the provider crate's constant in a
// unit test, the same "two sources of truth, one invariant" shape
// `decision-gate-config` uses for its own cross-crate default mirrors.
const fn sponsormatch_core_default_embedding_dimension() -> usize {
    256
}

fn default_max_response_bytes() -> usize {
    1024 * 1024
}

fn default_user_agent() -> String {
    "sponsormatch/0.1".to_string()
}

fn default_collection_name() -> String {
    "sponsormatch".to_string()
}

fn default_model_id() -> String {
    "local-hashed-v1".to_string()
}

fn default_schema_version() -> u32 {
    1
}

/// Top-level configuration tree for a SponsorMatch deployment.
///
/// # Invariants
/// - `service.max_top_k` is in `[1, 100]`, matching
///   [`sponsormatch_core::match_service::MAX_TOP_K`].
/// - `service.request_timeout_ms` is greater than zero.
/// - `catalog.schema_version` is greater than zero.
#[derive(Debug, Clone, Deserialize)]
pub struct SponsorMatchConfig {
    /// Match-pipeline ceilings and toggles.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Which embedding plane backs the `EmbeddingProvider` capability.
    #[serde(default)]
    pub embedding: EmbeddingPlaneConfig,
    /// Which analytics plane backs the `AnalyticsStore` capability.
    #[serde(default)]
    pub analytics: AnalyticsPlaneConfig,
    /// In-process catalog collection identity.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl SponsorMatchConfig {
    /// Loads configuration from `path`, or from the path named by
    /// [`CONFIG_ENV_VAR`], or from [`DEFAULT_CONFIG_NAME`] in the current
    /// directory, in that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not valid TOML, or
    /// [`ConfigError::Invalid`] if it fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path_length(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|error| ConfigError::Io(error.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_error| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self = toml::from_str(content).map_err(|error| ConfigError::Parse(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section of the configuration tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on the first rule violated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.service.validate()?;
        self.embedding.validate()?;
        self.analytics.validate()?;
        self.catalog.validate()?;
        Ok(())
    }
}

impl Default for SponsorMatchConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            embedding: EmbeddingPlaneConfig::default(),
            analytics: AnalyticsPlaneConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

/// Match-pipeline ceilings and feature toggles.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Retrieval ceiling passed as `max_top_k` to `MatchService::new`.
    #[serde(default = "default_max_top_k")]
    pub max_top_k: u32,
    /// Per-request deadline; exceeding it aborts the request as `Timeout`.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Whether to wrap the service with the advisory match-result cache.
    #[serde(default = "default_true")]
    pub enable_result_cache: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_top_k: default_max_top_k(),
            request_timeout_ms: default_request_timeout_ms(),
            enable_result_cache: true,
        }
    }
}

impl ServiceConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TOP_K..=MAX_TOP_K).contains(&self.max_top_k) {
            return Err(ConfigError::Invalid(format!(
                "service.max_top_k must be in [{MIN_TOP_K}, {MAX_TOP_K}], got {}",
                self.max_top_k
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("service.request_timeout_ms must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Selects and configures the plane backing the `EmbeddingProvider` capability.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "plane", rename_all = "snake_case")]
pub enum EmbeddingPlaneConfig {
    /// A deterministic, network-free local provider.
    Local {
        /// Vector dimensionality to produce.
        #[serde(default = "default_embedding_dimension")]
        dimension: usize,
    },
    /// An HTTP-backed remote embedding service.
    Http {
        /// Endpoint the provider issues `POST` requests to.
        endpoint: String,
        /// Allow cleartext `http://` endpoints.
        #[serde(default)]
        allow_http: bool,
        /// Request timeout, in milliseconds.
        #[serde(default = "default_request_timeout_ms")]
        timeout_ms: u64,
        /// Allow requests to private/link-local/loopback addresses.
        #[serde(default)]
        allow_private_networks: bool,
        /// Maximum response size allowed, in bytes.
        #[serde(default = "default_max_response_bytes")]
        max_response_bytes: usize,
        /// User agent string for outbound requests.
        #[serde(default = "default_user_agent")]
        user_agent: String,
    },
}

impl Default for EmbeddingPlaneConfig {
    fn default() -> Self {
        Self::Local { dimension: default_embedding_dimension() }
    }
}

impl EmbeddingPlaneConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Local { dimension } => {
                if *dimension == 0 {
                    return Err(ConfigError::Invalid("embedding.dimension must be greater than zero".to_string()));
                }
            }
            Self::Http { endpoint, allow_http, timeout_ms, .. } => {
                let trimmed = endpoint.trim();
                if trimmed.is_empty() {
                    return Err(ConfigError::Invalid("embedding.endpoint must be set".to_string()));
                }
                if trimmed.starts_with("http://") && !allow_http {
                    return Err(ConfigError::Invalid(
                        "embedding.endpoint uses http:// without embedding.allow_http".to_string(),
                    ));
                }
                if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
                    return Err(ConfigError::Invalid(
                        "embedding.endpoint must start with http:// or https://".to_string(),
                    ));
                }
                if *timeout_ms == 0 {
                    return Err(ConfigError::Invalid("embedding.timeout_ms must be greater than zero".to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Selects and configures the plane backing the `AnalyticsStore` capability.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "plane", rename_all = "snake_case")]
pub enum AnalyticsPlaneConfig {
    /// No analytics store; pacing always admits at full weight (`no_analytics`).
    None,
    /// A durable SQLite-backed store at `path`.
    Sqlite {
        /// Filesystem path to the SQLite database file.
        path: PathBuf,
    },
}

impl Default for AnalyticsPlaneConfig {
    fn default() -> Self {
        Self::None
    }
}

impl AnalyticsPlaneConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Self::Sqlite { path } = self {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("analytics.path must be set for the sqlite plane".to_string()));
            }
            validate_path_length(path)?;
        }
        Ok(())
    }
}

/// Identity of the in-process catalog collection the index is `ensure_collection`-ed under.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Collection name.
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
    /// Embedding model identifier the collection is keyed to.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Schema/payload version the collection is created with.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            collection_name: default_collection_name(),
            model_id: default_model_id(),
            schema_version: default_schema_version(),
        }
    }
}

impl CatalogConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.collection_name.trim().is_empty() {
            return Err(ConfigError::Invalid("catalog.collection_name must be non-empty".to_string()));
        }
        if self.schema_version == 0 {
            return Err(ConfigError::Invalid("catalog.schema_version must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// The configuration file was not valid TOML.
    #[error("config parse error: {0}")]
    Parse(String),
    /// The configuration parsed but failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Resolves the config path from the explicit argument, [`CONFIG_ENV_VAR`],
/// or [`DEFAULT_CONFIG_NAME`], in that order.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

fn validate_path_length(path: &Path) -> Result<(), ConfigError> {
    if path.to_string_lossy().len() > MAX_PATH_LENGTH {
        return Err(ConfigError::Invalid("path exceeds max length".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        reason = "Test fixtures use explicit expects for clarity."
    )]

    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(SponsorMatchConfig::default().validate().is_ok());
    }

    #[test]
    fn max_top_k_out_of_range_is_rejected() {
        let mut config = SponsorMatchConfig::default();
        config.service.max_top_k = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.service.max_top_k = 101;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = SponsorMatchConfig::default();
        config.service.request_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn http_embedding_without_scheme_is_rejected() {
        let embedding = EmbeddingPlaneConfig::Http {
            endpoint: "example.com/embed".to_string(),
            allow_http: false,
            timeout_ms: 1_000,
            allow_private_networks: false,
            max_response_bytes: default_max_response_bytes(),
            user_agent: default_user_agent(),
        };
        assert!(matches!(embedding.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn plaintext_http_embedding_requires_opt_in() {
        let embedding = EmbeddingPlaneConfig::Http {
            endpoint: "http://example.com/embed".to_string(),
            allow_http: false,
            timeout_ms: 1_000,
            allow_private_networks: false,
            max_response_bytes: default_max_response_bytes(),
            user_agent: default_user_agent(),
        };
        assert!(matches!(embedding.validate(), Err(ConfigError::Invalid(_))));

        let embedding = EmbeddingPlaneConfig::Http {
            endpoint: "http://example.com/embed".to_string(),
            allow_http: true,
            timeout_ms: 1_000,
            allow_private_networks: false,
            max_response_bytes: default_max_response_bytes(),
            user_agent: default_user_agent(),
        };
        assert!(embedding.validate().is_ok());
    }

    #[test]
    fn sqlite_plane_requires_a_path() {
        let analytics = AnalyticsPlaneConfig::Sqlite { path: PathBuf::new() };
        assert!(matches!(analytics.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_from_toml_round_trips_a_custom_value() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sponsormatch.toml");
        fs::write(
            &path,
            r#"
            [service]
            max_top_k = 25

            [embedding]
            plane = "local"
            dimension = 64

            [analytics]
            plane = "none"
            "#,
        )
        .expect("write config");
        let config = SponsorMatchConfig::load(Some(&path)).expect("load config");
        assert_eq!(config.service.max_top_k, 25);
        assert!(matches!(config.embedding, EmbeddingPlaneConfig::Local { dimension: 64 }));
    }

    #[test]
    fn load_missing_file_is_an_io_error() {
        let err = SponsorMatchConfig::load(Some(Path::new("/does/not/exist.toml")))
            .expect_err("missing file is an error");
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn load_malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        fs::write(&path, "not = [valid").expect("write config");
        let err = SponsorMatchConfig::load(Some(&path)).expect_err("malformed toml is an error");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
