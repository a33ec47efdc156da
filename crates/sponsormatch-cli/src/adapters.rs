// crates/sponsormatch-cli/src/adapters.rs
// ============================================================================
// Module: Adapter Wiring
// Description: Turns a loaded `SponsorMatchConfig` into the concrete adapters
//   a composition root hands to `MatchService` / `ToolRouter`.
// Purpose: Keep every subcommand's adapter construction identical; this is
//   the crate's one composition root.
// Dependencies: sponsormatch-config, sponsormatch-core, sponsormatch-providers,
//   sponsormatch-store
// ============================================================================

use std::sync::Arc;

use sponsormatch_config::AnalyticsPlaneConfig;
use sponsormatch_config::EmbeddingPlaneConfig;
use sponsormatch_config::SponsorMatchConfig;
use sponsormatch_core::error::MatchError;
use sponsormatch_core::interfaces::AnalyticsStore;
use sponsormatch_core::interfaces::EmbeddingProvider;
use sponsormatch_core::interfaces::VectorIndex;
use sponsormatch_providers::HttpEmbeddingProvider;
use sponsormatch_providers::HttpEmbeddingProviderConfig;
use sponsormatch_providers::InProcessVectorIndex;
use sponsormatch_providers::LocalEmbeddingProvider;
use sponsormatch_store::SqliteAnalyticsStore;

/// Builds the `EmbeddingProvider` named by `config.embedding`.
///
/// # Errors
///
/// Returns [`MatchError::UnavailableDependency`] if an HTTP-backed provider's
/// endpoint cannot be resolved.
pub fn build_embedding(config: &SponsorMatchConfig) -> Result<Arc<dyn EmbeddingProvider + Send + Sync>, MatchError> {
    match &config.embedding {
        EmbeddingPlaneConfig::Local { dimension } => Ok(Arc::new(LocalEmbeddingProvider::with_dimension(*dimension))),
        EmbeddingPlaneConfig::Http {
            endpoint,
            allow_http,
            timeout_ms,
            allow_private_networks,
            max_response_bytes,
            user_agent,
        } => {
            let provider = HttpEmbeddingProvider::new(HttpEmbeddingProviderConfig {
                endpoint: endpoint.clone(),
                allow_http: *allow_http,
                timeout_ms: *timeout_ms,
                max_response_bytes: *max_response_bytes,
                allow_private_networks: *allow_private_networks,
                user_agent: user_agent.clone(),
            })?;
            Ok(Arc::new(provider))
        }
    }
}

/// Builds the in-process [`VectorIndex`], named after `config.catalog.collection_name`.
/// There is no persistent vector index adapter in this deployment; a process
/// that needs its catalog to outlive a single invocation must stay resident
/// (the `serve` subcommand).
#[must_use]
pub fn build_index(config: &SponsorMatchConfig) -> Arc<dyn VectorIndex + Send + Sync> {
    Arc::new(InProcessVectorIndex::new(config.catalog.collection_name.clone()))
}

/// Builds the `AnalyticsStore` named by `config.analytics`, or `None` for the
/// `none` plane.
///
/// # Errors
///
/// Returns [`MatchError::UnavailableDependency`] if the SQLite file cannot be opened.
pub fn build_analytics(
    config: &SponsorMatchConfig,
) -> Result<Option<Arc<dyn AnalyticsStore + Send + Sync>>, MatchError> {
    match &config.analytics {
        AnalyticsPlaneConfig::None => Ok(None),
        AnalyticsPlaneConfig::Sqlite { path } => {
            let store = SqliteAnalyticsStore::open(path)?;
            Ok(Some(Arc::new(store)))
        }
    }
}
