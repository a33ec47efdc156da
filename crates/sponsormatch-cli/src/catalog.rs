// crates/sponsormatch-cli/src/catalog.rs
// ============================================================================
// Module: Catalog Loading
// Description: Reads a JSON catalog file into `CreativeRecord`s and derives
//   the text each one is embedded from.
// Purpose: Give `match` and `ingest` one shared notion of "a catalog file".
// Dependencies: serde_json, sponsormatch-core
// ============================================================================

use std::fs;
use std::path::Path;

use sponsormatch_core::model::CreativeRecord;

use crate::error::CliError;

/// Loads a catalog file: a JSON array of [`CreativeRecord`] objects.
///
/// # Errors
///
/// Returns [`CliError::CatalogIo`] if the file cannot be read, or
/// [`CliError::CatalogParse`] if it is not a JSON array of creatives.
pub fn load_catalog(path: &Path) -> Result<Vec<CreativeRecord>, CliError> {
    let bytes =
        fs::read(path).map_err(|source| CliError::CatalogIo { path: path.to_path_buf(), source })?;
    serde_json::from_slice(&bytes).map_err(|source| CliError::CatalogParse { path: path.to_path_buf(), source })
}

/// Derives the text an embedding provider should embed for `creative`: the
/// fields a contextual match is actually keyed on, title first.
#[must_use]
pub fn embedding_text(creative: &CreativeRecord) -> String {
    let mut parts = vec![creative.title.clone(), creative.body.clone()];
    parts.extend(creative.topics.iter().cloned());
    parts.extend(creative.verticals.iter().cloned());
    parts.extend(creative.audience_segments.iter().cloned());
    parts.extend(creative.context_keywords.iter().cloned());
    parts.retain(|part| !part.is_empty());
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "Test-only assertions use expect for clarity.")]

    use super::*;
    use sponsormatch_core::identifiers::AdvertiserId;
    use sponsormatch_core::identifiers::CampaignId;
    use sponsormatch_core::identifiers::CreativeId;
    use sponsormatch_core::model::PacingMode;

    fn creative() -> CreativeRecord {
        CreativeRecord {
            creative_id: CreativeId::new("c1"),
            campaign_id: CampaignId::new("camp1"),
            advertiser_id: AdvertiserId::new("adv1"),
            title: "Trail running shoes".to_string(),
            body: "Built for technical terrain.".to_string(),
            cta_text: "Shop now".to_string(),
            landing_url: "https://example.com".to_string(),
            campaign_name: "Fall launch".to_string(),
            description: None,
            updated_at: None,
            topics: vec!["running".to_string()],
            locales: vec![],
            verticals: vec!["sportswear".to_string()],
            audience_segments: vec![],
            context_keywords: vec![],
            blocked_keywords: vec![],
            sensitive: false,
            age_restricted: false,
            brand_safety_tier: None,
            start_at: None,
            end_at: None,
            total_budget: None,
            daily_budget: None,
            currency: None,
            pacing_mode: PacingMode::Even,
            cpm: 5.0,
            target_engagement_rate: None,
            enabled: true,
        }
    }

    #[test]
    fn embedding_text_joins_the_semantic_fields() {
        let text = embedding_text(&creative());
        assert!(text.contains("Trail running shoes"));
        assert!(text.contains("technical terrain"));
        assert!(text.contains("running"));
        assert!(text.contains("sportswear"));
    }

    #[test]
    fn load_catalog_rejects_a_missing_file() {
        let err = load_catalog(Path::new("/does/not/exist.json")).expect_err("missing file errs");
        assert!(matches!(err, CliError::CatalogIo { .. }));
    }
}
