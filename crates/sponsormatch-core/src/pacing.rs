// crates/sponsormatch-core/src/pacing.rs
// ============================================================================
// Module: Pacing Engine
// Description: Admit/deny a creative and compute a pacing weight from live
//   delivery against budget.
// Purpose: Couple delivery analytics back into per-candidate admission and
//   score-weighting without a transaction spanning the decision.
// Dependencies: sponsormatch-core::interfaces, sponsormatch-core::model
// ============================================================================

//! ## Overview
//! Pure on top of whatever the analytics store reports: given the same
//! stats, `evaluate` always returns the same decision. The analytics read is
//! not transactional with the write that follows admission; over-spend by at
//! most one in-flight request per worker is acceptable (see concurrency
//! notes).
//!
//! Invariants:
//! - Returned weight is always in `[0.1, 1.0]`, or exactly `0.0` on denial.
//! - `reason` is `no_analytics`, `total_budget_exhausted`,
//!   `daily_budget_exhausted`, `paced`, or `within_budget`.

use time::Duration;
use time::OffsetDateTime;

use crate::error::MatchError;
use crate::interfaces::AnalyticsStore;
use crate::model::CreativeRecord;
use crate::model::PacingMode;

/// The outcome of evaluating one creative's pacing state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingDecision {
    /// Whether the creative may be admitted.
    pub admitted: bool,
    /// Multiplicative weight in `[0.1, 1.0]`, or `0.0` when denied.
    pub weight: f64,
    /// Reason tag for audit.
    pub reason: PacingReason,
}

/// Stable reason tags for a pacing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingReason {
    /// No analytics store configured, or the creative has no campaign id.
    NoAnalytics,
    /// Cumulative all-time spend has reached or exceeded `total_budget`.
    TotalBudgetExhausted,
    /// Today's spend has reached or exceeded `daily_budget`.
    DailyBudgetExhausted,
    /// Admitted, but at a weight below 1.0.
    Paced,
    /// Admitted at full weight.
    WithinBudget,
}

impl PacingReason {
    /// Returns the stable string tag used in decision records and analytics metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoAnalytics => "no_analytics",
            Self::TotalBudgetExhausted => "total_budget_exhausted",
            Self::DailyBudgetExhausted => "daily_budget_exhausted",
            Self::Paced => "paced",
            Self::WithinBudget => "within_budget",
        }
    }
}

/// Budget pacing engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct PacingEngine;

impl PacingEngine {
    /// Evaluates `creative`'s pacing state at wall-clock time `now`, using
    /// `analytics` (if configured) for today's and all-time campaign spend.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] if the analytics store is
    /// configured but a read fails.
    pub fn evaluate(
        creative: &CreativeRecord,
        analytics: Option<&dyn AnalyticsStore>,
        now: OffsetDateTime,
    ) -> Result<PacingDecision, MatchError> {
        let Some(analytics) = analytics else {
            return Ok(admit_no_analytics());
        };

        let midnight_utc = now.replace_time(time::Time::MIDNIGHT);
        let today_stats = analytics.stats(&creative.campaign_id, Some(midnight_utc), None)?;
        let total_stats = analytics.stats(&creative.campaign_id, None, None)?;

        if let Some(total_budget) = creative.total_budget {
            if total_stats.spend >= total_budget {
                return Ok(deny(PacingReason::TotalBudgetExhausted));
            }
        }
        if let Some(daily_budget) = creative.daily_budget {
            if today_stats.spend >= daily_budget {
                return Ok(deny(PacingReason::DailyBudgetExhausted));
            }
        }

        let mut weight = 1.0_f64;

        if let Some(daily_budget) = creative.daily_budget {
            if daily_budget > 0.0 {
                let elapsed_fraction = seconds_since_midnight(now) / 86_400.0;
                let expected = daily_budget * elapsed_fraction;
                if expected > 0.0 && today_stats.spend > expected {
                    let over = today_stats.spend / expected;
                    weight = if creative.pacing_mode == PacingMode::Accelerated {
                        1.0
                    } else {
                        (1.0 / over).max(0.1)
                    };
                }
            }
        }

        if creative.pacing_mode == PacingMode::Adaptive {
            if let Some(target) = creative.target_engagement_rate {
                let recent = analytics.recent_stats(&creative.campaign_id, Duration::hours(1))?;
                if recent.avg_score < target {
                    weight = (weight * 0.8).max(0.1);
                }
            }
        }

        let reason = if weight < 1.0 { PacingReason::Paced } else { PacingReason::WithinBudget };
        Ok(PacingDecision { admitted: true, weight, reason })
    }
}

fn admit_no_analytics() -> PacingDecision {
    PacingDecision { admitted: true, weight: 1.0, reason: PacingReason::NoAnalytics }
}

fn deny(reason: PacingReason) -> PacingDecision {
    PacingDecision { admitted: false, weight: 0.0, reason }
}

fn seconds_since_midnight(now: OffsetDateTime) -> f64 {
    let time = now.time();
    f64::from(time.hour()) * 3600.0 + f64::from(time.minute()) * 60.0 + f64::from(time.second())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "Test-only assertions use expect for clarity.")]

    use super::*;
    use crate::identifiers::AdvertiserId;
    use crate::identifiers::CampaignId;
    use crate::identifiers::CreativeId;
    use crate::model::CampaignStats;
    use std::cell::RefCell;

    fn creative() -> CreativeRecord {
        CreativeRecord {
            creative_id: CreativeId::new("c1"),
            campaign_id: CampaignId::new("camp1"),
            advertiser_id: AdvertiserId::new("adv1"),
            title: "Title".into(),
            body: "Body".into(),
            cta_text: "Go".into(),
            landing_url: "https://example.com".into(),
            campaign_name: "Campaign".into(),
            description: None,
            updated_at: None,
            topics: vec![],
            locales: vec![],
            verticals: vec![],
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
            cpm: 1.0,
            target_engagement_rate: None,
            enabled: true,
        }
    }

    struct StubAnalytics {
        today: CampaignStats,
        total: CampaignStats,
        recent: CampaignStats,
        calls: RefCell<u32>,
    }

    impl AnalyticsStore for StubAnalytics {
        fn record_match(&self, _event: &crate::model::AnalyticsEvent) -> Result<(), MatchError> {
            Ok(())
        }

        fn stats(
            &self,
            _campaign_id: &CampaignId,
            since: Option<OffsetDateTime>,
            _until: Option<OffsetDateTime>,
        ) -> Result<CampaignStats, MatchError> {
            *self.calls.borrow_mut() += 1;
            Ok(if since.is_some() { self.today.clone() } else { self.total.clone() })
        }

        fn recent_stats(
            &self,
            _campaign_id: &CampaignId,
            _window: Duration,
        ) -> Result<CampaignStats, MatchError> {
            Ok(self.recent.clone())
        }

        fn summary(&self, _since: Option<OffsetDateTime>) -> Result<Vec<(CampaignId, CampaignStats)>, MatchError> {
            Ok(vec![])
        }

        fn campaign_report(
            &self,
            _campaign_id: &CampaignId,
            _since: Option<OffsetDateTime>,
            _until: Option<OffsetDateTime>,
        ) -> Result<crate::interfaces::CampaignReport, MatchError> {
            Ok(crate::interfaces::CampaignReport { stats: self.total.clone(), top_creatives: vec![] })
        }
    }

    fn zero_stats() -> CampaignStats {
        CampaignStats { impressions: 0, spend: 0.0, avg_score: 0.0, avg_pacing_weight: 0.0, window_start: None, window_end: None }
    }

    #[test]
    fn no_analytics_admits_at_full_weight() {
        let decision = PacingEngine::evaluate(&creative(), None, OffsetDateTime::now_utc()).expect("evaluate");
        assert_eq!(decision.reason, PacingReason::NoAnalytics);
        assert_eq!(decision.weight, 1.0);
        assert!(decision.admitted);
    }

    #[test]
    fn total_budget_exhausted_denies() {
        let mut c = creative();
        c.total_budget = Some(10.0);
        let analytics = StubAnalytics {
            today: zero_stats(),
            total: CampaignStats { spend: 10.0, ..zero_stats() },
            recent: zero_stats(),
            calls: RefCell::new(0),
        };
        let decision = PacingEngine::evaluate(&c, Some(&analytics), OffsetDateTime::now_utc()).expect("evaluate");
        assert_eq!(decision.reason, PacingReason::TotalBudgetExhausted);
        assert_eq!(decision.weight, 0.0);
        assert!(!decision.admitted);
    }

    #[test]
    fn daily_budget_exhausted_denies() {
        let mut c = creative();
        c.daily_budget = Some(0.5);
        let analytics = StubAnalytics {
            today: CampaignStats { spend: 1.0, ..zero_stats() },
            total: zero_stats(),
            recent: zero_stats(),
            calls: RefCell::new(0),
        };
        let decision = PacingEngine::evaluate(&c, Some(&analytics), OffsetDateTime::now_utc()).expect("evaluate");
        assert_eq!(decision.reason, PacingReason::DailyBudgetExhausted);
    }

    #[test]
    fn within_budget_admits_at_full_weight() {
        let mut c = creative();
        c.daily_budget = Some(100.0);
        let analytics = StubAnalytics {
            today: zero_stats(),
            total: zero_stats(),
            recent: zero_stats(),
            calls: RefCell::new(0),
        };
        let decision = PacingEngine::evaluate(&c, Some(&analytics), OffsetDateTime::now_utc()).expect("evaluate");
        assert_eq!(decision.reason, PacingReason::WithinBudget);
        assert_eq!(decision.weight, 1.0);
    }

    #[test]
    fn adaptive_mode_paces_down_on_low_engagement() {
        let mut c = creative();
        c.pacing_mode = PacingMode::Adaptive;
        c.target_engagement_rate = Some(0.5);
        let analytics = StubAnalytics {
            today: zero_stats(),
            total: zero_stats(),
            recent: CampaignStats { avg_score: 0.1, ..zero_stats() },
            calls: RefCell::new(0),
        };
        let decision = PacingEngine::evaluate(&c, Some(&analytics), OffsetDateTime::now_utc()).expect("evaluate");
        assert_eq!(decision.weight, 0.8);
        assert_eq!(decision.reason, PacingReason::Paced);
    }
}
