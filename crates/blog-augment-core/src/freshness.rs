//! Cache-freshness gate for AI artifacts.
//!
//! A stored summary + keyword list may be reused only while it is younger
//! than [`artifact_ttl`] and every part of it is present. `force` always
//! regenerates. There is no partial invalidation: the artifact is reused
//! or regenerated as a whole.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::{Article, Artifact};

/// Time-to-live of a generated summary, in days.
pub const ARTIFACT_TTL_DAYS: i64 = 7;

/// [`ARTIFACT_TTL_DAYS`] as a [`Duration`].
pub fn artifact_ttl() -> Duration {
    Duration::days(ARTIFACT_TTL_DAYS)
}

/// Stored artifact fields, any of which may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactState {
    pub summary: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub generated_at: Option<DateTime<Utc>>,
}

impl From<&Article> for ArtifactState {
    fn from(a: &Article) -> Self {
        ArtifactState {
            summary: a.summary.clone(),
            keywords: a.keywords.clone(),
            generated_at: a.ai_summary_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegenerateReason {
    Forced,
    MissingSummary,
    MissingKeywords,
    MissingTimestamp,
    Expired,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FreshnessDecision {
    Reuse(Artifact),
    Regenerate(RegenerateReason),
}

impl FreshnessDecision {
    pub fn is_reuse(&self) -> bool {
        matches!(self, FreshnessDecision::Reuse(_))
    }
}

/// Decide whether the stored artifact can be reused at `now`.
///
/// Reuse requires `!force`, a summary, a keyword list, a timestamp, and
/// `now - generated_at < artifact_ttl()`. An artifact exactly one TTL old is
/// already stale.
pub fn decide(state: &ArtifactState, force: bool, now: DateTime<Utc>) -> FreshnessDecision {
    if force {
        return FreshnessDecision::Regenerate(RegenerateReason::Forced);
    }
    let Some(summary) = &state.summary else {
        return FreshnessDecision::Regenerate(RegenerateReason::MissingSummary);
    };
    let Some(keywords) = &state.keywords else {
        return FreshnessDecision::Regenerate(RegenerateReason::MissingKeywords);
    };
    let Some(generated_at) = state.generated_at else {
        return FreshnessDecision::Regenerate(RegenerateReason::MissingTimestamp);
    };
    if now - generated_at >= artifact_ttl() {
        return FreshnessDecision::Regenerate(RegenerateReason::Expired);
    }

    FreshnessDecision::Reuse(Artifact {
        summary: summary.clone(),
        keywords: keywords.clone(),
        generated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_state(age: Duration, now: DateTime<Utc>) -> ArtifactState {
        ArtifactState {
            summary: Some("summary".to_string()),
            keywords: Some(vec!["rust".to_string()]),
            generated_at: Some(now - age),
        }
    }

    #[test]
    fn test_just_under_ttl_is_reused() {
        let now = Utc::now();
        let state = full_state(artifact_ttl() - Duration::seconds(1), now);
        assert!(decide(&state, false, now).is_reuse());
    }

    #[test]
    fn test_exactly_ttl_regenerates() {
        let now = Utc::now();
        let state = full_state(artifact_ttl(), now);
        assert_eq!(
            decide(&state, false, now),
            FreshnessDecision::Regenerate(RegenerateReason::Expired)
        );
        let state = full_state(artifact_ttl() + Duration::days(30), now);
        assert!(!decide(&state, false, now).is_reuse());
    }

    #[test]
    fn test_force_always_regenerates() {
        let now = Utc::now();
        for age in [Duration::zero(), Duration::days(3), Duration::days(8)] {
            assert_eq!(
                decide(&full_state(age, now), true, now),
                FreshnessDecision::Regenerate(RegenerateReason::Forced)
            );
        }
    }

    #[test]
    fn test_three_days_old_returns_cached_verbatim() {
        let now = Utc::now();
        let state = full_state(Duration::days(3), now);
        match decide(&state, false, now) {
            FreshnessDecision::Reuse(a) => {
                assert_eq!(a.summary, "summary");
                assert_eq!(a.keywords, vec!["rust".to_string()]);
                assert_eq!(Some(a.generated_at), state.generated_at);
            }
            other => panic!("expected reuse, got {:?}", other),
        }
    }

    #[test]
    fn test_any_missing_field_regenerates() {
        let now = Utc::now();
        let base = full_state(Duration::days(1), now);

        let mut s = base.clone();
        s.summary = None;
        assert_eq!(
            decide(&s, false, now),
            FreshnessDecision::Regenerate(RegenerateReason::MissingSummary)
        );

        let mut s = base.clone();
        s.keywords = None;
        assert_eq!(
            decide(&s, false, now),
            FreshnessDecision::Regenerate(RegenerateReason::MissingKeywords)
        );

        let mut s = base;
        s.generated_at = None;
        assert_eq!(
            decide(&s, false, now),
            FreshnessDecision::Regenerate(RegenerateReason::MissingTimestamp)
        );

        assert!(!decide(&ArtifactState::default(), false, now).is_reuse());
    }
}
