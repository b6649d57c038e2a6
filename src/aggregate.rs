use crate::config::Thresholds;
use crate::signals::{ReasonCategory, SignalResult};
use serde::{Deserialize, Serialize};

pub const MAX_SCORE: i32 = 100;
const OVERRIDE_REASON: &str = "Known phishing domain.";
const NO_FINDINGS: &str = "Nothing suspicious was found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Boundary values belong to the higher tier.
    pub fn from_score(score: i32, thresholds: &Thresholds) -> Self {
        if score < thresholds.low {
            Severity::Low
        } else if score < thresholds.high {
            Severity::Medium
        } else {
            Severity::High
        }
    }
}

/// The aggregated, explainable verdict for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeResult {
    pub total_score: i32,
    pub severity: Severity,
    /// Every contributing detail, in fixed provider order.
    pub technical_reasons: Vec<String>,
    /// Short deduplicated human-facing subset.
    pub user_reasons: Vec<String>,
    pub override_applied: bool,
}

/// Collapse all provider results into one bounded score. Runs only
/// after every provider has produced a result.
pub fn aggregate(results: &[SignalResult], thresholds: &Thresholds) -> CompositeResult {
    if results.iter().any(|r| r.override_score) {
        return CompositeResult {
            total_score: MAX_SCORE,
            severity: Severity::from_score(MAX_SCORE, thresholds),
            technical_reasons: vec![OVERRIDE_REASON.to_string()],
            user_reasons: vec![OVERRIDE_REASON.to_string()],
            override_applied: true,
        };
    }

    let sum: i32 = results.iter().map(|r| r.points).sum();
    let total_score = sum.clamp(0, MAX_SCORE);

    let technical_reasons: Vec<String> = results
        .iter()
        .flat_map(|r| r.reasons.iter())
        .map(|reason| reason.detail.clone())
        .collect();

    let mut user_reasons: Vec<String> = Vec::new();
    for reason in results.iter().flat_map(|r| r.reasons.iter()) {
        if let Some(message) = user_message(reason.category) {
            if !user_reasons.iter().any(|m| m == message) {
                user_reasons.push(message.to_string());
            }
        }
    }
    if user_reasons.is_empty() {
        user_reasons.push(NO_FINDINGS.to_string());
    }

    CompositeResult {
        total_score,
        severity: Severity::from_score(total_score, thresholds),
        technical_reasons,
        user_reasons,
        override_applied: false,
    }
}

/// Curated per-category messages for the human reviewer. DNS, WHOIS
/// and link-shape findings stay technical-only.
fn user_message(category: ReasonCategory) -> Option<&'static str> {
    match category {
        ReasonCategory::AuthFailure => {
            Some("Email authentication (SPF/DKIM/DMARC) reported a failure.")
        }
        ReasonCategory::DisplayNameMismatch => {
            Some("The sender's name does not match the sender's domain.")
        }
        ReasonCategory::BrandImpersonation => {
            Some("The sender appears to impersonate a well-known brand.")
        }
        ReasonCategory::ReplyToMismatch => {
            Some("Replies would go to a different domain than the sender's.")
        }
        ReasonCategory::UrgencyLanguage => {
            Some("The message uses urgent or time-pressure language.")
        }
        ReasonCategory::Reputation => Some("The message links to a known phishing domain."),
        _ => None,
    }
}
