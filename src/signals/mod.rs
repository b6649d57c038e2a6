pub mod auth_results;
pub mod content;
pub mod display_name;
pub mod dns_health;
pub mod domain_age;
pub mod links;
pub mod reputation;

use serde::{Deserialize, Serialize};

/// The independent checks the engine runs for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    DnsHealth,
    DomainAge,
    Links,
    Reputation,
    AuthHeaders,
    DisplayName,
    Content,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::DnsHealth => "dns-health",
            SignalKind::DomainAge => "domain-age",
            SignalKind::Links => "links",
            SignalKind::Reputation => "reputation",
            SignalKind::AuthHeaders => "auth-headers",
            SignalKind::DisplayName => "display-name",
            SignalKind::Content => "content",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category a reason belongs to. The aggregator groups technical
/// reasons into user-facing messages by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCategory {
    AuthFailure,
    AuthPass,
    DnsHealth,
    DomainAge,
    LinkIpAddress,
    LinkShortener,
    Reputation,
    DisplayNameMismatch,
    BrandImpersonation,
    ReplyToMismatch,
    UrgencyLanguage,
    Unverified,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    pub category: ReasonCategory,
    pub detail: String,
}

/// Whether a provider actually verified anything, or had to give up
/// and charge its configured unverifiable penalty. "Could not verify"
/// is a visible state, not an implicit zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalOutcome {
    Known,
    Unverified,
}

/// One provider's contribution: a bounded point value plus the reasons
/// behind it. Negative points are a trust bonus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalResult {
    pub kind: SignalKind,
    pub points: i32,
    pub reasons: Vec<Reason>,
    pub outcome: SignalOutcome,
    /// Set by the reputation provider when the sender's base domain is
    /// a confirmed phishing domain; the aggregator forces the score.
    pub override_score: bool,
}

impl SignalResult {
    pub fn known(kind: SignalKind) -> Self {
        Self {
            kind,
            points: 0,
            reasons: Vec::new(),
            outcome: SignalOutcome::Known,
            override_score: false,
        }
    }

    pub fn unverified(kind: SignalKind, penalty: i32, detail: impl Into<String>) -> Self {
        Self {
            kind,
            points: penalty,
            reasons: vec![Reason {
                category: ReasonCategory::Unverified,
                detail: detail.into(),
            }],
            outcome: SignalOutcome::Unverified,
            override_score: false,
        }
    }

    /// Add a scored finding. Every non-zero contribution carries at
    /// least one reason, so points and reason travel together.
    pub fn add(&mut self, points: i32, category: ReasonCategory, detail: impl Into<String>) {
        self.points += points;
        self.reasons.push(Reason {
            category,
            detail: detail.into(),
        });
    }

    /// Add an informational reason without touching the score.
    pub fn note(&mut self, category: ReasonCategory, detail: impl Into<String>) {
        self.reasons.push(Reason {
            category,
            detail: detail.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_keeps_points_and_reasons_together() {
        let mut result = SignalResult::known(SignalKind::Links);
        result.add(25, ReasonCategory::LinkIpAddress, "link uses an IP host");
        result.add(10, ReasonCategory::LinkShortener, "link uses a shortener");

        assert_eq!(result.points, 35);
        assert_eq!(result.reasons.len(), 2);
        assert_eq!(result.outcome, SignalOutcome::Known);
    }

    #[test]
    fn unverified_carries_penalty_and_reason() {
        let result = SignalResult::unverified(SignalKind::DomainAge, 25, "whois timed out");

        assert_eq!(result.points, 25);
        assert_eq!(result.outcome, SignalOutcome::Unverified);
        assert_eq!(result.reasons[0].category, ReasonCategory::Unverified);
    }
}
