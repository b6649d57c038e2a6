use crate::config::WeightsConfig;
use crate::message::base_domain;
use crate::signals::{ReasonCategory, SignalKind, SignalResult};
use regex::RegexSet;
use std::sync::Arc;

/// Message-content checks: reply-to divergence and urgency language.
/// Pure and synchronous.
pub struct ContentProvider {
    config: Arc<WeightsConfig>,
    urgency: RegexSet,
}

impl ContentProvider {
    pub fn new(config: Arc<WeightsConfig>) -> Self {
        let patterns: Vec<String> = config
            .urgency_patterns
            .iter()
            .map(|p| format!("(?i){p}"))
            .collect();
        let urgency = RegexSet::new(&patterns).unwrap_or_else(|e| {
            log::warn!("invalid urgency pattern in config ({e}), urgency check disabled");
            RegexSet::empty()
        });
        Self { config, urgency }
    }

    pub fn check(&self, reply_to_domain: &str, sender_base_domain: &str, body: &str) -> SignalResult {
        let mut result = SignalResult::known(SignalKind::Content);
        let weights = &self.config.weights;

        // An absent Reply-To header arrives as an empty domain and is
        // never a mismatch.
        if !reply_to_domain.is_empty()
            && !sender_base_domain.is_empty()
            && base_domain(reply_to_domain) != sender_base_domain
        {
            result.add(
                weights.reply_to_mismatch,
                ReasonCategory::ReplyToMismatch,
                format!(
                    "reply-to domain {reply_to_domain} differs from sender domain {sender_base_domain}"
                ),
            );
        }

        if let Some(index) = self.urgency.matches(body).iter().next() {
            result.add(
                weights.urgency_language,
                ReasonCategory::UrgencyLanguage,
                format!(
                    "urgent call to action in message text (pattern: {})",
                    self.config.urgency_patterns[index]
                ),
            );
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ContentProvider {
        ContentProvider::new(Arc::new(WeightsConfig::default()))
    }

    #[test]
    fn absent_reply_to_is_never_a_mismatch() {
        let result = provider().check("", "example.com", "");
        assert_eq!(result.points, 0);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn diverging_reply_to_is_penalized() {
        let result = provider().check("elsewhere.org", "example.com", "");
        assert_eq!(result.points, 15);
        assert_eq!(result.reasons[0].category, ReasonCategory::ReplyToMismatch);
    }

    #[test]
    fn reply_to_subdomain_of_sender_is_clean() {
        let result = provider().check("mail.example.com", "example.com", "");
        assert_eq!(result.points, 0);
    }

    #[test]
    fn urgency_language_is_detected_case_insensitively() {
        let result = provider().check("", "example.com", "please ACT NOW to keep access");
        assert_eq!(result.points, 10);
        assert_eq!(result.reasons[0].category, ReasonCategory::UrgencyLanguage);
    }

    #[test]
    fn urgency_fires_once_for_multiple_matches() {
        let result = provider().check(
            "",
            "example.com",
            "act now! urgent action required! act now!",
        );
        assert_eq!(result.points, 10);
        assert_eq!(result.reasons.len(), 1);
    }

    #[test]
    fn calm_body_scores_zero() {
        let result = provider().check("", "example.com", "monthly newsletter attached");
        assert_eq!(result.points, 0);
    }
}
