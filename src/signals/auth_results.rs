use crate::config::WeightsConfig;
use crate::signals::{ReasonCategory, SignalKind, SignalResult};
use std::sync::Arc;

const FAIL_TOKENS: [&str; 4] = ["fail", "none", "temperror", "permerror"];

/// Evaluates SPF, DKIM and DMARC outcomes by substring match against
/// the lower-cased Authentication-Results text. A missing header means
/// no matches at all: no penalty, no bonus.
pub struct AuthResultsProvider {
    config: Arc<WeightsConfig>,
}

impl AuthResultsProvider {
    pub fn new(config: Arc<WeightsConfig>) -> Self {
        Self { config }
    }

    pub fn check(&self, auth_results: &str) -> SignalResult {
        let mut result = SignalResult::known(SignalKind::AuthHeaders);
        let weights = &self.config.weights;

        if auth_results.is_empty() {
            result.note(ReasonCategory::Info, "no authentication-results header");
            return result;
        }

        let mechanisms = [
            ("spf", weights.spf_fail),
            ("dkim", weights.dkim_fail),
            ("dmarc", weights.dmarc_fail),
        ];

        for (mechanism, penalty) in mechanisms {
            if let Some(token) = FAIL_TOKENS
                .iter()
                .find(|t| auth_results.contains(&format!("{mechanism}={t}")))
            {
                result.add(
                    penalty,
                    ReasonCategory::AuthFailure,
                    format!("{mechanism} check did not pass ({mechanism}={token})"),
                );
            }

            if weights.auth_pass_bonus != 0 && auth_results.contains(&format!("{mechanism}=pass")) {
                result.add(
                    -weights.auth_pass_bonus,
                    ReasonCategory::AuthPass,
                    format!("{mechanism} check passed"),
                );
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> AuthResultsProvider {
        AuthResultsProvider::new(Arc::new(WeightsConfig::default()))
    }

    #[test]
    fn absent_header_is_neutral() {
        let result = provider().check("");
        assert_eq!(result.points, 0);
        assert_eq!(result.reasons[0].category, ReasonCategory::Info);
    }

    #[test]
    fn dkim_fail_and_spf_pass_both_apply() {
        let result = provider().check("mx.example.com; dkim=fail; spf=pass");
        // net contribution = penalty - bonus
        assert_eq!(result.points, 25 - 5);
        assert!(result
            .reasons
            .iter()
            .any(|r| r.category == ReasonCategory::AuthFailure));
        assert!(result
            .reasons
            .iter()
            .any(|r| r.category == ReasonCategory::AuthPass));
    }

    #[test]
    fn each_mechanism_scores_independently() {
        let result = provider().check("spf=temperror; dkim=none; dmarc=permerror");
        assert_eq!(result.points, 25 + 25 + 25);
        assert_eq!(result.reasons.len(), 3);
    }

    #[test]
    fn one_penalty_per_mechanism_even_with_multiple_tokens() {
        let result = provider().check("spf=fail (also spf=none later)");
        assert_eq!(result.points, 25);
        assert_eq!(result.reasons.len(), 1);
    }

    #[test]
    fn softfail_is_not_fail() {
        let result = provider().check("spf=softfail");
        assert_eq!(result.points, 0);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn all_pass_yields_trust_bonus() {
        let result = provider().check("spf=pass; dkim=pass; dmarc=pass");
        assert_eq!(result.points, -15);
    }
}
