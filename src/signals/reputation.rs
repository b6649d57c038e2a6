use crate::config::WeightsConfig;
use crate::message::base_domain;
use crate::reputation::ReputationStore;
use crate::signals::{ReasonCategory, SignalKind, SignalResult};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Queries the known-bad domain store. A sender match signals the
/// score override; a link-host match only adds the configured penalty.
/// An unavailable store reads as "no match", never as an error.
pub struct ReputationProvider {
    store: Arc<dyn ReputationStore>,
    config: Arc<WeightsConfig>,
}

impl ReputationProvider {
    pub fn new(store: Arc<dyn ReputationStore>, config: Arc<WeightsConfig>) -> Self {
        Self { store, config }
    }

    pub fn check(&self, sender_base_domain: &str, urls: &BTreeSet<String>) -> SignalResult {
        let mut result = SignalResult::known(SignalKind::Reputation);

        if !sender_base_domain.is_empty() && self.lookup(sender_base_domain) {
            result.override_score = true;
            result.add(
                self.config.weights.reputation_link,
                ReasonCategory::Reputation,
                "Known phishing domain.",
            );
            return result;
        }

        let mut flagged: BTreeSet<String> = BTreeSet::new();
        for url in urls {
            let Some(host) = crate::signals::links::host_of(url) else {
                continue;
            };
            let host_base = base_domain(&host);
            if host_base != sender_base_domain && !flagged.contains(&host_base) && self.lookup(&host_base)
            {
                result.add(
                    self.config.weights.reputation_link,
                    ReasonCategory::Reputation,
                    format!("link target {host_base} is a known phishing domain"),
                );
                flagged.insert(host_base);
            }
        }

        result
    }

    fn lookup(&self, domain: &str) -> bool {
        match self.store.contains(domain) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("reputation store unavailable ({e}), treating {domain} as unlisted");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reputation::MemoryReputationStore;
    use anyhow::{anyhow, Result};

    fn provider(domains: &[&str]) -> ReputationProvider {
        ReputationProvider::new(
            Arc::new(MemoryReputationStore::new(domains.iter().copied())),
            Arc::new(WeightsConfig::default()),
        )
    }

    fn urls(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sender_match_signals_override_with_single_reason() {
        let result = provider(&["evil.example"]).check("evil.example", &BTreeSet::new());
        assert!(result.override_score);
        assert_eq!(result.reasons.len(), 1);
        assert_eq!(result.reasons[0].detail, "Known phishing domain.");
    }

    #[test]
    fn link_match_penalizes_without_override() {
        let result = provider(&["evil.example"]).check(
            "clean.example",
            &urls(&["https://login.evil.example/verify"]),
        );
        assert!(!result.override_score);
        assert_eq!(result.points, 30);
        assert!(result.reasons[0].detail.contains("evil.example"));
    }

    #[test]
    fn duplicate_link_hosts_are_flagged_once() {
        let result = provider(&["evil.example"]).check(
            "clean.example",
            &urls(&["https://evil.example/a", "https://evil.example/b"]),
        );
        assert_eq!(result.points, 30);
        assert_eq!(result.reasons.len(), 1);
    }

    #[test]
    fn unlisted_domains_are_clean() {
        let result = provider(&["evil.example"]).check("clean.example", &BTreeSet::new());
        assert_eq!(result.points, 0);
        assert!(!result.override_score);
    }

    struct BrokenStore;

    impl ReputationStore for BrokenStore {
        fn contains(&self, _domain: &str) -> Result<bool> {
            Err(anyhow!("database locked"))
        }
    }

    #[test]
    fn store_failure_reads_as_no_match() {
        let provider = ReputationProvider::new(
            Arc::new(BrokenStore),
            Arc::new(WeightsConfig::default()),
        );
        let result = provider.check("evil.example", &BTreeSet::new());
        assert_eq!(result.points, 0);
        assert!(!result.override_score);
    }
}
