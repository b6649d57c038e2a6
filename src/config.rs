use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Immutable scoring configuration, loaded once at process start and
/// passed by reference into every component. Loading failure is the
/// one fatal error: the engine cannot run without its weight table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    pub weights: Weights,
    pub thresholds: Thresholds,
    pub brand_keywords: Vec<String>,
    pub abuse_tlds: Vec<String>,
    pub url_shorteners: Vec<String>,
    pub urgency_patterns: Vec<String>,
    pub timeouts: Timeouts,
}

/// Point values per finding. Positive values raise suspicion;
/// `auth_pass_bonus` is subtracted when a mechanism reports pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub spf_fail: i32,
    pub dkim_fail: i32,
    pub dmarc_fail: i32,
    pub auth_pass_bonus: i32,
    pub no_a_record: i32,
    pub no_mx: i32,
    pub punycode_domain: i32,
    pub tld_suspect: i32,
    pub domain_age_new: i32,
    pub domain_age_recent: i32,
    pub domain_age_unknown: i32,
    pub dns_unverifiable: i32,
    pub link_contains_ip: i32,
    pub link_shortener: i32,
    pub reputation_link: i32,
    pub reply_to_mismatch: i32,
    pub display_name_mismatch: i32,
    pub brand_impersonation: i32,
    pub urgency_language: i32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            spf_fail: 25,
            dkim_fail: 25,
            dmarc_fail: 25,
            auth_pass_bonus: 5,
            no_a_record: 20,
            no_mx: 25,
            punycode_domain: 10,
            tld_suspect: 10,
            domain_age_new: 25,
            domain_age_recent: 15,
            domain_age_unknown: 25,
            dns_unverifiable: 10,
            link_contains_ip: 25,
            link_shortener: 10,
            reputation_link: 30,
            reply_to_mismatch: 15,
            display_name_mismatch: 10,
            brand_impersonation: 30,
            urgency_language: 10,
        }
    }
}

/// Severity band boundaries. A score below `low` is Low, below `high`
/// is Medium, everything else High; boundary values belong to the
/// higher tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub low: i32,
    pub high: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { low: 25, high: 60 }
    }
}

/// Hard time limits in seconds. External calls carry their own limit
/// independent of the dispatch wait, so a stuck lookup cannot pin a
/// worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub dns_secs: u64,
    pub whois_secs: u64,
    pub dispatch_secs: u64,
    pub cache_ttl_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            dns_secs: 5,
            whois_secs: 5,
            dispatch_secs: 10,
            cache_ttl_secs: 600,
        }
    }
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            thresholds: Thresholds::default(),
            brand_keywords: [
                "paypal",
                "amazon",
                "dhl",
                "ups",
                "fedex",
                "microsoft",
                "apple",
                "google",
                "netflix",
                "sparkasse",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            abuse_tlds: ["click", "xyz", "top", "monster", "buzz", "fit", "gq", "ml"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            url_shorteners: [
                "bit.ly",
                "tinyurl.com",
                "t.co",
                "goo.gl",
                "ow.ly",
                "is.gd",
                "v.gd",
                "tiny.cc",
                "rb.gy",
                "cutt.ly",
                "shorturl.at",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            urgency_patterns: [
                r"\bact\s+now\b",
                r"\burgent\s+action\s+required\b",
                r"\bverify\s+your\s+account\s+immediately\b",
                r"\baccount\s+will\s+be\s+(suspended|closed)\b",
                r"\bjetzt\s+sofort\b",
                r"\bkennwort\s+ändern\b",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            timeouts: Timeouts::default(),
        }
    }
}

impl WeightsConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("failed to serialize config")
    }
}
