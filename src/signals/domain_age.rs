use crate::config::WeightsConfig;
use crate::signals::{ReasonCategory, SignalKind, SignalResult};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

/// Registration-data seam. The engine injects the TCP WHOIS client;
/// tests inject canned responses.
#[async_trait]
pub trait RegistrationLookup: Send + Sync {
    async fn fetch(&self, domain: &str) -> Result<String>;
}

/// Direct WHOIS query over TCP port 43 with a hard timeout on both
/// connect and read, so a stuck registry cannot pin a worker.
pub struct WhoisClient {
    timeout: Duration,
}

impl WhoisClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn server_for(domain: &str) -> &'static str {
        let tld = domain.rsplit('.').next().unwrap_or(domain);
        match tld {
            "com" | "net" => "whois.verisign-grs.com",
            "org" => "whois.pir.org",
            "info" => "whois.afilias.net",
            "de" => "whois.denic.de",
            "uk" => "whois.nic.uk",
            "fr" => "whois.afnic.fr",
            "nl" => "whois.domain-registry.nl",
            "ch" => "whois.nic.ch",
            "at" => "whois.nic.at",
            "io" => "whois.nic.io",
            _ => "whois.iana.org",
        }
    }
}

#[async_trait]
impl RegistrationLookup for WhoisClient {
    async fn fetch(&self, domain: &str) -> Result<String> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpStream;
        use tokio::time::timeout;

        let server = Self::server_for(domain);
        log::debug!("querying WHOIS server {server}:43 for {domain}");

        let mut stream = timeout(self.timeout, TcpStream::connect(format!("{server}:43"))).await??;
        stream.write_all(format!("{domain}\r\n").as_bytes()).await?;

        let mut response = String::new();
        timeout(self.timeout, stream.read_to_string(&mut response)).await??;

        if response.is_empty() {
            return Err(anyhow!("empty WHOIS response from {server}"));
        }
        Ok(response)
    }
}

/// Classifies the sender's base domain by registration age. Timeout,
/// parse failure and unreachable registries all collapse into the
/// "unverifiable" outcome with its configured penalty; this provider
/// never raises past its boundary.
pub struct DomainAgeProvider {
    lookup: Arc<dyn RegistrationLookup>,
    config: Arc<WeightsConfig>,
}

impl DomainAgeProvider {
    pub fn new(lookup: Arc<dyn RegistrationLookup>, config: Arc<WeightsConfig>) -> Self {
        Self { lookup, config }
    }

    pub async fn check(&self, domain: &str) -> SignalResult {
        let weights = &self.config.weights;

        let response = match self.lookup.fetch(domain).await {
            Ok(text) => text,
            Err(e) => {
                log::debug!("WHOIS lookup for {domain} failed: {e}");
                return SignalResult::unverified(
                    SignalKind::DomainAge,
                    weights.domain_age_unknown,
                    format!("registration lookup for {domain} failed ({e})"),
                );
            }
        };

        let Some(created) = parse_registration_date(&response) else {
            return SignalResult::unverified(
                SignalKind::DomainAge,
                weights.domain_age_unknown,
                format!("no registration date found for {domain}"),
            );
        };

        let age_days = (Utc::now().date_naive() - created).num_days();
        log::debug!("domain {domain} registered {created} ({age_days} days ago)");

        let mut result = SignalResult::known(SignalKind::DomainAge);
        if age_days <= 30 {
            result.add(
                weights.domain_age_new,
                ReasonCategory::DomainAge,
                format!("domain {domain} registered {age_days} days ago"),
            );
        } else if age_days <= 90 {
            result.add(
                weights.domain_age_recent,
                ReasonCategory::DomainAge,
                format!("domain {domain} registered {age_days} days ago"),
            );
        } else {
            result.note(
                ReasonCategory::Info,
                format!("domain {domain} registered on {created}"),
            );
        }
        result
    }
}

/// Find a creation/last-changed date in WHOIS text. Field patterns are
/// tried in order, then date formats in order; the first combination
/// that parses wins.
pub fn parse_registration_date(text: &str) -> Option<NaiveDate> {
    let patterns = [
        r"(?i)creation\s*date[.:]*\s*([0-9TZ:./ -]+)",
        r"(?i)created\s*(?:on)?[.:]*\s*([0-9TZ:./ -]+)",
        r"(?i)registered\s*(?:on)?[.:]*\s*([0-9TZ:./ -]+)",
        r"(?i)registration\s*date[.:]*\s*([0-9TZ:./ -]+)",
        r"(?i)changed[.:]*\s*([0-9TZ:./ -]+)",
    ];
    let formats = [
        "%Y-%m-%d",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%d.%m.%Y",
        "%d-%m-%Y",
        "%Y/%m/%d",
        "%m/%d/%Y",
    ];

    for pattern in patterns {
        let regex = Regex::new(pattern).expect("invalid WHOIS date pattern");
        for captures in regex.captures_iter(text) {
            let raw = captures.get(1).map(|m| m.as_str().trim())?;
            for format in formats {
                // Timestamps are matched on their date prefix.
                let candidate = raw
                    .trim_end_matches('Z')
                    .split_whitespace()
                    .next()
                    .unwrap_or(raw);
                if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
                    return Some(date);
                }
                if let Some(prefix) = candidate.split('T').next() {
                    if let Ok(date) = NaiveDate::parse_from_str(prefix, format) {
                        return Some(date);
                    }
                }
            }
        }
    }
    None
}
