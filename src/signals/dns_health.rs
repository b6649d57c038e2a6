use crate::config::WeightsConfig;
use crate::signals::{ReasonCategory, SignalKind, SignalResult};
use anyhow::Result;
use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use std::sync::Arc;
use std::time::Duration;

/// Resolver seam. The engine injects the hickory-backed implementation;
/// tests inject fixtures.
#[async_trait]
pub trait DnsLookup: Send + Sync {
    async fn has_a_record(&self, domain: &str) -> Result<bool>;
    async fn has_mx_record(&self, domain: &str) -> Result<bool>;
}

/// System-configured hickory resolver with a hard per-call timeout.
pub struct HickoryLookup {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl HickoryLookup {
    pub fn from_system_conf(timeout: Duration) -> Result<Self> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()?;
        Ok(Self { resolver, timeout })
    }
}

#[async_trait]
impl DnsLookup for HickoryLookup {
    async fn has_a_record(&self, domain: &str) -> Result<bool> {
        let lookup = tokio::time::timeout(self.timeout, self.resolver.lookup_ip(domain)).await?;
        Ok(lookup.map(|r| r.iter().next().is_some()).unwrap_or(false))
    }

    async fn has_mx_record(&self, domain: &str) -> Result<bool> {
        let lookup = tokio::time::timeout(self.timeout, self.resolver.mx_lookup(domain)).await?;
        Ok(lookup.map(|r| r.iter().next().is_some()).unwrap_or(false))
    }
}

/// Four independent checks against the sender's base domain. Any
/// individual resolver failure counts as "record absent" for that
/// check and never aborts the other three.
pub struct DnsHealthProvider {
    lookup: Arc<dyn DnsLookup>,
    config: Arc<WeightsConfig>,
}

impl DnsHealthProvider {
    pub fn new(lookup: Arc<dyn DnsLookup>, config: Arc<WeightsConfig>) -> Self {
        Self { lookup, config }
    }

    pub async fn check(&self, domain: &str) -> SignalResult {
        let mut result = SignalResult::known(SignalKind::DnsHealth);
        let weights = &self.config.weights;

        let (a_record, mx_record) = tokio::join!(
            self.lookup.has_a_record(domain),
            self.lookup.has_mx_record(domain)
        );

        match a_record {
            Ok(true) => {}
            Ok(false) => result.add(
                weights.no_a_record,
                ReasonCategory::DnsHealth,
                format!("domain {domain} has no A record"),
            ),
            Err(e) => {
                log::debug!("A lookup for {domain} failed: {e}");
                result.add(
                    weights.no_a_record,
                    ReasonCategory::DnsHealth,
                    format!("domain {domain} did not resolve ({e})"),
                );
            }
        }

        match mx_record {
            Ok(true) => {}
            Ok(false) => result.add(
                weights.no_mx,
                ReasonCategory::DnsHealth,
                format!("domain {domain} has no MX record"),
            ),
            Err(e) => {
                log::debug!("MX lookup for {domain} failed: {e}");
                result.add(
                    weights.no_mx,
                    ReasonCategory::DnsHealth,
                    format!("MX lookup for {domain} failed ({e})"),
                );
            }
        }

        if is_punycode(domain) {
            result.add(
                weights.punycode_domain,
                ReasonCategory::DnsHealth,
                format!("domain {domain} uses a punycode label (possible homograph attack)"),
            );
        }

        if let Some(tld) = abuse_tld(domain, &self.config.abuse_tlds) {
            result.add(
                weights.tld_suspect,
                ReasonCategory::DnsHealth,
                format!("domain {domain} uses high-abuse TLD .{tld}"),
            );
        }

        result
    }
}

fn is_punycode(domain: &str) -> bool {
    domain.split('.').any(|label| label.starts_with("xn--"))
}

fn abuse_tld<'a>(domain: &str, tlds: &'a [String]) -> Option<&'a str> {
    let last = domain.rsplit('.').next()?;
    tlds.iter()
        .find(|t| t.eq_ignore_ascii_case(last))
        .map(|t| t.as_str())
}
