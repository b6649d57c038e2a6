use crate::config::WeightsConfig;
use crate::signals::{ReasonCategory, SignalKind, SignalResult};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::sync::Arc;
use url::Url;

/// Judges the shape of every URL found in the body. A URL may earn
/// both the IP-literal and the shortener penalty independently.
pub struct LinkProvider {
    config: Arc<WeightsConfig>,
}

impl LinkProvider {
    pub fn new(config: Arc<WeightsConfig>) -> Self {
        Self { config }
    }

    pub fn check(&self, urls: &BTreeSet<String>) -> SignalResult {
        let mut result = SignalResult::known(SignalKind::Links);
        let weights = &self.config.weights;

        if urls.is_empty() {
            result.note(ReasonCategory::Info, "no links found in message body");
            return result;
        }

        for raw in urls {
            let Some(host) = host_of(raw) else {
                log::debug!("unparseable URL skipped: {raw}");
                continue;
            };

            if host.parse::<Ipv4Addr>().is_ok() {
                result.add(
                    weights.link_contains_ip,
                    ReasonCategory::LinkIpAddress,
                    format!("link {raw} uses an IP address instead of a domain"),
                );
            }

            if let Some(shortener) = matching_shortener(&host, &self.config.url_shorteners) {
                result.add(
                    weights.link_shortener,
                    ReasonCategory::LinkShortener,
                    format!("link {raw} goes through URL shortener {shortener}"),
                );
            }
        }

        result
    }
}

/// Lower-cased host portion of a URL, if it parses.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(|h| h.to_lowercase())
}

fn matching_shortener<'a>(host: &str, shorteners: &'a [String]) -> Option<&'a str> {
    shorteners
        .iter()
        .find(|s| {
            let s = s.to_lowercase();
            host == s || host.ends_with(&format!(".{s}"))
        })
        .map(|s| s.as_str())
}
