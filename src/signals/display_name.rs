use crate::config::WeightsConfig;
use crate::signals::{ReasonCategory, SignalKind, SignalResult};
use std::sync::Arc;

/// Two independent checks on the From display name: a generic
/// name/domain mismatch and brand-keyword impersonation. Both may
/// fire on the same message.
pub struct DisplayNameProvider {
    config: Arc<WeightsConfig>,
}

impl DisplayNameProvider {
    pub fn new(config: Arc<WeightsConfig>) -> Self {
        Self { config }
    }

    pub fn check(&self, display_name: &str, base_domain: &str) -> SignalResult {
        let mut result = SignalResult::known(SignalKind::DisplayName);
        let weights = &self.config.weights;
        let display_lower = display_name.to_lowercase();
        let domain_lower = base_domain.to_lowercase();

        if let Some(token) = first_token(&display_lower) {
            if !domain_lower.contains(token) {
                result.add(
                    weights.display_name_mismatch,
                    ReasonCategory::DisplayNameMismatch,
                    format!("display name \"{display_name}\" does not match domain {base_domain}"),
                );
            }
        }

        // A brand keyword in the display name is only legitimate when
        // the registrable label IS that brand; a substring test would
        // wave through look-alikes such as paypal-support.net.
        let domain_label = domain_lower.split('.').next().unwrap_or("");
        for keyword in &self.config.brand_keywords {
            let keyword = keyword.to_lowercase();
            if display_lower.contains(&keyword) && domain_label != keyword {
                result.add(
                    weights.brand_impersonation,
                    ReasonCategory::BrandImpersonation,
                    format!(
                        "display name \"{display_name}\" claims brand \"{keyword}\" but sender domain is {base_domain}"
                    ),
                );
                break;
            }
        }

        result
    }
}

/// First recognizable token: leading run of alphanumeric characters.
fn first_token(display_name: &str) -> Option<&str> {
    let trimmed = display_name.trim_start_matches(|c: char| !c.is_alphanumeric());
    let end = trimmed
        .find(|c: char| !c.is_alphanumeric())
        .unwrap_or(trimmed.len());
    if end == 0 {
        None
    } else {
        Some(&trimmed[..end])
    }
}
