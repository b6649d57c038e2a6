use crate::aggregate::{aggregate, CompositeResult};
use crate::cache::TtlCache;
use crate::config::WeightsConfig;
use crate::dispatch::{Dispatcher, LookupJob, RemoteWorkerPool};
use crate::message::NormalizedMessage;
use crate::reputation::ReputationStore;
use crate::signals::auth_results::AuthResultsProvider;
use crate::signals::content::ContentProvider;
use crate::signals::display_name::DisplayNameProvider;
use crate::signals::dns_health::{DnsHealthProvider, DnsLookup, HickoryLookup};
use crate::signals::domain_age::{DomainAgeProvider, RegistrationLookup, WhoisClient};
use crate::signals::links::LinkProvider;
use crate::signals::reputation::ReputationProvider;
use crate::signals::{SignalKind, SignalResult};
use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

type SignalCache = TtlCache<(SignalKind, String), SignalResult>;

/// The risk-scoring engine: providers, shared cache, dispatch layer
/// and aggregator behind one call. Constructed once at startup with an
/// immutable config and an explicit reputation store; holds no global
/// state.
pub struct ScoreEngine {
    config: Arc<WeightsConfig>,
    cache: SignalCache,
    dispatcher: Dispatcher,
    dns: DnsHealthProvider,
    domain_age: DomainAgeProvider,
    links: LinkProvider,
    auth: AuthResultsProvider,
    display_name: DisplayNameProvider,
    content: ContentProvider,
    reputation: ReputationProvider,
}

impl ScoreEngine {
    /// Engine with the real resolver and WHOIS client and no remote
    /// worker pool.
    pub fn new(config: Arc<WeightsConfig>, store: Arc<dyn ReputationStore>) -> Result<Self> {
        let dns_lookup: Arc<dyn DnsLookup> = Arc::new(HickoryLookup::from_system_conf(
            Duration::from_secs(config.timeouts.dns_secs),
        )?);
        let registration: Arc<dyn RegistrationLookup> = Arc::new(WhoisClient::new(
            Duration::from_secs(config.timeouts.whois_secs),
        ));
        Ok(Self::with_lookups(config, store, dns_lookup, registration, None))
    }

    /// Engine with injected lookup backends and an optional remote
    /// worker pool.
    pub fn with_lookups(
        config: Arc<WeightsConfig>,
        store: Arc<dyn ReputationStore>,
        dns_lookup: Arc<dyn DnsLookup>,
        registration: Arc<dyn RegistrationLookup>,
        pool: Option<Arc<dyn RemoteWorkerPool>>,
    ) -> Self {
        let cache = TtlCache::new(Duration::from_secs(config.timeouts.cache_ttl_secs));
        let dispatcher = Dispatcher::new(pool, Duration::from_secs(config.timeouts.dispatch_secs));
        Self {
            dns: DnsHealthProvider::new(dns_lookup, config.clone()),
            domain_age: DomainAgeProvider::new(registration, config.clone()),
            links: LinkProvider::new(config.clone()),
            auth: AuthResultsProvider::new(config.clone()),
            display_name: DisplayNameProvider::new(config.clone()),
            content: ContentProvider::new(config.clone()),
            reputation: ReputationProvider::new(store, config.clone()),
            cache,
            dispatcher,
            config,
        }
    }

    /// Score one normalized message. Every provider contributes a
    /// result (or its unverifiable outcome) before aggregation; the
    /// latency-bound providers run concurrently and are joined here.
    pub async fn score(&self, msg: &NormalizedMessage) -> CompositeResult {
        let started = Instant::now();

        let (dns_result, age_result) = tokio::join!(
            self.dns_signal(&msg.base_domain),
            self.age_signal(&msg.base_domain)
        );

        let results = [
            dns_result,
            age_result,
            self.links.check(&msg.urls),
            self.reputation.check(&msg.base_domain, &msg.urls),
            self.auth.check(&msg.auth_results),
            self.display_name.check(&msg.display_name, &msg.base_domain),
            self.content
                .check(&msg.reply_to_domain, &msg.base_domain, &msg.body_text),
        ];

        let composite = aggregate(&results, &self.config.thresholds);
        log::debug!(
            "scored {} as {} ({:?}) in {:?}",
            msg.base_domain,
            composite.total_score,
            composite.severity,
            started.elapsed()
        );
        composite
    }

    async fn dns_signal(&self, domain: &str) -> SignalResult {
        if domain.is_empty() {
            return SignalResult::unverified(
                SignalKind::DnsHealth,
                self.config.weights.dns_unverifiable,
                "message has no sender domain to verify",
            );
        }
        let key = (SignalKind::DnsHealth, domain.to_string());
        self.cache
            .get_or_compute(key, || async {
                let job = LookupJob {
                    kind: SignalKind::DnsHealth,
                    domain: domain.to_string(),
                };
                self.dispatcher.run(job, || self.dns.check(domain)).await
            })
            .await
    }

    async fn age_signal(&self, domain: &str) -> SignalResult {
        if domain.is_empty() {
            return SignalResult::unverified(
                SignalKind::DomainAge,
                self.config.weights.domain_age_unknown,
                "message has no sender domain to verify",
            );
        }
        let key = (SignalKind::DomainAge, domain.to_string());
        self.cache
            .get_or_compute(key, || async {
                let job = LookupJob {
                    kind: SignalKind::DomainAge,
                    domain: domain.to_string(),
                };
                self.dispatcher
                    .run(job, || self.domain_age.check(domain))
                    .await
            })
            .await
    }
}
