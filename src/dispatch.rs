use crate::signals::{SignalKind, SignalResult};
use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A (provider kind, domain) job handed to a remote worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupJob {
    pub kind: SignalKind,
    pub domain: String,
}

/// Optional remote execution backend for the latency-bound providers.
/// May be entirely absent; the engine behaves correctly without it.
#[async_trait]
pub trait RemoteWorkerPool: Send + Sync {
    async fn submit(&self, job: LookupJob) -> Result<SignalResult>;
}

/// Strategy that tries the remote pool under a bounded wait and falls
/// back to the local provider on any dispatch error or timeout. The
/// caller sees one call contract either way.
pub struct Dispatcher {
    pool: Option<Arc<dyn RemoteWorkerPool>>,
    wait: Duration,
}

impl Dispatcher {
    pub fn new(pool: Option<Arc<dyn RemoteWorkerPool>>, wait: Duration) -> Self {
        Self { pool, wait }
    }

    pub async fn run<F, Fut>(&self, job: LookupJob, local: F) -> SignalResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SignalResult>,
    {
        if let Some(pool) = &self.pool {
            match tokio::time::timeout(self.wait, pool.submit(job.clone())).await {
                Ok(Ok(result)) => {
                    log::debug!("remote {} lookup for {} succeeded", job.kind, job.domain);
                    return result;
                }
                Ok(Err(e)) => {
                    log::warn!(
                        "remote {} lookup for {} failed ({e}), running locally",
                        job.kind,
                        job.domain
                    );
                }
                Err(_) => {
                    log::warn!(
                        "remote {} lookup for {} timed out after {:?}, running locally",
                        job.kind,
                        job.domain,
                        self.wait
                    );
                }
            }
        }
        local().await
    }
}
