use crate::{
    dns::DnsResolver,
    endpoint::EndpointError,
    fallback::FallbackRegistry,
    fuse::fuse,
    provider::{AddressResolver, ProviderError, RegistrationProvider},
    rdap::RdapClient,
    registration, resolution,
    types::{DomainEvaluation, ProbeConfig, RegistrationSource, Verdict},
    whois::WhoisClient,
};
use futures::{
    future::join_all,
    stream::{self, Stream, StreamExt},
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use thiserror::Error;
use tokio::task::JoinError;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("at least one domain is required")]
    EmptyBatch,
}

/// Failure outside the probes' own error handling.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("{task} panicked: {message}")]
    Panicked { task: &'static str, message: String },
    #[error("{task} was cancelled")]
    Cancelled { task: &'static str },
}

impl EvaluationError {
    fn from_join(task: &'static str, e: JoinError) -> Self {
        if !e.is_panic() {
            return Self::Cancelled { task };
        }
        let payload = e.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Panicked { task, message }
    }
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("RDAP bootstrap failed: {0}")]
    Bootstrap(#[from] EndpointError),
    #[error("DNS resolver setup failed: {0}")]
    Resolver(#[from] ProviderError),
}

/// Evaluates domains by running both probes and fusing their outcomes.
///
/// Cloning is cheap; clones share the same providers.
#[derive(Clone)]
pub struct Evaluator {
    registration: Arc<dyn RegistrationProvider>,
    resolver: Arc<dyn AddressResolver>,
    registration_deadline: Option<Duration>,
}

impl Evaluator {
    /// WHOIS for registration data and Google DNS, default timeouts.
    ///
    /// Needs no network at construction, so unlike
    /// `Evaluator::connect(&ProbeConfig::default())` it never consults RDAP.
    pub fn new() -> Self {
        let config = ProbeConfig::default();
        Self::from_parts(
            Arc::new(WhoisClient::new(config.lookup_timeout)),
            Arc::new(DnsResolver::google(config.dns_query_timeout, config.dns_lifetime)),
        )
    }

    pub fn from_parts(
        registration: Arc<dyn RegistrationProvider>,
        resolver: Arc<dyn AddressResolver>,
    ) -> Self {
        Self {
            registration,
            resolver,
            registration_deadline: None,
        }
    }

    pub fn with_registration_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.registration_deadline = deadline;
        self
    }

    /// Builds providers as described by `config`. Fetches the RDAP bootstrap
    /// when the source needs it.
    pub async fn connect(config: &ProbeConfig) -> Result<Self, SetupError> {
        let resolver =
            DnsResolver::for_upstream(config.upstream, config.dns_query_timeout, config.dns_lifetime)?;
        let whois = WhoisClient::new(config.lookup_timeout);

        let registration: Arc<dyn RegistrationProvider> = match config.source {
            RegistrationSource::Whois => Arc::new(whois),
            RegistrationSource::Rdap => Arc::new(RdapClient::bootstrap(config.lookup_timeout).await?),
            RegistrationSource::RdapWhois => match RdapClient::bootstrap(config.lookup_timeout).await {
                Ok(rdap) => Arc::new(FallbackRegistry::new(rdap, whois)),
                Err(e) => {
                    warn!(error = %e, "RDAP bootstrap failed, using WHOIS only");
                    Arc::new(whois)
                }
            },
        };

        Ok(Self::from_parts(registration, Arc::new(resolver))
            .with_registration_deadline(config.registration_deadline))
    }

    /// Runs both probes for `domain` concurrently and fuses the outcomes.
    /// Always produces a result; a probe task that dies is reported in
    /// `error` with an Unclear verdict.
    ///
    /// Dropping the returned future aborts both probe tasks.
    pub async fn evaluate(&self, domain: &str) -> DomainEvaluation {
        let start = Instant::now();

        let registration = AbortOnDropHandle::new(tokio::spawn(registration::probe(
            Arc::clone(&self.registration),
            domain.to_string(),
            self.registration_deadline,
        )));
        let resolution = AbortOnDropHandle::new(tokio::spawn(resolution::probe(
            Arc::clone(&self.resolver),
            domain.to_string(),
        )));
        let (registration, resolution) = tokio::join!(registration, resolution);

        let registration =
            registration.map_err(|e| EvaluationError::from_join("registration probe", e));
        let resolution = resolution.map_err(|e| EvaluationError::from_join("resolution probe", e));

        let (verdict, error) = match (&registration, &resolution) {
            (Ok(r), Ok(d)) => (fuse(r, d), None),
            _ => {
                let error = [registration.as_ref().err(), resolution.as_ref().err()]
                    .into_iter()
                    .flatten()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                warn!(domain, error = %error, "evaluation failed");
                (Verdict::Unclear, Some(error))
            }
        };
        debug!(domain, verdict = ?verdict, "evaluated");

        DomainEvaluation {
            domain: domain.to_string(),
            verdict,
            registration: registration.ok(),
            resolution: resolution.ok(),
            error,
            duration: start.elapsed(),
        }
    }

    /// Evaluates every domain concurrently. Results come back in input order,
    /// one per domain.
    pub async fn evaluate_batch<I, S>(&self, domains: I) -> Result<Vec<DomainEvaluation>, InputError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let domains: Vec<String> = domains.into_iter().map(Into::into).collect();
        if domains.is_empty() {
            return Err(InputError::EmptyBatch);
        }

        let handles: Vec<_> = domains
            .iter()
            .map(|domain| self.spawn_evaluation(domain.clone()))
            .collect();
        let joined = join_all(handles).await;

        Ok(domains
            .into_iter()
            .zip(joined)
            .map(|(domain, result)| settle(domain, result))
            .collect())
    }

    /// Like [`Evaluator::evaluate_batch`] but yields each result as soon as
    /// it and everything before it has finished.
    pub fn evaluate_stream<I, S>(&self, domains: I) -> impl Stream<Item = DomainEvaluation> + '_
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let domains: Vec<String> = domains.into_iter().map(Into::into).collect();
        let width = domains.len().max(1);

        stream::iter(domains)
            .map(move |domain| {
                let handle = self.spawn_evaluation(domain.clone());
                async move { settle(domain, handle.await) }
            })
            .buffered(width)
    }

    fn spawn_evaluation(&self, domain: String) -> AbortOnDropHandle<DomainEvaluation> {
        let evaluator = self.clone();
        AbortOnDropHandle::new(tokio::spawn(async move { evaluator.evaluate(&domain).await }))
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn settle(domain: String, joined: Result<DomainEvaluation, JoinError>) -> DomainEvaluation {
    joined.unwrap_or_else(|e| {
        let error = EvaluationError::from_join("evaluation", e);
        warn!(domain = %domain, error = %error, "evaluation task failed");
        DomainEvaluation::failed(domain, error)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::JoinHandle;

    #[tokio::test]
    async fn join_error_carries_panic_message() {
        let handle = tokio::spawn(async { panic!("provider exploded") });
        let error = EvaluationError::from_join("registration probe", handle.await.unwrap_err());

        assert_eq!(error.to_string(), "registration probe panicked: provider exploded");
    }

    #[tokio::test]
    async fn aborted_task_is_cancelled() {
        let handle: JoinHandle<()> = tokio::spawn(futures::future::pending());
        handle.abort();
        let error = EvaluationError::from_join("evaluation", handle.await.unwrap_err());

        assert_eq!(error.to_string(), "evaluation was cancelled");
    }

    #[tokio::test]
    async fn settle_substitutes_failed_result() {
        let handle: JoinHandle<DomainEvaluation> = tokio::spawn(async { panic!("boom") });
        let result = settle("b.test".to_string(), handle.await);

        assert_eq!(result.domain, "b.test");
        assert!(result.verdict.is_unclear());
        assert_eq!(result.error.as_deref(), Some("evaluation panicked: boom"));
    }
}
