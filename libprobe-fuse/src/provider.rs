//! Interfaces to the external registration and DNS providers.
//!
//! Adapters turn whatever their backend returns into the fixed shapes below
//! so the probes can classify with a total match instead of poking at loosely
//! structured responses.

use async_trait::async_trait;
use std::{net::IpAddr, sync::Arc, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("connection failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("rate limited")]
    RateLimited,
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("no server known for .{0}")]
    NoServer(String),
    #[error("no address records in answer")]
    NoAnswer,
    #[error("resolver error: {0}")]
    Resolver(String),
}

/// Registration data normalised out of a WHOIS or RDAP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub statuses: Vec<String>,
    pub registrar: Option<String>,
    pub creation_date: Option<String>,
    pub raw_text: Option<String>,
}

impl RawRecord {
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
            && self.registrar.is_none()
            && self.creation_date.is_none()
            && self.raw_text.as_deref().map_or(true, |t| t.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordLookup {
    Present(RawRecord),
    Absent,
    /// The provider explicitly reported that no such object exists.
    NoSuchRecord(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressLookup {
    Found(Vec<IpAddr>),
    NoSuchDomain,
}

#[async_trait]
pub trait RegistrationProvider: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<RecordLookup, ProviderError>;
}

#[async_trait]
pub trait AddressResolver: Send + Sync {
    async fn resolve_a(&self, domain: &str) -> Result<AddressLookup, ProviderError>;
}

/// A registration client whose lookups block the calling thread.
pub trait BlockingRegistrationProvider: Send + Sync + 'static {
    fn lookup_blocking(&self, domain: &str) -> Result<RecordLookup, ProviderError>;
}

/// Runs a [`BlockingRegistrationProvider`] on Tokio's blocking pool so a slow
/// lookup never stalls the worker threads driving other evaluations.
pub struct Offloaded<P> {
    inner: Arc<P>,
}

impl<P: BlockingRegistrationProvider> Offloaded<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

#[async_trait]
impl<P: BlockingRegistrationProvider> RegistrationProvider for Offloaded<P> {
    async fn lookup(&self, domain: &str) -> Result<RecordLookup, ProviderError> {
        let inner = Arc::clone(&self.inner);
        let domain = domain.to_string();

        match tokio::task::spawn_blocking(move || inner.lookup_blocking(&domain)).await {
            Ok(result) => result,
            // Let the evaluator see the panic as an evaluation failure.
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(ProviderError::Io(std::io::Error::other(e.to_string()))),
        }
    }
}
