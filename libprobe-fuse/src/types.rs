use serde::{Deserialize, Serialize};
use std::{net::IpAddr, time::Duration};

/// Three-valued result of a single probe.
///
/// What Positive means depends on the probe: for registration it means "no
/// record, looks free", for resolution it means "the name resolves".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Positive,
    Negative,
    Indeterminate,
}

/// Provider-specific facts backing a probe outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evidence {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_excerpt: Option<String>,
}

impl Evidence {
    pub fn is_empty(&self) -> bool {
        *self == Evidence::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    pub signal: Signal,
    pub reason: String,
    #[serde(skip_serializing_if = "Evidence::is_empty")]
    pub evidence: Evidence,
}

impl ProbeOutcome {
    pub fn positive(reason: impl Into<String>) -> Self {
        Self::new(Signal::Positive, reason)
    }

    pub fn negative(reason: impl Into<String>) -> Self {
        Self::new(Signal::Negative, reason)
    }

    pub fn indeterminate(reason: impl Into<String>) -> Self {
        Self::new(Signal::Indeterminate, reason)
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence = evidence;
        self
    }

    fn new(signal: Signal, reason: impl Into<String>) -> Self {
        Self {
            signal,
            reason: reason.into(),
            evidence: Evidence::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Available,
    NotAvailable,
    Unclear,
}

impl Verdict {
    pub fn is_available(&self) -> bool {
        matches!(self, Verdict::Available)
    }

    pub fn is_taken(&self) -> bool {
        matches!(self, Verdict::NotAvailable)
    }

    pub fn is_unclear(&self) -> bool {
        matches!(self, Verdict::Unclear)
    }
}

/// Everything learned about one domain in one evaluation.
///
/// The probe outcomes are `None` only when the evaluation itself failed
/// before that probe could report; `error` is then populated.
#[derive(Debug, Clone, Serialize)]
pub struct DomainEvaluation {
    pub domain: String,
    pub verdict: Verdict,
    pub registration: Option<ProbeOutcome>,
    pub resolution: Option<ProbeOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(serialize_with = "serialize_millis", rename = "duration_ms")]
    pub duration: Duration,
}

impl DomainEvaluation {
    pub fn failed(domain: impl Into<String>, error: impl ToString) -> Self {
        Self {
            domain: domain.into(),
            verdict: Verdict::Unclear,
            registration: None,
            resolution: None,
            error: Some(error.to_string()),
            duration: Duration::ZERO,
        }
    }

    /// One line explaining which evidence produced the verdict.
    pub fn summary(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(registration) = &self.registration {
            parts.push(format!("registration: {}", registration.reason));
        }
        if let Some(resolution) = &self.resolution {
            parts.push(format!("dns: {}", resolution.reason));
        }
        if let Some(error) = &self.error {
            parts.push(format!("error: {}", error));
        }
        parts.join("; ")
    }
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(duration.as_millis() as u64)
}

/// Where registration records come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistrationSource {
    Whois,
    Rdap,
    #[default]
    RdapWhois,
}

/// Which nameservers the DNS probe asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsUpstream {
    System,
    #[default]
    Google,
    Cloudflare,
    Quad9,
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Socket/HTTP timeout handed to the registration providers.
    pub lookup_timeout: Duration,
    pub dns_query_timeout: Duration,
    pub dns_lifetime: Duration,
    /// Upper bound on the whole registration probe. `None` waits for the provider.
    pub registration_deadline: Option<Duration>,
    pub source: RegistrationSource,
    pub upstream: DnsUpstream,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(10),
            dns_query_timeout: Duration::from_secs(5),
            dns_lifetime: Duration::from_secs(10),
            registration_deadline: None,
            source: RegistrationSource::default(),
            upstream: DnsUpstream::default(),
        }
    }
}
