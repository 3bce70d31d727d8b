mod dns;
mod endpoint;
mod evaluator;
mod fallback;
mod fuse;
mod http;
pub mod provider;
mod rdap;
pub mod registration;
pub mod resolution;
pub mod tlds;
mod types;
mod whois;

pub use dns::DnsResolver;
pub use endpoint::{EndpointError, EndpointRegistry};
pub use evaluator::{EvaluationError, Evaluator, InputError, SetupError};
pub use fallback::FallbackRegistry;
pub use fuse::fuse;
pub use rdap::RdapClient;
pub use tlds::expand_tlds;
pub use types::{
    DnsUpstream, DomainEvaluation, Evidence, ProbeConfig, ProbeOutcome, RegistrationSource,
    Signal, Verdict,
};
pub use whois::WhoisClient;

/// Evaluates one domain with [`Evaluator::new`].
///
/// That evaluator reads registration data over WHOIS only. For the RDAP
/// source described by [`ProbeConfig::default`], build one with
/// [`Evaluator::connect`].
pub async fn evaluate_one(domain: &str) -> DomainEvaluation {
    Evaluator::new().evaluate(domain).await
}

/// Evaluates several domains concurrently with [`Evaluator::new`], which
/// uses WHOIS only. Results keep the input order.
pub async fn evaluate_many<I, S>(domains: I) -> Result<Vec<DomainEvaluation>, InputError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Evaluator::new().evaluate_batch(domains).await
}
