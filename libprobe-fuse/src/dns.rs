use crate::{
    provider::{AddressLookup, AddressResolver, ProviderError},
    types::DnsUpstream,
};
use async_trait::async_trait;
use hickory_resolver::{
    config::{ResolverConfig, ResolverOpts},
    error::{ResolveError, ResolveErrorKind},
    proto::op::ResponseCode,
    TokioAsyncResolver,
};
use std::{net::IpAddr, time::Duration};

/// A-record lookups through hickory's Tokio resolver.
///
/// `query_timeout` bounds each query sent to a nameserver; `lifetime` bounds
/// the whole lookup including retries. Both are fixed at construction, so one
/// resolver can be shared by any number of concurrent probes.
pub struct DnsResolver {
    inner: TokioAsyncResolver,
    lifetime: Duration,
}

impl DnsResolver {
    pub fn new(config: ResolverConfig, mut opts: ResolverOpts, query_timeout: Duration, lifetime: Duration) -> Self {
        opts.timeout = query_timeout;
        Self {
            inner: TokioAsyncResolver::tokio(config, opts),
            lifetime,
        }
    }

    pub fn google(query_timeout: Duration, lifetime: Duration) -> Self {
        Self::new(ResolverConfig::google(), ResolverOpts::default(), query_timeout, lifetime)
    }

    pub fn for_upstream(
        upstream: DnsUpstream,
        query_timeout: Duration,
        lifetime: Duration,
    ) -> Result<Self, ProviderError> {
        let (config, opts) = match upstream {
            DnsUpstream::System => hickory_resolver::system_conf::read_system_conf()
                .map_err(|e| ProviderError::Resolver(format!("reading system resolver config: {}", e)))?,
            DnsUpstream::Google => (ResolverConfig::google(), ResolverOpts::default()),
            DnsUpstream::Cloudflare => (ResolverConfig::cloudflare(), ResolverOpts::default()),
            DnsUpstream::Quad9 => (ResolverConfig::quad9(), ResolverOpts::default()),
        };
        Ok(Self::new(config, opts, query_timeout, lifetime))
    }
}

#[async_trait]
impl AddressResolver for DnsResolver {
    async fn resolve_a(&self, domain: &str) -> Result<AddressLookup, ProviderError> {
        match tokio::time::timeout(self.lifetime, self.inner.ipv4_lookup(domain)).await {
            Ok(Ok(lookup)) => Ok(AddressLookup::Found(
                lookup.iter().map(|a| IpAddr::V4(a.0)).collect(),
            )),
            Ok(Err(e)) => classify_error(e),
            Err(_) => Err(ProviderError::Timeout(self.lifetime)),
        }
    }
}

fn classify_error(e: ResolveError) -> Result<AddressLookup, ProviderError> {
    match e.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => match *response_code {
            ResponseCode::NXDomain => Ok(AddressLookup::NoSuchDomain),
            // NOERROR without A records: the name exists but has no address.
            ResponseCode::NoError => Err(ProviderError::NoAnswer),
            code => Err(ProviderError::Resolver(format!("nameserver answered {}", code))),
        },
        _ => Err(ProviderError::Resolver(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_resolver::proto::{
        op::Query,
        rr::{Name, RecordType},
    };

    fn no_records(response_code: ResponseCode) -> ResolveError {
        ResolveErrorKind::NoRecordsFound {
            query: Box::new(Query::query(Name::from_ascii("example.test.").unwrap(), RecordType::A)),
            soa: None,
            negative_ttl: None,
            response_code,
            trusted: true,
        }
        .into()
    }

    #[test]
    fn nxdomain_is_no_such_domain() {
        assert!(matches!(
            classify_error(no_records(ResponseCode::NXDomain)),
            Ok(AddressLookup::NoSuchDomain)
        ));
    }

    #[test]
    fn empty_noerror_answer_is_no_answer() {
        assert!(matches!(
            classify_error(no_records(ResponseCode::NoError)),
            Err(ProviderError::NoAnswer)
        ));
    }

    #[test]
    fn servfail_is_a_resolver_error() {
        assert!(matches!(
            classify_error(no_records(ResponseCode::ServFail)),
            Err(ProviderError::Resolver(msg)) if msg.contains("Server Failure")
        ));
    }

    #[test]
    fn generic_errors_stay_errors() {
        let err = ResolveError::from("connection refused");
        assert!(matches!(classify_error(err), Err(ProviderError::Resolver(msg)) if msg.contains("refused")));
    }

    #[tokio::test]
    async fn builds_with_public_upstreams() {
        for upstream in [DnsUpstream::Google, DnsUpstream::Cloudflare, DnsUpstream::Quad9] {
            let resolver =
                DnsResolver::for_upstream(upstream, Duration::from_secs(5), Duration::from_secs(10)).unwrap();
            assert_eq!(resolver.lifetime, Duration::from_secs(10));
        }
    }
}
