use crate::{
    provider::{AddressLookup, AddressResolver, ProviderError},
    types::{Evidence, ProbeOutcome},
};
use std::sync::Arc;
use tracing::debug;

pub(crate) async fn probe(resolver: Arc<dyn AddressResolver>, domain: String) -> ProbeOutcome {
    let outcome = classify(resolver.resolve_a(&domain).await);
    debug!(domain = %domain, signal = ?outcome.signal, reason = %outcome.reason, "resolution probe");
    outcome
}

/// Maps an A-record lookup onto a probe outcome. Positive means the domain
/// resolves.
pub fn classify(lookup: Result<AddressLookup, ProviderError>) -> ProbeOutcome {
    match lookup {
        Ok(AddressLookup::Found(addresses)) if addresses.is_empty() => {
            ProbeOutcome::negative("no address records")
        }
        Ok(AddressLookup::Found(addresses)) => {
            let reason = match addresses.len() {
                1 => "resolves to 1 address".to_string(),
                n => format!("resolves to {} addresses", n),
            };
            ProbeOutcome::positive(reason).with_evidence(Evidence {
                addresses,
                ..Default::default()
            })
        }
        Ok(AddressLookup::NoSuchDomain) => {
            ProbeOutcome::negative("domain does not resolve (NXDOMAIN)")
        }
        Err(e) => ProbeOutcome::indeterminate(format!("resolution failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Signal;
    use std::{net::IpAddr, time::Duration};

    #[test]
    fn addresses_resolve() {
        let addresses: Vec<IpAddr> = vec!["93.184.216.34".parse().unwrap()];
        let outcome = classify(Ok(AddressLookup::Found(addresses.clone())));

        assert_eq!(outcome.signal, Signal::Positive);
        assert_eq!(outcome.evidence.addresses, addresses);
    }

    #[test]
    fn nxdomain_does_not_resolve() {
        let outcome = classify(Ok(AddressLookup::NoSuchDomain));
        assert_eq!(outcome.signal, Signal::Negative);
    }

    #[test]
    fn empty_answer_does_not_resolve() {
        let outcome = classify(Ok(AddressLookup::Found(Vec::new())));
        assert_eq!(outcome.signal, Signal::Negative);
    }

    #[test]
    fn resolver_failure_is_indeterminate() {
        let outcome = classify(Err(ProviderError::Timeout(Duration::from_secs(10))));

        assert_eq!(outcome.signal, Signal::Indeterminate);
        assert_eq!(outcome.reason, "resolution failed: timed out after 10s");
    }
}
