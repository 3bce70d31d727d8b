use crate::{
    provider::{ProviderError, RawRecord, RecordLookup, RegistrationProvider},
    types::{Evidence, ProbeOutcome},
};
use std::{sync::Arc, time::Duration};
use tracing::debug;

const RAW_EXCERPT_LIMIT: usize = 500;

pub(crate) async fn probe(
    provider: Arc<dyn RegistrationProvider>,
    domain: String,
    deadline: Option<Duration>,
) -> ProbeOutcome {
    let lookup = match deadline {
        Some(limit) => match tokio::time::timeout(limit, provider.lookup(&domain)).await {
            Ok(result) => result,
            Err(_) => {
                return ProbeOutcome::indeterminate(format!(
                    "registration lookup exceeded deadline of {:?}",
                    limit
                ))
            }
        },
        None => provider.lookup(&domain).await,
    };

    let outcome = classify(lookup);
    debug!(domain = %domain, signal = ?outcome.signal, reason = %outcome.reason, "registration probe");
    outcome
}

/// Maps a registration lookup onto a probe outcome. Positive means the
/// domain looks unregistered.
pub fn classify(lookup: Result<RecordLookup, ProviderError>) -> ProbeOutcome {
    match lookup {
        Ok(RecordLookup::Absent) => ProbeOutcome::positive("no record found"),
        Ok(RecordLookup::Present(record)) if record.is_empty() => {
            ProbeOutcome::positive("no record found")
        }
        Ok(RecordLookup::Present(record)) => classify_record(record),
        Ok(RecordLookup::NoSuchRecord(message)) => {
            ProbeOutcome::positive(format!("no such record: {}", message))
        }
        Err(e) => ProbeOutcome::indeterminate(format!("lookup failed: {}", e)),
    }
}

fn classify_record(record: RawRecord) -> ProbeOutcome {
    let RawRecord {
        statuses,
        registrar,
        creation_date,
        raw_text,
    } = record;

    if !statuses.is_empty() {
        return ProbeOutcome::negative("active status present").with_evidence(Evidence {
            statuses,
            registrar,
            creation_date,
            ..Default::default()
        });
    }

    if registrar.is_some() {
        return ProbeOutcome::negative("registrar present").with_evidence(Evidence {
            registrar,
            creation_date,
            ..Default::default()
        });
    }

    let raw_excerpt = raw_text.map(|text| text.chars().take(RAW_EXCERPT_LIMIT).collect::<String>());

    ProbeOutcome::indeterminate("ambiguous record").with_evidence(Evidence {
        creation_date,
        raw_excerpt,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Signal;

    #[test]
    fn absent_record_is_positive() {
        let outcome = classify(Ok(RecordLookup::Absent));
        assert_eq!(outcome.signal, Signal::Positive);
        assert_eq!(outcome.reason, "no record found");
    }

    #[test]
    fn status_wins_over_registrar() {
        let outcome = classify(Ok(RecordLookup::Present(RawRecord {
            statuses: vec!["clientTransferProhibited".to_string()],
            registrar: Some("Example Registrar, Inc.".to_string()),
            creation_date: Some("1995-08-14".to_string()),
            raw_text: Some("Domain Name: EXAMPLE.COM".to_string()),
        })));

        assert_eq!(outcome.signal, Signal::Negative);
        assert_eq!(outcome.reason, "active status present");
        assert_eq!(outcome.evidence.registrar.as_deref(), Some("Example Registrar, Inc."));
        assert_eq!(outcome.evidence.creation_date.as_deref(), Some("1995-08-14"));
        assert!(outcome.evidence.raw_excerpt.is_none());
    }

    #[test]
    fn registrar_without_status_is_negative() {
        let outcome = classify(Ok(RecordLookup::Present(RawRecord {
            registrar: Some("Registrar AS".to_string()),
            ..Default::default()
        })));

        assert_eq!(outcome.signal, Signal::Negative);
        assert_eq!(outcome.reason, "registrar present");
    }

    #[test]
    fn ambiguous_record_keeps_bounded_excerpt() {
        let text = "x".repeat(2_000);
        let outcome = classify(Ok(RecordLookup::Present(RawRecord {
            raw_text: Some(text),
            ..Default::default()
        })));

        assert_eq!(outcome.signal, Signal::Indeterminate);
        assert_eq!(outcome.reason, "ambiguous record");
        assert_eq!(outcome.evidence.raw_excerpt.map(|e| e.len()), Some(RAW_EXCERPT_LIMIT));
    }

    #[test]
    fn no_such_record_is_positive_with_message() {
        let outcome = classify(Ok(RecordLookup::NoSuchRecord(
            "No match for \"FREE.COM\".".to_string(),
        )));

        assert_eq!(outcome.signal, Signal::Positive);
        assert!(outcome.reason.contains("No match for"));
    }

    #[test]
    fn provider_failure_is_indeterminate() {
        let outcome = classify(Err(ProviderError::Timeout(Duration::from_secs(10))));

        assert_eq!(outcome.signal, Signal::Indeterminate);
        assert!(outcome.reason.starts_with("lookup failed: timed out"));
    }

    struct Hanging;

    #[async_trait::async_trait]
    impl RegistrationProvider for Hanging {
        async fn lookup(&self, _domain: &str) -> Result<RecordLookup, ProviderError> {
            futures::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_turns_hang_into_indeterminate() {
        let outcome = probe(
            Arc::new(Hanging),
            "slow.test".to_string(),
            Some(Duration::from_secs(3)),
        )
        .await;

        assert_eq!(outcome.signal, Signal::Indeterminate);
        assert!(outcome.reason.contains("deadline"));
    }
}
