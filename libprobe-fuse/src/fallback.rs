use crate::provider::{ProviderError, RecordLookup, RegistrationProvider};
use async_trait::async_trait;
use tracing::debug;

/// Asks `primary` first and falls back to `secondary` when it errors.
///
/// Only errors trigger the fallback: an answer from the primary, even an
/// ambiguous one, is returned as is.
pub struct FallbackRegistry<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackRegistry<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl<P, S> RegistrationProvider for FallbackRegistry<P, S>
where
    P: RegistrationProvider,
    S: RegistrationProvider,
{
    async fn lookup(&self, domain: &str) -> Result<RecordLookup, ProviderError> {
        match self.primary.lookup(domain).await {
            Ok(lookup) => Ok(lookup),
            Err(e) => {
                debug!(domain, error = %e, "primary registration lookup failed, falling back");
                self.secondary.lookup(domain).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Failing;

    #[async_trait]
    impl RegistrationProvider for Failing {
        async fn lookup(&self, _domain: &str) -> Result<RecordLookup, ProviderError> {
            Err(ProviderError::RateLimited)
        }
    }

    #[derive(Default)]
    struct Counting(AtomicUsize);

    #[async_trait]
    impl RegistrationProvider for Counting {
        async fn lookup(&self, _domain: &str) -> Result<RecordLookup, ProviderError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(RecordLookup::Absent)
        }
    }

    #[tokio::test]
    async fn falls_back_on_error() {
        let registry = FallbackRegistry::new(Failing, Counting::default());

        assert_eq!(registry.lookup("free.test").await.unwrap(), RecordLookup::Absent);
        assert_eq!(registry.secondary.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn primary_answer_skips_secondary() {
        let registry = FallbackRegistry::new(Counting::default(), Counting::default());

        registry.lookup("free.test").await.unwrap();
        assert_eq!(registry.primary.0.load(Ordering::SeqCst), 1);
        assert_eq!(registry.secondary.0.load(Ordering::SeqCst), 0);
    }
}
