use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

const IANA_BOOTSTRAP_URL: &str = "https://data.iana.org/rdap/dns.json";

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("Failed to fetch IANA bootstrap: {0}")]
    FetchError(#[from] reqwest::Error),
    #[error("Invalid domain format: {0}")]
    InvalidDomain(String),
}

#[derive(Debug, Deserialize)]
struct IanaBootstrap {
    services: Vec<(Vec<String>, Vec<String>)>,
}

/// TLD to RDAP base URL map. Built once, read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct EndpointRegistry {
    endpoints: HashMap<String, String>,
}

impl EndpointRegistry {
    pub async fn bootstrap(client: &Client) -> Result<Self, EndpointError> {
        let resp: IanaBootstrap = client
            .get(IANA_BOOTSTRAP_URL)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let registry = Self::from_services(resp.services);
        info!(tlds = registry.endpoints.len(), "RDAP bootstrap loaded");
        Ok(registry)
    }

    fn from_services(services: Vec<(Vec<String>, Vec<String>)>) -> Self {
        let mut endpoints = HashMap::new();
        for (tlds, urls) in services {
            // IANA lists https before http when both exist.
            if let Some(url) = urls.iter().find(|u| u.starts_with("https://")).or(urls.first()) {
                let base_url = url.trim_end_matches('/').to_string();
                for tld in tlds {
                    endpoints.insert(tld.to_lowercase(), base_url.clone());
                }
            }
        }
        Self { endpoints }
    }

    pub fn get_endpoint(&self, tld: &str) -> Option<&str> {
        self.endpoints.get(&tld.to_lowercase()).map(String::as_str)
    }
}

pub fn extract_tld(domain: &str) -> Result<String, EndpointError> {
    domain
        .trim_end_matches('.')
        .rsplit('.')
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .ok_or_else(|| EndpointError::InvalidDomain(domain.to_string()))
}
