use crate::{
    endpoint::{extract_tld, EndpointError, EndpointRegistry},
    http::rdap_http_client,
    provider::{ProviderError, RawRecord, RecordLookup, RegistrationProvider},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct RdapDomain {
    #[serde(default)]
    status: Vec<String>,
    #[serde(default)]
    entities: Vec<RdapEntity>,
    #[serde(default)]
    events: Vec<RdapEvent>,
}

#[derive(Debug, Deserialize)]
struct RdapEntity {
    #[serde(default)]
    roles: Vec<String>,
    #[serde(rename = "vcardArray", default)]
    vcard_array: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RdapEvent {
    #[serde(rename = "eventAction")]
    action: String,
    #[serde(rename = "eventDate", default)]
    date: Option<String>,
}

/// RDAP lookups against the registry endpoint IANA lists for the TLD.
#[derive(Debug, Clone)]
pub struct RdapClient {
    client: Client,
    registry: EndpointRegistry,
    timeout: Duration,
}

impl RdapClient {
    /// Fetches the IANA bootstrap file and builds a client around it.
    pub async fn bootstrap(timeout: Duration) -> Result<Self, EndpointError> {
        let client = rdap_http_client(timeout)?;
        let registry = EndpointRegistry::bootstrap(&client).await?;
        Ok(Self::with_registry(client, registry, timeout))
    }

    pub fn with_registry(client: Client, registry: EndpointRegistry, timeout: Duration) -> Self {
        Self {
            client,
            registry,
            timeout,
        }
    }
}

#[async_trait]
impl RegistrationProvider for RdapClient {
    async fn lookup(&self, domain: &str) -> Result<RecordLookup, ProviderError> {
        let tld = extract_tld(domain).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let endpoint = self
            .registry
            .get_endpoint(&tld)
            .ok_or(ProviderError::NoServer(tld))?;
        let url = format!("{}/domain/{}", endpoint, domain);

        let response = match tokio::time::timeout(self.timeout, self.client.get(&url).send()).await {
            Ok(result) => result?,
            Err(_) => return Err(ProviderError::Timeout(self.timeout)),
        };

        match response.status() {
            StatusCode::NOT_FOUND => Ok(RecordLookup::NoSuchRecord(format!(
                "RDAP object not found at {}",
                endpoint
            ))),
            StatusCode::OK => {
                let body = response.text().await?;
                parse_domain(&body).map(RecordLookup::Present)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::RateLimited),
            status => Err(ProviderError::Status(status.as_u16())),
        }
    }
}

fn parse_domain(body: &str) -> Result<RawRecord, ProviderError> {
    let domain: RdapDomain =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    let registrar = domain
        .entities
        .iter()
        .filter(|e| e.roles.iter().any(|r| r == "registrar"))
        .find_map(|e| e.vcard_array.as_ref().and_then(vcard_name));

    let creation_date = domain
        .events
        .iter()
        .find(|e| e.action == "registration")
        .and_then(|e| e.date.clone());

    Ok(RawRecord {
        statuses: domain.status,
        registrar,
        creation_date,
        raw_text: Some(body.to_string()),
    })
}

// ["vcard", [["version", {}, "text", "4.0"], ["fn", {}, "text", "Name"]]]
fn vcard_name(vcard: &Value) -> Option<String> {
    vcard
        .get(1)?
        .as_array()?
        .iter()
        .find(|prop| prop.get(0).and_then(Value::as_str) == Some("fn"))?
        .get(3)?
        .as_str()
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE_COM: &str = r#"{
        "objectClassName": "domain",
        "ldhName": "EXAMPLE.COM",
        "status": ["client delete prohibited", "client transfer prohibited"],
        "entities": [
            {"objectClassName": "entity", "roles": ["technical"]},
            {
                "objectClassName": "entity",
                "roles": ["registrar"],
                "vcardArray": ["vcard", [["version", {}, "text", "4.0"], ["fn", {}, "text", "Example Registrar, Inc."]]]
            }
        ],
        "events": [
            {"eventAction": "expiration", "eventDate": "2025-08-13T04:00:00Z"},
            {"eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z"}
        ]
    }"#;

    #[test]
    fn parses_registrar_status_and_creation() {
        let record = parse_domain(EXAMPLE_COM).unwrap();

        assert_eq!(record.registrar.as_deref(), Some("Example Registrar, Inc."));
        assert_eq!(record.creation_date.as_deref(), Some("1995-08-14T04:00:00Z"));
        assert_eq!(record.statuses.len(), 2);
    }

    #[test]
    fn sparse_object_parses_to_empty_fields() {
        let record = parse_domain(r#"{"objectClassName": "domain"}"#).unwrap();

        assert!(record.statuses.is_empty());
        assert!(record.registrar.is_none());
        assert!(record.raw_text.is_some());
    }

    #[test]
    fn non_json_body_is_malformed() {
        assert!(matches!(
            parse_domain("<html>busy</html>"),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn unknown_tld_has_no_server() {
        let client = RdapClient::with_registry(
            Client::new(),
            EndpointRegistry::default(),
            Duration::from_secs(1),
        );

        assert!(matches!(
            client.lookup("example.zz").await,
            Err(ProviderError::NoServer(tld)) if tld == "zz"
        ));
    }
}
