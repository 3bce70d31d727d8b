use crate::{
    endpoint::extract_tld,
    provider::{ProviderError, RawRecord, RecordLookup, RegistrationProvider},
};
use async_trait::async_trait;
use std::{collections::HashMap, time::Duration};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const WHOIS_PORT: u16 = 43;
const MAX_RESPONSE_BYTES: u64 = 256 * 1024;
const IANA_WHOIS: &str = "whois.iana.org";

const NOT_FOUND_MARKERS: &[&str] = &[
    "no match",
    "not found",
    "no data found",
    "no entries found",
    "no object found",
];

const FREE_STATUSES: &[&str] = &["free", "available"];

const STATUS_KEYS: &[&str] = &["domain status", "status"];
const REGISTRAR_KEYS: &[&str] = &[
    "registrar",
    "sponsoring registrar",
    "registrar name",
    "registrar handle",
];
const CREATED_KEYS: &[&str] = &[
    "creation date",
    "created",
    "created on",
    "registered on",
    "registration time",
];

fn builtin_server(tld: &str) -> Option<&'static str> {
    let server = match tld {
        "com" | "net" => "whois.verisign-grs.com",
        "org" => "whois.pir.org",
        "io" => "whois.nic.io",
        "dev" | "app" => "whois.nic.google",
        "ai" => "whois.nic.ai",
        "co" => "whois.nic.co",
        "me" => "whois.nic.me",
        "no" => "whois.norid.no",
        "uk" => "whois.nic.uk",
        "de" => "whois.denic.de",
        _ => return None,
    };
    Some(server)
}

/// WHOIS over TCP port 43.
///
/// Servers come from a small built-in table, then from IANA's referral for
/// the TLD.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    timeout: Duration,
    port: u16,
    overrides: HashMap<String, String>,
}

impl WhoisClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            port: WHOIS_PORT,
            overrides: HashMap::new(),
        }
    }

    /// Pins the server used for `tld`, skipping the table and referral.
    pub fn with_server(mut self, tld: &str, server: impl Into<String>) -> Self {
        self.overrides.insert(tld.to_lowercase(), server.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    async fn server_for(&self, tld: &str) -> Result<String, ProviderError> {
        if let Some(server) = self.overrides.get(tld) {
            return Ok(server.clone());
        }
        if let Some(server) = builtin_server(tld) {
            return Ok(server.to_string());
        }

        let referral = self.query(IANA_WHOIS, tld).await?;
        parse_referral(&referral).ok_or_else(|| ProviderError::NoServer(tld.to_string()))
    }

    async fn query(&self, server: &str, query: &str) -> Result<String, ProviderError> {
        let result = tokio::time::timeout(self.timeout, async {
            let mut stream = TcpStream::connect((server, self.port)).await?;
            stream.write_all(format!("{}\r\n", query).as_bytes()).await?;

            let mut response = Vec::new();
            (&mut stream).take(MAX_RESPONSE_BYTES).read_to_end(&mut response).await?;

            Ok::<_, std::io::Error>(String::from_utf8_lossy(&response).into_owned())
        })
        .await;

        match result {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(ProviderError::Io(e)),
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl RegistrationProvider for WhoisClient {
    async fn lookup(&self, domain: &str) -> Result<RecordLookup, ProviderError> {
        let tld = extract_tld(domain).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let server = self.server_for(&tld).await?;
        let response = self.query(&server, domain).await?;
        Ok(parse_response(&response))
    }
}

fn parse_referral(response: &str) -> Option<String> {
    response.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        let key = key.trim().to_lowercase();
        let value = value.trim();
        if (key == "whois" || key == "refer") && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

pub(crate) fn parse_response(response: &str) -> RecordLookup {
    if response.trim().is_empty() {
        return RecordLookup::Absent;
    }

    let mut record = RawRecord {
        raw_text: Some(response.to_string()),
        ..Default::default()
    };
    let mut free_status = None;

    let lines: Vec<&str> = response.lines().collect();
    for (i, &line) in lines.iter().enumerate() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        // "Registrar Handle...........: REG42-NORID"
        let key = key.trim().trim_end_matches('.').trim_end().to_lowercase();
        let is_status = STATUS_KEYS.contains(&key.as_str());
        let is_registrar = REGISTRAR_KEYS.contains(&key.as_str());

        let mut value = value.trim();
        if value.is_empty() && (is_status || is_registrar) {
            value = continuation(line, &lines[i + 1..]).unwrap_or_default();
        }
        if value.is_empty() {
            continue;
        }

        if is_status {
            // "clientTransferProhibited https://icann.org/epp#..." keeps only the code.
            let code = value.split_whitespace().next().unwrap_or(value);
            if FREE_STATUSES.contains(&code.to_lowercase().as_str()) {
                free_status.get_or_insert(line.trim());
            } else {
                record.statuses.push(code.to_string());
            }
        } else if record.registrar.is_none() && is_registrar {
            record.registrar = Some(value.to_string());
        } else if record.creation_date.is_none() && CREATED_KEYS.contains(&key.as_str()) {
            record.creation_date = Some(value.to_string());
        }
    }

    // Footers of registered answers may mention "not found" too, so markers
    // only count when the answer carries no ownership data.
    if record.statuses.is_empty() && record.registrar.is_none() {
        let marker = free_status.or_else(|| {
            response.lines().map(str::trim).find(|line| {
                let lower = line.to_lowercase();
                NOT_FOUND_MARKERS.iter().any(|marker| lower.contains(marker))
            })
        });
        if let Some(line) = marker {
            return RecordLookup::NoSuchRecord(line.to_string());
        }
    }

    RecordLookup::Present(record)
}

fn indent(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Value written on the line after its key, indented deeper than the key:
///
/// ```text
///     Registrar:
///         Example Registrar Ltd [Tag = EXAMPLE]
/// ```
fn continuation<'a>(key_line: &str, rest: &[&'a str]) -> Option<&'a str> {
    let next = rest.iter().copied().find(|line| !line.trim().is_empty())?;
    (indent(next) > indent(key_line)).then(|| next.trim())
}
