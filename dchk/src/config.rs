use libprobe_fuse::{DnsUpstream, ProbeConfig, RegistrationSource};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::PathBuf, time::Duration};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tlds: TldConfig,
    #[serde(default)]
    pub dns: DnsConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TldConfig {
    #[serde(default)]
    pub always: Vec<String>,
    #[serde(default)]
    pub never: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DnsConfig {
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
    #[serde(default = "default_lifetime")]
    pub lifetime_secs: u64,
    #[serde(default)]
    pub upstream: DnsUpstream,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            query_timeout_secs: default_query_timeout(),
            lifetime_secs: default_lifetime(),
            upstream: DnsUpstream::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RegistrationConfig {
    #[serde(default)]
    pub source: RegistrationSource,
    #[serde(default = "default_lookup_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            source: RegistrationSource::default(),
            timeout_secs: default_lookup_timeout(),
            deadline_secs: None,
        }
    }
}

fn default_query_timeout() -> u64 {
    5
}

fn default_lifetime() -> u64 {
    10
}

fn default_lookup_timeout() -> u64 {
    10
}

impl Config {
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            lookup_timeout: Duration::from_secs(self.registration.timeout_secs),
            dns_query_timeout: Duration::from_secs(self.dns.query_timeout_secs),
            dns_lifetime: Duration::from_secs(self.dns.lifetime_secs),
            registration_deadline: self.registration.deadline_secs.map(Duration::from_secs),
            source: self.registration.source,
            upstream: self.dns.upstream,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("dchk").join("config.toml"))
}

pub fn load_config() -> Config {
    config_path()
        .and_then(|path| std::fs::read_to_string(&path).ok())
        .and_then(|content| match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable config file");
                None
            }
        })
        .unwrap_or_default()
}

/// TLDs to try for a bare name: the requested ones, or the configured
/// `always` list, minus anything in `never`.
pub fn select_tlds(requested: Option<Vec<String>>, config: &Config) -> Vec<String> {
    let never_set: HashSet<_> = config.tlds.never.iter().map(|s| s.to_lowercase()).collect();

    let mut seen = HashSet::new();
    requested
        .unwrap_or_else(|| config.tlds.always.clone())
        .into_iter()
        .map(|tld| tld.trim().trim_start_matches('.').to_lowercase())
        .filter(|tld| !tld.is_empty() && !never_set.contains(tld))
        .filter(|tld| seen.insert(tld.clone()))
        .collect()
}

pub fn get_default_config_toml() -> String {
    r#"# dchk configuration

[tlds]
# TLDs tried when a bare name (no dot) is given without --tlds
always = ["com", "net", "org", "io", "dev"]

# TLDs never tried
# never = ["xxx"]
never = []

[dns]
# Per-query timeout and total lookup budget, in seconds
query_timeout_secs = 5
lifetime_secs = 10
# system, google, cloudflare or quad9
upstream = "google"

[registration]
# whois, rdap or rdap-whois (RDAP with WHOIS fallback)
source = "rdap-whois"
timeout_secs = 10
# Give up on a registration lookup after this many seconds (unset: wait)
# deadline_secs = 30
"#
    .to_string()
}
