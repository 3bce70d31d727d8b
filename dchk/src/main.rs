mod config;
mod report;

use clap::Parser;
use config::{config_path, get_default_config_toml, load_config, select_tlds};
use futures::StreamExt;
use libprobe_fuse::{
    expand_tlds, DnsUpstream, DomainEvaluation, Evaluator, InputError, ProbeConfig,
    RegistrationSource,
};
use std::{
    io::{self, Write},
    time::Duration,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dchk")]
#[command(about = "Domain availability from registration records and DNS, checked together", long_about = None)]
struct Args {
    /// Domains to check. A bare name without a dot is tried under each TLD
    domains: Vec<String>,

    /// Output results as NDJSON stream (one JSON object per line)
    #[arg(long, short = 'j')]
    ndjson: bool,

    /// Output all results as one JSON array
    #[arg(long, conflicts_with = "ndjson")]
    json: bool,

    /// Comma-separated TLDs for bare names (e.g., com,io,dev)
    #[arg(long, value_delimiter = ',')]
    tlds: Option<Vec<String>>,

    /// Registration data source: whois, rdap or rdap-whois
    #[arg(long, value_parser = parse_source)]
    source: Option<RegistrationSource>,

    /// DNS nameservers: system, google, cloudflare or quad9
    #[arg(long, value_parser = parse_upstream)]
    upstream: Option<DnsUpstream>,

    /// Per-query DNS timeout in seconds
    #[arg(long)]
    dns_timeout: Option<u64>,

    /// Total DNS lookup budget in seconds
    #[arg(long)]
    dns_lifetime: Option<u64>,

    /// Give up on a registration lookup after this many seconds
    #[arg(long)]
    deadline: Option<u64>,

    /// Log probe details to stderr
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Print the default config to stdout and exit
    #[arg(long)]
    print_default_config: bool,

    /// Write the default config to the config path and exit
    #[arg(long)]
    write_default_config: bool,
}

fn parse_source(s: &str) -> Result<RegistrationSource, String> {
    match s.to_lowercase().as_str() {
        "whois" => Ok(RegistrationSource::Whois),
        "rdap" => Ok(RegistrationSource::Rdap),
        "rdap-whois" => Ok(RegistrationSource::RdapWhois),
        other => Err(format!("unknown source '{}', expected whois, rdap or rdap-whois", other)),
    }
}

fn parse_upstream(s: &str) -> Result<DnsUpstream, String> {
    match s.to_lowercase().as_str() {
        "system" => Ok(DnsUpstream::System),
        "google" => Ok(DnsUpstream::Google),
        "cloudflare" => Ok(DnsUpstream::Cloudflare),
        "quad9" => Ok(DnsUpstream::Quad9),
        other => Err(format!(
            "unknown upstream '{}', expected system, google, cloudflare or quad9",
            other
        )),
    }
}

impl Args {
    fn apply_overrides(&self, config: &mut ProbeConfig) {
        if let Some(source) = self.source {
            config.source = source;
        }
        if let Some(upstream) = self.upstream {
            config.upstream = upstream;
        }
        if let Some(secs) = self.dns_timeout {
            config.dns_query_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.dns_lifetime {
            config.dns_lifetime = Duration::from_secs(secs);
        }
        if let Some(secs) = self.deadline {
            config.registration_deadline = Some(Duration::from_secs(secs));
        }
    }
}

fn expand_queries(queries: &[String], tlds: &[String]) -> Vec<String> {
    queries
        .iter()
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .flat_map(|q| {
            if q.contains('.') {
                vec![q.to_string()]
            } else {
                expand_tlds(q, tlds).collect()
            }
        })
        .collect()
}

// Checked before connecting, since connecting may need the network.
fn require_domains(domains: &[String]) -> Result<(), InputError> {
    if domains.is_empty() {
        Err(InputError::EmptyBatch)
    } else {
        Ok(())
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.print_default_config {
        println!("{}", get_default_config_toml());
        return Ok(());
    }

    if args.write_default_config {
        if let Some(path) = config_path() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, get_default_config_toml())?;
            println!("Default config written to: {}", path.display());
        } else {
            eprintln!("Error: Could not determine config path");
            std::process::exit(1);
        }
        return Ok(());
    }

    let config = load_config();
    let mut probe_config = config.probe_config();
    args.apply_overrides(&mut probe_config);

    let tlds = select_tlds(args.tlds.clone(), &config);
    let domains = expand_queries(&args.domains, &tlds);
    if let Err(e) = require_domains(&domains) {
        exit_input_error(e);
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let evaluator = Evaluator::connect(&probe_config).await?;

        if args.ndjson {
            return run_ndjson(&evaluator, domains).await;
        }

        let results = if domains.len() == 1 {
            vec![evaluator.evaluate(&domains[0]).await]
        } else {
            match evaluator.evaluate_batch(domains).await {
                Ok(results) => results,
                Err(e) => exit_input_error(e),
            }
        };

        if args.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        } else {
            print!("{}", report::render_table(&results));
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

async fn run_ndjson(evaluator: &Evaluator, domains: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let stream = evaluator.evaluate_stream(domains);
    futures::pin_mut!(stream);
    let mut stdout = io::stdout();

    while let Some(result) = stream.next().await {
        print_json_line(&mut stdout, &result)?;
    }

    Ok(())
}

fn print_json_line(out: &mut impl Write, result: &DomainEvaluation) -> io::Result<()> {
    let json = serde_json::to_string(result)?;
    writeln!(out, "{}", json)?;
    out.flush()
}

fn exit_input_error(e: InputError) -> ! {
    eprintln!("Error: {}", e);
    std::process::exit(2);
}
