use console::Style;
use libprobe_fuse::{DomainEvaluation, ProbeOutcome, Signal, Verdict};

pub fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Available => "LIKELY AVAILABLE",
        Verdict::NotAvailable => "NOT AVAILABLE",
        Verdict::Unclear => "UNCLEAR",
    }
}

fn verdict_style(verdict: Verdict) -> Style {
    match verdict {
        Verdict::Available => Style::new().green().bold(),
        Verdict::NotAvailable => Style::new().red().bold(),
        Verdict::Unclear => Style::new().yellow().bold(),
    }
}

fn registration_label(outcome: Option<&ProbeOutcome>) -> &'static str {
    match outcome.map(|o| o.signal) {
        Some(Signal::Positive) => "Available",
        Some(Signal::Negative) => "Registered",
        Some(Signal::Indeterminate) => "Unclear",
        None => "Failed",
    }
}

fn resolution_label(outcome: Option<&ProbeOutcome>) -> &'static str {
    match outcome.map(|o| o.signal) {
        Some(Signal::Positive) => "Resolving",
        Some(Signal::Negative) => "Not resolving",
        Some(Signal::Indeterminate) => "Error",
        None => "Failed",
    }
}

pub fn render_table(results: &[DomainEvaluation]) -> String {
    let dim = Style::new().dim();
    let mut out = String::new();

    for result in results {
        out.push_str(&format!(
            "{:<30} {}\n",
            result.domain,
            verdict_style(result.verdict).apply_to(verdict_label(result.verdict))
        ));
        out.push_str(&format!(
            "  {} {}\n",
            dim.apply_to("registration:"),
            detail(registration_label(result.registration.as_ref()), result.registration.as_ref())
        ));
        out.push_str(&format!(
            "  {} {}\n",
            dim.apply_to("dns:         "),
            detail(resolution_label(result.resolution.as_ref()), result.resolution.as_ref())
        ));
        if let Some(error) = &result.error {
            out.push_str(&format!("  {} {}\n", Style::new().magenta().apply_to("error:"), error));
        }
    }

    out
}

fn detail(label: &str, outcome: Option<&ProbeOutcome>) -> String {
    let Some(outcome) = outcome else {
        return label.to_string();
    };

    let mut extra = Vec::new();
    if let Some(registrar) = &outcome.evidence.registrar {
        extra.push(format!("registrar {}", registrar));
    }
    if let Some(created) = &outcome.evidence.creation_date {
        extra.push(format!("created {}", created));
    }
    if !outcome.evidence.addresses.is_empty() {
        let addresses: Vec<String> = outcome.evidence.addresses.iter().map(|a| a.to_string()).collect();
        extra.push(addresses.join(", "));
    }

    if extra.is_empty() {
        format!("{} ({})", label, outcome.reason)
    } else {
        format!("{} ({}; {})", label, outcome.reason, extra.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libprobe_fuse::Evidence;
    use std::time::Duration;

    #[test]
    fn table_shows_verdict_reasons_and_error() {
        console::set_colors_enabled(false);

        let results = vec![
            DomainEvaluation {
                domain: "example.com".to_string(),
                verdict: Verdict::NotAvailable,
                registration: Some(ProbeOutcome::negative("registrar present").with_evidence(Evidence {
                    registrar: Some("Example Registrar, Inc.".to_string()),
                    ..Default::default()
                })),
                resolution: Some(ProbeOutcome::positive("resolves to 1 address").with_evidence(Evidence {
                    addresses: vec!["93.184.216.34".parse().unwrap()],
                    ..Default::default()
                })),
                error: None,
                duration: Duration::from_millis(40),
            },
            DomainEvaluation::failed("broken.test", "evaluation panicked: boom"),
        ];

        let table = render_table(&results);

        assert!(table.contains("NOT AVAILABLE"));
        assert!(table.contains("Registered (registrar present; registrar Example Registrar, Inc.)"));
        assert!(table.contains("Resolving (resolves to 1 address; 93.184.216.34)"));
        assert!(table.contains("broken.test"));
        assert!(table.contains("UNCLEAR"));
        assert!(table.contains("error: evaluation panicked: boom"));
    }
}
