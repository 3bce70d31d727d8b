use crate::types::{ProbeOutcome, Signal, Verdict};

/// Combines the two probe outcomes into a verdict.
///
/// A registration record is decisive on its own since DNS may lag behind or
/// point at a parking page. Available needs both probes to agree the name is
/// free; every other combination stays Unclear.
pub fn fuse(registration: &ProbeOutcome, resolution: &ProbeOutcome) -> Verdict {
    match (registration.signal, resolution.signal) {
        (Signal::Negative, _) => Verdict::NotAvailable,
        (Signal::Positive, Signal::Negative) => Verdict::Available,
        (Signal::Positive, Signal::Positive | Signal::Indeterminate) => Verdict::Unclear,
        (Signal::Indeterminate, _) => Verdict::Unclear,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(signal: Signal) -> ProbeOutcome {
        match signal {
            Signal::Positive => ProbeOutcome::positive("p"),
            Signal::Negative => ProbeOutcome::negative("n"),
            Signal::Indeterminate => ProbeOutcome::indeterminate("i"),
        }
    }

    #[test]
    fn decision_table() {
        use Signal::*;

        let table = [
            (Positive, Negative, Verdict::Available),
            (Positive, Positive, Verdict::Unclear),
            (Positive, Indeterminate, Verdict::Unclear),
            (Negative, Positive, Verdict::NotAvailable),
            (Negative, Negative, Verdict::NotAvailable),
            (Negative, Indeterminate, Verdict::NotAvailable),
            (Indeterminate, Positive, Verdict::Unclear),
            (Indeterminate, Negative, Verdict::Unclear),
            (Indeterminate, Indeterminate, Verdict::Unclear),
        ];

        for (registration, resolution, expected) in table {
            let r = outcome(registration);
            let d = outcome(resolution);
            assert_eq!(fuse(&r, &d), expected, "{:?} x {:?}", registration, resolution);
            assert_eq!(fuse(&r, &d), fuse(&r, &d));
        }
    }

    #[test]
    fn reasons_and_evidence_do_not_affect_verdict() {
        let bare = ProbeOutcome::positive("no record found");
        let noisy = ProbeOutcome::positive("no such record: NOT FOUND");
        let nx = ProbeOutcome::negative("domain does not resolve (NXDOMAIN)");

        assert_eq!(fuse(&bare, &nx), fuse(&noisy, &nx));
    }
}
