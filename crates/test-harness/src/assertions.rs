//! Rich assertion helpers with diagnostic output.
//!
//! Every failure includes expected vs actual plus the run's failure list,
//! so a broken scenario can be diagnosed from the message alone.

use cad_host::MockHost;
use feature_engine::{Outcome, ReconstructionReport};
use feature_ops::ErrorKind;

use crate::helpers::HarnessError;

fn failure_lines(report: &ReconstructionReport) -> String {
    if report.failures.is_empty() {
        return "  none".to_string();
    }
    report
        .failures
        .iter()
        .map(|f| format!("  [{}] {} {}: {}", f.index, f.feature_type, f.kind, f.reason))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assert the run reached `Done` with no skipped features.
pub fn assert_clean_run(report: &ReconstructionReport, ctx: &str) -> Result<(), HarnessError> {
    if report.outcome.is_done() && report.failures.is_empty() {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!(
                "[{}] expected a clean run, outcome {:?}.\nFailures:\n{}",
                ctx,
                report.outcome,
                failure_lines(report)
            ),
        })
    }
}

/// Assert the run terminated in `Failed` at `index` with `kind`.
pub fn assert_failed_at(
    report: &ReconstructionReport,
    index: usize,
    kind: ErrorKind,
    ctx: &str,
) -> Result<(), HarnessError> {
    match &report.outcome {
        Outcome::Failed(f) if f.index == index && f.kind == kind => Ok(()),
        other => Err(HarnessError::AssertionFailed {
            detail: format!(
                "[{}] expected Failed({}, {}), got {:?}.\nFailures:\n{}",
                ctx,
                index,
                kind,
                other,
                failure_lines(report)
            ),
        }),
    }
}

/// Assert exactly these step indices were applied, in order.
pub fn assert_applied(
    report: &ReconstructionReport,
    expected: &[usize],
    ctx: &str,
) -> Result<(), HarnessError> {
    let actual = report.applied_indices();
    if actual == expected {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!(
                "[{}] applied steps: expected {:?}, got {:?}.\nFailures:\n{}",
                ctx,
                expected,
                actual,
                failure_lines(report)
            ),
        })
    }
}

/// Assert the host created features of these kinds, in order.
pub fn assert_host_features(
    host: &MockHost,
    expected: &[&str],
    ctx: &str,
) -> Result<(), HarnessError> {
    let actual = host.feature_kinds();
    if actual == expected {
        Ok(())
    } else {
        let failed: Vec<String> = host
            .journal()
            .iter()
            .filter(|e| !e.ok)
            .map(|e| format!("  call {}: {}", e.call, e.operation))
            .collect();
        Err(HarnessError::AssertionFailed {
            detail: format!(
                "[{}] host features: expected {:?}, got {:?}.\nRejected calls:\n{}",
                ctx,
                expected,
                actual,
                if failed.is_empty() {
                    "  none".to_string()
                } else {
                    failed.join("\n")
                },
            ),
        })
    }
}
