//! Structured text reports of a sequence and its last replay.
//!
//! Plain text rather than JSON so a failing scenario prints something a
//! person can read at a glance.

use std::fmt;

use feature_engine::Outcome;
use featseq_types::{FeatureType, InstructionVector};

use crate::helpers::HarnessError;
use crate::oracle::{run_codec_checks, OracleVerdict};
use crate::workflow::SequenceBuilder;

/// A complete run report with all sections.
pub struct RunReport {
    pub feature_entries: Vec<FeatureEntry>,
    pub outcome: String,
    pub oracle_results: Vec<OracleVerdict>,
    pub warnings: Vec<String>,
}

/// A single feature's report entry.
pub struct FeatureEntry {
    pub index: usize,
    pub name: String,
    pub feature_type: FeatureType,
    /// `applied`, `failed` or `not reached`.
    pub status: String,
    pub detail: String,
    pub checkpoint: Option<String>,
    pub nonzero_slots: Vec<usize>,
}

impl RunReport {
    /// Format the report as text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("=== Feature Sequence Report ===\n\n");

        let applied = self
            .feature_entries
            .iter()
            .filter(|e| e.status == "applied")
            .count();
        out.push_str(&format!(
            "Features ({} total, {} applied):\n",
            self.feature_entries.len(),
            applied,
        ));
        for entry in &self.feature_entries {
            out.push_str(&format!(
                "  [{}] {} \"{}\" {}\n",
                entry.index, entry.feature_type, entry.name, entry.status,
            ));
            if !entry.detail.is_empty() {
                out.push_str(&format!("      {}\n", entry.detail));
            }
            if let Some(cp) = &entry.checkpoint {
                out.push_str(&format!("      Checkpoint: {}\n", cp));
            }
            out.push_str(&format!("      Slots: {:?}\n", entry.nonzero_slots));
        }

        out.push_str(&format!("\nOutcome: {}\n", self.outcome));

        if !self.oracle_results.is_empty() {
            out.push_str(&format!(
                "\nOracle Results ({} checks):\n",
                self.oracle_results.len()
            ));
            for v in &self.oracle_results {
                let status = if v.passed { "PASS" } else { "FAIL" };
                out.push_str(&format!("  [{}] {}: {}\n", status, v.oracle_name, v.detail));
            }
        }

        if self.warnings.is_empty() {
            out.push_str("\nWarnings: none\n");
        } else {
            out.push_str(&format!("\nWarnings ({}):\n", self.warnings.len()));
            for w in &self.warnings {
                out.push_str(&format!("  {}\n", w));
            }
        }
        out
    }

    pub fn all_oracles_passed(&self) -> bool {
        self.oracle_results.iter().all(|v| v.passed)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl SequenceBuilder {
    /// Report of the sequence and the last replay.
    pub fn run_report(&self) -> Result<RunReport, HarnessError> {
        let run = self.report()?;
        let sequence = self.sequence();
        let vectors: Vec<InstructionVector> = self.encode();

        let feature_entries = sequence
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let step = run.steps.iter().find(|s| s.index == index);
                let failure = run.failures.iter().find(|f| f.index == index);
                let (status, detail) = match (step, failure) {
                    (Some(s), _) => ("applied", format!("host {}", s.feature)),
                    (None, Some(f)) => ("failed", format!("{}: {}", f.kind, f.reason)),
                    (None, None) => ("not reached", String::new()),
                };
                FeatureEntry {
                    index,
                    name: self.name_of(index).unwrap_or("?").to_string(),
                    feature_type: record.feature_type,
                    status: status.to_string(),
                    detail,
                    checkpoint: step
                        .and_then(|s| s.checkpoint.as_ref())
                        .map(|p| p.display().to_string()),
                    nonzero_slots: vectors[index].nonzero_slots(),
                }
            })
            .collect();

        let outcome = match &run.outcome {
            Outcome::Done => "Done".to_string(),
            Outcome::Failed(f) => format!("Failed({}, {}): {}", f.index, f.kind, f.reason),
        };

        let mut oracle_results = run_codec_checks(&sequence);
        oracle_results.push(crate::oracle::check_checkpoint_names(run));

        Ok(RunReport {
            feature_entries,
            outcome,
            oracle_results,
            warnings: run.warnings.clone(),
        })
    }
}
