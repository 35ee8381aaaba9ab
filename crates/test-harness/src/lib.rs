//! Test harness for scripting feature sequences.
//!
//! Provides programmatic tools for building multi-feature sequences by
//! name, encoding and replaying them, and checking the results.
//!
//! # Key Components
//!
//! - [`SequenceBuilder`] - Fluent API for building and replaying sequences
//! - [`oracle`] - Verification functions returning pass/fail verdicts
//! - [`report`] - Structured text run descriptions
//! - [`helpers`] - Profile builders and record constructors
//! - [`assertions`] - Rich assertion helpers with diagnostics

pub mod assertions;
pub mod helpers;
pub mod oracle;
pub mod report;
pub mod workflow;

pub use helpers::HarnessError;
pub use oracle::OracleVerdict;
pub use report::RunReport;
pub use workflow::SequenceBuilder;
