//! Run orchestration and tooling for the isoclass engine.
//!
//! This crate provides:
//! - Input loading: schema-versioned group and proof sets as JSON
//! - Run orchestration: sharded classification, proof verification,
//!   conjugacy checking over a loaded group set
//! - Merge: stitching worker outputs back together with coverage checks
//! - Proof staging: first-wins dedup of generated certificates into a
//!   master proof set
//! - Structured logging: JSONL log contract with schema validation
//! - Report generation: human-readable + machine-readable run reports

#![forbid(unsafe_code)]

pub mod input;
pub mod merge;
pub mod report;
pub mod runner;
pub mod staging;
pub mod structured_log;

pub use input::{GroupSet, InputError, ProofSet, SCHEMA_VERSION};
pub use merge::{Assignment, MergedResult, merge_results};
pub use report::ClassificationReport;
pub use runner::{HarnessError, ProofVerdict, RunOptions, Runner, WorkerResult};
pub use staging::{StagingReport, stage_proofs};
pub use structured_log::{
    ArtifactIndex, LogEmitter, LogEntry, LogLevel, Outcome, Phase, validate_log_file,
    validate_log_line,
};
