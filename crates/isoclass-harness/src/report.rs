//! Report generation for classification runs.

use serde::{Deserialize, Serialize};

use isoclass_core::{ConjugacyStats, RunStats, TypeAudit};

use crate::runner::WorkerResult;
use crate::structured_log::now_utc;

/// A human-readable summary of one worker's classification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Report title.
    pub title: String,
    /// Timestamp (UTC).
    pub timestamp: String,
    pub worker: usize,
    pub num_workers: usize,
    pub shard_size: usize,
    pub type_count: usize,
    /// Set only when an expected count was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_match: Option<bool>,
    pub stats: RunStats,
    pub audits: Vec<TypeAudit>,
    /// Conjugacy funnel counters, when the check was run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conjugacy: Option<ConjugacyStats>,
}

impl ClassificationReport {
    #[must_use]
    pub fn from_result(title: impl Into<String>, result: &WorkerResult) -> Self {
        Self {
            title: title.into(),
            timestamp: now_utc(),
            worker: result.worker,
            num_workers: result.num_workers,
            shard_size: result.indices.len(),
            type_count: result.type_count,
            expected_match: result.expected_match,
            stats: result.stats.clone(),
            audits: result.audits.clone(),
            conjugacy: None,
        }
    }

    /// Attach conjugacy funnel counters.
    #[must_use]
    pub fn with_conjugacy(mut self, stats: ConjugacyStats) -> Self {
        self.conjugacy = Some(stats);
        self
    }

    /// Render the report as markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));
        out.push_str(&format!("- Timestamp: {}\n", self.timestamp));
        out.push_str(&format!(
            "- Worker: {} of {}\n",
            self.worker, self.num_workers
        ));
        out.push_str(&format!("- Groups in shard: {}\n", self.shard_size));
        out.push_str(&format!("- Isomorphism types: {}\n", self.type_count));
        if let Some(matched) = self.expected_match {
            out.push_str(&format!(
                "- Expected count: {}\n",
                if matched { "MATCH" } else { "MISMATCH" }
            ));
        }
        out.push_str(&format!(
            "- Buckets: {} ({} singleton)\n",
            self.stats.buckets, self.stats.singleton_buckets
        ));
        out.push_str(&format!(
            "- Merges: {} catalog, {} certificate\n",
            self.stats.catalog_merges, self.stats.certificate_merges
        ));
        out.push_str(&format!("- Direct tests: {}\n\n", self.stats.direct_tests));

        if !self.stats.distinguished_by.is_empty() {
            out.push_str("| Field | Pairs distinguished |\n");
            out.push_str("|-------|--------------------|\n");
            for (field, count) in &self.stats.distinguished_by {
                out.push_str(&format!("| {field} | {count} |\n"));
            }
            out.push('\n');
        }

        out.push_str("| Type | Representative | Order | Retained fields | Certified |\n");
        out.push_str("|------|----------------|-------|-----------------|-----------|\n");
        for audit in &self.audits {
            let fields: Vec<String> = audit
                .needed_fields
                .iter()
                .map(|f| f.to_string())
                .collect();
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                audit.type_index,
                audit.representative,
                audit.order,
                if fields.is_empty() {
                    "-".to_string()
                } else {
                    fields.join(", ")
                },
                if audit.directly_certified { "yes" } else { "no" }
            ));
        }

        if let Some(conj) = &self.conjugacy {
            out.push('\n');
            out.push_str("## Conjugacy funnel\n\n");
            out.push_str(&format!("- Pairs into L1: {}\n", conj.pairs_into_l1()));
            out.push_str(&format!("- Pairs into L2: {}\n", conj.pairs_into_l2));
            out.push_str(&format!("- Pairs into L3: {}\n", conj.pairs_into_l3));
            out.push_str(&format!("- Direct tests: {}\n", conj.direct_tests));
            out.push_str(&format!(
                "- Violations: {}\n",
                if conj.is_clean() {
                    "none".to_string()
                } else {
                    conj.violations.len().to_string()
                }
            ));
        }
        out
    }

    /// Render the report as JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}
