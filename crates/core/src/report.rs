//! Corpus report: the aggregate of every record's validation result, every dangling edge and
//! every duplicate id.
//!
//! The report is data, not an error. A build or CI step decides what to do with it; this crate
//! only guarantees it is complete (all defects at once) and deterministic (the same corpus
//! always yields byte-identical JSON).

use crate::error::{RegistryError, RegistryResult};
use crate::index::{find_duplicate_ids, DuplicateRecord};
use crate::resolver::{resolve, DanglingEdge, ReferenceGraph};
use crate::source::{IngestedRecord, RecordOrigin};
use crate::validation::{validate_record, Severity, ValidationError, ValidationResult};
use content_schema::ContentRecord;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusReport {
    pub ingested: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Records with at least one issue, in ingestion order.
    pub records: Vec<RecordReport>,
    pub dangling: Vec<DanglingEdge>,
    pub duplicates: Vec<DuplicateRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordReport {
    pub id: String,
    pub category: String,
    pub origin: RecordOrigin,
    pub accepted: bool,
    pub issues: Vec<ValidationError>,
}

impl CorpusReport {
    /// True when any record was rejected or any id is duplicated.
    pub fn has_errors(&self) -> bool {
        self.rejected > 0 || !self.duplicates.is_empty()
    }

    /// True when any record carries a warning or any edge dangles.
    pub fn has_warnings(&self) -> bool {
        self.warning_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.count_issues(Severity::Error) + self.duplicates.len()
    }

    pub fn warning_count(&self) -> usize {
        self.count_issues(Severity::Warning) + self.dangling.len()
    }

    fn count_issues(&self, severity: Severity) -> usize {
        self.records
            .iter()
            .flat_map(|record| &record.issues)
            .filter(|issue| issue.severity() == severity)
            .count()
    }

    pub fn to_json(&self) -> RegistryResult<String> {
        serde_json::to_string_pretty(self).map_err(RegistryError::Serialization)
    }
}

impl fmt::Display for CorpusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} records ingested, {} accepted, {} rejected",
            self.ingested, self.accepted, self.rejected
        )?;
        writeln!(
            f,
            "{} errors, {} warnings",
            self.error_count(),
            self.warning_count()
        )?;

        for duplicate in &self.duplicates {
            writeln!(
                f,
                "error: duplicate id '{}' declared by {} and {}",
                duplicate.id, duplicate.first, duplicate.second
            )?;
        }

        for record in &self.records {
            let state = if record.accepted { "" } else { " (rejected)" };
            writeln!(f, "{} [{}]{state}", record.id, record.origin)?;
            for issue in &record.issues {
                let severity = match issue.severity() {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                };
                writeln!(f, "  {severity}: {issue}")?;
            }
        }

        for edge in &self.dangling {
            writeln!(f, "warning: dangling reference {edge}")?;
        }

        Ok(())
    }
}

/// Everything the registry build derives before indexing.
pub(crate) struct Assessment {
    /// Positions (into the ingested slice) of records without errors.
    pub accepted: Vec<usize>,
    pub graph: ReferenceGraph,
    pub report: CorpusReport,
}

pub(crate) fn assess(records: &[IngestedRecord]) -> Assessment {
    let results: Vec<ValidationResult> = records
        .iter()
        .map(|entry| validate_record(&entry.record))
        .collect();

    let accepted: Vec<usize> = results
        .iter()
        .enumerate()
        .filter(|(_, result)| result.is_valid())
        .map(|(position, _)| position)
        .collect();

    let accepted_records: Vec<&ContentRecord> =
        accepted.iter().map(|&i| &records[i].record).collect();
    let accepted_ids: HashSet<&str> = accepted_records.iter().map(|r| r.id.as_str()).collect();
    let rejected_ids: HashSet<&str> = records
        .iter()
        .map(IngestedRecord::id)
        .filter(|id| !accepted_ids.contains(id))
        .collect();

    for (entry, result) in records.iter().zip(&results) {
        if !result.is_valid() {
            tracing::warn!(
                id = %entry.id(),
                origin = %entry.origin,
                errors = result.errors().count(),
                "record rejected by schema validation"
            );
        }
    }

    let graph = resolve(&accepted_records, &rejected_ids);

    let report = CorpusReport {
        ingested: records.len(),
        accepted: accepted.len(),
        rejected: records.len() - accepted.len(),
        records: records
            .iter()
            .zip(results)
            .filter(|(_, result)| !result.issues.is_empty())
            .map(|(entry, result)| RecordReport {
                id: entry.id().to_string(),
                category: entry.category.clone(),
                origin: entry.origin.clone(),
                accepted: result.is_valid(),
                issues: result.issues,
            })
            .collect(),
        dangling: graph.dangling.clone(),
        duplicates: find_duplicate_ids(records),
    };

    Assessment {
        accepted,
        graph,
        report,
    }
}

/// Compute the corpus report for `records` without building a registry.
///
/// Unlike [`crate::Registry::build`] this never fails: duplicate ids are listed in the report
/// together with every other defect.
pub fn validate_corpus(records: &[IngestedRecord]) -> CorpusReport {
    assess(records).report
}
