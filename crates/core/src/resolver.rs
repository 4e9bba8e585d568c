//! Cross-reference resolution.
//!
//! Cross-references form a directed multigraph with non-owning edges. Cycles are expected
//! (mutual `related` links are the norm), so no cycle detection or ordering is attempted.
//!
//! [`resolve`] runs over the accepted records only. An edge resolves when its target is an
//! accepted record of the declared type; everything else is recorded as a [`DanglingEdge`] and
//! left out of the adjacency view. Dangling edges are warnings: they never abort a build.

use content_schema::{ContentRecord, RecordType};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A cross-reference whose target is known and has the declared type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEdge {
    pub source_id: String,
    pub target_id: String,
    pub target_type: RecordType,
    pub relationship: String,
    pub label: String,
    /// Index of the edge within the source record's `crossReferences`.
    pub position: usize,
}

/// A cross-reference that could not be resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingEdge {
    pub source_id: String,
    pub target_id: String,
    pub declared_type: RecordType,
    /// Type of the record actually found under `target_id`, for type mismatches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_type: Option<RecordType>,
    pub reason: DanglingReason,
    pub position: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DanglingReason {
    TargetNotFound,
    TargetTypeMismatch,
    /// The target was ingested but failed schema validation.
    TargetRejected,
}

impl DanglingReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DanglingReason::TargetNotFound => "target not found",
            DanglingReason::TargetTypeMismatch => "target type mismatch",
            DanglingReason::TargetRejected => "target rejected",
        }
    }
}

impl fmt::Display for DanglingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DanglingEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({}): {}",
            self.source_id, self.target_id, self.declared_type, self.reason
        )?;
        if let Some(actual) = self.actual_type {
            write!(f, ", found {actual}")?;
        }
        Ok(())
    }
}

/// Bidirectional adjacency over resolved edges, plus every dangling edge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceGraph {
    pub outgoing: HashMap<String, Vec<ResolvedEdge>>,
    pub incoming: HashMap<String, Vec<ResolvedEdge>>,
    /// In record order, then declaration order.
    pub dangling: Vec<DanglingEdge>,
}

impl ReferenceGraph {
    pub fn outgoing(&self, id: &str) -> &[ResolvedEdge] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn incoming(&self, id: &str) -> &[ResolvedEdge] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(Vec::len).sum()
    }
}

/// Resolve every cross-reference of `accepted`.
///
/// `rejected_ids` names records that were ingested but failed validation, so edges pointing at
/// them are reported as [`DanglingReason::TargetRejected`] rather than not found.
pub fn resolve(accepted: &[&ContentRecord], rejected_ids: &HashSet<&str>) -> ReferenceGraph {
    let by_id: HashMap<&str, &ContentRecord> = accepted
        .iter()
        .map(|record| (record.id.as_str(), *record))
        .collect();

    let mut graph = ReferenceGraph::default();

    for record in accepted {
        for (position, reference) in record.cross_references.iter().enumerate() {
            let target_id = reference.target_id.as_str();
            let dangling = |reason, actual_type| DanglingEdge {
                source_id: record.id.clone(),
                target_id: target_id.to_string(),
                declared_type: reference.target_type,
                actual_type,
                reason,
                position,
            };

            let edge = match by_id.get(target_id) {
                Some(target) if target.record_type == reference.target_type => ResolvedEdge {
                    source_id: record.id.clone(),
                    target_id: target_id.to_string(),
                    target_type: target.record_type,
                    relationship: reference.relationship.clone(),
                    label: reference.label.clone(),
                    position,
                },
                Some(target) => {
                    graph.dangling.push(dangling(
                        DanglingReason::TargetTypeMismatch,
                        Some(target.record_type),
                    ));
                    continue;
                }
                None if rejected_ids.contains(target_id) => {
                    graph
                        .dangling
                        .push(dangling(DanglingReason::TargetRejected, None));
                    continue;
                }
                None => {
                    graph
                        .dangling
                        .push(dangling(DanglingReason::TargetNotFound, None));
                    continue;
                }
            };

            graph
                .incoming
                .entry(edge.target_id.clone())
                .or_default()
                .push(edge.clone());
            graph
                .outgoing
                .entry(edge.source_id.clone())
                .or_default()
                .push(edge);
        }
    }

    for edge in &graph.dangling {
        tracing::warn!(
            source = %edge.source_id,
            target = %edge.target_id,
            reason = %edge.reason,
            "dangling cross-reference"
        );
    }

    graph
}
