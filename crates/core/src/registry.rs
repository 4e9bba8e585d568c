//! # Registry
//!
//! The composed, queryable store: accepted records, their indices, the resolved reference graph
//! and the report captured when it was built. It is the only surface downstream collaborators
//! (rendering, search, quiz generation) use.
//!
//! A [`Registry`] is built once from a batch of [`IngestedRecord`]s and is immutable
//! afterwards. Every query is a pure read, so a registry can be shared between threads behind
//! an `Arc` without locking. To pick up changed content, build a new registry and publish it
//! through [`crate::SharedRegistry`].
//!
//! Build stages, in order:
//! 1. duplicate id detection over every ingested record (fatal),
//! 2. per-record schema validation (rejected records are kept in the report only),
//! 3. cross-reference resolution over accepted records,
//! 4. index construction.

use crate::config::CoreConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::index::{build_indices, find_duplicate_ids, RecordIndices};
use crate::loader::load_corpus;
use crate::report::{assess, CorpusReport};
use crate::resolver::{ReferenceGraph, ResolvedEdge};
use crate::source::{IngestedRecord, RecordOrigin};
use content_schema::{ClinicalRelevance, ContentRecord, RecordStatus, RecordType, Relationship};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Immutable, queryable aggregate of validated records and their derived indices.
#[derive(Debug)]
pub struct Registry {
    entries: Vec<IngestedRecord>,
    indices: RecordIndices,
    graph: ReferenceGraph,
    report: CorpusReport,
}

/// Record counts for a built registry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub records: usize,
    pub rejected: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub tags: usize,
    pub resolved_edges: usize,
    pub dangling_edges: usize,
}

impl Registry {
    /// Build a registry from ingested records.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateId`] for the first id declared by more than one
    /// record. Schema errors and dangling references never fail the build; they are kept in
    /// the report returned by [`Registry::validate_corpus`].
    pub fn build(records: Vec<IngestedRecord>) -> RegistryResult<Self> {
        if let Some(duplicate) = find_duplicate_ids(&records).into_iter().next() {
            tracing::error!(
                id = %duplicate.id,
                first = %duplicate.first,
                second = %duplicate.second,
                "duplicate record id, registry build aborted"
            );
            return Err(RegistryError::DuplicateId {
                id: duplicate.id,
                first: duplicate.first,
                second: duplicate.second,
            });
        }

        let assessment = assess(&records);
        let accepted: HashSet<usize> = assessment.accepted.into_iter().collect();
        let entries: Vec<IngestedRecord> = records
            .into_iter()
            .enumerate()
            .filter(|(position, _)| accepted.contains(position))
            .map(|(_, entry)| entry)
            .collect();

        let indices = build_indices(&entries);
        let report = assessment.report;

        tracing::info!(
            records = entries.len(),
            rejected = report.rejected,
            dangling = report.dangling.len(),
            "registry built"
        );

        Ok(Self {
            entries,
            indices,
            graph: assessment.graph,
            report,
        })
    }

    /// Load the configured corpus directory and build a registry from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the corpus cannot be loaded or contains duplicate ids.
    pub fn load(config: &CoreConfig) -> RegistryResult<Self> {
        let records = load_corpus(config.corpus_dir())?;
        Self::build(records)
    }

    /// Enforce [`CoreConfig::fail_on_warnings`] against the report of this registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::WarningsNotAllowed`] when the gate is on and the report has
    /// warnings.
    pub fn check_warning_gate(&self, config: &CoreConfig) -> RegistryResult<()> {
        if config.fail_on_warnings() && self.report.has_warnings() {
            return Err(RegistryError::WarningsNotAllowed {
                warnings: self.report.warning_count(),
            });
        }
        Ok(())
    }

    /// Look up one record by id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no accepted record has this id.
    pub fn get_by_id(&self, id: &str) -> RegistryResult<&ContentRecord> {
        self.entry(id)
            .map(|entry| &entry.record)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Records carrying `tag` among their topics or keywords. Unknown tags yield nothing.
    pub fn query_by_tag(&self, tag: &str) -> Vec<&ContentRecord> {
        self.records_for(self.indices.ids_for_tag(tag))
    }

    pub fn query_by_category(&self, category: &str) -> Vec<&ContentRecord> {
        self.records_for(self.indices.ids_for_category(category))
    }

    pub fn query_by_type(&self, record_type: RecordType) -> Vec<&ContentRecord> {
        self.records_for(self.indices.ids_for_type(record_type))
    }

    pub fn query_by_status(&self, status: RecordStatus) -> Vec<&ContentRecord> {
        self.records_for(self.indices.ids_for_status(status))
    }

    /// Records flagged (or, with `flagged = false`, not flagged) for USMLE or NBME.
    pub fn query_exam_relevant(&self, flagged: bool) -> Vec<&ContentRecord> {
        let partition = &self.indices.by_exam_relevance;
        if flagged {
            self.records_for(&partition.flagged)
        } else {
            self.records_for(&partition.unflagged)
        }
    }

    pub fn query_by_shelf(&self, shelf: &str) -> Vec<&ContentRecord> {
        self.records_for(self.indices.ids_for_shelf(shelf))
    }

    /// Records whose clinical relevance is at least `minimum`, in ingestion order.
    pub fn query_by_min_clinical_relevance(
        &self,
        minimum: ClinicalRelevance,
    ) -> Vec<&ContentRecord> {
        self.iter()
            .filter(|record| {
                matches!(record.tags.relevance(), Some(Ok(relevance)) if relevance >= minimum)
            })
            .collect()
    }

    /// Resolved outgoing edges of `id`, in declaration order. Dangling edges are excluded.
    pub fn list_cross_references(&self, id: &str) -> &[ResolvedEdge] {
        self.graph.outgoing(id)
    }

    /// Resolved edges pointing at `id`.
    pub fn list_incoming_references(&self, id: &str) -> &[ResolvedEdge] {
        self.graph.incoming(id)
    }

    /// Records linked to `id` in either direction, outgoing targets first, each once.
    ///
    /// With `relationship` set, only edges of that relationship are followed.
    pub fn related(&self, id: &str, relationship: Option<Relationship>) -> Vec<&ContentRecord> {
        let wanted = |edge: &&ResolvedEdge| {
            relationship.map_or(true, |kind| edge.relationship == kind.as_str())
        };
        let outgoing = self
            .graph
            .outgoing(id)
            .iter()
            .filter(wanted)
            .map(|edge| edge.target_id.as_str());
        let incoming = self
            .graph
            .incoming(id)
            .iter()
            .filter(wanted)
            .map(|edge| edge.source_id.as_str());

        let mut seen = HashSet::new();
        outgoing
            .chain(incoming)
            .filter(|other| *other != id && seen.insert(*other))
            .filter_map(|other| self.get_by_id(other).ok())
            .collect()
    }

    /// Case-insensitive substring search.
    ///
    /// A record matches when the text occurs in its id, category, name, alternate names, or the
    /// summary or explanation of any level. Blank text matches nothing.
    pub fn search(&self, text: &str) -> Vec<&ContentRecord> {
        self.search_in(None, text)
    }

    /// [`Registry::search`] restricted to one category, folded like
    /// [`Registry::query_by_category`]. `None` searches every category.
    pub fn search_in(&self, category: Option<&str>, text: &str) -> Vec<&ContentRecord> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let scope: Option<HashSet<&str>> = category.map(|category| {
            self.indices
                .ids_for_category(category)
                .iter()
                .map(String::as_str)
                .collect()
        });

        self.entries
            .iter()
            .filter(|entry| {
                scope
                    .as_ref()
                    .map_or(true, |ids| ids.contains(entry.record.id.as_str()))
            })
            .filter(|entry| matches_text(entry, &needle))
            .map(|entry| &entry.record)
            .collect()
    }

    /// The report captured when this registry was built.
    pub fn validate_corpus(&self) -> &CorpusReport {
        &self.report
    }

    /// Category labels, case-folded and sorted.
    pub fn categories(&self) -> Vec<&str> {
        self.indices.by_category.keys().map(|k| k.as_str()).collect()
    }

    /// Tags, case-folded and sorted.
    pub fn tags(&self) -> Vec<&str> {
        self.indices.by_tag.keys().map(|k| k.as_str()).collect()
    }

    pub fn category_of(&self, id: &str) -> Option<&str> {
        self.entry(id).map(|entry| entry.category.as_str())
    }

    pub fn origin_of(&self, id: &str) -> Option<&RecordOrigin> {
        self.entry(id).map(|entry| &entry.origin)
    }

    pub fn stats(&self) -> RegistryStats {
        let count = |ids: &Vec<String>| ids.len();
        RegistryStats {
            records: self.len(),
            rejected: self.report.rejected,
            by_type: self
                .indices
                .by_type
                .iter()
                .map(|(kind, ids)| (kind.to_string(), count(ids)))
                .collect(),
            by_status: self
                .indices
                .by_status
                .iter()
                .map(|(status, ids)| (status.to_string(), count(ids)))
                .collect(),
            by_category: self
                .indices
                .by_category
                .iter()
                .map(|(category, ids)| (category.to_string(), count(ids)))
                .collect(),
            tags: self.indices.by_tag.len(),
            resolved_edges: self.graph.edge_count(),
            dangling_edges: self.graph.dangling.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Accepted records in ingestion order.
    pub fn iter(&self) -> impl Iterator<Item = &ContentRecord> {
        self.entries.iter().map(|entry| &entry.record)
    }

    fn entry(&self, id: &str) -> Option<&IngestedRecord> {
        self.indices
            .by_id
            .get(id)
            .and_then(|&position| self.entries.get(position))
    }

    fn records_for(&self, ids: &[String]) -> Vec<&ContentRecord> {
        ids.iter()
            .filter_map(|id| self.entry(id))
            .map(|entry| &entry.record)
            .collect()
    }
}

fn matches_text(entry: &IngestedRecord, needle: &str) -> bool {
    let record = &entry.record;
    let levels = record
        .levels
        .values()
        .flat_map(|level| [&level.summary, &level.explanation]);

    [&record.id, &entry.category, &record.name]
        .into_iter()
        .chain(&record.alternate_names)
        .chain(levels)
        .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::DanglingReason;
    use crate::test_support::{condition, level, reference, topic, with_references, with_tags};
    use content_schema::ExamRelevance;

    fn adrenal() -> Vec<IngestedRecord> {
        let mut addisons = with_tags(
            with_references(
                condition("endocrine-addisons-disease"),
                [reference("endocrine-adrenal-crisis", RecordType::Condition)],
            ),
            &["cortisol", "Adrenal"],
        );
        addisons.name = "Addison's disease".into();
        addisons.alternate_names = vec!["Primary adrenal insufficiency".into()];
        addisons.tags.clinical_relevance = Some("high".into());
        addisons.tags.exam_relevance = Some(ExamRelevance {
            usmle: true,
            nbme: true,
            shelf: vec!["internal-medicine".into()],
        });

        let mut crisis = with_tags(condition("endocrine-adrenal-crisis"), &["adrenal"]);
        crisis.tags.clinical_relevance = Some("critical".into());

        let mut physiology = topic("adrenal-physiology");
        physiology.status = RecordStatus::Draft;
        physiology.tags.clinical_relevance = Some("medium".into());

        IngestedRecord::batch(vec![addisons, crisis, physiology], "adrenal")
    }

    fn build(records: Vec<IngestedRecord>) -> Registry {
        Registry::build(records).expect("registry builds")
    }

    #[test]
    fn duplicate_id_is_fatal_and_names_both_sources() {
        let mut records = adrenal();
        records.push(IngestedRecord::new(
            condition("endocrine-addisons-disease"),
            "adrenal",
            RecordOrigin::file("adrenal/legacy.yaml", 0),
        ));

        let err = Registry::build(records).expect_err("duplicate id");
        match err {
            RegistryError::DuplicateId { id, first, second } => {
                assert_eq!(id, "endocrine-addisons-disease");
                assert_eq!(first, RecordOrigin::memory(0));
                assert_eq!(second.to_string(), "adrenal/legacy.yaml#0");
            }
            other => panic!("expected DuplicateId, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_among_rejected_records_is_still_fatal() {
        let mut broken = condition("thyroid-goiter");
        broken.levels.clear();
        let records = IngestedRecord::batch(vec![broken.clone(), broken], "thyroid");
        let err = Registry::build(records).expect_err("duplicate id");
        assert!(matches!(err, RegistryError::DuplicateId { ref id, .. } if id == "thyroid-goiter"));
    }

    #[test]
    fn resolves_reference_and_reports_it_dangling_once_target_is_removed() {
        let registry = build(adrenal());
        let edges = registry.list_cross_references("endocrine-addisons-disease");
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target_id, "endocrine-adrenal-crisis");
        assert!(registry.validate_corpus().dangling.is_empty());

        let without_target: Vec<_> = adrenal()
            .into_iter()
            .filter(|entry| entry.id() != "endocrine-adrenal-crisis")
            .collect();
        let registry = build(without_target);
        assert!(registry
            .list_cross_references("endocrine-addisons-disease")
            .is_empty());
        let dangling = &registry.validate_corpus().dangling;
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].target_id, "endocrine-adrenal-crisis");
        assert_eq!(dangling[0].reason, DanglingReason::TargetNotFound);
    }

    #[test]
    fn non_contiguous_levels_are_reported_without_failing_the_build() {
        let mut records = adrenal();
        let mut gap = condition("endocrine-cushing-syndrome");
        gap.levels.insert(3, level(3));
        records.push(IngestedRecord::new(gap, "adrenal", RecordOrigin::memory(3)));

        let registry = build(records);
        let report = registry.validate_corpus();
        assert_eq!(report.rejected, 1);
        let issue = &report.records[0].issues[0];
        assert_eq!(issue.kind.to_string(), "non-contiguous levels, missing 2");

        assert!(registry.get_by_id("endocrine-cushing-syndrome").is_err());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn unknown_tag_yields_empty_sequence() {
        let registry = build(adrenal());
        assert!(registry.query_by_tag("nonexistent-tag").is_empty());
    }

    #[test]
    fn unknown_id_is_not_found() {
        let registry = build(adrenal());
        let err = registry.get_by_id("not-a-real-id").expect_err("unknown id");
        assert!(matches!(err, RegistryError::NotFound(ref id) if id == "not-a-real-id"));
        assert!(registry.list_cross_references("not-a-real-id").is_empty());
        assert!(registry.category_of("not-a-real-id").is_none());
    }

    #[test]
    fn every_tag_finds_its_record() {
        let registry = build(adrenal());
        for record in registry.iter() {
            for tag in record.tag_terms() {
                let found = registry.query_by_tag(tag);
                assert!(found.iter().any(|r| r.id == record.id), "{tag} -> {}", record.id);
            }
        }
        let ids: Vec<_> = registry.query_by_tag("ADRENAL").into_iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["endocrine-addisons-disease", "endocrine-adrenal-crisis"]);
    }

    #[test]
    fn resolved_edges_point_at_records_of_the_declared_type() {
        let registry = build(adrenal());
        for record in registry.iter() {
            for edge in registry.list_cross_references(&record.id) {
                let target = registry.get_by_id(&edge.target_id).expect("target exists");
                assert_eq!(target.record_type, edge.target_type);
            }
        }
    }

    #[test]
    fn queries_by_type_status_exam_and_relevance() {
        let registry = build(adrenal());
        assert_eq!(registry.query_by_type(RecordType::Topic).len(), 1);
        assert_eq!(registry.query_by_status(RecordStatus::Published).len(), 2);
        assert_eq!(registry.query_by_category("Adrenal").len(), 3);

        let flagged = registry.query_exam_relevant(true);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].id, "endocrine-addisons-disease");
        assert_eq!(registry.query_exam_relevant(false).len(), 2);
        assert_eq!(registry.query_by_shelf("Internal-Medicine").len(), 1);

        let high: Vec<_> = registry
            .query_by_min_clinical_relevance(ClinicalRelevance::High)
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(high, vec!["endocrine-addisons-disease", "endocrine-adrenal-crisis"]);
        assert_eq!(
            registry
                .query_by_min_clinical_relevance(ClinicalRelevance::Moderate)
                .len(),
            3
        );
    }

    #[test]
    fn backlinks_and_related_follow_both_directions() {
        let mut records = adrenal();
        records[1].record.cross_references.push(reference(
            "endocrine-addisons-disease",
            RecordType::Condition,
        ));
        let mut child = reference("adrenal-physiology", RecordType::Topic);
        child.relationship = "parent".into();
        records[1].record.cross_references.push(child);
        let registry = build(records);

        let backlinks = registry.list_incoming_references("endocrine-adrenal-crisis");
        assert_eq!(backlinks.len(), 1);
        assert_eq!(backlinks[0].source_id, "endocrine-addisons-disease");

        let related: Vec<_> = registry
            .related("endocrine-adrenal-crisis", None)
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(related, vec!["endocrine-addisons-disease", "adrenal-physiology"]);

        let parents: Vec<_> = registry
            .related("endocrine-adrenal-crisis", Some(Relationship::Parent))
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(parents, vec!["adrenal-physiology"]);
    }

    #[test]
    fn search_matches_names_and_synonyms() {
        let registry = build(adrenal());
        let hits = registry.search("ADRENAL insufficiency");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "endocrine-addisons-disease");
        assert!(registry.search("   ").is_empty());
    }

    #[test]
    fn search_matches_ids_categories_and_level_text() {
        let mut records = adrenal();
        let mut graves = condition("thyroid-graves-disease");
        graves.levels.insert(
            2,
            content_schema::LevelContent {
                explanation: "TSH receptor antibodies drive the gland.".into(),
                ..level(2)
            },
        );
        records.extend(IngestedRecord::batch(vec![graves], "thyroid"));
        let registry = build(records);

        let ids = |hits: Vec<&ContentRecord>| -> Vec<String> {
            hits.into_iter().map(|r| r.id.clone()).collect()
        };
        assert_eq!(
            ids(registry.search("endocrine-addisons-disease")),
            vec!["endocrine-addisons-disease"]
        );
        assert_eq!(ids(registry.search("THYROID")), vec!["thyroid-graves-disease"]);
        assert_eq!(
            ids(registry.search("receptor antibodies")),
            vec!["thyroid-graves-disease"]
        );
        assert_eq!(registry.search("adrenal").len(), 3);
    }

    #[test]
    fn search_in_limits_hits_to_one_category() {
        let mut records = adrenal();
        let mut graves = condition("thyroid-graves-disease");
        graves.name = "Graves' disease".into();
        records.extend(IngestedRecord::batch(vec![graves], "thyroid"));
        let registry = build(records);

        assert_eq!(registry.search("disease").len(), 2);
        let hits = registry.search_in(Some(" Thyroid "), "disease");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "thyroid-graves-disease");
        assert!(registry.search_in(Some("renal"), "disease").is_empty());
        assert_eq!(registry.search_in(None, "disease").len(), 2);
    }

    #[test]
    fn exposes_catalogue_and_stats() {
        let registry = build(adrenal());
        assert_eq!(registry.categories(), vec!["adrenal"]);
        assert_eq!(registry.tags(), vec!["adrenal", "cortisol"]);
        assert_eq!(registry.category_of("adrenal-physiology"), Some("adrenal"));
        assert_eq!(
            registry.origin_of("endocrine-adrenal-crisis"),
            Some(&RecordOrigin::memory(1))
        );

        let stats = registry.stats();
        assert_eq!(stats.records, 3);
        assert_eq!(stats.by_type["condition"], 2);
        assert_eq!(stats.by_status["draft"], 1);
        assert_eq!(stats.by_category["adrenal"], 3);
        assert_eq!(stats.resolved_edges, 1);
        assert_eq!(stats.dangling_edges, 0);
    }

    #[test]
    fn rebuilding_yields_identical_indices_and_report() {
        let first = build(adrenal());
        let second = build(adrenal());
        assert_eq!(first.indices, second.indices);
        assert_eq!(
            first.validate_corpus().to_json().expect("json"),
            second.validate_corpus().to_json().expect("json")
        );
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
