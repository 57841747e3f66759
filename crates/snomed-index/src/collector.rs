//! Concept-id set realization.
//!
//! ECL evaluation ends by materializing the distinct concept ids of
//! every matching description document. Reading the `concept-id` fast
//! field per hit is much cheaper than loading stored documents.

use std::collections::HashSet;

use tantivy::collector::{Collector, SegmentCollector};
use tantivy::columnar::Column;
use tantivy::{DocId, Score, SegmentOrdinal, SegmentReader};

use crate::schema::CONCEPT_ID;

/// Collects the distinct `concept-id` fast-field values of all hits.
pub struct ConceptSetCollector;

impl Collector for ConceptSetCollector {
    type Fruit = HashSet<u64>;
    type Child = ConceptSetSegmentCollector;

    fn for_segment(
        &self,
        _segment_local_id: SegmentOrdinal,
        segment: &SegmentReader,
    ) -> tantivy::Result<Self::Child> {
        let column = segment.fast_fields().u64(CONCEPT_ID)?;
        Ok(ConceptSetSegmentCollector { column, ids: HashSet::new() })
    }

    fn requires_scoring(&self) -> bool {
        false
    }

    fn merge_fruits(&self, segment_fruits: Vec<HashSet<u64>>) -> tantivy::Result<HashSet<u64>> {
        let mut merged = HashSet::new();
        for fruit in segment_fruits {
            merged.extend(fruit);
        }
        Ok(merged)
    }
}

/// Per-segment state for [`ConceptSetCollector`].
pub struct ConceptSetSegmentCollector {
    column: Column<u64>,
    ids: HashSet<u64>,
}

impl SegmentCollector for ConceptSetSegmentCollector {
    type Fruit = HashSet<u64>;

    fn collect(&mut self, doc: DocId, _score: Score) {
        if let Some(concept_id) = self.column.first(doc) {
            self.ids.insert(concept_id);
        }
    }

    fn harvest(self) -> Self::Fruit {
        self.ids
    }
}
