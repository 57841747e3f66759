//! Parallel index construction.
//!
//! A producer streams concept ids into a bounded channel; a pool of
//! workers (one per CPU) assembles extended concepts and their
//! documents and appends them through the shared index writer, which
//! serializes internally. The index is staged in a sibling directory
//! and swapped in after the final commit and segment merge, so a build
//! that dies midway leaves any previous index untouched.

use std::path::Path;

use crossbeam_channel::bounded;
use snomed_store::SnomedStore;
use snomed_types::SctId;
use tantivy::{Index, IndexWriter, TantivyDocument};
use tracing::info;

use crate::document::build_documents;
use crate::error::{IndexError, IndexResult};
use crate::schema::{register_tokenizers, IndexSpec, SearchSchema};
use crate::SearchIndex;

/// Queue depth between the concept producer and the document workers.
const CHANNEL_CAPACITY: usize = 50;

/// Writer heap across all indexing threads.
const WRITER_MEMORY_BYTES: usize = 128_000_000;

/// Builds the search index for an ingested store, replacing whatever
/// index lived at `index_dir` before.
pub fn build_index(store: &SnomedStore, index_dir: &Path) -> IndexResult<SearchIndex> {
    let spec = IndexSpec::from_store(store)?;
    let schema = SearchSchema::build(&spec)?;

    let staging = index_dir.with_extension("build");
    if staging.exists() {
        std::fs::remove_dir_all(&staging)?;
    }
    std::fs::create_dir_all(&staging)?;

    let index = Index::create_in_dir(&staging, schema.schema.clone())?;
    register_tokenizers(&index);
    let writer: IndexWriter<TantivyDocument> = index.writer(WRITER_MEMORY_BYTES)?;

    let ids = store.all_concept_ids()?;
    let workers = num_cpus::get().max(1);
    info!(concepts = ids.len(), workers, "building search index");

    let mut indexed = 0usize;
    let (sender, receiver) = bounded::<SctId>(CHANNEL_CAPACITY);
    std::thread::scope(|scope| -> IndexResult<()> {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let receiver = receiver.clone();
            let writer = &writer;
            let schema = &schema;
            handles.push(scope.spawn(move || -> IndexResult<usize> {
                let mut count = 0;
                while let Ok(concept_id) = receiver.recv() {
                    let Some(extended) = store.extended_concept(concept_id)? else {
                        continue;
                    };
                    for document in build_documents(schema, store, &extended)? {
                        writer.add_document(document)?;
                        count += 1;
                    }
                }
                Ok(count)
            }));
        }
        drop(receiver);

        for &id in &ids {
            // A send fails only when every worker has already bailed out.
            if sender.send(id).is_err() {
                break;
            }
        }
        drop(sender);

        for handle in handles {
            indexed += handle.join().map_err(|_| IndexError::WorkerPanicked)??;
        }
        Ok(())
    })?;

    let mut writer = writer;
    writer.commit()?;

    // Collapse to a single segment for read performance.
    let segments = index.searchable_segment_ids()?;
    if segments.len() > 1 {
        writer.merge(&segments).wait()?;
    }
    writer.wait_merging_threads()?;
    info!(documents = indexed, "search index build complete");

    drop(index);
    swap_directories(&staging, index_dir)?;
    SearchIndex::open(index_dir)
}

/// Atomically (as far as the filesystem allows) replaces `target` with
/// the freshly built `staging` directory.
fn swap_directories(staging: &Path, target: &Path) -> IndexResult<()> {
    if target.exists() {
        std::fs::remove_dir_all(target)?;
    }
    std::fs::rename(staging, target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use snomed_types::{well_known, Concept, DefinitionStatus, Description, DescriptionType};

    fn concept(id: SctId) -> Concept {
        Concept {
            id,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            definition_status_id: DefinitionStatus::PRIMITIVE_ID,
        }
    }

    fn synonym(id: SctId, concept_id: SctId, term: &str) -> Description {
        Description {
            id,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            concept_id,
            language_code: "en".to_string(),
            type_id: DescriptionType::SYNONYM_ID,
            term: term.to_string(),
            case_significance_id: 900000000000448009,
        }
    }

    #[test]
    fn test_build_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnomedStore::open(dir.path().join("store.db")).unwrap();
        store.insert_concepts([concept(138875005), concept(24700007)]).unwrap();
        store
            .insert_relationships([snomed_types::Relationship {
                id: 1,
                effective_time: 20020131,
                active: true,
                module_id: 900000000000207008,
                source_id: 24700007,
                destination_id: 138875005,
                relationship_group: 0,
                type_id: well_known::IS_A,
                characteristic_type_id: 900000000000011006,
                modifier_id: 900000000000451002,
            }])
            .unwrap();
        store
            .insert_descriptions([
                synonym(1, 138875005, "SNOMED CT Concept"),
                synonym(2, 24700007, "Multiple sclerosis"),
            ])
            .unwrap();
        store.build_transitive_closure().unwrap();

        let index_dir = dir.path().join("index");
        let built = build_index(&store, &index_dir).unwrap();
        let searcher = built.reader.searcher();
        assert_eq!(searcher.num_docs(), 2);

        // Rebuild replaces the index in place.
        let rebuilt = build_index(&store, &index_dir).unwrap();
        assert_eq!(rebuilt.reader.searcher().num_docs(), 2);

        // And a cold open finds it again.
        let reopened = SearchIndex::open(&index_dir).unwrap();
        assert_eq!(reopened.reader.searcher().num_docs(), 2);
    }
}
