//! The release ingestion pipeline.
//!
//! One producer thread reads and parses release files into bounded
//! batches; a pool of workers applies them to the store. Because the
//! store's merge rule is commutative per component id, batch order
//! across workers does not matter. Derived artifacts (closure, search
//! index) are rebuilt strictly after every component write has landed.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::bounded;
use snomed_rf2::{
    discover_release_files, stream_release, ComponentBatch, FileStats, DEFAULT_BATCH_SIZE,
};
use snomed_store::SnomedStore;
use tracing::info;

use crate::error::{ServiceError, ServiceResult};

/// Queue depth between the file reader and the store writers.
const CHANNEL_CAPACITY: usize = 50;

/// Outcome of one release import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Release files ingested.
    pub files: usize,
    /// Rows admitted across all files.
    pub rows: usize,
    /// Rows dropped with parse errors.
    pub parse_errors: usize,
    /// Admitted rows with failing identifier checksums.
    pub invalid_identifiers: usize,
    /// Concept rows written (after the merge rule).
    pub concepts: usize,
    /// Description rows written.
    pub descriptions: usize,
    /// Relationship rows written (concrete included).
    pub relationships: usize,
    /// Refset items written.
    pub refset_items: usize,
    /// `(concept, ancestor)` closure pairs materialized.
    pub closure_pairs: usize,
    /// Release date from the file names, YYYYMMDD.
    pub release_date: Option<u32>,
    /// Wall-clock time of ingestion and closure build.
    pub elapsed: Duration,
}

/// Ingests every snapshot file under `release_dir` into the store and
/// rebuilds the transitive closure.
pub fn ingest_release(store: &SnomedStore, release_dir: &Path) -> ServiceResult<ImportSummary> {
    let started = Instant::now();
    let release = discover_release_files(release_dir)?;
    info!(
        files = release.files.len(),
        release_date = release.release_date,
        "ingesting RF2 release"
    );

    let workers = num_cpus::get().max(1);
    let concepts = AtomicUsize::new(0);
    let descriptions = AtomicUsize::new(0);
    let relationships = AtomicUsize::new(0);
    let refset_items = AtomicUsize::new(0);

    let (sender, receiver) = bounded::<ComponentBatch>(CHANNEL_CAPACITY);
    let mut file_stats: Option<ServiceResult<FileStats>> = None;

    std::thread::scope(|scope| -> ServiceResult<()> {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let receiver = receiver.clone();
            let counters = (&concepts, &descriptions, &relationships, &refset_items);
            handles.push(scope.spawn(move || -> ServiceResult<()> {
                while let Ok(batch) = receiver.recv() {
                    let (concepts, descriptions, relationships, refset_items) = counters;
                    match batch {
                        ComponentBatch::Concepts(rows) => {
                            let written = store.insert_concepts(rows)?;
                            concepts.fetch_add(written, Ordering::Relaxed);
                        }
                        ComponentBatch::Descriptions(rows) => {
                            let written = store.insert_descriptions(rows)?;
                            descriptions.fetch_add(written, Ordering::Relaxed);
                        }
                        ComponentBatch::Relationships(rows) => {
                            let written = store.insert_relationships(rows)?;
                            relationships.fetch_add(written, Ordering::Relaxed);
                        }
                        ComponentBatch::ConcreteRelationships(rows) => {
                            let written = store.insert_concrete_relationships(rows)?;
                            relationships.fetch_add(written, Ordering::Relaxed);
                        }
                        ComponentBatch::RefsetItems(rows) => {
                            let written = store.insert_refset_items(rows)?;
                            refset_items.fetch_add(written, Ordering::Relaxed);
                        }
                    }
                }
                Ok(())
            }));
        }
        drop(receiver);

        // The producer runs on this thread; a failed send means every
        // worker already exited (on error) and draining stops.
        let produced = stream_release(&release.files, DEFAULT_BATCH_SIZE, |batch| {
            sender.send(batch).is_ok()
        });
        drop(sender);

        let mut first_error: Option<ServiceError> = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => first_error = first_error.or(Some(e)),
                Err(_) => first_error = first_error.or(Some(ServiceError::WorkerPanicked)),
            }
        }
        if let Some(error) = first_error {
            return Err(error);
        }
        file_stats = Some(produced.map_err(ServiceError::from));
        Ok(())
    })?;

    let stats = match file_stats {
        Some(result) => result?,
        None => FileStats::default(),
    };

    let closure_pairs = store.build_transitive_closure()?;

    let summary = ImportSummary {
        files: release.files.len(),
        rows: stats.rows,
        parse_errors: stats.parse_errors,
        invalid_identifiers: stats.invalid_identifiers,
        concepts: concepts.into_inner(),
        descriptions: descriptions.into_inner(),
        relationships: relationships.into_inner(),
        refset_items: refset_items.into_inner(),
        closure_pairs,
        release_date: release.release_date,
        elapsed: started.elapsed(),
    };
    info!(
        rows = summary.rows,
        parse_errors = summary.parse_errors,
        invalid_identifiers = summary.invalid_identifiers,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "release ingestion complete"
    );
    Ok(summary)
}
