//! Batched streaming of release files.
//!
//! The ingestion pipeline consumes bounded batches keyed by component
//! kind. [`stream_file`] decodes one release file, parses its rows and
//! hands batches of at most `batch_size` records to a sink, accumulating
//! recoverable row errors into [`FileStats`]. Identifier check-digit
//! failures are reported and counted but the rows are still admitted:
//! the release is authoritative.

use std::path::Path;

use snomed_types::{identifier, Concept, ConcreteRelationship, Description, RefsetItem, Relationship};
use tracing::warn;

use crate::error::Rf2Result;
use crate::filename::{Entity, Rf2Filename};
use crate::parse::Rf2FileReader;
use crate::reify::RefsetFileReader;

/// Default number of rows per batch.
pub const DEFAULT_BATCH_SIZE: usize = 5_000;

/// A batch of parsed rows of one component kind.
#[derive(Debug, Clone)]
pub enum ComponentBatch {
    /// Concept rows.
    Concepts(Vec<Concept>),
    /// Description and text-definition rows.
    Descriptions(Vec<Description>),
    /// Relationship rows, stated and inferred.
    Relationships(Vec<Relationship>),
    /// Concrete-value relationship rows.
    ConcreteRelationships(Vec<ConcreteRelationship>),
    /// Reified reference-set members.
    RefsetItems(Vec<RefsetItem>),
}

impl ComponentBatch {
    /// Number of rows in the batch.
    pub fn len(&self) -> usize {
        match self {
            ComponentBatch::Concepts(rows) => rows.len(),
            ComponentBatch::Descriptions(rows) => rows.len(),
            ComponentBatch::Relationships(rows) => rows.len(),
            ComponentBatch::ConcreteRelationships(rows) => rows.len(),
            ComponentBatch::RefsetItems(rows) => rows.len(),
        }
    }

    /// Returns true if the batch holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-file ingestion counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStats {
    /// Rows parsed and admitted.
    pub rows: usize,
    /// Rows dropped with a parse error.
    pub parse_errors: usize,
    /// Admitted rows whose identifier failed Verhoeff validation.
    pub invalid_identifiers: usize,
}

impl FileStats {
    fn merge(&mut self, other: FileStats) {
        self.rows += other.rows;
        self.parse_errors += other.parse_errors;
        self.invalid_identifiers += other.invalid_identifiers;
    }
}

/// Streams one decoded release file into batches.
///
/// The sink returns `false` to stop early (e.g. on cancellation); the
/// remaining rows are skipped and the stats so far returned. Row-level
/// parse errors are logged and counted without aborting the file;
/// opening or header failures abort with `Err`.
pub fn stream_file<F>(
    path: &Path,
    decoded: &Rf2Filename,
    batch_size: usize,
    mut sink: F,
) -> Rf2Result<FileStats>
where
    F: FnMut(ComponentBatch) -> bool,
{
    match &decoded.entity {
        Entity::Concept => {
            let reader = Rf2FileReader::<_, Concept>::open(path)?;
            stream_items(reader, batch_size, ComponentBatch::Concepts, |c: &Concept| c.id, &mut sink)
        }
        Entity::Description | Entity::TextDefinition => {
            let reader = Rf2FileReader::<_, Description>::open(path)?;
            stream_items(
                reader,
                batch_size,
                ComponentBatch::Descriptions,
                |d: &Description| d.id,
                &mut sink,
            )
        }
        Entity::Relationship | Entity::StatedRelationship => {
            let reader = Rf2FileReader::<_, Relationship>::open(path)?;
            stream_items(
                reader,
                batch_size,
                ComponentBatch::Relationships,
                |r: &Relationship| r.id,
                &mut sink,
            )
        }
        Entity::ConcreteRelationship => {
            let reader = Rf2FileReader::<_, ConcreteRelationship>::open(path)?;
            stream_items(
                reader,
                batch_size,
                ComponentBatch::ConcreteRelationships,
                |r: &ConcreteRelationship| r.id,
                &mut sink,
            )
        }
        Entity::Refset { pattern } => {
            let file = std::fs::File::open(path)?;
            let reader = RefsetFileReader::from_reader(std::io::BufReader::new(file), pattern)?;
            stream_items(
                reader,
                batch_size,
                ComponentBatch::RefsetItems,
                |item: &RefsetItem| item.header().referenced_component_id,
                &mut sink,
            )
        }
        Entity::Other(kind) => {
            warn!(kind = %kind, path = %path.display(), "skipping unsupported RF2 entity");
            Ok(FileStats::default())
        }
    }
}

fn stream_items<T, I, F>(
    reader: I,
    batch_size: usize,
    wrap: fn(Vec<T>) -> ComponentBatch,
    id_of: impl Fn(&T) -> u64,
    sink: &mut F,
) -> Rf2Result<FileStats>
where
    I: Iterator<Item = Rf2Result<T>>,
    F: FnMut(ComponentBatch) -> bool,
{
    let mut stats = FileStats::default();
    let mut batch = Vec::with_capacity(batch_size);

    for row in reader {
        match row {
            Ok(item) => {
                let id = id_of(&item);
                if !identifier::verhoeff_valid(id) {
                    warn!(id, "identifier fails Verhoeff validation, row admitted");
                    stats.invalid_identifiers += 1;
                }
                stats.rows += 1;
                batch.push(item);
                if batch.len() >= batch_size && !flush(&mut batch, batch_size, wrap, sink) {
                    return Ok(stats);
                }
            }
            Err(e) => {
                warn!(error = %e, "dropping unparseable row");
                stats.parse_errors += 1;
            }
        }
    }

    if !batch.is_empty() {
        flush(&mut batch, 0, wrap, sink);
    }
    Ok(stats)
}

fn flush<T, F>(
    batch: &mut Vec<T>,
    next_capacity: usize,
    wrap: fn(Vec<T>) -> ComponentBatch,
    sink: &mut F,
) -> bool
where
    F: FnMut(ComponentBatch) -> bool,
{
    let full = std::mem::replace(batch, Vec::with_capacity(next_capacity));
    sink(wrap(full))
}

/// Streams every file of a release in sequence, merging stats.
pub fn stream_release<'a, F>(
    files: impl IntoIterator<Item = &'a (std::path::PathBuf, Rf2Filename)>,
    batch_size: usize,
    mut sink: F,
) -> Rf2Result<FileStats>
where
    F: FnMut(ComponentBatch) -> bool,
{
    let mut total = FileStats::default();
    for (path, decoded) in files {
        let stats = stream_file(path, decoded, batch_size, &mut sink)?;
        total.merge(stats);
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_stream_file_batches_and_stats() {
        let dir = tempfile::tempdir().unwrap();
        let mut content =
            String::from("id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\n");
        // Three valid rows, one with a corrupt check digit, one unparseable
        for id in [24700007u64, 6118003, 138875005] {
            content
                .push_str(&format!("{id}\t20020131\t1\t900000000000207008\t900000000000074008\n"));
        }
        content.push_str("24700008\t20020131\t1\t900000000000207008\t900000000000074008\n");
        content.push_str("garbage\t20020131\t1\t900000000000207008\t900000000000074008\n");

        let path = write_file(&dir, "sct2_Concept_Snapshot_INT_20230131.txt", &content);
        let decoded = Rf2Filename::parse("sct2_Concept_Snapshot_INT_20230131.txt").unwrap();

        let mut batches = Vec::new();
        let stats = stream_file(&path, &decoded, 2, |batch| {
            batches.push(batch);
            true
        })
        .unwrap();

        assert_eq!(stats.rows, 4);
        assert_eq!(stats.parse_errors, 1);
        assert_eq!(stats.invalid_identifiers, 1);

        let total: usize = batches.iter().map(ComponentBatch::len).sum();
        assert_eq!(total, 4);
        assert!(batches.iter().all(|b| b.len() <= 2));
    }

    #[test]
    fn test_sink_can_stop_early() {
        let dir = tempfile::tempdir().unwrap();
        let mut content =
            String::from("id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\n");
        for _ in 0..10 {
            content.push_str(
                "24700007\t20020131\t1\t900000000000207008\t900000000000074008\n",
            );
        }
        let path = write_file(&dir, "sct2_Concept_Snapshot_INT_20230131.txt", &content);
        let decoded = Rf2Filename::parse("sct2_Concept_Snapshot_INT_20230131.txt").unwrap();

        let mut sent = 0;
        let stats = stream_file(&path, &decoded, 2, |_| {
            sent += 1;
            false
        })
        .unwrap();

        assert_eq!(sent, 1);
        assert!(stats.rows <= 2);
    }
}
