//! On-disk snapshots.
//!
//! Every checkpoint is written into its own `snapshot-NNNNNNNN/` directory and
//! published by atomically replacing the `CURRENT` pointer. Readers resolve
//! `CURRENT` once and read both files from that directory, so they always see
//! one checkpoint's index together with the same checkpoint's documents.

use crate::error::{Error, Result};
use crate::index::{DocumentTable, InvertedIndex};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

const GENERATION_PREFIX: &str = "snapshot-";
/// Generations older than `current - KEEP_GENERATIONS + 1` are pruned after a save.
const KEEP_GENERATIONS: u64 = 2;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub generation: u64,
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

/// The files of one snapshot generation.
#[derive(Debug, Clone)]
pub struct SnapshotFiles {
    pub generation: u64,
    pub dir: PathBuf,
}

impl SnapshotFiles {
    pub fn index(&self) -> PathBuf { self.dir.join("index.json") }
    pub fn documents(&self) -> PathBuf { self.dir.join("documents.json") }
    pub fn meta(&self) -> PathBuf { self.dir.join("meta.json") }
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn current_pointer(&self) -> PathBuf { self.root.join("CURRENT") }

    pub fn has_snapshot(&self) -> bool { self.current_pointer().is_file() }

    pub fn generation(&self, generation: u64) -> SnapshotFiles {
        SnapshotFiles { generation, dir: self.root.join(format!("{GENERATION_PREFIX}{generation:08}")) }
    }

    /// Resolve `CURRENT` to the published generation.
    pub fn current(&self) -> Result<SnapshotFiles> {
        let pointer = self.current_pointer();
        let raw = fs::read_to_string(&pointer).map_err(|e| Error::io(&pointer, e))?;
        let generation = parse_generation(raw.trim()).ok_or_else(|| Error::BadPointer {
            path: pointer.clone(),
            contents: raw.trim().to_string(),
        })?;
        Ok(self.generation(generation))
    }
}

fn parse_generation(name: &str) -> Option<u64> {
    name.strip_prefix(GENERATION_PREFIX)?.parse().ok()
}

/// Full overwrite of the persisted snapshot: a new generation, then a pointer swap.
pub fn save_snapshot(paths: &IndexPaths, index: &InvertedIndex, documents: &DocumentTable) -> Result<SnapshotFiles> {
    fs::create_dir_all(&paths.root).map_err(|e| Error::io(&paths.root, e))?;
    let generation = if paths.has_snapshot() { paths.current()?.generation + 1 } else { 1 };
    let files = paths.generation(generation);
    fs::create_dir_all(&files.dir).map_err(|e| Error::io(&files.dir, e))?;

    write_json(&files.documents(), documents)?;
    write_json(&files.index(), index)?;
    let meta = MetaFile {
        generation,
        num_docs: documents.len() as u32,
        num_terms: index.num_terms() as u32,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: FORMAT_VERSION,
    };
    write_json(&files.meta(), &meta)?;

    let pointer = paths.current_pointer();
    let tmp = pointer.with_extension("tmp");
    let name = files.dir.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
    write_synced(&tmp, |w| w.write_all(name.as_bytes()).map_err(|e| Error::io(&tmp, e)))?;
    fs::rename(&tmp, &pointer).map_err(|e| Error::io(&pointer, e))?;

    prune_generations(paths, generation);
    Ok(files)
}

/// Best effort; a reader still holding an older generation just fails its load.
fn prune_generations(paths: &IndexPaths, current: u64) {
    let Ok(entries) = fs::read_dir(&paths.root) else { return };
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        let Some(generation) = name.to_str().and_then(parse_generation) else { continue };
        if generation + KEEP_GENERATIONS <= current {
            if let Err(e) = fs::remove_dir_all(entry.path()) {
                tracing::warn!(error = %e, path = %entry.path().display(), "failed to prune old snapshot");
            }
        }
    }
}

pub fn load_snapshot(paths: &IndexPaths) -> Result<(InvertedIndex, DocumentTable)> {
    load_generation(&paths.current()?)
}

pub fn load_generation(files: &SnapshotFiles) -> Result<(InvertedIndex, DocumentTable)> {
    let documents: DocumentTable = read_json(&files.documents())?;
    let index: InvertedIndex = read_json(&files.index())?;
    Ok((index, documents))
}

pub fn load_meta(files: &SnapshotFiles) -> Result<MetaFile> {
    read_json(&files.meta())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    write_synced(path, |w| serde_json::to_writer(w, value).map_err(|e| Error::malformed(path, e)))
}

fn write_synced<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let f = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut w = BufWriter::new(f);
    fill(&mut w)?;
    w.flush().map_err(|e| Error::io(path, e))?;
    let f = w.into_inner().map_err(|e| Error::io(path, e.into_error()))?;
    f.sync_all().map_err(|e| Error::io(path, e))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = File::open(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_reader(BufReader::new(f)).map_err(|e| Error::malformed(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Document, Posting};
    use tempfile::tempdir;

    fn doc(url: &str) -> Document {
        Document { url: url.into(), title: None }
    }

    #[test]
    fn save_then_load_is_identity() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let mut index = InvertedIndex::new();
        index.push("cats", Posting { doc_id: 0, term_frequency: 2, positions: vec![0, 2] });
        index.push("cats", Posting { doc_id: 3, term_frequency: 1, positions: vec![5] });
        let mut docs = DocumentTable::new();
        docs.insert(0, Document { url: "https://a.com".into(), title: Some("Cats".into()) });
        docs.insert(3, doc("https://d.com"));

        assert!(!paths.has_snapshot());
        let files = save_snapshot(&paths, &index, &docs).unwrap();
        assert!(paths.has_snapshot());
        let (index2, docs2) = load_snapshot(&paths).unwrap();
        assert_eq!(index2, index);
        assert_eq!(docs2, docs);

        let meta = load_meta(&files).unwrap();
        assert_eq!((meta.generation, meta.num_docs, meta.num_terms, meta.version), (1, 2, 1, FORMAT_VERSION));
        assert!(!paths.current_pointer().with_extension("tmp").exists());
    }

    #[test]
    fn unpublished_generation_is_invisible() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let mut index = InvertedIndex::new();
        index.push("alpha", Posting { doc_id: 0, term_frequency: 1, positions: vec![0] });
        let mut docs = DocumentTable::new();
        docs.insert(0, doc("https://a.com"));
        save_snapshot(&paths, &index, &docs).unwrap();

        // Next checkpoint has landed its documents but not its index or pointer.
        let mut next_docs = docs.clone();
        next_docs.insert(1, doc("https://b.com"));
        let next = paths.generation(2);
        fs::create_dir_all(&next.dir).unwrap();
        write_json(&next.documents(), &next_docs).unwrap();

        let (loaded_index, loaded_docs) = load_snapshot(&paths).unwrap();
        assert_eq!(loaded_docs, docs);
        assert_eq!(loaded_index, index);

        // The interrupted generation is simply overwritten by the next save.
        let files = save_snapshot(&paths, &index, &next_docs).unwrap();
        assert_eq!(files.generation, 2);
        assert_eq!(load_snapshot(&paths).unwrap().1, next_docs);
    }

    #[test]
    fn old_generations_are_pruned() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let docs = DocumentTable::new();
        for _ in 0..4 {
            save_snapshot(&paths, &InvertedIndex::new(), &docs).unwrap();
        }
        assert_eq!(paths.current().unwrap().generation, 4);
        assert!(!paths.generation(2).dir.exists());
        assert!(paths.generation(3).dir.exists());
        assert!(paths.generation(4).dir.exists());
    }

    #[test]
    fn missing_and_malformed_files_are_errors() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        assert!(matches!(load_snapshot(&paths), Err(Error::Io { .. })));

        fs::write(paths.current_pointer(), "garbage").unwrap();
        assert!(matches!(load_snapshot(&paths), Err(Error::BadPointer { .. })));

        let files = paths.generation(1);
        fs::create_dir_all(&files.dir).unwrap();
        fs::write(paths.current_pointer(), "snapshot-00000001\n").unwrap();
        fs::write(files.documents(), "{}").unwrap();
        fs::write(files.index(), "{\"cats\": [").unwrap();
        assert!(matches!(load_snapshot(&paths), Err(Error::Malformed { .. })));
    }
}
