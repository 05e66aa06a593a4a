use crate::error::{Error, Result};
use crate::index::{DocId, Document, DocumentTable, InvertedIndex, Posting};
use crate::persist::{load_snapshot, save_snapshot, IndexPaths};
use crate::snapshot::Snapshot;
use crate::tokenizer::tokenize_field;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_CHECKPOINT_EVERY: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct RawDocument {
    /// Accepted only when it does not go backwards; otherwise the next sequential id is used.
    pub doc_id_hint: Option<DocId>,
    pub url: String,
    pub title: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Indexed(DocId),
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub indexed: usize,
    pub duplicates: usize,
    pub documents: usize,
    pub terms: usize,
}

/// Owns the growing index and document table for one build run.
pub struct IndexBuilder {
    index: InvertedIndex,
    documents: DocumentTable,
    seen_urls: HashSet<String>,
    next_doc_id: DocId,
    paths: Option<IndexPaths>,
    checkpoint_every: usize,
    indexed: usize,
    duplicates: usize,
}

impl IndexBuilder {
    /// In-memory builder with no checkpointing.
    pub fn new() -> Self {
        Self::from_parts(InvertedIndex::new(), DocumentTable::new(), 0, None, DEFAULT_CHECKPOINT_EVERY)
    }

    /// Builder that checkpoints into `paths`, resuming from the snapshot there unless `fresh`.
    pub fn open(paths: IndexPaths, checkpoint_every: usize, fresh: bool) -> Result<Self> {
        let (index, documents) = if !fresh && paths.has_snapshot() {
            let (index, documents) = load_snapshot(&paths)?;
            // Refuse to extend a snapshot that is already inconsistent.
            Snapshot::new(index, documents)?.into_parts()
        } else {
            (InvertedIndex::new(), DocumentTable::new())
        };
        let next_doc_id = match documents.max_id() {
            Some(max) => max.checked_add(1).ok_or(Error::IdSpaceExhausted { doc_id: max })?,
            None => 0,
        };
        let builder = Self::from_parts(index, documents, next_doc_id, Some(paths), checkpoint_every);
        if !builder.documents.is_empty() {
            tracing::info!(
                docs = builder.documents.len(),
                terms = builder.index.num_terms(),
                next_doc_id = builder.next_doc_id,
                "resuming from persisted snapshot"
            );
        }
        Ok(builder)
    }

    fn from_parts(
        index: InvertedIndex,
        documents: DocumentTable,
        next_doc_id: DocId,
        paths: Option<IndexPaths>,
        checkpoint_every: usize,
    ) -> Self {
        let seen_urls = documents.urls().map(String::from).collect();
        Self {
            index,
            documents,
            seen_urls,
            next_doc_id,
            paths,
            checkpoint_every: checkpoint_every.max(1),
            indexed: 0,
            duplicates: 0,
        }
    }

    pub fn ingest(&mut self, doc: RawDocument) -> Result<IngestOutcome> {
        if self.seen_urls.contains(&doc.url) {
            tracing::debug!(url = %doc.url, "skipping already indexed url");
            self.duplicates += 1;
            return Ok(IngestOutcome::Duplicate);
        }

        let doc_id = match doc.doc_id_hint {
            Some(hint) if hint >= self.next_doc_id => hint,
            _ => self.next_doc_id,
        };
        // The id after this one must exist too, so the last u32 is never handed out.
        self.next_doc_id = doc_id.checked_add(1).ok_or(Error::IdSpaceExhausted { doc_id })?;

        let mut tokens = tokenize_field(doc.title.as_deref());
        tokens.extend(tokenize_field(Some(&doc.body)));

        // First-occurrence order keeps posting insertion deterministic.
        let mut order: Vec<&str> = Vec::new();
        let mut positions: HashMap<&str, Vec<u32>> = HashMap::new();
        for (pos, term) in tokens.iter().enumerate() {
            let slot = positions.entry(term.as_str()).or_default();
            if slot.is_empty() {
                order.push(term.as_str());
            }
            slot.push(pos as u32);
        }
        for term in order {
            let offsets = positions.remove(term).unwrap_or_default();
            let posting = Posting { doc_id, term_frequency: offsets.len() as u32, positions: offsets };
            self.index.push(term, posting);
        }

        self.seen_urls.insert(doc.url.clone());
        self.documents.insert(doc_id, Document { url: doc.url, title: doc.title });
        self.indexed += 1;

        if self.indexed % 10 == 0 {
            tracing::debug!(indexed = self.indexed, "indexed documents");
        }
        if self.paths.is_some() && self.indexed % self.checkpoint_every == 0 {
            self.checkpoint()?;
        }
        Ok(IngestOutcome::Indexed(doc_id))
    }

    /// Overwrite the persisted snapshot with the current state. No-op without paths.
    pub fn checkpoint(&self) -> Result<()> {
        if let Some(paths) = &self.paths {
            let files = save_snapshot(paths, &self.index, &self.documents)?;
            tracing::info!(
                generation = files.generation,
                docs = self.documents.len(),
                terms = self.index.num_terms(),
                path = %paths.root.display(),
                "checkpoint written"
            );
        }
        Ok(())
    }

    /// Final checkpoint, unconditionally.
    pub fn finish(self) -> Result<BuildSummary> {
        self.checkpoint()?;
        Ok(self.summary())
    }

    pub fn summary(&self) -> BuildSummary {
        BuildSummary {
            indexed: self.indexed,
            duplicates: self.duplicates,
            documents: self.documents.len(),
            terms: self.index.num_terms(),
        }
    }

    pub fn index(&self) -> &InvertedIndex { &self.index }
    pub fn documents(&self) -> &DocumentTable { &self.documents }
    pub fn next_doc_id(&self) -> DocId { self.next_doc_id }

    pub fn snapshot(&self) -> Result<Snapshot> {
        Snapshot::new(self.index.clone(), self.documents.clone())
    }
}

impl Default for IndexBuilder {
    fn default() -> Self { Self::new() }
}
