use crate::error::Result;
use crate::persist::{load_generation, load_meta, IndexPaths};
use crate::pins::PinTable;
use crate::scorer::{rank, SearchResult};
use crate::snapshot::Snapshot;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Queries longer than this are cut before tokenization.
pub const MAX_QUERY_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStats {
    pub generation: u64,
    pub documents: usize,
    pub terms: usize,
}

/// Owns the published snapshot and serves queries against it.
///
/// One lock guards the published snapshot: a query holds it while scoring and
/// a reload holds it only for the swap. Reloads are additionally serialized
/// by `reload_lock` so two never stage at once.
pub struct IndexService {
    paths: IndexPaths,
    pins: PinTable,
    current: Mutex<Arc<Snapshot>>,
    reload_lock: Mutex<()>,
    generation: AtomicU64,
}

impl IndexService {
    /// Startup load. Any failure here leaves nothing to serve.
    pub fn open(paths: IndexPaths, pins: PinTable) -> Result<Self> {
        let snapshot = stage(&paths)?;
        tracing::info!(docs = snapshot.documents().len(), terms = snapshot.index().num_terms(), "index loaded");
        Ok(Self::from_snapshot(paths, snapshot, pins))
    }

    pub fn from_snapshot(paths: IndexPaths, snapshot: Snapshot, pins: PinTable) -> Self {
        Self {
            paths,
            pins,
            current: Mutex::new(Arc::new(snapshot)),
            reload_lock: Mutex::new(()),
            generation: AtomicU64::new(1),
        }
    }

    pub fn query(&self, text: &str, top_n: usize) -> Vec<SearchResult> {
        let text: String = text.chars().take(MAX_QUERY_CHARS).collect();
        let organic = {
            let snapshot = self.current.lock();
            rank(&text, &snapshot, top_n)
        };
        self.pins.apply(&text, organic)
    }

    /// Load the persisted snapshot and publish it if it loads and validates.
    /// On error the previous snapshot stays live.
    pub fn reload(&self) -> Result<ServiceStats> {
        let _reloading = self.reload_lock.lock();
        tracing::info!(path = %self.paths.root.display(), "reloading index");

        let staged = Arc::new(stage(&self.paths)?);
        let previous = {
            let mut current = self.current.lock();
            std::mem::replace(&mut *current, staged)
        };
        // Old snapshot is freed outside the lock.
        drop(previous);
        self.generation.fetch_add(1, Ordering::SeqCst);

        let stats = self.stats();
        tracing::info!(generation = stats.generation, docs = stats.documents, terms = stats.terms, "index reloaded");
        Ok(stats)
    }

    pub fn snapshot(&self) -> Arc<Snapshot> { self.current.lock().clone() }

    pub fn stats(&self) -> ServiceStats {
        let snapshot = self.snapshot();
        ServiceStats {
            generation: self.generation.load(Ordering::SeqCst),
            documents: snapshot.documents().len(),
            terms: snapshot.index().num_terms(),
        }
    }

    pub fn paths(&self) -> &IndexPaths { &self.paths }
}

/// Resolves the published generation once so both files come from the same checkpoint.
fn stage(paths: &IndexPaths) -> Result<Snapshot> {
    let files = paths.current()?;
    let (index, documents) = load_generation(&files)?;
    if let Ok(meta) = load_meta(&files) {
        tracing::debug!(generation = meta.generation, created_at = %meta.created_at, "snapshot metadata");
    }
    Snapshot::new(index, documents)
}
