//! In-memory inverted index, TF-IDF ranking and the reloadable query service.

pub mod builder;
pub mod capture;
pub mod error;
pub mod idf;
pub mod index;
pub mod persist;
pub mod pins;
pub mod scorer;
pub mod service;
pub mod snapshot;
pub mod tokenizer;

pub use builder::{BuildSummary, IndexBuilder, IngestOutcome, RawDocument};
pub use error::{Error, Result};
pub use idf::{compute_idf, IdfTable};
pub use index::{DocId, Document, DocumentTable, InvertedIndex, Posting};
pub use pins::{PinTable, PinnedResult};
pub use scorer::{rank, SearchResult};
pub use service::{IndexService, ServiceStats};
pub use snapshot::Snapshot;
