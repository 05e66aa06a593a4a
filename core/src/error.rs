use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot pointer {} names no generation: {contents:?}", path.display())]
    BadPointer { path: PathBuf, contents: String },

    #[error("no doc ids left after {doc_id}")]
    IdSpaceExhausted { doc_id: u32 },

    /// A posting points at a doc_id the document table does not contain.
    #[error("posting for term {term:?} references unknown doc {doc_id}")]
    DanglingPosting { term: String, doc_id: u32 },

    #[error("posting for term {term:?} in doc {doc_id} has tf {tf} but {positions} positions")]
    FrequencyMismatch { term: String, doc_id: u32, tf: u32, positions: usize },

    #[error("term {term:?} has no postings")]
    EmptyPostings { term: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Malformed { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
