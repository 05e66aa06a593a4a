use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type DocId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    #[serde(rename = "tf")]
    pub term_frequency: u32,
    /// Offsets into the document's title-then-body token sequence.
    pub positions: Vec<u32>,
}

/// Term -> postings, one per containing document, in indexing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvertedIndex {
    pub terms: HashMap<String, Vec<Posting>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.terms.get(term).map(Vec::as_slice)
    }

    pub fn push(&mut self, term: &str, posting: Posting) {
        match self.terms.get_mut(term) {
            Some(list) => list.push(posting),
            None => {
                self.terms.insert(term.to_string(), vec![posting]);
            }
        }
    }

    pub fn num_terms(&self) -> usize { self.terms.len() }
}

/// doc_id -> document. Serialized with doc_ids as string keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentTable {
    pub docs: BTreeMap<DocId, Document>,
}

impl DocumentTable {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, doc_id: DocId) -> Option<&Document> { self.docs.get(&doc_id) }

    pub fn insert(&mut self, doc_id: DocId, doc: Document) { self.docs.insert(doc_id, doc); }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn max_id(&self) -> Option<DocId> { self.docs.keys().next_back().copied() }

    pub fn urls(&self) -> impl Iterator<Item = &str> { self.docs.values().map(|d| d.url.as_str()) }
}
