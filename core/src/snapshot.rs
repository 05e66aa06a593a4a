use crate::error::{Error, Result};
use crate::idf::{compute_idf, IdfTable};
use crate::index::{DocumentTable, InvertedIndex};

/// One consistent (index, documents, idf) triple. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    index: InvertedIndex,
    documents: DocumentTable,
    idf: IdfTable,
}

impl Snapshot {
    /// Validates the index against the document table and derives the IDF table.
    pub fn new(index: InvertedIndex, documents: DocumentTable) -> Result<Self> {
        validate(&index, &documents)?;
        let idf = compute_idf(&index, documents.len());
        Ok(Self { index, documents, idf })
    }

    pub fn index(&self) -> &InvertedIndex { &self.index }
    pub fn documents(&self) -> &DocumentTable { &self.documents }
    pub fn idf(&self) -> &IdfTable { &self.idf }

    pub fn into_parts(self) -> (InvertedIndex, DocumentTable) { (self.index, self.documents) }
}

fn validate(index: &InvertedIndex, documents: &DocumentTable) -> Result<()> {
    for (term, postings) in &index.terms {
        if postings.is_empty() {
            return Err(Error::EmptyPostings { term: term.clone() });
        }
        for p in postings {
            if documents.get(p.doc_id).is_none() {
                return Err(Error::DanglingPosting { term: term.clone(), doc_id: p.doc_id });
            }
            if p.term_frequency as usize != p.positions.len() {
                return Err(Error::FrequencyMismatch {
                    term: term.clone(),
                    doc_id: p.doc_id,
                    tf: p.term_frequency,
                    positions: p.positions.len(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Document, Posting};

    fn one_doc() -> DocumentTable {
        let mut docs = DocumentTable::new();
        docs.insert(0, Document { url: "https://a.com".into(), title: Some("Cats".into()) });
        docs
    }

    #[test]
    fn rejects_dangling_posting() {
        let mut index = InvertedIndex::new();
        index.push("cats", Posting { doc_id: 9, term_frequency: 1, positions: vec![0] });
        let err = Snapshot::new(index, one_doc()).unwrap_err();
        assert!(matches!(err, Error::DanglingPosting { doc_id: 9, .. }));
    }

    #[test]
    fn rejects_tf_position_mismatch() {
        let mut index = InvertedIndex::new();
        index.push("cats", Posting { doc_id: 0, term_frequency: 2, positions: vec![0] });
        let err = Snapshot::new(index, one_doc()).unwrap_err();
        assert!(matches!(err, Error::FrequencyMismatch { tf: 2, positions: 1, .. }));
    }

    #[test]
    fn rejects_empty_posting_list() {
        let mut index = InvertedIndex::new();
        index.terms.insert("ghost".into(), Vec::new());
        assert!(matches!(Snapshot::new(index, one_doc()), Err(Error::EmptyPostings { .. })));
    }

    #[test]
    fn idf_uses_document_count() {
        let mut docs = one_doc();
        docs.insert(1, Document { url: "https://b.com".into(), title: None });
        let mut index = InvertedIndex::new();
        index.push("cats", Posting { doc_id: 0, term_frequency: 1, positions: vec![0] });
        let snap = Snapshot::new(index, docs).unwrap();
        assert!((snap.idf()["cats"] - 2f64.ln()).abs() < 1e-12);
    }
}
