use crate::index::InvertedIndex;
use std::collections::HashMap;

pub type IdfTable = HashMap<String, f64>;

/// `idf(t) = ln(total_docs / df(t))` where df is the posting count.
/// An empty corpus has no scorable terms.
pub fn compute_idf(index: &InvertedIndex, total_docs: usize) -> IdfTable {
    if total_docs == 0 {
        return IdfTable::new();
    }
    let n = total_docs as f64;
    index
        .terms
        .iter()
        .map(|(term, postings)| (term.clone(), (n / postings.len() as f64).ln()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Posting;

    fn index_with_df(dfs: &[(&str, u32)]) -> InvertedIndex {
        let mut index = InvertedIndex::new();
        for (term, df) in dfs {
            for doc_id in 0..*df {
                index.push(term, Posting { doc_id, term_frequency: 1, positions: vec![0] });
            }
        }
        index
    }

    #[test]
    fn empty_corpus_yields_empty_table() {
        let index = index_with_df(&[("cats", 1)]);
        assert!(compute_idf(&index, 0).is_empty());
    }

    #[test]
    fn idf_decreases_with_doc_frequency() {
        let index = index_with_df(&[("rare", 1), ("mid", 3), ("common", 10)]);
        let idf = compute_idf(&index, 10);
        assert!((idf["rare"] - 10f64.ln()).abs() < 1e-12);
        assert!(idf["rare"] > idf["mid"]);
        assert!(idf["mid"] > idf["common"]);
        assert_eq!(idf["common"], 0.0);
    }
}
