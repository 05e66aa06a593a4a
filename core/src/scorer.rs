use crate::index::DocId;
use crate::snapshot::Snapshot;
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

pub const TITLE_BOOST: f64 = 3.0;
pub const URL_BOOST: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub title: Option<String>,
    pub score: f64,
}

/// TF-IDF ranking with substring title/url boosts.
///
/// Each query token contributes `tf * idf * boost` per posting, where boost is
/// 3x when the term is a case-insensitive substring of the title and 5x when it
/// is one of the url (15x for both). Repeated query tokens contribute again.
/// Ties on score go to the lower doc_id.
pub fn rank(query: &str, snapshot: &Snapshot, top_n: usize) -> Vec<SearchResult> {
    let q_tokens = tokenize(query);
    if q_tokens.is_empty() {
        return Vec::new();
    }

    // Lowercased title/url per doc, computed once per query.
    let mut lowered: HashMap<DocId, (String, String)> = HashMap::new();
    let mut scores: HashMap<DocId, f64> = HashMap::new();

    for term in &q_tokens {
        let (Some(postings), Some(&idf)) = (snapshot.index().postings(term), snapshot.idf().get(term)) else {
            continue;
        };
        for p in postings {
            let Some(doc) = snapshot.documents().get(p.doc_id) else {
                debug_assert!(false, "posting for {term:?} references unknown doc {}", p.doc_id);
                tracing::error!(term = %term, doc_id = p.doc_id, "posting references unknown document");
                continue;
            };
            let (title, url) = lowered.entry(p.doc_id).or_insert_with(|| {
                (doc.title.as_deref().unwrap_or_default().to_lowercase(), doc.url.to_lowercase())
            });
            *scores.entry(p.doc_id).or_insert(0.0) += p.term_frequency as f64 * idf * boost(term, title.as_str(), url.as_str());
        }
    }

    let mut scored: Vec<(DocId, f64)> = scores.into_iter().collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));

    scored
        .into_iter()
        .take(top_n)
        .filter_map(|(doc_id, score)| {
            let doc = snapshot.documents().get(doc_id)?;
            Some(SearchResult { url: doc.url.clone(), title: doc.title.clone(), score })
        })
        .collect()
}

/// Multiplicative boost for a term against a lowercased title and url.
pub fn boost(term: &str, title: &str, url: &str) -> f64 {
    let mut b = 1.0;
    if title.contains(term) { b *= TITLE_BOOST; }
    if url.contains(term) { b *= URL_BOOST; }
    b
}
