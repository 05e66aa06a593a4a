//! Pinned results: fixed entries shown first for exact vanity queries.
//!
//! Runs after ranking and never touches relevance scores of organic results.

use crate::error::{Error, Result};
use crate::scorer::SearchResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PIN_SCORE: f64 = 9999.99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinnedResult {
    /// Query strings matched after trim + lowercase.
    pub queries: Vec<String>,
    pub url: String,
    pub title: Option<String>,
    #[serde(default = "default_pin_score")]
    pub score: f64,
}
fn default_pin_score() -> f64 { DEFAULT_PIN_SCORE }

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinTable {
    pub entries: Vec<PinnedResult>,
}

impl PinTable {
    /// An empty table; the pinned stage does nothing.
    pub fn disabled() -> Self { Self::default() }

    pub fn new(entries: Vec<PinnedResult>) -> Self { Self { entries } }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&raw).map_err(|e| Error::malformed(path, e))
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Put every matching entry ahead of `organic`, in table order.
    ///
    /// A pin's score is raised above the best organic score if the configured
    /// sentinel would not already clear it.
    pub fn apply(&self, query: &str, organic: Vec<SearchResult>) -> Vec<SearchResult> {
        let normalized = query.trim().to_lowercase();
        let matched: Vec<&PinnedResult> = self
            .entries
            .iter()
            .filter(|e| e.queries.iter().any(|q| q.trim().to_lowercase() == normalized))
            .collect();
        if matched.is_empty() {
            return organic;
        }
        let best = organic.iter().map(|r| r.score).fold(f64::NEG_INFINITY, f64::max);
        let mut out: Vec<SearchResult> = matched
            .into_iter()
            .map(|e| SearchResult {
                url: e.url.clone(),
                title: e.title.clone(),
                score: if e.score > best { e.score } else { above(best) },
            })
            .collect();
        out.extend(organic);
        out
    }
}

/// A score strictly greater than `best`, even where `best + 1.0` rounds back to `best`.
fn above(best: f64) -> f64 {
    let bumped = best + 1.0;
    if bumped > best {
        bumped
    } else {
        best + best.abs() * 2.0 * f64::EPSILON
    }
}
