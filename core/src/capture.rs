//! Raw capture logs: JSON Lines of `{url, title, text}` as emitted by the fetcher.
//!
//! A capture log can repeat a URL. Only the first occurrence of each URL is
//! kept, both when rewriting a log on disk and when streaming records into
//! the builder.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaptureRecord {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "body")]
    pub text: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DedupStats {
    pub total: usize,
    pub unique: usize,
    pub removed: usize,
}

#[derive(Deserialize)]
struct UrlOnly {
    url: String,
}

/// Stream records from a capture log. Blank lines are skipped.
pub fn read_capture_log(path: &Path) -> Result<impl Iterator<Item = Result<CaptureRecord>>> {
    let f = File::open(path).map_err(|e| Error::io(path, e))?;
    let owned = path.to_path_buf();
    Ok(BufReader::new(f).lines().filter_map(move |line| match line {
        Err(e) => Some(Err(Error::io(&owned, e))),
        Ok(l) if l.trim().is_empty() => None,
        Ok(l) => Some(serde_json::from_str(&l).map_err(|e| Error::malformed(&owned, e))),
    }))
}

/// Rewrite `input` to `output` keeping each URL's first line verbatim.
pub fn dedup_capture_log(input: &Path, output: &Path) -> Result<DedupStats> {
    let reader = BufReader::new(File::open(input).map_err(|e| Error::io(input, e))?);
    if let Some(dir) = output.parent() {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    let mut out = BufWriter::new(File::create(output).map_err(|e| Error::io(output, e))?);
    let mut seen: HashSet<String> = HashSet::new();
    let mut stats = DedupStats::default();

    for line in reader.lines() {
        let line = line.map_err(|e| Error::io(input, e))?;
        if line.trim().is_empty() { continue; }
        stats.total += 1;
        let rec: UrlOnly = serde_json::from_str(&line).map_err(|e| Error::malformed(input, e))?;
        if seen.insert(rec.url) {
            out.write_all(line.as_bytes()).map_err(|e| Error::io(output, e))?;
            out.write_all(b"\n").map_err(|e| Error::io(output, e))?;
            stats.unique += 1;
        } else {
            stats.removed += 1;
        }
    }
    out.flush().map_err(|e| Error::io(output, e))?;
    tracing::info!(total = stats.total, unique = stats.unique, removed = stats.removed, "capture log deduplicated");
    Ok(stats)
}

/// Iterator adaptor applying first-occurrence-wins on URL. Errors pass through.
pub struct FirstSeen<I> {
    inner: I,
    seen: HashSet<String>,
    removed: usize,
}

impl<I> FirstSeen<I> {
    pub fn new(inner: I) -> Self {
        Self { inner, seen: HashSet::new(), removed: 0 }
    }

    pub fn removed(&self) -> usize { self.removed }
}

impl<I> Iterator for FirstSeen<I>
where
    I: Iterator<Item = Result<CaptureRecord>>,
{
    type Item = Result<CaptureRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(rec) => {
                    if self.seen.insert(rec.url.clone()) {
                        return Some(Ok(rec));
                    }
                    self.removed += 1;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const LOG: &str = r#"{"url": "https://a.com", "title": "A", "text": "first"}
{"url": "https://b.com", "title": null, "text": "bee"}

{"url": "https://a.com", "title": "A again", "text": "second"}
{"url": "https://c.com", "title": "C", "body": "sea"}
"#;

    #[test]
    fn dedup_log_keeps_first_occurrence() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("output.jsonl");
        let output = dir.path().join("deduped/output.jsonl");
        fs::write(&input, LOG).unwrap();

        let stats = dedup_capture_log(&input, &output).unwrap();
        assert_eq!(stats, DedupStats { total: 4, unique: 3, removed: 1 });

        let kept: Vec<CaptureRecord> = read_capture_log(&output).unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].text.as_deref(), Some("first"));
        assert_eq!(kept[2].text.as_deref(), Some("sea"));
        assert_eq!(kept[1].title, None);
    }

    #[test]
    fn first_seen_filters_stream() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("output.jsonl");
        fs::write(&input, LOG).unwrap();

        let mut stream = FirstSeen::new(read_capture_log(&input).unwrap());
        let urls: Vec<String> = stream.by_ref().map(|r| r.unwrap().url).collect();
        assert_eq!(urls, vec!["https://a.com", "https://b.com", "https://c.com"]);
        assert_eq!(stream.removed(), 1);
    }

    #[test]
    fn malformed_line_is_an_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("bad.jsonl");
        fs::write(&input, "{\"url\": \"https://a.com\"}\nnot json\n").unwrap();
        let results: Vec<_> = read_capture_log(&input).unwrap().collect();
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::Malformed { .. })));
    }
}
