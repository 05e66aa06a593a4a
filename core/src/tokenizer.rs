use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref RE: Regex = Regex::new(r"\w+").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","all","am","an","and","any","are","as","at",
            "be","been","being","but","by",
            "can","could",
            "did","do","does",
            "for","from",
            "had","has","have","he","her","him","his","how",
            "i","if","in","into","is","it","its",
            "may","me","might","my",
            "no","not",
            "of","on","or","our","out","over",
            "she","should","so",
            "than","that","the","their","them","then","there","these","they","this","those","to",
            "up","us",
            "was","we","were","what","when","where","which","who","why","will","with","would",
            "you","your"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Tokenize text into an ordered term sequence: lowercase, maximal `\w+` runs,
/// stopwords and single-character tokens dropped.
///
/// Indexing and querying both go through this function, so a term produced at
/// build time is always reachable from a query containing the same word.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    RE.find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| t.chars().count() > 1 && !is_stopword(t))
        .map(String::from)
        .collect()
}

/// Like [`tokenize`], with an absent field yielding no tokens.
pub fn tokenize_field(text: Option<&str>) -> Vec<String> {
    text.map(tokenize).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Cats are great");
        assert_eq!(t, vec!["cats", "great"]);
    }

    #[test]
    fn absent_field_is_empty() {
        assert!(tokenize_field(None).is_empty());
        assert_eq!(tokenize_field(Some("Welcome home")), vec!["welcome", "home"]);
    }

    #[test]
    fn keeps_duplicates_in_order() {
        let t = tokenize("naps, more naps; snack_time 42 naps");
        assert_eq!(t, vec!["naps", "more", "naps", "snack_time", "42", "naps"]);
    }
}
