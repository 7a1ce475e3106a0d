use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque document identifier taken from a link of the shape `.../d/<id>/...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Extract the identifier following the first `/d/` segment of `link`.
///
/// The identifier is the longest run of ASCII letters, digits, `-` and `_`
/// after the marker; an empty run means the link carries no id.
pub fn extract_doc_id(link: &str) -> Option<DocumentId> {
    let mut rest = link;
    while let Some(pos) = rest.find("/d/") {
        let after = &rest[pos + 3..];
        let end = after.find(|c: char| !is_id_char(c)).unwrap_or(after.len());
        if end > 0 {
            return Some(DocumentId::new(&after[..end]));
        }
        rest = &rest[pos + 1..];
    }
    None
}

/// Source text split into paragraphs (by line break) and whitespace-delimited
/// words. Immutable for the duration of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manuscript {
    paragraphs: Vec<Vec<String>>,
}

impl Manuscript {
    pub fn parse(text: &str) -> Self {
        let paragraphs = text
            .split('\n')
            .map(|line| line.split_whitespace().map(str::to_string).collect())
            .collect();
        Self { paragraphs }
    }

    pub fn paragraph(&self, index: usize) -> Option<&[String]> {
        self.paragraphs.get(index).map(Vec::as_slice)
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn total_words(&self) -> usize {
        self.paragraphs.iter().map(Vec::len).sum()
    }
}

/// Word count used for estimates before a session starts.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_from_docs_link() {
        let id = extract_doc_id("https://docs.google.com/document/d/1AbC-x_9/edit?usp=sharing");
        assert_eq!(id, Some(DocumentId::new("1AbC-x_9")));
    }

    #[test]
    fn id_may_end_the_link() {
        assert_eq!(
            extract_doc_id("https://example.com/d/abc"),
            Some(DocumentId::new("abc"))
        );
    }

    #[test]
    fn malformed_links_have_no_id() {
        for link in [
            "",
            "https://docs.google.com/document/",
            "https://docs.google.com/document/d/",
            "https://docs.google.com/document/d//edit",
            "not a link",
        ] {
            assert_eq!(extract_doc_id(link), None, "{link}");
        }
    }

    #[test]
    fn skips_empty_marker_and_finds_later_one() {
        assert_eq!(
            extract_doc_id("https://x/d//d/real/edit"),
            Some(DocumentId::new("real"))
        );
    }

    #[test]
    fn splits_paragraphs_then_words() {
        let m = Manuscript::parse("one  two\n\nthree\tfour five\n");
        assert_eq!(m.paragraph_count(), 4);
        assert_eq!(m.paragraph(0), Some(&["one".to_string(), "two".to_string()][..]));
        assert!(m.paragraph(1).is_some_and(<[String]>::is_empty));
        assert_eq!(m.paragraph(2).map(<[String]>::len), Some(3));
        assert_eq!(m.total_words(), 5);
        assert_eq!(count_words("one  two\n\nthree\tfour five\n"), 5);
    }
}
