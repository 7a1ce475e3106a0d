use std::collections::HashMap;

use super::{DocumentGateway, GatewayError};
use crate::document::DocumentId;

/// One append as the document saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendRecord {
    pub doc: DocumentId,
    /// Character offset the text was inserted at.
    pub index: usize,
    pub text: String,
}

/// In-process documents for tests and library callers.
#[derive(Debug, Default, Clone)]
pub struct MemoryGateway {
    docs: HashMap<DocumentId, Vec<char>>,
    appends: Vec<AppendRecord>,
    fetches: usize,
    fail_appends_after: Option<usize>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, id: &str, text: &str) -> Self {
        self.insert_document(id, text);
        self
    }

    pub fn insert_document(&mut self, id: &str, text: &str) {
        self.docs.insert(DocumentId::new(id), text.chars().collect());
    }

    /// Make every append after the first `n` fail with a transport error.
    pub fn fail_appends_after(mut self, n: usize) -> Self {
        self.fail_appends_after = Some(n);
        self
    }

    pub fn text(&self, id: &str) -> Option<String> {
        self.docs
            .get(&DocumentId::new(id))
            .map(|buf| buf.iter().collect())
    }

    pub fn appends(&self) -> &[AppendRecord] {
        &self.appends
    }

    pub fn appended_texts(&self) -> Vec<&str> {
        self.appends.iter().map(|a| a.text.as_str()).collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    fn end_index(&self, doc: &DocumentId) -> Result<usize, GatewayError> {
        self.docs
            .get(doc)
            .map(Vec::len)
            .ok_or_else(|| GatewayError::NotFound(doc.clone()))
    }
}

impl DocumentGateway for MemoryGateway {
    fn fetch(&mut self, doc: &DocumentId) -> Result<String, GatewayError> {
        self.fetches += 1;
        self.docs
            .get(doc)
            .map(|buf| buf.iter().collect())
            .ok_or_else(|| GatewayError::NotFound(doc.clone()))
    }

    fn append(&mut self, doc: &DocumentId, text: &str) -> Result<(), GatewayError> {
        if let Some(limit) = self.fail_appends_after {
            if self.appends.len() >= limit {
                return Err(GatewayError::Transport(format!(
                    "append to {doc} rejected after {limit} writes"
                )));
            }
        }

        let index = self.end_index(doc)?;
        let buf = self
            .docs
            .get_mut(doc)
            .ok_or_else(|| GatewayError::NotFound(doc.clone()))?;
        buf.extend(text.chars());

        self.appends.push(AppendRecord {
            doc: doc.clone(),
            index,
            text: text.to_string(),
        });
        Ok(())
    }
}
