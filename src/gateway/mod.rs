//! Access to the source and target documents.
//!
//! The session only reads whole documents and appends to the end of one. Each
//! backend resolves the end of the target immediately before every append; no
//! offset is cached between calls since the target grows in between.

pub mod files;
pub mod google;
pub mod memory;

use std::path::Path;

use anyhow::{anyhow, ensure};
use thiserror::Error;

use crate::document::DocumentId;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("document {0} not found")]
    NotFound(DocumentId),

    #[error("not authorized: {0}")]
    Auth(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed document response: {0}")]
    Malformed(String),
}

pub trait DocumentGateway {
    /// Full plain-text content of a document.
    fn fetch(&mut self, doc: &DocumentId) -> Result<String, GatewayError>;

    /// Append `text` at the current end of the document's content.
    fn append(&mut self, doc: &DocumentId, text: &str) -> Result<(), GatewayError>;
}

impl<G: DocumentGateway + ?Sized> DocumentGateway for &mut G {
    fn fetch(&mut self, doc: &DocumentId) -> Result<String, GatewayError> {
        (**self).fetch(doc)
    }

    fn append(&mut self, doc: &DocumentId, text: &str) -> Result<(), GatewayError> {
        (**self).append(doc, text)
    }
}

impl<G: DocumentGateway + ?Sized> DocumentGateway for Box<G> {
    fn fetch(&mut self, doc: &DocumentId) -> Result<String, GatewayError> {
        (**self).fetch(doc)
    }

    fn append(&mut self, doc: &DocumentId, text: &str) -> Result<(), GatewayError> {
        (**self).append(doc, text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayBackend {
    /// `<id>.txt` files under a directory.
    Files,
    /// Google Docs REST API.
    Google,
}

/// Open the gateway for `backend`, failing fast when it cannot be used.
pub fn open_gateway(
    backend: GatewayBackend,
    docs_dir: Option<&Path>,
) -> anyhow::Result<Box<dyn DocumentGateway>> {
    match backend {
        GatewayBackend::Files => {
            let root =
                docs_dir.ok_or_else(|| anyhow!("--docs-dir is required for the files backend"))?;
            ensure!(root.is_dir(), "{} is not a directory", root.display());
            Ok(Box::new(files::FileGateway::new(root)))
        }
        GatewayBackend::Google => {
            if docs_dir.is_some() {
                return Err(anyhow!("--docs-dir only applies to the files backend"));
            }
            Ok(Box::new(google::GoogleDocsGateway::from_env()?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_backend_needs_a_directory() {
        let err = open_gateway(GatewayBackend::Files, None).err().unwrap();
        assert!(format!("{err:#}").contains("--docs-dir"));

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(open_gateway(GatewayBackend::Files, Some(missing.as_path())).is_err());
        assert!(open_gateway(GatewayBackend::Files, Some(dir.path())).is_ok());
    }

    #[test]
    fn google_backend_rejects_docs_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_gateway(GatewayBackend::Google, Some(dir.path()))
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("files backend"));
    }

    #[test]
    fn boxed_gateways_forward_calls() {
        let mut gw: Box<dyn DocumentGateway> =
            Box::new(memory::MemoryGateway::new().with_document("a", "text"));
        assert_eq!(gw.fetch(&DocumentId::new("a")).unwrap(), "text");
    }
}
