use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{DocumentGateway, GatewayError};
use crate::document::DocumentId;

/// Documents stored as `<root>/<id>.txt`.
#[derive(Debug, Clone)]
pub struct FileGateway {
    root: PathBuf,
}

impl FileGateway {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, doc: &DocumentId) -> PathBuf {
        self.root.join(format!("{}.txt", doc.as_str()))
    }
}

fn map_io(doc: &DocumentId, path: &Path, err: io::Error) -> GatewayError {
    match err.kind() {
        io::ErrorKind::NotFound => GatewayError::NotFound(doc.clone()),
        io::ErrorKind::PermissionDenied => {
            GatewayError::Auth(format!("permission denied for {}", path.display()))
        }
        _ => GatewayError::Transport(format!("{}: {err}", path.display())),
    }
}

impl DocumentGateway for FileGateway {
    fn fetch(&mut self, doc: &DocumentId) -> Result<String, GatewayError> {
        let path = self.path_for(doc);
        fs::read_to_string(&path).map_err(|err| map_io(doc, &path, err))
    }

    fn append(&mut self, doc: &DocumentId, text: &str) -> Result<(), GatewayError> {
        let path = self.path_for(doc);
        // The target must already exist, like a real document.
        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|err| map_io(doc, &path, err))?;
        let end = file
            .metadata()
            .map_err(|err| map_io(doc, &path, err))?
            .len();
        tracing::trace!(doc = %doc, end, len = text.len(), "appending");
        file.write_all(text.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|err| map_io(doc, &path, err))
    }
}
