use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Destination for exported documents.
pub trait ExportSink {
    fn store(&self, name: &str, mime_type: &str, bytes: &[u8]) -> io::Result<()>;
}

/// Writes exports as files into a directory, creating it on demand.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportSink for DirectorySink {
    fn store(&self, name: &str, mime_type: &str, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        log::debug!("Writing {} ({}) to {}", name, mime_type, path.display());
        fs::write(path, bytes)
    }
}
