use super::ImageSource;
use crate::error::{CutoutError, Result};
use std::path::{Path, PathBuf};

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ImageSource for FileSource {
    fn read_bytes(&mut self) -> Result<Vec<u8>> {
        tracing::debug!("Reading image from {}", self.path.display());

        let bytes = std::fs::read(&self.path).map_err(|e| {
            CutoutError::source_unreadable(format!("{}: {}", self.path.display(), e))
        })?;

        if bytes.is_empty() {
            return Err(CutoutError::source_unreadable(format!(
                "{} is empty",
                self.path.display()
            )));
        }

        Ok(bytes)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Bytes already in memory, handed over once
pub struct MemorySource {
    bytes: Option<Vec<u8>>,
}

impl MemorySource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes: Some(bytes) }
    }
}

impl ImageSource for MemorySource {
    fn read_bytes(&mut self) -> Result<Vec<u8>> {
        self.bytes
            .take()
            .ok_or_else(|| CutoutError::source_unreadable("memory source already consumed"))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
