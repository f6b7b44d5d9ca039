//! Single-slot template storage.
//!
//! There is exactly one active template. `put` overwrites it, there is no
//! history and no delete. Stores do no authorization; callers reach `put`
//! through [`crate::app::Admin`].

use crate::error::{DocfillError, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

pub trait TemplateStore {
    /// Replace the active template
    fn put(&self, bytes: &[u8]) -> Result<()>;

    fn exists(&self) -> bool;

    /// Raw bytes of the active template, [`DocfillError::NotFound`] if none
    fn get(&self) -> Result<Vec<u8>>;
}

/// Template kept as one file at a fixed path
#[derive(Debug, Clone)]
pub struct FsTemplateStore {
    path: PathBuf,
}

impl FsTemplateStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl TemplateStore for FsTemplateStore {
    fn put(&self, bytes: &[u8]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        // Write next to the slot then rename, so a failed write never truncates it.
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| DocfillError::Io(e.error))?;

        info!(path = %self.path.display(), size = bytes.len(), "template stored");
        Ok(())
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn get(&self) -> Result<Vec<u8>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DocfillError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

/// Session-only store; the template lives as long as the value
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    slot: Mutex<Option<Vec<u8>>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn put(&self, bytes: &[u8]) -> Result<()> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(bytes.to_vec());
        Ok(())
    }

    fn exists(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn get(&self) -> Result<Vec<u8>> {
        self.slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(DocfillError::NotFound)
    }
}

impl<S: TemplateStore + ?Sized> TemplateStore for &S {
    fn put(&self, bytes: &[u8]) -> Result<()> {
        (**self).put(bytes)
    }

    fn exists(&self) -> bool {
        (**self).exists()
    }

    fn get(&self) -> Result<Vec<u8>> {
        (**self).get()
    }
}
