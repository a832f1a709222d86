//! Persistence collaborators
//!
//! The engine only sees [`PixelBackend`]. Rows cross this boundary untyped
//! ([`RawRow`]) and are validated row by row by the store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::pixel::PixelRow;

/// A row as returned by the remote side, before schema validation
pub type RawRow = serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("backend rejected the request: {0}")]
    Rejected(String),
}

/// Per-session state that survives a restart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Epoch ms before which placements are refused
    pub cooldown_deadline: u64,
    pub show_grid: bool,
}

/// Remote pixel storage
pub trait PixelBackend {
    /// Every stored row
    fn bulk_load(&mut self) -> Result<Vec<RawRow>, BackendError>;

    /// Insert or replace the row at `(row.x, row.y)`
    fn upsert(&mut self, row: &PixelRow) -> Result<(), BackendError>;

    fn load_session(&mut self) -> Result<Option<SessionState>, BackendError> {
        Ok(None)
    }

    fn save_session(&mut self, _state: &SessionState) -> Result<(), BackendError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<RawRow>,
    upserts: Vec<PixelRow>,
    session: Option<SessionState>,
    failing: Option<String>,
}

/// In-process backend. Clones share the same storage, so a test (or the web
/// shell) can keep a handle while the store owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a raw row, bypassing validation
    pub fn insert_raw(&self, row: RawRow) {
        self.state().rows.push(row);
    }

    /// Every successful upsert, in call order
    pub fn upserts(&self) -> Vec<PixelRow> {
        self.state().upserts.clone()
    }

    /// Make every call fail with `reason` until cleared with `None`
    pub fn set_failing(&self, reason: Option<&str>) {
        self.state().failing = reason.map(str::to_string);
    }

    pub fn session(&self) -> Option<SessionState> {
        self.state().session
    }
}

impl PixelBackend for MemoryBackend {
    fn bulk_load(&mut self) -> Result<Vec<RawRow>, BackendError> {
        let state = self.state();
        if let Some(reason) = &state.failing {
            return Err(BackendError::Rejected(reason.clone()));
        }
        Ok(state.rows.clone())
    }

    fn upsert(&mut self, row: &PixelRow) -> Result<(), BackendError> {
        let mut state = self.state();
        if let Some(reason) = &state.failing {
            return Err(BackendError::Rejected(reason.clone()));
        }
        let value = serde_json::to_value(row)?;
        replace_row(&mut state.rows, row, value);
        state.upserts.push(row.clone());
        Ok(())
    }

    fn load_session(&mut self) -> Result<Option<SessionState>, BackendError> {
        Ok(self.state().session)
    }

    fn save_session(&mut self, state: &SessionState) -> Result<(), BackendError> {
        self.state().session = Some(*state);
        Ok(())
    }
}

fn same_cell(value: &RawRow, row: &PixelRow) -> bool {
    value.get("x").and_then(|v| v.as_i64()) == Some(row.x)
        && value.get("y").and_then(|v| v.as_i64()) == Some(row.y)
}

fn replace_row(rows: &mut Vec<RawRow>, row: &PixelRow, value: RawRow) {
    match rows.iter_mut().find(|existing| same_cell(existing, row)) {
        Some(existing) => *existing = value,
        None => rows.push(value),
    }
}

/// On-disk document of [`JsonFileBackend`]
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    pixels: Vec<RawRow>,
    #[serde(default)]
    session: Option<SessionState>,
}

/// Single JSON file holding every row plus the session state.
/// The document is read once and rewritten atomically on every change.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    doc: Option<StoreFile>,
}

impl JsonFileBackend {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            doc: None,
        }
    }

    fn doc(&mut self) -> Result<&mut StoreFile, BackendError> {
        if self.doc.is_none() {
            let doc = match fs::read_to_string(&self.path) {
                Ok(text) if text.trim().is_empty() => StoreFile::default(),
                Ok(text) => serde_json::from_str(&text)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreFile::default(),
                Err(e) => return Err(e.into()),
            };
            log::info!("Opened pixel store {} ({} rows)", self.path.display(), doc.pixels.len());
            self.doc = Some(doc);
        }
        Ok(self.doc.get_or_insert_with(StoreFile::default))
    }

    fn flush(&mut self) -> Result<(), BackendError> {
        let Some(doc) = &self.doc else {
            return Ok(());
        };
        let text = serde_json::to_string_pretty(doc)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PixelBackend for JsonFileBackend {
    fn bulk_load(&mut self) -> Result<Vec<RawRow>, BackendError> {
        Ok(self.doc()?.pixels.clone())
    }

    fn upsert(&mut self, row: &PixelRow) -> Result<(), BackendError> {
        let value = serde_json::to_value(row)?;
        replace_row(&mut self.doc()?.pixels, row, value);
        self.flush()
    }

    fn load_session(&mut self) -> Result<Option<SessionState>, BackendError> {
        Ok(self.doc()?.session)
    }

    fn save_session(&mut self, state: &SessionState) -> Result<(), BackendError> {
        self.doc()?.session = Some(*state);
        self.flush()
    }
}

/// Backend chosen from configuration: a JSON file when a path is given
pub fn open_backend(store_path: Option<&str>) -> Box<dyn PixelBackend> {
    match store_path {
        Some(path) => Box::new(JsonFileBackend::new(path)),
        None => Box::new(MemoryBackend::new()),
    }
}
