//! Authoritative local pixel map with cooldown and debounced write-back
//!
//! Writes are optimistic: the map changes immediately and the backend sees
//! the newest pixel for a cell once that cell has been quiet for the debounce
//! interval. A failed write is reported and left as is; local state is never
//! rolled back.

use std::collections::HashMap;

use crate::backend::{PixelBackend, SessionState};
use crate::color::Color;
use crate::debounce::DebounceRegistry;
use crate::notify::{Notifier, Session};
use crate::pixel::{CellCoord, Pixel, PixelRow};
use crate::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlaceError {
    #[error("cooldown active for another {remaining_ms} ms")]
    CooldownActive { remaining_ms: u64 },
    #[error("cell ({}, {}) is outside the canvas", .0.x, .0.y)]
    OutOfBounds(CellCoord),
}

/// Outcome of the initial bulk load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub rejected: usize,
    /// The backend call itself failed; the map was left empty
    pub failed: bool,
}

/// Outcome of one write-back pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub written: usize,
    pub failed: usize,
}

pub struct PixelStore {
    pixels: HashMap<CellCoord, Pixel>,
    cooldown_deadline: u64,
    cooldown_ms: u64,
    canvas_size: i32,
    pending: DebounceRegistry<CellCoord>,
    backend: Box<dyn PixelBackend>,
    notifier: Box<dyn Notifier>,
    session: Session,
}

impl PixelStore {
    pub fn new(config: &Config, backend: Box<dyn PixelBackend>, notifier: Box<dyn Notifier>) -> Self {
        let session = match &config.owner_id {
            Some(id) => Session::signed_in(id.clone()),
            None => Session::anonymous(),
        };

        Self {
            pixels: HashMap::new(),
            cooldown_deadline: 0,
            cooldown_ms: config.cooldown_ms,
            canvas_size: config.canvas_size,
            pending: DebounceRegistry::new(config.debounce_ms),
            backend,
            notifier,
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn set_session(&mut self, session: Session) {
        log::info!("Session owner is now {}", session.owner_id());
        self.session = session;
    }

    pub fn get(&self, coord: CellCoord) -> Option<&Pixel> {
        self.pixels.get(&coord)
    }

    pub fn pixels(&self) -> impl Iterator<Item = &Pixel> {
        self.pixels.values()
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn cooldown_deadline(&self) -> u64 {
        self.cooldown_deadline
    }

    pub fn cooldown_remaining(&self, now: u64) -> u64 {
        self.cooldown_deadline.saturating_sub(now)
    }

    /// Cells with a write-back still scheduled
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, coord: CellCoord) -> bool {
        self.pending.is_pending(&coord)
    }

    /// Place a pixel. This is the only path that mutates the map after load.
    pub fn set_pixel(&mut self, coord: CellCoord, color: Color, now: u64) -> Result<&Pixel, PlaceError> {
        if !coord.in_bounds(self.canvas_size) {
            return Err(PlaceError::OutOfBounds(coord));
        }

        if now < self.cooldown_deadline {
            self.notifier.notify(
                "Cooldown active",
                Some("Please wait before placing another pixel."),
                now,
            );
            return Err(PlaceError::CooldownActive {
                remaining_ms: self.cooldown_deadline - now,
            });
        }

        let pixel = Pixel {
            coord,
            color,
            last_updated: now,
            owner_id: self.session.owner_id().to_string(),
        };
        self.pixels.insert(coord, pixel);
        self.cooldown_deadline = now.saturating_add(self.cooldown_ms);

        if self.pending.schedule(coord, now) {
            log::trace!("Coalesced pending write for ({}, {})", coord.x, coord.y);
        }

        Ok(&self.pixels[&coord])
    }

    /// Send every cell whose debounce interval has elapsed
    pub fn flush_due(&mut self, now: u64) -> FlushReport {
        let due = self.pending.take_due(now);
        self.persist(due, now)
    }

    /// Send every pending cell immediately and clear the registry
    pub fn flush_all(&mut self, now: u64) -> FlushReport {
        let keys = self.pending.drain();
        self.persist(keys, now)
    }

    fn persist(&mut self, keys: Vec<CellCoord>, now: u64) -> FlushReport {
        let mut report = FlushReport::default();
        for coord in keys {
            let Some(pixel) = self.pixels.get(&coord) else {
                continue;
            };
            let row = pixel.to_row();
            match self.backend.upsert(&row) {
                Ok(()) => {
                    log::debug!("Saved pixel ({}, {}) {}", row.x, row.y, row.color);
                    report.written += 1;
                }
                Err(e) => {
                    log::error!("Error saving pixel ({}, {}): {}", row.x, row.y, e);
                    self.notifier.notify("Failed to save pixel", Some(&e.to_string()), now);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Populate the map from the backend in one pass. Malformed rows are
    /// dropped individually; a failed call leaves the map empty.
    pub fn load_initial(&mut self, now: u64) -> LoadReport {
        let rows = match self.backend.bulk_load() {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("Failed to load pixels: {}", e);
                self.notifier.notify("Failed to load pixels", Some(&e.to_string()), now);
                return LoadReport { failed: true, ..LoadReport::default() };
            }
        };

        let mut report = LoadReport::default();
        for value in rows {
            match PixelRow::from_value(value) {
                Ok(pixel) => {
                    let newer = self
                        .pixels
                        .get(&pixel.coord)
                        .map_or(true, |existing| existing.last_updated <= pixel.last_updated);
                    if newer {
                        self.pixels.insert(pixel.coord, pixel);
                    }
                    report.loaded += 1;
                }
                Err(e) => {
                    log::warn!("Dropping malformed pixel row: {}", e);
                    report.rejected += 1;
                }
            }
        }

        log::info!(
            "Loaded {} pixels ({} rows rejected)",
            self.pixels.len(),
            report.rejected
        );
        report
    }

    /// Restore the persisted cooldown; returns the stored session state
    pub fn restore_session(&mut self) -> Option<SessionState> {
        match self.backend.load_session() {
            Ok(Some(state)) => {
                self.cooldown_deadline = self.cooldown_deadline.max(state.cooldown_deadline);
                Some(state)
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Could not read session state: {}", e);
                None
            }
        }
    }

    pub fn save_session(&mut self, show_grid: bool) {
        let state = SessionState {
            cooldown_deadline: self.cooldown_deadline,
            show_grid,
        };
        if let Err(e) = self.backend.save_session(&state) {
            log::warn!("Could not save session state: {}", e);
        }
    }
}

/// Countdown shown while the cooldown is active, `00:00` otherwise
pub fn format_countdown(remaining_ms: u64) -> String {
    if remaining_ms == 0 {
        return "00:00".to_string();
    }
    let secs = remaining_ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::notify::NotificationCenter;
    use serde_json::json;

    const RED: Color = Color::rgb(0xE5, 0x00, 0x00);
    const CYAN: Color = Color::rgb(0x00, 0xD3, 0xDD);

    fn store_with(config: &Config) -> (PixelStore, MemoryBackend, NotificationCenter) {
        let backend = MemoryBackend::new();
        let center = NotificationCenter::default();
        let store = PixelStore::new(config, Box::new(backend.clone()), Box::new(center.clone()));
        (store, backend, center)
    }

    #[test]
    fn cooldown_scenario() {
        let (mut store, _, center) = store_with(&Config::default());
        let cell = CellCoord::new(5, 5);

        let placed = store.set_pixel(cell, RED, 1000).unwrap();
        assert_eq!(placed.color, RED);
        assert_eq!(placed.last_updated, 1000);
        assert_eq!(store.cooldown_deadline(), 2000);

        let err = store.set_pixel(cell, CYAN, 1500).unwrap_err();
        assert_eq!(err, PlaceError::CooldownActive { remaining_ms: 500 });
        assert_eq!(store.get(cell).unwrap().color, RED);
        let note = center.latest().unwrap();
        assert_eq!(note.message, "Cooldown active");
        assert_eq!(note.timestamp, 1500);

        store.set_pixel(cell, CYAN, 2000).unwrap();
        assert_eq!(store.get(cell).unwrap().color, CYAN);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn out_of_bounds_is_silent() {
        let (mut store, _, center) = store_with(&Config::default());
        assert_eq!(
            store.set_pixel(CellCoord::new(100, 0), RED, 0),
            Err(PlaceError::OutOfBounds(CellCoord::new(100, 0)))
        );
        assert!(store.is_empty());
        assert!(center.is_empty());
        assert_eq!(store.cooldown_deadline(), 0);
    }

    #[test]
    fn rapid_writes_coalesce_into_one_upsert() {
        let config = Config { cooldown_ms: 0, ..Config::default() };
        let (mut store, backend, _) = store_with(&config);
        let cell = CellCoord::new(1, 2);

        store.set_pixel(cell, RED, 0).unwrap();
        store.set_pixel(cell, CYAN, 100).unwrap();
        store.set_pixel(cell, Color::BLACK, 200).unwrap();
        assert_eq!(store.pending_writes(), 1);

        assert_eq!(store.flush_due(1100), FlushReport::default());
        assert!(backend.upserts().is_empty());

        assert_eq!(store.flush_due(1200).written, 1);
        let upserts = backend.upserts();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].color, "#000000");
        assert_eq!(upserts[0].last_updated, "1970-01-01T00:00:00.200Z");
        assert!(!store.is_pending(cell));
    }

    #[test]
    fn different_cells_flush_independently() {
        let config = Config { cooldown_ms: 0, ..Config::default() };
        let (mut store, backend, _) = store_with(&config);
        store.set_pixel(CellCoord::new(0, 0), RED, 0).unwrap();
        store.set_pixel(CellCoord::new(9, 9), CYAN, 500).unwrap();

        assert_eq!(store.flush_due(1000).written, 1);
        assert!(store.is_pending(CellCoord::new(9, 9)));
        assert_eq!(store.flush_due(1500).written, 1);
        assert_eq!(backend.upserts().len(), 2);
    }

    #[test]
    fn failed_write_keeps_local_state() {
        let (mut store, backend, center) = store_with(&Config::default());
        let cell = CellCoord::new(3, 3);
        store.set_pixel(cell, RED, 0).unwrap();

        backend.set_failing(Some("network down"));
        let report = store.flush_due(1000);
        assert_eq!(report, FlushReport { written: 0, failed: 1 });
        assert_eq!(store.get(cell).unwrap().color, RED);
        assert!(!store.is_pending(cell));

        let note = center.latest().unwrap();
        assert_eq!(note.message, "Failed to save pixel");
        assert!(note.details.unwrap().contains("network down"));
    }

    #[test]
    fn owner_comes_from_session() {
        let config = Config { owner_id: Some("u-42".into()), ..Config::default() };
        let (mut store, backend, _) = store_with(&config);
        assert_eq!(store.set_pixel(CellCoord::new(0, 0), RED, 0).unwrap().owner_id, "u-42");

        store.set_session(Session::anonymous());
        store.set_pixel(CellCoord::new(1, 0), RED, 5000).unwrap();
        store.flush_all(5000);
        let owners: Vec<String> = backend.upserts().into_iter().map(|r| r.user_id).collect();
        assert_eq!(owners, vec!["u-42".to_string(), "anonymous".to_string()]);
    }

    #[test]
    fn load_drops_malformed_rows() {
        let (mut store, backend, _) = store_with(&Config::default());
        backend.insert_raw(json!({
            "x": 5, "y": 5, "color": "#E50000",
            "last_updated": "2024-05-01T10:00:00.000Z", "user_id": "a",
        }));
        backend.insert_raw(json!({ "x": 6, "y": 5, "colour": "#E50000" }));
        backend.insert_raw(json!("not an object"));
        backend.insert_raw(json!({
            "x": 150, "y": -3, "color": "#00d3dd",
            "last_updated": "2024-05-01T10:00:00Z", "user_id": "b", "id": 17,
        }));

        let report = store.load_initial(0);
        assert_eq!(report, LoadReport { loaded: 2, rejected: 2, failed: false });
        assert_eq!(store.get(CellCoord::new(5, 5)).unwrap().owner_id, "a");
        // Remote rows outside the placement bounds are kept for display
        assert!(store.get(CellCoord::new(150, -3)).is_some());
    }

    #[test]
    fn load_failure_leaves_empty_map() {
        let (mut store, backend, center) = store_with(&Config::default());
        backend.set_failing(Some("503"));
        let report = store.load_initial(0);
        assert!(report.failed);
        assert!(store.is_empty());
        assert_eq!(center.latest().unwrap().message, "Failed to load pixels");
    }

    #[test]
    fn session_round_trip_restores_cooldown() {
        let (mut store, backend, _) = store_with(&Config::default());
        store.set_pixel(CellCoord::new(0, 0), RED, 10_000).unwrap();
        store.save_session(false);

        let mut restored = PixelStore::new(
            &Config::default(),
            Box::new(backend.clone()),
            Box::new(NotificationCenter::default()),
        );
        let state = restored.restore_session().unwrap();
        assert!(!state.show_grid);
        assert_eq!(restored.cooldown_deadline(), 11_000);
        assert!(restored.set_pixel(CellCoord::new(1, 1), RED, 10_500).is_err());
    }

    #[test]
    fn countdown_format() {
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(999), "0:00");
        assert_eq!(format_countdown(61_000), "1:01");
    }
}
