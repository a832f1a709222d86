//! The long-lived canvas engine
//!
//! One `CanvasEngine` owns every piece of mutable state: viewport, input
//! state machine, pixel store, chunk arena, preview and repaint loop. Hosts
//! (the winit app on desktop, the wasm shell in the browser) feed it input
//! events, call [`CanvasEngine::tick`] and [`CanvasEngine::frame`] once per
//! display refresh, and call [`CanvasEngine::shutdown`] on teardown.

use crate::backend::PixelBackend;
use crate::chunk::{ChunkCache, ChunkCoord};
use crate::color::{Color, PALETTE};
use crate::input::{InputAction, InputController, InputEvent};
use crate::notify::{NotificationCenter, Presence, Session};
use crate::pipeline::{compose_frame, FrameStats, PreviewPixel, RepaintLoop};
use crate::pixel::CellCoord;
use crate::raster::Raster;
use crate::store::{format_countdown, FlushReport, LoadReport, PlaceError, PixelStore};
use crate::viewport::{Point, Viewport};
use crate::Config;

pub struct CanvasEngine {
    config: Config,
    viewport: Viewport,
    input: InputController,
    store: PixelStore,
    chunks: ChunkCache,
    notifications: NotificationCenter,
    presence: Presence,
    selected_color: Color,
    preview: Option<PreviewPixel>,
    hovered: Option<CellCoord>,
    show_grid: bool,
    repaint: RepaintLoop,
    frame: Raster,
    last_stats: FrameStats,
    shut_down: bool,
}

impl CanvasEngine {
    pub fn new(config: Config, backend: Box<dyn PixelBackend>) -> Self {
        let notifications = NotificationCenter::default();
        let store = PixelStore::new(&config, backend, Box::new(notifications.clone()));
        let viewport = Viewport::new(config.pixel_size, config.min_zoom, config.max_zoom);
        let chunks = ChunkCache::new(config.chunk_size, config.pixel_size);

        log::info!(
            "Canvas engine: {}x{} cells, cooldown {} ms, debounce {} ms",
            config.canvas_size,
            config.canvas_size,
            config.cooldown_ms,
            config.debounce_ms
        );

        Self {
            show_grid: config.show_grid,
            frame: Raster::new(config.width, config.height),
            config,
            viewport,
            input: InputController::new(),
            store,
            chunks,
            notifications,
            presence: Presence::default(),
            selected_color: Color::BLACK,
            preview: None,
            hovered: None,
            repaint: RepaintLoop::new(),
            last_stats: FrameStats::default(),
            shut_down: false,
        }
    }

    /// Restore session state, then bulk-load every pixel into the chunk arena.
    /// Runs before the first meaningful paint.
    pub fn load_initial(&mut self, now: u64) -> LoadReport {
        if let Some(state) = self.store.restore_session() {
            self.show_grid = state.show_grid;
        }

        let report = self.store.load_initial(now);
        for pixel in self.store.pixels() {
            self.chunks.apply_pixel(pixel.coord, pixel.color);
        }
        log::info!("Initial load populated {} chunks", self.chunks.len());
        report
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Back to zoom 1.0 with the canvas origin at the top-left corner
    pub fn reset_viewport(&mut self) {
        self.viewport.pan = Point::default();
        self.viewport.set_zoom(1.0);
        self.refresh_hover();
    }

    pub fn store(&self) -> &PixelStore {
        &self.store
    }

    pub fn chunks(&self) -> &ChunkCache {
        &self.chunks
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    pub fn presence_mut(&mut self) -> &mut Presence {
        &mut self.presence
    }

    pub fn set_session(&mut self, session: Session) {
        self.store.set_session(session);
    }

    pub fn selected_color(&self) -> Color {
        self.selected_color
    }

    pub fn set_selected_color(&mut self, color: Color) {
        self.selected_color = color;
        if let Some(preview) = &mut self.preview {
            preview.color = color;
        }
    }

    /// Step through the palette; an off-palette colour (the black default, a
    /// picked colour) restarts at the first entry
    pub fn cycle_color(&mut self, step: i32) -> Color {
        let len = PALETTE.len() as i32;
        let next = match PALETTE.iter().position(|&c| c == self.selected_color) {
            Some(i) => (i as i32 + step).rem_euclid(len),
            None => 0,
        };
        self.set_selected_color(PALETTE[next as usize]);
        self.selected_color
    }

    pub fn preview(&self) -> Option<&PreviewPixel> {
        self.preview.as_ref()
    }

    /// Cell under the pointer, in or out of bounds
    pub fn hovered_cell(&self) -> Option<CellCoord> {
        self.hovered
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn toggle_grid(&mut self) {
        self.show_grid = !self.show_grid;
        log::debug!("Grid {}", if self.show_grid { "on" } else { "off" });
    }

    pub fn cooldown_remaining(&self, now: u64) -> u64 {
        self.store.cooldown_remaining(now)
    }

    pub fn last_frame_stats(&self) -> FrameStats {
        self.last_stats
    }

    pub fn is_panning(&self) -> bool {
        self.input.is_panning()
    }

    pub fn is_running(&self) -> bool {
        self.repaint.is_running()
    }

    /// Feed one input event; returns the action it produced, if any
    pub fn handle_input(&mut self, event: InputEvent, now: u64) -> Option<InputAction> {
        let action = self.input.handle(event, &mut self.viewport)?;

        match action {
            InputAction::Hover(cell) => {
                self.hovered = Some(cell);
                self.update_preview(cell);
            }
            InputAction::ClearPreview => {
                self.preview = None;
                self.hovered = self.input.hovered_cell(&self.viewport);
            }
            InputAction::Place(cell) => {
                self.hovered = Some(cell);
                // Out-of-bounds and cooldown rejections leave the engine untouched
                let _ = self.place(cell, now);
            }
            InputAction::ToggleGrid => self.toggle_grid(),
            InputAction::PickColor(cell) => {
                self.pick_color(cell);
            }
            InputAction::ViewportChanged => self.refresh_hover(),
        }

        Some(action)
    }

    /// Place the selected colour at `cell`, marking its chunk dirty
    pub fn place(&mut self, cell: CellCoord, now: u64) -> Result<ChunkCoord, PlaceError> {
        let color = self.selected_color;
        self.store.set_pixel(cell, color, now)?;
        self.preview = None;
        Ok(self.chunks.apply_pixel(cell, color))
    }

    /// Take the colour of an existing pixel; no cooldown cost
    pub fn pick_color(&mut self, cell: CellCoord) -> Option<Color> {
        let color = self.store.get(cell)?.color;
        self.set_selected_color(color);
        log::debug!("Picked {} from ({}, {})", color, cell.x, cell.y);
        Some(color)
    }

    fn update_preview(&mut self, cell: CellCoord) {
        self.preview = if !self.input.is_panning() && cell.in_bounds(self.config.canvas_size) {
            Some(PreviewPixel {
                cell,
                color: self.selected_color,
            })
        } else {
            None
        };
    }

    fn refresh_hover(&mut self) {
        self.hovered = self.input.hovered_cell(&self.viewport);
        match self.hovered {
            Some(cell) if self.preview.is_some() => self.update_preview(cell),
            _ => {}
        }
    }

    /// Periodic housekeeping: due write-backs and expired notifications
    pub fn tick(&mut self, now: u64) -> FlushReport {
        let report = self.store.flush_due(now);
        self.notifications.prune(now);
        report
    }

    /// Compose the next frame for a `width` x `height` surface.
    /// Returns `None` once the repaint loop has been cancelled.
    pub fn frame(&mut self, now: u64, width: u32, height: u32) -> Option<&Raster> {
        if !self.repaint.begin_frame(now) {
            return None;
        }
        if self.frame.width() != width || self.frame.height() != height {
            self.frame.resize(width, height);
        }
        self.last_stats = compose_frame(
            &mut self.frame,
            &self.viewport,
            &mut self.chunks,
            self.show_grid,
            self.preview.as_ref(),
            now,
        );
        Some(&self.frame)
    }

    /// One-line summary of coordinates, cooldown, presence and the newest notice
    pub fn status_line(&self, now: u64) -> String {
        let coords = match self.hovered {
            Some(cell) => format!("({}, {})", cell.x, cell.y),
            None => "(-, -)".to_string(),
        };
        let mut line = format!(
            "{} | {} | {} online",
            coords,
            format_countdown(self.cooldown_remaining(now)),
            self.presence.count()
        );
        if let Some(note) = self.notifications.latest() {
            line.push_str(" | ");
            line.push_str(&note.message);
            if let Some(details) = &note.details {
                line.push_str(": ");
                line.push_str(details);
            }
        }
        line
    }

    /// Stop repainting, flush every pending write and persist the session.
    /// Safe to call more than once.
    pub fn shutdown(&mut self, now: u64) -> FlushReport {
        if self.shut_down {
            return FlushReport::default();
        }
        self.shut_down = true;
        self.repaint.cancel();

        let report = self.store.flush_all(now);
        self.store.save_session(self.show_grid);
        log::info!(
            "Engine shut down: {} writes flushed, {} failed (chunk cache hits={}, misses={})",
            report.written,
            report.failed,
            self.chunks.hits,
            self.chunks.misses
        );
        report
    }
}

impl Drop for CanvasEngine {
    fn drop(&mut self) {
        self.shutdown(crate::now_millis());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::input::{KeyCommand, PointerButton};
    use serde_json::json;

    const RED: Color = Color::rgb(0xE5, 0x00, 0x00);
    const CYAN: Color = Color::rgb(0x00, 0xD3, 0xDD);

    fn engine() -> (CanvasEngine, MemoryBackend) {
        let backend = MemoryBackend::new();
        let config = Config {
            width: 400,
            height: 300,
            ..Config::default()
        };
        (CanvasEngine::new(config, Box::new(backend.clone())), backend)
    }

    fn is_dirty(engine: &CanvasEngine, coord: ChunkCoord) -> bool {
        engine.chunks().get(coord).map_or(false, |c| c.is_dirty())
    }

    #[test]
    fn placement_scenario_marks_chunk_dirty_each_time() {
        let (mut engine, _) = engine();
        let origin = ChunkCoord::new(0, 0);
        let cell = CellCoord::new(5, 5);

        engine.set_selected_color(RED);
        assert_eq!(engine.place(cell, 1000), Ok(origin));
        assert!(is_dirty(&engine, origin));
        assert_eq!(engine.store().get(cell).unwrap().last_updated, 1000);
        assert_eq!(engine.store().cooldown_deadline(), 2000);

        engine.frame(1000, 400, 300).unwrap();
        assert!(!is_dirty(&engine, origin));

        engine.set_selected_color(CYAN);
        assert!(engine.place(cell, 1500).is_err());
        assert!(!is_dirty(&engine, origin));
        assert_eq!(engine.store().get(cell).unwrap().color, RED);

        assert_eq!(engine.place(cell, 2000), Ok(origin));
        assert!(is_dirty(&engine, origin));
        assert_eq!(engine.store().get(cell).unwrap().color, CYAN);
    }

    #[test]
    fn default_color_placement_is_visible() {
        let (mut engine, _) = engine();
        assert_eq!(engine.selected_color(), Color::BLACK);
        let background = engine.frame(0, 400, 300).unwrap().pixel(55, 55);
        assert_eq!(background, Some(crate::pipeline::BACKGROUND));

        engine.place(CellCoord::new(5, 5), 0).unwrap();
        let placed = engine.frame(16, 400, 300).unwrap().pixel(55, 55);
        assert_eq!(placed, Some([0, 0, 0, 255]));
    }

    #[test]
    fn hover_previews_and_click_places() {
        let (mut engine, _) = engine();
        let at = Point::new(55.0, 25.0);

        engine.handle_input(InputEvent::PointerMove { position: at }, 0);
        let preview = engine.preview().copied().unwrap();
        assert_eq!(preview.cell, CellCoord::new(5, 2));
        assert_eq!(preview.color, engine.selected_color());

        engine.handle_input(InputEvent::PointerDown { button: PointerButton::Primary, position: at }, 0);
        engine.handle_input(InputEvent::PointerUp { button: PointerButton::Primary, position: at }, 0);
        assert!(engine.store().get(CellCoord::new(5, 2)).is_some());
        assert!(engine.preview().is_none());
    }

    #[test]
    fn out_of_bounds_hover_and_click_are_ignored() {
        let (mut engine, _) = engine();
        let outside = Point::new(-5.0, 15.0);

        engine.handle_input(InputEvent::PointerMove { position: outside }, 0);
        assert!(engine.preview().is_none());
        assert_eq!(engine.hovered_cell(), Some(CellCoord::new(-1, 1)));

        engine.handle_input(InputEvent::PointerUp { button: PointerButton::Primary, position: outside }, 0);
        assert!(engine.store().is_empty());
        assert!(engine.notifications().is_empty());
        assert_eq!(engine.cooldown_remaining(0), 0);
    }

    #[test]
    fn panning_clears_preview_and_blocks_placement() {
        let (mut engine, _) = engine();
        engine.handle_input(InputEvent::PointerMove { position: Point::new(15.0, 15.0) }, 0);
        assert!(engine.preview().is_some());

        engine.handle_input(
            InputEvent::PointerDown { button: PointerButton::Secondary, position: Point::new(15.0, 15.0) },
            0,
        );
        assert!(engine.preview().is_none());

        engine.handle_input(InputEvent::PointerMove { position: Point::new(45.0, 15.0) }, 0);
        assert!(engine.preview().is_none());
        assert_eq!(engine.viewport().pan, Point::new(30.0, 0.0));

        engine.handle_input(
            InputEvent::PointerUp { button: PointerButton::Primary, position: Point::new(45.0, 15.0) },
            0,
        );
        assert!(engine.store().is_empty());
    }

    #[test]
    fn pick_color_takes_existing_pixel_without_cooldown() {
        let (mut engine, _) = engine();
        engine.set_selected_color(CYAN);
        engine.place(CellCoord::new(2, 2), 0).unwrap();
        engine.set_selected_color(RED);

        engine.handle_input(InputEvent::PointerMove { position: Point::new(25.0, 25.0) }, 10);
        engine.handle_input(InputEvent::Key(KeyCommand::PickColor), 10);
        assert_eq!(engine.selected_color(), CYAN);
        assert_eq!(engine.preview().unwrap().color, CYAN);
        assert_eq!(engine.store().cooldown_deadline(), 1000);

        // empty cell leaves the selection alone
        assert_eq!(engine.pick_color(CellCoord::new(9, 9)), None);
        assert_eq!(engine.selected_color(), CYAN);
    }

    #[test]
    fn palette_cycling_wraps() {
        let (mut engine, _) = engine();
        assert_eq!(engine.cycle_color(1), PALETTE[0]);
        assert_eq!(engine.cycle_color(-1), PALETTE[PALETTE.len() - 1]);
        assert_eq!(engine.cycle_color(1), PALETTE[0]);
        engine.set_selected_color(Color::rgb(1, 2, 3));
        assert_eq!(engine.cycle_color(5), PALETTE[0]);
    }

    #[test]
    fn grid_toggle_rebuilds_visible_chunks() {
        let (mut engine, _) = engine();
        assert!(engine.show_grid());
        engine.frame(0, 400, 300).unwrap();
        let rebuilds = engine.chunks().rebuilds;

        engine.handle_input(InputEvent::Key(KeyCommand::ToggleGrid), 0);
        assert!(!engine.show_grid());
        engine.frame(16, 400, 300).unwrap();
        assert_eq!(engine.last_frame_stats().chunks_rebuilt as u64, engine.chunks().rebuilds - rebuilds);
        assert!(engine.last_frame_stats().chunks_rebuilt > 0);
    }

    #[test]
    fn load_initial_populates_chunks_and_session() {
        let backend = MemoryBackend::new();
        backend.insert_raw(json!({
            "x": 150, "y": 150, "color": "#E50000",
            "last_updated": "2024-05-01T10:00:00.000Z", "user_id": "a",
        }));
        backend.insert_raw(json!({ "x": "nope" }));
        let mut seed = backend.clone();
        seed.save_session(&crate::backend::SessionState { cooldown_deadline: 0, show_grid: false })
            .unwrap();

        let mut engine = CanvasEngine::new(Config::default(), Box::new(backend));
        let report = engine.load_initial(0);
        assert_eq!(report.loaded, 1);
        assert_eq!(report.rejected, 1);
        assert!(!engine.show_grid());
        assert!(is_dirty(&engine, ChunkCoord::new(1, 1)));
    }

    #[test]
    fn tick_flushes_after_debounce() {
        let (mut engine, backend) = engine();
        engine.place(CellCoord::new(1, 1), 0).unwrap();
        assert_eq!(engine.tick(999).written, 0);
        assert_eq!(engine.tick(1000).written, 1);
        assert_eq!(backend.upserts().len(), 1);
    }

    #[test]
    fn tick_flushes_without_any_frame_painted() {
        let (mut engine, backend) = engine();
        engine.place(CellCoord::new(2, 3), 100).unwrap();
        engine.place(CellCoord::new(7, 3), 1100).unwrap();

        assert_eq!(engine.tick(1100).written, 1);
        assert_eq!(engine.tick(2100).written, 1);
        assert_eq!(engine.store().pending_writes(), 0);
        assert_eq!(backend.upserts().len(), 2);
        assert_eq!(engine.last_frame_stats(), FrameStats::default());
    }

    #[test]
    fn tick_expires_notifications_on_the_callers_clock() {
        let (mut engine, _) = engine();
        engine.place(CellCoord::new(1, 1), 1000).unwrap();
        assert!(engine.place(CellCoord::new(1, 1), 1200).is_err());
        assert_eq!(engine.notifications().len(), 1);

        let lifetime = crate::constants::NOTIFICATION_LIFETIME_MS;
        engine.tick(1200 + lifetime - 1);
        assert_eq!(engine.notifications().len(), 1);
        engine.tick(1200 + lifetime);
        assert!(engine.notifications().is_empty());
    }

    #[test]
    fn shutdown_flushes_and_stops_repaint() {
        let (mut engine, backend) = engine();
        engine.place(CellCoord::new(1, 1), 0).unwrap();
        engine.toggle_grid();

        let report = engine.shutdown(20);
        assert_eq!(report.written, 1);
        assert_eq!(engine.store().pending_writes(), 0);
        assert!(engine.frame(10, 400, 300).is_none());
        assert!(!engine.is_running());
        assert_eq!(backend.session().map(|s| s.show_grid), Some(false));

        // second call is a no-op
        assert_eq!(engine.shutdown(30), FlushReport::default());
        assert_eq!(backend.upserts().len(), 1);
    }

    #[test]
    fn drop_flushes_pending_writes() {
        let (mut engine, backend) = engine();
        engine.place(CellCoord::new(4, 4), 0).unwrap();
        drop(engine);
        assert_eq!(backend.upserts().len(), 1);
    }

    #[test]
    fn status_line_reports_state() {
        let (mut engine, _) = engine();
        engine.presence_mut().sync(3);
        engine.handle_input(InputEvent::PointerMove { position: Point::new(15.0, 5.0) }, 0);
        assert_eq!(engine.status_line(0), "(1, 0) | 00:00 | 3 online");

        engine.place(CellCoord::new(1, 0), 0).unwrap();
        let _ = engine.place(CellCoord::new(1, 0), 10);
        let line = engine.status_line(10);
        assert!(line.starts_with("(1, 0) | 0:00 | 3 online | Cooldown active"), "{}", line);
    }

    #[test]
    fn frame_follows_surface_size() {
        let (mut engine, _) = engine();
        let frame = engine.frame(0, 120, 80).unwrap();
        assert_eq!((frame.width(), frame.height()), (120, 80));
    }
}
