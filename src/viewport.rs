//! Pan/zoom transform between screen space and world (cell grid) space
//!
//! Screen = pan + world_units * zoom, where one cell spans `pixel_size`
//! world units.

use crate::chunk::ChunkCoord;
use crate::pixel::CellCoord;

/// A 2D point or vector in screen or world units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Visible region in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Inclusive range of chunk coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub start_x: i32,
    pub start_y: i32,
    pub end_x: i32,
    pub end_y: i32,
}

impl ChunkRange {
    /// Chunk coordinates in row-major order
    pub fn iter(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        (self.start_y..=self.end_y)
            .flat_map(move |y| (self.start_x..=self.end_x).map(move |x| ChunkCoord::new(x, y)))
    }

    pub fn len(&self) -> usize {
        let w = (self.end_x - self.start_x + 1).max(0) as usize;
        let h = (self.end_y - self.start_y + 1).max(0) as usize;
        w * h
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        (self.start_x..=self.end_x).contains(&coord.x) && (self.start_y..=self.end_y).contains(&coord.y)
    }
}

/// Viewport state: translation in screen units and a bounded zoom factor
#[derive(Debug, Clone)]
pub struct Viewport {
    pub pan: Point,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    /// Screen units per cell at zoom 1.0
    pixel_size: f64,
}

impl Viewport {
    pub fn new(pixel_size: u32, min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            pan: Point::default(),
            zoom: 1.0f64.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
            pixel_size: pixel_size as f64,
        }
    }

    #[inline]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    #[inline]
    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    /// Set zoom directly; always clamped to the configured limits
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = self.clamp_zoom(zoom);
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.zoom;
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan.x += dx;
        self.pan.y += dy;
    }

    /// Apply a wheel step, keeping the world point under `cursor` fixed on screen.
    /// `delta_y` follows DOM wheel semantics: positive scrolls down (zooms out).
    pub fn zoom_at(&mut self, cursor: Point, delta_y: f64) {
        let old_zoom = self.zoom;
        let new_zoom = self.clamp_zoom(old_zoom * (1.0 + (-delta_y * 0.001)));
        let ratio = new_zoom / old_zoom;

        self.pan.x = cursor.x - (cursor.x - self.pan.x) * ratio;
        self.pan.y = cursor.y - (cursor.y - self.pan.y) * ratio;
        self.zoom = new_zoom;
    }

    /// Cell under a screen point; `screen` is relative to the canvas origin
    pub fn screen_to_world(&self, screen: Point) -> CellCoord {
        let wx = (screen.x / self.zoom - self.pan.x / self.zoom) / self.pixel_size;
        let wy = (screen.y / self.zoom - self.pan.y / self.zoom) / self.pixel_size;
        CellCoord::new(saturating_floor(wx), saturating_floor(wy))
    }

    /// Screen position of a cell's top-left corner
    pub fn world_to_screen(&self, cell: CellCoord) -> Point {
        Point::new(
            self.pan.x + cell.x as f64 * self.pixel_size * self.zoom,
            self.pan.y + cell.y as f64 * self.pixel_size * self.zoom,
        )
    }

    /// World-unit rectangle covered by a canvas of the given size
    pub fn visible_world_rect(&self, canvas_width: u32, canvas_height: u32) -> WorldRect {
        WorldRect {
            left: -self.pan.x / self.zoom,
            top: -self.pan.y / self.zoom,
            right: (canvas_width as f64 - self.pan.x) / self.zoom,
            bottom: (canvas_height as f64 - self.pan.y) / self.zoom,
        }
    }

    /// Chunks intersecting the visible rectangle (floor for the start, ceil for the end)
    pub fn visible_chunks(&self, canvas_width: u32, canvas_height: u32, chunk_size: u32) -> ChunkRange {
        let rect = self.visible_world_rect(canvas_width, canvas_height);
        let span = chunk_size as f64 * self.pixel_size;
        ChunkRange {
            start_x: saturating_floor(rect.left / span),
            start_y: saturating_floor(rect.top / span),
            end_x: saturating_ceil(rect.right / span),
            end_y: saturating_ceil(rect.bottom / span),
        }
    }
}

#[inline]
fn saturating_floor(v: f64) -> i32 {
    v.floor().clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

#[inline]
fn saturating_ceil(v: f64) -> i32 {
    v.ceil().clamp(i32::MIN as f64, i32::MAX as f64) as i32
}
