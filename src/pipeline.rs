//! Per-frame compositing of visible chunks plus the pulsing preview cell
//!
//! Every frame repaints the whole visible region from the chunk cache. Cost
//! is bounded by the number of visible chunks; clean chunks are a blit.

use crate::chunk::{ChunkCache, ChunkCoord};
use crate::color::Color;
use crate::pixel::CellCoord;
use crate::raster::Raster;
use crate::viewport::Viewport;

/// Page colour behind transparent chunk texels
pub const BACKGROUND: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];

/// Cursor-following indicator of the next placement; never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewPixel {
    pub cell: CellCoord,
    pub color: Color,
}

/// Pulsing opacity in `[0.5, 1.0]`
pub fn preview_alpha(now_ms: u64) -> f32 {
    let phase = ((now_ms as f64 / 200.0).sin() + 1.0) / 2.0;
    (0.5 + 0.5 * phase) as f32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub chunks_drawn: usize,
    pub chunks_rebuilt: usize,
    pub preview_drawn: bool,
}

/// Redraw `frame` (sized to the canvas) for the current viewport
pub fn compose_frame(
    frame: &mut Raster,
    viewport: &Viewport,
    chunks: &mut ChunkCache,
    show_grid: bool,
    preview: Option<&PreviewPixel>,
    now_ms: u64,
) -> FrameStats {
    frame.fill(BACKGROUND);

    let range = viewport.visible_chunks(frame.width(), frame.height(), chunks.chunk_size);
    let coords: Vec<ChunkCoord> = range.iter().collect();

    let mut stats = FrameStats {
        chunks_rebuilt: chunks.rebuild_stale(&coords, show_grid),
        ..FrameStats::default()
    };

    let zoom = viewport.zoom();
    let span = chunks.span() as f64;
    for coord in coords {
        let x = viewport.pan.x + coord.x as f64 * span * zoom;
        let y = viewport.pan.y + coord.y as f64 * span * zoom;
        if let Some(raster) = chunks.raster(coord) {
            frame.blit_scaled(raster, x, y, zoom);
            stats.chunks_drawn += 1;
        }
    }

    if let Some(preview) = preview {
        let top_left = viewport.world_to_screen(preview.cell);
        let size = viewport.pixel_size() * zoom;
        let x0 = top_left.x.floor();
        let y0 = top_left.y.floor();
        let x1 = (top_left.x + size).ceil();
        let y1 = (top_left.y + size).ceil();
        frame.blend_rect(
            x0 as i64,
            y0 as i64,
            (x1 - x0).max(1.0) as u32,
            (y1 - y0).max(1.0) as u32,
            preview.color,
            preview_alpha(now_ms),
        );
        stats.preview_drawn = true;
    }

    stats
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Running,
    Cancelled,
}

/// Cancellable once-per-refresh repaint task bound to its owner's lifetime.
/// The host asks [`RepaintLoop::begin_frame`] before painting and only
/// schedules the next refresh while it returns true.
#[derive(Debug, Clone)]
pub struct RepaintLoop {
    state: LoopState,
    frames: u64,
    last_frame_at: Option<u64>,
}

impl Default for RepaintLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RepaintLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Running,
            frames: 0,
            last_frame_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Stop scheduling frames; idempotent
    pub fn cancel(&mut self) {
        if self.state == LoopState::Running {
            log::debug!("Repaint loop cancelled after {} frames", self.frames);
        }
        self.state = LoopState::Cancelled;
    }

    /// Returns false once cancelled
    pub fn begin_frame(&mut self, now_ms: u64) -> bool {
        if !self.is_running() {
            return false;
        }
        self.frames += 1;
        self.last_frame_at = Some(now_ms);
        true
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_frame_at(&self) -> Option<u64> {
        self.last_frame_at
    }
}
