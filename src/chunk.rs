//! Chunk arena: the world split into fixed-size tiles, each with a cached raster
//!
//! Placing a pixel only dirties the chunk that owns it. A chunk's raster is
//! rebuilt when it is next drawn, so clean chunks cost a blit per frame.

use std::collections::{HashMap, HashSet};

use crate::color::Color;
use crate::pixel::CellCoord;
use crate::raster::Raster;

/// Chunk key: the chunk at (x, y) covers cells `[x*S, (x+1)*S)` on both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk owning a cell (floor division, so negative cells work too)
    #[inline]
    pub fn containing(cell: CellCoord, chunk_size: u32) -> Self {
        let s = chunk_size as i32;
        Self::new(cell.x.div_euclid(s), cell.y.div_euclid(s))
    }
}

/// A fixed-size tile of the world with a lazily rebuilt raster
pub struct Chunk {
    /// Colours keyed by tile-local cell position
    pixels: HashMap<(u32, u32), Color>,
    raster: Raster,
    dirty: bool,
    /// Grid setting the cached raster was built with
    built_with_grid: bool,
}

impl Chunk {
    fn new(raster_size: u32) -> Self {
        Self {
            pixels: HashMap::new(),
            raster: Raster::new(raster_size, raster_size),
            dirty: true,
            built_with_grid: false,
        }
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn color_at(&self, local_x: u32, local_y: u32) -> Option<Color> {
        self.pixels.get(&(local_x, local_y)).copied()
    }

    fn needs_rebuild(&self, show_grid: bool) -> bool {
        self.dirty || self.built_with_grid != show_grid
    }

    /// Redraw from scratch; cost is proportional to the pixels in this chunk
    fn rebuild(&mut self, pixel_size: u32, show_grid: bool) {
        self.raster.clear();

        for (&(lx, ly), &color) in &self.pixels {
            self.raster.fill_rect(
                (lx * pixel_size) as i64,
                (ly * pixel_size) as i64,
                pixel_size,
                pixel_size,
                color,
            );
        }

        if show_grid {
            self.raster.draw_grid(pixel_size, Color::GRID);
        }

        self.dirty = false;
        self.built_with_grid = show_grid;
    }
}

/// Arena of chunks keyed by chunk coordinates, owned by one engine.
/// Chunks live for the session; there is no eviction.
pub struct ChunkCache {
    /// Cells per chunk edge
    pub chunk_size: u32,

    /// Raster texels per cell
    pub pixel_size: u32,

    chunks: HashMap<ChunkCoord, Chunk>,

    /// Statistics
    pub hits: u64,
    pub misses: u64,
    pub rebuilds: u64,
}

impl ChunkCache {
    pub fn new(chunk_size: u32, pixel_size: u32) -> Self {
        log::info!(
            "Initializing ChunkCache with chunk_size={} cells, raster {}x{}",
            chunk_size,
            chunk_size * pixel_size,
            chunk_size * pixel_size
        );
        ChunkCache {
            chunk_size,
            pixel_size,
            chunks: HashMap::new(),
            hits: 0,
            misses: 0,
            rebuilds: 0,
        }
    }

    #[inline]
    fn raster_size(&self) -> u32 {
        self.chunk_size * self.pixel_size
    }

    /// World-unit span of one chunk edge
    #[inline]
    pub fn span(&self) -> u32 {
        self.raster_size()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Get a chunk, creating an empty (dirty) one if absent
    pub fn get_or_create(&mut self, coord: ChunkCoord) -> &mut Chunk {
        let raster_size = self.raster_size();
        self.chunks.entry(coord).or_insert_with(|| {
            log::trace!("Chunk CREATE: ({}, {})", coord.x, coord.y);
            Chunk::new(raster_size)
        })
    }

    /// Record a pixel in its owning chunk and mark that chunk dirty
    pub fn apply_pixel(&mut self, cell: CellCoord, color: Color) -> ChunkCoord {
        let coord = ChunkCoord::containing(cell, self.chunk_size);
        let s = self.chunk_size as i32;
        let local = (cell.x.rem_euclid(s) as u32, cell.y.rem_euclid(s) as u32);

        let chunk = self.get_or_create(coord);
        chunk.pixels.insert(local, color);
        chunk.dirty = true;
        coord
    }

    /// Raster for a chunk, rebuilt first if it is dirty or the grid setting changed
    pub fn render(&mut self, coord: ChunkCoord, show_grid: bool) -> &Raster {
        let pixel_size = self.pixel_size;
        let raster_size = self.raster_size();
        let chunk = self
            .chunks
            .entry(coord)
            .or_insert_with(|| Chunk::new(raster_size));

        if chunk.needs_rebuild(show_grid) {
            self.misses += 1;
            self.rebuilds += 1;
            log::debug!(
                "Chunk MISS: ({}, {}) rebuilding {} pixels (hits={}, misses={})",
                coord.x,
                coord.y,
                chunk.pixels.len(),
                self.hits,
                self.misses
            );
            chunk.rebuild(pixel_size, show_grid);
        } else {
            self.hits += 1;
        }

        &chunk.raster
    }

    /// Cached raster as last built, without rebuilding or touching the stats
    pub fn raster(&self, coord: ChunkCoord) -> Option<&Raster> {
        self.chunks.get(&coord).map(|chunk| &chunk.raster)
    }

    /// Rebuild every stale chunk among `coords`, in parallel where threads exist.
    /// Clean chunks count as hits, rebuilt ones as misses.
    /// Returns how many chunks were rebuilt.
    pub fn rebuild_stale(&mut self, coords: &[ChunkCoord], show_grid: bool) -> usize {
        let raster_size = self.raster_size();
        for &coord in coords {
            self.chunks
                .entry(coord)
                .or_insert_with(|| Chunk::new(raster_size));
        }

        let wanted: HashSet<ChunkCoord> = coords.iter().copied().collect();
        let stale: Vec<&mut Chunk> = self
            .chunks
            .iter_mut()
            .filter(|(coord, chunk)| wanted.contains(coord) && chunk.needs_rebuild(show_grid))
            .map(|(_, chunk)| chunk)
            .collect();

        let count = stale.len();
        self.hits += (wanted.len() - count) as u64;
        if count == 0 {
            return 0;
        }

        let pixel_size = self.pixel_size;

        #[cfg(not(target_arch = "wasm32"))]
        {
            use rayon::prelude::*;
            stale
                .into_par_iter()
                .for_each(|chunk| chunk.rebuild(pixel_size, show_grid));
        }

        #[cfg(target_arch = "wasm32")]
        for chunk in stale {
            chunk.rebuild(pixel_size, show_grid);
        }

        self.misses += count as u64;
        self.rebuilds += count as u64;
        log::debug!("Rebuilt {} stale chunks", count);
        count
    }
}
