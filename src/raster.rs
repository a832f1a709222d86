//! CPU RGBA8 surfaces for chunk rasters and composed frames

use crate::color::Color;

/// Row-major RGBA8 image
#[derive(Clone)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl Raster {
    /// Fully transparent raster
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Reallocate when the size changes; contents are undefined afterwards
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            *self = Raster::new(width, height);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Fill with transparent black
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn fill(&mut self, rgba: [u8; 4]) {
        for texel in self.data.chunks_exact_mut(4) {
            texel.copy_from_slice(&rgba);
        }
    }

    /// Opaque rectangle fill, clipped to the raster
    pub fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Color) {
        let Some((x0, y0, x1, y1)) = self.clip(x, y, x + w as i64, y + h as i64) else {
            return;
        };
        let rgba = color.to_rgba(255);
        for row in y0..y1 {
            let start = self.index(x0, row);
            let end = self.index(x1, row);
            for texel in self.data[start..end].chunks_exact_mut(4) {
                texel.copy_from_slice(&rgba);
            }
        }
    }

    /// Source-over blend of a solid colour with coverage `alpha` in `[0, 1]`
    pub fn blend_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Color, alpha: f32) {
        let Some((x0, y0, x1, y1)) = self.clip(x, y, x + w as i64, y + h as i64) else {
            return;
        };
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        let src = color.to_rgba(a);
        for row in y0..y1 {
            let start = self.index(x0, row);
            let end = self.index(x1, row);
            for texel in self.data[start..end].chunks_exact_mut(4) {
                blend_over(texel, src);
            }
        }
    }

    /// Uniform grid: one half-coverage line every `spacing` texels on both axes
    pub fn draw_grid(&mut self, spacing: u32, color: Color) {
        if spacing == 0 {
            return;
        }
        let src = color.to_rgba(128);
        let (w, h) = (self.width, self.height);
        let step = spacing as usize;

        for y in (0..h).step_by(step) {
            let (start, end) = (self.index(0, y), self.index(w, y));
            for texel in self.data[start..end].chunks_exact_mut(4) {
                blend_over(texel, src);
            }
        }

        // Intersections were covered by the horizontal pass
        for y in (0..h).filter(|y| y % spacing != 0) {
            for x in (0..w).step_by(step) {
                let i = self.index(x, y);
                blend_over(&mut self.data[i..i + 4], src);
            }
        }
    }

    /// Nearest-neighbour blit of `src` scaled by `scale`, top-left at `(dst_x, dst_y)`.
    /// Transparent source texels leave the destination untouched.
    pub fn blit_scaled(&mut self, src: &Raster, dst_x: f64, dst_y: f64, scale: f64) {
        if scale <= 0.0 || src.width == 0 || src.height == 0 {
            return;
        }
        let right = dst_x + src.width as f64 * scale;
        let bottom = dst_y + src.height as f64 * scale;
        let Some((x0, y0, x1, y1)) = self.clip(
            dst_x.floor() as i64,
            dst_y.floor() as i64,
            right.ceil() as i64,
            bottom.ceil() as i64,
        ) else {
            return;
        };

        // Source column for every destination column in the span
        let columns: Vec<Option<u32>> = (x0..x1)
            .map(|dx| source_index(dx, dst_x, scale, src.width))
            .collect();

        for dy in y0..y1 {
            let Some(sy) = source_index(dy, dst_y, scale, src.height) else {
                continue;
            };
            for (dx, sx) in (x0..x1).zip(columns.iter()) {
                let Some(sx) = *sx else { continue };
                let si = src.index(sx, sy);
                let texel = [src.data[si], src.data[si + 1], src.data[si + 2], src.data[si + 3]];
                if texel[3] == 0 {
                    continue;
                }
                let di = self.index(dx, dy);
                blend_over(&mut self.data[di..di + 4], texel);
            }
        }
    }

    fn clip(&self, x0: i64, y0: i64, x1: i64, y1: i64) -> Option<(u32, u32, u32, u32)> {
        let cx0 = x0.clamp(0, self.width as i64) as u32;
        let cy0 = y0.clamp(0, self.height as i64) as u32;
        let cx1 = x1.clamp(0, self.width as i64) as u32;
        let cy1 = y1.clamp(0, self.height as i64) as u32;
        if cx0 >= cx1 || cy0 >= cy1 {
            None
        } else {
            Some((cx0, cy0, cx1, cy1))
        }
    }
}

/// Sample the texel centre of destination index `d`
#[inline]
fn source_index(d: u32, origin: f64, scale: f64, len: u32) -> Option<u32> {
    let s = ((d as f64 + 0.5 - origin) / scale).floor();
    if s < 0.0 || s >= len as f64 {
        None
    } else {
        Some(s as u32)
    }
}

#[inline]
fn blend_over(dst: &mut [u8], src: [u8; 4]) {
    let sa = src[3] as u32;
    if sa == 255 {
        dst.copy_from_slice(&src);
        return;
    }
    let da = dst[3] as u32;
    let inv = 255 - sa;
    for c in 0..3 {
        dst[c] = ((src[c] as u32 * sa + dst[c] as u32 * inv + 127) / 255) as u8;
    }
    dst[3] = (sa + (da * inv + 127) / 255).min(255) as u8;
}
