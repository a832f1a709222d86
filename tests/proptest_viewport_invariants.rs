//! Property-based invariants for the viewport transform and chunk addressing.
//!
//! 1. Zoom stays within [MIN_ZOOM, MAX_ZOOM] after any wheel sequence.
//! 2. Screen -> world -> screen lands within one cell of the start point.
//! 3. A wheel step that is not clamped keeps the point under the cursor fixed.
//! 4. Every cell lies inside the chunk it maps to.
//! 5. Visible chunks cover the whole visible world rectangle.

use pixgridlib::chunk::ChunkCoord;
use pixgridlib::constants::{MAX_ZOOM, MIN_ZOOM, PIXEL_SIZE};
use pixgridlib::pixel::CellCoord;
use pixgridlib::viewport::{Point, Viewport};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn viewport_strategy() -> impl Strategy<Value = Viewport> {
    (-5000.0f64..5000.0, -5000.0f64..5000.0, MIN_ZOOM..=MAX_ZOOM).prop_map(|(px, py, zoom)| {
        let mut vp = Viewport::new(PIXEL_SIZE, MIN_ZOOM, MAX_ZOOM);
        vp.pan = Point::new(px, py);
        vp.set_zoom(zoom);
        vp
    })
}

fn screen_point() -> impl Strategy<Value = Point> {
    (0.0f64..2000.0, 0.0f64..2000.0).prop_map(|(x, y)| Point::new(x, y))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Zoom is clamped
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn zoom_always_within_limits(
        deltas in prop::collection::vec(-1.0e6f64..1.0e6, 1..64),
        cursor in screen_point(),
    ) {
        let mut vp = Viewport::new(PIXEL_SIZE, MIN_ZOOM, MAX_ZOOM);
        for delta in deltas {
            vp.zoom_at(cursor, delta);
            prop_assert!(
                (MIN_ZOOM..=MAX_ZOOM).contains(&vp.zoom()),
                "zoom {} escaped after delta {}",
                vp.zoom(),
                delta
            );
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Round trip is within one cell
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn screen_world_round_trip(vp in viewport_strategy(), p in screen_point()) {
        let cell = vp.screen_to_world(p);
        let back = vp.world_to_screen(cell);
        let cell_span = PIXEL_SIZE as f64 * vp.zoom();
        let eps = 1e-6 * (1.0 + p.x.abs().max(vp.pan.x.abs()));

        let dx = p.x - back.x;
        let dy = p.y - back.y;
        prop_assert!(dx >= -eps && dx < cell_span + eps, "dx {} span {}", dx, cell_span);
        prop_assert!(dy >= -eps && dy < cell_span + eps, "dy {} span {}", dy, cell_span);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Cursor anchor is fixed while zoom is unclamped
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn wheel_keeps_world_point_under_cursor(
        vp in viewport_strategy(),
        cursor in screen_point(),
        delta in -200.0f64..200.0,
    ) {
        let mut vp = vp;
        let old_zoom = vp.zoom();
        let expected = old_zoom * (1.0 - delta * 0.001);
        prop_assume!((MIN_ZOOM..=MAX_ZOOM).contains(&expected));

        let before = ((cursor.x - vp.pan.x) / vp.zoom(), (cursor.y - vp.pan.y) / vp.zoom());
        vp.zoom_at(cursor, delta);
        let after = ((cursor.x - vp.pan.x) / vp.zoom(), (cursor.y - vp.pan.y) / vp.zoom());

        prop_assert!((before.0 - after.0).abs() < 1e-6 * (1.0 + before.0.abs()));
        prop_assert!((before.1 - after.1).abs() < 1e-6 * (1.0 + before.1.abs()));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Chunk addressing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn cell_lies_inside_its_chunk(x in -100_000i32..100_000, y in -100_000i32..100_000, size in 1u32..512) {
        let chunk = ChunkCoord::containing(CellCoord::new(x, y), size);
        let s = size as i64;
        prop_assert!(chunk.x as i64 * s <= x as i64 && (x as i64) < (chunk.x as i64 + 1) * s);
        prop_assert!(chunk.y as i64 * s <= y as i64 && (y as i64) < (chunk.y as i64 + 1) * s);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Visible chunks cover the view
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn visible_chunks_cover_corners(
        vp in viewport_strategy(),
        width in 1u32..2000,
        height in 1u32..2000,
    ) {
        let range = vp.visible_chunks(width, height, 100);
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(width as f64 - 1.0, 0.0),
            Point::new(0.0, height as f64 - 1.0),
            Point::new(width as f64 - 1.0, height as f64 - 1.0),
        ];
        for corner in corners {
            let chunk = ChunkCoord::containing(vp.screen_to_world(corner), 100);
            prop_assert!(range.contains(chunk), "{:?} not in {:?}", chunk, range);
        }
    }
}
