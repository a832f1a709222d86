//! Placed pixels and the remote row schema

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::color::{Color, ColorError};

/// Owner recorded for placements made without a session
pub const ANONYMOUS: &str = "anonymous";

/// Integer cell coordinates in world space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// True when the cell lies in `[0, canvas_size)` on both axes
    #[inline]
    pub fn in_bounds(&self, canvas_size: i32) -> bool {
        (0..canvas_size).contains(&self.x) && (0..canvas_size).contains(&self.y)
    }
}

/// A placed pixel; the store holds at most one per coordinate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixel {
    pub coord: CellCoord,
    pub color: Color,
    /// Milliseconds since the Unix epoch
    pub last_updated: u64,
    pub owner_id: String,
}

impl Pixel {
    pub fn to_row(&self) -> PixelRow {
        PixelRow {
            x: self.coord.x as i64,
            y: self.coord.y as i64,
            color: self.color.to_hex(),
            last_updated: format_timestamp(self.last_updated),
            user_id: self.owner_id.clone(),
        }
    }
}

/// Row shape exchanged with the persistence backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRow {
    pub x: i64,
    pub y: i64,
    pub color: String,
    /// ISO-8601 timestamp
    pub last_updated: String,
    pub user_id: String,
}

/// Why a remote row was dropped
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    #[error("row does not match the pixel schema: {0}")]
    Shape(#[from] serde_json::Error),
    #[error("coordinate out of range: ({0}, {1})")]
    Coordinate(i64, i64),
    #[error("bad colour: {0}")]
    Color(#[from] ColorError),
    #[error("bad timestamp {0:?}")]
    Timestamp(String),
    #[error("empty user_id")]
    Owner,
}

impl PixelRow {
    /// Validate an untyped row coming from the backend
    pub fn from_value(value: serde_json::Value) -> Result<Pixel, RowError> {
        let row: PixelRow = serde_json::from_value(value)?;
        row.into_pixel()
    }

    pub fn into_pixel(self) -> Result<Pixel, RowError> {
        let x = i32::try_from(self.x).map_err(|_| RowError::Coordinate(self.x, self.y))?;
        let y = i32::try_from(self.y).map_err(|_| RowError::Coordinate(self.x, self.y))?;
        let color = Color::from_hex(&self.color)?;
        let last_updated = parse_timestamp(&self.last_updated)
            .ok_or_else(|| RowError::Timestamp(self.last_updated.clone()))?;
        if self.user_id.trim().is_empty() {
            return Err(RowError::Owner);
        }

        Ok(Pixel {
            coord: CellCoord::new(x, y),
            color,
            last_updated,
            owner_id: self.user_id,
        })
    }
}

/// Epoch milliseconds as `2024-01-01T00:00:00.000Z`
pub fn format_timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// RFC 3339 timestamp to epoch milliseconds; pre-epoch values are rejected
pub fn parse_timestamp(s: &str) -> Option<u64> {
    let parsed = DateTime::parse_from_rfc3339(s.trim()).ok()?;
    u64::try_from(parsed.timestamp_millis()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bounds_are_half_open() {
        assert!(CellCoord::new(0, 0).in_bounds(100));
        assert!(CellCoord::new(99, 99).in_bounds(100));
        assert!(!CellCoord::new(100, 5).in_bounds(100));
        assert!(!CellCoord::new(-1, 5).in_bounds(100));
    }

    #[test]
    fn valid_row_becomes_pixel() {
        let pixel = PixelRow::from_value(json!({
            "x": 5,
            "y": 7,
            "color": "#e50000",
            "last_updated": "1970-01-01T00:00:01.500+00:00",
            "user_id": "u-1",
        }))
        .unwrap();

        assert_eq!(pixel.coord, CellCoord::new(5, 7));
        assert_eq!(pixel.color.to_hex(), "#E50000");
        assert_eq!(pixel.last_updated, 1500);
        assert_eq!(pixel.owner_id, "u-1");
    }

    #[test]
    fn malformed_rows_are_rejected() {
        let missing = PixelRow::from_value(json!({ "x": 1, "y": 1, "color": "#000000" }));
        assert!(matches!(missing, Err(RowError::Shape(_))));

        let wrong_type = PixelRow::from_value(json!({
            "x": "1", "y": 1, "color": "#000000",
            "last_updated": "2024-01-01T00:00:00Z", "user_id": "a",
        }));
        assert!(matches!(wrong_type, Err(RowError::Shape(_))));

        let huge = PixelRow::from_value(json!({
            "x": 1_i64 << 40, "y": 1, "color": "#000000",
            "last_updated": "2024-01-01T00:00:00Z", "user_id": "a",
        }));
        assert!(matches!(huge, Err(RowError::Coordinate(_, _))));

        let bad_time = PixelRow::from_value(json!({
            "x": 1, "y": 1, "color": "#000000",
            "last_updated": "yesterday", "user_id": "a",
        }));
        assert!(matches!(bad_time, Err(RowError::Timestamp(_))));

        let bad_color = PixelRow::from_value(json!({
            "x": 1, "y": 1, "color": "red",
            "last_updated": "2024-01-01T00:00:00Z", "user_id": "a",
        }));
        assert!(matches!(bad_color, Err(RowError::Color(_))));
    }

    #[test]
    fn row_timestamp_matches_js_iso_string() {
        let pixel = Pixel {
            coord: CellCoord::new(5, 5),
            color: Color::rgb(0xE5, 0, 0),
            last_updated: 1000,
            owner_id: ANONYMOUS.to_string(),
        };
        let row = pixel.to_row();
        assert_eq!(row.last_updated, "1970-01-01T00:00:01.000Z");
        assert_eq!(row.into_pixel().unwrap(), pixel);
    }
}
