// Shared library code for both desktop and web versions

pub mod backend;
pub mod chunk;
pub mod color;
pub mod debounce;
pub mod engine;
pub mod input;
pub mod notify;
pub mod pipeline;
pub mod pixel;
pub mod raster;
pub mod render;
pub mod store;
pub mod viewport;

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Global constants that can be tuned
pub mod constants {
    /// World extent per axis; placements outside `[0, CANVAS_SIZE)` are ignored
    pub const CANVAS_SIZE: i32 = 100;

    /// Screen units per cell at zoom 1.0
    pub const PIXEL_SIZE: u32 = 10;

    /// Cells per chunk edge
    pub const CHUNK_SIZE: u32 = 100;

    /// Zoom limits (multiplicative factors)
    pub const MIN_ZOOM: f64 = 0.5;
    pub const MAX_ZOOM: f64 = 10.0;

    /// Minimum interval between accepted placements
    pub const COOLDOWN_TIME_MS: u64 = 1000;

    /// Quiet period before a placement is written to the backend
    pub const CACHE_DEBOUNCE_TIME_MS: u64 = 1000;

    /// Notifications fade out after this long
    pub const NOTIFICATION_LIFETIME_MS: u64 = 5000;

    /// Default window dimensions
    pub const DEFAULT_WIDTH: u32 = 1280;
    pub const DEFAULT_HEIGHT: u32 = 960;

    /// Title bar refresh throttle (the frame itself repaints every refresh)
    pub const TITLE_THROTTLE_MS: u64 = 250;
}

/// Milliseconds since the Unix epoch, on both desktop and web
pub fn now_millis() -> u64 {
    #[cfg(target_arch = "wasm32")]
    use web_time::{SystemTime, UNIX_EPOCH};

    #[cfg(not(target_arch = "wasm32"))]
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Every violation found by [`Config::validate`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Configuration validation failed:\n• {}", .errors.join("\n• "))]
pub struct ConfigError {
    pub errors: Vec<String>,
}

/// Configuration for the canvas engine
/// This is a plain struct without CLI dependencies, usable from both desktop and web
#[derive(Debug, Clone)]
pub struct Config {
    /// Cells per axis that accept placements
    pub canvas_size: i32,

    /// Screen units per cell at zoom 1.0
    pub pixel_size: u32,

    /// Cells per chunk edge
    pub chunk_size: u32,

    pub min_zoom: f64,
    pub max_zoom: f64,

    /// Minimum time between accepted placements in milliseconds
    pub cooldown_ms: u64,

    /// Debounce time in milliseconds before a placement is persisted
    pub debounce_ms: u64,

    /// Window width in pixels
    pub width: u32,

    /// Window height in pixels
    pub height: u32,

    /// Start in fullscreen mode
    pub fullscreen: bool,

    /// Draw the cell grid over chunks
    pub show_grid: bool,

    /// JSON file used as the persistence backend (in-memory when absent)
    pub store_path: Option<String>,

    /// Session identity; placements are attributed to "anonymous" when absent
    pub owner_id: Option<String>,
}

impl Config {
    /// Validate all configuration parameters
    /// Returns Ok(()) if valid, or a ConfigError listing every problem
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.canvas_size <= 0 {
            errors.push(format!("canvas_size must be positive (got {})", self.canvas_size));
        }

        // Pixel size: 1-64 screen units per cell
        if self.pixel_size == 0 || self.pixel_size > 64 {
            errors.push(format!("pixel_size must be in 1..=64 (got {})", self.pixel_size));
        }

        // Chunk size: 8-512 cells, a chunk raster is (chunk_size * pixel_size)^2 texels
        if self.chunk_size < 8 || self.chunk_size > 512 {
            errors.push(format!("chunk_size must be in 8..=512 (got {})", self.chunk_size));
        }
        if (self.chunk_size as u64) * (self.pixel_size as u64) > 4096 {
            errors.push(format!(
                "chunk_size * pixel_size must be at most 4096 (got {})",
                self.chunk_size as u64 * self.pixel_size as u64
            ));
        }

        if !(self.min_zoom > 0.0) {
            errors.push(format!("min_zoom must be positive (got {})", self.min_zoom));
        }
        if !(self.max_zoom >= self.min_zoom) {
            errors.push(format!(
                "max_zoom must be at least min_zoom (got {} < {})",
                self.max_zoom, self.min_zoom
            ));
        }

        // Cooldown and debounce: 0-60s
        if self.cooldown_ms > 60_000 {
            errors.push(format!("cooldown_ms must be at most 60000 (got {})", self.cooldown_ms));
        }
        if self.debounce_ms > 60_000 {
            errors.push(format!("debounce_ms must be at most 60000 (got {})", self.debounce_ms));
        }

        // Window width/height validation: only for desktop
        // On web, canvas size is determined by the browser
        #[cfg(not(target_arch = "wasm32"))]
        {
            if self.width < 200 || self.width > 8192 {
                errors.push(format!("width must be in 200..=8192 (got {})", self.width));
            }
            if self.height < 200 || self.height > 8192 {
                errors.push(format!("height must be in 200..=8192 (got {})", self.height));
            }
        }

        if let Some(owner) = &self.owner_id {
            if owner.trim().is_empty() {
                errors.push("owner_id cannot be blank".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError { errors })
        }
    }

    /// In-app help line; derived from the enforced cooldown so the two cannot drift
    pub fn help_text(&self) -> String {
        format!(
            "Place colour pixels on a shared canvas. The cooldown is {}. \
             Middle or right drag pans, wheel zooms, G toggles the grid, R picks a colour.",
            format_duration_words(self.cooldown_ms)
        )
    }
}

fn format_duration_words(ms: u64) -> String {
    if ms % 1000 == 0 {
        let secs = ms / 1000;
        if secs == 1 {
            "1 second".to_string()
        } else {
            format!("{} seconds", secs)
        }
    } else {
        format!("{} ms", ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas_size: constants::CANVAS_SIZE,
            pixel_size: constants::PIXEL_SIZE,
            chunk_size: constants::CHUNK_SIZE,
            min_zoom: constants::MIN_ZOOM,
            max_zoom: constants::MAX_ZOOM,
            cooldown_ms: constants::COOLDOWN_TIME_MS,
            debounce_ms: constants::CACHE_DEBOUNCE_TIME_MS,
            width: constants::DEFAULT_WIDTH,
            height: constants::DEFAULT_HEIGHT,
            fullscreen: false,
            show_grid: true,
            store_path: None,
            owner_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_collects_every_error() {
        let config = Config {
            pixel_size: 0,
            chunk_size: 4,
            min_zoom: 2.0,
            max_zoom: 1.0,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.errors.len(), 3);
        assert!(err.to_string().starts_with("Configuration validation failed"));
    }

    #[test]
    fn config_error_lists_each_violation_as_a_bullet() {
        let err = ConfigError {
            errors: vec!["pixel_size too big".to_string(), "owner_id cannot be blank".to_string()],
        };
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert_eq!(
            boxed.to_string(),
            "Configuration validation failed:\n• pixel_size too big\n• owner_id cannot be blank"
        );
    }

    #[test]
    fn oversized_chunk_raster_is_rejected() {
        let config = Config {
            chunk_size: 512,
            pixel_size: 10,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn help_text_follows_cooldown() {
        let mut config = Config::default();
        assert!(config.help_text().contains("The cooldown is 1 second."));
        config.cooldown_ms = 5000;
        assert!(config.help_text().contains("The cooldown is 5 seconds."));
    }
}
