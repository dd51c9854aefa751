//! Environment-driven application configuration.

use std::path::PathBuf;
use std::time::Duration;

use photomosaic_core::TileSize;
use photomosaic_mosaic::{DEFAULT_JPEG_QUALITY, RequestContext};

/// Env var naming the tile image directory.
pub const ENV_TILES_DIR: &str = "PHOTOMOSAIC_TILES_DIR";
/// Env var with the default cell size in pixels.
pub const ENV_TILE_SIZE: &str = "PHOTOMOSAIC_TILE_SIZE";
/// Env var with the JPEG quality (1..=100).
pub const ENV_JPEG_QUALITY: &str = "PHOTOMOSAIC_JPEG_QUALITY";
/// Env var with the per-request deadline in milliseconds; `0` disables it.
pub const ENV_DEADLINE_MS: &str = "PHOTOMOSAIC_DEADLINE_MS";
/// Env var naming the log directory.
pub const ENV_LOG_DIR: &str = "PHOTOMOSAIC_LOG_DIR";

const DEFAULT_TILES_DIR: &str = "tiles";
const DEFAULT_DEADLINE_MS: u64 = 30_000;
const DEFAULT_LOG_DIR: &str = "logs";

/// Runtime configuration shared by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory the tile library is built from.
    pub tiles_dir: PathBuf,
    /// Cell size used when a request does not specify one.
    pub default_tile_size: TileSize,
    /// JPEG quality for original and mosaic encodes.
    pub jpeg_quality: u8,
    /// Per-request deadline; `None` waits indefinitely.
    pub deadline: Option<Duration>,
    /// Directory for per-run log files.
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tiles_dir: PathBuf::from(DEFAULT_TILES_DIR),
            default_tile_size: TileSize::DEFAULT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            deadline: Some(Duration::from_millis(DEFAULT_DEADLINE_MS)),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl AppConfig {
    /// Reads configuration from process environment variables.
    ///
    /// Unset or invalid values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let trimmed = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let tiles_dir = trimmed(ENV_TILES_DIR)
            .map(PathBuf::from)
            .unwrap_or(defaults.tiles_dir);
        let default_tile_size = trimmed(ENV_TILE_SIZE)
            .and_then(|value| value.parse::<u32>().ok())
            .and_then(|pixels| TileSize::new(pixels).ok())
            .unwrap_or(defaults.default_tile_size);
        let jpeg_quality = trimmed(ENV_JPEG_QUALITY)
            .and_then(|value| value.parse::<u8>().ok())
            .filter(|quality| (1..=100).contains(quality))
            .unwrap_or(defaults.jpeg_quality);
        let deadline = match trimmed(ENV_DEADLINE_MS).and_then(|value| value.parse::<u64>().ok()) {
            Some(0) => None,
            Some(millis) => Some(Duration::from_millis(millis)),
            None => defaults.deadline,
        };
        let log_dir = trimmed(ENV_LOG_DIR)
            .map(PathBuf::from)
            .unwrap_or(defaults.log_dir);

        Self {
            tiles_dir,
            default_tile_size,
            jpeg_quality,
            deadline,
            log_dir,
        }
    }

    /// Fresh request context honoring the configured deadline.
    pub fn request_context(&self) -> RequestContext {
        match self.deadline {
            Some(timeout) => RequestContext::with_timeout(timeout),
            None => RequestContext::new(),
        }
    }
}
