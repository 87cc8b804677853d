//! Configuration for the tile compositor.

use serde::{Deserialize, Serialize};

/// Configuration for the tile compositor.
///
/// Passed explicitly at construction; nothing here is read from ambient
/// global state at request time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositorConfig {
    /// Default pixel dimensions of a rendered tile.
    pub default_tile_size: (usize, usize),

    /// Pixel dimensions of preview overviews.
    pub preview_size: (usize, usize),

    /// PNG compression level (0-9).
    pub png_compression_level: u32,

    /// Maximum concurrent section fetches per request.
    pub fetch_concurrency: usize,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            default_tile_size: (256, 256),
            preview_size: (512, 512),
            png_compression_level: 6,
            fetch_concurrency: 8,
        }
    }
}

impl CompositorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("DEFAULT_TILE_SIZE") {
            if let Ok(size) = val.parse::<usize>() {
                config.default_tile_size = (size, size);
            }
        }

        if let Ok(val) = std::env::var("PREVIEW_SIZE") {
            if let Ok(size) = val.parse::<usize>() {
                config.preview_size = (size, size);
            }
        }

        if let Ok(val) = std::env::var("PNG_COMPRESS_LEVEL") {
            if let Ok(level) = val.parse() {
                config.png_compression_level = level;
            }
        }

        if let Ok(val) = std::env::var("FETCH_CONCURRENCY") {
            if let Ok(n) = val.parse() {
                config.fetch_concurrency = n;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_tile_size.0 == 0 || self.default_tile_size.1 == 0 {
            return Err("default_tile_size must be > 0".to_string());
        }

        if self.preview_size.0 == 0 || self.preview_size.1 == 0 {
            return Err("preview_size must be > 0".to_string());
        }

        if self.png_compression_level > 9 {
            return Err("png_compression_level must be 0-9".to_string());
        }

        if self.fetch_concurrency == 0 {
            return Err("fetch_concurrency must be > 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(CompositorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = CompositorConfig::default();
        config.png_compression_level = 12;
        assert!(config.validate().is_err());

        let mut config = CompositorConfig::default();
        config.fetch_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
