//! Crate-level configuration.
//!
//! Frame dimensions are fixed at `RenderingStage` construction time — there
//! is no in-band resize operation — so they live here alongside the pool's
//! sizing and trim policy rather than being threaded through every call.
//! Mirrors the
//! `RenderSettings`-style configuration struct used elsewhere in this
//! codebase family: a plain `Default`-implementing struct built with
//! struct-update syntax, not a file-based format.

/// Pixel format of a rented layer buffer.
///
/// Layer buffers are always premultiplied RGBA8888; the enum exists so the
/// byte-size computation in [`StageConfig::layer_byte_size`] has a name for
/// what it's counting rather than a bare `* 4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8 bits per channel, alpha premultiplied into RGB.
    PremultipliedRgba8888,
}

impl PixelFormat {
    #[must_use]
    const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::PremultipliedRgba8888 => 4,
        }
    }
}

/// Construction-time settings for a [`crate::stage::RenderingStage`].
///
/// ```rust,ignore
/// use canvas_stream::config::StageConfig;
///
/// let config = StageConfig {
///     width: 3840,
///     height: 2160,
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageConfig {
    /// Frame width in pixels. Fixed for the stage's lifetime.
    pub width: u32,
    /// Frame height in pixels. Fixed for the stage's lifetime.
    pub height: u32,
    /// Pixel format of every rented layer buffer.
    pub pixel_format: PixelFormat,
    /// Number of layer buffers to pre-warm the pool's free list with at
    /// construction, so the first few frames don't pay allocation cost.
    pub initial_pool_capacity: usize,
    /// Default `max_idle_frames` argument for [`crate::snapshot::LayerPool::trim`]
    /// when the owning stage runs its own trim policy. Not enforced by the
    /// pool itself — trimming cadence is left to the caller.
    pub trim_idle_frames: u32,
}

impl StageConfig {
    /// Bytes a single layer buffer needs at this configuration's
    /// dimensions and pixel format.
    #[must_use]
    pub fn layer_byte_size(&self) -> usize {
        self.width as usize * self.height as usize * self.pixel_format.bytes_per_pixel()
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            pixel_format: PixelFormat::PremultipliedRgba8888,
            initial_pool_capacity: 0,
            trim_idle_frames: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PixelFormat, StageConfig};

    #[test]
    fn layer_byte_size_accounts_for_four_channels() {
        let config = StageConfig {
            width: 10,
            height: 20,
            ..Default::default()
        };
        assert_eq!(config.layer_byte_size(), 10 * 20 * 4);
    }

    #[test]
    fn default_pixel_format_is_premultiplied_rgba() {
        assert_eq!(StageConfig::default().pixel_format, PixelFormat::PremultipliedRgba8888);
    }
}
