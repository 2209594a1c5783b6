use crate::foundation::error::{PlatenError, PlatenResult};

/// Target raster dimensions in device pixels.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct RasterSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl RasterSize {
    /// Create a validated size with both dimensions non-zero.
    pub fn new(width: u32, height: u32) -> PlatenResult<Self> {
        if width == 0 || height == 0 {
            return Err(PlatenError::validation(format!(
                "raster size must be non-zero in both dimensions, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Number of RGBA8 bytes a surface of this size occupies.
    pub fn byte_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        assert!(RasterSize::new(0, 10).is_err());
        assert!(RasterSize::new(10, 0).is_err());
        assert!(RasterSize::new(1, 1).is_ok());
    }

    #[test]
    fn byte_len_is_four_per_pixel() {
        let s = RasterSize::new(8, 4).unwrap();
        assert_eq!(s.byte_len(), 8 * 4 * 4);
    }
}
