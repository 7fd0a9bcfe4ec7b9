//! Display-area bookkeeping for the resize path.
//!
//! [`Viewport::from_container`] turns a container size in logical pixels and a
//! device pixel ratio into the camera aspect ratio and the physical surface size.

use crate::error::CarouselError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Camera aspect ratio, `width / height` of the (clamped) container.
    pub aspect: f32,
    /// Surface size in physical pixels, never below 1×1.
    pub physical_width: u32,
    pub physical_height: u32,
}

impl Viewport {
    /// Degenerate sizes are clamped to 1 and logged.
    pub fn from_container(width: f64, height: f64, scale_factor: f64) -> Self {
        let (clamped_width, clamped_height) = (sanitize(width), sanitize(height));
        if clamped_width != width || clamped_height != height {
            log::warn!("{}", CarouselError::InvalidViewportSize { width, height });
        }
        let scale_factor = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        Self {
            aspect: clamped_width as f32 / clamped_height as f32,
            physical_width: to_physical(clamped_width, scale_factor),
            physical_height: to_physical(clamped_height, scale_factor),
        }
    }

    /// Viewport of a surface whose size is already known in physical pixels.
    pub fn from_physical(width: u32, height: u32) -> Self {
        Self::from_container(width as f64, height as f64, 1.0)
    }

    pub fn size(&self) -> [u32; 2] {
        [self.physical_width, self.physical_height]
    }
}

fn sanitize(length: f64) -> f64 {
    if length.is_finite() && length >= 1.0 {
        length
    } else {
        1.0
    }
}

fn to_physical(length: f64, scale_factor: f64) -> u32 {
    ((length * scale_factor).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_is_scaled_by_pixel_ratio() {
        let viewport = Viewport::from_container(800.0, 600.0, 2.0);
        assert_eq!(viewport.size(), [1600, 1200]);
        assert_eq!(viewport.aspect, 800.0 / 600.0);
    }

    #[test]
    fn zero_height_is_clamped() {
        let viewport = Viewport::from_container(640.0, 0.0, 1.0);
        assert_eq!(viewport.aspect, 640.0);
        assert_eq!(viewport.size(), [640, 1]);
    }

    #[test]
    fn repeated_resize_is_idempotent() {
        let first = Viewport::from_container(1024.0, 768.0, 1.5);
        let second = Viewport::from_container(1024.0, 768.0, 1.5);
        assert_eq!(first, second);
    }
}
