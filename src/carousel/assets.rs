//! Texture files of the carousel and how each one is sampled.

use crate::data_structures::texture::{MagFilter, MinFilter, TextureSettings, Wrapping};

pub const WINDOW: &str = "images/window.png";
pub const HAT: &str = "images/hat_pink_lathe.png";
pub const GARLAND: &str = "images/garland.png";
pub const HORSE: &str = "images/carousel-horse_1f3a0_s.png";
pub const FLOOR: &str = "images/floor_pink.png";

/// Window strip wrapped around the core: eight columns, shifted down.
pub fn window() -> TextureSettings {
    TextureSettings {
        repeat: [8.0, 5.0],
        wrap_s: Wrapping::Repeat,
        wrap_t: Wrapping::ClampToEdge,
        offset: [0.0, -1.5],
        mag_filter: MagFilter::Nearest,
        min_filter: MinFilter::Nearest,
        ..Default::default()
    }
}

pub fn hat() -> TextureSettings {
    TextureSettings {
        mag_filter: MagFilter::Nearest,
        min_filter: MinFilter::Nearest,
        ..Default::default()
    }
}

pub fn garland() -> TextureSettings {
    TextureSettings::default()
}

/// Crops the horse out of the emoji sheet; shape UVs are in scene units.
pub fn horse() -> TextureSettings {
    TextureSettings {
        repeat: [0.25, 0.25],
        offset: [-0.07, 0.94],
        mag_filter: MagFilter::Linear,
        min_filter: MinFilter::LinearMipmapNearest,
        ..Default::default()
    }
}

pub fn floor() -> TextureSettings {
    TextureSettings {
        repeat: [0.05, 0.05],
        wrap_t: Wrapping::Repeat,
        mag_filter: MagFilter::Linear,
        min_filter: MinFilter::LinearMipmapNearest,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unspecified_settings_keep_defaults() {
        let floor = floor();
        assert_eq!(floor.wrap_s, Wrapping::ClampToEdge);
        assert_eq!(floor.offset, [0.0, 0.0]);
        assert!(floor.flip_y);
        assert_eq!(garland(), TextureSettings::default());
    }
}
