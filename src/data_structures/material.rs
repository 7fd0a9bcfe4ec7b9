//! Material descriptions.
//!
//! [`MaterialDesc`] is the immutable, GPU-free description of how a surface is
//! shaded. The GPU counterpart (uniform buffer + bind group) is
//! [`Material`](crate::data_structures::model::Material).

use thiserror::Error;

use crate::data_structures::texture::TextureId;

/// Index of a material in the scene's material table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub usize);

/// Which faces of a triangle are rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Side {
    #[default]
    Front,
    Double,
}

/// Linear-space RGBA colour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid hex colour {0:?}")]
pub struct ParseColorError(String);

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parses `#rgb` or `#rrggbb` (sRGB) into a linear colour.
    pub fn from_hex(hex: &str) -> Result<Self, ParseColorError> {
        let err = || ParseColorError(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(err)?;
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(err()),
        };
        let value = u32::from_str_radix(&expanded, 16).map_err(|_| err())?;
        let channel = |shift: u32| srgb_to_linear(((value >> shift) & 0xff) as f32 / 255.0);
        Ok(Self::rgb(channel(16), channel(8), channel(0)))
    }

    pub fn scaled(self, intensity: f32) -> [f32; 4] {
        [self.r * intensity, self.g * intensity, self.b * intensity, self.a]
    }
}

impl From<Color> for [f32; 4] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

/// Physically-inspired surface description.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialDesc {
    pub name: String,
    pub color: Color,
    pub map: Option<TextureId>,
    pub metalness: f32,
    pub roughness: f32,
    pub flat_shading: bool,
    pub transparent: bool,
    pub side: Side,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            name: String::from("material"),
            color: Color::WHITE,
            map: None,
            metalness: 0.0,
            roughness: 1.0,
            flat_shading: false,
            transparent: false,
            side: Side::Front,
        }
    }
}

impl MaterialDesc {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn map(mut self, texture: TextureId) -> Self {
        self.map = Some(texture);
        self
    }

    pub fn metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness;
        self
    }

    pub fn roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    pub fn flat_shading(mut self, flat: bool) -> Self {
        self.flat_shading = flat;
        self
    }

    pub fn transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    pub fn side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn is_double_sided(&self) -> bool {
        self.side == Side::Double
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_long_and_short_hex() {
        let white = Color::from_hex("#fff").unwrap();
        assert_relative_eq!(white.r, 1.0, epsilon = 1e-6);
        assert_relative_eq!(white.b, 1.0, epsilon = 1e-6);
        let grey = Color::from_hex("#dbd3d3").unwrap();
        assert!(grey.r > grey.g);
        assert_relative_eq!(grey.g, grey.b);
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(Color::from_hex("dbd3d3").is_err());
        assert!(Color::from_hex("#dbd3").is_err());
        assert!(Color::from_hex("#zzzzzz").is_err());
    }

    #[test]
    fn builder_keeps_defaults() {
        let material = MaterialDesc::new("hat").metalness(0.2).side(Side::Double);
        assert_eq!(material.roughness, 1.0);
        assert!(material.is_double_sided());
        assert!(!material.transparent);
    }
}
