//! Flat-color materials
//!
//! Every surface in the vignette is unlit: a material is a single color
//! written straight to the framebuffer.

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

/// Unlit material with one sRGB color
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// sRGB color with straight alpha
    pub color: Vec4,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            color: Vec4::ONE,
        }
    }
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Set the color from a 0xRRGGBB literal
    pub fn with_hex(mut self, hex: u32) -> Self {
        self.color = hex_to_rgba(hex);
        self
    }

    /// Shorthand for `Material::new(name).with_hex(hex)`
    pub fn from_hex(name: &str, hex: u32) -> Self {
        Self::new(name).with_hex(hex)
    }

    /// Create a uniform data struct for GPU
    ///
    /// An sRGB render target encodes on write, so the color is linearized first.
    pub fn uniform_data(&self, srgb_target: bool) -> MaterialUniformData {
        let color = if srgb_target {
            Vec4::new(
                srgb_to_linear(self.color.x),
                srgb_to_linear(self.color.y),
                srgb_to_linear(self.color.z),
                self.color.w,
            )
        } else {
            self.color
        };
        MaterialUniformData { color }
    }
}

/// Material uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialUniformData {
    pub color: Vec4,
}

/// Expand 0xRRGGBB into an opaque color with channels in [0, 1]
pub fn hex_to_rgba(hex: u32) -> Vec4 {
    let channel = |shift: u32| ((hex >> shift) & 0xFF) as f32 / 255.0;
    Vec4::new(channel(16), channel(8), channel(0), 1.0)
}

/// sRGB transfer function inverse
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_channels() {
        let cocoa = hex_to_rgba(0x6F4E37);
        assert!((cocoa.x - 111.0 / 255.0).abs() < 1e-6);
        assert!((cocoa.y - 78.0 / 255.0).abs() < 1e-6);
        assert!((cocoa.z - 55.0 / 255.0).abs() < 1e-6);
        assert_eq!(cocoa.w, 1.0);

        assert_eq!(hex_to_rgba(0xFF0000), Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(hex_to_rgba(0x00FF00), Vec4::new(0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn linearization_keeps_endpoints() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        assert!(srgb_to_linear(0.5) < 0.5);
    }

    #[test]
    fn uniform_data_depends_on_target() {
        let material = Material::from_hex("trunk", 0x8B4513);
        let raw = material.uniform_data(false);
        let linear = material.uniform_data(true);
        assert_eq!(raw.color, material.color);
        assert!(linear.color.x < raw.color.x);
        assert_eq!(linear.color.w, 1.0);
    }

    #[test]
    fn default_is_white() {
        let material = Material::new("star");
        assert_eq!(material.name, "star");
        assert_eq!(material.color, Vec4::ONE);
    }
}
