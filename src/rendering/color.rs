/// Floating point RGB colors and conversion to the packed framebuffer format.
use glam::Vec3;

/// Linear RGB color, one `f32` per channel, nominally in [0, 1].
pub type ColorRgb = Vec3;

pub const WHITE: ColorRgb = Vec3::ONE;
pub const BLACK: ColorRgb = Vec3::ZERO;

/// Rescale a color so its largest channel does not exceed 1.
/// All channels are divided by the same factor, which preserves hue
/// when a highlight overexposes.
#[inline]
pub fn max_to_one(color: ColorRgb) -> ColorRgb {
    let max = color.max_element();
    if max > 1.0 {
        color / max
    } else {
        color
    }
}

/// Convert RGB to ARGB u32
#[inline]
pub const fn rgb_to_u32(r: u8, g: u8, b: u8) -> u32 {
    0xFF000000 | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// Pack a float color into ARGB32. Channels are truncated after scaling by
/// 255, negative values saturate to 0.
#[inline]
pub fn pack_color(color: ColorRgb) -> u32 {
    let c = color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
    rgb_to_u32(c.x as u8, c.y as u8, c.z as u8)
}

/// Unpack an ARGB32 value into a float color.
#[inline]
pub fn unpack_color(argb: u32) -> ColorRgb {
    const INV_255: f32 = 1.0 / 255.0;
    let r = (argb >> 16) & 0xFF;
    let g = (argb >> 8) & 0xFF;
    let b = argb & 0xFF;
    Vec3::new(r as f32, g as f32, b as f32) * INV_255
}

/// Uniform gray packed color.
#[inline]
pub fn gray(level: f32) -> u32 {
    pack_color(Vec3::splat(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_to_one_preserves_hue() {
        let c = max_to_one(Vec3::new(2.0, 1.0, 0.5));
        assert_eq!(c, Vec3::new(1.0, 0.5, 0.25));
    }

    #[test]
    fn max_to_one_leaves_in_range_colors_alone() {
        let c = Vec3::new(0.3, 0.9, 0.1);
        assert_eq!(max_to_one(c), c);
    }

    #[test]
    fn pack_truncates_and_saturates() {
        assert_eq!(pack_color(Vec3::new(1.0, 0.0, -3.0)), 0xFFFF0000);
        assert_eq!(pack_color(Vec3::splat(0.5)), rgb_to_u32(127, 127, 127));
    }

    #[test]
    fn unpack_maps_bytes_to_unit_range() {
        let c = unpack_color(rgb_to_u32(0, 51, 255));
        assert!(c.x.abs() < 1e-6);
        assert!((c.y - 0.2).abs() < 1e-6);
        assert!((c.z - 1.0).abs() < 1e-6);
    }
}
