//! Conversion from sRGB hex values to perceptual color coordinates.
//!
//! Classification distances are computed in CIE LCh (the cylindrical form
//! of CIE Lab, D65 illuminant) rather than raw RGB, because Euclidean
//! distance in LCh tracks human color similarity far better: two colors a
//! user would call "the same blue" sit close together even when their RGB
//! channel values differ widely.

// Standard conversion matrices carry more digits than f32 representation
#![allow(clippy::excessive_precision)]

use serde::Serialize;

use crate::models::ColorValue;

/// Chroma below this is treated as having no meaningful hue angle.
const ACHROMATIC_CHROMA: f32 = 0.0001;

/// Perceptual coordinates of a color: CIE LCh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Perceptual {
    /// Lightness, 0.0 (black) to 100.0 (white).
    pub lightness: f32,
    /// Chroma (colorfulness), 0.0 for neutrals, up to ~130 for saturated sRGB colors.
    pub chroma: f32,
    /// Hue angle in degrees, 0.0..360.0. Zero when the color is achromatic.
    pub hue_degrees: f32,
}

/// Converts a validated color to perceptual LCh coordinates.
///
/// Pure and total over all valid [`ColorValue`] inputs: identical input
/// always yields identical output, and no input can fail.
///
/// # Examples
///
/// ```
/// use colorfacet::color_space::to_perceptual;
/// use colorfacet::models::ColorValue;
///
/// let white = to_perceptual(ColorValue::parse("#FFFFFF").unwrap());
/// assert!(white.lightness > 99.0);
/// assert!(white.chroma < 0.01);
/// ```
#[must_use]
pub fn to_perceptual(color: ColorValue) -> Perceptual {
    let (r, g, b) = color.channels();
    let (l, a, lab_b) = srgb_to_lab(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
    );

    let chroma = (a * a + lab_b * lab_b).sqrt();
    let hue_degrees = if chroma < ACHROMATIC_CHROMA {
        // Hue is undefined for neutrals; pin it so the output is deterministic.
        0.0
    } else {
        let h = lab_b.atan2(a).to_degrees();
        if h < 0.0 {
            h + 360.0
        } else {
            h
        }
    };

    Perceptual {
        lightness: l,
        chroma,
        hue_degrees,
    }
}

/// sRGB (0.0-1.0 per channel) to CIE Lab under the D65 illuminant.
fn srgb_to_lab(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let rl = gamma_expand(r);
    let gl = gamma_expand(g);
    let bl = gamma_expand(b);

    // Linear sRGB to XYZ, D65 (IEC 61966-2-1 matrix), scaled to Y=100.
    let x = (0.4124564 * rl + 0.3575761 * gl + 0.1804375 * bl) * 100.0;
    let y = (0.2126729 * rl + 0.7151522 * gl + 0.0721750 * bl) * 100.0;
    let z = (0.0193339 * rl + 0.1191920 * gl + 0.9503041 * bl) * 100.0;

    // D65 reference white
    let fx = lab_f(x / 95.047);
    let fy = lab_f(y / 100.0);
    let fz = lab_f(z / 108.883);

    let l = 116.0 * fy - 16.0;
    let a = 500.0 * (fx - fy);
    let lab_b = 200.0 * (fy - fz);

    (l, a, lab_b)
}

/// sRGB transfer function (gamma expansion to linear light).
fn gamma_expand(channel: f32) -> f32 {
    if channel <= 0.04045 {
        channel / 12.92
    } else {
        ((channel + 0.055) / 1.055).powf(2.4)
    }
}

/// The Lab cube-root compression with the linear segment near black.
fn lab_f(t: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perceptual(hex: &str) -> Perceptual {
        to_perceptual(ColorValue::parse(hex).unwrap())
    }

    #[test]
    fn test_black_and_white_extremes() {
        let black = perceptual("#000000");
        assert!(black.lightness.abs() < 0.01);
        assert!(black.chroma < 0.01);
        assert_eq!(black.hue_degrees, 0.0);

        let white = perceptual("#FFFFFF");
        assert!((white.lightness - 100.0).abs() < 0.1);
        assert!(white.chroma < 0.1);
    }

    #[test]
    fn test_neutral_gray_has_no_chroma() {
        let gray = perceptual("#808080");
        assert!(gray.chroma < 0.1);
        assert!(gray.lightness > 45.0 && gray.lightness < 60.0);
        assert_eq!(gray.hue_degrees, 0.0);
    }

    #[test]
    fn test_primary_hue_angles() {
        // Reference hue angles of the sRGB primaries in LCh (D65).
        let red = perceptual("#FF0000");
        assert!((red.hue_degrees - 40.0).abs() < 2.0, "red hue {}", red.hue_degrees);
        assert!(red.chroma > 100.0);

        let green = perceptual("#00FF00");
        assert!((green.hue_degrees - 136.0).abs() < 2.0, "green hue {}", green.hue_degrees);

        let blue = perceptual("#0000FF");
        assert!((blue.hue_degrees - 306.0).abs() < 2.0, "blue hue {}", blue.hue_degrees);
    }

    #[test]
    fn test_lightness_ordering() {
        // Lighter inputs produce higher L.
        let dark = perceptual("#202020");
        let mid = perceptual("#808080");
        let light = perceptual("#E0E0E0");
        assert!(dark.lightness < mid.lightness);
        assert!(mid.lightness < light.lightness);
    }

    #[test]
    fn test_deterministic() {
        let a = perceptual("#3B82F6");
        let b = perceptual("#3B82F6");
        assert_eq!(a, b);
    }

    #[test]
    fn test_hue_range() {
        for hex in ["#FF0000", "#FFA500", "#FFFF00", "#00FF00", "#00FFFF", "#0000FF", "#FF00FF"] {
            let p = perceptual(hex);
            assert!(p.hue_degrees >= 0.0 && p.hue_degrees < 360.0, "{hex}: {}", p.hue_degrees);
        }
    }
}
