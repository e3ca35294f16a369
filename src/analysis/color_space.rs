//! sRGB to CIE L*a*b* conversion.
//!
//! Implements the standard sRGB (D65) pipeline: inverse companding,
//! linear RGB to XYZ, white-point normalization, Lab nonlinearity. The
//! inverse transform is provided for display utilities and round-trip
//! verification.

use serde::{Deserialize, Serialize};

/// A color measurement in CIE L*a*b* space.
///
/// `l` is in [0, 100]; `a` and `b` are unbounded in principle but land in
/// roughly [-128, 127] for in-gamut sRGB inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabMeasurement {
    #[serde(rename = "L")]
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl LabMeasurement {
    /// Hue angle of the a/b chroma plane, in degrees.
    pub fn hue_angle(&self) -> f64 {
        self.b.atan2(self.a).to_degrees()
    }
}

/// D65 reference white.
const XN: f64 = 0.95047;
const YN: f64 = 1.0;
const ZN: f64 = 1.08883;

/// Threshold between the cube-root and linear segments of the Lab nonlinearity.
const LAB_EPSILON: f64 = 0.008856;

/// Linear RGB -> XYZ, sRGB/D65 primaries.
const RGB_TO_XYZ: [[f64; 3]; 3] = [
    [0.4124, 0.3576, 0.1805],
    [0.2126, 0.7152, 0.0722],
    [0.0193, 0.1192, 0.9505],
];

/// XYZ -> linear RGB, inverse of the matrix above.
const XYZ_TO_RGB: [[f64; 3]; 3] = [
    [3.2406, -1.5372, -0.4986],
    [-0.9689, 1.8758, 0.0415],
    [0.0557, -0.2040, 1.0570],
];

fn srgb_decompand(v: f64) -> f64 {
    if v > 0.04045 {
        ((v + 0.055) / 1.055).powf(2.4)
    } else {
        v / 12.92
    }
}

fn srgb_compand(v: f64) -> f64 {
    if v > 0.0031308 {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    } else {
        v * 12.92
    }
}

fn lab_f(t: f64) -> f64 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

fn lab_f_inv(f: f64) -> f64 {
    let cubed = f * f * f;
    if cubed > LAB_EPSILON {
        cubed
    } else {
        (f - 16.0 / 116.0) / 7.787
    }
}

/// Convert an averaged sRGB triple (channels in [0, 255]) to Lab.
pub fn srgb_to_lab(r: f64, g: f64, b: f64) -> LabMeasurement {
    let rgb = [
        srgb_decompand(r / 255.0),
        srgb_decompand(g / 255.0),
        srgb_decompand(b / 255.0),
    ];

    let x = RGB_TO_XYZ[0][0] * rgb[0] + RGB_TO_XYZ[0][1] * rgb[1] + RGB_TO_XYZ[0][2] * rgb[2];
    let y = RGB_TO_XYZ[1][0] * rgb[0] + RGB_TO_XYZ[1][1] * rgb[1] + RGB_TO_XYZ[1][2] * rgb[2];
    let z = RGB_TO_XYZ[2][0] * rgb[0] + RGB_TO_XYZ[2][1] * rgb[1] + RGB_TO_XYZ[2][2] * rgb[2];

    let fx = lab_f(x / XN);
    let fy = lab_f(y / YN);
    let fz = lab_f(z / ZN);

    LabMeasurement {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// Convert a Lab measurement back to sRGB (channels in [0, 255]).
///
/// Out-of-gamut results are clamped to the displayable range.
pub fn lab_to_srgb(lab: &LabMeasurement) -> (f64, f64, f64) {
    let fy = (lab.l + 16.0) / 116.0;
    let fx = fy + lab.a / 500.0;
    let fz = fy - lab.b / 200.0;

    let x = XN * lab_f_inv(fx);
    let y = YN * lab_f_inv(fy);
    let z = ZN * lab_f_inv(fz);

    let lin = [
        XYZ_TO_RGB[0][0] * x + XYZ_TO_RGB[0][1] * y + XYZ_TO_RGB[0][2] * z,
        XYZ_TO_RGB[1][0] * x + XYZ_TO_RGB[1][1] * y + XYZ_TO_RGB[1][2] * z,
        XYZ_TO_RGB[2][0] * x + XYZ_TO_RGB[2][1] * y + XYZ_TO_RGB[2][2] * z,
    ];

    (
        (srgb_compand(lin[0]) * 255.0).clamp(0.0, 255.0),
        (srgb_compand(lin[1]) * 255.0).clamp(0.0, 255.0),
        (srgb_compand(lin[2]) * 255.0).clamp(0.0, 255.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_inputs_are_achromatic() {
        for v in [10.0, 64.0, 128.0, 200.0, 255.0] {
            let lab = srgb_to_lab(v, v, v);
            assert!(lab.a.abs() < 0.1, "a = {} for gray {}", lab.a, v);
            assert!(lab.b.abs() < 0.1, "b = {} for gray {}", lab.b, v);
        }
    }

    #[test]
    fn white_is_l_100() {
        let lab = srgb_to_lab(255.0, 255.0, 255.0);
        assert!((lab.l - 100.0).abs() < 0.1);
    }

    #[test]
    fn black_is_l_0() {
        let lab = srgb_to_lab(0.0, 0.0, 0.0);
        assert!(lab.l.abs() < 0.1);
    }

    #[test]
    fn lightness_is_monotonic_in_gray_level() {
        let mut prev = -1.0;
        for v in [0.0, 32.0, 96.0, 160.0, 224.0, 255.0] {
            let lab = srgb_to_lab(v, v, v);
            assert!(lab.l > prev);
            prev = lab.l;
        }
    }

    #[test]
    fn round_trips_within_tolerance() {
        // Representative skin-tone range plus a few saturated colors.
        let samples = [
            (231.0, 180.0, 160.0),
            (198.0, 147.0, 120.0),
            (141.0, 96.0, 73.0),
            (87.0, 56.0, 41.0),
            (220.0, 66.0, 61.0),
            (100.0, 150.0, 200.0),
        ];
        for (r, g, b) in samples {
            let lab = srgb_to_lab(r, g, b);
            let (r2, g2, b2) = lab_to_srgb(&lab);
            // 1e-3 on normalized channels = 0.255 on the 0-255 scale.
            assert!((r - r2).abs() < 0.3, "r {} -> {}", r, r2);
            assert!((g - g2).abs() < 0.3, "g {} -> {}", g, g2);
            assert!((b - b2).abs() < 0.3, "b {} -> {}", b, b2);
        }
    }

    #[test]
    fn warm_skin_tone_has_positive_a_and_b() {
        // A typical light warm skin tone: red dominant, blue lowest.
        let lab = srgb_to_lab(231.0, 180.0, 160.0);
        assert!(lab.l > 70.0);
        assert!(lab.a > 0.0);
        assert!(lab.b > 0.0);
    }

    #[test]
    fn hue_angle_matches_atan2() {
        let lab = LabMeasurement {
            l: 50.0,
            a: 10.0,
            b: 10.0,
        };
        assert!((lab.hue_angle() - 45.0).abs() < 1e-9);
    }
}
