//! Small helpers shared by the node factories and the emitters.

use log::warn;

use crate::config::ParticleCount;

/// Format a number literal; the text always carries a decimal point or exponent.
pub fn fmt_number(v: f64) -> String {
    if !v.is_finite() {
        return "0.0".to_string();
    }
    let s = format!("{v}");
    if s.contains('.') || s.contains('e') {
        s
    } else {
        format!("{s}.0")
    }
}

/// Integer rendering of an index literal (`2.0` → `2`); non-integral values keep their
/// decimal form.
pub fn fmt_index(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        fmt_number(v)
    }
}

/// `0xRRGGBB` → normalised `[r, g, b]`.
pub fn hex2rgb(hex: u32) -> [f64; 3] {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f64 / 255.0;
    [channel(16), channel(8), channel(0)]
}

/// Texture dimensions used to emulate a storage buffer of `count` particles.
///
/// A total count maps to the smallest square that holds it; 3D dimensions are flattened
/// into `[x, y * z]`.
pub fn storage_size(count: &ParticleCount) -> (u32, u32) {
    match count {
        ParticleCount::Total(total) => {
            let sqrt = (*total as f64).sqrt();
            let size = sqrt.ceil() as u32;
            if sqrt.fract() != 0.0 {
                warn!(
                    "particle count {total} is not a square; using a {size}x{size} storage texture"
                );
            }
            (size, size)
        }
        ParticleCount::Dims(dims) => match dims.as_slice() {
            [x, y, z] => {
                warn!(
                    "3D particle count [{x}, {y}, {z}] flattened to {x}x{} for texture storage",
                    y * z
                );
                (*x, y * z)
            }
            [x, y, ..] => (*x, *y),
            [x] => (*x, 1),
            [] => (1, 1),
        },
    }
}

/// Per-vertex component count of raw attribute data: `len / count`, floored.
pub fn stride(len: usize, count: u32) -> usize {
    if count == 0 {
        return len;
    }
    len / count as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_always_dotted() {
        assert_eq!(fmt_number(42.0), "42.0");
        assert_eq!(fmt_number(3.14), "3.14");
        assert_eq!(fmt_number(-1.0), "-1.0");
        assert_eq!(fmt_number(1e21), "1000000000000000000000.0");
        assert_eq!(fmt_number(f64::NAN), "0.0");
    }

    #[test]
    fn index_literals_drop_the_fraction() {
        assert_eq!(fmt_index(2.0), "2");
        assert_eq!(fmt_index(0.5), "0.5");
    }

    #[test]
    fn hex_channels() {
        assert_eq!(hex2rgb(0xff0000), [1.0, 0.0, 0.0]);
        assert_eq!(hex2rgb(0x0000ff), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn storage_sizes() {
        assert_eq!(storage_size(&ParticleCount::Total(1024)), (32, 32));
        assert_eq!(storage_size(&ParticleCount::Total(1000)), (32, 32));
        assert_eq!(storage_size(&ParticleCount::Dims(vec![16, 8])), (16, 8));
        assert_eq!(storage_size(&ParticleCount::Dims(vec![4, 4, 4])), (4, 16));
    }

    #[test]
    fn strides_floor() {
        assert_eq!(stride(9, 3), 3);
        assert_eq!(stride(10, 3), 3);
        assert_eq!(stride(4, 0), 4);
    }
}
