use bytemuck::{Pod, Zeroable};

/// Colors for heights `0..=3` plus one for cells at or above the topple
/// threshold.
///
/// Stable heights from 3 up to the threshold share the fourth color.
pub const PALETTE_LEN: usize = 5;

/// Display colors as straight sRGB bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Palette {
    pub colors: [[u8; 4]; PALETTE_LEN],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: [
                [0x10, 0x10, 0x18, 0xff], // empty
                [0x24, 0x5d, 0xa8, 0xff],
                [0xe8, 0xc5, 0x47, 0xff],
                [0xc4, 0x3b, 0x2f, 0xff],
                [0xf5, 0xf5, 0xf5, 0xff], // unstable
            ],
        }
    }
}

impl Palette {
    /// Uniform contents for a surface of the given encoding.
    ///
    /// sRGB surfaces encode on write, so they receive linear values.
    /// `threshold` picks the height that gets the unstable color.
    pub fn uniform(&self, srgb_target: bool, threshold: u32) -> PaletteUniform {
        let colors = self.colors.map(|c| {
            let channel = |v: u8| {
                let v = v as f32 / 255.0;
                if srgb_target { srgb_to_linear(v) } else { v }
            };
            [channel(c[0]), channel(c[1]), channel(c[2]), c[3] as f32 / 255.0]
        });
        PaletteUniform {
            colors,
            threshold,
            _pad: [0; 3],
        }
    }
}

/// Matches `struct Palette` in `display.frag.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PaletteUniform {
    pub colors: [[f32; 4]; PALETTE_LEN],
    pub threshold: u32,
    _pad: [u32; 3],
}

fn srgb_to_linear(c: f32) -> f32 {
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
    fn uniform_carries_the_topple_threshold() {
        let p = Palette::default();
        assert_eq!(p.uniform(false, 4).threshold, 4);
        assert_eq!(p.uniform(true, 6).threshold, 6);
        assert_eq!(p.uniform(true, 6).colors, p.uniform(true, 4).colors);
    }

    #[test]
    fn stable_heights_have_distinct_colors() {
        let p = Palette::default();
        for a in 0..PALETTE_LEN {
            for b in a + 1..PALETTE_LEN {
                assert_ne!(p.colors[a], p.colors[b]);
            }
        }
    }

    #[test]
    fn uniform_layout_is_std140_compatible() {
        // array<vec4<f32>, 5> then a u32, rounded up to 16 bytes.
        assert_eq!(std::mem::size_of::<PaletteUniform>(), 96);
    }

    #[test]
    fn srgb_target_gets_linear_values() {
        let p = Palette {
            colors: [[0, 0, 0, 255], [255, 255, 255, 255], [128, 128, 128, 255], [0; 4], [0; 4]],
        };
        let linear = p.uniform(true, 4);
        let raw = p.uniform(false, 4);

        assert_eq!(linear.colors[0], [0.0, 0.0, 0.0, 1.0]);
        assert!((linear.colors[1][0] - 1.0).abs() < 1e-6);
        assert!(linear.colors[2][0] < raw.colors[2][0]);
        assert!((raw.colors[2][0] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(linear.colors[2][3], 1.0);
    }
}
