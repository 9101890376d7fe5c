/// Colour palette for fractal surface colouring.
///
/// Maps a 16-bit colour index to a colour. Every 256 index steps advance one
/// palette entry; indices in between blend linearly toward the next entry,
/// wrapping at the end of the list.

use serde::{Deserialize, Serialize};

use crate::engine::types::Rgb;
use crate::math::utils;

/// Number of distinct colour indices.
pub const PALETTE_INDEX_RANGE: u32 = 65536;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Palette {
    pub colours: Vec<Rgb>,
}

impl Default for Palette {
    fn default() -> Self {
        // Blue-orange cycle
        Self {
            colours: vec![
                Rgb::new(0.0, 0.0, 0.27),
                Rgb::new(0.0, 0.4, 1.0),
                Rgb::new(1.0, 1.0, 1.0),
                Rgb::new(1.0, 0.4, 0.0),
                Rgb::new(0.0, 0.0, 0.0),
            ],
        }
    }
}

impl Palette {
    pub fn new(colours: Vec<Rgb>) -> Self {
        Self { colours }
    }

    /// Look up the colour for `index` in [0, 65536).
    pub fn index_to_colour(&self, index: u32) -> Rgb {
        let len = self.colours.len();
        if len == 0 {
            return Rgb::WHITE;
        }
        let index = index % PALETTE_INDEX_RANGE;
        let entry = (index / 256) as usize;
        let frac = (index % 256) as f64 / 256.0;
        let c0 = &self.colours[entry % len];
        let c1 = &self.colours[(entry + 1) % len];
        Rgb::new(
            utils::lerp(c0.r, c1.r, frac),
            utils::lerp(c0.g, c1.g, frac),
            utils::lerp(c0.b, c1.b, frac),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_entries() {
        let p = Palette::default();
        let c = p.index_to_colour(0);
        assert!((c.r - 0.0).abs() < 1e-12);
        assert!((c.b - 0.27).abs() < 1e-12);

        let c = p.index_to_colour(2 * 256);
        assert!((c.r - 1.0).abs() < 1e-12);
        assert!((c.g - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_palette_blends_between_entries() {
        let p = Palette::new(vec![Rgb::BLACK, Rgb::WHITE]);
        let c = p.index_to_colour(128);
        assert!((c.r - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_palette_wraps() {
        let p = Palette::new(vec![Rgb::BLACK, Rgb::WHITE]);
        // Entry 1 blends back toward entry 0
        let c = p.index_to_colour(256 + 64);
        assert!((c.r - 0.75).abs() < 1e-12);
        assert_eq!(p.index_to_colour(PALETTE_INDEX_RANGE + 5), p.index_to_colour(5));
    }
}
