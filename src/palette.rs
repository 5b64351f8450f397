//! Brightness quantization.
//!
//! Pixels are reduced to ITU-R BT.601 luma and bucketed into a fixed
//! 12-glyph ramp running from the densest glyph (`@`) to the sparsest (` `).

/// Densest first, sparsest last.
pub const GLYPH_PALETTE: [char; 12] = ['@', '#', 'W', 'S', '%', '?', '*', '+', '~', '-', '.', ' '];

const LAST_INDEX: usize = GLYPH_PALETTE.len() - 1;

/// Which end of the brightness range maps to the dense end of the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaletteMapping {
    /// `floor(b / 255 * 11)`: black is `@`, white is ` `.
    ///
    /// This is the index formula as written. Brightness therefore falls as
    /// glyph density rises; use [`PaletteMapping::BrightIsDense`] for a ramp
    /// where brighter pixels never map to a sparser glyph.
    #[default]
    DarkIsDense,
    /// Reversed index: white is `@`, black is ` `.
    BrightIsDense,
}

impl PaletteMapping {
    pub fn from_invert(invert: bool) -> Self {
        if invert {
            Self::BrightIsDense
        } else {
            Self::DarkIsDense
        }
    }

    pub fn glyph_for_pixel(self, r: u8, g: u8, b: u8) -> char {
        // Integer luma keeps pure white on the last bucket.
        let millis = luma_millis(r, g, b) as u64;
        let index = (millis * LAST_INDEX as u64 / 255_000) as usize;
        GLYPH_PALETTE[self.orient(index.min(LAST_INDEX))]
    }

    pub fn glyph_for_brightness(self, brightness: f32) -> char {
        GLYPH_PALETTE[self.index_for_brightness(brightness)]
    }

    pub fn index_for_brightness(self, brightness: f32) -> usize {
        let scaled = (brightness / 255.0 * LAST_INDEX as f32).floor();
        self.orient((scaled.max(0.0) as usize).min(LAST_INDEX))
    }

    fn orient(self, index: usize) -> usize {
        match self {
            Self::DarkIsDense => index,
            Self::BrightIsDense => LAST_INDEX - index,
        }
    }
}

/// Luma in `[0, 255]`; alpha is ignored.
pub fn brightness(r: u8, g: u8, b: u8) -> f32 {
    luma_millis(r, g, b) as f32 / 1000.0
}

/// `1000 * (0.299 R + 0.587 G + 0.114 B)`, exact.
fn luma_millis(r: u8, g: u8, b: u8) -> u32 {
    299 * r as u32 + 587 * g as u32 + 114 * b as u32
}

pub fn is_palette_glyph(glyph: char) -> bool {
    GLYPH_PALETTE.contains(&glyph)
}
