/*
    PicoVGA

    Copyright 2024-2025 The PicoVGA Authors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    font.rs

    GFX-style bitmap fonts. A font is a flat 1bpp bitmap, MSB first and row
    major, plus a glyph table indexed by character code minus 0x20.

*/

use font8x8::UnicodeFonts;

pub const FIRST_CHAR: u32 = 0x20;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Glyph {
    /// Byte offset of the glyph's first row in the font bitmap.
    pub bitmap_offset: usize,
    pub width: u8,
    pub height: u8,
    pub x_advance: u8,
    pub x_offset: i8,
    pub y_offset: i8,
}

impl Glyph {
    /// Number of bitmap bytes covering `width * height` bits.
    pub fn byte_len(&self) -> usize {
        (self.width as usize * self.height as usize).div_ceil(8)
    }
}

#[derive(Clone, Debug)]
pub struct Font {
    bitmap: Vec<u8>,
    glyphs: Vec<Glyph>,
    char_height: u32,
    line_spacing: u32,
}

impl Font {
    pub fn new(bitmap: Vec<u8>, glyphs: Vec<Glyph>, char_height: u32, line_spacing: u32) -> Self {
        Self {
            bitmap,
            glyphs,
            char_height,
            line_spacing,
        }
    }

    /// The built-in 8x8 font covering printable ASCII.
    ///
    /// Glyphs hang above the cursor the way GFX fonts do: the cursor marks the
    /// baseline and row 7 of the glyph is drawn on it.
    pub fn font8x8() -> Self {
        let mut bitmap = Vec::with_capacity(95 * 8);
        let mut glyphs = Vec::with_capacity(95);

        for code in FIRST_CHAR..0x7f {
            let rows = char::from_u32(code)
                .and_then(|c| font8x8::BASIC_FONTS.get(c))
                .unwrap_or([0; 8]);

            glyphs.push(Glyph {
                bitmap_offset: bitmap.len(),
                width: 8,
                height: 8,
                x_advance: 8,
                x_offset: 0,
                y_offset: -7,
            });
            // font8x8 stores the leftmost pixel in bit 0.
            bitmap.extend(rows.iter().map(|row| row.reverse_bits()));
        }

        Self::new(bitmap, glyphs, 8, 2)
    }

    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        let index = (c as u32).checked_sub(FIRST_CHAR)?;
        self.glyphs.get(index as usize)
    }

    /// Bitmap bytes belonging to `glyph`, truncated at the end of the blob.
    pub fn glyph_bitmap(&self, glyph: &Glyph) -> &[u8] {
        let start = glyph.bitmap_offset.min(self.bitmap.len());
        let end = (glyph.bitmap_offset + glyph.byte_len()).min(self.bitmap.len());
        &self.bitmap[start..end]
    }

    #[inline]
    pub fn char_height(&self) -> u32 {
        self.char_height
    }

    #[inline]
    pub fn line_spacing(&self) -> u32 {
        self.line_spacing
    }

    /// Vertical distance between successive text lines.
    #[inline]
    pub fn line_advance(&self) -> u32 {
        self.char_height + self.line_spacing
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::font8x8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font8x8_covers_printable_ascii() {
        let font = Font::font8x8();
        for c in ' '..='~' {
            let glyph = font.glyph(c).unwrap();
            assert_eq!(font.glyph_bitmap(glyph).len(), 8);
        }
        assert!(font.glyph('\u{7f}').is_none());
        assert!(font.glyph('\n').is_none());
        assert_eq!(font.line_advance(), 10);
    }

    #[test]
    fn font8x8_is_msb_first() {
        let font = Font::font8x8();
        // 'I' in font8x8 is a centered bar; reversing the bits keeps it in columns 1..=4.
        let glyph = font.glyph('I').unwrap();
        let rows = font8x8::BASIC_FONTS.get('I').unwrap();
        for (packed, raw) in font.glyph_bitmap(glyph).iter().zip(rows.iter()) {
            for col in 0..8 {
                let left_to_right = (raw >> col) & 1;
                let msb_first = (packed >> (7 - col)) & 1;
                assert_eq!(left_to_right, msb_first);
            }
        }
        assert!(font.glyph_bitmap(font.glyph(' ').unwrap()).iter().all(|b| *b == 0));
    }

    #[test]
    fn glyph_byte_len_rounds_up() {
        let g = Glyph { width: 5, height: 7, ..Default::default() };
        assert_eq!(g.byte_len(), 5);
        let g = Glyph { width: 8, height: 8, ..Default::default() };
        assert_eq!(g.byte_len(), 8);
    }

    #[test]
    fn truncated_bitmap_does_not_panic() {
        let glyph = Glyph { bitmap_offset: 2, width: 8, height: 8, x_advance: 8, ..Default::default() };
        let font = Font::new(vec![0xff; 4], vec![glyph], 8, 0);
        assert_eq!(font.glyph_bitmap(font.glyph(' ').unwrap()).len(), 2);
    }
}
