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

    text.rs

    Cursor-based text output onto a Framebuffer.

*/

use crate::{color::Color, font::Font, framebuffer::Framebuffer};

/// Text cursor, color and font. Owned by the caller; nothing here is global.
pub struct TextRenderer<'f> {
    font: &'f Font,
    x: i32,
    y: i32,
    color: Color,
}

impl<'f> TextRenderer<'f> {
    pub fn new(font: &'f Font) -> Self {
        Self {
            font,
            x: 0,
            y: 0,
            color: Color::White,
        }
    }

    pub fn set_cursor(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub fn cursor(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_font(&mut self, font: &'f Font) {
        self.font = font;
    }

    pub fn font(&self) -> &Font {
        self.font
    }

    fn new_line(&mut self) {
        self.x = 0;
        self.y += self.font.line_advance() as i32;
    }

    /// Print `text` at the cursor. A newline returns to column 0 on the next
    /// line; a character that leaves the cursor past the right edge does the
    /// same after it is drawn.
    pub fn print_text(&mut self, fb: &mut Framebuffer, text: &str) {
        let right_edge = fb.width() as i32 - 1;
        for c in text.chars() {
            if c == '\n' {
                self.new_line();
                continue;
            }
            self.draw_char(fb, c);
            if self.x > right_edge {
                self.new_line();
            }
        }
    }

    /// Draw one glyph at the cursor and advance by its x advance. Characters
    /// the font does not have are skipped without moving the cursor.
    pub fn draw_char(&mut self, fb: &mut Framebuffer, c: char) {
        let Some(glyph) = self.font.glyph(c) else {
            log::trace!("draw_char(): no glyph for {:?}", c);
            return;
        };
        let width = glyph.width as i32;
        let height = glyph.height as i32;
        let origin_x = self.x + glyph.x_offset as i32;
        let origin_y = self.y + glyph.y_offset as i32;

        let mut col = 0;
        let mut row = 0;
        'bytes: for byte in self.font.glyph_bitmap(glyph) {
            for bit in (0..8).rev() {
                if row == height {
                    break 'bytes;
                }
                if byte & (1 << bit) != 0 {
                    let (x, y) = (origin_x + col, origin_y + row);
                    if fb.mode().contains(x, y) {
                        fb.set_pixel(x as u32, y as u32, self.color);
                    }
                }
                col += 1;
                if col == width {
                    col = 0;
                    row += 1;
                }
            }
        }

        self.x += glyph.x_advance as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{color::*, font::Glyph, mode::VideoMode};
    use std::collections::HashSet;

    const MODE: VideoMode = VideoMode::VGA_640X480;

    fn lit(fb: &Framebuffer) -> HashSet<(u32, u32)> {
        let mut set = HashSet::new();
        for y in 0..fb.height() {
            for x in 0..fb.width() {
                if fb.pixel(x, y) != BLACK {
                    set.insert((x, y));
                }
            }
        }
        set
    }

    /// One 3x2 glyph for '!' with bits 101 / 011 packed across a byte boundary.
    fn tiny_font() -> Font {
        let glyph = Glyph {
            bitmap_offset: 0,
            width: 3,
            height: 2,
            x_advance: 4,
            x_offset: 1,
            y_offset: -1,
        };
        Font::new(vec![0b1010_1100], vec![Glyph::default(), glyph], 5, 1)
    }

    #[test]
    fn draw_char_decodes_msb_first() {
        let font = tiny_font();
        let mut words = vec![0u32; MODE.word_count()];
        let mut fb = Framebuffer::new(MODE, &mut words).unwrap();
        let mut text = TextRenderer::new(&font);
        text.set_color(GREEN);
        text.set_cursor(10, 20);

        text.draw_char(&mut fb, '!');

        assert_eq!(lit(&fb), HashSet::from([(11, 19), (13, 19), (12, 20), (13, 20)]));
        assert_eq!(fb.pixel(11, 19), GREEN);
        assert_eq!(text.cursor(), (14, 20));
    }

    #[test]
    fn missing_glyph_is_skipped() {
        let font = tiny_font();
        let mut words = vec![0u32; MODE.word_count()];
        let mut fb = Framebuffer::new(MODE, &mut words).unwrap();
        let mut text = TextRenderer::new(&font);
        text.draw_char(&mut fb, 'Z');
        text.draw_char(&mut fb, '\u{1}');
        assert!(lit(&fb).is_empty());
        assert_eq!(text.cursor(), (0, 0));
    }

    #[test]
    fn newline_and_wrap_advance_lines() {
        let font = Font::font8x8();
        let mut words = vec![0u32; MODE.word_count()];
        let mut fb = Framebuffer::new(MODE, &mut words).unwrap();
        let mut text = TextRenderer::new(&font);

        text.set_cursor(40, 20);
        text.print_text(&mut fb, "ab\ncd");
        assert_eq!(text.cursor(), (16, 30));

        // Two glyphs from x = 624 reach 640 and wrap.
        text.set_cursor(624, 100);
        text.print_text(&mut fb, "xy");
        assert_eq!(text.cursor(), (0, 110));
    }

    #[test]
    fn glyphs_clip_at_screen_edges() {
        let font = Font::font8x8();
        let mut words = vec![0u32; MODE.word_count()];
        let mut fb = Framebuffer::new(MODE, &mut words).unwrap();
        let mut text = TextRenderer::new(&font);
        text.set_cursor(-4, 3);
        text.print_text(&mut fb, "MM");
        text.set_cursor(636, 482);
        text.print_text(&mut fb, "M");
        assert!(lit(&fb).iter().all(|&(x, y)| x < 640 && y < 480));
        assert!(!lit(&fb).is_empty());
    }

    #[test]
    fn font8x8_text_lands_above_baseline() {
        let font = Font::font8x8();
        let mut words = vec![0u32; MODE.word_count()];
        let mut fb = Framebuffer::new(MODE, &mut words).unwrap();
        let mut text = TextRenderer::new(&font);
        text.set_color(CYAN);
        text.set_cursor(100, 50);
        text.print_text(&mut fb, "H");

        let points = lit(&fb);
        assert!(!points.is_empty());
        assert!(points.iter().all(|&(x, y)| (100..108).contains(&x) && (43..=50).contains(&y)));
    }
}
