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

    framebuffer.rs

    A view over the packed 3bpp framebuffer words. The words themselves
    belong to whoever allocated them (the video driver, in SRAM); a
    Framebuffer borrows them for drawing.

    Nothing here synchronizes with the DMA engine reading the same words.
    A frame in flight may show part of an update.

*/

mod draw;

use crate::{
    color::Color,
    error::VgaError,
    mode::{VideoMode, BITS_PER_PIXEL, PIXELS_PER_WORD, PIXEL_MASK},
};

/// A word holding PIXELS_PER_WORD copies of `color`.
#[inline]
pub fn tiling_word(color: Color) -> u32 {
    tiling_mask(color.bits(), 0, PIXELS_PER_WORD)
}

/// Pixels `first..last` of a word set to `bits`, everything else zero.
#[inline]
pub(crate) fn tiling_mask(bits: u32, first: u32, last: u32) -> u32 {
    let mut mask = 0;
    for i in first..last {
        mask |= bits << (BITS_PER_PIXEL * i);
    }
    mask
}

pub struct Framebuffer<'a> {
    mode:  VideoMode,
    words: &'a mut [u32],
}

impl<'a> Framebuffer<'a> {
    pub fn new(mode: VideoMode, words: &'a mut [u32]) -> Result<Self, VgaError> {
        mode.validate()?;
        if words.len() != mode.word_count() {
            return Err(VgaError::BufferSize {
                expected: mode.word_count(),
                actual:   words.len(),
            });
        }
        Ok(Self { mode, words })
    }

    #[inline]
    pub fn mode(&self) -> &VideoMode {
        &self.mode
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.mode.h_res()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.mode.v_res()
    }

    #[inline]
    pub fn words(&self) -> &[u32] {
        self.words
    }

    /// Set one pixel with a read-modify-write of its word.
    ///
    /// Coordinates are not clamped. An out of range coordinate lands on some
    /// other pixel, or nowhere if its word lies past the end of the buffer.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        let (k, p) = self.mode.pixel_address(x, y);
        if let Some(word) = self.words.get_mut(k) {
            *word = (*word & !(PIXEL_MASK << p)) | (color.bits() << p);
        }
    }

    /// Read back one pixel. Returns Black for coordinates outside the buffer.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let (k, p) = self.mode.pixel_address(x, y);
        match self.words.get(k) {
            Some(word) => Color::from_bits(*word >> p),
            None => Color::Black,
        }
    }

    /// Set every pixel to `color`, one word at a time.
    pub fn fill_all(&mut self, color: Color) {
        self.words.fill(tiling_word(color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{color::*, mode::USABLE_MASK};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use strum::IntoEnumIterator;

    fn buffer(mode: &VideoMode) -> Vec<u32> {
        vec![0; mode.word_count()]
    }

    #[test]
    fn tiling_word_layout() {
        assert_eq!(tiling_word(WHITE), USABLE_MASK);
        assert_eq!(tiling_word(BLACK), 0);
        assert_eq!(tiling_word(RED), 0b001_001_001_001_001_001_001_001_001_001);
        assert_eq!(tiling_mask(0b111, 8, 10), 0b111_111 << 24);
    }

    #[test]
    fn wrong_length_rejected() {
        let mode = VideoMode::VGA_640X480;
        let mut words = vec![0; 100];
        assert!(matches!(
            Framebuffer::new(mode, &mut words),
            Err(VgaError::BufferSize { expected: 30720, actual: 100 })
        ));
    }

    #[test]
    fn set_pixel_touches_only_its_bits() {
        let mode = VideoMode::VGA_640X480;
        let mut words = buffer(&mode);
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for w in words.iter_mut() {
            *w = rng.random();
        }
        let mut fb = Framebuffer::new(mode, &mut words).unwrap();

        for _ in 0..5000 {
            let x = rng.random_range(0..mode.h_res());
            let y = rng.random_range(0..mode.v_res());
            let color = Color::from_bits(rng.random_range(0..8));
            let (k, p) = mode.pixel_address(x, y);
            let before = fb.words()[k];

            fb.set_pixel(x, y, color);

            let after = fb.words()[k];
            assert_eq!((after >> p) & PIXEL_MASK, color.bits());
            assert_eq!(after & !(PIXEL_MASK << p), before & !(PIXEL_MASK << p));
            assert_eq!(fb.pixel(x, y), color);
        }
    }

    #[test]
    fn set_pixel_is_idempotent() {
        let mode = VideoMode::VGA_640X480;
        let mut once = buffer(&mode);
        let mut twice = buffer(&mode);
        let points = [(0, 0), (9, 0), (10, 0), (639, 479), (320, 240), (17, 33)];
        {
            let mut fb = Framebuffer::new(mode, &mut once).unwrap();
            for &(x, y) in &points {
                fb.set_pixel(x, y, MAGENTA);
            }
        }
        {
            let mut fb = Framebuffer::new(mode, &mut twice).unwrap();
            for &(x, y) in &points {
                fb.set_pixel(x, y, MAGENTA);
                fb.set_pixel(x, y, MAGENTA);
            }
        }
        assert_eq!(once, twice);
    }

    #[test]
    fn fill_all_reads_back_everywhere() {
        let mode = VideoMode::VGA_640X480;
        let mut words = buffer(&mode);
        let mut fb = Framebuffer::new(mode, &mut words).unwrap();
        for color in Color::iter() {
            fb.fill_all(color);
            for y in 0..mode.v_res() {
                for x in 0..mode.h_res() {
                    assert_eq!(fb.pixel(x, y), color);
                }
            }
        }
    }

    #[test]
    fn first_group_lives_in_last_word() {
        let mode = VideoMode::VGA_640X480;
        let mut words = buffer(&mode);
        let mut fb = Framebuffer::new(mode, &mut words).unwrap();
        fb.set_pixel(0, 0, WHITE);
        fb.set_pixel(10, 0, GREEN);
        assert_eq!(words[mode.word_count() - 1], 0b111);
        assert_eq!(words[0], 0b010);
    }

    #[test]
    fn out_of_range_pixel_does_not_panic() {
        let mode = VideoMode::VGA_640X480;
        let mut words = buffer(&mode);
        let mut fb = Framebuffer::new(mode, &mut words).unwrap();
        fb.set_pixel(0, 10_000, RED);
        assert_eq!(fb.pixel(0, 10_000), BLACK);
        fb.set_pixel(u32::MAX, 0, RED);
        fb.set_pixel(u32::MAX, u32::MAX, RED);
        assert_eq!(fb.pixel(u32::MAX, u32::MAX), BLACK);
        assert!(words.iter().all(|w| *w == 0));
    }

    #[test]
    fn empty_mode_rejected() {
        let mut mode = VideoMode::VGA_640X480;
        mode.horizontal.visible = 0;
        let mut words = Vec::new();
        assert!(matches!(Framebuffer::new(mode, &mut words), Err(VgaError::InvalidTiming(_))));

        let mut mode = VideoMode::VGA_640X480;
        mode.vertical.visible = 0;
        assert!(matches!(Framebuffer::new(mode, &mut words), Err(VgaError::InvalidTiming(_))));
    }
}
