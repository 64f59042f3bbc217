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

    mode.rs

    Video mode parameters and the packed pixel address function.

    Pixels are packed 3 bits at a time into the low 30 bits of each 32-bit
    word, ten pixels per word, first pixel in the least significant bits.
    The color generator shifts words out LSB first with a 30-bit autopull
    threshold, so the two high bits of every word are never displayed.

    The color generator's output shift register already holds the next word
    by the time a given word reaches the pins. Its very first word is the
    line counter it was loaded with, so the stream it displays runs one word
    behind the buffer: the pixel group at linear word offset `q` is shown
    from buffer word `q - 1`, and group 0 from the final buffer word.
    pixel_address() encodes exactly that.

*/

use serde_derive::Deserialize;

use crate::error::VgaError;

pub const BITS_PER_PIXEL: u32 = 3;
pub const PIXEL_MASK: u32 = 0b111;
/// Largest multiple of BITS_PER_PIXEL that fits in a 32-bit transfer word.
pub const USABLE_BITS: u32 = 30;
pub const USABLE_MASK: u32 = (1 << USABLE_BITS) - 1;
pub const PIXELS_PER_WORD: u32 = USABLE_BITS / BITS_PER_PIXEL;

/// GPIO0..GPIO29 are bonded out on the RP2040.
pub const GPIO_COUNT: u32 = 30;

// The vertical program counts its porches with 5-bit `set` immediates.
const VSYNC_FRONT_PORCH_MAX: u32 = 32;
const VSYNC_BACK_PORCH_MAX: u32 = 33;

/// One axis of a video timing: the visible region followed by the three
/// blanking regions. Horizontal values are in pixel clocks, vertical values
/// in lines.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Timing {
    pub visible: u32,
    pub front_porch: u32,
    pub sync: u32,
    pub back_porch: u32,
}

impl Timing {
    pub const fn new(visible: u32, front_porch: u32, sync: u32, back_porch: u32) -> Self {
        Self {
            visible,
            front_porch,
            sync,
            back_porch,
        }
    }

    #[inline]
    pub const fn total(&self) -> u32 {
        self.visible + self.front_porch + self.sync + self.back_porch
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct VideoMode {
    pub horizontal: Timing,
    pub vertical: Timing,
    pub pixel_clock_hz: u32,
}

impl VideoMode {
    /// Industry standard 640x480 @ 60Hz.
    ///
    /// | Scanline part | Pixels | Time [us] |
    /// |---------------|--------|-----------|
    /// | Visible area  | 640    | 25.4220   |
    /// | Front porch   | 16     | 0.6355    |
    /// | Sync pulse    | 96     | 3.8133    |
    /// | Back porch    | 48     | 1.9066    |
    /// | Whole line    | 800    | 31.7775   |
    pub const VGA_640X480: VideoMode = VideoMode {
        horizontal: Timing::new(640, 16, 96, 48),
        vertical: Timing::new(480, 10, 2, 33),
        pixel_clock_hz: 25_175_000,
    };

    #[inline]
    pub const fn h_res(&self) -> u32 {
        self.horizontal.visible
    }

    #[inline]
    pub const fn v_res(&self) -> u32 {
        self.vertical.visible
    }

    /// Number of words in the packed framebuffer.
    #[inline]
    pub const fn word_count(&self) -> usize {
        (self.h_res() as usize * self.v_res() as usize * BITS_PER_PIXEL as usize) / USABLE_BITS as usize
    }

    /// Word stride between vertically adjacent pixels.
    #[inline]
    pub const fn words_per_row(&self) -> usize {
        (self.h_res() * BITS_PER_PIXEL / USABLE_BITS) as usize
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.h_res() && (y as u32) < self.v_res()
    }

    /// Map a pixel coordinate to its (word index, bit offset) in the packed
    /// framebuffer, including the one-word pipeline latency correction.
    ///
    /// Coordinates are not range checked. Out of range values produce a word
    /// index that may lie outside the framebuffer or in another row.
    #[inline]
    pub fn pixel_address(&self, x: u32, y: u32) -> (usize, u32) {
        let n = y as usize * (self.h_res() as usize * BITS_PER_PIXEL as usize) + x as usize * BITS_PER_PIXEL as usize;
        let q = n / USABLE_BITS as usize;
        let p = (n % USABLE_BITS as usize) as u32;
        let k = if q > 0 { q - 1 } else { self.word_count() - 1 };
        (k, p)
    }

    pub fn line_rate_hz(&self) -> f64 {
        self.pixel_clock_hz as f64 / self.horizontal.total() as f64
    }

    pub fn frame_rate_hz(&self) -> f64 {
        self.line_rate_hz() / self.vertical.total() as f64
    }

    /// Check the mode against the packing and sequencer constraints.
    pub fn validate(&self) -> Result<(), VgaError> {
        if (self.h_res() * BITS_PER_PIXEL) % USABLE_BITS != 0 {
            return Err(VgaError::MisalignedMode {
                h_res: self.h_res(),
                bits_per_pixel: BITS_PER_PIXEL,
                usable_bits: USABLE_BITS,
            });
        }
        let h = &self.horizontal;
        let v = &self.vertical;
        if h.visible == 0 || v.visible == 0 {
            return Err(VgaError::InvalidTiming("visible area is empty".to_string()));
        }
        if self.pixel_clock_hz == 0 {
            return Err(VgaError::InvalidTiming("pixel clock is zero".to_string()));
        }
        if h.sync == 0 {
            return Err(VgaError::InvalidTiming("horizontal sync pulse is empty".to_string()));
        }
        // The line counter reload and the end-of-line irq each take a cycle of the back porch.
        if h.back_porch < 2 {
            return Err(VgaError::InvalidTiming(format!(
                "horizontal back porch of {} cycles is shorter than 2",
                h.back_porch
            )));
        }
        if v.sync == 0 {
            return Err(VgaError::InvalidTiming("vertical sync pulse is empty".to_string()));
        }
        if v.front_porch == 0 || v.front_porch > VSYNC_FRONT_PORCH_MAX {
            return Err(VgaError::InvalidTiming(format!(
                "vertical front porch of {} lines is outside 1..={}",
                v.front_porch, VSYNC_FRONT_PORCH_MAX
            )));
        }
        if v.back_porch < 2 || v.back_porch > VSYNC_BACK_PORCH_MAX {
            return Err(VgaError::InvalidTiming(format!(
                "vertical back porch of {} lines is outside 2..={}",
                v.back_porch, VSYNC_BACK_PORCH_MAX
            )));
        }
        Ok(())
    }
}

impl Default for VideoMode {
    fn default() -> Self {
        VideoMode::VGA_640X480
    }
}

/// GPIO assignment of the VGA connector.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VgaPins {
    /// First of three consecutive color pins: red, green, blue.
    pub color_base: u32,
    pub hsync: u32,
    pub vsync: u32,
}

impl VgaPins {
    /// Check that every signal has a pin of its own on the chip.
    pub fn validate(&self) -> Result<(), VgaError> {
        let invalid = |reason: &'static str| -> Result<(), VgaError> {
            Err(VgaError::InvalidPins { pins: *self, reason })
        };
        if self.color_base.saturating_add(2) >= GPIO_COUNT || self.hsync >= GPIO_COUNT || self.vsync >= GPIO_COUNT {
            return invalid("outside GPIO0-29");
        }
        let colors = self.color_base..self.color_base + 3;
        if colors.contains(&self.hsync) || colors.contains(&self.vsync) || self.hsync == self.vsync {
            return invalid("two signals share a pin");
        }
        Ok(())
    }
}

impl Default for VgaPins {
    fn default() -> Self {
        Self {
            color_base: 0,
            hsync: 4,
            vsync: 5,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A small mode that keeps the machine tests fast.
    pub(crate) const TINY_MODE: VideoMode = VideoMode {
        horizontal: Timing::new(20, 4, 4, 4),
        vertical: Timing::new(6, 1, 1, 2),
        pixel_clock_hz: 25_175_000,
    };

    #[test]
    fn vga_mode_constants() {
        let mode = VideoMode::VGA_640X480;
        assert_eq!(mode.horizontal.total(), 800);
        assert_eq!(mode.vertical.total(), 525);
        assert_eq!(mode.word_count(), 30720);
        assert_eq!(mode.words_per_row(), 64);
        assert_eq!(PIXELS_PER_WORD, 10);
        assert!((mode.line_rate_hz() - 31_468.75).abs() < 0.01);
        assert!((mode.frame_rate_hz() - 59.94).abs() < 0.01);
        assert!(mode.validate().is_ok());
        assert!(TINY_MODE.validate().is_ok());
    }

    #[test]
    fn pixel_address_regression() {
        // Pinned values. Group 0 of the frame comes from the last word.
        let mode = VideoMode::VGA_640X480;
        assert_eq!(mode.pixel_address(0, 0), (30719, 0));
        assert_eq!(mode.pixel_address(9, 0), (30719, 27));
        assert_eq!(mode.pixel_address(10, 0), (0, 0));
        assert_eq!(mode.pixel_address(11, 0), (0, 3));
        assert_eq!(mode.pixel_address(639, 0), (62, 27));
        assert_eq!(mode.pixel_address(0, 1), (63, 0));
        assert_eq!(mode.pixel_address(320, 240), (15391, 0));
        assert_eq!(mode.pixel_address(639, 479), (30718, 27));
    }

    #[test]
    fn pin_assignments() {
        assert!(VgaPins::default().validate().is_ok());
        assert!(VgaPins { color_base: 27, hsync: 0, vsync: 1 }.validate().is_ok());

        let out_of_range = [
            VgaPins { color_base: 28, hsync: 0, vsync: 1 },
            VgaPins { hsync: 40, ..Default::default() },
            VgaPins { vsync: 30, ..Default::default() },
            VgaPins { color_base: u32::MAX, ..Default::default() },
        ];
        for pins in out_of_range {
            assert!(
                matches!(pins.validate(), Err(VgaError::InvalidPins { reason: "outside GPIO0-29", .. })),
                "{:?}",
                pins
            );
        }

        let shared = [
            VgaPins { color_base: 2, hsync: 4, vsync: 5 },
            VgaPins { color_base: 0, hsync: 6, vsync: 6 },
            VgaPins { color_base: 5, hsync: 4, vsync: 5 },
        ];
        for pins in shared {
            assert!(
                matches!(pins.validate(), Err(VgaError::InvalidPins { reason: "two signals share a pin", .. })),
                "{:?}",
                pins
            );
        }
    }

    #[test]
    fn misaligned_mode_rejected() {
        let mut mode = VideoMode::VGA_640X480;
        mode.horizontal.visible = 645;
        assert!(matches!(mode.validate(), Err(VgaError::MisalignedMode { h_res: 645, .. })));
    }

    #[test]
    fn bad_timings_rejected() {
        let mut mode = VideoMode::VGA_640X480;
        mode.vertical.front_porch = 40;
        assert!(matches!(mode.validate(), Err(VgaError::InvalidTiming(_))));

        let mut mode = VideoMode::VGA_640X480;
        mode.vertical.visible = 0;
        assert!(matches!(mode.validate(), Err(VgaError::InvalidTiming(_))));

        let mut mode = VideoMode::VGA_640X480;
        mode.horizontal.back_porch = 1;
        assert!(matches!(mode.validate(), Err(VgaError::InvalidTiming(_))));
    }
}
