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

    color.rs

    The eight colors of the 3-bit RGB output. Bit 0 drives the red pin,
    bit 1 green and bit 2 blue.

*/

use serde_derive::Deserialize;
use strum_macros::{Display, EnumIter, EnumString};

pub const COLOR_MASK: u32 = 0b111;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Display, EnumIter, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[repr(u8)]
pub enum Color {
    #[default]
    Black = 0b000,
    Red = 0b001,
    Green = 0b010,
    Yellow = 0b011,
    Blue = 0b100,
    Magenta = 0b101,
    Cyan = 0b110,
    White = 0b111,
}

pub const BLACK: Color = Color::Black;
pub const RED: Color = Color::Red;
pub const GREEN: Color = Color::Green;
pub const YELLOW: Color = Color::Yellow;
pub const BLUE: Color = Color::Blue;
pub const MAGENTA: Color = Color::Magenta;
pub const CYAN: Color = Color::Cyan;
pub const WHITE: Color = Color::White;

impl Color {
    /// Build a color from the low three bits of `bits`.
    pub const fn from_bits(bits: u32) -> Color {
        match bits & COLOR_MASK {
            0b000 => Color::Black,
            0b001 => Color::Red,
            0b010 => Color::Green,
            0b011 => Color::Yellow,
            0b100 => Color::Blue,
            0b101 => Color::Magenta,
            0b110 => Color::Cyan,
            _ => Color::White,
        }
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// Expand to 24-bit RGB as seen on the resistor DAC outputs.
    pub const fn to_rgb(self) -> [u8; 3] {
        let b = self as u8;
        [
            if b & 0b001 != 0 { 0xFF } else { 0 },
            if b & 0b010 != 0 { 0xFF } else { 0 },
            if b & 0b100 != 0 { 0xFF } else { 0 },
        ]
    }
}

impl From<u8> for Color {
    fn from(bits: u8) -> Self {
        Color::from_bits(bits as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn color_bits_round_trip() {
        for color in Color::iter() {
            assert_eq!(Color::from_bits(color.bits()), color);
        }
        assert_eq!(Color::from_bits(0b1_011), YELLOW);
    }

    #[test]
    fn color_names_parse() {
        assert_eq!(Color::from_str("magenta").unwrap(), MAGENTA);
        assert_eq!(Color::from_str("CYAN").unwrap(), CYAN);
        assert!(Color::from_str("orange").is_err());
        assert_eq!(WHITE.to_rgb(), [0xFF, 0xFF, 0xFF]);
        assert_eq!(BLUE.to_rgb(), [0, 0, 0xFF]);
    }
}
