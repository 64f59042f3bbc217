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

    devices::monitor.rs

    A display attached to the GPIO pins. Samples the pins once per system
    clock, measures the sync timing it sees and rebuilds each frame from the
    pixels strobed onto the color pins.

    Rows end on the falling edge of hsync, frames on the falling edge of
    vsync. Only the most recent frames are held.

*/

use std::collections::VecDeque;

use crate::{color::Color, mode::VgaPins};

pub const MAX_HELD_FRAMES: usize = 4;

/// Timing seen at the connector. Horizontal values are in system clocks,
/// vertical values in lines (hsync pulses).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanTiming {
    pub line_period_ticks: Option<u64>,
    pub hsync_width_ticks: Option<u64>,
    pub lines_per_frame: Option<u32>,
    pub vsync_width_lines: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedFrame {
    /// 1-based count of frames completed since power on.
    pub index: u64,
    pub rows: Vec<Vec<Color>>,
}

impl CapturedFrame {
    pub fn width(&self) -> u32 {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32
    }

    pub fn height(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.rows.get(y as usize)?.get(x as usize).copied()
    }

    /// Packed RGB8 pixels, rows padded with black to the widest row.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let width = self.width() as usize;
        let mut out = Vec::with_capacity(width * self.rows.len() * 3);
        for row in &self.rows {
            for x in 0..width {
                out.extend_from_slice(&row.get(x).copied().unwrap_or(Color::Black).to_rgb());
            }
        }
        out
    }
}

pub struct Monitor {
    pins: VgaPins,
    last_gpio: Option<u32>,
    last_hsync_fall: Option<u64>,
    seen_vsync_fall: bool,
    lines_since_vsync: u32,
    in_vsync: bool,
    lines_in_vsync: u32,
    row: Vec<Color>,
    rows: Vec<Vec<Color>>,
    frames: VecDeque<CapturedFrame>,
    frames_completed: u64,
    timing: ScanTiming,
}

impl Monitor {
    pub fn new(pins: VgaPins) -> Self {
        Self {
            pins,
            last_gpio: None,
            last_hsync_fall: None,
            seen_vsync_fall: false,
            lines_since_vsync: 0,
            in_vsync: false,
            lines_in_vsync: 0,
            row: Vec::new(),
            rows: Vec::new(),
            frames: VecDeque::with_capacity(MAX_HELD_FRAMES),
            frames_completed: 0,
            timing: ScanTiming::default(),
        }
    }

    pub fn pins(&self) -> VgaPins {
        self.pins
    }

    pub fn timing(&self) -> ScanTiming {
        self.timing
    }

    pub fn frames_completed(&self) -> u64 {
        self.frames_completed
    }

    pub fn last_frame(&self) -> Option<&CapturedFrame> {
        self.frames.back()
    }

    /// A held frame by its index, if it has not been discarded yet.
    pub fn frame(&self, index: u64) -> Option<&CapturedFrame> {
        self.frames.iter().find(|f| f.index == index)
    }

    /// Sample the pins at system clock `tick`. `strobe` is set on clocks
    /// where the color sequencer drove a new pixel.
    pub fn sample(&mut self, tick: u64, gpio: u32, strobe: Option<u32>) {
        if strobe.is_some() {
            self.row.push(Color::from_bits(gpio >> self.pins.color_base));
        }

        let last = self.last_gpio.replace(gpio).unwrap_or(gpio);
        let hsync = (last >> self.pins.hsync & 1, gpio >> self.pins.hsync & 1);
        let vsync = (last >> self.pins.vsync & 1, gpio >> self.pins.vsync & 1);

        match hsync {
            (1, 0) => self.hsync_fall(tick),
            (0, 1) => {
                if let Some(fall) = self.last_hsync_fall {
                    self.timing.hsync_width_ticks = Some(tick - fall);
                }
            }
            _ => {}
        }
        match vsync {
            (1, 0) => self.vsync_fall(),
            (0, 1) if self.in_vsync => {
                self.timing.vsync_width_lines = Some(self.lines_in_vsync);
                self.in_vsync = false;
            }
            _ => {}
        }
    }

    fn hsync_fall(&mut self, tick: u64) {
        if let Some(prev) = self.last_hsync_fall {
            self.timing.line_period_ticks = Some(tick - prev);
        }
        self.last_hsync_fall = Some(tick);
        self.lines_since_vsync += 1;
        if self.in_vsync {
            self.lines_in_vsync += 1;
        }
        if !self.row.is_empty() {
            self.rows.push(std::mem::take(&mut self.row));
        }
    }

    fn vsync_fall(&mut self) {
        if self.seen_vsync_fall {
            self.timing.lines_per_frame = Some(self.lines_since_vsync);
        }
        self.seen_vsync_fall = true;
        self.lines_since_vsync = 0;
        self.in_vsync = true;
        self.lines_in_vsync = 0;

        if !self.row.is_empty() {
            self.rows.push(std::mem::take(&mut self.row));
        }
        self.frames_completed += 1;
        let frame = CapturedFrame {
            index: self.frames_completed,
            rows: std::mem::take(&mut self.rows),
        };
        log::trace!(
            "monitor: frame {} complete, {}x{}",
            frame.index,
            frame.width(),
            frame.height()
        );
        if self.frames.len() == MAX_HELD_FRAMES {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }
}
