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

    error.rs

    Error type for driver initialization and framebuffer construction.

*/

use thiserror::Error;

use crate::mode::VgaPins;

/// Errors reported by the video driver.
///
/// Everything here is a configuration or startup failure. Drawing never
/// fails: out-of-range coordinates are clamped, and a stalled transfer
/// simply waits for its consumer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VgaError {
    #[error("System clock of {requested_hz} Hz is out of range. Clock speed must be set between 100MHz and 250MHz")]
    ClockOutOfRange { requested_hz: u32 },
    #[error("System clock of {sys_hz} Hz is too slow to drive a {pixel_hz} Hz pixel clock")]
    ClockTooSlow { sys_hz: u32, pixel_hz: u32 },
    #[error(
        "Horizontal resolution {h_res} at {bits_per_pixel} bits per pixel does not divide into {usable_bits}-bit words"
    )]
    MisalignedMode {
        h_res: u32,
        bits_per_pixel: u32,
        usable_bits: u32,
    },
    #[error("Invalid video timing: {0}")]
    InvalidTiming(String),
    #[error("Invalid pin assignment {pins:?}: {reason}")]
    InvalidPins { pins: VgaPins, reason: &'static str },
    #[error("Out of memory: requested {requested} words, {available} available")]
    OutOfMemory { requested: usize, available: usize },
    #[error("Framebuffer slice has {actual} words, mode requires {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("No such sequencer unit: {0}")]
    NoSuchSequencer(usize),
}
