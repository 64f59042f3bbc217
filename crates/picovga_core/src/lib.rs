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

    PicoVGA core library

    3-bit color VGA output generated by PIO state machines and fed by a
    self re-arming DMA chain, with drawing and text on the packed
    framebuffer, and a cycle-level model of the RP2040 blocks involved.

*/

pub mod bus;
pub mod clock;
pub mod color;
pub mod devices;
pub mod driver;
pub mod error;
pub mod font;
pub mod framebuffer;
pub mod machine;
pub mod mode;
pub mod text;

pub use bus::VideoHardware;
pub use color::Color;
pub use driver::{Vga, VgaConfig};
pub use error::VgaError;
pub use framebuffer::Framebuffer;
pub use machine::Rp2040;
pub use mode::{VgaPins, VideoMode};
