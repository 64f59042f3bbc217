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

    devices::pio::irq.rs

    The eight PIO interrupt flags shared by the state machines of one block.

    A flag is raised by one state machine and consumed by a waiting one.
    Raising a flag that is already set has no further effect; there is no
    queue behind a flag.

*/

pub const IRQ_FLAG_COUNT: u8 = 8;

/// Flag raised by the horizontal sequencer at the end of every scanline.
pub const IRQ_LINE_END: u8 = 0;
/// Flag raised by the vertical sequencer for every visible scanline.
pub const IRQ_LINE_ACTIVE: u8 = 1;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IrqFlags(u8);

impl IrqFlags {
    pub fn new() -> Self {
        Self(0)
    }

    #[inline]
    pub fn raise(&mut self, flag: u8) {
        self.0 |= 1 << (flag % IRQ_FLAG_COUNT);
    }

    #[inline]
    pub fn is_set(&self, flag: u8) -> bool {
        self.0 & (1 << (flag % IRQ_FLAG_COUNT)) != 0
    }

    /// `wait 1 irq n`: returns true and clears the flag if it was set.
    #[inline]
    pub fn consume(&mut self, flag: u8) -> bool {
        let set = self.is_set(flag);
        self.0 &= !(1 << (flag % IRQ_FLAG_COUNT));
        set
    }

    /// IRQ register write: each 1 bit clears the corresponding flag.
    pub fn write_clear(&mut self, mask: u32) {
        self.0 &= !(mask as u8);
    }

    pub fn bits(&self) -> u32 {
        self.0 as u32
    }
}
