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

    bus.rs

    The hardware surface the video driver is written against.

*/

use crate::{devices::pio::SequencerProgram, error::VgaError};

/// Register access, memory and sequencer program loading for the video
/// driver. Rp2040 implements this over its device models; a port to real
/// silicon would implement it with volatile register access.
pub trait VideoHardware {
    fn read_u32(&mut self, address: u32) -> u32;
    fn write_u32(&mut self, address: u32, data: u32);

    /// Allocate `count` zeroed words of RAM and return their bus address.
    /// Fails rather than returning a shorter block.
    fn alloc_words(&mut self, count: usize) -> Result<u32, VgaError>;

    fn words(&self, address: u32, count: usize) -> Option<&[u32]>;
    fn words_mut(&mut self, address: u32, count: usize) -> Option<&mut [u32]>;

    /// Install a program on sequencer unit `sm`, with its pins starting at `pin_base`.
    fn load_program(&mut self, sm: usize, program: SequencerProgram, pin_base: u32) -> Result<(), VgaError>;

    /// Read-modify-write helpers.
    fn set_bits(&mut self, address: u32, bits: u32) {
        let value = self.read_u32(address);
        self.write_u32(address, value | bits);
    }

    fn clear_bits(&mut self, address: u32, bits: u32) {
        let value = self.read_u32(address);
        self.write_u32(address, value & !bits);
    }
}
