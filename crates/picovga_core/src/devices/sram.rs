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

    devices::sram.rs

    Word-addressed SRAM with a bump allocator. Allocations are never freed;
    the video buffers live for the whole session.

*/

use crate::error::VgaError;

pub const SRAM_BASE: u32 = 0x2000_0000;
/// 264 KiB
pub const SRAM_DEFAULT_WORDS: usize = 264 * 1024 / 4;

pub struct Sram {
    words: Vec<u32>,
    next: usize,
}

impl Sram {
    pub fn new(size_words: usize) -> Self {
        Self {
            words: vec![0; size_words],
            next: 0,
        }
    }

    pub fn size_words(&self) -> usize {
        self.words.len()
    }

    pub fn free_words(&self) -> usize {
        self.words.len() - self.next
    }

    /// Claim `count` zeroed words, returning their bus address.
    pub fn alloc(&mut self, count: usize) -> Result<u32, VgaError> {
        if count > self.free_words() {
            return Err(VgaError::OutOfMemory {
                requested: count,
                available: self.free_words(),
            });
        }
        let start = self.next;
        self.next += count;
        self.words[start..self.next].fill(0);
        let address = SRAM_BASE + (start * 4) as u32;
        log::debug!("SRAM: allocated {} words at {:08X}, {} free", count, address, self.free_words());
        Ok(address)
    }

    #[inline]
    pub fn contains(&self, address: u32) -> bool {
        address >= SRAM_BASE && ((address - SRAM_BASE) / 4) < self.words.len() as u32
    }

    fn index(&self, address: u32) -> Option<usize> {
        self.contains(address).then(|| ((address - SRAM_BASE) / 4) as usize)
    }

    pub fn read_u32(&self, address: u32) -> u32 {
        self.index(address).map_or(0, |i| self.words[i])
    }

    pub fn write_u32(&mut self, address: u32, data: u32) {
        if let Some(i) = self.index(address) {
            self.words[i] = data;
        }
    }

    pub fn words(&self, address: u32, count: usize) -> Option<&[u32]> {
        let start = self.index(address)?;
        self.words.get(start..start.checked_add(count)?)
    }

    pub fn words_mut(&mut self, address: u32, count: usize) -> Option<&mut [u32]> {
        let start = self.index(address)?;
        self.words.get_mut(start..start.checked_add(count)?)
    }
}

impl Default for Sram {
    fn default() -> Self {
        Sram::new(SRAM_DEFAULT_WORDS)
    }
}
