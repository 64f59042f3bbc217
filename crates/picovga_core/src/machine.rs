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

    machine.rs

    The emulated RP2040 as far as video output is concerned: SRAM, PLL_SYS,
    the DMA controller, PIO0, the GPIO pins and a monitor on those pins.

    One call to tick() is one system clock. Within a clock the PIO state
    machines run first (each on its own divided clock), then the DMA
    controller performs at most one transfer, then the monitor samples
    the pins.

*/

use crate::{
    bus::VideoHardware,
    devices::{
        dma::{Dma, DMA_BASE},
        monitor::Monitor,
        pio::{Pio, SequencerProgram, PIO0_BASE, SM_COUNT},
        pll::{Pll, PLL_SYS_BASE},
        sram::{Sram, SRAM_DEFAULT_WORDS},
    },
    error::VgaError,
    mode::VgaPins,
};

/// Size of each peripheral's register window.
const PERIPHERAL_WINDOW: u32 = 0x1000;

/// Upper bound on system clocks per frame for run_frames(). Covers
/// 640x480 at the fastest supported system clock with room to spare.
pub const FRAME_TICK_LIMIT: u64 = 8_000_000;

pub struct Rp2040 {
    sram: Sram,
    pll: Pll,
    dma: Dma,
    pio: Pio,
    monitor: Monitor,
    gpio: u32,
    ticks: u64,
}

impl Default for Rp2040 {
    fn default() -> Self {
        Rp2040::new(SRAM_DEFAULT_WORDS, VgaPins::default())
    }
}

impl Rp2040 {
    pub fn new(sram_words: usize, monitor_pins: VgaPins) -> Self {
        log::debug!("Rp2040::new(): {} words of SRAM, monitor on {:?}", sram_words, monitor_pins);
        Self {
            sram: Sram::new(sram_words),
            pll: Pll::new(),
            dma: Dma::new(),
            pio: Pio::new(),
            monitor: Monitor::new(monitor_pins),
            gpio: 0,
            ticks: 0,
        }
    }

    pub fn sram(&self) -> &Sram {
        &self.sram
    }

    pub fn dma(&self) -> &Dma {
        &self.dma
    }

    pub fn pio(&self) -> &Pio {
        &self.pio
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    pub fn gpio(&self) -> u32 {
        self.gpio
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn sys_clock_hz(&self) -> u32 {
        self.pll.sys_clock_hz()
    }

    /// Advance one system clock.
    pub fn tick(&mut self) {
        let strobe = self.pio.tick();
        self.gpio = self.pio.drive_pins(self.gpio);
        self.run_dma();
        self.monitor.sample(self.ticks, self.gpio, strobe);
        self.ticks += 1;
    }

    pub fn run_ticks(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Run until `frames` more frames have been completed on the monitor.
    /// Returns false if the frames did not arrive within FRAME_TICK_LIMIT
    /// clocks each, as happens when output is stopped.
    pub fn run_frames(&mut self, frames: u64) -> bool {
        let target = self.monitor.frames_completed() + frames;
        let limit = self.ticks + frames.saturating_mul(FRAME_TICK_LIMIT);
        while self.monitor.frames_completed() < target {
            if self.ticks >= limit {
                log::warn!(
                    "run_frames(): gave up after {} clocks with {} of {} frames",
                    frames.saturating_mul(FRAME_TICK_LIMIT),
                    frames + self.monitor.frames_completed() - target,
                    frames
                );
                return false;
            }
            self.tick();
        }
        true
    }

    fn run_dma(&mut self) {
        let pio = &self.pio;
        let transfer = self
            .dma
            .next_transfer(|treq| (treq as usize) < SM_COUNT && pio.tx_dreq(treq as usize));

        if let Some(t) = transfer {
            let data = self.bus_read(t.read_addr);
            self.bus_write(t.write_addr, data);
            self.dma.complete_transfer(t.channel);
        }
    }

    fn bus_read(&mut self, address: u32) -> u32 {
        if self.sram.contains(address) {
            return self.sram.read_u32(address);
        }
        match Self::peripheral(address) {
            Some((DMA_BASE, offset)) => self.dma.read_u32(offset),
            Some((PIO0_BASE, offset)) => self.pio.read_u32(offset),
            Some((PLL_SYS_BASE, offset)) => self.pll.read_u32(offset),
            _ => {
                log::trace!("bus: read from unmapped address {:08X}", address);
                0
            }
        }
    }

    fn bus_write(&mut self, address: u32, data: u32) {
        if self.sram.contains(address) {
            self.sram.write_u32(address, data);
            return;
        }
        match Self::peripheral(address) {
            Some((DMA_BASE, offset)) => self.dma.write_u32(offset, data),
            Some((PIO0_BASE, offset)) => self.pio.write_u32(offset, data),
            Some((PLL_SYS_BASE, offset)) => self.pll.write_u32(offset, data),
            _ => log::trace!("bus: write of {:08X} to unmapped address {:08X}", data, address),
        }
    }

    /// Split an address into (peripheral base, register offset).
    fn peripheral(address: u32) -> Option<(u32, u32)> {
        [DMA_BASE, PIO0_BASE, PLL_SYS_BASE]
            .into_iter()
            .find(|base| (*base..*base + PERIPHERAL_WINDOW).contains(&address))
            .map(|base| (base, address - base))
    }
}

impl VideoHardware for Rp2040 {
    fn read_u32(&mut self, address: u32) -> u32 {
        self.bus_read(address)
    }

    fn write_u32(&mut self, address: u32, data: u32) {
        self.bus_write(address, data)
    }

    fn alloc_words(&mut self, count: usize) -> Result<u32, VgaError> {
        self.sram.alloc(count)
    }

    fn words(&self, address: u32, count: usize) -> Option<&[u32]> {
        self.sram.words(address, count)
    }

    fn words_mut(&mut self, address: u32, count: usize) -> Option<&mut [u32]> {
        self.sram.words_mut(address, count)
    }

    fn load_program(&mut self, sm: usize, program: SequencerProgram, pin_base: u32) -> Result<(), VgaError> {
        self.pio.load_program(sm, program, pin_base)?;
        // Pins take the program's idle levels as soon as it is installed.
        self.gpio = self.pio.drive_pins(self.gpio);
        Ok(())
    }
}
