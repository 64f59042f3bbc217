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

    devices::pio::rgb.rs

    Color output sequencer. Drives three consecutive pins.

    The line length H - 1 is pulled once into Y. The pull leaves that word in
    the OSR with nothing shifted out, so the first ten pixels of the first
    frame come from it and every later word reaches the pins one group late.

    Per line: blank the pins and copy Y to X, wait for IRQ_LINE_ACTIVE, then
    X + 1 pixels of `out pins, 3` followed by `cycles_per_pixel - 2` delay
    cycles and a decrementing jump. `out` autopulls after 30 bits and stalls
    while the FIFO is empty.

*/

use super::{irq::IRQ_LINE_ACTIVE, Sequencer, ShiftRegister, SmIo};
use crate::mode::{BITS_PER_PIXEL, USABLE_BITS};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RgbState {
    Pull,
    LoadY,
    Blank,
    WaitLine,
    Out,
    Delay,
    Jump,
}

#[derive(Clone, Debug)]
pub struct RgbProgram {
    state: RgbState,
    osr: ShiftRegister,
    x: u32,
    y: u32,
    delay: u32,
    cycles_per_pixel: u32,
    pins: u32,
    pixels: u64,
}

impl RgbProgram {
    /// `cycles_per_pixel` must be at least 2: one for `out` and one for the jump.
    pub fn new(cycles_per_pixel: u32) -> Self {
        Self {
            state: RgbState::Pull,
            osr: ShiftRegister::default(),
            x: 0,
            y: 0,
            delay: 0,
            cycles_per_pixel: cycles_per_pixel.max(2),
            pins: 0,
            pixels: 0,
        }
    }

    pub fn state(&self) -> RgbState {
        self.state
    }

    pub fn cycles_per_pixel(&self) -> u32 {
        self.cycles_per_pixel
    }

    /// Pixels driven since the last restart.
    pub fn pixels(&self) -> u64 {
        self.pixels
    }
}

impl Sequencer for RgbProgram {
    fn step(&mut self, io: &mut SmIo) {
        match self.state {
            RgbState::Pull => {
                if self.osr.pull(io.tx_fifo) {
                    self.state = RgbState::LoadY;
                }
            }
            RgbState::LoadY => {
                self.y = self.osr.value();
                self.state = RgbState::Blank;
            }
            RgbState::Blank => {
                self.x = self.y;
                self.pins = 0;
                self.state = RgbState::WaitLine;
            }
            RgbState::WaitLine => {
                if io.irq.consume(IRQ_LINE_ACTIVE) {
                    self.state = RgbState::Out;
                }
            }
            RgbState::Out => {
                if self.osr.exhausted(USABLE_BITS) && !self.osr.pull(io.tx_fifo) {
                    // Stalled on an empty FIFO; the pins keep their level.
                    return;
                }
                self.pins = self.osr.shift_right(BITS_PER_PIXEL);
                self.pixels += 1;
                io.strobe = Some(self.pins);

                self.delay = self.cycles_per_pixel - 2;
                self.state = if self.delay > 0 { RgbState::Delay } else { RgbState::Jump };
            }
            RgbState::Delay => {
                self.delay -= 1;
                if self.delay == 0 {
                    self.state = RgbState::Jump;
                }
            }
            RgbState::Jump => {
                if self.x != 0 {
                    self.x -= 1;
                    self.state = RgbState::Out;
                }
                else {
                    self.state = RgbState::Blank;
                }
            }
        }
    }

    fn pins(&self) -> u32 {
        self.pins
    }

    fn pin_count(&self) -> u32 {
        BITS_PER_PIXEL
    }

    fn restart(&mut self) {
        *self = Self::new(self.cycles_per_pixel);
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            RgbState::Pull => "pull",
            RgbState::LoadY => "mov y, osr",
            RgbState::Blank => "blank",
            RgbState::WaitLine => "wait line",
            RgbState::Out => "out pins",
            RgbState::Delay => "delay",
            RgbState::Jump => "jmp x--",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::pio::{IrqFlags, TxFifo};

    struct Harness {
        program: RgbProgram,
        fifo: TxFifo,
        irq: IrqFlags,
    }

    impl Harness {
        fn new(cycles_per_pixel: u32) -> Self {
            Self {
                program: RgbProgram::new(cycles_per_pixel),
                fifo: TxFifo::new(),
                irq: IrqFlags::new(),
            }
        }

        /// Step once, returning any pixel driven.
        fn step(&mut self) -> Option<u32> {
            let mut io = SmIo {
                tx_fifo: &mut self.fifo,
                irq: &mut self.irq,
                strobe: None,
            };
            self.program.step(&mut io);
            io.strobe
        }
    }

    #[test]
    fn first_group_comes_from_line_length_word() {
        let mut h = Harness::new(4);
        h.fifo.push_back(19).unwrap();
        h.fifo.push_back(0x3FFF_FFFF).unwrap();
        h.fifo.push_back(0x0924_9249).unwrap();

        // pull, mov y, blank
        for _ in 0..3 {
            assert_eq!(h.step(), None);
        }
        assert_eq!(h.program.state(), RgbState::WaitLine);
        h.irq.raise(IRQ_LINE_ACTIVE);

        let mut pixels = Vec::new();
        let mut strobe_cycles = Vec::new();
        for cycle in 0..200 {
            if let Some(p) = h.step() {
                pixels.push(p);
                strobe_cycles.push(cycle);
            }
        }

        // 19 = 0b10011: groups 3, 2 then zeroes.
        assert_eq!(&pixels[..10], &[3, 2, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&pixels[10..20], &[7; 10]);
        assert_eq!(pixels.len(), 20);
        // The wait cycle, then one pixel every 4 cycles.
        assert!(strobe_cycles.windows(2).all(|w| w[1] - w[0] == 4));
        assert_eq!(h.program.state(), RgbState::WaitLine);
        assert_eq!(h.program.pins(), 0);
        // The third word has not been touched yet.
        assert_eq!(h.fifo.len(), 1);
    }

    #[test]
    fn out_stalls_on_empty_fifo() {
        let mut h = Harness::new(2);
        h.fifo.push_back(19).unwrap();
        for _ in 0..3 {
            h.step();
        }
        h.irq.raise(IRQ_LINE_ACTIVE);

        let drained: Vec<u32> = (0..40).filter_map(|_| h.step()).collect();
        assert_eq!(drained.len(), 10);
        assert_eq!(h.program.state(), RgbState::Out);

        // Holds the last pixel while stalled, resumes once data arrives.
        let last = h.program.pins();
        for _ in 0..50 {
            assert_eq!(h.step(), None);
        }
        assert_eq!(h.program.pins(), last);
        h.fifo.push_back(0x0924_9249).unwrap();
        assert_eq!(h.step(), Some(1));
    }

    #[test]
    fn overclocked_pixel_period() {
        let mut h = Harness::new(9);
        h.fifo.push_back(9).unwrap();
        for _ in 0..3 {
            h.step();
        }
        h.irq.raise(IRQ_LINE_ACTIVE);
        let cycles: Vec<usize> = (0..200).filter(|_| h.step().is_some()).collect();
        assert_eq!(cycles.len(), 10);
        assert!(cycles.windows(2).all(|w| w[1] - w[0] == 9));
    }
}
