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

    devices::pio::hsync.rs

    Horizontal sync sequencer.

    The counter word (visible + front porch - 1) arrives by autopull and
    stays in the OSR; it is copied into X at the start of every line.

      ActivePorch   X + 1 cycles   pin high
      SyncPulse     sync cycles    pin low
      BackPorch     back cycles    pin high, IRQ_LINE_END on the last cycle

    One cycle per pixel clock, so the line period is the total horizontal
    timing.

*/

use super::{irq::IRQ_LINE_END, Sequencer, ShiftRegister, SmIo};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HSyncState {
    /// Waiting for the counter word.
    Pull,
    ActivePorch,
    SyncPulse,
    BackPorch,
}

#[derive(Clone, Debug)]
pub struct HSyncProgram {
    state: HSyncState,
    osr: ShiftRegister,
    x: u32,
    remaining: u32,
    sync_cycles: u32,
    back_porch_cycles: u32,
    pin: bool,
}

impl HSyncProgram {
    pub fn new(sync_cycles: u32, back_porch_cycles: u32) -> Self {
        Self {
            state: HSyncState::Pull,
            osr: ShiftRegister::default(),
            x: 0,
            remaining: 0,
            sync_cycles,
            back_porch_cycles,
            pin: true,
        }
    }

    pub fn state(&self) -> HSyncState {
        self.state
    }

    fn enter(&mut self, state: HSyncState, cycles: u32) {
        self.state = state;
        self.remaining = cycles;
        self.pin = state != HSyncState::SyncPulse;
    }

    fn start_line(&mut self) {
        self.x = self.osr.value();
        self.enter(HSyncState::ActivePorch, self.x.wrapping_add(1));
    }
}

impl Sequencer for HSyncProgram {
    fn step(&mut self, io: &mut SmIo) {
        match self.state {
            HSyncState::Pull => {
                if self.osr.pull(io.tx_fifo) {
                    self.start_line();
                }
            }
            HSyncState::ActivePorch => {
                self.remaining -= 1;
                if self.remaining == 0 {
                    self.enter(HSyncState::SyncPulse, self.sync_cycles);
                }
            }
            HSyncState::SyncPulse => {
                self.remaining -= 1;
                if self.remaining == 0 {
                    self.enter(HSyncState::BackPorch, self.back_porch_cycles);
                }
            }
            HSyncState::BackPorch => {
                self.remaining -= 1;
                if self.remaining == 0 {
                    io.irq.raise(IRQ_LINE_END);
                    self.start_line();
                }
            }
        }
    }

    fn pins(&self) -> u32 {
        self.pin as u32
    }

    fn pin_count(&self) -> u32 {
        1
    }

    fn restart(&mut self) {
        *self = Self::new(self.sync_cycles, self.back_porch_cycles);
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            HSyncState::Pull => "pull",
            HSyncState::ActivePorch => "active+front porch",
            HSyncState::SyncPulse => "sync pulse",
            HSyncState::BackPorch => "back porch",
        }
    }
}
