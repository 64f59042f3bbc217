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

    devices::pio::vsync.rs

    Vertical sync sequencer. Runs at the system clock but only advances on
    IRQ_LINE_END from the horizontal sequencer, so every region below is
    counted in scanlines.

      Active       V lines    raises IRQ_LINE_ACTIVE for each line
      FrontPorch   front      pin high
      SyncPulse    sync       pin low
      BackPorch    back       pin high

    V arrives once as V - 1 by a blocking pull and stays in the OSR.

*/

use super::{
    irq::{IRQ_LINE_ACTIVE, IRQ_LINE_END},
    Sequencer,
    ShiftRegister,
    SmIo,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VSyncState {
    Pull,
    Active,
    FrontPorch,
    SyncPulse,
    BackPorch,
}

#[derive(Clone, Debug)]
pub struct VSyncProgram {
    state: VSyncState,
    osr: ShiftRegister,
    remaining: u32,
    front_porch_lines: u32,
    sync_lines: u32,
    back_porch_lines: u32,
    pin: bool,
}

impl VSyncProgram {
    pub fn new(front_porch_lines: u32, sync_lines: u32, back_porch_lines: u32) -> Self {
        Self {
            state: VSyncState::Pull,
            osr: ShiftRegister::default(),
            remaining: 0,
            front_porch_lines,
            sync_lines,
            back_porch_lines,
            pin: true,
        }
    }

    pub fn state(&self) -> VSyncState {
        self.state
    }

    fn enter(&mut self, state: VSyncState) {
        self.remaining = match state {
            VSyncState::Pull => 0,
            VSyncState::Active => self.osr.value().wrapping_add(1),
            VSyncState::FrontPorch => self.front_porch_lines,
            VSyncState::SyncPulse => self.sync_lines,
            VSyncState::BackPorch => self.back_porch_lines,
        };
        self.pin = state != VSyncState::SyncPulse;
        log::trace!("vsync: entering {:?} for {} lines", state, self.remaining);
        self.state = state;
    }
}

impl Sequencer for VSyncProgram {
    fn step(&mut self, io: &mut SmIo) {
        if self.state == VSyncState::Pull {
            if self.osr.pull(io.tx_fifo) {
                self.enter(VSyncState::Active);
            }
            return;
        }

        if !io.irq.consume(IRQ_LINE_END) {
            return;
        }
        if self.state == VSyncState::Active {
            io.irq.raise(IRQ_LINE_ACTIVE);
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            let next = match self.state {
                VSyncState::Active => VSyncState::FrontPorch,
                VSyncState::FrontPorch => VSyncState::SyncPulse,
                VSyncState::SyncPulse => VSyncState::BackPorch,
                _ => VSyncState::Active,
            };
            self.enter(next);
        }
    }

    fn pins(&self) -> u32 {
        self.pin as u32
    }

    fn pin_count(&self) -> u32 {
        1
    }

    fn restart(&mut self) {
        *self = Self::new(self.front_porch_lines, self.sync_lines, self.back_porch_lines);
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            VSyncState::Pull => "pull",
            VSyncState::Active => "active",
            VSyncState::FrontPorch => "front porch",
            VSyncState::SyncPulse => "sync pulse",
            VSyncState::BackPorch => "back porch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::pio::{IrqFlags, TxFifo};

    /// Feed one IRQ_LINE_END per line and report, per line, whether
    /// IRQ_LINE_ACTIVE was raised and the pin level afterwards.
    fn run_lines(program: &mut VSyncProgram, irq: &mut IrqFlags, fifo: &mut TxFifo, lines: usize) -> Vec<(bool, bool)> {
        let mut out = Vec::new();
        for _ in 0..lines {
            irq.raise(IRQ_LINE_END);
            // A few idle cycles per line, as between hsync interrupts.
            for _ in 0..3 {
                let mut io = SmIo {
                    tx_fifo: &mut *fifo,
                    irq: &mut *irq,
                    strobe: None,
                };
                program.step(&mut io);
            }
            out.push((irq.consume(IRQ_LINE_ACTIVE), program.pins() == 1));
        }
        out
    }

    #[test]
    fn frame_is_525_lines() {
        let mut program = VSyncProgram::new(10, 2, 33);
        let mut irq = IrqFlags::new();
        let mut fifo = TxFifo::new();
        fifo.push_back(479).unwrap();

        // Pull first.
        let mut io = SmIo {
            tx_fifo: &mut fifo,
            irq: &mut irq,
            strobe: None,
        };
        program.step(&mut io);
        assert_eq!(program.state(), VSyncState::Active);

        let lines = run_lines(&mut program, &mut irq, &mut fifo, 2 * 525);
        for frame in lines.chunks(525) {
            assert!(frame[..480].iter().all(|&(active, pin)| active && pin));
            // The pin drops right after the last front porch line.
            assert!(frame[480..489].iter().all(|&(active, pin)| !active && pin));
            assert!(frame[489..491].iter().all(|&(active, pin)| !active && !pin));
            assert!(frame[491..].iter().all(|&(active, pin)| !active && pin));
        }
        assert_eq!(program.state(), VSyncState::Active);
    }

    #[test]
    fn waits_for_line_end() {
        let mut program = VSyncProgram::new(1, 1, 2);
        let mut irq = IrqFlags::new();
        let mut fifo = TxFifo::new();
        fifo.push_back(5).unwrap();
        for _ in 0..100 {
            let mut io = SmIo {
                tx_fifo: &mut fifo,
                irq: &mut irq,
                strobe: None,
            };
            program.step(&mut io);
        }
        assert_eq!(program.state(), VSyncState::Active);
        assert_eq!(irq.bits(), 0);
    }
}
