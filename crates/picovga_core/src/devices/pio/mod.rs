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

    devices::pio::mod.rs

    Model of the PIO0 block: four state machines, each with a 4-word TX
    FIFO and a fractional clock divider, sharing one set of IRQ flags.

    State machine programs are not interpreted from instruction memory.
    Each program is an explicit state machine implementing Sequencer,
    stepped once per divided clock. One step is one PIO cycle: either an
    instruction or one cycle of an instruction's delay.

*/

pub mod hsync;
pub mod irq;
pub mod rgb;
pub mod vsync;

use arraydeque::ArrayDeque;
use enum_dispatch::enum_dispatch;

use crate::{clock::ClockDivider, error::VgaError};

pub use hsync::HSyncProgram;
pub use irq::*;
pub use rgb::RgbProgram;
pub use vsync::VSyncProgram;

pub const PIO0_BASE: u32 = 0x5020_0000;

pub const PIO_CTRL: u32 = 0x000;
pub const PIO_FSTAT: u32 = 0x004;
pub const PIO_TXF0: u32 = 0x010;
pub const PIO_IRQ: u32 = 0x030;
pub const PIO_SM0_CLKDIV: u32 = 0x0c8;
pub const PIO_SM_STRIDE: u32 = 0x18;

pub const SM_COUNT: usize = 4;
pub const TX_FIFO_DEPTH: usize = 4;

pub const CTRL_SM_ENABLE_MASK: u32 = 0x00f;
pub const CTRL_SM_RESTART_SHIFT: u32 = 4;
pub const CTRL_CLKDIV_RESTART_SHIFT: u32 = 8;

const FSTAT_RXFULL_SHIFT: u32 = 0;
const FSTAT_RXEMPTY_SHIFT: u32 = 8;
const FSTAT_TXFULL_SHIFT: u32 = 16;
const FSTAT_TXEMPTY_SHIFT: u32 = 24;

pub type TxFifo = ArrayDeque<u32, TX_FIFO_DEPTH>;

/// Byte address of the TX FIFO of state machine `sm`.
pub const fn txf_address(sm: usize) -> u32 {
    PIO0_BASE + PIO_TXF0 + 4 * sm as u32
}

pub const fn clkdiv_address(sm: usize) -> u32 {
    PIO0_BASE + PIO_SM0_CLKDIV + PIO_SM_STRIDE * sm as u32
}

/// Output shift register. Holds the last pulled word and how many of its
/// bits have been shifted out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ShiftRegister {
    value: u32,
    shift_count: u32,
}

impl Default for ShiftRegister {
    fn default() -> Self {
        // Out of reset the OSR counts as empty.
        Self {
            value: 0,
            shift_count: 32,
        }
    }
}

impl ShiftRegister {
    #[inline]
    pub fn load(&mut self, value: u32) {
        self.value = value;
        self.shift_count = 0;
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.value
    }

    #[inline]
    pub fn shift_count(&self) -> u32 {
        self.shift_count
    }

    /// True when `threshold` bits have already been shifted out.
    #[inline]
    pub fn exhausted(&self, threshold: u32) -> bool {
        self.shift_count >= threshold
    }

    /// `out` with right shift: the low `bits` bits leave the register.
    #[inline]
    pub fn shift_right(&mut self, bits: u32) -> u32 {
        let data = self.value & ((1 << bits) - 1);
        self.value >>= bits;
        self.shift_count = (self.shift_count + bits).min(32);
        data
    }

    /// Blocking or automatic pull: refill from the FIFO. Returns false if
    /// the FIFO is empty, in which case the state machine stalls.
    #[inline]
    pub fn pull(&mut self, fifo: &mut TxFifo) -> bool {
        match fifo.pop_front() {
            Some(word) => {
                self.load(word);
                true
            }
            None => false,
        }
    }
}

/// What a state machine sees of the block while it executes one cycle.
pub struct SmIo<'a> {
    pub tx_fifo: &'a mut TxFifo,
    pub irq: &'a mut IrqFlags,
    /// Set by an `out pins` instruction to the value driven onto the pins.
    pub strobe: Option<u32>,
}

#[enum_dispatch]
#[derive(Clone, Debug)]
pub enum SequencerProgram {
    HSyncProgram,
    VSyncProgram,
    RgbProgram,
}

#[enum_dispatch(SequencerProgram)]
pub trait Sequencer {
    /// Execute one state machine cycle.
    fn step(&mut self, io: &mut SmIo);
    /// Current output levels of the program's pins, relative to its pin base.
    fn pins(&self) -> u32;
    /// Number of consecutive pins the program drives.
    fn pin_count(&self) -> u32;
    /// Return to the program's entry point with empty registers.
    fn restart(&mut self);
    fn state_name(&self) -> &'static str;
}

/// Fractional clock divider state. Each system clock adds 256 to the
/// accumulator; the state machine runs a cycle whenever the accumulator
/// reaches the 16.8 divider value.
#[derive(Copy, Clone, Debug, Default)]
pub struct DividedClock {
    divider: ClockDivider,
    accumulator: u32,
}

impl DividedClock {
    pub fn new(divider: ClockDivider) -> Self {
        Self {
            divider,
            accumulator: 0,
        }
    }

    #[inline]
    pub fn tick(&mut self) -> bool {
        self.accumulator += 256;
        let fixed = self.divider.fixed();
        if self.accumulator >= fixed {
            self.accumulator -= fixed;
            true
        }
        else {
            false
        }
    }

    pub fn divider(&self) -> ClockDivider {
        self.divider
    }

    pub fn set_divider(&mut self, divider: ClockDivider) {
        self.divider = divider;
    }

    pub fn restart(&mut self) {
        self.accumulator = 0;
    }
}

pub struct StateMachine {
    program: Option<SequencerProgram>,
    pin_base: u32,
    clock: DividedClock,
    tx_fifo: TxFifo,
    enabled: bool,
    cycles: u64,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            program: None,
            pin_base: 0,
            clock: DividedClock::default(),
            tx_fifo: TxFifo::new(),
            enabled: false,
            cycles: 0,
        }
    }

    pub fn program(&self) -> Option<&SequencerProgram> {
        self.program.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn tx_level(&self) -> usize {
        self.tx_fifo.len()
    }

    pub fn divider(&self) -> ClockDivider {
        self.clock.divider()
    }

    /// State machine cycles executed since the program was loaded.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn pin_base(&self) -> u32 {
        self.pin_base
    }

    /// Drive the pin outputs of this state machine into a GPIO level word.
    fn drive_pins(&self, gpio: u32) -> u32 {
        match &self.program {
            Some(program) => {
                let mask = ((1u32 << program.pin_count()) - 1) << self.pin_base;
                (gpio & !mask) | ((program.pins() << self.pin_base) & mask)
            }
            None => gpio,
        }
    }

    fn restart(&mut self) {
        if let Some(program) = &mut self.program {
            program.restart();
        }
        // Stands in for the FIFO join toggle used to flush a machine before reuse.
        self.tx_fifo.clear();
    }
}

pub struct Pio {
    sms: [StateMachine; SM_COUNT],
    irq: IrqFlags,
}

impl Pio {
    pub fn new() -> Self {
        Self {
            sms: std::array::from_fn(|_| StateMachine::new()),
            irq: IrqFlags::new(),
        }
    }

    pub fn sm(&self, sm: usize) -> Option<&StateMachine> {
        self.sms.get(sm)
    }

    pub fn irq(&self) -> IrqFlags {
        self.irq
    }

    /// Install `program` on state machine `sm`, driving pins from `pin_base`.
    pub fn load_program(&mut self, sm: usize, program: SequencerProgram, pin_base: u32) -> Result<(), VgaError> {
        let machine = self.sms.get_mut(sm).ok_or(VgaError::NoSuchSequencer(sm))?;
        log::debug!("PIO0: SM{} loaded at pin base {}: {:?}", sm, pin_base, program);
        machine.program = Some(program);
        machine.pin_base = pin_base;
        machine.enabled = false;
        machine.cycles = 0;
        Ok(())
    }

    pub fn read_u32(&mut self, offset: u32) -> u32 {
        match offset {
            PIO_CTRL => self
                .sms
                .iter()
                .enumerate()
                .fold(0, |acc, (i, sm)| acc | ((sm.enabled as u32) << i)),
            PIO_FSTAT => {
                let mut fstat = 0;
                for (i, sm) in self.sms.iter().enumerate() {
                    // No RX FIFOs are modelled: always empty, never full.
                    fstat |= 1 << (FSTAT_RXEMPTY_SHIFT + i as u32);
                    fstat &= !(1 << (FSTAT_RXFULL_SHIFT + i as u32));
                    if sm.tx_fifo.is_full() {
                        fstat |= 1 << (FSTAT_TXFULL_SHIFT + i as u32);
                    }
                    if sm.tx_fifo.is_empty() {
                        fstat |= 1 << (FSTAT_TXEMPTY_SHIFT + i as u32);
                    }
                }
                fstat
            }
            PIO_IRQ => self.irq.bits(),
            _ => match Self::clkdiv_index(offset) {
                Some(sm) => self.sms[sm].clock.divider().to_register(),
                None => {
                    log::trace!("PIO0: read from unhandled offset {:#05x}", offset);
                    0
                }
            },
        }
    }

    pub fn write_u32(&mut self, offset: u32, data: u32) {
        match offset {
            PIO_CTRL => self.write_ctrl(data),
            PIO_IRQ => self.irq.write_clear(data),
            _ if (PIO_TXF0..PIO_TXF0 + 4 * SM_COUNT as u32).contains(&offset) => {
                self.push_tx(((offset - PIO_TXF0) / 4) as usize, data);
            }
            _ => match Self::clkdiv_index(offset) {
                Some(sm) => {
                    let divider = ClockDivider::from_register(data);
                    log::debug!(
                        "PIO0: SM{} clock divider set to {}+{}/256",
                        sm,
                        divider.int,
                        divider.frac
                    );
                    self.sms[sm].clock.set_divider(divider);
                }
                None => log::trace!("PIO0: write of {:08X} to unhandled offset {:#05x}", data, offset),
            },
        }
    }

    fn clkdiv_index(offset: u32) -> Option<usize> {
        let rel = offset.checked_sub(PIO_SM0_CLKDIV)?;
        if rel % PIO_SM_STRIDE == 0 && rel / PIO_SM_STRIDE < SM_COUNT as u32 {
            Some((rel / PIO_SM_STRIDE) as usize)
        }
        else {
            None
        }
    }

    fn write_ctrl(&mut self, data: u32) {
        for (i, sm) in self.sms.iter_mut().enumerate() {
            if data & (1 << (CTRL_SM_RESTART_SHIFT + i as u32)) != 0 {
                log::trace!("PIO0: SM{} restart", i);
                sm.restart();
            }
            if data & (1 << (CTRL_CLKDIV_RESTART_SHIFT + i as u32)) != 0 {
                sm.clock.restart();
            }
            let enable = data & (1 << i) != 0;
            if enable != sm.enabled {
                log::trace!("PIO0: SM{} {}", i, if enable { "enabled" } else { "disabled" });
                sm.enabled = enable;
            }
        }
    }

    /// Push a word into a TX FIFO. A push into a full FIFO is dropped.
    pub fn push_tx(&mut self, sm: usize, data: u32) {
        let Some(machine) = self.sms.get_mut(sm) else {
            return;
        };
        if machine.tx_fifo.push_back(data).is_err() {
            log::warn!("PIO0: SM{} TX FIFO overflow, dropped {:08X}", sm, data);
        }
    }

    /// DREQ line for the TX FIFO of `sm`: asserted while the FIFO has room.
    #[inline]
    pub fn tx_dreq(&self, sm: usize) -> bool {
        self.sms.get(sm).is_some_and(|machine| !machine.tx_fifo.is_full())
    }

    /// Advance every enabled state machine by one system clock. Returns the
    /// value of any `out pins` executed on this clock.
    pub fn tick(&mut self) -> Option<u32> {
        let mut strobe = None;
        for machine in self.sms.iter_mut() {
            if !machine.enabled {
                continue;
            }
            let Some(program) = &mut machine.program else {
                continue;
            };
            if !machine.clock.tick() {
                continue;
            }
            let mut io = SmIo {
                tx_fifo: &mut machine.tx_fifo,
                irq: &mut self.irq,
                strobe: None,
            };
            program.step(&mut io);
            machine.cycles += 1;
            if io.strobe.is_some() {
                strobe = io.strobe;
            }
        }
        strobe
    }

    /// Pin levels driven by all loaded programs, applied over `gpio`.
    pub fn drive_pins(&self, gpio: u32) -> u32 {
        self.sms.iter().fold(gpio, |levels, sm| sm.drive_pins(levels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_register_shifts_lsb_first() {
        let mut osr = ShiftRegister::default();
        assert!(osr.exhausted(30));
        osr.load(0b101_011_110);
        assert_eq!(osr.shift_right(3), 0b110);
        assert_eq!(osr.shift_right(3), 0b011);
        assert_eq!(osr.shift_right(3), 0b101);
        assert_eq!(osr.shift_count(), 9);
        assert!(!osr.exhausted(30));
    }

    #[test]
    fn divided_clock_averages_fraction() {
        // 4 + 247/256, the hsync divider at 125 MHz.
        let mut clock = DividedClock::new(ClockDivider { int: 4, frac: 247 });
        let fires = (0..1271 * 100).filter(|_| clock.tick()).count();
        assert_eq!(fires, 25600);

        let mut clock = DividedClock::new(ClockDivider::ONE);
        assert!((0..10).all(|_| clock.tick()));
    }

    #[test]
    fn fifo_overflow_drops() {
        let mut pio = Pio::new();
        for i in 0..6 {
            pio.push_tx(2, i);
        }
        assert_eq!(pio.sm(2).unwrap().tx_level(), 4);
        assert!(!pio.tx_dreq(2));
        assert!(pio.tx_dreq(0));
        assert!(!pio.tx_dreq(7));
        assert_eq!(pio.read_u32(PIO_FSTAT) & (0xf << FSTAT_TXFULL_SHIFT), 0b0100 << FSTAT_TXFULL_SHIFT);
    }

    #[test]
    fn registers_round_trip() {
        let mut pio = Pio::new();
        pio.load_program(2, RgbProgram::new(4).into(), 0).unwrap();
        assert_eq!(pio.load_program(4, RgbProgram::new(4).into(), 0), Err(VgaError::NoSuchSequencer(4)));

        let div = ClockDivider { int: 1, frac: 62 };
        pio.write_u32(PIO_SM0_CLKDIV + 2 * PIO_SM_STRIDE, div.to_register());
        assert_eq!(pio.sm(2).unwrap().divider(), div);
        assert_eq!(pio.read_u32(PIO_SM0_CLKDIV + 2 * PIO_SM_STRIDE), div.to_register());

        pio.write_u32(PIO_TXF0 + 8, 639);
        assert_eq!(pio.sm(2).unwrap().tx_level(), 1);

        pio.write_u32(PIO_CTRL, 0b100);
        assert_eq!(pio.read_u32(PIO_CTRL), 0b100);
        pio.write_u32(PIO_CTRL, 0b100 << CTRL_SM_RESTART_SHIFT);
        assert_eq!(pio.read_u32(PIO_CTRL), 0);
        assert_eq!(pio.sm(2).unwrap().tx_level(), 0);
    }

    #[test]
    fn disabled_machines_do_not_run() {
        let mut pio = Pio::new();
        pio.load_program(0, HSyncProgram::new(4, 4).into(), 4).unwrap();
        pio.push_tx(0, 10);
        for _ in 0..100 {
            pio.tick();
        }
        assert_eq!(pio.sm(0).unwrap().cycles(), 0);
        assert_eq!(pio.sm(0).unwrap().tx_level(), 1);

        pio.write_u32(PIO_CTRL, 0b1);
        for _ in 0..100 {
            pio.tick();
        }
        assert_eq!(pio.sm(0).unwrap().cycles(), 100);
        assert_eq!(pio.sm(0).unwrap().tx_level(), 0);
    }
}
