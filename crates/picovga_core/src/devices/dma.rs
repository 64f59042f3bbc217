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

    devices::dma.rs

    Model of the RP2040 DMA controller, reduced to what streaming needs:
    per-channel address, count and control registers with their trigger
    aliases, DREQ pacing, chaining, abort and multi-channel trigger.

    The controller does not touch memory itself. The machine asks it for
    the next transfer, performs the bus read and write, then reports the
    transfer complete. A write that lands on another channel's trigger
    register therefore triggers that channel, which is what lets a control
    channel re-arm a data channel.

*/

use modular_bitfield::prelude::*;

pub const DMA_BASE: u32 = 0x5000_0000;
pub const DMA_CHANNEL_COUNT: usize = 12;
pub const DMA_CHANNEL_STRIDE: u32 = 0x40;

pub const CH_READ_ADDR: u32 = 0x00;
pub const CH_WRITE_ADDR: u32 = 0x04;
pub const CH_TRANS_COUNT: u32 = 0x08;
pub const CH_CTRL_TRIG: u32 = 0x0c;
pub const CH_AL1_CTRL: u32 = 0x10;
pub const CH_AL1_READ_ADDR: u32 = 0x14;
pub const CH_AL1_WRITE_ADDR: u32 = 0x18;
pub const CH_AL1_TRANS_COUNT_TRIG: u32 = 0x1c;
pub const CH_AL2_CTRL: u32 = 0x20;
pub const CH_AL2_TRANS_COUNT: u32 = 0x24;
pub const CH_AL2_READ_ADDR: u32 = 0x28;
pub const CH_AL2_WRITE_ADDR_TRIG: u32 = 0x2c;
pub const CH_AL3_CTRL: u32 = 0x30;
pub const CH_AL3_WRITE_ADDR: u32 = 0x34;
pub const CH_AL3_TRANS_COUNT: u32 = 0x38;
pub const CH_AL3_READ_ADDR_TRIG: u32 = 0x3c;

pub const DMA_MULTI_CHAN_TRIGGER: u32 = 0x430;
pub const DMA_CHAN_ABORT: u32 = 0x444;

/// DREQ selection for an unpaced channel.
pub const TREQ_UNPACED: u8 = 0x3f;
/// DREQ numbers 0..=3 are the PIO0 TX FIFOs.
pub const TREQ_PIO0_TX0: u8 = 0;

pub const DATA_SIZE_WORD: u8 = 2;

pub const fn channel_address(channel: usize, register: u32) -> u32 {
    DMA_BASE + DMA_CHANNEL_STRIDE * channel as u32 + register
}

#[bitfield]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DmaCtrl {
    pub en: bool,
    pub high_priority: bool,
    pub data_size: B2,
    pub incr_read: bool,
    pub incr_write: bool,
    pub ring_size: B4,
    pub ring_sel: bool,
    pub chain_to: B4,
    pub treq_sel: B6,
    pub irq_quiet: bool,
    pub bswap: bool,
    pub sniff_en: bool,
    pub busy: bool,
    #[skip]
    unused: B7,
}

impl Default for DmaCtrl {
    fn default() -> Self {
        DmaCtrl::new()
    }
}

impl DmaCtrl {
    pub fn from_u32(bits: u32) -> Self {
        DmaCtrl::from_bytes(bits.to_le_bytes())
    }

    pub fn to_u32(self) -> u32 {
        u32::from_le_bytes(self.into_bytes())
    }
}

/// Where a control/data channel pair is in its re-arming cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StreamPhase {
    /// Neither channel is busy.
    Stopped,
    /// The control channel is rewriting the data channel's read address.
    Arming,
    /// The data channel is streaming.
    Streaming,
}

impl StreamPhase {
    /// Phase from the busy flags of the control and data channels.
    pub fn from_busy(control_busy: bool, data_busy: bool) -> Self {
        match (control_busy, data_busy) {
            (_, true) => StreamPhase::Streaming,
            (true, false) => StreamPhase::Arming,
            (false, false) => StreamPhase::Stopped,
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct DmaChannel {
    read_addr: u32,
    write_addr: u32,
    /// Reload value written to TRANS_COUNT.
    trans_count: u32,
    /// Transfers left in the current run.
    remaining: u32,
    ctrl: DmaCtrl,
    transfers: u64,
}

impl DmaChannel {
    pub fn read_addr(&self) -> u32 {
        self.read_addr
    }

    pub fn write_addr(&self) -> u32 {
        self.write_addr
    }

    /// Configured transfer count.
    pub fn trans_count(&self) -> u32 {
        self.trans_count
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn ctrl(&self) -> DmaCtrl {
        self.ctrl
    }

    pub fn is_enabled(&self) -> bool {
        self.ctrl.en()
    }

    pub fn is_busy(&self) -> bool {
        self.ctrl.busy()
    }

    /// Total transfers performed by this channel.
    pub fn transfers(&self) -> u64 {
        self.transfers
    }

    fn step_size(&self) -> u32 {
        1 << self.ctrl.data_size().min(DATA_SIZE_WORD)
    }
}

/// A transfer granted by the arbiter, to be carried out by the bus owner.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DmaTransfer {
    pub channel: usize,
    pub read_addr: u32,
    pub write_addr: u32,
}

pub struct Dma {
    channels: [DmaChannel; DMA_CHANNEL_COUNT],
    round_robin: usize,
}

impl Dma {
    pub fn new() -> Self {
        Self {
            channels: [DmaChannel::default(); DMA_CHANNEL_COUNT],
            round_robin: 0,
        }
    }

    pub fn channel(&self, channel: usize) -> Option<&DmaChannel> {
        self.channels.get(channel)
    }

    pub fn stream_phase(&self, control: usize, data: usize) -> StreamPhase {
        let busy = |ch: usize| self.channels.get(ch).is_some_and(|c| c.is_busy());
        StreamPhase::from_busy(busy(control), busy(data))
    }

    pub fn read_u32(&mut self, offset: u32) -> u32 {
        if let Some((ch, reg)) = Self::decode(offset) {
            let c = &self.channels[ch];
            return match reg {
                CH_READ_ADDR | CH_AL1_READ_ADDR | CH_AL2_READ_ADDR | CH_AL3_READ_ADDR_TRIG => c.read_addr,
                CH_WRITE_ADDR | CH_AL1_WRITE_ADDR | CH_AL2_WRITE_ADDR_TRIG | CH_AL3_WRITE_ADDR => c.write_addr,
                // Live count while running, reload value otherwise.
                CH_TRANS_COUNT | CH_AL1_TRANS_COUNT_TRIG | CH_AL2_TRANS_COUNT | CH_AL3_TRANS_COUNT => {
                    if c.is_busy() {
                        c.remaining
                    }
                    else {
                        c.trans_count
                    }
                }
                _ => c.ctrl.to_u32(),
            };
        }
        match offset {
            DMA_MULTI_CHAN_TRIGGER | DMA_CHAN_ABORT => 0,
            _ => {
                log::trace!("DMA: read from unhandled offset {:#05x}", offset);
                0
            }
        }
    }

    pub fn write_u32(&mut self, offset: u32, data: u32) {
        if let Some((ch, reg)) = Self::decode(offset) {
            self.write_channel(ch, reg, data);
            return;
        }
        match offset {
            DMA_MULTI_CHAN_TRIGGER => {
                for ch in 0..DMA_CHANNEL_COUNT {
                    if data & (1 << ch) != 0 {
                        self.trigger(ch);
                    }
                }
            }
            DMA_CHAN_ABORT => {
                for ch in 0..DMA_CHANNEL_COUNT {
                    if data & (1 << ch) != 0 {
                        self.abort(ch);
                    }
                }
            }
            _ => log::trace!("DMA: write of {:08X} to unhandled offset {:#05x}", data, offset),
        }
    }

    fn decode(offset: u32) -> Option<(usize, u32)> {
        let ch = (offset / DMA_CHANNEL_STRIDE) as usize;
        (ch < DMA_CHANNEL_COUNT).then_some((ch, offset % DMA_CHANNEL_STRIDE))
    }

    fn write_channel(&mut self, ch: usize, reg: u32, data: u32) {
        let c = &mut self.channels[ch];
        let triggers = matches!(
            reg,
            CH_CTRL_TRIG | CH_AL1_TRANS_COUNT_TRIG | CH_AL2_WRITE_ADDR_TRIG | CH_AL3_READ_ADDR_TRIG
        );
        match reg {
            CH_READ_ADDR | CH_AL1_READ_ADDR | CH_AL2_READ_ADDR | CH_AL3_READ_ADDR_TRIG => c.read_addr = data,
            CH_WRITE_ADDR | CH_AL1_WRITE_ADDR | CH_AL2_WRITE_ADDR_TRIG | CH_AL3_WRITE_ADDR => c.write_addr = data,
            CH_TRANS_COUNT | CH_AL1_TRANS_COUNT_TRIG | CH_AL2_TRANS_COUNT | CH_AL3_TRANS_COUNT => c.trans_count = data,
            CH_CTRL_TRIG | CH_AL1_CTRL | CH_AL2_CTRL | CH_AL3_CTRL => {
                // BUSY is read only.
                let busy = c.ctrl.busy();
                c.ctrl = DmaCtrl::from_u32(data).with_busy(busy);
                log::debug!("DMA: ch{} ctrl {:08X} {:?}", ch, data, c.ctrl);
            }
            _ => {}
        }
        if triggers {
            self.trigger(ch);
        }
    }

    /// Start a run on `ch` if it is enabled. The remaining count is reloaded.
    pub fn trigger(&mut self, ch: usize) {
        let Some(c) = self.channels.get_mut(ch) else {
            return;
        };
        if !c.ctrl.en() {
            log::trace!("DMA: ch{} triggered while disabled, ignored", ch);
            return;
        }
        c.remaining = c.trans_count;
        c.ctrl.set_busy(true);
        log::trace!(
            "DMA: ch{} triggered: {} transfers {:08X} -> {:08X}",
            ch,
            c.remaining,
            c.read_addr,
            c.write_addr
        );
    }

    /// Stop `ch` without chaining.
    pub fn abort(&mut self, ch: usize) {
        if let Some(c) = self.channels.get_mut(ch) {
            if c.ctrl.busy() {
                log::trace!("DMA: ch{} aborted with {} transfers left", ch, c.remaining);
            }
            c.remaining = 0;
            c.ctrl.set_busy(false);
        }
    }

    /// Pick the channel to run on this clock. `dreq` reports whether a
    /// pacing DREQ is asserted. High priority channels are served first,
    /// round robin within each class.
    pub fn next_transfer(&mut self, dreq: impl Fn(u8) -> bool) -> Option<DmaTransfer> {
        let ready = |c: &DmaChannel| c.ctrl.busy() && (c.ctrl.treq_sel() == TREQ_UNPACED || dreq(c.ctrl.treq_sel()));

        for high in [true, false] {
            for i in 0..DMA_CHANNEL_COUNT {
                let ch = (self.round_robin + i) % DMA_CHANNEL_COUNT;
                let c = &self.channels[ch];
                if c.ctrl.high_priority() == high && ready(c) {
                    self.round_robin = (ch + 1) % DMA_CHANNEL_COUNT;
                    return Some(DmaTransfer {
                        channel: ch,
                        read_addr: c.read_addr,
                        write_addr: c.write_addr,
                    });
                }
            }
        }
        None
    }

    /// Account for a finished transfer on `ch`: step the addresses, count
    /// down, and chain when the run is done.
    pub fn complete_transfer(&mut self, ch: usize) {
        let Some(c) = self.channels.get_mut(ch) else {
            return;
        };
        // The transfer's own write may have aborted this channel.
        if !c.ctrl.busy() {
            return;
        }
        let step = c.step_size();
        if c.ctrl.incr_read() {
            c.read_addr = c.read_addr.wrapping_add(step);
        }
        if c.ctrl.incr_write() {
            c.write_addr = c.write_addr.wrapping_add(step);
        }
        c.transfers += 1;
        c.remaining = c.remaining.saturating_sub(1);
        if c.remaining > 0 {
            return;
        }

        c.ctrl.set_busy(false);
        let chain_to = c.ctrl.chain_to() as usize;
        if chain_to != ch {
            log::trace!("DMA: ch{} complete, chaining to ch{}", ch, chain_to);
            self.trigger(chain_to);
        }
        else {
            log::trace!("DMA: ch{} complete", ch);
        }
    }
}
