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

    driver.rs

    The VGA driver. Sets up three PIO state machines and a pair of DMA
    channels so that the packed framebuffer is streamed out once per frame
    with no CPU involvement.

    Sequencers:
      SM0  horizontal sync   pixel clock
      SM1  vertical sync     system clock, paced by the SM0 line interrupt
      SM2  color output      pixel clock * cycles per pixel

    DMA:
      ch1  data: framebuffer -> SM2 TX FIFO, N words, paced by SM2's DREQ,
           chains to ch0 when done.
      ch0  control: one word (the framebuffer address) -> ch1's
           AL3_READ_ADDR_TRIG, which rewinds ch1 and starts it again.

    Once started, the pair keeps re-arming itself until stop().

*/

use crate::{
    bus::VideoHardware,
    clock::{ClockDivider, PllSettings},
    devices::{
        dma::{
            channel_address,
            DmaCtrl,
            StreamPhase,
            CH_AL1_CTRL,
            CH_AL2_CTRL,
            CH_AL3_READ_ADDR_TRIG,
            CH_CTRL_TRIG,
            CH_READ_ADDR,
            CH_TRANS_COUNT,
            CH_WRITE_ADDR,
            DATA_SIZE_WORD,
            DMA_BASE,
            DMA_CHAN_ABORT,
            DMA_MULTI_CHAN_TRIGGER,
            TREQ_PIO0_TX0,
            TREQ_UNPACED,
        },
        pio::{
            clkdiv_address,
            txf_address,
            HSyncProgram,
            RgbProgram,
            VSyncProgram,
            CTRL_CLKDIV_RESTART_SHIFT,
            CTRL_SM_RESTART_SHIFT,
            PIO0_BASE,
            PIO_CTRL,
            PIO_IRQ,
        },
        pll::{PLL_FBDIV_INT, PLL_PRIM, PLL_SYS_BASE},
    },
    error::VgaError,
    framebuffer::Framebuffer,
    mode::{VgaPins, VideoMode, USABLE_BITS},
};

pub const HSYNC_SM: usize = 0;
pub const VSYNC_SM: usize = 1;
pub const RGB_SM: usize = 2;
const SM_MASK: u32 = (1 << HSYNC_SM) | (1 << VSYNC_SM) | (1 << RGB_SM);

pub const CONTROL_CHANNEL: usize = 0;
pub const DATA_CHANNEL: usize = 1;

// Color sequencer cycles per line outside the pixel loop: blank, wait, and
// one cycle of slack for the wait to observe the interrupt.
const RGB_LINE_OVERHEAD_CYCLES: u64 = 3;
// System clocks from the end-of-line interrupt to the vertical sequencer
// raising the line-active interrupt.
const VSYNC_LATENCY_TICKS: u64 = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VgaConfig {
    pub mode: VideoMode,
    pub sys_clock_hz: u32,
    pub pins: VgaPins,
}

impl Default for VgaConfig {
    fn default() -> Self {
        Self {
            mode: VideoMode::VGA_640X480,
            sys_clock_hz: crate::clock::SYS_CLOCK_STANDARD_HZ,
            pins: VgaPins::default(),
        }
    }
}

/// System clock and sequencer dividers chosen for a mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClockPlan {
    pub pll: PllSettings,
    /// Achieved system clock.
    pub sys_clock_hz: u32,
    pub cycles_per_pixel: u32,
    pub hsync_divider: ClockDivider,
    pub vsync_divider: ClockDivider,
    pub rgb_divider: ClockDivider,
}

impl ClockPlan {
    pub fn new(mode: &VideoMode, requested_sys_hz: u32) -> Result<ClockPlan, VgaError> {
        let pll = PllSettings::for_sys_clock(requested_sys_hz)?;
        let sys_hz = pll.output_hz();
        let pixel_hz = mode.pixel_clock_hz;

        // One cycle for `out`, one for the loop jump.
        let cycles_per_pixel = sys_hz / pixel_hz;
        if cycles_per_pixel < 2 {
            return Err(VgaError::ClockTooSlow { sys_hz, pixel_hz });
        }

        let hsync_divider = ClockDivider::from_frequencies(sys_hz, pixel_hz)?;
        let rgb_divider = ClockDivider::from_frequencies(sys_hz, pixel_hz * cycles_per_pixel)?;

        // The color sequencer must finish its pixels before hsync leaves the
        // active + front porch region. Both sides in 1/256 system clocks.
        let h = &mode.horizontal;
        let rgb_line = (h.visible as u64 * cycles_per_pixel as u64 + RGB_LINE_OVERHEAD_CYCLES)
            * rgb_divider.fixed() as u64
            + VSYNC_LATENCY_TICKS * 256;
        let budget = (h.visible + h.front_porch) as u64 * hsync_divider.fixed() as u64;
        if rgb_line > budget {
            return Err(VgaError::InvalidTiming(format!(
                "{} pixels at {} cycles each do not fit before the end of the front porch",
                h.visible, cycles_per_pixel
            )));
        }

        Ok(ClockPlan {
            pll,
            sys_clock_hz: sys_hz,
            cycles_per_pixel,
            hsync_divider,
            vsync_divider: ClockDivider::ONE,
            rgb_divider,
        })
    }
}

pub struct Vga {
    mode: VideoMode,
    pins: VgaPins,
    clocks: ClockPlan,
    framebuffer_addr: u32,
    address_word_addr: u32,
    running: bool,
}

impl Vga {
    /// Validate the configuration, program the clocks, allocate the
    /// framebuffer and set up the sequencers and DMA channels. Nothing is
    /// enabled until start().
    ///
    /// Configuration is fully checked before the hardware is touched, so an
    /// error leaves the clocks and sequencers as they were.
    pub fn init<H: VideoHardware>(hw: &mut H, config: VgaConfig) -> Result<Vga, VgaError> {
        Vga::try_init(hw, config).inspect_err(|e| log::error!("Vga::init(): {}", e))
    }

    fn try_init<H: VideoHardware>(hw: &mut H, config: VgaConfig) -> Result<Vga, VgaError> {
        let mode = config.mode;
        mode.validate()?;
        config.pins.validate()?;
        let clocks = ClockPlan::new(&mode, config.sys_clock_hz)?;

        // The DMA address word sits right after the framebuffer. One
        // allocation, so running out of memory claims nothing.
        let words = mode.word_count();
        let framebuffer_addr = hw.alloc_words(words + 1)?;
        let address_word_addr = framebuffer_addr + (words * 4) as u32;
        hw.write_u32(address_word_addr, framebuffer_addr);
        log::info!(
            "Vga::init(): framebuffer of {} words ({} bytes) at {:08X}, {} of {} bits hold pixels ({:.2}%)",
            words,
            words * 4,
            framebuffer_addr,
            words * USABLE_BITS as usize,
            words * 32,
            USABLE_BITS as f64 * 100.0 / 32.0
        );

        hw.write_u32(PLL_SYS_BASE + PLL_PRIM, clocks.pll.prim());
        hw.write_u32(PLL_SYS_BASE + PLL_FBDIV_INT, clocks.pll.fbdiv);
        log::info!(
            "Vga::init(): system clock {} MHz, {} cycles per pixel",
            clocks.sys_clock_hz / 1_000_000,
            clocks.cycles_per_pixel
        );

        let h = &mode.horizontal;
        let v = &mode.vertical;
        hw.load_program(HSYNC_SM, HSyncProgram::new(h.sync, h.back_porch).into(), config.pins.hsync)?;
        hw.load_program(
            VSYNC_SM,
            VSyncProgram::new(v.front_porch, v.sync, v.back_porch).into(),
            config.pins.vsync,
        )?;
        hw.load_program(RGB_SM, RgbProgram::new(clocks.cycles_per_pixel).into(), config.pins.color_base)?;

        for (sm, divider) in [
            (HSYNC_SM, clocks.hsync_divider),
            (VSYNC_SM, clocks.vsync_divider),
            (RGB_SM, clocks.rgb_divider),
        ] {
            log::debug!(
                "Vga::init(): SM{} at {:.0} Hz",
                sm,
                divider.output_hz(clocks.sys_clock_hz)
            );
            hw.write_u32(clkdiv_address(sm), divider.to_register());
        }

        let vga = Vga {
            mode,
            pins: config.pins,
            clocks,
            framebuffer_addr,
            address_word_addr,
            running: false,
        };
        vga.configure_channels(hw);
        Ok(vga)
    }

    fn configure_channels<H: VideoHardware>(&self, hw: &mut H) {
        let data_ctrl = DmaCtrl::new()
            .with_en(true)
            .with_high_priority(true)
            .with_data_size(DATA_SIZE_WORD)
            .with_incr_read(true)
            .with_chain_to(CONTROL_CHANNEL as u8)
            .with_treq_sel(TREQ_PIO0_TX0 + RGB_SM as u8);
        hw.write_u32(channel_address(DATA_CHANNEL, CH_READ_ADDR), self.framebuffer_addr);
        hw.write_u32(channel_address(DATA_CHANNEL, CH_WRITE_ADDR), txf_address(RGB_SM));
        hw.write_u32(channel_address(DATA_CHANNEL, CH_TRANS_COUNT), self.word_count() as u32);
        // Non-triggering alias: the control channel starts this one.
        hw.write_u32(channel_address(DATA_CHANNEL, CH_AL2_CTRL), data_ctrl.to_u32());

        let control_ctrl = DmaCtrl::new()
            .with_en(true)
            .with_high_priority(true)
            .with_data_size(DATA_SIZE_WORD)
            .with_chain_to(CONTROL_CHANNEL as u8)
            .with_treq_sel(TREQ_UNPACED);
        hw.write_u32(channel_address(CONTROL_CHANNEL, CH_READ_ADDR), self.address_word_addr);
        hw.write_u32(
            channel_address(CONTROL_CHANNEL, CH_WRITE_ADDR),
            channel_address(DATA_CHANNEL, CH_AL3_READ_ADDR_TRIG),
        );
        hw.write_u32(channel_address(CONTROL_CHANNEL, CH_TRANS_COUNT), 1);
        hw.write_u32(channel_address(CONTROL_CHANNEL, CH_AL1_CTRL), control_ctrl.to_u32());
    }

    /// Load the sequencer counters, arm the DMA pair and enable the three
    /// sequencers together.
    pub fn start<H: VideoHardware>(&mut self, hw: &mut H) {
        if self.running {
            log::warn!("Vga::start(): already running");
            return;
        }
        let h = &self.mode.horizontal;
        let v = &self.mode.vertical;

        let ctrl = hw.read_u32(PIO0_BASE + PIO_CTRL) & !SM_MASK;
        hw.write_u32(
            PIO0_BASE + PIO_CTRL,
            ctrl | (SM_MASK << CTRL_SM_RESTART_SHIFT) | (SM_MASK << CTRL_CLKDIV_RESTART_SHIFT),
        );
        hw.write_u32(PIO0_BASE + PIO_IRQ, 0xff);
        self.configure_channels(hw);

        hw.write_u32(txf_address(HSYNC_SM), h.visible + h.front_porch - 1);
        hw.write_u32(txf_address(VSYNC_SM), v.visible - 1);
        hw.write_u32(txf_address(RGB_SM), h.visible - 1);

        hw.set_bits(DMA_BASE + DMA_MULTI_CHAN_TRIGGER, 1 << CONTROL_CHANNEL);
        hw.set_bits(PIO0_BASE + PIO_CTRL, SM_MASK);
        self.running = true;
        log::info!(
            "Vga::start(): {}x{} at {:.2} Hz",
            self.mode.h_res(),
            self.mode.v_res(),
            self.mode.frame_rate_hz()
        );
    }

    /// Abort both DMA channels, clear their enables and disable the sequencers.
    pub fn stop<H: VideoHardware>(&mut self, hw: &mut H) {
        hw.set_bits(DMA_BASE + DMA_CHAN_ABORT, (1 << CONTROL_CHANNEL) | (1 << DATA_CHANNEL));
        for ch in [CONTROL_CHANNEL, DATA_CHANNEL] {
            let ctrl = DmaCtrl::from_u32(hw.read_u32(channel_address(ch, CH_CTRL_TRIG)))
                .with_en(false)
                .with_busy(false);
            hw.write_u32(channel_address(ch, CH_AL1_CTRL), ctrl.to_u32());
        }
        hw.clear_bits(PIO0_BASE + PIO_CTRL, SM_MASK);
        if self.running {
            log::info!("Vga::stop(): output stopped");
        }
        self.running = false;
    }

    /// A drawing view of the framebuffer. The DMA engine keeps reading the
    /// same memory while it is borrowed.
    pub fn framebuffer<'h, H: VideoHardware>(&self, hw: &'h mut H) -> Result<Framebuffer<'h>, VgaError> {
        let count = self.word_count();
        let words = hw
            .words_mut(self.framebuffer_addr, count)
            .ok_or(VgaError::BufferSize { expected: count, actual: 0 })?;
        Framebuffer::new(self.mode, words)
    }

    pub fn stream_phase<H: VideoHardware>(&self, hw: &mut H) -> StreamPhase {
        let busy = |hw: &mut H, ch: usize| DmaCtrl::from_u32(hw.read_u32(channel_address(ch, CH_CTRL_TRIG))).busy();
        let control = busy(hw, CONTROL_CHANNEL);
        let data = busy(hw, DATA_CHANNEL);
        StreamPhase::from_busy(control, data)
    }

    pub fn mode(&self) -> &VideoMode {
        &self.mode
    }

    pub fn pins(&self) -> VgaPins {
        self.pins
    }

    pub fn clocks(&self) -> &ClockPlan {
        &self.clocks
    }

    pub fn word_count(&self) -> usize {
        self.mode.word_count()
    }

    pub fn framebuffer_address(&self) -> u32 {
        self.framebuffer_addr
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
