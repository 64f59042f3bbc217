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

    tests::lifecycle.rs

    Driver start/stop and initialization failure paths against the
    emulated machine.

*/

use picovga_core::{
    bus::VideoHardware,
    color::*,
    devices::{
        dma::{channel_address, StreamPhase, CH_TRANS_COUNT},
        pio::{PIO0_BASE, PIO_CTRL},
        sram::SRAM_DEFAULT_WORDS,
    },
    driver::{Vga, VgaConfig, CONTROL_CHANNEL, DATA_CHANNEL},
    machine::Rp2040,
    mode::{Timing, VgaPins, VideoMode},
    VgaError,
};

const SMALL_MODE: VideoMode = VideoMode {
    horizontal: Timing::new(160, 8, 24, 16),
    vertical: Timing::new(40, 2, 2, 4),
    pixel_clock_hz: 25_175_000,
};

fn small_config() -> VgaConfig {
    VgaConfig {
        mode: SMALL_MODE,
        ..Default::default()
    }
}

#[test]
fn start_arms_control_channel_and_stop_disables_both() {
    let mut hw = Rp2040::default();
    let mut vga = Vga::init(&mut hw, VgaConfig::default()).unwrap();
    vga.start(&mut hw);

    assert_eq!(hw.read_u32(channel_address(CONTROL_CHANNEL, CH_TRANS_COUNT)), 1);
    assert_eq!(hw.read_u32(channel_address(DATA_CHANNEL, CH_TRANS_COUNT)), 30720);
    assert_eq!(hw.read_u32(PIO0_BASE + PIO_CTRL) & 0b111, 0b111);

    hw.run_ticks(1000);
    assert_eq!(vga.stream_phase(&mut hw), StreamPhase::Streaming);

    vga.stop(&mut hw);
    assert!(!hw.dma().channel(CONTROL_CHANNEL).unwrap().is_enabled());
    assert!(!hw.dma().channel(DATA_CHANNEL).unwrap().is_enabled());
    assert_eq!(hw.read_u32(PIO0_BASE + PIO_CTRL), 0);

    // Nothing moves once stopped.
    let transfers = hw.dma().channel(DATA_CHANNEL).unwrap().transfers();
    hw.run_ticks(1000);
    assert_eq!(hw.dma().channel(DATA_CHANNEL).unwrap().transfers(), transfers);
}

#[test]
fn stopped_output_completes_no_frames() {
    let mut hw = Rp2040::default();
    let mut vga = Vga::init(&mut hw, small_config()).unwrap();
    vga.start(&mut hw);
    assert!(hw.run_frames(1));
    vga.stop(&mut hw);

    let completed = hw.monitor().frames_completed();
    hw.run_ticks(200_000);
    assert_eq!(hw.monitor().frames_completed(), completed);
}

#[test]
fn restart_after_stop_resumes_scanout() {
    let mut hw = Rp2040::default();
    let mut vga = Vga::init(&mut hw, small_config()).unwrap();
    vga.start(&mut hw);
    assert!(hw.run_frames(1));
    hw.run_ticks(12_345);
    vga.stop(&mut hw);

    {
        let mut fb = vga.framebuffer(&mut hw).unwrap();
        fb.fill_all(CYAN);
        fb.fill_rect(10, 5, 60, 30, MAGENTA);
    }
    vga.start(&mut hw);
    assert!(vga.is_running());

    // The first frame after a restart may carry a partial row from before
    // the stop, and the second leads with the line length word.
    assert!(hw.run_frames(3));
    let frame = hw.monitor().last_frame().unwrap().clone();
    let fb = vga.framebuffer(&mut hw).unwrap();
    assert_eq!(frame.height(), 40);
    for y in 0..fb.height() {
        for x in 0..fb.width() {
            assert_eq!(frame.pixel(x, y), Some(fb.pixel(x, y)), "({}, {})", x, y);
        }
    }
}

#[test]
fn out_of_memory_leaves_hardware_untouched() {
    let mut hw = Rp2040::new(10_000, VgaPins::default());
    let result = Vga::init(&mut hw, VgaConfig::default());
    assert_eq!(
        result.err(),
        Some(VgaError::OutOfMemory {
            requested: 30721,
            available: 10_000
        })
    );
    assert_eq!(hw.sram().free_words(), 10_000);
    assert!(hw.pio().sm(0).unwrap().program().is_none());
    assert_eq!(hw.read_u32(PIO0_BASE + PIO_CTRL), 0);
    assert!(!hw.dma().channel(DATA_CHANNEL).unwrap().is_enabled());
}

#[test]
fn no_room_for_address_word_claims_nothing() {
    // Room for the framebuffer but not for the DMA address word after it.
    let mut hw = Rp2040::new(30720, VgaPins::default());
    let result = Vga::init(&mut hw, VgaConfig::default());
    assert_eq!(
        result.err(),
        Some(VgaError::OutOfMemory {
            requested: 30721,
            available: 30720
        })
    );
    assert_eq!(hw.sram().free_words(), 30720);
    assert!(hw.pio().sm(2).unwrap().program().is_none());

    let mut hw = Rp2040::new(30721, VgaPins::default());
    let vga = Vga::init(&mut hw, VgaConfig::default()).unwrap();
    assert_eq!(hw.sram().free_words(), 0);
    assert_eq!(hw.read_u32(vga.framebuffer_address() + 30720 * 4), vga.framebuffer_address());
}

#[test]
fn bad_pins_are_rejected_before_allocation() {
    for pins in [
        VgaPins {
            hsync: 40,
            ..Default::default()
        },
        VgaPins {
            color_base: 3,
            ..Default::default()
        },
    ] {
        let mut hw = Rp2040::default();
        let result = Vga::init(&mut hw, VgaConfig { pins, ..Default::default() });
        assert!(matches!(result, Err(VgaError::InvalidPins { .. })), "{:?}", pins);
        assert_eq!(hw.sram().free_words(), SRAM_DEFAULT_WORDS);
        assert!(hw.pio().sm(0).unwrap().program().is_none());
        assert_eq!(hw.sys_clock_hz(), 125_000_000);
    }
}

#[test]
fn bad_clock_is_rejected_before_allocation() {
    let mut hw = Rp2040::default();
    let result = Vga::init(
        &mut hw,
        VgaConfig {
            sys_clock_hz: 300_000_000,
            ..Default::default()
        },
    );
    assert_eq!(
        result.err(),
        Some(VgaError::ClockOutOfRange {
            requested_hz: 300_000_000
        })
    );
    assert_eq!(hw.sys_clock_hz(), 125_000_000);
    assert_eq!(hw.sram().free_words(), SRAM_DEFAULT_WORDS);
}

#[test]
fn misaligned_mode_is_rejected() {
    let mut hw = Rp2040::default();
    let mode = VideoMode {
        horizontal: Timing::new(644, 12, 96, 48),
        ..VideoMode::VGA_640X480
    };
    let result = Vga::init(
        &mut hw,
        VgaConfig {
            mode,
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(VgaError::MisalignedMode { h_res: 644, .. })));
    assert_eq!(hw.sram().free_words(), SRAM_DEFAULT_WORDS);
    assert!(hw.pio().sm(2).unwrap().program().is_none());
}

#[test]
fn custom_pins_reach_the_monitor() {
    let pins = VgaPins {
        color_base: 8,
        hsync: 12,
        vsync: 13,
    };
    let mut hw = Rp2040::new(SRAM_DEFAULT_WORDS, pins);
    let mut vga = Vga::init(
        &mut hw,
        VgaConfig {
            pins,
            ..small_config()
        },
    )
    .unwrap();
    vga.framebuffer(&mut hw).unwrap().fill_all(RED);
    vga.start(&mut hw);
    assert!(hw.run_frames(2));

    assert_eq!(hw.gpio() & 0xff, 0);
    let frame = hw.monitor().last_frame().unwrap();
    assert_eq!(frame.height(), 40);
    assert!(frame.rows.iter().flatten().all(|c| *c == RED));
}
