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

    benches::machine_bench.rs

    Benchmarks for the emulated scanout machine.

*/

use criterion::{criterion_group, criterion_main, Criterion};
use picovga_core::{
    driver::{Vga, VgaConfig},
    machine::Rp2040,
    mode::{Timing, VideoMode},
};

const SMALL_MODE: VideoMode = VideoMode {
    horizontal: Timing::new(160, 8, 24, 16),
    vertical: Timing::new(40, 2, 2, 4),
    pixel_clock_hz: 25_175_000,
};

fn running_machine(mode: VideoMode) -> Rp2040 {
    let mut hw = Rp2040::default();
    let mut vga = Vga::init(
        &mut hw,
        VgaConfig {
            mode,
            ..Default::default()
        },
    )
    .unwrap();
    vga.start(&mut hw);
    hw
}

pub fn machine_bench(c: &mut Criterion) {
    c.bench_function("machine_bench_tick", |b| {
        let mut hw = running_machine(VideoMode::VGA_640X480);
        b.iter(|| {
            hw.tick();
        });
    });

    c.bench_function("machine_bench_line", |b| {
        let mut hw = running_machine(VideoMode::VGA_640X480);
        b.iter(|| {
            // 800 pixel clocks at 4+247/256 system clocks each.
            hw.run_ticks(3972);
        });
    });

    c.bench_function("machine_bench_small_frame", |b| {
        let mut hw = running_machine(SMALL_MODE);
        b.iter(|| {
            hw.run_frames(1);
        });
    });
}

criterion_group!(benches, machine_bench);
criterion_main!(benches);
