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
*/

//! PicoVGA headless front-end main library component.

#![forbid(unsafe_code)]

pub mod scene;

use std::{
    path::Path,
    time::{Duration, Instant},
};

use anyhow::{anyhow, bail};
use colored::Colorize;
use picovga_config::ConfigFileParams;
use picovga_core::{
    devices::monitor::{CapturedFrame, ScanTiming},
    font::Font,
    machine::Rp2040,
    Vga,
};

/// What a headless run produced.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub frames: u64,
    pub ticks: u64,
    pub sys_clock_hz: u32,
    pub timing: ScanTiming,
    /// Whether the last captured frame equals the framebuffer contents.
    pub frame_matches: bool,
    pub elapsed: Duration,
}

pub fn run() {
    env_logger::init();

    let config = match picovga_config::read_config_file("./picovga.toml") {
        Ok(config) => config,
        Err(e) => match e.downcast_ref::<std::io::Error>() {
            Some(e) if e.kind() == std::io::ErrorKind::NotFound => {
                eprintln!(
                    "Configuration file not found! Please create picovga.toml in the current directory \
                               or provide the path to configuration file with --configfile."
                );
                std::process::exit(1);
            }
            Some(e) => {
                eprintln!("Unknown IO error reading configuration file:\n{}", e);
                std::process::exit(1);
            }
            None => {
                eprintln!(
                    "Failed to parse configuration file. There may be a typo or otherwise invalid toml:\n{}",
                    e
                );
                std::process::exit(1);
            }
        },
    };

    match run_config(&config) {
        Ok(summary) => print_summary(&summary),
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            std::process::exit(1);
        }
    }
}

/// Initialize the driver on a fresh machine, draw the configured scene, scan
/// out the configured number of frames and optionally save the last one.
pub fn run_config(config: &ConfigFileParams) -> Result<RunSummary, anyhow::Error> {
    let vga_config = config.vga_config()?;
    let mut hw = Rp2040::new(config.emulator.sram_words(), vga_config.pins);
    let mut vga = Vga::init(&mut hw, vga_config)?;

    let font = Font::font8x8();
    scene::draw_scene(
        &mut vga.framebuffer(&mut hw)?,
        config.demo.scene,
        config.demo.background,
        &font,
    );

    let frames = config.emulator.frames;
    vga.start(&mut hw);
    let start = Instant::now();
    if !hw.run_frames(frames) {
        bail!("Scanout stalled before {} frames completed", frames);
    }
    let elapsed = start.elapsed();
    vga.stop(&mut hw);

    let frame = hw
        .monitor()
        .last_frame()
        .cloned()
        .ok_or_else(|| anyhow!("No frame was captured"))?;
    let frame_matches = {
        let fb = vga.framebuffer(&mut hw)?;
        frame.height() == fb.height()
            && (0..fb.height()).all(|y| (0..fb.width()).all(|x| frame.pixel(x, y) == Some(fb.pixel(x, y))))
    };
    if !frame_matches {
        log::warn!("run_config(): frame {} differs from the framebuffer", frame.index);
    }

    if let Some(path) = &config.emulator.output_png {
        write_png(&frame, path)?;
        log::info!("run_config(): wrote frame {} to {}", frame.index, path.display());
    }

    Ok(RunSummary {
        frames,
        ticks: hw.ticks(),
        sys_clock_hz: hw.sys_clock_hz(),
        timing: hw.monitor().timing(),
        frame_matches,
        elapsed,
    })
}

pub fn write_png(frame: &CapturedFrame, path: &Path) -> Result<(), anyhow::Error> {
    let image = image::RgbImage::from_raw(frame.width(), frame.height(), frame.to_rgb8())
        .ok_or_else(|| anyhow!("Frame {} has no pixels", frame.index))?;
    image.save(path)?;
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let hz = summary.sys_clock_hz as f64;
    println!(
        "Ran {} frames in {} system clocks ({:.3} ms emulated, {:.3} s host)",
        summary.frames,
        summary.ticks,
        summary.ticks as f64 * 1000.0 / hz,
        summary.elapsed.as_secs_f64()
    );
    if let (Some(line), Some(lines)) = (summary.timing.line_period_ticks, summary.timing.lines_per_frame) {
        println!(
            "Line period: {} clocks ({:.3} kHz), {} lines per frame ({:.2} Hz)",
            line,
            hz / line as f64 / 1000.0,
            lines,
            hz / (line as f64 * lines as f64)
        );
    }
    if let (Some(hsync), Some(vsync)) = (summary.timing.hsync_width_ticks, summary.timing.vsync_width_lines) {
        println!("Hsync width: {} clocks, vsync width: {} lines", hsync, vsync);
    }
    if summary.frame_matches {
        println!("Last frame: {}", "matches framebuffer".green());
    }
    else {
        println!("Last frame: {}", "differs from framebuffer".yellow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picovga_config::{read_config, CmdLineArgs};

    const SMALL: &str = r#"
        [video]
        pixel_clock_hz = 25175000
        [video.horizontal]
        visible = 160
        front_porch = 8
        sync = 24
        back_porch = 16
        [video.vertical]
        visible = 40
        front_porch = 2
        sync = 2
        back_porch = 4

        [demo]
        scene = "checker"
    "#;

    #[test]
    fn run_small_mode() {
        let config = read_config(SMALL, CmdLineArgs::default()).unwrap();
        let summary = run_config(&config).unwrap();
        assert_eq!(summary.frames, 2);
        assert!(summary.frame_matches);
        assert_eq!(summary.timing.lines_per_frame, Some(48));
        assert_eq!(summary.sys_clock_hz, 125_000_000);
    }

    #[test]
    fn first_frame_does_not_match() {
        let config = read_config(SMALL, CmdLineArgs {
            frames: Some(1),
            ..Default::default()
        })
        .unwrap();
        let summary = run_config(&config).unwrap();
        assert!(!summary.frame_matches);
    }

    #[test]
    fn writes_png() {
        let path = std::env::temp_dir().join("picovga_headless_test.png");
        let config = read_config(SMALL, CmdLineArgs {
            output_png: Some(path.clone()),
            ..Default::default()
        })
        .unwrap();
        run_config(&config).unwrap();
        let image = image::open(&path).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (160, 40));
        // Top left checker cell is black, the next one red.
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(image.get_pixel(25, 0).0, [0xff, 0, 0]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn bad_mode_is_an_error() {
        let config = read_config("[clock]\nsys_freq_hz = 50000000", CmdLineArgs::default()).unwrap();
        assert!(run_config(&config).is_err());
    }
}
