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

//! The `picovga_config` crate parses PicoVGA's configuration file and
//! overlays command line arguments on top of it. Command line arguments
//! always take priority over the configuration file.
//!
//! Features:
//! - `use_bpaf`: Enable BPAF support for command line argument parsing.

#[cfg(feature = "use_bpaf")]
mod bpaf_config;
#[cfg(not(feature = "use_bpaf"))]
mod no_args;

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

#[cfg(feature = "use_bpaf")]
use bpaf_config::cli_args;
#[cfg(feature = "use_bpaf")]
pub use bpaf_config::CmdLineArgs;
#[cfg(not(feature = "use_bpaf"))]
pub use no_args::CmdLineArgs;

use anyhow::bail;
use cfg_if::cfg_if;
use picovga_core::{
    clock::{SYS_CLOCK_OVERCLOCK_HZ, SYS_CLOCK_STANDARD_HZ},
    color::Color,
    devices::sram::SRAM_DEFAULT_WORDS,
    driver::VgaConfig,
    mode::{Timing, VgaPins, VideoMode},
};
use serde_derive::Deserialize;

const fn _default_frames() -> u64 {
    2
}

#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DemoScene {
    #[default]
    Shapes,
    Checker,
    Plot,
    Text,
}

impl FromStr for DemoScene {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String>
    where
        Self: Sized,
    {
        match s.to_lowercase().as_str() {
            "shapes" => Ok(DemoScene::Shapes),
            "checker" => Ok(DemoScene::Checker),
            "plot" => Ok(DemoScene::Plot),
            "text" => Ok(DemoScene::Text),
            _ => Err("Bad value for scene".to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Clock {
    #[serde(default)]
    pub overclock: bool,
    pub sys_freq_hz: Option<u32>,
}

impl Clock {
    /// An explicit frequency wins over the overclock switch.
    pub fn sys_clock_hz(&self) -> u32 {
        match (self.sys_freq_hz, self.overclock) {
            (Some(hz), _) => hz,
            (None, true) => SYS_CLOCK_OVERCLOCK_HZ,
            (None, false) => SYS_CLOCK_STANDARD_HZ,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Video {
    pub mode: Option<String>,
    pub horizontal: Option<Timing>,
    pub vertical: Option<Timing>,
    pub pixel_clock_hz: Option<u32>,
}

impl Video {
    /// Resolve the configured mode. A preset is used as the base and any
    /// explicit timing table replaces the matching part of it.
    pub fn video_mode(&self) -> Result<VideoMode, anyhow::Error> {
        let mut mode = match self.mode.as_deref() {
            None | Some("640x480") => VideoMode::VGA_640X480,
            Some(other) => bail!("Unknown video mode preset: {}", other),
        };
        if let Some(horizontal) = self.horizontal {
            mode.horizontal = horizontal;
        }
        if let Some(vertical) = self.vertical {
            mode.vertical = vertical;
        }
        if let Some(hz) = self.pixel_clock_hz {
            mode.pixel_clock_hz = hz;
        }
        Ok(mode)
    }
}

#[derive(Debug, Deserialize)]
pub struct Emulator {
    #[serde(default = "_default_frames")]
    pub frames: u64,
    pub sram_words: Option<usize>,
    pub output_png: Option<PathBuf>,
}

impl Default for Emulator {
    fn default() -> Self {
        Self {
            frames: _default_frames(),
            sram_words: None,
            output_png: None,
        }
    }
}

impl Emulator {
    pub fn sram_words(&self) -> usize {
        self.sram_words.unwrap_or(SRAM_DEFAULT_WORDS)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Demo {
    #[serde(default)]
    pub scene: DemoScene,
    #[serde(default)]
    pub background: Color,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFileParams {
    #[serde(default)]
    pub clock: Clock,
    #[serde(default)]
    pub video: Video,
    #[serde(default)]
    pub pins: VgaPins,
    #[serde(default)]
    pub emulator: Emulator,
    #[serde(default)]
    pub demo: Demo,
}

impl ConfigFileParams {
    pub fn overlay(&mut self, shell_args: CmdLineArgs) {
        self.clock.overclock |= shell_args.overclock;
        if let Some(hz) = shell_args.sys_freq_hz {
            self.clock.sys_freq_hz = Some(hz);
        }
        if let Some(mode) = shell_args.mode {
            self.video.mode = Some(mode);
        }
        if let Some(frames) = shell_args.frames {
            self.emulator.frames = frames;
        }
        if let Some(output_png) = shell_args.output_png {
            self.emulator.output_png = Some(output_png);
        }
        if let Some(scene) = shell_args.scene {
            self.demo.scene = scene;
        }
        if let Some(background) = shell_args.background {
            self.demo.background = background;
        }
    }

    /// Build the driver configuration described by this file.
    pub fn vga_config(&self) -> Result<VgaConfig, anyhow::Error> {
        let config = VgaConfig {
            mode: self.video.video_mode()?,
            sys_clock_hz: self.clock.sys_clock_hz(),
            pins: self.pins,
        };
        config.pins.validate()?;
        Ok(config)
    }
}

pub fn read_config(toml_string: impl AsRef<str>, shell_args: CmdLineArgs) -> Result<ConfigFileParams, anyhow::Error> {
    let mut toml_args: ConfigFileParams = toml::from_str(toml_string.as_ref())?;
    log::debug!("toml_config: {:?}", toml_args);

    // Command line arguments override config file arguments
    toml_args.overlay(shell_args);
    Ok(toml_args)
}

fn shell_args() -> CmdLineArgs {
    let shell_args: CmdLineArgs;

    cfg_if! {
        if #[cfg(feature = "use_bpaf")] {
            log::debug!("Reading command line arguments...");
            shell_args = cli_args().run();
        } else {
            log::debug!("Argument reading disabled...");
            shell_args = CmdLineArgs::default();
        }
    }
    shell_args
}

/// Read the TOML configuration from a file path, parse and overlay command line arguments.
pub fn read_config_file<P>(default_path: P) -> Result<ConfigFileParams, anyhow::Error>
where
    P: AsRef<Path>,
{
    let shell_args = shell_args();

    // Allow configuration file path to be overridden by command line argument 'config_file'
    let toml_string = if let Some(configfile_path) = shell_args.config_file.as_ref() {
        std::fs::read_to_string(configfile_path)?
    }
    else {
        std::fs::read_to_string(default_path)?
    };

    read_config(toml_string, shell_args)
}

/// Read the TOML configuration from a string, parse and overlay command line arguments.
pub fn read_config_string(toml_string: impl AsRef<str>) -> Result<ConfigFileParams, anyhow::Error> {
    read_config(toml_string, shell_args())
}
