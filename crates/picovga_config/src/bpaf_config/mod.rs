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

use std::path::PathBuf;

use picovga_core::color::Color;

use crate::DemoScene;

use bpaf::Bpaf;

#[derive(Bpaf, Debug, Default)]
#[bpaf(options, version, generate(cli_args))]
pub struct CmdLineArgs {
    #[bpaf(long("config_file"), long("configfile"))]
    pub config_file: Option<PathBuf>,

    /// Run the system clock at 250MHz instead of 125MHz
    #[bpaf(long, switch)]
    pub overclock: bool,

    #[bpaf(long("sys_freq_hz"), long("sysfreq"))]
    pub sys_freq_hz: Option<u32>,

    /// Video mode preset, e.g. 640x480
    #[bpaf(long)]
    pub mode: Option<String>,

    /// Number of frames to scan out
    #[bpaf(long)]
    pub frames: Option<u64>,

    #[bpaf(long("output_png"), long("png"))]
    pub output_png: Option<PathBuf>,

    /// shapes, checker, plot or text
    #[bpaf(long)]
    pub scene: Option<DemoScene>,

    #[bpaf(long)]
    pub background: Option<Color>,
}
