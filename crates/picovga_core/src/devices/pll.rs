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

    devices::pll.rs

    PLL_SYS register block. The system clock is derived from the 12 MHz
    crystal through the feedback divider and the two post dividers.

*/

use crate::clock::{PllSettings, SYS_CLOCK_STANDARD_HZ};

pub const PLL_SYS_BASE: u32 = 0x4002_8000;
pub const PLL_CS: u32 = 0x00;
pub const PLL_PWR: u32 = 0x04;
pub const PLL_FBDIV_INT: u32 = 0x08;
pub const PLL_PRIM: u32 = 0x0c;

pub struct Pll {
    fbdiv_int: u32,
    prim: u32,
}

impl Pll {
    pub fn new() -> Self {
        // Boot setup for 125 MHz.
        let settings = PllSettings {
            fbdiv:    SYS_CLOCK_STANDARD_HZ / 1_000_000,
            postdiv1: 6,
            postdiv2: 2,
        };
        Self {
            fbdiv_int: settings.fbdiv,
            prim: settings.prim(),
        }
    }

    pub fn settings(&self) -> PllSettings {
        PllSettings::from_registers(self.fbdiv_int, self.prim)
    }

    pub fn sys_clock_hz(&self) -> u32 {
        self.settings().output_hz()
    }

    pub fn read_u32(&self, offset: u32) -> u32 {
        match offset {
            // LOCK is always reported.
            PLL_CS => 1 << 31,
            PLL_FBDIV_INT => self.fbdiv_int,
            PLL_PRIM => self.prim,
            _ => 0,
        }
    }

    pub fn write_u32(&mut self, offset: u32, data: u32) {
        match offset {
            PLL_FBDIV_INT => self.fbdiv_int = data & 0xfff,
            PLL_PRIM => self.prim = data & 0x0007_7000,
            _ => {
                log::trace!("PLL_SYS: ignored write of {:08X} to offset {:#04x}", data, offset);
                return;
            }
        }
        log::debug!("PLL_SYS: system clock now {} Hz", self.sys_clock_hz());
    }
}
