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

    clock.rs

    System PLL settings and the 16.8 fixed point sequencer clock divider.

*/

use crate::error::VgaError;

/// Crystal oscillator reference feeding the system PLL.
pub const XOSC_HZ: u32 = 12_000_000;

pub const SYS_CLOCK_MIN_HZ: u32 = 100_000_000;
pub const SYS_CLOCK_MAX_HZ: u32 = 250_000_000;
pub const SYS_CLOCK_STANDARD_HZ: u32 = 125_000_000;
pub const SYS_CLOCK_OVERCLOCK_HZ: u32 = 250_000_000;

// Above this the VCO would leave its range with the default post dividers.
const PLL_DEFAULT_POSTDIV_LIMIT_HZ: u32 = 130_000_000;

/// Feedback and post divider settings for the system PLL.
/// The output clock is `XOSC * fbdiv / (postdiv1 * postdiv2)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PllSettings {
    pub fbdiv:    u32,
    pub postdiv1: u32,
    pub postdiv2: u32,
}

impl PllSettings {
    /// Choose PLL settings for the requested system clock.
    ///
    /// Requests are rounded down to the PLL step: 1 MHz up to 130 MHz, 2 MHz above.
    pub fn for_sys_clock(hz: u32) -> Result<PllSettings, VgaError> {
        if !(SYS_CLOCK_MIN_HZ..=SYS_CLOCK_MAX_HZ).contains(&hz) {
            return Err(VgaError::ClockOutOfRange { requested_hz: hz });
        }
        let settings = if hz <= PLL_DEFAULT_POSTDIV_LIMIT_HZ {
            PllSettings {
                fbdiv:    hz / 1_000_000,
                postdiv1: 6,
                postdiv2: 2,
            }
        }
        else {
            PllSettings {
                fbdiv:    hz / 2_000_000,
                postdiv1: 3,
                postdiv2: 2,
            }
        };
        Ok(settings)
    }

    /// Decode settings from the FBDIV_INT and PRIM register values.
    pub fn from_registers(fbdiv_int: u32, prim: u32) -> PllSettings {
        PllSettings {
            fbdiv:    fbdiv_int & 0xFFF,
            postdiv1: (prim >> 16) & 0x7,
            postdiv2: (prim >> 12) & 0x7,
        }
    }

    /// Value for the PRIM register.
    pub fn prim(&self) -> u32 {
        (self.postdiv1 << 16) | (self.postdiv2 << 12)
    }

    pub fn vco_hz(&self) -> u64 {
        XOSC_HZ as u64 * self.fbdiv as u64
    }

    pub fn output_hz(&self) -> u32 {
        let post = self.postdiv1 * self.postdiv2;
        if post == 0 {
            return 0;
        }
        (self.vco_hz() / post as u64) as u32
    }
}

/// Sequencer clock divider in 16.8 fixed point. An integer part of 0 is
/// read by the hardware as 65536.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClockDivider {
    pub int:  u16,
    pub frac: u8,
}

impl ClockDivider {
    pub const ONE: ClockDivider = ClockDivider { int: 1, frac: 0 };

    /// Divider that brings `sys_hz` closest to `target_hz`.
    pub fn from_frequencies(sys_hz: u32, target_hz: u32) -> Result<ClockDivider, VgaError> {
        if target_hz == 0 || target_hz > sys_hz {
            return Err(VgaError::InvalidTiming(format!(
                "sequencer clock of {} Hz cannot be derived from a {} Hz system clock",
                target_hz, sys_hz
            )));
        }
        let fixed = (sys_hz as u64 * 256 + target_hz as u64 / 2) / target_hz as u64;
        if fixed > 0xFF_FFFF {
            return Err(VgaError::InvalidTiming(format!(
                "sequencer clock of {} Hz needs a divider above 65535",
                target_hz
            )));
        }
        Ok(ClockDivider::from_fixed(fixed as u32))
    }

    pub fn from_fixed(fixed: u32) -> ClockDivider {
        ClockDivider {
            int:  (fixed >> 8) as u16,
            frac: (fixed & 0xFF) as u8,
        }
    }

    /// The divider as a count of 1/256 system clocks.
    pub fn fixed(&self) -> u32 {
        let int = if self.int == 0 { 0x1_0000 } else { self.int as u32 };
        (int << 8) | self.frac as u32
    }

    /// Encoding for a SMx_CLKDIV register.
    pub fn to_register(&self) -> u32 {
        ((self.int as u32) << 16) | ((self.frac as u32) << 8)
    }

    pub fn from_register(bits: u32) -> ClockDivider {
        ClockDivider {
            int:  (bits >> 16) as u16,
            frac: ((bits >> 8) & 0xFF) as u8,
        }
    }

    pub fn output_hz(&self, sys_hz: u32) -> f64 {
        sys_hz as f64 * 256.0 / self.fixed() as f64
    }
}

impl Default for ClockDivider {
    fn default() -> Self {
        ClockDivider::ONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pll_standard_and_overclock() {
        let std = PllSettings::for_sys_clock(SYS_CLOCK_STANDARD_HZ).unwrap();
        assert_eq!(std, PllSettings { fbdiv: 125, postdiv1: 6, postdiv2: 2 });
        assert_eq!(std.output_hz(), 125_000_000);

        let oc = PllSettings::for_sys_clock(SYS_CLOCK_OVERCLOCK_HZ).unwrap();
        assert_eq!(oc, PllSettings { fbdiv: 125, postdiv1: 3, postdiv2: 2 });
        assert_eq!(oc.output_hz(), 250_000_000);
        assert_eq!(PllSettings::from_registers(oc.fbdiv, oc.prim()), oc);
    }

    #[test]
    fn pll_rejects_out_of_range() {
        assert_eq!(
            PllSettings::for_sys_clock(99_999_999),
            Err(VgaError::ClockOutOfRange { requested_hz: 99_999_999 })
        );
        assert!(PllSettings::for_sys_clock(251_000_000).is_err());
    }

    #[test]
    fn pll_vco_stays_in_range() {
        for mhz in 100..=250 {
            let pll = PllSettings::for_sys_clock(mhz * 1_000_000).unwrap();
            let vco = pll.vco_hz();
            assert!((400_000_000..=1_600_000_000).contains(&vco), "{} MHz -> vco {}", mhz, vco);
        }
    }

    #[test]
    fn divider_for_pixel_clock() {
        let div = ClockDivider::from_frequencies(125_000_000, 25_175_000).unwrap();
        assert_eq!(div.int, 4);
        assert_eq!(div.frac, 247);
        assert!((div.output_hz(125_000_000) - 25_175_000.0).abs() < 10_000.0);
        assert_eq!(ClockDivider::from_register(div.to_register()), div);

        assert_eq!(ClockDivider::from_frequencies(125_000_000, 125_000_000).unwrap(), ClockDivider::ONE);
        assert!(ClockDivider::from_frequencies(125_000_000, 130_000_000).is_err());
    }
}
