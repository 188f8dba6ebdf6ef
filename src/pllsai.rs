//! PLLSAI and the LCD-TFT clock divider.
//!
//! PLLSAI shares the main PLL's /M input stage. Its R output goes through
//! PLLSAIDIVR, which lives in `DCKCFGR` outside the PLL, before reaching the
//! LTDC. The divider pair is searched so that the LCD clock lands in the
//! panel's window rather than taken on trust.

use crate::bounds::{self, FrequencyRange};
use crate::error::{ClockError, Pll};
use crate::field::set_field;
use crate::regs::{cr, dckcfgr, pllsaicfgr, ClockRegisters, Register};

const R_DIVIDERS: core::ops::RangeInclusive<u32> = 2..=7;
const DIVR_DIVIDERS: [u32; 4] = [2, 4, 8, 16];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayClockPlan {
    pub vco_output_hz: u32,
    /// Pin the R divider; `None` searches 2..=7.
    pub r: Option<u32>,
    pub lcd_range: FrequencyRange,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayClockSettings {
    pub n: u32,
    pub r: u32,
    /// Post divider value, one of 2, 4, 8, 16.
    pub divr: u32,
    pub vco_output_hz: u32,
    pub pllsai_r_hz: u32,
    pub lcd_hz: u32,
}

impl DisplayClockSettings {
    /// `vco_input_hz` is what the main PLL's M divider already produces.
    ///
    /// R is tried in ascending order, and for each R the post divider in
    /// ascending order; the first pair inside the window wins.
    pub fn resolve(vco_input_hz: u32, plan: &DisplayClockPlan) -> Result<Self, ClockError> {
        bounds::VCO_INPUT.check(vco_input_hz)?;
        let n = bounds::PLLSAIN.check(plan.vco_output_hz / vco_input_hz)?;
        let vco_output_hz = bounds::VCO_OUTPUT.check(vco_input_hz * n)?;
        if let Some(r) = plan.r {
            bounds::PLLSAIR.check(r)?;
        }

        for r in R_DIVIDERS {
            if plan.r.map_or(false, |fixed| fixed != r) {
                continue;
            }
            let pllsai_r_hz = vco_output_hz / r;
            for &divr in DIVR_DIVIDERS.iter() {
                let lcd_hz = pllsai_r_hz / divr;
                if plan.lcd_range.contains(lcd_hz) {
                    return Ok(DisplayClockSettings {
                        n,
                        r,
                        divr,
                        vco_output_hz,
                        pllsai_r_hz,
                        lcd_hz,
                    });
                }
            }
        }
        Err(ClockError::NoDividerFits {
            what: plan.lcd_range.what,
            input_hz: vco_output_hz,
        })
    }

    /// 2-bit PLLSAIDIVR code: /2 -> 0b00 ... /16 -> 0b11.
    pub fn divr_code(&self) -> u32 {
        divr_code(self.divr)
    }
}

fn divr_code(divr: u32) -> u32 {
    divr.trailing_zeros() - 1
}

/// Writes PLLSAIN and PLLSAIR, then PLLSAIDIVR.
///
/// All three values are validated before the first write, so a rejected
/// setting leaves both registers untouched. PLLSAIQ is preserved.
pub fn apply<R: ClockRegisters>(
    regs: &mut R,
    settings: &DisplayClockSettings,
) -> Result<(), ClockError> {
    if regs.is_set(Register::RccCr, cr::PLLSAION)? {
        return Err(ClockError::PllRunning { pll: Pll::Sai });
    }
    let n = bounds::PLLSAIN.check(settings.n)?;
    let r = bounds::PLLSAIR.check(settings.r)?;
    let divr = bounds::PLLSAIDIVR.check(settings.divr)?;

    regs.modify(Register::RccPllsaicfgr, |w| {
        set_field(w, pllsaicfgr::PLLSAIN, n)?;
        set_field(w, pllsaicfgr::PLLSAIR, r)
    })?;
    regs.modify(Register::RccDckcfgr, |w| {
        set_field(w, dckcfgr::PLLSAIDIVR, divr_code(divr))
    })
}

/// Resolves `plan` against the shared VCO input and programs PLLSAI.
pub fn configure<R: ClockRegisters>(
    regs: &mut R,
    vco_input_hz: u32,
    plan: &DisplayClockPlan,
) -> Result<DisplayClockSettings, ClockError> {
    let settings = DisplayClockSettings::resolve(vco_input_hz, plan)?;
    apply(regs, &settings)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::read_field;
    use crate::sim::SimulatedRcc;

    const MHZ: u32 = 1_000_000;

    fn plan(vco_out: u32, r: Option<u32>) -> DisplayClockPlan {
        DisplayClockPlan {
            vco_output_hz: vco_out * MHZ,
            r,
            lcd_range: bounds::LCD_CLOCK,
        }
    }

    #[test]
    fn hundred_mhz_vco_gives_6_25_mhz_pixel_clock() {
        let mut sim = SimulatedRcc::new();
        let s = configure(&mut sim, 2 * MHZ, &plan(100, Some(2))).unwrap();
        assert_eq!((s.n, s.r, s.divr), (50, 2, 8));
        assert_eq!(s.vco_output_hz, 100 * MHZ);
        assert_eq!(s.pllsai_r_hz, 50 * MHZ);
        assert_eq!(s.lcd_hz, 6_250_000);
        assert!(bounds::LCD_CLOCK.contains(s.lcd_hz));

        let saicfgr = sim.word(Register::RccPllsaicfgr);
        assert_eq!(read_field(saicfgr, pllsaicfgr::PLLSAIN), Ok(50));
        assert_eq!(read_field(saicfgr, pllsaicfgr::PLLSAIR), Ok(2));
        assert_eq!(read_field(saicfgr, pllsaicfgr::PLLSAIQ), Ok(4));
        // /8 is code 0b10: bit 17 set, bit 16 clear
        assert_eq!(sim.word(Register::RccDckcfgr), 1 << 17);
    }

    #[test]
    fn search_picks_smallest_r_then_smallest_divider() {
        let s = DisplayClockSettings::resolve(2 * MHZ, &plan(100, None)).unwrap();
        assert_eq!((s.r, s.divr, s.lcd_hz), (2, 8, 6_250_000));

        let wide = DisplayClockPlan {
            vco_output_hz: 192 * MHZ,
            r: None,
            lcd_range: FrequencyRange::new("LCD clock", 9 * MHZ, 10 * MHZ),
        };
        let s = DisplayClockSettings::resolve(2 * MHZ, &wide).unwrap();
        assert_eq!((s.n, s.r, s.divr, s.lcd_hz), (96, 5, 4, 9_600_000));
    }

    #[test]
    fn pinned_r_that_cannot_reach_the_window_fails() {
        let err = DisplayClockSettings::resolve(2 * MHZ, &plan(432, Some(2))).unwrap_err();
        assert_eq!(
            err,
            ClockError::NoDividerFits {
                what: "LCD clock",
                input_hz: 432 * MHZ
            }
        );
    }

    #[test]
    fn reserved_r_is_rejected() {
        for &r in [0, 1, 8].iter() {
            assert_eq!(
                DisplayClockSettings::resolve(2 * MHZ, &plan(100, Some(r))),
                Err(ClockError::OutOfRange {
                    field: "PLLSAIR",
                    value: r
                })
            );
        }
    }

    #[test]
    fn invalid_settings_never_reach_the_registers() {
        let good = DisplayClockSettings::resolve(2 * MHZ, &plan(100, Some(2))).unwrap();
        let mut bad = [good; 9];
        bad[0].n = 0;
        bad[1].n = 1;
        bad[2].n = 433;
        bad[3].r = 0;
        bad[4].r = 1;
        bad[5].r = 8;
        bad[6].divr = 3;
        bad[7].divr = 1;
        bad[8].divr = 32;
        for settings in bad.iter() {
            let mut sim = SimulatedRcc::new();
            assert!(matches!(
                apply(&mut sim, settings),
                Err(ClockError::OutOfRange { .. })
            ));
            assert_eq!(sim.write_count(), 0, "{:?}", settings);
        }
    }

    #[test]
    fn running_pllsai_is_not_reconfigured() {
        let mut sim = SimulatedRcc::new();
        sim.seed(Register::RccCr, 1 << cr::PLLSAION.offset);
        assert_eq!(
            configure(&mut sim, 2 * MHZ, &plan(100, Some(2))),
            Err(ClockError::PllRunning { pll: Pll::Sai })
        );
        assert_eq!(sim.write_count(), 0);
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let mut sim = SimulatedRcc::new();
        configure(&mut sim, 2 * MHZ, &plan(100, None)).unwrap();
        let once = (sim.word(Register::RccPllsaicfgr), sim.word(Register::RccDckcfgr));
        configure(&mut sim, 2 * MHZ, &plan(100, None)).unwrap();
        assert_eq!(
            (sim.word(Register::RccPllsaicfgr), sim.word(Register::RccDckcfgr)),
            once
        );
    }

    #[test]
    fn unrelated_bits_survive() {
        let mut sim = SimulatedRcc::new();
        sim.seed(Register::RccPllsaicfgr, 0x8F00_803F);
        sim.seed(Register::RccDckcfgr, 0xFFFC_FFFF);
        configure(&mut sim, 2 * MHZ, &plan(100, Some(2))).unwrap();
        assert_eq!(sim.word(Register::RccPllsaicfgr) & !0x7000_7FC0, 0x8F00_803F);
        assert_eq!(sim.word(Register::RccDckcfgr) & !0x0003_0000, 0xFFFC_FFFF);
    }
}
