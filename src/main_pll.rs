//! Main PLL: HSE -> /M -> VCO (xN) -> /P -> SYSCLK.

use core::convert::TryFrom;

use crate::bounds;
use crate::error::{ClockError, Pll};
use crate::field::set_field;
use crate::regs::{cr, pllcfgr, ClockRegisters, Register};

const PLLP_DIVIDERS: [u32; 4] = [2, 4, 6, 8];

/// What the main PLL should produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MainPllPlan {
    pub hse_hz: u32,
    /// 1-2 MHz, 2 MHz keeps jitter lowest.
    pub vco_input_hz: u32,
    /// 100-432 MHz.
    pub vco_output_hz: u32,
    pub sysclk_hz: u32,
}

/// Divider values derived from a [`MainPllPlan`], and the frequencies they give.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MainPllSettings {
    pub m: u32,
    pub n: u32,
    pub p: u32,
    pub vco_input_hz: u32,
    pub vco_output_hz: u32,
    pub sysclk_hz: u32,
}

impl MainPllSettings {
    /// Derives M, N and P. M rounds up and N down when the crystal does not
    /// divide evenly. P is the smallest divider that keeps the output at or
    /// below both the requested SYSCLK and `ceiling_hz`.
    pub fn resolve(plan: &MainPllPlan, ceiling_hz: u32) -> Result<Self, ClockError> {
        bounds::VCO_INPUT.check(plan.vco_input_hz)?;
        // VCO input never above the request
        let mut m = plan.hse_hz / plan.vco_input_hz;
        if plan.hse_hz % plan.vco_input_hz != 0 {
            m += 1;
        }
        let m = bounds::PLLM.check(m)?;
        let vco_input_hz = bounds::VCO_INPUT.check(plan.hse_hz / m)?;

        let hse = u64::from(plan.hse_hz);
        let n = u64::from(plan.vco_output_hz) * u64::from(m) / hse;
        let n = bounds::PLLN.check(u32::try_from(n).unwrap_or(u32::MAX))?;
        let vco_output_hz = u32::try_from(hse * u64::from(n) / u64::from(m)).unwrap_or(u32::MAX);
        let vco_output_hz = bounds::VCO_OUTPUT.check(vco_output_hz)?;

        let limit = u64::from(plan.sysclk_hz.min(ceiling_hz));
        let p = PLLP_DIVIDERS
            .iter()
            .copied()
            .find(|&p| u64::from(vco_output_hz) <= limit * u64::from(p))
            .ok_or(ClockError::NoDividerFits {
                what: "SYSCLK",
                input_hz: vco_output_hz,
            })?;
        let p = bounds::PLLP.check(p)?;

        Ok(MainPllSettings {
            m,
            n,
            p,
            vco_input_hz,
            vco_output_hz,
            sysclk_hz: vco_output_hz / p,
        })
    }

    /// 2-bit PLLP code: /2 -> 0b00 ... /8 -> 0b11.
    pub fn p_code(&self) -> u32 {
        self.p / 2 - 1
    }
}

/// Fails if either PLL is switched on.
///
/// PLLM and the PLL source feed PLLSAI too, so `PLLCFGR` is only safe to
/// touch with both PLLs off.
pub fn ensure_stopped<R: ClockRegisters>(regs: &mut R) -> Result<(), ClockError> {
    if regs.is_set(Register::RccCr, cr::PLLON)? {
        return Err(ClockError::PllRunning { pll: Pll::Main });
    }
    if regs.is_set(Register::RccCr, cr::PLLSAION)? {
        return Err(ClockError::PllRunning { pll: Pll::Sai });
    }
    Ok(())
}

/// Writes M, N, P and selects HSE as the PLL source.
///
/// The fields may only change while both PLLs are off, so a running PLL is a
/// contract violation. Every value is validated again before it is encoded;
/// on any error `PLLCFGR` is left as it was.
pub fn apply<R: ClockRegisters>(regs: &mut R, settings: &MainPllSettings) -> Result<(), ClockError> {
    ensure_stopped(regs)?;
    regs.modify(Register::RccPllcfgr, |w| {
        set_field(w, pllcfgr::PLLM, bounds::PLLM.check(settings.m)?)?;
        set_field(w, pllcfgr::PLLN, bounds::PLLN.check(settings.n)?)?;
        set_field(w, pllcfgr::PLLP, bounds::PLLP.check(settings.p)? / 2 - 1)?;
        set_field(w, pllcfgr::PLLSRC, pllcfgr::PLLSRC_HSE)
    })
}

/// Resolves `plan` and programs the main PLL.
pub fn configure<R: ClockRegisters>(
    regs: &mut R,
    plan: &MainPllPlan,
    ceiling_hz: u32,
) -> Result<MainPllSettings, ClockError> {
    let settings = MainPllSettings::resolve(plan, ceiling_hz)?;
    apply(regs, &settings)?;
    Ok(settings)
}
