//! Flash wait states. Must be raised before HCLK is.

use crate::bounds;
use crate::error::ClockError;
use crate::field::set_field;
use crate::regs::{acr, ClockRegisters, Register};

/// HCLK per wait state at 2.7-3.6 V (RM0090 table 11).
const HZ_PER_WAIT_STATE: u32 = 30_000_000;

pub fn wait_states(hclk_hz: u32) -> Result<u32, ClockError> {
    let ws = hclk_hz.saturating_sub(1) / HZ_PER_WAIT_STATE;
    bounds::LATENCY.check(ws)
}

/// Sets LATENCY and turns on prefetch, instruction cache and data cache.
pub fn configure<R: ClockRegisters>(regs: &mut R, hclk_hz: u32) -> Result<u32, ClockError> {
    let ws = wait_states(hclk_hz)?;
    regs.modify(Register::FlashAcr, |w| {
        set_field(w, acr::LATENCY, ws)?;
        set_field(w, acr::PRFTEN, 1)?;
        set_field(w, acr::ICEN, 1)?;
        set_field(w, acr::DCEN, 1)
    })?;
    Ok(ws)
}
