//! Turning oscillators and PLLs on, and moving SYSCLK onto the main PLL.
//!
//! Every wait is a bounded spin: a flag that never comes up ends in
//! [`ClockError::Timeout`] instead of a hang.

use crate::error::{ClockError, ReadyFlag};
use crate::field::{set_field, BitField};
use crate::regs::{cfgr, cr, ClockRegisters, Register};

/// Polls allowed per wait unless the caller says otherwise.
pub const DEFAULT_RETRY_BUDGET: u32 = 100_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchState {
    PllDisabled,
    PllEnabling,
    PllLocked,
    SystemClockSwitched,
}

/// Main PLL enable, lock and SYSCLK switch, in that order.
#[derive(Debug)]
pub struct ClockSwitch {
    state: SwitchState,
    budget: u32,
}

impl ClockSwitch {
    pub fn new(budget: u32) -> Self {
        ClockSwitch {
            state: SwitchState::PllDisabled,
            budget,
        }
    }

    pub fn state(&self) -> SwitchState {
        self.state
    }

    fn expect(&self, step: &'static str, state: SwitchState) -> Result<(), ClockError> {
        if self.state == state {
            Ok(())
        } else {
            Err(ClockError::OutOfSequence {
                step,
                state: self.state,
            })
        }
    }

    pub fn enable_pll<R: ClockRegisters>(&mut self, regs: &mut R) -> Result<(), ClockError> {
        self.expect("enable_pll", SwitchState::PllDisabled)?;
        regs.modify(Register::RccCr, |w| set_field(w, cr::PLLON, 1))?;
        self.state = SwitchState::PllEnabling;
        Ok(())
    }

    /// Returns the number of extra polls it took.
    pub fn wait_for_lock<R: ClockRegisters>(&mut self, regs: &mut R) -> Result<u32, ClockError> {
        self.expect("wait_for_lock", SwitchState::PllEnabling)?;
        let locked = block_until!(self.budget, regs.is_set(Register::RccCr, cr::PLLRDY)?);
        let polls = locked.ok_or(ClockError::Timeout {
            flag: ReadyFlag::PllLock,
            polls: self.budget,
        })?;
        self.state = SwitchState::PllLocked;
        Ok(polls)
    }

    /// Selects the PLL as SYSCLK and waits for `SWS` to confirm.
    pub fn switch_to_pll<R: ClockRegisters>(&mut self, regs: &mut R) -> Result<u32, ClockError> {
        self.expect("switch_to_pll", SwitchState::PllLocked)?;
        regs.modify(Register::RccCfgr, |w| set_field(w, cfgr::SW, cfgr::SW_PLL))?;
        let switched = block_until!(
            self.budget,
            regs.read_field(Register::RccCfgr, cfgr::SWS)? == cfgr::SW_PLL
        );
        let polls = switched.ok_or(ClockError::Timeout {
            flag: ReadyFlag::SystemClockSwitch,
            polls: self.budget,
        })?;
        self.state = SwitchState::SystemClockSwitched;
        Ok(polls)
    }

    /// All three steps.
    pub fn run<R: ClockRegisters>(&mut self, regs: &mut R) -> Result<(), ClockError> {
        self.enable_pll(regs)?;
        self.wait_for_lock(regs)?;
        self.switch_to_pll(regs)?;
        Ok(())
    }
}

fn start<R: ClockRegisters>(
    regs: &mut R,
    budget: u32,
    on: BitField,
    ready: BitField,
    flag: ReadyFlag,
) -> Result<u32, ClockError> {
    regs.modify(Register::RccCr, |w| set_field(w, on, 1))?;
    let settled = block_until!(budget, regs.is_set(Register::RccCr, ready)?);
    settled.ok_or(ClockError::Timeout {
        flag,
        polls: budget,
    })
}

/// Switches on the external oscillator and waits for it to settle.
pub fn start_hse<R: ClockRegisters>(regs: &mut R, budget: u32) -> Result<u32, ClockError> {
    start(regs, budget, cr::HSEON, cr::HSERDY, ReadyFlag::Hse)
}

/// Switches on PLLSAI and waits for lock.
pub fn start_pllsai<R: ClockRegisters>(regs: &mut R, budget: u32) -> Result<u32, ClockError> {
    start(regs, budget, cr::PLLSAION, cr::PLLSAIRDY, ReadyFlag::PllSaiLock)
}
