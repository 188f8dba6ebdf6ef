//! Software model of the RCC and FLASH clock registers.
//!
//! Lets a clock plan be dry-run on the host: registers start at their reset
//! values, ready flags assert a configurable number of polls after their
//! enable bit is written (or never), `SWS` follows `SW`, and every write is
//! logged in order.

use heapless::consts::U64;
use heapless::Vec;

use crate::field::BitField;
use crate::regs::{cfgr, cr, ClockRegisters, Register};

/// Polls a ready flag stays low by default.
pub const DEFAULT_SETTLE_POLLS: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Write {
    pub reg: Register,
    pub value: u32,
}

#[derive(Clone, Copy, Debug)]
struct Flag {
    on: BitField,
    ready: BitField,
    after: Option<u32>,
    polls: u32,
}

impl Flag {
    const fn new(on: BitField, ready: BitField) -> Self {
        Flag {
            on,
            ready,
            after: Some(DEFAULT_SETTLE_POLLS),
            polls: 0,
        }
    }

    fn settle(&mut self, word: &mut u32) {
        let on = 1u32 << self.on.offset;
        let ready = 1u32 << self.ready.offset;
        if *word & on == 0 {
            *word &= !ready;
            self.polls = 0;
        } else if *word & ready == 0 {
            match self.after {
                Some(after) if self.polls >= after => *word |= ready,
                _ => self.polls += 1,
            }
        }
    }
}

pub struct SimulatedRcc {
    words: [u32; 6],
    hse: Flag,
    pll: Flag,
    pllsai: Flag,
    switch_after: Option<u32>,
    switch_polls: u32,
    log: Vec<Write, U64>,
    write_count: u32,
}

impl SimulatedRcc {
    pub fn new() -> Self {
        let mut words = [0; 6];
        for reg in Register::ALL.iter() {
            words[reg.index()] = reg.reset_value();
        }
        SimulatedRcc {
            words,
            hse: Flag::new(cr::HSEON, cr::HSERDY),
            pll: Flag::new(cr::PLLON, cr::PLLRDY),
            pllsai: Flag::new(cr::PLLSAION, cr::PLLSAIRDY),
            switch_after: Some(DEFAULT_SETTLE_POLLS),
            switch_polls: 0,
            log: Vec::new(),
            write_count: 0,
        }
    }

    /// `None` keeps HSERDY low forever.
    pub fn with_hse_ready_after(mut self, polls: Option<u32>) -> Self {
        self.hse.after = polls;
        self
    }

    /// `None` keeps PLLRDY low forever.
    pub fn with_pll_lock_after(mut self, polls: Option<u32>) -> Self {
        self.pll.after = polls;
        self
    }

    /// `None` keeps PLLSAIRDY low forever.
    pub fn with_pllsai_lock_after(mut self, polls: Option<u32>) -> Self {
        self.pllsai.after = polls;
        self
    }

    /// `None` keeps SWS at its old value forever.
    pub fn with_switch_after(mut self, polls: Option<u32>) -> Self {
        self.switch_after = polls;
        self
    }

    /// Current value without any polling side effects.
    pub fn word(&self, reg: Register) -> u32 {
        self.words[reg.index()]
    }

    /// Overwrite a register behind the software's back, e.g. to pre-seed bits.
    pub fn seed(&mut self, reg: Register, value: u32) {
        self.words[reg.index()] = value;
    }

    /// Logged writes, oldest first. Holds the first 64.
    pub fn writes(&self) -> &[Write] {
        &self.log
    }

    pub fn writes_to(&self, reg: Register) -> usize {
        self.log.iter().filter(|w| w.reg == reg).count()
    }

    pub fn write_count(&self) -> u32 {
        self.write_count
    }

    /// Position in the log of the first write to `reg` that sets `bits`.
    pub fn first_write_setting(&self, reg: Register, bits: u32) -> Option<usize> {
        self.log
            .iter()
            .position(|w| w.reg == reg && w.value & bits == bits)
    }

    fn settle_switch(&mut self) {
        let word = &mut self.words[Register::RccCfgr.index()];
        let sw_mask = 0b11 << cfgr::SW.offset;
        let sws_mask = 0b11 << cfgr::SWS.offset;
        let sw = (*word & sw_mask) >> cfgr::SW.offset;
        let sws = (*word & sws_mask) >> cfgr::SWS.offset;
        if sw == sws {
            self.switch_polls = 0;
            return;
        }
        match self.switch_after {
            Some(after) if self.switch_polls >= after => {
                *word = (*word & !sws_mask) | (sw << cfgr::SWS.offset);
                self.switch_polls = 0;
            }
            _ => self.switch_polls += 1,
        }
    }
}

impl Default for SimulatedRcc {
    fn default() -> Self {
        SimulatedRcc::new()
    }
}

/// Bits software cannot write.
fn read_only_mask(reg: Register) -> u32 {
    match reg {
        Register::RccCr => {
            // HSIRDY
            (1 << 1)
                | (1 << cr::HSERDY.offset)
                | (1 << cr::PLLRDY.offset)
                | (1 << cr::PLLSAIRDY.offset)
        }
        Register::RccCfgr => 0b11 << cfgr::SWS.offset,
        _ => 0,
    }
}

impl ClockRegisters for SimulatedRcc {
    fn read(&mut self, reg: Register) -> u32 {
        match reg {
            Register::RccCr => {
                let word = &mut self.words[reg.index()];
                self.hse.settle(word);
                self.pll.settle(word);
                self.pllsai.settle(word);
            }
            Register::RccCfgr => self.settle_switch(),
            _ => {}
        }
        self.words[reg.index()]
    }

    fn write(&mut self, reg: Register, value: u32) {
        let ro = read_only_mask(reg);
        let word = &mut self.words[reg.index()];
        *word = (value & !ro) | (*word & ro);
        self.write_count += 1;
        // past 64 entries only the count keeps going
        let _ = self.log.push(Write { reg, value });
    }
}
