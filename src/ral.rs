use clocktree::{ClockRegisters, Register};
use stm32ral::{read_reg, write_reg};

/// The RCC and FLASH peripherals, owned for the duration of the bring-up.
pub struct RalClockRegisters {
    rcc: stm32ral::rcc::Instance,
    flash: stm32ral::flash::Instance,
}

impl RalClockRegisters {
    pub fn new(rcc: stm32ral::rcc::Instance, flash: stm32ral::flash::Instance) -> Self {
        RalClockRegisters { rcc, flash }
    }
}

impl ClockRegisters for RalClockRegisters {
    fn read(&mut self, reg: Register) -> u32 {
        let rcc = &self.rcc;
        let flash = &self.flash;
        match reg {
            Register::RccCr => read_reg!(stm32ral::rcc, rcc, CR),
            Register::RccPllcfgr => read_reg!(stm32ral::rcc, rcc, PLLCFGR),
            Register::RccCfgr => read_reg!(stm32ral::rcc, rcc, CFGR),
            Register::RccPllsaicfgr => read_reg!(stm32ral::rcc, rcc, PLLSAICFGR),
            Register::RccDckcfgr => read_reg!(stm32ral::rcc, rcc, DCKCFGR),
            Register::FlashAcr => read_reg!(stm32ral::flash, flash, ACR),
        }
    }

    fn write(&mut self, reg: Register, value: u32) {
        let rcc = &self.rcc;
        let flash = &self.flash;
        match reg {
            Register::RccCr => write_reg!(stm32ral::rcc, rcc, CR, value),
            Register::RccPllcfgr => write_reg!(stm32ral::rcc, rcc, PLLCFGR, value),
            Register::RccCfgr => write_reg!(stm32ral::rcc, rcc, CFGR, value),
            Register::RccPllsaicfgr => write_reg!(stm32ral::rcc, rcc, PLLSAICFGR, value),
            Register::RccDckcfgr => write_reg!(stm32ral::rcc, rcc, DCKCFGR, value),
            Register::FlashAcr => write_reg!(stm32ral::flash, flash, ACR, value),
        }
    }
}
