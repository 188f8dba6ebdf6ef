//! RCC and FLASH register map of the STM32F42xxx/F43xxx (RM0090).

use crate::error::ClockError;
use crate::field::{self, BitField};

pub const RCC_BASE: u32 = 0x4002_3800;
pub const FLASH_BASE: u32 = 0x4002_3C00;

/// The control words this crate touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    RccCr,
    RccPllcfgr,
    RccCfgr,
    RccPllsaicfgr,
    RccDckcfgr,
    FlashAcr,
}

impl Register {
    pub const ALL: [Register; 6] = [
        Register::RccCr,
        Register::RccPllcfgr,
        Register::RccCfgr,
        Register::RccPllsaicfgr,
        Register::RccDckcfgr,
        Register::FlashAcr,
    ];

    pub const fn address(self) -> u32 {
        match self {
            Register::RccCr => RCC_BASE,
            Register::RccPllcfgr => RCC_BASE + 0x04,
            Register::RccCfgr => RCC_BASE + 0x08,
            Register::RccPllsaicfgr => RCC_BASE + 0x88,
            Register::RccDckcfgr => RCC_BASE + 0x8C,
            Register::FlashAcr => FLASH_BASE,
        }
    }

    /// Value after a system reset.
    pub const fn reset_value(self) -> u32 {
        match self {
            // HSION | HSIRDY | HSITRIM = 16
            Register::RccCr => 0x0000_0083,
            // PLLQ = 4, PLLN = 192, PLLM = 16
            Register::RccPllcfgr => 0x2400_3010,
            Register::RccCfgr => 0,
            // PLLSAIR = 2, PLLSAIQ = 4, PLLSAIN = 192
            Register::RccPllsaicfgr => 0x2400_3000,
            Register::RccDckcfgr => 0,
            Register::FlashAcr => 0,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Register::RccCr => 0,
            Register::RccPllcfgr => 1,
            Register::RccCfgr => 2,
            Register::RccPllsaicfgr => 3,
            Register::RccDckcfgr => 4,
            Register::FlashAcr => 5,
        }
    }
}

/// Access to the clock control words.
///
/// Implementors own the registers; configurators borrow them for the duration
/// of a call. Reads take `&mut self` because status reads are polls.
pub trait ClockRegisters {
    fn read(&mut self, reg: Register) -> u32;

    fn write(&mut self, reg: Register, value: u32);

    /// Read-modify-write. Nothing is written if `f` fails.
    fn modify<F>(&mut self, reg: Register, f: F) -> Result<(), ClockError>
    where
        F: FnOnce(&mut u32) -> Result<(), ClockError>,
    {
        let mut word = self.read(reg);
        f(&mut word)?;
        self.write(reg, word);
        Ok(())
    }

    fn read_field(&mut self, reg: Register, field: BitField) -> Result<u32, ClockError> {
        let word = self.read(reg);
        field::read_field(word, field)
    }

    fn is_set(&mut self, reg: Register, bit: BitField) -> Result<bool, ClockError> {
        Ok(self.read_field(reg, bit)? != 0)
    }
}

/// RCC clock control register
pub mod cr {
    use crate::field::BitField;

    pub const HSEON: BitField = BitField::bit("HSEON", 16);
    pub const HSERDY: BitField = BitField::bit("HSERDY", 17);
    pub const PLLON: BitField = BitField::bit("PLLON", 24);
    pub const PLLRDY: BitField = BitField::bit("PLLRDY", 25);
    pub const PLLSAION: BitField = BitField::bit("PLLSAION", 28);
    pub const PLLSAIRDY: BitField = BitField::bit("PLLSAIRDY", 29);
}

/// RCC PLL configuration register
pub mod pllcfgr {
    use crate::field::BitField;

    pub const PLLM: BitField = BitField::new("PLLM", 0, 6);
    pub const PLLN: BitField = BitField::new("PLLN", 6, 9);
    pub const PLLP: BitField = BitField::new("PLLP", 16, 2);
    pub const PLLSRC: BitField = BitField::bit("PLLSRC", 22);

    pub const PLLSRC_HSE: u32 = 1;
}

/// RCC clock configuration register
pub mod cfgr {
    use crate::field::BitField;

    pub const SW: BitField = BitField::new("SW", 0, 2);
    pub const SWS: BitField = BitField::new("SWS", 2, 2);
    pub const HPRE: BitField = BitField::new("HPRE", 4, 4);
    pub const PPRE1: BitField = BitField::new("PPRE1", 10, 3);
    pub const PPRE2: BitField = BitField::new("PPRE2", 13, 3);

    pub const SW_HSI: u32 = 0b00;
    pub const SW_HSE: u32 = 0b01;
    pub const SW_PLL: u32 = 0b10;
}

/// RCC PLLSAI configuration register
pub mod pllsaicfgr {
    use crate::field::BitField;

    pub const PLLSAIN: BitField = BitField::new("PLLSAIN", 6, 9);
    pub const PLLSAIQ: BitField = BitField::new("PLLSAIQ", 24, 4);
    pub const PLLSAIR: BitField = BitField::new("PLLSAIR", 28, 3);
}

/// RCC dedicated clock configuration register
pub mod dckcfgr {
    use crate::field::BitField;

    pub const PLLSAIDIVR: BitField = BitField::new("PLLSAIDIVR", 16, 2);
}

/// Flash access control register
pub mod acr {
    use crate::field::BitField;

    pub const LATENCY: BitField = BitField::new("LATENCY", 0, 4);
    pub const PRFTEN: BitField = BitField::bit("PRFTEN", 8);
    pub const ICEN: BitField = BitField::bit("ICEN", 9);
    pub const DCEN: BitField = BitField::bit("DCEN", 10);
}
