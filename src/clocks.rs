use crate::bounds::FrequencyRange;
use crate::error::ClockError;
use crate::prescaler::BusPlan;

/// Clock domains downstream drivers depend on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Domain {
    /// SYSCLK, straight out of the main PLL.
    System,
    /// AHB, core bus
    Ahb,
    /// APB1, low-speed peripherals
    Apb1,
    /// APB2, high-speed peripherals
    Apb2,
    /// LCD-TFT pixel clock
    Lcd,
}

impl Domain {
    pub fn name(self) -> &'static str {
        match self {
            Domain::System => "SYSCLK",
            Domain::Ahb => "HCLK",
            Domain::Apb1 => "PCLK1",
            Domain::Apb2 => "PCLK2",
            Domain::Lcd => "LCD clock",
        }
    }
}

/// Frozen clock frequencies
///
/// Only handed out once the system clock runs from the PLL, so holding one
/// means the numbers are live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clocks {
    pub(crate) sysclk: u32,
    pub(crate) hclk: u32,
    pub(crate) pclk1: u32,
    pub(crate) pclk2: u32,
    pub(crate) lcd: u32,
    /// Limits the frequencies were planned against.
    pub(crate) buses: BusPlan,
    pub(crate) lcd_range: FrequencyRange,
}

impl Clocks {
    pub fn sysclk(&self) -> u32 {
        self.sysclk
    }

    pub fn hclk(&self) -> u32 {
        self.hclk
    }

    pub fn pclk1(&self) -> u32 {
        self.pclk1
    }

    pub fn pclk2(&self) -> u32 {
        self.pclk2
    }

    pub fn lcd(&self) -> u32 {
        self.lcd
    }

    pub fn frequency(&self, domain: Domain) -> u32 {
        match domain {
            Domain::System => self.sysclk,
            Domain::Ahb => self.hclk,
            Domain::Apb1 => self.pclk1,
            Domain::Apb2 => self.pclk2,
            Domain::Lcd => self.lcd,
        }
    }

    /// Upper limit the domain was planned against.
    pub fn ceiling(&self, domain: Domain) -> u32 {
        match domain {
            Domain::System | Domain::Ahb => self.buses.ahb_max_hz,
            Domain::Apb1 => self.buses.apb1_max_hz,
            Domain::Apb2 => self.buses.apb2_max_hz,
            Domain::Lcd => self.lcd_range.max_hz,
        }
    }

    /// For drivers with a minimum input clock, e.g. Ethernet on AHB.
    pub fn require_at_least(&self, domain: Domain, min_hz: u32) -> Result<u32, ClockError> {
        let hz = self.frequency(domain);
        if hz >= min_hz {
            Ok(hz)
        } else {
            Err(ClockError::FrequencyOutOfRange {
                what: domain.name(),
                hz,
                min_hz,
                max_hz: self.ceiling(domain),
            })
        }
    }
}
