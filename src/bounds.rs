//! Admissible settings for every divider and multiplier field, and the
//! frequency windows the derived clocks must land in (RM0090, section 6.3).

use crate::error::ClockError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admissible {
    /// Every value in `min..=max`.
    Range { min: u32, max: u32 },
    /// Only the listed values.
    OneOf(&'static [u32]),
}

/// Legal settings of one field, plus the codes the manual calls a wrong
/// configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldBounds {
    pub name: &'static str,
    pub admissible: Admissible,
    pub reserved: &'static [u32],
}

impl FieldBounds {
    pub const fn range(name: &'static str, min: u32, max: u32, reserved: &'static [u32]) -> Self {
        FieldBounds {
            name,
            admissible: Admissible::Range { min, max },
            reserved,
        }
    }

    pub const fn one_of(name: &'static str, values: &'static [u32]) -> Self {
        FieldBounds {
            name,
            admissible: Admissible::OneOf(values),
            reserved: &[],
        }
    }

    pub fn admits(&self, value: u32) -> bool {
        if self.reserved.contains(&value) {
            return false;
        }
        match self.admissible {
            Admissible::Range { min, max } => (min..=max).contains(&value),
            Admissible::OneOf(values) => values.contains(&value),
        }
    }

    pub fn check(&self, value: u32) -> Result<u32, ClockError> {
        if self.admits(value) {
            Ok(value)
        } else {
            Err(ClockError::OutOfRange {
                field: self.name,
                value,
            })
        }
    }
}

/// Inclusive frequency window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrequencyRange {
    pub what: &'static str,
    pub min_hz: u32,
    pub max_hz: u32,
}

impl FrequencyRange {
    pub const fn new(what: &'static str, min_hz: u32, max_hz: u32) -> Self {
        FrequencyRange {
            what,
            min_hz,
            max_hz,
        }
    }

    pub fn contains(&self, hz: u32) -> bool {
        (self.min_hz..=self.max_hz).contains(&hz)
    }

    pub fn check(&self, hz: u32) -> Result<u32, ClockError> {
        if self.contains(hz) {
            Ok(hz)
        } else {
            Err(ClockError::FrequencyOutOfRange {
                what: self.what,
                hz,
                min_hz: self.min_hz,
                max_hz: self.max_hz,
            })
        }
    }
}

pub const PLLM: FieldBounds = FieldBounds::range("PLLM", 2, 63, &[0, 1]);
// 50..=99 only reach the VCO output window with an input above 1 MHz; the
// VCO_OUTPUT check covers that.
pub const PLLN: FieldBounds = FieldBounds::range("PLLN", 50, 432, &[0, 1]);
pub const PLLP: FieldBounds = FieldBounds::one_of("PLLP", &[2, 4, 6, 8]);

pub const PLLSAIN: FieldBounds = FieldBounds::range("PLLSAIN", 50, 432, &[0, 1]);
pub const PLLSAIR: FieldBounds = FieldBounds::range("PLLSAIR", 2, 7, &[0, 1]);
pub const PLLSAIDIVR: FieldBounds = FieldBounds::one_of("PLLSAIDIVR", &[2, 4, 8, 16]);

// There is no /32 setting on the AHB prescaler.
pub const HPRE: FieldBounds = FieldBounds::one_of("HPRE", &[1, 2, 4, 8, 16, 64, 128, 256, 512]);
pub const PPRE1: FieldBounds = FieldBounds::one_of("PPRE1", &[1, 2, 4, 8, 16]);
pub const PPRE2: FieldBounds = FieldBounds::one_of("PPRE2", &[1, 2, 4, 8, 16]);

pub const LATENCY: FieldBounds = FieldBounds::range("LATENCY", 0, 15, &[]);

pub const VCO_INPUT: FrequencyRange = FrequencyRange::new("VCO input", 1_000_000, 2_000_000);
pub const VCO_OUTPUT: FrequencyRange = FrequencyRange::new("VCO output", 100_000_000, 432_000_000);

/// LCD-TFT pixel clock window of a typical panel timing controller.
pub const LCD_CLOCK: FrequencyRange = FrequencyRange::new("LCD clock", 6_000_000, 8_000_000);

pub const AHB_MAX_HZ: u32 = 180_000_000;
pub const APB1_MAX_HZ: u32 = 45_000_000;
pub const APB2_MAX_HZ: u32 = 90_000_000;

/// Ethernet MAC needs at least this much HCLK.
pub const ETHERNET_MIN_HCLK_HZ: u32 = 25_000_000;
