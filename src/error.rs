use core::fmt;

use crate::sequencer::SwitchState;

/// Which PLL a contract violation refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pll {
    Main,
    Sai,
}

/// Hardware status flags the bring-up waits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyFlag {
    /// `RCC_CR.HSERDY`
    Hse,
    /// `RCC_CR.PLLRDY`
    PllLock,
    /// `RCC_CFGR.SWS` reporting the PLL
    SystemClockSwitch,
    /// `RCC_CR.PLLSAIRDY`
    PllSaiLock,
}

/// Broad class of a [`ClockError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Programming error in the caller or the register map.
    Contract,
    /// The clock plan asks for something the hardware cannot do.
    Configuration,
    /// The hardware never reported ready.
    Timeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockError {
    /// Field geometry runs past bit 31 or has zero width.
    FieldOutOfBounds {
        field: &'static str,
        offset: u8,
        width: u8,
    },
    /// Value has bits set above the field width.
    ValueTooWide { field: &'static str, value: u32 },
    /// PLL fields written while the PLL is switched on.
    PllRunning { pll: Pll },
    /// A sequencer step was called from the wrong state.
    OutOfSequence {
        step: &'static str,
        state: SwitchState,
    },
    /// A field read back after the switch does not hold what was written.
    ReadbackMismatch {
        field: &'static str,
        expected: u32,
        found: u32,
    },
    /// Divider or multiplier outside its admissible set, reserved codes included.
    OutOfRange { field: &'static str, value: u32 },
    /// A derived frequency misses its documented window.
    FrequencyOutOfRange {
        what: &'static str,
        hz: u32,
        min_hz: u32,
        max_hz: u32,
    },
    /// No admissible divider brings the domain into range.
    NoDividerFits { what: &'static str, input_hz: u32 },
    /// HCLK is lower than an enabled peripheral requires.
    BelowPeripheralFloor { hclk_hz: u32, floor_hz: u32 },
    /// Ready flag not observed within the retry budget.
    Timeout { flag: ReadyFlag, polls: u32 },
}

impl ClockError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClockError::FieldOutOfBounds { .. }
            | ClockError::ValueTooWide { .. }
            | ClockError::PllRunning { .. }
            | ClockError::OutOfSequence { .. }
            | ClockError::ReadbackMismatch { .. } => ErrorKind::Contract,
            ClockError::OutOfRange { .. }
            | ClockError::FrequencyOutOfRange { .. }
            | ClockError::NoDividerFits { .. }
            | ClockError::BelowPeripheralFloor { .. } => ErrorKind::Configuration,
            ClockError::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Numeric code for a status LED or a debugger.
    ///
    /// High nibble is the kind (1 contract, 2 configuration, 3 timeout), low
    /// nibble the variant. Every timeout flag has its own code.
    pub fn code(&self) -> u8 {
        match self {
            ClockError::FieldOutOfBounds { .. } => 0x10,
            ClockError::ValueTooWide { .. } => 0x11,
            ClockError::PllRunning { pll: Pll::Main } => 0x12,
            ClockError::PllRunning { pll: Pll::Sai } => 0x13,
            ClockError::OutOfSequence { .. } => 0x14,
            ClockError::ReadbackMismatch { .. } => 0x15,
            ClockError::OutOfRange { .. } => 0x20,
            ClockError::FrequencyOutOfRange { .. } => 0x21,
            ClockError::NoDividerFits { .. } => 0x22,
            ClockError::BelowPeripheralFloor { .. } => 0x23,
            ClockError::Timeout { flag, .. } => match flag {
                ReadyFlag::Hse => 0x30,
                ReadyFlag::PllLock => 0x31,
                ReadyFlag::SystemClockSwitch => 0x32,
                ReadyFlag::PllSaiLock => 0x33,
            },
        }
    }
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockError::FieldOutOfBounds {
                field,
                offset,
                width,
            } => write!(
                f,
                "field {} at bit {} width {} does not fit a 32-bit register",
                field, offset, width
            ),
            ClockError::ValueTooWide { field, value } => {
                write!(f, "value {:#x} does not fit field {}", value, field)
            }
            ClockError::PllRunning { pll } => {
                write!(f, "{:?} PLL must be disabled before it is configured", pll)
            }
            ClockError::OutOfSequence { step, state } => {
                write!(f, "step {} not allowed in state {:?}", step, state)
            }
            ClockError::ReadbackMismatch {
                field,
                expected,
                found,
            } => write!(f, "{} reads back {}, wrote {}", field, found, expected),
            ClockError::OutOfRange { field, value } => {
                write!(f, "{} = {} is not an admissible setting", field, value)
            }
            ClockError::FrequencyOutOfRange {
                what,
                hz,
                min_hz,
                max_hz,
            } => write!(
                f,
                "{} at {} Hz is outside {}..={} Hz",
                what, hz, min_hz, max_hz
            ),
            ClockError::NoDividerFits { what, input_hz } => {
                write!(f, "no divider fits {} from {} Hz", what, input_hz)
            }
            ClockError::BelowPeripheralFloor { hclk_hz, floor_hz } => write!(
                f,
                "HCLK {} Hz is below the {} Hz peripheral floor",
                hclk_hz, floor_hz
            ),
            ClockError::Timeout { flag, polls } => {
                write!(f, "{:?} not ready after {} polls", flag, polls)
            }
        }
    }
}
