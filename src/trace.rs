//! Bring-up log kept in RAM until there is somewhere to print it.
//!
//! Nothing can be printed reliably while the clocks are being changed, so the
//! steps are recorded here and the firmware dumps them over ITM afterwards.

use core::fmt;

use heapless::consts::U16;
use heapless::Vec;

use crate::error::ClockError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    HseReady { polls: u32 },
    MainPllConfigured { m: u32, n: u32, p: u32, sysclk_hz: u32 },
    DisplayPllConfigured { n: u32, r: u32, divr: u32, lcd_hz: u32 },
    FlashLatency { wait_states: u32 },
    BusPrescalers { ahb: u32, apb1: u32, apb2: u32 },
    PllLocked { polls: u32 },
    SystemClockSwitched { polls: u32 },
    PrescalersVerified,
    DisplayPllLocked { polls: u32 },
    Failed(ClockError),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::HseReady { polls } => write!(f, "HSE ready after {} polls", polls),
            Event::MainPllConfigured { m, n, p, sysclk_hz } => {
                write!(f, "PLL M={} N={} P={} -> {} Hz", m, n, p, sysclk_hz)
            }
            Event::DisplayPllConfigured { n, r, divr, lcd_hz } => {
                write!(f, "PLLSAI N={} R={} DIVR=/{} -> {} Hz", n, r, divr, lcd_hz)
            }
            Event::FlashLatency { wait_states } => write!(f, "flash {} WS", wait_states),
            Event::BusPrescalers { ahb, apb1, apb2 } => {
                write!(f, "AHB /{} APB1 /{} APB2 /{}", ahb, apb1, apb2)
            }
            Event::PllLocked { polls } => write!(f, "PLL locked after {} polls", polls),
            Event::SystemClockSwitched { polls } => {
                write!(f, "SYSCLK on PLL after {} polls", polls)
            }
            Event::PrescalersVerified => f.write_str("prescalers verified"),
            Event::DisplayPllLocked { polls } => {
                write!(f, "PLLSAI locked after {} polls", polls)
            }
            Event::Failed(e) => write!(f, "FAILED {:#04x}: {}", e.code(), e),
        }
    }
}

#[derive(Debug)]
pub struct Trace {
    events: Vec<Event, U16>,
    dropped: u16,
}

impl Trace {
    pub fn new() -> Self {
        Trace {
            events: Vec::new(),
            dropped: 0,
        }
    }

    pub fn record(&mut self, event: Event) {
        if self.events.push(event).is_err() {
            self.dropped = self.dropped.saturating_add(1);
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events that did not fit.
    pub fn dropped(&self) -> u16 {
        self.dropped
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }
}

impl Default for Trace {
    fn default() -> Self {
        Trace::new()
    }
}
