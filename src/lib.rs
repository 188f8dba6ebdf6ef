//! Clock tree bring-up for the STM32F429.
//!
//! HSE -> main PLL -> SYSCLK -> AHB / APB1 / APB2, and HSE -> PLLSAI ->
//! PLLSAIDIVR -> LCD-TFT clock. Every divider is checked against the
//! reference manual before it is encoded, every busy-wait has a retry budget,
//! and the result is a [`Clocks`] value that downstream drivers can check
//! their own limits against.
//!
//! Register access goes through [`ClockRegisters`], implemented by the
//! firmware over the real peripherals and by [`sim::SimulatedRcc`] on the
//! host.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod util;

pub mod bounds;
pub mod clocks;
pub mod clocksetup;
pub mod error;
pub mod field;
pub mod flash;
pub mod main_pll;
pub mod pllsai;
pub mod prescaler;
pub mod regs;
pub mod sequencer;
pub mod sim;
pub mod trace;

pub use clocks::{Clocks, Domain};
pub use clocksetup::{configure_clocks, ClockConfig};
pub use error::{ClockError, ErrorKind};
pub use regs::{ClockRegisters, Register};
pub use trace::Trace;
