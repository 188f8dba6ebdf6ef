use crate::bounds;
use crate::clocks::Clocks;
use crate::error::ClockError;
use crate::flash;
use crate::main_pll::{self, MainPllPlan, MainPllSettings};
use crate::pllsai::{self, DisplayClockPlan, DisplayClockSettings};
use crate::prescaler::{self, BusPlan, BusPrescalers};
use crate::regs::ClockRegisters;
use crate::sequencer::{self, ClockSwitch, DEFAULT_RETRY_BUDGET};
use crate::trace::{Event, Trace};

#[derive(Clone, Copy, Debug)]
pub struct ClockConfig {
    pub main_pll: MainPllPlan,
    pub display: DisplayClockPlan,
    pub buses: BusPlan,
    /// Polls allowed for each ready flag before giving up.
    pub retry_budget: u32,
}

impl ClockConfig {
    /// 180 MHz CPU/AHB, 45 MHz APB1, 90 MHz APB2 and a 6.25 MHz LCD clock
    /// from the 16 MHz crystal.
    pub const fn reference() -> Self {
        ClockConfig {
            main_pll: MainPllPlan {
                hse_hz: 16_000_000,
                vco_input_hz: 2_000_000,
                vco_output_hz: 360_000_000,
                sysclk_hz: 180_000_000,
            },
            display: DisplayClockPlan {
                vco_output_hz: 100_000_000,
                r: Some(2),
                lcd_range: bounds::LCD_CLOCK,
            },
            buses: BusPlan::stm32f429(),
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }
}

/// Every divider the bring-up will write, worked out before touching hardware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    pub main_pll: MainPllSettings,
    pub display: DisplayClockSettings,
    pub buses: BusPrescalers,
    pub wait_states: u32,
}

impl Settings {
    pub fn resolve(cfg: &ClockConfig) -> Result<Self, ClockError> {
        let main_pll = MainPllSettings::resolve(&cfg.main_pll, cfg.buses.ahb_max_hz)?;
        let display = DisplayClockSettings::resolve(main_pll.vco_input_hz, &cfg.display)?;
        let buses = BusPrescalers::resolve(main_pll.sysclk_hz, &cfg.buses)?;
        let wait_states = flash::wait_states(buses.hclk_hz)?;
        Ok(Settings {
            main_pll,
            display,
            buses,
            wait_states,
        })
    }
}

/// Runs the whole bring-up and returns the live frequencies.
///
/// Each step is recorded in `trace`; on failure the error is recorded last and
/// the sequence stops where it was. Nothing is written if the plan itself is
/// impossible.
pub fn configure_clocks<R: ClockRegisters>(
    regs: &mut R,
    cfg: &ClockConfig,
    trace: &mut Trace,
) -> Result<Clocks, ClockError> {
    let result = bring_up(regs, cfg, trace);
    if let Err(e) = result {
        trace.record(Event::Failed(e));
    }
    result
}

fn bring_up<R: ClockRegisters>(
    regs: &mut R,
    cfg: &ClockConfig,
    trace: &mut Trace,
) -> Result<Clocks, ClockError> {
    let s = Settings::resolve(cfg)?;
    let budget = cfg.retry_budget;

    // Nothing gets written while something is still running off the PLLs.
    main_pll::ensure_stopped(regs)?;

    // Switch on the crystal oscillator.
    let polls = sequencer::start_hse(regs, budget)?;
    trace.record(Event::HseReady { polls });

    // Both PLLs are programmed while still off.
    main_pll::apply(regs, &s.main_pll)?;
    trace.record(Event::MainPllConfigured {
        m: s.main_pll.m,
        n: s.main_pll.n,
        p: s.main_pll.p,
        sysclk_hz: s.main_pll.sysclk_hz,
    });
    pllsai::apply(regs, &s.display)?;
    trace.record(Event::DisplayPllConfigured {
        n: s.display.n,
        r: s.display.r,
        divr: s.display.divr,
        lcd_hz: s.display.lcd_hz,
    });

    // Wait states and bus dividers go in before the frequency goes up.
    let wait_states = flash::configure(regs, s.buses.hclk_hz)?;
    trace.record(Event::FlashLatency { wait_states });
    prescaler::apply(regs, &s.buses)?;
    trace.record(Event::BusPrescalers {
        ahb: s.buses.ahb,
        apb1: s.buses.apb1,
        apb2: s.buses.apb2,
    });

    let mut switch = ClockSwitch::new(budget);
    switch.enable_pll(regs)?;
    let polls = switch.wait_for_lock(regs)?;
    trace.record(Event::PllLocked { polls });
    let polls = switch.switch_to_pll(regs)?;
    trace.record(Event::SystemClockSwitched { polls });

    // Now running from the PLL, confirm the buses see what was planned.
    prescaler::verify(regs, &s.buses)?;
    trace.record(Event::PrescalersVerified);

    let polls = sequencer::start_pllsai(regs, budget)?;
    trace.record(Event::DisplayPllLocked { polls });

    Ok(Clocks {
        sysclk: s.main_pll.sysclk_hz,
        hclk: s.buses.hclk_hz,
        pclk1: s.buses.pclk1_hz,
        pclk2: s.buses.pclk2_hz,
        lcd: s.display.lcd_hz,
        buses: cfg.buses,
        lcd_range: cfg.display.lcd_range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clocks::Domain;
    use crate::error::{Pll, ReadyFlag};
    use crate::regs::{cr, Register};
    use crate::sim::SimulatedRcc;

    #[test]
    fn reference_plan_end_to_end() {
        let mut sim = SimulatedRcc::new();
        let mut trace = Trace::new();
        let clocks = configure_clocks(&mut sim, &ClockConfig::reference(), &mut trace).unwrap();
        assert_eq!(clocks.sysclk(), 180_000_000);
        assert_eq!(clocks.hclk(), 180_000_000);
        assert_eq!(clocks.pclk1(), 45_000_000);
        assert_eq!(clocks.pclk2(), 90_000_000);
        assert_eq!(clocks.lcd(), 6_250_000);
        assert_eq!(trace.dropped(), 0);
        assert_eq!(trace.last(), Some(&Event::DisplayPllLocked { polls: 2 }));
    }

    #[test]
    fn writes_happen_in_order() {
        let mut sim = SimulatedRcc::new();
        configure_clocks(&mut sim, &ClockConfig::reference(), &mut Trace::new()).unwrap();

        let hse_on = sim.first_write_setting(Register::RccCr, 1 << cr::HSEON.offset);
        let pll_cfg = sim.first_write_setting(Register::RccPllcfgr, 0);
        let sai_cfg = sim.first_write_setting(Register::RccPllsaicfgr, 0);
        let latency = sim.first_write_setting(Register::FlashAcr, 0);
        let dividers = sim.first_write_setting(Register::RccCfgr, 0);
        let pll_on = sim.first_write_setting(Register::RccCr, 1 << cr::PLLON.offset);
        let sw_pll = sim.first_write_setting(Register::RccCfgr, 0b10);
        let sai_on = sim.first_write_setting(Register::RccCr, 1 << cr::PLLSAION.offset);

        let order = [hse_on, pll_cfg, sai_cfg, latency, dividers, pll_on, sw_pll, sai_on];
        for pair in order.windows(2) {
            assert!(pair[0].is_some() && pair[0] < pair[1], "{:?}", order);
        }
    }

    #[test]
    fn impossible_plan_touches_nothing() {
        let mut cfg = ClockConfig::reference();
        cfg.display.lcd_range = bounds::FrequencyRange::new("LCD clock", 30_000_000, 31_000_000);
        let mut sim = SimulatedRcc::new();
        let mut trace = Trace::new();
        let err = configure_clocks(&mut sim, &cfg, &mut trace).unwrap_err();
        assert!(matches!(err, ClockError::NoDividerFits { .. }));
        assert_eq!(sim.write_count(), 0);
        assert_eq!(trace.events(), &[Event::Failed(err)]);
    }

    #[test]
    fn missing_lock_aborts_before_the_switch() {
        let mut sim = SimulatedRcc::new().with_pll_lock_after(None);
        let mut cfg = ClockConfig::reference();
        cfg.retry_budget = 500;
        let mut trace = Trace::new();
        let err = configure_clocks(&mut sim, &cfg, &mut trace).unwrap_err();
        assert_eq!(
            err,
            ClockError::Timeout {
                flag: ReadyFlag::PllLock,
                polls: 500
            }
        );
        assert_eq!(sim.first_write_setting(Register::RccCfgr, 0b10), None);
        assert_eq!(trace.last(), Some(&Event::Failed(err)));
    }

    #[test]
    fn running_pll_is_refused() {
        let mut sim = SimulatedRcc::new();
        sim.seed(Register::RccCr, (1 << cr::PLLON.offset) | (1 << cr::PLLRDY.offset));
        let err = configure_clocks(&mut sim, &ClockConfig::reference(), &mut Trace::new())
            .unwrap_err();
        assert_eq!(err, ClockError::PllRunning { pll: Pll::Main });
        assert_eq!(sim.write_count(), 0);
    }

    #[test]
    fn running_pllsai_is_refused_before_any_write() {
        let mut sim = SimulatedRcc::new();
        sim.seed(Register::RccCr, (1 << cr::PLLSAION.offset) | (1 << cr::PLLSAIRDY.offset));
        let before = sim.word(Register::RccPllcfgr);
        let mut trace = Trace::new();
        let err = configure_clocks(&mut sim, &ClockConfig::reference(), &mut trace).unwrap_err();
        assert_eq!(err, ClockError::PllRunning { pll: Pll::Sai });
        assert_eq!(sim.write_count(), 0);
        assert_eq!(sim.word(Register::RccPllcfgr), before);
        assert_eq!(trace.events(), &[Event::Failed(err)]);
    }

    #[test]
    fn lcd_ceiling_follows_the_configured_window() {
        let mut cfg = ClockConfig::reference();
        cfg.display.lcd_range = bounds::FrequencyRange::new("LCD clock", 5_000_000, 6_500_000);
        let mut sim = SimulatedRcc::new();
        let clocks = configure_clocks(&mut sim, &cfg, &mut Trace::new()).unwrap();
        assert_eq!(clocks.ceiling(Domain::Lcd), 6_500_000);
        assert_eq!(clocks.ceiling(Domain::Apb1), cfg.buses.apb1_max_hz);
    }

    #[test]
    fn resolve_matches_reference_numbers() {
        let s = Settings::resolve(&ClockConfig::reference()).unwrap();
        assert_eq!((s.main_pll.m, s.main_pll.n, s.main_pll.p), (8, 180, 2));
        assert_eq!((s.display.n, s.display.r, s.display.divr), (50, 2, 8));
        assert_eq!((s.buses.ahb, s.buses.apb1, s.buses.apb2), (1, 4, 2));
        assert_eq!(s.wait_states, 5);
    }
}
