//! AHB, APB1 and APB2 prescalers in `RCC_CFGR`.

use crate::bounds::{self, FieldBounds};
use crate::error::ClockError;
use crate::field::{read_field, set_field};
use crate::regs::{cfgr, ClockRegisters, Register};

const HPRE_DIVIDERS: [u32; 9] = [1, 2, 4, 8, 16, 64, 128, 256, 512];
const PPRE_DIVIDERS: [u32; 5] = [1, 2, 4, 8, 16];

/// Per-bus ceilings, plus an optional floor on HCLK.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusPlan {
    pub ahb_max_hz: u32,
    pub apb1_max_hz: u32,
    pub apb2_max_hz: u32,
    /// Lowest HCLK an enabled peripheral accepts, e.g. Ethernet.
    pub min_hclk_hz: Option<u32>,
}

impl BusPlan {
    pub const fn stm32f429() -> Self {
        BusPlan {
            ahb_max_hz: bounds::AHB_MAX_HZ,
            apb1_max_hz: bounds::APB1_MAX_HZ,
            apb2_max_hz: bounds::APB2_MAX_HZ,
            min_hclk_hz: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusPrescalers {
    pub ahb: u32,
    pub apb1: u32,
    pub apb2: u32,
    pub hclk_hz: u32,
    pub pclk1_hz: u32,
    pub pclk2_hz: u32,
}

/// Smallest divider bringing `input_hz` to `max_hz` or below.
fn pick(what: &'static str, dividers: &[u32], input_hz: u32, max_hz: u32) -> Result<u32, ClockError> {
    dividers
        .iter()
        .copied()
        .find(|&d| u64::from(input_hz) <= u64::from(max_hz) * u64::from(d))
        .ok_or(ClockError::NoDividerFits { what, input_hz })
}

impl BusPrescalers {
    pub fn resolve(sysclk_hz: u32, plan: &BusPlan) -> Result<Self, ClockError> {
        let ahb = pick("HCLK", &HPRE_DIVIDERS, sysclk_hz, plan.ahb_max_hz)?;
        let hclk_hz = sysclk_hz / ahb;
        if let Some(floor_hz) = plan.min_hclk_hz {
            if hclk_hz < floor_hz {
                return Err(ClockError::BelowPeripheralFloor { hclk_hz, floor_hz });
            }
        }
        let apb1 = pick("PCLK1", &PPRE_DIVIDERS, hclk_hz, plan.apb1_max_hz)?;
        let apb2 = pick("PCLK2", &PPRE_DIVIDERS, hclk_hz, plan.apb2_max_hz)?;
        Ok(BusPrescalers {
            ahb,
            apb1,
            apb2,
            hclk_hz,
            pclk1_hz: hclk_hz / apb1,
            pclk2_hz: hclk_hz / apb2,
        })
    }
}

/// HPRE: /1 -> 0b0000, /2 -> 0b1000 ... /16 -> 0b1011, /64 -> 0b1100 ... /512 -> 0b1111.
pub fn hpre_code(divider: u32) -> Result<u32, ClockError> {
    let log2 = bounds::HPRE.check(divider)?.trailing_zeros();
    Ok(match log2 {
        0 => 0,
        1..=4 => 0b1000 | (log2 - 1),
        // no /32, so the upper half skips a step
        _ => 0b1000 | (log2 - 2),
    })
}

/// PPREx: /1 -> 0b000, /2 -> 0b100 ... /16 -> 0b111.
pub fn ppre_code(limits: &FieldBounds, divider: u32) -> Result<u32, ClockError> {
    let log2 = limits.check(divider)?.trailing_zeros();
    Ok(if log2 == 0 { 0 } else { 0b100 | (log2 - 1) })
}

fn hpre_divider(code: u32) -> u32 {
    match code {
        0b1000..=0b1011 => 1 << (code - 0b0111),
        0b1100..=0b1111 => 1 << (code - 0b0110),
        _ => 1,
    }
}

fn ppre_divider(code: u32) -> u32 {
    if code & 0b100 == 0 {
        1
    } else {
        1 << (code - 0b011)
    }
}

pub fn apply<R: ClockRegisters>(regs: &mut R, prescalers: &BusPrescalers) -> Result<(), ClockError> {
    let hpre = hpre_code(prescalers.ahb)?;
    let ppre1 = ppre_code(&bounds::PPRE1, prescalers.apb1)?;
    let ppre2 = ppre_code(&bounds::PPRE2, prescalers.apb2)?;
    regs.modify(Register::RccCfgr, |w| {
        set_field(w, cfgr::HPRE, hpre)?;
        set_field(w, cfgr::PPRE1, ppre1)?;
        set_field(w, cfgr::PPRE2, ppre2)
    })
}

/// Resolves the prescalers for `sysclk_hz` and writes them.
pub fn configure<R: ClockRegisters>(
    regs: &mut R,
    sysclk_hz: u32,
    plan: &BusPlan,
) -> Result<BusPrescalers, ClockError> {
    let prescalers = BusPrescalers::resolve(sysclk_hz, plan)?;
    apply(regs, &prescalers)?;
    Ok(prescalers)
}

/// Reads the three dividers back and checks them against `expected`.
pub fn verify<R: ClockRegisters>(regs: &mut R, expected: &BusPrescalers) -> Result<(), ClockError> {
    let word = regs.read(Register::RccCfgr);
    let found = [
        ("HPRE", hpre_divider(read_field(word, cfgr::HPRE)?), expected.ahb),
        ("PPRE1", ppre_divider(read_field(word, cfgr::PPRE1)?), expected.apb1),
        ("PPRE2", ppre_divider(read_field(word, cfgr::PPRE2)?), expected.apb2),
    ];
    for &(field, divider, want) in found.iter() {
        if divider != want {
            return Err(ClockError::ReadbackMismatch {
                field,
                expected: want,
                found: divider,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedRcc;

    const MHZ: u32 = 1_000_000;

    #[test]
    fn reference_180_mhz_split() {
        let mut sim = SimulatedRcc::new();
        let p = configure(&mut sim, 180 * MHZ, &BusPlan::stm32f429()).unwrap();
        assert_eq!((p.ahb, p.apb1, p.apb2), (1, 4, 2));
        assert_eq!((p.hclk_hz, p.pclk1_hz, p.pclk2_hz), (180 * MHZ, 45 * MHZ, 90 * MHZ));

        let word = sim.word(Register::RccCfgr);
        assert_eq!(read_field(word, cfgr::HPRE), Ok(0b0000));
        assert_eq!(read_field(word, cfgr::PPRE1), Ok(0b101));
        assert_eq!(read_field(word, cfgr::PPRE2), Ok(0b100));
        // PPRE2 /2 is 0b100 with the MSB at bit 15
        assert_eq!(word, (1 << 10) | (1 << 12) | (1 << 15));
        verify(&mut sim, &p).unwrap();
    }

    #[test]
    fn slow_sysclk_needs_no_division() {
        let p = BusPrescalers::resolve(16 * MHZ, &BusPlan::stm32f429()).unwrap();
        assert_eq!((p.ahb, p.apb1, p.apb2), (1, 1, 1));
    }

    #[test]
    fn every_bus_stays_under_its_ceiling() {
        let plan = BusPlan::stm32f429();
        let mut sysclk = 1 * MHZ;
        while sysclk <= 180 * MHZ {
            let p = BusPrescalers::resolve(sysclk, &plan).unwrap();
            assert!(p.hclk_hz <= plan.ahb_max_hz);
            assert!(p.pclk1_hz <= plan.apb1_max_hz);
            assert!(p.pclk2_hz <= plan.apb2_max_hz);
            // one step less division would overshoot
            if p.apb1 > 1 {
                assert!(p.hclk_hz / (p.apb1 / 2) > plan.apb1_max_hz);
            }
            sysclk += 3 * MHZ;
        }
    }

    #[test]
    fn ahb_ceiling_skips_missing_div_32() {
        let plan = BusPlan {
            ahb_max_hz: 5 * MHZ,
            ..BusPlan::stm32f429()
        };
        // /32 would give exactly 5 MHz, but HPRE has no /32
        let p = BusPrescalers::resolve(160 * MHZ, &plan).unwrap();
        assert_eq!(p.ahb, 64);
        assert_eq!(p.hclk_hz, 2_500_000);
    }

    #[test]
    fn ethernet_floor_is_enforced() {
        let plan = BusPlan {
            min_hclk_hz: Some(bounds::ETHERNET_MIN_HCLK_HZ),
            ..BusPlan::stm32f429()
        };
        assert!(BusPrescalers::resolve(180 * MHZ, &plan).is_ok());
        assert_eq!(
            BusPrescalers::resolve(16 * MHZ, &plan),
            Err(ClockError::BelowPeripheralFloor {
                hclk_hz: 16 * MHZ,
                floor_hz: 25 * MHZ
            })
        );
    }

    #[test]
    fn hopeless_ceiling_is_rejected_without_writes() {
        let plan = BusPlan {
            apb1_max_hz: 1 * MHZ,
            ..BusPlan::stm32f429()
        };
        let mut sim = SimulatedRcc::new();
        assert_eq!(
            configure(&mut sim, 180 * MHZ, &plan),
            Err(ClockError::NoDividerFits {
                what: "PCLK1",
                input_hz: 180 * MHZ
            })
        );
        assert_eq!(sim.write_count(), 0);
    }

    #[test]
    fn codes_round_trip_through_dividers() {
        let hpre = [0b0000, 0b1000, 0b1001, 0b1010, 0b1011, 0b1100, 0b1101, 0b1110, 0b1111];
        for (&div, &code) in HPRE_DIVIDERS.iter().zip(hpre.iter()) {
            assert_eq!(hpre_code(div), Ok(code));
            assert_eq!(hpre_divider(code), div);
        }
        let ppre = [0b000, 0b100, 0b101, 0b110, 0b111];
        for (&div, &code) in PPRE_DIVIDERS.iter().zip(ppre.iter()) {
            assert_eq!(ppre_code(&bounds::PPRE1, div), Ok(code));
            assert_eq!(ppre_divider(code), div);
        }
        assert!(hpre_code(32).is_err());
        assert!(ppre_code(&bounds::PPRE2, 3).is_err());
    }

    #[test]
    fn invalid_dividers_never_reach_the_register() {
        let good = BusPrescalers::resolve(180 * MHZ, &BusPlan::stm32f429()).unwrap();
        let mut bad = [good; 3];
        bad[0].ahb = 32;
        bad[1].apb1 = 0;
        bad[2].apb2 = 32;
        for p in bad.iter() {
            let mut sim = SimulatedRcc::new();
            assert!(apply(&mut sim, p).is_err());
            assert_eq!(sim.write_count(), 0);
        }
    }

    #[test]
    fn other_cfgr_fields_survive() {
        let mut sim = SimulatedRcc::new();
        // MCO bits and RTCPRE
        sim.seed(Register::RccCfgr, 0xF01F_0000);
        configure(&mut sim, 180 * MHZ, &BusPlan::stm32f429()).unwrap();
        assert_eq!(sim.word(Register::RccCfgr) & 0xFFFF_0000, 0xF01F_0000);
    }

    #[test]
    fn verify_spots_a_mismatch() {
        let mut sim = SimulatedRcc::new();
        let p = BusPrescalers::resolve(180 * MHZ, &BusPlan::stm32f429()).unwrap();
        // nothing written yet, everything still /1
        assert_eq!(
            verify(&mut sim, &p),
            Err(ClockError::ReadbackMismatch {
                field: "PPRE1",
                expected: 4,
                found: 1
            })
        );
        assert_eq!(verify(&mut sim, &p).unwrap_err().kind(), crate::error::ErrorKind::Contract);
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let mut sim = SimulatedRcc::new();
        sim.seed(Register::RccCfgr, 0x0060_0000);
        let p = configure(&mut sim, 180 * MHZ, &BusPlan::stm32f429()).unwrap();
        let once = sim.word(Register::RccCfgr);
        apply(&mut sim, &p).unwrap();
        assert_eq!(sim.word(Register::RccCfgr), once);
        assert_eq!(sim.writes_to(Register::RccCfgr), 2);
        verify(&mut sim, &p).unwrap();
    }
}
