#![deny(unsafe_code)]
#![no_main]
#![no_std]

//use panic_halt as _;
use panic_itm as _;
use rtfm::app;

use clocktree::{configure_clocks, ClockConfig, Clocks, Trace};

mod ral;

#[app(device = stm32ral::stm32f4::stm32f429, peripherals = true)]
const APP: () = {
    struct Resources {
        //Late Ressource
        clocks: Clocks,
        myitm: cortex_m::peripheral::ITM,
    }

    #[init]
    fn init(cx: init::Context) -> init::LateResources {
        let mut myitm = cx.core.ITM;
        let mut regs = ral::RalClockRegisters::new(cx.device.RCC, cx.device.FLASH);

        // Configure our clocks, nothing else may run before this is done
        let mut trace = Trace::new();
        let result = configure_clocks(&mut regs, &ClockConfig::reference(), &mut trace);

        // The ITM baud rate only makes sense once the clocks are final
        for event in trace.events() {
            cortex_m::iprintln!(&mut myitm.stim[0], "clk: {}", event);
        }
        if trace.dropped() > 0 {
            cortex_m::iprintln!(&mut myitm.stim[0], "clk: {} events dropped", trace.dropped());
        }

        // No way to run peripherals on half-configured clocks, stop here
        let clocks = match result {
            Ok(clocks) => clocks,
            Err(e) => panic!("clock bring-up failed, code {:#04x}: {}", e.code(), e),
        };
        cortex_m::iprintln!(
            &mut myitm.stim[0],
            "SYSCLK {} HCLK {} PCLK1 {} PCLK2 {} LCD {}",
            clocks.sysclk(),
            clocks.hclk(),
            clocks.pclk1(),
            clocks.pclk2(),
            clocks.lcd()
        );

        //Return the now initialized Late Ressources
        init::LateResources { clocks, myitm }
    }

    #[idle(resources = [clocks, myitm])]
    fn idle(cx: idle::Context) -> ! {
        // the display driver goes here; it gets its pixel clock from cx.resources.clocks
        let lcd = cx.resources.clocks.lcd();
        cortex_m::iprintln!(&mut cx.resources.myitm.stim[0], "idle, LCD clock {} Hz", lcd);
        loop {
            cortex_m::asm::wfi();
        }
    }
};
