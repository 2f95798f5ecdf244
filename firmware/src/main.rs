#![no_std]
#![no_main]

extern crate alloc;

mod board;
mod logging;

#[cfg(not(any(feature = "defmt_logger", feature = "serial_logger")))]
compile_error!("enable the `defmt_logger` or `serial_logger` feature");

#[cfg(feature = "defmt_logger")]
use panic_probe as _;

#[cfg(all(feature = "serial_logger", not(feature = "defmt_logger")))]
use panic_halt as _;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[rtic::app(device = stm32f4xx_hal::pac, dispatchers = [USART3, UART4])]
mod app {
    use super::*;

    use board::{Board, MonoClock};

    use alloc_cortex_m::CortexMHeap;
    use fugit::ExtU64;
    use log::{debug, error, info, warn};
    use rpc_motor::proto::kiss::FrameDecoder;
    use rpc_motor::Vehicle;
    use rtic_monotonics::stm32::Tim2;
    use rtic_monotonics::Monotonic;
    use stm32f4xx_hal::{
        gpio::{Output, PushPull, PD15},
        pac::USART2,
        prelude::*,
        serial::{Event, Rx, Serial, Tx},
    };

    #[global_allocator]
    static ALLOCATOR: CortexMHeap = CortexMHeap::empty();

    const HEAP_SIZE: usize = 4096;

    /// Encoder sampling and action update period.
    const CONTROL_PERIOD_MS: u64 = 2;
    const HEARTBEAT_MS: u64 = 500;

    #[shared]
    struct Shared {
        vehicle: Vehicle<Board, MonoClock>,
    }

    #[local]
    struct Local {
        link_rx: Rx<USART2>,
        link_tx: Tx<USART2>,
        decoder: FrameDecoder,
        blue_led: PD15<Output<PushPull>>,
    }

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local) {
        {
            use core::mem::MaybeUninit;
            static mut HEAP: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
            unsafe { ALLOCATOR.init(core::ptr::addr_of_mut!(HEAP) as usize, HEAP_SIZE) }
        }

        let dp = ctx.device;
        let rcc = dp.RCC.constrain();
        let clocks = rcc.cfgr.sysclk(168.MHz()).freeze();

        let token = rtic_monotonics::create_stm32_tim2_monotonic_token!();
        Tim2::start(clocks.timclk1().to_Hz(), token);

        let gpioa = dp.GPIOA.split();
        let gpiob = dp.GPIOB.split();
        let gpioc = dp.GPIOC.split();
        let gpiod = dp.GPIOD.split();
        let gpioe = dp.GPIOE.split();

        // Nothing to report to if a logger is already installed.
        #[cfg(feature = "serial_logger")]
        {
            let dbg_serial = dp
                .USART1
                .tx(gpioa.pa9.into_alternate(), 115200.bps(), &clocks)
                .expect("debug port setup");
            logging::init(logging::Level::Info, dbg_serial).ok();
        }
        #[cfg(not(feature = "serial_logger"))]
        logging::init(logging::Level::Info).ok();
        info!("{} v{}", NAME, VERSION);

        let blue_led = gpiod.pd15.into_push_pull_output();

        let tx_pin = gpioa.pa2.into_alternate();
        let rx_pin = gpioa.pa3.into_alternate();
        let mut link = Serial::new(dp.USART2, (tx_pin, rx_pin), 38400.bps(), &clocks)
            .expect("command link setup");
        link.listen(Event::RxNotEmpty);
        let (link_tx, link_rx) = link.split();

        let board = Board::new(dp.TIM3, dp.TIM4, gpiob, gpioc, gpioe, &clocks);
        let vehicle = Vehicle::new(board, MonoClock);

        control_loop::spawn().ok();
        heartbeat::spawn().ok();

        (
            Shared { vehicle },
            Local {
                link_rx,
                link_tx,
                decoder: FrameDecoder::new(),
                blue_led,
            },
        )
    }

    #[task(priority = 1, shared = [vehicle])]
    async fn control_loop(mut ctx: control_loop::Context) {
        info!("control loop every {} ms", CONTROL_PERIOD_MS);
        loop {
            ctx.shared.vehicle.lock(|v| v.poll());
            Tim2::delay(CONTROL_PERIOD_MS.millis()).await;
        }
    }

    #[task(priority = 1, shared = [vehicle], local = [blue_led])]
    async fn heartbeat(mut ctx: heartbeat::Context) {
        loop {
            ctx.local.blue_led.toggle();
            let status = ctx.shared.vehicle.lock(|v| v.status());
            debug!(
                "heartbeat: {:?} {}/{}",
                status.state, status.left_transitions, status.right_transitions
            );
            Tim2::delay(HEARTBEAT_MS.millis()).await;
        }
    }

    #[task(priority = 2, binds = USART2, shared = [vehicle], local = [link_rx, link_tx, decoder])]
    fn usart2(mut ctx: usart2::Context) {
        let byte = match ctx.local.link_rx.read() {
            Ok(b) => b,
            Err(e) => {
                warn!("link read failed: {:?}", e);
                return;
            }
        };

        if let Some(frame) = ctx.local.decoder.push(byte) {
            let reply = ctx.shared.vehicle.lock(|v| v.handle_frame(&frame));
            if ctx.local.link_tx.bwrite_all(&reply).is_err() {
                error!("failed to send {} byte reply", reply.len());
            }
        }
    }
}
