//! HC-SR04 Ranging Firmware for Raspberry Pi Pico 2 (RP2350)
//!
//! Pings an ultrasonic sensor twice a second and shows the distance on a
//! 128x32 SSD1306 OLED.
//!
//! # Architecture
//!
//! - Interrupt executor (SWI_IRQ_1, priority P2): echo edge capture
//! - Thread executor: trigger, ranging and presentation tasks
//!
//! # Wiring
//!
//! | Signal | Pin |
//! |--------|-----|
//! | Trigger | GP12 |
//! | Echo | GP13 (5V sensors need a divider) |
//! | OLED SDA | GP4 (I2C0) |
//! | OLED SCL | GP5 (I2C0) |
//!
//! On non-ARM targets this builds to an empty binary so `cargo test` can run
//! the library tests on the host.

#![cfg_attr(target_arch = "arm", no_std)]
#![cfg_attr(target_arch = "arm", no_main)]

#[cfg(target_arch = "arm")]
mod tasks;

#[cfg(target_arch = "arm")]
mod firmware {
    use defmt::info;
    use embassy_executor::{InterruptExecutor, Spawner};
    use embassy_rp::gpio::{Input, Level, Output, Pull};
    use embassy_rp::i2c::{self, I2c, InterruptHandler as I2cInterruptHandler};
    use embassy_rp::interrupt;
    use embassy_rp::interrupt::{InterruptExt, Priority};
    use embassy_rp::peripherals::I2C0;
    use embassy_rp::bind_interrupts;
    use sonar_ranging::config::{ECHO_WINDOW, TRIGGER_PERIOD};
    use sonar_ranging::pipeline::Pipeline;
    use sonar_ranging::ssd1306::{DEFAULT_ADDRESS, Ssd1306};
    use sonar_ranging::trigger::TriggerDriver;
    use static_cell::StaticCell;
    use {defmt_rtt as _, panic_probe as _};

    use crate::tasks::trigger::sensor_hold;
    use crate::tasks::{presentation_task, ranging_task, trigger_task};

    /// OLED bus clock.
    const I2C_FREQUENCY_HZ: u32 = 400_000;

    bind_interrupts!(struct Irqs {
        I2C0_IRQ => I2cInterruptHandler<I2C0>;
    });

    // Program metadata for `picotool info`
    #[unsafe(link_section = ".bi_entries")]
    #[used]
    pub static PICOTOOL_ENTRIES: [embassy_rp::binary_info::EntryAddr; 4] = [
        embassy_rp::binary_info::rp_program_name!(c"sonar"),
        embassy_rp::binary_info::rp_program_description!(c"HC-SR04 ranging with SSD1306 readout"),
        embassy_rp::binary_info::rp_cargo_version!(),
        embassy_rp::binary_info::rp_program_build_attribute!(),
    ];

    /// Channels, trigger signals and capture counters shared by every task.
    static PIPELINE: StaticCell<Pipeline> = StaticCell::new();

    /// Executor for the echo capture task. Preempts all thread-mode tasks.
    static CAPTURE_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

    #[interrupt]
    unsafe fn SWI_IRQ_1() {
        // SAFETY: SWI_IRQ_1 is reserved for CAPTURE_EXECUTOR
        unsafe { CAPTURE_EXECUTOR.on_interrupt() }
    }

    #[embassy_executor::main]
    async fn main(spawner: Spawner) {
        info!("Sonar ranging starting...");

        let p = embassy_rp::init(Default::default());
        let pipeline: &'static Pipeline = PIPELINE.init(Pipeline::new());

        // Sensor pins
        let trigger_pin = Output::new(p.PIN_12, Level::Low);
        let echo = Input::new(p.PIN_13, Pull::Down);

        // Edge capture on the high-priority executor
        interrupt::SWI_IRQ_1.set_priority(Priority::P2);
        let capture_spawner = CAPTURE_EXECUTOR.start(interrupt::SWI_IRQ_1);

        #[cfg(not(feature = "timestamp-queue"))]
        let ranger = {
            capture_spawner
                .spawn(crate::tasks::edge_capture_task(echo, pipeline.edge_capture()))
                .unwrap();
            pipeline.merged_ranger(ECHO_WINDOW)
        };
        #[cfg(feature = "timestamp-queue")]
        let ranger = {
            capture_spawner
                .spawn(crate::tasks::stamp_capture_task(echo, pipeline.stamp_capture()))
                .unwrap();
            pipeline.stamp_ranger(ECHO_WINDOW)
        };
        info!("Edge capture spawned on SWI_IRQ_1");

        // OLED on I2C0
        let mut i2c_config = i2c::Config::default();
        i2c_config.frequency = I2C_FREQUENCY_HZ;
        let bus = I2c::new_async(p.I2C0, p.PIN_5, p.PIN_4, Irqs, i2c_config);
        let display = Ssd1306::new(bus, DEFAULT_ADDRESS);

        let trigger = TriggerDriver::new(trigger_pin, sensor_hold(), TRIGGER_PERIOD)
            .with_ping_signal(&pipeline.ping)
            .with_cycle_signal(&pipeline.cycle);

        spawner.spawn(ranging_task(ranger)).unwrap();
        spawner.spawn(presentation_task(display, pipeline)).unwrap();
        spawner.spawn(trigger_task(trigger)).unwrap();
        info!("Ranging, presentation and trigger tasks spawned");
    }
}

#[cfg(not(target_arch = "arm"))]
fn main() {}
