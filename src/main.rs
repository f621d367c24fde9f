#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_stm32::dma::NoDma;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{Config as UsartConfig, UartRx};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_time::{Duration, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use gps_boat::board::Board;
use gps_boat::config::{HeadingSource, NavConfig};
use gps_boat::drivers::dshot::Dshot300;
use gps_boat::drivers::hmc5883::Hmc5883Compass;
use gps_boat::drivers::servo::Servo;
use gps_boat::helm::{HelmCodes, SharedHelm};
use gps_boat::nav::{HomeMode, NavigationController, Waypoint};
use gps_boat::state::SensorHub;
use gps_boat::tasks::nav_task::StatusSignal;
use gps_boat::tasks::{gps_task, helm_task, nav_task, status_task};
use gps_boat::usb;

// ── Mission ───────────────────────────────────────────────────────────────────
//  Slot 0 is overwritten with the position at GPS lock.
static MISSION: [Waypoint; 5] = [
    Waypoint::new(0.0, 0.0),
    Waypoint::new(47.608_410, -122.339_130),
    Waypoint::new(47.608_950, -122.338_420),
    Waypoint::new(47.609_380, -122.339_210),
    Waypoint::new(47.608_810, -122.339_870),
];

/// Local magnetic declination, east positive.
const DECLINATION_DEG: f32 = 15.2;

// ── Shared state ──────────────────────────────────────────────────────────────
static SENSORS: SensorHub = SensorHub::new();
static HELM: SharedHelm = SharedHelm::new(HelmCodes::new());
static STATUS: StatusSignal = StatusSignal::new();
static GPS_RING: StaticCell<[u8; 512]> = StaticCell::new();

bind_interrupts!(struct Irqs {
    I2C1_EV => embassy_stm32::i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => embassy_stm32::i2c::ErrorInterruptHandler<peripherals::I2C1>;
    USART3  => embassy_stm32::usart::InterruptHandler<peripherals::USART3>;
});

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // 1. Board init (168 MHz PLL)
    let board = Board::init();

    // 2. USB (CDC-ACM status console)
    let (usb_dev, usb_serial) = usb::init(board.usb);
    spawner.spawn(usb::usb_task(usb_dev)).unwrap();

    // 3. Actuators first so the rudder is centered and the ESC sees zero
    spawner
        .spawn(helm_task::servo_task(Servo::new(board.rudder), &HELM))
        .unwrap();
    spawner
        .spawn(helm_task::esc_task(Dshot300::new(board.esc), &HELM))
        .unwrap();

    // 4. Compass on I2C1 @ 400 kHz
    let i2c = I2c::new(
        board.compass.i2c,
        board.compass.scl,
        board.compass.sda,
        Irqs,
        NoDma,
        NoDma,
        Hertz(400_000),
        Default::default(),
    );
    let mut compass = Hmc5883Compass::new(i2c);
    if compass.init().await.is_err() {
        defmt::error!("compass init failed, headings will hold at 0");
    }

    // 5. GPS USART3 @ 9600, DMA keeps receiving between polls
    let mut gps_config = UsartConfig::default();
    gps_config.baudrate = 9600;
    let gps_rx = UartRx::new(board.gps.uart, Irqs, board.gps.rx, board.gps.rx_dma, gps_config)
        .unwrap()
        .into_ring_buffered(GPS_RING.init([0; 512]));
    spawner.spawn(gps_task::gps_task(gps_rx, &SENSORS)).unwrap();

    // 6. Navigation
    let config = NavConfig::new(&MISSION)
        .with_home_mode(HomeMode::CaptureOnLock)
        .with_declination(DECLINATION_DEG)
        .with_heading_source(HeadingSource::Compass);

    let nav = match NavigationController::new(&config, &SENSORS, compass) {
        Ok(nav) => nav,
        Err(e) => defmt::panic!("bad mission configuration: {}", e),
    };
    spawner
        .spawn(nav_task::nav_task(nav, &HELM, &STATUS, config.tick_period))
        .unwrap();

    spawner
        .spawn(status_task::status_task(usb_serial, &STATUS))
        .unwrap();

    // 7. Heartbeat LED @ 1 Hz
    let mut led = Output::new(board.led, Level::High, Speed::Low);
    loop {
        led.toggle();
        Timer::after(Duration::from_millis(500)).await;
    }
}
