use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker, Timer};

use crate::helm::{Helm, RudderCommand};
use crate::nav::NavigationController;
use crate::sensors::Compass;
use crate::state::NavStatus;

pub type StatusSignal = Signal<CriticalSectionRawMutex, NavStatus>;

/// Rudder positions exercised at power-up so the linkage can be checked by eye.
pub const STARTUP_SWEEP: [RudderCommand; 4] = [
    RudderCommand::Left,
    RudderCommand::Center,
    RudderCommand::Right,
    RudderCommand::Center,
];
pub const SWEEP_STEP: Duration = Duration::from_secs(1);

pub async fn sweep_rudder(helm: &mut impl Helm, step: Duration) {
    for command in STARTUP_SWEEP {
        helm.set_rudder(command);
        Timer::after(step).await;
    }
}

/// Fixed-period driver for the navigation state machine.
pub struct NavLoop {
    ticker: Ticker,
}

impl NavLoop {
    pub fn new(period: Duration) -> Self {
        Self {
            ticker: Ticker::every(period),
        }
    }

    /// One navigation period: step the state machine, honour any hold it
    /// asks for, publish the resulting status, then wait out the period.
    ///
    /// A hold restarts the period from its end, so the ticks that fell due
    /// while holding are not replayed back to back.
    pub async fn step<C: Compass>(
        &mut self,
        nav: &mut NavigationController<'_, C>,
        helm: &mut impl Helm,
        status: &StatusSignal,
    ) {
        if let Some(hold) = nav.tick(helm) {
            Timer::after(hold).await;
            self.ticker.reset();
        }
        status.signal(nav.status());
        self.ticker.next().await;
    }
}

#[cfg(feature = "stm32")]
pub use hw::nav_task;

#[cfg(feature = "stm32")]
mod hw {
    use embassy_executor::task;

    use super::{sweep_rudder, NavLoop, StatusSignal, SWEEP_STEP};
    use crate::drivers::hmc5883::Hmc5883Compass;
    use crate::helm::SharedHelm;
    use crate::nav::NavigationController;

    use embassy_stm32::dma::NoDma;
    use embassy_stm32::peripherals::I2C1;

    pub type BoatCompass = Hmc5883Compass<'static, I2C1, NoDma, NoDma>;

    #[task]
    pub async fn nav_task(
        mut nav: NavigationController<'static, BoatCompass>,
        helm: &'static SharedHelm,
        status: &'static StatusSignal,
        period: embassy_time::Duration,
    ) {
        let mut helm = helm;
        sweep_rudder(&mut helm, SWEEP_STEP).await;

        let mut nav_loop = NavLoop::new(period);
        loop {
            nav_loop.step(&mut nav, &mut helm, status).await;
        }
    }
}
