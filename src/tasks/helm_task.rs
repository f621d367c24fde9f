//! Output tasks that push the latest [`SharedHelm`] setpoints to hardware.

use embassy_executor::task;
use embassy_time::{Duration, Ticker};

use crate::drivers::dshot::{Dshot300, EscArming, ARMING_FRAMES};
use crate::drivers::servo::Servo;
use crate::helm::SharedHelm;

/// DShot frame rate for the propulsion ESC.
const ESC_FRAME_PERIOD: Duration = Duration::from_micros(1000);

/// Rudder servo, one pulse per 20 ms period at the current angle.
#[task]
pub async fn servo_task(mut servo: Servo, helm: &'static SharedHelm) {
    loop {
        servo.pulse(helm.rudder_angle()).await;
    }
}

/// Propulsion ESC. Sends zero until the ESC has armed, then the live throttle.
#[task]
pub async fn esc_task(mut esc: Dshot300, helm: &'static SharedHelm) {
    let mut arming = EscArming::new(ARMING_FRAMES);
    let mut ticker = Ticker::every(ESC_FRAME_PERIOD);

    loop {
        esc.send_value(arming.next_value(helm.throttle_code()));
        ticker.next().await;
    }
}
