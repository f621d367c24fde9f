use core::fmt::Write;

use embassy_time::Duration;

use crate::state::NavStatus;

pub const STATUS_PERIOD: Duration = Duration::from_millis(1000);

/// One USB packet per line.
pub type StatusLine = heapless::String<64>;

/// Human readable status, three short lines.
pub fn status_lines(status: &NavStatus) -> [StatusLine; 3] {
    let mut head = StatusLine::new();
    let _ = write!(
        head,
        "{} wp={} fix={}\r\n",
        status.state.label(),
        status.target_index,
        status.fix_valid as u8
    );

    let mut nav = StatusLine::new();
    let _ = write!(
        nav,
        "dist={:.1}m brg={:.1} hdg={:.1}\r\n",
        status.info.distance_to_waypoint_m,
        status.info.bearing_to_waypoint_deg,
        status.info.current_heading_deg
    );

    let mut pos = StatusLine::new();
    let _ = write!(
        pos,
        "lat={:.6} lon={:.6}\r\n",
        status.position.latitude,
        status.position.longitude
    );

    [head, nav, pos]
}

#[cfg(feature = "stm32")]
pub use hw::status_task;

#[cfg(feature = "stm32")]
mod hw {
    use embassy_executor::task;
    use embassy_time::Ticker;

    use super::{status_lines, STATUS_PERIOD};
    use crate::state::NavStatus;
    use crate::tasks::nav_task::StatusSignal;
    use crate::usb::UsbSerial;

    /// Prints the latest navigation status over USB CDC once per second.
    #[task]
    pub async fn status_task(mut usb_serial: UsbSerial<'static>, status: &'static StatusSignal) {
        let mut latest: Option<NavStatus> = None;
        let mut ticker = Ticker::every(STATUS_PERIOD);

        loop {
            ticker.next().await;

            if let Some(s) = status.try_take() {
                latest = Some(s);
            }
            let Some(s) = latest else { continue };

            info!(
                "{} wp={} d={} brg={} hdg={}",
                s.state.label(),
                s.target_index,
                s.info.distance_to_waypoint_m,
                s.info.bearing_to_waypoint_deg,
                s.info.current_heading_deg
            );

            if usb_serial.dtr() {
                for line in status_lines(&s) {
                    let _ = usb_serial.write_packet(line.as_bytes()).await;
                }
            }
        }
    }
}
