use core::future::ready;

use embassy_futures::select::{select, Either};
use embedded_io_async::Read;

use crate::sensors::{ByteSource, GpsParser};
use crate::state::GpsPublisher;

/// Receive-side buffer drained per acquisition cycle.
const RX_CHUNK: usize = 256;

/// Bytes staged between the UART and the parser; more than one poll period
/// of NMEA at 9600 baud.
pub const GPS_STAGING: usize = 512;

/// Feeds received bytes to a parser and publishes each new solution.
pub struct GpsAcquisition<P: GpsParser> {
    parser: P,
    new_data: bool,
}

impl<P: GpsParser> GpsAcquisition<P> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            new_data: false,
        }
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Decode a burst of bytes. Returns `true` if a sentence completed.
    pub fn ingest(&mut self, bytes: &[u8]) -> bool {
        for &b in bytes {
            if self.parser.feed_byte(b) {
                self.new_data = true;
            }
        }
        self.new_data
    }

    /// Push the latest solution to the hub, but only if something new was decoded.
    pub fn publish(&mut self, publisher: &GpsPublisher<'_>) -> bool {
        if !self.new_data {
            return false;
        }
        self.new_data = false;

        let fix = self.parser.fix();
        trace!(
            "gps: fix={} lat={} lon={} kn={}",
            fix.valid,
            fix.position.latitude,
            fix.position.longitude,
            fix.speed_knots
        );
        publisher.publish(&fix);
        true
    }

    /// Drain everything pending on `source`, then publish.
    pub fn run_cycle(&mut self, source: &mut impl ByteSource, publisher: &GpsPublisher<'_>) -> bool {
        let mut buf = [0u8; RX_CHUNK];
        loop {
            let n = source.read_available(&mut buf);
            if n == 0 {
                break;
            }
            self.ingest(&buf[..n]);
        }
        self.publish(publisher)
    }
}

/// Holds what the receiver had buffered until the acquisition cycle drains it.
pub struct RxStaging<const N: usize> {
    buf: heapless::Vec<u8, N>,
    pos: usize,
}

impl<const N: usize> RxStaging<N> {
    pub const fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            pos: 0,
        }
    }

    pub fn pending(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Take every byte `rx` can hand over without waiting, up to capacity.
    /// Returns how many were added.
    pub async fn fill_from<R: Read>(&mut self, rx: &mut R) -> usize {
        if self.pos > 0 {
            let rest = self.pending();
            self.buf.copy_within(self.pos.., 0);
            self.buf.truncate(rest);
            self.pos = 0;
        }

        let start = self.buf.len();
        let mut chunk = [0u8; RX_CHUNK];
        while !self.buf.is_full() {
            let room = (N - self.buf.len()).min(RX_CHUNK);
            // A read that would have to wait loses to the ready future
            match select(rx.read(&mut chunk[..room]), ready(())).await {
                Either::First(Ok(0)) | Either::Second(()) => break,
                Either::First(Ok(n)) => {
                    let _ = self.buf.extend_from_slice(&chunk[..n]);
                }
                Either::First(Err(_)) => {
                    warn!("gps: uart read error");
                    break;
                }
            }
        }
        if self.buf.is_full() {
            debug!("gps: staging full, {} bytes wait for the next cycle", N);
        }
        self.buf.len() - start
    }
}

impl<const N: usize> Default for RxStaging<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteSource for RxStaging<N> {
    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        let n = self.pending().min(buf.len());
        buf[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        n
    }
}

#[cfg(feature = "stm32")]
pub use hw::gps_task;

#[cfg(feature = "stm32")]
mod hw {
    use embassy_executor::task;
    use embassy_stm32::peripherals::{DMA1_CH1, USART3};
    use embassy_stm32::usart::RingBufferedUartRx;
    use embassy_time::Ticker;

    use super::{GpsAcquisition, RxStaging, GPS_STAGING};
    use crate::config::GPS_POLL_PERIOD;
    use crate::drivers::gps::NmeaParser;
    use crate::state::SensorHub;

    /// Drains the USART3 DMA ring once per poll period and publishes a fix
    /// whenever a sentence completed.
    #[task]
    pub async fn gps_task(
        mut gps_rx: RingBufferedUartRx<'static, USART3, DMA1_CH1>,
        hub: &'static SensorHub,
    ) {
        let publisher = hub.gps_publisher();
        let mut acquisition = GpsAcquisition::new(NmeaParser::new());
        let mut staging = RxStaging::<GPS_STAGING>::new();
        let mut ticker = Ticker::every(GPS_POLL_PERIOD);
        let mut reported_errors = 0u16;

        loop {
            ticker.next().await;
            staging.fill_from(&mut gps_rx).await;
            acquisition.run_cycle(&mut staging, &publisher);

            let d = &acquisition.parser().data;
            if d.checksum_errors != reported_errors && d.checksum_errors % 100 == 0 {
                reported_errors = d.checksum_errors;
                debug!("gps: {} checksum errors", d.checksum_errors);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::gps::NmeaParser;
    use crate::state::{Position, SensorHub};
    use embassy_futures::block_on;

    const GGA: &[u8] = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
    const RMC: &[u8] = b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n";
    const GSV: &[u8] = b"$GPGSV,1,1,01,07,79,048,42*4B\r\n";

    /// One second of receiver output: satellites around a GGA, RMC last.
    fn nmea_burst() -> Vec<u8> {
        let mut burst = Vec::new();
        for _ in 0..6 {
            burst.extend_from_slice(GSV);
        }
        burst.extend_from_slice(GGA);
        for _ in 0..4 {
            burst.extend_from_slice(GSV);
        }
        burst.extend_from_slice(RMC);
        burst
    }

    /// UART stand-in: hands out chunks, then waits forever once empty.
    struct UartBurst<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl embedded_io_async::ErrorType for UartBurst<'_> {
        type Error = core::convert::Infallible;
    }

    impl Read for UartBurst<'_> {
        async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            if self.data.is_empty() {
                core::future::pending::<()>().await;
            }
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Hands out its bytes in fixed-size chunks.
    struct ChunkedSource<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl ByteSource for ChunkedSource<'_> {
        fn read_available(&mut self, buf: &mut [u8]) -> usize {
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            n
        }
    }

    #[test]
    fn partial_sentence_leaves_snapshot_untouched() {
        let hub = SensorHub::new();
        let mut gps = GpsAcquisition::new(NmeaParser::new());

        assert!(!gps.ingest(&GGA[..20]));
        assert!(!gps.publish(&hub.gps_publisher()));
        assert!(!hub.snapshot().fix_valid);
        assert_eq!(hub.snapshot().position, Position::default());
    }

    #[test]
    fn completed_sentence_is_published_once() {
        let hub = SensorHub::new();
        let mut gps = GpsAcquisition::new(NmeaParser::new());

        gps.ingest(GGA);
        assert!(gps.publish(&hub.gps_publisher()));
        assert!(hub.snapshot().fix_valid);
        assert!(!gps.publish(&hub.gps_publisher()));
    }

    #[test]
    fn cycle_drains_chunked_source() {
        let hub = SensorHub::new();
        let mut gps = GpsAcquisition::new(NmeaParser::new());
        let mut source = ChunkedSource { data: GGA, chunk: 7 };

        assert!(gps.run_cycle(&mut source, &hub.gps_publisher()));
        assert!(hub.snapshot().fix_valid);
        assert!((hub.snapshot().position.latitude - 48.1173).abs() < 1e-6);

        let mut empty = ChunkedSource { data: &[], chunk: 7 };
        assert!(!gps.run_cycle(&mut empty, &hub.gps_publisher()));
    }

    #[test]
    fn staging_takes_whole_burst_without_waiting() {
        let hub = SensorHub::new();
        let mut gps = GpsAcquisition::new(NmeaParser::new());
        let burst = nmea_burst();
        assert!(burst.len() > RX_CHUNK);

        let mut rx = UartBurst { data: &burst, chunk: 64 };
        let mut staging = RxStaging::<GPS_STAGING>::new();
        assert_eq!(block_on(staging.fill_from(&mut rx)), burst.len());

        assert!(gps.run_cycle(&mut staging, &hub.gps_publisher()));
        assert_eq!(staging.pending(), 0);
        let snap = hub.snapshot();
        assert!(snap.fix_valid);
        assert_eq!(snap.speed_knots, 22.4);
        assert_eq!(snap.course_deg, 84.4);

        // Nothing new on the wire: the fill returns instead of blocking
        assert_eq!(block_on(staging.fill_from(&mut rx)), 0);
        assert!(!gps.run_cycle(&mut staging, &hub.gps_publisher()));
    }

    #[test]
    fn full_staging_leaves_rest_for_next_cycle() {
        let hub = SensorHub::new();
        let mut gps = GpsAcquisition::new(NmeaParser::new());
        let burst = nmea_burst();
        let mut rx = UartBurst { data: &burst, chunk: 64 };
        let mut staging = RxStaging::<128>::new();

        let mut taken = 0;
        for _ in 0..8 {
            taken += block_on(staging.fill_from(&mut rx));
            gps.run_cycle(&mut staging, &hub.gps_publisher());
        }
        assert_eq!(taken, burst.len());
        assert_eq!(hub.snapshot().speed_knots, 22.4);
    }

    #[test]
    fn refill_keeps_unread_bytes_in_order() {
        let mut rx = UartBurst {
            data: b"0123456789abcdefXYZ",
            chunk: 64,
        };
        let mut staging = RxStaging::<16>::new();
        assert_eq!(block_on(staging.fill_from(&mut rx)), 16);

        let mut head = [0u8; 4];
        assert_eq!(staging.read_available(&mut head), 4);
        assert_eq!(&head, b"0123");

        assert_eq!(block_on(staging.fill_from(&mut rx)), 3);
        let mut rest = [0u8; 32];
        let n = staging.read_available(&mut rest);
        assert_eq!(&rest[..n], b"456789abcdefXYZ");
    }
}
