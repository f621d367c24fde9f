use core::str::FromStr;

use crate::sensors::GpsParser;
use crate::state::{GpsFix, Position};

const KNOTS_TO_MPH: f32 = 1.150_78;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NmeaFrame {
    #[default]
    None,
    Gga,
    Rmc,
}

/// Decoded receiver state plus counters for link diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpsData {
    // ── Position / Navigation ──
    pub lat: f64,          // Decimal degrees, north positive
    pub lon: f64,          // Decimal degrees, east positive
    pub speed: f32,        // Knots
    pub course: f32,       // Degrees true

    // ── Fix ──
    pub fix: bool,         // Latest GGA quality > 0 or RMC status A

    // ── Diagnostics ──
    pub sentences_rx: u16,
    pub checksum_errors: u16,
    pub frame_errors: u16,
    pub unknown_count: u16,
    pub last_frame: NmeaFrame,
}

impl GpsData {
    pub fn speed_mph(&self) -> f32 {
        self.speed * KNOTS_TO_MPH
    }
}

/// Byte-at-a-time NMEA 0183 decoder for GGA and RMC.
pub struct NmeaParser {
    buffer: heapless::String<128>,
    pub data: GpsData,
}

impl NmeaParser {
    pub fn new() -> Self {
        Self {
            buffer: heapless::String::new(),
            data: GpsData::default(),
        }
    }

    /// Feed a received chunk; returns how many GGA/RMC sentences it completed.
    pub fn push_data(&mut self, data: &[u8]) -> usize {
        data.iter().filter(|&&b| self.push_byte(b)).count()
    }

    fn push_byte(&mut self, b: u8) -> bool {
        if b == b'$' {
            self.buffer.clear();
        }

        if self.buffer.push(b as char).is_err() {
            self.data.frame_errors = self.data.frame_errors.wrapping_add(1);
            self.buffer.clear();
            return false;
        }

        if b != b'\n' {
            return false;
        }

        let done = self.parse_sentence();
        self.buffer.clear();
        done
    }

    fn parse_sentence(&mut self) -> bool {
        // Copy out so the field parsers can borrow self mutably
        let mut local: heapless::String<128> = heapless::String::new();
        let _ = local.push_str(self.buffer.as_str().trim());
        let s = local.as_str();

        if s.len() < 6 || !s.starts_with('$') {
            self.data.frame_errors = self.data.frame_errors.wrapping_add(1);
            return false;
        }

        if !verify_checksum(s) {
            self.data.checksum_errors = self.data.checksum_errors.wrapping_add(1);
            return false;
        }

        let body = s.split_once('*').map_or(s, |(body, _)| body);
        let frame = match body.get(3..6) {
            Some("GGA") => NmeaFrame::Gga,
            Some("RMC") => NmeaFrame::Rmc,
            _ => NmeaFrame::None,
        };

        self.data.sentences_rx = self.data.sentences_rx.wrapping_add(1);

        match frame {
            NmeaFrame::Gga => self.parse_gga(body),
            NmeaFrame::Rmc => self.parse_rmc(body),
            NmeaFrame::None => {
                self.data.unknown_count = self.data.unknown_count.wrapping_add(1);
                return false;
            }
        }
        self.data.last_frame = frame;
        true
    }

    // ────── GGA ──────
    fn parse_gga(&mut self, s: &str) {
        // $xxGGA,time,lat,NS,lon,EW,qual,… (0=no fix 1=GPS 2=DGPS)
        let mut parts = s.split(',').skip(2);
        let lat_raw = parts.next().unwrap_or("");
        let ns = parts.next().unwrap_or("");
        let lon_raw = parts.next().unwrap_or("");
        let ew = parts.next().unwrap_or("");
        let quality = u8::from_str(parts.next().unwrap_or("")).unwrap_or(0);

        self.data.fix = quality > 0;
        self.store_position(lat_raw, ns, lon_raw, ew);
    }

    // ────── RMC ──────
    fn parse_rmc(&mut self, s: &str) {
        // $xxRMC,time,status,lat,NS,lon,EW,speed,course,date,…
        let mut parts = s.split(',').skip(2);
        let status = parts.next().unwrap_or("");
        let lat_raw = parts.next().unwrap_or("");
        let ns = parts.next().unwrap_or("");
        let lon_raw = parts.next().unwrap_or("");
        let ew = parts.next().unwrap_or("");
        let speed_raw = parts.next().unwrap_or("");
        let course_raw = parts.next().unwrap_or("");

        self.data.fix = status == "A";

        if let Ok(spd) = f32::from_str(speed_raw) {
            self.data.speed = spd;
        }
        if let Ok(crs) = f32::from_str(course_raw) {
            self.data.course = crs;
        }
        self.store_position(lat_raw, ns, lon_raw, ew);
    }

    /// Empty fields (no fix yet) leave the last known position in place.
    fn store_position(&mut self, lat_raw: &str, ns: &str, lon_raw: &str, ew: &str) {
        if let Some(lat) = nmea_to_degrees(lat_raw, ns == "S") {
            self.data.lat = lat;
        }
        if let Some(lon) = nmea_to_degrees(lon_raw, ew == "W") {
            self.data.lon = lon;
        }
    }
}

impl Default for NmeaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl GpsParser for NmeaParser {
    fn feed_byte(&mut self, byte: u8) -> bool {
        self.push_byte(byte)
    }

    fn fix(&self) -> GpsFix {
        GpsFix {
            position: Position::new(self.data.lat, self.data.lon),
            valid: self.data.fix,
            speed_knots: self.data.speed,
            course_deg: self.data.course,
        }
    }
}

/// `dddmm.mmmm` to signed decimal degrees.
fn nmea_to_degrees(raw: &str, negative: bool) -> Option<f64> {
    let value = f64::from_str(raw).ok()?;
    let degrees = libm::floor(value / 100.0);
    let minutes = value - degrees * 100.0;
    let decimal = degrees + minutes / 60.0;
    Some(if negative { -decimal } else { decimal })
}

fn verify_checksum(s: &str) -> bool {
    if let Some((content, check_str)) = s.split_once('*') {
        let content = content.strip_prefix('$').unwrap_or(content);
        let calc = content.bytes().fold(0u8, |acc, b| acc ^ b);
        // Only the first 2 hex chars count
        let hex = check_str.get(..2).unwrap_or(check_str);
        if let Ok(val) = u8::from_str_radix(hex.trim(), 16) {
            return calc == val;
        }
    }
    false
}
