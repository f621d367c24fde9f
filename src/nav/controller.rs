//! Waypoint navigation state machine.
//!
//! One call to [`NavigationController::tick`] per loop period. The controller
//! never sleeps; when a state wants the boat to keep a command for a while it
//! returns the hold and the caller awaits it before the next tick.

use embassy_time::Duration;

use super::bearing::{correct_heading, course_to, direction_to_bearing, distance_between, Direction};
use super::waypoint::{HomeMode, Waypoint, WaypointStore};
use crate::config::{HeadingSource, NavConfig};
use crate::error::ConfigError;
use crate::helm::{Helm, RudderCommand, ThrottleCommand};
use crate::sensors::Compass;
use crate::state::{NavInfo, NavStatus, SensorHub, SensorSnapshot};

/// Distance and bearing are refreshed on every n-th Run tick.
const RUN_REFRESH_TICKS: u8 = 10;
/// Fraction of the leg below which the bearing tolerance is halved.
const NEAR_WAYPOINT_FRACTION: f32 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NavState {
    Init,
    WaitForGpsLock,
    WaitForGpsStabilize,
    WaitForGpsRelock,
    SetNextWaypoint,
    Start,
    Run,
    Stop,
    Idle,
}

impl NavState {
    /// Fixed-width label for a 16 character display line.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Init => "Initializing    ",
            Self::WaitForGpsLock => "Wait 4 GPS lock ",
            Self::WaitForGpsStabilize => "GPS Stabilize   ",
            Self::WaitForGpsRelock => "GPS Relocking   ",
            Self::SetNextWaypoint => "Setting Waypoint",
            Self::Start => "Starting Nav    ",
            Self::Run => "Running ...     ",
            Self::Stop => "Stop Nav        ",
            Self::Idle => "Idle            ",
        }
    }
}

pub struct NavigationController<'a, C: Compass> {
    hub: &'a SensorHub,
    compass: C,
    waypoints: WaypointStore,
    state: NavState,
    info: NavInfo,
    last_snapshot: SensorSnapshot,
    /// Set once the compass has delivered a usable reading.
    heading_seen: bool,

    initial_distance_m: f32,
    stabilize_countdown: u16,
    update_tick_counter: u8,

    bearing_tolerance_deg: f32,
    arrival_threshold_m: f32,
    stabilize_secs: u16,
    declination_deg: f32,
    heading_source: HeadingSource,
    gps_test_mode: bool,
    turn_hold: Duration,
    stabilize_hold: Duration,
}

impl<'a, C: Compass> NavigationController<'a, C> {
    pub fn new(config: &NavConfig<'_>, hub: &'a SensorHub, compass: C) -> Result<Self, ConfigError> {
        if let Err(e) = config.validate() {
            error!("nav: configuration rejected: {:?}", e);
            return Err(e);
        }

        let waypoints = WaypointStore::new(config.waypoints, config.home_mode)?;
        info!(
            "nav: {} waypoints, tolerance {} deg, arrival {} m",
            waypoints.len(),
            config.bearing_tolerance_deg,
            config.arrival_threshold_m
        );

        Ok(Self {
            hub,
            compass,
            waypoints,
            state: NavState::Init,
            info: NavInfo::default(),
            last_snapshot: SensorSnapshot::new(),
            heading_seen: false,
            initial_distance_m: 0.0,
            stabilize_countdown: 0,
            update_tick_counter: 0,
            bearing_tolerance_deg: config.bearing_tolerance_deg,
            arrival_threshold_m: config.arrival_threshold_m,
            stabilize_secs: config.gps_stabilize_secs,
            declination_deg: config.declination_deg,
            heading_source: config.heading_source,
            gps_test_mode: config.gps_test_mode,
            turn_hold: config.turn_hold,
            stabilize_hold: config.stabilize_hold,
        })
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn info(&self) -> NavInfo {
        self.info
    }

    pub fn waypoints(&self) -> &WaypointStore {
        &self.waypoints
    }

    pub fn compass_mut(&mut self) -> &mut C {
        &mut self.compass
    }

    pub fn status(&self) -> NavStatus {
        NavStatus {
            state: self.state,
            info: self.info,
            target_index: self.waypoints.target_index(),
            fix_valid: self.last_snapshot.fix_valid,
            position: self.last_snapshot.position,
        }
    }

    /// Run one step of the state machine and return how long the caller
    /// should hold the issued commands before the next step.
    pub fn tick(&mut self, helm: &mut impl Helm) -> Option<Duration> {
        let snap = self.sample_sensors();
        let heading = self.select_heading(&snap);
        if let Some(deg) = heading {
            self.info.current_heading_deg = deg;
        }

        match self.state {
            NavState::Init => {
                self.waypoints.reset_target();
                self.set_state(NavState::WaitForGpsLock);
                None
            }

            NavState::WaitForGpsLock => {
                if snap.fix_valid {
                    self.stabilize_countdown = self.stabilize_secs;
                    self.set_state(NavState::WaitForGpsStabilize);
                }
                None
            }

            NavState::WaitForGpsStabilize => {
                if self.stabilize_countdown > 0 {
                    self.stabilize_countdown -= 1;
                    return Some(self.stabilize_hold);
                }

                if self.waypoints.home_mode() == HomeMode::CaptureOnLock {
                    match self.waypoints.set_home(Waypoint::from(snap.position)) {
                        Ok(()) => info!(
                            "nav: home set to {} {}",
                            snap.position.latitude,
                            snap.position.longitude
                        ),
                        Err(e) => warn!("nav: home not captured: {:?}", e),
                    }
                }

                if self.gps_test_mode {
                    self.set_state(NavState::Idle);
                } else {
                    self.set_state(NavState::SetNextWaypoint);
                }
                None
            }

            NavState::SetNextWaypoint => {
                self.waypoints.advance_target();
                self.refresh_leg(&snap);
                info!(
                    "nav: target {} at {} m, bearing {}",
                    self.waypoints.target_index(),
                    self.info.distance_to_waypoint_m,
                    self.info.bearing_to_waypoint_deg
                );
                self.set_state(NavState::Start);
                None
            }

            NavState::WaitForGpsRelock => {
                if snap.fix_valid {
                    self.set_state(NavState::Start);
                }
                None
            }

            NavState::Start if heading.is_none() => {
                self.hold_for_heading(helm);
                None
            }

            NavState::Start => self.coarse_align(&snap, helm),

            NavState::Run if heading.is_none() => {
                self.hold_for_heading(helm);
                self.set_state(NavState::Start);
                None
            }

            NavState::Run => {
                self.track(&snap, helm);
                None
            }

            NavState::Stop => {
                helm.set_throttle(ThrottleCommand::Stop);
                if snap.fix_valid {
                    self.set_state(NavState::Idle);
                } else {
                    self.set_state(NavState::WaitForGpsRelock);
                }
                None
            }

            NavState::Idle => None,
        }
    }

    /// Point the bow at the target before committing to forward throttle.
    fn coarse_align(&mut self, snap: &SensorSnapshot, helm: &mut impl Helm) -> Option<Duration> {
        let direction = direction_to_bearing(
            self.info.bearing_to_waypoint_deg,
            self.info.current_heading_deg,
            self.bearing_tolerance_deg,
        );

        match direction {
            Direction::Left | Direction::Right => {
                let rudder = if direction == Direction::Left {
                    RudderCommand::FullLeft
                } else {
                    RudderCommand::FullRight
                };
                debug!("nav: aligning {:?}", direction);
                helm.set_rudder(rudder);
                helm.set_throttle(ThrottleCommand::Quarter);
                Some(self.turn_hold)
            }
            Direction::Straight => {
                helm.set_rudder(RudderCommand::Center);
                helm.set_throttle(ThrottleCommand::Half);

                let target = self.waypoints.current_target();
                self.initial_distance_m = distance_between(
                    snap.position.latitude,
                    snap.position.longitude,
                    target.latitude,
                    target.longitude,
                );
                self.info.distance_to_waypoint_m = self.initial_distance_m;
                self.update_tick_counter = 0;
                info!("nav: leg started, {} m to go", self.initial_distance_m);
                self.set_state(NavState::Run);
                None
            }
        }
    }

    /// No heading to steer on: keep the rudder amidships and the motor off.
    fn hold_for_heading(&self, helm: &mut impl Helm) {
        debug!("nav: no heading yet, holding");
        helm.set_rudder(RudderCommand::Center);
        helm.set_throttle(ThrottleCommand::Stop);
    }

    /// Proportional correction along the leg with a tightening tolerance.
    fn track(&mut self, snap: &SensorSnapshot, helm: &mut impl Helm) {
        if self.update_tick_counter == 0 {
            self.refresh_leg(snap);
        }
        self.update_tick_counter = (self.update_tick_counter + 1) % RUN_REFRESH_TICKS;

        if !snap.fix_valid {
            warn!("nav: GPS fix lost during leg");
            self.set_state(NavState::Stop);
            return;
        }

        let tolerance = if self.info.distance_to_waypoint_m
            <= self.initial_distance_m * NEAR_WAYPOINT_FRACTION
        {
            self.bearing_tolerance_deg * 0.5
        } else {
            self.bearing_tolerance_deg
        };

        match direction_to_bearing(
            self.info.bearing_to_waypoint_deg,
            self.info.current_heading_deg,
            tolerance,
        ) {
            Direction::Left => helm.set_rudder(RudderCommand::Left),
            Direction::Right => helm.set_rudder(RudderCommand::Right),
            Direction::Straight => {
                helm.set_rudder(RudderCommand::Center);
                helm.set_throttle(ThrottleCommand::Full);
            }
        }

        if self.info.distance_to_waypoint_m <= self.arrival_threshold_m {
            helm.set_throttle(ThrottleCommand::Stop);
            info!("nav: reached waypoint {}", self.waypoints.target_index());
            self.set_state(NavState::SetNextWaypoint);
        }
    }

    fn refresh_leg(&mut self, snap: &SensorSnapshot) {
        let target = self.waypoints.current_target();
        let here = snap.position;
        self.info.distance_to_waypoint_m =
            distance_between(here.latitude, here.longitude, target.latitude, target.longitude);
        self.info.bearing_to_waypoint_deg =
            course_to(here.latitude, here.longitude, target.latitude, target.longitude);
    }

    /// Read the compass into the shared snapshot, then copy the snapshot out.
    fn sample_sensors(&mut self) -> SensorSnapshot {
        match self.compass.read_heading_deg() {
            Ok(raw) if (0.0..360.0).contains(&raw) => {
                self.hub
                    .store_heading(correct_heading(raw, self.declination_deg));
                self.heading_seen = true;
            }
            Ok(raw) => warn!("nav: compass heading {} out of range, keeping last", raw),
            Err(e) => warn!("nav: compass read failed: {:?}", e),
        }

        self.last_snapshot = self.hub.snapshot();
        self.last_snapshot
    }

    /// `None` until there is something real to steer on.
    fn select_heading(&self, snap: &SensorSnapshot) -> Option<f32> {
        match self.heading_source {
            HeadingSource::CourseOverGround { min_speed_knots }
                if snap.fix_valid && snap.speed_knots > min_speed_knots =>
            {
                Some(snap.course_deg)
            }
            _ => self.heading_seen.then_some(snap.heading_deg),
        }
    }

    fn set_state(&mut self, next: NavState) {
        if next != self.state {
            info!("nav: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorError;
    use crate::state::{GpsFix, Position};

    struct FakeCompass {
        heading: f32,
        fail: bool,
    }

    impl FakeCompass {
        fn pointing(heading: f32) -> Self {
            Self { heading, fail: false }
        }
    }

    impl Compass for FakeCompass {
        fn read_heading_deg(&mut self) -> Result<f32, SensorError> {
            if self.fail {
                Err(SensorError::Bus)
            } else {
                Ok(self.heading)
            }
        }
    }

    #[derive(Default)]
    struct RecordingHelm {
        rudder: Vec<RudderCommand>,
        throttle: Vec<ThrottleCommand>,
    }

    impl RecordingHelm {
        fn last_rudder(&self) -> Option<RudderCommand> {
            self.rudder.last().copied()
        }

        fn last_throttle(&self) -> Option<ThrottleCommand> {
            self.throttle.last().copied()
        }
    }

    impl Helm for RecordingHelm {
        fn set_rudder(&mut self, command: RudderCommand) {
            self.rudder.push(command);
        }

        fn set_throttle(&mut self, command: ThrottleCommand) {
            self.throttle.push(command);
        }
    }

    // Target 1 sits ~110 m due east of the start position.
    const START: Position = Position::new(45.0, 7.0);
    const MISSION: [Waypoint; 3] = [
        Waypoint::new(0.0, 0.0),
        Waypoint::new(45.0, 7.0014),
        Waypoint::new(45.001, 7.0014),
    ];

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn publish(hub: &SensorHub, position: Position, valid: bool) {
        hub.gps_publisher().publish(&GpsFix {
            position,
            valid,
            speed_knots: 0.0,
            course_deg: 0.0,
        });
    }

    fn config() -> NavConfig<'static> {
        NavConfig::new(&MISSION)
            .with_stabilize_secs(3)
            .with_arrival_threshold(2.0)
    }

    fn tick_until(
        nav: &mut NavigationController<'_, FakeCompass>,
        helm: &mut RecordingHelm,
        state: NavState,
    ) {
        for _ in 0..50 {
            if nav.state() == state {
                return;
            }
            nav.tick(helm);
        }
        panic!("never reached {:?}, stuck in {:?}", state, nav.state());
    }

    /// Drive a fresh controller with a fix at START into `Start` for waypoint 1.
    fn at_start<'a>(hub: &'a SensorHub, heading: f32) -> (NavigationController<'a, FakeCompass>, RecordingHelm) {
        let mut nav = NavigationController::new(&config(), hub, FakeCompass::pointing(heading)).unwrap();
        let mut helm = RecordingHelm::default();
        publish(hub, START, true);
        tick_until(&mut nav, &mut helm, NavState::Start);
        (nav, helm)
    }

    #[test]
    fn rejects_invalid_config_before_running() {
        let hub = SensorHub::new();
        let empty = NavConfig::new(&[]);
        assert!(matches!(
            NavigationController::new(&empty, &hub, FakeCompass::pointing(0.0)),
            Err(ConfigError::NoWaypoints)
        ));

        let bad_tolerance = NavConfig::new(&MISSION).with_bearing_tolerance(0.0);
        assert!(matches!(
            NavigationController::new(&bad_tolerance, &hub, FakeCompass::pointing(0.0)),
            Err(ConfigError::InvalidTolerance(_))
        ));
    }

    #[test]
    fn init_resets_target_and_waits_for_lock() {
        init_logger();
        let hub = SensorHub::new();
        let mut helm = RecordingHelm::default();
        let mut nav = NavigationController::new(&config(), &hub, FakeCompass::pointing(0.0)).unwrap();

        assert_eq!(nav.state(), NavState::Init);
        assert_eq!(nav.tick(&mut helm), None);
        assert_eq!(nav.state(), NavState::WaitForGpsLock);
        assert_eq!(nav.waypoints().target_index(), 0);
    }

    #[test]
    fn waits_for_lock_without_fix() {
        let hub = SensorHub::new();
        let mut helm = RecordingHelm::default();
        let mut nav = NavigationController::new(&config(), &hub, FakeCompass::pointing(0.0)).unwrap();
        nav.tick(&mut helm);

        for _ in 0..20 {
            assert_eq!(nav.tick(&mut helm), None);
            assert_eq!(nav.state(), NavState::WaitForGpsLock);
        }
        assert!(helm.rudder.is_empty() && helm.throttle.is_empty());
    }

    #[test]
    fn stabilizes_for_configured_countdown() {
        init_logger();
        let hub = SensorHub::new();
        let mut helm = RecordingHelm::default();
        let mut nav = NavigationController::new(&config(), &hub, FakeCompass::pointing(0.0)).unwrap();
        nav.tick(&mut helm);

        publish(&hub, START, true);
        nav.tick(&mut helm);
        assert_eq!(nav.state(), NavState::WaitForGpsStabilize);

        for _ in 0..3 {
            assert_eq!(nav.tick(&mut helm), Some(Duration::from_secs(1)));
            assert_eq!(nav.state(), NavState::WaitForGpsStabilize);
        }

        assert_eq!(nav.tick(&mut helm), None);
        assert_eq!(nav.state(), NavState::SetNextWaypoint);
    }

    #[test]
    fn captures_home_after_stabilizing() {
        let hub = SensorHub::new();
        let mut helm = RecordingHelm::default();
        let mut nav = NavigationController::new(&config(), &hub, FakeCompass::pointing(0.0)).unwrap();
        publish(&hub, START, true);
        tick_until(&mut nav, &mut helm, NavState::SetNextWaypoint);

        assert_eq!(nav.waypoints().get(0), Some(Waypoint::new(45.0, 7.0)));
    }

    #[test]
    fn fixed_home_is_kept() {
        let hub = SensorHub::new();
        let mut helm = RecordingHelm::default();
        let table = [Waypoint::new(44.9, 6.9), MISSION[1], MISSION[2]];
        let cfg = NavConfig::new(&table)
            .with_stabilize_secs(3)
            .with_home_mode(HomeMode::Fixed);
        let mut nav = NavigationController::new(&cfg, &hub, FakeCompass::pointing(0.0)).unwrap();
        publish(&hub, START, true);
        tick_until(&mut nav, &mut helm, NavState::SetNextWaypoint);

        assert_eq!(nav.waypoints().get(0), Some(Waypoint::new(44.9, 6.9)));
    }

    #[test]
    fn gps_test_mode_parks_in_idle() {
        let hub = SensorHub::new();
        let mut helm = RecordingHelm::default();
        let cfg = config().with_gps_test_mode(true);
        let mut nav = NavigationController::new(&cfg, &hub, FakeCompass::pointing(0.0)).unwrap();
        publish(&hub, START, true);
        tick_until(&mut nav, &mut helm, NavState::Idle);

        for _ in 0..5 {
            nav.tick(&mut helm);
        }
        assert_eq!(nav.state(), NavState::Idle);
        assert!(helm.rudder.is_empty());
    }

    #[test]
    fn first_leg_targets_slot_after_home() {
        let hub = SensorHub::new();
        let (nav, _) = at_start(&hub, 0.0);

        assert_eq!(nav.waypoints().target_index(), 1);
        let info = nav.info();
        assert!((info.distance_to_waypoint_m - 110.0).abs() < 2.0);
        assert!((info.bearing_to_waypoint_deg - 90.0).abs() < 0.5);
    }

    #[test]
    fn start_turns_toward_target_until_aligned() {
        let hub = SensorHub::new();
        // Heading north, target east: turn right
        let (mut nav, mut helm) = at_start(&hub, 0.0);

        for _ in 0..3 {
            assert_eq!(nav.tick(&mut helm), Some(Duration::from_millis(100)));
            assert_eq!(nav.state(), NavState::Start);
            assert_eq!(helm.last_rudder(), Some(RudderCommand::FullRight));
            assert_eq!(helm.last_throttle(), Some(ThrottleCommand::Quarter));
        }

        nav.compass_mut().heading = 180.0;
        nav.tick(&mut helm);
        assert_eq!(helm.last_rudder(), Some(RudderCommand::FullLeft));

        nav.compass_mut().heading = 92.0;
        assert_eq!(nav.tick(&mut helm), None);
        assert_eq!(nav.state(), NavState::Run);
        assert_eq!(helm.last_rudder(), Some(RudderCommand::Center));
        assert_eq!(helm.last_throttle(), Some(ThrottleCommand::Half));
    }

    #[test]
    fn fix_loss_suspends_and_resumes_same_leg() {
        init_logger();
        let hub = SensorHub::new();
        let (mut nav, mut helm) = at_start(&hub, 90.0);
        nav.tick(&mut helm);
        assert_eq!(nav.state(), NavState::Run);
        nav.tick(&mut helm);
        assert_eq!(helm.last_throttle(), Some(ThrottleCommand::Full));

        let target_before = nav.waypoints().target_index();
        publish(&hub, START, false);

        nav.tick(&mut helm);
        assert_eq!(nav.state(), NavState::Stop);
        nav.tick(&mut helm);
        assert_eq!(helm.last_throttle(), Some(ThrottleCommand::Stop));
        assert_eq!(nav.state(), NavState::WaitForGpsRelock);

        for _ in 0..5 {
            nav.tick(&mut helm);
            assert_eq!(nav.state(), NavState::WaitForGpsRelock);
        }

        publish(&hub, START, true);
        nav.tick(&mut helm);
        assert_eq!(nav.state(), NavState::Start);
        assert_eq!(nav.waypoints().target_index(), target_before);

        nav.tick(&mut helm);
        assert_eq!(nav.state(), NavState::Run);
        assert_eq!(nav.waypoints().target_index(), target_before);
    }

    #[test]
    fn stop_with_fix_goes_idle() {
        let hub = SensorHub::new();
        let (mut nav, mut helm) = at_start(&hub, 90.0);
        nav.tick(&mut helm);
        publish(&hub, START, false);
        nav.tick(&mut helm);
        assert_eq!(nav.state(), NavState::Stop);

        // Fix comes back before Stop is processed
        publish(&hub, START, true);
        nav.tick(&mut helm);
        assert_eq!(nav.state(), NavState::Idle);
        assert_eq!(helm.last_throttle(), Some(ThrottleCommand::Stop));
    }

    #[test]
    fn arrival_stops_and_selects_next_waypoint() {
        let hub = SensorHub::new();
        let (mut nav, mut helm) = at_start(&hub, 90.0);
        nav.tick(&mut helm);
        assert_eq!(nav.state(), NavState::Run);

        // Arrive; wait for the next refresh tick to notice
        publish(&hub, Position::new(45.0, 7.00139), true);
        tick_until(&mut nav, &mut helm, NavState::SetNextWaypoint);
        assert_eq!(helm.last_throttle(), Some(ThrottleCommand::Stop));
        assert_eq!(nav.waypoints().target_index(), 1);

        nav.tick(&mut helm);
        assert_eq!(nav.waypoints().target_index(), 2);
        assert_eq!(nav.state(), NavState::Start);
        // Waypoint 2 is due north of waypoint 1
        assert!(nav.info().bearing_to_waypoint_deg < 1.0 || nav.info().bearing_to_waypoint_deg > 359.0);
    }

    #[test]
    fn tolerance_tightens_near_waypoint() {
        let hub = SensorHub::new();
        // 7 degrees left of the ~90 degree bearing
        let (mut nav, mut helm) = at_start(&hub, 90.0);
        nav.tick(&mut helm);
        assert_eq!(nav.state(), NavState::Run);

        nav.compass_mut().heading = 83.0;
        nav.tick(&mut helm);
        assert_eq!(helm.last_rudder(), Some(RudderCommand::Center));

        // ~5.5 m short of the target: inside 10% of the leg, outside arrival
        publish(&hub, Position::new(45.0, 7.00133), true);
        for _ in 0..RUN_REFRESH_TICKS {
            nav.tick(&mut helm);
        }
        assert_eq!(nav.state(), NavState::Run);
        assert!(nav.info().distance_to_waypoint_m < 11.0);
        assert_eq!(helm.last_rudder(), Some(RudderCommand::Right));
    }

    #[test]
    fn compass_failure_keeps_last_heading() {
        let hub = SensorHub::new();
        let mut helm = RecordingHelm::default();
        let cfg = config().with_declination(10.0);
        let mut nav = NavigationController::new(&cfg, &hub, FakeCompass::pointing(45.0)).unwrap();
        nav.tick(&mut helm);
        assert_eq!(nav.info().current_heading_deg, 35.0);

        nav.compass_mut().fail = true;
        nav.tick(&mut helm);
        assert_eq!(nav.info().current_heading_deg, 35.0);
        assert_eq!(hub.snapshot().heading_deg, 35.0);

        nav.compass_mut().fail = false;
        nav.compass_mut().heading = 400.0;
        nav.tick(&mut helm);
        assert_eq!(nav.info().current_heading_deg, 35.0);
    }

    #[test]
    fn dead_compass_from_power_up_never_steers() {
        let hub = SensorHub::new();
        let mut helm = RecordingHelm::default();
        let cfg = config().with_stabilize_secs(0);
        let mut compass = FakeCompass::pointing(90.0);
        compass.fail = true;
        let mut nav = NavigationController::new(&cfg, &hub, compass).unwrap();
        publish(&hub, START, true);
        tick_until(&mut nav, &mut helm, NavState::Start);

        for _ in 0..10 {
            assert_eq!(nav.tick(&mut helm), None);
            assert_eq!(nav.state(), NavState::Start);
            assert_eq!(helm.last_rudder(), Some(RudderCommand::Center));
            assert_eq!(helm.last_throttle(), Some(ThrottleCommand::Stop));
        }
        assert!(!helm.rudder.contains(&RudderCommand::FullRight));

        nav.compass_mut().fail = false;
        nav.tick(&mut helm);
        assert_eq!(nav.state(), NavState::Run);
        assert_eq!(nav.info().current_heading_deg, 90.0);
        assert_eq!(helm.last_throttle(), Some(ThrottleCommand::Half));
    }

    #[test]
    fn course_over_ground_used_when_moving() {
        let hub = SensorHub::new();
        let mut helm = RecordingHelm::default();
        let cfg = config().with_heading_source(HeadingSource::CourseOverGround { min_speed_knots: 2.0 });
        let mut nav = NavigationController::new(&cfg, &hub, FakeCompass::pointing(45.0)).unwrap();

        hub.gps_publisher().publish(&GpsFix {
            position: START,
            valid: true,
            speed_knots: 1.0,
            course_deg: 200.0,
        });
        nav.tick(&mut helm);
        assert_eq!(nav.info().current_heading_deg, 45.0);

        hub.gps_publisher().publish(&GpsFix {
            position: START,
            valid: true,
            speed_knots: 4.5,
            course_deg: 200.0,
        });
        nav.tick(&mut helm);
        assert_eq!(nav.info().current_heading_deg, 200.0);
    }

    #[test]
    fn status_reflects_latest_tick() {
        let hub = SensorHub::new();
        let (nav, _) = at_start(&hub, 90.0);
        let status = nav.status();

        assert_eq!(status.state, NavState::Start);
        assert_eq!(status.target_index, 1);
        assert!(status.fix_valid);
        assert_eq!(status.position, START);
        assert_eq!(status.state.label().len(), 16);
    }
}
