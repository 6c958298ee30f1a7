use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

mod error;

pub use error::RideError;

/// Label the Rideology app uses for neutral.
pub const NEUTRAL: &str = "N";

/// One sample of the ride log.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TelemetryRow {
    /// 1-based position among the valid data lines of the file.
    pub index: usize,
    pub elapsed_time: Duration,
    pub latitude: f64,
    pub longitude: f64,
    pub water_temperature: i32,
    pub engine_rpm: i32,
    pub wheel_speed: i32,
    pub gear_position: String,
}

impl TelemetryRow {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate { latitude: self.latitude, longitude: self.longitude }
    }

    pub fn is_moving(&self) -> bool {
        self.wheel_speed != 0
    }

    pub fn is_neutral(&self) -> bool {
        self.gear_position == NEUTRAL
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Degrees/minutes/seconds with hemisphere letters, e.g. `S034°36′12.34″ W058°22′54.00″`.
    pub fn sexagesimal(&self) -> String {
        let lat_symbol = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let lon_symbol = if self.longitude >= 0.0 { 'E' } else { 'W' };
        format!(
            "{lat_symbol}{} {lon_symbol}{}",
            dms(self.latitude),
            dms(self.longitude)
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sexagesimal())
    }
}

fn dms(degrees: f64) -> String {
    let sixtieths = |x: f64| (x.abs() % 1.0) * 60.0;
    let d = degrees.trunc().abs() as u32;
    let minutes = sixtieths(degrees);
    let seconds = sixtieths(minutes);
    let hundredths = ((seconds % 1.0) * 100.0) as u32;
    format!("{d:03}°{:02}′{:02}.{hundredths:02}″", minutes as u32, seconds as u32)
}

/// A moving row whose gear differs from the previous moving row.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct GearShift {
    pub row: TelemetryRow,
    pub previous_gear: String,
}

impl GearShift {
    /// Gear labels are compared as text, so "10" ranks below "2".
    pub fn is_upshift(&self) -> bool {
        self.previous_gear < self.row.gear_position
    }
}

/// First row of a contiguous run at the ride's top wheel speed.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SpeedMilestone {
    pub row: TelemetryRow,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct GearMax {
    pub gear: String,
    pub rpm: i32,
    pub kmh: i32,
}

/// Time attached to a track point. Elapsed times are resolved against the
/// document's start time when the document is written; `None` when the sum
/// falls outside the representable calendar.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub enum TrackTime {
    Elapsed(Duration),
    Absolute(NaiveDateTime),
}

impl TrackTime {
    pub fn resolve(&self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        match *self {
            TrackTime::Elapsed(d) => chrono::Duration::from_std(d)
                .ok()
                .and_then(|d| start.checked_add_signed(d)),
            TrackTime::Absolute(t) => Some(t),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub time: Option<TrackTime>,
    pub elevation: Option<f64>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub desc: Option<String>,
}

/// In-memory GPX 1.1 document: metadata, a single track segment and waypoints.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TrackDocument {
    pub name: String,
    pub desc: String,
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub points: Vec<TrackPoint>,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

impl TrackDocument {
    /// Name and description start out identical.
    pub fn new(name: impl Into<String>, start_time: NaiveDateTime) -> Self {
        let name = name.into();
        Self { desc: name.clone(), name, start_time, points: vec![], waypoints: vec![] }
    }

    pub fn add_track_point(&mut self, latitude: f64, longitude: f64, time: Option<TrackTime>) {
        self.points.push(TrackPoint { latitude, longitude, time, elevation: None });
    }

    pub fn add_waypoint(&mut self, latitude: f64, longitude: f64, name: impl Into<String>, desc: Option<String>) {
        // empty descriptions are left out of the document
        let desc = desc.filter(|d| !d.is_empty());
        self.waypoints.push(Waypoint { latitude, longitude, name: name.into(), desc });
    }
}
