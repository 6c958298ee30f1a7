//! Builds the three GPX documents written for every ride.

use chrono::NaiveDateTime;
use model::*;

use crate::{segment_km, stats};

pub const GEAR_SHIFTS_SUFFIX: &str = " (gear shifts)";
pub const SPEED_SHIFTS_SUFFIX: &str = " (speed shifts)";
pub const DEFAULT_CHUNK_KM: f64 = 1.0;

/// The full track plus Start, End and top-speed waypoints.
pub fn main_track(
    rows: &[TelemetryRow],
    title: &str,
    suffix: &str,
    start_time: NaiveDateTime,
) -> Result<TrackDocument, RideError> {
    let (first, last) = match (rows.first(), rows.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Err(RideError::EmptyDataset),
    };

    let mut doc = TrackDocument::new(format!("{title}{suffix}"), start_time);
    for r in rows {
        doc.add_track_point(r.latitude, r.longitude, Some(TrackTime::Elapsed(r.elapsed_time)));
    }

    doc.add_waypoint(first.latitude, first.longitude, "Start", None);
    doc.add_waypoint(last.latitude, last.longitude, "End", None);

    for m in stats::max_wheel_speed_info(rows)? {
        let r = &m.row;
        doc.add_waypoint(
            r.latitude,
            r.longitude,
            format!("Max speed {} km/h", r.wheel_speed),
            Some(format!("{}rpm @ {} gear", r.engine_rpm, r.gear_position)),
        );
    }

    Ok(doc)
}

/// One waypoint per gear change, no track line.
pub fn gear_shifts_track(
    rows: &[TelemetryRow],
    title: &str,
    suffix: &str,
    start_time: NaiveDateTime,
) -> TrackDocument {
    let mut doc = TrackDocument::new(format!("{title}{suffix}"), start_time);
    for shift in stats::gear_shifts(rows) {
        let r = &shift.row;
        let action = if shift.is_upshift() { "Up" } else { "Low" };
        doc.add_waypoint(
            r.latitude,
            r.longitude,
            format!("{action} to {} gear", r.gear_position),
            Some(format!("{}km/h @ {}rpm", r.wheel_speed, r.engine_rpm)),
        );
    }
    doc
}

/// Splits the ride into `chunk_km` pieces and marks the fastest row of each.
///
/// A trailing piece shorter than `chunk_km` gets no waypoint.
pub fn speed_shifts_track(
    rows: &[TelemetryRow],
    title: &str,
    suffix: &str,
    start_time: NaiveDateTime,
    chunk_km: f64,
) -> Result<TrackDocument, RideError> {
    let mut prev = rows.first().ok_or(RideError::EmptyDataset)?;
    let mut doc = TrackDocument::new(format!("{title}{suffix}"), start_time);

    let mut km = 0.0_f64;
    let mut fastest: Option<&TelemetryRow> = None;
    for r in rows {
        if fastest.map_or(true, |m| m.wheel_speed < r.wheel_speed) {
            fastest = Some(r);
        }
        km += segment_km(prev, r);
        if km >= chunk_km {
            km = 0.0;
            if let Some(m) = fastest.take() {
                doc.add_waypoint(
                    m.latitude,
                    m.longitude,
                    format!("{} km/h", m.wheel_speed),
                    Some(format!("{} rpm @ {} gear", m.engine_rpm, m.gear_position)),
                );
            }
        }
        prev = r;
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::rows;
    use chrono::NaiveDate;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 11, 5).unwrap().and_hms_opt(8, 0, 0).unwrap()
    }

    #[test]
    fn test_main_track_points_and_waypoints() {
        let r = rows(&[(0, "N"), (40, "2"), (90, "4"), (90, "4"), (30, "2")]);
        let doc = main_track(&r, "Ruta 2", "", t0()).unwrap();

        assert_eq!(doc.name, "Ruta 2");
        assert_eq!(doc.desc, "Ruta 2");
        assert_eq!(doc.points.len(), 5);
        assert_eq!(doc.points[3].time, Some(TrackTime::Elapsed(r[3].elapsed_time)));

        let names: Vec<&str> = doc.waypoints.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Start", "End", "Max speed 90 km/h"]);
        assert_eq!(doc.waypoints[2].desc.as_deref(), Some("5500rpm @ 4 gear"));
        assert_eq!(doc.waypoints[1].latitude, r[4].latitude);
    }

    #[test]
    fn test_main_track_of_nothing_fails() {
        assert!(main_track(&[], "x", "", t0()).is_err());
    }

    #[test]
    fn test_gear_shift_waypoints() {
        let r = rows(&[(10, "1"), (20, "2"), (15, "1"), (40, "10")]);
        let doc = gear_shifts_track(&r, "Ride", GEAR_SHIFTS_SUFFIX, t0());

        assert_eq!(doc.name, "Ride (gear shifts)");
        assert!(doc.points.is_empty());
        let names: Vec<&str> = doc.waypoints.iter().map(|w| w.name.as_str()).collect();
        // "1" -> "10" compares as text
        assert_eq!(names, vec!["Up to 2 gear", "Low to 1 gear", "Up to 10 gear"]);
        assert_eq!(doc.waypoints[0].desc.as_deref(), Some("20km/h @ 2000rpm"));
    }

    #[test]
    fn test_speed_shifts_drop_trailing_chunk() {
        // 10 rows, 0.111 km apart: one full 0.5 km chunk ends at row 6
        let r = rows(&[
            (10, "1"),
            (30, "2"),
            (70, "3"),
            (50, "3"),
            (20, "2"),
            (25, "2"),
            (90, "4"),
            (95, "4"),
            (40, "3"),
            (10, "1"),
        ]);
        let doc = speed_shifts_track(&r, "Ride", SPEED_SHIFTS_SUFFIX, t0(), 0.5).unwrap();

        assert_eq!(doc.waypoints.len(), 1);
        assert_eq!(doc.waypoints[0].name, "70 km/h");
        assert_eq!(doc.waypoints[0].desc.as_deref(), Some("4500 rpm @ 3 gear"));
    }

    #[test]
    fn test_speed_shifts_one_per_chunk() {
        let r = rows(&[(10, "1"), (20, "1"), (30, "2"), (40, "2"), (50, "3")]);
        // each step is ~0.111 km, so every row after the first closes a chunk
        let doc = speed_shifts_track(&r, "Ride", "", t0(), 0.1).unwrap();
        let names: Vec<&str> = doc.waypoints.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["20 km/h", "30 km/h", "40 km/h", "50 km/h"]);
    }
}
