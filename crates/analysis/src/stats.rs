//! Ride statistics over the current (possibly filtered) row sequence.

use model::*;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::distance_km;

/// Idle speed only counts once the engine is warm.
const IDLE_MIN_WATER_TEMPERATURE: i32 = 80;

fn max_of(rows: &[TelemetryRow], f: impl Fn(&TelemetryRow) -> i32) -> Result<i32, RideError> {
    rows.iter().map(f).max().ok_or(RideError::EmptyDataset)
}

fn truncated_avg(values: &[i32]) -> Option<i32> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().map(|v| *v as f64).sum();
    Some((sum / values.len() as f64) as i32)
}

pub fn max_engine_rpm(rows: &[TelemetryRow]) -> Result<i32, RideError> {
    max_of(rows, |r| r.engine_rpm)
}

pub fn max_wheel_speed(rows: &[TelemetryRow]) -> Result<i32, RideError> {
    max_of(rows, |r| r.wheel_speed)
}

pub fn max_water_temperature(rows: &[TelemetryRow]) -> Result<i32, RideError> {
    max_of(rows, |r| r.water_temperature)
}

/// Span between the earliest and latest elapsed time.
pub fn elapsed_time(rows: &[TelemetryRow]) -> Result<Duration, RideError> {
    let min = rows.iter().map(|r| r.elapsed_time).min().ok_or(RideError::EmptyDataset)?;
    let max = rows.iter().map(|r| r.elapsed_time).max().ok_or(RideError::EmptyDataset)?;
    Ok(max - min)
}

/// Mean rpm while standing in neutral with a warm engine running.
pub fn avg_idle_speed(rows: &[TelemetryRow]) -> Option<i32> {
    let rpm: Vec<i32> = rows
        .iter()
        .filter(|r| {
            r.engine_rpm != 0
                && r.wheel_speed == 0
                && r.water_temperature > IDLE_MIN_WATER_TEMPERATURE
                && r.is_neutral()
        })
        .map(|r| r.engine_rpm)
        .collect();
    truncated_avg(&rpm)
}

/// Mean wheel speed over moving rows.
pub fn avg_speed(rows: &[TelemetryRow]) -> Option<i32> {
    let speeds: Vec<i32> = rows.iter().filter(|r| r.is_moving()).map(|r| r.wheel_speed).collect();
    truncated_avg(&speeds)
}

/// Distinct gear labels, sorted as text.
pub fn gears_list(rows: &[TelemetryRow]) -> Vec<String> {
    rows.iter()
        .map(|r| r.gear_position.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn max_for_gears(rows: &[TelemetryRow], f: impl Fn(&TelemetryRow) -> i32) -> BTreeMap<String, i32> {
    let mut out = BTreeMap::new();
    for r in rows.iter().filter(|r| !r.is_neutral()) {
        let v = f(r);
        out.entry(r.gear_position.clone())
            .and_modify(|m: &mut i32| *m = (*m).max(v))
            .or_insert(v);
    }
    out
}

pub fn max_engine_rpm_for_each_gear(rows: &[TelemetryRow]) -> BTreeMap<String, i32> {
    max_for_gears(rows, |r| r.engine_rpm)
}

pub fn max_wheel_speed_for_each_gear(rows: &[TelemetryRow]) -> BTreeMap<String, i32> {
    max_for_gears(rows, |r| r.wheel_speed)
}

/// Gear changes between moving rows.
///
/// The first row always seeds the comparison. After that, stationary rows
/// are skipped entirely, so a gear change made while stopped is reported
/// on the next moving row.
pub fn gear_shifts(rows: &[TelemetryRow]) -> Vec<GearShift> {
    let mut out = Vec::new();
    let Some((first, rest)) = rows.split_first() else {
        return out;
    };
    let mut last = first;
    for row in rest {
        if !row.is_moving() {
            continue;
        }
        if row.gear_position != last.gear_position {
            out.push(GearShift { row: row.clone(), previous_gear: last.gear_position.clone() });
        }
        last = row;
    }
    out
}

/// One event per contiguous run of rows at the ride's top wheel speed.
pub fn max_wheel_speed_info(rows: &[TelemetryRow]) -> Result<Vec<SpeedMilestone>, RideError> {
    let top = max_wheel_speed(rows)?;
    let mut out = Vec::new();
    let mut last_index: Option<usize> = None;
    for row in rows.iter().filter(|r| r.wheel_speed == top) {
        if last_index.map_or(true, |i| i + 1 != row.index) {
            out.push(SpeedMilestone { row: row.clone() });
        }
        last_index = Some(row.index);
    }
    Ok(out)
}

/// Top rpm and speed per gear, neutral excluded, sorted by gear label then speed.
pub fn max_for_each_gear(rows: &[TelemetryRow]) -> Vec<GearMax> {
    let rpm = max_engine_rpm_for_each_gear(rows);
    let kmh = max_wheel_speed_for_each_gear(rows);
    let mut out: Vec<GearMax> = rpm
        .into_iter()
        .map(|(gear, rpm)| {
            let kmh = kmh.get(&gear).copied().unwrap_or_default();
            GearMax { gear, rpm, kmh }
        })
        .collect();
    out.sort_by(|a, b| a.gear.cmp(&b.gear).then(a.kmh.cmp(&b.kmh)));
    out
}

pub fn start(rows: &[TelemetryRow]) -> Result<Coordinate, RideError> {
    rows.first().map(TelemetryRow::coordinate).ok_or(RideError::EmptyDataset)
}

pub fn end(rows: &[TelemetryRow]) -> Result<Coordinate, RideError> {
    rows.last().map(TelemetryRow::coordinate).ok_or(RideError::EmptyDataset)
}

/// Every derived metric of one row snapshot, computed eagerly.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct Statistics {
    pub rows: usize,
    pub max_engine_rpm: i32,
    pub max_wheel_speed: i32,
    pub max_water_temperature: i32,
    pub elapsed_time: Duration,
    pub avg_idle_speed: Option<i32>,
    pub avg_speed: Option<i32>,
    pub distance_km: f64,
    pub start: Coordinate,
    pub end: Coordinate,
    pub gears: Vec<String>,
    pub max_for_each_gear: Vec<GearMax>,
    pub gear_shifts: Vec<GearShift>,
    pub max_wheel_speed_info: Vec<SpeedMilestone>,
}

impl Statistics {
    pub fn compute(rows: &[TelemetryRow]) -> Result<Self, RideError> {
        Ok(Self {
            rows: rows.len(),
            max_engine_rpm: max_engine_rpm(rows)?,
            max_wheel_speed: max_wheel_speed(rows)?,
            max_water_temperature: max_water_temperature(rows)?,
            elapsed_time: elapsed_time(rows)?,
            avg_idle_speed: avg_idle_speed(rows),
            avg_speed: avg_speed(rows),
            distance_km: distance_km(rows)?,
            start: start(rows)?,
            end: end(rows)?,
            gears: gears_list(rows),
            max_for_each_gear: max_for_each_gear(rows),
            gear_shifts: gear_shifts(rows),
            max_wheel_speed_info: max_wheel_speed_info(rows)?,
        })
    }

    /// Flat JSON summary of the headline numbers.
    pub fn summary(&self) -> Value {
        json!({
            "rows": self.rows,
            "max_engine_rpm": self.max_engine_rpm,
            "max_wheel_speed": self.max_wheel_speed,
            "max_water_temperature": self.max_water_temperature,
            "avg_idle_speed": self.avg_idle_speed,
            "avg_speed": self.avg_speed,
            "elapsed_s": self.elapsed_time.as_secs(),
            "distance_km": (self.distance_km * 100.0).round() / 100.0,
            "start": self.start.sexagesimal(),
            "end": self.end.sexagesimal(),
            "gear_shifts": self.gear_shifts.len(),
            "max_speed_events": self.max_wheel_speed_info.len(),
            "max_for_each_gear": self.max_for_each_gear,
        })
    }
}
