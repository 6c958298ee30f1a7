//! Trimming of the working row sequence. Rows are only ever removed, never
//! reordered or renumbered.

use model::*;
use tracing::{debug, warn};

use crate::{cumulative_km, stats};

/// Cuts `d` km off the ride.
///
/// * `d == 0` keeps everything.
/// * `d > 0` drops leading rows until the distance from the first row reaches `d`.
/// * `d < 0` keeps rows whose distance from the first row is within
///   `total + d`, i.e. cuts the last `|d|` km.
///
/// Both boundaries are inclusive. An empty ride stays empty.
pub fn chop_by_distance(rows: Vec<TelemetryRow>, d: f64) -> Result<Vec<TelemetryRow>, RideError> {
    if d == 0.0 || rows.is_empty() {
        return Ok(rows);
    }

    let cumulative = cumulative_km(&rows);
    let total = cumulative.last().copied().unwrap_or(0.0) + d;
    let before = rows.len();

    let kept: Vec<TelemetryRow> = rows
        .into_iter()
        .zip(cumulative)
        .filter(|(_, km)| if d < 0.0 { *km <= total } else { *km >= d })
        .map(|(r, _)| r)
        .collect();

    debug!(chop_km = d, before, after = kept.len(), "chopped ride by distance");
    Ok(kept)
}

/// Keeps the stretch that ends on the first row reaching `max` km/h and
/// starts at the last row at or below `min` km/h before it.
///
/// `max` defaults to the ride's top wheel speed. If `max` is never reached
/// the whole ride is the head; if nothing in the head is at or below `min`
/// the whole head survives. An empty ride stays empty.
pub fn window_by_speed(
    rows: Vec<TelemetryRow>,
    min: i32,
    max: Option<i32>,
) -> Result<Vec<TelemetryRow>, RideError> {
    if rows.is_empty() {
        return Ok(rows);
    }
    let max = match max {
        Some(m) => m,
        None => stats::max_wheel_speed(&rows)?,
    };

    // forward pass: up to and including the first row at max
    let mut head = Vec::with_capacity(rows.len());
    let mut reached_max = false;
    for r in rows {
        reached_max = r.wheel_speed >= max;
        head.push(r);
        if reached_max {
            break;
        }
    }
    if !reached_max {
        warn!(max, "speed never reaches the window max, keeping the whole ride");
    }

    // backward pass: from the max row back to the first row at or below min
    head.reverse();
    let mut window = Vec::with_capacity(head.len());
    for r in head {
        let reached_min = r.wheel_speed <= min;
        window.push(r);
        if reached_min {
            break;
        }
    }
    window.reverse();

    debug!(min, max, rows = window.len(), "applied speed window");
    Ok(window)
}
