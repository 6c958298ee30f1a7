use model::*;

pub mod filter;
pub mod report;
pub mod stats;
pub mod track;

pub use filter::{chop_by_distance, window_by_speed};
pub use stats::Statistics;

/// Kilometers per degree used by the planar distance approximation.
pub const KM_PER_DEGREE: f64 = 111.321;

/// Planar distance between two samples in km. Not geodesic: chop and
/// speed-shift boundaries depend on this exact metric.
pub fn segment_km(a: &TelemetryRow, b: &TelemetryRow) -> f64 {
    let dlat = (b.latitude - a.latitude).abs();
    let dlon = (b.longitude - a.longitude).abs();
    (dlat * dlat + dlon * dlon).sqrt() * KM_PER_DEGREE
}

/// Distance travelled from the first row up to each row, one entry per row.
pub fn cumulative_km(rows: &[TelemetryRow]) -> Vec<f64> {
    let mut out = Vec::with_capacity(rows.len());
    let mut km = 0.0_f64;
    let mut prev = rows.first();
    for r in rows {
        if let Some(p) = prev {
            km += segment_km(p, r);
        }
        out.push(km);
        prev = Some(r);
    }
    out
}

/// Total ride distance in km.
pub fn distance_km(rows: &[TelemetryRow]) -> Result<f64, RideError> {
    cumulative_km(rows).last().copied().ok_or(RideError::EmptyDataset)
}

#[cfg(test)]
pub(crate) mod testing {
    use model::TelemetryRow;
    use std::time::Duration;

    /// One row per (speed, gear), 1 s apart, heading north 0.001° per row.
    pub fn rows(samples: &[(i32, &str)]) -> Vec<TelemetryRow> {
        samples
            .iter()
            .enumerate()
            .map(|(i, (speed, gear))| row(i + 1, *speed, gear, i as f64 * 0.001))
            .collect()
    }

    pub fn row(index: usize, wheel_speed: i32, gear: &str, lat_offset: f64) -> TelemetryRow {
        TelemetryRow {
            index,
            elapsed_time: Duration::from_secs(index as u64 - 1),
            latitude: -34.6 + lat_offset,
            longitude: -58.4,
            water_temperature: 85,
            engine_rpm: 1000 + wheel_speed * 50,
            wheel_speed,
            gear_position: gear.to_string(),
        }
    }
}
