//! Rideology CSV dialect: sixteen fixed columns per data line plus a
//! `Title,,<title>` metadata line.

use model::TelemetryRow;
use std::time::Duration;
use tracing::debug;

pub const COLUMNS: [&str; 16] = [
    "elapsed_msec",
    "gps_latitude",
    "gps_longitude",
    "instant_fuel_consumption",
    "water_temperature",
    "boost_temperature",
    "engine_rpm",
    "wheel_speed",
    "x",
    "acceleration",
    "throttle_position",
    "boost_pressure",
    "gear_position",
    "brake_pressure_fr_caliper",
    "lean_angle",
    "rideology_score",
];

const ELAPSED_MSEC: usize = 0;
const GPS_LATITUDE: usize = 1;
const GPS_LONGITUDE: usize = 2;
const WATER_TEMPERATURE: usize = 4;
const ENGINE_RPM: usize = 6;
const WHEEL_SPEED: usize = 7;
const GEAR_POSITION: usize = 12;

const TITLE_PREFIX: &str = "Title,,";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RowError {
    #[error("{column}: {value:?} is not a number")]
    NotANumber { column: &'static str, value: String },
}

/// Parses every valid data line, in file order.
///
/// Lines with the wrong number of fields, the header line and lines whose
/// numbers do not parse are skipped and do not consume an index.
pub fn parse_rows(text: &str) -> Vec<TelemetryRow> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = match rec {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "unreadable line skipped");
                continue;
            }
        };
        if rec.len() != COLUMNS.len() {
            continue;
        }
        if rec.get(ELAPSED_MSEC).map(|f| f.trim_matches('"')) == Some(COLUMNS[ELAPSED_MSEC]) {
            continue;
        }
        match parse_row(&rec, rows.len() + 1) {
            Ok(row) => rows.push(row),
            Err(e) => {
                let line = rec.position().map(|p| p.line()).unwrap_or_default();
                debug!(line, error = %e, "malformed data line skipped");
            }
        }
    }
    rows
}

fn field<'r>(rec: &'r csv::StringRecord, i: usize) -> &'r str {
    rec.get(i).unwrap_or_default()
}

fn not_a_number(i: usize, value: &str) -> RowError {
    RowError::NotANumber { column: COLUMNS[i], value: value.to_string() }
}

fn float(rec: &csv::StringRecord, i: usize) -> Result<f64, RowError> {
    let value = field(rec, i);
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| not_a_number(i, value))
}

/// Accepts `"123"` and `"123.0"`, truncating toward zero.
fn truncated(rec: &csv::StringRecord, i: usize) -> Result<i32, RowError> {
    float(rec, i).map(|v| v as i32)
}

fn parse_row(rec: &csv::StringRecord, index: usize) -> Result<TelemetryRow, RowError> {
    let msec = field(rec, ELAPSED_MSEC);
    let msec: u64 = msec.parse().map_err(|_| not_a_number(ELAPSED_MSEC, msec))?;
    Ok(TelemetryRow {
        index,
        elapsed_time: Duration::from_millis(msec),
        latitude: float(rec, GPS_LATITUDE)?,
        longitude: float(rec, GPS_LONGITUDE)?,
        water_temperature: truncated(rec, WATER_TEMPERATURE)?,
        engine_rpm: truncated(rec, ENGINE_RPM)?,
        wheel_speed: truncated(rec, WHEEL_SPEED)?,
        gear_position: field(rec, GEAR_POSITION).to_string(),
    })
}

/// Everything after `Title,,` on the first line that starts with it.
pub fn parse_title(text: &str) -> Option<String> {
    text.lines()
        .find_map(|l| l.strip_prefix(TITLE_PREFIX))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "elapsed_msec,gps_latitude,gps_longitude,instant_fuel_consumption,water_temperature,boost_temperature,engine_rpm,wheel_speed,x,acceleration,throttle_position,boost_pressure,gear_position,brake_pressure_fr_caliper,lean_angle,rideology_score";

    fn line(msec: &str, speed: &str, gear: &str) -> String {
        format!("{msec},-34.6034,-58.3816,3.1,84.0,30,4520.0,{speed},0,0,12.5,101,{gear},0,-3.2,88")
    }

    #[test]
    fn test_parse_data_lines() {
        let text = format!(
            "Title,,Morning ride\nDate,,2024-03-10\n{HEADER}\n{}\n{}\n",
            line("0", "0", "N"),
            line("1500", "12.9", "1")
        );
        let rows = parse_rows(&text);
        assert_eq!(rows.len(), 2);

        let r = &rows[1];
        assert_eq!(r.index, 2);
        assert_eq!(r.elapsed_time, Duration::from_millis(1500));
        assert!((r.latitude + 34.6034).abs() < 1e-12);
        assert!((r.longitude + 58.3816).abs() < 1e-12);
        assert_eq!(r.water_temperature, 84);
        assert_eq!(r.engine_rpm, 4520);
        assert_eq!(r.wheel_speed, 12);
        assert_eq!(r.gear_position, "1");
    }

    #[test]
    fn test_quoted_header_skipped() {
        let quoted = HEADER.split(',').map(|c| format!("\"{c}\"")).collect::<Vec<_>>().join(",");
        let text = format!("{quoted}\n{}\n", line("0", "0", "N"));
        let rows = parse_rows(&text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].index, 1);
    }

    #[test]
    fn test_whitespace_trimmed_and_crlf() {
        let text = format!(" {} \r\n{}\r\n", line("0", "0", "N"), line("100", " 7 ", " 2 "));
        let rows = parse_rows(&text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].wheel_speed, 7);
        assert_eq!(rows[1].gear_position, "2");
    }

    #[test]
    fn test_invalid_lines_do_not_consume_index() {
        let text = format!(
            "{}\n1,2,3\n{}\n{}\n",
            line("0", "0", "N"),
            line("10.5", "0", "N"),
            line("200", "abc", "1")
        );
        assert_eq!(parse_rows(&text).len(), 1);

        let text = format!("{}\nshort,line\n{}\n", line("0", "0", "N"), line("100", "5", "1"));
        let rows = parse_rows(&text);
        assert_eq!(rows.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_extra_column_rejected() {
        let text = format!("{},extra\n", line("0", "0", "N"));
        assert!(parse_rows(&text).is_empty());
    }

    #[test]
    fn test_title() {
        let text = "Device,,ZX-10R\r\nTitle,,Ruta 40,  south\r\nTitle,,second\n";
        assert_eq!(parse_title(text).as_deref(), Some("Ruta 40,  south"));
        assert_eq!(parse_title("no title here"), None);
    }

    #[test]
    fn test_row_error_names_column() {
        let e = not_a_number(WHEEL_SPEED, "fast");
        assert_eq!(e.to_string(), "wheel_speed: \"fast\" is not a number");
    }
}
