use analysis::track::DEFAULT_CHUNK_KM;
use chrono::{Local, NaiveDateTime};
use clap::error::ErrorKind;
use clap::{value_parser, ArgAction, Parser, ValueEnum, ValueHint};
use model::RideError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn Rideology telemetry CSV exports into GPX tracks and ride reports", long_about = None)]
pub struct Cli {
    /// CSV file exported by the Rideology app
    #[arg(value_hint = ValueHint::FilePath)]
    pub csv_file: PathBuf,

    /// Directory for the generated files (defaults next to the CSV)
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// Tag appended to every output name: `{stem}_{suffix}`
    #[arg(long)]
    pub suffix: Option<String>,

    /// Ride start, `YYYY-MM-DDTHH:MM:SS` (defaults to now)
    #[arg(long, value_parser = parse_start_time)]
    pub start_time: Option<NaiveDateTime>,

    /// Speed window start: last point at or below this speed (km/h)
    #[arg(long, value_parser = value_parser!(i32).range(0..=400))]
    pub min_speed: Option<i32>,

    /// Speed window end: first point reaching this speed (km/h, defaults to the top speed)
    #[arg(long, value_parser = value_parser!(i32).range(0..=400))]
    pub max_speed: Option<i32>,

    /// Predefined speed window; --min-speed/--max-speed override its bounds
    #[arg(long, value_enum)]
    pub speed_preset: Option<SpeedPreset>,

    /// Kilometers to cut from the start of the ride
    #[arg(long, default_value_t = 0.0)]
    pub starting_chop: f64,

    /// Kilometers to cut from the end of the ride
    #[arg(long, default_value_t = 0.0)]
    pub ending_chop: f64,

    /// Text appended to the ride title
    #[arg(long, default_value = "")]
    pub subtitle: String,

    /// Length of the pieces marked in the speed-shifts track (km)
    #[arg(long, default_value_t = DEFAULT_CHUNK_KM)]
    pub chunk_km: f64,

    /// Also write the markdown report and the chart data series
    #[arg(long, action = ArgAction::SetTrue)]
    pub graph: bool,

    /// Print the ride statistics as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Do not echo the report, log warnings only
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub quiet: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SpeedPreset {
    #[value(name = "0-100")]
    ZeroToHundred,
    #[value(name = "0-200")]
    ZeroToTwoHundred,
    #[value(name = "100-200")]
    HundredToTwoHundred,
}

impl SpeedPreset {
    pub fn bounds(self) -> (i32, i32) {
        match self {
            SpeedPreset::ZeroToHundred => (0, 100),
            SpeedPreset::ZeroToTwoHundred => (0, 200),
            SpeedPreset::HundredToTwoHundred => (100, 200),
        }
    }
}

fn parse_start_time(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| format!("invalid start time {s:?}: {e}"))
}

/// Exit code for a command line clap refused. Help and version requests
/// are not failures and yield `None`; every usage error shares the code of
/// an invalid parameter.
pub fn usage_exit_code(e: &clap::Error) -> Option<u8> {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => None,
        _ => Some(RideError::InvalidParameter(e.to_string()).exit_code()),
    }
}

/// Validated parameters of one conversion run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub suffix: Option<String>,
    pub start_time: NaiveDateTime,
    /// `(min, max)` km/h; `None` max means the ride's top speed.
    pub speed_window: Option<(i32, Option<i32>)>,
    pub starting_chop_km: f64,
    pub ending_chop_km: f64,
    pub subtitle: String,
    pub chunk_km: f64,
    pub graph: bool,
    pub json: bool,
    pub quiet: bool,
}

fn chop_km(name: &str, km: f64) -> Result<f64, RideError> {
    if km.is_finite() && km >= 0.0 {
        Ok(km)
    } else {
        Err(RideError::InvalidParameter(format!("{name} must be a distance >= 0 km, got {km}")))
    }
}

impl TryFrom<Cli> for RunConfig {
    type Error = RideError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let preset = cli.speed_preset.map(SpeedPreset::bounds);
        let min = cli.min_speed.or(preset.map(|(min, _)| min));
        let max = cli.max_speed.or(preset.map(|(_, max)| max));
        let speed_window = match (min, max) {
            (Some(min), Some(max)) if min > max => {
                return Err(RideError::InvalidParameter(format!(
                    "min speed {min} km/h is above max speed {max} km/h"
                )))
            }
            (Some(min), max) => Some((min, max)),
            (None, Some(_)) => {
                return Err(RideError::InvalidParameter(
                    "--max-speed needs --min-speed or --speed-preset".into(),
                ))
            }
            (None, None) => None,
        };

        if !(cli.chunk_km.is_finite() && cli.chunk_km > 0.0) {
            return Err(RideError::InvalidParameter(format!(
                "chunk size must be > 0 km, got {}",
                cli.chunk_km
            )));
        }

        Ok(Self {
            input: cli.csv_file,
            output_dir: cli.output_dir,
            suffix: cli.suffix,
            start_time: cli.start_time.unwrap_or_else(|| Local::now().naive_local()),
            speed_window,
            starting_chop_km: chop_km("starting chop", cli.starting_chop)?,
            ending_chop_km: chop_km("ending chop", cli.ending_chop)?,
            subtitle: cli.subtitle,
            chunk_km: cli.chunk_km,
            graph: cli.graph,
            json: cli.json,
            quiet: cli.quiet,
        })
    }
}
