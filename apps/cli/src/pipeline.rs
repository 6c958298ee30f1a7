use analysis::report::{self, ChartLink};
use analysis::track::{self, GEAR_SHIFTS_SUFFIX, SPEED_SHIFTS_SUFFIX};
use analysis::Statistics;
use iox::{ExportError, OutputPaths, RideFile};
use model::RideError;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::config::RunConfig;

/// Chart images the external renderer produces next to the markdown report.
const CHARTS: [(&str, &str); 4] = [
    ("Wheel speed", "_speed.png"),
    ("Engine speed", "_rpm.png"),
    ("Gear", "_gear.png"),
    ("Statistics", "_stats.png"),
];

/// Result of a run that got as far as writing files.
#[derive(Debug)]
pub struct Outcome {
    pub title: String,
    pub statistics: Statistics,
    pub report: String,
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, ExportError)>,
}

impl Outcome {
    fn record(&mut self, path: PathBuf, result: Result<(), ExportError>) {
        match result {
            Ok(()) => {
                info!(path = %path.display(), "made file");
                self.written.push(path);
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "could not make file");
                self.failed.push((path, e));
            }
        }
    }
}

/// Load, filter, analyse and write every artifact of one ride.
///
/// Domain failures abort the run; a failing output file is recorded in the
/// outcome and the remaining files are still written.
pub fn run(cfg: &RunConfig) -> Result<Outcome, RideError> {
    let mut ride = RideFile::new(&cfg.input);
    if ride.is_empty()? {
        return Err(RideError::EmptyDataset);
    }

    if cfg.ending_chop_km > 0.0 {
        ride.filter_by_distance(-cfg.ending_chop_km)?;
    }
    if cfg.starting_chop_km > 0.0 {
        ride.filter_by_distance(cfg.starting_chop_km)?;
    }
    if let Some((min, max)) = cfg.speed_window {
        ride.filter_by_speed(min, max)?;
    }

    let rows = ride.rows().len();
    if rows <= 1 {
        return Err(RideError::InsufficientDataset { rows });
    }

    if !cfg.subtitle.is_empty() {
        let title = format!("{}, {}", ride.title()?, cfg.subtitle);
        ride.set_title(title);
    }
    let title = ride.title()?.to_string();
    let statistics = ride.statistics()?;
    let rows = ride.rows();

    let main = track::main_track(rows, &title, "", cfg.start_time)?;
    let gear_shifts = track::gear_shifts_track(rows, &title, GEAR_SHIFTS_SUFFIX, cfg.start_time);
    let speed_shifts =
        track::speed_shifts_track(rows, &title, SPEED_SHIFTS_SUFFIX, cfg.start_time, cfg.chunk_km)?;
    let report = report::render_text(&title, &statistics);

    let out = OutputPaths::new(&cfg.input, cfg.output_dir.as_deref(), cfg.suffix.as_deref());
    if let Err(e) = std::fs::create_dir_all(&out.dir) {
        warn!(dir = %out.dir.display(), error = %e, "cannot create output directory");
    }

    let mut outcome = Outcome {
        title,
        statistics,
        report,
        written: vec![],
        failed: vec![],
    };

    outcome.record(out.main_gpx(), iox::export_gpx(&main, &out.main_gpx()));
    outcome.record(out.gear_shifts_gpx(), iox::export_gpx(&gear_shifts, &out.gear_shifts_gpx()));
    outcome.record(out.speed_shifts_gpx(), iox::export_gpx(&speed_shifts, &out.speed_shifts_gpx()));
    outcome.record(out.text_report(), iox::write_text(&out.text_report(), &outcome.report));

    if cfg.graph {
        let charts: Vec<ChartLink> = CHARTS
            .iter()
            .map(|(caption, tail)| ChartLink {
                caption: caption.to_string(),
                file_name: out.file_name(tail),
            })
            .collect();
        let markdown = report::render_markdown(&outcome.title, &outcome.statistics, &charts);
        outcome.record(out.markdown_report(), iox::write_text(&out.markdown_report(), &markdown));
        outcome.record(out.series_csv(), iox::export_series_csv(rows, &out.series_csv()));
    }

    Ok(outcome)
}
