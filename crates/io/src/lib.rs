use model::*;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub mod gpx;
pub mod parser;
mod ride_file;

pub use ride_file::RideFile;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("track point time {0:?} is out of range")]
    TimeOutOfRange(TrackTime),
}

/// Where the artifacts of one ride go: `{dir}/{base}*`.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputPaths {
    pub dir: PathBuf,
    pub base: String,
}

impl OutputPaths {
    /// `base` is the input's file stem, plus `_{suffix}` when given.
    /// Without `dir` the artifacts land next to the input.
    pub fn new(input: &Path, dir: Option<&Path>, suffix: Option<&str>) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ride".to_string());
        let base = match suffix.filter(|s| !s.is_empty()) {
            Some(sfx) => format!("{stem}_{sfx}"),
            None => stem,
        };
        let dir = match dir {
            Some(d) => d.to_path_buf(),
            None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        Self { dir, base }
    }

    /// `{base}{tail}` as a bare file name.
    pub fn file_name(&self, tail: &str) -> String {
        format!("{}{tail}", self.base)
    }

    pub fn path(&self, tail: &str) -> PathBuf {
        self.dir.join(self.file_name(tail))
    }

    pub fn main_gpx(&self) -> PathBuf {
        self.path(".gpx")
    }

    pub fn gear_shifts_gpx(&self) -> PathBuf {
        self.path("_gear_shifts.gpx")
    }

    pub fn speed_shifts_gpx(&self) -> PathBuf {
        self.path("_speed_shifts.gpx")
    }

    pub fn text_report(&self) -> PathBuf {
        self.path("_report.txt")
    }

    pub fn markdown_report(&self) -> PathBuf {
        self.path("_report.md")
    }

    pub fn series_csv(&self) -> PathBuf {
        self.path("_series.csv")
    }
}

pub fn write_text(path: &Path, text: &str) -> Result<(), ExportError> {
    let f = File::create(path)?;
    let mut w = BufWriter::new(f);
    w.write_all(text.as_bytes())?;
    w.flush()?;
    Ok(())
}

pub fn export_gpx(doc: &TrackDocument, path: &Path) -> Result<(), ExportError> {
    let text = gpx::to_gpx_string(doc)?;
    write_text(path, &text)
}

#[derive(Serialize)]
struct SeriesRow<'a> {
    index: usize,
    elapsed_s: f64,
    wheel_speed: i32,
    engine_rpm: i32,
    gear_position: &'a str,
    water_temperature: i32,
}

/// Row sequence as CSV, the input of the chart renderer.
pub fn export_series_csv(rows: &[TelemetryRow], path: &Path) -> Result<(), ExportError> {
    let mut w = csv::Writer::from_path(path)?;
    for r in rows {
        w.serialize(SeriesRow {
            index: r.index,
            elapsed_s: r.elapsed_time.as_secs_f64(),
            wheel_speed: r.wheel_speed,
            engine_rpm: r.engine_rpm,
            gear_position: &r.gear_position,
            water_temperature: r.water_temperature,
        })?;
    }
    w.flush()?;
    Ok(())
}
