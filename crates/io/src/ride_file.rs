use analysis::{chop_by_distance, window_by_speed, Statistics};
use model::*;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::parser;

/// A Rideology export on disk.
///
/// The file is read and parsed on first access and cached. Filters replace
/// the cached rows in place and hand the same `RideFile` back for chaining.
#[derive(Debug)]
pub struct RideFile {
    path: PathBuf,
    text: Option<String>,
    rows: Option<Vec<TelemetryRow>>,
    title: Option<String>,
}

impl RideFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), text: None, rows: None, title: None }
    }

    /// A ride whose contents are already in memory.
    pub fn with_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Self::new(path) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn text(&mut self) -> Result<&str, RideError> {
        if self.text.is_none() {
            self.text = Some(read_text(&self.path)?);
        }
        Ok(self.text.as_deref().unwrap_or_default())
    }

    /// Parses the file once; later calls return the cached (possibly filtered) rows.
    pub fn load(&mut self) -> Result<&[TelemetryRow], RideError> {
        if self.rows.is_none() {
            let rows = parser::parse_rows(self.text()?);
            info!(path = %self.path.display(), rows = rows.len(), "loaded ride");
            self.rows = Some(rows);
        }
        Ok(self.rows.as_deref().unwrap_or_default())
    }

    /// Rows loaded so far; empty before `load`.
    pub fn rows(&self) -> &[TelemetryRow] {
        self.rows.as_deref().unwrap_or_default()
    }

    pub fn is_empty(&mut self) -> Result<bool, RideError> {
        Ok(self.load()?.is_empty())
    }

    pub fn title(&mut self) -> Result<&str, RideError> {
        if self.title.is_none() {
            let title = parser::parse_title(self.text()?).ok_or(RideError::MissingTitle)?;
            self.title = Some(title);
        }
        Ok(self.title.as_deref().unwrap_or_default())
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    fn replace_rows(
        &mut self,
        f: impl FnOnce(Vec<TelemetryRow>) -> Result<Vec<TelemetryRow>, RideError>,
    ) -> Result<&mut Self, RideError> {
        self.load()?;
        let rows = self.rows.take().unwrap_or_default();
        self.rows = Some(f(rows)?);
        Ok(self)
    }

    /// See [`analysis::chop_by_distance`].
    pub fn filter_by_distance(&mut self, km: f64) -> Result<&mut Self, RideError> {
        self.replace_rows(|rows| chop_by_distance(rows, km))
    }

    /// See [`analysis::window_by_speed`].
    pub fn filter_by_speed(&mut self, min: i32, max: Option<i32>) -> Result<&mut Self, RideError> {
        self.replace_rows(|rows| window_by_speed(rows, min, max))
    }

    pub fn statistics(&mut self) -> Result<Statistics, RideError> {
        Statistics::compute(self.load()?)
    }
}

fn read_text(path: &Path) -> Result<String, RideError> {
    if path.is_dir() {
        return Err(RideError::IsDirectory(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => RideError::NotFound(path.to_path_buf()),
        _ => RideError::Read { path: path.to_path_buf(), source: e },
    })?;
    String::from_utf8(bytes).map_err(|_| RideError::NotDecodable(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text() -> String {
        let mut s = String::from("Title,,Coast   road\n");
        for (i, speed) in [0, 20, 45, 80, 80, 30, 0].iter().enumerate() {
            let lat = -34.6 + i as f64 * 0.002;
            s.push_str(&format!(
                "{},{lat},-58.4,0,85,0,{},{speed},0,0,0,0,{},0,0,0\n",
                i * 1000,
                1000 + speed * 60,
                if *speed == 0 { "N" } else { "3" }
            ));
        }
        s
    }

    #[test]
    fn test_title_is_cached() {
        let mut ride = RideFile::with_text("coast.csv", text());
        assert_eq!(ride.title().unwrap(), "Coast   road");
        ride.text = Some("Title,,changed\n".into());
        assert_eq!(ride.title().unwrap(), "Coast   road");
    }

    #[test]
    fn test_rows_are_cached() {
        let mut ride = RideFile::with_text("coast.csv", text());
        assert!(ride.rows().is_empty());
        assert_eq!(ride.load().unwrap().len(), 7);
        ride.text = Some(String::new());
        assert_eq!(ride.load().unwrap().len(), 7);
        assert!(!ride.is_empty().unwrap());
    }

    #[test]
    fn test_missing_title() {
        let mut ride = RideFile::with_text("x.csv", "0,1,2\n");
        assert!(matches!(ride.title(), Err(RideError::MissingTitle)));
        ride.set_title("Manual");
        assert_eq!(ride.title().unwrap(), "Manual");
    }

    #[test]
    fn test_filters_chain() {
        let mut ride = RideFile::with_text("coast.csv", text());
        ride.filter_by_distance(0.0).unwrap().filter_by_speed(0, None).unwrap();
        let idx: Vec<usize> = ride.rows().iter().map(|r| r.index).collect();
        assert_eq!(idx, vec![1, 2, 3, 4]);
        assert_eq!(ride.statistics().unwrap().max_wheel_speed, 80);
    }

    #[test]
    fn test_empty_ride() {
        let mut ride = RideFile::with_text("empty.csv", "Title,,Nothing\n");
        assert!(ride.is_empty().unwrap());
        assert!(matches!(ride.statistics(), Err(RideError::EmptyDataset)));
    }
}
