use std::path::PathBuf;

/// Everything that can stop a ride from being turned into tracks and reports.
#[derive(Debug, thiserror::Error)]
pub enum RideError {
    #[error("file {0:?} not found.")]
    NotFound(PathBuf),
    #[error("{0:?} is a directory, not a file.")]
    IsDirectory(PathBuf),
    #[error("{0:?} is not a CSV file.")]
    NotDecodable(PathBuf),
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no data in the ride.")]
    EmptyDataset,
    #[error("not enough data in the ride ({rows} rows left).")]
    InsufficientDataset { rows: usize },
    #[error("no 'Title,,' line in the ride file.")]
    MissingTitle,
    #[error("{0}")]
    InvalidParameter(String),
}

impl RideError {
    /// Process exit code for this kind of failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NotFound(_) | Self::IsDirectory(_) | Self::NotDecodable(_) | Self::Read { .. } => 1,
            Self::EmptyDataset | Self::InsufficientDataset { .. } => 2,
            Self::MissingTitle => 3,
            Self::InvalidParameter(_) => 4,
        }
    }
}
