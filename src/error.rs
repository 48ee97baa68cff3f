use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IgrfError {
    /// Represents a missing, truncated or inconsistent coefficient table
    #[error("{0}")]
    CoefficientTable(String),

    /// Requested an exact table entry for an epoch that is not tabulated
    #[error("Epoch {0} is not a tabulated epoch")]
    UnknownEpoch(f64),

    /// Coordinates did not form exactly one complete spherical, geodetic or cartesian triple
    #[error("{0}")]
    AmbiguousCoordinateInput(String),

    /// An epoch could not be read from text
    #[error("{0}")]
    Epoch(String),

    /// The field model was queried before an epoch was configured
    #[error("Field model has not been configured with an epoch")]
    Unconfigured,

    /// Unable to read a coefficient file
    #[error("Unable to read coefficient file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(feature = "python")]
impl From<IgrfError> for pyo3::PyErr {
    fn from(value: IgrfError) -> Self {
        let msg = value.to_string();
        pyo3::exceptions::PyValueError::new_err(msg)
    }
}
