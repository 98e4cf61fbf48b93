//! Error types for HPFA parameter resolution.
//!
//! Every failure here is local and synchronous: it stems from an invalid
//! parameter, a corrupt table, or a degenerate statistic. Nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for HPFA operations.
#[derive(Error, Debug)]
pub enum HpfaError {
    /// Ratio lies below the first range of the ratio table, or is not finite.
    #[error("resolution ratio {ratio} is outside the supported domain (must be finite and >= {min})")]
    OutOfRange {
        /// Offending ratio.
        ratio: f64,
        /// Lower bound of the first ratio range.
        min: f64,
    },

    /// Center-cell level is not one of Low, Mid, High.
    #[error("unknown center cell level '{0}' (expected low, mid or high)")]
    UnknownLevel(String),

    /// Modulation level is not one of Min, Mid, Max.
    #[error("unknown modulation '{0}' (expected min, mid or max)")]
    UnknownModulation(String),

    /// Kernel size has no column in the parameter table.
    #[error("kernel size {0} is not present in the parameter table")]
    UnknownKernelSize(usize),

    /// Kernel size is even or outside [5, 15].
    #[error("invalid kernel size {0} (must be odd and within 5..=15)")]
    InvalidKernelSize(usize),

    /// Denominator standard deviation is zero.
    #[error("division by zero: {0} has zero standard deviation")]
    DivisionByZero(&'static str),

    /// A statistic or factor is NaN or infinite.
    #[error("invalid statistic: {0} is not a finite number")]
    InvalidStatistic(&'static str),

    /// Pixel size is zero, negative or not finite.
    #[error("invalid resolution: {0}")]
    InvalidResolution(String),

    /// Filter text could not be parsed back.
    #[error("malformed filter: {0}")]
    MalformedFilter(String),

    /// Pinned parameter table failed validation.
    #[error("invalid table: {0}")]
    InvalidTable(String),

    /// Config file not found.
    #[error("config file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched.
        path: PathBuf,
    },

    /// I/O error reading config files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Failure reported by a raster collaborator.
    #[error("raster operation failed: {0}")]
    Raster(String),
}

/// Result type for HPFA operations.
pub type HpfaResult<T> = Result<T, HpfaError>;
