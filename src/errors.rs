//! Module for errors.
use std::path::PathBuf;

use thiserror::Error;

use crate::grid::{ElementKind, GridLayout};

/// Error from the grid tools.
#[derive(Debug, Error)]
pub enum HydroGridErr {
    // Inherited errors from std
    /// Error forwarded from std
    #[error("std lib io error: {0}")]
    IO(#[from] ::std::io::Error),

    // Other forwarded errors
    /// Error forwarded from the netcdf library
    #[error("netcdf error: {0}")]
    NetCdf(#[from] ::netcdf::Error),
    /// Error forwarded from the csv crate
    #[error("csv error: {0}")]
    Csv(#[from] ::csv::Error),
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] ::rusqlite::Error),

    // My own errors from this crate
    /// A file needed for the operation could not be opened, created or copied.
    #[error("resource unavailable {}: {}", .path.display(), .reason)]
    ResourceUnavailable {
        /// The file that could not be used.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },
    /// A named variable does not exist in its dataset.
    #[error("variable {variable} not found in {}", .path.display())]
    NotFound {
        /// The variable name asked for.
        variable: String,
        /// The dataset that was searched.
        path: PathBuf,
    },
    /// Two grids that must line up cell for cell do not.
    #[error("grids are not conformant: {left} vs {right}")]
    ShapeMismatch {
        /// Layout of the first (mask) grid.
        left: GridLayout,
        /// Layout of the second (target) grid.
        right: GridLayout,
    },
    /// Writing the modified grid back to its dataset failed.
    #[error("failed writing {variable} back to {}: {reason}", .path.display())]
    IOFailure {
        /// The variable being written.
        variable: String,
        /// The dataset being written.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },
    /// A non-comment row of a mask table could not be understood.
    #[error("invalid mask table entry on line {line}: {text}")]
    InvalidTableEntry {
        /// One based line number.
        line: usize,
        /// The offending row.
        text: String,
    },
    /// A replacement value does not fit in the element type of the target grid.
    #[error("value {value} cannot be stored as {kind}")]
    ValueOutOfRange {
        /// The replacement value.
        value: String,
        /// The element kind of the target.
        kind: ElementKind,
    },
    /// Grid axes and values do not fit together.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    /// The variable holds something other than plain numbers.
    #[error("unsupported element type for {0}")]
    UnsupportedType(String),
    /// An ESRI ASCII grid was malformed.
    #[error("invalid ascii grid: {0}")]
    InvalidAsciiGrid(String),
    /// A file name did not follow the expected pattern.
    #[error("invalid file name: {0}")]
    InvalidFileName(String),
    /// A record in a data file could not be parsed.
    #[error("invalid record on line {line}: {reason}")]
    InvalidRecord {
        /// One based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },
    /// A required command line argument was not given.
    #[error("missing argument: {0}")]
    MissingArgument(String),
    /// Not enough data to complete the task.
    #[error("not enough data to complete task")]
    NotEnoughData,
}
