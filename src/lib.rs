#![deny(missing_docs)]
//! Tools to edit and extract the gridded NetCDF files of a WRF-Hydro workflow.
//!
//! The core operation rewrites a variable of a routing grid file wherever a mask variable
//! (typically basin or lake ids) holds one of the ids listed in a mask table. The other
//! modules pull drain points, precipitation text files and station hydrographs out of the
//! surrounding model inputs and outputs.

//
// Public API
//
pub use crate::ascii_grid::{aggregate_majority, AggregateConfig, AsciiGrid, AsciiHeader};
pub use crate::drain_points::{DrainLayers, DrainPoint, DrainPointConfig};
pub use crate::errors::HydroGridErr;
pub use crate::grid::{append_dataset, open_dataset, ElementKind, Grid, GridLayout};
pub use crate::hydrograph::{
    FlowRecord, HydrographConfig, ReturnFlows, ReturnPeriod, Station, StationDb, StationReport,
    StationSeries,
};
pub use crate::mask_table::{MaskEntry, MaskTable, MaskValue};
pub use crate::rewrite::{RewriteConfig, RewriteStats, RewriteSummary};
pub use crate::table::SummaryTable;
pub use crate::text_export::{ExportConfig, ExportedFile};

//
// Implementation only
//
#[macro_use]
extern crate strum_macros;

pub mod ascii_grid;
pub mod cmd_line;
pub mod drain_points;
mod errors;
mod grid;
pub mod hydrograph;
pub mod mask_table;
mod output;
pub mod rewrite;
mod table;
pub mod text_export;
