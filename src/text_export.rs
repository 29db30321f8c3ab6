//! Flatten gridded model output into `lon,lat,value` text rows.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use ndarray::ArrayView2;

use crate::{
    errors::HydroGridErr,
    grid::{open_dataset, Grid},
    output::{output_file_name, TextOutput},
};

/// Settings for a text export run.
#[derive(Clone, Debug)]
pub struct ExportConfig {
    /// Directory scanned for model output files.
    pub input_dir: PathBuf,
    /// Directory the text files go to.
    pub output_dir: PathBuf,
    /// Only files whose names start with this are exported.
    pub file_prefix: String,
    /// Variable whose values are exported.
    pub value_var: String,
    /// Latitude variable.
    pub lat_var: String,
    /// Longitude variable.
    pub lon_var: String,
    /// Output files are named `<output_prefix><YYYY-MM-DD_HH>.txt`.
    pub output_prefix: String,
    /// Gzip the outputs.
    pub gzip: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            file_prefix: "wrfout_d03_".to_owned(),
            value_var: "RAINNC".to_owned(),
            lat_var: "XLAT".to_owned(),
            lon_var: "XLONG".to_owned(),
            output_prefix: "precip_csv_".to_owned(),
            gzip: false,
        }
    }
}

/// One exported file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedFile {
    /// The model output read.
    pub input: PathBuf,
    /// The text file written.
    pub output: PathBuf,
    /// Number of rows written.
    pub rows: usize,
}

const TIME_FORMATS: &[&str] = &["%Y-%m-%d_%H:%M:%S", "%Y-%m-%d_%H%M%S", "%Y-%m-%d_%H_%M_%S"];

/// Parse the valid time out of a WRF style file name such as `wrfout_d03_2013-10-17_00:00:00`.
pub fn valid_time_from_name(file_name: &str, prefix: &str) -> Result<NaiveDateTime, HydroGridErr> {
    let invalid = || HydroGridErr::InvalidFileName(file_name.to_owned());

    let stamp = file_name.strip_prefix(prefix).ok_or_else(invalid)?;
    let stamp = stamp.strip_suffix(".nc").unwrap_or(stamp);

    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(stamp, fmt).ok())
        .ok_or_else(invalid)
}

/// All files in `dir` whose names start with `prefix`, sorted by name.
pub fn find_inputs(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, HydroGridErr> {
    let entries = std::fs::read_dir(dir).map_err(|err| HydroGridErr::ResourceUnavailable {
        path: PathBuf::from(dir),
        reason: err.to_string(),
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|de| de.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .map(|name| name.to_string_lossy().starts_with(prefix))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    Ok(files)
}

/// Write one `lon,lat,value` row per cell.
///
/// The west-east axis is the outer loop and south-north the inner one, so consecutive rows walk
/// up a column of the grid.
pub fn write_rows<W: Write>(
    lon: ArrayView2<f64>,
    lat: ArrayView2<f64>,
    values: ArrayView2<f64>,
    out: W,
) -> Result<usize, HydroGridErr> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);

    let mut rows = 0;
    for ((lon, lat), val) in lon.t().iter().zip(lat.t().iter()).zip(values.t().iter()) {
        writer.write_record(&[lon.to_string(), lat.to_string(), val.to_string()])?;
        rows += 1;
    }
    writer.flush()?;

    Ok(rows)
}

/// Export a single model output file.
pub fn export_file(config: &ExportConfig, path: &Path) -> Result<ExportedFile, HydroGridErr> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| HydroGridErr::InvalidFileName(path.display().to_string()))?;
    let valid_time = valid_time_from_name(&file_name, &config.file_prefix)?;

    tracing::info!("Working on: {}", path.display());

    let nc = open_dataset(path)?;
    let lat = Grid::read(&nc, path, &config.lat_var)?;
    let lon = Grid::read(&nc, path, &config.lon_var)?;
    let values = Grid::read(&nc, path, &config.value_var)?;
    drop(nc);

    let (lat_plane, lon_plane, value_plane) = (lat.plane()?, lon.plane()?, values.plane()?);
    for (coord, plane) in [(&lat, &lat_plane), (&lon, &lon_plane)].iter() {
        if plane.dim() != value_plane.dim() {
            return Err(HydroGridErr::ShapeMismatch {
                left: values.layout().clone(),
                right: coord.layout().clone(),
            });
        }
    }

    let stem = format!(
        "{}{}",
        config.output_prefix,
        valid_time.format("%Y-%m-%d_%H")
    );
    let output = config
        .output_dir
        .join(output_file_name(&stem, "txt", config.gzip));

    let mut out = TextOutput::create(&output, config.gzip)?;
    let rows = write_rows(lon_plane, lat_plane, value_plane, &mut out)?;
    out.finish()?;

    tracing::info!("Saved {} rows to {}", rows, output.display());

    Ok(ExportedFile {
        input: PathBuf::from(path),
        output,
        rows,
    })
}

/// Export every matching file in the input directory.
///
/// Files whose names carry no parsable time are skipped with a warning, any other failure
/// stops the run.
pub fn run(config: &ExportConfig) -> Result<Vec<ExportedFile>, HydroGridErr> {
    let mut exported = vec![];

    for path in find_inputs(&config.input_dir, &config.file_prefix)? {
        match export_file(config, &path) {
            Ok(result) => exported.push(result),
            Err(HydroGridErr::InvalidFileName(name)) => {
                tracing::warn!("skipping {}, no valid time in the name", name)
            }
            Err(err) => return Err(err),
        }
    }

    Ok(exported)
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
