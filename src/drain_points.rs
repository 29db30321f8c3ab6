//! Locate forecast (drain) points on a high resolution routing grid.
//!
//! A forecast point is any cell of `frxst_pts` holding 0. The routing grids are stored
//! north-up, so every layer is flipped before scanning to number the points the way WRF-Hydro
//! does, bottom row first.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    errors::HydroGridErr,
    grid::{open_dataset, Grid},
    output::TextOutput,
};

/// Variable names and files for a drain point extraction.
#[derive(Clone, Debug)]
pub struct DrainPointConfig {
    /// The routing grid file.
    pub input: PathBuf,
    /// CSV written with the points found.
    pub output: PathBuf,
    /// Forecast point layer.
    pub forecast_var: String,
    /// Stream order layer.
    pub order_var: String,
    /// Longitude layer.
    pub lon_var: String,
    /// Latitude layer.
    pub lat_var: String,
    /// Elevation layer.
    pub elevation_var: String,
}

impl DrainPointConfig {
    /// Configuration using the standard WRF-Hydro layer names.
    pub fn new(input: &Path, output: &Path) -> Self {
        DrainPointConfig {
            input: PathBuf::from(input),
            output: PathBuf::from(output),
            forecast_var: "frxst_pts".to_owned(),
            order_var: "STREAMORDER".to_owned(),
            lon_var: "LONGITUDE".to_owned(),
            lat_var: "LATITUDE".to_owned(),
            elevation_var: "TOPOGRAPHY".to_owned(),
        }
    }
}

/// A forecast point and the values of the other layers at its cell.
#[derive(Clone, Debug, PartialEq)]
pub struct DrainPoint {
    /// Numbered from 1 in scan order.
    pub id: usize,
    /// Row in the flipped grid.
    pub row: usize,
    /// Column.
    pub col: usize,
    /// Strahler stream order of the cell.
    pub stream_order: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
    /// Terrain height in meters.
    pub elevation: f64,
}

/// The layers a drain point scan needs, already flipped bottom row first.
#[derive(Debug)]
pub struct DrainLayers {
    /// Forecast point grid, `0` marks a drain point.
    pub forecast: Grid,
    /// Stream order.
    pub stream_order: Grid,
    /// Cell longitudes.
    pub lon: Grid,
    /// Cell latitudes.
    pub lat: Grid,
    /// Topography.
    pub elevation: Grid,
}

impl DrainLayers {
    /// Read and flip all layers, they must be 2-D and conformant.
    pub fn read(config: &DrainPointConfig) -> Result<Self, HydroGridErr> {
        let path = config.input.as_path();
        let nc = open_dataset(path)?;
        let read = |name: &str| Grid::read(&nc, path, name).map(Grid::flipud);

        let layers = DrainLayers {
            forecast: read(&config.forecast_var)?,
            stream_order: read(&config.order_var)?,
            lon: read(&config.lon_var)?,
            lat: read(&config.lat_var)?,
            elevation: read(&config.elevation_var)?,
        };

        let dims = &layers.forecast.layout().dims;
        tracing::info!(
            "grid size {}",
            dims.iter()
                .zip(&layers.forecast.layout().shape)
                .map(|(d, n)| format!("{}: {}", d, n))
                .collect::<Vec<String>>()
                .join(", ")
        );

        Ok(layers)
    }

    /// Scan row major for cells holding 0 in the forecast layer.
    pub fn drain_points(&self) -> Result<Vec<DrainPoint>, HydroGridErr> {
        let forecast = self.forecast.plane()?;
        if self.forecast.data().ndim() != 2 {
            return Err(HydroGridErr::InvalidGrid(format!(
                "{} must be 2-D",
                self.forecast.name()
            )));
        }

        for other in &[&self.stream_order, &self.lon, &self.lat, &self.elevation] {
            self.forecast.ensure_conformant(other)?;
        }

        let order = self.stream_order.plane()?;
        let lon = self.lon.plane()?;
        let lat = self.lat.plane()?;
        let elevation = self.elevation.plane()?;

        let points = forecast
            .indexed_iter()
            .filter(|&(_, &val)| val == 0.0)
            .enumerate()
            .map(|(i, ((row, col), _))| DrainPoint {
                id: i + 1,
                row,
                col,
                stream_order: order[[row, col]],
                lon: lon[[row, col]],
                lat: lat[[row, col]],
                elevation: elevation[[row, col]],
            })
            .collect();

        Ok(points)
    }
}

/// Write the points as CSV with a header row.
pub fn write_csv<W: Write>(points: &[DrainPoint], out: W) -> Result<(), HydroGridErr> {
    let mut writer = csv::Writer::from_writer(out);

    writer.write_record(&["ID", "Stream Order", "Longitude", "Latitude", "Elevation"])?;
    for pnt in points {
        writer.write_record(&[
            pnt.id.to_string(),
            pnt.stream_order.to_string(),
            pnt.lon.to_string(),
            pnt.lat.to_string(),
            pnt.elevation.to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}

/// Find the drain points of a routing grid and save them.
pub fn run(config: &DrainPointConfig) -> Result<Vec<DrainPoint>, HydroGridErr> {
    let points = DrainLayers::read(config)?.drain_points()?;

    tracing::info!(
        "Writing {} points to {}",
        points.len(),
        config.output.display()
    );
    let mut out = TextOutput::create(&config.output, false)?;
    write_csv(&points, &mut out)?;
    out.finish()?;

    Ok(points)
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    use crate::grid::{
        unit::{add_test_variable, create_test_dataset},
        ElementKind,
    };

    use tempdir::TempDir;

    #[test]
    fn test_drain_points_from_file() {
        let tmp = TempDir::new("hydro-grid-drain").unwrap();
        let input = tmp.path().join("Fulldom_hires.nc");
        let output = tmp.path().join("drain_pts.txt");

        // Stored north-up: the first row written is the northern edge.
        let mut nc = create_test_dataset(&input, &[("y", 2), ("x", 3)]).unwrap();
        let axes = &["y", "x"];
        let (short, float) = (ElementKind::Short, ElementKind::Float);
        let frxst = [-9999.0, 0.0, -9999.0, 0.0, -9999.0, 0.0];
        add_test_variable(&mut nc, "frxst_pts", axes, short, &frxst).unwrap();
        let order = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        add_test_variable(&mut nc, "STREAMORDER", axes, short, &order).unwrap();
        let lon = [34.0, 34.5, 35.0, 34.0, 34.5, 35.0];
        add_test_variable(&mut nc, "LONGITUDE", axes, float, &lon).unwrap();
        let lat = [31.5, 31.5, 31.5, 31.0, 31.0, 31.0];
        add_test_variable(&mut nc, "LATITUDE", axes, float, &lat).unwrap();
        let topo = [100.0, 110.0, 120.0, 10.0, 20.0, 30.0];
        add_test_variable(&mut nc, "TOPOGRAPHY", axes, float, &topo).unwrap();
        drop(nc);

        let points = run(&DrainPointConfig::new(&input, &output)).unwrap();

        assert_eq!(points.len(), 3);
        // Southern row comes first after the flip.
        assert_eq!((points[0].id, points[0].row, points[0].col), (1, 0, 0));
        assert_eq!(points[0].stream_order, 4.0);
        assert_eq!(points[0].elevation, 10.0);
        assert_eq!((points[1].id, points[1].row, points[1].col), (2, 0, 2));
        assert_eq!((points[2].id, points[2].row, points[2].col), (3, 1, 1));
        assert_eq!(points[2].lat, 31.5);

        let text = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ID,Stream Order,Longitude,Latitude,Elevation");
        assert_eq!(lines[1], "1,4,34,31,10");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_drain_points_need_conformant_layers() {
        let tmp = TempDir::new("hydro-grid-drain").unwrap();
        let input = tmp.path().join("Fulldom_hires.nc");

        let mut nc = create_test_dataset(&input, &[("y", 2), ("x", 2)]).unwrap();
        let short = ElementKind::Short;
        add_test_variable(&mut nc, "frxst_pts", &["y", "x"], short, &[0.0; 4]).unwrap();
        add_test_variable(&mut nc, "STREAMORDER", &["x", "y"], short, &[1.0; 4]).unwrap();
        add_test_variable(&mut nc, "LONGITUDE", &["y", "x"], short, &[1.0; 4]).unwrap();
        add_test_variable(&mut nc, "LATITUDE", &["y", "x"], short, &[1.0; 4]).unwrap();
        add_test_variable(&mut nc, "TOPOGRAPHY", &["y", "x"], short, &[1.0; 4]).unwrap();
        drop(nc);

        let config = DrainPointConfig::new(&input, &tmp.path().join("out.txt"));
        let layers = DrainLayers::read(&config).unwrap();
        assert!(matches!(
            layers.drain_points(),
            Err(HydroGridErr::ShapeMismatch { .. })
        ));

        let config = DrainPointConfig {
            elevation_var: "HGT".to_owned(),
            ..config
        };
        assert!(matches!(
            DrainLayers::read(&config),
            Err(HydroGridErr::NotFound { .. })
        ));
    }
}
