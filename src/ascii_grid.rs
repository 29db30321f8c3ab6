//! ESRI ASCII grids of basin ids and their aggregation onto a coarser grid.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader, Read, Write},
    path::{Path, PathBuf},
};

use ndarray::Array2;

use crate::{errors::HydroGridErr, output::TextOutput};

/// The six line header of an ASCII grid.
#[derive(Clone, Debug, PartialEq)]
pub struct AsciiHeader {
    /// Number of columns.
    pub ncols: usize,
    /// Number of rows.
    pub nrows: usize,
    /// X of the lower left corner.
    pub xllcorner: f64,
    /// Y of the lower left corner.
    pub yllcorner: f64,
    /// Cell edge length.
    pub cellsize: f64,
    /// Value marking cells without data.
    pub nodata_value: f64,
}

const HEADER_KEYS: [&str; 6] = [
    "ncols",
    "nrows",
    "xllcorner",
    "yllcorner",
    "cellsize",
    "NODATA_value",
];

// GIS exports from some locales write decimal commas.
fn parse_decimal(text: &str) -> Option<f64> {
    text.parse::<f64>()
        .or_else(|_| text.replace(',', ".").parse::<f64>())
        .ok()
}

// Integers as written, anything else rounded to the nearest integer.
fn parse_cell(text: &str) -> Option<i64> {
    text.parse::<i64>()
        .ok()
        .or_else(|| parse_decimal(text).filter(|v| v.is_finite()).map(|v| v.round() as i64))
}

/// An integer valued ASCII grid, rows ordered bottom row first.
#[derive(Clone, Debug, PartialEq)]
pub struct AsciiGrid {
    header: AsciiHeader,
    values: Array2<i64>,
}

impl AsciiGrid {
    /// Read a grid file.
    pub fn load(path: &Path) -> Result<Self, HydroGridErr> {
        let file = File::open(path).map_err(|err| HydroGridErr::ResourceUnavailable {
            path: PathBuf::from(path),
            reason: err.to_string(),
        })?;

        let grid = Self::from_reader(file)?;
        tracing::info!(
            "read {} x {} grid from {}",
            grid.header.nrows,
            grid.header.ncols,
            path.display()
        );

        Ok(grid)
    }

    /// Parse a grid from any reader.
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, HydroGridErr> {
        let mut lines = BufReader::new(rdr).lines();

        let mut fields = [0.0f64; 6];
        for (i, (&key, field)) in HEADER_KEYS.iter().zip(fields.iter_mut()).enumerate() {
            let line = lines
                .next()
                .transpose()?
                .ok_or_else(|| HydroGridErr::InvalidAsciiGrid(format!("missing {}", key)))?;

            let mut tokens = line.split_whitespace();
            let name = tokens.next().unwrap_or("");
            if !name.eq_ignore_ascii_case(key) {
                return Err(HydroGridErr::InvalidAsciiGrid(format!(
                    "header line {} is '{}', expected {}",
                    i + 1,
                    line,
                    key
                )));
            }

            *field = tokens.next().and_then(parse_decimal).ok_or_else(|| {
                HydroGridErr::InvalidAsciiGrid(format!("bad value for {}: '{}'", key, line))
            })?;
        }

        let count = |val: f64, key: &str| {
            if val >= 0.0 && val.fract() == 0.0 {
                Ok(val as usize)
            } else {
                Err(HydroGridErr::InvalidAsciiGrid(format!("{} = {}", key, val)))
            }
        };

        let header = AsciiHeader {
            ncols: count(fields[0], "ncols")?,
            nrows: count(fields[1], "nrows")?,
            xllcorner: fields[2],
            yllcorner: fields[3],
            cellsize: fields[4],
            nodata_value: fields[5],
        };

        let mut values = Vec::with_capacity(header.nrows * header.ncols);
        for line in lines {
            for token in line?.split_whitespace() {
                let val = parse_cell(token).ok_or_else(|| {
                    HydroGridErr::InvalidAsciiGrid(format!("bad cell value '{}'", token))
                })?;
                values.push(val);
            }
        }

        let num_values = values.len();
        let mut values = Array2::from_shape_vec((header.nrows, header.ncols), values)
            .map_err(|_| {
                HydroGridErr::InvalidAsciiGrid(format!(
                    "{} values for a {} x {} grid",
                    num_values, header.nrows, header.ncols
                ))
            })?;

        // The file lists the northern row first.
        values.invert_axis(ndarray::Axis(0));

        Ok(AsciiGrid { header, values })
    }

    /// The header.
    pub fn header(&self) -> &AsciiHeader {
        &self.header
    }

    /// Cell values, bottom row first.
    pub fn values(&self) -> &Array2<i64> {
        &self.values
    }
}

/// Reduce a grid by `factor` along both axes, each output cell holding the most common value of
/// its `factor x factor` block.
///
/// Partial blocks at the top and right edges are dropped. A tie goes to the value met first
/// scanning the block row by row.
pub fn aggregate_majority(
    values: &Array2<i64>,
    factor: usize,
) -> Result<Array2<i64>, HydroGridErr> {
    if factor == 0 {
        return Err(HydroGridErr::InvalidAsciiGrid(
            "aggregation factor must be positive".to_owned(),
        ));
    }

    let (rows, cols) = values.dim();
    let (out_rows, out_cols) = (rows / factor, cols / factor);
    if out_rows == 0 || out_cols == 0 {
        tracing::warn!(
            "a {} x {} grid is smaller than one {} cell block",
            rows,
            cols,
            factor
        );
    }

    let mut counts: HashMap<i64, (usize, usize)> = HashMap::new();
    let lores = Array2::from_shape_fn((out_rows, out_cols), |(row, col)| {
        counts.clear();

        let block = values.slice(ndarray::s![
            row * factor..(row + 1) * factor,
            col * factor..(col + 1) * factor
        ]);
        for (order, &val) in block.iter().enumerate() {
            counts.entry(val).or_insert((0, order)).0 += 1;
        }

        counts
            .iter()
            // Highest count, then earliest first sighting.
            .max_by(|(_, (n1, o1)), (_, (n2, o2))| n1.cmp(n2).then(o2.cmp(o1)))
            .map(|(&val, _)| val)
            .unwrap_or_default()
    });

    Ok(lores)
}

/// Write one value per line, row major.
pub fn write_values<W: Write>(values: &Array2<i64>, mut out: W) -> Result<usize, HydroGridErr> {
    for val in values.iter() {
        writeln!(out, "{}", val)?;
    }
    out.flush()?;

    Ok(values.len())
}

/// Settings for a basin aggregation.
#[derive(Clone, Debug)]
pub struct AggregateConfig {
    /// High resolution ASCII grid of basin ids.
    pub input: PathBuf,
    /// Text file written with the coarse grid.
    pub output: PathBuf,
    /// Cells per coarse cell along each axis.
    pub factor: usize,
}

/// Aggregate a basin grid file and write the coarse values.
pub fn run(config: &AggregateConfig) -> Result<Array2<i64>, HydroGridErr> {
    let hires = AsciiGrid::load(&config.input)?;
    let lores = aggregate_majority(hires.values(), config.factor)?;

    let mut out = TextOutput::create(&config.output, false)?;
    let written = write_values(&lores, &mut out)?;
    out.finish()?;

    tracing::info!(
        "wrote {} x {} basin grid ({} values) to {}",
        lores.nrows(),
        lores.ncols(),
        written,
        config.output.display()
    );

    Ok(lores)
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    use ndarray::arr2;
    use tempdir::TempDir;

    const GRID: &str = "ncols 4\n\
                        nrows 2\n\
                        xllcorner 180000,5\n\
                        yllcorner 550000\n\
                        cellsize 100\n\
                        NODATA_value -9999\n\
                        1 2 3 4\n\
                        5 6 7,4 8.6\n";

    #[test]
    fn test_parse_ascii_grid() {
        let grid = AsciiGrid::from_reader(GRID.as_bytes()).unwrap();

        assert_eq!(grid.header().ncols, 4);
        assert_eq!(grid.header().nrows, 2);
        assert_eq!(grid.header().xllcorner, 180000.5);
        assert_eq!(grid.header().nodata_value, -9999.0);

        // Bottom row first, decimals rounded.
        assert_eq!(grid.values(), &arr2(&[[5, 6, 7, 9], [1, 2, 3, 4]]));
    }

    #[test]
    fn test_invalid_ascii_grids() {
        let short = GRID.replace("nrows 2", "nrows 3");
        assert!(matches!(
            AsciiGrid::from_reader(short.as_bytes()),
            Err(HydroGridErr::InvalidAsciiGrid(_))
        ));

        let no_header = "1 2 3 4\n";
        assert!(AsciiGrid::from_reader(no_header.as_bytes()).is_err());

        let bad_cell = GRID.replace("8.6", "lake");
        assert!(AsciiGrid::from_reader(bad_cell.as_bytes()).is_err());
    }

    #[test]
    fn test_aggregate_majority() {
        let hires = arr2(&[
            [1, 1, 2, 2, 9],
            [1, 3, 2, 4, 9],
            [5, 6, 7, 7, 9],
            [6, 5, 8, 7, 9],
            [9, 9, 9, 9, 9],
        ]);

        let lores = aggregate_majority(&hires, 2).unwrap();

        // Blocks with tied counts keep the value met first.
        assert_eq!(lores, arr2(&[[1, 2], [5, 7]]));

        assert!(aggregate_majority(&hires, 0).is_err());
        assert_eq!(aggregate_majority(&hires, 6).unwrap().len(), 0);
    }

    #[test]
    fn test_run_writes_one_value_per_line() {
        let tmp = TempDir::new("hydro-grid-ascii").unwrap();
        let input = tmp.path().join("basins.asc");
        let output = tmp.path().join("basins.txt");
        std::fs::write(&input, GRID).unwrap();

        let config = AggregateConfig {
            input,
            output: output.clone(),
            factor: 2,
        };
        let lores = run(&config).unwrap();

        assert_eq!(lores, arr2(&[[5, 7]]));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "5\n7\n");
    }
}
