//! Dense numeric grids backed by NetCDF variables.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use ndarray::{ArrayD, ArrayView2, ArrayViewMutD, Axis, Ix2, IxDyn};

use crate::errors::HydroGridErr;

pub use self::element::ElementKind;
pub(crate) use self::element::exact_f64;

mod element;

/// Axis names and sizes of a grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridLayout {
    /// Axis (dimension) names, outermost first.
    pub dims: Vec<String>,
    /// Number of cells along each axis.
    pub shape: Vec<usize>,
}

impl fmt::Display for GridLayout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(")?;
        for (i, (dim, len)) in self.dims.iter().zip(&self.shape).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", dim, len)?;
        }
        write!(f, ")")
    }
}

impl GridLayout {
    /// Build a layout, the axis names and sizes must pair up.
    pub fn new(dims: Vec<String>, shape: Vec<usize>) -> Result<Self, HydroGridErr> {
        if dims.len() != shape.len() {
            return Err(HydroGridErr::InvalidGrid(format!(
                "{} axis names for {} axes",
                dims.len(),
                shape.len()
            )));
        }

        Ok(GridLayout { dims, shape })
    }

    /// Read the layout of a variable without touching its values.
    pub fn read(file: &netcdf::File, path: &Path, name: &str) -> Result<Self, HydroGridErr> {
        let var = find_variable(file, path, name)?;
        Ok(Self::of(&var))
    }

    fn of(var: &netcdf::Variable) -> Self {
        let (dims, shape): (Vec<String>, Vec<usize>) = var
            .dimensions()
            .iter()
            .map(|dim| (dim.name(), dim.len()))
            .unzip();

        GridLayout { dims, shape }
    }

    /// Same axis names and sizes, position for position.
    pub fn is_conformant(&self, other: &GridLayout) -> bool {
        self.dims == other.dims && self.shape == other.shape
    }

    /// Fail with `ShapeMismatch` unless the layouts are conformant.
    pub fn ensure_conformant(&self, other: &GridLayout) -> Result<(), HydroGridErr> {
        if self.is_conformant(other) {
            Ok(())
        } else {
            Err(HydroGridErr::ShapeMismatch {
                left: self.clone(),
                right: other.clone(),
            })
        }
    }

    /// Total number of cells.
    pub fn num_cells(&self) -> usize {
        self.shape.iter().product()
    }
}

/// A named grid variable materialized in memory.
///
/// Cell values are held as `f64` whatever the storage kind is. Every kind up to 32 bits fits
/// exactly, and 64 bit integer variables are only loaded when each of their cells does too.
/// Writes go through `ElementKind::coerce` so the in-memory values always equal what the file
/// will hold.
#[derive(Clone, Debug)]
pub struct Grid {
    name: String,
    layout: GridLayout,
    kind: ElementKind,
    data: ArrayD<f64>,
}

impl Grid {
    /// Assemble a grid from its parts.
    pub fn new(
        name: &str,
        dims: &[&str],
        kind: ElementKind,
        data: ArrayD<f64>,
    ) -> Result<Self, HydroGridErr> {
        let layout = GridLayout::new(
            dims.iter().map(|&d| d.to_owned()).collect(),
            data.shape().to_vec(),
        )?;

        Ok(Grid {
            name: name.to_owned(),
            layout,
            kind,
            data,
        })
    }

    /// Load a whole variable from an open dataset.
    pub fn read(file: &netcdf::File, path: &Path, name: &str) -> Result<Self, HydroGridErr> {
        let var = find_variable(file, path, name)?;

        let layout = GridLayout::of(&var);
        let kind = ElementKind::from_nc_type(&var.vartype())
            .ok_or_else(|| HydroGridErr::UnsupportedType(name.to_owned()))?;

        let values = read_values(&var, name, kind)?;
        let data = ArrayD::from_shape_vec(IxDyn(&layout.shape), values)
            .map_err(|err| HydroGridErr::InvalidGrid(format!("{}: {}", name, err)))?;

        tracing::debug!("read {} {} {} from {}", name, kind, layout, path.display());

        Ok(Grid {
            name: name.to_owned(),
            layout,
            kind,
            data,
        })
    }

    /// Replace the whole variable in the dataset with the values of this grid.
    pub fn write_back(&self, file: &mut netcdf::FileMut, path: &Path) -> Result<(), HydroGridErr> {
        let io_failure = |reason: String| HydroGridErr::IOFailure {
            variable: self.name.clone(),
            path: PathBuf::from(path),
            reason,
        };

        let mut var = file
            .variable_mut(&self.name)
            .ok_or_else(|| io_failure("variable vanished from dataset".to_owned()))?;

        // Logical iteration order is row major whatever the memory layout is.
        let values: Vec<f64> = self.data.iter().cloned().collect();
        var.put_values(&values, ..)
            .map_err(|err| io_failure(err.to_string()))?;

        Ok(())
    }

    /// Variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Axis names and sizes.
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Storage kind of the cells.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// The cell values.
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Mutable view of the cell values.
    pub fn data_mut(&mut self) -> ArrayViewMutD<f64> {
        self.data.view_mut()
    }

    /// Fail with `ShapeMismatch` unless both grids share axis names and shape.
    pub fn ensure_conformant(&self, other: &Grid) -> Result<(), HydroGridErr> {
        self.layout.ensure_conformant(&other.layout)
    }

    /// Reverse the outermost axis, turning a north-up raster into bottom-row-first order.
    pub fn flipud(mut self) -> Self {
        if self.data.ndim() > 0 {
            self.data.invert_axis(Axis(0));
        }
        self
    }

    /// A 2-D view of the grid, taking the first time step of a `[time, y, x]` variable.
    pub fn plane(&self) -> Result<ArrayView2<f64>, HydroGridErr> {
        let view = match self.data.ndim() {
            2 => self.data.view(),
            3 => {
                if self.layout.shape[0] == 0 {
                    return Err(HydroGridErr::NotEnoughData);
                }
                self.data.index_axis(Axis(0), 0)
            }
            n => {
                return Err(HydroGridErr::InvalidGrid(format!(
                    "{} has {} axes, expected 2 or 3",
                    self.name, n
                )))
            }
        };

        view.into_dimensionality::<Ix2>()
            .map_err(|err| HydroGridErr::InvalidGrid(err.to_string()))
    }
}

// Values of a variable in row major order. 64 bit integers go through their native type so a
// cell a float cannot hold is refused instead of rounded.
fn read_values(
    var: &netcdf::Variable,
    name: &str,
    kind: ElementKind,
) -> Result<Vec<f64>, HydroGridErr> {
    let inexact = |value: i128| {
        HydroGridErr::UnsupportedType(format!(
            "{} ({} cell {} has no exact float value)",
            name, kind, value
        ))
    };
    let convert = |value: i128| exact_f64(value).ok_or_else(|| inexact(value));

    match kind {
        ElementKind::Int64 => {
            let values: Vec<i64> = var.get_values(..)?;
            values.into_iter().map(|v| convert(i128::from(v))).collect()
        }
        ElementKind::UInt64 => {
            let values: Vec<u64> = var.get_values(..)?;
            values.into_iter().map(|v| convert(i128::from(v))).collect()
        }
        _ => Ok(var.get_values(..)?),
    }
}

fn find_variable<'f>(
    file: &'f netcdf::File,
    path: &Path,
    name: &str,
) -> Result<netcdf::Variable<'f>, HydroGridErr> {
    file.variable(name).ok_or_else(|| HydroGridErr::NotFound {
        variable: name.to_owned(),
        path: PathBuf::from(path),
    })
}

/// Open a dataset read only.
pub fn open_dataset(path: &Path) -> Result<netcdf::File, HydroGridErr> {
    netcdf::open(path).map_err(|err| HydroGridErr::ResourceUnavailable {
        path: PathBuf::from(path),
        reason: err.to_string(),
    })
}

/// Open a dataset for in place modification.
pub fn append_dataset(path: &Path) -> Result<netcdf::FileMut, HydroGridErr> {
    netcdf::append(path).map_err(|err| HydroGridErr::ResourceUnavailable {
        path: PathBuf::from(path),
        reason: err.to_string(),
    })
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
pub(crate) mod unit {
    use super::*;

    use ndarray::{arr2, Array2};
    use tempdir::TempDir;

    // Create an empty test dataset with the given dimensions.
    pub(crate) fn create_test_dataset(
        path: &Path,
        dims: &[(&str, usize)],
    ) -> Result<netcdf::FileMut, HydroGridErr> {
        let mut file = netcdf::create(path)?;

        for &(name, len) in dims {
            file.add_dimension(name, len)?;
        }

        Ok(file)
    }

    // Add a variable stored as `kind` and fill it.
    pub(crate) fn add_test_variable(
        file: &mut netcdf::FileMut,
        name: &str,
        dims: &[&str],
        kind: ElementKind,
        values: &[f64],
    ) -> Result<(), HydroGridErr> {
        match kind {
            ElementKind::Short => {
                let mut var = file.add_variable::<i16>(name, dims)?;
                let values: Vec<i16> = values.iter().map(|&v| v as i16).collect();
                var.put_values(&values, ..)?;
            }
            ElementKind::Int => {
                let mut var = file.add_variable::<i32>(name, dims)?;
                let values: Vec<i32> = values.iter().map(|&v| v as i32).collect();
                var.put_values(&values, ..)?;
            }
            ElementKind::Float => {
                let mut var = file.add_variable::<f32>(name, dims)?;
                let values: Vec<f32> = values.iter().map(|&v| v as f32).collect();
                var.put_values(&values, ..)?;
            }
            _ => {
                let mut var = file.add_variable::<f64>(name, dims)?;
                var.put_values(values, ..)?;
            }
        }

        Ok(())
    }

    // Add a variable of 64 bit integers, values stored as given.
    pub(crate) fn add_test_i64_variable(
        file: &mut netcdf::FileMut,
        name: &str,
        dims: &[&str],
        values: &[i64],
    ) -> Result<(), HydroGridErr> {
        let mut var = file.add_variable::<i64>(name, dims)?;
        var.put_values(values, ..)?;
        Ok(())
    }

    #[test]
    fn test_layout_conformance() {
        let a = GridLayout::new(vec!["y".into(), "x".into()], vec![2, 3]).unwrap();
        let b = GridLayout::new(vec!["y".into(), "x".into()], vec![2, 3]).unwrap();
        let c = GridLayout::new(vec!["x".into(), "y".into()], vec![2, 3]).unwrap();
        let d = GridLayout::new(vec!["y".into(), "x".into()], vec![3, 2]).unwrap();

        assert!(a.is_conformant(&b));
        assert!(!a.is_conformant(&c));
        assert!(!a.is_conformant(&d));
        assert!(a.ensure_conformant(&d).is_err());
        assert_eq!(a.num_cells(), 6);
        assert_eq!(a.to_string(), "(y=2, x=3)");

        assert!(GridLayout::new(vec!["y".into()], vec![2, 3]).is_err());
    }

    #[test]
    fn test_flipud() {
        let grid = Grid::new(
            "g",
            &["y", "x"],
            ElementKind::Short,
            arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]).into_dyn(),
        )
        .unwrap()
        .flipud();

        let flat: Vec<f64> = grid.data().iter().cloned().collect();
        assert_eq!(flat, vec![5.0, 6.0, 3.0, 4.0, 1.0, 2.0]);
    }

    #[test]
    fn test_plane() {
        let data =
            ndarray::Array3::from_shape_fn((2, 2, 3), |(t, y, x)| (t * 100 + y * 10 + x) as f64);
        let grid =
            Grid::new("rain", &["Time", "y", "x"], ElementKind::Float, data.into_dyn()).unwrap();

        let plane = grid.plane().unwrap();
        assert_eq!(plane.dim(), (2, 3));
        assert_eq!(plane[[1, 2]], 12.0);

        let mislabeled =
            Grid::new("v", &["x"], ElementKind::Float, Array2::<f64>::zeros((1, 4)).into_dyn());
        assert!(mislabeled.is_err());
    }

    #[test]
    fn test_read_and_write_back() {
        let tmp = TempDir::new("hydro-grid-test").unwrap();
        let path = tmp.path().join("grid.nc");

        let mut nc = create_test_dataset(&path, &[("y", 2), ("x", 3)]).unwrap();
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        add_test_variable(&mut nc, "basn_mask", &["y", "x"], ElementKind::Short, &values).unwrap();
        drop(nc);

        let file = open_dataset(&path).unwrap();
        let grid = Grid::read(&file, &path, "basn_mask").unwrap();
        assert_eq!(grid.kind(), ElementKind::Short);
        assert_eq!(grid.layout().dims, vec!["y".to_owned(), "x".to_owned()]);
        assert_eq!(grid.layout().shape, vec![2, 3]);
        assert_eq!(grid.data()[[1, 0]], 4.0);

        match Grid::read(&file, &path, "not_there") {
            Err(HydroGridErr::NotFound { variable, .. }) => assert_eq!(variable, "not_there"),
            other => panic!("expected NotFound, got {:?}", other),
        }
        drop(file);

        let mut grid = grid;
        let mut cells = grid.data_mut();
        cells[[0, 0]] = 42.0;
        let mut file = append_dataset(&path).unwrap();
        grid.write_back(&mut file, &path).unwrap();
        drop(file);

        let file = open_dataset(&path).unwrap();
        let reread = Grid::read(&file, &path, "basn_mask").unwrap();
        let flat: Vec<f64> = reread.data().iter().cloned().collect();
        assert_eq!(flat, vec![42.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_data_mut_keeps_layout() {
        let mut grid = Grid::new(
            "g",
            &["y", "x"],
            ElementKind::Double,
            arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).into_dyn(),
        )
        .unwrap();

        grid.data_mut().fill(7.0);
        grid.data_mut().invert_axis(Axis(0));

        assert_eq!(grid.data().shape(), &grid.layout().shape[..]);
        assert_eq!(grid.layout().to_string(), "(y=2, x=3)");
        assert!(grid.data().iter().all(|&v| v == 7.0));
    }

    #[test]
    fn test_read_64_bit_integers() {
        let tmp = TempDir::new("hydro-grid-test").unwrap();
        let path = tmp.path().join("int64.nc");

        let mut nc = create_test_dataset(&path, &[("y", 2), ("x", 2)]).unwrap();
        let small = [1, -2, 1 << 40, 4];
        let large = [-9_223_372_036_854_775_806, 9_007_199_254_740_993, 1, 2];
        add_test_i64_variable(&mut nc, "small", &["y", "x"], &small).unwrap();
        add_test_i64_variable(&mut nc, "large", &["y", "x"], &large).unwrap();
        drop(nc);

        let file = open_dataset(&path).unwrap();
        let grid = Grid::read(&file, &path, "small").unwrap();
        assert_eq!(grid.kind(), ElementKind::Int64);
        let flat: Vec<f64> = grid.data().iter().cloned().collect();
        assert_eq!(flat, vec![1.0, -2.0, 1_099_511_627_776.0, 4.0]);

        match Grid::read(&file, &path, "large") {
            Err(HydroGridErr::UnsupportedType(msg)) => assert!(msg.starts_with("large")),
            other => panic!("expected UnsupportedType, got {:?}", other),
        }
    }

    #[test]
    fn test_open_missing_dataset() {
        let result = open_dataset(Path::new("unlikely_file_in_my_project.nc"));
        assert!(matches!(result, Err(HydroGridErr::ResourceUnavailable { .. })));
    }
}
