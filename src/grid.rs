use crate::config::SlmConfig;
use crate::error::{HologramError, Result};
use crate::inverse::linspace;
use log::trace;
use ndarray::{Array1, Array2, ArrayView1};
use num_integer::Roots;

/// Physical size and resolution of the whole SLM display.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridParameters {
    pub width: f64,
    pub height: f64,
    pub res_x: usize,
    pub res_y: usize,
}

/// Where the grid parameters come from.
#[derive(Clone, Copy, Debug)]
pub enum GridSource<'a> {
    Raw(GridParameters),
    Config(&'a SlmConfig),
}

impl GridSource<'_> {
    pub fn resolve(&self) -> GridParameters {
        match self {
            GridSource::Raw(p) => *p,
            GridSource::Config(c) => c.grid_parameters(),
        }
    }
}

/// Arrangement of `nmasks` tiles on the display as `(rows, columns)`.
///
/// A perfect square count is laid out as an `N x N` block, anything else as a single row.
pub fn tile_layout(nmasks: usize) -> (usize, usize) {
    let n = nmasks.sqrt();
    if n * n == nmasks {
        (n, n)
    } else {
        (1, nmasks)
    }
}

/// Sample positions of the hologram plane, centred on the optical axis.
///
/// Axis 0 of every 2D array is `y`, axis 1 is `x`.
#[derive(Clone, Debug)]
pub struct SamplingGrid {
    xs: Array1<f64>,
    ys: Array1<f64>,
    dx: f64,
    dy: f64,
    sparse: bool,
}

impl SamplingGrid {
    /// Builds a grid spanning `[-width/2, width/2] x [-height/2, height/2]` with the given number of samples.
    pub fn new(width: f64, height: f64, res_x: usize, res_y: usize, sparse: bool) -> Result<Self> {
        if res_x == 0 || res_y == 0 {
            return Err(HologramError::InvalidArgument(format!(
                "grid resolution must be non-zero, got {}x{}",
                res_x, res_y
            )));
        }
        if !(width > 0.0 && height > 0.0) {
            return Err(HologramError::InvalidArgument(format!(
                "grid size must be positive, got {}x{}",
                width, height
            )));
        }
        let spacing = |len: f64, n: usize| if n > 1 { len / (n - 1) as f64 } else { len };
        Ok(SamplingGrid {
            xs: Array1::from(linspace(-width / 2.0, width / 2.0, res_x)),
            ys: Array1::from(linspace(-height / 2.0, height / 2.0, res_y)),
            dx: spacing(width, res_x),
            dy: spacing(height, res_y),
            sparse,
        })
    }

    /// `(rows, columns)`, i.e. `(res_y, res_x)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.ys.len(), self.xs.len())
    }

    pub fn xs(&self) -> ArrayView1<f64> {
        self.xs.view()
    }

    pub fn ys(&self) -> ArrayView1<f64> {
        self.ys.view()
    }

    /// Sample spacing along x.
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Sample spacing along y.
    pub fn dy(&self) -> f64 {
        self.dy
    }

    pub fn is_sparse(&self) -> bool {
        self.sparse
    }

    /// Physical position of the sample at `(row, column)`.
    pub fn point(&self, row: usize, col: usize) -> (f64, f64) {
        (self.xs[col], self.ys[row])
    }

    /// The x coordinates, shaped `(1, res_x)` for a sparse grid or `(res_y, res_x)` otherwise.
    pub fn x(&self) -> Array2<f64> {
        let row = self.xs.view().insert_axis(ndarray::Axis(0));
        if self.sparse {
            row.to_owned()
        } else {
            let (h, w) = self.shape();
            Array2::from_shape_fn((h, w), |(_, j)| self.xs[j])
        }
    }

    /// The y coordinates, shaped `(res_y, 1)` for a sparse grid or `(res_y, res_x)` otherwise.
    pub fn y(&self) -> Array2<f64> {
        let col = self.ys.view().insert_axis(ndarray::Axis(1));
        if self.sparse {
            col.to_owned()
        } else {
            let (h, w) = self.shape();
            Array2::from_shape_fn((h, w), |(i, _)| self.ys[i])
        }
    }
}

/// Builds the sampling grid of a single tile when `nmasks` holograms share the display.
///
/// * `source` - display size and resolution
/// * `nmasks` - number of masks displayed side by side, see [`tile_layout`]
/// * `sparse` - keep `x`/`y` as broadcastable row/column vectors
pub fn build_grid(source: GridSource, nmasks: usize, sparse: bool) -> Result<SamplingGrid> {
    if nmasks == 0 {
        return Err(HologramError::InvalidArgument(
            "at least one mask is required".to_string(),
        ));
    }
    let p = source.resolve();
    let (rows, cols) = tile_layout(nmasks);
    trace!(
        "building {}x{} tile grid for {} masks on a {}x{} display",
        rows,
        cols,
        nmasks,
        p.res_x,
        p.res_y
    );
    SamplingGrid::new(
        p.width / cols as f64,
        p.height / rows as f64,
        p.res_x / cols,
        p.res_y / rows,
        sparse,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(width: f64, height: f64, res_x: usize, res_y: usize) -> GridSource<'static> {
        GridSource::Raw(GridParameters {
            width,
            height,
            res_x,
            res_y,
        })
    }

    #[test]
    fn single_mask_grid() {
        let grid = build_grid(raw(10.0, 10.0, 100, 100), 1, true).unwrap();
        let (x, y) = (grid.x(), grid.y());
        assert_eq!(x.shape(), &[1, 100]);
        assert_eq!(y.shape(), &[100, 1]);
        assert!((x[[0, 0]] + 5.0).abs() < 1e-12);
        assert!((y[[0, 0]] + 5.0).abs() < 1e-12);
        assert!((x[[0, 99]] - 5.0).abs() < 1e-12);
        assert!((grid.dx() - 10.0 / 99.0).abs() < 1e-12);
    }

    #[test]
    fn square_number_of_masks() {
        let grid = build_grid(raw(10.0, 10.0, 100, 100), 4, true).unwrap();
        assert_eq!(grid.x().shape(), &[1, 50]);
        assert_eq!(grid.y().shape(), &[50, 1]);
        assert!((grid.xs()[0] + 2.5).abs() < 1e-12);
        assert!((grid.ys()[0] + 2.5).abs() < 1e-12);
    }

    #[test]
    fn non_square_number_of_masks_splits_x() {
        let grid = build_grid(raw(12.0, 8.0, 120, 80), 3, true).unwrap();
        assert_eq!(grid.shape(), (80, 40));
        assert!((grid.xs()[0] + 2.0).abs() < 1e-12);
        assert!((grid.ys()[0] + 4.0).abs() < 1e-12);
    }

    #[test]
    fn dense_grid() {
        let grid = build_grid(raw(4.0, 2.0, 5, 3), 1, false).unwrap();
        let (x, y) = (grid.x(), grid.y());
        assert_eq!(x.shape(), &[3, 5]);
        assert_eq!(y.shape(), &[3, 5]);
        assert_eq!(x[[2, 0]], -2.0);
        assert_eq!(y[[2, 0]], 1.0);
        assert_eq!(grid.point(2, 4), (2.0, 1.0));
    }

    #[test]
    fn layouts() {
        assert_eq!(tile_layout(1), (1, 1));
        assert_eq!(tile_layout(2), (1, 2));
        assert_eq!(tile_layout(4), (2, 2));
        assert_eq!(tile_layout(6), (1, 6));
        assert_eq!(tile_layout(9), (3, 3));
    }

    #[test]
    fn rejects_empty_grids() {
        assert!(build_grid(raw(10.0, 10.0, 100, 100), 0, true).is_err());
        assert!(build_grid(raw(10.0, 10.0, 1, 100), 4, true).is_err());
        assert!(SamplingGrid::new(0.0, 1.0, 10, 10, true).is_err());
    }
}
