use crate::encoding::encode;
use crate::error::incompatible_shape;
use crate::fft2::roll;
use crate::grid::{build_grid, tile_layout, GridSource};
use log::debug;
use ndarray::{s, Array, Array2, ArrayView, ArrayView2, Dimension, Zip};
use num_complex::Complex;
use std::f64::consts::PI;
use std::path::Path;

pub mod beams;
pub mod config;
pub mod encoding;
pub mod error;
pub mod fft2;
pub mod grid;
pub mod inverse;
pub mod preview;
pub mod sink;

pub use crate::config::SlmConfig;
pub use crate::encoding::{convert2angle, Method};
pub use crate::error::{HologramError, Result};
pub use crate::grid::{GridParameters, SamplingGrid};

/// Which of the two beams is circularly shifted to apply the pixel offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OffsetTarget {
    /// The desired field is rolled by `(yoffset, xoffset)`.
    #[default]
    Desired,
    /// The incoming field is rolled by `(-yoffset, -xoffset)`.
    Incoming,
}

/// Device and encoding parameters for a single hologram.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HologramParameters {
    /// Grey level producing a 2π phase shift. At most 255.
    pub max_modulation: f64,
    /// Grating periods `(x, y)` in pixels.
    pub period: (f64, f64),
    /// Pixel offset `(x, y)` between the desired and the incoming beams.
    pub offset: (i64, i64),
    pub method: Method,
    pub offset_target: OffsetTarget,
}

impl HologramParameters {
    pub fn new(max_modulation: f64, period: (f64, f64), method: Method) -> Self {
        HologramParameters {
            max_modulation,
            period,
            offset: (0, 0),
            method,
            offset_target: OffsetTarget::Desired,
        }
    }

    pub fn with_offset(mut self, x: i64, y: i64) -> Self {
        self.offset = (x, y);
        self
    }

    pub fn with_offset_target(mut self, target: OffsetTarget) -> Self {
        self.offset_target = target;
        self
    }

    pub fn from_config(config: &SlmConfig, method: Method) -> Self {
        HologramParameters::new(
            config.slm.max_modulation,
            (config.grating.xperiod, config.grating.yperiod),
            method,
        )
        .with_offset(config.incoming.xoffset, config.incoming.yoffset)
    }

    /// Grey level range actually used once the method's efficiency is accounted for.
    pub fn effective_modulation(&self) -> f64 {
        (self.max_modulation * self.method.modulation_factor()).round()
    }

    fn validate(&self) -> Result<()> {
        if !(self.max_modulation > 0.0 && self.max_modulation <= 255.0) {
            return Err(HologramError::InvalidArgument(format!(
                "max_modulation must be in (0, 255], got {}",
                self.max_modulation
            )));
        }
        let (px, py) = self.period;
        if !(px.is_finite() && py.is_finite()) || px == 0.0 || py == 0.0 {
            return Err(HologramError::InvalidArgument(format!(
                "grating periods must be finite and non-zero, got ({}, {})",
                px, py
            )));
        }
        Ok(())
    }
}

/// One desired field, or several to be displayed side by side.
#[derive(Clone, Copy, Debug)]
pub enum Targets<'a> {
    Single(ArrayView2<'a, Complex<f64>>),
    Multiple(&'a [Array2<Complex<f64>>]),
}

impl Targets<'_> {
    pub fn len(&self) -> usize {
        match self {
            Targets::Single(_) => 1,
            Targets::Multiple(fields) => fields.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> From<ArrayView2<'a, Complex<f64>>> for Targets<'a> {
    fn from(field: ArrayView2<'a, Complex<f64>>) -> Self {
        Targets::Single(field)
    }
}

impl<'a> From<&'a [Array2<Complex<f64>>]> for Targets<'a> {
    fn from(fields: &'a [Array2<Complex<f64>>]) -> Self {
        Targets::Multiple(fields)
    }
}

/// Everything besides the desired field needed to build a hologram.
#[derive(Clone, Copy, Debug)]
pub enum HologramSource<'a> {
    /// Explicit incoming beam, grid and parameters.
    ///
    /// When several targets are given, `grid` and `incoming` describe a single tile.
    Raw {
        incoming: ArrayView2<'a, Complex<f64>>,
        grid: &'a SamplingGrid,
        params: HologramParameters,
    },
    /// Everything is derived from a configuration, the incoming beam being a Gaussian of the configured waist.
    Config { config: &'a SlmConfig, method: Method },
    /// As `Config`, reading the configuration from a TOML file first.
    ConfigFile { path: &'a Path, method: Method },
}

/// Computes the 8-bit phase mask that turns the incoming beam into the desired one in the first diffraction order.
///
/// Several targets are encoded separately and tiled into one mosaic: an `N x N` block
/// when their number is a perfect square, a single row otherwise.
pub fn generate_hologram(targets: Targets, source: HologramSource) -> Result<Array2<u8>> {
    match source {
        HologramSource::Raw {
            incoming,
            grid,
            params,
        } => match targets {
            Targets::Single(desired) => single_hologram(desired, incoming, grid, &params),
            Targets::Multiple(fields) => {
                if fields.is_empty() {
                    return Err(HologramError::InvalidArgument(
                        "no desired fields were given".to_string(),
                    ));
                }
                debug!("encoding {} multiplexed holograms", fields.len());
                let tiles = fields
                    .iter()
                    .map(|desired| single_hologram(desired.view(), incoming, grid, &params))
                    .collect::<Result<Vec<_>>>()?;
                tile(&tiles)
            }
        },
        HologramSource::Config { config, method } => {
            let nmasks = targets.len().max(1);
            let grid = build_grid(GridSource::Config(config), nmasks, true)?;
            let incoming = beams::gaussian(&grid, config.incoming.waist);
            let params = HologramParameters::from_config(config, method);
            generate_hologram(
                targets,
                HologramSource::Raw {
                    incoming: incoming.view(),
                    grid: &grid,
                    params,
                },
            )
        }
        HologramSource::ConfigFile { path, method } => {
            let config = SlmConfig::from_file(path)?;
            generate_hologram(
                targets,
                HologramSource::Config {
                    config: &config,
                    method,
                },
            )
        }
    }
}

fn single_hologram(
    desired: ArrayView2<Complex<f64>>,
    incoming: ArrayView2<Complex<f64>>,
    grid: &SamplingGrid,
    params: &HologramParameters,
) -> Result<Array2<u8>> {
    params.validate()?;
    let (rows, cols) = grid.shape();
    if desired.shape() != incoming.shape() || desired.shape() != [rows, cols] {
        return Err(incompatible_shape());
    }

    let (xoffset, yoffset) = params.offset;
    let relative = match params.offset_target {
        OffsetTarget::Desired => &roll(desired, (yoffset, xoffset)) / &incoming,
        OffsetTarget::Incoming => &desired / &roll(incoming, (-yoffset, -xoffset)),
    };

    // NaN from 0/0 is skipped by f64::max and left to propagate
    let mut amplitude = relative.mapv(|e| e.norm());
    let peak = amplitude.iter().copied().fold(f64::NAN, f64::max);
    amplitude.mapv_inplace(|a| a / peak);

    let lx = params.period.0 * grid.dx();
    let ly = params.period.1 * grid.dy();
    let phase = Zip::indexed(&relative).par_map_collect(|(row, col), e| {
        let (x, y) = grid.point(row, col);
        e.arg() + 2.0 * PI * (x / lx + y / ly)
    });

    let max_modulation = params.effective_modulation();
    debug!(
        "encoding {}x{} hologram with {} method, max modulation {}",
        rows, cols, params.method, max_modulation
    );

    let psi = encode(phase.view(), amplitude.view(), params.method)?;
    Ok(normalize(psi.view(), max_modulation))
}

/// Maps `h` linearly onto the integer grey levels `0..=round(max_modulation)`.
///
/// A constant input, which has no range to stretch, gives a uniform mask at half of the
/// modulation depth. NaN samples are ignored when finding the range and become 0.
pub fn normalize<D: Dimension>(h: ArrayView<f64, D>, max_modulation: f64) -> Array<u8, D> {
    let m = max_modulation.round();
    let lo = h.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = h.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(hi > lo) {
        let mid = (m / 2.0).round() as u8;
        return Array::from_elem(h.raw_dim(), mid);
    }
    let range = hi - lo;
    h.mapv(|v| (m * (v - lo) / range).round() as u8)
}

/// Arranges equally shaped holograms into one mosaic, row-major.
pub fn tile(tiles: &[Array2<u8>]) -> Result<Array2<u8>> {
    let first = tiles
        .first()
        .ok_or_else(|| HologramError::InvalidArgument("no holograms to tile".to_string()))?;
    let (h, w) = first.dim();
    let (rows, cols) = tile_layout(tiles.len());

    let mut mosaic = Array2::zeros((rows * h, cols * w));
    for (k, t) in tiles.iter().enumerate() {
        if t.dim() != (h, w) {
            return Err(incompatible_shape());
        }
        let (r, c) = (k / cols, k % cols);
        mosaic
            .slice_mut(s![r * h..(r + 1) * h, c * w..(c + 1) * w])
            .assign(t);
    }
    Ok(mosaic)
}
