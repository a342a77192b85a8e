//! Closed-form fields sampled on a [`SamplingGrid`].
//!
//! These are the usual targets and illuminations for structured light experiments.
//! Mode normalisation is such that the integrated intensity is 1.

use crate::error::{incompatible_shape, HologramError, Result};
use crate::grid::SamplingGrid;
use ndarray::{Array2, Zip};
use num_complex::Complex;
use std::f64::consts::{FRAC_1_SQRT_2, PI, SQRT_2};

pub type ComplexField = Array2<Complex<f64>>;

fn sample<T, F>(grid: &SamplingGrid, f: F) -> Array2<T>
where
    T: Clone + Default + Send,
    F: Fn(f64, f64) -> T + Sync,
{
    let mut field = Array2::from_elem(grid.shape(), T::default());
    Zip::indexed(&mut field).par_for_each(|(row, col), e| {
        let (x, y) = grid.point(row, col);
        *e = f(x, y);
    });
    field
}

fn factorial(n: u32) -> f64 {
    (1..=n).fold(1.0, |acc, k| acc * k as f64)
}

/// Physicists' Hermite polynomial.
fn hermite(n: u32, x: f64) -> f64 {
    let (mut h0, mut h1) = (1.0, 2.0 * x);
    if n == 0 {
        return h0;
    }
    for k in 1..n {
        let h2 = 2.0 * x * h1 - 2.0 * k as f64 * h0;
        h0 = h1;
        h1 = h2;
    }
    h1
}

/// Generalised Laguerre polynomial.
fn laguerre(p: u32, alpha: f64, x: f64) -> f64 {
    let (mut l0, mut l1) = (1.0, 1.0 + alpha - x);
    if p == 0 {
        return l0;
    }
    for k in 1..p {
        let k = k as f64;
        let l2 = ((2.0 * k + 1.0 + alpha - x) * l1 - (k + alpha) * l0) / (k + 1.0);
        l0 = l1;
        l1 = l2;
    }
    l1
}

fn indicator(inside: bool) -> Complex<f64> {
    if inside {
        Complex::new(1.0, 0.0)
    } else {
        Complex::new(0.0, 0.0)
    }
}

fn hg_value(x: f64, y: f64, waist: f64, m: u32, n: u32) -> f64 {
    let norm = (2.0 / PI / (2f64.powi((m + n) as i32) * factorial(m) * factorial(n))).sqrt() / waist;
    norm * hermite(m, SQRT_2 * x / waist)
        * hermite(n, SQRT_2 * y / waist)
        * (-(x * x + y * y) / (waist * waist)).exp()
}

/// Fundamental Gaussian beam of the given waist, centred on the origin.
pub fn gaussian(grid: &SamplingGrid, waist: f64) -> ComplexField {
    hg(grid, waist, 0, 0)
}

/// Hermite-Gaussian mode with `m` nodes along x and `n` nodes along y.
pub fn hg(grid: &SamplingGrid, waist: f64, m: u32, n: u32) -> ComplexField {
    sample(grid, |x, y| Complex::new(hg_value(x, y, waist, m, n), 0.0))
}

/// Hermite-Gaussian mode with its axes rotated by 45 degrees.
pub fn diagonal_hg(grid: &SamplingGrid, waist: f64, m: u32, n: u32) -> ComplexField {
    sample(grid, |x, y| {
        let u = (x + y) * FRAC_1_SQRT_2;
        let v = (x - y) * FRAC_1_SQRT_2;
        Complex::new(hg_value(u, v, waist, m, n), 0.0)
    })
}

/// Laguerre-Gaussian mode with radial index `p` and azimuthal index `l`.
pub fn lg(grid: &SamplingGrid, waist: f64, p: u32, l: i32) -> ComplexField {
    let abs_l = l.unsigned_abs();
    let norm = (2.0 * factorial(p) / (PI * factorial(p + abs_l))).sqrt() / waist;
    sample(grid, |x, y| {
        let r2 = (x * x + y * y) / (waist * waist);
        let radial = (2.0 * r2).sqrt().powi(abs_l as i32)
            * laguerre(p, abs_l as f64, 2.0 * r2)
            * (-r2).exp();
        Complex::from_polar(norm * radial, l as f64 * y.atan2(x))
    })
}

/// Phase imposed by a thin (possibly astigmatic) lens with focal lengths `fx`, `fy` and wavenumber `k`.
pub fn lens(grid: &SamplingGrid, fx: f64, fy: f64, k: f64) -> ComplexField {
    sample(grid, |x, y| {
        Complex::new(0.0, -k * (x * x / (2.0 * fx) + y * y / (2.0 * fy))).exp()
    })
}

/// Spherical lens of focal length `f` tilted by `angle` radians about the y axis.
///
/// The tilt shortens the focal length along x to `f cos(angle)` and stretches it along y to `f / cos(angle)`.
pub fn tilted_lens(grid: &SamplingGrid, f: f64, angle: f64, k: f64) -> ComplexField {
    lens(grid, f * angle.cos(), f / angle.cos(), k)
}

/// Circular pupil centred on the origin.
pub fn pupil(grid: &SamplingGrid, radius: f64) -> ComplexField {
    sample(grid, |x, y| indicator(x * x + y * y <= radius * radius))
}

/// Rectangular aperture of width `a` and height `b` centred on the origin.
pub fn rectangular_aperture(grid: &SamplingGrid, a: f64, b: f64) -> ComplexField {
    sample(grid, |x, y| indicator(x.abs() <= a / 2.0 && y.abs() <= b / 2.0))
}

pub fn square(grid: &SamplingGrid, side: f64) -> ComplexField {
    rectangular_aperture(grid, side, side)
}

/// Vertical slit of width `a` through the origin.
pub fn single_slit(grid: &SamplingGrid, a: f64) -> ComplexField {
    sample(grid, |x, _| indicator(x.abs() <= a / 2.0))
}

/// Two vertical slits of width `a` whose centres are `d` apart.
pub fn double_slit(grid: &SamplingGrid, a: f64, d: f64) -> ComplexField {
    sample(grid, |x, _| indicator((x.abs() - d / 2.0).abs() <= a / 2.0))
}

/// Equilateral triangle with its centroid on the origin and a vertex pointing along +y.
pub fn triangle(grid: &SamplingGrid, side: f64) -> ComplexField {
    let sqrt3 = 3f64.sqrt();
    sample(grid, |x, y| {
        indicator(y >= -side / (2.0 * sqrt3) && y <= side / sqrt3 - sqrt3 * x.abs())
    })
}

/// Zernike polynomial `Z_n^m` over a disk of the given radius, zero outside of it.
///
/// Positive `m` gives the cosine (even) polynomial, negative `m` the sine one. The
/// polynomials are unnormalised, so that the radial part is 1 on the rim.
pub fn zernike(grid: &SamplingGrid, n: u32, m: i32, radius: f64) -> Result<Array2<f64>> {
    let abs_m = m.unsigned_abs();
    if abs_m > n || (n - abs_m) % 2 != 0 {
        return Err(HologramError::InvalidArgument(format!(
            "zernike polynomial needs |m| <= n with n - |m| even, got n = {}, m = {}",
            n, m
        )));
    }
    if !(radius > 0.0) {
        return Err(HologramError::InvalidArgument(format!(
            "zernike radius must be positive, got {}",
            radius
        )));
    }

    let half_sum = (n + abs_m) / 2;
    let half_diff = (n - abs_m) / 2;
    let coefficients: Vec<(f64, i32)> = (0..=half_diff)
        .map(|k| {
            let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
            let c = sign * factorial(n - k)
                / (factorial(k) * factorial(half_sum - k) * factorial(half_diff - k));
            (c, (n - 2 * k) as i32)
        })
        .collect();

    Ok(sample(grid, |x, y| {
        let rho = (x * x + y * y).sqrt() / radius;
        if rho > 1.0 {
            return 0.0;
        }
        let radial: f64 = coefficients.iter().map(|&(c, p)| c * rho.powi(p)).sum();
        let theta = y.atan2(x);
        if m >= 0 {
            radial * (abs_m as f64 * theta).cos()
        } else {
            radial * (abs_m as f64 * theta).sin()
        }
    }))
}

/// Mode families usable as a basis for [`linear_combination`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Basis {
    Lg,
    Hg,
    DiagonalHg,
}

impl std::str::FromStr for Basis {
    type Err = HologramError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lg" => Ok(Basis::Lg),
            "hg" => Ok(Basis::Hg),
            "diagonal_hg" => Ok(Basis::DiagonalHg),
            _ => Err(HologramError::InvalidArgument(format!(
                "unknown basis '{}', expected one of 'lg', 'hg', 'diagonal_hg'",
                s
            ))),
        }
    }
}

/// The `order + 1` modes of a given total order.
///
/// Hermite-Gaussian bases run from `(order, 0)` to `(0, order)`. The Laguerre-Gaussian
/// basis uses `l = 2k - order` with the smallest radial index that keeps the order.
pub fn basis(basis: Basis, grid: &SamplingGrid, order: u32, waist: f64) -> Vec<ComplexField> {
    (0..=order)
        .map(|k| match basis {
            Basis::Lg => lg(grid, waist, k.min(order - k), 2 * k as i32 - order as i32),
            Basis::Hg => hg(grid, waist, order - k, k),
            Basis::DiagonalHg => diagonal_hg(grid, waist, order - k, k),
        })
        .collect()
}

/// Weighted sum of fields.
pub fn linear_combination(coefficients: &[Complex<f64>], fields: &[ComplexField]) -> Result<ComplexField> {
    if coefficients.len() != fields.len() {
        return Err(HologramError::InvalidArgument(format!(
            "{} coefficients given for {} fields",
            coefficients.len(),
            fields.len()
        )));
    }
    let first = fields.first().ok_or_else(|| {
        HologramError::InvalidArgument("a linear combination needs at least one field".to_string())
    })?;
    let mut sum = Array2::zeros(first.raw_dim());
    for (c, field) in coefficients.iter().zip(fields) {
        if field.shape() != first.shape() {
            return Err(incompatible_shape());
        }
        Zip::from(&mut sum)
            .and(field)
            .par_for_each(|s, &f| *s += *c * f);
    }
    Ok(sum)
}

/// Superposition of the modes of order `coefficients.len() - 1` in the named basis.
pub fn combination(
    coefficients: &[Complex<f64>],
    basis_name: &str,
    grid: &SamplingGrid,
    waist: f64,
) -> Result<ComplexField> {
    let family: Basis = basis_name.parse()?;
    if coefficients.is_empty() {
        return Err(HologramError::InvalidArgument(
            "at least one coefficient is required".to_string(),
        ));
    }
    let order = (coefficients.len() - 1) as u32;
    linear_combination(coefficients, &basis(family, grid, order, waist))
}
