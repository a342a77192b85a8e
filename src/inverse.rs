//! Tabulated inverses of the special functions used by the amplitude encodings.
//!
//! Each inverse is built once by root finding on an evenly spaced set of points and
//! interpolated with a cubic spline. The tables never extrapolate: asking for a value
//! outside of the tabulated domain is an error.

use crate::error::{HologramError, Result};
use log::debug;
use ndarray::{Array, ArrayView, Dimension, Zip};
use once_cell::sync::Lazy;
use scilib::math::bessel;
use std::f64::consts::PI;

/// Number of tabulated points used for the fixed inverse tables.
pub const DEFAULT_POINTS: usize = 128;

/// Inverse of sinc over [0, 1]. Decreasing, from 1 down to 0.
pub static INVERSE_SINC: Lazy<InverseFunction> = Lazy::new(|| {
    InverseFunction::new(sinc, (0.0, 1.0), (1.0, 0.0), DEFAULT_POINTS)
        .expect("sinc has a single root on [0, 1] for every level in its domain")
});

/// Inverse of J0 over [0, 1], bracketed by the first zero of J0.
pub static INVERSE_BESSEL0: Lazy<InverseFunction> = Lazy::new(|| {
    InverseFunction::new(bessel_j0, (0.0, 1.0), (2.4048, 0.0), DEFAULT_POINTS)
        .expect("J0 is monotone on [0, 2.4048]")
});

/// Inverse of J1 over [0, 0.5819], bracketed by the first maximum of J1.
pub static INVERSE_BESSEL1: Lazy<InverseFunction> = Lazy::new(|| {
    InverseFunction::new(bessel_j1, (0.0, 0.5819), (0.0, 1.8412), DEFAULT_POINTS)
        .expect("J1 is monotone on [0, 1.8412]")
});

/// Normalised sinc, `sin(pi x) / (pi x)`.
pub fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// Bessel function of the first kind, order 0.
pub fn bessel_j0(x: f64) -> f64 {
    bessel::j_n(0, x)
}

/// Bessel function of the first kind, order 1.
pub fn bessel_j1(x: f64) -> f64 {
    bessel::j_n(1, x)
}

/// Approximate inverse of a function that is monotone over `domain`.
#[derive(Clone, Debug)]
pub struct InverseFunction {
    domain: (f64, f64),
    spline: CubicSpline,
}

impl InverseFunction {
    /// Tabulates the inverse of `f`.
    ///
    /// * `f` - function to invert, monotone between the two bracket values
    /// * `domain` - interval of `f` values the inverse accepts
    /// * `bracket` - the inverse at `domain.0` and `domain.1` respectively
    /// * `n` - number of tabulated points, at least 3
    pub fn new<F: Fn(f64) -> f64>(
        f: F,
        domain: (f64, f64),
        bracket: (f64, f64),
        n: usize,
    ) -> Result<Self> {
        if n < 3 {
            return Err(HologramError::InvalidArgument(format!(
                "an inverse table needs at least 3 points, got {}",
                n
            )));
        }
        if !(domain.0 < domain.1) {
            return Err(HologramError::InvalidArgument(format!(
                "empty inverse function domain [{}, {}]",
                domain.0, domain.1
            )));
        }

        let xs = linspace(domain.0, domain.1, n);
        let mut ys = Vec::with_capacity(n);
        ys.push(bracket.0);
        for &x in &xs[1..n - 1] {
            // the endpoints are pinned to the bracket because f is flat there
            ys.push(brent(|y| f(y) - x, bracket.0, bracket.1, 1e-14, 200)?);
        }
        ys.push(bracket.1);

        debug!(
            "tabulated inverse over [{}, {}] with {} points",
            domain.0, domain.1, n
        );

        Ok(InverseFunction {
            domain,
            spline: CubicSpline::natural(xs, ys),
        })
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    fn check(&self, x: f64) -> Result<()> {
        // NaN fails both comparisons and is passed through to the spline
        if x < self.domain.0 || x > self.domain.1 {
            Err(HologramError::Domain {
                value: x,
                lo: self.domain.0,
                hi: self.domain.1,
            })
        } else {
            Ok(())
        }
    }

    /// Evaluates the inverse at a single point.
    pub fn eval(&self, x: f64) -> Result<f64> {
        self.check(x)?;
        Ok(self.spline.eval(x))
    }

    /// Evaluates the inverse element-wise. Fails if any element is outside of the domain.
    pub fn eval_array<D: Dimension>(&self, x: ArrayView<f64, D>) -> Result<Array<f64, D>> {
        if let Some(&bad) = x
            .iter()
            .find(|&&v| v < self.domain.0 || v > self.domain.1)
        {
            self.check(bad)?;
        }
        let spline = &self.spline;
        Ok(Zip::from(&x).par_map_collect(|&v| spline.eval(v)))
    }
}

pub(crate) fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            let mut v: Vec<f64> = (0..n).map(|i| lo + step * i as f64).collect();
            v[n - 1] = hi;
            v
        }
    }
}

/// Brent's method for a root of `f` inside `[a, b]`.
///
/// `f(a)` and `f(b)` must have opposite signs (or one of them be zero).
pub fn brent<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, tol: f64, max_iter: usize) -> Result<f64> {
    let (mut a, mut b) = (a, b);
    let mut fa = f(a);
    let mut fb = f(b);
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if (fa > 0.0) == (fb > 0.0) {
        return Err(HologramError::InvalidArgument(format!(
            "root is not bracketed by [{}, {}]",
            a, b
        )));
    }

    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    for _ in 0..max_iter {
        if (fb > 0.0) == (fc > 0.0) {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * tol;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol1 || fb == 0.0 {
            return Ok(b);
        }

        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            // inverse quadratic interpolation, or secant when only two points are distinct
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                (2.0 * xm * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            let min1 = 3.0 * xm * q - (tol1 * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        if d.abs() > tol1 {
            b += d;
        } else {
            b += tol1.copysign(xm);
        }
        fb = f(b);
    }

    Err(HologramError::InvalidArgument(format!(
        "root finding did not converge within {} iterations",
        max_iter
    )))
}

/// Natural cubic spline through evenly spaced knots.
#[derive(Clone, Debug)]
struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    // second derivatives at the knots
    m: Vec<f64>,
}

impl CubicSpline {
    fn natural(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        let n = xs.len();
        let mut m = vec![0.0; n];
        let inner = n.saturating_sub(2);
        if inner > 0 {
            let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();

            // tridiagonal system for the interior second derivatives, Thomas algorithm
            let mut cp = vec![0.0; inner];
            let mut dp = vec![0.0; inner];
            for i in 0..inner {
                let k = i + 1;
                let sub = if i > 0 { h[k - 1] } else { 0.0 };
                let diag = 2.0 * (h[k - 1] + h[k]);
                let sup = if i + 1 < inner { h[k] } else { 0.0 };
                let rhs = 6.0 * ((ys[k + 1] - ys[k]) / h[k] - (ys[k] - ys[k - 1]) / h[k - 1]);

                let (w, prev_d) = if i > 0 {
                    (diag - sub * cp[i - 1], dp[i - 1])
                } else {
                    (diag, 0.0)
                };
                cp[i] = sup / w;
                dp[i] = (rhs - sub * prev_d) / w;
            }
            m[inner] = dp[inner - 1];
            for i in (0..inner - 1).rev() {
                m[i + 1] = dp[i] - cp[i] * m[i + 2];
            }
        }
        CubicSpline { xs, ys, m }
    }

    fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        let last = n - 1;
        if x == self.xs[last] {
            return self.ys[last];
        }
        let h = self.xs[1] - self.xs[0];
        let i = (((x - self.xs[0]) / h).floor() as usize).min(last - 1);

        let a = (self.xs[i + 1] - x) / h;
        let b = (x - self.xs[i]) / h;
        a * self.ys[i]
            + b * self.ys[i + 1]
            + (a * (a * a - 1.0) * self.m[i] + b * (b * b - 1.0) * self.m[i + 1]) * h * h / 6.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn sinc_round_trip() {
        let y = INVERSE_SINC.eval(0.5).unwrap();
        assert!((sinc(y) - 0.5).abs() < 1e-5, "{}", sinc(y));
        for &x in &[0.05, 0.3, 0.77, 0.95] {
            let y = INVERSE_SINC.eval(x).unwrap();
            assert!((sinc(y) - x).abs() < 1e-3, "{} {}", x, sinc(y));
        }
    }

    #[test]
    fn bessel_round_trips() {
        for &x in &[0.1, 0.5, 0.9] {
            let y = INVERSE_BESSEL0.eval(x).unwrap();
            assert!((bessel_j0(y) - x).abs() < 1e-4, "{} {}", x, bessel_j0(y));
        }
        for &x in &[0.05, 0.3, 0.5] {
            let y = INVERSE_BESSEL1.eval(x).unwrap();
            assert!((bessel_j1(y) - x).abs() < 1e-4, "{} {}", x, bessel_j1(y));
        }
    }

    #[test]
    fn endpoints_map_to_bracket() {
        assert_eq!(INVERSE_SINC.eval(0.0).unwrap(), 1.0);
        assert_eq!(INVERSE_SINC.eval(1.0).unwrap(), 0.0);
        assert_eq!(INVERSE_BESSEL0.eval(0.0).unwrap(), 2.4048);
        assert_eq!(INVERSE_BESSEL0.eval(1.0).unwrap(), 0.0);
        assert_eq!(INVERSE_BESSEL1.eval(0.0).unwrap(), 0.0);
        assert_eq!(INVERSE_BESSEL1.eval(0.5819).unwrap(), 1.8412);
    }

    #[test]
    fn outside_domain_is_an_error() {
        match INVERSE_SINC.eval(1.5) {
            Err(HologramError::Domain { value, lo, hi }) => {
                assert_eq!(value, 1.5);
                assert_eq!((lo, hi), (0.0, 1.0));
            }
            other => panic!("expected a domain error, got {:?}", other),
        }
        assert!(INVERSE_BESSEL0.eval(-0.01).is_err());
        assert!(INVERSE_BESSEL1.eval(0.6).is_err());
        let xs = array![[0.2, 0.4], [0.6, 1.2]];
        assert!(INVERSE_SINC.eval_array(xs.view()).is_err());
    }

    #[test]
    fn array_evaluation_matches_scalar() {
        let xs = array![[0.0, 0.25], [0.5, 1.0]];
        let ys = INVERSE_BESSEL0.eval_array(xs.view()).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_eq!(INVERSE_BESSEL0.eval(*x).unwrap(), *y);
        }
    }

    #[test]
    fn nan_propagates() {
        assert!(INVERSE_SINC.eval(f64::NAN).unwrap().is_nan());
    }

    #[test]
    fn brent_finds_sqrt2() {
        let r = brent(|x| x * x - 2.0, 0.0, 2.0, 1e-14, 100).unwrap();
        assert!((r - 2f64.sqrt()).abs() < 1e-12);
        assert!(brent(|x| x * x + 1.0, -1.0, 1.0, 1e-14, 100).is_err());
    }

    #[test]
    fn spline_reproduces_straight_line() {
        // a straight line has zero curvature so the natural spline is exact
        let xs = linspace(0.0, 1.0, 11);
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x - 1.0).collect();
        let spline = CubicSpline::natural(xs, ys);
        for &x in &[0.0, 0.13, 0.5, 0.999, 1.0] {
            assert!((spline.eval(x) - (3.0 * x - 1.0)).abs() < 1e-12);
        }
    }
}
