//! Simulated Fourier-plane image of a hologram displayed on the SLM.
//!
//! Useful for checking a mask before sending it to the device: the desired field should
//! appear around the first diffraction order, displaced from the centre by the grating carrier.

use crate::error::{incompatible_shape, Result};
use crate::fft2::{fft2c, ifft2c};
use ndarray::{Array2, ArrayView2, Zip};
use num_complex::Complex;
use std::f64::consts::PI;

/// Phase applied by each pixel, taking `max_modulation` grey levels as a 2π shift.
pub fn slm_phase(hologram: ArrayView2<u8>, max_modulation: f64) -> Array2<f64> {
    hologram.mapv(|g| 2.0 * PI * g as f64 / max_modulation)
}

/// Field in the back focal plane of a lens placed after the SLM.
///
/// The zero frequency is at `(rows/2, columns/2)`.
pub fn far_field(
    hologram: ArrayView2<u8>,
    incoming: ArrayView2<Complex<f64>>,
    max_modulation: f64,
) -> Result<Array2<Complex<f64>>> {
    if hologram.shape() != incoming.shape() {
        return Err(incompatible_shape());
    }
    let phase = slm_phase(hologram, max_modulation);
    let reflected = Zip::from(&incoming)
        .and(&phase)
        .par_map_collect(|&e, &p| e * Complex::from_polar(1.0, p));
    Ok(fft2c(reflected))
}

/// Field just after the SLM that focuses to `field`, undoing the propagation of [`far_field`].
///
/// Handy for targets that are specified in the Fourier plane.
pub fn slm_plane_field(field: Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    ifft2c(field)
}

/// Offset `(rows, columns)` of the first diffraction order from the zero order in the far field.
///
/// * `shape` - `(rows, columns)` of the hologram
/// * `period` - grating periods `(x, y)` in pixels
pub fn first_order_offset(shape: (usize, usize), period: (f64, f64)) -> (f64, f64) {
    (shape.0 as f64 / period.1, shape.1 as f64 / period.0)
}

/// Index of the brightest far-field sample.
pub fn brightest(field: ArrayView2<Complex<f64>>) -> Option<(usize, usize)> {
    field
        .indexed_iter()
        .fold(None, |best: Option<((usize, usize), f64)>, (idx, e)| {
            let v = e.norm_sqr();
            match best {
                Some((_, b)) if b >= v => best,
                _ => Some((idx, v)),
            }
        })
        .map(|(idx, _)| idx)
}
