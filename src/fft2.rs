use ndarray::parallel::prelude::{IntoParallelIterator, ParallelIterator};
use ndarray::{Array2, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis, Zip};
use num_complex::Complex;
use rustfft::num_traits::Zero;
use rustfft::{FftDirection, FftPlanner};

/// performs a 2D fft where the 0th component is at the center rather than the normal right
/// removes the need for ifft_shift before and fft_shift after.
pub fn fft2c(mut input: Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    _fft2c(input.view_mut(), FftDirection::Forward);
    input
}

/// performs a 2D ifft where the 0th component is at the center rather than the normal right
/// removes the need for ifft_shift before and fft_shift after.
pub fn ifft2c(mut input: Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    _fft2c(input.view_mut(), FftDirection::Inverse);
    input
}

fn _fft2c(mut input: ArrayViewMut2<Complex<f64>>, direction: FftDirection) {
    let i0 = input.shape()[0];
    let i1 = input.shape()[1];

    let normalisation = 1.0 / ((i0 * i1) as f64).sqrt();

    let mut planner = FftPlanner::new();
    let fft0 = planner.plan_fft(i0, direction);
    let fft1 = planner.plan_fft(i1, direction);

    // fft along axis1, iteration over axis0
    Zip::from(input.axis_iter_mut(Axis(0)))
        .into_par_iter()
        .for_each_init(
            || {
                (
                    vec![Zero::zero(); i1],
                    vec![Zero::zero(); fft1.get_inplace_scratch_len()],
                )
            },
            |(buffer, scratch), row| {
                let mut row = row.0;
                ifft_shift_inplace(row.view_mut());
                for (b, e) in buffer.iter_mut().zip(row.iter()) {
                    *b = *e;
                }
                fft1.process_with_scratch(buffer, scratch);
                for (e, b) in row.iter_mut().zip(buffer.iter()) {
                    *e = *b;
                }
                fft_shift_inplace(row);
            },
        );

    // fft along axis0, iteration over axis1
    Zip::from(input.axis_iter_mut(Axis(1)))
        .into_par_iter()
        .for_each_init(
            || {
                (
                    vec![Zero::zero(); i0],
                    vec![Zero::zero(); fft0.get_inplace_scratch_len()],
                )
            },
            |(buffer, scratch), col| {
                let mut col = col.0;
                ifft_shift_inplace(col.view_mut());
                for (b, e) in buffer.iter_mut().zip(col.iter()) {
                    *b = *e;
                }
                fft0.process_with_scratch(buffer, scratch);
                for (e, b) in col.iter_mut().zip(buffer.iter()) {
                    *e = *b * normalisation;
                }
                fft_shift_inplace(col);
            },
        );
}

/// Moves the origin (0) to the "center" of the array (N/2)
///
/// For even array lengths, which have no center value, this moves the value to the next value after the center
pub fn fft_shift_inplace(mut input: ArrayViewMut1<Complex<f64>>) {
    if input.len() % 2 == 0 {
        return fft_shift_even(input);
    }

    let len = input.len();
    let half = len / 2;

    let mut i = input.len();
    let mut j = half;
    let mut temp1 = input[half];
    for _ in 0..half {
        i -= 1;
        j -= 1;
        std::mem::swap(&mut temp1, &mut input[i]);

        std::mem::swap(&mut temp1, &mut input[j]);
    }
    input[half] = temp1;
}

/// Moves the "center" of the array (N/2) to the origin (0)
///
/// Inverts fft_shift exactly, accounting for the asymmetry of even arrays
pub fn ifft_shift_inplace(mut input: ArrayViewMut1<Complex<f64>>) {
    if input.len() % 2 == 0 {
        return fft_shift_even(input);
    }

    let len = input.len();
    let half = len / 2;

    let mut j = half + 1;
    let mut temp1 = input[half];
    for i in 0..half {
        std::mem::swap(&mut temp1, &mut input[i]);

        std::mem::swap(&mut temp1, &mut input[j]);

        j += 1;
    }
    input[half] = temp1;
}

fn fft_shift_even(mut input: ArrayViewMut1<Complex<f64>>) {
    let half = input.len() / 2;
    for i in 0..half {
        input.swap(i, i + half);
    }
}

/// Circularly shifts a 2D array by `(rows, columns)`, wrapping values that fall off one edge onto the other.
///
/// Positive shifts move values towards higher indices.
pub fn roll<T: Clone>(input: ArrayView2<T>, shift: (i64, i64)) -> Array2<T> {
    let h = input.shape()[0];
    let w = input.shape()[1];
    if h == 0 || w == 0 {
        return input.to_owned();
    }
    let sy = shift.0.rem_euclid(h as i64) as usize;
    let sx = shift.1.rem_euclid(w as i64) as usize;
    Array2::from_shape_fn((h, w), |(y, x)| {
        input[[(y + h - sy) % h, (x + w - sx) % w]].clone()
    })
}
