//! Phase-amplitude encodings of a complex field into a phase-only signal.
//!
//! Each method trades diffraction efficiency for how faithfully the amplitude is
//! reproduced in the first diffraction order. The returned signal is unnormalised;
//! it is mapped to grey levels by [`crate::normalize`].

use crate::error::{incompatible_shape, HologramError, Result};
use crate::inverse::{INVERSE_BESSEL0, INVERSE_BESSEL1, INVERSE_SINC};
use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Argument scaling applied before the J1 inverse, just below the maximum of J1.
pub const BESSEL1_ARGUMENT_SCALE: f64 = 0.5818;

/// Reduction of the usable modulation depth for the J1 encoding.
pub const BESSEL1_MODULATION_FACTOR: f64 = 0.586;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Phase scaled by the amplitude.
    Simple,
    /// Phase scaled by `1 - sinc^-1(a)`.
    Sinc,
    /// Phase modulated by `J0^-1(a) sin(phase)`.
    Bessel0,
    /// `J1^-1(0.5818 a) sin(phase)`.
    #[default]
    Bessel1,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Simple, Method::Sinc, Method::Bessel0, Method::Bessel1];

    pub fn token(self) -> &'static str {
        match self {
            Method::Simple => "simple",
            Method::Sinc => "sinc",
            Method::Bessel0 => "bessel0",
            Method::Bessel1 => "bessel1",
        }
    }

    /// Fraction of the 2π grey level range the method actually uses.
    pub fn modulation_factor(self) -> f64 {
        match self {
            Method::Bessel1 => BESSEL1_MODULATION_FACTOR,
            _ => 1.0,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Method {
    type Err = HologramError;

    fn from_str(s: &str) -> Result<Self> {
        Method::ALL
            .iter()
            .copied()
            .find(|m| m.token() == s)
            .ok_or_else(|| {
                HologramError::InvalidArgument(format!(
                    "unknown method '{}', expected one of 'simple', 'sinc', 'bessel0', 'bessel1'",
                    s
                ))
            })
    }
}

/// Wraps a phase into `[-π, π)`.
pub fn convert2angle(phase: f64) -> f64 {
    (phase + PI).rem_euclid(2.0 * PI) - PI
}

/// Encodes amplitude and phase into an unnormalised phase-only signal.
///
/// * `phase` - phase of the field, any real value
/// * `amplitude` - amplitude already scaled so that its maximum is 1
/// * `method` - encoding to apply
pub fn encode(
    phase: ArrayView2<f64>,
    amplitude: ArrayView2<f64>,
    method: Method,
) -> Result<Array2<f64>> {
    if phase.shape() != amplitude.shape() {
        return Err(incompatible_shape());
    }

    let psi = match method {
        Method::Simple => {
            Zip::from(&phase)
                .and(&amplitude)
                .par_map_collect(|&p, &a| a * convert2angle(p))
        }
        Method::Sinc => {
            let inv = INVERSE_SINC.eval_array(amplitude)?;
            Zip::from(&phase)
                .and(&inv)
                .par_map_collect(|&p, &s| (1.0 - s) * convert2angle(p))
        }
        Method::Bessel0 => {
            let inv = INVERSE_BESSEL0.eval_array(amplitude)?;
            Zip::from(&phase)
                .and(&inv)
                .par_map_collect(|&p, &j| convert2angle(p + j * p.sin()))
        }
        Method::Bessel1 => {
            let scaled = amplitude.mapv(|a| BESSEL1_ARGUMENT_SCALE * a);
            let inv = INVERSE_BESSEL1.eval_array(scaled.view())?;
            Zip::from(&phase)
                .and(&inv)
                .par_map_collect(|&p, &j| j * p.sin())
        }
    };
    Ok(psi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn convert2angle_range() {
        assert_eq!(convert2angle(0.0), 0.0);
        assert!((convert2angle(3.0 * PI) + PI).abs() < 1e-12);
        assert!((convert2angle(PI / 2.0 + 4.0 * PI) - PI / 2.0).abs() < 1e-12);
        for i in -200..200 {
            let phase = i as f64 * 0.173;
            let wrapped = convert2angle(phase);
            assert!(wrapped >= -PI && wrapped < PI, "{} -> {}", phase, wrapped);
            assert!((convert2angle(wrapped) - wrapped).abs() < 1e-12);
            let turns = (phase - wrapped) / (2.0 * PI);
            assert!((turns - turns.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn parse_methods() {
        for m in Method::ALL.iter() {
            assert_eq!(m.token().parse::<Method>().unwrap(), *m);
        }
        match "bessel2".parse::<Method>() {
            Err(HologramError::InvalidArgument(msg)) => {
                assert!(msg.contains("bessel2"));
                assert!(msg.contains("'simple', 'sinc', 'bessel0', 'bessel1'"));
            }
            other => panic!("expected invalid argument, got {:?}", other),
        }
    }

    #[test]
    fn modulation_factors() {
        assert_eq!(Method::Simple.modulation_factor(), 1.0);
        assert_eq!(Method::Sinc.modulation_factor(), 1.0);
        assert_eq!(Method::Bessel0.modulation_factor(), 1.0);
        assert_eq!(Method::Bessel1.modulation_factor(), 0.586);
        assert_eq!(Method::default(), Method::Bessel1);
    }

    #[test]
    fn simple_scales_phase_by_amplitude() {
        let phase = array![[0.5, -1.0], [3.0 * PI, 2.0]];
        let amp = array![[1.0, 0.5], [1.0, 0.0]];
        let psi = encode(phase.view(), amp.view(), Method::Simple).unwrap();
        assert!((psi[[0, 0]] - 0.5).abs() < 1e-12);
        assert!((psi[[0, 1]] + 0.5).abs() < 1e-12);
        assert!((psi[[1, 0]] + PI).abs() < 1e-9);
        assert_eq!(psi[[1, 1]], 0.0);
    }

    #[test]
    fn zero_amplitude_gives_flat_signal() {
        let phase = array![[0.3, 1.2, -2.0]];
        let amp = array![[0.0, 0.0, 0.0]];
        for &m in &[Method::Simple, Method::Sinc, Method::Bessel1] {
            let psi = encode(phase.view(), amp.view(), m).unwrap();
            assert!(psi.iter().all(|v| v.abs() < 1e-12), "{:?} {:?}", m, psi);
        }
        // J0^-1(0) is the first zero of J0, so the phase is strongly modulated instead
        let psi = encode(phase.view(), amp.view(), Method::Bessel0).unwrap();
        let expected = convert2angle(0.3 + 2.4048 * 0.3f64.sin());
        assert!((psi[[0, 0]] - expected).abs() < 1e-12);
    }

    #[test]
    fn full_amplitude() {
        let phase = array![[1.0]];
        let amp = array![[1.0]];
        let sinc = encode(phase.view(), amp.view(), Method::Sinc).unwrap();
        assert!((sinc[[0, 0]] - 1.0).abs() < 1e-12);
        let b0 = encode(phase.view(), amp.view(), Method::Bessel0).unwrap();
        assert!((b0[[0, 0]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn amplitude_out_of_range() {
        let phase = array![[0.0, 0.0]];
        let amp = array![[0.5, 1.5]];
        for &m in &[Method::Sinc, Method::Bessel0, Method::Bessel1] {
            match encode(phase.view(), amp.view(), m) {
                Err(HologramError::Domain { .. }) => {}
                other => panic!("{:?}: expected domain error, got {:?}", m, other),
            }
        }
    }

    #[test]
    fn mismatched_shapes() {
        let phase = array![[0.0, 0.0]];
        let amp = array![[0.5], [0.5]];
        assert!(matches!(
            encode(phase.view(), amp.view(), Method::Simple),
            Err(HologramError::Shape(_))
        ));
    }
}
