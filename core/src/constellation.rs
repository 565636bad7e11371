//! Constellation tables
//!
//! Two flavours live here. The display tables are the fixed point sets the
//! plots draw for the scheme presets. The generated alphabets are the
//! unit-energy M-ary sets the synthesizer maps symbols onto.

use crate::error::{Result, WaveformError};
use crate::modulation::{bits_per_symbol, Modulation, Scheme};
use rustfft::num_complex::Complex;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::f64::consts::PI;

/// Radius / half-extent used by the display tables
const DISPLAY_AMPLITUDE: f64 = 0.75;

/// Grid levels of the 16QAM display table
const QAM16_DISPLAY_LEVELS: [f64; 4] = [-0.75, -0.25, 0.25, 0.75];

/// Grid levels of the 64QAM display table
const QAM64_DISPLAY_LEVELS: [f64; 8] = [-0.857, -0.612, -0.367, -0.122, 0.122, 0.367, 0.612, 0.857];

#[derive(Debug, Clone, PartialEq)]
pub struct Constellation {
    points: Vec<Complex<f64>>,
}

impl Constellation {
    /// Fixed point table drawn for a display preset
    pub fn for_scheme(scheme: Scheme) -> Self {
        let points = match scheme {
            Scheme::Bpsk => vec![Complex::new(-1.0, 0.0), Complex::new(1.0, 0.0)],
            Scheme::Qpsk => vec![
                Complex::new(DISPLAY_AMPLITUDE, DISPLAY_AMPLITUDE),
                Complex::new(-DISPLAY_AMPLITUDE, DISPLAY_AMPLITUDE),
                Complex::new(-DISPLAY_AMPLITUDE, -DISPLAY_AMPLITUDE),
                Complex::new(DISPLAY_AMPLITUDE, -DISPLAY_AMPLITUDE),
            ],
            Scheme::Psk8 => (0..8)
                .map(|i| {
                    let angle = 2.0 * PI * i as f64 / 8.0 + PI / 8.0;
                    Complex::from_polar(DISPLAY_AMPLITUDE, angle)
                })
                .collect(),
            Scheme::Qam16 => square_grid(&QAM16_DISPLAY_LEVELS),
            Scheme::Qam64 => square_grid(&QAM64_DISPLAY_LEVELS),
        };

        Self { points }
    }

    /// Unit average energy alphabet for an `order`-ary scheme of the given family
    pub fn generate(modulation: Modulation, order: u32) -> Result<Self> {
        modulation.validate_order(order)?;

        let points = match modulation {
            Modulation::Pam => (0..order)
                .map(|k| Complex::new(odd_level(k, order), 0.0))
                .collect(),
            Modulation::Qam => {
                let side = 1u32 << (bits_per_symbol(order) / 2);
                let levels: Vec<f64> = (0..side).map(|k| odd_level(k, side)).collect();
                square_grid(&levels)
            }
            Modulation::Psk => {
                let offset = if order == 2 { 0.0 } else { PI / order as f64 };
                (0..order)
                    .map(|k| Complex::from_polar(1.0, 2.0 * PI * k as f64 / order as f64 + offset))
                    .collect()
            }
            Modulation::Fsk => return Err(WaveformError::NoConstellation(modulation)),
        };

        Ok(Self { points }.normalized())
    }

    pub fn points(&self) -> &[Complex<f64>] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<Complex<f64>> {
        self.points.get(index).copied()
    }

    /// Number of points, which is the modulation order
    pub fn order(&self) -> usize {
        self.points.len()
    }

    pub fn bits_per_symbol(&self) -> u32 {
        bits_per_symbol(self.points.len() as u32)
    }

    pub fn average_energy(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.points.iter().map(|p| p.norm_sqr()).sum::<f64>() / self.points.len() as f64
    }

    pub fn peak_amplitude(&self) -> f64 {
        self.points.iter().map(|p| p.norm()).fold(0.0, f64::max)
    }

    /// Rescale to unit average energy. An all-zero set is returned unchanged.
    pub fn normalized(&self) -> Self {
        let energy = self.average_energy();
        if energy <= 0.0 {
            return self.clone();
        }
        let scale = 1.0 / energy.sqrt();
        Self {
            points: self.points.iter().map(|&p| p * scale).collect(),
        }
    }
}

impl Serialize for Constellation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let points: Vec<[f64; 2]> = self.points.iter().map(|p| [p.re, p.im]).collect();
        let mut state = serializer.serialize_struct("Constellation", 3)?;
        state.serialize_field("order", &self.order())?;
        state.serialize_field("bits_per_symbol", &self.bits_per_symbol())?;
        state.serialize_field("points", &points)?;
        state.end()
    }
}

/// Level k of `count` evenly spaced odd integers centred on zero: 2k - count + 1
fn odd_level(k: u32, count: u32) -> f64 {
    2.0 * k as f64 - count as f64 + 1.0
}

/// Cartesian grid with I as the outer loop and Q as the inner loop
fn square_grid(levels: &[f64]) -> Vec<Complex<f64>> {
    levels
        .iter()
        .flat_map(|&i| levels.iter().map(move |&q| Complex::new(i, q)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_display_tables_match_order() {
        for scheme in Scheme::ALL {
            let c = Constellation::for_scheme(scheme);
            assert_eq!(c.order(), scheme.order() as usize, "{}", scheme);
            assert_eq!(c.bits_per_symbol(), scheme.bits_per_symbol());
        }
    }

    #[test]
    fn test_qpsk_display_points() {
        let c = Constellation::for_scheme(Scheme::Qpsk);
        assert_eq!(c.point(0), Some(Complex::new(0.75, 0.75)));
        assert_eq!(c.point(1), Some(Complex::new(-0.75, 0.75)));
        assert_eq!(c.point(3), Some(Complex::new(0.75, -0.75)));
    }

    #[test]
    fn test_8psk_display_offset() {
        let c = Constellation::for_scheme(Scheme::Psk8);
        let first = c.point(0).unwrap();
        assert!((first.arg() - PI / 8.0).abs() < EPS);
        for p in c.points() {
            assert!((p.norm() - 0.75).abs() < EPS);
        }
    }

    #[test]
    fn test_16qam_display_grid_order() {
        let c = Constellation::for_scheme(Scheme::Qam16);
        assert_eq!(c.point(0), Some(Complex::new(-0.75, -0.75)));
        assert_eq!(c.point(1), Some(Complex::new(-0.75, -0.25)));
        assert_eq!(c.point(4), Some(Complex::new(-0.25, -0.75)));
        assert_eq!(c.point(15), Some(Complex::new(0.75, 0.75)));
    }

    #[test]
    fn test_generated_alphabets_have_unit_energy() {
        let cases = [
            (Modulation::Pam, 2),
            (Modulation::Pam, 8),
            (Modulation::Qam, 4),
            (Modulation::Qam, 64),
            (Modulation::Psk, 2),
            (Modulation::Psk, 16),
        ];
        for (modulation, order) in cases {
            let c = Constellation::generate(modulation, order).unwrap();
            assert_eq!(c.order(), order as usize);
            assert!((c.average_energy() - 1.0).abs() < 1e-9, "{} {}", modulation, order);
        }
    }

    #[test]
    fn test_pam_levels_are_real_and_symmetric() {
        let c = Constellation::generate(Modulation::Pam, 4).unwrap();
        let levels: Vec<f64> = c.points().iter().map(|p| p.re).collect();
        assert!(c.points().iter().all(|p| p.im == 0.0));
        assert!((levels[0] + levels[3]).abs() < EPS);
        assert!((levels[1] + levels[2]).abs() < EPS);
        // 4-PAM levels are -3, -1, 1, 3 scaled by 1/sqrt(5)
        assert!((levels[3] - 3.0 / 5f64.sqrt()).abs() < EPS);
    }

    #[test]
    fn test_psk_offsets() {
        let bpsk = Constellation::generate(Modulation::Psk, 2).unwrap();
        assert!((bpsk.point(0).unwrap().re - 1.0).abs() < EPS);
        let qpsk = Constellation::generate(Modulation::Psk, 4).unwrap();
        assert!((qpsk.point(0).unwrap().arg() - PI / 4.0).abs() < EPS);
    }

    #[test]
    fn test_fsk_has_no_constellation() {
        assert!(matches!(
            Constellation::generate(Modulation::Fsk, 4),
            Err(WaveformError::NoConstellation(Modulation::Fsk))
        ));
    }

    #[test]
    fn test_serialize_points() {
        let c = Constellation::for_scheme(Scheme::Bpsk);
        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(value["order"], 2);
        assert_eq!(value["points"][0][0], -1.0);
    }
}
