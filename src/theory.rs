use std::f64::consts::PI;

use num_complex::Complex;

use crate::pressure::PressureDistribution;

/// Anything that can produce a reference pressure curve from the angle of
/// attack alone.
pub trait PressureReference {
    fn distribution(&self, angle_deg: f64) -> PressureDistribution;
}

/// Closed-form flat plate solution from conformal mapping.
///
/// Complex velocity on the plate is
/// `w(z) = cos α − i·sin α·z / √(z² − a²)` with `a` the half chord, and
/// `Cp = 1 − Re(w)²`. The plate in the grid lies across the y axis, so the
/// mapping is evaluated at `α = 90° − θ` for an angle of attack `θ`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConformalPlate {
    pub half_length: f64,
    /// Samples cover `[-span, span]`, short of the singular edges.
    pub span: f64,
    pub samples: usize,
}

impl Default for ConformalPlate {
    fn default() -> Self {
        ConformalPlate {
            half_length: 0.5,
            span: 0.49,
            samples: 150,
        }
    }
}

impl ConformalPlate {
    pub fn velocity(&self, x: f64, alpha: f64) -> Complex<f64> {
        let z = Complex::new(x, 0.0);
        let a = self.half_length;
        // Built from reals so the imaginary part is +0.0 and the slit takes
        // the principal branch `i·√(a² − x²)` on both halves of the plate.
        let root = Complex::new(x * x - a * a, 0.0).sqrt();
        Complex::new(alpha.cos(), 0.0) - Complex::i() * alpha.sin() * z / root
    }

    pub fn pressure_at(&self, x: f64, angle_deg: f64) -> f64 {
        let alpha = (90.0 - angle_deg) * PI / 180.0;
        let u = self.velocity(x, alpha).re;
        1.0 - u * u
    }

    /// Chordwise position where `Re(w)` vanishes and `Cp = 1`.
    pub fn stagnation_point(&self, angle_deg: f64) -> f64 {
        let alpha = (90.0 - angle_deg) * PI / 180.0;
        self.half_length * alpha.cos()
    }
}

impl PressureReference for ConformalPlate {
    fn distribution(&self, angle_deg: f64) -> PressureDistribution {
        let n = self.samples;
        let positions: Vec<f64> = match n {
            0 => Vec::new(),
            1 => vec![0.0],
            _ => {
                let step = 2.0 * self.span / (n - 1) as f64;
                (0..n).map(|i| -self.span + step * i as f64).collect()
            }
        };
        let cp = positions
            .iter()
            .map(|&x| self.pressure_at(x, angle_deg))
            .collect();
        PressureDistribution { positions, cp }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_count() {
        let dist = ConformalPlate::default().distribution(15.0);
        assert_eq!(dist.len(), 150);
        assert!((dist.positions[0] + 0.49).abs() < 1e-12);
        assert!((dist.positions[149] - 0.49).abs() < 1e-12);
    }

    #[test]
    fn test_stagnation_near_one() {
        let plate = ConformalPlate::default();
        let dist = plate.distribution(15.0);
        let (i_max, cp_max) = dist
            .cp
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |acc, (i, &cp)| if cp > acc.1 { (i, cp) } else { acc });
        assert!((cp_max - 1.0).abs() < 0.05, "peak cp={}", cp_max);

        let x_stag = plate.stagnation_point(15.0);
        assert!((x_stag - 0.5 * 75.0_f64.to_radians().cos()).abs() < 1e-12);
        assert!((dist.positions[i_max] - x_stag).abs() < 0.01, "peak at {}", dist.positions[i_max]);
        assert!((plate.pressure_at(x_stag, 15.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_real_velocity_on_plate() {
        // On the slit |x| < a the square root is purely imaginary, so w is real.
        let plate = ConformalPlate::default();
        let alpha = 40.0_f64.to_radians();
        for x in [-0.4, -0.1, 0.0, 0.2, 0.45] {
            let w = plate.velocity(x, alpha);
            assert!(w.im.abs() < 1e-12, "x={} w={}", x, w);
            let expected = alpha.cos() - alpha.sin() * x / (0.25 - x * x).sqrt();
            assert!((w.re - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_head_on_flow_symmetric() {
        // θ = 90° puts α = 0: uniform flow along the plate, Cp = 0.
        let dist = ConformalPlate::default().distribution(90.0);
        for cp in &dist.cp {
            assert!(cp.abs() < 1e-12);
        }
        // θ = 0° is normal flow: symmetric about the midchord.
        let dist = ConformalPlate::default().distribution(0.0);
        let n = dist.len();
        for i in 0..n / 2 {
            assert!((dist.cp[i] - dist.cp[n - 1 - i]).abs() < 1e-9);
        }
    }
}
