use crate::utils::constants::POLE_EPSILON;
use ndarray::Array2;
use std::f64::consts::PI;

/// Keeps a colatitude away from the geographic poles, where the field components divide by
/// `sin(theta)`.
pub fn clamp_colatitude(theta: f64) -> f64 {
    theta.clamp(POLE_EPSILON, PI - POLE_EPSILON)
}

/// Associated Legendre functions `P(n, m)(cos theta)` and their colatitude derivatives.
///
/// The functions are un-normalized and carry the Condon-Shortley phase `(-1)^m`, matching
/// `scipy.special.lpmn`. Schmidt normalization is applied to the coefficients instead.
#[derive(Debug, Clone)]
pub struct LegendreTable {
    /// `P(n, m)`, indexed `[[n, m]]`
    pub p: Array2<f64>,
    /// `dP(n, m) / d theta`, indexed `[[n, m]]`
    pub dp: Array2<f64>,
    theta: f64,
}

impl LegendreTable {
    /// Evaluates every `P(n, m)` and `dP(n, m) / d theta` with `0 <= m <= n <= degree`.
    /// `theta` is clamped with [`clamp_colatitude`] first.
    pub fn evaluate(degree: usize, theta: f64) -> LegendreTable {
        let theta = clamp_colatitude(theta);
        let (x, s) = (theta.cos(), theta.sin());

        let mut p = Array2::<f64>::zeros((degree + 1, degree + 1));
        p[[0, 0]] = 1.0;
        for m in 0..=degree {
            if m > 0 {
                p[[m, m]] = -((2 * m - 1) as f64) * s * p[[m - 1, m - 1]];
            }
            if m < degree {
                p[[m + 1, m]] = (2 * m + 1) as f64 * x * p[[m, m]];
            }
            for n in (m + 2)..=degree {
                p[[n, m]] = ((2 * n - 1) as f64 * x * p[[n - 1, m]]
                    - (n + m - 1) as f64 * p[[n - 2, m]])
                    / (n - m) as f64;
            }
        }

        // (x^2 - 1) dP(n,m)/dx = n x P(n,m) - (n+m) P(n-1,m), and x^2 - 1 = -sin^2(theta)
        let dp = Array2::from_shape_fn((degree + 1, degree + 1), |(n, m)| {
            if m > n {
                return 0.0;
            }
            let lower = if n > m { p[[n - 1, m]] } else { 0.0 };
            let dp_dx = (n as f64 * x * p[[n, m]] - (n + m) as f64 * lower) / (-s * s);
            -s * dp_dx
        });

        LegendreTable { p, dp, theta }
    }

    pub fn degree(&self) -> usize {
        self.p.nrows() - 1
    }

    /// The colatitude the table was evaluated at, after clamping.
    pub fn theta(&self) -> f64 {
        self.theta
    }
}
