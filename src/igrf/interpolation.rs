use crate::igrf::coefficients::{CoefficientSet, CoefficientTable};
use is_close::is_close;
use ndarray::Array2;
use std::sync::Arc;
use tracing::debug;

/// Schmidt quasi-normalization factors, indexed `[[n, m]]`.
///
/// `S[n, m] = (-1)^m * sqrt((2 - delta_m0) * (n - m)! / (n + m)!)` for `m <= n`, zero otherwise.
/// The `(-1)^m` removes the Condon-Shortley phase carried by [`crate::igrf::legendre`], so
/// normalized coefficients times those Legendre functions give Schmidt semi-normalized
/// harmonics.
#[derive(Debug, Clone)]
pub struct SchmidtNorm {
    factors: Array2<f64>,
}

impl SchmidtNorm {
    pub fn new(degree: usize) -> SchmidtNorm {
        let factors = Array2::from_shape_fn((degree + 1, degree + 1), |(n, m)| {
            if m > n {
                return 0.0;
            }
            // (n - m)! / (n + m)! without forming either factorial
            let ratio: f64 = ((n - m + 1)..=(n + m)).map(|k| 1.0 / k as f64).product();
            let weight = if m == 0 { 1.0 } else { 2.0 };
            let sign = if m % 2 == 0 { 1.0 } else { -1.0 };
            sign * (weight * ratio).sqrt()
        });
        SchmidtNorm { factors }
    }

    pub fn factors(&self) -> &Array2<f64> {
        &self.factors
    }

    pub fn apply(&self, set: &CoefficientSet) -> CoefficientSet {
        CoefficientSet {
            g: &set.g * &self.factors,
            h: &set.h * &self.factors,
        }
    }
}

/// Produces the working coefficient set for an epoch from a shared [`CoefficientTable`].
#[derive(Debug, Clone)]
pub struct CoefficientInterpolator {
    table: Arc<CoefficientTable>,
    norm: SchmidtNorm,
}

impl CoefficientInterpolator {
    pub fn new(table: Arc<CoefficientTable>) -> CoefficientInterpolator {
        let norm = SchmidtNorm::new(table.max_degree());
        CoefficientInterpolator { table, norm }
    }

    pub fn table(&self) -> &CoefficientTable {
        &self.table
    }

    pub fn norm(&self) -> &SchmidtNorm {
        &self.norm
    }

    /// Clamps `epoch` into the range the table can describe. Out of range epochs are not an
    /// error.
    pub fn clamp_epoch(&self, epoch: f64) -> f64 {
        let (min, max) = (self.table.min_epoch(), self.table.max_epoch());
        let clamped = epoch.clamp(min, max);
        if clamped != epoch {
            debug!(epoch, clamped, "epoch outside of table range, clamping");
        }
        clamped
    }

    /// Schmidt quasi-normalized coefficients for `epoch`.
    pub fn resolve(&self, epoch: f64) -> CoefficientSet {
        self.norm.apply(&self.resolve_raw(epoch))
    }

    /// Coefficients for `epoch` as tabulated, before normalization.
    ///
    /// Between two tabulated epochs the coefficients are interpolated linearly. After the
    /// last tabulated epoch they are extrapolated with the secular variation rate.
    pub fn resolve_raw(&self, epoch: f64) -> CoefficientSet {
        let epoch = self.clamp_epoch(epoch);
        if let Ok(set) = self.table.coefficients_at(epoch) {
            return set.clone();
        }

        let epochs = self.table.epochs_available();
        let last = epochs.len() - 1;
        if epoch > epochs[last] {
            let sv = self.table.secular_variation();
            let base = self.table.set(last);
            let years = epoch - epochs[last];
            return CoefficientSet {
                g: &base.g + &(&sv.rate.g * years),
                h: &base.h + &(&sv.rate.h * years),
            };
        }

        // epochs[i] <= epoch < epochs[i + 1]
        let i = epochs.partition_point(|&e| e <= epoch).saturating_sub(1);
        let (y0, y1) = (epochs[i], epochs[i + 1]);
        let fraction = if is_close!(y0, y1) {
            0.0
        } else {
            (epoch - y0) / (y1 - y0)
        };
        let (c0, c1) = (self.table.set(i), self.table.set(i + 1));
        CoefficientSet {
            g: &c0.g + &((&c1.g - &c0.g) * fraction),
            h: &c0.h + &((&c1.h - &c0.h) * fraction),
        }
    }
}
