use crate::igrf::coefficients::CoefficientSet;
use crate::igrf::field::SphericalField;
use crate::igrf::legendre::LegendreTable;
use crate::utils::constants::EARTH_RADIUS;
use ndarray::{s, Array1};

/// Sums the spherical harmonic expansion of the internal field at geocentric spherical
/// position (`r` metres, `theta` colatitude and `phi` longitude in radians).
///
/// `coeffs` must already be Schmidt normalized and `legendre` must be evaluated at `theta`.
/// The expansion is truncated at `degree`, which is reduced to the highest degree both
/// inputs carry. The degree actually used is reported in the result.
///
/// With `a = EARTH_RADIUS` and `C(n, m) = g cos(m phi) + h sin(m phi)`:
/// ```text
/// Br     =  sum (n+1) (a/r)^(n+2) C(n,m) P(n,m)
/// Btheta = -sum       (a/r)^(n+2) C(n,m) dP(n,m)
/// Bphi   = -sum       (a/r)^(n+2) m (-g sin(m phi) + h cos(m phi)) P(n,m) / sin(theta)
/// V      =  sum     a (a/r)^(n+1) C(n,m) P(n,m)
/// ```
pub fn field_spherical(
    coeffs: &CoefficientSet,
    legendre: &LegendreTable,
    r: f64,
    phi: f64,
    degree: usize,
    potential: bool,
) -> SphericalField {
    let degree = degree.min(coeffs.degree()).min(legendre.degree());
    let theta = legendre.theta();

    let g = coeffs.g.slice(s![..=degree, ..=degree]);
    let h = coeffs.h.slice(s![..=degree, ..=degree]);
    let p = legendre.p.slice(s![..=degree, ..=degree]);
    let dp = legendre.dp.slice(s![..=degree, ..=degree]);

    let index = Array1::from_shape_fn(degree + 1, |k| k as f64);
    let cos_mphi = index.mapv(|m| (m * phi).cos());
    let sin_mphi = index.mapv(|m| (m * phi).sin());

    let ratio = EARTH_RADIUS / r;
    // (a/r)^(n+2) per degree
    let radial = index.mapv(|n| ratio.powi(n as i32 + 2));

    let gp = &g * &p;
    let hp = &h * &p;
    // Sum over order for every degree
    let order_sum = gp.dot(&cos_mphi) + hp.dot(&sin_mphi);
    let dtheta_sum = (&g * &dp).dot(&cos_mphi) + (&h * &dp).dot(&sin_mphi);
    let dphi_sum = hp.dot(&(&index * &cos_mphi)) - gp.dot(&(&index * &sin_mphi));

    let br = order_sum.dot(&((&index + 1.0) * &radial));
    let btheta = -dtheta_sum.dot(&radial);
    let bphi = -dphi_sum.dot(&radial) / theta.sin();
    let potential = potential.then(|| EARTH_RADIUS * order_sum.dot(&(&radial / ratio)));

    SphericalField {
        r: br,
        theta: btheta,
        phi: bphi,
        potential,
        degree,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::igrf::coefficients::CoefficientTable;
    use crate::igrf::interpolation::CoefficientInterpolator;
    use std::sync::Arc;

    /// Straightforward double loop over (n, m)
    fn reference_sum(
        coeffs: &CoefficientSet,
        legendre: &LegendreTable,
        r: f64,
        phi: f64,
        degree: usize,
    ) -> (f64, f64, f64, f64) {
        let theta = legendre.theta();
        let (mut br, mut bt, mut bp, mut v) = (0.0, 0.0, 0.0, 0.0);
        for n in 1..=degree {
            let ratio = (EARTH_RADIUS / r).powi(n as i32 + 2);
            for m in 0..=n {
                let (g, h) = (coeffs.g[[n, m]], coeffs.h[[n, m]]);
                let (p, dp) = (legendre.p[[n, m]], legendre.dp[[n, m]]);
                let mphi = m as f64 * phi;
                let c = g * mphi.cos() + h * mphi.sin();
                br += (n + 1) as f64 * ratio * c * p;
                bt += ratio * c * dp;
                bp += ratio * m as f64 * (-g * mphi.sin() + h * mphi.cos()) * p;
                v += EARTH_RADIUS * (EARTH_RADIUS / r).powi(n as i32 + 1) * c * p;
            }
        }
        (br, -bt, -bp / theta.sin(), v)
    }

    fn coefficients(epoch: f64) -> CoefficientSet {
        CoefficientInterpolator::new(Arc::new(CoefficientTable::embedded().unwrap()))
            .resolve(epoch)
    }

    #[test]
    fn matches_reference_sum() {
        let coeffs = coefficients(2003.7);
        let positions = [
            (6_371_200.0, 0.3, 1.2),
            (6_500_000.0, 1.5, -2.0),
            (12_742_400.0, 2.9, 5.5),
            (6_400_000.0, 0.0, 0.1),
        ];
        for (r, theta, phi) in positions {
            let legendre = LegendreTable::evaluate(13, theta);
            for degree in [1, 5, 13] {
                let field = field_spherical(&coeffs, &legendre, r, phi, degree, true);
                let (br, bt, bp, v) = reference_sum(&coeffs, &legendre, r, phi, degree);
                let v_field = field.potential.unwrap();
                assert!((field.r - br).abs() < 1e-8 * br.abs().max(1.0));
                assert!((field.theta - bt).abs() < 1e-8 * bt.abs().max(1.0));
                assert!((field.phi - bp).abs() < 1e-8 * bp.abs().max(1.0));
                assert!((v_field - v).abs() < 1e-8 * v.abs().max(1.0));
                assert_eq!(field.degree, degree);
            }
        }
    }

    #[test]
    fn axial_dipole() {
        let g10 = -30_000.0;
        let mut coeffs = CoefficientSet::zeros(1);
        coeffs.g[[1, 0]] = g10;

        let theta: f64 = 0.8;
        let r = 2.0 * EARTH_RADIUS;
        let legendre = LegendreTable::evaluate(1, theta);
        let field = field_spherical(&coeffs, &legendre, r, 0.4, 1, true);
        let scale = 0.125;

        assert!((field.r - 2.0 * g10 * theta.cos() * scale).abs() < 1e-9);
        assert!((field.theta - g10 * theta.sin() * scale).abs() < 1e-9);
        assert!(field.phi.abs() < 1e-12);
        let v = EARTH_RADIUS * g10 * theta.cos() * 0.25;
        assert!((field.potential.unwrap() - v).abs() < 1e-9 * v.abs());
    }

    #[test]
    fn degree_is_limited_by_inputs() {
        let coeffs = coefficients(2000.0);
        let legendre = LegendreTable::evaluate(13, 1.0);
        let field = field_spherical(&coeffs, &legendre, EARTH_RADIUS, 0.0, 20, false);
        assert_eq!(field.degree, 13);
        assert_eq!(field.potential, None);

        let low = LegendreTable::evaluate(4, 1.0);
        let field = field_spherical(&coeffs, &low, EARTH_RADIUS, 0.0, 13, false);
        assert_eq!(field.degree, 4);
    }

    #[test]
    fn monopole_only_gives_zero_field() {
        let coeffs = coefficients(2000.0);
        let legendre = LegendreTable::evaluate(13, 1.0);
        let field = field_spherical(&coeffs, &legendre, EARTH_RADIUS, 0.3, 0, true);
        assert_eq!(field.degree, 0);
        assert_eq!(field.r, 0.0);
        assert_eq!(field.theta, 0.0);
        assert_eq!(field.phi, 0.0);
        assert_eq!(field.potential, Some(0.0));
    }
}
