use igrfield::igrf::coefficients::CoefficientTable;
use igrfield::igrf::interpolation::CoefficientInterpolator;
use igrfield::utils::constants::EARTH_RADIUS;
use igrfield::utils::coordinates::{geodetic_to_spherical, spherical_to_cartesian};
use igrfield::{FieldModel, FieldResult, GeodeticPosition, IgrfError, Position, PositionInput};
use std::sync::Arc;

fn assert_near(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{actual} differs from {expected} by more than {tolerance}"
    );
}

#[test]
fn north_pole_at_2000() {
    let model = FieldModel::at_epoch(2000.0).unwrap();
    let field = model
        .spherical(EARTH_RADIUS, 1e-6, 0.0, None, true)
        .unwrap();
    assert_near(field.r, -55954.7, 1.0);
    assert_near(field.theta, -1785.1, 1.0);
    assert_near(field.phi, -881.0, 1.0);
    assert_near(field.potential.unwrap(), -1.88942e11, 1e6);
    assert_eq!(field.degree, 13);

    // The pole itself is clamped to the same colatitude
    let at_pole = model.spherical(EARTH_RADIUS, 0.0, 0.0, None, true).unwrap();
    assert_eq!(at_pole, field);
}

#[test]
fn equator_at_2000() {
    // World Data Center for Geomagnetism, Kyoto: X 27464.9, Y -3504.2, Z -14827.8
    let model = FieldModel::at_epoch(2000.0).unwrap();
    let field = model.geographic(0.0, 0.0, 0.0, false).unwrap();
    assert_near(field.north, 27464.9, 1.0);
    assert_near(field.east, -3504.2, 1.0);
    assert_near(field.up, 14827.8, 1.0);
    assert_near(field.declination, -7.27, 0.01);
    assert_near(field.inclination, 28.17, 0.01);
    assert_near(field.horizontal, 27687.6, 1.0);
    assert_near(field.total, 31408.0, 1.0);
}

#[test]
fn mid_latitude_at_altitude() {
    // World Data Center for Geomagnetism, Kyoto: X 20743.7, Y -3988.6, Z 53964.9
    let model = FieldModel::at_epoch(2000.0).unwrap();
    let field = model.geographic(9876.0, 51.0, 123.0, false).unwrap();
    assert_near(field.north, 20743.7, 1.0);
    assert_near(field.east, -3988.6, 1.0);
    assert_near(field.up, -53964.9, 1.0);
}

#[test]
fn extrapolated_epoch() {
    let model = FieldModel::at_epoch(2017.5).unwrap();
    let field = model.geographic(0.0, 45.0, -75.0, false).unwrap();
    assert_near(field.north, 17928.3, 1.0);
    assert_near(field.east, -4326.0, 1.0);
    assert_near(field.up, -50580.4, 1.0);
}

#[test]
fn cartesian_at_north_pole() {
    let model = FieldModel::at_epoch(2000.0).unwrap();
    let spherical = model.spherical(EARTH_RADIUS, 0.0, 0.0, None, false).unwrap();
    let cartesian = model.cartesian(0.0, 0.0, EARTH_RADIUS, false).unwrap();
    // On the +z axis with phi = 0, theta points along +x and phi along +y
    assert_near(cartesian.x, spherical.theta, 1e-9);
    assert_near(cartesian.y, spherical.phi, 1e-9);
    assert_near(cartesian.z, spherical.r, 1e-9);
}

#[test]
fn magnitude_is_frame_independent() {
    let model = FieldModel::at_epoch(1987.2).unwrap();
    for (height, latitude, longitude) in [
        (0.0, 0.0, 0.0),
        (350e3, -64.0, 200.0),
        (-100.0, 12.0, -33.0),
        (20e6, 80.0, 45.0),
    ] {
        let geodetic = GeodeticPosition {
            height,
            latitude,
            longitude,
        };
        let geocentric = geodetic_to_spherical(&geodetic);
        let xyz = spherical_to_cartesian(&geocentric.position);

        let enu = model.geographic(height, latitude, longitude, true).unwrap();
        let cartesian = model.cartesian(xyz.x, xyz.y, xyz.z, true).unwrap();
        let spherical = model
            .field_at(&Position::Spherical(geocentric.position), true)
            .unwrap();

        assert_near(enu.total, cartesian.total(), 1e-6 * enu.total);
        assert_near(enu.total, spherical.total(), 1e-6 * enu.total);
        assert_near(
            enu.potential.unwrap(),
            cartesian.potential.unwrap(),
            1e-6 * enu.potential.unwrap().abs(),
        );
    }
}

#[test]
fn truncation_corrections_decrease() {
    let model = FieldModel::at_epoch(2000.0).unwrap();
    let grid: Vec<(f64, f64)> = (0..6)
        .flat_map(|i| (0..12).map(move |j| (15.0 + 30.0 * i as f64, 30.0 * j as f64)))
        .map(|(t, p): (f64, f64)| (t.to_radians(), p.to_radians()))
        .collect();

    let rms: Vec<f64> = (1..=13)
        .map(|degree| {
            let sum: f64 = grid
                .iter()
                .map(|&(theta, phi)| {
                    let r = 2.0 * EARTH_RADIUS;
                    let hi = model.spherical(r, theta, phi, Some(degree), false).unwrap();
                    let lo = model.spherical(r, theta, phi, Some(degree - 1), false).unwrap();
                    (hi.vector() - lo.vector()).norm_squared()
                })
                .sum();
            (sum / grid.len() as f64).sqrt()
        })
        .collect();

    for pair in rms.windows(2) {
        assert!(pair[1] < pair[0], "corrections {rms:?} do not decrease");
    }
}

#[test]
fn clamped_epochs() {
    let interp = CoefficientInterpolator::new(Arc::new(CoefficientTable::embedded().unwrap()));
    assert_eq!(interp.resolve(1850.0), interp.resolve(1900.0));
    assert_eq!(interp.resolve(2100.0), interp.resolve(2020.0));

    let early = FieldModel::at_epoch(1850.0).unwrap();
    let first = FieldModel::at_epoch(1900.0).unwrap();
    assert_eq!(
        early.geographic(0.0, 30.0, 30.0, false).unwrap(),
        first.geographic(0.0, 30.0, 30.0, false).unwrap()
    );
}

#[test]
fn position_input_dispatch() {
    let model = FieldModel::at_epoch(2000.0).unwrap();
    let input = PositionInput {
        x: Some(0.0),
        y: Some(0.0),
        z: Some(EARTH_RADIUS),
        ..Default::default()
    };
    let result = model
        .field_at(&Position::try_from(input).unwrap(), false)
        .unwrap();
    assert!(matches!(result, FieldResult::Cartesian(_)));
    assert_eq!(result.components().keys().copied().collect::<Vec<_>>(), ["x", "y", "z"]);

    let input = PositionInput {
        height: Some(0.0),
        latitude: Some(0.0),
        r: Some(EARTH_RADIUS),
        ..Default::default()
    };
    assert!(matches!(
        Position::try_from(input),
        Err(IgrfError::AmbiguousCoordinateInput(_))
    ));
}

#[test]
fn table_from_file() {
    let path = std::env::temp_dir().join(format!("igrfield-table-{}.txt", std::process::id()));
    std::fs::write(
        &path,
        "g/h n m 2000.0 2005.0 2005-10\ng 1 0 -30000.0 -29000.0 100.0\ng 1 1 0.0 0.0 0.0\nh 1 1 0.0 0.0 0.0\n",
    )
    .unwrap();
    let table = CoefficientTable::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let mut model = FieldModel::with_table(Arc::new(table));
    model.configure(2002.5);
    assert_eq!(model.epoch(), Some(2002.5));

    // Axial dipole of -29500 nT at the equator points north with strength g10
    let field = model.spherical(EARTH_RADIUS, std::f64::consts::FRAC_PI_2, 0.0, None, false).unwrap();
    assert_eq!(field.degree, 1);
    assert_near(field.theta, -29500.0, 1e-6);
    assert_near(field.r, 0.0, 1e-9);

    model.configure(2030.0);
    assert_eq!(model.epoch(), Some(2010.0));

    let missing = CoefficientTable::from_file("/nonexistent/igrf.txt").unwrap_err();
    assert!(matches!(&missing, IgrfError::Io { path, .. } if path.ends_with("igrf.txt")));
    assert!(missing.to_string().contains("/nonexistent/igrf.txt"));
}
