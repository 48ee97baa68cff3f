use crate::error::IgrfError;
use crate::utils::constants::{DEG_TO_RAD, RAD_TO_DEG, WGS84_A2, WGS84_B2};
use indexmap::IndexMap;
use itertools::Itertools;
use nalgebra::{Matrix3, Vector3};

type Result<T> = std::result::Result<T, IgrfError>;

/// Geocentric spherical position: radius (m), colatitude and east longitude (radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalPosition {
    pub r: f64,
    pub theta: f64,
    pub phi: f64,
}

/// Position over the WGS-84 ellipsoid: height (m), geodetic latitude and longitude (degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodeticPosition {
    pub height: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Earth-centred Cartesian position (m), z along the rotation axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    Spherical(SphericalPosition),
    Geodetic(GeodeticPosition),
    Cartesian(CartesianPosition),
}

/// A geocentric position plus `psi`, the angle between the geodetic and geocentric
/// latitude (radians). `psi` is zero for positions that were not geodetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeocentricPosition {
    pub position: SphericalPosition,
    pub psi: f64,
}

impl Position {
    pub fn geocentric(&self) -> GeocentricPosition {
        match self {
            Position::Spherical(p) => GeocentricPosition {
                position: *p,
                psi: 0.0,
            },
            Position::Geodetic(p) => geodetic_to_spherical(p),
            Position::Cartesian(p) => GeocentricPosition {
                position: cartesian_to_spherical(p),
                psi: 0.0,
            },
        }
    }

    /// The coordinates as given, followed by the geocentric `r`, `theta` and `phi` the
    /// field is evaluated at, and `psi` for geodetic positions.
    pub fn components(&self) -> IndexMap<&'static str, f64> {
        let mut map = match self {
            Position::Spherical(_) => IndexMap::new(),
            Position::Geodetic(p) => IndexMap::from([
                ("height", p.height),
                ("latitude", p.latitude),
                ("longitude", p.longitude),
            ]),
            Position::Cartesian(p) => IndexMap::from([("x", p.x), ("y", p.y), ("z", p.z)]),
        };
        let geocentric = self.geocentric();
        map.insert("r", geocentric.position.r);
        map.insert("theta", geocentric.position.theta);
        map.insert("phi", geocentric.position.phi);
        if let Position::Geodetic(_) = self {
            map.insert("psi", geocentric.psi);
        }
        map
    }
}

/// Loosely specified coordinates, as they arrive from the command line or Python keyword
/// arguments. Exactly one triple must be complete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionInput {
    pub r: Option<f64>,
    pub theta: Option<f64>,
    pub phi: Option<f64>,
    pub height: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    /// Names of any unrecognised coordinates that were supplied
    pub unknown: Vec<String>,
}

fn complete_triple(values: [Option<f64>; 3], names: [&str; 3]) -> Result<Option<[f64; 3]>> {
    match values {
        [Some(a), Some(b), Some(c)] => Ok(Some([a, b, c])),
        [None, None, None] => Ok(None),
        _ => Err(IgrfError::AmbiguousCoordinateInput(format!(
            "Incomplete coordinates, all of {} are required together",
            names.join(", ")
        ))),
    }
}

impl TryFrom<PositionInput> for Position {
    type Error = IgrfError;

    fn try_from(input: PositionInput) -> Result<Position> {
        if !input.unknown.is_empty() {
            Err(IgrfError::AmbiguousCoordinateInput(format!(
                "Unrecognised coordinates: {}",
                input.unknown.join(", ")
            )))?
        }
        let spherical = complete_triple([input.r, input.theta, input.phi], ["r", "theta", "phi"])?
            .map(|[r, theta, phi]| Position::Spherical(SphericalPosition { r, theta, phi }));
        let geodetic = complete_triple(
            [input.height, input.latitude, input.longitude],
            ["height", "latitude", "longitude"],
        )?
        .map(|[height, latitude, longitude]| {
            Position::Geodetic(GeodeticPosition {
                height,
                latitude,
                longitude,
            })
        });
        let cartesian = complete_triple([input.x, input.y, input.z], ["x", "y", "z"])?
            .map(|[x, y, z]| Position::Cartesian(CartesianPosition { x, y, z }));

        [spherical, geodetic, cartesian]
            .into_iter()
            .flatten()
            .exactly_one()
            .map_err(|rest| {
                let msg = match rest.count() {
                    0 => "No coordinates given, expected one of (r, theta, phi), (height, latitude, longitude) or (x, y, z)".to_string(),
                    n => format!("{n} coordinate triples given, expected exactly one"),
                };
                IgrfError::AmbiguousCoordinateInput(msg)
            })
    }
}

/// Converts a geodetic position into geocentric spherical coordinates over the WGS-84
/// ellipsoid, keeping `psi` for the inverse rotation of field vectors.
pub fn geodetic_to_spherical(position: &GeodeticPosition) -> GeocentricPosition {
    let lat = position.latitude * DEG_TO_RAD;
    let (sin_lat, cos_lat) = lat.sin_cos();
    let height = position.height;

    // Prime vertical radius of curvature
    let n = WGS84_A2 / (WGS84_A2 * cos_lat * cos_lat + WGS84_B2 * sin_lat * sin_lat).sqrt();
    // Distance from the rotation axis and height above the equatorial plane
    let p = (n + height) * cos_lat;
    let z = (WGS84_B2 / WGS84_A2 * n + height) * sin_lat;

    let beta = z.atan2(p);
    GeocentricPosition {
        position: SphericalPosition {
            r: p.hypot(z),
            theta: std::f64::consts::FRAC_PI_2 - beta,
            phi: position.longitude * DEG_TO_RAD,
        },
        psi: lat - beta,
    }
}

/// Inverse of [`geodetic_to_spherical`], by fixed point iteration on the geodetic latitude.
pub fn spherical_to_geodetic(position: &SphericalPosition) -> GeodeticPosition {
    let (sin_theta, cos_theta) = position.theta.sin_cos();
    let p = position.r * sin_theta;
    let z = position.r * cos_theta;
    let ratio = WGS84_B2 / WGS84_A2;

    let mut lat = z.atan2(p * ratio);
    let mut height = 0.0;
    for _ in 0..100 {
        let (sin_lat, cos_lat) = lat.sin_cos();
        let n = WGS84_A2 / (WGS84_A2 * cos_lat * cos_lat + WGS84_B2 * sin_lat * sin_lat).sqrt();
        height = p * cos_lat + z * sin_lat - WGS84_A2 / n;
        let next = (z * (n + height)).atan2(p * (ratio * n + height));
        let converged = (next - lat).abs() < 1e-15;
        lat = next;
        if converged {
            break;
        }
    }

    GeodeticPosition {
        height,
        latitude: lat * RAD_TO_DEG,
        longitude: position.phi * RAD_TO_DEG,
    }
}

pub fn cartesian_to_spherical(position: &CartesianPosition) -> SphericalPosition {
    let CartesianPosition { x, y, z } = *position;
    let rho = x.hypot(y);
    SphericalPosition {
        r: rho.hypot(z),
        theta: rho.atan2(z),
        phi: y.atan2(x),
    }
}

pub fn spherical_to_cartesian(position: &SphericalPosition) -> CartesianPosition {
    let (sin_theta, cos_theta) = position.theta.sin_cos();
    let (sin_phi, cos_phi) = position.phi.sin_cos();
    CartesianPosition {
        x: position.r * sin_theta * cos_phi,
        y: position.r * sin_theta * sin_phi,
        z: position.r * cos_theta,
    }
}

/// Rotation taking `(Br, Btheta, Bphi)` into local `(East, North, Up)`.
fn enu_rotation(psi: f64) -> Matrix3<f64> {
    let (sin_psi, cos_psi) = psi.sin_cos();
    Matrix3::new(
        0.0, 0.0, 1.0, //
        -sin_psi, -cos_psi, 0.0, //
        cos_psi, -sin_psi, 0.0,
    )
}

/// Rotation taking `(Br, Btheta, Bphi)` at `position` into `(Bx, By, Bz)`.
fn cartesian_rotation(position: &SphericalPosition) -> Matrix3<f64> {
    let (st, ct) = position.theta.sin_cos();
    let (sp, cp) = position.phi.sin_cos();
    Matrix3::new(
        st * cp, ct * cp, -sp, //
        st * sp, ct * sp, cp, //
        ct, -st, 0.0,
    )
}

/// Rotates a spherical field vector `(Br, Btheta, Bphi)` into the local geodetic frame,
/// returned as `(East, North, Up)`.
pub fn spherical_to_enu(field: &Vector3<f64>, psi: f64) -> Vector3<f64> {
    enu_rotation(psi) * field
}

/// Rotates `(East, North, Up)` back into `(Br, Btheta, Bphi)`.
pub fn enu_to_spherical(field: &Vector3<f64>, psi: f64) -> Vector3<f64> {
    enu_rotation(psi).transpose() * field
}

pub fn spherical_to_cartesian_vector(
    position: &SphericalPosition,
    field: &Vector3<f64>,
) -> Vector3<f64> {
    cartesian_rotation(position) * field
}

pub fn cartesian_to_spherical_vector(
    position: &SphericalPosition,
    field: &Vector3<f64>,
) -> Vector3<f64> {
    cartesian_rotation(position).transpose() * field
}

/// Total intensity, horizontal intensity, declination and inclination of a field vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagneticElements {
    pub total: f64,
    pub horizontal: f64,
    /// Degrees east of north
    pub declination: f64,
    /// Degrees above the horizontal
    pub inclination: f64,
}

impl MagneticElements {
    pub fn from_enu(north: f64, east: f64, up: f64) -> MagneticElements {
        let horizontal = north.hypot(east);
        MagneticElements {
            total: horizontal.hypot(up),
            horizontal,
            declination: east.atan2(north) * RAD_TO_DEG,
            inclination: up.atan2(horizontal) * RAD_TO_DEG,
        }
    }
}
