/// IGRF reference radius of the Earth, metres
pub const EARTH_RADIUS: f64 = 6_371_200.0;

// WGS-84 ellipsoid, a = 6378.137 km, b = 6356.752 km
pub const WGS84_A2: f64 = 40_680_631.6e6; // m^2
pub const WGS84_B2: f64 = 40_408_296.0e6; // m^2

/// Highest degree carried by the embedded coefficient table
pub const MAX_DEGREE: usize = 13;

/// Colatitudes are kept this far (radians) from the geographic poles
pub const POLE_EPSILON: f64 = 1.0e-6;

pub const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;
pub const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;
