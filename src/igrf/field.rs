use indexmap::IndexMap;
use nalgebra::Vector3;

/// Magnetic field in geocentric spherical components, nanotesla.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalField {
    pub r: f64,                 // radial, outward
    pub theta: f64,             // along increasing colatitude (southward)
    pub phi: f64,               // along increasing longitude (eastward)
    pub potential: Option<f64>, // nT m
    pub degree: usize,          // truncation degree actually used
}

impl SphericalField {
    pub fn total(&self) -> f64 {
        self.vector().norm()
    }

    /// `(Br, Btheta, Bphi)`
    pub fn vector(&self) -> Vector3<f64> {
        Vector3::new(self.r, self.theta, self.phi)
    }

    pub fn components(&self) -> IndexMap<&'static str, f64> {
        let mut map = IndexMap::from([("r", self.r), ("theta", self.theta), ("phi", self.phi)]);
        if let Some(v) = self.potential {
            map.insert("V", v);
        }
        map
    }
}

/// Magnetic field in the local geodetic East-North-Up frame, nanotesla, with the derived
/// magnetic elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeographicField {
    pub north: f64,
    pub east: f64,
    pub up: f64,
    pub declination: f64, // degrees east of north
    pub inclination: f64, // degrees, positive upward
    pub total: f64,
    pub horizontal: f64,
    pub potential: Option<f64>,
    pub degree: usize,
}

impl GeographicField {
    pub fn components(&self) -> IndexMap<&'static str, f64> {
        let mut map = IndexMap::from([
            ("north", self.north),
            ("east", self.east),
            ("up", self.up),
            ("declination", self.declination),
            ("inclination", self.inclination),
            ("field", self.total),
            ("horizontal", self.horizontal),
        ]);
        if let Some(v) = self.potential {
            map.insert("V", v);
        }
        map
    }
}

/// Magnetic field in geocentric Cartesian components (z along the rotation axis, x through
/// the Greenwich meridian), nanotesla.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianField {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub potential: Option<f64>,
    pub degree: usize,
}

impl CartesianField {
    pub fn total(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn components(&self) -> IndexMap<&'static str, f64> {
        let mut map = IndexMap::from([("x", self.x), ("y", self.y), ("z", self.z)]);
        if let Some(v) = self.potential {
            map.insert("V", v);
        }
        map
    }
}

/// Field expressed in the frame that matches the position it was requested at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldResult {
    Spherical(SphericalField),
    Geographic(GeographicField),
    Cartesian(CartesianField),
}

impl FieldResult {
    pub fn components(&self) -> IndexMap<&'static str, f64> {
        match self {
            FieldResult::Spherical(f) => f.components(),
            FieldResult::Geographic(f) => f.components(),
            FieldResult::Cartesian(f) => f.components(),
        }
    }

    pub fn degree(&self) -> usize {
        match self {
            FieldResult::Spherical(f) => f.degree,
            FieldResult::Geographic(f) => f.degree,
            FieldResult::Cartesian(f) => f.degree,
        }
    }

    pub fn total(&self) -> f64 {
        match self {
            FieldResult::Spherical(f) => f.total(),
            FieldResult::Geographic(f) => f.total,
            FieldResult::Cartesian(f) => f.total(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_order() {
        let field = GeographicField {
            north: 1.0,
            east: 2.0,
            up: 3.0,
            declination: 4.0,
            inclination: 5.0,
            total: 6.0,
            horizontal: 7.0,
            potential: None,
            degree: 13,
        };
        let keys: Vec<&str> = field.components().keys().copied().collect();
        assert_eq!(
            keys,
            ["north", "east", "up", "declination", "inclination", "field", "horizontal"]
        );

        let spherical = SphericalField {
            r: 3.0,
            theta: 0.0,
            phi: 4.0,
            potential: Some(-1.0),
            degree: 13,
        };
        let result = FieldResult::Spherical(spherical);
        assert_eq!(result.total(), 5.0);
        assert_eq!(result.components().get("V"), Some(&-1.0));
        assert_eq!(result.components().len(), 4);
    }
}
