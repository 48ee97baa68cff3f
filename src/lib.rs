//! Evaluation of the International Geomagnetic Reference Field (IGRF), the spherical
//! harmonic model of the Earth's main magnetic field.
//!
//! ```no_run
//! use igrfield::igrf::model::FieldModel;
//!
//! let model = FieldModel::at_epoch(2000.0)?;
//! let field = model.geographic(0.0, 51.0, 123.0, false)?;
//! println!("declination {:.2} deg", field.declination);
//! # Ok::<(), igrfield::error::IgrfError>(())
//! ```

pub mod error;

pub mod igrf {
    pub mod coefficients;
    pub mod field;
    pub mod interpolation;
    pub mod legendre;
    pub mod model;
    pub mod summation;
}

pub mod utils {
    pub mod constants;
    pub mod coordinates;
    pub mod epoch;
}

#[cfg(feature = "python")]
mod python;

pub use error::IgrfError;
pub use igrf::coefficients::CoefficientTable;
pub use igrf::field::{CartesianField, FieldResult, GeographicField, SphericalField};
pub use igrf::model::FieldModel;
pub use utils::coordinates::{
    CartesianPosition, GeodeticPosition, Position, PositionInput, SphericalPosition,
};
