use crate::error::IgrfError;
use crate::igrf::coefficients::{CoefficientSet, CoefficientTable};
use crate::igrf::field::{CartesianField, FieldResult, GeographicField, SphericalField};
use crate::igrf::interpolation::CoefficientInterpolator;
use crate::igrf::legendre::LegendreTable;
use crate::igrf::summation::field_spherical;
use crate::utils::coordinates::{
    cartesian_to_spherical, geodetic_to_spherical, spherical_to_cartesian_vector,
    spherical_to_enu, CartesianPosition, GeodeticPosition, MagneticElements, Position,
    SphericalPosition,
};
use crate::utils::epoch::current_decimal_year;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::sync::Arc;
use tracing::{debug, instrument};

type Result<T> = std::result::Result<T, IgrfError>;

#[derive(Debug, Clone)]
struct Configured {
    epoch: f64,
    coefficients: CoefficientSet,
}

/// Evaluates the main field for one configured epoch.
///
/// A model starts unconfigured. [`FieldModel::configure`] resolves and caches the Schmidt
/// normalized coefficients of an epoch; every query then reuses them until the model is
/// configured again.
#[derive(Debug, Clone)]
pub struct FieldModel {
    interpolator: CoefficientInterpolator,
    degree: usize,
    state: Option<Configured>,
}

impl FieldModel {
    /// An unconfigured model over the embedded IGRF-12 table.
    ///
    /// # Errors
    /// Will return `Err` if the embedded table cannot be parsed.
    pub fn new() -> Result<FieldModel> {
        Ok(FieldModel::with_table(Arc::new(CoefficientTable::embedded()?)))
    }

    /// An unconfigured model over a shared coefficient table.
    pub fn with_table(table: Arc<CoefficientTable>) -> FieldModel {
        let degree = table.max_degree();
        FieldModel {
            interpolator: CoefficientInterpolator::new(table),
            degree,
            state: None,
        }
    }

    /// A model over the embedded table, configured for `epoch`.
    pub fn at_epoch(epoch: f64) -> Result<FieldModel> {
        let mut model = FieldModel::new()?;
        model.configure(epoch);
        Ok(model)
    }

    /// Sets the truncation degree used by [`FieldModel::geographic`],
    /// [`FieldModel::cartesian`] and [`FieldModel::field_at`]. Degrees above the table's
    /// maximum are reduced to it.
    pub fn with_degree(mut self, degree: usize) -> FieldModel {
        self.degree = degree.min(self.table().max_degree());
        self
    }

    /// Resolves the coefficients for `epoch` (decimal year) and caches them, replacing any
    /// previous epoch. Epochs outside the table are clamped into it.
    #[instrument(skip(self))]
    pub fn configure(&mut self, epoch: f64) {
        let epoch = self.interpolator.clamp_epoch(epoch);
        let coefficients = self.interpolator.resolve(epoch);
        debug!(epoch, degree = coefficients.degree(), "configured field model");
        self.state = Some(Configured {
            epoch,
            coefficients,
        });
    }

    /// Configures the model for the current date and returns the epoch used.
    pub fn configure_now(&mut self) -> f64 {
        self.configure(current_decimal_year());
        self.epoch().unwrap_or_default()
    }

    /// The configured epoch after clamping, if any.
    pub fn epoch(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.epoch)
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn table(&self) -> &CoefficientTable {
        self.interpolator.table()
    }

    /// The cached Schmidt normalized coefficients.
    ///
    /// # Errors
    /// Will return `Err` if the model has not been configured.
    pub fn coefficients(&self) -> Result<&CoefficientSet> {
        self.state
            .as_ref()
            .map(|s| &s.coefficients)
            .ok_or(IgrfError::Unconfigured)
    }

    fn evaluate(
        &self,
        position: &SphericalPosition,
        degree: usize,
        potential: bool,
    ) -> Result<SphericalField> {
        let coefficients = self.coefficients()?;
        let used = degree.min(coefficients.degree());
        if used != degree {
            debug!(requested = degree, used, "truncation degree above table maximum");
        }
        let legendre = LegendreTable::evaluate(used, position.theta);
        Ok(field_spherical(
            coefficients,
            &legendre,
            position.r,
            position.phi,
            used,
            potential,
        ))
    }

    /// Field at geocentric radius `r` (m), colatitude `theta` and longitude `phi` (radians).
    /// `degree` defaults to the model's truncation degree.
    ///
    /// # Errors
    /// Will return `Err` if the model has not been configured.
    pub fn spherical(
        &self,
        r: f64,
        theta: f64,
        phi: f64,
        degree: Option<usize>,
        potential: bool,
    ) -> Result<SphericalField> {
        self.evaluate(
            &SphericalPosition { r, theta, phi },
            degree.unwrap_or(self.degree),
            potential,
        )
    }

    /// Field in the local East-North-Up frame at `height` (m) above the WGS-84 ellipsoid and
    /// geodetic `latitude`, `longitude` (degrees).
    ///
    /// # Errors
    /// Will return `Err` if the model has not been configured.
    pub fn geographic(
        &self,
        height: f64,
        latitude: f64,
        longitude: f64,
        potential: bool,
    ) -> Result<GeographicField> {
        self.geographic_at(
            &GeodeticPosition {
                height,
                latitude,
                longitude,
            },
            potential,
        )
    }

    fn geographic_at(
        &self,
        position: &GeodeticPosition,
        potential: bool,
    ) -> Result<GeographicField> {
        let geocentric = geodetic_to_spherical(position);
        let field = self.evaluate(&geocentric.position, self.degree, potential)?;
        let enu = spherical_to_enu(&field.vector(), geocentric.psi);
        let (east, north, up) = (enu.x, enu.y, enu.z);
        let elements = MagneticElements::from_enu(north, east, up);
        Ok(GeographicField {
            north,
            east,
            up,
            declination: elements.declination,
            inclination: elements.inclination,
            total: elements.total,
            horizontal: elements.horizontal,
            potential: field.potential,
            degree: field.degree,
        })
    }

    /// Field in geocentric Cartesian components at Earth-centred `x`, `y`, `z` (m).
    ///
    /// # Errors
    /// Will return `Err` if the model has not been configured.
    pub fn cartesian(&self, x: f64, y: f64, z: f64, potential: bool) -> Result<CartesianField> {
        let position = cartesian_to_spherical(&CartesianPosition { x, y, z });
        let field = self.evaluate(&position, self.degree, potential)?;
        let b = spherical_to_cartesian_vector(&position, &field.vector());
        Ok(CartesianField {
            x: b.x,
            y: b.y,
            z: b.z,
            potential: field.potential,
            degree: field.degree,
        })
    }

    /// Field at `position`, in the frame the position is given in.
    ///
    /// # Errors
    /// Will return `Err` if the model has not been configured.
    pub fn field_at(&self, position: &Position, potential: bool) -> Result<FieldResult> {
        let result = match position {
            Position::Spherical(p) => {
                FieldResult::Spherical(self.evaluate(p, self.degree, potential)?)
            }
            Position::Geodetic(p) => FieldResult::Geographic(self.geographic_at(p, potential)?),
            Position::Cartesian(p) => {
                FieldResult::Cartesian(self.cartesian(p.x, p.y, p.z, potential)?)
            }
        };
        Ok(result)
    }

    /// Evaluates [`FieldModel::geographic`] for many positions in parallel.
    ///
    /// # Errors
    /// Will return `Err` if the model has not been configured.
    pub fn geographic_batch(
        &self,
        positions: &[GeodeticPosition],
        potential: bool,
    ) -> Result<Vec<GeographicField>> {
        self.coefficients()?;
        positions
            .par_iter()
            .map(|p| self.geographic_at(p, potential))
            .collect()
    }

    /// Evaluates [`FieldModel::spherical`] for many positions in parallel.
    ///
    /// # Errors
    /// Will return `Err` if the model has not been configured.
    pub fn spherical_batch(
        &self,
        positions: &[SphericalPosition],
        degree: Option<usize>,
        potential: bool,
    ) -> Result<Vec<SphericalField>> {
        self.coefficients()?;
        let degree = degree.unwrap_or(self.degree);
        positions
            .par_iter()
            .map(|p| self.evaluate(p, degree, potential))
            .collect()
    }
}
