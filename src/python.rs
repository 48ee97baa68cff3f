use crate::igrf::coefficients::CoefficientTable;
use crate::igrf::field::FieldResult;
use crate::igrf::model::FieldModel;
use crate::utils::constants::{EARTH_RADIUS, MAX_DEGREE};
use crate::utils::coordinates::{
    CartesianPosition, GeodeticPosition, Position, PositionInput, SphericalPosition,
};
use crate::utils::epoch::current_decimal_year;
use indexmap::IndexMap;
use itertools::izip;
use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::path::PathBuf;
use std::sync::Arc;

/// IGRF main field model bound to one epoch.
#[pyclass(name = "IgrfModel")]
struct PyFieldModel {
    model: FieldModel,
}

/// Field components plus the `degree` and `year` the result was computed with, and the
/// evaluated `position` with its geocentric coordinates.
fn result_dict<'py>(
    py: Python<'py>,
    result: &FieldResult,
    position: &Position,
    epoch: Option<f64>,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    for (name, value) in result.components() {
        dict.set_item(name, value)?;
    }
    dict.set_item("position", position.components())?;
    dict.set_item("degree", result.degree())?;
    dict.set_item("year", epoch)?;
    Ok(dict)
}

#[pymethods]
impl PyFieldModel {
    #[new]
    #[pyo3(signature = (year=None, degree=None, coefficients=None))]
    fn new(
        year: Option<f64>,
        degree: Option<usize>,
        coefficients: Option<PathBuf>,
    ) -> PyResult<Self> {
        let table = match coefficients {
            Some(path) => CoefficientTable::from_file(path)?,
            None => CoefficientTable::embedded()?,
        };
        let mut model = FieldModel::with_table(Arc::new(table));
        if let Some(degree) = degree {
            model = model.with_degree(degree);
        }
        model.configure(year.unwrap_or_else(current_decimal_year));
        Ok(PyFieldModel { model })
    }

    /// Configures a new epoch, the current date when `year` is None. Returns the epoch used.
    #[pyo3(signature = (year=None))]
    fn set_year(&mut self, year: Option<f64>) -> Option<f64> {
        self.model.configure(year.unwrap_or_else(current_decimal_year));
        self.model.epoch()
    }

    #[getter]
    fn year(&self) -> Option<f64> {
        self.model.epoch()
    }

    #[getter]
    fn degree(&self) -> usize {
        self.model.degree()
    }

    #[getter]
    fn epochs(&self) -> Vec<f64> {
        self.model.table().epochs_available().to_vec()
    }

    #[pyo3(signature = (r, theta, phi, degree=None, potential=false))]
    fn spherical<'py>(
        &self,
        py: Python<'py>,
        r: f64,
        theta: f64,
        phi: f64,
        degree: Option<usize>,
        potential: bool,
    ) -> PyResult<Bound<'py, PyDict>> {
        let field = self.model.spherical(r, theta, phi, degree, potential)?;
        let position = Position::Spherical(SphericalPosition { r, theta, phi });
        result_dict(py, &FieldResult::Spherical(field), &position, self.model.epoch())
    }

    #[pyo3(signature = (height, latitude, longitude, potential=false))]
    fn geographic<'py>(
        &self,
        py: Python<'py>,
        height: f64,
        latitude: f64,
        longitude: f64,
        potential: bool,
    ) -> PyResult<Bound<'py, PyDict>> {
        let field = self.model.geographic(height, latitude, longitude, potential)?;
        let position = Position::Geodetic(GeodeticPosition {
            height,
            latitude,
            longitude,
        });
        result_dict(py, &FieldResult::Geographic(field), &position, self.model.epoch())
    }

    #[pyo3(signature = (x, y, z, potential=false))]
    fn cartesian<'py>(
        &self,
        py: Python<'py>,
        x: f64,
        y: f64,
        z: f64,
        potential: bool,
    ) -> PyResult<Bound<'py, PyDict>> {
        let field = self.model.cartesian(x, y, z, potential)?;
        let position = Position::Cartesian(CartesianPosition { x, y, z });
        result_dict(py, &FieldResult::Cartesian(field), &position, self.model.epoch())
    }

    /// Field at exactly one of `r, theta, phi`, `height, latitude, longitude` or `x, y, z`,
    /// in the matching frame.
    #[pyo3(signature = (potential=false, **coordinates))]
    fn field<'py>(
        &self,
        py: Python<'py>,
        potential: bool,
        coordinates: Option<&Bound<'py, PyDict>>,
    ) -> PyResult<Bound<'py, PyDict>> {
        let mut input = PositionInput::default();
        if let Some(coordinates) = coordinates {
            for (key, value) in coordinates.iter() {
                let key: String = key.extract()?;
                let slot = match key.as_str() {
                    "r" => &mut input.r,
                    "theta" => &mut input.theta,
                    "phi" => &mut input.phi,
                    "height" => &mut input.height,
                    "latitude" => &mut input.latitude,
                    "longitude" => &mut input.longitude,
                    "x" => &mut input.x,
                    "y" => &mut input.y,
                    "z" => &mut input.z,
                    _ => {
                        input.unknown.push(key.clone());
                        continue;
                    }
                };
                *slot = Some(value.extract()?);
            }
        }
        let position = Position::try_from(input)?;
        let result = self.model.field_at(&position, potential)?;
        result_dict(py, &result, &position, self.model.epoch())
    }

    /// Geographic field for arrays of heights (m), latitudes and longitudes (deg), evaluated
    /// in parallel. Returns one array per component.
    fn geographic_array<'py>(
        &self,
        py: Python<'py>,
        height: PyReadonlyArray1<'py, f64>,
        latitude: PyReadonlyArray1<'py, f64>,
        longitude: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<IndexMap<&'static str, Bound<'py, PyArray1<f64>>>> {
        let (height, latitude, longitude) =
            (height.as_array(), latitude.as_array(), longitude.as_array());
        if height.len() != latitude.len() || height.len() != longitude.len() {
            Err(PyValueError::new_err(format!(
                "Arrays differ in length: height {}, latitude {}, longitude {}",
                height.len(),
                latitude.len(),
                longitude.len()
            )))?
        }
        let positions: Vec<GeodeticPosition> = izip!(height, latitude, longitude)
            .map(|(&height, &latitude, &longitude)| GeodeticPosition {
                height,
                latitude,
                longitude,
            })
            .collect();
        let model = &self.model;
        let fields = py.allow_threads(|| model.geographic_batch(&positions, false))?;

        let mut columns: IndexMap<&'static str, Vec<f64>> = IndexMap::new();
        for field in &fields {
            for (name, value) in field.components() {
                columns.entry(name).or_default().push(value);
            }
        }
        Ok(columns
            .into_iter()
            .map(|(name, values)| (name, PyArray1::from_vec_bound(py, values)))
            .collect())
    }
}

/// International Geomagnetic Reference Field evaluation.
#[pymodule]
fn igrfield(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyFieldModel>()?;
    m.add("EARTH_RADIUS", EARTH_RADIUS)?;
    m.add("MAX_DEGREE", MAX_DEGREE)?;

    Ok(())
}
