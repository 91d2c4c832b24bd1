//! Python bindings, importable as `technologydata._lib`.
//!
//! All parameters share one bundled [`UnitContext`]. Currency conversion
//! goes through a `CurrencyResolver` built from deflation tables.

use pyo3::exceptions::{PyKeyError, PyNotImplementedError, PyValueError};
use pyo3::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use technologydata_core::currency::{self, CurrencyResolver, DeflationSource, TableDeflator};
use technologydata_core::growth::{FitOutcome, GrowthKind, GrowthModel};
use technologydata_core::parameter::Parameter;
use technologydata_core::units::UnitContext;
use technologydata_core::TechDataError;

static CONTEXT: LazyLock<UnitContext> = LazyLock::new(UnitContext::bundled);

/// Maps errors onto the Python exception classes users expect.
fn to_py_err(err: TechDataError) -> PyErr {
    match err {
        TechDataError::UnknownDeflationSource(_) | TechDataError::UnknownCurrencyCode(_) => {
            PyKeyError::new_err(err.to_string())
        }
        TechDataError::NotSupported(_) | TechDataError::NotImplemented(_) => {
            PyNotImplementedError::new_err(err.to_string())
        }
        _ => PyValueError::new_err(err.to_string()),
    }
}

fn parse_source(source: Option<&str>) -> PyResult<Option<DeflationSource>> {
    source.map(str::parse).transpose().map_err(to_py_err)
}

/// Memoized currency conversion rates from deflator and exchange-rate tables.
///
/// Example:
///     resolver = CurrencyResolver('{"worldbank": {"deflators": {...}}}', default_source="imf")
///     capex.change_currency(resolver, "EUR_2023", "DEU")
#[pyclass]
#[pyo3(name = "CurrencyResolver")]
#[derive(Debug)]
pub struct PyCurrencyResolver(pub CurrencyResolver);

impl PyCurrencyResolver {
    fn with_tables(deflator: TableDeflator, default_source: Option<&str>) -> PyResult<Self> {
        let resolver = CurrencyResolver::new(Arc::clone(CONTEXT.currency_codes()), deflator);
        Ok(Self(match parse_source(default_source)? {
            Some(source) => resolver.with_default_source(source),
            None => resolver,
        }))
    }
}

#[pymethods]
impl PyCurrencyResolver {
    /// Build from deflation tables serialized as JSON
    #[new]
    #[pyo3(signature = (tables_json, default_source=None))]
    fn new(tables_json: &str, default_source: Option<&str>) -> PyResult<Self> {
        let deflator = TableDeflator::from_json(tables_json).map_err(to_py_err)?;
        Self::with_tables(deflator, default_source)
    }

    /// Build from a JSON file of deflation tables
    #[staticmethod]
    #[pyo3(signature = (path, default_source=None))]
    fn from_file(path: PathBuf, default_source: Option<&str>) -> PyResult<Self> {
        let deflator = TableDeflator::from_file(&path).map_err(to_py_err)?;
        Self::with_tables(deflator, default_source)
    }

    #[getter]
    fn default_source(&self) -> String {
        self.0.default_source().to_string()
    }

    /// Number of rates looked up so far
    #[getter]
    fn memoized(&self) -> usize {
        self.0.memoized()
    }

    fn __repr__(&self) -> String {
        format!("{:?}", self.0)
    }
}

/// A magnitude with units, carrier and heating value.
///
/// Example:
///     capex = Parameter(1000, units="EUR_2020/kW", carrier="H2", heating_value="LHV")
///     capex.to("EUR_2020/MW").magnitude  # 1e6
#[pyclass]
#[pyo3(name = "Parameter")]
#[derive(Debug, Clone)]
pub struct PyParameter(pub Parameter);

#[pymethods]
impl PyParameter {
    #[new]
    #[pyo3(signature = (magnitude, units=None, carrier=None, heating_value=None, provenance=None, note=None))]
    fn new(
        magnitude: f64,
        units: Option<String>,
        carrier: Option<String>,
        heating_value: Option<String>,
        provenance: Option<String>,
        note: Option<String>,
    ) -> PyResult<Self> {
        let mut builder = Parameter::builder(magnitude);
        if let Some(units) = units {
            builder = builder.units(units);
        }
        if let Some(carrier) = carrier {
            builder = builder.carrier(carrier);
        }
        if let Some(heating_value) = heating_value {
            builder = builder.heating_value(heating_value);
        }
        if let Some(provenance) = provenance {
            builder = builder.provenance(provenance);
        }
        if let Some(note) = note {
            builder = builder.note(note);
        }
        builder.build(&CONTEXT).map(Self).map_err(to_py_err)
    }

    #[getter]
    fn magnitude(&self) -> f64 {
        self.0.magnitude()
    }

    #[getter]
    fn units(&self) -> Option<String> {
        self.0.units().map(String::from)
    }

    #[getter]
    fn carrier(&self) -> Option<String> {
        self.0.carrier().map(String::from)
    }

    #[getter]
    fn heating_value(&self) -> Option<String> {
        self.0.heating_value().map(String::from)
    }

    #[getter]
    fn provenance(&self) -> Option<String> {
        self.0.provenance().map(String::from)
    }

    #[getter]
    fn note(&self) -> Option<String> {
        self.0.note().map(String::from)
    }

    /// Convert to other units of the same dimension and currency
    fn to(&self, units: &str) -> PyResult<Self> {
        self.0.to(&CONTEXT, units).map(Self).map_err(to_py_err)
    }

    /// Convert every currency-year token to `to_currency` with `country` prices
    #[pyo3(signature = (resolver, to_currency, country, source=None))]
    fn change_currency(
        &self,
        resolver: &PyCurrencyResolver,
        to_currency: &str,
        country: &str,
        source: Option<&str>,
    ) -> PyResult<Self> {
        let source = parse_source(source)?;
        self.0
            .change_currency(&CONTEXT, &resolver.0, to_currency, country, source)
            .map(Self)
            .map_err(to_py_err)
    }

    /// Move every currency-year token to `to_year`, keeping its currency
    #[pyo3(signature = (resolver, to_year, country, source=None))]
    fn adjust_inflation(
        &self,
        resolver: &PyCurrencyResolver,
        to_year: i32,
        country: &str,
        source: Option<&str>,
    ) -> PyResult<Self> {
        let source = parse_source(source)?;
        self.0
            .adjust_inflation(&CONTEXT, &resolver.0, to_year, country, source)
            .map(Self)
            .map_err(to_py_err)
    }

    /// Rescale to another heating value ("LHV" or "HHV")
    fn change_heating_value(&self, heating_value: &str) -> PyResult<Self> {
        self.0
            .change_heating_value(&CONTEXT, heating_value)
            .map(Self)
            .map_err(to_py_err)
    }

    fn __add__(&self, other: &Self) -> PyResult<Self> {
        self.0.checked_add(&CONTEXT, &other.0).map(Self).map_err(to_py_err)
    }

    fn __sub__(&self, other: &Self) -> PyResult<Self> {
        self.0.checked_sub(&CONTEXT, &other.0).map(Self).map_err(to_py_err)
    }

    fn __mul__(&self, other: &Self) -> PyResult<Self> {
        self.0.checked_mul(&CONTEXT, &other.0).map(Self).map_err(to_py_err)
    }

    fn __truediv__(&self, other: &Self) -> PyResult<Self> {
        self.0.checked_div(&CONTEXT, &other.0).map(Self).map_err(to_py_err)
    }

    fn __pow__(&self, exponent: i32, _modulo: Option<PyObject>) -> PyResult<Self> {
        self.0.pow(&CONTEXT, exponent).map(Self).map_err(to_py_err)
    }

    fn __eq__(&self, other: &Self) -> bool {
        self.0 == other.0
    }

    fn __repr__(&self) -> String {
        format!("Parameter({})", self.0)
    }
}

/// A growth curve with fixed and free parameters.
///
/// Example:
///     model = GrowthModel("linear", data_points=[(0, 1), (1, 3), (2, 5)])
///     model.fit()
///     model.project(10)  # ~21
#[pyclass]
#[pyo3(name = "GrowthModel")]
#[derive(Debug, Clone)]
pub struct PyGrowthModel(pub GrowthModel);

#[pymethods]
impl PyGrowthModel {
    #[new]
    #[pyo3(signature = (kind, parameters=None, data_points=None))]
    fn new(
        kind: &str,
        parameters: Option<HashMap<String, f64>>,
        data_points: Option<Vec<(f64, f64)>>,
    ) -> PyResult<Self> {
        let kind: GrowthKind = kind.parse().map_err(to_py_err)?;
        let mut model = GrowthModel::new(kind).with_data(data_points.unwrap_or_default());
        for (name, value) in parameters.unwrap_or_default() {
            model.set_parameter(&name, Some(value)).map_err(to_py_err)?;
        }
        Ok(Self(model))
    }

    #[getter]
    fn parameters(&self) -> HashMap<String, Option<f64>> {
        self.0
            .parameters()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    #[getter]
    fn missing_parameters(&self) -> Vec<String> {
        self.0
            .missing_parameters()
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[getter]
    fn data_points(&self) -> Vec<(f64, f64)> {
        self.0.data_points().to_vec()
    }

    fn add_data(&mut self, x: f64, y: f64) {
        self.0.add_data(x, y);
    }

    /// Fit the free parameters; returns False if nothing was free
    #[pyo3(signature = (p0=None))]
    fn fit(&mut self, p0: Option<HashMap<String, f64>>) -> PyResult<bool> {
        let outcome = self.0.fit(p0.as_ref()).map_err(to_py_err)?;
        Ok(outcome == FitOutcome::Fitted)
    }

    fn project(&self, x: f64) -> PyResult<f64> {
        self.0.project(x).map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        self.0.to_string()
    }
}

/// Currency-year tokens of a unit string, in order of appearance
#[pyfunction]
fn extract_currency_tokens(unit: &str) -> PyResult<Vec<String>> {
    currency::extract_currency_tokens(unit, CONTEXT.currency_codes()).map_err(to_py_err)
}

#[pymodule]
#[pyo3(name = "_lib")]
fn technologydata(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add_class::<PyParameter>()?;
    m.add_class::<PyGrowthModel>()?;
    m.add_class::<PyCurrencyResolver>()?;
    m.add_function(wrap_pyfunction!(extract_currency_tokens, m)?)?;
    Ok(())
}
