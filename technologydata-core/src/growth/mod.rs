//! Growth curves fitted to parameter time series.
//!
//! A [`GrowthModel`] pairs a curve shape ([`GrowthKind`]) with a vector of
//! named parameters, each either fixed or free, and a set of observed
//! `(x, y)` data points. Free parameters are estimated by trust-region
//! least squares in [`GrowthModel::fit`]; once all
//! parameters are resolved the model can [`project`](GrowthModel::project).
//!
//! ```
//! use technologydata_core::growth::{GrowthKind, GrowthModel};
//!
//! let mut model = GrowthModel::new(GrowthKind::Linear)
//!     .with_data([(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]);
//! model.fit(None).unwrap();
//! assert!((model.project(10.0).unwrap() - 21.0).abs() < 1e-6);
//! ```

mod least_squares;
mod logistic;

pub use logistic::logistic_from_anchor;

use crate::errors::{TechDataError, TechDataResult};
use least_squares::CurveFit;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Shape of a growth curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthKind {
    /// `m * x + c`
    Linear,
    /// `A * exp(k * (x - x0))`
    Exponential,
    /// `L / (1 + exp(-k * (x - x0)))`
    Logistic,
    /// `A * exp(-b * exp(-k * (x - x0)))`
    Gompertz,
    /// `A + (K - A) / (C + Q * exp(-B * x))^(1 / nu)`
    GeneralizedLogistic,
}

impl GrowthKind {
    pub const ALL: [GrowthKind; 5] = [
        GrowthKind::Linear,
        GrowthKind::Exponential,
        GrowthKind::Logistic,
        GrowthKind::Gompertz,
        GrowthKind::GeneralizedLogistic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GrowthKind::Linear => "LinearGrowth",
            GrowthKind::Exponential => "ExponentialGrowth",
            GrowthKind::Logistic => "LogisticGrowth",
            GrowthKind::Gompertz => "GompertzGrowth",
            GrowthKind::GeneralizedLogistic => "GeneralizedLogisticGrowth",
        }
    }

    /// Parameter names in the order [`GrowthKind::evaluate`] expects them.
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            GrowthKind::Linear => &["m", "c"],
            GrowthKind::Exponential => &["A", "k", "x0"],
            GrowthKind::Logistic => &["L", "k", "x0"],
            GrowthKind::Gompertz => &["A", "b", "k", "x0"],
            GrowthKind::GeneralizedLogistic => &["A", "K", "B", "nu", "Q", "C"],
        }
    }

    /// Evaluates the curve at `x`.
    ///
    /// `params` must hold one value per entry of [`GrowthKind::parameter_names`].
    pub fn evaluate(&self, x: f64, params: &[f64]) -> f64 {
        match *self {
            GrowthKind::Linear => params[0] * x + params[1],
            GrowthKind::Exponential => params[0] * (params[1] * (x - params[2])).exp(),
            GrowthKind::Logistic => params[0] / (1.0 + (-params[1] * (x - params[2])).exp()),
            GrowthKind::Gompertz => {
                params[0] * (-params[1] * (-params[2] * (x - params[3])).exp()).exp()
            }
            GrowthKind::GeneralizedLogistic => {
                let [a, k, b, nu, q, c] = [
                    params[0], params[1], params[2], params[3], params[4], params[5],
                ];
                a + (k - a) / (c + q * (-b * x).exp()).powf(1.0 / nu)
            }
        }
    }
}

impl fmt::Display for GrowthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GrowthKind {
    type Err = TechDataError;

    /// Accepts the model name (`LogisticGrowth`) or its short form (`logistic`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        GrowthKind::ALL
            .into_iter()
            .find(|kind| {
                let name = kind.name().to_ascii_lowercase();
                lower == name || Some(lower.as_str()) == name.strip_suffix("growth")
            })
            .or(match lower.as_str() {
                "generalized_logistic" => Some(GrowthKind::GeneralizedLogistic),
                _ => None,
            })
            .ok_or_else(|| TechDataError::InvalidParameterization(format!("Unknown growth model '{s}'")))
    }
}

/// Result of [`GrowthModel::fit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitOutcome {
    /// Every parameter was already fixed; nothing was fitted.
    AlreadyResolved,
    /// The free parameters were estimated from the data.
    Fitted,
}

/// A growth curve with fixed and free parameters and observed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthModel {
    kind: GrowthKind,
    /// One entry per name of `kind.parameter_names()`; `None` is free.
    parameters: Vec<Option<f64>>,
    #[serde(default)]
    data_points: Vec<(f64, f64)>,
}

impl GrowthModel {
    /// A model with every parameter free and no data.
    pub fn new(kind: GrowthKind) -> Self {
        Self {
            kind,
            parameters: vec![None; kind.parameter_names().len()],
            data_points: Vec::new(),
        }
    }

    pub fn kind(&self) -> GrowthKind {
        self.kind
    }

    /// Fixes a parameter, consuming and returning the model.
    pub fn with_parameter(mut self, name: &str, value: f64) -> TechDataResult<Self> {
        self.set_parameter(name, Some(value))?;
        Ok(self)
    }

    /// Fixes (`Some`) or frees (`None`) a parameter.
    ///
    /// # Errors
    ///
    /// Fails with [`TechDataError::InvalidParameterization`] if the model has
    /// no parameter called `name`.
    pub fn set_parameter(&mut self, name: &str, value: Option<f64>) -> TechDataResult<()> {
        let index = self.index_of(name)?;
        self.parameters[index] = value;
        Ok(())
    }

    /// Value of a parameter; `None` if it is free or unknown.
    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.index_of(name).ok().and_then(|i| self.parameters[i])
    }

    /// Name and value of every parameter, in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = (&'static str, Option<f64>)> + '_ {
        self.kind
            .parameter_names()
            .iter()
            .copied()
            .zip(self.parameters.iter().copied())
    }

    /// Names of the free parameters.
    pub fn missing_parameters(&self) -> Vec<&'static str> {
        self.parameters()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn is_resolved(&self) -> bool {
        self.parameters.iter().all(Option::is_some)
    }

    pub fn data_points(&self) -> &[(f64, f64)] {
        &self.data_points
    }

    pub fn add_data(&mut self, x: f64, y: f64) {
        self.data_points.push((x, y));
    }

    #[must_use]
    pub fn with_data(mut self, points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        self.data_points.extend(points);
        self
    }

    /// Estimates the free parameters from the data points.
    ///
    /// Initial guesses come from `p0`, keyed by parameter name, and default
    /// to 1.0.
    ///
    /// # Errors
    ///
    /// - [`TechDataError::InvalidParameterization`] if `p0` names an unknown
    ///   or fixed parameter.
    /// - [`TechDataError::InsufficientData`] if there are fewer data points
    ///   than free parameters.
    /// - [`TechDataError::FitFailed`] if the optimization yields non-finite values.
    pub fn fit(&mut self, p0: Option<&HashMap<String, f64>>) -> TechDataResult<FitOutcome> {
        let names = self.kind.parameter_names();
        let free: Vec<usize> = (0..names.len())
            .filter(|&i| self.parameters[i].is_none())
            .collect();
        if free.is_empty() {
            log::debug!("{self} has no free parameters, skipping fit");
            return Ok(FitOutcome::AlreadyResolved);
        }

        if let Some(p0) = p0 {
            for key in p0.keys() {
                let index = self.index_of(key)?;
                if self.parameters[index].is_some() {
                    return Err(TechDataError::InvalidParameterization(format!(
                        "initial guess given for fixed parameter '{key}' of {}",
                        self.kind
                    )));
                }
            }
        }

        if self.data_points.len() < free.len() {
            return Err(TechDataError::InsufficientData {
                available: self.data_points.len(),
                required: free.len(),
            });
        }

        let initial = DVector::from_iterator(
            free.len(),
            free.iter()
                .map(|&i| p0.and_then(|p| p.get(names[i])).copied().unwrap_or(1.0)),
        );
        let template: Vec<f64> = self.parameters.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        let solution = CurveFit::new(self.kind, template, &free, &self.data_points)
            .solve(initial)
            .map_err(|e| TechDataError::FitFailed(e.to_string()))?;
        if let Some(bad) = solution.iter().position(|v| !v.is_finite()) {
            return Err(TechDataError::FitFailed(format!(
                "parameter '{}' of {} is not finite",
                names[free[bad]], self.kind
            )));
        }

        for (j, &i) in free.iter().enumerate() {
            self.parameters[i] = Some(solution[j]);
        }
        log::info!("Fitted {self} to {} data points", self.data_points.len());
        Ok(FitOutcome::Fitted)
    }

    /// Evaluates the curve at `x`.
    ///
    /// # Errors
    ///
    /// Fails with [`TechDataError::UnresolvedParameters`] naming every free
    /// parameter.
    pub fn project(&self, x: f64) -> TechDataResult<f64> {
        let values: Option<Vec<f64>> = self.parameters.iter().copied().collect();
        match values {
            Some(values) => Ok(self.kind.evaluate(x, &values)),
            None => Err(TechDataError::UnresolvedParameters(
                self.missing_parameters().into_iter().map(String::from).collect(),
            )),
        }
    }

    fn index_of(&self, name: &str) -> TechDataResult<usize> {
        self.kind
            .parameter_names()
            .iter()
            .position(|n| *n == name)
            .ok_or_else(|| {
                TechDataError::InvalidParameterization(format!(
                    "{} has no parameter '{name}', expected one of: {}",
                    self.kind,
                    self.kind.parameter_names().join(", ")
                ))
            })
    }
}

impl fmt::Display for GrowthModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self
            .parameters()
            .map(|(name, value)| match value {
                Some(v) => format!("{name}={v}"),
                None => format!("{name}=None"),
            })
            .collect();
        write!(f, "{}({})", self.kind, params.join(", "))
    }
}
