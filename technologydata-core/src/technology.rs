//! A technology: identity fields plus named parameters.

use crate::errors::{TechDataError, TechDataResult};
use crate::parameter::Parameter;
use crate::units::UnitContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One technology in one region, year and case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technology {
    pub name: String,
    pub region: String,
    /// Year the data refers to.
    pub year: i32,
    /// Case or scenario identifier.
    pub case: String,
    pub detailed_technology: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
}

impl Technology {
    /// A technology without parameters.
    pub fn new(
        name: impl Into<String>,
        region: impl Into<String>,
        year: i32,
        case: impl Into<String>,
        detailed_technology: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            year,
            case: case.into(),
            detailed_technology: detailed_technology.into(),
            parameters: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, parameter: Parameter) -> Self {
        self.set_parameter(name, parameter);
        self
    }

    /// Looks up a parameter by name.
    ///
    /// # Errors
    ///
    /// Fails with [`TechDataError::MissingParameter`] if there is none.
    pub fn parameter(&self, name: &str) -> TechDataResult<&Parameter> {
        self.parameters
            .get(name)
            .ok_or_else(|| TechDataError::MissingParameter {
                name: name.to_string(),
                technology: self.name.clone(),
                available: self.parameters.keys().cloned().collect(),
            })
    }

    /// Inserts or replaces a parameter.
    pub fn set_parameter(&mut self, name: impl Into<String>, parameter: Parameter) {
        self.parameters.insert(name.into(), parameter);
    }

    /// The same technology in another year, without parameters.
    pub(crate) fn empty_copy(&self, year: i32) -> Self {
        Self::new(
            self.name.clone(),
            self.region.clone(),
            year,
            self.case.clone(),
            self.detailed_technology.clone(),
        )
    }

    /// Re-validates every parameter, typically after deserialization.
    pub fn canonicalize(self, ctx: &UnitContext) -> TechDataResult<Self> {
        let parameters = self
            .parameters
            .into_iter()
            .map(|(name, p)| Ok((name, p.canonicalize(ctx)?)))
            .collect::<TechDataResult<_>>()?;
        Ok(Self { parameters, ..self })
    }
}
