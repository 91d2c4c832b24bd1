//! Ordered collections of technologies, with growth-curve fitting and projection.

use crate::errors::{TechDataError, TechDataResult};
use crate::growth::{GrowthKind, GrowthModel};
use crate::parameter::Parameter;
use crate::technology::Technology;
use crate::units::UnitContext;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// Note attached to placeholder parameters.
pub const NAN_PLACEHOLDER_NOTE: &str = "Placeholder parameters with NaN value.";

/// How to project one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// Fit the model to the collection and evaluate it.
    Model(GrowthModel),
    /// The mean over the collection.
    Mean,
    /// A placeholder with a NaN magnitude.
    #[serde(rename = "nan")]
    NaN,
    /// The value of the closest year. Not implemented.
    Closest,
}

/// What to do with parameters that have no [`Projection`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepRemaining {
    /// Leave them out of the projected technologies.
    #[default]
    Omit,
    #[serde(rename = "nan")]
    NaN,
    Mean,
    Closest,
}

/// Case-insensitive regex patterns for [`TechnologyCollection::get`].
///
/// Patterns match anywhere in the field; unset patterns match everything.
#[derive(Debug, Clone, Default)]
pub struct TechnologyFilter {
    name: Option<String>,
    region: Option<String>,
    year: Option<String>,
    case: Option<String>,
    detailed_technology: Option<String>,
}

impl TechnologyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, pattern: impl Into<String>) -> Self {
        self.name = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn region(mut self, pattern: impl Into<String>) -> Self {
        self.region = Some(pattern.into());
        self
    }

    /// Matched against the decimal year, e.g. `"20[34]0"`.
    #[must_use]
    pub fn year(mut self, pattern: impl Into<String>) -> Self {
        self.year = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn case(mut self, pattern: impl Into<String>) -> Self {
        self.case = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn detailed_technology(mut self, pattern: impl Into<String>) -> Self {
        self.detailed_technology = Some(pattern.into());
        self
    }
}

fn compile(pattern: &Option<String>) -> TechDataResult<Option<Regex>> {
    pattern
        .as_deref()
        .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
        .transpose()
        .map_err(TechDataError::from)
}

/// An ordered sequence of technologies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechnologyCollection {
    technologies: Vec<Technology>,
}

impl TechnologyCollection {
    pub fn new(technologies: Vec<Technology>) -> Self {
        Self { technologies }
    }

    pub fn technologies(&self) -> &[Technology] {
        &self.technologies
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Technology> {
        self.technologies.iter()
    }

    pub fn len(&self) -> usize {
        self.technologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }

    pub fn push(&mut self, technology: Technology) {
        self.technologies.push(technology);
    }

    /// Names of all parameters of all technologies.
    pub fn parameter_names(&self) -> BTreeSet<String> {
        self.technologies
            .iter()
            .flat_map(|t| t.parameters.keys().cloned())
            .collect()
    }

    /// Technologies matching every pattern of `filter`, in order.
    ///
    /// # Errors
    ///
    /// Fails with [`TechDataError::InvalidPattern`] for an invalid regex.
    pub fn get(&self, filter: &TechnologyFilter) -> TechDataResult<Self> {
        let name = compile(&filter.name)?;
        let region = compile(&filter.region)?;
        let year = compile(&filter.year)?;
        let case = compile(&filter.case)?;
        let detailed = compile(&filter.detailed_technology)?;

        let hit = |pattern: &Option<Regex>, value: &str| {
            pattern.as_ref().map_or(true, |p| p.is_match(value))
        };
        let technologies = self
            .technologies
            .iter()
            .filter(|t| {
                hit(&name, &t.name)
                    && hit(&region, &t.region)
                    && hit(&year, &t.year.to_string())
                    && hit(&case, &t.case)
                    && hit(&detailed, &t.detailed_technology)
            })
            .cloned()
            .collect();
        Ok(Self { technologies })
    }

    /// Fits `model` to the `(year, magnitude)` series of one parameter.
    ///
    /// Technologies without the parameter are skipped.
    ///
    /// # Errors
    ///
    /// - [`TechDataError::EmptyCollection`] for an empty collection.
    /// - [`TechDataError::IncompatibleParameters`] if any parameter differs
    ///   from the first one in carrier, heating value or unit dimension.
    /// - Any error of [`GrowthModel::fit`].
    pub fn fit(
        &self,
        ctx: &UnitContext,
        parameter: &str,
        mut model: GrowthModel,
        p0: Option<&HashMap<String, f64>>,
    ) -> TechDataResult<GrowthModel> {
        if self.technologies.is_empty() {
            return Err(TechDataError::EmptyCollection("fit"));
        }

        let mut reference: Option<&Parameter> = None;
        for tech in &self.technologies {
            let Some(param) = tech.parameters.get(parameter) else {
                log::debug!(
                    "Parameter '{parameter}' not in technology '{}' ({}), skipping",
                    tech.name,
                    tech.year
                );
                continue;
            };
            let reference = *reference.get_or_insert(param);
            if !reference.is_compatible(ctx, param)? {
                return Err(TechDataError::IncompatibleParameters {
                    first: reference.to_string(),
                    other: param.to_string(),
                });
            }
            model.add_data(f64::from(tech.year), param.magnitude());
        }

        model.fit(p0)?;
        Ok(model)
    }

    /// Projects the collection to each of `to_years`.
    ///
    /// Each projected technology copies the identity fields of the first
    /// technology. Parameters projected by a model are copies of the first
    /// available parameter of that name with the projected magnitude,
    /// provenance `"Projected to {year} using {model}."`, and no note or
    /// sources. Parameters without an entry in `projections` are handled
    /// according to `keep_remaining`.
    ///
    /// # Errors
    ///
    /// - [`TechDataError::EmptyCollection`] for an empty collection.
    /// - [`TechDataError::NotImplemented`] for [`Projection::Closest`] or
    ///   [`KeepRemaining::Closest`].
    /// - Any error of [`TechnologyCollection::fit`].
    pub fn project(
        &self,
        ctx: &UnitContext,
        to_years: &[i32],
        projections: &BTreeMap<String, Projection>,
        keep_remaining: KeepRemaining,
    ) -> TechDataResult<Self> {
        let Some(template) = self.technologies.first() else {
            return Err(TechDataError::EmptyCollection("project"));
        };

        let mut plan = projections.clone();
        let remaining = match keep_remaining {
            KeepRemaining::Omit => None,
            KeepRemaining::NaN => Some(Projection::NaN),
            KeepRemaining::Mean => Some(Projection::Mean),
            KeepRemaining::Closest => Some(Projection::Closest),
        };
        if let Some(remaining) = remaining {
            for name in self.parameter_names() {
                plan.entry(name).or_insert_with(|| remaining.clone());
            }
        }
        log::debug!("Projecting parameters as follows: {plan:?}");

        // Models are fitted once; projecting a fitted model is pure
        let mut fitted: Vec<(&str, Option<(GrowthModel, &Parameter)>)> = Vec::with_capacity(plan.len());
        for (name, projection) in &plan {
            let model = match projection {
                Projection::Model(model) => model.clone(),
                Projection::Mean => mean_model()?,
                Projection::NaN => {
                    fitted.push((name.as_str(), None));
                    continue;
                }
                Projection::Closest => {
                    return Err(TechDataError::NotImplemented(
                        "Projection to the closest year".to_string(),
                    ))
                }
            };
            let model = self.fit(ctx, name, model, None)?;
            let base = self.first_parameter(name)?;
            fitted.push((name.as_str(), Some((model, base))));
        }

        let mut technologies = Vec::with_capacity(to_years.len());
        for &year in to_years {
            let mut tech = template.empty_copy(year);
            for (name, entry) in &fitted {
                let param = match entry {
                    Some((model, base)) => {
                        let magnitude = model.project(f64::from(year))?;
                        log::debug!("Resulting model for {name} in year {year}: {model}");
                        base.with_magnitude(magnitude)
                            .with_provenance(Some(format!("Projected to {year} using {model}.")))
                            .with_note(None)
                            .with_sources(Default::default())
                    }
                    None => Parameter::builder(f64::NAN)
                        .note(NAN_PLACEHOLDER_NOTE)
                        .build(ctx)?,
                };
                tech.set_parameter(*name, param);
            }
            technologies.push(tech);
        }
        Ok(Self { technologies })
    }

    /// Reads a collection from a JSON array of technologies.
    pub fn from_json(ctx: &UnitContext, json: &str) -> TechDataResult<Self> {
        let raw: Vec<Technology> = serde_json::from_str(json)?;
        let technologies = raw
            .into_iter()
            .map(|t| t.canonicalize(ctx))
            .collect::<TechDataResult<_>>()?;
        Ok(Self { technologies })
    }

    pub fn from_file(ctx: &UnitContext, path: impl AsRef<Path>) -> TechDataResult<Self> {
        Self::from_json(ctx, &std::fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> TechDataResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> TechDataResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    fn first_parameter(&self, name: &str) -> TechDataResult<&Parameter> {
        match self.technologies.iter().find_map(|t| t.parameters.get(name)) {
            Some(param) => Ok(param),
            None => self.technologies[0].parameter(name),
        }
    }
}

/// A linear model with zero slope fits the mean of its data.
fn mean_model() -> TechDataResult<GrowthModel> {
    GrowthModel::new(GrowthKind::Linear).with_parameter("m", 0.0)
}

impl FromIterator<Technology> for TechnologyCollection {
    fn from_iter<I: IntoIterator<Item = Technology>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TechnologyCollection {
    type Item = &'a Technology;
    type IntoIter = std::slice::Iter<'a, Technology>;

    fn into_iter(self) -> Self::IntoIter {
        self.technologies.iter()
    }
}
