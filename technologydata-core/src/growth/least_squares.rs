//! Least-squares curve fitting on argmin.
//!
//! The cost is half the squared residual norm over the free parameters. The
//! trust-region solver works on the Gauss-Newton model of that cost: the
//! gradient is `Jᵀr` and the Hessian `JᵀJ`, with the Jacobian `J` taken by
//! central differences.

use super::GrowthKind;
use argmin::core::{CostFunction, Error, Executor, Gradient, Hessian, State};
use argmin::solver::trustregion::{Steihaug, TrustRegion};
use finitediff::FiniteDiff;
use nalgebra::{DMatrix, DVector};

const MAX_ITERATIONS: u64 = 1000;
/// Conjugate-gradient steps per subproblem; models have at most six parameters.
const SUBPROBLEM_ITERATIONS: u64 = 20;
/// Year-valued parameters sit far from the default initial guess of 1.0.
const MAX_RADIUS: f64 = 1e9;
const STATIONARY_GRADIENT: f64 = 1e-6;

/// Residuals of a [`GrowthKind`] against data, over its free parameters.
#[derive(Debug, Clone)]
pub(crate) struct CurveFit<'a> {
    kind: GrowthKind,
    /// Full parameter vector; free slots are overwritten on evaluation.
    template: Vec<f64>,
    free: &'a [usize],
    data: &'a [(f64, f64)],
}

impl<'a> CurveFit<'a> {
    pub(crate) fn new(
        kind: GrowthKind,
        template: Vec<f64>,
        free: &'a [usize],
        data: &'a [(f64, f64)],
    ) -> Self {
        Self {
            kind,
            template,
            free,
            data,
        }
    }

    fn residual(&self, (x, y): (f64, f64), free_values: &[f64]) -> f64 {
        let mut values = self.template.clone();
        for (&i, &value) in self.free.iter().zip(free_values) {
            values[i] = value;
        }
        self.kind.evaluate(x, &values) - y
    }

    fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(
            self.data.len(),
            self.data.iter().map(|&point| self.residual(point, p.as_slice())),
        )
    }

    fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64> {
        let point = p.as_slice().to_vec();
        let rows: Vec<Vec<f64>> = self
            .data
            .iter()
            .map(|&xy| point.central_diff(&|q: &Vec<f64>| self.residual(xy, q)))
            .collect();
        DMatrix::from_fn(rows.len(), point.len(), |i, j| rows[i][j])
    }

    /// Minimizes the squared residuals starting from `initial`.
    ///
    /// Returns the best parameters seen. Fails if the residuals are not
    /// finite at `initial` or the solver errors.
    pub(crate) fn solve(self, initial: DVector<f64>) -> Result<DVector<f64>, Error> {
        if !self.residuals(&initial).iter().all(|r| r.is_finite()) {
            return Err(Error::msg(format!(
                "residuals are not finite at the initial guess {:?}",
                initial.as_slice()
            )));
        }

        let solver = TrustRegion::new(Steihaug::new().with_max_iters(SUBPROBLEM_ITERATIONS))
            .with_radius(1.0)?
            .with_max_radius(MAX_RADIUS)?;
        let result = Executor::new(self.clone(), solver)
            .configure(|state| state.param(initial).max_iters(MAX_ITERATIONS))
            .run()?;

        let state = result.state();
        let best = state
            .get_best_param()
            .cloned()
            .ok_or_else(|| Error::msg("solver returned no parameters"))?;
        let cost = state.get_best_cost();
        let slope = self.gradient(&best)?.amax();
        if slope > STATIONARY_GRADIENT * (1.0 + cost) {
            log::warn!(
                "{} fit stopped after {} iterations away from a minimum, cost {cost}, gradient {slope}",
                self.kind,
                state.get_iter()
            );
        } else {
            log::debug!(
                "{} fit converged in {} iterations, cost {cost}",
                self.kind,
                state.get_iter()
            );
        }
        Ok(best)
    }
}

impl CostFunction for CurveFit<'_> {
    type Param = DVector<f64>;
    type Output = f64;

    /// Non-finite costs become infinite so the trust region rejects the step.
    fn cost(&self, p: &Self::Param) -> Result<Self::Output, Error> {
        let cost = 0.5 * self.residuals(p).norm_squared();
        Ok(if cost.is_finite() { cost } else { f64::INFINITY })
    }
}

impl Gradient for CurveFit<'_> {
    type Param = DVector<f64>;
    type Gradient = DVector<f64>;

    fn gradient(&self, p: &Self::Param) -> Result<Self::Gradient, Error> {
        Ok(self.jacobian(p).transpose() * self.residuals(p))
    }
}

impl Hessian for CurveFit<'_> {
    type Param = DVector<f64>;
    type Hessian = DMatrix<f64>;

    fn hessian(&self, p: &Self::Param) -> Result<Self::Hessian, Error> {
        let jacobian = self.jacobian(p);
        Ok(jacobian.transpose() * &jacobian)
    }
}
