use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use crate::{
    data::SurvivalData,
    error::{Result, SurvivalError},
    event::EventTime,
    inference::{critical_value, two_sided_p_value},
    optimization::{CoxOptimizer, OptimizationConfig, Ties},
};

/// builder for cox proportional hazards fits
#[derive(Debug, Clone, Default)]
pub struct CoxRegression {
    config: OptimizationConfig,
    feature_names: Option<Vec<String>>, // optional covariate labels
}

impl CoxRegression {
    /// new regression w/ defaults (efron ties, 30 iterations, tol 1e-9)
    pub fn new() -> Self {
        Self::default()
    }

    /// max newton-raphson steps before giving up
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.config.max_iterations = max_iter;
        self
    }

    /// how close is close enough for convergence
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.config.tolerance = tol;
        self
    }

    /// tie handling - changes the numbers whenever event times are tied
    pub fn with_ties(mut self, ties: Ties) -> Self {
        self.config.ties = ties;
        self
    }

    /// give names to your covariates for the coefficient table
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    /// fit the model - this does the actual work
    pub fn fit(&self, data: &SurvivalData) -> Result<CoxModel> {
        let feature_names = match &self.feature_names {
            Some(names) if names.len() != data.n_features() => {
                return Err(SurvivalError::invalid_argument(format!(
                    "got {} feature names for {} covariates",
                    names.len(),
                    data.n_features()
                )));
            }
            Some(names) => names.clone(),
            None => (0..data.n_features()).map(|j| format!("x{}", j)).collect(),
        };

        let optimizer = CoxOptimizer::new(self.config.clone());
        let result = optimizer.optimize(data)?;

        Ok(CoxModel {
            coefficients: result.coefficients,
            covariance: result.covariance,
            loglikelihood: result.loglikelihood,
            null_loglikelihood: result.null_loglikelihood,
            n_observations: data.n_samples(),
            n_events: data.n_events(),
            convergence: Convergence {
                iterations: result.iterations,
                loglik_change: result.loglik_change,
                step_norm: result.step_norm,
            },
            ties: self.config.ties,
            feature_names,
        })
    }

    /// fit straight from a design matrix and event times
    pub fn fit_matrix(&self, covariates: ArrayView2<f64>, events: &[EventTime]) -> Result<CoxModel> {
        let data = SurvivalData::from_events(events.to_vec(), covariates.to_owned())?;
        self.fit(&data)
    }
}

/// how the newton-raphson run ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Convergence {
    pub iterations: usize,
    pub loglik_change: f64, // |l(beta_k) - l(beta_k-1)| at the last step
    pub step_norm: f64,     // length of the last coefficient update
}

/// a converged cox fit - coefficients and covariance come from the same run
#[derive(Debug, Clone)]
pub struct CoxModel {
    coefficients: Array1<f64>,
    covariance: Array2<f64>,
    loglikelihood: f64,
    null_loglikelihood: f64,
    n_observations: usize,
    n_events: usize,
    convergence: Convergence,
    ties: Ties,
    feature_names: Vec<String>,
}

impl CoxModel {
    /// fit w/ default settings
    pub fn fit(covariates: ArrayView2<f64>, events: &[EventTime]) -> Result<Self> {
        CoxRegression::new().fit_matrix(covariates, events)
    }

    /// fitted coefficients (log hazard ratios)
    pub fn coefficients(&self) -> ArrayView1<'_, f64> {
        self.coefficients.view()
    }

    /// inverse observed information at the estimate
    pub fn covariance(&self) -> ArrayView2<'_, f64> {
        self.covariance.view()
    }

    pub fn stderror(&self) -> Array1<f64> {
        self.covariance.diag().mapv(f64::sqrt)
    }

    /// wald z = coefficient / stderr
    pub fn z_scores(&self) -> Array1<f64> {
        &self.coefficients / &self.stderror()
    }

    /// two-sided normal p-values for each coefficient
    pub fn p_values(&self) -> Array1<f64> {
        self.z_scores().mapv(two_sided_p_value)
    }

    /// wald intervals on the coefficients, one (lower, upper) per covariate
    pub fn confint(&self, alpha: f64) -> Result<Vec<(f64, f64)>> {
        let z = critical_value(alpha)?;

        Ok(self
            .coefficients
            .iter()
            .zip(self.stderror().iter())
            .map(|(&coef, &se)| (coef - z * se, coef + z * se))
            .collect())
    }

    /// exp(coefficients)
    pub fn hazard_ratios(&self) -> Array1<f64> {
        self.coefficients.mapv(f64::exp)
    }

    /// log partial likelihood at the estimate
    pub fn loglikelihood(&self) -> f64 {
        self.loglikelihood
    }

    /// log partial likelihood at beta = 0
    pub fn nullloglikelihood(&self) -> f64 {
        self.null_loglikelihood
    }

    /// degrees of freedom = number of coefficients
    pub fn dof(&self) -> usize {
        self.coefficients.len()
    }

    pub fn nobs(&self) -> usize {
        self.n_observations
    }

    pub fn n_events(&self) -> usize {
        self.n_events
    }

    pub fn convergence(&self) -> Convergence {
        self.convergence
    }

    /// which tie approximation produced these numbers
    pub fn ties(&self) -> Ties {
        self.ties
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// linear predictor x'beta for new subjects
    pub fn predict(&self, covariates: ArrayView2<f64>) -> Result<Array1<f64>> {
        if covariates.ncols() != self.coefficients.len() {
            return Err(SurvivalError::invalid_argument(format!(
                "feature count mismatch: expected {}, got {}",
                self.coefficients.len(),
                covariates.ncols()
            )));
        }

        Ok(covariates.dot(&self.coefficients))
    }

    /// relative hazards exp(x'beta)
    pub fn predict_hazard_ratios(&self, covariates: ArrayView2<f64>) -> Result<Array1<f64>> {
        Ok(self.predict(covariates)?.mapv(f64::exp))
    }

    /// numeric columns for a coefficient table - formatting is up to the caller
    pub fn coef_table(&self) -> CoefTable {
        CoefTable {
            names: self.feature_names.clone(),
            estimates: self.coefficients.clone(),
            stderr: self.stderror(),
            z: self.z_scores(),
            p_values: self.p_values(),
        }
    }
}

/// estimate, stderr, z and p per covariate
#[derive(Debug, Clone, PartialEq)]
pub struct CoefTable {
    pub names: Vec<String>,
    pub estimates: Array1<f64>,
    pub stderr: Array1<f64>,
    pub z: Array1<f64>,
    pub p_values: Array1<f64>,
}

/// one line of a coefficient table
#[derive(Debug, Clone, PartialEq)]
pub struct CoefRow<'a> {
    pub name: &'a str,
    pub estimate: f64,
    pub stderr: f64,
    pub z: f64,
    pub p_value: f64,
}

impl CoefTable {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = CoefRow<'_>> + '_ {
        (0..self.len()).map(move |i| CoefRow {
            name: &self.names[i],
            estimate: self.estimates[i],
            stderr: self.stderr[i],
            z: self.z[i],
            p_value: self.p_values[i],
        })
    }
}
