use ndarray::{Array1, Array2, ArrayView1};
use crate::{
    data::{SurvivalData, TimeGroup},
    error::{Result, SurvivalError},
    linalg::Cholesky,
};

/// Sufficient-decrease constant for step halving
const ARMIJO: f64 = 1e-4;

/// How tied event times enter the partial likelihood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ties {
    /// Each of m tied events sees the risk set minus k/m of the tied events' weight
    #[default]
    Efron,
    /// All tied events share the full risk set
    Breslow,
}

/// Configuration for the Newton-Raphson solver
#[derive(Debug, Clone)]
pub struct OptimizationConfig {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub ties: Ties,
    pub step_shrink: f64,    // factor applied when a step lowers the likelihood
    pub min_step_scale: f64, // give up halving below this
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            tolerance: 1e-9,
            ties: Ties::Efron,
            step_shrink: 0.5,
            min_step_scale: 1e-10,
        }
    }
}

impl OptimizationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(SurvivalError::invalid_argument("max_iterations must be at least 1"));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SurvivalError::invalid_argument(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if !(self.step_shrink > 0.0 && self.step_shrink < 1.0) {
            return Err(SurvivalError::invalid_argument(format!(
                "step_shrink must be in (0, 1), got {}",
                self.step_shrink
            )));
        }
        if !(self.min_step_scale > 0.0 && self.min_step_scale < 1.0) {
            return Err(SurvivalError::invalid_argument(format!(
                "min_step_scale must be in (0, 1), got {}",
                self.min_step_scale
            )));
        }
        Ok(())
    }
}

/// Log partial likelihood with its score vector and observed information
#[derive(Debug, Clone)]
pub struct Derivatives {
    pub loglik: f64,
    pub score: Array1<f64>,
    pub information: Array2<f64>,
}

/// Everything one converged Newton-Raphson run produces
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub coefficients: Array1<f64>,
    pub covariance: Array2<f64>,
    pub information: Array2<f64>,
    pub loglikelihood: f64,
    pub null_loglikelihood: f64,
    pub iterations: usize,
    pub loglik_change: f64,
    pub step_norm: f64,
}

/// Cox partial likelihood over centered covariates
pub(crate) struct PartialLikelihood<'a> {
    covariates: Array2<f64>,
    groups: &'a [TimeGroup],
    ties: Ties,
}

impl<'a> PartialLikelihood<'a> {
    /// Centering leaves beta, the likelihood and the information unchanged
    /// but keeps exp(x'beta) in range
    pub(crate) fn new(data: &'a SurvivalData, ties: Ties) -> Self {
        let means = data.covariate_means();
        let covariates = &data.covariates() - &means;

        Self {
            covariates,
            groups: data.time_groups(),
            ties,
        }
    }

    fn n_features(&self) -> usize {
        self.covariates.ncols()
    }

    /// Relative risk weights, shifted by the largest linear predictor
    fn weights(&self, beta: ArrayView1<f64>) -> (Array1<f64>, Array1<f64>) {
        let eta = self.covariates.dot(&beta);
        let shift = eta.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let eta = eta.mapv(|v| v - shift);
        let weights = eta.mapv(f64::exp);
        (eta, weights)
    }

    /// Fraction of the tied events' own weight removed for the k-th of d ties
    fn tie_fraction(&self, k: usize, d: usize) -> f64 {
        match self.ties {
            Ties::Efron => k as f64 / d as f64,
            Ties::Breslow => 0.0,
        }
    }

    /// Log partial likelihood only
    pub(crate) fn log_likelihood(&self, beta: ArrayView1<f64>) -> f64 {
        let (eta, weights) = self.weights(beta);
        let mut risk_sum = 0.0;
        let mut loglik = 0.0;

        for group in self.groups {
            for &i in &group.subjects {
                risk_sum += weights[i];
            }

            if group.events.is_empty() {
                continue;
            }

            let tied_sum: f64 = group.events.iter().map(|&i| weights[i]).sum();
            let d = group.events.len();

            for &i in &group.events {
                loglik += eta[i];
            }
            for k in 0..d {
                loglik -= (risk_sum - self.tie_fraction(k, d) * tied_sum).ln();
            }
        }

        loglik
    }

    /// Log partial likelihood, score and observed information in one sweep
    /// from the latest time backwards, so each risk set extends the previous one
    pub(crate) fn derivatives(&self, beta: ArrayView1<f64>) -> Derivatives {
        let p = self.n_features();
        let (eta, weights) = self.weights(beta);

        let mut loglik = 0.0;
        let mut score = Array1::<f64>::zeros(p);
        let mut information = Array2::<f64>::zeros((p, p));

        // risk set sums: sum w, sum w x, sum w x x'
        let mut s0 = 0.0;
        let mut s1 = Array1::<f64>::zeros(p);
        let mut s2 = Array2::<f64>::zeros((p, p));

        for group in self.groups {
            for &i in &group.subjects {
                let x = self.covariates.row(i);
                s0 += weights[i];
                s1.scaled_add(weights[i], &x);
                add_outer(&mut s2, weights[i], x);
            }

            if group.events.is_empty() {
                continue;
            }

            // same sums restricted to the tied events
            let mut t0 = 0.0;
            let mut t1 = Array1::<f64>::zeros(p);
            let mut t2 = Array2::<f64>::zeros((p, p));

            for &i in &group.events {
                let x = self.covariates.row(i);
                t0 += weights[i];
                t1.scaled_add(weights[i], &x);
                add_outer(&mut t2, weights[i], x);

                loglik += eta[i];
                score += &x;
            }

            let d = group.events.len();
            for k in 0..d {
                let frac = self.tie_fraction(k, d);
                let denom = s0 - frac * t0;
                let mean = (&s1 - &(frac * &t1)) / denom;
                let second = (&s2 - &(frac * &t2)) / denom;

                loglik -= denom.ln();
                score -= &mean;

                for a in 0..p {
                    for b in 0..p {
                        information[[a, b]] += second[[a, b]] - mean[a] * mean[b];
                    }
                }
            }
        }

        Derivatives {
            loglik,
            score,
            information,
        }
    }
}

/// target += w * x x'
fn add_outer(target: &mut Array2<f64>, w: f64, x: ArrayView1<f64>) {
    let p = x.len();
    for a in 0..p {
        let wa = w * x[a];
        for b in 0..p {
            target[[a, b]] += wa * x[b];
        }
    }
}

fn norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}

/// Newton-Raphson maximizer of the Cox partial likelihood
#[derive(Debug, Clone)]
pub struct CoxOptimizer {
    config: OptimizationConfig,
}

impl CoxOptimizer {
    pub fn new(config: OptimizationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    /// Maximize the partial likelihood starting from beta = 0
    pub fn optimize(&self, data: &SurvivalData) -> Result<OptimizationResult> {
        self.config.validate()?;

        if data.n_events() == 0 {
            return Err(SurvivalError::invalid_argument(
                "partial likelihood is undefined without observed events",
            ));
        }

        let problem = PartialLikelihood::new(data, self.config.ties);
        let tol = self.config.tolerance;

        let mut beta = Array1::<f64>::zeros(data.n_features());
        let mut current = problem.derivatives(beta.view());
        let null_loglikelihood = current.loglik;

        let mut loglik_change = f64::INFINITY;
        let mut last_step_norm = f64::INFINITY;

        for iteration in 0..=self.config.max_iterations {
            let chol = match Cholesky::factor(current.information.view()) {
                Some(chol) => chol,
                None => {
                    return Err(self.failure(
                        "information matrix is singular or not positive definite (collinear or constant covariates?)",
                        iteration,
                        current.loglik,
                        &beta,
                    ))
                }
            };
            let step = chol.solve(current.score.view());
            let step_norm = norm(&step);

            if iteration > 0 {
                let beta_norm = norm(&beta);
                let converged = loglik_change <= tol * current.loglik.abs().max(1.0)
                    || last_step_norm <= tol * (beta_norm + tol);

                if converged {
                    // a real maximum leaves almost nothing for the next step
                    if step_norm > tol.sqrt() * beta_norm.max(1.0) {
                        return Err(self.failure(
                            "coefficients are diverging; a covariate may separate events from non-events",
                            iteration,
                            current.loglik,
                            &beta,
                        ));
                    }

                    tracing::debug!(
                        iterations = iteration,
                        loglik = current.loglik,
                        null_loglik = null_loglikelihood,
                        "cox fit converged"
                    );

                    return Ok(OptimizationResult {
                        coefficients: beta,
                        covariance: chol.inverse(),
                        information: current.information,
                        loglikelihood: current.loglik,
                        null_loglikelihood,
                        iterations: iteration,
                        loglik_change,
                        step_norm: last_step_norm,
                    });
                }
            }

            if iteration == self.config.max_iterations {
                break;
            }

            // halve the step until the likelihood stops getting worse
            let slope = current.score.dot(&step);
            let slack = 64.0 * f64::EPSILON * current.loglik.abs().max(1.0);
            let mut scale = 1.0;
            let trial = loop {
                let candidate = &beta + &(scale * &step);
                let candidate_loglik = problem.log_likelihood(candidate.view());

                if candidate_loglik.is_finite()
                    && candidate_loglik >= current.loglik + ARMIJO * scale * slope - slack
                {
                    break candidate;
                }

                scale *= self.config.step_shrink;
                if scale < self.config.min_step_scale {
                    return Err(self.failure(
                        "step halving could not improve the partial likelihood",
                        iteration,
                        current.loglik,
                        &beta,
                    ));
                }
            };

            let next = problem.derivatives(trial.view());
            loglik_change = (next.loglik - current.loglik).abs();
            last_step_norm = scale * step_norm;

            tracing::debug!(
                iteration = iteration + 1,
                loglik = next.loglik,
                step_norm = last_step_norm,
                step_scale = scale,
                "newton-raphson step"
            );

            beta = trial;
            current = next;
        }

        Err(self.failure(
            "reached the iteration cap without converging",
            self.config.max_iterations,
            current.loglik,
            &beta,
        ))
    }

    fn failure(&self, reason: &str, iterations: usize, loglik: f64, beta: &Array1<f64>) -> SurvivalError {
        tracing::warn!(iterations, loglik, reason, "cox fit failed");
        SurvivalError::convergence_failure(reason, iterations, loglik, beta.to_vec())
    }
}
