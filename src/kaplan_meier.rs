//! Kaplan-Meier estimate of the survivor function.
//!
//! The standard error reported at each time is Greenwood's estimate for
//! `log S(t)`, not for `S(t)` itself, and confidence intervals are built on
//! the log-log scale so they always stay inside [0, 1].

use ndarray::{Array1, ArrayView1};

use crate::{
    error::{Result, SurvivalError},
    event::{event_times, EventTime},
    inference::critical_value,
    risk_set::{RiskSet, RowPolicy},
};

/// survivor function estimate at each distinct event time
#[derive(Debug, Clone, PartialEq)]
pub struct KaplanMeier {
    times: Array1<f64>,
    n_events: Vec<usize>,
    n_censored: Vec<usize>,
    n_at_risk: Vec<usize>,
    survival: Array1<f64>,
    stderr: Array1<f64>,
}

impl KaplanMeier {
    /// fit from parallel time/status columns (true = event, false = censored)
    pub fn fit(times: &[f64], status: &[bool]) -> Result<Self> {
        let events = event_times(times, status)?;
        Self::fit_events(&events)
    }

    pub fn fit_events(events: &[EventTime]) -> Result<Self> {
        Self::fit_with_policy(events, RowPolicy::EventTimes)
    }

    /// `RowPolicy::AllTimes` also reports censoring-only times
    pub fn fit_with_policy(events: &[EventTime], policy: RowPolicy) -> Result<Self> {
        if events.is_empty() {
            return Err(SurvivalError::invalid_argument(
                "kaplan-meier needs at least one observation",
            ));
        }

        let risk_set = RiskSet::build(events, policy);
        let mut survival = Vec::with_capacity(risk_set.len());
        let mut stderr = Vec::with_capacity(risk_set.len());

        let mut surv = 1.0;
        let mut greenwood = 0.0;

        for row in risk_set.rows() {
            // once everyone has died log S is undefined - freeze the variance
            if surv > 0.0 && row.n_events > 0 {
                let d = row.n_events as f64;
                let n = row.n_at_risk as f64;

                surv *= 1.0 - d / n;
                if row.n_events < row.n_at_risk {
                    greenwood += d / (n * (n - d));
                }
            }

            survival.push(surv);
            stderr.push(greenwood.sqrt());
        }

        tracing::debug!(
            n_observations = events.len(),
            n_rows = risk_set.len(),
            final_survival = surv,
            "fitted kaplan-meier"
        );

        Ok(Self {
            times: Array1::from(risk_set.times()),
            n_events: risk_set.n_events(),
            n_censored: risk_set.n_censored(),
            n_at_risk: risk_set.n_at_risk(),
            survival: Array1::from(survival),
            stderr: Array1::from(stderr),
        })
    }

    /// pointwise log-log intervals, one (lower, upper) per time
    pub fn confint(&self, alpha: f64) -> Result<Vec<(f64, f64)>> {
        let z = critical_value(alpha)?;

        Ok(self
            .survival
            .iter()
            .zip(self.stderr.iter())
            .map(|(&surv, &se)| log_log_interval(surv, se, z))
            .collect())
    }

    /// S(t) as a right-continuous step function, 1 before the first row
    pub fn survival_at(&self, time: f64) -> f64 {
        match self.times.iter().rposition(|&t| t <= time) {
            Some(i) => self.survival[i],
            None => 1.0,
        }
    }

    /// first time where the estimate drops to 0.5 or below
    pub fn median_survival(&self) -> Option<f64> {
        self.survival
            .iter()
            .position(|&s| s <= 0.5)
            .map(|i| self.times[i])
    }

    pub fn times(&self) -> ArrayView1<'_, f64> {
        self.times.view()
    }

    pub fn n_events(&self) -> &[usize] {
        &self.n_events
    }

    pub fn n_censored(&self) -> &[usize] {
        &self.n_censored
    }

    pub fn n_at_risk(&self) -> &[usize] {
        &self.n_at_risk
    }

    pub fn survival(&self) -> ArrayView1<'_, f64> {
        self.survival.view()
    }

    /// greenwood standard error of log S(t)
    pub fn stderr(&self) -> ArrayView1<'_, f64> {
        self.stderr.view()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// wald interval for log(-log S) mapped back through exp(-exp(.))
fn log_log_interval(surv: f64, se: f64, z: f64) -> (f64, f64) {
    if surv <= 0.0 {
        return (0.0, 0.0);
    }
    if surv >= 1.0 {
        return (1.0, 1.0);
    }

    let log_surv = surv.ln();
    let theta = (-log_surv).ln();
    let se_theta = se / log_surv.abs();

    // exp(-exp(.)) is decreasing so the upper theta gives the lower bound
    let lower = (-(theta + z * se_theta).exp()).exp();
    let upper = (-(theta - z * se_theta).exp()).exp();

    (lower.clamp(0.0, 1.0), upper.clamp(0.0, 1.0))
}
