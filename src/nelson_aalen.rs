//! Nelson-Aalen estimate of the cumulative hazard.

use ndarray::{Array1, ArrayView1};

use crate::{
    error::{Result, SurvivalError},
    event::{event_times, EventTime},
    inference::critical_value,
    risk_set::{RiskSet, RowPolicy},
};

/// cumulative hazard estimate at each distinct event time
#[derive(Debug, Clone, PartialEq)]
pub struct NelsonAalen {
    times: Array1<f64>,
    n_events: Vec<usize>,
    n_censored: Vec<usize>,
    n_at_risk: Vec<usize>,
    chaz: Array1<f64>,
    stderr: Array1<f64>,
}

impl NelsonAalen {
    /// fit from parallel time/status columns (true = event, false = censored)
    pub fn fit(times: &[f64], status: &[bool]) -> Result<Self> {
        let events = event_times(times, status)?;
        Self::fit_events(&events)
    }

    pub fn fit_events(events: &[EventTime]) -> Result<Self> {
        Self::fit_with_policy(events, RowPolicy::EventTimes)
    }

    pub fn fit_with_policy(events: &[EventTime], policy: RowPolicy) -> Result<Self> {
        if events.is_empty() {
            return Err(SurvivalError::invalid_argument(
                "nelson-aalen needs at least one observation",
            ));
        }

        let risk_set = RiskSet::build(events, policy);
        let mut chaz = Vec::with_capacity(risk_set.len());
        let mut stderr = Vec::with_capacity(risk_set.len());

        let mut hazard = 0.0;
        let mut variance = 0.0;

        for row in risk_set.rows() {
            let d = row.n_events as f64;
            let n = row.n_at_risk as f64;

            hazard += d / n;
            variance += d * (n - d) / (n * n * n);

            chaz.push(hazard);
            stderr.push(variance.sqrt());
        }

        tracing::debug!(
            n_observations = events.len(),
            n_rows = risk_set.len(),
            final_chaz = hazard,
            "fitted nelson-aalen"
        );

        Ok(Self {
            times: Array1::from(risk_set.times()),
            n_events: risk_set.n_events(),
            n_censored: risk_set.n_censored(),
            n_at_risk: risk_set.n_at_risk(),
            chaz: Array1::from(chaz),
            stderr: Array1::from(stderr),
        })
    }

    /// pointwise wald intervals, lower bound clamped at 0
    pub fn confint(&self, alpha: f64) -> Result<Vec<(f64, f64)>> {
        let z = critical_value(alpha)?;

        Ok(self
            .chaz
            .iter()
            .zip(self.stderr.iter())
            .map(|(&h, &se)| ((h - z * se).max(0.0), h + z * se))
            .collect())
    }

    /// H(t) as a right-continuous step function, 0 before the first row
    pub fn cumulative_hazard_at(&self, time: f64) -> f64 {
        match self.times.iter().rposition(|&t| t <= time) {
            Some(i) => self.chaz[i],
            None => 0.0,
        }
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

    pub fn chaz(&self) -> ArrayView1<'_, f64> {
        self.chaz.view()
    }

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
