use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::error::{Result, SurvivalError};
use crate::event::{event_times, EventTime};

/// subjects sharing one distinct time
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGroup {
    pub time: f64,
    pub subjects: Vec<usize>, // everyone whose time is exactly `time`
    pub events: Vec<usize>,   // the subset with an observed event
}

/// cox regression input - event times plus the design matrix
#[derive(Debug, Clone)]
pub struct SurvivalData {
    events: Vec<EventTime>,
    covariates: Array2<f64>,    // n_samples x n_features, no intercept
    time_groups: Vec<TimeGroup>, // descending time, precomputed for the risk-set sweep
}

impl SurvivalData {
    /// make survival data from raw columns
    pub fn new(
        times: Vec<f64>,
        status: Vec<bool>, // true = event occurred, false = censored
        covariates: Array2<f64>,
    ) -> Result<Self> {
        let events = event_times(&times, &status)?;
        Self::from_events(events, covariates)
    }

    pub fn from_events(events: Vec<EventTime>, covariates: Array2<f64>) -> Result<Self> {
        let n_samples = events.len();

        if n_samples == 0 {
            return Err(SurvivalError::invalid_argument("survival data needs at least one subject"));
        }

        if covariates.nrows() != n_samples {
            return Err(SurvivalError::invalid_argument(format!(
                "covariates rows ({}) != n_samples ({})",
                covariates.nrows(),
                n_samples
            )));
        }

        if covariates.ncols() == 0 {
            return Err(SurvivalError::invalid_argument("design matrix has no covariate columns"));
        }

        if let Some(((i, j), value)) = covariates.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(SurvivalError::invalid_argument(format!(
                "covariate [{}, {}] is not finite ({})",
                i, j, value
            )));
        }

        let time_groups = group_by_time(&events);

        Ok(Self {
            events,
            covariates,
            time_groups,
        })
    }

    /// how many subjects
    pub fn n_samples(&self) -> usize {
        self.events.len()
    }

    /// how many covariates per subject
    pub fn n_features(&self) -> usize {
        self.covariates.ncols()
    }

    /// how many observed (uncensored) events
    pub fn n_events(&self) -> usize {
        self.events.iter().filter(|e| e.is_observed()).count()
    }

    pub fn events(&self) -> &[EventTime] {
        &self.events
    }

    pub fn times(&self) -> Array1<f64> {
        self.events.iter().map(EventTime::time).collect()
    }

    pub fn covariates(&self) -> ArrayView2<'_, f64> {
        self.covariates.view()
    }

    /// distinct times in descending order with their members
    pub fn time_groups(&self) -> &[TimeGroup] {
        &self.time_groups
    }

    /// unique event times in increasing order
    pub fn event_times(&self) -> Vec<f64> {
        let mut times: Vec<f64> = self
            .time_groups
            .iter()
            .filter(|group| !group.events.is_empty())
            .map(|group| group.time)
            .collect();
        times.reverse();
        times
    }

    /// column means, used to center the design before optimizing
    pub fn covariate_means(&self) -> Array1<f64> {
        self.covariates
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(self.n_features()))
    }

    /// grab a subset of subjects by index
    pub fn subset(&self, indices: &[usize]) -> Result<Self> {
        if indices.iter().any(|&i| i >= self.n_samples()) {
            return Err(SurvivalError::invalid_argument("subset index out of bounds"));
        }

        let events = indices.iter().map(|&i| self.events[i]).collect();
        let covariates = self.covariates.select(Axis(0), indices);

        Self::from_events(events, covariates)
    }
}

fn group_by_time(events: &[EventTime]) -> Vec<TimeGroup> {
    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by(|&a, &b| events[b].time().total_cmp(&events[a].time()));

    let mut groups: Vec<TimeGroup> = Vec::new();
    for i in order {
        let time = events[i].time();
        let starts_new_group = groups.last().map_or(true, |group| group.time != time);
        if starts_new_group {
            groups.push(TimeGroup {
                time,
                subjects: Vec::new(),
                events: Vec::new(),
            });
        }

        if let Some(group) = groups.last_mut() {
            group.subjects.push(i);
            if events[i].is_observed() {
                group.events.push(i);
            }
        }
    }

    groups
}
