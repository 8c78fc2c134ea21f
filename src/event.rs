use std::cmp::Ordering;
use std::fmt;

use crate::error::{Result, SurvivalError};

/// a single subject's time - either the event happened at `time` or the
/// subject was right censored there
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventTime {
    time: f64,
    observed: bool,
}

impl EventTime {
    /// time must be finite & non-negative
    pub fn new(time: f64, observed: bool) -> Result<Self> {
        if !time.is_finite() || time < 0.0 {
            return Err(SurvivalError::invalid_argument(format!(
                "event time must be finite and non-negative, got {}",
                time
            )));
        }

        // + 0.0 folds -0.0 into 0.0 so ordering and display agree
        Ok(Self {
            time: time + 0.0,
            observed,
        })
    }

    /// event observed at `time`
    pub fn observed(time: f64) -> Result<Self> {
        Self::new(time, true)
    }

    /// right censored at `time`
    pub fn censored(time: f64) -> Result<Self> {
        Self::new(time, false)
    }

    /// 0/1 status column (1 = event, 0 = censored)
    pub fn from_indicator(time: f64, indicator: i64) -> Result<Self> {
        match indicator {
            0 => Self::new(time, false),
            1 => Self::new(time, true),
            other => Err(SurvivalError::invalid_argument(format!(
                "event indicator must be 0 or 1, got {}",
                other
            ))),
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn is_observed(&self) -> bool {
        self.observed
    }

    pub fn is_censored(&self) -> bool {
        !self.observed
    }
}

// times are validated finite so the ordering is total
impl Eq for EventTime {}

impl Ord for EventTime {
    fn cmp(&self, other: &Self) -> Ordering {
        // events sort ahead of censoring at the same instant
        self.time
            .total_cmp(&other.time)
            .then_with(|| other.observed.cmp(&self.observed))
    }
}

impl PartialOrd for EventTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.observed {
            write!(f, "{}", self.time)
        } else {
            write!(f, "{}+", self.time)
        }
    }
}

/// zip parallel time/status columns into event times
pub fn event_times(times: &[f64], status: &[bool]) -> Result<Vec<EventTime>> {
    if times.len() != status.len() {
        return Err(SurvivalError::invalid_argument(format!(
            "times len ({}) != status len ({})",
            times.len(),
            status.len()
        )));
    }

    times
        .iter()
        .zip(status)
        .map(|(&time, &observed)| EventTime::new(time, observed))
        .collect()
}
