//! Ordered risk-set rows shared by the Kaplan-Meier and Nelson-Aalen
//! estimators.

use crate::event::EventTime;

/// which distinct times become rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowPolicy {
    /// only times with at least one observed event
    #[default]
    EventTimes,
    /// every distinct observed time, censoring-only times included
    AllTimes,
}

/// counts at one distinct time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskSetRow {
    pub time: f64,
    pub n_events: usize,
    pub n_censored: usize,
    pub n_at_risk: usize,
}

/// risk-set rows in increasing time order
#[derive(Debug, Clone, PartialEq)]
pub struct RiskSet {
    rows: Vec<RiskSetRow>,
    n_observations: usize,
}

impl RiskSet {
    /// sort the observations and walk them once, grouping equal times
    pub fn build(events: &[EventTime], policy: RowPolicy) -> Self {
        let mut sorted = events.to_vec();
        sorted.sort();

        let n_observations = sorted.len();
        let mut rows = Vec::new();
        let mut remaining = n_observations;
        let mut start = 0;

        while start < sorted.len() {
            let time = sorted[start].time();
            let mut end = start;
            let mut n_events = 0;

            while end < sorted.len() && sorted[end].time() == time {
                if sorted[end].is_observed() {
                    n_events += 1;
                }
                end += 1;
            }

            let n_censored = (end - start) - n_events;

            if n_events > 0 || policy == RowPolicy::AllTimes {
                rows.push(RiskSetRow {
                    time,
                    n_events,
                    n_censored,
                    n_at_risk: remaining,
                });
            }

            // censoring-only times still leave the risk set
            remaining -= end - start;
            start = end;
        }

        Self { rows, n_observations }
    }

    pub fn rows(&self) -> &[RiskSetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// observations that went into the build
    pub fn n_observations(&self) -> usize {
        self.n_observations
    }

    pub fn times(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.time).collect()
    }

    pub fn n_events(&self) -> Vec<usize> {
        self.rows.iter().map(|row| row.n_events).collect()
    }

    pub fn n_censored(&self) -> Vec<usize> {
        self.rows.iter().map(|row| row.n_censored).collect()
    }

    pub fn n_at_risk(&self) -> Vec<usize> {
        self.rows.iter().map(|row| row.n_at_risk).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::event_times;

    fn recidivism() -> Vec<EventTime> {
        event_times(
            &[20.0, 17.0, 25.0, 52.0, 52.0],
            &[true, true, true, false, false],
        )
        .unwrap()
    }

    #[test]
    fn test_event_rows_only() {
        let risk_set = RiskSet::build(&recidivism(), RowPolicy::EventTimes);

        assert_eq!(risk_set.times(), vec![17.0, 20.0, 25.0]);
        assert_eq!(risk_set.n_at_risk(), vec![5, 4, 3]);
        assert_eq!(risk_set.n_events(), vec![1, 1, 1]);
        assert_eq!(risk_set.n_censored(), vec![0, 0, 0]);
        assert_eq!(risk_set.n_observations(), 5);
    }

    #[test]
    fn test_all_times_policy() {
        let risk_set = RiskSet::build(&recidivism(), RowPolicy::AllTimes);

        assert_eq!(risk_set.times(), vec![17.0, 20.0, 25.0, 52.0]);
        assert_eq!(risk_set.n_at_risk(), vec![5, 4, 3, 2]);
        assert_eq!(risk_set.n_events(), vec![1, 1, 1, 0]);
        assert_eq!(risk_set.n_censored(), vec![0, 0, 0, 2]);
    }

    #[test]
    fn test_censoring_tied_with_event() {
        // the subject censored at 1 is still at risk for the event at 1
        let events = event_times(&[1.0, 1.0, 2.0], &[false, true, true]).unwrap();
        let risk_set = RiskSet::build(&events, RowPolicy::EventTimes);

        assert_eq!(risk_set.rows()[0], RiskSetRow { time: 1.0, n_events: 1, n_censored: 1, n_at_risk: 3 });
        assert_eq!(risk_set.rows()[1], RiskSetRow { time: 2.0, n_events: 1, n_censored: 0, n_at_risk: 1 });
    }

    #[test]
    fn test_signed_zero_times_share_a_row() {
        let events = event_times(&[-0.0, 0.0, 1.0], &[false, true, true]).unwrap();
        let risk_set = RiskSet::build(&events, RowPolicy::AllTimes);

        assert_eq!(risk_set.len(), 2);
        assert_eq!(risk_set.rows()[0], RiskSetRow { time: 0.0, n_events: 1, n_censored: 1, n_at_risk: 3 });
    }

    #[test]
    fn test_censoring_between_events() {
        let events = event_times(&[1.0, 2.0, 3.0], &[true, false, true]).unwrap();
        let risk_set = RiskSet::build(&events, RowPolicy::EventTimes);

        assert_eq!(risk_set.times(), vec![1.0, 3.0]);
        assert_eq!(risk_set.n_at_risk(), vec![3, 1]);
    }

    #[test]
    fn test_all_censored() {
        let events = event_times(&[4.0, 2.0], &[false, false]).unwrap();

        assert!(RiskSet::build(&events, RowPolicy::EventTimes).is_empty());
        assert_eq!(RiskSet::build(&events, RowPolicy::AllTimes).n_at_risk(), vec![2, 1]);
    }

    #[test]
    fn test_rows_are_consistent() {
        let events = event_times(
            &[5.0, 3.0, 3.0, 8.0, 1.0, 3.0, 9.0, 9.0],
            &[true, false, true, true, false, true, false, true],
        )
        .unwrap();
        let risk_set = RiskSet::build(&events, RowPolicy::AllTimes);

        for pair in risk_set.rows().windows(2) {
            assert!(pair[0].time < pair[1].time);
            assert!(pair[0].n_at_risk >= pair[1].n_at_risk);
        }
        for row in risk_set.rows() {
            assert!(row.n_events + row.n_censored <= row.n_at_risk);
        }
        assert_eq!(risk_set.rows()[0].n_at_risk, 8);
    }
}
