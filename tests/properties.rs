use proptest::prelude::*;
use survival_hazards::{event_times, KaplanMeier, NelsonAalen, RowPolicy};

/// small integer times so ties show up often
fn cohort() -> impl Strategy<Value = (Vec<f64>, Vec<bool>)> {
    prop::collection::vec((0u32..30, any::<bool>()), 1..60).prop_map(|subjects| {
        subjects
            .into_iter()
            .map(|(t, observed)| (t as f64 * 0.5, observed))
            .unzip::<f64, bool, Vec<f64>, Vec<bool>>()
    })
}

proptest! {
    #[test]
    fn survival_is_nonincreasing_and_bounded((times, status) in cohort()) {
        let km = KaplanMeier::fit(&times, &status).unwrap();

        let mut previous = 1.0;
        for &s in km.survival().iter() {
            prop_assert!((0.0..=1.0).contains(&s));
            prop_assert!(s <= previous);
            previous = s;
        }
    }

    #[test]
    fn greenwood_stderr_is_nondecreasing((times, status) in cohort()) {
        let km = KaplanMeier::fit(&times, &status).unwrap();

        let stderr = km.stderr();
        for i in 1..stderr.len() {
            prop_assert!(stderr[i] >= stderr[i - 1]);
        }
    }

    #[test]
    fn cumulative_hazard_is_nondecreasing((times, status) in cohort()) {
        let na = NelsonAalen::fit(&times, &status).unwrap();

        let mut previous = 0.0;
        for (i, &h) in na.chaz().iter().enumerate() {
            prop_assert!(h >= previous);
            prop_assert!(na.stderr()[i] >= 0.0);
            previous = h;
        }
    }

    #[test]
    fn kaplan_meier_sits_below_exp_of_minus_hazard((times, status) in cohort()) {
        let km = KaplanMeier::fit(&times, &status).unwrap();
        let na = NelsonAalen::fit(&times, &status).unwrap();

        prop_assert_eq!(km.len(), na.len());
        for i in 0..km.len() {
            prop_assert!(km.survival()[i] <= (-na.chaz()[i]).exp() + 1e-12);
        }
    }

    #[test]
    fn rows_cover_exactly_the_event_times((times, status) in cohort()) {
        let events = event_times(&times, &status).unwrap();
        let km = KaplanMeier::fit_events(&events).unwrap();

        let mut expected: Vec<f64> = events
            .iter()
            .filter(|e| e.is_observed())
            .map(|e| e.time())
            .collect();
        expected.sort_by(f64::total_cmp);
        expected.dedup();

        prop_assert_eq!(km.times().to_vec(), expected);
        prop_assert_eq!(km.n_events().iter().sum::<usize>(), status.iter().filter(|&&s| s).count());

        let all = KaplanMeier::fit_with_policy(&events, RowPolicy::AllTimes).unwrap();
        prop_assert!(all.len() >= km.len());
        prop_assert_eq!(all.n_at_risk()[0], times.len());
    }

    #[test]
    fn intervals_contain_estimate_and_widen((times, status) in cohort(), alpha in 0.01f64..0.5) {
        let km = KaplanMeier::fit(&times, &status).unwrap();
        let na = NelsonAalen::fit(&times, &status).unwrap();

        let km_ci = km.confint(alpha).unwrap();
        let km_wide = km.confint(alpha / 2.0).unwrap();
        for i in 0..km.len() {
            let s = km.survival()[i];
            let (lower, upper) = km_ci[i];
            prop_assert!(0.0 <= lower && lower <= s + 1e-12);
            prop_assert!(s <= upper + 1e-12 && upper <= 1.0);
            prop_assert!(km_wide[i].0 <= lower + 1e-12 && upper <= km_wide[i].1 + 1e-12);
        }

        let na_ci = na.confint(alpha).unwrap();
        let na_wide = na.confint(alpha / 2.0).unwrap();
        for i in 0..na.len() {
            let h = na.chaz()[i];
            let (lower, upper) = na_ci[i];
            prop_assert!(0.0 <= lower && lower <= h && h <= upper);
            prop_assert!(na_wide[i].0 <= lower && upper <= na_wide[i].1);
        }
    }

    #[test]
    fn refits_are_identical((times, status) in cohort()) {
        let first = KaplanMeier::fit(&times, &status).unwrap();
        let second = KaplanMeier::fit(&times, &status).unwrap();
        prop_assert_eq!(first, second);

        let first = NelsonAalen::fit(&times, &status).unwrap();
        let second = NelsonAalen::fit(&times, &status).unwrap();
        prop_assert_eq!(first, second);
    }
}
