use ndarray::{Array1, ArrayView1};
use crate::{
    data::SurvivalData,
    error::{Result, SurvivalError},
    event::EventTime,
    inference::chi_square_sf,
    model::CoxModel,
    optimization::{PartialLikelihood, Ties},
};

/// Harrell's C-index - how often does the higher risk score die first?
/// tied risk scores get half credit
pub fn harrell_c_index(risk_scores: ArrayView1<f64>, events: &[EventTime]) -> Result<f64> {
    let n = risk_scores.len();
    if n != events.len() {
        return Err(SurvivalError::invalid_argument(format!(
            "risk scores len ({}) != events len ({})",
            n,
            events.len()
        )));
    }

    let mut concordant = 0.0;
    let mut discordant = 0.0;
    let mut tied_risk = 0.0;

    for i in 0..n {
        if !events[i].is_observed() {
            continue; // censored subjects can't anchor a pair
        }

        for j in 0..n {
            if i == j {
                continue;
            }

            // j outlived i, or was censored no earlier than i's event
            let comparable = events[j].time() > events[i].time()
                || (events[j].is_censored() && events[j].time() >= events[i].time());

            if comparable {
                if risk_scores[i] > risk_scores[j] {
                    concordant += 1.0;
                } else if risk_scores[i] < risk_scores[j] {
                    discordant += 1.0;
                } else {
                    tied_risk += 1.0;
                }
            }
        }
    }

    let total_pairs = concordant + discordant + tied_risk;
    if total_pairs == 0.0 {
        return Err(SurvivalError::invalid_argument(
            "no comparable pairs for the c-index",
        ));
    }

    Ok((concordant + 0.5 * tied_risk) / total_pairs)
}

/// log partial likelihood at arbitrary coefficients
pub fn log_partial_likelihood(
    data: &SurvivalData,
    coefficients: ArrayView1<f64>,
    ties: Ties,
) -> Result<f64> {
    if coefficients.len() != data.n_features() {
        return Err(SurvivalError::invalid_argument(format!(
            "expected {} coefficients, got {}",
            data.n_features(),
            coefficients.len()
        )));
    }

    Ok(PartialLikelihood::new(data, ties).log_likelihood(coefficients))
}

/// AIC (Akaike Information Criterion)
pub fn aic(log_likelihood: f64, n_parameters: usize) -> f64 {
    2.0 * n_parameters as f64 - 2.0 * log_likelihood
}

/// BIC (Bayesian Information Criterion), penalized by log of the event count
pub fn bic(log_likelihood: f64, n_parameters: usize, n_events: usize) -> f64 {
    (n_parameters as f64) * (n_events as f64).ln() - 2.0 * log_likelihood
}

/// likelihood ratio test of the fitted model against beta = 0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LikelihoodRatioTest {
    pub statistic: f64,
    pub dof: usize,
    pub p_value: f64,
}

/// likelihood ratio test of the fitted model against beta = 0 on its own training data
pub fn likelihood_ratio_test(model: &CoxModel) -> Result<LikelihoodRatioTest> {
    ratio_test(model.loglikelihood(), model.nullloglikelihood(), model.dof())
}

fn ratio_test(log_likelihood: f64, null_log_likelihood: f64, dof: usize) -> Result<LikelihoodRatioTest> {
    // held-out data can favor beta = 0, floor the statistic there
    let statistic = (2.0 * (log_likelihood - null_log_likelihood)).max(0.0);
    let p_value = chi_square_sf(statistic, dof)?;

    Ok(LikelihoodRatioTest {
        statistic,
        dof,
        p_value,
    })
}

/// model evaluation bundle, everything measured on one dataset
#[derive(Debug, Clone)]
pub struct ModelMetrics {
    pub c_index: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub likelihood_ratio: LikelihoodRatioTest,
}

impl ModelMetrics {
    /// score a fitted model on (possibly held-out) data at its fitted coefficients
    pub fn compute(model: &CoxModel, data: &SurvivalData) -> Result<Self> {
        let risk_scores = model.predict(data.covariates())?;
        let c_index = harrell_c_index(risk_scores.view(), data.events())?;

        let log_likelihood = log_partial_likelihood(data, model.coefficients(), model.ties())?;
        let null_coefficients = Array1::<f64>::zeros(model.dof());
        let null_log_likelihood = log_partial_likelihood(data, null_coefficients.view(), model.ties())?;

        Ok(Self {
            c_index,
            log_likelihood,
            aic: aic(log_likelihood, model.dof()),
            bic: bic(log_likelihood, model.dof(), data.n_events()),
            likelihood_ratio: ratio_test(log_likelihood, null_log_likelihood, model.dof())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::event_times;
    use crate::model::CoxRegression;
    use ndarray::{Array1, Array2};
    use approx::assert_relative_eq;

    fn create_test_data() -> SurvivalData {
        let times = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let status = vec![true, true, false, true, true, true, false, true];
        let covariates = Array2::from_shape_vec((8, 2), vec![
            1.0, 0.0,
            0.0, 1.0,
            1.0, 1.0,
            -1.0, 0.0,
            1.0, -1.0,
            0.0, 0.5,
            -1.0, 1.0,
            0.0, -1.0,
        ]).unwrap();

        SurvivalData::new(times, status, covariates).unwrap()
    }

    #[test]
    fn test_perfect_concordance() {
        let events = event_times(&[1.0, 2.0, 3.0, 4.0], &[true, true, true, true]).unwrap();
        let risk_scores = Array1::from(vec![4.0, 3.0, 2.0, 1.0]);

        let c_index = harrell_c_index(risk_scores.view(), &events).unwrap();
        assert_relative_eq!(c_index, 1.0, epsilon = 1e-10);

        let reversed = Array1::from(vec![1.0, 2.0, 3.0, 4.0]);
        assert_relative_eq!(harrell_c_index(reversed.view(), &events).unwrap(), 0.0, epsilon = 1e-10);

        let flat = Array1::from(vec![1.0; 4]);
        assert_relative_eq!(harrell_c_index(flat.view(), &events).unwrap(), 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_c_index_errors() {
        let events = event_times(&[1.0, 2.0], &[false, false]).unwrap();
        let risk_scores = Array1::from(vec![1.0, 2.0]);
        assert!(harrell_c_index(risk_scores.view(), &events).is_err());

        let short = Array1::from(vec![1.0]);
        assert!(harrell_c_index(short.view(), &events).is_err());
    }

    #[test]
    fn test_log_partial_likelihood() {
        let data = create_test_data();
        let model = CoxRegression::new().fit(&data).unwrap();

        let at_fit = log_partial_likelihood(&data, model.coefficients(), Ties::Efron).unwrap();
        assert_relative_eq!(at_fit, model.loglikelihood(), epsilon = 1e-12);

        let zero = Array1::zeros(2);
        let at_zero = log_partial_likelihood(&data, zero.view(), Ties::Efron).unwrap();
        assert_relative_eq!(at_zero, model.nullloglikelihood(), epsilon = 1e-12);

        let wrong = Array1::zeros(3);
        assert!(log_partial_likelihood(&data, wrong.view(), Ties::Efron).is_err());
    }

    #[test]
    fn test_aic_bic() {
        let log_likelihood = -10.0;
        let n_parameters = 3;
        let n_events = 100;

        assert_relative_eq!(aic(log_likelihood, n_parameters), 26.0, epsilon = 1e-12);
        let bic_score = bic(log_likelihood, n_parameters, n_events);
        assert!(bic_score > aic(log_likelihood, n_parameters));
    }

    #[test]
    fn test_likelihood_ratio() {
        let data = create_test_data();
        let model = CoxRegression::new().fit(&data).unwrap();
        let lrt = likelihood_ratio_test(&model).unwrap();

        assert_eq!(lrt.dof, 2);
        assert_relative_eq!(
            lrt.statistic,
            2.0 * (model.loglikelihood() - model.nullloglikelihood()),
            epsilon = 1e-12
        );
        assert!(lrt.p_value > 0.0 && lrt.p_value <= 1.0);
    }

    #[test]
    fn test_model_metrics() {
        let data = create_test_data();
        let model = CoxRegression::new().fit(&data).unwrap();
        let metrics = ModelMetrics::compute(&model, &data).unwrap();

        assert!(metrics.c_index >= 0.0 && metrics.c_index <= 1.0);
        assert!(metrics.aic > 0.0);
        assert!(metrics.bic.is_finite());

        // on the training data the bundle agrees with the fit itself
        assert_relative_eq!(metrics.log_likelihood, model.loglikelihood(), epsilon = 1e-10);
        assert_relative_eq!(
            metrics.likelihood_ratio.statistic,
            likelihood_ratio_test(&model).unwrap().statistic,
            epsilon = 1e-8
        );
    }

    #[test]
    fn test_model_metrics_on_held_out_rows() {
        let data = create_test_data();
        let train = data.subset(&[0, 1, 2, 3, 4, 5]).unwrap();
        let held_out = data.subset(&[3, 4, 5, 6, 7]).unwrap();
        let model = CoxRegression::new().fit(&train).unwrap();

        let on_train = ModelMetrics::compute(&model, &train).unwrap();
        let on_held_out = ModelMetrics::compute(&model, &held_out).unwrap();

        let expected = log_partial_likelihood(&held_out, model.coefficients(), model.ties()).unwrap();
        assert_relative_eq!(on_held_out.log_likelihood, expected, epsilon = 1e-12);
        assert!((on_held_out.log_likelihood - on_train.log_likelihood).abs() > 1e-6);

        assert_relative_eq!(on_held_out.aic, aic(expected, 2), epsilon = 1e-12);
        assert_relative_eq!(on_held_out.bic, bic(expected, 2, held_out.n_events()), epsilon = 1e-12);

        let zero = Array1::zeros(2);
        let null = log_partial_likelihood(&held_out, zero.view(), Ties::Efron).unwrap();
        assert_relative_eq!(
            on_held_out.likelihood_ratio.statistic,
            (2.0 * (expected - null)).max(0.0),
            epsilon = 1e-12
        );
    }
}
