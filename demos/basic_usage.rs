use survival_hazards::{
    event_times, metrics::ModelMetrics, CoxRegression, KaplanMeier, NelsonAalen, SurvivalData,
    Ties, DEFAULT_ALPHA,
};
use ndarray::Array2;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=survival_hazards=debug shows each newton step
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("Survival Analysis - Basic Usage Example");
    println!("=======================================\n");

    // weeks until re-arrest, false = still free when follow-up ended
    let times = vec![20.0, 17.0, 25.0, 52.0, 52.0, 31.0, 9.0, 44.0, 52.0, 14.0,
                     38.0, 52.0, 23.0, 8.0, 52.0, 46.0, 52.0, 11.0, 37.0, 52.0];

    let status = vec![true, true, true, false, false, true, true, true, false, true,
                      true, false, true, true, false, true, false, true, false, false];

    // financial aid (0/1), age at release, prior convictions
    let covariates = Array2::from_shape_vec((20, 3), vec![
        0.0, 27.0, 3.0,
        0.0, 18.0, 8.0,
        0.0, 19.0, 13.0,
        1.0, 23.0, 1.0,
        0.0, 19.0, 3.0,
        1.0, 24.0, 2.0,
        0.0, 21.0, 4.0,
        1.0, 20.0, 2.0,
        1.0, 30.0, 0.0,
        0.0, 22.0, 6.0,
        1.0, 21.0, 3.0,
        0.0, 35.0, 1.0,
        0.0, 19.0, 5.0,
        0.0, 20.0, 9.0,
        1.0, 26.0, 1.0,
        1.0, 25.0, 2.0,
        0.0, 28.0, 2.0,
        1.0, 18.0, 7.0,
        0.0, 23.0, 4.0,
        1.0, 40.0, 0.0,
    ])?;

    println!("Kaplan-Meier");
    println!("------------");

    let km = KaplanMeier::fit(&times, &status)?;
    let bands = km.confint(DEFAULT_ALPHA)?;
    println!("{:>6} {:>5} {:>5} {:>8} {:>8} {:>18}", "time", "risk", "event", "S(t)", "stderr", "95% CI");
    for i in 0..km.len() {
        println!(
            "{:>6.1} {:>5} {:>5} {:>8.4} {:>8.4}   ({:.4}, {:.4})",
            km.times()[i], km.n_at_risk()[i], km.n_events()[i],
            km.survival()[i], km.stderr()[i], bands[i].0, bands[i].1
        );
    }
    match km.median_survival() {
        Some(median) => println!("median time to re-arrest: {} weeks\n", median),
        None => println!("median time to re-arrest not reached\n"),
    }

    println!("Nelson-Aalen");
    println!("------------");

    let na = NelsonAalen::fit(&times, &status)?;
    let na_bands = na.confint(DEFAULT_ALPHA)?;
    for i in 0..na.len() {
        println!(
            "{:>6.1} H(t) = {:.4}  ({:.4}, {:.4})",
            na.times()[i], na.chaz()[i], na_bands[i].0, na_bands[i].1
        );
    }
    println!();

    println!("Cox Regression");
    println!("--------------");

    let events = event_times(&times, &status)?;
    let data = SurvivalData::from_events(events, covariates)?;

    println!("  - Number of subjects: {}", data.n_samples());
    println!("  - Number of events: {}", data.n_events());
    println!();

    let model = CoxRegression::new()
        .with_ties(Ties::Efron)
        .with_feature_names(vec!["fin".into(), "age".into(), "prio".into()])
        .fit(&data)?;

    println!("{:<6} {:>10} {:>10} {:>8} {:>10}", "", "coef", "stderr", "z", "p");
    for row in model.coef_table().rows() {
        println!(
            "{:<6} {:>10.4} {:>10.4} {:>8.3} {:>10.4}",
            row.name, row.estimate, row.stderr, row.z, row.p_value
        );
    }
    println!();

    let hazard_ratios = model.hazard_ratios();
    let intervals = model.confint(DEFAULT_ALPHA)?;
    for (j, name) in model.feature_names().iter().enumerate() {
        println!(
            "  {} hazard ratio {:.3} (95% CI {:.3} - {:.3})",
            name, hazard_ratios[j], intervals[j].0.exp(), intervals[j].1.exp()
        );
    }
    println!();

    let convergence = model.convergence();
    println!("converged after {} iterations", convergence.iterations);
    println!("log likelihood: {:.4} (null {:.4})", model.loglikelihood(), model.nullloglikelihood());

    let metrics = ModelMetrics::compute(&model, &data)?;
    println!("c-index: {:.3}", metrics.c_index);
    println!("AIC: {:.3}  BIC: {:.3}", metrics.aic, metrics.bic);
    println!(
        "likelihood ratio: {:.3} on {} df, p = {:.4}",
        metrics.likelihood_ratio.statistic, metrics.likelihood_ratio.dof, metrics.likelihood_ratio.p_value
    );

    Ok(())
}
