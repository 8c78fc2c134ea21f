//! # survival hazards
//!
//! survival analysis for right-censored data - the nonparametric estimators
//! plus cox regression
//!
//! ## what you get
//!
//! - kaplan-meier survivor function w/ greenwood standard errors
//! - nelson-aalen cumulative hazard
//! - cox proportional hazards (newton-raphson, efron or breslow ties)
//! - log-log / wald confidence intervals, z tests, likelihood ratio test
//! - c-index, aic, bic for comparing fits
//!
//! ## quick start
//!
//! ```rust
//! use survival_hazards::{event_times, CoxModel, KaplanMeier, NelsonAalen, DEFAULT_ALPHA};
//! use ndarray::Array2;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let times = vec![20.0, 17.0, 25.0, 52.0, 52.0, 31.0, 9.0, 44.0];
//! let status = vec![true, true, true, false, false, true, true, false]; // false = censored
//!
//! let km = KaplanMeier::fit(&times, &status)?;
//! let bands = km.confint(DEFAULT_ALPHA)?;
//! assert_eq!(bands.len(), km.len());
//!
//! let na = NelsonAalen::fit(&times, &status)?;
//! assert!(na.chaz().iter().all(|&h| h >= 0.0));
//!
//! // one covariate per subject
//! let events = event_times(&times, &status)?;
//! let covariates = Array2::from_shape_vec((8, 1), vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0])?;
//! let model = CoxModel::fit(covariates.view(), &events)?;
//! let table = model.coef_table();
//! assert_eq!(table.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod error;
pub mod event;
pub mod inference;
pub mod kaplan_meier;
pub mod linalg;
pub mod metrics;
pub mod model;
pub mod nelson_aalen;
pub mod optimization;
pub mod risk_set;

pub use data::SurvivalData;
pub use error::{Result, SurvivalError};
pub use event::{event_times, EventTime};
pub use inference::DEFAULT_ALPHA;
pub use kaplan_meier::KaplanMeier;
pub use model::{CoefTable, CoxModel, CoxRegression};
pub use nelson_aalen::NelsonAalen;
pub use optimization::{OptimizationConfig, Ties};
pub use risk_set::{RiskSet, RiskSetRow, RowPolicy};
