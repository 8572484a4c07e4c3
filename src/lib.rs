//! Load uploaded time-series datasets and flag statistical outliers.
//!
//! The core is [`analysis::score`] / [`analysis::detect`]: a z-score per
//! point against the series' own mean and population standard deviation,
//! and the set of points above a threshold. Loading, filtering, settings,
//! per-point feedback and export sit around it.

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod session;

pub use analysis::{detect, score, AnomalyReport, DEFAULT_THRESHOLD};
pub use config::Settings;
pub use data::{DataPoint, Dataset};
pub use error::{Error, Result};
pub use session::{Feedback, Session};
