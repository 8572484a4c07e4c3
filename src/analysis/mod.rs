//! Analysis layer: pure functions over a clean numeric series.
//!
//! ```text
//!   Dataset::values()  ──►  &[f64]
//!                              │
//!          ┌───────────────────┼────────────────────┐
//!          ▼                   ▼                    ▼
//!     ┌─────────┐        ┌──────────┐         ┌──────────┐
//!     │ zscore  │        │ rolling  │         │ insights │
//!     └─────────┘        └──────────┘         └──────────┘
//!    score / detect    moving average        trend, seasonality,
//!    → AnomalyReport   baseline deviation    summary text
//! ```
//!
//! Nothing in here keeps state or touches I/O; every call recomputes.

pub mod insights;
pub mod rolling;
pub mod stats;
pub mod zscore;

pub use zscore::{detect, score, AnomalyReport, DEFAULT_THRESHOLD};
