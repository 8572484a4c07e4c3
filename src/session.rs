use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::insights::{self, Insight};
use crate::analysis::rolling::deviations_from_baseline;
use crate::analysis::stats::Summary;
use crate::analysis::{detect, AnomalyReport};
use crate::config::Settings;
use crate::data::Dataset;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Feedback – a user's verdict on one flagged point
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Positive,
    Negative,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::Positive => f.write_str("positive"),
            Feedback::Negative => f.write_str("negative"),
        }
    }
}

/// One point as it appears in an export: raw fields plus the verdicts.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRow<'a> {
    pub timestamp: Option<&'a str>,
    pub value: f64,
    pub is_anomaly: bool,
    pub feedback: Option<Feedback>,
}

// ---------------------------------------------------------------------------
// Session – one dataset under analysis
// ---------------------------------------------------------------------------

/// Analysis state for a single loaded dataset.
///
/// Settings are injected at construction; nothing here is global. The report
/// is recomputed whenever the dataset or threshold changes.
pub struct Session {
    settings: Settings,
    dataset: Option<Dataset>,
    report: AnomalyReport,
    /// point index → verdict
    feedback: BTreeMap<usize, Feedback>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        let report = detect(&[], settings.threshold);
        Self {
            settings,
            dataset: None,
            report,
            feedback: BTreeMap::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn report(&self) -> &AnomalyReport {
        &self.report
    }

    /// Ingest a newly loaded dataset. Previous feedback is discarded.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.dataset = Some(dataset);
        self.feedback.clear();
        self.rescore();
    }

    /// Change the z-score cutoff and rescore. Feedback is kept.
    pub fn set_threshold(&mut self, threshold: f64) {
        self.settings.threshold = threshold;
        self.rescore();
    }

    fn rescore(&mut self) {
        let values = self.values();
        self.report = detect(&values, self.settings.threshold);
        log::debug!(
            "rescored {} points at threshold {}: {} flagged",
            values.len(),
            self.settings.threshold,
            self.report.count()
        );
    }

    fn values(&self) -> Vec<f64> {
        self.dataset.as_ref().map(Dataset::values).unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.dataset.as_ref().map_or(0, Dataset::len)
    }

    /// Whether the point at `index` is currently flagged.
    pub fn is_anomaly(&self, index: usize) -> bool {
        self.report.indices.binary_search(&index).is_ok()
    }

    /// Record the user's verdict on a point, replacing any earlier one.
    pub fn set_feedback(&mut self, index: usize, feedback: Feedback) -> Result<()> {
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        self.feedback.insert(index, feedback);
        Ok(())
    }

    pub fn feedback(&self, index: usize) -> Option<Feedback> {
        self.feedback.get(&index).copied()
    }

    /// Every point with its current verdicts, in dataset order.
    pub fn rows(&self) -> Vec<ScoredRow<'_>> {
        let Some(ds) = &self.dataset else {
            return Vec::new();
        };
        ds.points
            .iter()
            .enumerate()
            .map(|(i, p)| ScoredRow {
                timestamp: p.timestamp.as_deref(),
                value: p.value,
                is_anomaly: self.is_anomaly(i),
                feedback: self.feedback(i),
            })
            .collect()
    }

    pub fn summary(&self) -> Option<Summary> {
        Summary::from_values(&self.values())
    }

    pub fn insights(&self) -> Vec<Insight> {
        insights::generate(
            &self.values(),
            self.settings.seasonality_period,
            self.settings.threshold,
        )
    }

    /// Points far from their moving average, per the baseline settings.
    pub fn baseline_deviations(&self) -> Vec<usize> {
        deviations_from_baseline(
            &self.values(),
            self.settings.moving_average_window,
            self.settings.baseline_threshold,
        )
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
