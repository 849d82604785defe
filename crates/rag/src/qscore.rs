//! Retrieval confidence (Q-score) and reliability banding

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use medinote_common::{ConfidenceConfig, RankedPassage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Reliability {
    Low,
    Medium,
    High,
}

/// Mean of the first `window` scored passages, clamped to [0, 1].
///
/// Passages without a finite score are skipped before the window is taken.
/// Returns 0.0 when nothing is scored.
pub fn confidence(passages: &[RankedPassage], window: usize) -> f64 {
    let scores: Vec<f64> = passages
        .iter()
        .filter_map(|p| p.score)
        .filter(|s| s.is_finite())
        .take(window)
        .collect();

    if scores.is_empty() {
        return 0.0;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    mean.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceThresholds {
    pub medium: f64,
    pub high: f64,
    /// Below this, local retrieval is supplemented with web results
    pub web_rescue: f64,
    pub window: usize,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            medium: 0.4,
            high: 0.6,
            web_rescue: 0.15,
            window: 3,
        }
    }
}

impl From<&ConfidenceConfig> for ConfidenceThresholds {
    fn from(config: &ConfidenceConfig) -> Self {
        Self {
            medium: config.medium_threshold,
            high: config.high_threshold,
            web_rescue: config.web_rescue_threshold,
            window: config.scored_window,
        }
    }
}

impl ConfidenceThresholds {
    pub fn classify(&self, confidence: f64) -> Reliability {
        if confidence < self.medium {
            Reliability::Low
        } else if confidence < self.high {
            Reliability::Medium
        } else {
            Reliability::High
        }
    }

    pub fn needs_web_rescue(&self, confidence: f64) -> bool {
        confidence < self.web_rescue
    }

    pub fn score(&self, passages: &[RankedPassage]) -> f64 {
        confidence(passages, self.window)
    }
}
