//! Rule-based risk scoring.
//!
//! A fixed threshold table, not a learned model. The exact comparison
//! strictness, increment values, and clamp order are compatibility-critical
//! and must not be reordered.

use serde::{Deserialize, Serialize};

use crate::features::ScanFeatures;

pub const BASE_SCORE: i64 = 30;
pub const EDGE_DENSITY_HIGH: f64 = 0.15;
pub const EDGE_DENSITY_MEDIUM: f64 = 0.10;
pub const TEXTURE_COMPLEXITY_THRESHOLD: f64 = 100.0;

/// Discrete severity tier derived from the risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Map a risk score onto its severity tier (boundaries at 30 and 60).
pub fn severity_for(score: i64) -> Severity {
    if score < 30 {
        Severity::Low
    } else if score < 60 {
        Severity::Medium
    } else {
        Severity::High
    }
}

/// Compute the risk score and severity for a feature record.
///
/// Pure and deterministic: base 30, +20 for edge density above 0.15 (else
/// +10 above 0.10), +15 for texture complexity above 100, clamped to
/// [0, 100] after all additions.
pub fn score(features: &ScanFeatures) -> (i64, Severity) {
    let mut score = BASE_SCORE;

    if features.edge_density > EDGE_DENSITY_HIGH {
        score += 20;
    } else if features.edge_density > EDGE_DENSITY_MEDIUM {
        score += 10;
    }

    if features.texture_complexity > TEXTURE_COMPLEXITY_THRESHOLD {
        score += 15;
    }

    score = score.clamp(0, 100);

    (score, severity_for(score))
}
