//! Risk tiering for display
//!
//! Combines the model's label with the two glycemic markers into a coarse
//! Low / Medium / High tier. A positive label always ranks High.

use crate::models::Label;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column holding the HbA1c percentage
pub const HBA1C_COLUMN: &str = "HbA1c_level";

/// Column holding blood glucose in mg/dL
pub const GLUCOSE_COLUMN: &str = "blood_glucose_level";

const HIGH_HBA1C: f64 = 8.0;
const HIGH_GLUCOSE: f64 = 200.0;
const MEDIUM_HBA1C: f64 = 6.5;
const MEDIUM_GLUCOSE: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Tier for one scored row; absent markers count as unremarkable
    pub fn assess(prediction: &Label, hba1c: Option<f64>, glucose: Option<f64>) -> RiskAssessment {
        let hba1c = hba1c.unwrap_or(0.0);
        let glucose = glucose.unwrap_or(0.0);

        let tier = if prediction.is_positive() || hba1c > HIGH_HBA1C || glucose > HIGH_GLUCOSE {
            RiskTier::High
        } else if hba1c > MEDIUM_HBA1C || glucose > MEDIUM_GLUCOSE {
            RiskTier::Medium
        } else {
            RiskTier::Low
        };

        RiskAssessment {
            tier,
            confidence: tier.display_confidence(),
        }
    }

    /// Tier for row `row` of the caller's (unaligned) input table
    pub fn assess_row(table: &Table, row: usize, prediction: &Label) -> RiskAssessment {
        Self::assess(
            prediction,
            table.number(row, HBA1C_COLUMN),
            table.number(row, GLUCOSE_COLUMN),
        )
    }

    fn display_confidence(self) -> f64 {
        match self {
            RiskTier::High => 0.95,
            RiskTier::Medium => 0.75,
            RiskTier::Low => 0.6,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskTier::Low => "Low Risk of Diabetes",
            RiskTier::Medium => "Medium Risk of Diabetes",
            RiskTier::High => "High Risk of Diabetes",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub tier: RiskTier,
    pub confidence: f64,
}
