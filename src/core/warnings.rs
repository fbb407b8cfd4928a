use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Domain warnings emitted during matching and validation.
///
/// Warnings never change a computed figure; they flag results that likely
/// rest on incomplete or suspicious input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// Open acquisitions could not cover the disposal. The uncovered
    /// quantity was treated as having zero cost basis.
    InsufficientCostBasis {
        #[schemars(with = "f64")]
        available: Decimal,
        #[schemars(with = "f64")]
        required: Decimal,
    },
    /// FIFO consumed an acquisition dated after the disposal.
    MatchedLaterAcquisition {
        lot_id: String,
        acquisition_date: NaiveDate,
    },
    /// Same asset re-acquired within the wash-sale window of a disposal.
    /// Informational only.
    PossibleWashSale {
        lot_id: String,
        acquisition_date: NaiveDate,
        days_apart: i64,
    },
}

impl Warning {
    pub fn kind(&self) -> &'static str {
        match self {
            Warning::InsufficientCostBasis { .. } => "InsufficientCostBasis",
            Warning::MatchedLaterAcquisition { .. } => "MatchedLaterAcquisition",
            Warning::PossibleWashSale { .. } => "PossibleWashSale",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Warning::InsufficientCostBasis {
                available,
                required,
            } if available.is_zero() => format!(
                "No acquisitions available to cover {} units; cost basis taken as zero",
                required
            ),
            Warning::InsufficientCostBasis {
                available,
                required,
            } => format!(
                "Only {} of {} units covered by acquisitions; remainder taken at zero cost",
                available, required
            ),
            Warning::MatchedLaterAcquisition {
                lot_id,
                acquisition_date,
            } => format!(
                "Matched against lot {} acquired later on {}",
                lot_id, acquisition_date
            ),
            Warning::PossibleWashSale {
                lot_id,
                acquisition_date,
                days_apart,
            } => format!(
                "Lot {} re-acquired on {} ({} days from disposal)",
                lot_id, acquisition_date, days_apart
            ),
        }
    }
}
