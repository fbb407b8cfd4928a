//! Detection of re-acquisitions close to a disposal.
//!
//! Purely informational: nothing here alters a gain or a tax figure.

use crate::core::{Lot, Warning};
use crate::tax::year::TaxYear;

pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// A disposal and the same-asset acquisitions within the window around it
#[derive(Debug, Clone)]
pub struct WashSale<'a> {
    pub disposal: &'a Lot,
    pub warnings: Vec<Warning>,
}

/// Acquisitions of the disposal's symbol dated within `days` of it, either side.
pub fn check_wash_sale(disposal: &Lot, lots: &[Lot], days: i64) -> Vec<Warning> {
    let Some(disposal_date) = disposal.disposal_date else {
        return Vec::new();
    };

    lots.iter()
        .filter(|l| l.is_acquisition() && l.symbol == disposal.symbol)
        .filter_map(|l| {
            let days_apart = (l.acquisition_date - disposal_date).num_days();
            (days_apart.abs() <= days).then(|| Warning::PossibleWashSale {
                lot_id: l.id.clone(),
                acquisition_date: l.acquisition_date,
                days_apart,
            })
        })
        .collect()
}

/// Every disposal (optionally limited to one tax year) with nearby re-acquisitions.
pub fn detect_wash_sales(lots: &[Lot], year: Option<TaxYear>, days: i64) -> Vec<WashSale<'_>> {
    lots.iter()
        .filter(|l| {
            l.disposal_date
                .is_some_and(|d| year.is_none_or(|y| y.contains(d)))
        })
        .filter_map(|disposal| {
            let warnings = check_wash_sale(disposal, lots, days);
            (!warnings.is_empty()).then_some(WashSale { disposal, warnings })
        })
        .collect()
}
