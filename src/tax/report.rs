use crate::core::{Lot, LotError};
use crate::money::{round_eur, round_quantity};
use crate::tax::cgt::{calculate_cgt, CgtCalculation, DisposalRecord};
use crate::tax::year::{CgtRules, TaxYear};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// Per-year CGT figures for export and display.
///
/// A projection of `CgtCalculation`; amounts are rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxYearReport {
    pub tax_year: TaxYear,
    pub total_realized_gains: Decimal,
    pub total_realized_losses: Decimal,
    pub net_gain: Decimal,
    pub exemption_used: Decimal,
    pub taxable_gain: Decimal,
    pub cgt_due: Decimal,
    pub loss_carried_forward: Decimal,
    pub transactions: Vec<Lot>,
}

impl From<&CgtCalculation> for TaxYearReport {
    fn from(c: &CgtCalculation) -> Self {
        TaxYearReport {
            tax_year: c.tax_year,
            total_realized_gains: round_eur(c.gross_gains),
            total_realized_losses: round_eur(c.gross_losses),
            net_gain: round_eur(c.net_gain),
            exemption_used: round_eur(c.exemption_used),
            taxable_gain: round_eur(c.taxable_gain),
            cgt_due: round_eur(c.tax_due),
            loss_carried_forward: round_eur(c.loss_carried_forward),
            transactions: c.disposals.iter().map(|d| d.lot.clone()).collect(),
        }
    }
}

/// Build the report for `tax_year` with the default exemption and rate.
pub fn build_tax_year_report(
    lots: &[Lot],
    tax_year: TaxYear,
    previous_losses: Decimal,
) -> Result<TaxYearReport, LotError> {
    build_tax_year_report_with_rules(lots, tax_year, previous_losses, &CgtRules::default())
}

pub fn build_tax_year_report_with_rules(
    lots: &[Lot],
    tax_year: TaxYear,
    previous_losses: Decimal,
    rules: &CgtRules,
) -> Result<TaxYearReport, LotError> {
    let calculation = calculate_cgt(lots, tax_year, previous_losses, rules)?;
    Ok(TaxYearReport::from(&calculation))
}

/// One year of a multi-year report, with the loss position carried in and out
#[derive(Debug, Clone, Serialize)]
pub struct LedgerYear {
    pub report: TaxYearReport,
    pub losses_brought_forward: Decimal,
    /// Brought-forward losses not absorbed by this year's gain
    pub unused_previous_losses: Decimal,
    /// Losses available to the following year
    pub losses_available_next_year: Decimal,
}

/// Reports for each year in `from..=to`, carrying losses between years.
///
/// Each year receives the previous year's unused brought-forward losses plus
/// its own loss carried forward. `rules` apply to every year, so per-year
/// figures match `build_tax_year_report_with_rules` called with the same
/// brought-forward amount.
pub fn build_multi_year_reports(
    lots: &[Lot],
    from: TaxYear,
    to: TaxYear,
    opening_losses: Decimal,
    rules: &CgtRules,
) -> Result<Vec<LedgerYear>, LotError> {
    let mut years = Vec::new();
    let mut brought_forward = opening_losses.max(Decimal::ZERO);
    let mut year = from;

    while year <= to {
        let calculation = calculate_cgt(lots, year, brought_forward, rules)?;
        let unused = calculation.unused_previous_losses();
        let available = unused + calculation.loss_carried_forward;

        log::debug!(
            "Loss ledger {}: brought forward {}, unused {}, carried {}",
            year,
            brought_forward,
            unused,
            available
        );

        years.push(LedgerYear {
            report: TaxYearReport::from(&calculation),
            losses_brought_forward: round_eur(brought_forward),
            unused_previous_losses: round_eur(unused),
            losses_available_next_year: round_eur(available),
        });

        brought_forward = available;
        year = year.next();
    }

    Ok(years)
}

/// CSV row for a disposal
#[derive(Debug, Serialize)]
pub struct DisposalCsvRecord {
    pub id: String,
    pub date: String,
    pub tax_year: i32,
    pub symbol: String,
    pub asset_class: String,
    pub quantity: String,
    pub proceeds_eur: String,
    pub cost_basis_eur: String,
    pub gain_eur: String,
    pub matched_lots: String,
    pub warnings: String,
}

impl From<&DisposalRecord> for DisposalCsvRecord {
    fn from(d: &DisposalRecord) -> Self {
        DisposalCsvRecord {
            id: d.lot.id.clone(),
            date: d.date.format("%Y-%m-%d").to_string(),
            tax_year: d.tax_year.0,
            symbol: d.symbol.clone(),
            asset_class: d.lot.asset_class.display().to_string(),
            quantity: round_quantity(d.quantity).to_string(),
            proceeds_eur: format!("{:.2}", round_eur(d.proceeds)),
            cost_basis_eur: format!("{:.2}", round_eur(d.cost_basis)),
            gain_eur: format!("{:.2}", round_eur(d.gain)),
            matched_lots: d
                .matches
                .iter()
                .map(|m| format!("{}:{}", m.lot_id, round_quantity(m.quantity)))
                .collect::<Vec<_>>()
                .join(" "),
            warnings: d
                .warnings
                .iter()
                .map(|w| w.kind())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Write the disposals of a calculation as CSV
pub fn write_disposals_csv<W: Write>(calculation: &CgtCalculation, writer: W) -> anyhow::Result<()> {
    crate::utils::write_csv(
        calculation.disposals.iter().map(DisposalCsvRecord::from),
        writer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AssetClass;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn acq(id: &str, on: &str, qty: Decimal, cost: Decimal) -> Lot {
        Lot {
            id: id.to_string(),
            symbol: "BTC".to_string(),
            asset_class: AssetClass::Crypto,
            quantity: qty,
            acquisition_date: date(on),
            acquisition_price_each: cost / qty,
            acquisition_cost: cost,
            disposal_date: None,
            disposal_price_each: None,
            disposal_proceeds: None,
        }
    }

    fn disp(id: &str, on: &str, qty: Decimal, proceeds: Decimal) -> Lot {
        Lot {
            acquisition_price_each: Decimal::ZERO,
            acquisition_cost: Decimal::ZERO,
            disposal_date: Some(date(on)),
            disposal_proceeds: Some(proceeds),
            ..acq(id, on, qty, Decimal::ONE)
        }
    }

    #[test]
    fn report_projects_calculation() {
        let lots = vec![
            acq("1", "2024-01-01", dec!(1), dec!(20000)),
            disp("2", "2024-06-01", dec!(1), dec!(35000)),
        ];

        let report = build_tax_year_report(&lots, TaxYear(2024), Decimal::ZERO).unwrap();

        assert_eq!(report.tax_year, TaxYear(2024));
        assert_eq!(report.total_realized_gains, dec!(15000));
        assert_eq!(report.total_realized_losses, Decimal::ZERO);
        assert_eq!(report.net_gain, dec!(15000));
        assert_eq!(report.exemption_used, dec!(1270));
        assert_eq!(report.taxable_gain, dec!(13730));
        assert_eq!(report.cgt_due, dec!(4530.90));
        assert_eq!(report.loss_carried_forward, Decimal::ZERO);
        assert_eq!(report.transactions.len(), 1);
        assert_eq!(report.transactions[0].id, "2");
    }

    #[test]
    fn report_uses_actual_exemption_used() {
        let lots = vec![
            acq("1", "2024-01-01", dec!(1), dec!(1000)),
            disp("2", "2024-06-01", dec!(1), dec!(1500)),
        ];

        let report = build_tax_year_report(&lots, TaxYear(2024), Decimal::ZERO).unwrap();

        assert_eq!(report.exemption_used, dec!(500));
        assert_eq!(report.cgt_due, Decimal::ZERO);
    }

    #[test]
    fn report_rounds_tax_half_up() {
        let lots = vec![
            acq("1", "2024-01-01", dec!(1), dec!(1000)),
            disp("2", "2024-06-01", dec!(1), dec!(2271.05)),
        ];

        let report = build_tax_year_report(&lots, TaxYear(2024), Decimal::ZERO).unwrap();

        // 1.05 * 0.33 = 0.3465
        assert_eq!(report.taxable_gain, dec!(1.05));
        assert_eq!(report.cgt_due, dec!(0.35));
    }

    #[test]
    fn report_uses_default_rules_for_any_year() {
        let lots = vec![
            acq("1", "2010-01-01", dec!(1), dec!(20000)),
            disp("2", "2011-06-01", dec!(1), dec!(35000)),
        ];

        let report = build_tax_year_report(&lots, TaxYear(2011), Decimal::ZERO).unwrap();

        assert_eq!(report.taxable_gain, dec!(13730));
        assert_eq!(report.cgt_due, dec!(4530.90));
    }

    #[test]
    fn ledger_carries_losses_between_years() {
        let lots = vec![
            acq("1", "2022-01-01", dec!(2), dec!(20000)),
            // 2023: loss of 4000
            disp("2", "2023-06-01", dec!(1), dec!(6000)),
            // 2024: gain of 6000
            disp("3", "2024-06-01", dec!(1), dec!(16000)),
        ];

        let rules = CgtRules::default();
        let years = build_multi_year_reports(&lots, TaxYear(2023), TaxYear(2024), Decimal::ZERO, &rules)
            .unwrap();

        assert_eq!(years.len(), 2);
        assert_eq!(years[0].report.loss_carried_forward, dec!(4000));
        assert_eq!(years[0].losses_available_next_year, dec!(4000));

        let y2024 = &years[1];
        assert_eq!(y2024.losses_brought_forward, dec!(4000));
        assert_eq!(y2024.report.net_gain, dec!(6000));
        // 6000 - 4000 = 2000, exemption 1270, taxable 730
        assert_eq!(y2024.report.taxable_gain, dec!(730));
        assert_eq!(y2024.report.cgt_due, dec!(240.90));
        assert_eq!(y2024.unused_previous_losses, Decimal::ZERO);
        assert_eq!(y2024.losses_available_next_year, Decimal::ZERO);
    }

    #[test]
    fn ledger_keeps_unused_losses() {
        let lots = vec![
            acq("1", "2022-01-01", dec!(2), dec!(20000)),
            disp("2", "2023-06-01", dec!(1), dec!(2000)),
            disp("3", "2024-06-01", dec!(1), dec!(11000)),
        ];

        let rules = CgtRules::default();
        let years = build_multi_year_reports(&lots, TaxYear(2023), TaxYear(2025), dec!(500), &rules)
            .unwrap();

        // 2023: loss 8000 + 500 opening, nothing absorbed
        assert_eq!(years[0].unused_previous_losses, dec!(500));
        assert_eq!(years[0].losses_available_next_year, dec!(8500));
        // 2024: gain 1000 absorbs 1000
        assert_eq!(years[1].unused_previous_losses, dec!(7500));
        assert_eq!(years[1].report.cgt_due, Decimal::ZERO);
        // 2025: no disposals, losses carried on
        assert_eq!(years[2].losses_available_next_year, dec!(7500));
    }

    #[test]
    fn ledger_year_matches_single_report() {
        let lots = vec![
            acq("1", "2022-01-01", dec!(2), dec!(20000)),
            disp("2", "2023-06-01", dec!(1), dec!(6000)),
            disp("3", "2024-06-01", dec!(1), dec!(16000)),
        ];

        let rules = CgtRules::default();
        let years = build_multi_year_reports(&lots, TaxYear(2023), TaxYear(2024), Decimal::ZERO, &rules)
            .unwrap();
        let single = build_tax_year_report(&lots, TaxYear(2024), dec!(4000)).unwrap();

        assert_eq!(years[1].report, single);
    }

    #[test]
    fn ledger_applies_rules_to_every_year() {
        let lots = vec![
            acq("1", "2010-01-01", dec!(2), dec!(20000)),
            disp("2", "2011-06-01", dec!(1), dec!(20000)),
            disp("3", "2024-06-01", dec!(1), dec!(20000)),
        ];
        let rules = CgtRules::default().with_exemption(Decimal::ZERO);

        let years =
            build_multi_year_reports(&lots, TaxYear(2011), TaxYear(2024), Decimal::ZERO, &rules)
                .unwrap();

        assert_eq!(years.len(), 14);
        assert_eq!(years[0].report.cgt_due, dec!(3300));
        assert_eq!(years[13].report.cgt_due, dec!(3300));
    }

    #[test]
    fn disposal_csv_output() {
        let lots = vec![
            acq("1", "2023-01-01", dec!(2), dec!(2000)),
            acq("2", "2023-06-01", dec!(3), dec!(6000)),
            disp("3", "2024-03-01", dec!(4), dec!(16000)),
        ];
        let calculation =
            calculate_cgt(&lots, TaxYear(2024), Decimal::ZERO, &CgtRules::default()).unwrap();

        let mut out = Vec::new();
        write_disposals_csv(&calculation, &mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();

        assert!(csv.starts_with("id,date,tax_year,symbol,asset_class,quantity"));
        assert!(csv.contains("3,2024-03-01,2024,BTC,Crypto,4,16000.00,6000.00,10000.00,1:2 2:2,"));
    }
}
