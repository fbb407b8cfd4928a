use crate::core::{validate_lots, Lot, LotError, Warning};
use crate::tax::fifo::{match_fifo, LotMatch};
use crate::tax::year::{CgtRules, TaxYear};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A disposal matched against its acquisition lots
#[derive(Debug, Clone, Serialize)]
pub struct DisposalRecord {
    pub lot: Lot,
    pub date: NaiveDate,
    pub tax_year: TaxYear,
    pub symbol: String,
    pub quantity: Decimal,
    pub proceeds: Decimal,
    pub cost_basis: Decimal,
    pub gain: Decimal,
    /// Acquisition lots consumed, oldest first
    pub matches: Vec<LotMatch>,
    pub warnings: Vec<Warning>,
}

impl DisposalRecord {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Realized gains and losses for one tax year
#[derive(Debug, Clone, Serialize)]
pub struct GainSummary {
    pub tax_year: TaxYear,
    pub gross_gains: Decimal,
    pub gross_losses: Decimal,
    pub net_gain: Decimal,
    pub disposals: Vec<DisposalRecord>,
    /// Acquisition lots still open after the year's disposals
    pub acquisitions_remaining: Vec<Lot>,
}

impl GainSummary {
    pub fn total_proceeds(&self) -> Decimal {
        self.disposals.iter().map(|d| d.proceeds).sum()
    }

    pub fn total_cost_basis(&self) -> Decimal {
        self.disposals.iter().map(|d| d.cost_basis).sum()
    }

    pub fn warnings(&self) -> impl Iterator<Item = (&DisposalRecord, &Warning)> {
        self.disposals
            .iter()
            .flat_map(|d| d.warnings.iter().map(move |w| (d, w)))
    }
}

/// Outcome of applying loss relief, the annual exemption and the rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaxComputation {
    pub net_after_losses: Decimal,
    pub taxable_gain: Decimal,
    pub exemption_used: Decimal,
    pub tax_due: Decimal,
    pub loss_carried_forward: Decimal,
}

/// Full CGT position for a tax year
#[derive(Debug, Clone, Serialize)]
pub struct CgtCalculation {
    pub tax_year: TaxYear,
    pub gross_gains: Decimal,
    pub gross_losses: Decimal,
    pub net_gain: Decimal,
    pub previous_losses: Decimal,
    pub annual_exemption: Decimal,
    pub exemption_used: Decimal,
    pub taxable_gain: Decimal,
    pub rate: Decimal,
    pub tax_due: Decimal,
    pub loss_carried_forward: Decimal,
    pub total_disposal_proceeds: Decimal,
    /// Cost basis matched against the year's disposals
    pub total_disposal_cost_basis: Decimal,
    /// Cost of the acquisitions still open after the year
    pub total_acquisition_cost: Decimal,
    pub disposals: Vec<DisposalRecord>,
    pub acquisitions_remaining: Vec<Lot>,
}

impl CgtCalculation {
    pub fn warning_count(&self) -> usize {
        self.disposals.iter().map(|d| d.warnings.len()).sum()
    }

    /// Portion of `previous_losses` not absorbed by this year's gain.
    pub fn unused_previous_losses(&self) -> Decimal {
        let absorbed = self.net_gain.max(Decimal::ZERO).min(self.previous_losses);
        self.previous_losses - absorbed
    }
}

/// Disposals grouped by symbol, each group sorted by disposal date.
fn disposals_by_symbol<'a>(
    lots: &'a [Lot],
    mut include: impl FnMut(&Lot) -> bool,
) -> BTreeMap<&'a str, Vec<&'a Lot>> {
    let mut grouped: BTreeMap<&str, Vec<&Lot>> = BTreeMap::new();
    for lot in lots.iter().filter(|l| l.is_disposal() && include(*l)) {
        grouped.entry(lot.symbol.as_str()).or_default().push(lot);
    }
    for disposals in grouped.values_mut() {
        // stable: same-day disposals keep input order
        disposals.sort_by_key(|l| l.disposal_date);
    }
    grouped
}

/// Open acquisition pools per symbol after every disposal dated before `until`
/// (or every disposal when `until` is `None`) has consumed its lots.
pub(crate) fn replay_disposals(lots: &[Lot], until: Option<NaiveDate>) -> BTreeMap<String, Vec<Lot>> {
    let mut pools: BTreeMap<String, Vec<Lot>> = BTreeMap::new();
    for lot in lots.iter().filter(|l| l.is_acquisition()) {
        pools.entry(lot.symbol.clone()).or_default().push(lot.clone());
    }

    let earlier = disposals_by_symbol(lots, |l| {
        match (l.disposal_date, until) {
            (Some(d), Some(until)) => d < until,
            _ => true,
        }
    });
    for (symbol, disposals) in earlier {
        let Some(pool) = pools.get_mut(symbol) else {
            continue;
        };
        for disposal in disposals {
            let m = match_fifo(pool, disposal.quantity);
            *pool = m.residual;
        }
    }
    pools
}

/// Compute realized gains and losses for disposals in `tax_year`.
///
/// Acquisitions of any year form the matching pool. Disposals from earlier
/// years are replayed first so an acquisition never funds two disposals.
/// Within the year, each symbol's disposals are matched oldest first.
pub fn compute_gains(lots: &[Lot], tax_year: TaxYear) -> GainSummary {
    let mut pools = replay_disposals(lots, tax_year.start_date());

    let mut gross_gains = Decimal::ZERO;
    let mut gross_losses = Decimal::ZERO;
    let mut disposals = Vec::new();

    let in_year = disposals_by_symbol(lots, |l| {
        l.disposal_date.is_some_and(|d| tax_year.contains(d))
    });
    for (symbol, symbol_disposals) in in_year {
        let pool = pools.entry(symbol.to_string()).or_default();

        for disposal in symbol_disposals {
            let Some(date) = disposal.disposal_date else {
                continue;
            };
            let m = match_fifo(pool, disposal.quantity);
            let proceeds = disposal.proceeds();
            let gain = proceeds - m.cost_basis;

            let mut warnings = Vec::new();
            if !m.is_fully_covered() {
                log::warn!(
                    "Disposal {} of {} {} on {}: only {} covered by acquisitions",
                    disposal.id,
                    disposal.quantity,
                    symbol,
                    date,
                    m.matched_quantity
                );
                warnings.push(Warning::InsufficientCostBasis {
                    available: m.matched_quantity,
                    required: disposal.quantity,
                });
            }
            for later in m.matches.iter().filter(|lm| lm.acquisition_date > date) {
                log::warn!(
                    "Disposal {} on {} matched lot {} acquired {}",
                    disposal.id,
                    date,
                    later.lot_id,
                    later.acquisition_date
                );
                warnings.push(Warning::MatchedLaterAcquisition {
                    lot_id: later.lot_id.clone(),
                    acquisition_date: later.acquisition_date,
                });
            }

            if gain > Decimal::ZERO {
                gross_gains += gain;
            } else if gain < Decimal::ZERO {
                gross_losses += gain.abs();
            }
            log::debug!(
                "Disposal {} {}: proceeds={}, cost={}, gain={}",
                disposal.id,
                symbol,
                proceeds,
                m.cost_basis,
                gain
            );

            disposals.push(DisposalRecord {
                lot: disposal.clone(),
                date,
                tax_year,
                symbol: symbol.to_string(),
                quantity: disposal.quantity,
                proceeds,
                cost_basis: m.cost_basis,
                gain,
                matches: m.matches,
                warnings,
            });
            *pool = m.residual;
        }
    }

    disposals.sort_by_key(|d| d.date);

    // remaining lots in input order
    let order: BTreeMap<&str, usize> = lots
        .iter()
        .enumerate()
        .map(|(i, l)| (l.id.as_str(), i))
        .collect();
    let mut acquisitions_remaining: Vec<Lot> = pools.into_values().flatten().collect();
    acquisitions_remaining.sort_by_key(|l| order.get(l.id.as_str()).copied());

    GainSummary {
        tax_year,
        gross_gains,
        gross_losses,
        net_gain: gross_gains - gross_losses,
        disposals,
        acquisitions_remaining,
    }
}

/// Apply prior-year losses, the annual exemption and the CGT rate.
///
/// `loss_carried_forward` reflects only this year's own net loss; previous
/// losses left unused are not carried by this function.
pub fn compute_tax(net_gain: Decimal, previous_losses: Decimal, rules: &CgtRules) -> TaxComputation {
    let previous_losses = previous_losses.max(Decimal::ZERO);
    let net_after_losses = (net_gain - previous_losses).max(Decimal::ZERO);
    let taxable_gain = (net_after_losses - rules.annual_exemption).max(Decimal::ZERO);
    let exemption_used = rules.annual_exemption.min(net_after_losses);
    let tax_due = taxable_gain * rules.rate;
    let loss_carried_forward = if net_gain < Decimal::ZERO {
        net_gain.abs()
    } else {
        Decimal::ZERO
    };

    TaxComputation {
        net_after_losses,
        taxable_gain,
        exemption_used,
        tax_due,
        loss_carried_forward,
    }
}

/// Validate `lots` and compute the CGT position for `tax_year`.
pub fn calculate_cgt(
    lots: &[Lot],
    tax_year: TaxYear,
    previous_losses: Decimal,
    rules: &CgtRules,
) -> Result<CgtCalculation, LotError> {
    validate_lots(lots)?;

    let gains = compute_gains(lots, tax_year);
    let tax = compute_tax(gains.net_gain, previous_losses, rules);
    let total_disposal_proceeds = gains.total_proceeds();
    let total_disposal_cost_basis = gains.total_cost_basis();
    let total_acquisition_cost = gains
        .acquisitions_remaining
        .iter()
        .map(|l| l.acquisition_cost)
        .sum();

    log::info!(
        "CGT {}: {} disposals, net gain {}, tax due {}",
        tax_year,
        gains.disposals.len(),
        gains.net_gain,
        tax.tax_due
    );

    Ok(CgtCalculation {
        tax_year,
        gross_gains: gains.gross_gains,
        gross_losses: gains.gross_losses,
        net_gain: gains.net_gain,
        previous_losses: previous_losses.max(Decimal::ZERO),
        annual_exemption: rules.annual_exemption,
        exemption_used: tax.exemption_used,
        taxable_gain: tax.taxable_gain,
        rate: rules.rate,
        tax_due: tax.tax_due,
        loss_carried_forward: tax.loss_carried_forward,
        total_disposal_proceeds,
        total_disposal_cost_basis,
        total_acquisition_cost,
        disposals: gains.disposals,
        acquisitions_remaining: gains.acquisitions_remaining,
    })
}

/// Tax years with at least one disposal
pub fn disposal_years(lots: &[Lot]) -> BTreeSet<TaxYear> {
    lots.iter()
        .filter_map(|l| l.disposal_date)
        .map(TaxYear::from_date)
        .collect()
}
