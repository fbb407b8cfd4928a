use crate::core::{validate_lots, AssetClass, Lot, LotError};
use crate::tax::cgt::{replay_disposals, CgtCalculation};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Current position in one asset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioHolding {
    pub symbol: String,
    pub asset_class: AssetClass,
    pub quantity: Decimal,
    pub total_cost_basis: Decimal,
    pub average_cost_basis: Decimal,
    pub current_price: Option<Decimal>,
    pub current_value: Option<Decimal>,
    pub unrealized_gain: Option<Decimal>,
    pub unrealized_gain_percent: Option<Decimal>,
}

impl PortfolioHolding {
    fn priced(mut self, price: Decimal) -> Self {
        let value = self.quantity * price;
        let gain = value - self.total_cost_basis;
        self.current_price = Some(price);
        self.current_value = Some(value);
        self.unrealized_gain = Some(gain);
        self.unrealized_gain_percent = percent_of(gain, self.total_cost_basis);
        self
    }
}

fn percent_of(amount: Decimal, base: Decimal) -> Option<Decimal> {
    if base.is_zero() {
        None
    } else {
        Some(amount * dec!(100) / base)
    }
}

fn lookup_price(prices: &HashMap<String, Decimal>, symbol: &str) -> Option<Decimal> {
    prices
        .get(symbol)
        .or_else(|| prices.get(&symbol.to_uppercase()))
        .copied()
}

/// Group open acquisition lots into holdings, valued at `prices` where known.
///
/// Disposal records in `open_lots` are ignored. Symbols whose aggregate
/// quantity is zero are left out. Holdings come back ordered by symbol.
pub fn aggregate_holdings(
    open_lots: &[Lot],
    prices: &HashMap<String, Decimal>,
) -> Vec<PortfolioHolding> {
    let mut grouped: BTreeMap<&str, (AssetClass, Decimal, Decimal)> = BTreeMap::new();
    for lot in open_lots.iter().filter(|l| l.is_acquisition()) {
        let entry = grouped
            .entry(lot.symbol.as_str())
            .or_insert((lot.asset_class, Decimal::ZERO, Decimal::ZERO));
        entry.1 += lot.quantity;
        entry.2 += lot.acquisition_cost;
    }

    grouped
        .into_iter()
        .filter(|(_, (_, quantity, _))| !quantity.is_zero())
        .map(|(symbol, (asset_class, quantity, cost))| {
            let holding = PortfolioHolding {
                symbol: symbol.to_string(),
                asset_class,
                quantity,
                total_cost_basis: cost,
                average_cost_basis: cost / quantity,
                current_price: None,
                current_value: None,
                unrealized_gain: None,
                unrealized_gain_percent: None,
            };
            match lookup_price(prices, symbol) {
                Some(price) => holding.priced(price),
                None => holding,
            }
        })
        .collect()
}

/// Current holdings from a full lot history.
///
/// Every disposal consumes its acquisitions FIFO first, so only the
/// unconsumed quantity and cost remain in the holdings.
pub fn valuate_holdings(
    lots: &[Lot],
    prices: &HashMap<String, Decimal>,
) -> Result<Vec<PortfolioHolding>, LotError> {
    validate_lots(lots)?;
    let open: Vec<Lot> = replay_disposals(lots, None).into_values().flatten().collect();
    Ok(aggregate_holdings(&open, prices))
}

/// Portfolio-wide totals for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    /// Market value of priced holdings
    pub total_value: Decimal,
    /// Cost basis of priced holdings
    pub total_cost: Decimal,
    pub total_gain: Decimal,
    pub total_gain_percent: Decimal,
    /// Holdings without a current price, excluded from the totals above
    pub unpriced_symbols: Vec<String>,
    pub realized_gains: Option<Decimal>,
    pub cgt_due: Option<Decimal>,
}

/// Totals across `holdings`, plus realized figures when a year's
/// calculation is supplied.
pub fn summarize_portfolio(
    holdings: &[PortfolioHolding],
    calculation: Option<&CgtCalculation>,
) -> PortfolioSummary {
    let mut total_value = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;
    let mut unpriced_symbols = Vec::new();

    for holding in holdings {
        match holding.current_value {
            Some(value) => {
                total_value += value;
                total_cost += holding.total_cost_basis;
            }
            None => unpriced_symbols.push(holding.symbol.clone()),
        }
    }

    let total_gain = total_value - total_cost;
    PortfolioSummary {
        total_value,
        total_cost,
        total_gain,
        total_gain_percent: percent_of(total_gain, total_cost).unwrap_or(Decimal::ZERO),
        unpriced_symbols,
        realized_gains: calculation.map(|c| c.net_gain),
        cgt_due: calculation.map(|c| c.tax_due),
    }
}
