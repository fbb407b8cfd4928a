use crate::core::Lot;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// The part of one acquisition lot consumed by a disposal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotMatch {
    pub lot_id: String,
    pub acquisition_date: NaiveDate,
    pub quantity: Decimal,
    pub cost: Decimal,
}

/// Result of matching one disposal against a set of acquisition lots
#[derive(Debug, Clone, PartialEq)]
pub struct FifoMatch {
    /// Total cost basis consumed by the disposal
    pub cost_basis: Decimal,
    /// Quantity covered by acquisitions
    pub matched_quantity: Decimal,
    /// Quantity the acquisitions could not cover
    pub shortfall: Decimal,
    /// Consumed lots, oldest first
    pub matches: Vec<LotMatch>,
    /// Unconsumed lots and remainders of a partially consumed lot, oldest first
    pub residual: Vec<Lot>,
}

impl FifoMatch {
    pub fn is_fully_covered(&self) -> bool {
        self.shortfall.is_zero()
    }
}

/// Match a disposal of `disposal_quantity` against `acquisitions` using FIFO.
///
/// All acquisitions must belong to the same symbol. Lots are taken oldest
/// first by acquisition date; lots acquired on the same date keep their
/// input order. A partially consumed lot is split, with cost apportioned by
/// quantity. If the acquisitions cannot cover the disposal the available cost
/// basis is used and the uncovered quantity is returned as `shortfall`.
///
/// The input lots are never modified.
pub fn match_fifo(acquisitions: &[Lot], disposal_quantity: Decimal) -> FifoMatch {
    let mut sorted: Vec<&Lot> = acquisitions.iter().collect();
    // stable: same-day lots stay in input order
    sorted.sort_by_key(|lot| lot.acquisition_date);

    let mut remaining = disposal_quantity.max(Decimal::ZERO);
    let mut cost_basis = Decimal::ZERO;
    let mut matches = Vec::new();
    let mut residual = Vec::new();

    for lot in sorted {
        if remaining.is_zero() {
            residual.push(lot.clone());
            continue;
        }

        if lot.quantity <= remaining {
            cost_basis += lot.acquisition_cost;
            remaining -= lot.quantity;
            matches.push(LotMatch {
                lot_id: lot.id.clone(),
                acquisition_date: lot.acquisition_date,
                quantity: lot.quantity,
                cost: lot.acquisition_cost,
            });
            log::debug!(
                "FIFO {} CONSUME lot {}: qty={}, cost={}",
                lot.symbol,
                lot.id,
                lot.quantity,
                lot.acquisition_cost
            );
        } else {
            // multiply before dividing so whole-unit splits stay exact
            let cost = lot.acquisition_cost * remaining / lot.quantity;
            let left = lot.quantity - remaining;
            residual.push(lot.with_remainder(left, lot.acquisition_cost - cost));
            cost_basis += cost;
            matches.push(LotMatch {
                lot_id: lot.id.clone(),
                acquisition_date: lot.acquisition_date,
                quantity: remaining,
                cost,
            });
            log::debug!(
                "FIFO {} SPLIT lot {}: qty={}, cost={}. Remaining in lot: qty={}, cost={}",
                lot.symbol,
                lot.id,
                remaining,
                cost,
                left,
                lot.acquisition_cost - cost
            );
            remaining = Decimal::ZERO;
        }
    }

    let shortfall = remaining;
    FifoMatch {
        cost_basis,
        matched_quantity: disposal_quantity.max(Decimal::ZERO) - shortfall,
        shortfall,
        matches,
        residual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AssetClass;
    use rust_decimal_macros::dec;

    fn acq(id: &str, date: &str, qty: Decimal, cost: Decimal) -> Lot {
        Lot {
            id: id.to_string(),
            symbol: "ETH".to_string(),
            asset_class: AssetClass::Crypto,
            quantity: qty,
            acquisition_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            acquisition_price_each: cost / qty,
            acquisition_cost: cost,
            disposal_date: None,
            disposal_price_each: None,
            disposal_proceeds: None,
        }
    }

    #[test]
    fn oldest_lot_funds_disposal() {
        // Input deliberately out of date order
        let lots = vec![
            acq("c", "2023-03-01", dec!(3), dec!(900)),
            acq("a", "2023-01-01", dec!(5), dec!(500)),
            acq("b", "2023-02-01", dec!(4), dec!(800)),
        ];

        let m = match_fifo(&lots, dec!(2));

        assert_eq!(m.cost_basis, dec!(200));
        assert_eq!(m.matches.len(), 1);
        assert_eq!(m.matches[0].lot_id, "a");
        assert_eq!(m.residual[0].id, "a");
        assert_eq!(m.residual[0].quantity, dec!(3));
        assert_eq!(m.residual[0].acquisition_cost, dec!(300));
        // Later lots untouched, now in date order
        assert_eq!(m.residual[1], lots[2]);
        assert_eq!(m.residual[2], lots[0]);
    }

    #[test]
    fn partial_split_conserves_quantity_and_cost() {
        let lots = vec![acq("a", "2023-01-01", dec!(3), dec!(1000))];

        let m = match_fifo(&lots, dec!(1.25));

        let consumed = &m.matches[0];
        let left = &m.residual[0];
        assert_eq!(consumed.quantity + left.quantity, dec!(3));
        assert_eq!(consumed.cost + left.acquisition_cost, dec!(1000));
        assert_eq!(m.cost_basis, consumed.cost);
    }

    #[test]
    fn exact_quantity_removes_lot() {
        let lots = vec![
            acq("a", "2023-01-01", dec!(2), dec!(2000)),
            acq("b", "2023-06-01", dec!(3), dec!(6000)),
        ];

        let m = match_fifo(&lots, dec!(2));

        assert_eq!(m.cost_basis, dec!(2000));
        assert_eq!(m.residual.len(), 1);
        assert!(m.residual.iter().all(|l| l.id != "a"));
        assert!(m.is_fully_covered());
    }

    #[test]
    fn spans_multiple_lots() {
        let lots = vec![
            acq("a", "2023-01-01", dec!(2), dec!(2000)),
            acq("b", "2023-06-01", dec!(3), dec!(6000)),
        ];

        let m = match_fifo(&lots, dec!(4));

        assert_eq!(m.cost_basis, dec!(6000));
        assert_eq!(m.matched_quantity, dec!(4));
        assert_eq!(m.matches.len(), 2);
        assert_eq!(m.matches[1].quantity, dec!(2));
        assert_eq!(m.matches[1].cost, dec!(4000));
        assert_eq!(m.residual.len(), 1);
        assert_eq!(m.residual[0].quantity, dec!(1));
        assert_eq!(m.residual[0].acquisition_cost, dec!(2000));
    }

    #[test]
    fn same_day_lots_keep_input_order() {
        let lots = vec![
            acq("first", "2023-01-01", dec!(1), dec!(100)),
            acq("second", "2023-01-01", dec!(1), dec!(300)),
        ];

        let m = match_fifo(&lots, dec!(1));

        assert_eq!(m.cost_basis, dec!(100));
        assert_eq!(m.residual[0].id, "second");
    }

    #[test]
    fn insufficient_lots_report_shortfall() {
        let lots = vec![acq("a", "2023-01-01", dec!(5), dec!(50000))];

        let m = match_fifo(&lots, dec!(10));

        assert_eq!(m.cost_basis, dec!(50000));
        assert_eq!(m.matched_quantity, dec!(5));
        assert_eq!(m.shortfall, dec!(5));
        assert!(!m.is_fully_covered());
        assert!(m.residual.is_empty());
    }

    #[test]
    fn no_lots_means_zero_cost() {
        let m = match_fifo(&[], dec!(1));
        assert_eq!(m.cost_basis, Decimal::ZERO);
        assert_eq!(m.shortfall, dec!(1));
    }

    #[test]
    fn inputs_not_mutated() {
        let lots = vec![acq("a", "2023-01-01", dec!(3), dec!(900))];
        let before = lots.clone();

        let _ = match_fifo(&lots, dec!(1));

        assert_eq!(lots, before);
    }

    #[test]
    fn fractional_crypto_splits_stay_exact() {
        let lots = vec![acq("a", "2023-01-01", dec!(0.3), dec!(9000))];

        let mut pool = lots;
        let mut total = Decimal::ZERO;
        for _ in 0..3 {
            let m = match_fifo(&pool, dec!(0.1));
            total += m.cost_basis;
            pool = m.residual;
        }

        assert_eq!(total, dec!(9000));
        assert!(pool.is_empty());
    }
}
