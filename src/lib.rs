//! Irish Capital Gains Tax for investment portfolios.
//!
//! FIFO cost-basis matching of disposals against acquisition lots, annual
//! exemption and loss relief, current holdings valuation and per-year reports.
//! Every calculation is a pure function over caller-supplied lots.

pub mod core;
pub mod money;
pub mod tax;
pub mod utils;

pub use crate::core::{AssetClass, Lot, LotError, Warning};
pub use crate::tax::{
    build_tax_year_report, calculate_cgt, compute_gains, compute_tax, match_fifo,
    valuate_holdings, CgtCalculation, CgtRules, PortfolioHolding, TaxYear, TaxYearReport,
};
