pub mod cgt;
pub mod fifo;
pub mod holdings;
pub mod report;
pub mod wash_sale;
pub mod year;

pub use cgt::{
    calculate_cgt, compute_gains, compute_tax, disposal_years, CgtCalculation, DisposalRecord,
    GainSummary, TaxComputation,
};
pub use fifo::{match_fifo, FifoMatch, LotMatch};
pub use holdings::{
    aggregate_holdings, summarize_portfolio, valuate_holdings, PortfolioHolding, PortfolioSummary,
};
pub use report::{
    build_multi_year_reports, build_tax_year_report, build_tax_year_report_with_rules, LedgerYear,
    TaxYearReport,
};
pub use wash_sale::{check_wash_sale, detect_wash_sales, WashSale};
pub use year::{CgtRules, TaxYear, ANNUAL_EXEMPTION, CGT_RATE};
