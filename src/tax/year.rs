use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Irish tax year. Runs with the calendar year, 1 January to 31 December.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaxYear(pub i32);

impl TaxYear {
    pub fn from_date(date: NaiveDate) -> Self {
        TaxYear(date.year())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.0
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0, 1, 1)
    }

    pub fn next(&self) -> TaxYear {
        TaxYear(self.0 + 1)
    }

    pub fn display(&self) -> String {
        self.0.to_string()
    }
}

impl std::fmt::Display for TaxYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Personal annual exemption, per person and not transferable
pub const ANNUAL_EXEMPTION: Decimal = dec!(1270);

pub const CGT_RATE: Decimal = dec!(0.33);

/// Exemption and rate applied by the tax computation.
///
/// The default is the current regime, used for every tax year unless a
/// caller overrides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CgtRules {
    pub annual_exemption: Decimal,
    pub rate: Decimal,
}

impl Default for CgtRules {
    fn default() -> Self {
        CgtRules {
            annual_exemption: ANNUAL_EXEMPTION,
            rate: CGT_RATE,
        }
    }
}

impl CgtRules {
    pub fn with_exemption(self, annual_exemption: Decimal) -> Self {
        CgtRules {
            annual_exemption,
            ..self
        }
    }

    pub fn with_rate(self, rate: Decimal) -> Self {
        CgtRules { rate, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn tax_year_is_calendar_year() {
        assert_eq!(TaxYear::from_date(date("2024-01-01")), TaxYear(2024));
        assert_eq!(TaxYear::from_date(date("2024-12-31")), TaxYear(2024));
        assert_eq!(TaxYear::from_date(date("2025-01-01")), TaxYear(2025));
    }

    #[test]
    fn tax_year_contains() {
        let ty = TaxYear(2024);
        assert!(ty.contains(date("2024-06-01")));
        assert!(!ty.contains(date("2023-12-31")));
        assert!(!ty.contains(date("2025-01-01")));
    }

    #[test]
    fn tax_year_start_and_next() {
        let ty = TaxYear(2024);
        assert_eq!(ty.start_date(), Some(date("2024-01-01")));
        assert_eq!(ty.next(), TaxYear(2025));
        assert_eq!(ty.display(), "2024");
    }

    #[test]
    fn default_rules() {
        let rules = CgtRules::default();
        assert_eq!(rules.annual_exemption, dec!(1270));
        assert_eq!(rules.rate, dec!(0.33));
    }

    #[test]
    fn rule_overrides() {
        let rules = CgtRules::default()
            .with_exemption(Decimal::ZERO)
            .with_rate(dec!(0.40));
        assert_eq!(rules.annual_exemption, Decimal::ZERO);
        assert_eq!(rules.rate, dec!(0.40));
    }
}
