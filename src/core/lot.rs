use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LotError {
    #[error("duplicate lot id: {0}")]
    DuplicateId(String),
    #[error("lot {id}: symbol must not be empty")]
    EmptySymbol { id: String },
    #[error("lot {id}: quantity must be positive, got {quantity}")]
    NonPositiveQuantity { id: String, quantity: Decimal },
    #[error("lot {id}: {field} must not be negative, got {value}")]
    NegativeAmount {
        id: String,
        field: &'static str,
        value: Decimal,
    },
    #[error("lot {id}: disposal date {disposal} is before acquisition date {acquisition}")]
    DisposalBeforeAcquisition {
        id: String,
        acquisition: NaiveDate,
        disposal: NaiveDate,
    },
    #[error("lot {id}: disposal needs proceeds or a price per unit")]
    MissingDisposalProceeds { id: String },
    #[error("lot {id}: disposal details given without a disposal date")]
    DisposalFieldsWithoutDate { id: String },
}

/// Asset class of a lot
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    #[default]
    Crypto,
    Stock,
    Etf,
}

impl AssetClass {
    pub fn display(&self) -> &'static str {
        match self {
            AssetClass::Crypto => "Crypto",
            AssetClass::Stock => "Stock",
            AssetClass::Etf => "ETF",
        }
    }
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// An acquisition of an asset, or a disposal when `disposal_date` is set.
///
/// All amounts are in the settlement currency (EUR).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Lot {
    /// Unique identifier, used to trace matches back to source records
    pub id: String,
    /// Asset ticker (e.g. BTC, ETH, VWCE)
    pub symbol: String,
    #[serde(default)]
    pub asset_class: AssetClass,
    /// Amount of the asset, must be positive
    #[schemars(with = "f64")]
    pub quantity: Decimal,
    /// Date the asset was obtained
    pub acquisition_date: NaiveDate,
    /// Price per unit at acquisition
    #[serde(default)]
    #[schemars(with = "f64")]
    pub acquisition_price_each: Decimal,
    /// Total acquisition cost including fees
    #[schemars(with = "f64")]
    pub acquisition_cost: Decimal,
    /// Set when this record is a disposal
    #[serde(default)]
    pub disposal_date: Option<NaiveDate>,
    /// Price per unit at disposal
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub disposal_price_each: Option<Decimal>,
    /// Total disposal proceeds net of fees
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub disposal_proceeds: Option<Decimal>,
}

impl Lot {
    pub fn is_disposal(&self) -> bool {
        self.disposal_date.is_some()
    }

    pub fn is_acquisition(&self) -> bool {
        self.disposal_date.is_none()
    }

    /// Net proceeds of a disposal. Falls back to `quantity * disposal_price_each`
    /// when no explicit proceeds were recorded.
    pub fn proceeds(&self) -> Decimal {
        match (self.disposal_proceeds, self.disposal_price_each) {
            (Some(proceeds), _) => proceeds,
            (None, Some(price)) => self.quantity * price,
            (None, None) => Decimal::ZERO,
        }
    }

    /// Derive a residual lot holding `quantity` units at `cost`.
    pub(crate) fn with_remainder(&self, quantity: Decimal, cost: Decimal) -> Lot {
        Lot {
            quantity,
            acquisition_cost: cost,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), LotError> {
        let id = || self.id.clone();

        if self.symbol.trim().is_empty() {
            return Err(LotError::EmptySymbol { id: id() });
        }
        if self.quantity <= Decimal::ZERO {
            return Err(LotError::NonPositiveQuantity {
                id: id(),
                quantity: self.quantity,
            });
        }

        let amounts = [
            ("acquisition_cost", Some(self.acquisition_cost)),
            ("acquisition_price_each", Some(self.acquisition_price_each)),
            ("disposal_price_each", self.disposal_price_each),
            ("disposal_proceeds", self.disposal_proceeds),
        ];
        for (field, value) in amounts {
            if let Some(value) = value.filter(|v| *v < Decimal::ZERO) {
                return Err(LotError::NegativeAmount {
                    id: id(),
                    field,
                    value,
                });
            }
        }

        match self.disposal_date {
            Some(disposal) => {
                if disposal < self.acquisition_date {
                    return Err(LotError::DisposalBeforeAcquisition {
                        id: id(),
                        acquisition: self.acquisition_date,
                        disposal,
                    });
                }
                if self.disposal_proceeds.is_none() && self.disposal_price_each.is_none() {
                    return Err(LotError::MissingDisposalProceeds { id: id() });
                }
            }
            None => {
                if self.disposal_proceeds.is_some() || self.disposal_price_each.is_some() {
                    return Err(LotError::DisposalFieldsWithoutDate { id: id() });
                }
            }
        }
        Ok(())
    }
}

/// Validate every lot and reject duplicate ids.
pub fn validate_lots(lots: &[Lot]) -> Result<(), LotError> {
    let mut seen = HashSet::new();
    for lot in lots {
        lot.validate()?;
        if !seen.insert(lot.id.as_str()) {
            return Err(LotError::DuplicateId(lot.id.clone()));
        }
    }
    Ok(())
}

/// Input root for lot JSON
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LotInput {
    pub lots: Vec<Lot>,
}

pub fn read_lots_json<R: Read>(reader: R) -> Result<Vec<Lot>, serde_json::Error> {
    let input: LotInput = serde_json::from_reader(reader)?;
    Ok(input.lots)
}

/// Read lots from CSV, one lot per row with the `Lot` field names as headers.
pub fn read_lots_csv<R: Read>(reader: R) -> Result<Vec<Lot>, csv::Error> {
    let mut rdr = csv::Reader::from_reader(reader);
    rdr.deserialize().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn lot(id: &str) -> Lot {
        Lot {
            id: id.to_string(),
            symbol: "BTC".to_string(),
            asset_class: AssetClass::Crypto,
            quantity: dec!(1),
            acquisition_date: date("2024-01-01"),
            acquisition_price_each: dec!(20000),
            acquisition_cost: dec!(20000),
            disposal_date: None,
            disposal_price_each: None,
            disposal_proceeds: None,
        }
    }

    #[test]
    fn valid_acquisition_passes() {
        assert_eq!(lot("a").validate(), Ok(()));
    }

    #[test]
    fn zero_quantity_rejected() {
        let mut l = lot("a");
        l.quantity = Decimal::ZERO;
        assert!(matches!(
            l.validate(),
            Err(LotError::NonPositiveQuantity { .. })
        ));
    }

    #[test]
    fn negative_cost_rejected() {
        let mut l = lot("a");
        l.acquisition_cost = dec!(-1);
        assert_eq!(
            l.validate(),
            Err(LotError::NegativeAmount {
                id: "a".to_string(),
                field: "acquisition_cost",
                value: dec!(-1),
            })
        );
    }

    #[test]
    fn negative_proceeds_rejected() {
        let mut l = lot("a");
        l.disposal_date = Some(date("2024-02-01"));
        l.disposal_proceeds = Some(dec!(-5));
        assert!(matches!(
            l.validate(),
            Err(LotError::NegativeAmount {
                field: "disposal_proceeds",
                ..
            })
        ));
    }

    #[test]
    fn disposal_before_acquisition_rejected() {
        let mut l = lot("a");
        l.disposal_date = Some(date("2023-12-31"));
        l.disposal_proceeds = Some(dec!(100));
        assert!(matches!(
            l.validate(),
            Err(LotError::DisposalBeforeAcquisition { .. })
        ));
    }

    #[test]
    fn disposal_without_proceeds_rejected() {
        let mut l = lot("a");
        l.disposal_date = Some(date("2024-02-01"));
        assert_eq!(
            l.validate(),
            Err(LotError::MissingDisposalProceeds {
                id: "a".to_string()
            })
        );
    }

    #[test]
    fn proceeds_fall_back_to_price() {
        let mut l = lot("a");
        l.quantity = dec!(2);
        l.disposal_date = Some(date("2024-02-01"));
        l.disposal_price_each = Some(dec!(150));
        assert_eq!(l.validate(), Ok(()));
        assert_eq!(l.proceeds(), dec!(300));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let lots = vec![lot("a"), lot("b"), lot("a")];
        assert_eq!(
            validate_lots(&lots),
            Err(LotError::DuplicateId("a".to_string()))
        );
    }

    #[test]
    fn reads_json_input() {
        let json = r#"{
            "lots": [
                {
                    "id": "1",
                    "symbol": "ETH",
                    "asset_class": "crypto",
                    "quantity": "2.5",
                    "acquisition_date": "2023-01-01",
                    "acquisition_price_each": "1000",
                    "acquisition_cost": "2500"
                },
                {
                    "id": "2",
                    "symbol": "ETH",
                    "asset_class": "crypto",
                    "quantity": "1",
                    "acquisition_date": "2024-03-01",
                    "acquisition_cost": "0",
                    "disposal_date": "2024-03-01",
                    "disposal_proceeds": "3200"
                }
            ]
        }"#;
        let lots = read_lots_json(json.as_bytes()).unwrap();
        assert_eq!(lots.len(), 2);
        assert_eq!(lots[0].quantity, dec!(2.5));
        assert!(lots[0].is_acquisition());
        assert!(lots[1].is_disposal());
        assert_eq!(lots[1].proceeds(), dec!(3200));
    }

    #[test]
    fn reads_csv_input() {
        let csv = "\
id,symbol,asset_class,quantity,acquisition_date,acquisition_price_each,acquisition_cost,disposal_date,disposal_price_each,disposal_proceeds
1,VWCE,etf,10,2023-05-02,100,1004.50,,,
2,VWCE,etf,4,2024-06-01,0,0,2024-06-01,120,478
";
        let lots = read_lots_csv(csv.as_bytes()).unwrap();
        assert_eq!(lots.len(), 2);
        assert_eq!(lots[0].asset_class, AssetClass::Etf);
        assert_eq!(lots[0].disposal_date, None);
        assert_eq!(lots[1].disposal_proceeds, Some(dec!(478)));
    }
}
