pub mod lot;
pub mod price;
pub mod warnings;

pub use lot::{read_lots_csv, read_lots_json, validate_lots, AssetClass, Lot, LotError, LotInput};
pub use price::{load_prices_csv, load_prices_json, AssetPrice, PriceCache, PriceError};
pub use warnings::Warning;
