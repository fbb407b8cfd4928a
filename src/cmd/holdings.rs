use super::read_lots;
use cgt_ie::core::{load_prices_csv, load_prices_json, PriceCache};
use cgt_ie::money::{format_eur, format_eur_signed, format_percent, format_quantity};
use cgt_ie::tax::{
    calculate_cgt, summarize_portfolio, valuate_holdings, CgtRules, PortfolioHolding,
    PortfolioSummary, TaxYear,
};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

const MAX_PRICE_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Args, Debug)]
pub struct HoldingsCommand {
    /// Lots file (JSON or CSV). Reads JSON from stdin if not specified.
    #[arg(default_value = "-")]
    file: PathBuf,

    /// Current prices file: `symbol,price` CSV or a JSON object of symbol to price
    #[arg(long)]
    prices: Option<PathBuf>,

    /// Seconds a loaded price stays fresh (up to ten years)
    #[arg(
        long,
        default_value_t = 60,
        value_parser = clap::value_parser!(i64).range(1..=MAX_PRICE_TTL_SECS)
    )]
    price_ttl: i64,

    /// Include realized gains and CGT due for this tax year in the summary
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct HoldingsOutput<'a> {
    holdings: &'a [PortfolioHolding],
    summary: &'a PortfolioSummary,
}

#[derive(Tabled)]
struct HoldingRow {
    #[tabled(rename = "Asset")]
    symbol: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Cost Basis")]
    cost: String,
    #[tabled(rename = "Avg Cost")]
    average: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Unrealized")]
    gain: String,
    #[tabled(rename = "%")]
    percent: String,
}

impl HoldingsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let lots = read_lots(&self.file)?;

        let now = Utc::now();
        let mut cache = PriceCache::new(Duration::seconds(self.price_ttl));
        if let Some(path) = &self.prices {
            let loaded = load_prices(path, &mut cache, now)?;
            log::info!("Loaded {} prices from {}", loaded, path.display());
        }
        let prices = cache.current_prices(now);

        let holdings = valuate_holdings(&lots, &prices)?;
        let calculation = match self.year {
            Some(year) => Some(calculate_cgt(
                &lots,
                TaxYear(year),
                Decimal::ZERO,
                &CgtRules::default(),
            )?),
            None => None,
        };
        let summary = summarize_portfolio(&holdings, calculation.as_ref());

        if self.json {
            let output = HoldingsOutput {
                holdings: &holdings,
                summary: &summary,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_holdings(&holdings, &summary, self.year);
        }
        Ok(())
    }
}

fn load_prices(path: &Path, cache: &mut PriceCache, now: DateTime<Utc>) -> anyhow::Result<usize> {
    let reader = BufReader::new(File::open(path)?);
    let source = path.display().to_string();
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let count = if is_csv {
        load_prices_csv(reader, cache, &source, now)?
    } else {
        load_prices_json(reader, cache, &source, now)?
    };
    Ok(count)
}

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

fn print_holdings(holdings: &[PortfolioHolding], summary: &PortfolioSummary, year: Option<i32>) {
    println!();
    println!("HOLDINGS");
    println!();

    if holdings.is_empty() {
        println!("No open holdings");
        println!();
        return;
    }

    let rows: Vec<HoldingRow> = holdings
        .iter()
        .map(|h| HoldingRow {
            symbol: h.symbol.clone(),
            class: h.asset_class.to_string(),
            quantity: format_quantity(h.quantity),
            cost: format_eur(h.total_cost_basis),
            average: format_eur(h.average_cost_basis),
            price: or_dash(h.current_price.map(format_eur)),
            value: or_dash(h.current_value.map(format_eur)),
            gain: or_dash(h.unrealized_gain.map(format_eur_signed)),
            percent: or_dash(h.unrealized_gain_percent.map(format_percent)),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);

    println!();
    println!(
        "  Value: {} | Cost: {} | Unrealized: {} ({})",
        format_eur(summary.total_value),
        format_eur(summary.total_cost),
        format_eur_signed(summary.total_gain),
        format_percent(summary.total_gain_percent)
    );
    if !summary.unpriced_symbols.is_empty() {
        println!("  No price for: {}", summary.unpriced_symbols.join(", "));
    }
    if let (Some(year), Some(realized), Some(cgt)) = (year, summary.realized_gains, summary.cgt_due)
    {
        println!(
            "  {} realized: {} | CGT due: {}",
            year,
            format_eur_signed(realized),
            format_eur(cgt)
        );
    }
    println!();
}
