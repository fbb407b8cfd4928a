//! Years command - loss ledger across consecutive tax years

use super::{parse_non_negative, read_lots, rules_for};
use cgt_ie::money::{format_eur, format_eur_signed};
use cgt_ie::tax::{build_multi_year_reports, disposal_years, LedgerYear, TaxYear};
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct YearsCommand {
    /// Lots file (JSON or CSV). Reads JSON from stdin if not specified.
    #[arg(default_value = "-")]
    file: PathBuf,

    /// First tax year (defaults to the earliest year with a disposal)
    #[arg(long)]
    from: Option<i32>,

    /// Last tax year (defaults to the latest year with a disposal)
    #[arg(long)]
    to: Option<i32>,

    /// Losses brought into the first year, in EUR
    #[arg(long, default_value = "0", value_parser = parse_non_negative)]
    opening_losses: Decimal,

    /// Override the annual exemption for every year, in EUR
    #[arg(long, value_parser = parse_non_negative)]
    exemption: Option<Decimal>,

    /// Override the CGT rate for every year (e.g. 0.33)
    #[arg(long, value_parser = parse_non_negative)]
    rate: Option<Decimal>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct LedgerRow {
    #[tabled(rename = "Year")]
    year: String,
    #[tabled(rename = "Disposals")]
    disposals: usize,
    #[tabled(rename = "Net Gain")]
    net_gain: String,
    #[tabled(rename = "Losses B/F")]
    brought_forward: String,
    #[tabled(rename = "Exemption")]
    exemption: String,
    #[tabled(rename = "Taxable")]
    taxable: String,
    #[tabled(rename = "CGT")]
    cgt: String,
    #[tabled(rename = "Losses C/F")]
    carried_forward: String,
}

impl From<&LedgerYear> for LedgerRow {
    fn from(y: &LedgerYear) -> Self {
        LedgerRow {
            year: y.report.tax_year.display(),
            disposals: y.report.transactions.len(),
            net_gain: format_eur_signed(y.report.net_gain),
            brought_forward: format_eur(y.losses_brought_forward),
            exemption: format_eur(y.report.exemption_used),
            taxable: format_eur(y.report.taxable_gain),
            cgt: format_eur(y.report.cgt_due),
            carried_forward: format_eur(y.losses_available_next_year),
        }
    }
}

impl YearsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let lots = read_lots(&self.file)?;

        let years = disposal_years(&lots);
        let from = self
            .from
            .map(TaxYear)
            .or_else(|| years.first().copied());
        let to = self.to.map(TaxYear).or_else(|| years.last().copied());
        let (Some(from), Some(to)) = (from, to) else {
            println!("No disposals found");
            return Ok(());
        };
        if from > to {
            anyhow::bail!("--from {} is after --to {}", from, to);
        }

        let rules = rules_for(self.exemption, self.rate)?;
        let ledger = build_multi_year_reports(&lots, from, to, self.opening_losses, &rules)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&ledger)?);
            return Ok(());
        }

        let total_cgt: Decimal = ledger.iter().map(|y| y.report.cgt_due).sum();
        let rows: Vec<LedgerRow> = ledger.iter().map(LedgerRow::from).collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();

        println!();
        println!("CGT BY TAX YEAR ({} to {})", from, to);
        println!();
        println!("{}", table);
        println!();
        println!("  Total CGT: {}", format_eur(total_cgt));
        println!();
        Ok(())
    }
}
