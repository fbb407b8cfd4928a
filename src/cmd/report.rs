//! Report command - CGT position for one tax year

use super::{parse_non_negative, read_lots, rules_for};
use cgt_ie::money::{format_eur, format_eur_signed, format_quantity};
use cgt_ie::tax::report::write_disposals_csv;
use cgt_ie::tax::{calculate_cgt, CgtCalculation, TaxYear, TaxYearReport};
use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct ReportCommand {
    /// Lots file (JSON or CSV). Reads JSON from stdin if not specified.
    #[arg(default_value = "-")]
    file: PathBuf,

    /// Tax year to report (calendar year, e.g. 2024)
    #[arg(short, long)]
    year: i32,

    /// Unused losses brought forward from earlier years, in EUR
    #[arg(short, long, default_value = "0", value_parser = parse_non_negative)]
    previous_losses: Decimal,

    /// Override the annual exemption, in EUR
    #[arg(long, value_parser = parse_non_negative)]
    exemption: Option<Decimal>,

    /// Override the CGT rate (e.g. 0.33)
    #[arg(long, value_parser = parse_non_negative)]
    rate: Option<Decimal>,

    /// Output disposals as CSV instead of formatted table
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output the tax year report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct DisposalRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Asset")]
    symbol: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Proceeds")]
    proceeds: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Gain")]
    gain: String,
    #[tabled(rename = "Lots")]
    lots: usize,
    #[tabled(rename = "⚠")]
    warnings: String,
}

impl ReportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let tax_year = TaxYear(self.year);
        let rules = rules_for(self.exemption, self.rate)?;
        let lots = read_lots(&self.file)?;
        let calculation = calculate_cgt(&lots, tax_year, self.previous_losses, &rules)?;

        if self.csv {
            write_disposals_csv(&calculation, io::stdout())
        } else if self.json {
            let report = TaxYearReport::from(&calculation);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        } else {
            print_report(&calculation);
            Ok(())
        }
    }
}

fn print_report(c: &CgtCalculation) {
    println!();
    println!("CAPITAL GAINS TAX REPORT ({})", c.tax_year);
    println!();

    if c.disposals.is_empty() {
        println!("No disposals found");
    } else {
        let rows: Vec<DisposalRow> = c
            .disposals
            .iter()
            .map(|d| DisposalRow {
                date: d.date.format("%Y-%m-%d").to_string(),
                symbol: d.symbol.clone(),
                quantity: format_quantity(d.quantity),
                proceeds: format_eur(d.proceeds),
                cost: format_eur(d.cost_basis),
                gain: format_eur_signed(d.gain),
                lots: d.matches.len(),
                warnings: if d.has_warnings() {
                    d.warnings.len().to_string()
                } else {
                    String::new()
                },
            })
            .collect();

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
    }

    println!();
    println!(
        "  Proceeds: {} | Cost basis: {}",
        format_eur(c.total_disposal_proceeds),
        format_eur(c.total_disposal_cost_basis)
    );
    println!(
        "  Gains: {} | Losses: {} | Net: {}",
        format_eur(c.gross_gains),
        format_eur(c.gross_losses),
        format_eur_signed(c.net_gain)
    );
    println!(
        "  Losses brought forward: {} | Exemption used: {} of {}",
        format_eur(c.previous_losses),
        format_eur(c.exemption_used),
        format_eur(c.annual_exemption)
    );
    println!("  Taxable gain: {}", format_eur(c.taxable_gain));
    println!("  CGT @ {}%: {}", (c.rate * dec!(100)).normalize(), format_eur(c.tax_due));
    if c.loss_carried_forward > Decimal::ZERO {
        println!("  Loss carried forward: {}", format_eur(c.loss_carried_forward));
    }

    let warnings = c.warning_count();
    if warnings > 0 {
        println!();
        println!("  {} warning(s); run `validate` for details", warnings);
    }
    println!();
}
