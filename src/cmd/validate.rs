//! Validate command - surface input errors and matching warnings without a full report

use super::read_lots;
use cgt_ie::core::{validate_lots, Lot, Warning};
use cgt_ie::money::{format_quantity, round_eur};
use cgt_ie::tax::wash_sale::DEFAULT_WINDOW_DAYS;
use cgt_ie::tax::{compute_gains, detect_wash_sales, disposal_years, TaxYear};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Lots file (JSON or CSV). Reads JSON from stdin if not specified.
    #[arg(default_value = "-")]
    file: PathBuf,

    /// Only check disposals in this tax year
    #[arg(short, long)]
    year: Option<i32>,

    /// Days either side of a disposal in which a re-acquisition is flagged
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    wash_sale_days: i64,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ValidationIssue {
    #[serde(rename = "type")]
    issue_type: String,
    lot_id: Option<String>,
    date: Option<String>,
    symbol: Option<String>,
    quantity: Option<String>,
    proceeds_eur: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
struct ValidationOutput {
    tax_year: String,
    issue_count: usize,
    issues: Vec<ValidationIssue>,
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let lots = read_lots(&self.file)?;
        let tax_year = self.year.map(TaxYear);

        let issues = match validate_lots(&lots) {
            // first input error only
            Err(e) => vec![ValidationIssue {
                issue_type: "InvalidLot".to_string(),
                lot_id: None,
                date: None,
                symbol: None,
                quantity: None,
                proceeds_eur: None,
                message: e.to_string(),
            }],
            Ok(()) => {
                let mut issues = Vec::new();
                let years = match tax_year {
                    Some(year) => vec![year],
                    None => disposal_years(&lots).into_iter().collect(),
                };
                for year in years {
                    let summary = compute_gains(&lots, year);
                    issues.extend(
                        summary
                            .warnings()
                            .map(|(d, w)| issue(&d.lot, w)),
                    );
                }
                for wash in detect_wash_sales(&lots, tax_year, self.wash_sale_days) {
                    issues.extend(wash.warnings.iter().map(|w| issue(wash.disposal, w)));
                }
                issues
            }
        };

        if self.json {
            print_json(&issues, tax_year)?;
        } else {
            print_text(&issues, tax_year);
        }

        if !issues.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }
}

fn issue(lot: &Lot, warning: &Warning) -> ValidationIssue {
    ValidationIssue {
        issue_type: warning.kind().to_string(),
        lot_id: Some(lot.id.clone()),
        date: lot.disposal_date.map(|d| d.format("%Y-%m-%d").to_string()),
        symbol: Some(lot.symbol.clone()),
        quantity: Some(format_quantity(lot.quantity)),
        proceeds_eur: Some(format!("{:.2}", round_eur(lot.proceeds()))),
        message: warning.message(),
    }
}

fn year_label(year: Option<TaxYear>) -> String {
    year.map_or("All Years".to_string(), |y| y.display())
}

fn print_text(issues: &[ValidationIssue], year: Option<TaxYear>) {
    println!();
    println!("VALIDATION RESULTS ({})", year_label(year));
    println!();

    if issues.is_empty() {
        println!("\u{2713} No issues found.");
        return;
    }

    println!("\u{26A0} {} issue(s) found:", issues.len());
    println!();
    for (i, issue) in issues.iter().enumerate() {
        match (&issue.date, &issue.symbol, &issue.quantity, &issue.proceeds_eur) {
            (Some(date), Some(symbol), Some(quantity), Some(proceeds)) => println!(
                "  {}. [{}] {} Disposal of {} {} for \u{20AC}{}",
                i + 1,
                issue.issue_type,
                date,
                quantity,
                symbol,
                proceeds
            ),
            _ => println!("  {}. [{}]", i + 1, issue.issue_type),
        }
        println!("     {}", issue.message);
        println!();
    }
}

fn print_json(issues: &[ValidationIssue], year: Option<TaxYear>) -> anyhow::Result<()> {
    let output = ValidationOutput {
        tax_year: year_label(year),
        issue_count: issues.len(),
        issues: issues.to_vec(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
