//! Schema command - print expected input formats

use cgt_ie::core::LotInput;
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format: json-schema, csv-header or csv-fields
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the lots file
    JsonSchema,
    /// CSV header row with column names
    CsvHeader,
    /// CSV column descriptions
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => {
                let schema = schema_for!(LotInput);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::CsvHeader => {
                let columns: Vec<&str> = CSV_FIELDS.iter().map(|(name, _, _)| *name).collect();
                println!("{}", columns.join(","));
            }
            SchemaFormat::CsvFields => print_csv_fields(),
        }
        Ok(())
    }
}

fn print_csv_fields() {
    println!("CSV Input Format");
    println!("================");
    println!();
    for (name, required, description) in CSV_FIELDS {
        let req = if *required { "required" } else { "optional" };
        println!("{:24} ({:8})  {}", name, req, description);
    }
    println!();
    println!("All amounts are in EUR. A row with disposal_date set is a disposal.");
}

const CSV_FIELDS: &[(&str, bool, &str)] = &[
    ("id", true, "Unique identifier for the lot"),
    ("symbol", true, "Asset ticker (e.g., BTC, ETH, VWCE)"),
    ("asset_class", true, "crypto, stock or etf"),
    ("quantity", true, "Units acquired or disposed, must be positive"),
    ("acquisition_date", true, "Acquisition date (YYYY-MM-DD)"),
    ("acquisition_price_each", true, "Price per unit at acquisition"),
    ("acquisition_cost", true, "Total acquisition cost including fees"),
    ("disposal_date", false, "Disposal date (YYYY-MM-DD), marks the row as a disposal"),
    ("disposal_price_each", false, "Price per unit at disposal"),
    (
        "disposal_proceeds",
        false,
        "Net disposal proceeds (defaults to quantity x disposal_price_each)",
    ),
];
