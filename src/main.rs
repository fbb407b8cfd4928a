use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser, Debug)]
#[command(name = "cgt-ie", version, about = "Calculate Irish Capital Gains Tax (CGT)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calculate and display the CGT report for one tax year
    Report(cmd::report::ReportCommand),
    /// Show CGT and the loss carry-forward across several tax years
    Years(cmd::years::YearsCommand),
    /// Show open holdings, valued at current prices if given
    Holdings(cmd::holdings::HoldingsCommand),
    /// Check lots for input errors and matching warnings
    Validate(cmd::validate::ValidateCommand),
    /// Print the expected input format
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Report(report) => report.exec(),
        Command::Years(years) => years.exec(),
        Command::Holdings(holdings) => holdings.exec(),
        Command::Validate(validate) => validate.exec(),
        Command::Schema(schema) => schema.exec(),
    }
}
