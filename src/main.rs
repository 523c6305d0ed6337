use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use royalties::{chart, BarChart, Report};

const DEFAULT_TITLES: &str = "The Python Apprentice,The Python Journeyman,The Python Master";

#[derive(Parser)]
#[command(name = "royalties", version)]
#[command(about = "Chart daily book sales from a royalty-report CSV export")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bar chart of combined daily sales across all books
    Combined { filename: PathBuf },
    /// Stacked bar chart of daily sales, one layer per book
    #[command(name = "per_book")]
    PerBook {
        filename: PathBuf,
        /// Book titles to chart, in stacking order (bottom layer first)
        #[arg(long, value_delimiter = ',', default_value = DEFAULT_TITLES)]
        titles: Vec<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Combined { filename } => {
            let report = load_report(&filename)?;
            chart::show(&BarChart::daily_totals(&report.daily_totals()))
        }
        Commands::PerBook { filename, titles } => {
            let report = load_report(&filename)?;
            chart::show(&BarChart::stacked(&report.per_title(&titles)))
        }
    }
}

fn load_report(path: &Path) -> Result<Report> {
    check_input_file(path)?;
    let mut report = Report::new();
    report.read_csv(path)?;
    Ok(report)
}

/// Rejects paths that don't name an existing, readable, regular file, before
/// any CSV parsing is attempted.
fn check_input_file(path: &Path) -> Result<()> {
    let metadata =
        fs::metadata(path).with_context(|| format!("cannot read {}", path.display()))?;
    if metadata.is_dir() {
        bail!("{} is a directory, expected a CSV file", path.display());
    }
    File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    Ok(())
}
