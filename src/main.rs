use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use fuelbook::data;
use fuelbook::expenses::hierarchy::build_hierarchy;
use fuelbook::expenses::series::build_monthly_series;
use fuelbook::report::{Report, DEFAULT_TITLE};
use fuelbook::source::{LocateSource, Source};

#[derive(Parser)]
#[command(version, about = "Build a drill-down cost dashboard from a vehicle expense log", long_about = None)]
struct Cli {
    /// Expense log to read. Asked for interactively when omitted.
    input: Option<PathBuf>,

    /// Where to write the dashboard
    #[arg(short, long, env = "FUELBOOK_OUTPUT", default_value = "dashboard.html")]
    output: PathBuf,

    /// Dashboard heading
    #[arg(long, default_value = DEFAULT_TITLE)]
    title: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let Some(input) = Source::from_argument(cli.input).locate()? else {
        println!("Cancelled.");
        return Ok(());
    };

    let events = data::load_events(&input).with_context(|| format!("failed to load {}", input.display()))?;
    let nodes = build_hierarchy(&events);
    let series = build_monthly_series(&events);
    info!("{} nodes, {} monthly points", nodes.len(), series.len());

    let source_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Report::new(&cli.title, &source_name, &nodes, &series)
        .write(&cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    Ok(())
}
