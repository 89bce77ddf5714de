//! tabula: print the column layout of a table.
//!
//! Usage:
//!   tabula name:120 age:60:left notes::right --hide age
//!   tabula name age --hide age --remember

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tabula_cli::{ColumnArg, build_table, hide, layout, load_data};
use tabula_engine::EngineSettings;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "tabula")]
#[command(about = "Compute column widths, visibility and sticky offsets")]
struct Args {
    /// Columns as key[:width[:left|right]]
    #[arg(required = true)]
    columns: Vec<ColumnArg>,

    /// Columns to hide before computing the layout
    #[arg(long)]
    hide: Vec<String>,

    /// Load and save column preferences (e.g. --hide) in the settings'
    /// preferences_dir, so they carry over to later runs
    #[arg(long)]
    remember: bool,

    /// Engine settings file
    #[arg(short, long, default_value = "tabula.toml")]
    settings: PathBuf,

    /// JSON array of records to load as table rows
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Print the layout as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let settings = EngineSettings::load_from(&args.settings);
    let data = match &args.data {
        Some(path) => load_data(path)?,
        None => Vec::new(),
    };

    let table = build_table(settings, &args.columns, data, args.remember)?;
    info!(table_id = %table.id(), columns = args.columns.len(), "Table ready");
    hide(&table, &args.hide)?;

    let columns = layout(&table)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&columns)?);
        return Ok(());
    }
    for column in &columns {
        let state = if column.visible { "visible" } else { "hidden" };
        match &column.offset {
            Some(offset) => println!("{:<16} {:>8}px  {:<8} sticky at {}", column.key, column.width, state, offset),
            None => println!("{:<16} {:>8}px  {}", column.key, column.width, state),
        }
    }
    Ok(())
}
