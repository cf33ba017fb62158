use std::fs;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use env_logger::Env;
use log::warn;
use sheetpipe::cli::{filter_spec_from_args, Cli};
use sheetpipe::config::{AppConfig, ConfigManager, APP_NAME};
use sheetpipe::{export, filter, run};

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if cli.init_config {
        let manager = ConfigManager::new(APP_NAME)?;
        let path = manager.write_default_config(cli.force)?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    let config = load_config(&cli)?;
    let spec = filter_spec_from_args(&cli.allow, &cli.range).map_err(|e| eyre!(e))?;

    let timeout = cli
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.fetch_timeout());

    let output = run(&config, &spec, timeout)?;
    for warning in &output.warnings {
        warn!("{warning}");
    }

    if cli.list_filters {
        print_filters(&output.table, config.max_choice_cardinality)?;
        return Ok(());
    }

    let table = if cli.columns.is_empty() {
        output.table
    } else {
        output.table.select(cli.columns.iter().map(String::as_str))?
    };

    println!("{table}");

    if let Some(path) = &cli.output {
        fs::write(path, export::to_xlsx_bytes(&table)?)?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => ConfigManager::new(APP_NAME)?.load_or_default()?,
    };
    if let Some(url) = &cli.sheet1 {
        if let Some(sheet) = config.sheets.get_mut(0) {
            sheet.url = url.clone();
        }
    }
    if let Some(url) = &cli.sheet2 {
        if let Some(sheet) = config.sheets.get_mut(1) {
            sheet.url = url.clone();
        }
    }
    if let Some(mode) = cli.mode {
        config.combine_mode = mode;
    }
    if let Some(key) = &cli.key {
        config.key_column = key.clone();
    }
    Ok(config)
}

fn print_filters(table: &polars::prelude::DataFrame, max_cardinality: usize) -> Result<()> {
    for range in filter::numeric_ranges(table)? {
        println!("{}: {} .. {}", range.column, range.min, range.max);
    }
    for options in filter::categorical_options(table, max_cardinality)? {
        println!("{}: {}", options.column, options.values.join(", "));
    }
    Ok(())
}
