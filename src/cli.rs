//! Command-line definitions and constraint-flag parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::combine::CombineMode;
use crate::filter::{ColumnConstraint, FilterSpec};

#[derive(Debug, Parser)]
#[command(
    name = "sheetpipe",
    version,
    about = "Fetch two public spreadsheets, merge them on a key, filter, and export"
)]
pub struct Cli {
    /// Config file path. Defaults to the platform config directory.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// First source (sheet URL or local csv/xlsx path); overrides config.
    #[arg(long, value_name = "URL_OR_PATH")]
    pub sheet1: Option<String>,

    /// Second source (sheet URL or local csv/xlsx path); overrides config.
    #[arg(long, value_name = "URL_OR_PATH")]
    pub sheet2: Option<String>,

    /// How the two tables are combined. The concat modes perform no key
    /// validation and silently misalign rows when order differs.
    #[arg(long, value_enum)]
    pub mode: Option<CombineMode>,

    /// Canonical join key column.
    #[arg(long)]
    pub key: Option<String>,

    /// Categorical constraint: COL=V1,V2,... (repeatable). An empty value
    /// list matches no rows.
    #[arg(long = "allow", value_name = "COL=V1,V2")]
    pub allow: Vec<String>,

    /// Numeric range constraint: COL=MIN..MAX, inclusive (repeatable).
    #[arg(long = "range", value_name = "COL=MIN..MAX")]
    pub range: Vec<String>,

    /// Columns to keep in the displayed and exported table.
    #[arg(long, value_delimiter = ',', value_name = "COL,COL")]
    pub columns: Vec<String>,

    /// Print filterable columns (numeric ranges, categorical choices) and exit.
    #[arg(long)]
    pub list_filters: bool,

    /// Write the resulting table as xlsx to this path.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Fetch timeout in seconds; overrides config.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Write a default config file and exit.
    #[arg(long)]
    pub init_config: bool,

    /// With --init-config, overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

/// Parse one `--allow COL=V1,V2` flag. `COL=` (no values) is a valid empty
/// allowed-set.
pub fn parse_allow(arg: &str) -> Result<(String, ColumnConstraint), String> {
    let (column, rest) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected COL=V1,V2,... got '{arg}'"))?;
    if column.trim().is_empty() {
        return Err(format!("missing column name in '{arg}'"));
    }
    let values: Vec<String> = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(|v| v.trim().to_string()).collect()
    };
    Ok((
        column.trim().to_string(),
        ColumnConstraint::Allowed(values),
    ))
}

/// Parse one `--range COL=MIN..MAX` flag.
pub fn parse_range(arg: &str) -> Result<(String, ColumnConstraint), String> {
    let (column, rest) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected COL=MIN..MAX, got '{arg}'"))?;
    if column.trim().is_empty() {
        return Err(format!("missing column name in '{arg}'"));
    }
    let (lo, hi) = rest
        .split_once("..")
        .ok_or_else(|| format!("expected MIN..MAX in '{arg}'"))?;
    let min: f64 = lo
        .trim()
        .parse()
        .map_err(|_| format!("invalid lower bound '{lo}' in '{arg}'"))?;
    let max: f64 = hi
        .trim()
        .parse()
        .map_err(|_| format!("invalid upper bound '{hi}' in '{arg}'"))?;
    if min > max {
        return Err(format!("range for '{}' has min > max", column.trim()));
    }
    Ok((
        column.trim().to_string(),
        ColumnConstraint::Range { min, max },
    ))
}

/// Build the filter spec from repeated --allow/--range flags. A later flag
/// for the same column replaces the earlier one.
pub fn filter_spec_from_args(allow: &[String], range: &[String]) -> Result<FilterSpec, String> {
    let mut spec = FilterSpec::new();
    for arg in allow {
        let (column, constraint) = parse_allow(arg)?;
        spec.insert(column, constraint);
    }
    for arg in range {
        let (column, constraint) = parse_range(arg)?;
        spec.insert(column, constraint);
    }
    Ok(spec)
}
