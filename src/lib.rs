//! sheetpipe: a stateless merge-and-filter pipeline over two publicly shared
//! spreadsheets.
//!
//! Two sources are loaded into tables, reconciled onto a canonical key,
//! combined (outer key join by default), run through a per-column filter
//! spec, and exported as an xlsx buffer. The whole pipeline is recomputed
//! from scratch on every call; no state is shared across invocations.

pub mod cli;
pub mod combine;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod reader;
pub mod reconcile;
pub mod source;

use std::time::Duration;

use polars::prelude::DataFrame;

pub use crate::combine::CombineMode;
pub use crate::config::{AppConfig, ConfigManager};
pub use crate::error::{PipelineError, Result};
pub use crate::filter::{ColumnConstraint, FilterSpec};
pub use crate::reader::TableWarning;

/// Pure pipeline over already-loaded tables: alias resolution, combination,
/// filtering. Called fresh per request; holds no state between calls.
pub fn pipeline(
    left: DataFrame,
    right: DataFrame,
    aliases: &[(String, String)],
    key: &str,
    mode: CombineMode,
    spec: &FilterSpec,
) -> Result<DataFrame> {
    let left = reconcile::apply_aliases(left, aliases)?;
    let right = reconcile::apply_aliases(right, aliases)?;
    let combined = combine::combine(left, right, mode, key)?;
    filter::apply(&combined, spec)
}

/// Result of a full pipeline run: the filtered table plus any recoverable
/// conditions encountered while loading the sources.
#[derive(Debug)]
pub struct PipelineOutput {
    pub table: DataFrame,
    pub warnings: Vec<TableWarning>,
}

/// Full pipeline from configuration: fetch both sources (degrading each to an
/// empty pre-shaped table on failure), then run [`pipeline`].
pub fn run(config: &AppConfig, spec: &FilterSpec, timeout: Duration) -> Result<PipelineOutput> {
    let [first, second] = config.sheets.as_slice() else {
        return Err(PipelineError::Config(format!(
            "expected exactly 2 sheet sources, found {}",
            config.sheets.len()
        )));
    };

    let mut warnings = Vec::new();
    let (left, left_warnings) = reader::read_table_or_empty(
        &source::resolve(&first.url),
        required_columns(first),
        timeout,
    )?;
    warnings.extend(left_warnings);
    let (right, right_warnings) = reader::read_table_or_empty(
        &source::resolve(&second.url),
        required_columns(second),
        timeout,
    )?;
    warnings.extend(right_warnings);

    let table = pipeline(
        left,
        right,
        &config.alias_pairs(),
        &config.key_column,
        config.combine_mode,
        spec,
    )?;
    Ok(PipelineOutput { table, warnings })
}

fn required_columns(sheet: &config::SheetConfig) -> Option<&[String]> {
    if sheet.columns.is_empty() {
        None
    } else {
        Some(&sheet.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_pipeline_is_pure_per_call() {
        let left = df!("Hisse Adı" => ["AAPL"], "price" => [10.0]).unwrap();
        let right = df!("Hisse Adı" => ["AAPL"], "Sektör" => ["Tech"]).unwrap();
        let spec = FilterSpec::new();
        let first = pipeline(
            left.clone(),
            right.clone(),
            &[],
            "Hisse Adı",
            CombineMode::KeyJoin,
            &spec,
        )
        .unwrap();
        let second = pipeline(left, right, &[], "Hisse Adı", CombineMode::KeyJoin, &spec).unwrap();
        assert!(first.equals_missing(&second));
    }

    #[test]
    fn test_run_requires_two_sheets() {
        let mut config = AppConfig::default();
        config.sheets.truncate(1);
        let err = run(
            &config,
            &FilterSpec::new(),
            std::time::Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
