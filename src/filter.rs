//! Per-column filter constraints and the mask interpreter that applies them.
//!
//! Constraints are immutable values in a mapping, evaluated by one fixed
//! interpreter. Predicates are never built as per-column closures.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use polars::prelude::*;

use crate::error::Result;

/// One column's constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnConstraint {
    /// Categorical allowed-set: a row survives when the cell's string form is
    /// a member. An empty set matches nothing. Null cells never match.
    Allowed(Vec<String>),
    /// Inclusive numeric range. Cells that do not coerce to a number (text,
    /// nulls) fail the constraint and are excluded.
    Range { min: f64, max: f64 },
}

/// Active constraints, keyed by column name. Columns absent from the map are
/// unconstrained. Constraints combine conjunctively (AND).
pub type FilterSpec = BTreeMap<String, ColumnConstraint>;

/// Applies the spec: a row survives iff every constrained column satisfies
/// its constraint. An empty spec returns the table unchanged.
pub fn apply(df: &DataFrame, spec: &FilterSpec) -> Result<DataFrame> {
    let mut mask: Option<BooleanChunked> = None;
    for (column, constraint) in spec {
        let column_mask = constraint_mask(df, column, constraint)?;
        mask = Some(match mask {
            Some(acc) => &acc & &column_mask,
            None => column_mask,
        });
    }
    match mask {
        Some(mask) => Ok(df.filter(&mask)?),
        None => Ok(df.clone()),
    }
}

fn constraint_mask(
    df: &DataFrame,
    column: &str,
    constraint: &ColumnConstraint,
) -> Result<BooleanChunked> {
    let series = df.column(column)?.as_materialized_series();
    let mask = match constraint {
        ColumnConstraint::Allowed(values) => {
            let allowed: HashSet<&str> = values.iter().map(String::as_str).collect();
            let strings = series.cast(&DataType::String)?;
            let ca = strings.str()?;
            ca.into_iter()
                .map(|cell| Some(matches!(cell, Some(v) if allowed.contains(v))))
                .collect()
        }
        ColumnConstraint::Range { min, max } => {
            // Non-strict cast: values that fail numeric coercion become null
            // and fall out of the inclusive bound check.
            let numeric = series.cast(&DataType::Float64)?;
            let ca = numeric.f64()?;
            ca.into_iter()
                .map(|cell| Some(matches!(cell, Some(v) if v >= *min && v <= *max)))
                .collect()
        }
    };
    Ok(mask)
}

/// Observed bounds of a numeric column, offered as range-selector defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericRange {
    pub column: String,
    pub min: f64,
    pub max: f64,
}

/// Distinct values of a low-cardinality text column, offered as multi-select
/// choices.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalOptions {
    pub column: String,
    pub values: Vec<String>,
}

/// Numeric columns eligible for range filtering, with observed [min, max].
///
/// A column whose observed range collapses to a single value (or that is
/// all-null) cannot express a meaningful range and is reported
/// non-filterable: it is left out rather than offered as a zero-width bound
/// that excludes nothing.
pub fn numeric_ranges(df: &DataFrame) -> Result<Vec<NumericRange>> {
    let mut out = Vec::new();
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        if !series.dtype().is_numeric() {
            continue;
        }
        let min = series.min::<f64>()?;
        let max = series.max::<f64>()?;
        if let (Some(min), Some(max)) = (min, max) {
            if min < max {
                out.push(NumericRange {
                    column: series.name().to_string(),
                    min,
                    max,
                });
            }
        }
    }
    Ok(out)
}

/// Text columns with at most `max_cardinality` distinct non-null values,
/// listed sorted for the multi-select surface.
pub fn categorical_options(
    df: &DataFrame,
    max_cardinality: usize,
) -> Result<Vec<CategoricalOptions>> {
    let mut out = Vec::new();
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        if !matches!(series.dtype(), DataType::String) {
            continue;
        }
        let ca = series.str()?;
        let distinct: BTreeSet<String> = ca.into_iter().flatten().map(str::to_string).collect();
        if distinct.is_empty() || distinct.len() > max_cardinality {
            continue;
        }
        out.push(CategoricalOptions {
            column: series.name().to_string(),
            values: distinct.into_iter().collect(),
        });
    }
    Ok(out)
}
