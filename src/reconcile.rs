//! Schema reconciliation: alias renames, column union, join-key presence.

use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// Caller-supplied alias resolution, e.g. "Ticker" -> "Hisse Adı". Fixed
/// mapping, never inferred.
pub type AliasMap = [(String, String)];

/// Renames aliased columns to their canonical names. Renaming an absent
/// column is a no-op, and a rename is skipped when the canonical name is
/// already taken (the source carries both spellings).
pub fn apply_aliases(df: DataFrame, aliases: &AliasMap) -> Result<DataFrame> {
    let mut df = df;
    for (from, to) in aliases {
        if df.column(from).is_ok() && df.column(to).is_err() {
            df.rename(from, to.as_str().into())?;
        }
    }
    Ok(df)
}

/// Ordered union of both tables' column names: left's columns first, then
/// right-only columns in their original order.
pub fn column_union(left: &DataFrame, right: &DataFrame) -> Vec<String> {
    let mut names: Vec<String> = left
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    for name in right.get_column_names() {
        if !names.iter().any(|n| n == name.as_str()) {
            names.push(name.to_string());
        }
    }
    names
}

/// A key join needs the canonical key on both sides after alias resolution.
/// Failure is fatal to the combination attempt and reports both column lists.
pub fn require_key(left: &DataFrame, right: &DataFrame, key: &str) -> Result<()> {
    if left.column(key).is_ok() && right.column(key).is_ok() {
        return Ok(());
    }
    Err(PipelineError::SchemaMismatch {
        key: key.to_string(),
        left: left
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect(),
        right: right
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect(),
    })
}
