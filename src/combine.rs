//! Combining the two reconciled tables into one working table.

use clap::ValueEnum;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::reconcile;

/// How the two source tables are merged.
///
/// `KeyJoin` is the safe default. The positional modes perform no key
/// validation: `ConcatColumns` assumes both tables list the same entities in
/// the same row order, and a mismatched order silently misaligns data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombineMode {
    /// Outer join on the canonical key; all rows from both sides appear once.
    KeyJoin,
    /// Side-by-side column concatenation, index-aligned (no key check).
    ConcatColumns,
    /// Stacked row concatenation over the column union.
    ConcatRows,
}

/// Merges two tables. Missing cells in the result are explicit nulls: every
/// row has a value slot for every column of the union schema.
pub fn combine(left: DataFrame, right: DataFrame, mode: CombineMode, key: &str) -> Result<DataFrame> {
    match mode {
        CombineMode::KeyJoin => {
            reconcile::require_key(&left, &right, key)?;
            let out = left
                .lazy()
                .join(
                    right.lazy(),
                    [col(key)],
                    [col(key)],
                    JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
                )
                .collect()?;
            Ok(out)
        }
        CombineMode::ConcatColumns => {
            let mut out = left;
            out.hstack_mut(right.get_columns())?;
            Ok(out)
        }
        CombineMode::ConcatRows => {
            let out = concat(
                [left.lazy(), right.lazy()],
                UnionArgs {
                    diagonal: true,
                    to_supertypes: true,
                    ..Default::default()
                },
            )?
            .collect()?;
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    fn prices() -> DataFrame {
        df!(
            "Hisse Adı" => ["AAPL", "BBB"],
            "price" => [10.0, 20.0]
        )
        .unwrap()
    }

    fn sectors() -> DataFrame {
        df!(
            "Hisse Adı" => ["AAPL"],
            "Sektör" => ["Tech"]
        )
        .unwrap()
    }

    #[test]
    fn test_key_join_keeps_unmatched_rows_with_nulls() {
        let out = combine(prices(), sectors(), CombineMode::KeyJoin, "Hisse Adı").unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(reconcile::column_union(&prices(), &sectors()).len(), out.width());

        let key = out.column("Hisse Adı").unwrap().str().unwrap();
        let sector = out.column("Sektör").unwrap().str().unwrap();
        let price = out.column("price").unwrap().f64().unwrap();
        for i in 0..out.height() {
            match key.get(i).unwrap() {
                "AAPL" => {
                    assert_eq!(price.get(i), Some(10.0));
                    assert_eq!(sector.get(i), Some("Tech"));
                }
                "BBB" => {
                    assert_eq!(price.get(i), Some(20.0));
                    assert_eq!(sector.get(i), None, "unmatched cell holds the marker");
                }
                other => panic!("unexpected key {other}"),
            }
        }
    }

    #[test]
    fn test_key_join_disjoint_keys_row_and_column_cardinality() {
        let a = df!("Hisse Adı" => ["A", "B"], "x" => [1, 2]).unwrap();
        let b = df!("Hisse Adı" => ["C"], "y" => [9]).unwrap();
        let out = combine(a.clone(), b.clone(), CombineMode::KeyJoin, "Hisse Adı").unwrap();
        assert_eq!(out.height(), a.height() + b.height());
        let union = reconcile::column_union(&a, &b);
        for name in &union {
            assert!(out.column(name).is_ok(), "column {name} lost in join");
        }
        // Every row missing from one side holds nulls in that side's columns.
        assert_eq!(out.column("y").unwrap().null_count(), 2);
        assert_eq!(out.column("x").unwrap().null_count(), 1);
    }

    #[test]
    fn test_key_join_without_key_is_schema_mismatch() {
        let a = df!("Ticker" => ["AAPL"], "price" => [1.0]).unwrap();
        let b = sectors();
        let err = combine(a, b, CombineMode::KeyJoin, "Hisse Adı").unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_concat_columns_is_positional() {
        let a = df!("Hisse Adı" => ["AAPL", "BBB"]).unwrap();
        let b = df!("POC" => [5.0, 6.0]).unwrap();
        let out = combine(a, b, CombineMode::ConcatColumns, "Hisse Adı").unwrap();
        assert_eq!(out.shape(), (2, 2));
        assert_eq!(out.column("POC").unwrap().f64().unwrap().get(1), Some(6.0));
    }

    #[test]
    fn test_concat_rows_fills_union_with_nulls() {
        let a = df!("Hisse Adı" => ["AAPL"], "x" => [1i64]).unwrap();
        let b = df!("Hisse Adı" => ["BBB"], "y" => [2i64]).unwrap();
        let out = combine(a, b, CombineMode::ConcatRows, "Hisse Adı").unwrap();
        assert_eq!(out.shape(), (2, 3));
        assert_eq!(out.column("x").unwrap().null_count(), 1);
        assert_eq!(out.column("y").unwrap().null_count(), 1);
    }
}
