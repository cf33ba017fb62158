//! Spreadsheet export: table to in-memory xlsx buffer.

use polars::prelude::*;
use rust_xlsxwriter::Workbook;

use crate::error::Result;

/// Content type declared when serving the exported workbook for download.
pub const CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Default name of the downloadable artifact.
pub const DEFAULT_FILE_NAME: &str = "hisse_analizi.xlsx";

/// Serializes the table as an xlsx workbook: one sheet, header row followed
/// by data rows in the table's current order, no index column. Numbers are
/// written as numbers, booleans as booleans, nulls as blank cells. Does not
/// mutate its input.
pub fn to_xlsx_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col_idx, column) in df.get_columns().iter().enumerate() {
        let col = col_idx as u16;
        sheet.write_string(0, col, column.name().as_str())?;
        let series = column.as_materialized_series();
        for (row_idx, value) in series.iter().enumerate() {
            let row = row_idx as u32 + 1;
            match value {
                AnyValue::Null => {}
                AnyValue::Boolean(v) => {
                    sheet.write_boolean(row, col, v)?;
                }
                AnyValue::String(v) => {
                    sheet.write_string(row, col, v)?;
                }
                AnyValue::StringOwned(v) => {
                    sheet.write_string(row, col, v.as_str())?;
                }
                other => {
                    if let Ok(v) = other.try_extract::<f64>() {
                        sheet.write_number(row, col, v)?;
                    } else {
                        sheet.write_string(row, col, other.str_value().as_ref())?;
                    }
                }
            }
        }
    }
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_is_pure_and_nonempty() {
        let df = df!(
            "Hisse Adı" => ["AAPL", "BBB"],
            "price" => [10.0, 20.0]
        )
        .unwrap();
        let before = df.clone();
        let bytes = to_xlsx_bytes(&df).unwrap();
        assert!(!bytes.is_empty());
        // xlsx is a zip container; check the magic to ensure a real workbook.
        assert_eq!(&bytes[..2], b"PK");
        assert!(df.equals_missing(&before));
    }

    #[test]
    fn test_export_empty_table_has_header_only() {
        let df = df!(
            "Hisse Adı" => Vec::<String>::new(),
            "price" => Vec::<f64>::new()
        )
        .unwrap();
        let bytes = to_xlsx_bytes(&df).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_content_type_is_spreadsheet() {
        assert!(CONTENT_TYPE.contains("spreadsheetml"));
        assert!(DEFAULT_FILE_NAME.ends_with(".xlsx"));
    }
}
