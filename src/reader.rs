//! Tabular source reading: blocking fetch with timeout, CSV and Excel parse,
//! header trimming, and required-column shaping.

use std::fmt;
use std::io::{Cursor, Read};
use std::time::Duration;

use calamine::{open_workbook_auto_from_rs, Data, Reader as _};
use log::warn;
use polars::prelude::*;

use crate::error::{PipelineError, Result};
use crate::source::{self, Locator};

/// Default bound on a single source fetch. Every fetch carries a timeout;
/// there is no unbounded mode.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Recoverable conditions observed while loading a source. Surfaced to the
/// caller for display and also logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableWarning {
    /// Fetch or parse failed; an empty placeholder table was substituted.
    SourceUnavailable { source: String, reason: String },
    /// Requested columns absent from the source; synthesized as all-null.
    MissingColumns { source: String, columns: Vec<String> },
}

impl fmt::Display for TableWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableWarning::SourceUnavailable { source, reason } => {
                write!(f, "source unavailable, using empty table: {source}: {reason}")
            }
            TableWarning::MissingColumns { source, columns } => {
                write!(f, "columns missing from {source}: {}", columns.join(", "))
            }
        }
    }
}

/// Reads one source into a table.
///
/// When `required_columns` is given, the result is restricted to those
/// columns in the requested order; absent ones are synthesized as all-null
/// (a `MissingColumns` warning, never a fatal condition). Column name
/// whitespace is trimmed on read. Fetch and parse failures are returned as
/// `SourceUnavailable`.
pub fn read_table(
    locator: &Locator,
    required_columns: Option<&[String]>,
    timeout: Duration,
) -> Result<(DataFrame, Vec<TableWarning>)> {
    let df = load_frame(locator, timeout)?;
    let df = trim_column_names(df)?;
    let (df, missing) = shape_to_required(df, required_columns)?;

    let mut warnings = Vec::new();
    if !missing.is_empty() {
        let warning = TableWarning::MissingColumns {
            source: locator_label(locator),
            columns: missing,
        };
        warn!("{warning}");
        warnings.push(warning);
    }
    Ok((df, warnings))
}

/// Like [`read_table`] but degrades `SourceUnavailable` to an empty table
/// pre-shaped to the required columns, per the recoverable-error contract.
/// All other errors still propagate.
pub fn read_table_or_empty(
    locator: &Locator,
    required_columns: Option<&[String]>,
    timeout: Duration,
) -> Result<(DataFrame, Vec<TableWarning>)> {
    match read_table(locator, required_columns, timeout) {
        Ok(result) => Ok(result),
        Err(PipelineError::SourceUnavailable { url, reason }) => {
            let warning = TableWarning::SourceUnavailable {
                source: url,
                reason,
            };
            warn!("{warning}");
            Ok((empty_shaped(required_columns)?, vec![warning]))
        }
        Err(other) => Err(other),
    }
}

fn locator_label(locator: &Locator) -> String {
    match locator {
        Locator::Http(url) => url.clone(),
        Locator::Local(path) => path.display().to_string(),
    }
}

fn load_frame(locator: &Locator, timeout: Duration) -> Result<DataFrame> {
    match locator {
        Locator::Http(url) => {
            let bytes = fetch_http(url, timeout)?;
            parse_csv_bytes(bytes).map_err(|e| PipelineError::SourceUnavailable {
                url: url.clone(),
                reason: e.to_string(),
            })
        }
        Locator::Local(path) => {
            let bytes = std::fs::read(path).map_err(|e| PipelineError::SourceUnavailable {
                url: path.display().to_string(),
                reason: e.to_string(),
            })?;
            let parsed = if source::is_excel_path(path) {
                parse_xlsx_bytes(bytes)
            } else {
                parse_csv_bytes(bytes).map_err(PipelineError::from)
            };
            parsed.map_err(|e| PipelineError::SourceUnavailable {
                url: path.display().to_string(),
                reason: e.to_string(),
            })
        }
    }
}

fn fetch_http(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    // ureq reports 4xx/5xx responses as Err from call().
    let response = ureq::get(url)
        .timeout(timeout)
        .call()
        .map_err(|e| PipelineError::SourceUnavailable {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| PipelineError::SourceUnavailable {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    Ok(bytes)
}

fn parse_csv_bytes(bytes: Vec<u8>) -> PolarsResult<DataFrame> {
    CsvReader::new(Cursor::new(bytes))
        .with_options(CsvReadOptions::default())
        .finish()
}

/// Load the first worksheet of an Excel workbook (header row plus data rows)
/// into a DataFrame. Column types are inferred per column: Int64, Float64,
/// Boolean, or String; cells that disagree fall back to String.
fn parse_xlsx_bytes(bytes: Vec<u8>) -> Result<DataFrame> {
    use calamine::DataType as CellType;

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| PolarsError::ComputeError(format!("Excel: {e}").into()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PolarsError::NoData("Excel file has no worksheets".into()))?
        .map_err(|e| PolarsError::ComputeError(format!("Excel: {e}").into()))?;

    let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
    if rows.is_empty() {
        return Ok(DataFrame::new(vec![])?);
    }
    let headers: Vec<String> = rows[0]
        .iter()
        .map(|c| CellType::as_string(c).unwrap_or_else(|| c.to_string()))
        .collect();

    let mut columns = Vec::with_capacity(headers.len());
    for (col_idx, header) in headers.iter().enumerate() {
        let cells: Vec<Option<&Data>> = rows[1..].iter().map(|row| row.get(col_idx)).collect();
        let name = if header.is_empty() {
            format!("column_{}", col_idx + 1)
        } else {
            header.clone()
        };
        let series = sheet_column_to_series(&name, &cells);
        columns.push(series.into_column());
    }
    Ok(DataFrame::new(columns)?)
}

/// Inferred storage type for a worksheet column.
#[derive(Clone, Copy)]
enum SheetColType {
    Int64,
    Float64,
    Boolean,
    Utf8,
}

fn infer_sheet_column_type(cells: &[Option<&Data>]) -> SheetColType {
    use calamine::DataType as CellType;

    let mut has_string = false;
    let mut has_float = false;
    let mut has_int = false;
    let mut has_bool = false;
    for cell in cells.iter().flatten() {
        if CellType::is_string(*cell) || CellType::is_datetime(*cell) {
            has_string = true;
            break;
        }
        if CellType::is_float(*cell) {
            has_float = true;
        }
        if CellType::is_int(*cell) {
            has_int = true;
        }
        if CellType::is_bool(*cell) {
            has_bool = true;
        }
    }
    if has_string {
        SheetColType::Utf8
    } else if has_float {
        SheetColType::Float64
    } else if has_int {
        SheetColType::Int64
    } else if has_bool {
        SheetColType::Boolean
    } else {
        SheetColType::Utf8
    }
}

fn sheet_column_to_series(name: &str, cells: &[Option<&Data>]) -> Series {
    use calamine::DataType as CellType;

    match infer_sheet_column_type(cells) {
        SheetColType::Int64 => {
            let v: Vec<Option<i64>> = cells
                .iter()
                .map(|c| c.and_then(|c| CellType::as_i64(c)))
                .collect();
            Series::new(PlSmallStr::from(name), v)
        }
        SheetColType::Float64 => {
            let v: Vec<Option<f64>> = cells
                .iter()
                .map(|c| c.and_then(|c| CellType::as_f64(c)))
                .collect();
            Series::new(PlSmallStr::from(name), v)
        }
        SheetColType::Boolean => {
            let v: Vec<Option<bool>> = cells
                .iter()
                .map(|c| c.and_then(|c| c.get_bool()))
                .collect();
            Series::new(PlSmallStr::from(name), v)
        }
        SheetColType::Utf8 => {
            let v: Vec<Option<String>> = cells
                .iter()
                .map(|c| {
                    c.and_then(|c| {
                        if CellType::is_empty(c) {
                            None
                        } else {
                            CellType::as_string(c)
                        }
                    })
                })
                .collect();
            Series::new(PlSmallStr::from(name), v)
        }
    }
}

fn trim_column_names(df: DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let trimmed: Vec<String> = names.iter().map(|s| s.trim().to_string()).collect();
    if names == trimmed {
        return Ok(df);
    }
    let mut df = df;
    df.set_column_names(trimmed.iter().map(String::as_str))?;
    Ok(df)
}

/// Restrict to the required columns (in requested order), synthesizing
/// absent ones as all-null. Returns the shaped table and the missing names.
fn shape_to_required(
    df: DataFrame,
    required_columns: Option<&[String]>,
) -> Result<(DataFrame, Vec<String>)> {
    let required = match required_columns {
        Some(cols) if !cols.is_empty() => cols,
        _ => return Ok((df, Vec::new())),
    };
    let mut df = df;
    let height = df.height();
    let mut missing = Vec::new();
    for name in required {
        if df.column(name).is_err() {
            df.with_column(Series::full_null(
                PlSmallStr::from(name.as_str()),
                height,
                &DataType::String,
            ))?;
            missing.push(name.clone());
        }
    }
    let shaped = df.select(required.iter().map(String::as_str))?;
    Ok((shaped, missing))
}

/// Zero-row table, pre-shaped to the required columns when given.
fn empty_shaped(required_columns: Option<&[String]>) -> Result<DataFrame> {
    let columns = match required_columns {
        Some(cols) => cols
            .iter()
            .map(|name| {
                Series::full_null(PlSmallStr::from(name.as_str()), 0, &DataType::String)
                    .into_column()
            })
            .collect(),
        None => vec![],
    };
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_fixture(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_csv_trims_header_whitespace() {
        let file = csv_fixture(" Hisse Adı ,  POC \nAAPL,10\nBBB,20\n");
        let locator = Locator::Local(file.path().to_path_buf());
        let (df, warnings) = read_table(&locator, None, DEFAULT_TIMEOUT).unwrap();
        assert!(warnings.is_empty());
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["Hisse Adı", "POC"]);
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_missing_required_column_synthesized_as_null() {
        let file = csv_fixture("Hisse Adı,POC\nAAPL,10\n");
        let locator = Locator::Local(file.path().to_path_buf());
        let required = vec!["Hisse Adı".to_string(), "Sektör".to_string()];
        let (df, warnings) = read_table(&locator, Some(&required), DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            warnings,
            vec![TableWarning::MissingColumns {
                source: file.path().display().to_string(),
                columns: vec!["Sektör".to_string()],
            }]
        );
        // Shaped to exactly the requested columns, in order.
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["Hisse Adı", "Sektör"]);
        assert_eq!(df.column("Sektör").unwrap().null_count(), 1);
    }

    #[test]
    fn test_unreadable_source_degrades_to_empty_shaped_table() {
        let locator = Locator::Local("does/not/exist.csv".into());
        let required = vec!["Hisse Adı".to_string(), "POC".to_string()];
        let (df, warnings) =
            read_table_or_empty(&locator, Some(&required), DEFAULT_TIMEOUT).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 2);
        assert!(matches!(
            warnings.as_slice(),
            [TableWarning::SourceUnavailable { .. }]
        ));
    }

    #[test]
    fn test_unreadable_source_is_fatal_without_degradation() {
        let locator = Locator::Local("does/not/exist.csv".into());
        let err = read_table(&locator, None, DEFAULT_TIMEOUT).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_http_error_status_is_source_unavailable() {
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let _ = std::io::Read::read(&mut stream, &mut buf);
            stream
                .write_all(b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\r\n")
                .unwrap();
        });

        let locator = Locator::Http(format!("http://{addr}/missing.csv"));
        let err = read_table(&locator, None, DEFAULT_TIMEOUT).unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("404"), "got: {err}");
        server.join().unwrap();
    }

    #[test]
    fn test_garbage_bytes_are_a_parse_failure() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        file.write_all(b"\x00\x01\x02not a workbook").unwrap();
        let locator = Locator::Local(file.path().to_path_buf());
        let err = read_table(&locator, None, DEFAULT_TIMEOUT).unwrap_err();
        assert!(err.is_recoverable(), "parse failure must be recoverable");
    }
}
