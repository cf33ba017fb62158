//! Input source detection for local paths vs remote URLs, and the Google
//! Sheets edit-link rewrite.

use std::path::{Path, PathBuf};

/// Substring marking an edit-mode Google Sheets URL. Everything from here
/// onward is dropped when rewriting to the export form.
pub const EDIT_MARKER: &str = "/edit";

/// Suffix requesting CSV export from a Google Sheets document.
pub const CSV_EXPORT_SUFFIX: &str = "/export?format=csv";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Locator {
    Http(String),
    Local(PathBuf),
}

/// Classifies the input as a remote HTTP/HTTPS URL or a local path using
/// string parsing only (no filesystem calls).
pub fn locator(input: &str) -> Locator {
    if let Some(after_scheme) = input.find("://") {
        let prefix = input[..after_scheme].to_lowercase();
        if prefix == "http" || prefix == "https" {
            return Locator::Http(input.to_string());
        }
    }
    Locator::Local(PathBuf::from(input))
}

/// Rewrites a shared Google Sheets edit-mode URL into its direct CSV export
/// form: strip everything from the literal "/edit" onward, then append
/// "/export?format=csv". URLs without the marker get only the suffix.
pub fn sheet_csv_url(url: &str) -> String {
    let base = match url.find(EDIT_MARKER) {
        Some(i) => &url[..i],
        None => url,
    };
    format!("{base}{CSV_EXPORT_SUFFIX}")
}

/// Resolve a configured source string into a fetchable locator. Edit-mode
/// sheet URLs are rewritten to CSV export form; anything else is used
/// verbatim (direct CSV URLs, local csv/xlsx paths).
pub fn resolve(input: &str) -> Locator {
    match locator(input) {
        Locator::Http(url) if url.contains(EDIT_MARKER) => Locator::Http(sheet_csv_url(&url)),
        other => other,
    }
}

/// True when the local path looks like an Excel workbook rather than CSV.
pub fn is_excel_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(e) if matches!(
            e.to_lowercase().as_str(),
            "xls" | "xlsx" | "xlsm" | "xlsb"
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_local_path() {
        assert!(matches!(locator("/tmp/file.csv"), Locator::Local(_)));
        assert!(matches!(locator("relative.xlsx"), Locator::Local(_)));
        assert!(matches!(locator("."), Locator::Local(_)));
    }

    #[test]
    fn locator_http() {
        match locator("https://example.com/data.csv") {
            Locator::Http(u) => assert_eq!(u, "https://example.com/data.csv"),
            _ => panic!("expected Http"),
        }
        match locator("HTTP://host/path") {
            Locator::Http(u) => assert_eq!(u, "HTTP://host/path"),
            _ => panic!("expected Http"),
        }
    }

    #[test]
    fn locator_unknown_scheme_stays_local() {
        assert!(matches!(locator("file:///tmp/foo.csv"), Locator::Local(_)));
        assert!(matches!(locator("s3://bucket/key.csv"), Locator::Local(_)));
    }

    #[test]
    fn sheet_csv_url_strips_edit_suffix() {
        let url = "https://docs.google.com/spreadsheets/d/1MnhlPTx6aD5a4xuqsVLRw3ktLmf-NwSpXtw_IteXIFs/edit?usp=drivesdk";
        assert_eq!(
            sheet_csv_url(url),
            "https://docs.google.com/spreadsheets/d/1MnhlPTx6aD5a4xuqsVLRw3ktLmf-NwSpXtw_IteXIFs/export?format=csv"
        );
    }

    #[test]
    fn sheet_csv_url_without_marker_appends_suffix() {
        assert_eq!(
            sheet_csv_url("https://docs.google.com/spreadsheets/d/abc"),
            "https://docs.google.com/spreadsheets/d/abc/export?format=csv"
        );
    }

    #[test]
    fn resolve_rewrites_only_edit_urls() {
        match resolve("https://docs.google.com/spreadsheets/d/abc/edit#gid=0") {
            Locator::Http(u) => {
                assert_eq!(
                    u,
                    "https://docs.google.com/spreadsheets/d/abc/export?format=csv"
                );
            }
            _ => panic!("expected Http"),
        }
        match resolve("https://example.com/direct.csv") {
            Locator::Http(u) => assert_eq!(u, "https://example.com/direct.csv"),
            _ => panic!("expected Http"),
        }
        assert!(matches!(resolve("data/local.csv"), Locator::Local(_)));
    }

    #[test]
    fn is_excel_path_by_extension() {
        assert!(is_excel_path(Path::new("out.xlsx")));
        assert!(is_excel_path(Path::new("OUT.XLSM")));
        assert!(!is_excel_path(Path::new("out.csv")));
        assert!(!is_excel_path(Path::new("out")));
    }
}
