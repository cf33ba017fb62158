//! TOML configuration: sheet sources, key column, aliases, combine mode.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::combine::CombineMode;
use crate::error::{PipelineError, Result};

pub const APP_NAME: &str = "sheetpipe";
const CONFIG_FILE: &str = "config.toml";

/// Manages the config directory and config file operations.
#[derive(Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for
    /// testing).
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager under the platform config directory.
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PipelineError::Config("could not determine config directory".into()))?
            .join(app_name);
        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Load the config file, or defaults when no file exists yet.
    pub fn load_or_default(&self) -> Result<AppConfig> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        AppConfig::load_from(&path)
    }

    /// Write the default configuration. Refuses to overwrite unless `force`.
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let path = self.config_path();
        if path.exists() && !force {
            return Err(PipelineError::Config(format!(
                "config file already exists: {} (use --force to overwrite)",
                path.display()
            )));
        }
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        let toml_str = toml::to_string_pretty(&AppConfig::default())
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        std::fs::write(&path, toml_str)?;
        Ok(path)
    }
}

/// One source spreadsheet: where to fetch it and which columns to keep.
/// An empty column list keeps everything the source provides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetConfig {
    pub url: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// Column alias resolved before combination, e.g. "Ticker" -> "Hisse Adı".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Canonical join key; both sources must carry it after alias resolution
    /// for a key join.
    pub key_column: String,
    pub combine_mode: CombineMode,
    pub fetch_timeout_secs: u64,
    pub export_file_name: String,
    /// Text columns with at most this many distinct values are offered as
    /// multi-select choices.
    pub max_choice_cardinality: usize,
    pub sheets: Vec<SheetConfig>,
    pub aliases: Vec<AliasEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            key_column: "Hisse Adı".to_string(),
            combine_mode: CombineMode::KeyJoin,
            fetch_timeout_secs: 30,
            export_file_name: crate::export::DEFAULT_FILE_NAME.to_string(),
            max_choice_cardinality: 50,
            sheets: vec![
                SheetConfig {
                    url: "https://docs.google.com/spreadsheets/d/1MnhlPTx6aD5a4xuqsVLRw3ktLmf-NwSpXtw_IteXIFs/edit?usp=drivesdk".to_string(),
                    columns: vec![
                        "Hisse Adı",
                        "ATH Değişimi TL (%)",
                        "Geçen Gün",
                        "AVWAP",
                        "AVWAP +4σ",
                        "% Fark VWAP",
                        "POC",
                        "VAL",
                        "VAH",
                        "% Fark POC",
                        "% Fark VAL",
                        "VP Bant / ATH Aralığı (%)",
                    ]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                },
                SheetConfig {
                    url: "https://docs.google.com/spreadsheets/d/1u9WT-P9dEoXYuCOX1ojkFUySeJVmznc6dEFzhq0Ob8M/edit?usp=drivesdk".to_string(),
                    columns: vec![
                        "Hisse Adı",
                        "Sektör",
                        "Period",
                        "Ortalama Hedef Fiyat",
                        "OHD - USD",
                        "Hisse Potansiyeli (Yüzde)",
                        "Hisse Puanı",
                        "YDF Oranı",
                        "Özkaynak Karlılığı",
                        "Yıllık Net Kar",
                        "Borç Özkaynak Oranı",
                        "Ödenmiş Sermaye",
                        "Bölünme",
                        "Piyasa Değeri",
                        "Peg Rasyosu",
                        "FD/FAVÖK",
                        "ROIC Oranı",
                        "PD/FCF",
                        "Cari Oran",
                        "Net Borç/Favök",
                        "F/K Oranı",
                        "PD/DD Oranı",
                        "Hisse Fiyatı",
                    ]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                },
            ],
            aliases: vec![AliasEntry {
                from: "Ticker".to_string(),
                to: "Hisse Adı".to_string(),
            }],
        }
    }
}

impl AppConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| {
            PipelineError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn alias_pairs(&self) -> Vec<(String, String)> {
        self.aliases
            .iter()
            .map(|a| (a.from.clone(), a.to.clone()))
            .collect()
    }

    pub fn fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.fetch_timeout_secs)
    }
}
