// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Everything the robot used to hard-code at module level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub queue: QueueConfig,
    pub posting: PostingConfig,
    pub months: MonthNames,
    pub cost_centers: CostCenters,
    pub row_errors: RowErrorPolicy,
}

/// Where the spreadsheets live and how we recognise them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub site_url: String,
    pub document_library: String,
    /// Only files ending with this are downloaded.
    pub extension: String,
    /// Glob (relative to the run path) selecting the spreadsheet to load.
    pub file_pattern: String,
    pub credential_account: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            site_url: "https://aarhuskommune.sharepoint.com/teams/MBU-RPA-Egenbefordring".into(),
            document_library: "Delte dokumenter/General/Til udbetaling".into(),
            extension: ".xlsx".into(),
            file_pattern: "Egenbe[forfart]*.xlsx".into(),
            credential_account: "SvcRpaMBU002".into(),
        }
    }
}

impl StoreConfig {
    /// Full URL of the document library folder.
    pub fn folder_url(&self) -> String {
        format!(
            "{}/{}/",
            self.site_url.trim_end_matches('/'),
            self.document_library.trim_matches('/')
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "Koerselsgodtgoerelse_egenbefordring".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostingConfig {
    pub account_code: String,
    pub text_prefix: String,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            account_code: "40430002".into(),
            text_prefix: "Egenbefordring".into(),
        }
    }
}

/// Localised month names, January first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthNames(pub Vec<String>);

impl Default for MonthNames {
    fn default() -> Self {
        Self(
            [
                "Januar", "Februar", "Marts", "April", "Maj", "Juni", "Juli", "August",
                "September", "Oktober", "November", "December",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        )
    }
}

impl MonthNames {
    /// Name for a 1-based calendar month.
    pub fn name(&self, month: u32) -> Option<&str> {
        let idx = usize::try_from(month).ok()?.checked_sub(1)?;
        self.0.get(idx).map(String::as_str)
    }
}

/// A set of lower-case markers that select one cost-center code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerGroup {
    pub markers: Vec<String>,
    pub code: String,
}

impl MarkerGroup {
    pub fn matches(&self, text: &str) -> bool {
        self.markers.iter().any(|m| text.contains(m.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostCenters {
    pub group_a: MarkerGroup,
    pub group_b: MarkerGroup,
    pub structured_name_code: String,
    pub default_code: String,
}

impl Default for CostCenters {
    fn default() -> Self {
        Self {
            group_a: MarkerGroup {
                markers: vec!["langagerskolen".into()],
                code: "XG-5240220808-00004".into(),
            },
            group_b: MarkerGroup {
                markers: vec!["stensagerskolen".into()],
                code: "XG-5240220808-00005".into(),
            },
            structured_name_code: "XG-5240220835-00004".into(),
            default_code: "XG-5240220808-00003".into(),
        }
    }
}

/// What to do when a single row cannot be transformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RowErrorPolicy {
    /// Abort the run on the first failing row.
    Abort,
    /// Report the row and carry on with the rest.
    #[default]
    Skip,
}

impl Config {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(s).context("parsing config YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&raw).with_context(|| format!("loading config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.months.0.len() != 12 {
            bail!("expected 12 month names, got {}", self.months.0.len());
        }
        if self.queue.name.trim().is_empty() {
            bail!("queue name must not be empty");
        }
        let cc = &self.cost_centers;
        for code in [
            &cc.group_a.code,
            &cc.group_b.code,
            &cc.structured_name_code,
            &cc.default_code,
        ] {
            if code.trim().is_empty() {
                bail!("cost-center codes must not be empty");
            }
        }
        Ok(())
    }
}
