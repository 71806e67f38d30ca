use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cdf: CdfConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdfConfig {
    /// Cluster prefix of the API host, e.g. `api` or `westeurope-1`.
    #[serde(default = "default_cluster")]
    pub cluster: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_groups_source")]
    pub groups_source: String,
    #[serde(default = "default_report_dir")]
    pub report_dir: String,
    #[serde(default = "default_iam_dir")]
    pub iam_dir: String,
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    #[serde(default = "default_memberships")]
    pub memberships: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Approve every confirmation without prompting.
    #[serde(default)]
    pub batch: bool,
    #[serde(default)]
    pub duplicate_names: DuplicateNamePolicy,
}

/// What to do when several existing groups share the name of a desired group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateNamePolicy {
    /// Compare against the group listed last by CDF.
    #[default]
    LastWins,
    /// Skip the desired group and report the ambiguity.
    RejectAmbiguous,
}

fn default_cluster() -> String { "api".to_string() }
fn default_timeout_secs() -> u64 { 60 }
fn default_groups_source() -> String { "Files/Output/Output_AADGroups_With_IDs.json".to_string() }
fn default_report_dir() -> String { "Files/Output".to_string() }
fn default_iam_dir() -> String { "Files/CDF_IAM".to_string() }
fn default_source_dir() -> String { "Files/Source".to_string() }
fn default_memberships() -> String { "Files/Source/AAD_Group_Memberships.json".to_string() }

impl Default for CdfConfig {
    fn default() -> Self {
        Self {
            cluster: default_cluster(),
            project: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            groups_source: default_groups_source(),
            report_dir: default_report_dir(),
            iam_dir: default_iam_dir(),
            source_dir: default_source_dir(),
            memberships: default_memberships(),
        }
    }
}

impl CdfConfig {
    pub fn base_url(&self) -> String {
        format!("https://{}.cognitedata.com", self.cluster)
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path))?;
        Ok(config)
    }

    /// Loads `path` when it exists; `None` when there is no such file.
    pub fn load_optional(path: &str) -> Result<Option<Self>> {
        if Path::new(path).exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn default_path() -> String {
        std::env::var("CDF_IAM_CONFIG")
            .unwrap_or_else(|_| "./config/default.toml".to_string())
    }

    /// Overlays `COGNITE_PROJECT` and `COGNITE_API_KEY` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(project) = lookup("COGNITE_PROJECT").filter(|v| !v.is_empty()) {
            self.cdf.project = Some(project);
        }
        if let Some(key) = lookup("COGNITE_API_KEY").filter(|v| !v.is_empty()) {
            self.cdf.api_key = Some(key);
        }
    }
}
