//! # Configuration
//!
//! Optional YAML file, `quire.yaml` in the working directory unless
//! `--config` names another. Every field has a default, so an absent file
//! and an empty file behave the same.
//!
//! ```yaml
//! sequence_prefix: chapter
//! critical_threshold: 3
//! records: epub_qa.json
//! validator:
//!   command: [java, -jar, epubcheck-5.1.0/epubcheck.jar]
//!   timeout_secs: 300
//! catalog:
//!   min_content_chars: 2500
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quire_compliance::{CatalogDefinition, Remediation, RuleCatalog, CRITICAL_ISSUE_THRESHOLD};
use quire_core::{Sequencer, DEFAULT_SEQUENCE_PREFIX};
use quire_package::CommandValidator;

/// File looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "quire.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Program and leading arguments; the archive path is appended.
    pub command: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "java".to_string(),
                "-jar".to_string(),
                "epubcheck-5.1.0/epubcheck.jar".to_string(),
            ],
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuireConfig {
    /// Rule catalog override. Omitted fields take canonical values.
    pub catalog: Option<CatalogDefinition>,
    /// Non-compliant units with more issues than this are critical.
    pub critical_threshold: usize,
    pub sequence_prefix: String,
    pub validator: ValidatorConfig,
    /// Validation record store, relative to the working directory.
    pub records: PathBuf,
    pub remediation: Remediation,
}

impl Default for QuireConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            critical_threshold: CRITICAL_ISSUE_THRESHOLD,
            sequence_prefix: DEFAULT_SEQUENCE_PREFIX.to_string(),
            validator: ValidatorConfig::default(),
            records: PathBuf::from("epub_qa.json"),
            remediation: Remediation::default(),
        }
    }
}

impl QuireConfig {
    /// Load `explicit` if given (it must exist), otherwise
    /// `work_dir/quire.yaml` if present, otherwise defaults.
    pub fn load(explicit: Option<&Path>, work_dir: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = work_dir.join(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    tracing::debug!("no {DEFAULT_CONFIG_FILE}; using defaults");
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("invalid config: {}", path.display()))?;
        tracing::debug!(config = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn sequencer(&self) -> Sequencer {
        Sequencer::new(&self.sequence_prefix)
    }

    pub fn catalog(&self) -> Result<RuleCatalog> {
        let catalog = match &self.catalog {
            Some(def) => RuleCatalog::compile(def),
            None => RuleCatalog::canonical(),
        };
        catalog.context("rule catalog does not compile")
    }

    pub fn validator(&self, work_dir: &Path) -> CommandValidator {
        CommandValidator::new(
            self.validator.command.clone(),
            Duration::from_secs(self.validator.timeout_secs),
        )
        .with_working_dir(work_dir)
    }
}
