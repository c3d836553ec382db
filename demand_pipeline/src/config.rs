//! Run configuration: parsing, normalization, and loading.
//!
//! A `forecast.toml` describes one forecast run:
//! - `[run]`: the prediction window and run policies
//! - `[features]`: lag offsets and the ordered feature list the models expect
//! - `[explain_categories]`: category name to member feature names
//! - `[sources]`: service endpoints
//! - `[artifacts]`: model registry and safety-factor table paths
//!
//! Normalization trims and de-duplicates names, sorts lags, validates that every
//! feature name is known and that every `lag_<k>` feature has a configured lag,
//! and drops or rejects category members that are not selected features
//! according to [`UnknownCategoryFeaturePolicy`].
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_config_str`]
//! - Parse + normalize from a file path: [`load_config_path`]
//! - Normalization with explicit policy: [`normalize_config_with_policy`]

use std::{
    collections::HashSet,
    mem,
    num::NonZeroU32,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use chrono::NaiveDate;
use chrono_tz::Tz;
use demand_ingestor::{
    models::prediction::RECORD_COLUMNS,
    providers::{holidays, vacations, world_weather},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use shared_utils::{config::read_toml_file, env::get_env_override};

use crate::{error::PipelineError, features::Feature, tz::parse_tz};

/// Environment variable overriding `sources.server_link`; `/api` is appended.
pub const SERVER_ENV_VAR: &str = "API_SERVER";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub run: RunCfg,
    pub features: FeaturesCfg,
    /// Category name -> member feature names. Order is kept in the output table.
    #[serde(default)]
    pub explain_categories: IndexMap<String, Vec<String>>,
    pub sources: SourcesCfg,
    pub artifacts: ArtifactsCfg,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunCfg {
    /// Number of days to forecast.
    pub pred_duration: u32,
    /// First forecast day; must be a sales date known to the ledger.
    pub start_date: NaiveDate,
    /// IANA zone that decides what "today" is for weather requests.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Stores left out of the forecast. Store 10 has no location record.
    #[serde(default = "default_excluded_stores")]
    pub excluded_stores: Vec<u32>,
    #[serde(default)]
    pub missing_model: MissingModelPolicy,
    #[serde(default = "default_max_concurrent_pages")]
    pub max_concurrent_pages: usize,
    /// Also fetch weather for the lag history window.
    #[serde(default = "default_true")]
    pub weather_includes_lag_window: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FeaturesCfg {
    /// Lag offsets in days.
    pub lags: Vec<u32>,
    /// Feature names in the order the models were fitted on.
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesCfg {
    /// Ledger root including the `/api` prefix. `API_SERVER` takes precedence.
    #[serde(default)]
    pub server_link: Option<String>,
    #[serde(default = "default_holiday_url")]
    pub holiday_url: String,
    #[serde(default = "default_vacation_url")]
    pub vacation_url: String,
    #[serde(default = "default_weather_url")]
    pub weather_url: String,
    #[serde(default = "default_weather_rps")]
    pub weather_requests_per_second: NonZeroU32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactsCfg {
    /// JSON model registry.
    pub models: PathBuf,
    /// CSV with `filnr,artnr,seo_factor`.
    pub safety_factors: PathBuf,
}

/// What to do with an entity that has no fitted model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingModelPolicy {
    /// Leave the entity out of the output and log a warning.
    #[default]
    Skip,
    /// Fail the run.
    Abort,
}

fn default_timezone() -> String {
    "Europe/Berlin".to_string()
}

fn default_excluded_stores() -> Vec<u32> {
    vec![10]
}

fn default_max_concurrent_pages() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_holiday_url() -> String {
    holidays::DEFAULT_BASE_URL.to_string()
}

fn default_vacation_url() -> String {
    vacations::DEFAULT_BASE_URL.to_string()
}

fn default_weather_url() -> String {
    world_weather::provider::DEFAULT_BASE_URL.to_string()
}

fn default_weather_rps() -> NonZeroU32 {
    world_weather::provider::DEFAULT_REQUESTS_PER_SECOND
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default)]
pub struct NormalizationReport {
    /// Duplicate lag offsets removed.
    pub lags_deduped: usize,
    /// Feature names that changed when trimmed.
    pub feature_names_trimmed: usize,
    /// Repeated feature names removed.
    pub features_deduped: usize,
    /// Category members dropped because they are not selected features (Drop policy).
    pub category_members_dropped: usize,
}

/// Policy for category members that are not in `features.names`.
#[derive(Copy, Clone, Debug)]
pub enum UnknownCategoryFeaturePolicy {
    /// Drop the member; it can never receive an attribution.
    Drop,
    /// Treat as an error
    Error,
}

/// Normalize a config in place.
///
/// - Sort and de-duplicate lags; reject an empty list and a zero lag
/// - Trim and de-duplicate feature names, preserving first occurrence order;
///   reject unknown names and `lag_<k>` with an unconfigured `k`
/// - Trim category names and members; reject names that are also record
///   columns; handle members outside the feature list per `policy`
/// - Reject a zero prediction duration and an unknown time zone
pub fn normalize_config_with_policy(
    cfg: &mut PipelineConfig,
    policy: UnknownCategoryFeaturePolicy,
) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();

    if cfg.run.pred_duration == 0 {
        bail!("run.pred_duration must be at least 1");
    }
    cfg.run.timezone = cfg.run.timezone.trim().to_string();
    parse_tz(&cfg.run.timezone).context("run.timezone")?;

    // --- lags
    let before = cfg.features.lags.len();
    cfg.features.lags.sort_unstable();
    cfg.features.lags.dedup();
    report.lags_deduped = before - cfg.features.lags.len();
    if cfg.features.lags.is_empty() {
        bail!("features.lags cannot be empty");
    }
    if cfg.features.lags[0] == 0 {
        bail!("features.lags must be positive");
    }

    // --- feature names
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(cfg.features.names.len());
    for raw in mem::take(&mut cfg.features.names) {
        let name = raw.trim().to_string();
        if name != raw {
            report.feature_names_trimmed += 1;
        }
        let feature: Feature = name
            .parse()
            .with_context(|| format!("features.names entry {raw:?}"))?;
        if let Feature::Lag(k) = feature {
            if !cfg.features.lags.contains(&k) {
                bail!("feature {name} refers to lag {k}, which is not in features.lags");
            }
        }
        if seen.insert(name.clone()) {
            names.push(name);
        } else {
            report.features_deduped += 1;
        }
    }
    if names.is_empty() {
        bail!("features.names cannot be empty");
    }
    cfg.features.names = names;

    // --- categories
    let selected: HashSet<&str> = cfg.features.names.iter().map(String::as_str).collect();
    let mut rebuilt = IndexMap::new();
    for (raw_category, members) in mem::take(&mut cfg.explain_categories) {
        let category = raw_category.trim().to_string();
        if category.is_empty() {
            bail!("explain category name cannot be empty after trimming");
        }
        if RECORD_COLUMNS.contains(&category.as_str()) {
            bail!("explain category {category} clashes with a prediction record column");
        }
        if rebuilt.contains_key(&category) {
            bail!("duplicate explain category after normalization: {category}");
        }
        let mut kept = Vec::with_capacity(members.len());
        for member in members {
            let member = member.trim().to_string();
            if !selected.contains(member.as_str()) {
                match policy {
                    UnknownCategoryFeaturePolicy::Drop => {
                        report.category_members_dropped += 1;
                        continue;
                    }
                    UnknownCategoryFeaturePolicy::Error => {
                        bail!(
                            "explain category {category} lists {member:?}, \
                             which is not in features.names"
                        );
                    }
                }
            }
            if !kept.contains(&member) {
                kept.push(member);
            }
        }
        rebuilt.insert(category, kept);
    }
    cfg.explain_categories = rebuilt;

    Ok(report)
}

/// [`normalize_config_with_policy`] with [`UnknownCategoryFeaturePolicy::Drop`].
pub fn normalize_config(cfg: &mut PipelineConfig) -> anyhow::Result<NormalizationReport> {
    normalize_config_with_policy(cfg, UnknownCategoryFeaturePolicy::Drop)
}

/// Parse and normalize a config from a TOML string.
pub fn load_config_str(s: &str) -> anyhow::Result<(PipelineConfig, NormalizationReport)> {
    let mut cfg: PipelineConfig = toml::from_str(s).context("parsing forecast config")?;
    let report = normalize_config(&mut cfg)?;
    Ok((cfg, report))
}

/// Parse and normalize a config from a file.
pub fn load_config_path(path: &Path) -> anyhow::Result<(PipelineConfig, NormalizationReport)> {
    let mut cfg: PipelineConfig = read_toml_file(path)?;
    let report = normalize_config(&mut cfg)
        .with_context(|| format!("normalizing {}", path.display()))?;
    Ok((cfg, report))
}

impl PipelineConfig {
    /// Applies `API_SERVER` if set.
    pub fn apply_env_overrides(&mut self) {
        if let Some(server) = get_env_override(SERVER_ENV_VAR) {
            self.sources.server_link = Some(format!("{}/api", server.trim_end_matches('/')));
        }
    }

    pub fn server_link(&self) -> Result<&str, PipelineError> {
        self.sources.server_link.as_deref().ok_or_else(|| {
            PipelineError::Config(format!(
                "no ledger address: set sources.server_link or {SERVER_ENV_VAR}"
            ))
        })
    }

    pub fn timezone(&self) -> Result<Tz, PipelineError> {
        self.run
            .timezone
            .parse()
            .map_err(|e| PipelineError::Config(format!("run.timezone: {e}")))
    }

    /// Typed view of the feature selection.
    pub fn feature_plan(&self) -> Result<FeaturePlan, PipelineError> {
        let features = self
            .features
            .names
            .iter()
            .map(|n| n.parse::<Feature>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let mut categories = IndexMap::new();
        for (category, members) in &self.explain_categories {
            let indices = members
                .iter()
                .filter_map(|m| self.features.names.iter().position(|n| n == m))
                .collect();
            categories.insert(category.clone(), indices);
        }
        Ok(FeaturePlan {
            lags: self.features.lags.clone(),
            features,
            categories,
        })
    }
}

/// Lags, features and category membership resolved to indices.
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturePlan {
    /// Ascending, unique, non-empty.
    pub lags: Vec<u32>,
    pub features: Vec<Feature>,
    /// Category -> positions in `features`.
    pub categories: IndexMap<String, Vec<usize>>,
}

impl FeaturePlan {
    /// Lags are kept ascending, so this is the first one.
    pub fn smallest_lag(&self) -> u32 {
        self.lags.first().copied().unwrap_or_default()
    }
}
