use std::env;
use std::path::PathBuf;

use tracing::info;

use crate::error::JobWatchError;
use crate::types::{normalize_terms, FilterContext, RepostCheck, SortOrder};

pub const DEFAULT_RECENCY_THRESHOLD_SECS: u64 = 900;
pub const DEFAULT_SEARCH_BASE_URL: &str =
    "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search";
pub const DEFAULT_CSV_PATH: &str = "jobs_data.csv";
pub const DEFAULT_EXCLUDE_TERMS: &[&str] = &[
    "principal",
    "lead",
    "head",
    "staff",
    "manager",
    "frontend",
    "backend",
    "fullstack",
    "software",
    "cloud",
    "security",
    "java",
    "javascript",
    ".net",
    "legal",
    "android",
];

/// Which page agent renders the search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAgentKind {
    /// Plain HTTP GET; enough for the guest search endpoint, which serves static HTML.
    Http,
    Browserless { url: String, token: Option<String> },
}

/// Where accepted postings are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTarget {
    Csv,
    Sheets,
    Both,
}

impl StorageTarget {
    pub fn uses_csv(&self) -> bool {
        matches!(self, StorageTarget::Csv | StorageTarget::Both)
    }

    pub fn uses_sheets(&self) -> bool {
        matches!(self, StorageTarget::Sheets | StorageTarget::Both)
    }
}

#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub credentials_json: String,
    pub spreadsheet_id: String,
    pub worksheet_name: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Search
    pub job_title: String,
    pub job_location: String,
    pub search_base_url: String,
    /// `(location marker, geo id)` pairs, matched in order.
    pub geo_ids: Vec<(String, String)>,

    // Filtering
    pub recency_threshold_secs: u64,
    pub title_exclude_terms: Vec<String>,
    pub sort_order: SortOrder,
    pub repost_check: RepostCheck,

    // Page agent
    pub page_agent: PageAgentKind,

    // Notification
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,

    // Persistence
    pub storage_target: StorageTarget,
    pub csv_path: PathBuf,
    pub sheets: Option<SheetsConfig>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, JobWatchError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, JobWatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| {
                JobWatchError::Config(format!("{key} environment variable is required"))
            })
        };

        let recency_threshold_secs = match get("RECENCY_THRESHOLD_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                JobWatchError::Config(format!("RECENCY_THRESHOLD_SECS must be a number, got {raw:?}"))
            })?,
            None => DEFAULT_RECENCY_THRESHOLD_SECS,
        };
        if recency_threshold_secs == 0 {
            return Err(JobWatchError::Config(
                "RECENCY_THRESHOLD_SECS must be greater than zero".to_string(),
            ));
        }

        let title_exclude_terms = match get("TITLE_EXCLUDE_TERMS") {
            Some(raw) => normalize_terms(raw.split(',').map(String::from).collect()),
            None => DEFAULT_EXCLUDE_TERMS.iter().map(|t| t.to_string()).collect(),
        };

        let sort_order = match get("SORT_ORDER").as_deref() {
            None | Some("recent") => SortOrder::MostRecent,
            Some("relevance") => SortOrder::Relevance,
            Some(other) => {
                return Err(JobWatchError::Config(format!(
                    "SORT_ORDER must be 'recent' or 'relevance', got {other:?}"
                )))
            }
        };

        let repost_check = match get("REPOST_CHECK").as_deref() {
            None | Some("off") => RepostCheck::Disabled,
            Some("detail") => RepostCheck::DetailPage,
            Some(other) => {
                return Err(JobWatchError::Config(format!(
                    "REPOST_CHECK must be 'off' or 'detail', got {other:?}"
                )))
            }
        };

        let mut geo_ids = vec![("Berlin".to_string(), "90009712".to_string())];
        if let Some(raw) = get("GEO_IDS") {
            geo_ids.extend(parse_geo_ids(&raw)?);
        }

        let page_agent = match get("PAGE_AGENT").as_deref() {
            None | Some("http") => PageAgentKind::Http,
            Some("browserless") => PageAgentKind::Browserless {
                url: required("BROWSERLESS_URL")?,
                token: get("BROWSERLESS_TOKEN"),
            },
            Some(other) => {
                return Err(JobWatchError::Config(format!(
                    "PAGE_AGENT must be 'http' or 'browserless', got {other:?}"
                )))
            }
        };

        let storage_target = match get("STORAGE_TARGET").as_deref() {
            None | Some("csv") => StorageTarget::Csv,
            Some("sheets") => StorageTarget::Sheets,
            Some("both") => StorageTarget::Both,
            Some(other) => {
                return Err(JobWatchError::Config(format!(
                    "STORAGE_TARGET must be 'csv', 'sheets' or 'both', got {other:?}"
                )))
            }
        };

        let sheets = if storage_target.uses_sheets() {
            Some(SheetsConfig {
                credentials_json: required("GOOGLE_CREDENTIALS_JSON")?,
                spreadsheet_id: required("SPREADSHEET_ID")?,
                worksheet_name: required("WORKSHEET_NAME")?,
            })
        } else {
            None
        };

        Ok(Self {
            job_title: required("JOB_TITLE")?,
            job_location: required("JOB_LOCATION")?,
            search_base_url: get("SEARCH_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SEARCH_BASE_URL.to_string()),
            geo_ids,
            recency_threshold_secs,
            title_exclude_terms,
            sort_order,
            repost_check,
            page_agent,
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID"),
            storage_target,
            csv_path: get("CSV_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_PATH)),
            sheets,
        })
    }

    /// Telegram credentials, required whenever real notifications are sent.
    pub fn telegram(&self) -> Result<(&str, &str), JobWatchError> {
        match (&self.telegram_bot_token, &self.telegram_chat_id) {
            (Some(token), Some(chat_id)) => Ok((token.as_str(), chat_id.as_str())),
            (None, _) => Err(JobWatchError::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            )),
            (_, None) => Err(JobWatchError::Config(
                "TELEGRAM_CHAT_ID environment variable is required".to_string(),
            )),
        }
    }

    pub fn filter_context(&self) -> FilterContext {
        FilterContext::builder()
            .recency_threshold_secs(self.recency_threshold_secs)
            .title_exclude_terms(self.title_exclude_terms.clone())
            .sort_order(self.sort_order)
            .repost_check(self.repost_check)
            .build()
    }

    /// Log the effective configuration with secrets masked.
    pub fn log_redacted(&self) {
        let agent = match &self.page_agent {
            PageAgentKind::Http => "http".to_string(),
            PageAgentKind::Browserless { url, .. } => format!("browserless({url})"),
        };
        info!(
            job_title = %self.job_title,
            job_location = %self.job_location,
            recency_threshold_secs = self.recency_threshold_secs,
            exclude_terms = self.title_exclude_terms.len(),
            sort_order = ?self.sort_order,
            repost_check = ?self.repost_check,
            page_agent = %agent,
            telegram_bot_token = redact(self.telegram_bot_token.as_deref()),
            telegram_chat_id = self.telegram_chat_id.as_deref().unwrap_or("<unset>"),
            storage_target = ?self.storage_target,
            csv_path = %self.csv_path.display(),
            spreadsheet_id = self.sheets.as_ref().map(|s| s.spreadsheet_id.as_str()).unwrap_or("<unset>"),
            "Loaded configuration"
        );
    }
}

fn redact(secret: Option<&str>) -> &'static str {
    match secret {
        Some(_) => "<redacted>",
        None => "<unset>",
    }
}

/// Parse `marker=id,marker=id` into ordered pairs.
fn parse_geo_ids(raw: &str) -> Result<Vec<(String, String)>, JobWatchError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (marker, id) = entry.split_once('=').ok_or_else(|| {
                JobWatchError::Config(format!("GEO_IDS entry {entry:?} must look like marker=id"))
            })?;
            let (marker, id) = (marker.trim(), id.trim());
            if marker.is_empty() || id.is_empty() {
                return Err(JobWatchError::Config(format!(
                    "GEO_IDS entry {entry:?} has an empty marker or id"
                )));
            }
            Ok((marker.to_string(), id.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, JobWatchError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    const BASE: &[(&str, &str)] = &[
        ("JOB_TITLE", "Data Scientist"),
        ("JOB_LOCATION", "Berlin Metropolitan Area"),
    ];

    #[test]
    fn defaults_apply_when_only_required_vars_set() {
        let config = load(BASE).unwrap();
        assert_eq!(config.recency_threshold_secs, DEFAULT_RECENCY_THRESHOLD_SECS);
        assert_eq!(config.title_exclude_terms.len(), DEFAULT_EXCLUDE_TERMS.len());
        assert_eq!(config.page_agent, PageAgentKind::Http);
        assert_eq!(config.storage_target, StorageTarget::Csv);
        assert_eq!(config.csv_path, PathBuf::from(DEFAULT_CSV_PATH));
        assert_eq!(config.repost_check, RepostCheck::Disabled);
        assert_eq!(config.geo_ids, vec![("Berlin".to_string(), "90009712".to_string())]);
        assert!(config.sheets.is_none());
    }

    #[test]
    fn missing_job_title_is_config_error() {
        let err = load(&[("JOB_LOCATION", "Berlin")]).unwrap_err();
        assert!(matches!(err, JobWatchError::Config(msg) if msg.contains("JOB_TITLE")));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let mut vars = BASE.to_vec();
        vars.push(("RECENCY_THRESHOLD_SECS", "0"));
        assert!(matches!(load(&vars), Err(JobWatchError::Config(_))));
    }

    #[test]
    fn sheets_target_requires_credentials() {
        let mut vars = BASE.to_vec();
        vars.push(("STORAGE_TARGET", "both"));
        vars.push(("SPREADSHEET_ID", "abc"));
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, JobWatchError::Config(msg) if msg.contains("GOOGLE_CREDENTIALS_JSON")));
    }

    #[test]
    fn browserless_agent_requires_url() {
        let mut vars = BASE.to_vec();
        vars.push(("PAGE_AGENT", "browserless"));
        assert!(load(&vars).is_err());

        vars.push(("BROWSERLESS_URL", "http://browserless:3000"));
        let config = load(&vars).unwrap();
        assert_eq!(
            config.page_agent,
            PageAgentKind::Browserless {
                url: "http://browserless:3000".to_string(),
                token: None
            }
        );
    }

    #[test]
    fn custom_terms_and_geo_ids_are_parsed() {
        let mut vars = BASE.to_vec();
        vars.push(("TITLE_EXCLUDE_TERMS", "Manager, Intern,,manager"));
        vars.push(("GEO_IDS", "Munich=100477049, Hamburg = 106430557"));
        let config = load(&vars).unwrap();
        assert_eq!(config.title_exclude_terms, vec!["manager", "intern"]);
        assert_eq!(config.geo_ids.len(), 3);
        assert_eq!(config.geo_ids[1], ("Munich".to_string(), "100477049".to_string()));
        assert_eq!(config.geo_ids[2], ("Hamburg".to_string(), "106430557".to_string()));
    }

    #[test]
    fn malformed_geo_ids_entry_is_rejected() {
        let mut vars = BASE.to_vec();
        vars.push(("GEO_IDS", "Munich"));
        assert!(matches!(load(&vars), Err(JobWatchError::Config(_))));
    }

    #[test]
    fn telegram_credentials_checked_on_demand() {
        let config = load(BASE).unwrap();
        assert!(config.telegram().is_err());

        let mut vars = BASE.to_vec();
        vars.push(("TELEGRAM_BOT_TOKEN", "123:abc"));
        vars.push(("TELEGRAM_CHAT_ID", "-100200"));
        let config = load(&vars).unwrap();
        assert_eq!(config.telegram().unwrap(), ("123:abc", "-100200"));
    }

    #[test]
    fn filter_context_mirrors_config() {
        let mut vars = BASE.to_vec();
        vars.push(("RECENCY_THRESHOLD_SECS", "3600"));
        vars.push(("REPOST_CHECK", "detail"));
        vars.push(("SORT_ORDER", "relevance"));
        let ctx = load(&vars).unwrap().filter_context();
        assert_eq!(ctx.recency_threshold_secs, 3600);
        assert_eq!(ctx.repost_check, RepostCheck::DetailPage);
        assert_eq!(ctx.sort_order, SortOrder::Relevance);
    }

    #[test]
    fn listing_repost_mode_is_rejected() {
        let mut vars = BASE.to_vec();
        vars.push(("REPOST_CHECK", "listing"));
        assert!(matches!(load(&vars), Err(JobWatchError::Config(_))));
    }
}
