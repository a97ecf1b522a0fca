use std::path::PathBuf;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use url::Url;

use crate::errors::{RelayError, RelayResult};

pub const DEFAULT_FEED_URL: &str = "https://blog.bytebytego.com/feed";
pub const DEFAULT_DEEPL_API_URL: &str = "https://api-free.deepl.com/v2/translate";
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_STATE_MAX_ENTRIES: usize = 1000;
pub const DEFAULT_CHECK_INTERVAL_MINUTES: u64 = 30;
pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;

/// How the poller decides which feed entries are new
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyKind {
    /// Skip identifiers already recorded in the seen-item state
    Novelty,
    /// Keep entries published within the lookback window
    Recency,
}

impl std::str::FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "novelty" => Ok(PolicyKind::Novelty),
            "recency" => Ok(PolicyKind::Recency),
            _ => Err(format!("Unknown selection policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateBackend {
    File,
    Sqlite,
}

impl std::str::FromStr for StateBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StateBackend::File),
            "sqlite" => Ok(StateBackend::Sqlite),
            _ => Err(format!("Unknown state backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub feed_urls: Vec<String>,
    pub check_interval: Duration,
    pub max_items_per_feed: usize,
    pub lookback: chrono::Duration,
    pub policy: Option<PolicyKind>,

    pub deepl_api_key: String,
    pub deepl_api_url: String,
    pub source_lang: String,
    pub target_lang: String,

    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_api_url: String,

    pub slack_webhook_url: String,
    pub slack_channel: String,
    pub slack_use_threads: bool,
    pub slack_bot_token: Option<String>,
    pub slack_api_url: String,
    pub slack_username: String,

    pub state_backend: StateBackend,
    pub state_file: PathBuf,
    pub state_db_path: PathBuf,
    pub state_max_entries: usize,

    pub item_delay: Duration,
    pub display_offset: FixedOffset,
}

/// Load `.env` files into the process environment.
/// The executable's directory is tried first, then the current directory.
pub fn load_env_files() {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()));

    if let Some(ref dir) = exe_dir {
        let env_path = dir.join(".env");
        if env_path.exists() {
            dotenvy::from_path(&env_path).ok();
        }
    }
    dotenvy::dotenv().ok();
}

impl Config {
    pub fn from_env() -> RelayResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key-value source
    pub fn from_lookup<F>(lookup: F) -> RelayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| RelayError::MissingEnvVar(key.to_string()));

        let feed_urls = parse_feed_urls(
            &get("FEED_URLS")
                .or_else(|| get("FEED_URL"))
                .unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
        )?;

        let interval_minutes = parse_number(
            get("CHECK_INTERVAL_MINUTES"),
            "CHECK_INTERVAL_MINUTES",
            DEFAULT_CHECK_INTERVAL_MINUTES,
        );
        if interval_minutes == 0 {
            return Err(RelayError::Config(
                "CHECK_INTERVAL_MINUTES must be greater than 0".to_string(),
            ));
        }
        let check_interval = interval_from_minutes(interval_minutes);

        let lookback = lookback_from_hours(parse_number(
            get("LOOKBACK_HOURS"),
            "LOOKBACK_HOURS",
            DEFAULT_LOOKBACK_HOURS,
        ));

        let policy = match get("SELECTION_POLICY") {
            Some(raw) => Some(raw.parse::<PolicyKind>().map_err(RelayError::Config)?),
            None => None,
        };

        let state_backend = match get("STATE_BACKEND") {
            Some(raw) => raw.parse::<StateBackend>().map_err(RelayError::Config)?,
            None => StateBackend::File,
        };

        let display_offset = match get("DISPLAY_UTC_OFFSET") {
            Some(raw) => raw.parse::<FixedOffset>().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "invalid DISPLAY_UTC_OFFSET, using +09:00");
                default_offset()
            }),
            None => default_offset(),
        };

        Ok(Self {
            feed_urls,
            check_interval,
            max_items_per_feed: parse_number(get("MAX_ITEMS_PER_FEED"), "MAX_ITEMS_PER_FEED", 10usize),
            lookback,
            policy,

            deepl_api_key: required("DEEPL_API_KEY")?,
            deepl_api_url: get("DEEPL_API_URL").unwrap_or_else(|| DEFAULT_DEEPL_API_URL.to_string()),
            source_lang: get("SOURCE_LANG").unwrap_or_else(|| "EN".to_string()).to_uppercase(),
            target_lang: get("TARGET_LANG").unwrap_or_else(|| "JA".to_string()).to_uppercase(),

            openai_api_key: required("OPENAI_API_KEY")?,
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            openai_api_url: get("OPENAI_API_URL").unwrap_or_else(|| DEFAULT_OPENAI_API_URL.to_string()),

            slack_webhook_url: required("SLACK_WEBHOOK_URL")?,
            slack_channel: get("SLACK_CHANNEL").unwrap_or_else(|| "#general".to_string()),
            slack_use_threads: parse_bool(get("SLACK_USE_THREADS"), "SLACK_USE_THREADS", true),
            slack_bot_token: get("SLACK_BOT_TOKEN"),
            slack_api_url: get("SLACK_API_URL")
                .unwrap_or_else(|| slack_client::DEFAULT_API_URL.to_string()),
            slack_username: get("SLACK_USERNAME").unwrap_or_else(|| "RSS Translator Bot".to_string()),

            state_backend,
            state_file: PathBuf::from(
                get("STATE_FILE").unwrap_or_else(|| "last_checked_state.txt".to_string()),
            ),
            state_db_path: PathBuf::from(get("STATE_DB_PATH").unwrap_or_else(|| "newsrelay.db".to_string())),
            state_max_entries: parse_number(
                get("STATE_MAX_ENTRIES"),
                "STATE_MAX_ENTRIES",
                DEFAULT_STATE_MAX_ENTRIES,
            ),

            item_delay: Duration::from_secs(parse_number(get("ITEM_DELAY_SECS"), "ITEM_DELAY_SECS", 1u64)),
            display_offset,
        })
    }
}

/// The scheduler adds the interval to the current instant at least twice, so both must fit
fn interval_from_minutes(minutes: u64) -> Duration {
    let interval = minutes.checked_mul(60).map(Duration::from_secs).filter(|d| {
        std::time::Instant::now()
            .checked_add(*d)
            .and_then(|first| first.checked_add(*d))
            .is_some()
    });

    interval.unwrap_or_else(|| {
        tracing::warn!(
            key = "CHECK_INTERVAL_MINUTES",
            value = minutes,
            default = DEFAULT_CHECK_INTERVAL_MINUTES,
            "interval out of range, using default"
        );
        Duration::from_secs(DEFAULT_CHECK_INTERVAL_MINUTES * 60)
    })
}

fn lookback_from_hours(hours: i64) -> chrono::Duration {
    let window = chrono::Duration::try_hours(hours)
        .filter(|w| *w >= chrono::Duration::zero())
        .filter(|w| Utc::now().checked_sub_signed(*w).is_some());

    window.unwrap_or_else(|| {
        tracing::warn!(
            key = "LOOKBACK_HOURS",
            value = hours,
            default = DEFAULT_LOOKBACK_HOURS,
            "lookback out of range, using default"
        );
        chrono::Duration::hours(DEFAULT_LOOKBACK_HOURS)
    })
}

fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap_or_else(|| Utc.fix())
}

fn parse_feed_urls(raw: &str) -> RelayResult<Vec<String>> {
    let mut urls = Vec::new();

    for candidate in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let parsed = Url::parse(candidate)
            .map_err(|e| RelayError::InvalidUrl(format!("{}: {}", candidate, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RelayError::InvalidUrl(format!(
                "{}: unsupported scheme {}",
                candidate,
                parsed.scheme()
            )));
        }
        if !urls.iter().any(|u| u == candidate) {
            urls.push(candidate.to_string());
        }
    }

    if urls.is_empty() {
        return Err(RelayError::Config("FEED_URLS is required".to_string()));
    }

    Ok(urls)
}

fn parse_number<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %value, default = %default, "invalid number, using default");
            default
        }),
    }
}

fn parse_bool(raw: Option<String>, key: &str, default: bool) -> bool {
    let Some(value) = raw else {
        return default;
    };

    match value.trim().to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" | "on" | "enable" | "enabled" => true,
        "false" | "f" | "no" | "n" | "0" | "off" | "disable" | "disabled" => false,
        _ => {
            tracing::warn!(key, value = %value, default, "invalid boolean, using default");
            default
        }
    }
}
