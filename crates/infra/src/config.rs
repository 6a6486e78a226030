use chrono_tz::Tz;
use class_reminders_domain::{max_invocation_interval_millis, DEFAULT_TOLERANCE_MILLIS};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    pub dispatch: DispatchConfig,
    pub trigger_auth: TriggerAuthConfig,
    pub telegram: TelegramConfig,
    pub email: EmailConfig,
    /// Base url of the academy website, used to build deep links in messages
    pub site_url: String,
    /// Timezone session times are displayed in
    pub display_timezone: Tz,
    /// When set the server runs the dispatch itself on this interval, in
    /// addition to accepting external triggers.
    pub job_interval_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Only sessions starting within this many millis from now are considered
    pub lookahead_millis: i64,
    /// Symmetric tolerance around every reminder offset
    pub tolerance_millis: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAuthStrategy {
    /// Bearer secret or scheduler sentinel header
    Cron,
    /// Bearer secret or signed webhook
    Webhook,
    /// Any of the above
    Any,
}

#[derive(Debug, Clone)]
pub struct TriggerAuthConfig {
    pub strategy: TriggerAuthStrategy,
    /// Shared secret expected as `Authorization: Bearer <secret>`.
    /// When this is `None` every trigger is accepted.
    pub shared_secret: Option<String>,
    pub scheduler_header_name: String,
    pub scheduler_header_value: String,
    /// HS256 keys that signed webhooks may be signed with, current key first
    pub webhook_signing_keys: Vec<String>,
    /// Reject requests with an invalid webhook signature instead of only logging
    pub enforce_webhook_signature: bool,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub api_url: String,
    /// Every chat that receives the class start broadcast
    pub chat_ids: Vec<String>,
    /// The chat that receives countdown broadcasts
    pub default_chat_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub endpoint_url: Option<String>,
    pub api_key: Option<String>,
}

impl DispatchConfig {
    pub fn new() -> Self {
        let lookahead_hours = parse_env_or("REMINDER_LOOKAHEAD_HOURS", 48_i64);
        let tolerance_minutes = parse_env_or(
            "REMINDER_TOLERANCE_MINUTES",
            DEFAULT_TOLERANCE_MILLIS / (1000 * 60),
        );
        let default = Self::default();
        Self {
            lookahead_millis: millis_or(
                "REMINDER_LOOKAHEAD_HOURS",
                lookahead_hours,
                1000 * 60 * 60,
                default.lookahead_millis,
            ),
            tolerance_millis: millis_or(
                "REMINDER_TOLERANCE_MINUTES",
                tolerance_minutes,
                1000 * 60,
                default.tolerance_millis,
            ),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            lookahead_millis: 1000 * 60 * 60 * 48, // 48 hours
            tolerance_millis: DEFAULT_TOLERANCE_MILLIS,
        }
    }
}

impl TriggerAuthConfig {
    pub fn new() -> Self {
        let strategy = match std::env::var("TRIGGER_AUTH_STRATEGY") {
            Ok(s) => match s.to_lowercase().as_str() {
                "cron" => TriggerAuthStrategy::Cron,
                "webhook" => TriggerAuthStrategy::Webhook,
                "any" => TriggerAuthStrategy::Any,
                other => {
                    warn!(
                        "The given TRIGGER_AUTH_STRATEGY: {} is not valid, falling back to: any.",
                        other
                    );
                    TriggerAuthStrategy::Any
                }
            },
            Err(_) => TriggerAuthStrategy::Any,
        };
        let shared_secret = non_empty_env("CRON_SECRET");
        if shared_secret.is_none() {
            warn!("CRON_SECRET is not set. Every reminder trigger will be accepted without authentication.");
        }
        Self {
            strategy,
            shared_secret,
            scheduler_header_name: non_empty_env("SCHEDULER_HEADER_NAME")
                .unwrap_or_else(|| "x-scheduler-trigger".into())
                .to_lowercase(),
            scheduler_header_value: non_empty_env("SCHEDULER_HEADER_VALUE")
                .unwrap_or_else(|| "cron".into()),
            webhook_signing_keys: list_env("WEBHOOK_SIGNING_KEYS"),
            enforce_webhook_signature: parse_env_or("ENFORCE_WEBHOOK_SIGNATURE", false),
        }
    }
}

impl Default for TriggerAuthConfig {
    fn default() -> Self {
        Self {
            strategy: TriggerAuthStrategy::Any,
            shared_secret: None,
            scheduler_header_name: "x-scheduler-trigger".into(),
            scheduler_header_value: "cron".into(),
            webhook_signing_keys: Vec::new(),
            enforce_webhook_signature: false,
        }
    }
}

impl TelegramConfig {
    pub fn new() -> Self {
        let chat_ids = list_env("TELEGRAM_CHAT_IDS");
        let default_chat_id =
            non_empty_env("TELEGRAM_DEFAULT_CHAT_ID").or_else(|| chat_ids.first().cloned());
        Self {
            bot_token: non_empty_env("TELEGRAM_BOT_TOKEN"),
            api_url: non_empty_env("TELEGRAM_API_URL")
                .unwrap_or_else(|| "https://api.telegram.org".into()),
            chat_ids,
            default_chat_id,
        }
    }
}

impl EmailConfig {
    pub fn new() -> Self {
        let endpoint_url = non_empty_env("EMAIL_ENDPOINT_URL").filter(|url| {
            let valid = is_http_url(url);
            if !valid {
                warn!("The given EMAIL_ENDPOINT_URL: {} is not a valid http url.", url);
            }
            valid
        });
        Self {
            endpoint_url,
            api_key: non_empty_env("EMAIL_API_KEY"),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        let default_port = "5000";
        let port = std::env::var("PORT").unwrap_or_else(|_| default_port.into());
        let port = match port.parse::<usize>() {
            Ok(port) => port,
            Err(_) => {
                warn!(
                    "The given PORT: {} is not valid, falling back to the default port: {}.",
                    port, default_port
                );
                5000
            }
        };

        let default_site_url = "http://localhost:3000";
        let site_url = match non_empty_env("SITE_URL") {
            Some(url) if is_http_url(&url) => url,
            Some(url) => {
                warn!(
                    "The given SITE_URL: {} is not valid, falling back to: {}.",
                    url, default_site_url
                );
                default_site_url.into()
            }
            None => default_site_url.into(),
        };

        let display_timezone = match non_empty_env("DISPLAY_TIMEZONE") {
            Some(tz) => tz.parse::<Tz>().unwrap_or_else(|_| {
                warn!(
                    "The given DISPLAY_TIMEZONE: {} is not a valid timezone, falling back to UTC.",
                    tz
                );
                Tz::UTC
            }),
            None => Tz::UTC,
        };

        let dispatch = DispatchConfig::new();
        let job_interval_secs = non_empty_env("REMINDER_JOB_INTERVAL_SECS")
            .and_then(|secs| secs.parse::<u64>().ok())
            .filter(|secs| *secs > 0);
        if let Some(secs) = job_interval_secs {
            info!("In-process reminder job enabled with an interval of {} seconds", secs);
        }

        let config = Self {
            port,
            dispatch,
            trigger_auth: TriggerAuthConfig::new(),
            telegram: TelegramConfig::new(),
            email: EmailConfig::new(),
            site_url: site_url.trim_end_matches('/').to_string(),
            display_timezone,
            job_interval_secs,
        };
        config.warn_on_unsafe_interval();
        config
    }

    /// Config without any outbound credentials, used by tests
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            dispatch: Default::default(),
            trigger_auth: Default::default(),
            telegram: TelegramConfig {
                bot_token: None,
                api_url: "https://api.telegram.org".into(),
                chat_ids: Vec::new(),
                default_chat_id: None,
            },
            email: EmailConfig {
                endpoint_url: None,
                api_key: None,
            },
            site_url: "https://academy.test".into(),
            display_timezone: Tz::UTC,
            job_interval_secs: None,
        }
    }

    /// Reminders are only guaranteed to fire when dispatch runs at least
    /// once per `2 * tolerance`.
    fn warn_on_unsafe_interval(&self) {
        let max_millis = max_invocation_interval_millis(self.dispatch.tolerance_millis);
        if let Some(secs) = self.job_interval_secs {
            if secs as i64 * 1000 > max_millis {
                warn!(
                    "REMINDER_JOB_INTERVAL_SECS: {} exceeds twice the reminder tolerance ({} secs), reminders may be skipped.",
                    secs,
                    max_millis / 1000
                );
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn list_env(key: &str) -> Vec<String> {
    non_empty_env(key)
        .map(|val| parse_list(&val))
        .unwrap_or_default()
}

fn parse_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_env_or<T: std::str::FromStr + std::fmt::Display + Copy>(key: &str, default: T) -> T {
    match non_empty_env(key) {
        Some(val) => match val.parse::<T>() {
            Ok(val) => val,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {}.",
                    key, val, default
                );
                default
            }
        },
        None => default,
    }
}

/// `value` units of `unit_millis` each, or the default when that overflows
fn millis_or(key: &str, value: i64, unit_millis: i64, default: i64) -> i64 {
    match value.checked_mul(unit_millis) {
        Some(millis) => millis,
        None => {
            warn!(
                "The given {}: {} is out of range, falling back to the default: {} ms.",
                key, value, default
            );
            default
        }
    }
}

fn is_http_url(val: &str) -> bool {
    match url::Url::parse(val) {
        Ok(url) => ["https", "http"].contains(&url.scheme()),
        Err(_) => false,
    }
}
