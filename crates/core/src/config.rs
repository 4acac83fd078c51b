use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HostwatchError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub monitor: MonitorConfig,
    pub alerts: AlertConfig,
    pub prediction: PredictionConfig,
    pub storage: StorageConfig,
    pub api: ApiConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `HOSTWATCH_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("HOSTWATCH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            monitor: MonitorConfig::from_env_profiled(p),
            alerts: AlertConfig::from_env_profiled(p),
            prediction: PredictionConfig::from_env_profiled(p),
            storage: StorageConfig::from_env_profiled(p),
            api: ApiConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Reject combinations the monitor cannot start with.
    pub fn validate(&self) -> Result<(), HostwatchError> {
        if self.monitor.interval.is_zero() {
            return Err(HostwatchError::Config(
                "MONITOR_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        if self.alerts.channels.contains(&AlertChannel::Email) {
            let email = &self.alerts.email;
            if email.smtp_host.is_none() || email.from.is_none() || email.to.is_empty() {
                return Err(HostwatchError::Config(
                    "email channel requires SMTP_HOST, ALERT_EMAIL_FROM and ALERT_EMAIL_TO"
                        .to_string(),
                ));
            }
        }
        if self.alerts.channels.contains(&AlertChannel::Webhook)
            && self.alerts.webhook_url.is_none()
        {
            return Err(HostwatchError::Config(
                "webhook channel requires ALERT_WEBHOOK_URL".to_string(),
            ));
        }
        Ok(())
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        let channels: Vec<&str> = self.alerts.channels.iter().map(|c| c.as_str()).collect();
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  monitor:     interval={}s, policy={}",
            self.monitor.interval.as_secs(),
            self.monitor
                .policy_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(built-in)".to_string())
        );
        tracing::info!(
            "  alerts:      enabled={}, cooldown={}s, channels=[{}]",
            self.alerts.enabled,
            self.alerts.cooldown.as_secs(),
            channels.join(", ")
        );
        tracing::info!(
            "  prediction:  ml={}, model={}, threshold={}",
            self.prediction.ml_enabled,
            self.prediction.model_path.display(),
            self.prediction.confidence_threshold
        );
        tracing::info!(
            "  storage:     data_dir={}, persistence={}",
            self.storage.data_dir.display(),
            self.storage.persistence_enabled
        );
        tracing::info!(
            "  api:         enabled={}, addr={}:{}",
            self.api.enabled,
            self.api.host,
            self.api.port
        );
    }
}

// ── Monitor ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub interval: Duration,
    /// YAML health policy (thresholds, weights, score range). Built-in when unset.
    pub policy_path: Option<PathBuf>,
    pub suggestions_enabled: bool,
}

impl MonitorConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            interval: Duration::from_secs(profiled_env_u64(p, "MONITOR_INTERVAL_SECS", 5)),
            policy_path: profiled_env_opt(p, "POLICY_PATH").map(PathBuf::from),
            suggestions_enabled: profiled_env_bool(p, "SUGGESTIONS_ENABLED", true),
        }
    }
}

// ── Alerts ────────────────────────────────────────────────────

/// Delivery channels an alert can fan out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertChannel {
    Console,
    Desktop,
    Email,
    Webhook,
}

impl AlertChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertChannel::Console => "console",
            AlertChannel::Desktop => "desktop",
            AlertChannel::Email => "email",
            AlertChannel::Webhook => "webhook",
        }
    }
}

impl fmt::Display for AlertChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertChannel {
    type Err = HostwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "console" => Ok(AlertChannel::Console),
            "desktop" => Ok(AlertChannel::Desktop),
            "email" => Ok(AlertChannel::Email),
            "webhook" => Ok(AlertChannel::Webhook),
            other => Err(HostwatchError::Config(format!("unknown alert channel '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    pub enabled: bool,
    /// Minimum time between repeated alerts for the same (metric, tier) key.
    pub cooldown: Duration,
    pub channels: Vec<AlertChannel>,
    /// Upper bound on a single channel delivery.
    pub channel_timeout: Duration,
    pub subject_template: Option<String>,
    pub body_template: Option<String>,
    pub email: EmailConfig,
    pub webhook_url: Option<String>,
}

impl AlertConfig {
    fn from_env_profiled(p: &str) -> Self {
        let cooldown_raw = profiled_env_or(p, "ALERT_COOLDOWN", "300s");
        let cooldown = parse_duration(&cooldown_raw).unwrap_or_else(|| {
            tracing::warn!(value = %cooldown_raw, "invalid ALERT_COOLDOWN, using 300s");
            Duration::from_secs(300)
        });

        let mut channels = Vec::new();
        for name in split_list(&profiled_env_or(p, "ALERT_CHANNELS", "console")) {
            match name.parse::<AlertChannel>() {
                Ok(channel) if !channels.contains(&channel) => channels.push(channel),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "ignoring alert channel"),
            }
        }

        Self {
            enabled: profiled_env_bool(p, "ALERTS_ENABLED", true),
            cooldown,
            channels,
            channel_timeout: Duration::from_secs(profiled_env_u64(
                p,
                "ALERT_CHANNEL_TIMEOUT_SECS",
                10,
            )),
            subject_template: profiled_env_opt(p, "ALERT_SUBJECT_TEMPLATE"),
            body_template: profiled_env_opt(p, "ALERT_BODY_TEMPLATE"),
            email: EmailConfig::from_env_profiled(p),
            webhook_url: profiled_env_opt(p, "ALERT_WEBHOOK_URL"),
        }
    }
}

/// SMTP settings. Credentials are read by the email channel from
/// `SMTP_USERNAME` / `SMTP_PASSWORD` and never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub tls: bool,
    pub from: Option<String>,
    pub to: Vec<String>,
}

impl EmailConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            smtp_host: profiled_env_opt(p, "SMTP_HOST"),
            smtp_port: profiled_env_opt(p, "SMTP_PORT").and_then(|v| v.parse().ok()),
            tls: profiled_env_bool(p, "SMTP_TLS", true),
            from: profiled_env_opt(p, "ALERT_EMAIL_FROM"),
            to: profiled_env_opt(p, "ALERT_EMAIL_TO")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
        }
    }
}

// ── Prediction ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    pub ml_enabled: bool,
    pub model_path: PathBuf,
    /// 0–1; probabilities at or above `threshold * 100` are high risk.
    pub confidence_threshold: f64,
}

impl PredictionConfig {
    fn from_env_profiled(p: &str) -> Self {
        let threshold = profiled_env_opt(p, "PREDICTION_CONFIDENCE_THRESHOLD")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(0.75)
            .clamp(0.0, 1.0);
        Self {
            ml_enabled: profiled_env_bool(p, "ML_ENABLED", false),
            model_path: PathBuf::from(profiled_env_or(p, "ML_MODEL_PATH", "ml/model.json")),
            confidence_threshold: threshold,
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub persistence_enabled: bool,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            data_dir: PathBuf::from(profiled_env_or(p, "DATA_DIR", "data")),
            persistence_enabled: profiled_env_bool(p, "PERSISTENCE_ENABLED", true),
        }
    }

    pub fn system_log_path(&self) -> PathBuf {
        self.data_dir.join("system_logs.csv")
    }

    pub fn prediction_log_path(&self) -> PathBuf {
        self.data_dir.join("prediction_data.csv")
    }
}

// ── API ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl ApiConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            enabled: profiled_env_bool(p, "API_ENABLED", true),
            host: profiled_env_or(p, "API_HOST", "127.0.0.1"),
            port: profiled_env_u16(p, "API_PORT", 5000),
        }
    }
}

// ── Duration parsing ──────────────────────────────────────────

/// Parse a human-readable duration string into a [`Duration`].
///
/// Supports components: `Xd` (days), `Xh` (hours), `Xm` (minutes), `Xs` (seconds).
/// Components can be combined: "2h30m", "1d12h", "90s". A bare number is seconds.
/// Returns `None` if the string is empty or unparseable.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let mut total_secs: u64 = 0;
    let mut num_buf = String::new();
    let mut found_unit = false;

    for ch in s.chars() {
        if ch.is_ascii_digit() {
            num_buf.push(ch);
        } else {
            let n: u64 = num_buf.parse().ok()?;
            num_buf.clear();
            match ch {
                'd' => total_secs += n * 86_400,
                'h' => total_secs += n * 3_600,
                'm' => total_secs += n * 60,
                's' => total_secs += n,
                _ => return None,
            }
            found_unit = true;
        }
    }

    if !num_buf.is_empty() {
        if found_unit {
            // "30m15" is ambiguous.
            return None;
        }
        total_secs += num_buf.parse::<u64>().ok()?;
    }

    Some(Duration::from_secs(total_secs))
}
