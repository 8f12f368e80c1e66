use anyhow::{Context, Result};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub quiz: QuizConfig,

    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/dailyquiz.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    /// Days a question stays ineligible after appearing in a quiz.
    pub cooldown_days: i64,

    /// Upper bound on quiz size.
    pub questions_per_quiz: usize,

    /// Maximum questions any single topic may contribute to one quiz.
    pub per_topic_cap: usize,

    /// Subject used for weekdays with no entry in `weekday_subjects`.
    pub fallback_subject: String,

    /// Lowercase weekday name -> subject name.
    pub weekday_subjects: HashMap<String, String>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        let weekday_subjects = [
            ("sunday", "Physics"),
            ("monday", "Chemistry"),
            ("tuesday", "Biology"),
            ("wednesday", "Maths"),
            ("thursday", "English"),
            ("friday", "IQ/GK"),
        ]
        .into_iter()
        .map(|(day, subject)| (day.to_string(), subject.to_string()))
        .collect();

        Self {
            cooldown_days: 150,
            questions_per_quiz: 10,
            per_topic_cap: 5,
            fallback_subject: "IQ/GK".to_string(),
            weekday_subjects,
        }
    }
}

const WEEKDAY_KEYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

impl QuizConfig {
    /// Subject for a weekday; days without a dedicated subject fall back to
    /// `fallback_subject`, so every weekday resolves.
    #[must_use]
    pub fn subject_for(&self, weekday: Weekday) -> &str {
        self.weekday_subjects
            .get(weekday_key(weekday))
            .map_or(self.fallback_subject.as_str(), String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// 6-field cron expression (seconds first). Preferred trigger; the
    /// interval below is the fallback when unset.
    pub cron_expression: Option<String>,

    /// Interval fallback. Generation is idempotent per date, so a coarse
    /// repeat only re-reads the existing quiz row.
    pub interval_minutes: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron_expression: Some("0 5 0 * * *".to_string()),
            interval_minutes: 60,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("dailyquiz").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".dailyquiz").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.quiz.cooldown_days <= 0 {
            anyhow::bail!("Cooldown days must be positive");
        }

        if self.quiz.questions_per_quiz == 0 {
            anyhow::bail!("Questions per quiz must be > 0");
        }

        if self.quiz.per_topic_cap == 0 {
            anyhow::bail!("Per-topic cap must be > 0");
        }

        if self.quiz.fallback_subject.trim().is_empty() {
            anyhow::bail!("Fallback subject cannot be empty");
        }

        for key in self.quiz.weekday_subjects.keys() {
            if !WEEKDAY_KEYS.contains(&key.as_str()) {
                anyhow::bail!(
                    "Unknown weekday '{}' in [quiz.weekday_subjects] (expected e.g. \"monday\")",
                    key
                );
            }
        }

        if self.scheduler.enabled
            && self.scheduler.interval_minutes == 0
            && self.scheduler.cron_expression.is_none()
        {
            anyhow::bail!("Scheduler interval must be > 0 or cron expression must be set");
        }

        Ok(())
    }
}
