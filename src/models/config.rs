//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Seconds between two scan rounds
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_secs: u64,

    /// Site root handed to templates as their second placeholder
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// When a PDF that is already registered gets notified again
    #[serde(default)]
    pub update_policy: UpdatePolicy,

    /// Bot identity and credentials
    #[serde(default)]
    pub bot: BotConfig,

    /// HTTP client settings shared by every request
    #[serde(default)]
    pub http: HttpConfig,

    /// Telegram Bot API settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Chat receiving error reports
    #[serde(default)]
    pub admin: Option<AdminChat>,

    /// Subscribed chats and the processes each one follows
    #[serde(default)]
    pub chats: Vec<ChatConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Fill secrets from the environment.
    ///
    /// The bot token is looked up as `BOT_TOKEN_<bot>` and chat ids as
    /// `<bot>_CHAT_ID_<chat>`. Values found override those in the file.
    pub fn apply_env_secrets<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot = self.bot.name.clone();

        if let Some(token) = lookup(&format!("BOT_TOKEN_{bot}")) {
            self.bot.token = token;
        }
        if let Some(admin) = self.admin.as_mut() {
            if let Some(id) = lookup(&format!("{bot}_CHAT_ID_{}", admin.name)) {
                admin.chat_id = id;
            }
        }
        for chat in &mut self.chats {
            if let Some(id) = lookup(&format!("{bot}_CHAT_ID_{}", chat.name)) {
                chat.chat_id = id;
            }
        }
    }

    /// Check that every secret needed to talk to Telegram is present.
    pub fn validate_secrets(&self) -> Result<()> {
        if self.bot.token.trim().is_empty() {
            return Err(AppError::config(format!(
                "bot token is empty (set bot.token or BOT_TOKEN_{})",
                self.bot.name
            )));
        }
        if let Some(admin) = &self.admin {
            if admin.chat_id.trim().is_empty() {
                return Err(AppError::config(format!(
                    "admin chat '{}' has no chat id",
                    admin.name
                )));
            }
        }
        for chat in &self.chats {
            if chat.chat_id.trim().is_empty() {
                return Err(AppError::config(format!(
                    "chat '{}' has no chat id (set it or {}_CHAT_ID_{})",
                    chat.name, self.bot.name, chat.name
                )));
            }
        }
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(AppError::validation("poll_interval_secs must be > 0"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.telegram.api_url)?;
        if self.chats.is_empty() {
            return Err(AppError::validation("No chats defined"));
        }

        let mut registries = HashSet::new();
        for chat in &self.chats {
            if chat.processes.is_empty() {
                return Err(AppError::validation(format!(
                    "chat '{}' follows no processes",
                    chat.name
                )));
            }
            for process in &chat.processes {
                process.validate()?;
                if !registries.insert(process.registry_path.clone()) {
                    return Err(AppError::validation(format!(
                        "registry {} is shared by more than one process",
                        process.registry_path.display()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolve relative template and registry paths against `base_dir`.
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        for process in self.chats.iter_mut().flat_map(|c| c.processes.iter_mut()) {
            if process.template_path.is_relative() {
                process.template_path = base_dir.join(&process.template_path);
            }
            if process.registry_path.is_relative() {
                process.registry_path = base_dir.join(&process.registry_path);
            }
        }
    }

    /// Copy of the configuration with credentials blanked, safe to log.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.bot.token.clear();
        if let Some(admin) = copy.admin.as_mut() {
            admin.chat_id.clear();
        }
        for chat in &mut copy.chats {
            chat.chat_id.clear();
        }
        copy
    }

    /// Every (chat, process) pair, in configuration order.
    pub fn targets(&self) -> Vec<Target> {
        self.chats
            .iter()
            .flat_map(|chat| {
                chat.processes.iter().map(move |process| Target {
                    chat_name: chat.name.clone(),
                    chat_id: chat.chat_id.clone(),
                    process: process.clone(),
                })
            })
            .collect()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Count of configured targets.
    pub fn target_count(&self) -> usize {
        self.chats.iter().map(|c| c.processes.len()).sum()
    }
}

/// Change detection policy for names already in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum UpdatePolicy {
    /// Notify again when the publish date strictly advances
    #[default]
    DateAdvance,
    /// Notify only the first time a name is seen
    FirstSight,
}

/// Bot identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Name used to build environment variable keys
    #[serde(default = "defaults::bot_name")]
    pub name: String,

    /// Telegram bot token
    #[serde(default)]
    pub token: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: defaults::bot_name(),
            token: String::new(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "defaults::telegram_api")]
    pub api_url: String,

    #[serde(default = "defaults::disable_preview")]
    pub disable_web_page_preview: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: defaults::telegram_api(),
            disable_web_page_preview: defaults::disable_preview(),
        }
    }
}

/// Chat that receives error reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminChat {
    pub name: String,

    #[serde(default)]
    pub chat_id: String,

    /// Report layout with `{kind}`, `{chat}`, `{process}`, `{pdf}` and
    /// `{message}` placeholders
    #[serde(default)]
    pub report_format: Option<String>,
}

/// A subscribed chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub name: String,

    #[serde(default)]
    pub chat_id: String,

    #[serde(default)]
    pub processes: Vec<SelectiveProcess>,
}

/// A monitored selective process: one page, one template, one registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectiveProcess {
    /// Display name (e.g., "Libre")
    pub name: String,

    /// Page listing the process announcements
    pub url: String,

    /// Notification template file
    pub template_path: PathBuf,

    /// Registry file of PDFs already notified
    pub registry_path: PathBuf,
}

impl SelectiveProcess {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("process with empty name"));
        }
        url::Url::parse(&self.url)?;
        if self.template_path.as_os_str().is_empty() {
            return Err(AppError::validation(format!(
                "process '{}' has no template_path",
                self.name
            )));
        }
        if self.registry_path.as_os_str().is_empty() {
            return Err(AppError::validation(format!(
                "process '{}' has no registry_path",
                self.name
            )));
        }
        Ok(())
    }
}

/// A process together with the chat it notifies. Owned so that each scan
/// task can hold its own copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub chat_name: String,
    pub chat_id: String,
    pub process: SelectiveProcess,
}

impl Target {
    /// Short label used in log lines.
    pub fn label(&self) -> String {
        format!("{}/{}", self.chat_name, self.process.name)
    }
}

mod defaults {
    pub fn poll_interval() -> u64 {
        1800
    }
    pub fn base_url() -> String {
        "https://www.aemet.es".into()
    }
    pub fn bot_name() -> String {
        "pdfwatch".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; pdfwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn telegram_api() -> String {
        "https://api.telegram.org".into()
    }
    pub fn disable_preview() -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SAMPLE: &str = r#"
poll_interval_secs = 60
update_policy = "first-sight"

[bot]
name = "aemet"

[admin]
name = "admin"

[[chats]]
name = "A1"

[[chats.processes]]
name = "Libre"
url = "https://www.aemet.es/es/empleo/a1/libre"
template_path = "templates/a1.txt"
registry_path = "registry/a1-libre.json"

[[chats.processes]]
name = "Interna"
url = "https://www.aemet.es/es/empleo/a1/interna"
template_path = "templates/a1.txt"
registry_path = "registry/a1-interna.json"

[[chats]]
name = "C1"
chat_id = "-100300"

[[chats.processes]]
name = "Libre"
url = "https://www.aemet.es/es/empleo/c1/libre"
template_path = "/etc/pdfwatch/c1.txt"
registry_path = "registry/c1-libre.json"
"#;

    fn sample() -> Config {
        toml::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn parse_sample_with_defaults() {
        let config = sample();
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.update_policy, UpdatePolicy::FirstSight);
        assert_eq!(config.base_url, "https://www.aemet.es");
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.target_count(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn update_policy_defaults_to_date_advance() {
        let config: Config = toml::from_str("[[chats]]\nname = \"x\"").unwrap();
        assert_eq!(config.update_policy, UpdatePolicy::DateAdvance);
    }

    #[test]
    fn env_secrets_fill_missing_values() {
        let mut config = sample();
        assert!(config.validate_secrets().is_err());

        let env: HashMap<&str, &str> = HashMap::from([
            ("BOT_TOKEN_aemet", "12:abc"),
            ("aemet_CHAT_ID_admin", "34"),
            ("aemet_CHAT_ID_A1", "56"),
        ]);
        config.apply_env_secrets(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.bot.token, "12:abc");
        assert_eq!(config.admin.as_ref().unwrap().chat_id, "34");
        assert_eq!(config.chats[0].chat_id, "56");
        // Not in the environment: the file value is kept.
        assert_eq!(config.chats[1].chat_id, "-100300");
        assert!(config.validate_secrets().is_ok());
    }

    #[test]
    fn missing_chat_secret_is_reported() {
        let mut config = sample();
        config.apply_env_secrets(|key| match key {
            "BOT_TOKEN_aemet" => Some("12".into()),
            "aemet_CHAT_ID_admin" => Some("34".into()),
            _ => None,
        });
        let err = config.validate_secrets().unwrap_err();
        assert!(err.to_string().contains("A1"));
    }

    #[test]
    fn missing_admin_secret_is_reported() {
        let mut config = sample();
        config.apply_env_secrets(|key| match key {
            "BOT_TOKEN_aemet" => Some("12".into()),
            "aemet_CHAT_ID_A1" => Some("56".into()),
            _ => None,
        });
        assert!(config.validate_secrets().is_err());
    }

    #[test]
    fn redacted_blanks_credentials() {
        let mut config = sample();
        config.bot.token = "secret".into();
        config.admin.as_mut().unwrap().chat_id = "34".into();
        let redacted = config.redacted();

        assert!(redacted.bot.token.is_empty());
        assert!(redacted.admin.unwrap().chat_id.is_empty());
        assert!(redacted.chats.iter().all(|c| c.chat_id.is_empty()));
        assert_eq!(config.bot.token, "secret");
    }

    #[test]
    fn resolve_paths_keeps_absolute() {
        let mut config = sample();
        config.resolve_paths(Path::new("/srv/watch"));
        let targets = config.targets();

        assert_eq!(
            targets[0].process.registry_path,
            PathBuf::from("/srv/watch/registry/a1-libre.json")
        );
        assert_eq!(
            targets[2].process.template_path,
            PathBuf::from("/etc/pdfwatch/c1.txt")
        );
    }

    #[test]
    fn targets_flatten_in_order() {
        let targets = sample().targets();
        let labels: Vec<_> = targets.iter().map(Target::label).collect();
        assert_eq!(labels, vec!["A1/Libre", "A1/Interna", "C1/Libre"]);
        assert_eq!(targets[2].chat_id, "-100300");
    }

    #[test]
    fn validate_rejects_shared_registry() {
        let mut config = sample();
        config.chats[1].processes[0].registry_path = PathBuf::from("registry/a1-libre.json");
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_url() {
        let mut config = sample();
        config.chats[0].processes[0].url = "not a url".into();
        assert!(matches!(config.validate(), Err(AppError::Url(_))));
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = sample();
        config.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_chats() {
        let mut config = sample();
        config.chats.clear();
        assert!(config.validate().is_err());
    }
}
