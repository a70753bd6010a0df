// src/models/mod.rs

//! Domain models for the watcher.

mod config;
mod pdf;
mod template;

// Re-export all public types
pub use config::{
    AdminChat, BotConfig, ChatConfig, Config, HttpConfig, SelectiveProcess, Target,
    TelegramConfig, UpdatePolicy,
};
pub use pdf::{DATE_LAYOUT, PdfRecord, PublishDate};
pub use template::{MessageFields, NotificationTemplate};
