//! Notification message templates.

use std::path::Path;

use crate::utils::html::escape;

/// Values substituted into a notification template.
#[derive(Debug, Clone, Copy)]
pub struct MessageFields<'a> {
    pub process: &'a str,
    pub base_url: &'a str,
    pub pdf_url: &'a str,
    pub pdf_name: &'a str,
    pub pdf_date: &'a str,
}

impl<'a> MessageFields<'a> {
    /// Positional order of the five `%s` placeholders.
    fn positional(&self) -> [&'a str; 5] {
        [
            self.process,
            self.base_url,
            self.pdf_url,
            self.pdf_name,
            self.pdf_date,
        ]
    }

    fn named(&self) -> [(&'static str, &'a str); 5] {
        [
            ("{process}", self.process),
            ("{base_url}", self.base_url),
            ("{pdf_url}", self.pdf_url),
            ("{pdf_name}", self.pdf_name),
            ("{pdf_date}", self.pdf_date),
        ]
    }
}

/// A notification template read from disk.
///
/// Supported placeholders:
/// - five positional `%s`: process, base URL, pdf url, pdf name, pdf date
/// - `{process}`, `{base_url}`, `{pdf_url}`, `{pdf_name}`, `{pdf_date}`
/// - `%%` for a literal `%`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTemplate {
    raw: String,
}

impl NotificationTemplate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Read a template file.
    pub async fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(Self::new(raw))
    }

    /// Render the template. Values are HTML-escaped; surplus `%s`
    /// placeholders are left untouched.
    pub fn render(&self, fields: &MessageFields<'_>) -> String {
        let mut out = String::with_capacity(self.raw.len() + 128);
        let mut positional = fields.positional().into_iter();
        let named = fields.named();
        let mut rest = self.raw.as_str();

        while let Some(idx) = rest.find(['%', '{']) {
            out.push_str(&rest[..idx]);
            let tail = &rest[idx..];

            if let Some(after) = tail.strip_prefix("%%") {
                out.push('%');
                rest = after;
                continue;
            }
            if let Some(after) = tail.strip_prefix("%s") {
                match positional.next() {
                    Some(value) => out.push_str(&escape(value)),
                    None => out.push_str("%s"),
                }
                rest = after;
                continue;
            }
            if let Some((key, value)) = named.iter().find(|(key, _)| tail.starts_with(key)) {
                out.push_str(&escape(value));
                rest = &tail[key.len()..];
                continue;
            }

            // Lone '%' or '{', both single-byte.
            out.push_str(&tail[..1]);
            rest = &tail[1..];
        }
        out.push_str(rest);
        out
    }
}
