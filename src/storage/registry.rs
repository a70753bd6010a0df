//! Registry of PDFs already notified for one process.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{PdfRecord, PublishDate};

/// Last known location and date of a PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    #[serde(rename = "pdf_url")]
    pub url: String,

    /// `dd/mm/yyyy`, or empty when the page gave no usable date
    #[serde(rename = "pdf_date", default, deserialize_with = "null_as_empty")]
    pub date: String,
}

impl RegistryEntry {
    /// Stored date in comparable form; `None` when empty or malformed.
    pub fn publish_date(&self) -> Option<PublishDate> {
        PublishDate::from_registry(&self.date)
    }
}

impl From<&PdfRecord> for RegistryEntry {
    fn from(record: &PdfRecord) -> Self {
        Self {
            url: record.url.clone(),
            date: record.date_text(),
        }
    }
}

/// Mapping of PDF name to entry. Serialized as a plain JSON object with
/// sorted keys:
///
/// ```json
/// { "Listado provisional": { "pdf_url": "/a.pdf", "pdf_date": "05/05/2024" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Insert or overwrite the entry for `record.name`.
    pub fn upsert(&mut self, record: &PdfRecord) -> Option<RegistryEntry> {
        self.entries
            .insert(record.name.clone(), RegistryEntry::from(record))
    }

    /// Put back what `upsert` replaced for `name`; `None` removes the entry.
    pub fn restore(&mut self, name: &str, previous: Option<RegistryEntry>) {
        match previous {
            Some(entry) => {
                self.entries.insert(name.to_string(), entry);
            }
            None => {
                self.entries.remove(name);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RegistryEntry)> {
        self.entries.iter()
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, date: Option<PublishDate>) -> PdfRecord {
        PdfRecord {
            url: format!("/{name}.pdf"),
            name: name.to_string(),
            publish_date: date,
        }
    }

    #[test]
    fn test_json_layout() {
        let mut registry = Registry::new();
        registry.upsert(&record("B", PublishDate::from_ymd(2024, 5, 5)));
        registry.upsert(&record("A", None));

        let json = serde_json::to_string(&registry).unwrap();
        assert_eq!(
            json,
            r#"{"A":{"pdf_url":"/A.pdf","pdf_date":""},"B":{"pdf_url":"/B.pdf","pdf_date":"05/05/2024"}}"#
        );

        let back: Registry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, registry);
    }

    #[test]
    fn test_upsert_overwrites_in_place() {
        let mut registry = Registry::new();
        assert!(registry.upsert(&record("A", None)).is_none());
        let previous = registry
            .upsert(&record("A", PublishDate::from_ymd(2024, 1, 2)))
            .unwrap();

        assert_eq!(previous.date, "");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("A").unwrap().date, "02/01/2024");
        assert_eq!(
            registry.get("A").unwrap().publish_date(),
            PublishDate::from_ymd(2024, 1, 2)
        );
    }

    #[test]
    fn test_restore_undoes_upsert() {
        let mut registry = Registry::new();
        let original = record("A", PublishDate::from_ymd(2024, 1, 2));
        registry.upsert(&original);
        let snapshot = registry.clone();

        let previous = registry.upsert(&record("A", PublishDate::from_ymd(2024, 1, 3)));
        registry.restore("A", previous);
        assert_eq!(registry, snapshot);

        let previous = registry.upsert(&record("B", None));
        registry.restore("B", previous);
        assert!(!registry.contains("B"));
        assert_eq!(registry, snapshot);
    }

    #[test]
    fn test_null_or_missing_date() {
        let registry: Registry =
            serde_json::from_str(r#"{"A":{"pdf_url":"a.pdf","pdf_date":null},"B":{"pdf_url":"b.pdf"}}"#)
                .unwrap();
        assert_eq!(registry.get("A").unwrap().date, "");
        assert_eq!(registry.get("B").unwrap().date, "");
        assert!(registry.get("A").unwrap().publish_date().is_none());
    }

    #[test]
    fn test_malformed_registry_is_an_error() {
        assert!(serde_json::from_str::<Registry>(r#"["not", "a", "map"]"#).is_err());
        assert!(serde_json::from_str::<Registry>("{").is_err());
    }
}
