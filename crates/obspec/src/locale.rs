//! Explicitly constructed message catalogs.
//!
//! A `LocaleContext` is built once (synchronously for the built-in English
//! catalog, or by awaiting [`LocaleContext::load`]) and passed by reference to
//! everything that produces user-facing text.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{ObspecError, Result};

/// Messages used by the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// Appended to the title of a denominator request in generated scripts.
    DenomHelperText,
    /// Shown when metadata could not be loaded.
    MetadataLoadError,
    /// Label for the per-capita form of a stat var.
    PerCapita,
}

impl MessageId {
    /// Key of the message in catalog files.
    pub fn key(&self) -> &'static str {
        match self {
            MessageId::DenomHelperText => "ApiDialogDenomHelperText",
            MessageId::MetadataLoadError => "MetadataLoadError",
            MessageId::PerCapita => "PerCapita",
        }
    }

    fn english(&self) -> &'static str {
        match self {
            MessageId::DenomHelperText => "(used as the denominator for per capita values)",
            MessageId::MetadataLoadError => "There was a problem loading the metadata.",
            MessageId::PerCapita => "Per Capita",
        }
    }

    const ALL: [MessageId; 3] = [
        MessageId::DenomHelperText,
        MessageId::MetadataLoadError,
        MessageId::PerCapita,
    ];
}

/// Prefix of stat var label keys, e.g. `statVar.Count_Person`.
const STAT_VAR_LABEL_PREFIX: &str = "statVar.";

/// A loaded message catalog for one locale.
#[derive(Debug, Clone)]
pub struct LocaleContext {
    locale: String,
    messages: HashMap<String, String>,
}

impl LocaleContext {
    /// The built-in English catalog.
    pub fn english() -> Self {
        let messages = MessageId::ALL
            .iter()
            .map(|id| (id.key().to_string(), id.english().to_string()))
            .collect();
        Self {
            locale: "en".to_string(),
            messages,
        }
    }

    /// Build a context from catalog entries, falling back to English for
    /// anything the catalog lacks.
    pub fn from_catalog(locale: impl Into<String>, catalog: HashMap<String, String>) -> Self {
        let mut context = Self::english();
        context.locale = locale.into();
        context.messages.extend(catalog);
        context
    }

    /// Read `{dir}/{locale}.json` (a flat object of message keys to text).
    pub async fn load(locale: &str, dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(format!("{}.json", locale));
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ObspecError::Io {
                path: path.clone(),
                source,
            })?;
        let catalog: HashMap<String, String> = serde_json::from_str(&content).map_err(|e| {
            ObspecError::Locale(format!(
                "Failed to parse message catalog '{}': {}",
                path.display(),
                e
            ))
        })?;
        debug!(locale, entries = catalog.len(), "loaded message catalog");
        Ok(Self::from_catalog(locale, catalog))
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Text of a library message.
    pub fn message(&self, id: MessageId) -> &str {
        self.messages
            .get(id.key())
            .map(String::as_str)
            .unwrap_or_else(|| id.english())
    }

    /// Display label of a stat var, or the DCID when the catalog has none.
    pub fn stat_var_label<'a>(&'a self, dcid: &'a str) -> &'a str {
        self.messages
            .get(&format!("{}{}", STAT_VAR_LABEL_PREFIX, dcid))
            .map(String::as_str)
            .unwrap_or(dcid)
    }
}

impl Default for LocaleContext {
    fn default() -> Self {
        Self::english()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_defaults() {
        let ctx = LocaleContext::english();
        assert_eq!(ctx.locale(), "en");
        assert_eq!(ctx.message(MessageId::PerCapita), "Per Capita");
        assert_eq!(ctx.stat_var_label("Count_Person"), "Count_Person");
    }

    #[test]
    fn test_catalog_overrides_and_falls_back() {
        let mut catalog = HashMap::new();
        catalog.insert("PerCapita".to_string(), "Par habitant".to_string());
        catalog.insert("statVar.Count_Person".to_string(), "Population".to_string());
        let ctx = LocaleContext::from_catalog("fr", catalog);

        assert_eq!(ctx.message(MessageId::PerCapita), "Par habitant");
        assert_eq!(
            ctx.message(MessageId::DenomHelperText),
            MessageId::DenomHelperText.english()
        );
        assert_eq!(ctx.stat_var_label("Count_Person"), "Population");
    }

    #[tokio::test]
    async fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("de.json"),
            r#"{"ApiDialogDenomHelperText": "(Nenner)"}"#,
        )
        .unwrap();

        let ctx = LocaleContext::load("de", dir.path()).await.unwrap();
        assert_eq!(ctx.locale(), "de");
        assert_eq!(ctx.message(MessageId::DenomHelperText), "(Nenner)");
    }

    #[tokio::test]
    async fn test_load_missing_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocaleContext::load("xx", dir.path()).await.unwrap_err();
        assert!(matches!(err, ObspecError::Io { .. }));
    }
}
