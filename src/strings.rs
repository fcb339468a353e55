//! Per-locale translated strings
//!
//! The string document maps locale -> string key -> value. A translation may
//! leave individual keys empty or absent; those fall back to the fallback
//! locale's value during assembly.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{SimpackError, SimpackResult};

/// All translated strings for a simulation, keyed by locale
#[derive(Debug, Clone, Default)]
pub struct StringMap {
    locales: BTreeMap<String, BTreeMap<String, String>>,
}

impl StringMap {
    /// Load the string document from a JSON file
    pub fn load(path: &Path) -> SimpackResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> SimpackResult<Self> {
        Ok(Self {
            locales: serde_json::from_str(json)?,
        })
    }

    /// Locales with at least one translated string
    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.locales.keys().map(|l| l.as_str())
    }

    pub fn has_locale(&self, locale: &str) -> bool {
        self.locales.contains_key(locale)
    }

    /// Strings for one locale with fallback-locale values filled in
    ///
    /// Starts from the fallback locale's map so every key present there is
    /// guaranteed a value, then overlays the locale's non-empty translations.
    pub fn with_fallbacks(
        &self,
        locale: &str,
        fallback_locale: &str,
    ) -> SimpackResult<BTreeMap<String, String>> {
        let fallback = self
            .locales
            .get(fallback_locale)
            .ok_or_else(|| SimpackError::MissingLocale {
                locale: fallback_locale.to_string(),
            })?;

        let mut merged = fallback.clone();
        if let Some(translated) = self.locales.get(locale) {
            for (key, value) in translated {
                if !value.is_empty() {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(merged)
    }

    /// Look up the artifact title for a locale, with fallback merging applied
    pub fn title(
        &self,
        key: &str,
        locale: &str,
        fallback_locale: &str,
    ) -> SimpackResult<String> {
        let merged = self.with_fallbacks(locale, fallback_locale)?;
        merged
            .get(key)
            .cloned()
            .ok_or_else(|| SimpackError::MissingTitleString {
                key: key.to_string(),
                locale: locale.to_string(),
            })
    }

    /// JSON for embedding: the requested locales only, or every locale
    pub fn embed_json(
        &self,
        locales: &[String],
        fallback_locale: &str,
        all_locales: bool,
    ) -> SimpackResult<String> {
        let mut subset: BTreeMap<&str, BTreeMap<String, String>> = BTreeMap::new();
        if all_locales {
            for locale in self.locales.keys() {
                subset.insert(locale, self.with_fallbacks(locale, fallback_locale)?);
            }
        } else {
            for locale in locales {
                subset.insert(locale, self.with_fallbacks(locale, fallback_locale)?);
            }
        }
        Ok(serde_json::to_string(&subset)?)
    }

    /// The raw, unmerged map for the translation-tooling companion file
    pub fn to_json_pretty(&self) -> SimpackResult<String> {
        Ok(serde_json::to_string_pretty(&self.locales)?)
    }
}
