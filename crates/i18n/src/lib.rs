//! Static translation catalog.
//!
//! A small `lang → key → text` table loaded once at startup. Lookups fall
//! through to the default language and finally to the key itself, so a
//! missing translation degrades to something greppable instead of an error.

use std::{collections::HashMap, path::Path};

use {anyhow::Context, tracing::warn};

/// Notice posted into a topic when a reply cannot be delivered to the user.
pub const ERROR_FORWARD_USER: &str = "error_forward_user";

const EMBEDDED: &str = include_str!("../data/i18n.json");

type Table = HashMap<String, HashMap<String, String>>;

/// Immutable translation table with a fixed default language.
#[derive(Debug)]
pub struct Catalog {
    default_lang: String,
    table: Table,
}

impl Catalog {
    /// Catalog from the translation table compiled into the binary.
    pub fn embedded(default_lang: &str) -> Self {
        let table = match serde_json::from_str::<Table>(EMBEDDED) {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "embedded translation table invalid, keys will be returned raw");
                Table::default()
            },
        };
        Self {
            default_lang: default_lang.to_string(),
            table,
        }
    }

    /// Catalog from a JSON file on disk, overriding the embedded table.
    pub fn from_file(path: &Path, default_lang: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let table = serde_json::from_str(&raw)
            .with_context(|| format!("invalid translation table {}", path.display()))?;
        Ok(Self {
            default_lang: default_lang.to_string(),
            table,
        })
    }

    /// Resolve `key` in the default language.
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.get_in(&self.default_lang, key)
    }

    /// Resolve `key` in `lang`, falling back to the default language, then to
    /// the key itself.
    pub fn get_in<'a>(&'a self, lang: &str, key: &'a str) -> &'a str {
        self.table
            .get(lang)
            .and_then(|m| m.get(key))
            .or_else(|| self.table.get(&self.default_lang).and_then(|m| m.get(key)))
            .map(String::as_str)
            .unwrap_or(key)
    }
}
