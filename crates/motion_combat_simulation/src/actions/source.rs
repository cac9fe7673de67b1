//! Tabular data sources для action sets.
//!
//! Источник отдаёт ordered snapshot строк по ключу set'а.
//! Формат данных core не знает: только `ActionTableSource::load_rows`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read table file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("table `{0}` not found")]
    MissingTable(String),

    #[error("table key is empty")]
    EmptyKey,
}

/// Bulk-load ordered candidate rows for an action-set key.
pub trait ActionTableSource<C>: Send + Sync {
    fn load_rows(&self, key: &str) -> Result<Vec<C>, TableError>;
}

/// In-memory tables (тесты, процедурные set'ы).
#[derive(Debug, Clone)]
pub struct InMemoryTable<C> {
    tables: HashMap<String, Vec<C>>,
}

impl<C> Default for InMemoryTable<C> {
    fn default() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }
}

impl<C: Clone + Send + Sync> InMemoryTable<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, key: impl Into<String>, rows: Vec<C>) -> Self {
        self.insert(key, rows);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, rows: Vec<C>) {
        self.tables.insert(key.into(), rows);
    }
}

impl<C: Clone + Send + Sync> ActionTableSource<C> for InMemoryTable<C> {
    fn load_rows(&self, key: &str) -> Result<Vec<C>, TableError> {
        if key.is_empty() {
            return Err(TableError::EmptyKey);
        }

        self.tables
            .get(key)
            .cloned()
            .ok_or_else(|| TableError::MissingTable(key.to_string()))
    }
}

/// JSON document `{ "<set key>": [ {row}, ... ], ... }`.
///
/// Документ парсится на каждый `load_rows` (активация set'а: редкое событие).
#[derive(Debug, Clone)]
pub struct JsonTable {
    document: String,
}

impl JsonTable {
    pub fn from_json(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { document })
    }
}

impl<C: DeserializeOwned> ActionTableSource<C> for JsonTable {
    fn load_rows(&self, key: &str) -> Result<Vec<C>, TableError> {
        if key.is_empty() {
            return Err(TableError::EmptyKey);
        }

        let mut tables: HashMap<String, Vec<C>> = serde_json::from_str(&self.document)?;
        tables
            .remove(key)
            .ok_or_else(|| TableError::MissingTable(key.to_string()))
    }
}
