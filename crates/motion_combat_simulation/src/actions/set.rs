//! Action sets: tag-keyed (table source + chooser kind) bundles, one active.

use std::sync::Arc;

use thiserror::Error;

use crate::chooser::{Chooser, ChooserKind, ChooserPool};

use super::candidate::ActionCandidate;
use super::source::{ActionTableSource, TableError};
use super::store::CandidateStore;
use super::tags::GameplayTag;

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("action set `{0}` is not registered")]
    UnknownSet(GameplayTag),

    #[error("action set `{0}` has no table source")]
    MissingSource(GameplayTag),

    #[error("action set `{0}` has no chooser kind")]
    MissingChooser(GameplayTag),

    #[error("action set `{set}` references unregistered chooser kind {kind:?}")]
    UnregisteredChooser { set: GameplayTag, kind: ChooserKind },

    #[error("action set `{set}` failed to load: {source}")]
    Load {
        set: GameplayTag,
        #[source]
        source: TableError,
    },
}

/// Описание set'а. Может быть неполным; проверка: при активации.
pub struct ActionSet<C> {
    pub key: GameplayTag,
    /// Ключ таблицы в source (по умолчанию = key)
    pub table_key: String,
    pub source: Option<Arc<dyn ActionTableSource<C>>>,
    pub chooser: Option<ChooserKind>,
}

impl<C> ActionSet<C> {
    pub fn new(key: impl Into<GameplayTag>) -> Self {
        let key = key.into();
        Self {
            table_key: key.as_str().to_string(),
            key,
            source: None,
            chooser: None,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn ActionTableSource<C>>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_chooser(mut self, kind: ChooserKind) -> Self {
        self.chooser = Some(kind);
        self
    }

    pub fn with_table_key(mut self, table_key: impl Into<String>) -> Self {
        self.table_key = table_key.into();
        self
    }
}

/// Активный set: загруженный store + checked-out chooser.
pub struct ActiveSet<C: ActionCandidate> {
    pub key: GameplayTag,
    pub store: CandidateStore<C>,
    pub chooser: Chooser<C>,
}

/// Все set'ы агента одной стороны (attack или defense).
pub struct ActionSetLibrary<C: ActionCandidate> {
    sets: Vec<ActionSet<C>>,
    active: Option<ActiveSet<C>>,
    pool: ChooserPool<C>,
}

impl<C: ActionCandidate> ActionSetLibrary<C> {
    pub fn new(pool: ChooserPool<C>) -> Self {
        Self {
            sets: Vec::new(),
            active: None,
            pool,
        }
    }

    /// Регистрирует set (замена по key, порядок регистрации сохраняется).
    pub fn register(&mut self, set: ActionSet<C>) {
        match self.sets.iter_mut().find(|existing| existing.key == set.key) {
            Some(existing) => *existing = set,
            None => self.sets.push(set),
        }
    }

    pub fn set_keys(&self) -> impl Iterator<Item = &GameplayTag> {
        self.sets.iter().map(|set| &set.key)
    }

    pub fn active(&self) -> Option<&ActiveSet<C>> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut ActiveSet<C>> {
        self.active.as_mut()
    }

    pub fn active_key(&self) -> Option<&GameplayTag> {
        self.active.as_ref().map(|active| &active.key)
    }

    pub fn pool_mut(&mut self) -> &mut ChooserPool<C> {
        &mut self.pool
    }

    /// Перестраивает chooser'ы kind'а (новые веса): idle и активный.
    ///
    /// Store активного set'а не перезагружается.
    pub fn replace_chooser<F>(&mut self, kind: ChooserKind, factory: F)
    where
        F: Fn() -> Chooser<C> + Send + Sync + 'static,
    {
        self.pool.replace_factory(kind, factory);

        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.chooser.kind() != kind {
            return;
        }
        if let Some(fresh) = self.pool.checkout(kind) {
            active.chooser = fresh;
        }
    }

    /// Активирует set. При ошибке предыдущий активный set не трогается.
    pub fn try_activate(&mut self, key: &GameplayTag) -> Result<(), ActivationError> {
        let set = self
            .sets
            .iter()
            .find(|set| &set.key == key)
            .ok_or_else(|| ActivationError::UnknownSet(key.clone()))?;

        let source = set
            .source
            .as_ref()
            .ok_or_else(|| ActivationError::MissingSource(key.clone()))?;
        let kind = set
            .chooser
            .ok_or_else(|| ActivationError::MissingChooser(key.clone()))?;

        if !self.pool.supports(kind) {
            return Err(ActivationError::UnregisteredChooser {
                set: key.clone(),
                kind,
            });
        }

        let rows = source
            .load_rows(&set.table_key)
            .map_err(|source| ActivationError::Load {
                set: key.clone(),
                source,
            })?;

        let chooser = self
            .pool
            .checkout(kind)
            .ok_or_else(|| ActivationError::UnregisteredChooser {
                set: key.clone(),
                kind,
            })?;

        if let Some(previous) = self.active.take() {
            self.pool.release(previous.chooser);
        }

        self.active = Some(ActiveSet {
            key: key.clone(),
            store: CandidateStore::new(rows),
            chooser,
        });
        Ok(())
    }

    /// Boolean-обёртка над `try_activate` с warning'ом.
    pub fn set_active(&mut self, key: &GameplayTag) -> bool {
        match self.try_activate(key) {
            Ok(()) => {
                let count = self.active.as_ref().map_or(0, |active| active.store.len());
                crate::logger::log(&format!(
                    "🗂️ [ActionSets] Activated `{}` ({} candidates)",
                    key, count
                ));
                true
            }
            Err(error) => {
                crate::logger::log_warning(&format!("⚠️ [ActionSets] {}", error));
                false
            }
        }
    }

    /// Нет активного set'а, но set'ы есть → активировать первый.
    pub fn ensure_active(&mut self) -> bool {
        if self.active.is_some() {
            return true;
        }

        let Some(first) = self.sets.first().map(|set| set.key.clone()) else {
            return false;
        };
        self.set_active(&first)
    }
}
