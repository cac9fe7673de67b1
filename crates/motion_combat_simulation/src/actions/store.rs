//! CandidateStore: ordered, immutable-per-selection collection.

use super::candidate::ActionCandidate;

/// Ordered candidates одного активного set'а.
///
/// Порядок = порядок строк таблицы; selector использует его как
/// детерминированный tie-break.
#[derive(Debug, Clone)]
pub struct CandidateStore<C> {
    entries: Vec<C>,
}

impl<C> Default for CandidateStore<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<C: ActionCandidate> CandidateStore<C> {
    pub fn new(entries: Vec<C>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, C> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[C] {
        &self.entries
    }

    pub fn find(&self, name: &str) -> Option<&C> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    /// Transient view: только entries с именем из `names`, в порядке store.
    ///
    /// Store не мутируется; используется для combo continuation.
    pub fn restricted_to<'a, S>(&'a self, names: &'a [S]) -> impl Iterator<Item = &'a C> + 'a
    where
        S: AsRef<str>,
    {
        self.entries
            .iter()
            .filter(move |entry| names.iter().any(|name| name.as_ref() == entry.name()))
    }

    /// Entries с заданной category (caller-side pre-filter).
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a C> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.category() == category)
    }
}
