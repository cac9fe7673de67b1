//! Hierarchical gameplay tags ("State.Stunned.Heavy").

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Dot-separated hierarchical tag.
///
/// Владелец тега "State.Stunned.Heavy" удовлетворяет запросу "State.Stunned".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameplayTag(String);

impl GameplayTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `self` равен `query` или является его потомком.
    pub fn matches(&self, query: &GameplayTag) -> bool {
        match self.0.strip_prefix(query.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with('.'),
            None => false,
        }
    }
}

impl fmt::Display for GameplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameplayTag {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Ordered set of tags (BTreeSet → детерминированный порядок итерации).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<GameplayTag>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<GameplayTag>) -> bool {
        self.0.insert(tag.into())
    }

    pub fn remove(&mut self, tag: &GameplayTag) -> bool {
        self.0.remove(tag)
    }

    /// Hierarchical lookup: любой owned tag матчит `query`.
    pub fn contains(&self, query: &GameplayTag) -> bool {
        self.0.iter().any(|owned| owned.matches(query))
    }

    pub fn contains_exact(&self, tag: &GameplayTag) -> bool {
        self.0.contains(tag)
    }

    /// Все теги из `required` присутствуют (пустой required → true).
    pub fn has_all(&self, required: &TagSet) -> bool {
        required.iter().all(|tag| self.contains(tag))
    }

    /// Хотя бы один тег из `other` присутствует.
    pub fn has_any(&self, other: &TagSet) -> bool {
        other.iter().any(|tag| self.contains(tag))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameplayTag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Into<GameplayTag>> FromIterator<T> for TagSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_hierarchy_matching() {
        let owned = GameplayTag::new("State.Stunned.Heavy");

        assert!(owned.matches(&GameplayTag::new("State.Stunned")));
        assert!(owned.matches(&GameplayTag::new("State")));
        assert!(owned.matches(&GameplayTag::new("State.Stunned.Heavy")));
        // Префикс строки, но не родитель в иерархии
        assert!(!owned.matches(&GameplayTag::new("State.Stun")));
        assert!(!GameplayTag::new("State").matches(&owned));
    }

    #[test]
    fn test_tag_set_queries() {
        let owned: TagSet = ["Weapon.Sword", "State.Grounded"].into_iter().collect();
        let required: TagSet = ["Weapon"].into_iter().collect();
        let excluded: TagSet = ["State.Stunned"].into_iter().collect();

        assert!(owned.has_all(&required));
        assert!(!owned.has_any(&excluded));
        assert!(owned.has_all(&TagSet::new()));
        assert!(owned.contains_exact(&GameplayTag::new("Weapon.Sword")));
        assert!(!owned.contains_exact(&GameplayTag::new("Weapon")));
    }

    #[test]
    fn test_tag_set_json_is_plain_array() {
        let tags: TagSet = serde_json::from_str(r#"["B.Tag", "A.Tag"]"#).unwrap();
        let names: Vec<_> = tags.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["A.Tag", "B.Tag"]); // отсортировано
    }
}
