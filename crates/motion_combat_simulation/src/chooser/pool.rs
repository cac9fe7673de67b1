//! Chooser kinds, registry (kind → factory) and per-agent pool.
//!
//! Пул принадлежит одному агенту и никогда не шарится. Reset на checkout,
//! поэтому debug records прошлого владельца slot'а не протекают.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::actions::{ActionCandidate, AttackEntry, DefenseEntry};
use crate::config::ScoringConfig;

use super::eligibility::{AlwaysEligible, TagEligibility};
use super::scoring::{AttackScoring, DefenseScoring};
use super::selector::Chooser;

/// Strategy kind, которым action set ссылается на chooser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChooserKind {
    /// AlwaysEligible + AttackScoring
    StandardAttack,
    /// TagEligibility + DefenseScoring
    StandardDefense,
    /// Designer-registered стратегии
    Custom(u16),
}

type ChooserFactory<C> = Box<dyn Fn() -> Chooser<C> + Send + Sync>;

pub struct ChooserRegistry<C: ActionCandidate> {
    factories: HashMap<ChooserKind, ChooserFactory<C>>,
}

impl<C: ActionCandidate> Default for ChooserRegistry<C> {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }
}

impl<C: ActionCandidate> ChooserRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Регистрирует фабрику (перезаписывает существующую для того же kind).
    pub fn register<F>(&mut self, kind: ChooserKind, factory: F)
    where
        F: Fn() -> Chooser<C> + Send + Sync + 'static,
    {
        self.factories.insert(kind, Box::new(factory));
    }

    pub fn contains(&self, kind: ChooserKind) -> bool {
        self.factories.contains_key(&kind)
    }

    pub fn build(&self, kind: ChooserKind) -> Option<Chooser<C>> {
        self.factories.get(&kind).map(|factory| factory())
    }
}

/// Фабрика `ChooserKind::StandardAttack` с данными весами.
pub fn standard_attack(config: ScoringConfig) -> impl Fn() -> Chooser<AttackEntry> + Send + Sync + 'static {
    move || {
        Chooser::new(
            ChooserKind::StandardAttack,
            AlwaysEligible,
            AttackScoring::new(config.clone()),
        )
    }
}

/// Фабрика `ChooserKind::StandardDefense` с данными весами.
pub fn standard_defense(config: ScoringConfig) -> impl Fn() -> Chooser<DefenseEntry> + Send + Sync + 'static {
    move || {
        Chooser::new(
            ChooserKind::StandardDefense,
            TagEligibility,
            DefenseScoring::new(config.clone()),
        )
    }
}

impl ChooserRegistry<AttackEntry> {
    pub fn attack_defaults(config: ScoringConfig) -> Self {
        let mut registry = Self::new();
        registry.register(ChooserKind::StandardAttack, standard_attack(config));
        registry
    }
}

impl ChooserRegistry<DefenseEntry> {
    pub fn defense_defaults(config: ScoringConfig) -> Self {
        let mut registry = Self::new();
        registry.register(ChooserKind::StandardDefense, standard_defense(config));
        registry
    }
}

/// Idle chooser instances по kind'у.
pub struct ChooserPool<C: ActionCandidate> {
    registry: ChooserRegistry<C>,
    idle: HashMap<ChooserKind, Vec<Chooser<C>>>,
}

impl<C: ActionCandidate> ChooserPool<C> {
    pub fn new(registry: ChooserRegistry<C>) -> Self {
        Self {
            registry,
            idle: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &ChooserRegistry<C> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ChooserRegistry<C> {
        &mut self.registry
    }

    pub fn supports(&self, kind: ChooserKind) -> bool {
        self.registry.contains(kind)
    }

    /// Переиспользует idle instance или строит новый. Всегда reset.
    pub fn checkout(&mut self, kind: ChooserKind) -> Option<Chooser<C>> {
        let reused = self.idle.get_mut(&kind).and_then(Vec::pop);
        let mut chooser = match reused {
            Some(chooser) => chooser,
            None => self.registry.build(kind)?,
        };

        chooser.reset();
        Some(chooser)
    }

    /// Новая фабрика для kind'а; idle instances старой фабрики выбрасываются.
    pub fn replace_factory<F>(&mut self, kind: ChooserKind, factory: F)
    where
        F: Fn() -> Chooser<C> + Send + Sync + 'static,
    {
        self.registry.register(kind, factory);
        self.idle.remove(&kind);
    }

    pub fn release(&mut self, chooser: Chooser<C>) {
        self.idle.entry(chooser.kind()).or_default().push(chooser);
    }

    pub fn idle_count(&self, kind: ChooserKind) -> usize {
        self.idle.get(&kind).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{AttackType, TagSet};
    use crate::chooser::{ChoiceContext, FixedJitter, SituationContext};
    use crate::collaborators::PoseTable;
    use bevy::prelude::*;

    #[test]
    fn test_checkout_unknown_kind() {
        let mut pool = ChooserPool::new(ChooserRegistry::attack_defaults(ScoringConfig::default()));
        assert!(pool.checkout(ChooserKind::StandardDefense).is_none());
        assert!(pool.checkout(ChooserKind::StandardAttack).is_some());
    }

    #[test]
    fn test_checkout_resets_reused_instance() {
        let mut pool = ChooserPool::new(ChooserRegistry::attack_defaults(ScoringConfig::default()));
        let mut chooser = pool.checkout(ChooserKind::StandardAttack).unwrap();

        // Заполняем debug records (актёры невалидны → floor, но запись есть)
        let mut world = World::new();
        let actor = world.spawn_empty().id();
        let poses = PoseTable::new();
        let situation = SituationContext::default();
        let tags = TagSet::new();
        let ctx = ChoiceContext {
            self_actor: actor,
            other_actor: None,
            intent: AttackType::Light,
            direction: crate::actions::ActionDirection::Omni,
            situation: &situation,
            self_tags: &tags,
            spatial: &poses,
        };
        let candidates = vec![AttackEntry::new("Jab", AttackType::Light)];
        assert!(chooser.choose_best(&candidates, &ctx, &mut FixedJitter(0.0)).is_none());
        assert_eq!(chooser.debug_records().len(), 1);

        pool.release(chooser);
        assert_eq!(pool.idle_count(ChooserKind::StandardAttack), 1);

        let reused = pool.checkout(ChooserKind::StandardAttack).unwrap();
        assert!(reused.debug_records().is_empty());
        assert_eq!(pool.idle_count(ChooserKind::StandardAttack), 0);
    }

    #[test]
    fn test_custom_kind_registration() {
        let mut registry = ChooserRegistry::<DefenseEntry>::defense_defaults(ScoringConfig::default());
        registry.register(ChooserKind::Custom(7), || {
            Chooser::new(
                ChooserKind::Custom(7),
                AlwaysEligible,
                DefenseScoring::default(),
            )
        });

        let mut pool = ChooserPool::new(registry);
        assert!(pool.supports(ChooserKind::Custom(7)));
        assert_eq!(pool.checkout(ChooserKind::Custom(7)).unwrap().kind(), ChooserKind::Custom(7));
    }
}
