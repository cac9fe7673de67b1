//! CombatDefense: defense side of an agent.
//!
//! Parry (facing check) и block (без facing check) намеренно асимметричны.
//! Window state приходит от `CombatCore` через `RoutedWindow`.

use bevy::prelude::*;

use crate::actions::{
    ActionCandidate, ActionDirection, ActionSet, ActionSetLibrary, DefenseEntry, DefenseIntent,
    GameplayTag, TagSet,
};
use crate::chooser::{
    standard_defense, ChoiceContext, ChooserKind, ChooserPool, ChooserRegistry, DebugScoreRecord,
    JitterSource, SituationContext,
};
use crate::collaborators::SpatialQuery;
use crate::config::ScoringConfig;
use crate::events::{CombatEventBus, DefenseSucceeded, ParrySucceeded, SubscriptionId};
use crate::windows::{WindowKind, WindowNotification};

/// Facing threshold для parry (dot > threshold, ~75° half-cone)
pub const PARRY_FACING_THRESHOLD: f32 = 0.25;

/// Исход parry/block попытки (для host'а: анимации, звуки, stagger).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefenseSignal {
    ParrySucceeded { attacker: Entity },
    /// Окно открыто, но defender смотрит не туда
    ParryFailed { attacker: Entity },
    DefenseSucceeded { attacker: Option<Entity> },
}

/// Подписки defense component'а на global bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefenseHandlerIds {
    attack_started: SubscriptionId,
    parry_window_opened: SubscriptionId,
    parry_succeeded: SubscriptionId,
    defense_succeeded: SubscriptionId,
}

impl DefenseHandlerIds {
    pub fn unbind(self, bus: &mut CombatEventBus) {
        bus.attack_started.unsubscribe(self.attack_started);
        bus.parry_window_opened.unsubscribe(self.parry_window_opened);
        bus.parry_succeeded.unsubscribe(self.parry_succeeded);
        bus.defense_succeeded.unsubscribe(self.defense_succeeded);
    }
}

#[derive(Component)]
pub struct CombatDefense {
    owner: Entity,
    defense_sets: ActionSetLibrary<DefenseEntry>,
    tags: TagSet,
    in_parry_window: bool,
    /// Владелец открытого parry window
    parry_attacker: Option<Entity>,
    in_defense_window: bool,
    /// Последний AttackStarted, нацеленный на нас
    incoming_attacker: Option<Entity>,
    facing_threshold: f32,
    signals: Vec<DefenseSignal>,
    handlers: Option<DefenseHandlerIds>,
}

impl CombatDefense {
    pub fn new(owner: Entity, scoring: ScoringConfig) -> Self {
        Self {
            owner,
            defense_sets: ActionSetLibrary::new(ChooserPool::new(
                ChooserRegistry::defense_defaults(scoring),
            )),
            tags: TagSet::new(),
            in_parry_window: false,
            parry_attacker: None,
            in_defense_window: false,
            incoming_attacker: None,
            facing_threshold: PARRY_FACING_THRESHOLD,
            signals: Vec::new(),
            handlers: None,
        }
    }

    pub fn with_defense_set(mut self, set: ActionSet<DefenseEntry>) -> Self {
        self.register_defense_set(set);
        self
    }

    pub fn with_facing_threshold(mut self, threshold: f32) -> Self {
        self.facing_threshold = threshold;
        self
    }

    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagSet {
        &mut self.tags
    }

    pub fn in_parry_window(&self) -> bool {
        self.in_parry_window
    }

    pub fn parry_attacker(&self) -> Option<Entity> {
        self.parry_attacker
    }

    pub fn in_defense_window(&self) -> bool {
        self.in_defense_window
    }

    pub fn incoming_attacker(&self) -> Option<Entity> {
        self.incoming_attacker
    }

    pub fn note_incoming_attack(&mut self, attacker: Entity) {
        self.incoming_attacker = Some(attacker);
    }

    // ========================================================================
    // Action sets
    // ========================================================================

    pub fn register_defense_set(&mut self, set: ActionSet<DefenseEntry>) {
        self.defense_sets.register(set);
    }

    pub fn set_active_defense_set(&mut self, key: &GameplayTag) -> bool {
        self.defense_sets.set_active(key)
    }

    pub fn ensure_active_set(&mut self) -> bool {
        self.defense_sets.ensure_active()
    }

    pub fn active_defense_set(&self) -> Option<&GameplayTag> {
        self.defense_sets.active_key()
    }

    /// Новые веса для StandardDefense chooser'а.
    pub fn apply_scoring(&mut self, scoring: &ScoringConfig) {
        self.defense_sets
            .replace_chooser(ChooserKind::StandardDefense, standard_defense(scoring.clone()));
    }

    /// Выбор defense против `attacker`. None = selection miss (warning).
    pub fn choose_defense(
        &mut self,
        attacker: Option<Entity>,
        intent: DefenseIntent,
        situation: &SituationContext,
        spatial: &dyn SpatialQuery,
        jitter: &mut dyn JitterSource,
    ) -> Option<DefenseEntry> {
        self.defense_sets.ensure_active();

        let Some(active) = self.defense_sets.active_mut() else {
            crate::logger::log_warning(&format!(
                "⚠️ [CombatDefense] {:?}: no active defense set",
                self.owner
            ));
            return None;
        };

        let ctx = ChoiceContext {
            self_actor: self.owner,
            other_actor: attacker,
            intent,
            direction: ActionDirection::Omni,
            situation,
            self_tags: &self.tags,
            spatial,
        };

        let chosen = active
            .chooser
            .choose_best(active.store.iter(), &ctx, jitter)
            .cloned();

        match &chosen {
            Some(defense) => crate::logger::log(&format!(
                "🛡️ [CombatDefense] {:?}: chose '{}' vs {:?}",
                self.owner,
                defense.name(),
                attacker
            )),
            None => crate::logger::log_warning(&format!(
                "⚠️ [CombatDefense] {:?}: no valid defense ({:?} vs {:?})",
                self.owner, intent, attacker
            )),
        }
        chosen
    }

    pub fn debug_scores(&self) -> &[DebugScoreRecord] {
        self.defense_sets
            .active()
            .map(|active| active.chooser.debug_records())
            .unwrap_or_default()
    }

    // ========================================================================
    // Windows
    // ========================================================================

    /// Parry/Defense window notification (routed из `CombatCore`).
    pub fn on_window(&mut self, notification: &WindowNotification) {
        let source = notification.window.owner;

        match notification.kind() {
            WindowKind::Parry if notification.is_begin() => {
                self.in_parry_window = true;
                self.parry_attacker = Some(source);
            }
            WindowKind::Parry => {
                // Чужой end не закрывает окно другого атакующего
                if self.parry_attacker == Some(source) {
                    self.in_parry_window = false;
                    self.parry_attacker = None;
                }
            }
            WindowKind::Defense => {
                self.in_defense_window = notification.is_begin();
            }
            _ => {}
        }
    }

    /// `actor` потерял CombatCore (despawn или снятие компонента).
    ///
    /// End notification от него уже не придёт: parry window этого атакующего
    /// закрывается здесь. Собственный core → закрывается defense window.
    pub fn forget_actor(&mut self, actor: Entity) -> bool {
        let mut changed = false;

        if self.parry_attacker == Some(actor) {
            self.in_parry_window = false;
            self.parry_attacker = None;
            changed = true;
        }
        if self.incoming_attacker == Some(actor) {
            self.incoming_attacker = None;
            changed = true;
        }
        if actor == self.owner && self.in_defense_window {
            self.in_defense_window = false;
            changed = true;
        }

        changed
    }

    /// Parry: окно открыто + атакующий валиден + мы смотрим на него.
    ///
    /// Success публикуется ровно один раз (ParrySucceeded в bus + signal).
    pub fn try_parry(&mut self, spatial: &dyn SpatialQuery, bus: &mut CombatEventBus) -> bool {
        if !self.in_parry_window {
            return false;
        }
        let Some(attacker) = self.parry_attacker else {
            return false;
        };

        let (Some(me), Some(them)) = (spatial.pose(self.owner), spatial.pose(attacker)) else {
            crate::logger::log_warning(&format!(
                "⚠️ [CombatDefense] {:?}: parry vs {:?}, pose unavailable",
                self.owner, attacker
            ));
            return false;
        };

        let dot = me.facing_dot(them.position);
        if dot <= self.facing_threshold {
            crate::logger::log(&format!(
                "❌ [CombatDefense] {:?}: parry failed vs {:?} (facing dot {:.2})",
                self.owner, attacker, dot
            ));
            self.signals.push(DefenseSignal::ParryFailed { attacker });
            return false;
        }

        bus.parry_succeeded.publish(&ParrySucceeded {
            defender: self.owner,
            attacker,
        });
        self.signals.push(DefenseSignal::ParrySucceeded { attacker });
        true
    }

    /// Block: только defense window, facing не проверяется.
    pub fn try_defense(&mut self, bus: &mut CombatEventBus) -> bool {
        if !self.in_defense_window {
            return false;
        }

        let attacker = self.parry_attacker.or(self.incoming_attacker);
        bus.defense_succeeded.publish(&DefenseSucceeded {
            defender: self.owner,
            attacker,
        });
        self.signals.push(DefenseSignal::DefenseSucceeded { attacker });
        true
    }

    pub fn drain_signals(&mut self) -> Vec<DefenseSignal> {
        std::mem::take(&mut self.signals)
    }

    // ========================================================================
    // Global handlers
    // ========================================================================

    /// Подписка на bus с фильтрацией по self. Повторный вызов: no-op.
    pub fn bind_global_handlers(&mut self, bus: &mut CombatEventBus) {
        if self.handlers.is_some() {
            return;
        }
        let owner = self.owner;

        let attack_started = bus.attack_started.subscribe(move |event| {
            if event.target == Some(owner) {
                crate::logger::log_verbose(&format!(
                    "👀 [CombatDefense] {:?}: incoming '{}' from {:?}",
                    owner, event.attack, event.attacker
                ));
            }
        });

        let parry_window_opened = bus.parry_window_opened.subscribe(move |event| {
            if event.attacker != owner {
                crate::logger::log_verbose(&format!(
                    "⏱️ [CombatDefense] {:?}: parry window by {:?} ({:.2}s)",
                    owner, event.attacker, event.duration
                ));
            }
        });

        let parry_succeeded = bus.parry_succeeded.subscribe(move |event| {
            if event.defender == owner {
                crate::logger::log(&format!(
                    "✨ [CombatDefense] {:?}: we parried {:?}",
                    owner, event.attacker
                ));
            } else if event.attacker == owner {
                crate::logger::log(&format!(
                    "💢 [CombatDefense] {:?}: our attack was parried by {:?}",
                    owner, event.defender
                ));
            }
        });

        let defense_succeeded = bus.defense_succeeded.subscribe(move |event| {
            if event.defender == owner {
                crate::logger::log(&format!(
                    "🛡️ [CombatDefense] {:?}: blocked {:?}",
                    owner, event.attacker
                ));
            } else if event.attacker == Some(owner) {
                crate::logger::log(&format!(
                    "💢 [CombatDefense] {:?}: our attack was blocked by {:?}",
                    owner, event.defender
                ));
            }
        });

        self.handlers = Some(DefenseHandlerIds {
            attack_started,
            parry_window_opened,
            parry_succeeded,
            defense_succeeded,
        });
    }

    pub fn unbind_global_handlers(&mut self, bus: &mut CombatEventBus) {
        if let Some(handlers) = self.handlers.take() {
            handlers.unbind(bus);
        }
    }

    pub fn global_handlers(&self) -> Option<DefenseHandlerIds> {
        self.handlers
    }

    pub fn has_global_handlers(&self) -> bool {
        self.handlers.is_some()
    }

    /// Teardown: отписка + сброс window state.
    pub fn teardown(&mut self, bus: &mut CombatEventBus) {
        self.unbind_global_handlers(bus);
        self.in_parry_window = false;
        self.parry_attacker = None;
        self.in_defense_window = false;
        self.incoming_attacker = None;
        self.signals.clear();
    }
}
