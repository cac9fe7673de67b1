//! CombatCore: attack side of an agent.
//!
//! Владеет attack action sets, combo gate и window lifecycle агента.
//! Все внешние эффекты идут через `CombatEnv` (playback, hit detection,
//! event bus, jitter), поэтому core работает и в ECS, и в plain тестах.

use std::fmt::Write as _;

use bevy::prelude::*;

use crate::actions::{
    ActionCandidate, ActionDirection, ActionSet, ActionSetLibrary, AttackEntry, AttackType,
    DefenseEntry, GameplayTag, TagSet,
};
use crate::chooser::{
    standard_attack, ChoiceContext, ChooserKind, ChooserPool, ChooserRegistry, DebugScoreRecord,
    JitterSource, SituationContext,
};
use crate::collaborators::{
    HitDetection, PlaybackDriver, PlaybackRequest, PlaybackToken, SpatialQuery, TargetingQuery,
};
use crate::config::{CombatConfig, ScoringConfig};
use crate::events::{AttackStarted, CombatEventBus, HitLanded, ParryWindowOpened};
use crate::windows::{
    TimelineMarker, WindowDelivery, WindowKind, WindowLifecycle, WindowListener,
    WindowNotification,
};

use super::combo::ComboGate;

/// Collaborators одного вызова.
pub struct CombatEnv<'a> {
    pub spatial: &'a dyn SpatialQuery,
    pub targeting: &'a dyn TargetingQuery,
    pub playback: &'a mut dyn PlaybackDriver,
    pub hits: &'a mut dyn HitDetection,
    pub bus: &'a mut CombatEventBus,
    pub jitter: &'a mut dyn JitterSource,
}

/// Window notification для defense state другого (или этого же) агента.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedWindow {
    pub defender: Entity,
    pub notification: WindowNotification,
}

#[derive(Component)]
pub struct CombatCore {
    owner: Entity,
    attack_sets: ActionSetLibrary<AttackEntry>,
    combo: ComboGate,
    windows: WindowLifecycle,
    current_attack: Option<AttackEntry>,
    current_target: Option<Entity>,
    /// Кому ушёл parry begin (end уходит туда же)
    parry_target: Option<Entity>,
    playback: Option<PlaybackToken>,
    tags: TagSet,
    last_situation: Option<SituationContext>,
    routed: Vec<RoutedWindow>,
    config: CombatConfig,
}

impl CombatCore {
    pub fn new(owner: Entity, config: CombatConfig, scoring: ScoringConfig) -> Self {
        let mut windows = WindowLifecycle::new(owner);
        windows.subscribe(WindowKind::Combo, WindowListener::ComboGate);
        windows.subscribe(WindowKind::Hitbox, WindowListener::HitDetection);
        windows.subscribe(WindowKind::Parry, WindowListener::TargetDefense);
        windows.subscribe(WindowKind::Defense, WindowListener::OwnerDefense);

        Self {
            owner,
            attack_sets: ActionSetLibrary::new(ChooserPool::new(ChooserRegistry::attack_defaults(
                scoring,
            ))),
            combo: ComboGate::default(),
            windows,
            current_attack: None,
            current_target: None,
            parry_target: None,
            playback: None,
            tags: TagSet::new(),
            last_situation: None,
            routed: Vec::new(),
            config,
        }
    }

    pub fn with_attack_set(mut self, set: ActionSet<AttackEntry>) -> Self {
        self.register_attack_set(set);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn combo(&self) -> &ComboGate {
        &self.combo
    }

    pub fn windows(&self) -> &WindowLifecycle {
        &self.windows
    }

    pub fn current_attack(&self) -> Option<&AttackEntry> {
        self.current_attack.as_ref()
    }

    pub fn current_target(&self) -> Option<Entity> {
        self.current_target
    }

    pub fn set_target(&mut self, target: Option<Entity>) {
        self.current_target = target;
    }

    pub fn playback_token(&self) -> Option<PlaybackToken> {
        self.playback
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagSet {
        &mut self.tags
    }

    pub fn last_situation(&self) -> Option<&SituationContext> {
        self.last_situation.as_ref()
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Глобальный tuning: combat config + веса StandardAttack chooser'а.
    pub fn apply_tuning(&mut self, combat: &CombatConfig, scoring: &ScoringConfig) {
        self.config = combat.clone();
        self.attack_sets
            .replace_chooser(ChooserKind::StandardAttack, standard_attack(scoring.clone()));
    }

    // ========================================================================
    // Action sets
    // ========================================================================

    pub fn register_attack_set(&mut self, set: ActionSet<AttackEntry>) {
        self.attack_sets.register(set);
    }

    /// false + warning при неполном set'е; предыдущий остаётся активным.
    pub fn set_active_attack_set(&mut self, key: &GameplayTag) -> bool {
        self.attack_sets.set_active(key)
    }

    /// Auto-activation первого set'а, если ни один не активен.
    pub fn ensure_active_set(&mut self) -> bool {
        self.attack_sets.ensure_active()
    }

    pub fn active_attack_set(&self) -> Option<&GameplayTag> {
        self.attack_sets.active_key()
    }

    pub fn attack_sets_mut(&mut self) -> &mut ActionSetLibrary<AttackEntry> {
        &mut self.attack_sets
    }

    // ========================================================================
    // Selection / execution
    // ========================================================================

    /// Выбор атаки по всему активному store. None = selection miss.
    pub fn select_attack(
        &mut self,
        attack_type: AttackType,
        direction: ActionDirection,
        situation: &SituationContext,
        env: &mut CombatEnv,
    ) -> Option<AttackEntry> {
        self.attack_sets.ensure_active();
        self.last_situation = Some(situation.clone());

        let Some(active) = self.attack_sets.active_mut() else {
            crate::logger::log_warning(&format!(
                "⚠️ [CombatCore] {:?}: no active attack set",
                self.owner
            ));
            return None;
        };

        let ctx = ChoiceContext {
            self_actor: self.owner,
            other_actor: self.current_target,
            intent: attack_type,
            direction,
            situation,
            self_tags: &self.tags,
            spatial: env.spatial,
        };

        let chosen = active
            .chooser
            .choose_best(active.store.iter(), &ctx, &mut *env.jitter)
            .cloned();

        if chosen.is_none() {
            crate::logger::log(&format!(
                "🤷 [CombatCore] {:?}: no valid attack ({:?}, {:?})",
                self.owner, attack_type, direction
            ));
        }
        chosen
    }

    /// Select + execute. false = selection miss (no-op).
    pub fn perform_attack(
        &mut self,
        attack_type: AttackType,
        direction: ActionDirection,
        situation: &SituationContext,
        env: &mut CombatEnv,
    ) -> bool {
        match self.select_attack(attack_type, direction, situation, env) {
            Some(attack) => {
                // Открытое combo window укорачивает blend и для обычной атаки
                let from_combo = self.combo.is_open();
                self.execute_attack(attack, from_combo, env);
                true
            }
            None => false,
        }
    }

    /// Запуск атаки: fade-out предыдущего playback'а, bind окон, AttackStarted.
    ///
    /// `from_combo` ограничивает blend in/out до `combo_blend_cap`.
    pub fn execute_attack(
        &mut self,
        attack: AttackEntry,
        from_combo: bool,
        env: &mut CombatEnv,
    ) -> PlaybackToken {
        let mut blend = attack.blend.clamped();
        if from_combo {
            blend = blend.capped(self.config.combo_blend_cap);
        }

        let token = self.bind_new_playback(
            PlaybackRequest {
                actor: self.owner,
                playback: attack.playback.clone(),
                section: attack.section.clone(),
                blend,
                play_rate: 1.0,
            },
            env,
        );

        let target = env
            .targeting
            .closest_target(self.owner, self.config.attack_target_range);

        crate::logger::log(&format!(
            "⚔️ [CombatCore] {:?}: {} '{}' (target: {:?}, token: {:?})",
            self.owner,
            if from_combo { "combo" } else { "attack" },
            attack.name,
            target,
            token
        ));

        env.bus.attack_started.publish(&AttackStarted {
            attacker: self.owner,
            target,
            attack: attack.name.clone(),
        });

        self.current_attack = Some(attack);
        token
    }

    /// Defense playback занимает тот же slot, что и атака.
    pub fn execute_defense(&mut self, defense: &DefenseEntry, env: &mut CombatEnv) -> PlaybackToken {
        let token = self.bind_new_playback(
            PlaybackRequest {
                actor: self.owner,
                playback: defense.playback().clone(),
                section: defense.section().map(str::to_string),
                blend: defense.blend().clamped(),
                play_rate: 1.0,
            },
            env,
        );

        crate::logger::log(&format!(
            "🛡️ [CombatCore] {:?}: defense '{}' (token: {:?})",
            self.owner,
            defense.name(),
            token
        ));

        self.current_attack = None;
        token
    }

    /// Chain в follow-up из открытого combo window.
    ///
    /// Fail fast без изменения state: gate закрыт, follow-ups пусты,
    /// нет активного set'а, или в restricted view никто не выбран.
    pub fn try_continue_combo(
        &mut self,
        attack_type: AttackType,
        direction: ActionDirection,
        situation: &SituationContext,
        env: &mut CombatEnv,
    ) -> bool {
        if !self.combo.is_open() {
            return false;
        }

        let Some(active) = self.attack_sets.active_mut() else {
            return false;
        };

        let ctx = ChoiceContext {
            self_actor: self.owner,
            other_actor: self.current_target,
            intent: attack_type,
            direction,
            situation,
            self_tags: &self.tags,
            spatial: env.spatial,
        };

        let chosen = active
            .chooser
            .choose_best(
                active.store.restricted_to(self.combo.allowed_names()),
                &ctx,
                &mut *env.jitter,
            )
            .cloned();

        let Some(next) = chosen else {
            crate::logger::log(&format!(
                "🔗 [CombatCore] {:?}: combo window open, no follow-up fits {:?}",
                self.owner, self.combo.allowed_names()
            ));
            return false;
        };

        self.last_situation = Some(situation.clone());
        self.execute_attack(next, true, env);
        self.combo.consume();
        true
    }

    /// Хост сообщает о попадании (коллизии: снаружи).
    pub fn report_hit(&mut self, defender: Entity, env: &mut CombatEnv) -> bool {
        let Some(attack) = self.current_attack.clone() else {
            return false;
        };

        env.bus.hit_landed.publish(&HitLanded {
            attacker: self.owner,
            defender,
            attack,
        });
        true
    }

    /// Прерывание извне (hit reaction): текущий playback останавливается,
    /// его окна закрываются, атака больше не может попасть.
    pub fn interrupt(&mut self, blend_out: f32, env: &mut CombatEnv) -> Option<PlaybackToken> {
        let token = self.playback?;
        if env.playback.is_active(token) {
            env.playback.stop(token, blend_out);
        }

        self.release_playback(token, env);
        self.current_attack = None;

        crate::logger::log(&format!(
            "🛑 [CombatCore] {:?}: playback {:?} interrupted",
            self.owner, token
        ));
        Some(token)
    }

    // ========================================================================
    // Windows
    // ========================================================================

    /// Marker от timeline. Возвращает число доставок (0 = stale/unmatched).
    pub fn handle_marker(&mut self, marker: &TimelineMarker, env: &mut CombatEnv) -> usize {
        let deliveries = self.windows.on_marker(marker);
        let count = deliveries.len();
        self.dispatch(deliveries, env);
        count
    }

    /// Playback закончился сам: закрыть его окна.
    pub fn release_playback(&mut self, token: PlaybackToken, env: &mut CombatEnv) {
        let deliveries = self.windows.release_playback(token);
        self.dispatch(deliveries, env);

        if self.playback == Some(token) {
            self.playback = None;
        }
    }

    /// Notifications для defense components (parry → цель, block → владелец).
    pub fn drain_routed_windows(&mut self) -> Vec<RoutedWindow> {
        std::mem::take(&mut self.routed)
    }

    /// Teardown: отписка от окон без доставок.
    pub fn teardown(&mut self) {
        self.windows.unbind_all();
        self.combo.close();
        self.routed.clear();
        self.parry_target = None;
        self.playback = None;
    }

    fn bind_new_playback(&mut self, request: PlaybackRequest, env: &mut CombatEnv) -> PlaybackToken {
        if let Some(previous) = self.playback.take() {
            if env.playback.is_active(previous) {
                env.playback.stop(previous, request.blend.blend_out);
            }
        }

        let token = env.playback.play(request);
        self.playback = Some(token);

        let deliveries = self.windows.bind_playback(token);
        self.dispatch(deliveries, env);
        token
    }

    fn dispatch(&mut self, deliveries: Vec<WindowDelivery>, env: &mut CombatEnv) {
        for WindowDelivery {
            listener,
            notification,
        } in deliveries
        {
            match listener {
                WindowListener::ComboGate => self.apply_combo_window(&notification),
                WindowListener::HitDetection => self.apply_hitbox_window(&notification, env),
                WindowListener::TargetDefense => self.route_parry_window(notification, env),
                WindowListener::OwnerDefense => self.routed.push(RoutedWindow {
                    defender: self.owner,
                    notification,
                }),
            }
        }
    }

    fn apply_combo_window(&mut self, notification: &WindowNotification) {
        if notification.is_begin() {
            let follow_ups = self
                .current_attack
                .as_ref()
                .map(|attack| attack.allowed_next.as_slice())
                .unwrap_or_default();
            self.combo.open(follow_ups);

            crate::logger::log(&format!(
                "🔗 [CombatCore] {:?}: combo window open {:?}",
                self.owner, follow_ups
            ));
        } else {
            self.combo.close();
        }
    }

    fn apply_hitbox_window(&mut self, notification: &WindowNotification, env: &mut CombatEnv) {
        if !notification.is_begin() {
            env.hits.stop_hit_detection(self.owner);
            return;
        }

        let Some(attack) = self.current_attack.as_ref() else {
            return;
        };

        let hitbox = notification
            .window
            .payload
            .hitbox
            .as_ref()
            .unwrap_or(&attack.hitbox);

        env.hits.reset_already_hit(self.owner);
        env.hits.start_hit_detection(self.owner, attack, hitbox);
    }

    fn route_parry_window(&mut self, notification: WindowNotification, env: &mut CombatEnv) {
        if notification.is_begin() {
            env.bus.parry_window_opened.publish(&ParryWindowOpened {
                attacker: self.owner,
                duration: notification.window.payload.duration,
            });
            self.parry_target = self.current_target;
        }

        let defender = if notification.is_begin() {
            self.parry_target
        } else {
            self.parry_target.take()
        };

        if let Some(defender) = defender {
            self.routed.push(RoutedWindow {
                defender,
                notification,
            });
        }
    }

    // ========================================================================
    // Debug
    // ========================================================================

    /// Breakdown последнего выбора в активном set'е.
    pub fn debug_scores(&self) -> &[DebugScoreRecord] {
        self.attack_sets
            .active()
            .map(|active| active.chooser.debug_records())
            .unwrap_or_default()
    }

    pub fn debug_report(&self) -> String {
        let mut report = String::new();

        let set = self
            .attack_sets
            .active_key()
            .map_or("<none>".to_string(), |key| key.to_string());
        let _ = writeln!(report, "[CombatCore] {:?} set={}", self.owner, set);

        if let Some(situation) = &self.last_situation {
            let _ = writeln!(
                report,
                "  situation: {:?} speed={:.1} alt={:.1} stamina={:.2} health={:.2}",
                situation.flags(),
                situation.speed,
                situation.altitude,
                situation.stamina_pct,
                situation.health_pct
            );
        }

        for record in self.debug_scores() {
            let b = &record.breakdown;
            let _ = writeln!(
                report,
                "  {} {:<16} base={:.1} intent={:.1} tag={:.1} dist={:.1} dir={:.1} sit={:.1} jitter={:.1} total={:.1}",
                if record.chosen { "*" } else { " " },
                record.name,
                b.base,
                b.intent,
                b.tag,
                b.distance,
                b.direction,
                b.situational,
                b.jitter,
                b.total
            );
        }

        report
    }
}
