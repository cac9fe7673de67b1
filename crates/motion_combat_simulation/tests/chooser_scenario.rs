//! End-to-end chooser scenario (без ECS)
//!
//! JabForward/SweepLong из JSON таблицы:
//! - выбор по intent + distance + facing
//! - combo window → TryContinueCombo → gate закрыт
//! - ошибки активации не ломают активный set

use std::sync::Arc;

use bevy::prelude::*;
use motion_combat_simulation::actions::{ActionSet, JsonTable};
use motion_combat_simulation::chooser::{ChooserKind, FixedJitter, SituationContext};
use motion_combat_simulation::collaborators::{HitDetectionLedger, PlaybackLedger, PoseTable};
use motion_combat_simulation::combat::{CombatCore, CombatEnv, ComboGateState};
use motion_combat_simulation::spatial::ActorPose;
use motion_combat_simulation::windows::{TimelineMarker, WindowKind};
use motion_combat_simulation::*;

const TABLES: &str = r#"{
    "Attack.Sword": [
        { "name": "JabForward", "attack_type": "Light", "direction": "Forward",
          "distance": { "min": 0.0, "max": 150.0 }, "allowed_next": ["JabForward"] },
        { "name": "SweepLong", "attack_type": "Heavy", "direction": "Omni",
          "distance": { "min": 200.0, "max": 500.0 }, "allowed_next": [] }
    ]
}"#;

struct Collaborators {
    poses: PoseTable,
    playback: PlaybackLedger,
    hits: HitDetectionLedger,
    bus: CombatEventBus,
    jitter: FixedJitter,
}

impl Collaborators {
    fn env(&mut self) -> CombatEnv<'_> {
        CombatEnv {
            spatial: &self.poses,
            targeting: &self.poses,
            playback: &mut self.playback,
            hits: &mut self.hits,
            bus: &mut self.bus,
            jitter: &mut self.jitter,
        }
    }
}

/// Attacker в origin, defender в 75 units и смотрит на attacker'а.
fn duel() -> (Collaborators, CombatCore) {
    let mut world = World::new();
    let attacker = world.spawn_empty().id();
    let defender = world.spawn_empty().id();

    let mut poses = PoseTable::new();
    poses.insert(attacker, ActorPose::new(Vec3::ZERO, Vec3::NEG_Z));
    poses.insert(
        defender,
        ActorPose::looking_at(Vec3::new(0.0, 0.0, -75.0), Vec3::ZERO),
    );

    let table = Arc::new(JsonTable::from_json(TABLES));
    let mut core = CombatCore::new(attacker, CombatConfig::default(), ScoringConfig::default())
        .with_attack_set(
            ActionSet::<AttackEntry>::new("Attack.Sword")
                .with_source(table)
                .with_chooser(ChooserKind::StandardAttack),
        );
    core.set_target(Some(defender));

    let collaborators = Collaborators {
        poses,
        playback: PlaybackLedger::new(),
        hits: HitDetectionLedger::new(),
        bus: CombatEventBus::default(),
        jitter: FixedJitter(0.0),
    };
    (collaborators, core)
}

fn total_of(core: &CombatCore, name: &str) -> f32 {
    core.debug_scores()
        .iter()
        .find(|record| record.name == name)
        .map(|record| record.breakdown.total)
        .unwrap_or(f32::NAN)
}

#[test]
fn test_jab_forward_scenario() {
    let (mut collaborators, mut core) = duel();
    let situation = SituationContext::default();

    let chosen = core.select_attack(
        AttackType::Light,
        ActionDirection::Forward,
        &situation,
        &mut collaborators.env(),
    );
    let Some(jab) = chosen else {
        panic!("JabForward expected, got a selection miss");
    };
    assert_eq!(jab.name, "JabForward");

    // 10 (base) + 50 (intent) + 25 (distance, центр окна) + 10 (facing)
    assert!((total_of(&core, "JabForward") - 95.0).abs() < 1e-3);
    // 10 (base) - 25 (intent) - 25 (distance, вне окна)
    assert!((total_of(&core, "SweepLong") + 40.0).abs() < 1e-3);

    let token = core.execute_attack(jab, false, &mut collaborators.env());
    core.handle_marker(
        &TimelineMarker::begin(WindowKind::Combo, 1, token),
        &mut collaborators.env(),
    );
    assert_eq!(
        core.combo().state(),
        ComboGateState::Open(vec!["JabForward".to_string()])
    );

    let chained = core.try_continue_combo(
        AttackType::Light,
        ActionDirection::Forward,
        &situation,
        &mut collaborators.env(),
    );
    assert!(chained);
    assert_eq!(
        core.current_attack().map(|attack| attack.name.as_str()),
        Some("JabForward")
    );
    assert_eq!(core.combo().state(), ComboGateState::Closed);
}

#[test]
fn test_heavy_intent_at_long_range_prefers_sweep() {
    let (mut collaborators, mut core) = duel();
    let defender = core.current_target().expect("target set");
    collaborators.poses.insert(
        defender,
        ActorPose::looking_at(Vec3::new(0.0, 0.0, -350.0), Vec3::ZERO),
    );

    let chosen = core.select_attack(
        AttackType::Heavy,
        ActionDirection::Omni,
        &SituationContext::default(),
        &mut collaborators.env(),
    );
    assert_eq!(chosen.map(|attack| attack.name), Some("SweepLong".to_string()));
}

#[test]
fn test_failed_activation_keeps_current_set() {
    let (mut collaborators, mut core) = duel();
    assert!(core.ensure_active_set());

    // Set без source: активация отклоняется
    core.register_attack_set(ActionSet::new("Attack.Broken").with_chooser(ChooserKind::StandardAttack));
    assert!(!core.set_active_attack_set(&GameplayTag::new("Attack.Broken")));
    assert_eq!(
        core.active_attack_set().map(|key| key.as_str()),
        Some("Attack.Sword")
    );

    assert!(core.perform_attack(
        AttackType::Light,
        ActionDirection::Forward,
        &SituationContext::default(),
        &mut collaborators.env(),
    ));
}
