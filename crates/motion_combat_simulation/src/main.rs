//! Headless демо combat chooser'а
//!
//! Два агента: attacker выбирает атаку, открывает combo/parry окна,
//! defender парирует, attacker продолжает combo и попадает в голову.

use std::sync::Arc;

use bevy::prelude::*;
use motion_combat_simulation::actions::JsonTable;
use motion_combat_simulation::collaborators::{PlaybackCommand, PlaybackToken};
use motion_combat_simulation::combat::{
    AgentMotion, AgentVitals, AttackChosen, AttackRequest, ComboRequest, DefenseOutcome,
    HitReactionChosen, HitReported, ParryAttempt, PlaybackCommandEvent, TimelineMarkerEvent,
};
use motion_combat_simulation::windows::{TimelineMarker, WindowKind};
use motion_combat_simulation::*;

const ATTACKS: &str = r#"{
    "Attack.Sword": [
        { "name": "JabForward", "attack_type": "Light", "direction": "Forward",
          "distance": { "min": 0.0, "max": 150.0 }, "allowed_next": ["JabForward"] },
        { "name": "SweepLong", "attack_type": "Heavy", "direction": "Omni",
          "distance": { "min": 200.0, "max": 500.0 } }
    ]
}"#;

const DEFENSES: &str = r#"{
    "Defense.Guard": [
        { "name": "Block", "intent": "Defense" },
        { "name": "Parry", "intent": "Parry", "distance": { "min": 0.0, "max": 200.0 } }
    ]
}"#;

const REACTIONS: &str = r#"{
    "Reactions.Soldier": [
        { "name": "Flinch", "severity": "Light" },
        { "name": "FlinchBack", "severity": "Light", "direction": "Backward" },
        { "name": "HeadSnap", "severity": "Light", "target_region": "Head", "play_rate": 1.2 },
        { "name": "Stagger", "severity": "Heavy" }
    ]
}"#;

fn main() {
    let seed = 42;
    log_info(&format!("Starting headless combat demo (seed: {})", seed));

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    let attacker = spawn_agent(&mut app, Transform::default());
    let defender = spawn_agent(
        &mut app,
        Transform::from_xyz(0.0, 0.0, -75.0).looking_at(Vec3::ZERO, Vec3::Y),
    );

    let attacks = Arc::new(JsonTable::from_json(ATTACKS));
    let defenses = Arc::new(JsonTable::from_json(DEFENSES));
    app.world_mut().entity_mut(attacker).insert(
        CombatCore::new(attacker, CombatConfig::default(), ScoringConfig::default()).with_attack_set(
            ActionSet::<AttackEntry>::new("Attack.Sword")
                .with_source(attacks)
                .with_chooser(ChooserKind::StandardAttack),
        ),
    );
    app.world_mut().entity_mut(defender).insert(
        CombatDefense::new(defender, ScoringConfig::default()).with_defense_set(
            ActionSet::<DefenseEntry>::new("Defense.Guard")
                .with_source(defenses)
                .with_chooser(ChooserKind::StandardDefense),
        ),
    );
    let reactions = JsonTable::from_json(REACTIONS);
    match CombatHitReaction::from_source(defender, &reactions, "Reactions.Soldier") {
        Ok(reaction) => {
            app.world_mut().entity_mut(defender).insert(reaction);
        }
        Err(error) => log_error(&format!("Hit reactions not loaded: {}", error)),
    }

    // Тик 1: атака
    app.world_mut().send_event(AttackRequest {
        attacker,
        attack_type: AttackType::Light,
        direction: ActionDirection::Forward,
        target: Some(defender),
    });
    let Some(token) = tick(&mut app) else {
        log_error("No attack was chosen");
        return;
    };

    // Тик 2: timeline открывает combo + parry окна, defender парирует
    for kind in [WindowKind::Combo, WindowKind::Parry] {
        app.world_mut().send_event(TimelineMarkerEvent {
            owner: attacker,
            marker: TimelineMarker::begin(kind, 1, token).with_duration(0.3),
        });
    }
    app.world_mut().send_event(ParryAttempt { defender });
    tick(&mut app);

    // Тик 3: attacker продолжает combo
    app.world_mut().send_event(ComboRequest {
        attacker,
        attack_type: AttackType::Light,
        direction: ActionDirection::Forward,
    });
    tick(&mut app);

    // Тик 4: hit detection хоста: удар в голову
    app.world_mut()
        .send_event(HitReported::new(attacker, defender).on_bone("neck_01"));
    tick(&mut app);

    if let Some(core) = app.world().get::<CombatCore>(attacker) {
        log_info(&core.debug_report());
    }
    log_info("Demo complete!");
}

fn spawn_agent(app: &mut App, transform: Transform) -> Entity {
    app.world_mut()
        .spawn((transform, AgentMotion::default(), AgentVitals::default()))
        .id()
}

/// Один FixedUpdate тик + лог output событий. Возвращает токен последнего Play.
fn tick(app: &mut App) -> Option<PlaybackToken> {
    app.world_mut().run_schedule(FixedUpdate);

    let world = app.world_mut();
    for chosen in world.resource_mut::<Events<AttackChosen>>().drain() {
        log_info(&format!(
            "⚔️ {:?} → '{}' (target {:?}, combo: {})",
            chosen.attacker, chosen.attack, chosen.target, chosen.from_combo
        ));
    }
    for outcome in world.resource_mut::<Events<DefenseOutcome>>().drain() {
        log_info(&format!("🛡️ {:?}: {:?}", outcome.defender, outcome.signal));
    }
    for reaction in world.resource_mut::<Events<HitReactionChosen>>().drain() {
        log_info(&format!(
            "💥 {:?} ← {:?}: '{}' ({:?}, {:?})",
            reaction.defender, reaction.attacker, reaction.reaction, reaction.direction, reaction.tier
        ));
    }

    let mut last_play = None;
    for PlaybackCommandEvent(command) in world.resource_mut::<Events<PlaybackCommandEvent>>().drain() {
        if let PlaybackCommand::Play { token, request } = &command {
            last_play = Some(*token);
            log_info(&format!("▶️ play '{}' ({:?})", request.playback, token));
        }
    }
    last_play
}
