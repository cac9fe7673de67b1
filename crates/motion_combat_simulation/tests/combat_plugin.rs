//! CombatPlugin integration test
//!
//! Headless App, события хоста → FixedUpdate → события/команды хосту.
//!
//! Проверяем:
//! - AttackRequest → AttackChosen + Play команда
//! - Parry window через timeline → ParryAttempt → один ParrySucceeded
//! - Block window на defender'е → BlockAttempt без facing check
//! - Combo request только при открытом combo window
//! - Hitbox window → hit detection команды, HitReported → HitLanded
//! - HitReported → hit reaction defender'а (прерывает его playback)
//! - Despawn атакующего закрывает его parry window у defender'а
//! - ScoringConfig resource реально управляет scoring'ом

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use motion_combat_simulation::actions::{BodyRegion, DefenseEntry, InMemoryTable, ReactionMatch};
use motion_combat_simulation::collaborators::{HitDetectionCommand, PlaybackCommand, PlaybackToken};
use motion_combat_simulation::combat::{
    AttackChosen, AttackRequest, BlockAttempt, ComboRequest, DefenseChosen, DefenseOutcome,
    DefenseRequest, DefenseSignal, HitDetectionCommandEvent, HitReactionChosen, HitReported,
    ParryAttempt, PlaybackCommandEvent, TimelineMarkerEvent,
};
use motion_combat_simulation::windows::{TimelineMarker, WindowKind};
use motion_combat_simulation::*;

/// Helper: headless App с SimulationPlugin
fn create_combat_app() -> App {
    let mut app = create_headless_app(7);
    app.add_plugins(SimulationPlugin);
    app
}

fn attack_table() -> Arc<InMemoryTable<AttackEntry>> {
    Arc::new(InMemoryTable::new().with_table(
        "Attack.Sword",
        vec![
            AttackEntry::new("JabForward", AttackType::Light)
                .with_range(0.0, 150.0)
                .with_direction(ActionDirection::Forward)
                .with_follow_ups(&["JabForward"]),
            AttackEntry::new("SweepLong", AttackType::Heavy).with_range(200.0, 500.0),
        ],
    ))
}

fn defense_table() -> Arc<InMemoryTable<DefenseEntry>> {
    Arc::new(InMemoryTable::new().with_table(
        "Defense.Guard",
        vec![DefenseEntry::new("Block", DefenseIntent::Defense)],
    ))
}

/// Attacker в origin (смотрит по -Z), defender в 75 units.
/// `defender_faces_attacker = false` → defender стоит спиной.
fn spawn_duel(app: &mut App, defender_faces_attacker: bool) -> (Entity, Entity) {
    let defender_transform = if defender_faces_attacker {
        Transform::from_xyz(0.0, 0.0, -75.0).looking_at(Vec3::ZERO, Vec3::Y)
    } else {
        Transform::from_xyz(0.0, 0.0, -75.0).looking_at(Vec3::new(0.0, 0.0, -200.0), Vec3::Y)
    };

    let world = app.world_mut();
    let attacker = world.spawn(Transform::default()).id();
    let defender = world.spawn(defender_transform).id();

    world.entity_mut(attacker).insert((
        CombatCore::new(attacker, CombatConfig::default(), ScoringConfig::default()).with_attack_set(
            ActionSet::<AttackEntry>::new("Attack.Sword")
                .with_source(attack_table())
                .with_chooser(ChooserKind::StandardAttack),
        ),
        CombatDefense::new(attacker, ScoringConfig::default()),
    ));
    world.entity_mut(defender).insert((
        CombatCore::new(defender, CombatConfig::default(), ScoringConfig::default()),
        CombatDefense::new(defender, ScoringConfig::default()).with_defense_set(
            ActionSet::<DefenseEntry>::new("Defense.Guard")
                .with_source(defense_table())
                .with_chooser(ChooserKind::StandardDefense),
        ),
    ));

    (attacker, defender)
}

fn tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

fn drain<E: Event>(app: &mut App) -> Vec<E> {
    app.world_mut().resource_mut::<Events<E>>().drain().collect()
}

fn played_tokens(app: &mut App) -> Vec<PlaybackToken> {
    drain::<PlaybackCommandEvent>(app)
        .into_iter()
        .filter_map(|PlaybackCommandEvent(command)| match command {
            PlaybackCommand::Play { token, .. } => Some(token),
            PlaybackCommand::Stop { .. } => None,
        })
        .collect()
}

fn light_attack(attacker: Entity, target: Option<Entity>) -> AttackRequest {
    AttackRequest {
        attacker,
        attack_type: AttackType::Light,
        direction: ActionDirection::Forward,
        target,
    }
}

/// Attack тик: возвращает токен playback'а атаки.
fn start_attack(app: &mut App, attacker: Entity, defender: Entity) -> PlaybackToken {
    app.world_mut().send_event(light_attack(attacker, Some(defender)));
    tick(app);
    let tokens = played_tokens(app);
    assert_eq!(tokens.len(), 1, "one Play command expected");
    tokens[0]
}

#[test]
fn test_attack_request_emits_choice_and_play() {
    let mut app = create_combat_app();
    let (attacker, defender) = spawn_duel(&mut app, true);

    let started = Arc::new(Mutex::new(Vec::new()));
    let sink = started.clone();
    app.world_mut()
        .resource_mut::<CombatEventBus>()
        .attack_started
        .subscribe(move |event| sink.lock().unwrap().push((event.attacker, event.target)));

    start_attack(&mut app, attacker, defender);

    let chosen = drain::<AttackChosen>(&mut app);
    assert_eq!(chosen.len(), 1);
    assert_eq!(chosen[0].attack, "JabForward");
    assert_eq!(chosen[0].target, Some(defender));
    assert!(!chosen[0].from_combo);
    assert_eq!(*started.lock().unwrap(), vec![(attacker, Some(defender))]);
}

#[test]
fn test_attack_without_target_is_silent_miss() {
    let mut app = create_combat_app();
    let (attacker, _defender) = spawn_duel(&mut app, true);

    app.world_mut().send_event(light_attack(attacker, None));
    tick(&mut app);

    assert!(drain::<AttackChosen>(&mut app).is_empty());
    assert!(played_tokens(&mut app).is_empty());
}

#[test]
fn test_parry_through_timeline() {
    for (faces, expect_success) in [(true, true), (false, false)] {
        let mut app = create_combat_app();
        let (attacker, defender) = spawn_duel(&mut app, faces);

        let parries = Arc::new(Mutex::new(0));
        let sink = parries.clone();
        app.world_mut()
            .resource_mut::<CombatEventBus>()
            .parry_succeeded
            .subscribe(move |_| *sink.lock().unwrap() += 1);

        let token = start_attack(&mut app, attacker, defender);
        app.world_mut().send_event(TimelineMarkerEvent {
            owner: attacker,
            marker: TimelineMarker::begin(WindowKind::Parry, 1, token).with_duration(0.25),
        });
        app.world_mut().send_event(ParryAttempt { defender });
        tick(&mut app);

        let outcomes = drain::<DefenseOutcome>(&mut app);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].defender, defender);

        let expected = if expect_success {
            DefenseSignal::ParrySucceeded { attacker }
        } else {
            DefenseSignal::ParryFailed { attacker }
        };
        assert_eq!(outcomes[0].signal, expected);
        assert_eq!(*parries.lock().unwrap(), usize::from(expect_success));

        let defense = app.world().get::<CombatDefense>(defender).expect("defense");
        assert!(defense.in_parry_window());
    }
}

#[test]
fn test_block_through_defender_timeline() {
    let mut app = create_combat_app();
    let (attacker, defender) = spawn_duel(&mut app, false);

    app.world_mut().send_event(light_attack(attacker, Some(defender)));
    app.world_mut().send_event(DefenseRequest {
        defender,
        attacker: Some(attacker),
        intent: DefenseIntent::Defense,
    });
    tick(&mut app);

    let chosen = drain::<DefenseChosen>(&mut app);
    assert_eq!(chosen.len(), 1);
    assert_eq!(chosen[0].defense, "Block");
    let Some(token) = chosen[0].token else {
        panic!("defender with CombatCore must start a playback");
    };

    app.world_mut().send_event(TimelineMarkerEvent {
        owner: defender,
        marker: TimelineMarker::begin(WindowKind::Defense, 1, token),
    });
    app.world_mut().send_event(BlockAttempt { defender });
    tick(&mut app);

    // Спиной к атакующему, но block не проверяет facing
    let outcomes = drain::<DefenseOutcome>(&mut app);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        outcomes[0].signal,
        DefenseSignal::DefenseSucceeded {
            attacker: Some(attacker)
        }
    );
}

#[test]
fn test_combo_request_requires_open_window() {
    let mut app = create_combat_app();
    let (attacker, defender) = spawn_duel(&mut app, true);

    let token = start_attack(&mut app, attacker, defender);
    drain::<AttackChosen>(&mut app);

    let combo = ComboRequest {
        attacker,
        attack_type: AttackType::Light,
        direction: ActionDirection::Forward,
    };

    app.world_mut().send_event(combo.clone());
    tick(&mut app);
    assert!(drain::<AttackChosen>(&mut app).is_empty());

    app.world_mut().send_event(TimelineMarkerEvent {
        owner: attacker,
        marker: TimelineMarker::begin(WindowKind::Combo, 2, token),
    });
    tick(&mut app);
    app.world_mut().send_event(combo);
    tick(&mut app);

    let chosen = drain::<AttackChosen>(&mut app);
    assert_eq!(chosen.len(), 1);
    assert_eq!(chosen[0].attack, "JabForward");
    assert!(chosen[0].from_combo);
}

#[test]
fn test_hitbox_window_and_hit_report() {
    let mut app = create_combat_app();
    let (attacker, defender) = spawn_duel(&mut app, true);

    let landed = Arc::new(Mutex::new(Vec::new()));
    let sink = landed.clone();
    app.world_mut()
        .resource_mut::<CombatEventBus>()
        .hit_landed
        .subscribe(move |event| sink.lock().unwrap().push((event.defender, event.attack.name.clone())));

    let token = start_attack(&mut app, attacker, defender);
    drain::<HitDetectionCommandEvent>(&mut app);

    app.world_mut().send_event(TimelineMarkerEvent {
        owner: attacker,
        marker: TimelineMarker::begin(WindowKind::Hitbox, 1, token),
    });
    app.world_mut().send_event(HitReported::new(attacker, defender));
    tick(&mut app);

    let commands: Vec<HitDetectionCommand> = drain::<HitDetectionCommandEvent>(&mut app)
        .into_iter()
        .map(|HitDetectionCommandEvent(command)| command)
        .collect();
    assert!(matches!(
        commands.as_slice(),
        [
            HitDetectionCommand::ResetAlreadyHit { .. },
            HitDetectionCommand::Start { .. }
        ]
    ));
    assert_eq!(
        *landed.lock().unwrap(),
        vec![(defender, "JabForward".to_string())]
    );
}

#[test]
fn test_despawned_attacker_closes_parry_window() {
    let mut app = create_combat_app();
    let (attacker, defender) = spawn_duel(&mut app, true);

    let token = start_attack(&mut app, attacker, defender);
    app.world_mut().send_event(TimelineMarkerEvent {
        owner: attacker,
        marker: TimelineMarker::begin(WindowKind::Parry, 1, token).with_duration(0.25),
    });
    tick(&mut app);
    {
        let defense = app.world().get::<CombatDefense>(defender).expect("defense");
        assert!(defense.in_parry_window());
        assert_eq!(defense.parry_attacker(), Some(attacker));
    }

    // Parry end от этого атакующего уже никогда не придёт
    assert!(app.world_mut().despawn(attacker));
    for _ in 0..5 {
        tick(&mut app);
    }

    let defense = app.world().get::<CombatDefense>(defender).expect("defense");
    assert!(!defense.in_parry_window());
    assert_eq!(defense.parry_attacker(), None);
    assert_eq!(defense.incoming_attacker(), None);

    // Parry против пустоты: окна нет → никакого исхода
    app.world_mut().send_event(ParryAttempt { defender });
    tick(&mut app);
    assert!(drain::<DefenseOutcome>(&mut app).is_empty());
}

#[test]
fn test_scoring_resource_drives_choosers() {
    let mut app = create_combat_app();
    app.insert_resource(ScoringConfig {
        intent_match_bonus: 0.0,
        base_weight_scale: 0.0,
        ..Default::default()
    });
    let (attacker, defender) = spawn_duel(&mut app, true);

    start_attack(&mut app, attacker, defender);
    let jab_breakdown = |app: &App| {
        let core = app.world().get::<CombatCore>(attacker).expect("core");
        core.debug_scores()
            .iter()
            .find(|record| record.name == "JabForward")
            .map(|record| (record.breakdown.intent, record.breakdown.base))
    };
    assert_eq!(jab_breakdown(&app), Some((0.0, 0.0)));

    // Изменение resource'а на лету перенастраивает уже живых агентов
    app.insert_resource(ScoringConfig::default());
    start_attack(&mut app, attacker, defender);
    let defaults = ScoringConfig::default();
    assert_eq!(
        jab_breakdown(&app),
        Some((defaults.intent_match_bonus, defaults.base_weight_scale))
    );
}

fn soldier_reactions() -> Vec<HitReactionEntry> {
    vec![
        HitReactionEntry::new("Flinch", HitSeverity::Light),
        HitReactionEntry::new("FlinchFront", HitSeverity::Light).with_direction(ActionDirection::Forward),
        HitReactionEntry::new("FlinchBack", HitSeverity::Light).with_direction(ActionDirection::Backward),
        HitReactionEntry::new("BodyBlow", HitSeverity::Light).with_region(BodyRegion::Torso),
        HitReactionEntry::new("Stagger", HitSeverity::Heavy),
    ]
}

fn give_reactions(app: &mut App, defender: Entity) {
    app.world_mut()
        .entity_mut(defender)
        .insert(CombatHitReaction::new(defender).with_rows(soldier_reactions()));
}

#[test]
fn test_hit_reaction_interrupts_defender_playback() {
    let mut app = create_combat_app();
    let (attacker, defender) = spawn_duel(&mut app, true);
    give_reactions(&mut app, defender);

    start_attack(&mut app, attacker, defender);

    // Defender поднимает блок: свой playback + defense window
    app.world_mut().send_event(DefenseRequest {
        defender,
        attacker: Some(attacker),
        intent: DefenseIntent::Defense,
    });
    tick(&mut app);
    let chosen = drain::<DefenseChosen>(&mut app);
    let Some(block_token) = chosen.first().and_then(|chosen| chosen.token) else {
        panic!("block must start a playback");
    };
    app.world_mut().send_event(TimelineMarkerEvent {
        owner: defender,
        marker: TimelineMarker::begin(WindowKind::Defense, 1, block_token),
    });
    tick(&mut app);
    assert!(app.world().get::<CombatDefense>(defender).expect("defense").in_defense_window());
    drain::<PlaybackCommandEvent>(&mut app);

    app.world_mut()
        .send_event(HitReported::new(attacker, defender).on_bone("spine_02"));
    tick(&mut app);

    let reactions = drain::<HitReactionChosen>(&mut app);
    assert_eq!(reactions.len(), 1);
    assert_eq!(reactions[0].defender, defender);
    assert_eq!(reactions[0].attacker, attacker);
    assert_eq!(reactions[0].reaction, "BodyBlow");
    assert_eq!(reactions[0].tier, ReactionMatch::Region);

    let commands: Vec<PlaybackCommand> = drain::<PlaybackCommandEvent>(&mut app)
        .into_iter()
        .map(|PlaybackCommandEvent(command)| command)
        .collect();
    match commands.as_slice() {
        [PlaybackCommand::Stop { token, blend_out }, PlaybackCommand::Play { token: played, request }] => {
            assert_eq!(*token, block_token);
            assert_eq!(*blend_out, 0.1);
            assert_eq!(*played, reactions[0].token);
            assert_eq!(request.actor, defender);
        }
        other => panic!("unexpected commands: {:?}", other),
    }

    // Окна прерванного блока закрыты в том же tick'е
    assert!(!app.world().get::<CombatDefense>(defender).expect("defense").in_defense_window());
    let reaction = app.world().get::<CombatHitReaction>(defender).expect("reaction");
    assert_eq!(reaction.current_playback(), Some(reactions[0].token));
}

#[test]
fn test_hit_reaction_direction_from_attacker_position() {
    for (faces, expected) in [(true, "FlinchFront"), (false, "FlinchBack")] {
        let mut app = create_combat_app();
        let (attacker, defender) = spawn_duel(&mut app, faces);
        give_reactions(&mut app, defender);

        start_attack(&mut app, attacker, defender);
        app.world_mut().send_event(HitReported::new(attacker, defender));
        tick(&mut app);

        let reactions = drain::<HitReactionChosen>(&mut app);
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].reaction, expected);
        assert_eq!(reactions[0].tier, ReactionMatch::Direction);
    }
}

#[test]
fn test_hit_without_attack_or_reaction_row_is_ignored() {
    let mut app = create_combat_app();
    let (attacker, defender) = spawn_duel(&mut app, true);
    app.world_mut().entity_mut(defender).insert(
        CombatHitReaction::new(defender)
            .with_rows(vec![HitReactionEntry::new("Stagger", HitSeverity::Heavy)]),
    );

    // Атаки ещё нет
    app.world_mut().send_event(HitReported::new(attacker, defender));
    tick(&mut app);
    assert!(drain::<HitReactionChosen>(&mut app).is_empty());

    // Light атака, а в таблице только Heavy
    start_attack(&mut app, attacker, defender);
    app.world_mut()
        .send_event(HitReported::new(attacker, defender).at(Vec3::new(0.0, 1.0, -70.0)));
    tick(&mut app);
    assert!(drain::<HitReactionChosen>(&mut app).is_empty());
    assert!(played_tokens(&mut app).is_empty());
}
