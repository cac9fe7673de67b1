//! Combat module (host-driven melee architecture)
//!
//! ECS ответственность:
//! - Выбор атак/защит (chooser над активными action sets)
//! - Combo gate, window lifecycle, parry/block state
//! - Hit reactions (lookup по кости/региону/направлению/severity)
//! - Events: AttackChosen, DefenseChosen, DefenseOutcome, HitReactionChosen, команды хосту
//!
//! Хост ответственность:
//! - Анимация: playback, timeline markers (window begin/end)
//! - Коллизии: hitbox sweep, HitReported
//! - Transform агентов (читается в PoseTable)

use bevy::prelude::*;

pub mod agent;
pub mod attacker;
pub mod combo;
pub mod defense;
pub mod intents;
pub mod reaction;
pub mod systems;


// Re-export основных типов
pub use agent::{AgentMotion, AgentVitals};
pub use combo::{ComboGate, ComboGateState};
pub use attacker::{CombatCore, CombatEnv, RoutedWindow};
pub use defense::{CombatDefense, DefenseHandlerIds, DefenseSignal, PARRY_FACING_THRESHOLD};
pub use intents::{
    AttackChosen, AttackRequest, BlockAttempt, ComboRequest, DefenseChosen, DefenseOutcome,
    DefenseRequest, HitDetectionCommandEvent, HitReactionChosen, HitReported, ParryAttempt,
    PlaybackCommandEvent, PlaybackFinished, TimelineMarkerEvent,
};
pub use reaction::{CombatHitReaction, HitContext, ReactionChoice, REACTION_STOP_BLEND};
pub use systems::{situation_snapshot, BoundDefenseHandlers, CombatCollaborators};

use crate::chooser::ChooserJitter;
use crate::collaborators::{HitDetectionLedger, PlaybackLedger, PoseTable};
use crate::config::{CombatConfig, ScoringConfig};
use crate::events::CombatEventBus;

/// Combat Plugin
///
/// Регистрирует combat системы в FixedUpdate.
///
/// Порядок выполнения:
/// 1. sync_poses, apply_tuning, init_added_agents, release_removed_*: bookkeeping
/// 2. process_attack_requests, process_combo_requests: выбор атак
/// 3. track_incoming_attacks, process_defense_requests: выбор защит
/// 4. route_timeline_markers, finish_playbacks, report_hits, deliver_routed_windows:
///    окна (hit reaction закрывает окна прерванного playback'а в том же tick'е)
/// 5. process_parry_and_block_attempts: исходы
/// 6. emit_defense_outcomes, flush_collaborator_commands: события хосту
///
/// Resources инициализируются через `init_resource` (уже вставленные не
/// перезаписываются, например seeded `ChooserJitter` из headless app).
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ScoringConfig>()
            .init_resource::<CombatConfig>()
            .init_resource::<PoseTable>()
            .init_resource::<PlaybackLedger>()
            .init_resource::<HitDetectionLedger>()
            .init_resource::<CombatEventBus>()
            .init_resource::<ChooserJitter>()
            .init_resource::<BoundDefenseHandlers>();

        // Регистрация событий (host → ECS)
        app.add_event::<AttackRequest>()
            .add_event::<ComboRequest>()
            .add_event::<DefenseRequest>()
            .add_event::<ParryAttempt>()
            .add_event::<BlockAttempt>()
            .add_event::<TimelineMarkerEvent>()
            .add_event::<HitReported>()
            .add_event::<PlaybackFinished>();

        // ECS → host
        app.add_event::<AttackChosen>()
            .add_event::<DefenseChosen>()
            .add_event::<DefenseOutcome>()
            .add_event::<HitReactionChosen>()
            .add_event::<PlaybackCommandEvent>()
            .add_event::<HitDetectionCommandEvent>();

        app.add_systems(
            FixedUpdate,
            (
                // Фаза 1: Bookkeeping
                systems::sync_poses,
                systems::apply_tuning,
                systems::init_added_agents,
                systems::release_removed_defenses,
                systems::release_removed_attackers,

                // Фаза 2: Attack selection
                systems::process_attack_requests,
                systems::process_combo_requests,

                // Фаза 3: Defense selection
                systems::track_incoming_attacks,
                systems::process_defense_requests,

                // Фаза 4: Windows
                systems::route_timeline_markers,
                systems::finish_playbacks,
                systems::report_hits,
                systems::deliver_routed_windows,

                // Фаза 5: Outcomes
                systems::process_parry_and_block_attempts,

                // Фаза 6: Host commands
                systems::emit_defense_outcomes,
                systems::flush_collaborator_commands,
            )
                .chain(), // Последовательное выполнение
        );
    }
}
