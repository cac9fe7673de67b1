//! Defense side systems: defense choice, parry/block attempts, outcomes.

use bevy::prelude::*;

use crate::collaborators::PoseTable;
use crate::combat::{
    AgentMotion, AgentVitals, AttackChosen, BlockAttempt, CombatCore, CombatDefense,
    DefenseChosen, DefenseOutcome, DefenseRequest, ParryAttempt,
};
use crate::config::CombatConfig;
use crate::events::CombatEventBus;

use super::{situation_snapshot, CombatCollaborators};

/// System: AttackChosen с целью → defender запоминает атакующего (для block).
pub fn track_incoming_attacks(
    mut chosen: EventReader<AttackChosen>,
    mut defenses: Query<&mut CombatDefense>,
) {
    for event in chosen.read() {
        let Some(target) = event.target else {
            continue;
        };
        if let Ok(mut defense) = defenses.get_mut(target) {
            defense.note_incoming_attack(event.attacker);
        }
    }
}

/// System: DefenseRequest → choose_defense (+ playback, если есть CombatCore).
pub fn process_defense_requests(
    mut requests: EventReader<DefenseRequest>,
    mut defenders: Query<(
        &mut CombatDefense,
        Option<&mut CombatCore>,
        Option<&AgentMotion>,
        Option<&AgentVitals>,
    )>,
    config: Res<CombatConfig>,
    mut collaborators: CombatCollaborators,
    mut chosen: EventWriter<DefenseChosen>,
) {
    for request in requests.read() {
        let Ok((mut defense, core, motion, vitals)) = defenders.get_mut(request.defender) else {
            crate::logger::log_warning(&format!(
                "⚠️ [CombatDefense] DefenseRequest for {:?} without CombatDefense",
                request.defender
            ));
            continue;
        };

        let situation = situation_snapshot(motion, vitals, Some(&*defense), &config);
        let Some(entry) = defense.choose_defense(
            request.attacker,
            request.intent,
            &situation,
            &*collaborators.poses,
            &mut *collaborators.jitter,
        ) else {
            continue;
        };

        let token = core.map(|mut core| core.execute_defense(&entry, &mut collaborators.env()));

        chosen.write(DefenseChosen {
            defender: request.defender,
            defense: entry.name,
            token,
        });
    }
}

/// System: parry/block attempts хоста.
pub fn process_parry_and_block_attempts(
    mut parries: EventReader<ParryAttempt>,
    mut blocks: EventReader<BlockAttempt>,
    mut defenses: Query<&mut CombatDefense>,
    poses: Res<PoseTable>,
    mut bus: ResMut<CombatEventBus>,
) {
    for attempt in parries.read() {
        if let Ok(mut defense) = defenses.get_mut(attempt.defender) {
            defense.try_parry(&*poses, &mut bus);
        }
    }

    for attempt in blocks.read() {
        if let Ok(mut defense) = defenses.get_mut(attempt.defender) {
            defense.try_defense(&mut bus);
        }
    }
}

/// System: local defense signals → DefenseOutcome events.
pub fn emit_defense_outcomes(
    mut defenses: Query<(Entity, &mut CombatDefense)>,
    mut outcomes: EventWriter<DefenseOutcome>,
) {
    for (defender, mut defense) in defenses.iter_mut() {
        for signal in defense.drain_signals() {
            outcomes.write(DefenseOutcome { defender, signal });
        }
    }
}
