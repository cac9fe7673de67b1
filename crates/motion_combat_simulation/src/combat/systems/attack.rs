//! Attack side systems: requests → CombatCore.

use bevy::prelude::*;

use crate::collaborators::SpatialQuery;
use crate::combat::{
    AgentMotion, AgentVitals, AttackChosen, AttackRequest, CombatCore, CombatDefense,
    CombatHitReaction, ComboRequest, HitContext, HitReactionChosen, HitReported,
    REACTION_STOP_BLEND,
};

use super::{situation_snapshot, CombatCollaborators};

/// System: AttackRequest → select + execute.
///
/// Selection miss не генерирует события (только лог в CombatCore).
pub fn process_attack_requests(
    mut requests: EventReader<AttackRequest>,
    mut attackers: Query<(
        &mut CombatCore,
        Option<&AgentMotion>,
        Option<&AgentVitals>,
        Option<&CombatDefense>,
    )>,
    mut collaborators: CombatCollaborators,
    mut chosen: EventWriter<AttackChosen>,
) {
    for request in requests.read() {
        let Ok((mut core, motion, vitals, defense)) = attackers.get_mut(request.attacker) else {
            crate::logger::log_warning(&format!(
                "⚠️ [CombatCore] AttackRequest for {:?} without CombatCore",
                request.attacker
            ));
            continue;
        };

        if request.target.is_some() {
            core.set_target(request.target);
        }

        let situation = situation_snapshot(motion, vitals, defense, core.config());
        let performed = core.perform_attack(
            request.attack_type,
            request.direction,
            &situation,
            &mut collaborators.env(),
        );
        if !performed {
            continue;
        }

        if let Some(attack) = core.current_attack() {
            chosen.write(AttackChosen {
                attacker: request.attacker,
                attack: attack.name.clone(),
                target: core.current_target(),
                from_combo: false,
            });
        }
    }
}

/// System: ComboRequest → try_continue_combo (gate закрыт → no-op).
pub fn process_combo_requests(
    mut requests: EventReader<ComboRequest>,
    mut attackers: Query<(
        &mut CombatCore,
        Option<&AgentMotion>,
        Option<&AgentVitals>,
        Option<&CombatDefense>,
    )>,
    mut collaborators: CombatCollaborators,
    mut chosen: EventWriter<AttackChosen>,
) {
    for request in requests.read() {
        let Ok((mut core, motion, vitals, defense)) = attackers.get_mut(request.attacker) else {
            continue;
        };

        let situation = situation_snapshot(motion, vitals, defense, core.config());
        let chained = core.try_continue_combo(
            request.attack_type,
            request.direction,
            &situation,
            &mut collaborators.env(),
        );
        if !chained {
            continue;
        }

        if let Some(attack) = core.current_attack() {
            chosen.write(AttackChosen {
                attacker: request.attacker,
                attack: attack.name.clone(),
                target: core.current_target(),
                from_combo: true,
            });
        }
    }
}

/// System: hit detection хоста → HitLanded на bus → hit reaction defender'а.
///
/// Реакция прерывает текущий playback defender'а (его окна закрываются).
/// Точка удара по умолчанию: позиция атакующего.
pub fn report_hits(
    mut reports: EventReader<HitReported>,
    mut cores: Query<&mut CombatCore>,
    mut reactions: Query<&mut CombatHitReaction>,
    mut collaborators: CombatCollaborators,
    mut reacted: EventWriter<HitReactionChosen>,
) {
    for report in reports.read() {
        let Ok(mut core) = cores.get_mut(report.attacker) else {
            continue;
        };
        let Some(severity) = core.current_attack().map(|attack| attack.severity) else {
            continue;
        };
        if !core.report_hit(report.defender, &mut collaborators.env()) {
            continue;
        }

        let Ok(mut reaction) = reactions.get_mut(report.defender) else {
            continue;
        };

        let impact_point = report.impact_point.or_else(|| {
            collaborators
                .poses
                .pose(report.attacker)
                .map(|pose| pose.position)
        });
        let hit = HitContext {
            impact_point,
            bone: report.bone.as_deref(),
            severity,
        };
        let Some(choice) = reaction.choose(&hit, &*collaborators.poses) else {
            continue;
        };

        if let Ok(mut victim) = cores.get_mut(report.defender) {
            victim.interrupt(REACTION_STOP_BLEND, &mut collaborators.env());
        }
        let token = reaction.play(&choice.reaction, &mut *collaborators.playback);

        reacted.write(HitReactionChosen {
            defender: report.defender,
            attacker: report.attacker,
            reaction: choice.reaction.name,
            direction: choice.direction,
            tier: choice.tier,
            token,
        });
    }
}
