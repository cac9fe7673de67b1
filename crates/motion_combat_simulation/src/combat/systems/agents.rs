//! Agent bookkeeping: pose sync, set activation, bus handler lifetime.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::collaborators::PoseTable;
use crate::combat::{CombatCore, CombatDefense, DefenseHandlerIds};
use crate::config::{CombatConfig, ScoringConfig};
use crate::events::CombatEventBus;
use crate::spatial::ActorPose;

/// Bus подписки живых CombatDefense (unbind после удаления компонента).
#[derive(Resource, Debug, Default)]
pub struct BoundDefenseHandlers(pub HashMap<Entity, DefenseHandlerIds>);

/// System: Transform → PoseTable (snapshot на тик).
pub fn sync_poses(
    mut poses: ResMut<PoseTable>,
    agents: Query<(Entity, &Transform), Or<(With<CombatCore>, With<CombatDefense>)>>,
) {
    poses.clear();
    for (entity, transform) in agents.iter() {
        poses.insert(entity, ActorPose::from_transform(transform));
    }
}

/// System: ScoringConfig/CombatConfig resources → агенты.
///
/// Новые агенты получают текущий tuning, изменение resource'а перенастраивает
/// всех. Невалидный resource игнорируется (агенты сохраняют прежние веса).
pub fn apply_tuning(
    scoring: Res<ScoringConfig>,
    combat: Res<CombatConfig>,
    mut cores: Query<&mut CombatCore>,
    mut defenses: Query<&mut CombatDefense>,
) {
    let retune_all = scoring.is_changed() || combat.is_changed();

    if retune_all {
        if let Err(error) = scoring.validate().and_then(|_| combat.validate()) {
            crate::logger::log_warning(&format!("⚠️ [CombatTuning] rejected: {}", error));
            return;
        }
    }

    for mut core in cores.iter_mut() {
        if retune_all || core.is_added() {
            core.apply_tuning(&combat, &scoring);
        }
    }
    for mut defense in defenses.iter_mut() {
        if retune_all || defense.is_added() {
            defense.apply_scoring(&scoring);
        }
    }
}

/// System: новые агенты активируют первый set и подписываются на bus.
pub fn init_added_agents(
    mut cores: Query<&mut CombatCore, Added<CombatCore>>,
    mut defenses: Query<(Entity, &mut CombatDefense), Added<CombatDefense>>,
    mut bus: ResMut<CombatEventBus>,
    mut bound: ResMut<BoundDefenseHandlers>,
) {
    for mut core in cores.iter_mut() {
        core.ensure_active_set();
    }

    for (entity, mut defense) in defenses.iter_mut() {
        defense.ensure_active_set();
        defense.bind_global_handlers(&mut bus);

        if let Some(ids) = defense.global_handlers() {
            bound.0.insert(entity, ids);
        }
    }
}

/// System: отписка handlers удалённых CombatDefense.
pub fn release_removed_defenses(
    mut removed: RemovedComponents<CombatDefense>,
    mut bound: ResMut<BoundDefenseHandlers>,
    mut bus: ResMut<CombatEventBus>,
) {
    for entity in removed.read() {
        let Some(ids) = bound.0.remove(&entity) else {
            continue;
        };
        ids.unbind(&mut bus);

        crate::logger::log(&format!(
            "🧹 [CombatDefense] {:?}: global handlers released",
            entity
        ));
    }
}

/// System: CombatCore удалён → defenders забывают этого атакующего
/// (его parry end уже не придёт).
pub fn release_removed_attackers(
    mut removed: RemovedComponents<CombatCore>,
    mut defenses: Query<&mut CombatDefense>,
) {
    for entity in removed.read() {
        for mut defense in defenses.iter_mut() {
            if defense.forget_actor(entity) {
                crate::logger::log(&format!(
                    "🧹 [CombatDefense] {:?}: windows of removed {:?} closed",
                    defense.owner(),
                    entity
                ));
            }
        }
    }
}
