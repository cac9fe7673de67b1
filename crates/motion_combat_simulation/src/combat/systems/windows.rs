//! Timeline markers → window lifecycle → defense routing.

use bevy::prelude::*;

use crate::combat::{
    CombatCore, CombatDefense, CombatHitReaction, PlaybackFinished, TimelineMarkerEvent,
};

use super::CombatCollaborators;

/// System: TimelineMarkerEvent → CombatCore::handle_marker.
pub fn route_timeline_markers(
    mut markers: EventReader<TimelineMarkerEvent>,
    mut cores: Query<&mut CombatCore>,
    mut collaborators: CombatCollaborators,
) {
    for event in markers.read() {
        let Ok(mut core) = cores.get_mut(event.owner) else {
            crate::logger::log_verbose(&format!(
                "[WindowLifecycle] marker for {:?} without CombatCore",
                event.owner
            ));
            continue;
        };
        core.handle_marker(&event.marker, &mut collaborators.env());
    }
}

/// System: playback доиграл → закрыть его окна.
pub fn finish_playbacks(
    mut finished: EventReader<PlaybackFinished>,
    mut cores: Query<&mut CombatCore>,
    mut reactions: Query<&mut CombatHitReaction>,
    mut collaborators: CombatCollaborators,
) {
    for event in finished.read() {
        collaborators.playback.finish(event.token);

        if let Ok(mut core) = cores.get_mut(event.owner) {
            core.release_playback(event.token, &mut collaborators.env());
        }
        if let Ok(mut reaction) = reactions.get_mut(event.owner) {
            reaction.release_playback(event.token);
        }
    }
}

/// System: parry windows → defense цели, defense windows → defense владельца.
pub fn deliver_routed_windows(
    mut cores: Query<&mut CombatCore>,
    mut defenses: Query<&mut CombatDefense>,
) {
    for mut core in cores.iter_mut() {
        for routed in core.drain_routed_windows() {
            match defenses.get_mut(routed.defender) {
                Ok(mut defense) => defense.on_window(&routed.notification),
                Err(_) => crate::logger::log_verbose(&format!(
                    "[WindowLifecycle] {:?} window for {:?} without CombatDefense",
                    routed.notification.kind(),
                    routed.defender
                )),
            }
        }
    }
}
