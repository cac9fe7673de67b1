//! Collaborator ledgers → host command events.

use bevy::prelude::*;

use crate::collaborators::{HitDetectionLedger, PlaybackLedger};
use crate::combat::{HitDetectionCommandEvent, PlaybackCommandEvent};

/// System: накопленные за тик команды уходят хосту (последний в цепочке).
pub fn flush_collaborator_commands(
    mut playback: ResMut<PlaybackLedger>,
    mut hits: ResMut<HitDetectionLedger>,
    mut playback_events: EventWriter<PlaybackCommandEvent>,
    mut hit_events: EventWriter<HitDetectionCommandEvent>,
) {
    for command in playback.drain_commands() {
        playback_events.write(PlaybackCommandEvent(command));
    }
    for command in hits.drain_commands() {
        hit_events.write(HitDetectionCommandEvent(command));
    }
}
