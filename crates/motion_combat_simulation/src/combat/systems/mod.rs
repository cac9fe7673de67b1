//! Combat systems (ECS glue над CombatCore / CombatDefense)

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::chooser::{ChooserJitter, SituationContext};
use crate::collaborators::{HitDetectionLedger, PlaybackLedger, PoseTable};
use crate::config::CombatConfig;
use crate::events::CombatEventBus;

use super::agent::{AgentMotion, AgentVitals};
use super::attacker::CombatEnv;
use super::defense::CombatDefense;

pub mod agents;
pub mod attack;
pub mod commands;
pub mod defense;
pub mod windows;


// Re-export all systems
pub use agents::*;
pub use attack::*;
pub use commands::*;
pub use defense::*;
pub use windows::*;

/// Collaborator resources, из которых собирается `CombatEnv`.
#[derive(SystemParam)]
pub struct CombatCollaborators<'w> {
    pub poses: Res<'w, PoseTable>,
    pub playback: ResMut<'w, PlaybackLedger>,
    pub hits: ResMut<'w, HitDetectionLedger>,
    pub bus: ResMut<'w, CombatEventBus>,
    pub jitter: ResMut<'w, ChooserJitter>,
}

impl CombatCollaborators<'_> {
    pub fn env(&mut self) -> CombatEnv<'_> {
        CombatEnv {
            spatial: &*self.poses,
            targeting: &*self.poses,
            playback: &mut *self.playback,
            hits: &mut *self.hits,
            bus: &mut *self.bus,
            jitter: &mut *self.jitter,
        }
    }
}

/// Situation snapshot; агент без motion/vitals считается стоящим на земле с полными stats.
pub fn situation_snapshot(
    motion: Option<&AgentMotion>,
    vitals: Option<&AgentVitals>,
    defense: Option<&CombatDefense>,
    config: &CombatConfig,
) -> SituationContext {
    let motion = motion.cloned().unwrap_or_default();
    let vitals = vitals.cloned().unwrap_or_default();
    SituationContext::from_agent(&motion, defense, &vitals, config)
}
