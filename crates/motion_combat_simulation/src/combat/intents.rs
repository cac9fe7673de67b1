//! ECS events: host → simulation intents, simulation → host results.

use bevy::prelude::*;

use crate::actions::{ActionDirection, AttackType, DefenseIntent, ReactionMatch};
use crate::collaborators::{HitDetectionCommand, PlaybackCommand, PlaybackToken};
use crate::windows::TimelineMarker;

use super::defense::DefenseSignal;

// ============================================================================
// Inbound (host → ECS)
// ============================================================================

/// Игрок/AI хочет атаковать.
#[derive(Event, Debug, Clone)]
pub struct AttackRequest {
    pub attacker: Entity,
    pub attack_type: AttackType,
    pub direction: ActionDirection,
    /// Some → сменить текущую цель перед выбором
    pub target: Option<Entity>,
}

/// Повторный attack input во время combo window.
#[derive(Event, Debug, Clone)]
pub struct ComboRequest {
    pub attacker: Entity,
    pub attack_type: AttackType,
    pub direction: ActionDirection,
}

#[derive(Event, Debug, Clone)]
pub struct DefenseRequest {
    pub defender: Entity,
    pub attacker: Option<Entity>,
    pub intent: DefenseIntent,
}

#[derive(Event, Debug, Clone)]
pub struct ParryAttempt {
    pub defender: Entity,
}

#[derive(Event, Debug, Clone)]
pub struct BlockAttempt {
    pub defender: Entity,
}

/// Timeline marker от анимации хоста.
#[derive(Event, Debug, Clone)]
pub struct TimelineMarkerEvent {
    pub owner: Entity,
    pub marker: TimelineMarker,
}

/// Hit detection хоста нашла попадание.
#[derive(Event, Debug, Clone)]
pub struct HitReported {
    pub attacker: Entity,
    pub defender: Entity,
    /// World-space точка контакта (None → позиция атакующего)
    pub impact_point: Option<Vec3>,
    /// Кость defender'а, в которую пришёлся удар
    pub bone: Option<String>,
}

impl HitReported {
    pub fn new(attacker: Entity, defender: Entity) -> Self {
        Self {
            attacker,
            defender,
            impact_point: None,
            bone: None,
        }
    }

    pub fn at(mut self, impact_point: Vec3) -> Self {
        self.impact_point = Some(impact_point);
        self
    }

    pub fn on_bone(mut self, bone: impl Into<String>) -> Self {
        self.bone = Some(bone.into());
        self
    }
}

/// Playback доиграл сам (не был прерван).
#[derive(Event, Debug, Clone)]
pub struct PlaybackFinished {
    pub owner: Entity,
    pub token: PlaybackToken,
}

// ============================================================================
// Outbound (ECS → host)
// ============================================================================

#[derive(Event, Debug, Clone)]
pub struct AttackChosen {
    pub attacker: Entity,
    pub attack: String,
    pub target: Option<Entity>,
    pub from_combo: bool,
}

#[derive(Event, Debug, Clone)]
pub struct DefenseChosen {
    pub defender: Entity,
    pub defense: String,
    /// None если у defender'а нет CombatCore (playback не запускался)
    pub token: Option<PlaybackToken>,
}

#[derive(Event, Debug, Clone)]
pub struct DefenseOutcome {
    pub defender: Entity,
    pub signal: DefenseSignal,
}

/// Defender'у выбрана и запущена hit reaction.
#[derive(Event, Debug, Clone)]
pub struct HitReactionChosen {
    pub defender: Entity,
    pub attacker: Entity,
    pub reaction: String,
    /// Сторона удара относительно defender'а
    pub direction: ActionDirection,
    pub tier: ReactionMatch,
    pub token: PlaybackToken,
}

/// Команда playback driver'у хоста.
#[derive(Event, Debug, Clone)]
pub struct PlaybackCommandEvent(pub PlaybackCommand);

/// Команда hit detection хоста.
#[derive(Event, Debug, Clone)]
pub struct HitDetectionCommandEvent(pub HitDetectionCommand);
