//! CombatHitReaction: реакция defender'а на попадание.
//!
//! Попадание (кость + точка удара + severity атаки) → hierarchical lookup
//! по таблице реакций → playback. Предыдущая реакция прерывается.

use bevy::prelude::*;

use crate::actions::{
    find_reaction, ActionDirection, ActionTableSource, BlendTiming, HitReactionEntry, HitSeverity,
    ReactionMatch, TableError,
};
use crate::collaborators::{PlaybackDriver, PlaybackRequest, PlaybackToken, SpatialQuery};
use crate::spatial::hit_direction_from_point;

/// Blend out для всего, что прерывает реакция
pub const REACTION_STOP_BLEND: f32 = 0.1;

/// Описание одного попадания по owner'у.
#[derive(Debug, Clone, PartialEq)]
pub struct HitContext<'a> {
    /// World-space точка удара (None → направление неизвестно)
    pub impact_point: Option<Vec3>,
    pub bone: Option<&'a str>,
    pub severity: HitSeverity,
}

/// Результат lookup'а (ещё не проигран).
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionChoice {
    pub reaction: HitReactionEntry,
    pub direction: ActionDirection,
    pub tier: ReactionMatch,
}

#[derive(Component, Debug, Clone)]
pub struct CombatHitReaction {
    owner: Entity,
    rows: Vec<HitReactionEntry>,
    playback: Option<PlaybackToken>,
}

impl CombatHitReaction {
    pub fn new(owner: Entity) -> Self {
        Self {
            owner,
            rows: Vec::new(),
            playback: None,
        }
    }

    pub fn with_rows(mut self, rows: Vec<HitReactionEntry>) -> Self {
        self.rows = rows;
        self
    }

    /// Таблица грузится один раз; ошибка source'а пробрасывается.
    pub fn from_source(
        owner: Entity,
        source: &dyn ActionTableSource<HitReactionEntry>,
        key: &str,
    ) -> Result<Self, TableError> {
        Ok(Self::new(owner).with_rows(source.load_rows(key)?))
    }

    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn rows(&self) -> &[HitReactionEntry] {
        &self.rows
    }

    pub fn current_playback(&self) -> Option<PlaybackToken> {
        self.playback
    }

    /// Direction из точки удара относительно pose owner'а, затем lookup.
    ///
    /// Owner без pose или без точки удара → `Omni` (только bone/region/severity).
    pub fn choose(&self, hit: &HitContext, spatial: &dyn SpatialQuery) -> Option<ReactionChoice> {
        let direction = match (spatial.pose(self.owner), hit.impact_point) {
            (Some(pose), Some(point)) => hit_direction_from_point(&pose, point),
            _ => ActionDirection::Omni,
        };

        let Some((reaction, tier)) = find_reaction(&self.rows, hit.bone, direction, hit.severity) else {
            crate::logger::log_warning(&format!(
                "⚠️ [HitReaction] {:?}: no reaction for {:?} hit (bone: {:?}, direction: {:?})",
                self.owner, hit.severity, hit.bone, direction
            ));
            return None;
        };

        Some(ReactionChoice {
            reaction: reaction.clone(),
            direction,
            tier,
        })
    }

    /// Проиграть реакцию; активная предыдущая реакция останавливается.
    pub fn play(&mut self, reaction: &HitReactionEntry, playback: &mut dyn PlaybackDriver) -> PlaybackToken {
        if let Some(previous) = self.playback.take() {
            if playback.is_active(previous) {
                playback.stop(previous, REACTION_STOP_BLEND);
            }
        }

        let token = playback.play(PlaybackRequest {
            actor: self.owner,
            playback: reaction.playback.clone(),
            section: None,
            blend: BlendTiming::new(reaction.blend_in, REACTION_STOP_BLEND).clamped(),
            play_rate: reaction.effective_play_rate(),
        });
        self.playback = Some(token);

        crate::logger::log(&format!(
            "💥 [HitReaction] {:?}: '{}' (token: {:?})",
            self.owner, reaction.name, token
        ));
        token
    }

    /// Playback закончился сам.
    pub fn release_playback(&mut self, token: PlaybackToken) {
        if self.playback == Some(token) {
            self.playback = None;
        }
    }
}
