//! Scoring engine: additive weighted sub-scores + bounded jitter.
//!
//! Baseline model (веса: `ScoringConfig`):
//! - intent: +match bonus / −mismatch penalty (бинарно)
//! - distance: tent response вокруг midpoint диапазона, [−w, +w]
//! - facing: бонус только для Forward кандидатов внутри cone
//! - jitter: uniform [−a, +a], один sample на вызов
//!
//! Attack extensions: base weight, tag match, situational match.
//!
//! Невалидный self/other actor → `ScoreBreakdown::floor()`, кандидат никогда
//! не выбирается.

use bevy::prelude::Vec3;

use crate::actions::{
    ActionCandidate, ActionDirection, AttackEntry, AttackType, DistanceRange, SituationFlags,
    TagSet,
};
use crate::config::ScoringConfig;
use crate::spatial::ActorPose;

use super::context::ChoiceContext;
use super::jitter::JitterSource;

/// Per-candidate breakdown. `total` = сумма всех компонент.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreBreakdown {
    pub base: f32,
    pub intent: f32,
    pub tag: f32,
    pub distance: f32,
    pub direction: f32,
    pub situational: f32,
    pub jitter: f32,
    pub total: f32,
}

impl ScoreBreakdown {
    /// "Never selectable" score (невалидные актёры).
    pub fn floor() -> Self {
        Self {
            total: f32::MIN,
            ..Default::default()
        }
    }

    pub fn is_floor(&self) -> bool {
        self.total == f32::MIN
    }

    /// Пересчитать total из компонент.
    pub fn summed(mut self) -> Self {
        self.total = self.base
            + self.intent
            + self.tag
            + self.distance
            + self.direction
            + self.situational
            + self.jitter;
        self
    }
}

/// Стратегия скоринга, подключается к chooser'у при активации set'а.
pub trait ScoringStrategy<C: ActionCandidate>: Send + Sync {
    fn score(
        &self,
        candidate: &C,
        ctx: &ChoiceContext<'_, C::Intent>,
        jitter: &mut dyn JitterSource,
    ) -> ScoreBreakdown;
}

// ============================================================================
// Sub-scores (pure)
// ============================================================================

pub fn score_intent<I: PartialEq>(candidate: I, requested: I, config: &ScoringConfig) -> f32 {
    if candidate == requested {
        config.intent_match_bonus
    } else {
        -config.intent_mismatch_penalty
    }
}

/// Tent response: +w в midpoint, −w на краю диапазона и дальше.
///
/// Half-width ≤ `degenerate_range_extent` (включая перевёрнутые диапазоны) → 0.
pub fn score_distance(range: DistanceRange, distance: f32, config: &ScoringConfig) -> f32 {
    let half = range.half_extent();
    if !(half > config.degenerate_range_extent) || !distance.is_finite() {
        return 0.0;
    }

    let window = config.distance_half_window;
    let normalized = (1.0 - (distance - range.midpoint()).abs() / half).clamp(0.0, 1.0);
    normalized * window * 2.0 - window
}

/// Facing bonus: только Forward кандидаты, dot > threshold.
pub fn score_facing(
    direction: ActionDirection,
    self_pose: &ActorPose,
    other_position: Vec3,
    config: &ScoringConfig,
) -> f32 {
    if direction != ActionDirection::Forward {
        return 0.0;
    }

    if self_pose.facing_dot(other_position) > config.facing_dot_threshold {
        config.facing_bonus
    } else {
        0.0
    }
}

pub fn score_base_weight(weight: f32, config: &ScoringConfig) -> f32 {
    if weight.is_finite() {
        weight * config.base_weight_scale
    } else {
        0.0
    }
}

/// Graded tag match: бонус за каждый присутствующий required, штрафы за
/// отсутствующие required и присутствующие excluded.
pub fn score_tags(
    required: &TagSet,
    excluded: &TagSet,
    owned: &TagSet,
    config: &ScoringConfig,
) -> f32 {
    let mut score = 0.0;

    for tag in required.iter() {
        if owned.contains(tag) {
            score += config.required_tag_bonus;
        } else {
            score -= config.missing_required_tag_penalty;
        }
    }

    let violated = excluded.iter().filter(|tag| owned.contains(tag)).count();
    score - violated as f32 * config.excluded_tag_penalty
}

/// Per-bit situational match.
pub fn score_situation(
    required: SituationFlags,
    excluded: SituationFlags,
    current: SituationFlags,
    config: &ScoringConfig,
) -> f32 {
    let satisfied = required.intersection(current).bits().count_ones() as f32;
    let missing = required.difference(current).bits().count_ones() as f32;
    let violated = excluded.intersection(current).bits().count_ones() as f32;

    satisfied * config.situation_match_bonus
        - (missing + violated) * config.situation_mismatch_penalty
}

/// Intent + distance + facing. None если какой-то актёр невалиден.
fn baseline<C: ActionCandidate>(
    candidate: &C,
    ctx: &ChoiceContext<'_, C::Intent>,
    config: &ScoringConfig,
) -> Option<ScoreBreakdown> {
    let other = ctx.other_actor?;
    let self_pose = ctx.spatial.pose(ctx.self_actor)?;
    let other_pose = ctx.spatial.pose(other)?;

    let distance = self_pose.position.distance(other_pose.position);

    Some(ScoreBreakdown {
        intent: score_intent(candidate.intent(), ctx.intent, config),
        distance: score_distance(candidate.distance(), distance, config),
        direction: score_facing(candidate.direction(), &self_pose, other_pose.position, config),
        ..Default::default()
    })
}

// ============================================================================
// Strategies
// ============================================================================

/// Baseline additive model (defense chooser по умолчанию).
#[derive(Debug, Clone, Default)]
pub struct DefenseScoring {
    pub config: ScoringConfig,
}

impl DefenseScoring {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }
}

impl<C: ActionCandidate> ScoringStrategy<C> for DefenseScoring {
    fn score(
        &self,
        candidate: &C,
        ctx: &ChoiceContext<'_, C::Intent>,
        jitter: &mut dyn JitterSource,
    ) -> ScoreBreakdown {
        let Some(mut breakdown) = baseline(candidate, ctx, &self.config) else {
            return ScoreBreakdown::floor();
        };

        breakdown.jitter = jitter.sample(self.config.jitter_amplitude);
        breakdown.summed()
    }
}

/// Baseline + base weight + tags + situation.
#[derive(Debug, Clone, Default)]
pub struct AttackScoring {
    pub config: ScoringConfig,
}

impl AttackScoring {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }
}

impl ScoringStrategy<AttackEntry> for AttackScoring {
    fn score(
        &self,
        candidate: &AttackEntry,
        ctx: &ChoiceContext<'_, AttackType>,
        jitter: &mut dyn JitterSource,
    ) -> ScoreBreakdown {
        let Some(mut breakdown) = baseline(candidate, ctx, &self.config) else {
            return ScoreBreakdown::floor();
        };

        breakdown.base = score_base_weight(candidate.selection_weight, &self.config);
        breakdown.tag = score_tags(
            &candidate.required_tags,
            &candidate.excluded_tags,
            ctx.self_tags,
            &self.config,
        );
        breakdown.situational = score_situation(
            candidate.required_situation,
            candidate.excluded_situation,
            ctx.situation.flags(),
            &self.config,
        );
        breakdown.jitter = jitter.sample(self.config.jitter_amplitude);
        breakdown.summed()
    }
}
