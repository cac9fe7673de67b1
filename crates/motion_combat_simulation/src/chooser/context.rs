//! Decision inputs: situation snapshot + choice context.

use bevy::prelude::*;

use crate::actions::{ActionDirection, SituationFlags, TagSet};
use crate::collaborators::SpatialQuery;
use crate::combat::{AgentMotion, AgentVitals, CombatDefense};
use crate::config::CombatConfig;

/// Snapshot состояния агента на момент решения.
///
/// Создаётся один раз на решение и передаётся по ссылке.
/// Selector его не хранит.
#[derive(Debug, Clone, PartialEq)]
pub struct SituationContext {
    pub grounded: bool,
    pub in_air: bool,
    pub crouching: bool,
    pub running: bool,
    pub countering: bool,
    pub parrying: bool,
    pub riposting: bool,
    pub finishing: bool,
    pub blocking: bool,
    pub speed: f32,
    pub altitude: f32,
    /// 0.0..=1.0
    pub stamina_pct: f32,
    /// 0.0..=1.0
    pub health_pct: f32,
}

impl Default for SituationContext {
    fn default() -> Self {
        Self {
            grounded: true,
            in_air: false,
            crouching: false,
            running: false,
            countering: false,
            parrying: false,
            riposting: false,
            finishing: false,
            blocking: false,
            speed: 0.0,
            altitude: 0.0,
            stamina_pct: 1.0,
            health_pct: 1.0,
        }
    }
}

impl SituationContext {
    /// Snapshot из ECS-состояния агента.
    ///
    /// Running = speed > `running_speed_threshold`. Parry/block читаются из
    /// defense state. Countering/riposting/finishing остаются false, их
    /// выставляет вызывающий код.
    pub fn from_agent(
        motion: &AgentMotion,
        defense: Option<&CombatDefense>,
        vitals: &AgentVitals,
        config: &CombatConfig,
    ) -> Self {
        let speed = motion.velocity.length();

        Self {
            grounded: motion.grounded,
            in_air: !motion.grounded,
            crouching: motion.crouching,
            running: motion.grounded && speed > config.running_speed_threshold,
            countering: false,
            parrying: defense.is_some_and(|d| d.in_parry_window()),
            riposting: false,
            finishing: false,
            blocking: defense.is_some_and(|d| d.in_defense_window()),
            speed,
            altitude: motion.altitude,
            stamina_pct: vitals.stamina_pct(),
            health_pct: vitals.health_pct(),
        }
    }

    pub fn flags(&self) -> SituationFlags {
        let mut flags = SituationFlags::empty();
        flags.set(SituationFlags::GROUNDED, self.grounded);
        flags.set(SituationFlags::IN_AIR, self.in_air);
        flags.set(SituationFlags::CROUCHING, self.crouching);
        flags.set(SituationFlags::RUNNING, self.running);
        flags.set(SituationFlags::COUNTERING, self.countering);
        flags.set(SituationFlags::PARRYING, self.parrying);
        flags.set(SituationFlags::RIPOSTING, self.riposting);
        flags.set(SituationFlags::FINISHING, self.finishing);
        flags.set(SituationFlags::BLOCKING, self.blocking);
        flags
    }
}

/// Всё, что нужно eligibility/scoring для одного решения.
#[derive(Clone, Copy)]
pub struct ChoiceContext<'a, I> {
    pub self_actor: Entity,
    /// None → scoring floor для всех кандидатов
    pub other_actor: Option<Entity>,
    pub intent: I,
    pub direction: ActionDirection,
    pub situation: &'a SituationContext,
    /// Теги self actor'а (eligibility + tag score)
    pub self_tags: &'a TagSet,
    pub spatial: &'a dyn SpatialQuery,
}
