//! Agent state components read by situation snapshots.

use bevy::prelude::*;

/// Movement state (пишется хостом: движок/физика).
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct AgentMotion {
    pub velocity: Vec3,
    pub grounded: bool,
    pub crouching: bool,
    /// Высота над землёй
    pub altitude: f32,
}

impl Default for AgentMotion {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            grounded: true,
            crouching: false,
            altitude: 0.0,
        }
    }
}

/// Stamina/health для percentage-скоринга. Урон применяется снаружи.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct AgentVitals {
    pub stamina: f32,
    pub stamina_max: f32,
    pub health: f32,
    pub health_max: f32,
}

impl Default for AgentVitals {
    fn default() -> Self {
        Self::new(100.0, 100.0)
    }
}

impl AgentVitals {
    /// Полные stamina/health.
    pub fn new(stamina_max: f32, health_max: f32) -> Self {
        Self {
            stamina: stamina_max,
            stamina_max,
            health: health_max,
            health_max,
        }
    }

    pub fn stamina_pct(&self) -> f32 {
        ratio(self.stamina, self.stamina_max)
    }

    pub fn health_pct(&self) -> f32 {
        ratio(self.health, self.health_max)
    }
}

fn ratio(current: f32, max: f32) -> f32 {
    if max > 0.0 {
        (current / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
