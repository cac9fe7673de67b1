//! External collaborator contracts + ledger implementations.
//!
//! Core не владеет анимацией, коллизиями и перцепцией. Он говорит с ними
//! через эти traits. Ledger-реализации копят команды, которые
//! `CombatPlugin` превращает в Bevy events для хоста (движок/рендер).

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;

use crate::actions::{AttackEntry, BlendTiming, HitboxSpec, PlaybackRef};
use crate::spatial::ActorPose;

// ============================================================================
// Spatial / targeting
// ============================================================================

/// Pose lookup. `None` = актёр невалиден (despawned / неизвестен).
pub trait SpatialQuery {
    fn pose(&self, actor: Entity) -> Option<ActorPose>;
}

/// Targeting/perception: кто может быть "other actor" для решения.
pub trait TargetingQuery {
    fn closest_target(&self, actor: Entity, max_range: f32) -> Option<Entity>;
    /// Потенциальные цели, ближайшие первыми.
    fn targets(&self, actor: Entity) -> Vec<Entity>;
}

/// Pose snapshot всех боевых актёров (обновляется каждый tick из Transform).
///
/// Targeting по умолчанию: каждый другой актёр с позой: потенциальная цель.
#[derive(Resource, Debug, Default, Clone)]
pub struct PoseTable {
    poses: HashMap<Entity, ActorPose>,
}

impl PoseTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, actor: Entity, pose: ActorPose) {
        self.poses.insert(actor, pose);
    }

    pub fn remove(&mut self, actor: Entity) -> Option<ActorPose> {
        self.poses.remove(&actor)
    }

    pub fn clear(&mut self) {
        self.poses.clear();
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// (distance, entity) для всех кроме `actor`; сортировка стабильна по Entity.
    fn ranked_targets(&self, actor: Entity) -> Vec<(f32, Entity)> {
        let Some(origin) = self.poses.get(&actor) else {
            return Vec::new();
        };

        let mut ranked: Vec<(f32, Entity)> = self
            .poses
            .iter()
            .filter(|(entity, _)| **entity != actor)
            .map(|(entity, pose)| (origin.position.distance(pose.position), *entity))
            .collect();

        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        ranked
    }
}

impl SpatialQuery for PoseTable {
    fn pose(&self, actor: Entity) -> Option<ActorPose> {
        self.poses.get(&actor).copied()
    }
}

impl TargetingQuery for PoseTable {
    fn closest_target(&self, actor: Entity, max_range: f32) -> Option<Entity> {
        self.ranked_targets(actor)
            .into_iter()
            .find(|(distance, _)| *distance <= max_range)
            .map(|(_, entity)| entity)
    }

    fn targets(&self, actor: Entity) -> Vec<Entity> {
        self.ranked_targets(actor)
            .into_iter()
            .map(|(_, entity)| entity)
            .collect()
    }
}

// ============================================================================
// Playback
// ============================================================================

/// Handle одного запуска playback. Уникален в пределах driver'а.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaybackToken(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRequest {
    pub actor: Entity,
    pub playback: PlaybackRef,
    /// Section jump внутри ресурса (если задан)
    pub section: Option<String>,
    pub blend: BlendTiming,
    /// 1.0 = нормальная скорость
    pub play_rate: f32,
}

pub trait PlaybackDriver {
    fn play(&mut self, request: PlaybackRequest) -> PlaybackToken;
    fn stop(&mut self, token: PlaybackToken, blend_out: f32);
    fn is_active(&self, token: PlaybackToken) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
    Play {
        token: PlaybackToken,
        request: PlaybackRequest,
    },
    Stop {
        token: PlaybackToken,
        blend_out: f32,
    },
}

/// PlaybackDriver, который выдаёт токены и копит команды для хоста.
#[derive(Resource, Debug, Default)]
pub struct PlaybackLedger {
    next_token: u64,
    active: HashSet<PlaybackToken>,
    pending: Vec<PlaybackCommand>,
}

impl PlaybackLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Хост сообщает, что playback закончился сам.
    pub fn finish(&mut self, token: PlaybackToken) {
        self.active.remove(&token);
    }

    pub fn pending(&self) -> &[PlaybackCommand] {
        &self.pending
    }

    pub fn drain_commands(&mut self) -> Vec<PlaybackCommand> {
        std::mem::take(&mut self.pending)
    }
}

impl PlaybackDriver for PlaybackLedger {
    fn play(&mut self, request: PlaybackRequest) -> PlaybackToken {
        self.next_token += 1;
        let token = PlaybackToken(self.next_token);

        self.active.insert(token);
        self.pending.push(PlaybackCommand::Play { token, request });
        token
    }

    fn stop(&mut self, token: PlaybackToken, blend_out: f32) {
        if self.active.remove(&token) {
            self.pending.push(PlaybackCommand::Stop { token, blend_out });
        }
    }

    fn is_active(&self, token: PlaybackToken) -> bool {
        self.active.contains(&token)
    }
}

// ============================================================================
// Hit detection
// ============================================================================

/// Коллизии и нанесение урона живут у collaborator'а.
pub trait HitDetection {
    fn start_hit_detection(&mut self, attacker: Entity, attack: &AttackEntry, hitbox: &HitboxSpec);
    fn stop_hit_detection(&mut self, attacker: Entity);
    fn reset_already_hit(&mut self, attacker: Entity);
}

#[derive(Debug, Clone, PartialEq)]
pub enum HitDetectionCommand {
    Start {
        attacker: Entity,
        attack: String,
        hitbox: HitboxSpec,
    },
    Stop {
        attacker: Entity,
    },
    ResetAlreadyHit {
        attacker: Entity,
    },
}

#[derive(Resource, Debug, Default)]
pub struct HitDetectionLedger {
    sweeping: HashSet<Entity>,
    pending: Vec<HitDetectionCommand>,
}

impl HitDetectionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_sweeping(&self, attacker: Entity) -> bool {
        self.sweeping.contains(&attacker)
    }

    pub fn pending(&self) -> &[HitDetectionCommand] {
        &self.pending
    }

    pub fn drain_commands(&mut self) -> Vec<HitDetectionCommand> {
        std::mem::take(&mut self.pending)
    }
}

impl HitDetection for HitDetectionLedger {
    fn start_hit_detection(&mut self, attacker: Entity, attack: &AttackEntry, hitbox: &HitboxSpec) {
        self.sweeping.insert(attacker);
        self.pending.push(HitDetectionCommand::Start {
            attacker,
            attack: attack.name.clone(),
            hitbox: hitbox.clone(),
        });
    }

    fn stop_hit_detection(&mut self, attacker: Entity) {
        if self.sweeping.remove(&attacker) {
            self.pending.push(HitDetectionCommand::Stop { attacker });
        }
    }

    fn reset_already_hit(&mut self, attacker: Entity) {
        self.pending.push(HitDetectionCommand::ResetAlreadyHit { attacker });
    }
}
