//! Spatial helpers: poses, facing, direction classification.
//!
//! Мир Y-up (Bevy convention): forward = -Z, right = +X.
//! Все функции guard'ят нулевые векторы: никаких NaN наружу.

use bevy::prelude::*;

use crate::actions::ActionDirection;
use crate::config::CombatConfig;

/// Position + basis vectors одного актёра (snapshot на момент решения).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorPose {
    pub position: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
}

impl ActorPose {
    /// Pose из позиции и forward; right выводится через world up.
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        let forward = forward.normalize_or_zero();
        Self {
            position,
            forward,
            right: forward.cross(Vec3::Y).normalize_or_zero(),
        }
    }

    /// Pose, смотрящий на точку `target`.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self::new(position, direction_to(position, target))
    }

    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            position: transform.translation,
            forward: transform.forward().as_vec3(),
            right: transform.right().as_vec3(),
        }
    }

    /// Dot(forward, normalize(target - position)); 0 если вектор вырожден.
    pub fn facing_dot(&self, target: Vec3) -> f32 {
        facing_dot(self.forward, self.position, target)
    }
}

/// Normalized direction from → to (Vec3::ZERO если точки совпадают).
pub fn direction_to(from: Vec3, to: Vec3) -> Vec3 {
    (to - from).normalize_or_zero()
}

/// Dot product forward-вектора с направлением на цель.
///
/// Zero-length forward или совпадающие позиции → 0.0 (нейтрально).
pub fn facing_dot(forward: Vec3, from: Vec3, to: Vec3) -> f32 {
    let forward = forward.normalize_or_zero();
    let to_target = direction_to(from, to);

    if forward == Vec3::ZERO || to_target == Vec3::ZERO {
        return 0.0;
    }

    forward.dot(to_target)
}

/// Cone check: угол между forward и направлением на цель ≤ `tolerance_deg`.
pub fn is_facing(pose: &ActorPose, target: Vec3, tolerance_deg: f32) -> bool {
    let to_target = direction_to(pose.position, target);
    if pose.forward == Vec3::ZERO || to_target == Vec3::ZERO {
        return false;
    }

    pose.forward.dot(to_target) >= tolerance_deg.clamp(0.0, 180.0).to_radians().cos()
}

/// Signed yaw angle from `a` to `b` in degrees (XZ plane).
///
/// Positive = `b` справа от `a`, negative = слева. Range [-180, 180].
pub fn signed_angle_between(a: Vec3, b: Vec3) -> f32 {
    let a = Vec3::new(a.x, 0.0, a.z).normalize_or_zero();
    let b = Vec3::new(b.x, 0.0, b.z).normalize_or_zero();

    if a == Vec3::ZERO || b == Vec3::ZERO {
        return 0.0;
    }

    // cross(a, b).y < 0 когда b по часовой (вправо) при взгляде сверху
    let cross_y = a.cross(b).y;
    (-cross_y).atan2(a.dot(b)).to_degrees()
}

/// Distance на плоскости земли (XZ), altitude игнорируется.
pub fn distance_2d(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x, a.z).distance(Vec2::new(b.x, b.z))
}

/// Movement input (x = strafe right, y = forward) в направление атаки.
///
/// Input поворачивается control yaw (radians) в world space, затем
/// классифицируется относительно корпуса актёра:
/// - длина < dead zone → Omni
/// - dot(forward) > threshold → Forward, < -threshold → Backward
/// - иначе dot(right) > threshold → Right, < -threshold → Left
pub fn attack_direction_from_input(
    move_input: Vec2,
    control_yaw: f32,
    pose: &ActorPose,
    config: &CombatConfig,
) -> ActionDirection {
    if move_input.length() < config.direction_dead_zone {
        return ActionDirection::Omni;
    }

    let local = Vec3::new(move_input.x, 0.0, -move_input.y);
    let world = (Quat::from_rotation_y(control_yaw) * local).normalize_or_zero();

    let forward_dot = world.dot(pose.forward);
    let right_dot = world.dot(pose.right);

    if forward_dot > config.direction_threshold {
        ActionDirection::Forward
    } else if forward_dot < -config.direction_threshold {
        ActionDirection::Backward
    } else if right_dot > config.direction_threshold {
        ActionDirection::Right
    } else if right_dot < -config.direction_threshold {
        ActionDirection::Left
    } else {
        ActionDirection::Omni
    }
}

/// С какой стороны актёра пришло попадание (world-space точка удара).
///
/// Доминирующая ось побеждает: |dot(forward)| >= |dot(right)| → Forward/Backward,
/// иначе Right/Left. Точка в позиции актёра → Omni.
pub fn hit_direction_from_point(pose: &ActorPose, point: Vec3) -> ActionDirection {
    let to_hit = direction_to(pose.position, point);
    if to_hit == Vec3::ZERO {
        return ActionDirection::Omni;
    }

    let forward_dot = pose.forward.dot(to_hit);
    let right_dot = pose.right.dot(to_hit);

    if forward_dot.abs() >= right_dot.abs() {
        if forward_dot >= 0.0 {
            ActionDirection::Forward
        } else {
            ActionDirection::Backward
        }
    } else if right_dot >= 0.0 {
        ActionDirection::Right
    } else {
        ActionDirection::Left
    }
}
