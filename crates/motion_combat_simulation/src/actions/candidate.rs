//! Action candidates: attack and defense entries with scoring metadata.
//!
//! Строки таблицы действий. Загружаются пачкой при активации set'а,
//! не меняются пока set активен, заменяются целиком.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::reaction::HitSeverity;
use super::tags::TagSet;

/// Valid direction of use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActionDirection {
    Forward,
    Backward,
    Left,
    Right,
    #[default]
    Omni,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttackType {
    #[default]
    Light,
    Heavy,
    Special,
}

/// Intent защиты: обычный блок или рискованный parry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DefenseIntent {
    #[default]
    Defense,
    Parry,
}

/// Effective distance [min, max] in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DistanceRange {
    pub min: f32,
    pub max: f32,
}

impl DistanceRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn midpoint(&self) -> f32 {
        (self.min + self.max) * 0.5
    }

    /// Half-width; отрицательна для перевёрнутого диапазона.
    pub fn half_extent(&self) -> f32 {
        (self.max - self.min) * 0.5
    }
}

/// Blend in/out hints (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendTiming {
    pub blend_in: f32,
    pub blend_out: f32,
}

impl Default for BlendTiming {
    fn default() -> Self {
        Self {
            blend_in: 0.2,
            blend_out: 0.2,
        }
    }
}

impl BlendTiming {
    pub fn new(blend_in: f32, blend_out: f32) -> Self {
        Self { blend_in, blend_out }
    }

    /// Отрицательные и NaN хинты → 0.
    pub fn clamped(self) -> Self {
        Self {
            blend_in: self.blend_in.max(0.0),
            blend_out: self.blend_out.max(0.0),
        }
    }

    /// Ограничить оба значения сверху (combo chaining).
    pub fn capped(self, cap: f32) -> Self {
        let clamped = self.clamped();
        Self {
            blend_in: clamped.blend_in.min(cap),
            blend_out: clamped.blend_out.min(cap),
        }
    }
}

/// Opaque reference на проигрываемый ресурс (clip/montage id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaybackRef(pub String);

impl PlaybackRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PlaybackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hitbox/damage metadata. Коллизии и урон: на стороне hit-detection collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitboxSpec {
    /// Сокет/кость, к которой крепится sweep
    pub socket: String,
    pub radius: f32,
    pub damage: f32,
    pub knockback: f32,
}

impl Default for HitboxSpec {
    fn default() -> Self {
        Self {
            socket: "weapon".to_string(),
            radius: 20.0,
            damage: 10.0,
            knockback: 0.0,
        }
    }
}

bitflags! {
    /// Situational state bits (required/excluded preferences атак).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SituationFlags: u16 {
        const GROUNDED   = 1 << 0;
        const IN_AIR     = 1 << 1;
        const CROUCHING  = 1 << 2;
        const RUNNING    = 1 << 3;
        const COUNTERING = 1 << 4;
        const PARRYING   = 1 << 5;
        const RIPOSTING  = 1 << 6;
        const FINISHING  = 1 << 7;
        const BLOCKING   = 1 << 8;
    }
}

/// Общий интерфейс кандидата для chooser'а.
pub trait ActionCandidate: Clone + Send + Sync + 'static {
    /// AttackType для атак, DefenseIntent для защиты
    type Intent: Copy + PartialEq + fmt::Debug + Send + Sync + 'static;

    fn name(&self) -> &str;
    fn category(&self) -> &str;
    fn intent(&self) -> Self::Intent;
    fn playback(&self) -> &PlaybackRef;
    fn section(&self) -> Option<&str>;
    fn selection_weight(&self) -> f32;
    fn direction(&self) -> ActionDirection;
    fn distance(&self) -> DistanceRange;
    fn required_tags(&self) -> &TagSet;
    fn excluded_tags(&self) -> &TagSet;
    fn blend(&self) -> BlendTiming;
}

fn default_selection_weight() -> f32 {
    1.0
}

// ============================================================================
// AttackEntry
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackEntry {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub attack_type: AttackType,
    #[serde(default)]
    pub playback: PlaybackRef,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default = "default_selection_weight")]
    pub selection_weight: f32,
    #[serde(default)]
    pub direction: ActionDirection,
    #[serde(default)]
    pub distance: DistanceRange,
    #[serde(default)]
    pub required_tags: TagSet,
    #[serde(default)]
    pub excluded_tags: TagSet,
    #[serde(default)]
    pub blend: BlendTiming,
    /// Follow-up names для combo window (порядок сохраняется)
    #[serde(default)]
    pub allowed_next: Vec<String>,
    #[serde(default)]
    pub hitbox: HitboxSpec,
    /// Тяжесть попадания для hit reaction defender'а
    #[serde(default)]
    pub severity: HitSeverity,
    #[serde(default)]
    pub required_situation: SituationFlags,
    #[serde(default)]
    pub excluded_situation: SituationFlags,
}

impl AttackEntry {
    pub fn new(name: impl Into<String>, attack_type: AttackType) -> Self {
        let name = name.into();
        Self {
            playback: PlaybackRef::new(name.clone()),
            name,
            category: String::new(),
            attack_type,
            section: None,
            selection_weight: 1.0,
            direction: ActionDirection::Omni,
            distance: DistanceRange::default(),
            required_tags: TagSet::new(),
            excluded_tags: TagSet::new(),
            blend: BlendTiming::default(),
            allowed_next: Vec::new(),
            hitbox: HitboxSpec::default(),
            severity: HitSeverity::default(),
            required_situation: SituationFlags::empty(),
            excluded_situation: SituationFlags::empty(),
        }
    }

    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.distance = DistanceRange::new(min, max);
        self
    }

    pub fn with_direction(mut self, direction: ActionDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_follow_ups<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.allowed_next = names.iter().map(|n| n.as_ref().to_string()).collect();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_blend(mut self, blend_in: f32, blend_out: f32) -> Self {
        self.blend = BlendTiming::new(blend_in, blend_out);
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.selection_weight = weight;
        self
    }

    pub fn with_severity(mut self, severity: HitSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_situation(mut self, required: SituationFlags, excluded: SituationFlags) -> Self {
        self.required_situation = required;
        self.excluded_situation = excluded;
        self
    }

    pub fn with_tags(mut self, required: TagSet, excluded: TagSet) -> Self {
        self.required_tags = required;
        self.excluded_tags = excluded;
        self
    }
}

impl ActionCandidate for AttackEntry {
    type Intent = AttackType;

    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn intent(&self) -> AttackType {
        self.attack_type
    }

    fn playback(&self) -> &PlaybackRef {
        &self.playback
    }

    fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    fn selection_weight(&self) -> f32 {
        self.selection_weight
    }

    fn direction(&self) -> ActionDirection {
        self.direction
    }

    fn distance(&self) -> DistanceRange {
        self.distance
    }

    fn required_tags(&self) -> &TagSet {
        &self.required_tags
    }

    fn excluded_tags(&self) -> &TagSet {
        &self.excluded_tags
    }

    fn blend(&self) -> BlendTiming {
        self.blend
    }
}

// ============================================================================
// DefenseEntry
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefenseEntry {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub intent: DefenseIntent,
    #[serde(default)]
    pub playback: PlaybackRef,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default = "default_selection_weight")]
    pub selection_weight: f32,
    #[serde(default)]
    pub direction: ActionDirection,
    #[serde(default)]
    pub distance: DistanceRange,
    #[serde(default)]
    pub required_tags: TagSet,
    #[serde(default)]
    pub excluded_tags: TagSet,
    #[serde(default)]
    pub blend: BlendTiming,
}

impl DefenseEntry {
    pub fn new(name: impl Into<String>, intent: DefenseIntent) -> Self {
        let name = name.into();
        Self {
            playback: PlaybackRef::new(name.clone()),
            name,
            category: String::new(),
            intent,
            section: None,
            selection_weight: 1.0,
            direction: ActionDirection::Omni,
            distance: DistanceRange::default(),
            required_tags: TagSet::new(),
            excluded_tags: TagSet::new(),
            blend: BlendTiming::default(),
        }
    }

    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.distance = DistanceRange::new(min, max);
        self
    }

    pub fn with_direction(mut self, direction: ActionDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_tags(mut self, required: TagSet, excluded: TagSet) -> Self {
        self.required_tags = required;
        self.excluded_tags = excluded;
        self
    }
}

impl ActionCandidate for DefenseEntry {
    type Intent = DefenseIntent;

    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn intent(&self) -> DefenseIntent {
        self.intent
    }

    fn playback(&self) -> &PlaybackRef {
        &self.playback
    }

    fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    fn selection_weight(&self) -> f32 {
        self.selection_weight
    }

    fn direction(&self) -> ActionDirection {
        self.direction
    }

    fn distance(&self) -> DistanceRange {
        self.distance
    }

    fn required_tags(&self) -> &TagSet {
        &self.required_tags
    }

    fn excluded_tags(&self) -> &TagSet {
        &self.excluded_tags
    }

    fn blend(&self) -> BlendTiming {
        self.blend
    }
}
