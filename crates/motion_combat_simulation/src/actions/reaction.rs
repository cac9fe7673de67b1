//! Hit reaction rows + hierarchical lookup.
//!
//! Таблица реакций defender'а на попадание. Поиск идёт от самого
//! специфичного правила к самому общему:
//! 1. Exact bone (строка с `target_bone` == кость попадания)
//! 2. Body region (кость → регион, строка с тем же `target_region`)
//! 3. Direction (generic строка с тем же направлением)
//! 4. Severity only (generic строка с `Omni` направлением)
//!
//! Severity должна совпасть на каждом уровне. Внутри уровня выигрывает
//! первая подходящая строка (порядок таблицы = приоритет).

use serde::{Deserialize, Serialize};

use super::candidate::{ActionDirection, PlaybackRef};

/// Тяжесть попадания (берётся из атаки).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HitSeverity {
    #[default]
    Light,
    Medium,
    Heavy,
    Knockback,
    Knockdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyRegion {
    Head,
    Torso,
    ArmLeft,
    ArmRight,
    LegLeft,
    LegRight,
}

impl BodyRegion {
    /// Кость скелета → регион (case-insensitive substring match).
    ///
    /// Неизвестная кость → None (region уровень пропускается).
    pub fn from_bone(bone: &str) -> Option<BodyRegion> {
        const RULES: &[(&[&str], BodyRegion)] = &[
            (&["head", "neck"], BodyRegion::Head),
            (&["spine", "pelvis", "root"], BodyRegion::Torso),
            (
                &["upperarm_l", "lowerarm_l", "hand_l", "shoulder_l"],
                BodyRegion::ArmLeft,
            ),
            (
                &["upperarm_r", "lowerarm_r", "hand_r", "shoulder_r"],
                BodyRegion::ArmRight,
            ),
            (&["thigh_l", "calf_l", "foot_l", "ball_l"], BodyRegion::LegLeft),
            (&["thigh_r", "calf_r", "foot_r", "ball_r"], BodyRegion::LegRight),
        ];

        let bone = bone.to_lowercase();
        RULES
            .iter()
            .find(|(needles, _)| needles.iter().any(|needle| bone.contains(needle)))
            .map(|(_, region)| *region)
    }
}

fn default_play_rate() -> f32 {
    1.0
}

fn default_reaction_blend() -> f32 {
    0.1
}

/// Строка таблицы реакций.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitReactionEntry {
    pub name: String,
    #[serde(default)]
    pub severity: HitSeverity,
    /// `Omni` = подходит любому направлению
    #[serde(default)]
    pub direction: ActionDirection,
    #[serde(default)]
    pub target_bone: Option<String>,
    #[serde(default)]
    pub target_region: Option<BodyRegion>,
    #[serde(default)]
    pub playback: PlaybackRef,
    #[serde(default = "default_play_rate")]
    pub play_rate: f32,
    #[serde(default = "default_reaction_blend")]
    pub blend_in: f32,
}

impl HitReactionEntry {
    pub fn new(name: impl Into<String>, severity: HitSeverity) -> Self {
        let name = name.into();
        Self {
            playback: PlaybackRef::new(name.clone()),
            name,
            severity,
            direction: ActionDirection::Omni,
            target_bone: None,
            target_region: None,
            play_rate: default_play_rate(),
            blend_in: default_reaction_blend(),
        }
    }

    pub fn with_direction(mut self, direction: ActionDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_bone(mut self, bone: impl Into<String>) -> Self {
        self.target_bone = Some(bone.into());
        self
    }

    pub fn with_region(mut self, region: BodyRegion) -> Self {
        self.target_region = Some(region);
        self
    }

    pub fn with_play_rate(mut self, play_rate: f32) -> Self {
        self.play_rate = play_rate;
        self
    }

    /// Строка без bone/region: участвует только в direction/severity уровнях.
    pub fn is_generic(&self) -> bool {
        self.target_bone.is_none() && self.target_region.is_none()
    }

    /// Неположительный или NaN rate → 1.0.
    pub fn effective_play_rate(&self) -> f32 {
        if self.play_rate.is_finite() && self.play_rate > 0.0 {
            self.play_rate
        } else {
            1.0
        }
    }
}

/// Каким уровнем иерархии найдена реакция.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionMatch {
    ExactBone,
    Region,
    Direction,
    SeverityOnly,
}

/// Hierarchical lookup (см. module docs). Пустой `bone` = кость неизвестна.
pub fn find_reaction<'a>(
    rows: &'a [HitReactionEntry],
    bone: Option<&str>,
    direction: ActionDirection,
    severity: HitSeverity,
) -> Option<(&'a HitReactionEntry, ReactionMatch)> {
    let bone = bone.filter(|bone| !bone.is_empty());
    let mut same_severity = rows.iter().filter(move |row| row.severity == severity);

    if let Some(bone) = bone {
        if let Some(row) = same_severity
            .clone()
            .find(|row| row.target_bone.as_deref() == Some(bone))
        {
            return Some((row, ReactionMatch::ExactBone));
        }
    }

    if let Some(region) = bone.and_then(BodyRegion::from_bone) {
        if let Some(row) = same_severity
            .clone()
            .find(|row| row.target_region == Some(region))
        {
            return Some((row, ReactionMatch::Region));
        }
    }

    if direction != ActionDirection::Omni {
        if let Some(row) = same_severity
            .clone()
            .find(|row| row.is_generic() && row.direction == direction)
        {
            return Some((row, ReactionMatch::Direction));
        }
    }

    same_severity
        .find(|row| row.is_generic() && row.direction == ActionDirection::Omni)
        .map(|row| (row, ReactionMatch::SeverityOnly))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reaction_table() -> Vec<HitReactionEntry> {
        vec![
            HitReactionEntry::new("Light_Any", HitSeverity::Light),
            HitReactionEntry::new("Light_Front", HitSeverity::Light)
                .with_direction(ActionDirection::Forward),
            HitReactionEntry::new("Light_Back", HitSeverity::Light)
                .with_direction(ActionDirection::Backward),
            HitReactionEntry::new("Light_Head", HitSeverity::Light).with_region(BodyRegion::Head),
            HitReactionEntry::new("Light_Hand_R", HitSeverity::Light).with_bone("hand_r"),
            HitReactionEntry::new("Heavy_Any", HitSeverity::Heavy),
        ]
    }

    fn lookup(bone: Option<&str>, direction: ActionDirection, severity: HitSeverity) -> Option<(String, ReactionMatch)> {
        let rows = reaction_table();
        find_reaction(&rows, bone, direction, severity).map(|(row, tier)| (row.name.clone(), tier))
    }

    #[test]
    fn test_bone_to_region() {
        assert_eq!(BodyRegion::from_bone("Head"), Some(BodyRegion::Head));
        assert_eq!(BodyRegion::from_bone("neck_01"), Some(BodyRegion::Head));
        assert_eq!(BodyRegion::from_bone("spine_03"), Some(BodyRegion::Torso));
        assert_eq!(BodyRegion::from_bone("LowerArm_L"), Some(BodyRegion::ArmLeft));
        assert_eq!(BodyRegion::from_bone("hand_r"), Some(BodyRegion::ArmRight));
        assert_eq!(BodyRegion::from_bone("calf_l"), Some(BodyRegion::LegLeft));
        assert_eq!(BodyRegion::from_bone("ball_r"), Some(BodyRegion::LegRight));
        assert_eq!(BodyRegion::from_bone("weapon"), None);
    }

    #[test]
    fn test_exact_bone_beats_region() {
        assert_eq!(
            lookup(Some("hand_r"), ActionDirection::Forward, HitSeverity::Light),
            Some(("Light_Hand_R".to_string(), ReactionMatch::ExactBone))
        );
    }

    #[test]
    fn test_region_ignores_direction() {
        assert_eq!(
            lookup(Some("neck_01"), ActionDirection::Backward, HitSeverity::Light),
            Some(("Light_Head".to_string(), ReactionMatch::Region))
        );
    }

    #[test]
    fn test_direction_then_severity_fallback() {
        // Кость без региона: сразу direction уровень
        assert_eq!(
            lookup(Some("weapon"), ActionDirection::Backward, HitSeverity::Light),
            Some(("Light_Back".to_string(), ReactionMatch::Direction))
        );
        // Нет строки для Left → generic Omni строка
        assert_eq!(
            lookup(None, ActionDirection::Left, HitSeverity::Light),
            Some(("Light_Any".to_string(), ReactionMatch::SeverityOnly))
        );
        // Направление неизвестно → только severity
        assert_eq!(
            lookup(None, ActionDirection::Omni, HitSeverity::Light),
            Some(("Light_Any".to_string(), ReactionMatch::SeverityOnly))
        );
    }

    #[test]
    fn test_severity_must_match_on_every_tier() {
        // Heavy по руке: bone/region строки только Light
        assert_eq!(
            lookup(Some("hand_r"), ActionDirection::Forward, HitSeverity::Heavy),
            Some(("Heavy_Any".to_string(), ReactionMatch::SeverityOnly))
        );
        assert_eq!(lookup(None, ActionDirection::Forward, HitSeverity::Knockdown), None);
    }

    #[test]
    fn test_first_row_wins_within_tier() {
        let rows = vec![
            HitReactionEntry::new("Torso_A", HitSeverity::Light).with_region(BodyRegion::Torso),
            HitReactionEntry::new("Torso_B", HitSeverity::Light).with_region(BodyRegion::Torso),
        ];
        let (row, tier) = find_reaction(&rows, Some("spine_01"), ActionDirection::Omni, HitSeverity::Light)
            .expect("region row");
        assert_eq!(row.name, "Torso_A");
        assert_eq!(tier, ReactionMatch::Region);
    }

    #[test]
    fn test_empty_bone_treated_as_unknown() {
        let rows = vec![HitReactionEntry::new("Odd", HitSeverity::Light).with_bone("")];
        assert!(find_reaction(&rows, Some(""), ActionDirection::Omni, HitSeverity::Light).is_none());
    }

    #[test]
    fn test_reaction_row_json_defaults() {
        let row: HitReactionEntry =
            serde_json::from_str(r#"{ "name": "Stagger", "severity": "Heavy", "target_region": "Torso" }"#)
                .expect("valid row");
        assert_eq!(row.direction, ActionDirection::Omni);
        assert_eq!(row.play_rate, 1.0);
        assert_eq!(row.target_region, Some(BodyRegion::Torso));
        assert_eq!(row.playback, PlaybackRef::default());
        assert!(!row.is_generic());
    }

    #[test]
    fn test_effective_play_rate_guards_bad_values() {
        let row = HitReactionEntry::new("Flinch", HitSeverity::Light);
        assert_eq!(row.clone().with_play_rate(1.5).effective_play_rate(), 1.5);
        assert_eq!(row.clone().with_play_rate(0.0).effective_play_rate(), 1.0);
        assert_eq!(row.with_play_rate(f32::NAN).effective_play_rate(), 1.0);
    }
}
