//! Chooser: contextual scoring + selection over action candidates.
//!
//! Поток одного решения:
//! SituationContext + ChoiceContext → EligibilityFilter → ScoringStrategy →
//! Chooser::choose_best (argmax, strict `>`) → кандидат + debug records.
//!
//! Стратегии подключаются через `ChooserKind` → `ChooserRegistry` при
//! активации action set'а; instances живут в per-agent `ChooserPool`.

pub mod context;
pub mod eligibility;
pub mod jitter;
pub mod pool;
pub mod scoring;
pub mod selector;


pub use context::{ChoiceContext, SituationContext};
pub use eligibility::{AllOf, AlwaysEligible, EligibilityFilter, MinStamina, PredicateFilter, TagEligibility};
pub use jitter::{ChooserJitter, FixedJitter, JitterSource, ThreadJitter};
pub use pool::{standard_attack, standard_defense, ChooserKind, ChooserPool, ChooserRegistry};
pub use scoring::{
    score_base_weight, score_distance, score_facing, score_intent, score_situation, score_tags,
    AttackScoring, DefenseScoring, ScoreBreakdown, ScoringStrategy,
};
pub use selector::{Chooser, DebugScoreRecord};
