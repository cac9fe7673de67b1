//! Action data: candidates, tags, stores, table sources, action sets, hit reactions.

pub mod candidate;
pub mod reaction;
pub mod set;
pub mod source;
pub mod store;
pub mod tags;

pub use candidate::{
    ActionCandidate, ActionDirection, AttackEntry, AttackType, BlendTiming, DefenseEntry,
    DefenseIntent, DistanceRange, HitboxSpec, PlaybackRef, SituationFlags,
};
pub use reaction::{find_reaction, BodyRegion, HitReactionEntry, HitSeverity, ReactionMatch};
pub use set::{ActionSet, ActionSetLibrary, ActivationError, ActiveSet};
pub use source::{ActionTableSource, InMemoryTable, JsonTable, TableError};
pub use store::CandidateStore;
pub use tags::{GameplayTag, TagSet};
