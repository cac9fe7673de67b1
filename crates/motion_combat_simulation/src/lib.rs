//! Motion Combat Simulation Core
//!
//! Contextual melee action selection на Bevy 0.16.
//!
//! Поток одного решения:
//! ActionSet (таблица кандидатов) → Chooser (eligibility → scoring → argmax)
//! → CombatCore/CombatDefense (playback, windows, combo gate, parry/block).
//!
//! HOST-DRIVEN ARCHITECTURE:
//! - ECS = решения (выбор действий, окна, combo, defense state)
//! - Хост = анимация, коллизии, transforms (через collaborator traits)

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod actions;
pub mod chooser;
pub mod collaborators;
pub mod combat;
pub mod config;
pub mod events;
pub mod logger;
pub mod spatial;
pub mod windows;

// Re-export основных типов для удобства
pub use actions::{
    ActionCandidate, ActionDirection, ActionSet, AttackEntry, AttackType, DefenseEntry,
    DefenseIntent, GameplayTag, HitReactionEntry, HitSeverity, TagSet,
};
pub use chooser::{Chooser, ChooserJitter, ChooserKind, FixedJitter, SituationContext};
pub use combat::{CombatCore, CombatDefense, CombatEnv, CombatHitReaction, CombatPlugin};
pub use config::{CombatConfig, ScoringConfig};
pub use events::CombatEventBus;
pub use logger::{init_logger, log, log_error, log_info, log_verbose, log_warning};

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            .add_plugins(CombatPlugin);
    }
}

/// Детерминистичный RNG (seeded), источник jitter'а в `ChooserJitter::Seeded`
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Jitter выбора seeded: одинаковый seed → одинаковые решения.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(ChooserJitter::seeded(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}
