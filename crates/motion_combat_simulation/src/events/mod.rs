//! Combat events: scope-owned pub/sub bus.

pub mod bus;

pub use bus::{
    AttackStarted, Channel, CombatEventBus, DefenseSucceeded, HitLanded, ParrySucceeded,
    ParryWindowOpened, SubscriptionId,
};
