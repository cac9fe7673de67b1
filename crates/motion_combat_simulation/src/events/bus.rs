//! Scope-owned synchronous event bus.
//!
//! Один `CombatEventBus` на симуляцию (Bevy resource). Delivery inline во
//! время publish, FIFO в порядке подписки, без буферизации: кто не подписан
//! в момент publish: событие не увидит.

use bevy::prelude::*;

use crate::actions::AttackEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler<E> = Box<dyn FnMut(&E) + Send + Sync>;

/// Publish/subscribe канал одного типа события.
pub struct Channel<E> {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Handler<E>)>,
}

impl<E> Default for Channel<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }
}

impl<E> Channel<E> {
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&E) + Send + Sync + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    /// Синхронная доставка; возвращает число вызванных handler'ов.
    pub fn publish(&mut self, event: &E) -> usize {
        for (_, handler) in self.subscribers.iter_mut() {
            handler(event);
        }
        self.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}

impl<E> std::fmt::Debug for Channel<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AttackStarted {
    pub attacker: Entity,
    /// Ближайшая цель в радиусе `attack_target_range` (если есть)
    pub target: Option<Entity>,
    pub attack: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParryWindowOpened {
    pub attacker: Entity,
    pub duration: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParrySucceeded {
    pub defender: Entity,
    pub attacker: Entity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefenseSucceeded {
    pub defender: Entity,
    pub attacker: Option<Entity>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HitLanded {
    pub attacker: Entity,
    pub defender: Entity,
    pub attack: AttackEntry,
}

/// Шина одного combat scope'а (матч/уровень). Живёт и умирает с World.
#[derive(Resource, Debug, Default)]
pub struct CombatEventBus {
    pub attack_started: Channel<AttackStarted>,
    pub parry_window_opened: Channel<ParryWindowOpened>,
    pub parry_succeeded: Channel<ParrySucceeded>,
    pub defense_succeeded: Channel<DefenseSucceeded>,
    pub hit_landed: Channel<HitLanded>,
}

impl CombatEventBus {
    /// Lazy доступ: bus создаётся при первом обращении к scope'у.
    pub fn scope(world: &mut World) -> Mut<'_, CombatEventBus> {
        world.get_resource_or_insert_with(CombatEventBus::default)
    }

    pub fn clear(&mut self) {
        self.attack_started.clear();
        self.parry_window_opened.clear();
        self.parry_succeeded.clear();
        self.defense_succeeded.clear();
        self.hit_landed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_fifo_per_subscriber_and_unsubscribe() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let mut channel: Channel<u32> = Channel::default();

        let sink = received.clone();
        let first = channel.subscribe(move |value| sink.lock().unwrap().push(("first", *value)));
        let sink = received.clone();
        channel.subscribe(move |value| sink.lock().unwrap().push(("second", *value)));

        assert_eq!(channel.publish(&1), 2);
        assert_eq!(channel.publish(&2), 2);
        assert!(channel.unsubscribe(first));
        assert_eq!(channel.publish(&3), 1);

        let received = received.lock().unwrap();
        let first_only: Vec<u32> = received
            .iter()
            .filter(|(who, _)| *who == "first")
            .map(|(_, v)| *v)
            .collect();
        assert_eq!(first_only, vec![1, 2]);
        assert_eq!(received.len(), 5);
    }

    #[test]
    fn test_no_replay_for_late_subscribers() {
        let count = Arc::new(Mutex::new(0));
        let mut channel: Channel<&'static str> = Channel::default();

        channel.publish(&"early");
        let sink = count.clone();
        channel.subscribe(move |_| *sink.lock().unwrap() += 1);

        assert_eq!(*count.lock().unwrap(), 0);
        channel.publish(&"late");
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_bus_lazily_created_per_world() {
        let mut world = World::new();
        assert!(world.get_resource::<CombatEventBus>().is_none());

        CombatEventBus::scope(&mut world)
            .parry_succeeded
            .subscribe(|_| {});
        assert_eq!(
            world.resource::<CombatEventBus>().parry_succeeded.subscriber_count(),
            1
        );

        // Другой scope: своя шина
        let mut other = World::new();
        assert_eq!(CombatEventBus::scope(&mut other).parry_succeeded.subscriber_count(), 0);
    }
}
