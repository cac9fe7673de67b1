//! Window lifecycle: timeline markers → open/close timed windows.
//!
//! Маркеры приходят из внешнего timeline (анимация). Lifecycle:
//! - держит открытые окна агента по kind'у
//! - отбрасывает stale маркеры (token ≠ текущий bound playback)
//! - доставляет begin/end notifications подписчикам нужного kind'а
//!
//! Подписчики: данные (`WindowListener`), а не замыкания: владелец
//! lifecycle'а (CombatCore) сам диспатчит доставки в ComboGate,
//! hit detection и defense state.
//!
//! Один kind не вкладывается: новый begin того же kind'а заменяет открытое
//! окно (last-write-wins); end от заменённого маркера игнорируется.

use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::actions::{GameplayTag, HitboxSpec};
use crate::collaborators::PlaybackToken;


#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WindowKind {
    Hitbox,
    Combo,
    Parry,
    Defense,
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerEdge {
    Begin,
    End,
}

/// Identity маркера внутри одного playback'а.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(pub u32);

/// Kind-specific payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowPayload {
    /// Hitbox override (иначе hitbox текущей атаки)
    pub hitbox: Option<HitboxSpec>,
    /// Длительность окна (seconds), информативно
    pub duration: f32,
    pub tag: Option<GameplayTag>,
}

/// Inbound marker от timeline source.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineMarker {
    pub kind: WindowKind,
    pub edge: MarkerEdge,
    pub marker: MarkerId,
    pub token: PlaybackToken,
    pub payload: WindowPayload,
}

impl TimelineMarker {
    pub fn begin(kind: WindowKind, marker: u32, token: PlaybackToken) -> Self {
        Self {
            kind,
            edge: MarkerEdge::Begin,
            marker: MarkerId(marker),
            token,
            payload: WindowPayload::default(),
        }
    }

    pub fn end(kind: WindowKind, marker: u32, token: PlaybackToken) -> Self {
        Self {
            edge: MarkerEdge::End,
            ..Self::begin(kind, marker, token)
        }
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.payload.duration = duration;
        self
    }

    pub fn with_hitbox(mut self, hitbox: HitboxSpec) -> Self {
        self.payload.hitbox = Some(hitbox);
        self
    }
}

/// Открытое окно.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInstance {
    pub kind: WindowKind,
    pub owner: Entity,
    pub marker: MarkerId,
    pub token: PlaybackToken,
    pub payload: WindowPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowNotification {
    pub edge: MarkerEdge,
    pub window: WindowInstance,
    /// End сгенерирован принудительно (playback заменён / закончился)
    pub forced: bool,
}

impl WindowNotification {
    pub fn kind(&self) -> &WindowKind {
        &self.window.kind
    }

    pub fn is_begin(&self) -> bool {
        self.edge == MarkerEdge::Begin
    }
}

/// Кому доставить notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowListener {
    ComboGate,
    HitDetection,
    /// Defense state текущей цели владельца (parry windows атакующего)
    TargetDefense,
    /// Defense state самого владельца (block windows)
    OwnerDefense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowSubscriptionId(u64);

#[derive(Debug, Clone)]
struct WindowSubscription {
    id: WindowSubscriptionId,
    kind: WindowKind,
    listener: WindowListener,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowDelivery {
    pub listener: WindowListener,
    pub notification: WindowNotification,
}

/// Per-agent window state.
#[derive(Debug, Clone)]
pub struct WindowLifecycle {
    owner: Entity,
    bound: Option<PlaybackToken>,
    open: BTreeMap<WindowKind, WindowInstance>,
    subscriptions: Vec<WindowSubscription>,
    next_subscription: u64,
}

impl WindowLifecycle {
    pub fn new(owner: Entity) -> Self {
        Self {
            owner,
            bound: None,
            open: BTreeMap::new(),
            subscriptions: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn bound_token(&self) -> Option<PlaybackToken> {
        self.bound
    }

    pub fn is_open(&self, kind: &WindowKind) -> bool {
        self.open.contains_key(kind)
    }

    pub fn open_windows(&self) -> impl Iterator<Item = &WindowInstance> {
        self.open.values()
    }

    pub fn subscribe(&mut self, kind: WindowKind, listener: WindowListener) -> WindowSubscriptionId {
        self.next_subscription += 1;
        let id = WindowSubscriptionId(self.next_subscription);
        self.subscriptions.push(WindowSubscription { id, kind, listener });
        id
    }

    pub fn unsubscribe(&mut self, id: WindowSubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|subscription| subscription.id != id);
        self.subscriptions.len() != before
    }

    /// Teardown: подписки, открытые окна и binding очищаются без доставок.
    pub fn unbind_all(&mut self) {
        self.subscriptions.clear();
        self.open.clear();
        self.bound = None;
    }

    /// Привязать новый playback. Окна старого закрываются принудительно.
    pub fn bind_playback(&mut self, token: PlaybackToken) -> Vec<WindowDelivery> {
        self.bound = Some(token);
        self.close_all_forced()
    }

    /// Playback закончился: закрыть его окна, маркеры дальше stale.
    pub fn release_playback(&mut self, token: PlaybackToken) -> Vec<WindowDelivery> {
        if self.bound != Some(token) {
            return Vec::new();
        }
        self.bound = None;
        self.close_all_forced()
    }

    pub fn on_marker(&mut self, marker: &TimelineMarker) -> Vec<WindowDelivery> {
        if self.bound != Some(marker.token) {
            crate::logger::log_verbose(&format!(
                "[WindowLifecycle] {:?}: stale {:?} {:?} (token {:?}, bound {:?})",
                self.owner, marker.kind, marker.edge, marker.token, self.bound
            ));
            return Vec::new();
        }

        match marker.edge {
            MarkerEdge::Begin => self.on_window_begin(marker),
            MarkerEdge::End => self.on_window_end(marker),
        }
    }

    fn on_window_begin(&mut self, marker: &TimelineMarker) -> Vec<WindowDelivery> {
        let window = WindowInstance {
            kind: marker.kind.clone(),
            owner: self.owner,
            marker: marker.marker,
            token: marker.token,
            payload: marker.payload.clone(),
        };

        if let Some(replaced) = self.open.insert(window.kind.clone(), window.clone()) {
            crate::logger::log_verbose(&format!(
                "[WindowLifecycle] {:?}: {:?} marker {:?} replaced by {:?}",
                self.owner, replaced.kind, replaced.marker, window.marker
            ));
        }

        self.deliver(MarkerEdge::Begin, window, false)
    }

    fn on_window_end(&mut self, marker: &TimelineMarker) -> Vec<WindowDelivery> {
        let matches = self
            .open
            .get(&marker.kind)
            .is_some_and(|window| window.marker == marker.marker);

        if !matches {
            crate::logger::log_verbose(&format!(
                "[WindowLifecycle] {:?}: unmatched end {:?} marker {:?}",
                self.owner, marker.kind, marker.marker
            ));
            return Vec::new();
        }

        match self.open.remove(&marker.kind) {
            Some(window) => self.deliver(MarkerEdge::End, window, false),
            None => Vec::new(),
        }
    }

    fn close_all_forced(&mut self) -> Vec<WindowDelivery> {
        let closed = std::mem::take(&mut self.open);
        closed
            .into_values()
            .flat_map(|window| self.deliver(MarkerEdge::End, window, true))
            .collect()
    }

    fn deliver(&self, edge: MarkerEdge, window: WindowInstance, forced: bool) -> Vec<WindowDelivery> {
        self.subscriptions
            .iter()
            .filter(|subscription| subscription.kind == window.kind)
            .map(|subscription| WindowDelivery {
                listener: subscription.listener,
                notification: WindowNotification {
                    edge,
                    window: window.clone(),
                    forced,
                },
            })
            .collect()
    }
}
