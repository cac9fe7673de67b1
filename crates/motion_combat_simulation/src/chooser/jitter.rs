//! Random jitter for scoring (tie-break + variety).

use bevy::prelude::*;
use rand::Rng;

use crate::DeterministicRng;

/// Источник jitter'а. Один sample на scoring call, в диапазоне [-amplitude, +amplitude].
pub trait JitterSource {
    fn sample(&mut self, amplitude: f32) -> f32;
}

/// Production jitter: thread-local RNG, без seed'а.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadJitter;

impl JitterSource for ThreadJitter {
    fn sample(&mut self, amplitude: f32) -> f32 {
        if !amplitude.is_finite() || amplitude <= 0.0 {
            return 0.0;
        }
        rand::thread_rng().gen_range(-amplitude..=amplitude)
    }
}

/// Seeded jitter (replays, детерминизм-тесты).
impl JitterSource for DeterministicRng {
    fn sample(&mut self, amplitude: f32) -> f32 {
        if !amplitude.is_finite() || amplitude <= 0.0 {
            return 0.0;
        }
        self.rng.gen_range(-amplitude..=amplitude)
    }
}

/// Константный jitter для тестов (clamp в допустимый диапазон).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedJitter(pub f32);

impl JitterSource for FixedJitter {
    fn sample(&mut self, amplitude: f32) -> f32 {
        if !amplitude.is_finite() || amplitude <= 0.0 {
            return 0.0;
        }
        self.0.clamp(-amplitude, amplitude)
    }
}

/// Jitter resource для `CombatPlugin`.
#[derive(Resource, Debug)]
pub enum ChooserJitter {
    Thread(ThreadJitter),
    Seeded(DeterministicRng),
}

impl Default for ChooserJitter {
    fn default() -> Self {
        ChooserJitter::Thread(ThreadJitter)
    }
}

impl ChooserJitter {
    pub fn seeded(seed: u64) -> Self {
        ChooserJitter::Seeded(DeterministicRng::new(seed))
    }
}

impl JitterSource for ChooserJitter {
    fn sample(&mut self, amplitude: f32) -> f32 {
        match self {
            ChooserJitter::Thread(jitter) => jitter.sample(amplitude),
            ChooserJitter::Seeded(rng) => rng.sample(amplitude),
        }
    }
}
