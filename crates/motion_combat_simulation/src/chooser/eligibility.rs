//! Eligibility filters: usable-at-all gate before scoring.
//!
//! Фильтр обязан быть pure функцией (candidate, context). Никакого скрытого
//! mutable state, повторные вызовы в одном selector pass дают тот же ответ.

use crate::actions::ActionCandidate;

use super::context::ChoiceContext;

pub trait EligibilityFilter<C: ActionCandidate>: Send + Sync {
    fn is_eligible(&self, candidate: &C, ctx: &ChoiceContext<'_, C::Intent>) -> bool;
}

/// Permissive default.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysEligible;

impl<C: ActionCandidate> EligibilityFilter<C> for AlwaysEligible {
    fn is_eligible(&self, _candidate: &C, _ctx: &ChoiceContext<'_, C::Intent>) -> bool {
        true
    }
}

/// Все required теги есть на self actor И ни одного excluded.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagEligibility;

impl<C: ActionCandidate> EligibilityFilter<C> for TagEligibility {
    fn is_eligible(&self, candidate: &C, ctx: &ChoiceContext<'_, C::Intent>) -> bool {
        ctx.self_tags.has_all(candidate.required_tags())
            && !ctx.self_tags.has_any(candidate.excluded_tags())
    }
}

/// Stamina percentage (0..=1) не ниже порога.
#[derive(Debug, Clone, Copy)]
pub struct MinStamina(pub f32);

impl<C: ActionCandidate> EligibilityFilter<C> for MinStamina {
    fn is_eligible(&self, _candidate: &C, ctx: &ChoiceContext<'_, C::Intent>) -> bool {
        ctx.situation.stamina_pct >= self.0
    }
}

/// Conjunction; пустой список → eligible.
pub struct AllOf<C: ActionCandidate> {
    filters: Vec<Box<dyn EligibilityFilter<C>>>,
}

impl<C: ActionCandidate> AllOf<C> {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    pub fn with(mut self, filter: impl EligibilityFilter<C> + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl<C: ActionCandidate> Default for AllOf<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ActionCandidate> EligibilityFilter<C> for AllOf<C> {
    fn is_eligible(&self, candidate: &C, ctx: &ChoiceContext<'_, C::Intent>) -> bool {
        self.filters.iter().all(|filter| filter.is_eligible(candidate, ctx))
    }
}

/// Designer predicate (замыкание).
pub struct PredicateFilter<F>(F);

impl<F> PredicateFilter<F> {
    pub fn new<C>(predicate: F) -> Self
    where
        C: ActionCandidate,
        F: Fn(&C, &ChoiceContext<'_, C::Intent>) -> bool + Send + Sync,
    {
        Self(predicate)
    }
}

impl<C, F> EligibilityFilter<C> for PredicateFilter<F>
where
    C: ActionCandidate,
    F: Fn(&C, &ChoiceContext<'_, C::Intent>) -> bool + Send + Sync,
{
    fn is_eligible(&self, candidate: &C, ctx: &ChoiceContext<'_, C::Intent>) -> bool {
        (self.0)(candidate, ctx)
    }
}
