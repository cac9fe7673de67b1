//! Selector: Filter → Score → argmax (strict `>`), debug records per call.

use crate::actions::ActionCandidate;

use super::context::ChoiceContext;
use super::eligibility::EligibilityFilter;
use super::jitter::JitterSource;
use super::pool::ChooserKind;
use super::scoring::{ScoreBreakdown, ScoringStrategy};

/// Score breakdown одного оценённого кандидата.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugScoreRecord {
    pub name: String,
    pub breakdown: ScoreBreakdown,
    pub chosen: bool,
}

/// Chooser: eligibility + scoring стратегии одного action set'а.
///
/// Между вызовами хранит только debug records последнего вызова.
pub struct Chooser<C: ActionCandidate> {
    kind: ChooserKind,
    eligibility: Box<dyn EligibilityFilter<C>>,
    scoring: Box<dyn ScoringStrategy<C>>,
    debug: Vec<DebugScoreRecord>,
}

impl<C: ActionCandidate> Chooser<C> {
    pub fn new(
        kind: ChooserKind,
        eligibility: impl EligibilityFilter<C> + 'static,
        scoring: impl ScoringStrategy<C> + 'static,
    ) -> Self {
        Self {
            kind,
            eligibility: Box::new(eligibility),
            scoring: Box::new(scoring),
            debug: Vec::new(),
        }
    }

    pub fn kind(&self) -> ChooserKind {
        self.kind
    }

    /// Лучший кандидат или None (пусто / всё отфильтровано / все на floor).
    ///
    /// Порядок итерации = tie-break: при равных total побеждает более ранний.
    pub fn choose_best<'a, I>(
        &mut self,
        candidates: I,
        ctx: &ChoiceContext<'_, C::Intent>,
        jitter: &mut dyn JitterSource,
    ) -> Option<&'a C>
    where
        I: IntoIterator<Item = &'a C>,
    {
        self.debug.clear();

        let mut best: Option<(usize, &'a C, f32)> = None;

        for candidate in candidates {
            if !self.eligibility.is_eligible(candidate, ctx) {
                continue;
            }

            let breakdown = self.scoring.score(candidate, ctx, jitter);
            let record_index = self.debug.len();
            self.debug.push(DebugScoreRecord {
                name: candidate.name().to_string(),
                breakdown,
                chosen: false,
            });

            // Floor и нечисловые total не выбираются никогда
            if breakdown.is_floor() || !breakdown.total.is_finite() {
                continue;
            }

            let beats_best = best.is_none_or(|(_, _, best_total)| breakdown.total > best_total);
            if beats_best {
                best = Some((record_index, candidate, breakdown.total));
            }
        }

        let (record_index, chosen, _) = best?;
        if let Some(record) = self.debug.get_mut(record_index) {
            record.chosen = true;
        }
        Some(chosen)
    }

    pub fn debug_records(&self) -> &[DebugScoreRecord] {
        &self.debug
    }

    /// Reset на checkout из пула.
    pub fn reset(&mut self) {
        self.debug.clear();
    }
}

impl<C: ActionCandidate> std::fmt::Debug for Chooser<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chooser")
            .field("kind", &self.kind)
            .field("debug_records", &self.debug.len())
            .finish()
    }
}
