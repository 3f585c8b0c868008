use super::{LoopState, REFINE, SELECT};
use crate::agent::{Agent, Outcome, StepError, StepResult};
use crate::ctx::Ctx;
use crate::model::ScoredSolution;

/// Pick the highest-reward candidate.
///
/// Ties go to the candidate seen first. Selecting from an empty set is an
/// error rather than a sentinel.
pub fn select(candidates: &[ScoredSolution]) -> Result<ScoredSolution, StepError> {
    let mut best: Option<&ScoredSolution> = None;
    for candidate in candidates {
        match best {
            Some(b) if b.reward >= candidate.reward => {}
            _ => best = Some(candidate),
        }
    }
    best.cloned().ok_or(StepError::EmptySelection)
}

/// SELECT: records the current best, then either hands off to REFINE or
/// finishes the loop once the requested rounds are done.
#[derive(Debug, Default)]
pub struct SelectStep;

impl Agent<LoopState> for SelectStep {
    fn name(&self) -> &'static str {
        SELECT
    }

    fn run(&mut self, mut state: LoopState, ctx: &mut Ctx) -> StepResult<LoopState> {
        let best = select(&state.candidates)?;
        ctx.log(format!("select: best reward {}", best.reward));
        state.best = Some(best);

        if state.round < state.rounds {
            Ok((state, Outcome::Next(REFINE)))
        } else {
            Ok((state, Outcome::Done))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Problem, Reward, Solution};

    fn set(entries: &[(&str, i64)]) -> Vec<ScoredSolution> {
        entries
            .iter()
            .map(|(text, r)| ScoredSolution::new(Solution::new(*text), Reward::new(*r).unwrap()))
            .collect()
    }

    #[test]
    fn picks_maximum_reward() {
        let candidates = set(&[("a", 3), ("b", 7), ("c", 9), ("d", 2), ("e", 5)]);
        let best = select(&candidates).unwrap();
        assert_eq!(best.solution.text(), "c");
        assert_eq!(best.reward.get(), 9);
    }

    #[test]
    fn tie_goes_to_first_seen() {
        let candidates = set(&[("X", 8), ("Y", 8)]);
        assert_eq!(select(&candidates).unwrap().solution.text(), "X");
    }

    #[test]
    fn tie_after_lower_entries_still_first_seen() {
        let candidates = set(&[("low", 2), ("first", 9), ("mid", 4), ("second", 9)]);
        assert_eq!(select(&candidates).unwrap().solution.text(), "first");
    }

    #[test]
    fn empty_set_is_invalid_input() {
        let err = select(&[]).unwrap_err();
        assert!(matches!(err, StepError::EmptySelection));
    }

    #[test]
    fn single_candidate() {
        let candidates = set(&[("only", 1)]);
        assert_eq!(select(&candidates).unwrap().solution.text(), "only");
    }

    #[test]
    fn selection_is_idempotent() {
        let candidates = set(&[("a", 5), ("b", 10), ("c", 10)]);
        let first = select(&candidates).unwrap();
        let second = select(&candidates).unwrap();
        assert_eq!(first, second);
        assert_eq!(candidates.len(), 3);
    }

    #[test]
    fn duplicates_are_allowed() {
        let candidates = set(&[("same", 4), ("same", 6)]);
        assert_eq!(select(&candidates).unwrap().reward.get(), 6);
    }

    fn state_with(candidates: Vec<ScoredSolution>, round: usize, rounds: usize) -> LoopState {
        let mut state = LoopState::new(Problem::new("p"), Solution::new("bad"));
        state.candidates = candidates;
        state.round = round;
        state.rounds = rounds;
        state
    }

    #[test]
    fn step_hands_off_to_refine_while_rounds_remain() {
        let mut ctx = Ctx::new();
        let (state, outcome) = SelectStep
            .run(state_with(set(&[("a", 4)]), 0, 2), &mut ctx)
            .unwrap();
        assert_eq!(outcome, Outcome::Next(REFINE));
        assert_eq!(state.best.unwrap().solution.text(), "a");
    }

    #[test]
    fn step_finishes_when_rounds_done() {
        let mut ctx = Ctx::new();
        let (_, outcome) = SelectStep
            .run(state_with(set(&[("a", 4)]), 2, 2), &mut ctx)
            .unwrap();
        assert_eq!(outcome, Outcome::Done);
        assert_eq!(ctx.logs(), ["select: best reward 4"]);
    }

    #[test]
    fn step_fails_on_empty_candidates() {
        let mut ctx = Ctx::new();
        let err = SelectStep.run(state_with(vec![], 0, 0), &mut ctx).unwrap_err();
        assert!(matches!(err, StepError::EmptySelection));
    }
}
