use super::{Attempts, LoopState, REFINE, RetryPolicy};
use crate::agent::{Agent, Failure, Outcome, StepError, StepResult};
use crate::ctx::Ctx;
use crate::model::{Problem, Reward, Solution};
use crate::tools::strip_code_fences;

/// Asks the model for a higher-reward variant of a solution.
///
/// Improvement is best effort: only re-scoring tells whether the new
/// solution is actually better.
#[derive(Debug, Clone)]
pub struct IdeationRefiner {
    max_tokens: u32,
}

impl IdeationRefiner {
    pub fn new() -> Self {
        Self { max_tokens: 3000 }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn refine(
        &self,
        ctx: &Ctx,
        problem: &Problem,
        solution: &Solution,
        reward: Reward,
    ) -> Result<Solution, StepError> {
        let response = ctx
            .llm()
            .system(
                "You'll be given a problem, a solution, and the reward (scale of 1 - 10) telling \
                 you how good the current solution is. Be objective and, based on the current \
                 approach, tweak it to maximize reward. Your goal is a feasible solution and a \
                 new approach on how to solve the problem.",
            )
            .user(
                "Think of a better solution that would hypothetically maximize reward (max is \
                 10) and return only the new solution.",
            )
            .user(format!(
                "Problem: {problem}\nSolution: {solution}\nReward: {reward}"
            ))
            .max_tokens(self.max_tokens)
            .send()
            .map_err(StepError::Refinement)?;

        let text = strip_code_fences(&response);
        if text.is_empty() {
            return Err(StepError::Refinement(Failure::malformed(
                "refiner returned an empty solution",
            )));
        }
        Ok(Solution::new(text))
    }
}

impl Default for IdeationRefiner {
    fn default() -> Self {
        Self::new()
    }
}

/// REFINE: turns the current best into one new pending solution.
pub struct RefineStep {
    refiner: IdeationRefiner,
    attempts: Attempts,
}

impl RefineStep {
    pub fn new(refiner: IdeationRefiner, retry: RetryPolicy) -> Self {
        Self {
            refiner,
            attempts: Attempts::new(retry),
        }
    }
}

impl Agent<LoopState> for RefineStep {
    fn name(&self) -> &'static str {
        REFINE
    }

    fn run(&mut self, mut state: LoopState, ctx: &mut Ctx) -> StepResult<LoopState> {
        let Some(best) = state.best.as_ref() else {
            return Err(StepError::invalid("refine requires a selected best solution"));
        };

        let refined = self
            .refiner
            .refine(ctx, &state.problem, &best.solution, best.reward);
        match refined {
            Ok(solution) => {
                self.attempts.reset();
                state.round += 1;
                ctx.log(format!("refine: round {}", state.round));
                state.pending = vec![solution];
                Ok((state, Outcome::Continue))
            }
            Err(err) => self.attempts.on_error(REFINE, state, err),
        }
    }
}
