use super::{Attempts, EVALUATE, LoopState, RetryPolicy};
use crate::agent::{Agent, Outcome, StepError, StepResult};
use crate::ctx::Ctx;
use crate::model::{CandidateSet, Problem, Reward, ScoredSolution, Solution};
use crate::tools::parse_integer;

/// Scores a solution on the 1-10 scale.
///
/// The service is non-deterministic: the same input may score differently
/// on each call.
#[derive(Debug, Clone)]
pub struct RewardEvaluator {
    max_tokens: u32,
}

impl RewardEvaluator {
    pub fn new() -> Self {
        Self { max_tokens: 1024 }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Anything but a lone integer in 1..=10 is an evaluation failure; no
    /// default score is ever substituted.
    pub fn evaluate(
        &self,
        ctx: &Ctx,
        problem: &Problem,
        solution: &Solution,
    ) -> Result<Reward, StepError> {
        let response = ctx
            .llm()
            .system(
                "Your job is to take the approach given to you and reason about how good it is \
                 at solving the problem provided. Your job is to be objective.",
            )
            .user(
                "Ensure your output is a single number from 1 to 10, 1 being the worst idea \
                 ever and 10 being phenomenal. Return only the rating, nothing else.",
            )
            .user(format!(
                "The problem is: {problem}\nThe solution is: {solution}"
            ))
            .max_tokens(self.max_tokens)
            .send()
            .map_err(StepError::Evaluation)?;

        let reward = parse_integer(&response)
            .and_then(Reward::new)
            .map_err(StepError::Evaluation)?;
        tracing::debug!(%reward, "scored solution");
        Ok(reward)
    }

    /// Score a batch, returned in input order.
    ///
    /// With `parallel` each call runs on its own scoped thread. Either way
    /// the first failure in input order is returned and nothing is scored
    /// partially.
    pub fn evaluate_all(
        &self,
        ctx: &Ctx,
        problem: &Problem,
        solutions: &[Solution],
        parallel: bool,
    ) -> Result<CandidateSet, StepError> {
        if !parallel {
            return solutions
                .iter()
                .map(|s| -> Result<ScoredSolution, StepError> {
                    Ok(ScoredSolution::new(s.clone(), self.evaluate(ctx, problem, s)?))
                })
                .collect();
        }

        std::thread::scope(|scope| {
            let handles: Vec<_> = solutions
                .iter()
                .map(|s| scope.spawn(move || self.evaluate(ctx, problem, s)))
                .collect();

            handles
                .into_iter()
                .zip(solutions)
                .map(|(handle, s)| -> Result<ScoredSolution, StepError> {
                    let reward = handle
                        .join()
                        .map_err(|_| StepError::other("evaluation thread panicked"))??;
                    Ok(ScoredSolution::new(s.clone(), reward))
                })
                .collect()
        })
    }
}

impl Default for RewardEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// EVALUATE: scores everything in `pending`, appends it to the running
/// candidate set and records it as one ledger round.
pub struct EvaluateStep {
    evaluator: RewardEvaluator,
    parallel: bool,
    attempts: Attempts,
}

impl EvaluateStep {
    pub fn new(evaluator: RewardEvaluator, parallel: bool, retry: RetryPolicy) -> Self {
        Self {
            evaluator,
            parallel,
            attempts: Attempts::new(retry),
        }
    }
}

impl Agent<LoopState> for EvaluateStep {
    fn name(&self) -> &'static str {
        EVALUATE
    }

    fn run(&mut self, mut state: LoopState, ctx: &mut Ctx) -> StepResult<LoopState> {
        let scored =
            self.evaluator
                .evaluate_all(ctx, &state.problem, &state.pending, self.parallel);
        let scored = match scored {
            Ok(scored) => scored,
            Err(err) => return self.attempts.on_error(EVALUATE, state, err),
        };
        self.attempts.reset();

        let rewards: Vec<String> = scored.iter().map(|c| c.reward.to_string()).collect();
        ctx.log(format!("evaluate: rewards [{}]", rewards.join(", ")));

        state.pending.clear();
        state.candidates.extend(scored.iter().cloned());
        if let Some(ledger) = state.ledger.as_mut() {
            ledger.record(scored);
        }
        Ok((state, Outcome::Continue))
    }
}
