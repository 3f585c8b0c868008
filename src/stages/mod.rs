//! The four stages of the refinement loop.
//!
//! Each stage exposes a typed operation that can be called on its own
//! ([`ApproachGenerator::generate`], [`RewardEvaluator::evaluate`],
//! [`IdeationRefiner::refine`], [`select`]) and a step wrapper implementing
//! [`Agent<LoopState>`](crate::Agent) so the stages can be wired into a
//! [`crate::Workflow`].

mod approach;
mod ideation;
mod reward;
mod select;

pub use approach::{ApproachGenerator, GenerateStep};
pub use ideation::{IdeationRefiner, RefineStep};
pub use reward::{EvaluateStep, RewardEvaluator};
pub use select::{SelectStep, select};

use std::time::Duration;

use crate::agent::{Outcome, StepError, StepResult};
use crate::model::{CandidateSet, Ledger, Problem, ScoredSolution, Solution};

pub const GENERATE: &str = "generate";
pub const EVALUATE: &str = "evaluate";
pub const SELECT: &str = "select";
pub const REFINE: &str = "refine";

/// Everything one run of the loop carries between steps.
#[derive(Debug, Clone)]
pub struct LoopState {
    pub problem: Problem,
    pub known_bad: Solution,
    /// Refinement rounds requested after the initial selection.
    pub rounds: usize,
    /// Refinement rounds completed so far.
    pub round: usize,
    /// Solutions produced but not yet scored.
    pub pending: Vec<Solution>,
    /// Every scored solution so far, in the order it was scored.
    pub candidates: CandidateSet,
    pub best: Option<ScoredSolution>,
    /// `None` when the caller opted out of keeping the audit trail.
    pub ledger: Option<Ledger>,
}

impl LoopState {
    pub fn new(problem: Problem, known_bad: Solution) -> Self {
        Self {
            problem,
            known_bad,
            rounds: 0,
            round: 0,
            pending: Vec::new(),
            candidates: Vec::new(),
            best: None,
            ledger: Some(Ledger::new()),
        }
    }
}

/// Bounded exponential backoff for transient service failures.
///
/// Malformed responses are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// No retries at all.
    pub const NONE: RetryPolicy = RetryPolicy {
        max_retries: 0,
        base_delay: Duration::ZERO,
    };

    pub fn new(max_retries: usize, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `attempt` (0-based): base * 2^attempt.
    pub fn delay(&self, attempt: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt as u32).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::NONE
    }
}

/// Per-step retry bookkeeping shared by the service-backed steps.
#[derive(Debug, Default)]
pub(crate) struct Attempts {
    policy: RetryPolicy,
    used: usize,
}

impl Attempts {
    pub(crate) fn new(policy: RetryPolicy) -> Self {
        Self { policy, used: 0 }
    }

    /// Turn a step failure into a `Wait` while retries remain, or give up.
    pub(crate) fn on_error<S>(&mut self, step: &str, state: S, err: StepError) -> StepResult<S> {
        if err.is_transient() && self.used < self.policy.max_retries {
            let delay = self.policy.delay(self.used);
            self.used += 1;
            tracing::warn!(step, attempt = self.used, ?delay, error = %err, "retrying after transient failure");
            return Ok((state, Outcome::Wait(delay)));
        }
        self.used = 0;
        Err(err)
    }

    pub(crate) fn reset(&mut self) {
        self.used = 0;
    }
}
