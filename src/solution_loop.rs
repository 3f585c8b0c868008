use thiserror::Error;

use crate::agent::StepError;
use crate::config::Config;
use crate::ctx::Ctx;
use crate::model::{Ledger, Problem, ScoredSolution, Solution};
use crate::runner::Runner;
use crate::stages::{
    ApproachGenerator, EVALUATE, EvaluateStep, GENERATE, GenerateStep, IdeationRefiner, LoopState,
    REFINE, RefineStep, RetryPolicy, RewardEvaluator, SELECT, SelectStep,
};
use crate::workflow::{Workflow, WorkflowError};

/// What a finished run hands back.
#[derive(Debug, Clone)]
pub struct LoopReport {
    pub best: ScoredSolution,
    /// Empty when the loop was built with `keep_ledger(false)`.
    pub ledger: Ledger,
    pub rounds_completed: usize,
}

/// A run that stopped at a failing stage.
///
/// Whatever was already selected is kept in `best_so_far`; nothing is
/// invented to fill the gap.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {error}")]
pub struct LoopError {
    pub stage: &'static str,
    #[source]
    pub error: StepError,
    pub best_so_far: Option<ScoredSolution>,
    pub ledger: Ledger,
}

/// Drives GENERATE -> EVALUATE -> SELECT, then `rounds` times
/// REFINE -> EVALUATE -> SELECT.
///
/// ```rust,no_run
/// use solution_loop::{Ctx, Problem, Solution, SolutionLoop};
///
/// let mut ctx = Ctx::from_env().unwrap();
/// let report = SolutionLoop::new(
///     Problem::new("reduce battery drain"),
///     Solution::new("poll sensor every 1ms"),
/// )
/// .rounds(2)
/// .run(&mut ctx)
/// .unwrap();
/// println!("{} ({})", report.best.solution, report.best.reward);
/// ```
#[derive(Debug, Clone)]
pub struct SolutionLoop {
    problem: Problem,
    known_bad: Solution,
    count: usize,
    rounds: usize,
    keep_ledger: bool,
    parallel_evaluation: bool,
    retry: RetryPolicy,
    generator: ApproachGenerator,
    evaluator: RewardEvaluator,
    refiner: IdeationRefiner,
    trace: bool,
}

impl SolutionLoop {
    pub fn new(problem: Problem, known_bad: Solution) -> Self {
        Self {
            problem,
            known_bad,
            count: ApproachGenerator::DEFAULT_COUNT,
            rounds: 0,
            keep_ledger: true,
            parallel_evaluation: false,
            retry: RetryPolicy::NONE,
            generator: ApproachGenerator::new(),
            evaluator: RewardEvaluator::new(),
            refiner: IdeationRefiner::new(),
            trace: true,
        }
    }

    /// Candidate count and rounds taken from `config`.
    pub fn from_config(problem: Problem, known_bad: Solution, config: &Config) -> Self {
        Self::new(problem, known_bad)
            .count(config.candidates)
            .rounds(config.rounds)
    }

    /// Number of approaches to generate up front.
    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Refinement rounds after the first selection.
    pub fn rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn keep_ledger(mut self, keep: bool) -> Self {
        self.keep_ledger = keep;
        self
    }

    /// Score each batch on scoped threads instead of one call at a time.
    pub fn parallel_evaluation(mut self, parallel: bool) -> Self {
        self.parallel_evaluation = parallel;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn generator(mut self, generator: ApproachGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn evaluator(mut self, evaluator: RewardEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn refiner(mut self, refiner: IdeationRefiner) -> Self {
        self.refiner = refiner;
        self
    }

    /// Emit step/error `tracing` events from the runner (on by default).
    pub fn trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    fn workflow(&self) -> Result<Workflow<LoopState>, WorkflowError> {
        Workflow::builder("solution-loop")
            .register(GenerateStep::new(
                self.generator.clone(),
                self.count,
                self.retry,
            ))
            .register(EvaluateStep::new(
                self.evaluator.clone(),
                self.parallel_evaluation,
                self.retry,
            ))
            .register(SelectStep)
            .register(RefineStep::new(self.refiner.clone(), self.retry))
            .start_at(REFINE)
            .then(EVALUATE)
            .start_at(GENERATE)
            .then(EVALUATE)
            .then(SELECT)
            .build()
    }

    pub fn run(&self, ctx: &mut Ctx) -> Result<LoopReport, LoopError> {
        let mut state = LoopState::new(self.problem.clone(), self.known_bad.clone());
        state.rounds = self.rounds;
        if !self.keep_ledger {
            state.ledger = None;
        }

        let wf = self.workflow().map_err(|e| LoopError {
            stage: "init",
            error: StepError::other(e.to_string()),
            best_so_far: None,
            ledger: Ledger::new(),
        })?;

        let mut runner = Runner::new(wf).with_max_retries(self.retry.max_retries);
        if self.trace {
            runner = runner.with_tracing();
        }

        tracing::info!(
            count = self.count,
            rounds = self.rounds,
            parallel = self.parallel_evaluation,
            "starting solution loop"
        );

        match runner.run(state, ctx) {
            Ok(done) => {
                let best = done.best.ok_or_else(|| LoopError {
                    stage: SELECT,
                    error: StepError::other("loop finished without selecting a solution"),
                    best_so_far: None,
                    ledger: Ledger::new(),
                })?;
                tracing::info!(reward = %best.reward, rounds = done.round, "solution loop finished");
                Ok(LoopReport {
                    best,
                    ledger: done.ledger.unwrap_or_default(),
                    rounds_completed: done.round,
                })
            }
            Err(stopped) => {
                tracing::warn!(stage = stopped.step, error = %stopped.error, "solution loop aborted");
                Err(LoopError {
                    stage: stopped.step,
                    error: stopped.error,
                    best_so_far: stopped.last_state.best,
                    ledger: stopped.last_state.ledger.unwrap_or_default(),
                })
            }
        }
    }
}
