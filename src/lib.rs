//! Propose, score and refine LLM-generated solutions until the best one wins.
//!
//! Given a problem and one approach known not to work, the loop asks a
//! language model for several alternatives, scores each on a 1-10 reward
//! scale, keeps the highest scorer, and optionally spends a few rounds
//! refining it. Every stage is an [`Agent`] wired into a [`Workflow`] and
//! driven by the [`Runner`]; [`SolutionLoop`] puts the pieces together.
//!
//! # Quick start
//!
//! Selection is purely local, so it runs without a completion backend:
//!
//! ```rust
//! use solution_loop::{Reward, ScoredSolution, Solution, select};
//!
//! let candidates = vec![
//!     ScoredSolution::new(Solution::new("batch reads"), Reward::new(7).unwrap()),
//!     ScoredSolution::new(Solution::new("interrupts"), Reward::new(9).unwrap()),
//!     ScoredSolution::new(Solution::new("sleep mode"), Reward::new(9).unwrap()),
//! ];
//!
//! let best = select(&candidates).unwrap();
//! assert_eq!(best.solution.text(), "interrupts");
//! ```
//!
//! The full loop needs `ANTHROPIC_API_KEY`:
//!
//! ```rust,no_run
//! use solution_loop::{Ctx, Problem, Solution, SolutionLoop};
//!
//! let mut ctx = Ctx::from_env().unwrap();
//! let report = SolutionLoop::new(
//!     Problem::new("reduce battery drain"),
//!     Solution::new("poll sensor every 1ms"),
//! )
//! .rounds(1)
//! .run(&mut ctx)
//! .unwrap();
//! println!("{}", report.best.solution);
//! ```

mod agent;
mod assistant;
mod config;
mod ctx;
pub mod llm;
mod model;
mod runner;
mod solution_loop;
pub mod stages;
pub mod tools;
mod workflow;

pub use agent::{Agent, Failure, Outcome, StepError, StepResult};
pub use assistant::CodeAssistant;
pub use config::{Config, ConfigError};
pub use ctx::Ctx;
pub use llm::{
    AnthropicClient, Completion, CompletionRequest, History, LlmDefaults, LlmRequest, Message,
    Role,
};
pub use model::{Approach, CandidateSet, Ledger, Problem, Reward, ScoredSolution, Solution};
pub use runner::{ErrorEvent, RunError, Runner, StepEvent};
pub use solution_loop::{LoopError, LoopReport, SolutionLoop};
pub use stages::{
    ApproachGenerator, IdeationRefiner, LoopState, RetryPolicy, RewardEvaluator, select,
};
pub use workflow::{Workflow, WorkflowBuilder, WorkflowError};
