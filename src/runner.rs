use crate::{Ctx, Outcome, StepError, Workflow};
use std::fmt;
use std::time::{Duration, Instant};

/// Passed to the `on_step` hook after each successful step.
pub struct StepEvent<'a> {
    pub step: &'a str,
    pub outcome: &'a Outcome,
    pub duration: Duration,
    pub step_number: usize,
    pub retries: usize,
}

/// Passed to the `on_error` hook when a step errors or a limit is exceeded.
pub struct ErrorEvent<'a> {
    pub step: &'a str,
    pub error: &'a StepError,
    pub step_number: usize,
}

/// Why a run stopped early, with the last state that a step completed.
///
/// The state is the input to the failing step, so nothing a successful step
/// produced is lost.
#[derive(Debug)]
pub struct RunError<S> {
    pub step: &'static str,
    pub step_number: usize,
    pub error: StepError,
    pub last_state: S,
}

impl<S> fmt::Display for RunError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step '{}' failed: {}", self.step, self.error)
    }
}

impl<S: fmt::Debug> std::error::Error for RunError<S> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub struct Runner<S: Clone + 'static> {
    wf: Workflow<S>,
    max_steps: usize,
    max_retries: usize,
    on_step: Option<Box<dyn FnMut(&StepEvent)>>,
    on_error: Option<Box<dyn FnMut(&ErrorEvent)>>,
}

impl<S: Clone + 'static> Runner<S> {
    pub fn new(wf: Workflow<S>) -> Self {
        Self {
            wf,
            max_steps: 10_000,
            max_retries: 3,
            on_step: None,
            on_error: None,
        }
    }

    /// Prevent accidental infinite loops.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// How many consecutive `Wait` outcomes one step may return.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Register a callback that fires after each successful step.
    pub fn on_step(mut self, cb: impl FnMut(&StepEvent) + 'static) -> Self {
        self.on_step = Some(Box::new(cb));
        self
    }

    /// Register a callback that fires when a step errors or a limit is exceeded.
    pub fn on_error(mut self, cb: impl FnMut(&ErrorEvent) + 'static) -> Self {
        self.on_error = Some(Box::new(cb));
        self
    }

    /// Set both hooks to emit `tracing` events.
    pub fn with_tracing(self) -> Self {
        let workflow = self.wf.name();
        self.on_step(move |e| {
            tracing::info!(
                workflow,
                step = e.step,
                step_number = e.step_number,
                outcome = ?e.outcome,
                retries = e.retries,
                elapsed_ms = e.duration.as_millis() as u64,
                "step finished"
            );
        })
        .on_error(move |e| {
            tracing::warn!(
                workflow,
                step = e.step,
                step_number = e.step_number,
                error = %e.error,
                "step failed"
            );
        })
    }

    pub fn run(&mut self, mut state: S, ctx: &mut Ctx) -> Result<S, RunError<S>> {
        let mut current = self.wf.start();
        let mut retries: usize = 0;
        let mut step_number: usize = 0;

        for _ in 0..self.max_steps {
            step_number += 1;

            let Some(agent) = self.wf.step_mut(current) else {
                let err = StepError::other(format!("unknown step: {current}"));
                return Err(self.fail(current, step_number, err, state));
            };

            let started = Instant::now();
            let result = agent.run(state.clone(), ctx);
            let duration = started.elapsed();

            let (next_state, outcome) = match result {
                Ok(r) => r,
                Err(err) => return Err(self.fail(current, step_number, err, state)),
            };

            if let Some(cb) = &mut self.on_step {
                cb(&StepEvent {
                    step: current,
                    outcome: &outcome,
                    duration,
                    step_number,
                    retries,
                });
            }

            match outcome {
                Outcome::Done => return Ok(next_state),
                Outcome::Next(step) => {
                    state = next_state;
                    current = step;
                    retries = 0;
                }
                Outcome::Continue => {
                    state = next_state;
                    let Some(next) = self.wf.default_next(current) else {
                        let err = StepError::other(format!(
                            "step '{current}' returned Continue but no default next step is configured"
                        ));
                        return Err(self.fail(current, step_number, err, state));
                    };
                    current = next;
                    retries = 0;
                }
                Outcome::Wait(dur) => {
                    state = next_state;
                    retries += 1;
                    if retries > self.max_retries {
                        let err = StepError::other(format!(
                            "step '{}' exceeded max retries ({}) while waiting",
                            current, self.max_retries
                        ));
                        return Err(self.fail(current, step_number, err, state));
                    }
                    tracing::debug!(step = current, ?dur, retries, "waiting before re-run");
                    std::thread::sleep(dur);
                }
            }
        }

        let err = StepError::other(format!(
            "max_steps exceeded (possible infinite loop) in workflow {}",
            self.wf.name()
        ));
        Err(self.fail(current, step_number, err, state))
    }

    fn fail(
        &mut self,
        step: &'static str,
        step_number: usize,
        error: StepError,
        last_state: S,
    ) -> RunError<S> {
        if let Some(cb) = &mut self.on_error {
            cb(&ErrorEvent {
                step,
                error: &error,
                step_number,
            });
        }
        RunError {
            step,
            step_number,
            error,
            last_state,
        }
    }
}
