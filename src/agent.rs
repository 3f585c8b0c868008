use crate::ctx::Ctx;
use std::time::Duration;
use thiserror::Error;

/// The result of running a step: a new state plus what to do next.
pub type StepResult<S> = Result<(S, Outcome), StepError>;

/// One stage of a loop, run by the [`crate::Runner`].
///
/// Generator, evaluator, refiner and selector all implement this trait over
/// the loop state; you can implement it yourself to slot in extra stages.
pub trait Agent<S>: Send + 'static {
    /// A unique name for this step, used for routing with [`Outcome::Next`]
    /// and reported verbatim when the step fails.
    fn name(&self) -> &'static str;

    /// Run one step. Returns the updated state and an [`Outcome`] that tells
    /// the runner what to do next.
    fn run(&mut self, state: S, ctx: &mut Ctx) -> StepResult<S>;
}

/// Control flow for the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Follow the workflow's default next step (set via `.then()`).
    Continue,
    /// Loop complete, return the final state.
    Done,
    /// Jump to a specific step by name.
    Next(&'static str),
    /// Sleep for the given duration, then re-run the same step
    /// (counted against `max_retries`).
    Wait(Duration),
}

/// Failure of a single call to an external service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    /// Network, auth, rate limit or server error.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// The call did not finish within the caller-supplied timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// The service answered, but not in the shape we asked for.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The service refused the request itself (bad model, bad key, bad
    /// payload). Sending it again unchanged cannot succeed.
    #[error("request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl Failure {
    /// Whether sending the identical request again might succeed.
    ///
    /// Malformed responses are not transient: the same prompt tends to
    /// produce the same mistake.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_) | Self::Timeout(_))
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }
}

impl From<ureq::Error> for Failure {
    fn from(e: ureq::Error) -> Self {
        Failure::ServiceUnavailable(e.to_string())
    }
}

/// Error type for steps, tagged with the stage that produced it.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("generation failed: {0}")]
    Generation(#[source] Failure),
    #[error("evaluation failed: {0}")]
    Evaluation(#[source] Failure),
    #[error("refinement failed: {0}")]
    Refinement(#[source] Failure),
    /// Selection over an empty candidate set.
    #[error("invalid input: cannot select from an empty candidate set")]
    EmptySelection,
    /// A call to a service outside the loop stages (search, assistant).
    #[error("{0}")]
    Service(#[source] Failure),
    /// Bad input or caller logic error. Don't retry, fix the code.
    #[error("invalid: {0}")]
    Invalid(String),
    /// Everything else. Inspect the message for details.
    #[error("{0}")]
    Other(String),
}

impl From<Failure> for StepError {
    fn from(e: Failure) -> Self {
        StepError::Service(e)
    }
}

impl From<std::io::Error> for StepError {
    fn from(e: std::io::Error) -> Self {
        StepError::Other(e.to_string())
    }
}

impl StepError {
    /// Create an [`Invalid`](StepError::Invalid) error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        StepError::Invalid(msg.into())
    }

    /// Create an [`Other`](StepError::Other) error.
    pub fn other(msg: impl Into<String>) -> Self {
        StepError::Other(msg.into())
    }

    /// The underlying service failure, if this error came from one.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Generation(f) | Self::Evaluation(f) | Self::Refinement(f) | Self::Service(f) => {
                Some(f)
            }
            _ => None,
        }
    }

    /// Transient service failures are the only ones worth retrying.
    pub fn is_transient(&self) -> bool {
        self.failure().is_some_and(Failure::is_transient)
    }

    /// Shorthand for a malformed-response failure.
    pub fn is_malformed(&self) -> bool {
        matches!(self.failure(), Some(Failure::MalformedResponse(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Failure ---

    #[test]
    fn transient_failures() {
        assert!(Failure::unavailable("503").is_transient());
        assert!(Failure::Timeout(Duration::from_secs(1)).is_transient());
        assert!(!Failure::malformed("not json").is_transient());
        assert!(
            !Failure::Rejected {
                status: 404,
                body: "no such model".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn failure_from_ureq_error() {
        let f: Failure = ureq::Error::StatusCode(429).into();
        assert!(matches!(f, Failure::ServiceUnavailable(msg) if msg.contains("429")));
    }

    // --- StepError display ---

    #[test]
    fn display_generation() {
        let err = StepError::Generation(Failure::malformed("expected 5 approaches, got 3"));
        assert_eq!(
            err.to_string(),
            "generation failed: malformed response: expected 5 approaches, got 3"
        );
    }

    #[test]
    fn display_evaluation_timeout() {
        let err = StepError::Evaluation(Failure::Timeout(Duration::from_secs(2)));
        assert_eq!(err.to_string(), "evaluation failed: timed out after 2s");
    }

    #[test]
    fn display_empty_selection() {
        assert!(StepError::EmptySelection.to_string().contains("empty candidate set"));
    }

    #[test]
    fn display_invalid() {
        let err = StepError::invalid("bad input");
        assert_eq!(err.to_string(), "invalid: bad input");
    }

    #[test]
    fn display_other() {
        let err = StepError::other("something");
        assert_eq!(err.to_string(), "something");
    }

    // --- classification ---

    #[test]
    fn refinement_timeout_is_transient() {
        let err = StepError::Refinement(Failure::Timeout(Duration::from_millis(5)));
        assert!(err.is_transient());
        assert!(!err.is_malformed());
    }

    #[test]
    fn malformed_is_not_transient() {
        let err = StepError::Evaluation(Failure::malformed("15"));
        assert!(err.is_malformed());
        assert!(!err.is_transient());
    }

    #[test]
    fn local_errors_have_no_failure() {
        assert!(StepError::EmptySelection.failure().is_none());
        assert!(!StepError::invalid("x").is_transient());
    }

    // --- From conversions ---

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let step_err: StepError = io_err.into();
        assert!(matches!(step_err, StepError::Other(msg) if msg.contains("file missing")));
    }

    #[test]
    fn from_failure_is_service() {
        let step_err: StepError = Failure::unavailable("down").into();
        assert!(matches!(step_err, StepError::Service(Failure::ServiceUnavailable(_))));
    }
}
