use super::{Attempts, GENERATE, LoopState, RetryPolicy};
use crate::agent::{Agent, Failure, Outcome, StepError, StepResult};
use crate::ctx::Ctx;
use crate::model::{Approach, Problem, Solution};
use crate::tools::extract_json_array;

/// Asks the model for `count` alternatives to an approach that does not work.
#[derive(Debug, Clone)]
pub struct ApproachGenerator {
    max_tokens: u32,
}

impl ApproachGenerator {
    pub const DEFAULT_COUNT: usize = 5;

    pub fn new() -> Self {
        Self { max_tokens: 3000 }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Produce exactly `count` unscored solutions.
    ///
    /// A response holding anything other than a JSON array of exactly
    /// `count` `{title, description}` records is a malformed-response
    /// failure; partial sets are never returned.
    pub fn generate(
        &self,
        ctx: &Ctx,
        problem: &Problem,
        known_bad: &Solution,
        count: usize,
    ) -> Result<Vec<Solution>, StepError> {
        if count == 0 {
            return Err(StepError::invalid("approach count must be at least 1"));
        }

        let response = ctx
            .llm()
            .system(format!(
                "Your job is to take the problem given to you and generate {count} different \
                 approaches to solve it. The problem and one non-optimal approach will be given \
                 to you. Analyze why the given approach doesn't work and generate {count} \
                 distinct approaches that would solve the problem in a feasible manner."
            ))
            .user(format!(
                "Ensure your output is a JSON array of {count} objects, each with a 'title' \
                 and 'description' field. Do not include any other text in your response."
            ))
            .user(format!(
                "The problem is: {problem}\nThe non-optimal approach is: {known_bad}"
            ))
            .max_tokens(self.max_tokens)
            .send()
            .map_err(StepError::Generation)?;

        let approaches: Vec<Approach> =
            extract_json_array(&response).map_err(StepError::Generation)?;

        if approaches.len() != count {
            return Err(StepError::Generation(Failure::malformed(format!(
                "expected {count} approaches, got {}",
                approaches.len()
            ))));
        }

        tracing::debug!(count, "generated approaches");
        Ok(approaches.into_iter().map(Solution::from).collect())
    }
}

impl Default for ApproachGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// GENERATE: fills `pending` with fresh approaches.
pub struct GenerateStep {
    generator: ApproachGenerator,
    count: usize,
    attempts: Attempts,
}

impl GenerateStep {
    pub fn new(generator: ApproachGenerator, count: usize, retry: RetryPolicy) -> Self {
        Self {
            generator,
            count,
            attempts: Attempts::new(retry),
        }
    }
}

impl Agent<LoopState> for GenerateStep {
    fn name(&self) -> &'static str {
        GENERATE
    }

    fn run(&mut self, mut state: LoopState, ctx: &mut Ctx) -> StepResult<LoopState> {
        let generated =
            self.generator
                .generate(ctx, &state.problem, &state.known_bad, self.count);
        match generated {
            Ok(solutions) => {
                self.attempts.reset();
                ctx.log(format!("generate: {} approaches", solutions.len()));
                state.pending = solutions;
                Ok((state, Outcome::Continue))
            }
            Err(err) => self.attempts.on_error(GENERATE, state, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::fake::Scripted;

    fn approaches_json(n: usize) -> String {
        let items: Vec<Approach> = (1..=n)
            .map(|i| Approach {
                title: format!("Approach {i}"),
                description: format!("Do thing {i}"),
            })
            .collect();
        serde_json::to_string(&items).unwrap()
    }

    fn problem() -> (Problem, Solution) {
        (
            Problem::new("reduce battery drain"),
            Solution::new("poll sensor every 1ms"),
        )
    }

    #[test]
    fn returns_exactly_count_solutions() {
        let ctx = Ctx::new().with_llm(Scripted::new([approaches_json(5)]));
        let (p, bad) = problem();

        let out = ApproachGenerator::new().generate(&ctx, &p, &bad, 5).unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(out[0].title(), Some("Approach 1"));
        assert_eq!(out[4].text(), "Do thing 5");
    }

    #[test]
    fn accepts_fenced_json() {
        let fenced = format!("```json\n{}\n```", approaches_json(2));
        let ctx = Ctx::new().with_llm(Scripted::new([fenced]));
        let (p, bad) = problem();

        let out = ApproachGenerator::new().generate(&ctx, &p, &bad, 2).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn prompt_carries_problem_count_and_token_budget() {
        let backend = std::sync::Arc::new(Scripted::new([approaches_json(3)]));
        let ctx = Ctx::new().with_shared_llm(backend.clone());
        let (p, bad) = problem();

        ApproachGenerator::new().generate(&ctx, &p, &bad, 3).unwrap();

        let requests = backend.requests();
        let req = &requests[0];
        assert!(req.system.as_deref().unwrap().contains("generate 3 different approaches"));
        assert!(req.messages[0].content.contains("JSON array of 3 objects"));
        assert!(req.messages[1].content.contains("reduce battery drain"));
        assert!(req.messages[1].content.contains("poll sensor every 1ms"));
        assert_eq!(req.max_tokens, 3000);
    }

    #[test]
    fn malformed_text_is_malformed_response() {
        let ctx = Ctx::new().with_llm(Scripted::new(["Sure! Here are some ideas: batch, sleep"]));
        let (p, bad) = problem();

        let err = ApproachGenerator::new()
            .generate(&ctx, &p, &bad, 5)
            .unwrap_err();
        assert!(matches!(err, StepError::Generation(Failure::MalformedResponse(_))));
    }

    #[test]
    fn fewer_records_than_requested_fails() {
        let ctx = Ctx::new().with_llm(Scripted::new([approaches_json(3)]));
        let (p, bad) = problem();

        let err = ApproachGenerator::new()
            .generate(&ctx, &p, &bad, 5)
            .unwrap_err();
        assert!(err.to_string().contains("expected 5 approaches, got 3"));
    }

    #[test]
    fn more_records_than_requested_fails() {
        let ctx = Ctx::new().with_llm(Scripted::new([approaches_json(6)]));
        let (p, bad) = problem();

        let err = ApproachGenerator::new()
            .generate(&ctx, &p, &bad, 5)
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn service_failure_is_generation_failure() {
        let ctx = Ctx::new().with_llm(Scripted::with_results([Err(Failure::unavailable(
            "401 unauthorized",
        ))]));
        let (p, bad) = problem();

        let err = ApproachGenerator::new()
            .generate(&ctx, &p, &bad, 5)
            .unwrap_err();
        assert!(matches!(err, StepError::Generation(Failure::ServiceUnavailable(_))));
    }

    #[test]
    fn zero_count_is_invalid() {
        let ctx = Ctx::new().with_llm(Scripted::new([approaches_json(0)]));
        let (p, bad) = problem();

        let err = ApproachGenerator::new()
            .generate(&ctx, &p, &bad, 0)
            .unwrap_err();
        assert!(matches!(err, StepError::Invalid(_)));
    }

    #[test]
    fn step_fills_pending() {
        let mut ctx = Ctx::new().with_llm(Scripted::new([approaches_json(2)]));
        let (p, bad) = problem();
        let mut step = GenerateStep::new(ApproachGenerator::new(), 2, RetryPolicy::NONE);

        let (state, outcome) = step.run(LoopState::new(p, bad), &mut ctx).unwrap();
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(state.pending.len(), 2);
        assert_eq!(ctx.logs(), ["generate: 2 approaches"]);
    }

    #[test]
    fn step_waits_on_transient_failure_when_retry_allowed() {
        let mut ctx = Ctx::new().with_llm(Scripted::with_results([
            Err(Failure::unavailable("503")),
            Ok(approaches_json(1)),
        ]));
        let (p, bad) = problem();
        let mut step = GenerateStep::new(
            ApproachGenerator::new(),
            1,
            RetryPolicy::new(1, std::time::Duration::from_millis(1)),
        );

        let (state, outcome) = step.run(LoopState::new(p, bad), &mut ctx).unwrap();
        assert!(matches!(outcome, Outcome::Wait(_)));
        let (state, outcome) = step.run(state, &mut ctx).unwrap();
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(state.pending.len(), 1);
    }
}
