use crate::Agent;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("duplicate step name: {0}")]
    DuplicateStep(&'static str),
    #[error("unknown step: {0}")]
    UnknownStep(&'static str),
    #[error("workflow has no steps")]
    MissingStart,
}

// ---------------------------------------------------------------------------
// WorkflowBuilder
// ---------------------------------------------------------------------------

pub struct WorkflowBuilder<S: Clone + 'static> {
    name: &'static str,
    start: Option<&'static str>,
    chain_last: Option<&'static str>,
    steps: Vec<Box<dyn Agent<S>>>,
    default_next: HashMap<&'static str, &'static str>,
    duplicate: Option<&'static str>,
}

impl<S: Clone + 'static> WorkflowBuilder<S> {
    /// Add a step. The first step registered is the default start.
    pub fn register<A: Agent<S>>(mut self, agent: A) -> Self {
        let name = agent.name();
        if self.steps.iter().any(|s| s.name() == name) {
            self.duplicate.get_or_insert(name);
        }
        self.steps.push(Box::new(agent));

        if self.start.is_none() {
            self.start = Some(name);
            self.chain_last = Some(name);
        }
        self
    }

    pub fn start_at(mut self, step: &'static str) -> Self {
        self.start = Some(step);
        self.chain_last = Some(step);
        self
    }

    /// Chain the next step: last chained step -> `next`.
    pub fn then(mut self, next: &'static str) -> Self {
        match self.chain_last {
            Some(current) => {
                self.default_next.insert(current, next);
            }
            None => self.start = Some(next),
        }
        self.chain_last = Some(next);
        self
    }

    pub fn build(self) -> Result<Workflow<S>, WorkflowError> {
        if let Some(name) = self.duplicate {
            return Err(WorkflowError::DuplicateStep(name));
        }

        let start = self.start.ok_or(WorkflowError::MissingStart)?;

        let index: HashMap<&'static str, usize> = self
            .steps
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name(), i))
            .collect();

        if !index.contains_key(start) {
            return Err(WorkflowError::UnknownStep(start));
        }
        for (&from, &to) in &self.default_next {
            for name in [from, to] {
                if !index.contains_key(name) {
                    return Err(WorkflowError::UnknownStep(name));
                }
            }
        }

        Ok(Workflow {
            name: self.name,
            start,
            steps: self.steps,
            index,
            default_next: self.default_next,
        })
    }
}

// ---------------------------------------------------------------------------
// Workflow (validated, only constructed via build())
// ---------------------------------------------------------------------------

pub struct Workflow<S: Clone + 'static> {
    name: &'static str,
    start: &'static str,
    steps: Vec<Box<dyn Agent<S>>>,
    index: HashMap<&'static str, usize>,
    default_next: HashMap<&'static str, &'static str>,
}

impl<S: Clone + 'static> Workflow<S> {
    pub fn builder(name: &'static str) -> WorkflowBuilder<S> {
        WorkflowBuilder {
            name,
            start: None,
            chain_last: None,
            steps: Vec::new(),
            default_next: HashMap::new(),
            duplicate: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Step names in registration order.
    pub fn steps(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub(crate) fn start(&self) -> &'static str {
        self.start
    }

    pub(crate) fn step_mut(&mut self, name: &str) -> Option<&mut Box<dyn Agent<S>>> {
        let i = *self.index.get(name)?;
        self.steps.get_mut(i)
    }

    pub(crate) fn default_next(&self, from: &str) -> Option<&'static str> {
        self.default_next.get(from).copied()
    }
}
