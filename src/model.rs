use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agent::Failure;

/// The thing to be solved. Supplied once per run and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem(String);

impl Problem {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A candidate approach to a [`Problem`].
///
/// Generated solutions keep the title the model gave them; refined ones
/// usually have none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    title: Option<String>,
    text: String,
}

impl Solution {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            title: None,
            text: text.into(),
        }
    }

    pub fn titled(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            text: text.into(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "{title}: {}", self.text),
            None => f.write_str(&self.text),
        }
    }
}

/// One `{title, description}` record from the approach generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approach {
    pub title: String,
    pub description: String,
}

impl From<Approach> for Solution {
    fn from(a: Approach) -> Self {
        Solution::titled(a.title, a.description)
    }
}

/// A quality score on the closed scale 1 (worst) to 10 (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reward(u8);

impl Reward {
    pub const MIN: Reward = Reward(1);
    pub const MAX: Reward = Reward(10);

    pub fn new(value: i64) -> Result<Self, Failure> {
        if (1..=10).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(Failure::malformed(format!(
                "reward {value} is outside the 1-10 scale"
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Reward {
    type Error = Failure;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Reward::new(value)
    }
}

impl fmt::Display for Reward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredSolution {
    pub solution: Solution,
    pub reward: Reward,
}

impl ScoredSolution {
    pub fn new(solution: Solution, reward: Reward) -> Self {
        Self { solution, reward }
    }
}

/// The scored batch produced by one round. Duplicate text is allowed.
pub type CandidateSet = Vec<ScoredSolution>;

/// Append-only audit trail: one [`CandidateSet`] per round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    rounds: Vec<CandidateSet>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, set: CandidateSet) {
        self.rounds.push(set);
    }

    pub fn rounds(&self) -> &[CandidateSet] {
        &self.rounds
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_accepts_closed_range() {
        assert_eq!(Reward::new(1).unwrap(), Reward::MIN);
        assert_eq!(Reward::new(10).unwrap(), Reward::MAX);
        assert_eq!(Reward::new(7).unwrap().get(), 7);
    }

    #[test]
    fn reward_rejects_out_of_range() {
        for bad in [0, 11, 15, -3] {
            let err = Reward::try_from(bad).unwrap_err();
            assert!(matches!(err, Failure::MalformedResponse(_)), "{bad}");
        }
    }

    #[test]
    fn approach_becomes_titled_solution() {
        let s: Solution = Approach {
            title: "Batch reads".into(),
            description: "Read the sensor once a second".into(),
        }
        .into();
        assert_eq!(s.title(), Some("Batch reads"));
        assert_eq!(s.to_string(), "Batch reads: Read the sensor once a second");
    }

    #[test]
    fn untitled_solution_displays_text() {
        assert_eq!(Solution::new("just text").to_string(), "just text");
    }

    #[test]
    fn ledger_appends_in_order() {
        let mut ledger = Ledger::new();
        assert!(ledger.is_empty());
        ledger.record(vec![ScoredSolution::new(Solution::new("a"), Reward::MIN)]);
        ledger.record(vec![]);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.rounds()[0][0].solution.text(), "a");
    }
}
