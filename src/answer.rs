use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::question::{QuestionBank, QuestionKind};

/// Answer to a single question. Which variant applies is decided by the question's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// Key of the selected option.
    SingleChoice(String),
    /// Option key to points given.
    PointAllocation(BTreeMap<String, u32>),
}

impl Answer {
    pub fn choice(key: &str) -> Self {
        Answer::SingleChoice(key.to_string())
    }

    pub fn allocation<'k>(pairs: impl IntoIterator<Item = (&'k str, u32)>) -> Self {
        Answer::PointAllocation(
            pairs
                .into_iter()
                .map(|(key, points)| (key.to_string(), points))
                .collect(),
        )
    }

    /// Parses typed input. A choice is the bare option key, an allocation is a list of
    /// `key=points` pairs separated by `;`, `,` or whitespace, e.g. `a=2;c=5;g=3`.
    pub fn parse(kind: QuestionKind, value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        match kind {
            QuestionKind::SingleChoice => {
                if value.is_empty() || value.contains(char::is_whitespace) {
                    return Err(ValidationError::Malformed(value.to_string()));
                }
                Ok(Answer::SingleChoice(value.to_string()))
            }
            QuestionKind::PointAllocation => {
                let mut points = BTreeMap::new();
                for pair in value
                    .split(|c: char| c == ';' || c == ',' || c.is_whitespace())
                    .filter(|pair| !pair.is_empty())
                {
                    let (key, amount) = pair
                        .split_once('=')
                        .ok_or_else(|| ValidationError::Malformed(pair.to_string()))?;
                    let amount = amount
                        .trim()
                        .parse::<u32>()
                        .map_err(|_| ValidationError::Malformed(pair.to_string()))?;
                    let total = points.entry(key.trim().to_string()).or_insert(0u32);
                    *total = total
                        .checked_add(amount)
                        .ok_or_else(|| ValidationError::Malformed(pair.to_string()))?;
                }
                if points.is_empty() {
                    return Err(ValidationError::Malformed(value.to_string()));
                }
                Ok(Answer::PointAllocation(points))
            }
        }
    }
}

/// Answers keyed by zero based question index.
///
/// No validation happens here; see `Session` for the checked way to build one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    answers: BTreeMap<usize, Answer>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize, answer: Answer) -> Option<Answer> {
        self.answers.insert(index, answer)
    }

    pub fn get(&self, index: usize) -> Option<&Answer> {
        self.answers.get(&index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.answers.contains_key(&index)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, usize, Answer> {
        self.answers.iter()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl FromIterator<(usize, Answer)> for AnswerSet {
    fn from_iter<T: IntoIterator<Item = (usize, Answer)>>(iter: T) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a AnswerSet {
    type Item = (&'a usize, &'a Answer);
    type IntoIter = btree_map::Iter<'a, usize, Answer>;

    fn into_iter(self) -> Self::IntoIter {
        self.answers.iter()
    }
}

/// A finished session, ready to be scored and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub username: String,
    pub answers: AnswerSet,
}

/// Collects answers for one respondent.
///
/// Every answer is checked against the question bank before it is accepted, so a
/// finished session only ever holds valid answers.
#[derive(Debug, Clone)]
pub struct Session<'a> {
    bank: &'a QuestionBank,
    username: String,
    answers: AnswerSet,
}

impl<'a> Session<'a> {
    pub fn new(bank: &'a QuestionBank, username: &str) -> Result<Self, ValidationError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        Ok(Self {
            bank,
            username: username.to_string(),
            answers: AnswerSet::new(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn bank(&self) -> &'a QuestionBank {
        self.bank
    }

    /// Records a single-choice answer, replacing any earlier answer to the same question.
    pub fn choose(&mut self, index: usize, key: &str) -> Result<(), ValidationError> {
        self.bank.validate_choice(index, key)?;
        self.answers.insert(index, Answer::choice(key));
        Ok(())
    }

    /// Records a point allocation, replacing any earlier answer to the same question.
    pub fn allocate(
        &mut self,
        index: usize,
        points: BTreeMap<String, u32>,
    ) -> Result<(), ValidationError> {
        self.bank.validate_allocation(index, &points)?;
        self.answers.insert(index, Answer::PointAllocation(points));
        Ok(())
    }

    pub fn answer(&mut self, index: usize, answer: Answer) -> Result<(), ValidationError> {
        match answer {
            Answer::SingleChoice(key) => self.choose(index, &key),
            Answer::PointAllocation(points) => self.allocate(index, points),
        }
    }

    /// Indices of the questions still waiting for an answer.
    pub fn remaining(&self) -> Vec<usize> {
        (0..self.bank.len())
            .filter(|index| !self.answers.contains(*index))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.remaining().is_empty()
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    /// Ends the session as is. Partial sessions are allowed and score what was answered.
    pub fn finish(self) -> Submission {
        Submission {
            username: self.username,
            answers: self.answers,
        }
    }

    /// Ends the session, refusing if any question is unanswered.
    pub fn finish_complete(self) -> Result<Submission, ValidationError> {
        let remaining = self.remaining().len();
        if remaining > 0 {
            return Err(ValidationError::Incomplete(remaining));
        }
        Ok(self.finish())
    }
}
