use std::collections::BTreeMap;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ValidationError};
use crate::role::Role;

/// Points a point-allocation question hands out.
pub const POINT_BUDGET: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Exactly one option is picked and is worth one point.
    SingleChoice,
    /// `POINT_BUDGET` points are spread over the options.
    PointAllocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub key: String,
    pub text: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub kind: QuestionKind,
    pub options: Vec<AnswerOption>,
}

impl Question {
    pub fn option(&self, key: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|option| option.key == key)
    }

    /// Role credited when `key` is picked, `None` for keys this question doesn't offer.
    pub fn role_for(&self, key: &str) -> Option<Role> {
        self.option(key).map(|option| option.role)
    }
}

/// Question master for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBank {
    pub title: String,
    /// Shown to the respondent before the first question.
    pub instruction: String,
    pub questions: Vec<Question>,
}

impl QuestionBank {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let bank: QuestionBank = serde_json::from_reader(reader)?;
        Ok(bank)
    }

    /// Question by zero based index.
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Question by its printed number.
    pub fn question(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn validate_choice(&self, index: usize, key: &str) -> Result<(), ValidationError> {
        let question = self.expect_kind(index, QuestionKind::SingleChoice)?;
        match question.option(key) {
            Some(_) => Ok(()),
            None => Err(ValidationError::UnknownOption {
                question: index,
                key: key.to_string(),
            }),
        }
    }

    /// A point allocation is valid when every key belongs to the question, each value is
    /// within `0..=POINT_BUDGET` and the values add up to exactly `POINT_BUDGET`.
    pub fn validate_allocation(
        &self,
        index: usize,
        points: &BTreeMap<String, u32>,
    ) -> Result<(), ValidationError> {
        let question = self.expect_kind(index, QuestionKind::PointAllocation)?;
        for (key, &value) in points {
            if question.option(key).is_none() {
                return Err(ValidationError::UnknownOption {
                    question: index,
                    key: key.clone(),
                });
            }
            if value > POINT_BUDGET {
                return Err(ValidationError::PointsOutOfRange {
                    question: index,
                    key: key.clone(),
                    points: value,
                });
            }
        }
        let total: u32 = points.values().sum();
        if total != POINT_BUDGET {
            return Err(ValidationError::BudgetMismatch {
                question: index,
                total,
            });
        }
        Ok(())
    }

    fn expect_kind(&self, index: usize, kind: QuestionKind) -> Result<&Question, ValidationError> {
        let question = self
            .get(index)
            .ok_or(ValidationError::UnknownQuestion(index))?;
        if question.kind != kind {
            return Err(ValidationError::WrongKind(index));
        }
        Ok(question)
    }
}
