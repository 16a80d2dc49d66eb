pub mod questions;
pub mod session;

pub use questions::QUESTIONS;
pub use session::{Progress, QuizOutcome, QuizSession};

use thiserror::Error;

/// One of the fixed morphological questions.
///
/// The first option corresponds to answering `true`, the second to `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub text: &'static str,
    pub options: [&'static str; 2],
    pub correct_answer: bool,
    pub images: [&'static str; 2],
    pub explanation: &'static str,
}

impl Question {
    pub fn is_correct(&self, answer: bool) -> bool {
        answer == self.correct_answer
    }

    /// Label of the option a boolean answer stands for.
    pub fn option_for(&self, answer: bool) -> &'static str {
        if answer {
            self.options[0]
        } else {
            self.options[1]
        }
    }

    /// Maps a pressed option label back to its boolean answer.
    pub fn answer_for(&self, option: &str) -> Option<bool> {
        match option {
            o if o == self.options[0] => Some(true),
            o if o == self.options[1] => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidAnswerVector {
    #[error("answer vector has odd length {0}")]
    OddLength(usize),
    #[error("answer pair {0} is not one-hot")]
    NotOneHot(usize),
}

/// One-hot pair encoding of a sequence of binary answers.
///
/// Slot `2i` is 1 when answer `i` was `true`, slot `2i + 1` holds the
/// complement. The classifier reads the slots positionally.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct AnswerVector(Vec<u8>);

impl AnswerVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, answer: bool) {
        let bit = u8::from(answer);
        self.0.push(bit);
        self.0.push(1 - bit);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of answers encoded, i.e. half the slot count.
    pub fn answered(&self) -> usize {
        self.0.len() / 2
    }

    /// Decodes the pairs back into answers.
    pub fn answers(&self) -> Vec<bool> {
        self.0.chunks(2).map(|pair| pair[0] == 1).collect()
    }
}

impl TryFrom<Vec<u8>> for AnswerVector {
    type Error = InvalidAnswerVector;

    fn try_from(slots: Vec<u8>) -> Result<Self, Self::Error> {
        if slots.len() % 2 != 0 {
            return Err(InvalidAnswerVector::OddLength(slots.len()));
        }
        if let Some(pair) = slots
            .chunks(2)
            .position(|pair| !matches!(pair, [0, 1] | [1, 0]))
        {
            return Err(InvalidAnswerVector::NotOneHot(pair));
        }
        Ok(Self(slots))
    }
}

impl From<AnswerVector> for Vec<u8> {
    fn from(vector: AnswerVector) -> Self {
        vector.0
    }
}

/// Encodes answers, in question order, into their one-hot vector.
pub fn encode(answers: &[bool]) -> AnswerVector {
    let mut vector = AnswerVector::new();
    for &answer in answers {
        vector.push(answer);
    }
    vector
}

/// Counts answers equal to the reference answer of the question at the same
/// position. Answers past the end of `questions` are not scored.
pub fn score(answers: &[bool], questions: &[Question]) -> usize {
    answers
        .iter()
        .zip(questions)
        .filter(|(answer, question)| question.is_correct(**answer))
        .count()
}
