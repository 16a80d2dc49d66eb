use uuid::Uuid;

use super::{AnswerVector, Question, QUESTIONS};

/// One run through the identification key.
///
/// The token identifies the run so a classification result that resolves
/// after the user restarted can be told apart from the current one.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizSession {
    token: Uuid,
    answers: Vec<bool>,
    vector: AnswerVector,
    score: usize,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

/// What the session needs next after an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Next(&'static Question),
    Complete,
}

impl QuizSession {
    pub fn new() -> Self {
        Self {
            token: Uuid::new_v4(),
            answers: Vec::new(),
            vector: AnswerVector::new(),
            score: 0,
        }
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    /// Gives the run a new token, so results requested under the old one
    /// are treated as stale.
    pub fn renew_token(&mut self) {
        self.token = Uuid::new_v4();
    }

    pub fn question_number(&self) -> usize {
        self.answers.len()
    }

    pub fn current_question(&self) -> Option<&'static Question> {
        QUESTIONS.get(self.answers.len())
    }

    pub fn is_complete(&self) -> bool {
        self.answers.len() >= QUESTIONS.len()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn answers(&self) -> &[bool] {
        &self.answers
    }

    pub fn vector(&self) -> &AnswerVector {
        &self.vector
    }

    /// Records the answer to the current question. Answers given once every
    /// question is answered are ignored.
    pub fn answer(&mut self, answer: bool) -> Progress {
        let Some(question) = self.current_question() else {
            return Progress::Complete;
        };

        if question.is_correct(answer) {
            self.score += 1;
        }
        self.vector.push(answer);
        self.answers.push(answer);

        match self.current_question() {
            Some(next) => Progress::Next(next),
            None => Progress::Complete,
        }
    }

    /// Closes the session with the classifier's label.
    pub fn finish(self, species: String) -> QuizOutcome {
        QuizOutcome {
            token: self.token,
            answers: self.answers,
            vector: self.vector,
            score: self.score,
            species,
        }
    }
}

/// A finished run as shown on the results screen.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizOutcome {
    pub token: Uuid,
    pub answers: Vec<bool>,
    pub vector: AnswerVector,
    pub score: usize,
    /// Empty when the classifier could not be reached.
    pub species: String,
}

impl QuizOutcome {
    pub fn total(&self) -> usize {
        QUESTIONS.len()
    }

    pub fn is_identified(&self) -> bool {
        !self.species.trim().is_empty()
    }

    /// Pairs each question with the answer given to it.
    pub fn review(&self) -> impl Iterator<Item = (&'static Question, bool)> + '_ {
        QUESTIONS.iter().zip(self.answers.iter().copied())
    }
}
